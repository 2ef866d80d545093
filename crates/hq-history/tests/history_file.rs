//! Integration tests for reading and writing the history file.

use std::fs;

use chrono::{NaiveDate, NaiveDateTime};
use hq_history::{CompactHistory, HistoryError, MetricRecord};
use hq_model::Status;
use tempfile::tempdir;

fn at(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .and_then(|date| date.and_hms_opt(8, 0, 0))
        .expect("valid date")
}

fn record(stable_id: &str, value: Option<f64>, status: Status) -> MetricRecord {
    MetricRecord {
        stable_id: stable_id.to_string(),
        value,
        status,
    }
}

#[test]
fn missing_file_is_an_empty_history() {
    let dir = tempdir().expect("temp dir");
    let history = CompactHistory::load(&dir.path().join("history.json")).expect("load");
    assert!(history.is_empty());
    assert!(history.statuses().is_empty());
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("history.json");
    fs::write(&path, "{\"dates\": ").expect("write");
    assert!(matches!(
        CompactHistory::load(&path),
        Err(HistoryError::InvalidFormat { .. })
    ));
}

#[test]
fn saved_history_has_sorted_keys() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("data").join("history.json");
    let mut history = CompactHistory::load(&path).expect("load");
    history.add_metrics(
        at(1),
        [
            record("OpenBugsPortaal", Some(12.0), Status::Green),
            record("CommentedLOCPortaal", None, Status::Missing),
        ],
    );
    history.add_metrics(
        at(2),
        [
            record("OpenBugsPortaal", Some(12.0), Status::Green),
            record("CommentedLOCPortaal", Some(2.5), Status::Yellow),
        ],
    );
    history.save().expect("save");

    let text = fs::read_to_string(&path).expect("read");
    let json: serde_json::Value = serde_json::from_str(&text).expect("json");
    insta::assert_json_snapshot!(json, @r#"
    {
      "dates": [
        "2024-05-01 08:00:00",
        "2024-05-02 08:00:00"
      ],
      "metrics": {
        "CommentedLOCPortaal": [
          {
            "end": "2024-05-01 08:00:00",
            "start": "2024-05-01 08:00:00",
            "status": "missing"
          },
          {
            "end": "2024-05-02 08:00:00",
            "start": "2024-05-02 08:00:00",
            "status": "yellow",
            "value": 2.5
          }
        ],
        "OpenBugsPortaal": [
          {
            "end": "2024-05-02 08:00:00",
            "start": "2024-05-01 08:00:00",
            "status": "green",
            "value": 12
          }
        ]
      },
      "statuses": [
        {
          "green": 1,
          "missing": 1
        },
        {
          "green": 1,
          "yellow": 1
        }
      ]
    }
    "#);
    assert!(text.starts_with("{\n  \"dates\": [\n"));
}

#[test]
fn reloaded_history_continues_measurements() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("history.json");
    let mut history = CompactHistory::load(&path).expect("load");
    history.add_metrics(at(1), [record("OpenBugsPortaal", Some(3.0), Status::Red)]);
    history.save().expect("save");

    let mut history = CompactHistory::load(&path).expect("reload");
    history.add_metrics(at(2), [record("OpenBugsPortaal", Some(3.0), Status::Red)]);
    assert_eq!(history.dates().len(), 2);
    assert_eq!(history.recent_history("OpenBugsPortaal"), vec![3.0, 3.0]);
    assert_eq!(history.status_start_date("OpenBugsPortaal", Status::Red, at(5)), at(1));

    let statuses = history.statuses();
    assert_eq!(statuses[1].date, "2024-05-02 08:00:00");
    assert_eq!(statuses[1].counts.get("red"), Some(&1));
}
