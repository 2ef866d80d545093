//! Integration tests for the issue tracker, action list and team spirit adapters.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use hq_sources::MetricSource;
use hq_sources::fake::FakeOpener;
use hq_sources::happiness::Happiness;
use hq_sources::jira::Jira;
use hq_sources::trello::{INACTIVE_DAYS, Trello};

const JIRA: &str = "http://jira/";
const JQL_SEARCH: &str = "http://jira/rest/api/2/search?maxResults=1000&jql=project%20%3D%20X";

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .expect("valid date")
}

fn jira() -> FakeOpener {
    FakeOpener::new()
        .with(
            JQL_SEARCH,
            r#"{"total": 2, "issues": [
                {"key": "X-1", "fields": {"summary": "Login", "customfield_10002": 3}},
                {"key": "X-2", "fields": {"summary": "Logout", "customfield_10002": null}}
            ]}"#,
        )
        .with(
            format!("{JIRA}rest/api/2/filter/12345"),
            r#"{"searchUrl": "https://jira.internal:8443/rest/api/2/search?jql=filter%3D12345&maxResults=50",
                "viewUrl": "http://jira/issues/?filter=12345"}"#,
        )
        .with(
            "http://jira/rest/api/2/search?maxResults=1000&jql=filter%3D12345",
            r#"{"total": 5, "issues": []}"#,
        )
        .with(
            format!("{JIRA}rest/api/2/field"),
            r#"[{"id": "summary", "name": "Summary"}, {"id": "customfield_10002", "name": "Story Points"}]"#,
        )
        .with(
            format!(r#"{JIRA}rest/api/2/issue/X-1?maxResults=1000&expand=changelog&fields="*all,-comment""#),
            r#"{"changelog": {"histories": [
                {"created": "2024-05-06T09:00:00.000+0200", "items": [
                    {"field": "status", "fieldtype": "jira", "fromString": "Open", "toString": "In Progress"}]},
                {"created": "2024-05-08T17:00:00.000+0200", "items": [
                    {"field": "status", "fieldtype": "jira", "fromString": "In Progress", "toString": "Done"}]}
            ]}}"#,
        )
        .with(
            format!(r#"{JIRA}rest/api/2/issue/X-2?maxResults=1000&expand=changelog&fields="*all,-comment""#),
            r#"{"changelog": {"histories": []}}"#,
        )
}

#[test]
fn jira_counts_jql_and_filter_queries() {
    let jira = Jira::new("http://jira", None, Arc::new(jira()));

    let count = jira.nr_issues(&["project = X"]).expect("count");
    assert_eq!(count.count, 2);
    assert_eq!(count.issues[0].href, "http://jira/browse/X-1");
    assert_eq!(count.issues[0].text, "Login");

    assert_eq!(jira.nr_issues(&["project = X", "12345"]).expect("count").count, 7);
    assert!(jira.nr_issues(&[]).is_err());
}

#[test]
fn jira_urls_for_readers() {
    let jira = Jira::new(JIRA, None, Arc::new(jira()));
    assert_eq!(
        jira.metric_source_urls(&["12345", "project = X"]),
        vec![
            "http://jira/issues/?filter=12345".to_string(),
            "http://jira/issues/?jql=project%20%3D%20X".to_string()
        ]
    );
}

#[test]
fn jira_story_points_field() {
    let jira = Jira::new(JIRA, Some("Story Points".to_string()), Arc::new(jira()));

    let points = jira.issues_with_field(&["project = X"]).expect("points");
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].0.href, "http://jira/browse/X-1");
    assert!((points[0].1 - 3.0).abs() < f64::EPSILON);

    let empty = jira.nr_issues_with_field_empty(&["project = X"]).expect("empty");
    assert_eq!(empty.count, 1);
    assert_eq!(empty.issues[0].text, "Logout");
}

#[test]
fn jira_unknown_field_is_an_error() {
    let unknown = Jira::new(JIRA, Some("Business Value".to_string()), Arc::new(jira()));
    assert!(unknown.issues_with_field(&["project = X"]).is_err());
    let unconfigured = Jira::new(JIRA, None, Arc::new(jira()));
    assert!(unconfigured.nr_issues_with_field_empty(&["project = X"]).is_err());
}

#[test]
fn jira_story_progress_from_changelog() {
    let jira = Jira::new(JIRA, None, Arc::new(jira()));
    let stories = jira.story_progress(&["project = X"]).expect("stories");
    assert_eq!(stories.len(), 2);
    assert_eq!(stories[0].start, Some(at(6, 9)));
    assert_eq!(stories[0].end, Some(at(8, 17)));
    assert_eq!((stories[1].start, stories[1].end), (None, None));
}

const TRELLO_BOARD: &str = "http://trello.test/1/boards/board-1/?fields=id,url,dateLastActivity\
    &lists=open&list_fields=name&cards=visible&card_fields=shortUrl,dateLastActivity,due,idList,name\
    &key=app&token=secret";

fn trello() -> Trello {
    let opener = FakeOpener::new().with(
        TRELLO_BOARD,
        r#"{"id": "board-1", "url": "https://trello.com/b/board-1/acties",
            "dateLastActivity": "2024-05-10T12:00:00.000Z",
            "lists": [{"id": "l1", "name": "Doing"}, {"id": "l2", "name": "Done"}],
            "cards": [
                {"shortUrl": "https://trello.com/c/1", "name": "Late", "idList": "l1",
                 "due": "2024-05-01T12:00:00.000Z", "dateLastActivity": "2024-05-09T12:00:00.000Z"},
                {"shortUrl": "https://trello.com/c/2", "name": "Forgotten", "idList": "l1",
                 "due": null, "dateLastActivity": "2024-04-01T12:00:00.000Z"},
                {"shortUrl": "https://trello.com/c/3", "name": "Finished", "idList": "l2",
                 "due": "2024-04-01T12:00:00.000Z", "dateLastActivity": "2024-03-01T12:00:00.000Z"}
            ]}"#,
    );
    Trello::new(
        "http://trello.test/1",
        "app".to_string(),
        "secret".to_string(),
        vec!["Done".to_string()],
        Arc::new(opener),
    )
}

#[test]
fn trello_over_due_cards_skip_ignored_lists() {
    let cards = trello().over_due_cards(&["board-1"], at(11, 12)).expect("cards");
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].name, "Late");
    assert_eq!(cards[0].delta, TimeDelta::days(10));
}

#[test]
fn trello_inactive_cards() {
    let cards = trello()
        .inactive_cards(&["board-1"], at(11, 12), INACTIVE_DAYS)
        .expect("cards");
    let names: Vec<&str> = cards.iter().map(|card| card.name.as_str()).collect();
    assert_eq!(names, vec!["Forgotten"]);
    assert_eq!(cards[0].delta, TimeDelta::days(40));
}

#[test]
fn trello_activity_and_urls() {
    let trello = trello();
    assert_eq!(trello.last_activity(&["board-1"]).expect("activity"), at(10, 12));
    assert_eq!(
        trello.metric_source_urls(&["board-1", "board-2"]),
        vec![
            "https://trello.com/b/board-1/acties".to_string(),
            "http://trello.com".to_string()
        ]
    );
    assert!(trello.last_activity(&[]).is_err());
}

#[test]
fn happiness_reports_latest_smiley() {
    let opener = FakeOpener::new().with(
        "http://happy/api/",
        r#"[{"smiley": 4, "datum": "2024-05-01"}, {"smiley": "2", "datum": "2024-05-03"}]"#,
    );
    let happiness = Happiness::new("http://happy", Arc::new(opener));
    assert_eq!(happiness.team_spirit("team").expect("spirit"), ":-(");
    assert_eq!(happiness.datetime("team").expect("date"), at(3, 0));
}
