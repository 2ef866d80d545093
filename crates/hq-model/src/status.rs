use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of comparing a metric value against its norm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Not better than the low target; direct action needed.
    Red,
    /// Below target but not red.
    Yellow,
    /// On or above target.
    Green,
    /// Equal to the best possible value.
    Perfect,
    /// Below target, but within accepted technical debt.
    Grey,
    /// The source was configured but the value could not be measured.
    Missing,
    /// The source (or the source id for the subject) is not configured.
    MissingSource,
}

impl Status {
    /// All statuses in the order used by the meta history.
    pub const HISTORY_ORDER: [Status; 7] = [
        Status::Perfect,
        Status::Green,
        Status::Red,
        Status::Yellow,
        Status::Grey,
        Status::Missing,
        Status::MissingSource,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Red => "red",
            Status::Yellow => "yellow",
            Status::Green => "green",
            Status::Perfect => "perfect",
            Status::Grey => "grey",
            Status::Missing => "missing",
            Status::MissingSource => "missing_source",
        }
    }

    /// Sort key used by the dashboard front end.
    pub fn status_value(self) -> u8 {
        match self {
            Status::Red => 0,
            Status::Yellow => 1,
            Status::Green => 2,
            Status::Perfect => 3,
            Status::Grey => 4,
            Status::Missing => 5,
            Status::MissingSource => 6,
        }
    }

    /// Whether a metric in this status requires direct action.
    pub fn needs_action(self) -> bool {
        matches!(self, Status::Red | Status::Missing | Status::MissingSource)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" => Ok(Status::Red),
            "yellow" => Ok(Status::Yellow),
            "green" => Ok(Status::Green),
            "perfect" => Ok(Status::Perfect),
            "grey" => Ok(Status::Grey),
            "missing" => Ok(Status::Missing),
            "missing_source" => Ok(Status::MissingSource),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_values_are_stable() {
        let values: Vec<u8> = [
            Status::Red,
            Status::Yellow,
            Status::Green,
            Status::Perfect,
            Status::Grey,
            Status::Missing,
            Status::MissingSource,
        ]
        .iter()
        .map(|status| status.status_value())
        .collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn parses_and_serializes_snake_case() {
        assert_eq!("missing_source".parse::<Status>(), Ok(Status::MissingSource));
        let json = serde_json::to_string(&Status::MissingSource).expect("serialize");
        assert_eq!(json, "\"missing_source\"");
        assert!("purple".parse::<Status>().is_err());
    }

    #[test]
    fn needs_action_for_red_and_missing() {
        assert!(Status::Red.needs_action());
        assert!(Status::MissingSource.needs_action());
        assert!(!Status::Grey.needs_action());
        assert!(!Status::Yellow.needs_action());
    }
}
