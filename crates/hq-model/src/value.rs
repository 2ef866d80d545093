use serde::{Deserialize, Serialize};
use std::fmt;

/// A measured or configured metric value.
///
/// Counts, ages and percentages are integers. Averages are decimals.
/// Smileys and version numbers are text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl MetricValue {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Integer(value) => Some(*value as f64),
            MetricValue::Decimal(value) => Some(*value),
            MetricValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetricValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Integer(value) => write!(f, "{value}"),
            MetricValue::Decimal(value) => write!(f, "{value:.1}"),
            MetricValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Integer(value)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Decimal(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

/// Renders an optional value, using `-1` for a value that could not be measured.
pub fn render_value(value: Option<&MetricValue>) -> String {
    value.map_or_else(|| "-1".to_string(), ToString::to_string)
}
