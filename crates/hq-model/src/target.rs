//! Accepted technical debt targets.

use chrono::NaiveDateTime;

use crate::error::{ModelError, Result};
use crate::format::{format_date, format_number, space_unit};

/// Level of technical debt that is currently accepted for a metric.
#[derive(Debug, Clone, PartialEq)]
pub enum TechnicalDebtTarget {
    /// A fixed accepted value.
    Fixed { value: f64, explanation: String },
    /// A value that moves linearly from `initial_value` to `end_value`.
    Dynamic {
        initial_value: f64,
        start: NaiveDateTime,
        end_value: f64,
        end: NaiveDateTime,
        explanation: String,
    },
}

impl TechnicalDebtTarget {
    pub fn fixed(value: f64, explanation: impl Into<String>) -> Self {
        Self::Fixed {
            value,
            explanation: explanation.into(),
        }
    }

    /// Creates a debt target that changes over time.
    ///
    /// # Errors
    ///
    /// Returns an error when `end` lies before `start`.
    pub fn dynamic(
        initial_value: f64,
        start: NaiveDateTime,
        end_value: f64,
        end: NaiveDateTime,
        explanation: impl Into<String>,
    ) -> Result<Self> {
        if end < start {
            return Err(ModelError::Validation(
                "initial datetime should be before end datetime".to_string(),
            ));
        }
        Ok(Self::Dynamic {
            initial_value,
            start,
            end_value,
            end,
            explanation: explanation.into(),
        })
    }

    /// The accepted value at `now`.
    pub fn target_value(&self, now: NaiveDateTime) -> f64 {
        match self {
            Self::Fixed { value, .. } => *value,
            Self::Dynamic {
                initial_value,
                start,
                end_value,
                end,
                ..
            } => {
                if now < *start {
                    *initial_value
                } else if now > *end {
                    *end_value
                } else {
                    let period = (*end - *start).num_seconds() as f64;
                    if period == 0.0 {
                        return *end_value;
                    }
                    let fraction = (now - *start).num_seconds() as f64 / period;
                    (fraction * (end_value - initial_value) + initial_value).round()
                }
            }
        }
    }

    /// Dutch explanation of the accepted debt, appended to the metric comment.
    pub fn explanation(&self, unit: &str, now: NaiveDateTime) -> String {
        let unit = space_unit(unit);
        let mut text = format!(
            "De op dit moment geaccepteerde technische schuld is {}{unit}.",
            format_number(self.target_value(now))
        );
        let extra = match self {
            Self::Fixed { explanation, .. } | Self::Dynamic { explanation, .. } => explanation,
        };
        if !extra.is_empty() {
            text.push(' ');
            text.push_str(extra);
        }
        if let Self::Dynamic {
            initial_value,
            start,
            end_value,
            end,
            ..
        } = self
        {
            return format!(
                "Het doel is dat de technische schuld vermindert van {}{unit} op {} naar {}{unit} op {}. {text}",
                format_number(*initial_value),
                format_date(Some(start.date()), true),
                format_number(*end_value),
                format_date(Some(end.date()), true),
            );
        }
        text
    }
}

/// Explanation for a low target that deviates from the metric's default.
pub fn adapted_target_explanation(default_low_target: &str, low_target: &str, unit: &str) -> String {
    let unit = space_unit(unit);
    format!("De norm is aangepast van {default_low_target}{unit} (default) naar {low_target}{unit}.")
}
