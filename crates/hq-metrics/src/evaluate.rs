//! Comparing measured values against targets.

use hq_model::format::version_parts;
use hq_model::{MetricValue, Status};

use crate::catalog::Direction;

/// Numerical value of a smiley, `None` for other texts.
pub fn smiley_value(text: &str) -> Option<i64> {
    match text {
        ":-(" => Some(0),
        ":-|" => Some(1),
        ":-)" => Some(2),
        _ => None,
    }
}

fn number(value: &MetricValue) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_text().and_then(|text| text.trim().parse().ok()))
}

fn version(value: &MetricValue) -> Vec<u32> {
    let mut parts = version_parts(&value.to_string());
    while parts.last() == Some(&0) {
        parts.pop();
    }
    parts
}

fn smiley(value: &MetricValue) -> i64 {
    value.as_text().and_then(smiley_value).unwrap_or(-1)
}

/// Whether `value` meets `target`.
pub fn is_better(direction: Direction, value: &MetricValue, target: &MetricValue) -> bool {
    match direction {
        Direction::LowerIsBetter => match (number(value), number(target)) {
            (Some(value), Some(target)) => (0.0..=target).contains(&value),
            _ => false,
        },
        Direction::HigherIsBetter => match (number(value), number(target)) {
            (Some(value), Some(target)) => value >= target,
            _ => false,
        },
        Direction::Version => version(value) >= version(target),
        Direction::Smiley => smiley(value) > smiley(target),
    }
}

/// Whether `value` and `other` denote the same value.
pub fn is_equal(value: &MetricValue, other: &MetricValue) -> bool {
    match (value.as_f64(), other.as_f64()) {
        (Some(left), Some(right)) => (left - right).abs() < f64::EPSILON,
        _ => value.to_string() == other.to_string(),
    }
}

/// Targets a measured value is compared against.
#[derive(Debug, Clone)]
pub struct Norm {
    pub direction: Direction,
    pub target: MetricValue,
    pub low_target: MetricValue,
    pub perfect: Option<MetricValue>,
    /// Currently accepted technical debt level.
    pub debt: Option<f64>,
}

impl Norm {
    fn is_below_target(&self, value: &MetricValue) -> bool {
        match self.direction {
            Direction::Smiley => smiley(value) < 2,
            direction => !is_better(direction, value, &self.target),
        }
    }

    fn needs_immediate_action(&self, value: &MetricValue) -> bool {
        match self.direction {
            Direction::Smiley => is_equal(value, &self.low_target),
            direction => !is_better(direction, value, &self.low_target),
        }
    }

    fn has_accepted_debt(&self, value: &MetricValue) -> bool {
        let Some(debt) = self.debt else {
            return false;
        };
        match self.direction {
            Direction::LowerIsBetter | Direction::HigherIsBetter => {
                self.is_below_target(value)
                    && is_better(self.direction, value, &MetricValue::Decimal(debt))
            }
            Direction::Smiley | Direction::Version => false,
        }
    }

    /// Status of a measured value. `force_red` marks values the metric itself
    /// considers alarming regardless of the targets.
    pub fn status(&self, value: &MetricValue, force_red: bool) -> Status {
        if self.has_accepted_debt(value) {
            Status::Grey
        } else if force_red || self.needs_immediate_action(value) {
            Status::Red
        } else if self.is_below_target(value) {
            Status::Yellow
        } else if self
            .perfect
            .as_ref()
            .is_some_and(|perfect| is_equal(value, perfect))
        {
            Status::Perfect
        } else {
            Status::Green
        }
    }
}
