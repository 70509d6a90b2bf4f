// Value errors: construction validation, key lookups, time consistency

use super::ids::{ConstantKey, DynamicKey};
use thiserror::Error;

/// Rejections raised while building a dynamic value
#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum ValidationError {
    #[error("Value must be non-zero")]
    ZeroValue,
    #[error("Duration must be greater than zero (got {0})")]
    NonPositiveDuration(f64),
    #[error("Stacks must be greater than zero")]
    NonPositiveStacks,
    #[error("Value from ({0}) must not be equal to value to")]
    EqualBounds(f64),
    #[error("Interval value must be greater than zero (got {0})")]
    NonPositiveIntervalValue(f64),
    #[error("Interval value must be non-zero")]
    ZeroIntervalValue,
    #[error("Interval duration must be greater than zero (got {0})")]
    NonPositiveIntervalDuration(f64),
    #[error("Value {0} is not a finite number")]
    NonFinite(f64),
}

/// Controller and dynamic value errors
#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum ValueError {
    #[error("Invalid dynamic value: {0}")]
    Validation(#[from] ValidationError),
    #[error("Constant value {0} not found")]
    ConstantNotFound(ConstantKey),
    #[error("Dynamic value {0} not found")]
    DynamicNotFound(DynamicKey),
    #[error("Time {current} is earlier than the previous update time {last}")]
    TimeRewound { current: f64, last: f64 },
    #[error("Time {0} is negative")]
    NegativeTime(f64),
    #[error("Time {0} is not a finite number")]
    NonFiniteTime(f64),
}
