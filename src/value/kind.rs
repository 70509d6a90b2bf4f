//! Dynamic value kinds, their fixed parameters, and construction requests.
//!
//! Each [`ValueKind`] variant carries only the parameters its update law
//! needs. A [`ValueSpec`] bundles a kind with the stack count and disposal
//! policy and is what the controller validates before registering a value.

use super::error::ValidationError;

/// Direction of a simple ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Start at 0 and ramp toward the value.
    #[default]
    FromZeroToValue,
    /// Start at the value and ramp toward 0.
    FromValueToZero,
}

/// What the controller does with a dynamic value once it lapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisposalMode {
    /// Leave it registered; the host removes it.
    #[default]
    Manual,
    /// Remove it as soon as it lapses.
    Automatic,
    /// Fold its final value into the constants, then remove it.
    AutomaticAddToConstants,
}

impl DisposalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisposalMode::Manual => "manual",
            DisposalMode::Automatic => "automatic",
            DisposalMode::AutomaticAddToConstants => "automatic+constants",
        }
    }
}

/// Update law of a dynamic value and the parameters fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    /// Linear ramp between 0 and `value` over `duration`, repeated per stack.
    Simple {
        value: f64,
        duration: f64,
        mode: UpdateMode,
    },
    /// Steps by `interval_value` every `interval_duration` until `to` is reached.
    Counter {
        from: f64,
        to: f64,
        interval_value: f64,
        interval_duration: f64,
    },
    /// Fires an interval event every `interval_duration`, forever.
    Timer { interval_duration: f64 },
    /// Steps from `from` toward the largest (positive `interval_value`) or
    /// smallest (negative `interval_value`) finite number.
    Continuous {
        from: f64,
        interval_value: f64,
        interval_duration: f64,
    },
    /// Linear ramp from `from` to `to` over `duration`, wrapping forever.
    ContinuousLooped { from: f64, to: f64, duration: f64 },
    /// Counter that wraps back to `from` instead of lapsing.
    IntervalsLooped {
        from: f64,
        to: f64,
        interval_value: f64,
        interval_duration: f64,
    },
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Simple { .. } => "simple",
            ValueKind::Counter { .. } => "counter",
            ValueKind::Timer { .. } => "timer",
            ValueKind::Continuous { .. } => "continuous",
            ValueKind::ContinuousLooped { .. } => "continuous-looped",
            ValueKind::IntervalsLooped { .. } => "intervals-looped",
        }
    }

    /// Looping kinds restart forever and never lapse on their own.
    pub fn is_looping(&self) -> bool {
        matches!(
            self,
            ValueKind::Timer { .. }
                | ValueKind::ContinuousLooped { .. }
                | ValueKind::IntervalsLooped { .. }
        )
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            ValueKind::Simple { value, duration, .. } => {
                finite(&[value, duration])?;
                if value == 0.0 {
                    return Err(ValidationError::ZeroValue);
                }
                positive_duration(duration)
            }
            ValueKind::Counter {
                from,
                to,
                interval_value,
                interval_duration,
            }
            | ValueKind::IntervalsLooped {
                from,
                to,
                interval_value,
                interval_duration,
            } => {
                finite(&[from, to, interval_value, interval_duration])?;
                distinct(from, to)?;
                if interval_value <= 0.0 {
                    return Err(ValidationError::NonPositiveIntervalValue(interval_value));
                }
                positive_interval(interval_duration)
            }
            ValueKind::Timer { interval_duration } => {
                finite(&[interval_duration])?;
                positive_interval(interval_duration)
            }
            ValueKind::Continuous {
                from,
                interval_value,
                interval_duration,
            } => {
                finite(&[from, interval_value, interval_duration])?;
                if interval_value == 0.0 {
                    return Err(ValidationError::ZeroIntervalValue);
                }
                positive_interval(interval_duration)
            }
            ValueKind::ContinuousLooped { from, to, duration } => {
                finite(&[from, to, duration])?;
                distinct(from, to)?;
                positive_duration(duration)
            }
        }
    }
}

fn finite(values: &[f64]) -> Result<(), ValidationError> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(v) => Err(ValidationError::NonFinite(*v)),
        None => Ok(()),
    }
}

fn distinct(from: f64, to: f64) -> Result<(), ValidationError> {
    if from == to {
        Err(ValidationError::EqualBounds(from))
    } else {
        Ok(())
    }
}

fn positive_duration(duration: f64) -> Result<(), ValidationError> {
    if duration <= 0.0 {
        Err(ValidationError::NonPositiveDuration(duration))
    } else {
        Ok(())
    }
}

fn positive_interval(interval_duration: f64) -> Result<(), ValidationError> {
    if interval_duration <= 0.0 {
        Err(ValidationError::NonPositiveIntervalDuration(interval_duration))
    } else {
        Ok(())
    }
}

/// A request to build one dynamic value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueSpec {
    pub kind: ValueKind,
    pub stacks: u32,
    pub disposal: DisposalMode,
}

impl ValueSpec {
    pub fn simple(value: f64, duration: f64, mode: UpdateMode, disposal: DisposalMode) -> Self {
        ValueSpec {
            kind: ValueKind::Simple {
                value,
                duration,
                mode,
            },
            stacks: 1,
            disposal,
        }
    }

    pub fn stacked(
        value: f64,
        duration: f64,
        stacks: u32,
        mode: UpdateMode,
        disposal: DisposalMode,
    ) -> Self {
        ValueSpec {
            stacks,
            ..Self::simple(value, duration, mode, disposal)
        }
    }

    pub fn counter(
        from: f64,
        to: f64,
        interval_value: f64,
        interval_duration: f64,
        disposal: DisposalMode,
    ) -> Self {
        ValueSpec {
            kind: ValueKind::Counter {
                from,
                to,
                interval_value,
                interval_duration,
            },
            stacks: 1,
            disposal,
        }
    }

    pub fn timer(interval_duration: f64) -> Self {
        ValueSpec {
            kind: ValueKind::Timer { interval_duration },
            stacks: 1,
            disposal: DisposalMode::Manual,
        }
    }

    pub fn continuous(
        from: f64,
        interval_value: f64,
        interval_duration: f64,
        disposal: DisposalMode,
    ) -> Self {
        ValueSpec {
            kind: ValueKind::Continuous {
                from,
                interval_value,
                interval_duration,
            },
            stacks: 1,
            disposal,
        }
    }

    pub fn continuous_looped(from: f64, to: f64, duration: f64) -> Self {
        ValueSpec {
            kind: ValueKind::ContinuousLooped { from, to, duration },
            stacks: 1,
            disposal: DisposalMode::Manual,
        }
    }

    pub fn intervals_looped(from: f64, to: f64, interval_value: f64, interval_duration: f64) -> Self {
        ValueSpec {
            kind: ValueKind::IntervalsLooped {
                from,
                to,
                interval_value,
                interval_duration,
            },
            stacks: 1,
            disposal: DisposalMode::Manual,
        }
    }

    /// Checks every kind-specific precondition.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stacks == 0 {
            return Err(ValidationError::NonPositiveStacks);
        }
        self.kind.validate()
    }
}
