use chrono::NaiveTime;
use log::warn;

/// Clamp a running total into the finite range of f64.
/// Infinities collapse onto the nearest finite limit, NaN onto zero.
pub fn clamp_to_limits(value: f64) -> f64 {
    if value.is_nan() {
        warn!("clamp_to_limits: NaN replaced with 0");
        return 0.0;
    }
    if value == f64::INFINITY {
        return f64::MAX;
    }
    if value == f64::NEG_INFINITY {
        return f64::MIN;
    }
    value
}

/// Constrain a value between two bounds given in either order
pub fn clamp_between(value: f64, a: f64, b: f64) -> f64 {
    let (min, max) = if a > b {
        warn!("clamp_between: minimum {} is greater than maximum {}, swapping", a, b);
        (b, a)
    } else {
        (a, b)
    };
    clamp(clamp_to_limits(value), min, max)
}

/// Constrain a value between min and max
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Convert a count of minutes into a wall-clock time of day, wrapping past midnight
pub fn time_of_day_from_minutes(minutes: f64) -> NaiveTime {
    let seconds = (clamp_to_limits(minutes) * 60.0).rem_euclid(86_400.0);
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(whole as u32, nanos.min(999_999_999))
        .unwrap_or(NaiveTime::MIN)
}
