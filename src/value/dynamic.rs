//! Dynamic value: one time-driven numeric quantity.
//!
//! A value moves through `Active -> Lapsed -> Disposed`. Each call to
//! [`DynamicValue::update`] advances it by the time elapsed since the
//! previous call, according to the law of its [`ValueKind`]. Threshold
//! crossings fire the value's own subscribers immediately and are queued as
//! [`ValueEvent`]s for the owning controller to act on.

use super::callbacks::{CallbackIds, CallbackList};
use super::error::{ValidationError, ValueError};
use super::ids::{CallbackId, DynamicKey};
use super::kind::{DisposalMode, UpdateMode, ValueKind, ValueSpec};
use crate::config::{MAX_CATCH_UP_STEPS, TIME_EPSILON};
use crate::debug_value;
use crate::utils::{clamp_between, clamp_to_limits};
use log::{error, warn};

/// Subscriber attached directly to a dynamic value
pub type ValueCallback = dyn FnMut(&DynamicValue);

/// Threshold crossings reported by an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueEvent {
    IntervalLapsed,
    StackLapsed,
    ValueLapsed,
}

pub struct DynamicValue {
    key: DynamicKey,
    kind: ValueKind,
    disposal: DisposalMode,
    direction: f64, // +1 toward larger numbers, -1 toward smaller
    value_from: f64,
    value_to: f64,
    magnitude: f64,
    current: f64,
    last: f64,
    remaining: f64,
    stacks: u32,
    lapsed: bool,
    disposed: bool,
    last_update_time: Option<f64>,
    pending: Vec<ValueEvent>,
    callback_ids: CallbackIds,
    value_lapsed: CallbackList<ValueCallback>,
    stack_lapsed: CallbackList<ValueCallback>,
    interval_lapsed: CallbackList<ValueCallback>,
}

fn direction_between(from: f64, to: f64) -> f64 {
    if from < to { 1.0 } else { -1.0 }
}

impl DynamicValue {
    /// Builds a value from a validated spec
    pub fn new(key: DynamicKey, spec: ValueSpec) -> Result<Self, ValidationError> {
        spec.validate()?;

        let (value_from, value_to, direction, remaining) = match spec.kind {
            ValueKind::Simple {
                value,
                duration,
                mode,
            } => {
                let sign = value.signum();
                match mode {
                    UpdateMode::FromZeroToValue => (0.0, value, sign, duration),
                    UpdateMode::FromValueToZero => (value, 0.0, -sign, duration),
                }
            }
            ValueKind::Counter {
                from,
                to,
                interval_duration,
                ..
            }
            | ValueKind::IntervalsLooped {
                from,
                to,
                interval_duration,
                ..
            } => (from, to, direction_between(from, to), interval_duration),
            ValueKind::Timer { interval_duration } => (0.0, 0.0, 1.0, interval_duration),
            ValueKind::Continuous {
                from,
                interval_value,
                interval_duration,
            } => {
                let limit = if interval_value > 0.0 { f64::MAX } else { f64::MIN };
                (from, limit, interval_value.signum(), interval_duration)
            }
            ValueKind::ContinuousLooped { from, to, duration } => {
                (from, to, direction_between(from, to), duration)
            }
        };
        let stacks = match spec.kind {
            ValueKind::Simple { .. } => spec.stacks,
            _ => 1,
        };

        Ok(DynamicValue {
            key,
            kind: spec.kind,
            // Looping kinds never lapse, so only the host can remove them
            disposal: if spec.kind.is_looping() {
                DisposalMode::Manual
            } else {
                spec.disposal
            },
            direction,
            value_from,
            value_to,
            magnitude: clamp_to_limits((value_from - value_to).abs()),
            current: value_from,
            last: value_from,
            remaining,
            stacks,
            lapsed: false,
            disposed: false,
            last_update_time: None,
            pending: Vec::new(),
            callback_ids: CallbackIds::default(),
            value_lapsed: CallbackList::default(),
            stack_lapsed: CallbackList::default(),
            interval_lapsed: CallbackList::default(),
        })
    }

    // --- Accessors ---

    pub fn key(&self) -> DynamicKey {
        self.key
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn disposal_mode(&self) -> DisposalMode {
        self.disposal
    }

    /// Ramp direction, only meaningful for simple values
    pub fn update_mode(&self) -> Option<UpdateMode> {
        match self.kind {
            ValueKind::Simple { mode, .. } => Some(mode),
            _ => None,
        }
    }

    pub fn value_from(&self) -> f64 {
        self.value_from
    }

    pub fn value_to(&self) -> f64 {
        self.value_to
    }

    /// Distance between the start and target anchors
    pub fn value(&self) -> f64 {
        self.magnitude
    }

    pub fn current_value(&self) -> f64 {
        self.current
    }

    pub fn last_value(&self) -> f64 {
        self.last
    }

    /// Change applied by the most recent update
    pub fn delta_value(&self) -> f64 {
        self.current - self.last
    }

    pub fn interval_value(&self) -> f64 {
        match self.kind {
            ValueKind::Counter { interval_value, .. }
            | ValueKind::IntervalsLooped { interval_value, .. } => interval_value,
            ValueKind::Continuous { interval_value, .. } => interval_value.abs(),
            _ => 0.0,
        }
    }

    pub fn interval_duration(&self) -> f64 {
        match self.kind {
            ValueKind::Counter {
                interval_duration, ..
            }
            | ValueKind::IntervalsLooped {
                interval_duration, ..
            }
            | ValueKind::Continuous {
                interval_duration, ..
            }
            | ValueKind::Timer { interval_duration } => interval_duration,
            _ => 0.0,
        }
    }

    pub fn duration(&self) -> f64 {
        match self.kind {
            ValueKind::Simple { duration, .. } | ValueKind::ContinuousLooped { duration, .. } => {
                duration
            }
            _ => 0.0,
        }
    }

    /// Time left until the next stack, interval or cycle boundary
    pub fn remaining_duration(&self) -> f64 {
        self.remaining
    }

    pub fn stacks(&self) -> u32 {
        self.stacks
    }

    pub fn is_lapsed(&self) -> bool {
        self.lapsed
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn last_update_time(&self) -> Option<f64> {
        self.last_update_time
    }

    // --- Subscriptions ---

    pub fn on_value_lapsed(&mut self, callback: impl FnMut(&DynamicValue) + 'static) -> CallbackId {
        let id = self.callback_ids.next();
        self.value_lapsed.push(id, Box::new(callback));
        id
    }

    pub fn on_stack_lapsed(&mut self, callback: impl FnMut(&DynamicValue) + 'static) -> CallbackId {
        let id = self.callback_ids.next();
        self.stack_lapsed.push(id, Box::new(callback));
        id
    }

    pub fn on_interval_lapsed(
        &mut self,
        callback: impl FnMut(&DynamicValue) + 'static,
    ) -> CallbackId {
        let id = self.callback_ids.next();
        self.interval_lapsed.push(id, Box::new(callback));
        id
    }

    /// Removes a subscriber from whichever list holds it
    pub fn unsubscribe(&mut self, id: CallbackId) -> bool {
        self.value_lapsed.remove(id) || self.stack_lapsed.remove(id) || self.interval_lapsed.remove(id)
    }

    /// Takes the events raised since the last call
    pub fn drain_events(&mut self) -> Vec<ValueEvent> {
        std::mem::take(&mut self.pending)
    }

    fn subscribers(&mut self, event: ValueEvent) -> &mut CallbackList<ValueCallback> {
        match event {
            ValueEvent::IntervalLapsed => &mut self.interval_lapsed,
            ValueEvent::StackLapsed => &mut self.stack_lapsed,
            ValueEvent::ValueLapsed => &mut self.value_lapsed,
        }
    }

    fn emit(&mut self, event: ValueEvent) {
        debug_value!(self.key, "{} {:?} at {}", self.kind.name(), event, self.current);
        if !self.subscribers(event).is_empty() {
            let mut subscribers = std::mem::take(self.subscribers(event));
            for callback in subscribers.iter_mut() {
                callback(&*self);
            }
            *self.subscribers(event) = subscribers;
        }
        self.pending.push(event);
    }

    fn reached(&self, target: f64) -> bool {
        (self.direction > 0.0 && self.current >= target)
            || (self.direction < 0.0 && self.current <= target)
    }

    /// Carries whatever lies past the target back onto the start anchor.
    /// Overshoot spanning several whole ranges wraps in one go.
    fn carry_past(&self, from: f64, to: f64) -> f64 {
        let overshoot = ((self.current - to) * self.direction).max(0.0) % self.magnitude;
        from + overshoot * self.direction
    }

    /// Number of boundaries crossed once `remaining` has run out, at least one
    fn boundaries_crossed(&self, period: f64) -> f64 {
        ((-self.remaining / period).floor() + 1.0).max(1.0)
    }

    // --- Update law ---

    /// Advances the value to `current_time`.
    ///
    /// The first call only records the time. A time earlier than the previous
    /// call is rejected and leaves the value untouched.
    pub fn update(&mut self, current_time: f64) -> Result<(), ValueError> {
        if self.lapsed || self.disposed {
            return Ok(());
        }
        if !current_time.is_finite() {
            warn!("Dynamic value {}: ignoring non-finite time {}", self.key, current_time);
            return Err(ValueError::NonFiniteTime(current_time));
        }

        let delta = match self.last_update_time {
            Some(last) if current_time < last => {
                warn!(
                    "Dynamic value {}: time {} is earlier than the previous update time {}, skipping",
                    self.key, current_time, last
                );
                return Err(ValueError::TimeRewound {
                    current: current_time,
                    last,
                });
            }
            Some(last) => current_time - last,
            None => 0.0,
        };
        self.last_update_time = Some(current_time);
        self.last = self.current;
        if delta == 0.0 {
            return Ok(());
        }

        match self.kind {
            ValueKind::Simple { duration, .. } => self.update_simple(delta, duration),
            ValueKind::Counter {
                to,
                interval_value,
                interval_duration,
                ..
            } => self.update_counter(delta, to, interval_value, interval_duration),
            ValueKind::Timer { interval_duration } => self.update_timer(delta, interval_duration),
            ValueKind::Continuous {
                interval_value,
                interval_duration,
                ..
            } => self.update_continuous(delta, interval_value, interval_duration),
            ValueKind::ContinuousLooped { from, to, duration } => {
                self.update_continuous_looped(delta, from, to, duration)
            }
            ValueKind::IntervalsLooped {
                from,
                to,
                interval_value,
                interval_duration,
            } => self.update_intervals_looped(delta, from, to, interval_value, interval_duration),
        }
        Ok(())
    }

    fn update_simple(&mut self, delta: f64, duration: f64) {
        self.current += self.magnitude * self.direction * (delta / duration);
        self.remaining -= delta;

        if self.remaining > TIME_EPSILON {
            return;
        }

        let crossed = self.boundaries_crossed(duration);
        if crossed < f64::from(self.stacks) {
            // Time spilled past the last boundary counts toward the running stack
            self.remaining += crossed * duration;
            let spill = (duration - self.remaining).max(0.0);
            self.current = self.value_from + self.magnitude * self.direction * (spill / duration);
            for _ in 0..crossed as u32 {
                self.stacks -= 1;
                self.emit(ValueEvent::StackLapsed);
            }
        } else {
            while self.stacks > 1 {
                self.stacks -= 1;
                self.emit(ValueEvent::StackLapsed);
            }
            self.stacks = 0;
            self.remaining = 0.0;
            self.current = self.value_to;
            self.lapsed = true;
            self.emit(ValueEvent::ValueLapsed);
        }
    }

    fn update_counter(&mut self, delta: f64, to: f64, interval_value: f64, interval_duration: f64) {
        self.remaining -= delta;

        let mut steps = 0;
        while self.remaining <= TIME_EPSILON && steps < MAX_CATCH_UP_STEPS {
            steps += 1;
            self.emit(ValueEvent::IntervalLapsed);
            self.current += interval_value * self.direction;
            self.remaining += interval_duration;
            if self.reached(to) {
                self.lapsed = true;
                self.emit(ValueEvent::ValueLapsed);
                break;
            }
        }
    }

    fn update_timer(&mut self, delta: f64, interval_duration: f64) {
        self.remaining -= delta;

        let mut steps = 0;
        while self.remaining <= TIME_EPSILON && steps < MAX_CATCH_UP_STEPS {
            steps += 1;
            self.emit(ValueEvent::IntervalLapsed);
            self.remaining += interval_duration;
        }
    }

    fn update_continuous(&mut self, delta: f64, interval_value: f64, interval_duration: f64) {
        self.remaining -= delta;

        let mut steps = 0;
        while self.remaining <= TIME_EPSILON && steps < MAX_CATCH_UP_STEPS {
            steps += 1;
            self.emit(ValueEvent::IntervalLapsed);
            self.current = clamp_to_limits(self.current + interval_value);
            self.remaining += interval_duration;
            if self.reached(self.value_to) {
                self.lapsed = true;
                self.emit(ValueEvent::ValueLapsed);
                break;
            }
        }
    }

    fn update_continuous_looped(&mut self, delta: f64, from: f64, to: f64, duration: f64) {
        self.current += self.magnitude * self.direction * (delta / duration);
        self.remaining -= delta;

        // Fires no events, so any number of whole cycles settles at once
        if self.remaining <= TIME_EPSILON {
            self.remaining += self.boundaries_crossed(duration) * duration;
            self.current = self.carry_past(from, to);
        }
    }

    fn update_intervals_looped(
        &mut self,
        delta: f64,
        from: f64,
        to: f64,
        interval_value: f64,
        interval_duration: f64,
    ) {
        self.remaining -= delta;

        let mut steps = 0;
        while self.remaining <= TIME_EPSILON && steps < MAX_CATCH_UP_STEPS {
            steps += 1;
            self.emit(ValueEvent::IntervalLapsed);
            self.current += interval_value * self.direction;
            self.remaining += interval_duration;
            if self.reached(to) {
                self.current = self.carry_past(from, to);
            }
        }
    }

    // --- Direct manipulation ---

    pub fn add_stacks(&mut self, count: i32) {
        self.stacks = self.stacks.saturating_add(count.unsigned_abs());
        debug_value!(self.key, "stacks raised to {}", self.stacks);
    }

    /// Lowers the stack count. Reaching zero forces the value to lapse
    /// without touching its progression.
    pub fn remove_stacks(&mut self, count: i32) {
        self.stacks = self.stacks.saturating_sub(count.unsigned_abs());
        debug_value!(self.key, "stacks lowered to {}", self.stacks);
        if self.stacks == 0 && !self.lapsed && !self.disposed {
            self.emit(ValueEvent::StackLapsed);
            self.lapsed = true;
            self.emit(ValueEvent::ValueLapsed);
        }
    }

    /// Sets the current value silently, clamped between the two anchors
    pub fn change_current_value(&mut self, value: f64) {
        self.current = clamp_between(value, self.value_from, self.value_to);
        self.last = self.current;
    }

    pub fn change_last_update_time(&mut self, time: f64) -> Result<(), ValueError> {
        if time < 0.0 {
            error!("Dynamic value {}: last update time {} is less than 0", self.key, time);
            return Err(ValueError::NegativeTime(time));
        }
        if !time.is_finite() {
            error!("Dynamic value {}: last update time {} is not finite", self.key, time);
            return Err(ValueError::NonFiniteTime(time));
        }
        self.last_update_time = Some(time);
        Ok(())
    }

    /// Drops every subscriber and makes further updates no-ops
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.value_lapsed.clear();
        self.stack_lapsed.clear();
        self.interval_lapsed.clear();
        self.pending.clear();
        self.disposed = true;
        debug_value!(self.key, "disposed");
    }
}

impl std::fmt::Debug for DynamicValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicValue")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("disposal", &self.disposal)
            .field("current", &self.current)
            .field("remaining", &self.remaining)
            .field("stacks", &self.stacks)
            .field("lapsed", &self.lapsed)
            .field("disposed", &self.disposed)
            .finish()
    }
}
