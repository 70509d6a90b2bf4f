//! Value controller: registry and scheduler for constant and dynamic values.
//!
//! The host calls [`ValueController::update`] (or [`ValueController::fixed_update`],
//! depending on the configured cadence) once per frame with its clock. While
//! not suspended, every registered dynamic value is advanced in registration
//! order, and the events each one raises are dispatched before the next value
//! is updated: controller subscribers are notified, the disposal policy of
//! lapsed values is applied, and any [`Commands`] queued by subscribers run.

use super::callbacks::{CallbackIds, CallbackList};
use super::dynamic::{DynamicValue, ValueEvent};
use super::error::ValueError;
use super::ids::{CallbackId, ConstantKey, DynamicKey, KeyAllocator};
use super::kind::{DisposalMode, UpdateMode, ValueSpec};
use crate::config::{ControllerConfig, UpdateCadence};
use crate::debug_controller;
use crate::utils::clamp_to_limits;
use log::error;
use std::collections::BTreeMap;

/// Controller-wide subscriber. Mutations of the controller go through `Commands`.
pub type ControllerCallback = dyn FnMut(&DynamicValue, &mut Commands);

/// A controller mutation requested from inside a callback
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddConstant(f64),
    RemoveConstant(ConstantKey),
    AddDynamic(ValueSpec),
    RemoveDynamic(DynamicKey),
    SuspendUpdates,
}

/// Deferred mutations, applied once the triggering value has finished updating
#[derive(Debug, Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    pub fn add_constant_value(&mut self, value: f64) {
        self.queue.push(Command::AddConstant(value));
    }

    pub fn remove_constant_value(&mut self, key: ConstantKey) {
        self.queue.push(Command::RemoveConstant(key));
    }

    /// The new value starts ticking on the next tick
    pub fn add_dynamic_value(&mut self, spec: ValueSpec) {
        self.queue.push(Command::AddDynamic(spec));
    }

    pub fn remove_dynamic_value(&mut self, key: DynamicKey) {
        self.queue.push(Command::RemoveDynamic(key));
    }

    pub fn suspend_updates(&mut self) {
        self.queue.push(Command::SuspendUpdates);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[derive(Debug)]
pub struct ValueController {
    config: ControllerConfig,
    keys: KeyAllocator,
    constants: BTreeMap<ConstantKey, f64>,
    // Keys are allocated monotonically, so key order is registration order
    dynamics: BTreeMap<DynamicKey, DynamicValue>,
    suspended: bool,
    ignore_idle_time: bool,
    callback_ids: CallbackIds,
    value_lapsed: CallbackList<ControllerCallback>,
    stack_lapsed: CallbackList<ControllerCallback>,
    interval_lapsed: CallbackList<ControllerCallback>,
}

impl Default for ValueController {
    fn default() -> Self {
        Self::with_config(ControllerConfig::default())
    }
}

impl ValueController {
    /// A per-frame controller. Starts suspended.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ControllerConfig) -> Self {
        ValueController {
            config,
            keys: KeyAllocator::new(),
            constants: BTreeMap::new(),
            dynamics: BTreeMap::new(),
            suspended: true,
            ignore_idle_time: false,
            callback_ids: CallbackIds::default(),
            value_lapsed: CallbackList::default(),
            stack_lapsed: CallbackList::default(),
            interval_lapsed: CallbackList::default(),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    // --- Start / suspend ---

    pub fn start_updates(&mut self) {
        self.start_updates_ignoring_idle(false);
    }

    /// Resumes updates. With `ignore_idle_time` the next tick restarts every
    /// value's clock, so time spent suspended is not caught up.
    pub fn start_updates_ignoring_idle(&mut self, ignore_idle_time: bool) {
        if !self.suspended {
            return;
        }
        self.suspended = false;
        self.ignore_idle_time = ignore_idle_time;
        debug_controller!("updates started (ignore idle time: {})", ignore_idle_time);
    }

    pub fn suspend_updates(&mut self) {
        if !self.suspended {
            debug_controller!("updates suspended");
        }
        self.suspended = true;
    }

    pub fn is_updating(&self) -> bool {
        !self.suspended
    }

    // --- Constant values ---

    pub fn add_constant_value(&mut self, value: f64) -> ConstantKey {
        let key = self.keys.alloc_constant();
        self.constants.insert(key, clamp_to_limits(value));
        key
    }

    pub fn get_constant_value(&self, key: ConstantKey) -> Result<f64, ValueError> {
        self.constants.get(&key).copied().ok_or_else(|| {
            error!("ValueController::get_constant_value: key {} not found", key);
            ValueError::ConstantNotFound(key)
        })
    }

    pub fn change_constant_value(&mut self, key: ConstantKey, value: f64) -> Result<(), ValueError> {
        match self.constants.get_mut(&key) {
            Some(slot) => {
                *slot = clamp_to_limits(value);
                Ok(())
            }
            None => {
                error!("ValueController::change_constant_value: key {} not found", key);
                Err(ValueError::ConstantNotFound(key))
            }
        }
    }

    pub fn contains_constant_value(&self, key: ConstantKey) -> bool {
        self.constants.contains_key(&key)
    }

    pub fn remove_constant_value(&mut self, key: ConstantKey) -> Result<(), ValueError> {
        match self.constants.remove(&key) {
            Some(_) => Ok(()),
            None => {
                error!("ValueController::remove_constant_value: key {} not found", key);
                Err(ValueError::ConstantNotFound(key))
            }
        }
    }

    pub fn remove_all_constant_values(&mut self) {
        self.constants.clear();
    }

    /// Folds every constant into one carrying their sum.
    /// Returns the new key, or `None` when nothing was added (one or no
    /// constants, or a zero sum).
    pub fn combine_constant_values(&mut self) -> Option<ConstantKey> {
        if self.constants.len() <= 1 {
            return None;
        }
        let total = self.get_constant_values_total();
        let folded = self.constants.len();
        self.remove_all_constant_values();
        if total == 0.0 {
            debug_controller!("combined {} constants into nothing", folded);
            return None;
        }
        let key = self.add_constant_value(total);
        debug_controller!("combined {} constants into {} = {}", folded, key, total);
        Some(key)
    }

    pub fn constant_value_count(&self) -> usize {
        self.constants.len()
    }

    // --- Dynamic values ---

    /// Validates and registers a dynamic value
    pub fn add_dynamic_value(&mut self, spec: ValueSpec) -> Result<DynamicKey, ValueError> {
        if let Err(e) = spec.validate() {
            error!("ValueController::add_dynamic_value: {}", e);
            return Err(e.into());
        }
        let key = self.keys.alloc_dynamic();
        let value = DynamicValue::new(key, spec)?;
        debug_controller!(
            "added {} value {} ({})",
            value.kind().name(),
            key,
            value.disposal_mode().as_str()
        );
        self.dynamics.insert(key, value);
        Ok(key)
    }

    pub fn add_simple(
        &mut self,
        value: f64,
        duration: f64,
        mode: UpdateMode,
        disposal: DisposalMode,
    ) -> Result<DynamicKey, ValueError> {
        self.add_dynamic_value(ValueSpec::simple(value, duration, mode, disposal))
    }

    pub fn add_stacked(
        &mut self,
        value: f64,
        duration: f64,
        stacks: u32,
        mode: UpdateMode,
        disposal: DisposalMode,
    ) -> Result<DynamicKey, ValueError> {
        self.add_dynamic_value(ValueSpec::stacked(value, duration, stacks, mode, disposal))
    }

    pub fn add_counter(
        &mut self,
        from: f64,
        to: f64,
        interval_value: f64,
        interval_duration: f64,
        disposal: DisposalMode,
    ) -> Result<DynamicKey, ValueError> {
        self.add_dynamic_value(ValueSpec::counter(
            from,
            to,
            interval_value,
            interval_duration,
            disposal,
        ))
    }

    pub fn add_timer(&mut self, interval_duration: f64) -> Result<DynamicKey, ValueError> {
        self.add_dynamic_value(ValueSpec::timer(interval_duration))
    }

    pub fn add_continuous(
        &mut self,
        from: f64,
        interval_value: f64,
        interval_duration: f64,
        disposal: DisposalMode,
    ) -> Result<DynamicKey, ValueError> {
        self.add_dynamic_value(ValueSpec::continuous(
            from,
            interval_value,
            interval_duration,
            disposal,
        ))
    }

    pub fn add_continuous_looped(
        &mut self,
        from: f64,
        to: f64,
        duration: f64,
    ) -> Result<DynamicKey, ValueError> {
        self.add_dynamic_value(ValueSpec::continuous_looped(from, to, duration))
    }

    pub fn add_intervals_looped(
        &mut self,
        from: f64,
        to: f64,
        interval_value: f64,
        interval_duration: f64,
    ) -> Result<DynamicKey, ValueError> {
        self.add_dynamic_value(ValueSpec::intervals_looped(
            from,
            to,
            interval_value,
            interval_duration,
        ))
    }

    pub fn contains_dynamic_value(&self, key: DynamicKey) -> bool {
        self.dynamics.contains_key(&key)
    }

    pub fn get_dynamic_value(&self, key: DynamicKey) -> Result<&DynamicValue, ValueError> {
        self.dynamics.get(&key).ok_or_else(|| {
            error!("ValueController::get_dynamic_value: key {} not found", key);
            ValueError::DynamicNotFound(key)
        })
    }

    /// Mutable access for subscriptions and silent adjustments. Events raised
    /// through this reference are dispatched at the start of the next tick.
    pub fn get_dynamic_value_mut(&mut self, key: DynamicKey) -> Result<&mut DynamicValue, ValueError> {
        self.dynamics.get_mut(&key).ok_or_else(|| {
            error!("ValueController::get_dynamic_value_mut: key {} not found", key);
            ValueError::DynamicNotFound(key)
        })
    }

    /// Unregisters and disposes a dynamic value
    pub fn remove_dynamic_value(&mut self, key: DynamicKey) -> Result<(), ValueError> {
        match self.dynamics.remove(&key) {
            Some(mut value) => {
                value.dispose();
                debug_controller!("removed value {}", key);
                Ok(())
            }
            None => {
                error!("ValueController::remove_dynamic_value: key {} not found", key);
                Err(ValueError::DynamicNotFound(key))
            }
        }
    }

    pub fn remove_all_dynamic_values(&mut self) {
        let keys: Vec<DynamicKey> = self.dynamics.keys().copied().collect();
        for key in keys {
            let _ = self.remove_dynamic_value(key);
        }
    }

    pub fn dynamic_value_count(&self) -> usize {
        self.dynamics.len()
    }

    /// Registered keys in registration order
    pub fn dynamic_keys(&self) -> impl Iterator<Item = DynamicKey> + '_ {
        self.dynamics.keys().copied()
    }

    pub fn add_stacks(&mut self, key: DynamicKey, count: i32) -> Result<(), ValueError> {
        self.get_dynamic_value_mut(key)?.add_stacks(count);
        Ok(())
    }

    /// Removes stacks and handles a forced lapse right away
    pub fn remove_stacks(&mut self, key: DynamicKey, count: i32) -> Result<(), ValueError> {
        let value = self.get_dynamic_value_mut(key)?;
        value.remove_stacks(count);
        let events = value.drain_events();
        self.dispatch(key, events);
        Ok(())
    }

    // --- Totals ---

    pub fn get_constant_values_total(&self) -> f64 {
        clamp_to_limits(self.constants.values().sum())
    }

    /// Sum of the current values. With `include_stacks`, every stack still
    /// waiting to run adds the start value of a fresh cycle.
    pub fn get_dynamic_values_total(&self, include_stacks: bool) -> f64 {
        let total: f64 = if include_stacks {
            self.dynamics
                .values()
                .map(|v| v.current_value() + v.value_from() * v.stacks().saturating_sub(1) as f64)
                .sum()
        } else {
            self.dynamics.values().map(DynamicValue::current_value).sum()
        };
        clamp_to_limits(total)
    }

    pub fn get_all_values_total(&self, include_stacks: bool) -> f64 {
        clamp_to_limits(self.get_constant_values_total() + self.get_dynamic_values_total(include_stacks))
    }

    // --- Subscriptions ---

    pub fn on_value_lapsed(
        &mut self,
        callback: impl FnMut(&DynamicValue, &mut Commands) + 'static,
    ) -> CallbackId {
        let id = self.callback_ids.next();
        self.value_lapsed.push(id, Box::new(callback));
        id
    }

    pub fn on_stack_lapsed(
        &mut self,
        callback: impl FnMut(&DynamicValue, &mut Commands) + 'static,
    ) -> CallbackId {
        let id = self.callback_ids.next();
        self.stack_lapsed.push(id, Box::new(callback));
        id
    }

    pub fn on_interval_lapsed(
        &mut self,
        callback: impl FnMut(&DynamicValue, &mut Commands) + 'static,
    ) -> CallbackId {
        let id = self.callback_ids.next();
        self.interval_lapsed.push(id, Box::new(callback));
        id
    }

    pub fn unsubscribe(&mut self, id: CallbackId) -> bool {
        self.value_lapsed.remove(id) || self.stack_lapsed.remove(id) || self.interval_lapsed.remove(id)
    }

    // --- Updates ---

    /// Per-frame tick; does nothing unless the cadence is `PerFrame`
    pub fn update(&mut self, current_time: f64) {
        if self.config.cadence == UpdateCadence::PerFrame {
            self.tick(current_time);
        }
    }

    /// Fixed-step tick; does nothing unless the cadence is `FixedStep`
    pub fn fixed_update(&mut self, current_time: f64) {
        if self.config.cadence == UpdateCadence::FixedStep {
            self.tick(current_time);
        }
    }

    fn tick(&mut self, current_time: f64) {
        if self.suspended || self.dynamics.is_empty() {
            return;
        }
        // Kept until a tick can actually restart the clocks
        if self.ignore_idle_time && self.reset_last_update_time(current_time) {
            self.ignore_idle_time = false;
        }

        // Values added while dispatching start ticking next time
        let keys: Vec<DynamicKey> = self.dynamics.keys().copied().collect();

        for &key in &keys {
            if let Some(value) = self.dynamics.get_mut(&key) {
                let events = value.drain_events();
                self.dispatch(key, events);
            }
        }

        for key in keys {
            let Some(value) = self.dynamics.get_mut(&key) else {
                continue;
            };
            if value.update(current_time).is_err() {
                continue;
            }
            let events = value.drain_events();
            self.dispatch(key, events);
        }
    }

    /// Restarts every value's clock at `time`, or none of them
    fn reset_last_update_time(&mut self, time: f64) -> bool {
        if !time.is_finite() || time < 0.0 {
            error!("ValueController: cannot reset clocks to {}", time);
            return false;
        }
        for value in self.dynamics.values_mut() {
            let _ = value.change_last_update_time(time);
        }
        true
    }

    fn dispatch(&mut self, key: DynamicKey, events: Vec<ValueEvent>) {
        if events.is_empty() {
            return;
        }
        let mut commands = Commands::default();
        for event in events {
            self.notify(key, event, &mut commands);
            if event == ValueEvent::ValueLapsed {
                self.dispose_lapsed(key);
            }
        }
        self.apply(commands);
    }

    fn notify(&mut self, key: DynamicKey, event: ValueEvent, commands: &mut Commands) {
        let Some(value) = self.dynamics.get(&key) else {
            return;
        };
        let subscribers = match event {
            ValueEvent::IntervalLapsed => &mut self.interval_lapsed,
            ValueEvent::StackLapsed => &mut self.stack_lapsed,
            ValueEvent::ValueLapsed => &mut self.value_lapsed,
        };
        for callback in subscribers.iter_mut() {
            callback(value, &mut *commands);
        }
    }

    fn dispose_lapsed(&mut self, key: DynamicKey) {
        let Some(value) = self.dynamics.get(&key) else {
            error!("ValueController: lapsed value {} not found", key);
            return;
        };
        let current = value.current_value();
        match value.disposal_mode() {
            DisposalMode::Manual => {
                debug_controller!("value {} lapsed, left for the host", key);
            }
            DisposalMode::Automatic => {
                let _ = self.remove_dynamic_value(key);
            }
            DisposalMode::AutomaticAddToConstants => {
                if current != 0.0 {
                    let constant = self.add_constant_value(current);
                    debug_controller!("value {} folded into constant {} = {}", key, constant, current);
                }
                let _ = self.remove_dynamic_value(key);
            }
        }
    }

    fn apply(&mut self, commands: Commands) {
        for command in commands.queue {
            match command {
                Command::AddConstant(value) => {
                    self.add_constant_value(value);
                }
                Command::RemoveConstant(key) => {
                    let _ = self.remove_constant_value(key);
                }
                Command::AddDynamic(spec) => {
                    let _ = self.add_dynamic_value(spec);
                }
                Command::RemoveDynamic(key) => {
                    let _ = self.remove_dynamic_value(key);
                }
                Command::SuspendUpdates => self.suspend_updates(),
            }
        }
    }
}
