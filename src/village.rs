//! A small village economy driven by three value controllers.
//!
//! - day/night: sun rotation and the time of day
//! - upkeep: a timer settling income against upkeep on every tick
//! - gold: one ramped value per settlement, folded into constants once done

use crate::config::{
    ControllerConfig, DAWN_MINUTES, DAY_INCOME, DAY_LENGTH_SECONDS, DAY_UPKEEP, GOLD_RAMP_SECONDS,
    HOUSE_COUNT, MINUTES_PER_DAY, MINUTE_TICK_SECONDS, NIGHT_INCOME, NIGHT_UPKEEP, SUNSET_DEGREES,
    SUN_ROTATION_DEGREES, UPKEEP_INTERVAL_SECONDS,
};
use crate::debug_village;
use crate::utils::time_of_day_from_minutes;
use crate::value::{DisposalMode, DynamicKey, UpdateMode, ValueController, ValueError};
use chrono::NaiveTime;
use log::info;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Data shared between the village and the callbacks hooked into its values
#[derive(Debug, Clone, PartialEq)]
pub struct VillageState {
    pub time_of_day: NaiveTime,
    pub income_rate: f64,
    pub upkeep_rate: f64,
    pub total_gold: f64,
    pub is_day: bool,
    pub house_lights: [bool; HOUSE_COUNT],
    pub sun_angle: f64, // Orientation of the sun and moon rig, degrees
}

impl Default for VillageState {
    fn default() -> Self {
        VillageState {
            time_of_day: time_of_day_from_minutes(DAWN_MINUTES),
            income_rate: DAY_INCOME,
            upkeep_rate: DAY_UPKEEP,
            total_gold: 0.0,
            is_day: true,
            house_lights: [false; HOUSE_COUNT],
            sun_angle: 0.0,
        }
    }
}

impl VillageState {
    pub fn lit_houses(&self) -> usize {
        self.house_lights.iter().filter(|lit| **lit).count()
    }

    fn toggle_lights(&mut self, on: bool) {
        self.house_lights = [on; HOUSE_COUNT];
    }
}

/// End-of-run summary
#[derive(Debug, Clone, PartialEq)]
pub struct VillageReport {
    pub time_of_day: NaiveTime,
    pub total_gold: f64,
    pub income_rate: f64,
    pub upkeep_rate: f64,
    pub is_day: bool,
    pub lit_houses: usize,
}

impl fmt::Display for VillageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}), gold {:.0}, income {:.0}, upkeep {:.0}, {} of {} houses lit",
            self.time_of_day.format("%H:%M"),
            if self.is_day { "day" } else { "night" },
            self.total_gold,
            self.income_rate,
            self.upkeep_rate,
            self.lit_houses,
            HOUSE_COUNT
        )
    }
}

pub struct Village {
    state: Rc<RefCell<VillageState>>,
    day_night: ValueController,
    upkeep: ValueController,
    gold: Rc<RefCell<ValueController>>,
    sun_rotation: DynamicKey,
    time_of_day: DynamicKey,
}

impl Village {
    /// Sets up all three controllers. They start suspended.
    pub fn new(state: Rc<RefCell<VillageState>>) -> Result<Self, ValueError> {
        let mut day_night = ValueController::new();
        // Settlements run on the fixed simulation step
        let mut upkeep = ValueController::with_config(ControllerConfig::fixed_step());
        let gold = Rc::new(RefCell::new(ValueController::new()));

        let sun_rotation =
            day_night.add_continuous_looped(0.0, SUN_ROTATION_DEGREES, DAY_LENGTH_SECONDS)?;
        let time_of_day =
            day_night.add_intervals_looped(0.0, MINUTES_PER_DAY, 1.0, MINUTE_TICK_SECONDS)?;

        {
            let clock = day_night.get_dynamic_value_mut(time_of_day)?;
            // Fast-forward to dawn so the sun and the clock line up
            clock.change_current_value(DAWN_MINUTES);
            let state = Rc::clone(&state);
            clock.on_interval_lapsed(move |value| {
                state.borrow_mut().time_of_day = time_of_day_from_minutes(value.current_value());
            });
        }

        let timer = upkeep.add_timer(UPKEEP_INTERVAL_SECONDS)?;
        {
            let state = Rc::clone(&state);
            let gold = Rc::clone(&gold);
            upkeep.get_dynamic_value_mut(timer)?.on_interval_lapsed(move |_| {
                let balance = {
                    let state = state.borrow();
                    state.income_rate - state.upkeep_rate
                };
                if balance == 0.0 {
                    return;
                }
                debug_village!("settling {} gold", balance);
                // Failures are logged by the controller
                let _ = gold.borrow_mut().add_simple(
                    balance,
                    GOLD_RAMP_SECONDS,
                    UpdateMode::FromZeroToValue,
                    DisposalMode::AutomaticAddToConstants,
                );
            });
        }

        {
            let mut state = state.borrow_mut();
            state.time_of_day = time_of_day_from_minutes(DAWN_MINUTES);
            state.income_rate = DAY_INCOME;
            state.upkeep_rate = DAY_UPKEEP;
            state.is_day = true;
        }

        Ok(Village {
            state,
            day_night,
            upkeep,
            gold,
            sun_rotation,
            time_of_day,
        })
    }

    pub fn state(&self) -> Rc<RefCell<VillageState>> {
        Rc::clone(&self.state)
    }

    pub fn gold(&self) -> Rc<RefCell<ValueController>> {
        Rc::clone(&self.gold)
    }

    pub fn start(&mut self) {
        self.day_night.start_updates();
        self.upkeep.start_updates();
        self.gold.borrow_mut().start_updates();
    }

    pub fn suspend(&mut self) {
        self.day_night.suspend_updates();
        self.upkeep.suspend_updates();
        self.gold.borrow_mut().suspend_updates();
        info!("Village paused at {}", self.state.borrow().time_of_day.format("%H:%M"));
    }

    /// Resumes without fast-forwarding through the pause
    pub fn resume(&mut self) {
        self.day_night.start_updates_ignoring_idle(true);
        self.upkeep.start_updates_ignoring_idle(true);
        self.gold.borrow_mut().start_updates_ignoring_idle(true);
        info!("Village resumed at {}", self.state.borrow().time_of_day.format("%H:%M"));
    }

    pub fn is_running(&self) -> bool {
        self.day_night.is_updating()
    }

    /// Current sun angle in degrees, within one rotation
    pub fn sun_rotation(&self) -> f64 {
        self.day_night
            .get_dynamic_value(self.sun_rotation)
            .map(|v| v.current_value())
            .unwrap_or_default()
    }

    /// Minutes since midnight
    pub fn minutes(&self) -> f64 {
        self.day_night
            .get_dynamic_value(self.time_of_day)
            .map(|v| v.current_value())
            .unwrap_or_default()
    }

    /// Per-frame work: advance the sky, the gold ramps and the totals
    pub fn update(&mut self, now: f64) {
        self.day_night.update(now);
        {
            let mut gold = self.gold.borrow_mut();
            gold.update(now);
            self.state.borrow_mut().total_gold = gold.get_all_values_total(false);
            gold.combine_constant_values();
        }

        if self.day_night.is_updating() {
            let delta = self
                .day_night
                .get_dynamic_value(self.sun_rotation)
                .map(|v| v.delta_value())
                .unwrap_or_default();
            let mut state = self.state.borrow_mut();
            state.sun_angle = (state.sun_angle + delta).rem_euclid(SUN_ROTATION_DEGREES);
        }

        let sun = self.sun_rotation();
        let is_day = self.state.borrow().is_day;
        if is_day && sun >= SUNSET_DEGREES {
            self.sunset();
        } else if !is_day && sun < SUNSET_DEGREES {
            self.sunrise();
        }
    }

    /// Fixed-step work: the upkeep timer
    pub fn fixed_update(&mut self, now: f64) {
        self.upkeep.fixed_update(now);
    }

    pub fn report(&self) -> VillageReport {
        let state = self.state.borrow();
        VillageReport {
            time_of_day: state.time_of_day,
            total_gold: state.total_gold,
            income_rate: state.income_rate,
            upkeep_rate: state.upkeep_rate,
            is_day: state.is_day,
            lit_houses: state.lit_houses(),
        }
    }

    fn sunset(&mut self) {
        let mut state = self.state.borrow_mut();
        state.toggle_lights(true);
        state.income_rate = NIGHT_INCOME;
        state.upkeep_rate = NIGHT_UPKEEP;
        state.is_day = false;
        info!("Sunset at {}, lights on", state.time_of_day.format("%H:%M"));
    }

    fn sunrise(&mut self) {
        let mut state = self.state.borrow_mut();
        state.toggle_lights(false);
        state.income_rate = DAY_INCOME;
        state.upkeep_rate = DAY_UPKEEP;
        state.is_day = true;
        info!("Sunrise at {}, lights off", state.time_of_day.format("%H:%M"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use chrono::Timelike;

    fn started() -> Village {
        let mut village = Village::new(Rc::new(RefCell::new(VillageState::default()))).unwrap();
        village.start();
        village.update(0.0);
        village.fixed_update(0.0);
        village
    }

    #[test]
    fn test_starts_at_dawn() {
        let village = Village::new(Rc::new(RefCell::new(VillageState::default()))).unwrap();
        assert!(!village.is_running());
        assert_approx_eq!(village.minutes(), DAWN_MINUTES);
        let report = village.report();
        assert!(report.is_day);
        assert_eq!(report.time_of_day.hour(), 7);
        assert_eq!(report.lit_houses, 0);
    }

    #[test]
    fn test_clock_ticks_with_minutes() {
        let mut village = started();
        village.update(1.0);
        // 1 / 0.0416 gives 24 whole minute ticks
        assert_approx_eq!(village.minutes(), DAWN_MINUTES + 24.0);
        // The clock is refreshed as each tick fires, before the minute is added
        let time = village.state().borrow().time_of_day;
        assert_eq!((time.hour(), time.minute()), (7, 23));
    }

    #[test]
    fn test_sunset_and_sunrise() {
        let mut village = started();
        village.update(29.0);
        assert!(village.report().is_day);

        village.update(30.5);
        let report = village.report();
        assert!(!report.is_day);
        assert_eq!(report.lit_houses, HOUSE_COUNT);
        assert_approx_eq!(report.income_rate, NIGHT_INCOME);
        assert_approx_eq!(report.upkeep_rate, NIGHT_UPKEEP);

        village.update(60.5);
        let report = village.report();
        assert!(report.is_day);
        assert_eq!(report.lit_houses, 0);
        assert_approx_eq!(report.income_rate, DAY_INCOME);
        let state = village.state();
        assert_approx_eq!(state.borrow().sun_angle, 3.0, 1e-6);
    }

    #[test]
    fn test_upkeep_settles_into_gold() {
        let mut village = started();
        village.fixed_update(3.0);
        assert_eq!(village.gold().borrow().dynamic_value_count(), 1);

        village.update(3.0);
        village.update(3.5);
        assert_approx_eq!(village.report().total_gold, 63.0);

        village.update(4.0);
        assert_approx_eq!(village.report().total_gold, DAY_INCOME - DAY_UPKEEP);
        let gold = village.gold();
        assert_eq!(gold.borrow().dynamic_value_count(), 0);
        assert_eq!(gold.borrow().constant_value_count(), 1);

        village.fixed_update(6.0);
        village.update(6.0);
        village.update(7.0);
        assert_approx_eq!(village.report().total_gold, 2.0 * (DAY_INCOME - DAY_UPKEEP));
        // Settled amounts are folded into one constant each frame
        assert_eq!(gold.borrow().constant_value_count(), 1);
    }

    #[test]
    fn test_pause_ignores_idle_time() {
        let mut village = started();
        village.update(1.0);
        village.suspend();
        assert!(!village.is_running());
        village.update(20.0);
        assert_approx_eq!(village.minutes(), DAWN_MINUTES + 24.0);

        village.resume();
        village.update(40.0);
        village.update(41.0);
        assert_approx_eq!(village.minutes(), DAWN_MINUTES + 48.0);
        assert!(village.report().is_day);
    }

    #[test]
    fn test_report_formats_clock() {
        let village = started();
        let text = village.report().to_string();
        assert!(text.starts_with("07:00 (day)"));
    }
}
