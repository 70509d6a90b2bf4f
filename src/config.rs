//! Configuration constants for the value controller and the village demo.

// Engine tuning
pub const TIME_EPSILON: f64 = 1e-9; // Remaining time at or below this counts as elapsed
pub const MAX_CATCH_UP_STEPS: u32 = 1024; // Interval events settled per update; the rest carry to the next

// Day / night cycle
pub const DAY_LENGTH_SECONDS: f64 = 60.0; // One full sun rotation
pub const SUN_ROTATION_DEGREES: f64 = 360.0;
pub const SUNSET_DEGREES: f64 = 180.0; // Night while the sun is past this angle
pub const MINUTES_PER_DAY: f64 = 1440.0;
pub const MINUTE_TICK_SECONDS: f64 = 0.0416; // ~24 in-game minutes per real second
pub const DAWN_MINUTES: f64 = 420.0; // 07:00

// Economy
pub const UPKEEP_INTERVAL_SECONDS: f64 = 3.0;
pub const GOLD_RAMP_SECONDS: f64 = 1.0; // How long each income/upkeep settlement takes to count up
pub const DAY_INCOME: f64 = 468.0;
pub const NIGHT_INCOME: f64 = 0.0;
pub const DAY_UPKEEP: f64 = 342.0;
pub const NIGHT_UPKEEP: f64 = 171.0;
pub const HOUSE_COUNT: usize = 6;

// Game loop
pub const FIXED_STEP_SECONDS: f64 = 1.0 / 60.0;
pub const TARGET_FRAME_SECONDS: f64 = 1.0 / 60.0;
pub const DEFAULT_RUN_SECONDS: f64 = 120.0;
pub const DEFAULT_FRAME_JITTER: f64 = 0.25; // +/- fraction of the target frame time
pub const DEFAULT_SEED: u64 = 2011;

/// Which host callback drives a controller's tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateCadence {
    /// Once per rendered frame
    #[default]
    PerFrame,
    /// Once per fixed simulation step
    FixedStep,
}

/// Controller construction options
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerConfig {
    pub cadence: UpdateCadence,
}

impl ControllerConfig {
    pub fn fixed_step() -> Self {
        ControllerConfig {
            cadence: UpdateCadence::FixedStep,
        }
    }
}
