//! Time-driven value animation: constant and dynamic numeric values advanced
//! by a host clock, with lapse events and totals, plus a small village demo.

pub mod config;
pub mod game;
pub mod logging;
pub mod utils;
pub mod value;
pub mod village;

pub use config::{ControllerConfig, UpdateCadence};
pub use value::{
    CallbackId, Commands, ConstantKey, DisposalMode, DynamicKey, DynamicValue, UpdateMode,
    ValidationError, ValueController, ValueError, ValueEvent, ValueKind, ValueSpec,
};
