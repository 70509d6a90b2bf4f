//! Time-driven numeric values and the controller that schedules them.

pub mod callbacks;
pub mod controller;
pub mod dynamic;
pub mod error;
pub mod ids;
pub mod kind;

pub use controller::{Command, Commands, ControllerCallback, ValueController};
pub use dynamic::{DynamicValue, ValueCallback, ValueEvent};
pub use error::{ValidationError, ValueError};
pub use ids::{CallbackId, ConstantKey, DynamicKey};
pub use kind::{DisposalMode, UpdateMode, ValueKind, ValueSpec};
