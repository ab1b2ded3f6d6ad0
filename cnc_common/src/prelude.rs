//! Prelude module for common re-exports.
//!
//! ```rust
//! use cnc_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    AxisConfig, ConfigError, ConfigLoader, LogLevel, MachineConfig, MotorConfig,
};
pub use crate::homing::{HomingConfig, HomingPhase};

// ─── Sets ───────────────────────────────────────────────────────────
pub use crate::mask::{AxisSet, MotorId, MotorSet, MotorSide};

// ─── State & Errors ─────────────────────────────────────────────────
pub use crate::error::{HomingError, HomingFailure};
pub use crate::state::{Alarm, LimitState, MachineState, RealtimeFlags};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{AXIS_NAMES, MAX_N_AXIS};
