//! CNC Common Library
//!
//! Shared constants, participation sets, configuration and state types
//! used by the homing engine and its collaborators.
//!
//! # Module Structure
//!
//! - [`consts`] - Axis counts, set widths and homing defaults
//! - [`mask`] - `AxisSet` / `MotorSet` bounded sets
//! - [`config`] - Machine TOML loading and validation
//! - [`homing`] - Homing phases and per-axis homing parameters
//! - [`state`] - Machine state, alarms, real-time flags, limit snapshot
//! - [`error`] - Homing failure and request error types
//! - [`prelude`] - Common re-exports for convenience

pub mod config;
pub mod consts;
pub mod error;
pub mod homing;
pub mod mask;
pub mod prelude;
pub mod state;
