//! System-wide constants for the CNC workspace.
//!
//! Single source of truth for axis counts and set widths.

/// Maximum number of axes a machine may declare.
pub const MAX_N_AXIS: usize = 6;

/// Maximum number of motors driving one axis (a squared axis has two).
pub const MAX_MOTORS_PER_AXIS: usize = 2;

/// Width of one motor-side half of a [`MotorSet`](crate::mask::MotorSet).
///
/// Motor side 0 occupies bits `0..16`, side 1 occupies bits `16..32`.
pub const MOTOR_HALF_BITS: usize = 16;

/// Axis letters, indexed by axis number.
pub const AXIS_NAMES: [char; MAX_N_AXIS] = ['X', 'Y', 'Z', 'A', 'B', 'C'];

/// Default homing seek rate [mm/min].
pub const DEFAULT_SEEK_RATE: f64 = 200.0;

/// Default homing feed rate [mm/min].
pub const DEFAULT_FEED_RATE: f64 = 50.0;

/// Default post-move settle time [ms].
pub const DEFAULT_SETTLE_MS: u32 = 250;

/// Default fudge factor applied to approach travel.
pub const DEFAULT_SCALER: f64 = 1.1;

/// Default pull-off distance per motor [mm].
pub const DEFAULT_PULLOFF_MM: f64 = 1.0;
