//! Differential pull-off detection for squared axes.

use cnc_common::config::MachineConfig;
use cnc_common::mask::MotorSet;

/// True if any squared axis homed by `motors` has motors with different
/// pull-off distances.
///
/// Only axes where both motors take part count; a squared axis homing on
/// one motor has nothing to square.
pub fn needs_pulloff2(config: &MachineConfig, motors: MotorSet) -> bool {
    motors.squared_axes().iter().any(|axis| {
        config
            .axes
            .get(axis)
            .is_some_and(|a| a.is_squared() && a.extra_pulloff() != 0.0)
    })
}
