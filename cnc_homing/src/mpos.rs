//! Machine position commit after a successful cycle.

use cnc_common::mask::AxisSet;
use tracing::debug;

use crate::cycle::Homing;
use crate::hal::Machine;

impl<M: Machine> Homing<'_, M> {
    /// Assign each homed axis its configured reference position and leave
    /// homing mode.
    ///
    /// Axes outside `axes` keep their step counts.
    pub fn set_mpos(&mut self, axes: AxisSet) {
        for axis in axes.iter() {
            let Some(axis_config) = self.config.axes.get(axis) else {
                continue;
            };
            let Some(homing) = axis_config.homing.as_ref() else {
                continue;
            };
            self.machine
                .set_motor_steps(axis, axis_config.mpos_to_steps(homing.mpos_mm));

            let (min, max) = axis_config.travel_limits();
            debug!(
                "{} homed at {:.3}, travel [{:.3}, {:.3}]",
                axis_config.name, homing.mpos_mm, min, max
            );
        }
        self.machine.exit_homing_mode(axes, true);
    }
}
