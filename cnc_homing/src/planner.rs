//! Homing move planning.
//!
//! Multi-axis homing uses per-axis rates and travel limits to build one
//! coordinated move:
//! - Each axis must travel at its own configured rate, so the target
//!   components are proportional to the per-axis rates and the aggregate
//!   feed rate is the magnitude of the per-axis rate vector.
//! - Each axis must travel far enough to reach its switch, so the vector is
//!   scaled by the axis that takes longest (the limiting axis).
//!
//! The time to cover `travel` at `rate` is `travel / rate`. The limiting
//! axis has the longest time; during the fast approach every other axis is
//! stretched by `rate / limiting_rate` so all axes run for that long.

use cnc_common::config::MachineConfig;
use cnc_common::consts::MAX_N_AXIS;
use cnc_common::homing::HomingPhase;
use cnc_common::mask::{AxisSet, MotorId, MotorSet, MotorSide};
use tracing::debug;

use crate::cycle::Homing;
use crate::hal::{Machine, MotionFlags, MotorOverrides, MoveRequest};

/// Result of planning one homing phase.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMove {
    pub phase: HomingPhase,
    /// Axes with at least one participating motor.
    pub axes: AxisSet,
    /// Signed displacement per active axis [mm]. Zero for idle axes.
    pub target: [f64; MAX_N_AXIS],
    /// Per-axis rate [mm/min]. Zero for idle axes.
    pub rates: [f64; MAX_N_AXIS],
    /// Magnitude of the per-axis rate vector [mm/min].
    pub feed_rate: f64,
    /// Rate of the axis with the longest travel time.
    pub limiting_rate: f64,
    /// Longest settle time among active axes [ms].
    pub settle_ms: u32,
    pub overrides: MotorOverrides,
}

impl PlannedMove {
    fn empty(phase: HomingPhase) -> Self {
        Self {
            phase,
            axes: AxisSet::EMPTY,
            target: [0.0; MAX_N_AXIS],
            rates: [0.0; MAX_N_AXIS],
            feed_rate: 0.0,
            limiting_rate: 0.0,
            settle_ms: 0,
            overrides: MotorOverrides::NONE,
        }
    }
}

/// Compute target vector, feed rate and settle time for `phase`.
///
/// Axes with no participating motor are skipped. An empty motor set yields
/// a zero vector; callers must not submit it.
pub fn plan_move(config: &MachineConfig, motors: MotorSet, phase: HomingPhase) -> PlannedMove {
    let approach = phase.is_approach();
    let mut planned = PlannedMove::empty(phase);
    let mut rate_sq_sum = 0.0;
    let mut max_seek_time = 0.0;

    for (axis, axis_config) in config.axes.iter().enumerate().take(MAX_N_AXIS) {
        if !motors.has_axis(axis) {
            continue;
        }
        let Some(homing) = axis_config.homing.as_ref() else {
            continue;
        };

        planned.axes.insert(axis);
        planned.settle_ms = planned.settle_ms.max(homing.settle_ms);

        let rate = homing.rate_for(phase);
        let travel = match phase {
            HomingPhase::FastApproach => axis_config.max_travel_mm,
            HomingPhase::PrePulloff
            | HomingPhase::SlowApproach
            | HomingPhase::Pulloff0
            | HomingPhase::Pulloff1 => axis_config.common_pulloff(),
            HomingPhase::Pulloff2 => {
                let extra = axis_config.extra_pulloff();
                // Only the motor with the longer pull-off moves.
                if extra < 0.0 {
                    planned
                        .overrides
                        .block(MotorId::new(axis, MotorSide::Secondary));
                } else if extra > 0.0 {
                    planned
                        .overrides
                        .block(MotorId::new(axis, MotorSide::Primary));
                }
                extra.abs()
            }
        };

        rate_sq_sum += rate * rate;

        let seek_time = travel / rate;
        planned.target[axis] = if homing.positive_direction ^ approach {
            -travel
        } else {
            travel
        };
        planned.rates[axis] = rate;

        if seek_time > max_seek_time {
            max_seek_time = seek_time;
            planned.limiting_rate = rate;
        }
    }

    for axis in planned.axes.iter() {
        let Some(homing) = config.axes[axis].homing.as_ref() else {
            continue;
        };
        planned.target[axis] *= homing.scaler_for(phase);
        if phase.is_seek() && planned.limiting_rate > 0.0 {
            planned.target[axis] *= planned.rates[axis] / planned.limiting_rate;
        }
        debug!(
            "{} target {:.3} rate {:.1}",
            config.axes[axis].name, planned.target[axis], planned.rates[axis]
        );
    }

    planned.feed_rate = f64::sqrt(rate_sq_sum);
    planned
}

impl<M: Machine> Homing<'_, M> {
    /// Plan `phase` for `motors`, submit it and start the step generator.
    ///
    /// Returns the settle time to dwell once the phase completes.
    pub(crate) fn plan_and_start(&mut self, motors: MotorSet, phase: HomingPhase) -> u32 {
        let planned = plan_move(self.config, motors, phase);

        let mut target = planned.target;
        for (axis, axis_config) in self.config.axes.iter().enumerate().take(MAX_N_AXIS) {
            if planned.axes.contains(axis) {
                self.machine.set_motor_steps(axis, 0);
            } else {
                target[axis] = axis_config.steps_to_mpos(self.machine.motor_steps(axis));
            }
        }

        self.machine.submit_move(&MoveRequest {
            target,
            feed_rate: planned.feed_rate,
            flags: MotionFlags::HOMING,
            approach: phase.is_approach(),
            overrides: planned.overrides,
        });
        self.machine.prep_buffer();
        self.machine.wake_up();

        planned.settle_ms
    }
}
