//! Phase execution loop.
//!
//! Drives one planned phase to completion while servicing real-time
//! signals. The loop is cooperative: every iteration refills the step
//! buffer, checks pending signals, polls I/O channels and exits once no
//! participating motor is left moving.

use cnc_common::error::HomingFailure;
use cnc_common::homing::HomingPhase;
use cnc_common::mask::MotorSet;
use cnc_common::state::RealtimeFlags;
use tracing::{debug, trace};

use crate::cycle::Homing;
use crate::hal::Machine;

impl<M: Machine> Homing<'_, M> {
    /// Run `phase` for `motors`.
    ///
    /// The approach flag is set for approach phases and always cleared on
    /// return. On success the step generator is reset and the phase's
    /// settle time is waited out.
    pub fn run(&mut self, motors: MotorSet, phase: HomingPhase) -> Result<(), HomingFailure> {
        if motors.is_empty() {
            return Ok(());
        }

        if phase == HomingPhase::PrePulloff {
            let on_limit = self.machine.limit_state().active().intersection(motors);
            if on_limit.is_empty() {
                trace!("No switch engaged, skipping pre-pulloff");
                return Ok(());
            }
        }

        self.approach = phase.is_approach();
        let result = self.drive(motors, phase);
        self.approach = false;
        result
    }

    fn drive(&mut self, motors: MotorSet, phase: HomingPhase) -> Result<(), HomingFailure> {
        let settle_ms = self.plan_and_start(motors, phase);
        let mut remaining = motors;

        loop {
            if self.approach {
                let active = self.machine.limit_state().active();
                let reached = remaining.intersection(active);
                if !reached.is_empty() {
                    trace!("Switch reached {:?}", reached);
                    remaining = remaining.difference(active);
                }
            }

            self.machine.prep_buffer();

            let pending = self.machine.pending();
            if pending.contains(RealtimeFlags::STATUS_REPORT) {
                self.machine.acknowledge(RealtimeFlags::STATUS_REPORT);
                self.machine.report_status();
            }
            if pending.contains(RealtimeFlags::RESET) {
                return Err(HomingFailure::Reset);
            }
            if pending.contains(RealtimeFlags::SAFETY_DOOR) {
                return Err(HomingFailure::Door);
            }
            if pending.contains(RealtimeFlags::CYCLE_STOP) {
                self.machine.acknowledge(RealtimeFlags::CYCLE_STOP);
                if self.approach {
                    return Err(HomingFailure::Approach);
                }
                let still_on = self.machine.limit_state().active().intersection(remaining);
                if !still_on.is_empty() {
                    return Err(HomingFailure::Pulloff);
                }
                remaining = MotorSet::EMPTY;
            }

            self.machine.poll_channels();

            if remaining.is_empty() {
                break;
            }
        }

        self.machine.reset();
        self.machine.delay_ms(settle_ms);
        debug!("{} done, settled {} ms", phase.label(), settle_ms);
        Ok(())
    }
}
