//! Collaborator interfaces consumed by the homing engine.
//!
//! The engine drives three subsystems it does not own:
//! - `Stepper` - motion planner, segment buffer and step generator
//! - `Axes` - per-axis homing mode (dispatch lock-out, motor selection)
//! - `System` - global state, real-time signals, delays and I/O polling
//!
//! `Machine` is the union of the three. The engine is generic over it so the
//! same code runs against hardware or the simulator in [`crate::sim`].
//!
//! # Timing Contracts
//!
//! | Operation        | Called from          | Constraint                   |
//! |------------------|----------------------|------------------------------|
//! | `prep_buffer()`  | every loop iteration | must not block               |
//! | `pending()`      | every loop iteration | must not block               |
//! | `limit_state()`  | every loop iteration | snapshot, must not block     |
//! | `delay_ms()`     | after a phase        | blocks for the settle time   |
//! | `execute_realtime()` | failure path only | full event dispatch         |

use bitflags::bitflags;
use cnc_common::consts::MAX_N_AXIS;
use cnc_common::mask::{AxisSet, MotorId, MotorSet};
use cnc_common::state::{Alarm, LimitState, MachineState, RealtimeFlags};

bitflags! {
    /// Motion attributes attached to a planned line.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MotionFlags: u8 {
        /// Planned by the system, not by a program line.
        const SYSTEM_MOTION    = 0x01;
        /// Feed-rate override does not apply.
        const NO_FEED_OVERRIDE = 0x02;
        /// No program line number is reported for this motion.
        const NO_LINE_NUMBER   = 0x04;
        const SPINDLE_ON       = 0x08;
        const COOLANT_MIST     = 0x10;
        const COOLANT_FLOOD    = 0x20;
    }
}

impl MotionFlags {
    /// Flags for every homing move: system motion, spindle and coolant off.
    pub const HOMING: Self = Self::SYSTEM_MOTION
        .union(Self::NO_FEED_OVERRIDE)
        .union(Self::NO_LINE_NUMBER);
}

/// Per-move motor travel multipliers.
///
/// A blocked motor has multiplier 0 and does not step; every other motor
/// has multiplier 1. Overrides live inside one [`MoveRequest`] and vanish
/// with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotorOverrides {
    blocked: MotorSet,
}

impl MotorOverrides {
    pub const NONE: Self = Self {
        blocked: MotorSet::EMPTY,
    };

    #[inline]
    pub fn block(&mut self, motor: MotorId) {
        self.blocked.insert(motor);
    }

    #[inline]
    pub const fn blocked(&self) -> MotorSet {
        self.blocked
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }

    /// Travel multiplier for `motor`: 0.0 when blocked, otherwise 1.0.
    #[inline]
    pub const fn multiplier(&self, motor: MotorId) -> f64 {
        if self.blocked.contains(motor) { 0.0 } else { 1.0 }
    }
}

/// One coordinated move handed to the motion planner.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRequest {
    /// Absolute target per axis [mm]. Idle axes hold their current position.
    pub target: [f64; MAX_N_AXIS],
    /// Aggregate feed rate along the vector [mm/min].
    pub feed_rate: f64,
    pub flags: MotionFlags,
    /// Moving toward the switches: the step generator halts each motor
    /// as soon as its limit triggers.
    pub approach: bool,
    pub overrides: MotorOverrides,
}

/// Motion planner, segment buffer and step generator.
pub trait Stepper {
    /// Plan one line. Homing moves bypass the normal queued-motion path.
    fn submit_move(&mut self, request: &MoveRequest);

    /// Refill the step-segment buffer from the planned block.
    fn prep_buffer(&mut self);

    /// Start the step generator.
    fn wake_up(&mut self);

    /// Halt stepping immediately and discard the segment buffer.
    fn reset(&mut self);

    /// Motors currently at a positive or negative limit.
    fn limit_state(&self) -> LimitState;

    /// Overwrite an axis step position.
    fn set_motor_steps(&mut self, axis: usize, steps: i64);

    fn motor_steps(&self, axis: usize) -> i64;
}

/// Axis/motor homing-mode control.
pub trait Axes {
    /// Put `axes` into homing mode and return the motors able to home.
    ///
    /// Locks normal step dispatch for those motors and clears any block.
    fn enter_homing_mode(&mut self, axes: AxisSet) -> MotorSet;

    /// Leave homing mode for `axes`, restoring normal dispatch.
    fn exit_homing_mode(&mut self, axes: AxisSet, success: bool);
}

/// Global system state and real-time event plumbing.
pub trait System {
    fn state(&self) -> MachineState;

    fn set_state(&mut self, state: MachineState);

    /// Latch `alarm` and enter `MachineState::Alarm`.
    fn raise_alarm(&mut self, alarm: Alarm);

    /// Real-time signals waiting to be handled.
    fn pending(&self) -> RealtimeFlags;

    /// Clear handled signals.
    fn acknowledge(&mut self, flags: RealtimeFlags);

    /// Emit a real-time status report.
    fn report_status(&mut self);

    /// Blocking delay.
    fn delay_ms(&mut self, ms: u32);

    /// Service lightweight I/O channels.
    fn poll_channels(&mut self);

    /// Full real-time event dispatch; flushes every pending signal.
    fn execute_realtime(&mut self);

    /// Stop all motion and reset the planner.
    fn motion_reset(&mut self);
}

/// Everything the homing engine needs from the machine.
pub trait Machine: Stepper + Axes + System {}

impl<T: Stepper + Axes + System> Machine for T {}
