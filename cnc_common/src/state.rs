//! System state shared with the homing engine.
//!
//! Global machine state, alarm codes, pending real-time signals and the
//! limit-switch snapshot reported by the step subsystem.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::mask::MotorSet;

/// Global machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum MachineState {
    /// Ready, no motion.
    #[default]
    Idle = 0,
    /// Fault latched; motion locked out until reset.
    Alarm = 1,
    /// Homing cycle in progress.
    Homing = 2,
    /// Program motion running.
    Cycle = 3,
    /// Feed hold.
    Hold = 4,
}

impl MachineState {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Alarm),
            2 => Some(Self::Homing),
            3 => Some(Self::Cycle),
            4 => Some(Self::Hold),
            _ => None,
        }
    }
}

/// Alarm code latched alongside `MachineState::Alarm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Alarm {
    /// Limit switch tripped outside homing, or a motor reports both limits.
    HardLimit = 1,
    /// Reset issued during a homing cycle.
    HomingFailReset = 6,
    /// Safety door opened during a homing cycle.
    HomingFailDoor = 7,
    /// Switch still engaged after a pull-off.
    HomingFailPulloff = 8,
    /// Switch not found during an approach.
    HomingFailApproach = 9,
}

impl Alarm {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::HardLimit),
            6 => Some(Self::HomingFailReset),
            7 => Some(Self::HomingFailDoor),
            8 => Some(Self::HomingFailPulloff),
            9 => Some(Self::HomingFailApproach),
            _ => None,
        }
    }
}

bitflags! {
    /// Real-time signals raised asynchronously (ISR, serial input).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RealtimeFlags: u8 {
        /// Status report requested.
        const STATUS_REPORT = 0x01;
        /// Soft reset requested.
        const RESET         = 0x02;
        /// Safety door opened.
        const SAFETY_DOOR   = 0x04;
        /// Planned motion ended or was stopped.
        const CYCLE_STOP    = 0x08;
    }
}

/// Motors currently sitting on a limit switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LimitState {
    pub positive: MotorSet,
    pub negative: MotorSet,
}

impl LimitState {
    /// Motors at either limit.
    #[inline]
    pub const fn active(&self) -> MotorSet {
        self.positive.union(self.negative)
    }

    /// Motors reporting both limits at once (wiring fault).
    #[inline]
    pub const fn ambiguous(&self) -> MotorSet {
        self.positive.intersection(self.negative)
    }
}
