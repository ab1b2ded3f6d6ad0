//! Homing error types.
//!
//! `HomingFailure` is the tagged outcome of one homing phase. The cycle
//! orchestrator is the only place that turns it into an alarm.

use thiserror::Error;

use crate::state::Alarm;

/// Terminal failure of a homing phase. Never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HomingFailure {
    /// Reset requested while homing.
    #[error("Homing fail: reset during cycle")]
    Reset,
    /// Safety door opened while homing.
    #[error("Homing fail: safety door opened")]
    Door,
    /// Move ended before every switch triggered.
    #[error("Homing fail: limit switch not found during approach")]
    Approach,
    /// A switch was still active when the pull-off move ended.
    #[error("Homing fail: limit switch still engaged after pull-off")]
    Pulloff,
}

impl HomingFailure {
    /// Alarm code latched for this failure.
    #[inline]
    pub const fn alarm(self) -> Alarm {
        match self {
            Self::Reset => Alarm::HomingFailReset,
            Self::Door => Alarm::HomingFailDoor,
            Self::Approach => Alarm::HomingFailApproach,
            Self::Pulloff => Alarm::HomingFailPulloff,
        }
    }
}

/// Error returned by a homing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HomingError {
    /// A cycle aborted; machine position for that cycle is not committed.
    #[error(transparent)]
    Failed(#[from] HomingFailure),
    /// Wildcard request on a machine where no axis has a cycle number.
    #[error("No homing cycles defined")]
    NoCycles,
    /// A motor reported both limits before homing started.
    #[error("Ambiguous limit switch state")]
    AmbiguousLimit,
    /// Machine already in alarm; remaining cycles skipped.
    #[error("Machine in alarm state")]
    AlarmActive,
}
