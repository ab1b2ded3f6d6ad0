//! Homing types shared between the engine and configuration.
//!
//! Defines `HomingPhase` and the per-axis `HomingConfig`.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FEED_RATE, DEFAULT_SCALER, DEFAULT_SEEK_RATE, DEFAULT_SETTLE_MS};

/// One leg of the homing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HomingPhase {
    /// Clear switches that are already triggered before seeking.
    PrePulloff = 0,
    /// Seek the switches at seek rate.
    FastApproach = 1,
    /// Back off after the fast approach.
    Pulloff0 = 2,
    /// Locate the switch edge at feed rate.
    SlowApproach = 3,
    /// Back off to the common pull-off distance.
    Pulloff1 = 4,
    /// Square dual-motor axes whose motors have different pull-offs.
    Pulloff2 = 5,
}

impl HomingPhase {
    /// Phases always run, in order. `Pulloff2` is appended on demand.
    pub const SEQUENCE: [Self; 5] = [
        Self::PrePulloff,
        Self::FastApproach,
        Self::Pulloff0,
        Self::SlowApproach,
        Self::Pulloff1,
    ];

    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::PrePulloff),
            1 => Some(Self::FastApproach),
            2 => Some(Self::Pulloff0),
            3 => Some(Self::SlowApproach),
            4 => Some(Self::Pulloff1),
            5 => Some(Self::Pulloff2),
            _ => None,
        }
    }

    /// True while moving toward the switches.
    #[inline]
    pub const fn is_approach(self) -> bool {
        matches!(self, Self::FastApproach | Self::SlowApproach)
    }

    /// True for the seek-rate leg.
    #[inline]
    pub const fn is_seek(self) -> bool {
        matches!(self, Self::FastApproach)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PrePulloff => "PrePulloff",
            Self::FastApproach => "Fast approach",
            Self::Pulloff0 => "Pulloff0",
            Self::SlowApproach => "Slow approach",
            Self::Pulloff1 => "Pulloff1",
            Self::Pulloff2 => "Differential pulloff",
        }
    }
}

/// Homing configuration for a single axis.
///
/// Rates are in mm/min, distances in mm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HomingConfig {
    /// Cycle number. Axes sharing a number home together; `None` means the
    /// axis is only homed on explicit request.
    #[serde(default)]
    pub cycle: Option<u8>,
    /// Approach rate for the fast leg.
    #[serde(default = "default_seek_rate")]
    pub seek_mpm: f64,
    /// Rate for the slow approach and all pull-offs.
    #[serde(default = "default_feed_rate")]
    pub feed_mpm: f64,
    /// Dwell after each leg [ms].
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u32,
    /// Switch is on the positive end of travel.
    #[serde(default = "default_positive_direction")]
    pub positive_direction: bool,
    /// Machine position assigned at the switch after homing.
    #[serde(default)]
    pub mpos_mm: f64,
    /// Travel multiplier for the fast approach.
    #[serde(default = "default_scaler")]
    pub seek_scaler: f64,
    /// Travel multiplier for the slow approach.
    #[serde(default = "default_scaler")]
    pub feed_scaler: f64,
}

fn default_seek_rate() -> f64 {
    DEFAULT_SEEK_RATE
}
fn default_feed_rate() -> f64 {
    DEFAULT_FEED_RATE
}
fn default_settle_ms() -> u32 {
    DEFAULT_SETTLE_MS
}
fn default_positive_direction() -> bool {
    true
}
fn default_scaler() -> f64 {
    DEFAULT_SCALER
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            cycle: None,
            seek_mpm: DEFAULT_SEEK_RATE,
            feed_mpm: DEFAULT_FEED_RATE,
            settle_ms: DEFAULT_SETTLE_MS,
            positive_direction: true,
            mpos_mm: 0.0,
            seek_scaler: DEFAULT_SCALER,
            feed_scaler: DEFAULT_SCALER,
        }
    }
}

impl HomingConfig {
    /// Validate rates and scalers. `n_axis` bounds the cycle number.
    pub fn validate(&self, n_axis: usize) -> Result<(), String> {
        if !(self.seek_mpm > 0.0) {
            return Err(format!("seek_mpm {} must be positive", self.seek_mpm));
        }
        if !(self.feed_mpm > 0.0) {
            return Err(format!("feed_mpm {} must be positive", self.feed_mpm));
        }
        if !(self.seek_scaler > 0.0) || !(self.feed_scaler > 0.0) {
            return Err(format!(
                "scalers must be positive (seek {}, feed {})",
                self.seek_scaler, self.feed_scaler
            ));
        }
        if let Some(cycle) = self.cycle {
            if cycle == 0 || cycle as usize > n_axis {
                return Err(format!("cycle {cycle} out of range [1, {n_axis}]"));
            }
        }
        Ok(())
    }

    /// Rate used by `phase`.
    #[inline]
    pub fn rate_for(&self, phase: HomingPhase) -> f64 {
        if phase.is_seek() {
            self.seek_mpm
        } else {
            self.feed_mpm
        }
    }

    /// Travel multiplier used by `phase`. Pull-offs are never scaled.
    #[inline]
    pub fn scaler_for(&self, phase: HomingPhase) -> f64 {
        match phase {
            HomingPhase::FastApproach => self.seek_scaler,
            HomingPhase::SlowApproach => self.feed_scaler,
            _ => 1.0,
        }
    }
}
