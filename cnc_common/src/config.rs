//! Machine configuration loading and validation.
//!
//! The machine TOML lists axes in index order. Each axis carries an
//! optional `[axes.homing]` table and one or two `[[axes.motors]]` entries.
//!
//! ```toml
//! log_level = "debug"
//!
//! [[axes]]
//! name = "X"
//! max_travel_mm = 300.0
//! steps_per_mm = 80.0
//!
//! [axes.homing]
//! cycle = 1
//! seek_mpm = 2000.0
//! feed_mpm = 100.0
//!
//! [[axes.motors]]
//! pulloff_mm = 1.5
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{AXIS_NAMES, DEFAULT_PULLOFF_MM, MAX_MOTORS_PER_AXIS, MAX_N_AXIS};
use crate::homing::HomingConfig;
use crate::mask::{AxisSet, MotorSide};

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Trait for loading configuration from TOML files.
///
/// Returns `ConfigError::FileNotFound` if the file does not exist and
/// `ConfigError::ParseError` for unreadable files or invalid TOML.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

// ─── Motor ──────────────────────────────────────────────────────────

/// One motor of an axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MotorConfig {
    /// Distance to back off this motor's switch [mm].
    #[serde(default = "default_pulloff")]
    pub pulloff_mm: f64,
    /// Motor has a limit switch and takes part in homing.
    #[serde(default = "default_limit_switch")]
    pub limit_switch: bool,
}

fn default_pulloff() -> f64 {
    DEFAULT_PULLOFF_MM
}
fn default_limit_switch() -> bool {
    true
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            pulloff_mm: DEFAULT_PULLOFF_MM,
            limit_switch: true,
        }
    }
}

// ─── Axis ───────────────────────────────────────────────────────────

/// Per-axis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisConfig {
    /// Axis letter, e.g. "X".
    pub name: String,
    /// Full travel length [mm].
    pub max_travel_mm: f64,
    /// Motor resolution [steps/mm].
    pub steps_per_mm: f64,
    /// Homing parameters. Axes without this table never home.
    #[serde(default)]
    pub homing: Option<HomingConfig>,
    /// Motor 0 and, for squared axes, motor 1.
    #[serde(default = "default_motors")]
    pub motors: Vec<MotorConfig>,
}

fn default_motors() -> Vec<MotorConfig> {
    vec![MotorConfig::default()]
}

impl AxisConfig {
    /// Single-motor axis with default homing parameters.
    pub fn new(name: impl Into<String>, max_travel_mm: f64, steps_per_mm: f64) -> Self {
        Self {
            name: name.into(),
            max_travel_mm,
            steps_per_mm,
            homing: Some(HomingConfig::default()),
            motors: default_motors(),
        }
    }

    #[inline]
    pub fn motor(&self, side: MotorSide) -> Option<&MotorConfig> {
        self.motors.get(side.index())
    }

    #[inline]
    pub fn is_squared(&self) -> bool {
        self.motors.len() == MAX_MOTORS_PER_AXIS
    }

    /// Pull-off distance shared by every motor of the axis (the smallest).
    pub fn common_pulloff(&self) -> f64 {
        self.motors
            .iter()
            .map(|m| m.pulloff_mm)
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    /// Signed difference `pulloff(motor 1) - pulloff(motor 0)`.
    ///
    /// Zero for single-motor axes.
    pub fn extra_pulloff(&self) -> f64 {
        match (self.motor(MotorSide::Primary), self.motor(MotorSide::Secondary)) {
            (Some(m0), Some(m1)) => m1.pulloff_mm - m0.pulloff_mm,
            _ => 0.0,
        }
    }

    /// Machine position converted to motor steps.
    #[inline]
    pub fn mpos_to_steps(&self, mpos_mm: f64) -> i64 {
        (mpos_mm * self.steps_per_mm).round() as i64
    }

    #[inline]
    pub fn steps_to_mpos(&self, steps: i64) -> f64 {
        steps as f64 / self.steps_per_mm
    }

    /// Soft-limit window `(min, max)` in machine coordinates.
    ///
    /// The reference position sits at the end of travel the switch is on.
    pub fn travel_limits(&self) -> (f64, f64) {
        let (mpos, positive) = self
            .homing
            .as_ref()
            .map_or((0.0, true), |h| (h.mpos_mm, h.positive_direction));
        if positive {
            (mpos - self.max_travel_mm, mpos)
        } else {
            (mpos, mpos + self.max_travel_mm)
        }
    }

    fn validate(&self, n_axis: usize) -> Result<(), String> {
        if !(self.max_travel_mm > 0.0) {
            return Err(format!(
                "axis {}: max_travel_mm {} must be positive",
                self.name, self.max_travel_mm
            ));
        }
        if !(self.steps_per_mm > 0.0) {
            return Err(format!(
                "axis {}: steps_per_mm {} must be positive",
                self.name, self.steps_per_mm
            ));
        }
        if self.motors.is_empty() || self.motors.len() > MAX_MOTORS_PER_AXIS {
            return Err(format!(
                "axis {}: {} motors, expected 1 or {}",
                self.name,
                self.motors.len(),
                MAX_MOTORS_PER_AXIS
            ));
        }
        if let Some(m) = self.motors.iter().find(|m| m.pulloff_mm < 0.0) {
            return Err(format!(
                "axis {}: pulloff_mm {} must not be negative",
                self.name, m.pulloff_mm
            ));
        }
        if let Some(ref homing) = self.homing {
            homing
                .validate(n_axis)
                .map_err(|e| format!("axis {}: {e}", self.name))?;
        }
        Ok(())
    }
}

// ─── Machine ────────────────────────────────────────────────────────

/// Whole-machine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineConfig {
    #[serde(default)]
    pub log_level: LogLevel,
    /// Axes in index order (X, Y, Z, A, B, C).
    pub axes: Vec<AxisConfig>,
}

impl MachineConfig {
    /// Parse and validate a machine TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a machine TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let n_axis = self.axes.len();
        if n_axis == 0 || n_axis > MAX_N_AXIS {
            return Err(ConfigError::ValidationError(format!(
                "{n_axis} axes out of range [1, {MAX_N_AXIS}]"
            )));
        }
        let mut seen = HashSet::new();
        for axis in &self.axes {
            if !seen.insert(axis.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate axis name {}",
                    axis.name
                )));
            }
            axis.validate(n_axis).map_err(ConfigError::ValidationError)?;
        }
        Ok(())
    }

    #[inline]
    pub fn n_axis(&self) -> usize {
        self.axes.len()
    }

    /// Axes that have a homing configuration.
    pub fn homing_mask(&self) -> AxisSet {
        self.axes
            .iter()
            .enumerate()
            .filter(|(_, a)| a.homing.is_some())
            .map(|(i, _)| i)
            .collect()
    }

    /// Axes assigned to homing cycle `cycle`.
    pub fn axes_in_cycle(&self, cycle: u8) -> AxisSet {
        self.axes
            .iter()
            .enumerate()
            .filter(|(_, a)| a.homing.as_ref().is_some_and(|h| h.cycle == Some(cycle)))
            .map(|(i, _)| i)
            .collect()
    }

    /// Render `axes` as axis letters, e.g. "XY".
    pub fn axis_names(&self, axes: AxisSet) -> String {
        axes.iter()
            .map(|i| {
                self.axes
                    .get(i)
                    .map_or_else(|| AXIS_NAMES[i].to_string(), |a| a.name.clone())
            })
            .collect()
    }

    /// Parse axis letters ("XZ") into an axis set.
    pub fn parse_axes(&self, letters: &str) -> Result<AxisSet, ConfigError> {
        let mut set = AxisSet::EMPTY;
        for c in letters.chars() {
            let index = self
                .axes
                .iter()
                .position(|a| a.name.eq_ignore_ascii_case(&c.to_string()))
                .ok_or_else(|| ConfigError::ValidationError(format!("unknown axis '{c}'")))?;
            set.insert(index);
        }
        Ok(set)
    }
}
