//! Homing cycle orchestration.
//!
//! A request either names explicit axes or asks for every configured
//! cycle. Each cycle puts its axes into homing mode, runs the phase plan
//! and commits machine positions on success. The first failure aborts the
//! remaining cycles.

use cnc_common::config::MachineConfig;
use cnc_common::consts::MAX_N_AXIS;
use cnc_common::error::{HomingError, HomingFailure};
use cnc_common::homing::HomingPhase;
use cnc_common::mask::{AxisSet, MotorSet};
use cnc_common::state::{Alarm, MachineState};
use heapless::Vec;
use tracing::{debug, error, info, warn};

use crate::hal::Machine;
use crate::pulloff::needs_pulloff2;

/// Longest phase plan: the fixed sequence plus the differential pull-off.
pub const MAX_PHASES: usize = HomingPhase::SEQUENCE.len() + 1;

/// Ordered phases for one cycle.
pub type PhasePlan = Vec<HomingPhase, MAX_PHASES>;

/// Which axes to home.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleRequest {
    /// Every configured cycle, in cycle-number order.
    All,
    /// One cycle containing exactly these axes.
    Axes(AxisSet),
}

/// Phases for a cycle homing `motors`.
///
/// `Pulloff2` is appended only when a squared axis needs a differential
/// pull-off.
pub fn phase_plan(config: &MachineConfig, motors: MotorSet) -> PhasePlan {
    let mut plan = PhasePlan::new();
    for phase in HomingPhase::SEQUENCE {
        // Capacity covers SEQUENCE plus one.
        let _ = plan.push(phase);
    }
    if needs_pulloff2(config, motors) {
        let _ = plan.push(HomingPhase::Pulloff2);
    }
    plan
}

/// Homing engine bound to one machine for one invocation.
///
/// The approach flag lives here rather than in global state: it is set for
/// the duration of an approach phase and cleared on every exit path.
pub struct Homing<'a, M: Machine> {
    pub(crate) machine: &'a mut M,
    pub(crate) config: &'a MachineConfig,
    pub(crate) approach: bool,
}

impl<'a, M: Machine> Homing<'a, M> {
    pub fn new(machine: &'a mut M, config: &'a MachineConfig) -> Self {
        Self {
            machine,
            config,
            approach: false,
        }
    }

    /// True while an approach phase is running.
    #[inline]
    pub fn is_approaching(&self) -> bool {
        self.approach
    }

    pub fn machine(&self) -> &M {
        &*self.machine
    }

    /// Axes assigned to `cycle`.
    #[inline]
    pub fn axes_from_cycle(&self, cycle: u8) -> AxisSet {
        self.config.axes_in_cycle(cycle)
    }

    /// Run every phase of the plan, stopping at the first failure.
    pub fn run_phases(&mut self, motors: MotorSet) -> Result<(), HomingFailure> {
        for phase in phase_plan(self.config, motors) {
            debug!("{}", phase.label());
            self.run(motors, phase)?;
        }
        Ok(())
    }

    /// Home `axes` as one cycle.
    ///
    /// Axes without a homing configuration are dropped. On failure the
    /// matching alarm is raised, homing mode is left unsuccessfully and
    /// motion is reset; positions are not committed.
    pub fn run_one_cycle(&mut self, axes: AxisSet) -> Result<(), HomingFailure> {
        let axes = axes.intersection(self.config.homing_mask());
        if axes.is_empty() {
            return Ok(());
        }

        let motors = self.machine.enter_homing_mode(axes);
        if motors.is_empty() {
            warn!("No limit switches on {}", self.config.axis_names(axes));
        }
        debug!(
            "Homing cycle {} motors {:?}",
            self.config.axis_names(axes),
            motors
        );

        if let Err(failure) = self.run_phases(motors) {
            self.fail(axes, failure);
            return Err(failure);
        }

        self.set_mpos(axes);
        Ok(())
    }

    fn fail(&mut self, axes: AxisSet, failure: HomingFailure) {
        self.approach = false;
        self.machine.raise_alarm(failure.alarm());
        self.machine.exit_homing_mode(axes, false);
        error!("{failure}");
        self.machine.motion_reset();
        self.machine.execute_realtime();
    }

    /// Home the requested axes or every configured cycle.
    ///
    /// An explicit request with no homing-enabled axes does nothing. The
    /// wildcard request returns `HomingError::NoCycles` and enters the
    /// generic alarm state when no cycle has any axis.
    pub fn run_cycles(&mut self, request: CycleRequest) -> Result<(), HomingError> {
        let ambiguous = self.machine.limit_state().ambiguous();
        if !ambiguous.is_empty() {
            error!(
                "Ambiguous limit on {}",
                self.config.axis_names(ambiguous.axes())
            );
            self.machine.raise_alarm(Alarm::HardLimit);
            return Err(HomingError::AmbiguousLimit);
        }

        match request {
            CycleRequest::Axes(axes) => Ok(self.run_one_cycle(axes)?),
            CycleRequest::All => self.run_all_cycles(),
        }
    }

    fn run_all_cycles(&mut self) -> Result<(), HomingError> {
        let mut some_axis_homed = false;
        for cycle in 1..=MAX_N_AXIS as u8 {
            if self.machine.state() == MachineState::Alarm {
                return Err(HomingError::AlarmActive);
            }
            let axes = self.axes_from_cycle(cycle);
            if axes.is_empty() {
                continue;
            }
            some_axis_homed = true;
            info!("Homing cycle {cycle}: {}", self.config.axis_names(axes));
            self.run_one_cycle(axes)?;
        }

        if !some_axis_homed {
            error!("{}", HomingError::NoCycles);
            self.machine.set_state(MachineState::Alarm);
            return Err(HomingError::NoCycles);
        }
        Ok(())
    }
}
