//! # CNC Homing Engine
//!
//! Drives one or more axes onto their limit switches, backs off a
//! configured distance and assigns the reference machine position.
//!
//! ## Phase Sequence
//!
//! | Phase        | Rate | Travel              | Direction   |
//! |--------------|------|---------------------|-------------|
//! | PrePulloff   | feed | common pull-off     | away        |
//! | FastApproach | seek | max travel          | toward      |
//! | Pulloff0     | feed | common pull-off     | away        |
//! | SlowApproach | feed | common pull-off     | toward      |
//! | Pulloff1     | feed | common pull-off     | away        |
//! | Pulloff2     | feed | differential        | away, one motor |
//!
//! `PrePulloff` only moves when a switch is already engaged; `Pulloff2`
//! only runs when a squared axis has unequal motor pull-offs.
//!
//! The engine is generic over [`hal::Machine`]; [`sim::SimMachine`] is a
//! software machine for tests and the CLI.

pub mod cycle;
pub mod hal;
pub mod mpos;
pub mod planner;
pub mod pulloff;
pub mod run;
pub mod sim;

pub use cycle::{CycleRequest, Homing, phase_plan};
pub use hal::{Axes, Machine, MotionFlags, MotorOverrides, MoveRequest, Stepper, System};
pub use planner::{PlannedMove, plan_move};
pub use pulloff::needs_pulloff2;

use cnc_common::config::MachineConfig;
use cnc_common::error::HomingError;
use cnc_common::state::MachineState;
use tracing::info;

/// Home `request` on `machine`.
///
/// The machine is in `Homing` state for the duration and returns to `Idle`
/// on success. On failure it is left in `Alarm`.
pub fn home<M: Machine>(
    machine: &mut M,
    config: &MachineConfig,
    request: CycleRequest,
) -> Result<(), HomingError> {
    machine.set_state(MachineState::Homing);
    Homing::new(machine, config).run_cycles(request)?;
    machine.set_state(MachineState::Idle);
    info!("Homing complete");
    Ok(())
}
