//! Integration test: squaring of dual-motor axes.
//!
//! Each motor of a squared axis stops on its own switch during the
//! approaches. The differential pull-off then moves only the motor with
//! the longer pull-off, so each motor ends its own pull-off distance from
//! its own switch.

use cnc_common::homing::HomingPhase;
use cnc_common::mask::{AxisSet, MotorId, MotorSet, MotorSide};
use cnc_homing::sim::SimMachine;
use cnc_homing::{CycleRequest, home, phase_plan};

use super::{X, Y, gantry};

// ── Helpers ─────────────────────────────────────────────────────────

const TOL: f64 = 0.02;

fn y0() -> MotorId {
    MotorId::new(Y, MotorSide::Primary)
}

fn y1() -> MotorId {
    MotorId::new(Y, MotorSide::Secondary)
}

fn xy() -> AxisSet {
    [X, Y].into_iter().collect()
}

/// Y homes toward its negative end; switches sit at -50 mm.
const Y_SWITCH: f64 = -50.0;

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn unequal_pulloffs_append_pulloff2() {
    let cfg = gantry();
    let motors = MotorSet::from_axes_all_sides(AxisSet::single(Y));
    let plan = phase_plan(&cfg, motors);
    assert_eq!(plan.last(), Some(&HomingPhase::Pulloff2));
}

#[test]
fn pulloff2_moves_only_the_longer_motor() {
    let cfg = gantry();
    let mut sim = SimMachine::new(&cfg);

    home(&mut sim, &cfg, CycleRequest::Axes(xy())).unwrap();

    let last = sim.stats().moves.last().unwrap().clone();
    assert!(!last.approach);
    assert_eq!(last.overrides.blocked(), MotorSet::single(y0()));
    // Extra = 1.5 - 1.0, away from the negative switch.
    assert!((last.target[Y] - 0.5).abs() < 1e-9);
    // X takes part with zero travel but still contributes its feed rate.
    assert_eq!(last.target[X], 0.0);
    assert!((last.feed_rate - 600.0 * 2f64.sqrt()).abs() < 1e-9);

    let p0 = sim.motor_position(y0()).unwrap();
    let p1 = sim.motor_position(y1()).unwrap();
    assert!((p0 - (Y_SWITCH + 1.0)).abs() < TOL, "y0 at {p0}");
    assert!((p1 - (Y_SWITCH + 1.5)).abs() < TOL, "y1 at {p1}");
}

#[test]
fn skewed_gantry_is_squared_to_its_switches() {
    let cfg = gantry();
    let skew = 0.4;
    let mut sim = SimMachine::new(&cfg).with_skew(Y, skew);

    home(&mut sim, &cfg, CycleRequest::Axes(xy())).unwrap();

    let p0 = sim.motor_position(y0()).unwrap();
    let p1 = sim.motor_position(y1()).unwrap();
    assert!((p0 - (Y_SWITCH + 1.0)).abs() < TOL, "y0 at {p0}");
    assert!((p1 - (Y_SWITCH - skew + 1.5)).abs() < TOL, "y1 at {p1}");

    // Each motor sits its own pull-off back from its own switch.
    let d0 = sim.distance_to_switch(y0()).unwrap();
    let d1 = sim.distance_to_switch(y1()).unwrap();
    assert!((d0 - 1.0).abs() < TOL, "y0 clearance {d0}");
    assert!((d1 - 1.5).abs() < TOL, "y1 clearance {d1}");
}

#[test]
fn equal_pulloffs_skip_pulloff2() {
    let mut cfg = gantry();
    cfg.axes[Y].motors[1].pulloff_mm = 1.0;
    let mut sim = SimMachine::new(&cfg).with_skew(Y, 0.3);

    home(&mut sim, &cfg, CycleRequest::Axes(xy())).unwrap();

    assert_eq!(sim.stats().moves.len(), 4);
    let p0 = sim.motor_position(y0()).unwrap();
    let p1 = sim.motor_position(y1()).unwrap();
    assert!((p0 - p1 - 0.3).abs() < TOL);
}

#[test]
fn shorter_secondary_pulloff_blocks_secondary() {
    let mut cfg = gantry();
    cfg.axes[Y].motors[0].pulloff_mm = 2.0;
    cfg.axes[Y].motors[1].pulloff_mm = 1.25;
    let mut sim = SimMachine::new(&cfg);

    home(&mut sim, &cfg, CycleRequest::Axes(AxisSet::single(Y))).unwrap();

    let last = sim.stats().moves.last().unwrap();
    assert_eq!(last.overrides.blocked(), MotorSet::single(y1()));
    assert!((last.target[Y] - 0.75).abs() < 1e-9);

    let p0 = sim.motor_position(y0()).unwrap();
    let p1 = sim.motor_position(y1()).unwrap();
    assert!((p0 - (Y_SWITCH + 2.0)).abs() < TOL, "y0 at {p0}");
    assert!((p1 - (Y_SWITCH + 1.25)).abs() < TOL, "y1 at {p1}");
}

#[test]
fn motor_without_switch_input_is_not_homed() {
    let mut cfg = gantry();
    cfg.axes[Y].motors[1].limit_switch = false;
    let mut sim = SimMachine::new(&cfg);

    home(&mut sim, &cfg, CycleRequest::Axes(AxisSet::single(Y))).unwrap();

    // Only one Y motor participates, so there is nothing to square.
    assert_eq!(sim.stats().moves.len(), 4);
    assert!(sim.stats().moves.iter().all(|m| m.overrides.is_empty()));
}
