//! Integration test: cycle ordering, phase sequence and position commit.

use cnc_common::error::HomingError;
use cnc_common::homing::HomingPhase;
use cnc_common::mask::{AxisSet, MotorId, MotorSet, MotorSide};
use cnc_common::state::{MachineState, RealtimeFlags};
use cnc_homing::sim::SimMachine;
use cnc_homing::{CycleRequest, Homing, MotionFlags, Stepper, System, home};

use super::{X, Y, Z, gantry, gantry_without_cycles};

// ── Helpers ─────────────────────────────────────────────────────────

fn xy() -> AxisSet {
    [X, Y].into_iter().collect()
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn all_cycles_home_in_cycle_order() {
    let cfg = gantry();
    let mut sim = SimMachine::new(&cfg);

    home(&mut sim, &cfg, CycleRequest::All).unwrap();

    assert_eq!(sim.state(), MachineState::Idle);
    assert_eq!(sim.alarm(), None);
    assert_eq!(
        sim.stats().exits,
        vec![(AxisSet::single(Z), true), (xy(), true)]
    );

    // Z: four phases. X+Y: four phases plus the differential pull-off.
    let moves = &sim.stats().moves;
    assert_eq!(moves.len(), 9);
    assert!(moves[0].target[Z] > 0.0);
    assert_eq!(moves[0].target[X], 0.0);
    assert_eq!(moves[0].target[Y], 0.0);
    assert!(moves[4].target[X] > 0.0);
    assert!(moves[4].target[Y] < 0.0);
}

#[test]
fn committed_positions_match_configured_mpos() {
    let cfg = gantry();
    let mut sim = SimMachine::new(&cfg);

    home(&mut sim, &cfg, CycleRequest::All).unwrap();

    assert_eq!(sim.motor_steps(X), 0);
    assert_eq!(sim.motor_steps(Y), 400);
    assert_eq!(sim.motor_steps(Z), -1200);
}

#[test]
fn phases_alternate_approach_and_pulloff() {
    let cfg = gantry();
    let mut sim = SimMachine::new(&cfg);

    home(&mut sim, &cfg, CycleRequest::Axes(AxisSet::single(Z))).unwrap();

    let approach: Vec<bool> = sim.stats().moves.iter().map(|m| m.approach).collect();
    assert_eq!(approach, vec![true, false, true, false]);
    for m in &sim.stats().moves {
        assert_eq!(m.flags, MotionFlags::HOMING);
        assert!(m.overrides.is_empty());
    }

    // Seek leg at seek rate, the rest at feed rate.
    let feeds: Vec<f64> = sim.stats().moves.iter().map(|m| m.feed_rate).collect();
    assert_eq!(feeds, vec![6000.0, 600.0, 600.0, 600.0]);
}

#[test]
fn settle_time_waited_after_every_phase() {
    let cfg = gantry();
    let mut sim = SimMachine::new(&cfg);

    home(&mut sim, &cfg, CycleRequest::All).unwrap();

    // Z: 4 x 5 ms. X+Y: 5 x max(10, 20) ms.
    assert_eq!(sim.stats().dwell_ms, 4 * 5 + 5 * 20);
}

#[test]
fn pre_pulloff_runs_when_starting_on_switch() {
    let cfg = gantry();
    let mut sim = SimMachine::new(&cfg).with_start_on_switch(Z);

    home(&mut sim, &cfg, CycleRequest::Axes(AxisSet::single(Z))).unwrap();

    let moves = &sim.stats().moves;
    assert_eq!(moves.len(), 5);
    assert!(!moves[0].approach);
    assert!(moves[0].target[Z] < 0.0);
    assert!(moves[1].approach);
}

#[test]
fn explicit_request_homes_axis_without_cycle() {
    let cfg = gantry_without_cycles();
    let mut sim = SimMachine::new(&cfg);

    home(&mut sim, &cfg, CycleRequest::Axes(AxisSet::single(X))).unwrap();

    assert_eq!(sim.stats().exits, vec![(AxisSet::single(X), true)]);
    assert_eq!(sim.state(), MachineState::Idle);
}

#[test]
fn wildcard_without_cycles_alarms_without_moving() {
    let cfg = gantry_without_cycles();
    let mut sim = SimMachine::new(&cfg);

    let result = home(&mut sim, &cfg, CycleRequest::All);

    assert_eq!(result, Err(HomingError::NoCycles));
    assert_eq!(sim.state(), MachineState::Alarm);
    assert_eq!(sim.alarm(), None);
    assert!(sim.stats().moves.is_empty());
    assert!(sim.stats().exits.is_empty());
}

#[test]
fn explicit_request_without_homing_axes_does_nothing() {
    let mut cfg = gantry();
    cfg.axes[X].homing = None;
    let mut sim = SimMachine::new(&cfg).with_steps(X, 321);

    let result = home(&mut sim, &cfg, CycleRequest::Axes(AxisSet::single(X)));

    assert_eq!(result, Ok(()));
    assert_eq!(sim.state(), MachineState::Idle);
    assert_eq!(sim.alarm(), None);
    assert!(sim.stats().moves.is_empty());
    assert!(sim.stats().exits.is_empty());
    assert_eq!(sim.motor_steps(X), 321);
}

#[test]
fn partial_commit_leaves_other_axes_untouched() {
    let cfg = gantry();
    let mut sim = SimMachine::new(&cfg).with_steps(X, 777).with_steps(Y, -42);

    home(&mut sim, &cfg, CycleRequest::Axes(AxisSet::single(Z))).unwrap();

    assert_eq!(sim.motor_steps(X), 777);
    assert_eq!(sim.motor_steps(Y), -42);
    assert_eq!(sim.motor_steps(Z), -1200);
    // Idle axes hold position in every move.
    for m in &sim.stats().moves {
        assert!((m.target[X] - 777.0 / 80.0).abs() < 1e-9);
    }
}

#[test]
fn status_report_serviced_during_phase() {
    let cfg = gantry();
    let mut sim = SimMachine::new(&cfg).with_signal_at(1, RealtimeFlags::STATUS_REPORT);

    home(&mut sim, &cfg, CycleRequest::Axes(AxisSet::single(Z))).unwrap();

    assert_eq!(sim.stats().status_reports, 1);
    assert!(!sim.pending().contains(RealtimeFlags::STATUS_REPORT));
    assert!(sim.stats().polls > 0);
}

#[test]
fn empty_motor_set_runs_nothing() {
    let cfg = gantry();
    let mut sim = SimMachine::new(&cfg);
    let mut homing = Homing::new(&mut sim, &cfg);

    assert!(homing.run(MotorSet::EMPTY, HomingPhase::FastApproach).is_ok());
    assert!(!homing.is_approaching());
    assert!(homing.machine().stats().moves.is_empty());
}

#[test]
fn pre_pulloff_skipped_when_no_switch_engaged() {
    let cfg = gantry();
    let mut sim = SimMachine::new(&cfg);
    let motors = MotorSet::single(MotorId::new(Z, MotorSide::Primary));
    let mut homing = Homing::new(&mut sim, &cfg);

    assert!(homing.run(motors, HomingPhase::PrePulloff).is_ok());
    assert!(homing.machine().stats().moves.is_empty());
    assert_eq!(homing.machine().stats().dwell_ms, 0);
}

#[test]
fn axes_from_cycle_lists_configured_axes() {
    let cfg = gantry();
    let mut sim = SimMachine::new(&cfg);
    let homing = Homing::new(&mut sim, &cfg);

    assert_eq!(homing.axes_from_cycle(1), AxisSet::single(Z));
    assert_eq!(homing.axes_from_cycle(2), xy());
    assert!(homing.axes_from_cycle(3).is_empty());
}
