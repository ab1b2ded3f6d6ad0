//! Integration test: homing failures, alarms and cleanup.
//!
//! Every failure must raise the matching alarm, leave homing mode
//! unsuccessfully, reset motion, flush real-time events and skip the
//! position commit. Later cycles never run.

use cnc_common::error::{HomingError, HomingFailure};
use cnc_common::mask::{AxisSet, MotorId, MotorSet, MotorSide};
use cnc_common::state::{Alarm, MachineState, RealtimeFlags};
use cnc_homing::sim::SimMachine;
use cnc_homing::{CycleRequest, Homing, Stepper, System, home};

use super::{X, Y, Z, gantry};

// ── Helpers ─────────────────────────────────────────────────────────

fn z_motor() -> MotorId {
    MotorId::new(Z, MotorSide::Primary)
}

fn home_z(sim: &mut SimMachine) -> Result<(), HomingError> {
    let cfg = gantry();
    home(sim, &cfg, CycleRequest::Axes(AxisSet::single(Z)))
}

/// Common post-failure checks for a Z-only request.
fn assert_failed_cleanly(sim: &SimMachine, alarm: Alarm) {
    assert_eq!(sim.state(), MachineState::Alarm);
    assert_eq!(sim.alarm(), Some(alarm));
    assert_eq!(sim.stats().exits, vec![(AxisSet::single(Z), false)]);
    assert_eq!(sim.stats().motion_resets, 1);
    assert_eq!(sim.stats().realtime_flushes, 1);
    assert!(sim.pending().is_empty());
    assert_eq!(sim.blocked_motors(), MotorSet::EMPTY);
    assert_ne!(sim.motor_steps(Z), -1200);
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn reset_during_fast_approach() {
    let mut sim = SimMachine::new(&gantry()).with_signal_at(0, RealtimeFlags::RESET);

    let result = home_z(&mut sim);

    assert_eq!(result, Err(HomingError::Failed(HomingFailure::Reset)));
    assert_failed_cleanly(&sim, Alarm::HomingFailReset);
    assert_eq!(sim.stats().moves.len(), 1);
    assert_eq!(sim.stats().dwell_ms, 0);
}

#[test]
fn door_opened_during_slow_approach() {
    let mut sim = SimMachine::new(&gantry()).with_signal_at(2, RealtimeFlags::SAFETY_DOOR);

    let result = home_z(&mut sim);

    assert_eq!(result, Err(HomingError::Failed(HomingFailure::Door)));
    assert_failed_cleanly(&sim, Alarm::HomingFailDoor);
    assert_eq!(sim.stats().moves.len(), 3);
}

#[test]
fn switch_not_found_during_approach() {
    let mut sim = SimMachine::new(&gantry()).with_missing_switch(z_motor());

    let result = home_z(&mut sim);

    assert_eq!(result, Err(HomingError::Failed(HomingFailure::Approach)));
    assert_failed_cleanly(&sim, Alarm::HomingFailApproach);
    assert_eq!(sim.stats().moves.len(), 1);
    assert!(sim.stats().moves[0].approach);
}

#[test]
fn stuck_switch_fails_pulloff() {
    let mut sim = SimMachine::new(&gantry()).with_stuck_limit(z_motor());

    let result = home_z(&mut sim);

    assert_eq!(result, Err(HomingError::Failed(HomingFailure::Pulloff)));
    assert_failed_cleanly(&sim, Alarm::HomingFailPulloff);
    // Pre-pulloff ran because the switch read active, then failed.
    assert_eq!(sim.stats().moves.len(), 1);
    assert!(!sim.stats().moves[0].approach);
}

#[test]
fn failing_cycle_stops_later_cycles() {
    let cfg = gantry();
    let mut sim = SimMachine::new(&cfg)
        .with_missing_switch(z_motor())
        .with_steps(X, 777)
        .with_steps(Y, -42);

    let result = home(&mut sim, &cfg, CycleRequest::All);

    assert_eq!(result, Err(HomingError::Failed(HomingFailure::Approach)));
    assert_eq!(sim.stats().exits, vec![(AxisSet::single(Z), false)]);
    assert_eq!(sim.stats().moves.len(), 1);
    assert_eq!(sim.motor_steps(X), 777);
    assert_eq!(sim.motor_steps(Y), -42);
}

#[test]
fn alarm_state_skips_wildcard_cycles() {
    let cfg = gantry();
    let mut sim = SimMachine::new(&cfg).with_state(MachineState::Alarm);

    let result = Homing::new(&mut sim, &cfg).run_cycles(CycleRequest::All);

    assert_eq!(result, Err(HomingError::AlarmActive));
    assert!(sim.stats().moves.is_empty());
}

#[test]
fn ambiguous_limit_raises_hard_limit() {
    let cfg = gantry();
    let mut sim = SimMachine::new(&cfg).with_miswired_limit(MotorId::new(Y, MotorSide::Secondary));

    let result = home(&mut sim, &cfg, CycleRequest::All);

    assert_eq!(result, Err(HomingError::AmbiguousLimit));
    assert_eq!(sim.alarm(), Some(Alarm::HardLimit));
    assert_eq!(sim.state(), MachineState::Alarm);
    assert!(sim.stats().moves.is_empty());
    assert!(sim.stats().exits.is_empty());
}

#[test]
fn approach_flag_cleared_after_every_outcome() {
    let cfg = gantry();

    for signal in [
        RealtimeFlags::empty(),
        RealtimeFlags::RESET,
        RealtimeFlags::SAFETY_DOOR,
    ] {
        let mut sim = SimMachine::new(&cfg).with_signal_at(0, signal);
        let mut homing = Homing::new(&mut sim, &cfg);
        let _ = homing.run_one_cycle(AxisSet::single(Z));
        assert!(!homing.is_approaching(), "{signal:?}");
        assert_eq!(homing.machine().blocked_motors(), MotorSet::EMPTY);
    }

    let mut sim = SimMachine::new(&cfg).with_missing_switch(z_motor());
    let mut homing = Homing::new(&mut sim, &cfg);
    assert_eq!(
        homing.run_one_cycle(AxisSet::single(Z)),
        Err(HomingFailure::Approach)
    );
    assert!(!homing.is_approaching());
}

#[test]
fn reset_during_differential_pulloff_releases_blocked_motor() {
    let cfg = gantry();
    let xy: AxisSet = [X, Y].into_iter().collect();
    // Moves 0..=3 are the approaches and pull-offs; move 4 is Pulloff2.
    let mut sim = SimMachine::new(&cfg).with_signal_at(4, RealtimeFlags::RESET);

    let mut homing = Homing::new(&mut sim, &cfg);
    let result = homing.run_one_cycle(xy);

    assert_eq!(result, Err(HomingFailure::Reset));
    assert!(!homing.is_approaching());
    drop(homing);

    let last = sim.stats().moves.last().unwrap();
    assert_eq!(sim.stats().moves.len(), 5);
    assert_eq!(
        last.overrides.blocked(),
        MotorSet::single(MotorId::new(Y, MotorSide::Primary))
    );
    assert_eq!(sim.blocked_motors(), MotorSet::EMPTY);
    assert_eq!(sim.alarm(), Some(Alarm::HomingFailReset));
    assert_eq!(sim.stats().exits, vec![(xy, false)]);
    assert_eq!(sim.stats().motion_resets, 1);
}

#[test]
fn failure_in_shared_cycle_exits_all_its_axes() {
    let cfg = gantry();
    let mut sim = SimMachine::new(&cfg)
        .with_missing_switch(MotorId::new(Y, MotorSide::Secondary));

    let xy: AxisSet = [X, Y].into_iter().collect();
    let result = home(&mut sim, &cfg, CycleRequest::Axes(xy));

    assert_eq!(result, Err(HomingError::Failed(HomingFailure::Approach)));
    assert_eq!(sim.stats().exits, vec![(xy, false)]);
    assert_eq!(sim.alarm(), Some(Alarm::HomingFailApproach));
}
