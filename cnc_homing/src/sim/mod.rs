//! Simulated machine for exercising the homing engine without hardware.
//!
//! `SimMachine` implements every collaborator trait in [`crate::hal`]. Each
//! call to `prep_buffer()` advances the active move by one tick of
//! `tick_ms` at the requested feed rate. Motors moving toward a triggered
//! switch during an approach stop stepping, which is how squared axes get
//! squared. A move that runs to its end raises `CYCLE_STOP`, unless every
//! stepping motor was halted by its switch first.
//!
//! Test hooks inject faults: missing or stuck switches, miswired (both
//! limits) inputs and real-time signals raised on a given move.

mod motor;

pub use motor::SimMotor;

use cnc_common::config::MachineConfig;
use cnc_common::consts::{MAX_MOTORS_PER_AXIS, MAX_N_AXIS};
use cnc_common::mask::{AxisSet, MotorId, MotorSet, MotorSide};
use cnc_common::state::{Alarm, LimitState, MachineState, RealtimeFlags};
use tracing::trace;

use crate::hal::{Axes, MotorOverrides, MoveRequest, Stepper, System};

/// Default simulation tick [ms].
pub const DEFAULT_TICK_MS: f64 = 1.0;

/// Counters collected while the simulator runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimStats {
    /// Every move submitted, in order.
    pub moves: Vec<MoveRequest>,
    /// Total settle time waited [ms].
    pub dwell_ms: u64,
    pub status_reports: u32,
    pub motion_resets: u32,
    pub realtime_flushes: u32,
    pub polls: u64,
    /// `exit_homing_mode` calls as `(axes, success)`.
    pub exits: Vec<(AxisSet, bool)>,
}

#[derive(Debug, Clone)]
struct SimAxis {
    steps_per_mm: f64,
    /// Commanded machine position [mm].
    mpos: f64,
    motors: heapless::Vec<SimMotor, MAX_MOTORS_PER_AXIS>,
    /// Which motors have a switch input wired for homing.
    homing_motors: heapless::Vec<bool, MAX_MOTORS_PER_AXIS>,
}

#[derive(Debug, Clone)]
struct ActiveMove {
    index: usize,
    delta: [f64; MAX_N_AXIS],
    length: f64,
    travelled: f64,
    feed_rate: f64,
    approach: bool,
    overrides: MotorOverrides,
    ticks: u64,
}

/// Software machine backing the homing engine in tests and the CLI.
#[derive(Debug, Clone)]
pub struct SimMachine {
    axes: Vec<SimAxis>,
    tick_ms: f64,
    active: Option<ActiveMove>,
    running: bool,
    state: MachineState,
    alarm: Option<Alarm>,
    pending: RealtimeFlags,
    homing_axes: AxisSet,
    miswired: MotorSet,
    scheduled: Vec<(usize, RealtimeFlags)>,
    stats: SimStats,
}

impl SimMachine {
    /// Build a simulator from `config`.
    ///
    /// Motors start at 0. Each homing axis gets its switch at half of
    /// `max_travel_mm` on the configured homing side.
    pub fn new(config: &MachineConfig) -> Self {
        let axes = config
            .axes
            .iter()
            .take(MAX_N_AXIS)
            .map(|axis| {
                let (switch_at, positive, wired) = match axis.homing.as_ref() {
                    Some(h) => {
                        let half = axis.max_travel_mm / 2.0;
                        let at = if h.positive_direction { half } else { -half };
                        (at, h.positive_direction, true)
                    }
                    None => (0.0, true, false),
                };
                let mut motors = heapless::Vec::new();
                let mut homing_motors = heapless::Vec::new();
                for m in axis.motors.iter().take(MAX_MOTORS_PER_AXIS) {
                    let has_switch = wired && m.limit_switch;
                    let _ = motors.push(SimMotor::new(switch_at, positive, has_switch));
                    let _ = homing_motors.push(m.limit_switch);
                }
                SimAxis {
                    steps_per_mm: axis.steps_per_mm,
                    mpos: 0.0,
                    motors,
                    homing_motors,
                }
            })
            .collect();

        Self {
            axes,
            tick_ms: DEFAULT_TICK_MS,
            active: None,
            running: false,
            state: MachineState::Idle,
            alarm: None,
            pending: RealtimeFlags::empty(),
            homing_axes: AxisSet::EMPTY,
            miswired: MotorSet::EMPTY,
            scheduled: Vec::new(),
            stats: SimStats::default(),
        }
    }

    // ─── Builders ───────────────────────────────────────────────────

    pub fn with_tick_ms(mut self, tick_ms: f64) -> Self {
        if tick_ms > 0.0 {
            self.tick_ms = tick_ms;
        }
        self
    }

    /// Put every switch of `axis` `distance` mm from the start position.
    pub fn with_switch_distance(mut self, axis: usize, distance: f64) -> Self {
        if let Some(a) = self.axes.get_mut(axis) {
            for m in a.motors.iter_mut() {
                m.switch_at = if m.switch_positive { distance } else { -distance };
            }
        }
        self
    }

    /// Move the secondary switch of `axis` `skew` mm further along the
    /// homing direction than the primary one.
    pub fn with_skew(mut self, axis: usize, skew: f64) -> Self {
        if let Some(m) = self
            .axes
            .get_mut(axis)
            .and_then(|a| a.motors.get_mut(MotorSide::Secondary.index()))
        {
            m.switch_at += if m.switch_positive { skew } else { -skew };
        }
        self
    }

    /// Remove the switch of `motor`; approaches on it never terminate.
    pub fn with_missing_switch(mut self, motor: MotorId) -> Self {
        if let Some(m) = self.motor_mut(motor) {
            m.has_switch = false;
        }
        self
    }

    /// Make the switch of `motor` read active at all times.
    pub fn with_stuck_limit(mut self, motor: MotorId) -> Self {
        if let Some(m) = self.motor_mut(motor) {
            m.stuck = true;
        }
        self
    }

    /// Report `motor` on both the positive and negative limit.
    pub fn with_miswired_limit(mut self, motor: MotorId) -> Self {
        self.miswired.insert(motor);
        self
    }

    /// Start every motor of `axis` sitting on its switch.
    pub fn with_start_on_switch(mut self, axis: usize) -> Self {
        if let Some(a) = self.axes.get_mut(axis) {
            for m in a.motors.iter_mut() {
                m.position = m.switch_at;
            }
        }
        self
    }

    /// Set the step counter of `axis` before homing starts.
    pub fn with_steps(mut self, axis: usize, steps: i64) -> Self {
        self.set_motor_steps(axis, steps);
        self
    }

    /// Raise `flags` on the first tick of the `move_index`-th submitted
    /// move (0-based).
    pub fn with_signal_at(mut self, move_index: usize, flags: RealtimeFlags) -> Self {
        self.scheduled.push((move_index, flags));
        self
    }

    pub fn with_state(mut self, state: MachineState) -> Self {
        self.state = state;
        self
    }

    // ─── Inspection ─────────────────────────────────────────────────

    #[inline]
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    #[inline]
    pub fn alarm(&self) -> Option<Alarm> {
        self.alarm
    }

    /// Axes currently in homing mode.
    #[inline]
    pub fn homing_axes(&self) -> AxisSet {
        self.homing_axes
    }

    /// Motors blocked by the move in progress.
    pub fn blocked_motors(&self) -> MotorSet {
        self.active
            .as_ref()
            .map_or(MotorSet::EMPTY, |mv| mv.overrides.blocked())
    }

    /// Physical position of `motor` [mm].
    pub fn motor_position(&self, motor: MotorId) -> Option<f64> {
        self.axes
            .get(motor.axis)
            .and_then(|a| a.motors.get(motor.side.index()))
            .map(|m| m.position)
    }

    /// Distance `motor` still has to travel before its switch trips [mm].
    /// Negative once past the trip point.
    pub fn distance_to_switch(&self, motor: MotorId) -> Option<f64> {
        self.axes
            .get(motor.axis)
            .and_then(|a| a.motors.get(motor.side.index()))
            .map(SimMotor::distance_to_switch)
    }

    /// Commanded machine position of `axis` [mm].
    pub fn axis_position(&self, axis: usize) -> Option<f64> {
        self.axes.get(axis).map(|a| a.mpos)
    }

    fn motor_mut(&mut self, motor: MotorId) -> Option<&mut SimMotor> {
        self.axes
            .get_mut(motor.axis)
            .and_then(|a| a.motors.get_mut(motor.side.index()))
    }

    fn motor_ids(&self, axis: usize) -> impl Iterator<Item = MotorId> + '_ {
        let count = self.axes.get(axis).map_or(0, |a| a.motors.len());
        MotorSide::ALL
            .into_iter()
            .take(count)
            .map(move |side| MotorId::new(axis, side))
    }

    /// Advance the active move by one tick.
    fn tick(&mut self) {
        let Some(mv) = self.active.as_mut() else {
            return;
        };

        mv.ticks += 1;
        if mv.ticks == 1 {
            for (_, flags) in self.scheduled.iter().filter(|(i, _)| *i == mv.index) {
                self.pending.insert(*flags);
            }
        }

        let left = mv.length - mv.travelled;
        let distance = mv.feed_rate * self.tick_ms / 60_000.0;
        let (step, done) = if distance >= left {
            (left, true)
        } else {
            (distance, false)
        };
        let fraction = if mv.length > 0.0 { step / mv.length } else { 0.0 };

        let mut stepping = false;
        for (axis, sim_axis) in self.axes.iter_mut().enumerate() {
            let d = mv.delta[axis] * fraction;
            if mv.delta[axis] == 0.0 {
                continue;
            }
            sim_axis.mpos += d;
            for (side, motor) in MotorSide::ALL.into_iter().zip(sim_axis.motors.iter_mut()) {
                let scale = mv.overrides.multiplier(MotorId::new(axis, side));
                if scale == 0.0 {
                    continue;
                }
                if mv.approach && motor.limit_active() {
                    continue;
                }
                motor.position += d * scale;
                stepping = true;
            }
        }
        mv.travelled += step;

        if done {
            let halted_on_switches = mv.approach && !stepping;
            trace!(
                "Move {} finished after {} ticks{}",
                mv.index,
                mv.ticks,
                if halted_on_switches { " on switches" } else { "" }
            );
            self.active = None;
            self.running = false;
            if !halted_on_switches {
                self.pending.insert(RealtimeFlags::CYCLE_STOP);
            }
        }
    }
}

impl Stepper for SimMachine {
    fn submit_move(&mut self, request: &MoveRequest) {
        let mut delta = [0.0; MAX_N_AXIS];
        for (axis, sim_axis) in self.axes.iter().enumerate() {
            delta[axis] = request.target[axis] - sim_axis.mpos;
        }
        let length = delta.iter().map(|d| d * d).sum::<f64>().sqrt();
        let index = self.stats.moves.len();
        trace!(
            "Move {index}: length {length:.3} feed {:.1} approach {}",
            request.feed_rate, request.approach
        );

        self.active = Some(ActiveMove {
            index,
            delta,
            length,
            travelled: 0.0,
            feed_rate: request.feed_rate,
            approach: request.approach,
            overrides: request.overrides,
            ticks: 0,
        });
        self.stats.moves.push(request.clone());
    }

    fn prep_buffer(&mut self) {
        if self.running {
            self.tick();
        }
    }

    fn wake_up(&mut self) {
        self.running = self.active.is_some();
    }

    fn reset(&mut self) {
        self.active = None;
        self.running = false;
    }

    fn limit_state(&self) -> LimitState {
        let mut state = LimitState::default();
        for axis in 0..self.axes.len() {
            for id in self.motor_ids(axis) {
                let Some(motor) = self.axes[axis].motors.get(id.side.index()) else {
                    continue;
                };
                if !motor.limit_active() {
                    continue;
                }
                if motor.switch_positive {
                    state.positive.insert(id);
                } else {
                    state.negative.insert(id);
                }
            }
        }
        state.positive = state.positive.union(self.miswired);
        state.negative = state.negative.union(self.miswired);
        state
    }

    fn set_motor_steps(&mut self, axis: usize, steps: i64) {
        if let Some(a) = self.axes.get_mut(axis) {
            a.mpos = steps as f64 / a.steps_per_mm;
        }
    }

    fn motor_steps(&self, axis: usize) -> i64 {
        self.axes
            .get(axis)
            .map_or(0, |a| (a.mpos * a.steps_per_mm).round() as i64)
    }
}

impl Axes for SimMachine {
    fn enter_homing_mode(&mut self, axes: AxisSet) -> MotorSet {
        let mut motors = MotorSet::EMPTY;
        for axis in axes.iter() {
            let Some(sim_axis) = self.axes.get(axis) else {
                continue;
            };
            for (side, wired) in MotorSide::ALL.into_iter().zip(sim_axis.homing_motors.iter()) {
                if *wired {
                    motors.insert(MotorId::new(axis, side));
                }
            }
        }
        self.homing_axes = self.homing_axes.union(axes);
        if let Some(mv) = self.active.as_mut() {
            mv.overrides = MotorOverrides::NONE;
        }
        motors
    }

    fn exit_homing_mode(&mut self, axes: AxisSet, success: bool) {
        self.homing_axes = self.homing_axes.difference(axes);
        self.stats.exits.push((axes, success));
    }
}

impl System for SimMachine {
    fn state(&self) -> MachineState {
        self.state
    }

    fn set_state(&mut self, state: MachineState) {
        self.state = state;
    }

    fn raise_alarm(&mut self, alarm: Alarm) {
        self.alarm = Some(alarm);
        self.state = MachineState::Alarm;
    }

    fn pending(&self) -> RealtimeFlags {
        self.pending
    }

    fn acknowledge(&mut self, flags: RealtimeFlags) {
        self.pending.remove(flags);
    }

    fn report_status(&mut self) {
        self.stats.status_reports += 1;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.stats.dwell_ms += u64::from(ms);
    }

    fn poll_channels(&mut self) {
        self.stats.polls += 1;
    }

    fn execute_realtime(&mut self) {
        self.pending = RealtimeFlags::empty();
        self.stats.realtime_flushes += 1;
    }

    fn motion_reset(&mut self) {
        self.active = None;
        self.running = false;
        self.stats.motion_resets += 1;
    }
}
