//! # CNC Homing
//!
//! Runs a homing request against the simulated machine described by a
//! machine TOML and reports the resulting positions.
//!
//! ```text
//! cnc_homing --config config/machine.toml --axes XY --skew 0.4 -v
//! ```

use std::path::PathBuf;
use std::process;

use clap::Parser;
use cnc_common::prelude::*;
use cnc_homing::sim::{DEFAULT_TICK_MS, SimMachine};
use cnc_homing::{CycleRequest, Stepper, home};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// CNC Homing - homing cycle runner on a simulated machine
#[derive(Parser, Debug)]
#[command(name = "cnc_homing")]
#[command(version)]
#[command(about = "Run a homing cycle against a simulated CNC machine")]
struct Args {
    /// Machine configuration TOML.
    #[arg(short, long, default_value = "config/machine.toml")]
    config: PathBuf,

    /// Axis letters to home as one cycle, or "all" for every configured cycle.
    #[arg(short, long, default_value = "all")]
    axes: String,

    /// Offset the secondary switch of every squared axis [mm].
    #[arg(long, default_value_t = 0.0)]
    skew: f64,

    /// Simulation tick [ms].
    #[arg(long, default_value_t = DEFAULT_TICK_MS)]
    tick_ms: f64,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Homing(#[from] HomingError),
}

fn main() {
    let args = Args::parse();

    let config = match MachineConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            setup_tracing(&args, LogLevel::default());
            error!("FATAL: {}: {e}", args.config.display());
            process::exit(1);
        }
    };
    setup_tracing(&args, config.log_level);

    info!("CNC Homing v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, &config) {
        error!("FATAL: {e}");
        process::exit(1);
    }
}

fn run(args: &Args, config: &MachineConfig) -> Result<(), RunError> {
    let request = if args.axes.eq_ignore_ascii_case("all") {
        CycleRequest::All
    } else {
        CycleRequest::Axes(config.parse_axes(&args.axes)?)
    };

    let mut machine = SimMachine::new(config).with_tick_ms(args.tick_ms);
    if args.skew != 0.0 {
        for (axis, axis_config) in config.axes.iter().enumerate() {
            if axis_config.is_squared() {
                machine = machine.with_skew(axis, args.skew);
            }
        }
    }

    info!(
        "Config OK: {} axes, homing {}",
        config.n_axis(),
        config.axis_names(config.homing_mask())
    );

    home(&mut machine, config, request)?;

    let homed: AxisSet = match request {
        CycleRequest::All => (1..=MAX_N_AXIS as u8)
            .map(|cycle| config.axes_in_cycle(cycle))
            .fold(AxisSet::EMPTY, AxisSet::union),
        CycleRequest::Axes(axes) => axes.intersection(config.homing_mask()),
    };
    for axis in homed.iter() {
        let axis_config = &config.axes[axis];
        let mpos = axis_config.steps_to_mpos(machine.motor_steps(axis));
        let (min, max) = axis_config.travel_limits();
        info!(
            "{}: mpos {:.3} travel [{:.3}, {:.3}]",
            axis_config.name, mpos, min, max
        );
        if axis_config.is_squared() {
            let m0 = machine.motor_position(MotorId::new(axis, MotorSide::Primary));
            let m1 = machine.motor_position(MotorId::new(axis, MotorSide::Secondary));
            if let (Some(m0), Some(m1)) = (m0, m1) {
                info!(
                    "{}: motor offset after squaring {:.3}",
                    axis_config.name,
                    m1 - m0
                );
            }
        }
    }
    info!(
        "{} moves, {} ms settle",
        machine.stats().moves.len(),
        machine.stats().dwell_ms
    );

    Ok(())
}

/// Filter directives: `--verbose` forces debug, then `RUST_LOG` when set,
/// then the configured level.
fn filter_directives(verbose: bool, configured: LogLevel, rust_log: Option<String>) -> String {
    if verbose {
        return "debug".to_string();
    }
    match rust_log {
        Some(directives) if !directives.trim().is_empty() => directives,
        _ => configured.as_filter().to_string(),
    }
}

fn setup_tracing(args: &Args, configured: LogLevel) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::new(filter_directives(args.verbose, configured, rust_log));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
