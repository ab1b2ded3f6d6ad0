mod failures;
mod sequencing;
mod squaring;

use cnc_common::config::MachineConfig;

/// Gantry with a squared Y. Z homes first (cycle 1), then X and Y together.
///
/// Rates are high enough that a 1 ms tick gives short simulations:
/// 0.1 mm per tick while seeking, 0.01 mm per tick at feed.
pub const GANTRY: &str = r#"
[[axes]]
name = "X"
max_travel_mm = 100.0
steps_per_mm = 80.0
[axes.homing]
cycle = 2
seek_mpm = 6000.0
feed_mpm = 600.0
settle_ms = 10

[[axes]]
name = "Y"
max_travel_mm = 100.0
steps_per_mm = 80.0
[axes.homing]
cycle = 2
seek_mpm = 6000.0
feed_mpm = 600.0
settle_ms = 20
positive_direction = false
mpos_mm = 5.0
[[axes.motors]]
pulloff_mm = 1.0
[[axes.motors]]
pulloff_mm = 1.5

[[axes]]
name = "Z"
max_travel_mm = 50.0
steps_per_mm = 400.0
[axes.homing]
cycle = 1
seek_mpm = 6000.0
feed_mpm = 600.0
settle_ms = 5
mpos_mm = -3.0
"#;

pub const X: usize = 0;
pub const Y: usize = 1;
pub const Z: usize = 2;

pub fn gantry() -> MachineConfig {
    MachineConfig::from_toml(GANTRY).unwrap()
}

/// Gantry with every cycle number removed.
pub fn gantry_without_cycles() -> MachineConfig {
    let mut cfg = gantry();
    for axis in &mut cfg.axes {
        if let Some(h) = axis.homing.as_mut() {
            h.cycle = None;
        }
    }
    cfg
}
