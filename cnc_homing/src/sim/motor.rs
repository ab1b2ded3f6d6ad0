//! Simulated motor with a single limit switch.

/// One simulated motor.
///
/// Positions are physical millimetres, independent of the machine step
/// counter. The switch trips once the motor reaches `switch_at` from the
/// homing side.
#[derive(Debug, Clone, PartialEq)]
pub struct SimMotor {
    /// Physical position [mm].
    pub position: f64,
    /// Switch trip point [mm].
    pub switch_at: f64,
    /// Switch is at the positive end of travel.
    pub switch_positive: bool,
    /// Motor has a switch wired at all.
    pub has_switch: bool,
    /// Switch reads active regardless of position.
    pub stuck: bool,
}

impl SimMotor {
    pub fn new(switch_at: f64, switch_positive: bool, has_switch: bool) -> Self {
        Self {
            position: 0.0,
            switch_at,
            switch_positive,
            has_switch,
            stuck: false,
        }
    }

    #[inline]
    pub fn limit_active(&self) -> bool {
        if self.stuck {
            return true;
        }
        if !self.has_switch {
            return false;
        }
        if self.switch_positive {
            self.position >= self.switch_at
        } else {
            self.position <= self.switch_at
        }
    }

    /// Distance left before the switch trips. Negative once past it.
    #[inline]
    pub fn distance_to_switch(&self) -> f64 {
        if self.switch_positive {
            self.switch_at - self.position
        } else {
            self.position - self.switch_at
        }
    }
}
