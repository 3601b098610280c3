//! Motion configuration
//!
//! Every tunable the core needs is carried in one value object handed to
//! each component at construction. Nothing reads ambient globals.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Construction-time configuration for the motion components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Session establishment attempts before `connect()` gives up
    pub connect_attempts: u32,
    /// Pause between connection attempts (ms)
    pub connect_retry_delay_ms: u64,
    /// Speed used when the caller passes none (0.0-1.0)
    pub default_speed: f32,
    /// Lower clamp for caller-supplied speeds
    pub min_speed: f32,
    /// Upper clamp for caller-supplied speeds
    pub max_speed: f32,
    /// Interpolation steps for a smooth move
    pub smooth_steps: u32,
    /// Delay between smooth-move steps (ms)
    pub smooth_step_delay_ms: u64,
    /// Dwell time at each patrol preset (ms)
    pub patrol_hold_ms: u64,
    /// Movement history ring buffer capacity
    pub history_capacity: usize,
    /// Minimum detection confidence forwarded by the bridge
    pub min_confidence: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            connect_attempts: 3,
            connect_retry_delay_ms: 500,
            default_speed: 0.5,
            min_speed: 0.1,
            max_speed: 1.0,
            smooth_steps: 10,
            smooth_step_delay_ms: 300,
            patrol_hold_ms: 3000,
            history_capacity: 100,
            min_confidence: 0.6,
        }
    }
}

impl MotionConfig {
    /// Clamp a caller-supplied speed magnitude, falling back to the default
    pub fn clamp_speed(&self, speed: Option<f32>) -> f32 {
        speed
            .unwrap_or(self.default_speed)
            .clamp(self.min_speed, self.max_speed)
    }

    pub fn smooth_step_delay(&self) -> Duration {
        Duration::from_millis(self.smooth_step_delay_ms)
    }

    pub fn patrol_hold(&self) -> Duration {
        Duration::from_millis(self.patrol_hold_ms)
    }

    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_millis(self.connect_retry_delay_ms)
    }
}
