//! Motion commander type definitions

use crate::device_session::DeviceCapabilities;
use serde::{Deserialize, Serialize};

/// Normalized PTZ position. Pan/tilt span [-1.0, 1.0], zoom spans [0.0, 1.0].
/// Every position accepted for dispatch has been through `clamped()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PtzPosition {
    pub pan: f32,
    pub tilt: f32,
    pub zoom: f32,
}

impl PtzPosition {
    pub fn new(pan: f32, tilt: f32, zoom: f32) -> Self {
        Self { pan, tilt, zoom }.clamped()
    }

    /// Clamp all axes into their normalized ranges
    pub fn clamped(self) -> Self {
        Self {
            pan: self.pan.clamp(-1.0, 1.0),
            tilt: self.tilt.clamp(-1.0, 1.0),
            zoom: self.zoom.clamp(0.0, 1.0),
        }
    }
}

impl Default for PtzPosition {
    fn default() -> Self {
        Self {
            pan: 0.0,
            tilt: 0.0,
            zoom: 0.0,
        }
    }
}

/// Per-axis velocity for continuous motion, each in [-1.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PtzVelocity {
    pub pan: f32,
    pub tilt: f32,
    pub zoom: f32,
}

impl PtzVelocity {
    pub fn new(pan: f32, tilt: f32, zoom: f32) -> Self {
        Self { pan, tilt, zoom }.clamped()
    }

    pub fn clamped(self) -> Self {
        Self {
            pan: self.pan.clamp(-1.0, 1.0),
            tilt: self.tilt.clamp(-1.0, 1.0),
            zoom: self.zoom.clamp(-1.0, 1.0),
        }
    }
}

/// Per-device connection state. Owned exclusively by one commander;
/// transitions on connect/disconnect/reset only.
#[derive(Debug, Clone, Default)]
pub struct ConnectionState {
    pub connected: bool,
    /// Attempt count retained for diagnostics across failed connects
    pub attempts: u32,
    pub capabilities: Option<DeviceCapabilities>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_clamped_on_new() {
        let pos = PtzPosition::new(2.0, -3.0, 1.5);
        assert_eq!(pos.pan, 1.0);
        assert_eq!(pos.tilt, -1.0);
        assert_eq!(pos.zoom, 1.0);
    }

    #[test]
    fn test_zoom_floor_is_zero() {
        let pos = PtzPosition::new(0.0, 0.0, -0.2);
        assert_eq!(pos.zoom, 0.0);
    }

    #[test]
    fn test_velocity_clamps_negative_range() {
        let vel = PtzVelocity::new(-2.0, 0.5, 3.0);
        assert_eq!(vel.pan, -1.0);
        assert_eq!(vel.tilt, 0.5);
        assert_eq!(vel.zoom, 1.0);
    }
}
