//! Device session type definitions and trait seams
//!
//! The core never constructs wire payloads itself; it issues abstract
//! move/stop/query operations against a `DeviceSession`.

use crate::error::Result;
use crate::motion_commander::{PtzPosition, PtzVelocity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Network address and credentials for one camera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEndpoint {
    pub address: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl DeviceEndpoint {
    /// Stable key used for calibration snapshots and log correlation
    pub fn device_key(&self) -> String {
        format!("{}_{}", self.address.replace('.', "_"), self.port)
    }
}

/// Capability set discovered at connect time.
///
/// Probe failure and capability absence are distinct: a device that
/// answered but reported no limits has `probe_failed = false` with `None`
/// limits, while a device whose probe errored has `probe_failed = true`.
/// Both fall back to the default full ranges downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub pan_limits: Option<(f32, f32)>,
    pub tilt_limits: Option<(f32, f32)>,
    pub zoom_limits: Option<(f32, f32)>,
    pub absolute_move: bool,
    pub probe_failed: bool,
}

/// Snapshot of device-reported status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub position: Option<PtzPosition>,
    pub moving: bool,
    pub utc_time: Option<DateTime<Utc>>,
}

/// One authenticated channel to a camera.
///
/// Implementations own session negotiation and envelope construction;
/// the motion commander only calls these operations.
#[async_trait]
pub trait DeviceSession: Send + Sync {
    /// Discover pan/tilt/zoom limits and absolute-move support
    async fn capabilities(&self) -> Result<DeviceCapabilities>;

    /// Move directly to a destination position
    async fn absolute_move(&self, position: PtzPosition, speed: f32) -> Result<()>;

    /// Start velocity-driven motion. With `timeout` set, the device
    /// auto-stops after the interval; the core schedules no stop of its own.
    async fn continuous_move(&self, velocity: PtzVelocity, timeout: Option<Duration>)
        -> Result<()>;

    /// Translate by an offset from the current position
    async fn relative_move(
        &self,
        pan_delta: f32,
        tilt_delta: f32,
        zoom_delta: f32,
        speed: f32,
    ) -> Result<()>;

    /// Halt motion on the selected axes
    async fn stop(&self, pan_tilt: bool, zoom: bool) -> Result<()>;

    /// Query current position and movement status
    async fn status(&self) -> Result<DeviceStatus>;

    /// Recall a device-stored preset. Tokens are owned by the device.
    async fn goto_preset(&self, token: &str, speed: Option<f32>) -> Result<()>;

    /// Store the current position under a token
    async fn set_preset(&self, token: &str, name: Option<&str>) -> Result<()>;

    /// Delete a device-stored preset
    async fn remove_preset(&self, token: &str) -> Result<()>;
}

/// Opens authenticated sessions. The commander calls this once per
/// connect attempt.
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    async fn open(&self, endpoint: &DeviceEndpoint) -> Result<Box<dyn DeviceSession>>;
}
