//! Calibration Engine
//!
//! Probes device-reported axis limits (falling back to the full default
//! ranges) and persists a per-device snapshot. Persistence failures are
//! logged and swallowed; the computed limits are always returned.

pub mod store;

pub use store::{CalibrationStore, JsonFileStore};

use crate::motion_commander::{MotionCommander, PtzPosition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_PAN_RANGE: (f32, f32) = (-1.0, 1.0);
const DEFAULT_TILT_RANGE: (f32, f32) = (-1.0, 1.0);
const DEFAULT_ZOOM_RANGE: (f32, f32) = (0.0, 1.0);

/// Axis limits produced by one calibration run. Superseded, not merged,
/// by each new run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationLimits {
    pub pan_min: f32,
    pub pan_max: f32,
    pub tilt_min: f32,
    pub tilt_max: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub initial_position: PtzPosition,
    pub calibrated_at: DateTime<Utc>,
}

/// Probes limits for one camera and snapshots them
pub struct CalibrationEngine {
    commander: Arc<MotionCommander>,
    store: Arc<dyn CalibrationStore>,
    device_key: String,
}

impl CalibrationEngine {
    pub fn new(
        commander: Arc<MotionCommander>,
        store: Arc<dyn CalibrationStore>,
        device_key: impl Into<String>,
    ) -> Self {
        Self {
            commander,
            store,
            device_key: device_key.into(),
        }
    }

    /// Compute limits from capability data gathered at connect time,
    /// persist a snapshot, and return them.
    pub async fn calibrate_limits(&self) -> CalibrationLimits {
        let baseline = match self.commander.position().await {
            Some(position) => position,
            None => self.commander.last_known_position().await,
        };

        let capabilities = self.commander.capabilities().await;

        let (pan, tilt, zoom) = match &capabilities {
            Some(caps) => {
                if caps.probe_failed {
                    tracing::warn!(
                        camera_id = %self.commander.camera_id(),
                        "Capability probe failed at connect; calibrating with default ranges"
                    );
                } else if caps.pan_limits.is_none() {
                    tracing::info!(
                        camera_id = %self.commander.camera_id(),
                        "Device reported no axis limits; calibrating with default ranges"
                    );
                }
                (
                    caps.pan_limits.unwrap_or(DEFAULT_PAN_RANGE),
                    caps.tilt_limits.unwrap_or(DEFAULT_TILT_RANGE),
                    caps.zoom_limits.unwrap_or(DEFAULT_ZOOM_RANGE),
                )
            }
            None => {
                tracing::info!(
                    camera_id = %self.commander.camera_id(),
                    "No capability data; calibrating with default ranges"
                );
                (DEFAULT_PAN_RANGE, DEFAULT_TILT_RANGE, DEFAULT_ZOOM_RANGE)
            }
        };

        let limits = CalibrationLimits {
            pan_min: pan.0,
            pan_max: pan.1,
            tilt_min: tilt.0,
            tilt_max: tilt.1,
            zoom_min: zoom.0,
            zoom_max: zoom.1,
            initial_position: baseline,
            calibrated_at: Utc::now(),
        };

        if let Err(e) = self.store.save(&self.device_key, &limits).await {
            tracing::warn!(
                camera_id = %self.commander.camera_id(),
                device_key = %self.device_key,
                error = %e,
                "Calibration snapshot not persisted; continuing with computed limits"
            );
        }

        tracing::info!(
            camera_id = %self.commander.camera_id(),
            pan_min = limits.pan_min,
            pan_max = limits.pan_max,
            tilt_min = limits.tilt_min,
            tilt_max = limits.tilt_max,
            zoom_min = limits.zoom_min,
            zoom_max = limits.zoom_max,
            "Calibration complete"
        );

        limits
    }
}
