//! Preset & Patrol Manager
//!
//! Goto/set/remove for device-stored presets, plus cyclic patrol across an
//! ordered preset list. The device owns preset tokens; the core never
//! invents them, only forwards operator-supplied ones.

use crate::cancel::CancelFlag;
use crate::config::MotionConfig;
use crate::error::{Error, Result};
use crate::motion_commander::MotionCommander;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Minimum presets a patrol route needs
const MIN_PATROL_PRESETS: usize = 2;

/// Preset operations and patrol sequencing for one camera
pub struct PatrolManager {
    commander: Arc<MotionCommander>,
    config: MotionConfig,
}

impl PatrolManager {
    pub fn new(commander: Arc<MotionCommander>, config: MotionConfig) -> Self {
        Self { commander, config }
    }

    /// Recall a preset. No local token validation; the device is
    /// authoritative and failures come back as `Ok(false)`.
    pub async fn goto_preset(&self, token: &str, speed: Option<f32>) -> Result<bool> {
        self.commander.goto_preset(token, speed).await
    }

    /// Store the current position under a token
    pub async fn set_preset(&self, token: &str, name: Option<&str>) -> Result<bool> {
        self.commander.set_preset(token, name).await
    }

    /// Delete a preset
    pub async fn remove_preset(&self, token: &str) -> Result<bool> {
        self.commander.remove_preset(token).await
    }

    /// Patrol the presets cyclically with the configured dwell time
    pub async fn patrol(
        &self,
        presets: &[String],
        cycles: u32,
        cancel: &CancelFlag,
    ) -> Result<bool> {
        self.patrol_with(presets, self.config.patrol_hold(), cycles, cancel)
            .await
    }

    /// Visit each preset in order for `cycles` rounds, dwelling `hold`
    /// after each successful recall.
    ///
    /// A failed recall aborts the entire patrol immediately; the sequence
    /// is non-resumable and a caller wanting resilience restarts it.
    /// Cancellation is honored between preset visits.
    pub async fn patrol_with(
        &self,
        presets: &[String],
        hold: Duration,
        cycles: u32,
        cancel: &CancelFlag,
    ) -> Result<bool> {
        if presets.len() < MIN_PATROL_PRESETS {
            return Err(Error::InsufficientPresets {
                required: MIN_PATROL_PRESETS,
                actual: presets.len(),
            });
        }

        tracing::info!(
            camera_id = %self.commander.camera_id(),
            presets = presets.len(),
            cycles = cycles,
            hold_ms = hold.as_millis() as u64,
            "Starting patrol"
        );

        for cycle in 1..=cycles {
            for (index, token) in presets.iter().enumerate() {
                if cancel.is_cancelled() {
                    tracing::info!(
                        camera_id = %self.commander.camera_id(),
                        cycle = cycle,
                        "Patrol cancelled"
                    );
                    return Ok(false);
                }

                if !self.commander.goto_preset(token, None).await? {
                    tracing::warn!(
                        camera_id = %self.commander.camera_id(),
                        token = %token,
                        cycle = cycle,
                        "Patrol aborted on failed preset recall"
                    );
                    return Ok(false);
                }

                // Dwell only when another visit follows
                let last_visit = cycle == cycles && index == presets.len() - 1;
                if !last_visit {
                    sleep(hold).await;
                }
            }
        }

        tracing::info!(
            camera_id = %self.commander.camera_id(),
            cycles = cycles,
            "Patrol completed"
        );
        Ok(true)
    }
}
