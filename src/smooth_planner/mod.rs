//! Smooth Motion Planner
//!
//! Decomposes one target position into an interpolated sequence of
//! absolute moves so the camera glides instead of jumping. The sequence
//! aborts on the first failed step; partial motion is a terminal state and
//! is never rolled back, so callers re-query the position to detect it.

use crate::cancel::CancelFlag;
use crate::config::MotionConfig;
use crate::error::Result;
use crate::motion_commander::MotionCommander;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Plans and executes interpolated moves through a commander
pub struct SmoothPlanner {
    commander: Arc<MotionCommander>,
    config: MotionConfig,
}

impl SmoothPlanner {
    pub fn new(commander: Arc<MotionCommander>, config: MotionConfig) -> Self {
        Self { commander, config }
    }

    /// Glide to the target using the configured step count and delay
    pub async fn move_smooth(
        &self,
        target_pan: f32,
        target_tilt: f32,
        target_zoom: f32,
        cancel: &CancelFlag,
    ) -> Result<bool> {
        self.move_smooth_with(
            target_pan,
            target_tilt,
            target_zoom,
            self.config.smooth_steps,
            self.config.smooth_step_delay(),
            cancel,
        )
        .await
    }

    /// Glide to the target in `steps` interpolated absolute moves with
    /// `step_delay` between them.
    ///
    /// `steps < 1` degenerates to a single absolute move. An identical
    /// current and target position still issues `steps` moves; that is
    /// harmless, not an error. Cancellation is honored between steps,
    /// never mid-call.
    pub async fn move_smooth_with(
        &self,
        target_pan: f32,
        target_tilt: f32,
        target_zoom: f32,
        steps: u32,
        step_delay: Duration,
        cancel: &CancelFlag,
    ) -> Result<bool> {
        let steps = steps.max(1);

        // Fresh query preferred; fall back to the last known position when
        // the device will not answer.
        let current = match self.commander.position().await {
            Some(position) => position,
            None => self.commander.last_known_position().await,
        };

        let pan_step = (target_pan - current.pan) / steps as f32;
        let tilt_step = (target_tilt - current.tilt) / steps as f32;
        let zoom_step = (target_zoom - current.zoom) / steps as f32;

        tracing::info!(
            camera_id = %self.commander.camera_id(),
            from = ?current,
            to_pan = target_pan,
            to_tilt = target_tilt,
            to_zoom = target_zoom,
            steps = steps,
            "Starting smooth move"
        );

        for i in 1..=steps {
            if cancel.is_cancelled() {
                tracing::info!(
                    camera_id = %self.commander.camera_id(),
                    completed_steps = i - 1,
                    "Smooth move cancelled"
                );
                return Ok(false);
            }

            let ok = self
                .commander
                .absolute_move(
                    current.pan + pan_step * i as f32,
                    current.tilt + tilt_step * i as f32,
                    Some(current.zoom + zoom_step * i as f32),
                    None,
                )
                .await?;

            if !ok {
                tracing::warn!(
                    camera_id = %self.commander.camera_id(),
                    failed_step = i,
                    steps = steps,
                    "Smooth move aborted on failed step"
                );
                return Ok(false);
            }

            if i < steps {
                sleep(step_delay).await;
            }
        }

        Ok(true)
    }
}
