//! Motion Commander Service
//!
//! Validates and clamps movement parameters, issues absolute/continuous/
//! relative moves and stop against one camera's device session, and tracks
//! the last known position.
//!
//! All mutable state lives behind a single mutex, so commands issued
//! through one commander serialize per camera. Clamping here is the single
//! enforcement point protecting the device from out-of-range commands;
//! upstream callers (trackers, patrol loops) may compute noisy deltas.

use super::types::{ConnectionState, PtzPosition, PtzVelocity};
use crate::config::MotionConfig;
use crate::device_session::{DeviceCapabilities, DeviceConnector, DeviceEndpoint, DeviceSession};
use crate::error::{Error, Result};
use crate::movement_history::{MoveAction, MovementHistory};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;

struct Inner {
    session: Option<Box<dyn DeviceSession>>,
    state: ConnectionState,
    position: PtzPosition,
}

/// Motion command layer for one camera
pub struct MotionCommander {
    camera_id: String,
    endpoint: DeviceEndpoint,
    config: MotionConfig,
    connector: Arc<dyn DeviceConnector>,
    history: Arc<MovementHistory>,
    inner: Mutex<Inner>,
}

impl MotionCommander {
    pub fn new(
        camera_id: impl Into<String>,
        endpoint: DeviceEndpoint,
        config: MotionConfig,
        connector: Arc<dyn DeviceConnector>,
        history: Arc<MovementHistory>,
    ) -> Self {
        Self {
            camera_id: camera_id.into(),
            endpoint,
            config,
            connector,
            history,
            inner: Mutex::new(Inner {
                session: None,
                state: ConnectionState::default(),
                position: PtzPosition::default(),
            }),
        }
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    /// Establish a device session, retrying up to the configured budget.
    ///
    /// On success, capabilities and the initial position are probed
    /// best-effort: a failed probe is logged and marked, never fatal.
    /// On exhaustion the connection state stays disconnected with the
    /// attempt count retained for diagnostics.
    pub async fn connect(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;

        for attempt in 1..=self.config.connect_attempts {
            inner.state.attempts += 1;

            match self.connector.open(&self.endpoint).await {
                Ok(session) => {
                    let capabilities = match session.capabilities().await {
                        Ok(caps) => {
                            tracing::info!(
                                camera_id = %self.camera_id,
                                pan_limits = ?caps.pan_limits,
                                tilt_limits = ?caps.tilt_limits,
                                zoom_limits = ?caps.zoom_limits,
                                absolute_move = caps.absolute_move,
                                "Device capabilities discovered"
                            );
                            caps
                        }
                        Err(e) => {
                            // Probe failure is distinct from capability
                            // absence; record which one happened.
                            tracing::warn!(
                                camera_id = %self.camera_id,
                                error = %e,
                                "Capability probe failed, using defaults"
                            );
                            DeviceCapabilities {
                                probe_failed: true,
                                ..DeviceCapabilities::default()
                            }
                        }
                    };

                    if let Ok(status) = session.status().await {
                        if let Some(position) = status.position {
                            inner.position = position;
                        }
                    }

                    inner.state.connected = true;
                    inner.state.capabilities = Some(capabilities);
                    inner.session = Some(session);

                    tracing::info!(
                        camera_id = %self.camera_id,
                        attempt = attempt,
                        position = ?inner.position,
                        "PTZ session connected"
                    );
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        camera_id = %self.camera_id,
                        attempt = attempt,
                        error = %e,
                        "Connection attempt failed"
                    );
                    if attempt < self.config.connect_attempts {
                        sleep(self.config.connect_retry_delay()).await;
                    }
                }
            }
        }

        inner.state.connected = false;
        Err(Error::Connection(format!(
            "camera {}: {} attempts exhausted",
            self.camera_id, self.config.connect_attempts
        )))
    }

    /// Tear down and re-establish the session. Attempt history does not
    /// survive the reset.
    pub async fn reset(&self) -> Result<()> {
        {
            let mut inner = self.inner.lock().await;
            inner.session = None;
            inner.state = ConnectionState::default();
            tracing::info!(camera_id = %self.camera_id, "PTZ session reset");
        }
        self.connect().await
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.lock().await.state.connected
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.inner.lock().await.state.clone()
    }

    /// Capability set gathered at connect time, if any
    pub async fn capabilities(&self) -> Option<DeviceCapabilities> {
        self.inner.lock().await.state.capabilities.clone()
    }

    /// Last position a successful move or query reported
    pub async fn last_known_position(&self) -> PtzPosition {
        self.inner.lock().await.position
    }

    /// Move to an absolute position. Pan/tilt clamp to [-1, 1], zoom to
    /// [0, 1] (last known zoom when absent), speed to the configured band.
    ///
    /// Returns `Ok(false)` on device-level failure without retrying;
    /// retries are the caller's responsibility. Position is only mutated
    /// on success.
    pub async fn absolute_move(
        &self,
        pan: f32,
        tilt: f32,
        zoom: Option<f32>,
        speed: Option<f32>,
    ) -> Result<bool> {
        // NaN slips through clamp, so reject it before touching the device
        Self::validate_finite("pan", pan)?;
        Self::validate_finite("tilt", tilt)?;
        if let Some(zoom) = zoom {
            Self::validate_finite("zoom", zoom)?;
        }
        if let Some(speed) = speed {
            Self::validate_finite("speed", speed)?;
        }

        let mut inner = self.inner.lock().await;
        let session = Self::require_session(&inner, &self.camera_id)?;

        let target = PtzPosition::new(
            pan,
            tilt,
            zoom.unwrap_or(inner.position.zoom),
        );
        let speed = self.config.clamp_speed(speed);

        match session.absolute_move(target, speed).await {
            Ok(()) => {
                inner.position = target;
                self.history
                    .record(
                        MoveAction::AbsoluteMove,
                        json!({
                            "pan": target.pan,
                            "tilt": target.tilt,
                            "zoom": target.zoom,
                            "speed": speed,
                        }),
                        &self.camera_id,
                    )
                    .await;
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(
                    camera_id = %self.camera_id,
                    error = %e,
                    "Absolute move failed"
                );
                Ok(false)
            }
        }
    }

    /// Start velocity-driven motion. Speeds clamp to [-1, 1]. With
    /// `duration` the device auto-stops itself; the core schedules no stop.
    pub async fn continuous_move(
        &self,
        pan_speed: f32,
        tilt_speed: f32,
        zoom_speed: f32,
        duration: Option<Duration>,
    ) -> Result<bool> {
        Self::validate_finite("pan_speed", pan_speed)?;
        Self::validate_finite("tilt_speed", tilt_speed)?;
        Self::validate_finite("zoom_speed", zoom_speed)?;

        let inner = self.inner.lock().await;
        let session = Self::require_session(&inner, &self.camera_id)?;

        let velocity = PtzVelocity::new(pan_speed, tilt_speed, zoom_speed);

        match session.continuous_move(velocity, duration).await {
            Ok(()) => {
                self.history
                    .record(
                        MoveAction::ContinuousMove,
                        json!({
                            "pan_speed": velocity.pan,
                            "tilt_speed": velocity.tilt,
                            "zoom_speed": velocity.zoom,
                            "duration_ms": duration.map(|d| d.as_millis() as u64),
                        }),
                        &self.camera_id,
                    )
                    .await;
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(
                    camera_id = %self.camera_id,
                    error = %e,
                    "Continuous move failed"
                );
                Ok(false)
            }
        }
    }

    /// Translate by an offset. Deltas are offsets, not positions, so they
    /// are NOT clamped to the axis ranges; speed is clamped as usual.
    pub async fn relative_move(
        &self,
        pan_delta: f32,
        tilt_delta: f32,
        zoom_delta: Option<f32>,
        speed: Option<f32>,
    ) -> Result<bool> {
        Self::validate_finite("pan_delta", pan_delta)?;
        Self::validate_finite("tilt_delta", tilt_delta)?;
        if let Some(zoom_delta) = zoom_delta {
            Self::validate_finite("zoom_delta", zoom_delta)?;
        }
        if let Some(speed) = speed {
            Self::validate_finite("speed", speed)?;
        }

        let inner = self.inner.lock().await;
        let session = Self::require_session(&inner, &self.camera_id)?;

        let zoom_delta = zoom_delta.unwrap_or(0.0);
        let speed = self.config.clamp_speed(speed);

        match session
            .relative_move(pan_delta, tilt_delta, zoom_delta, speed)
            .await
        {
            Ok(()) => {
                self.history
                    .record(
                        MoveAction::RelativeMove,
                        json!({
                            "pan_delta": pan_delta,
                            "tilt_delta": tilt_delta,
                            "zoom_delta": zoom_delta,
                            "speed": speed,
                        }),
                        &self.camera_id,
                    )
                    .await;
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(
                    camera_id = %self.camera_id,
                    error = %e,
                    "Relative move failed"
                );
                Ok(false)
            }
        }
    }

    /// Halt motion. Always attempted when a session exists, regardless of
    /// the tracked connection state.
    pub async fn stop(&self, stop_pan_tilt: bool, stop_zoom: bool) -> bool {
        let inner = self.inner.lock().await;

        let Some(session) = inner.session.as_ref() else {
            tracing::warn!(camera_id = %self.camera_id, "Stop requested without a session");
            return false;
        };

        match session.stop(stop_pan_tilt, stop_zoom).await {
            Ok(()) => {
                self.history
                    .record(
                        MoveAction::Stop,
                        json!({ "pan_tilt": stop_pan_tilt, "zoom": stop_zoom }),
                        &self.camera_id,
                    )
                    .await;
                tracing::info!(camera_id = %self.camera_id, "PTZ stopped");
                true
            }
            Err(e) => {
                tracing::warn!(camera_id = %self.camera_id, error = %e, "Stop failed");
                false
            }
        }
    }

    /// Query the device for its current position. Diagnostic-only: failure
    /// returns `None`, never an error.
    pub async fn position(&self) -> Option<PtzPosition> {
        let mut inner = self.inner.lock().await;

        let session = inner.session.as_ref()?;
        match session.status().await {
            Ok(status) => match status.position {
                Some(position) => {
                    inner.position = position;
                    Some(position)
                }
                None => {
                    tracing::debug!(
                        camera_id = %self.camera_id,
                        "Device status carried no position"
                    );
                    None
                }
            },
            Err(e) => {
                tracing::warn!(
                    camera_id = %self.camera_id,
                    error = %e,
                    "Position query failed"
                );
                None
            }
        }
    }

    /// Recall a preset. The device is authoritative for token existence;
    /// no local validation happens here.
    pub async fn goto_preset(&self, token: &str, speed: Option<f32>) -> Result<bool> {
        if let Some(speed) = speed {
            Self::validate_finite("speed", speed)?;
        }

        let inner = self.inner.lock().await;
        let session = Self::require_session(&inner, &self.camera_id)?;

        let speed = speed.map(|s| s.clamp(self.config.min_speed, self.config.max_speed));

        match session.goto_preset(token, speed).await {
            Ok(()) => {
                self.history
                    .record(
                        MoveAction::GotoPreset,
                        json!({ "token": token, "speed": speed }),
                        &self.camera_id,
                    )
                    .await;
                tracing::info!(camera_id = %self.camera_id, token = %token, "Moved to preset");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(
                    camera_id = %self.camera_id,
                    token = %token,
                    error = %e,
                    "Goto preset failed"
                );
                Ok(false)
            }
        }
    }

    /// Store the current position under a token
    pub async fn set_preset(&self, token: &str, name: Option<&str>) -> Result<bool> {
        let inner = self.inner.lock().await;
        let session = Self::require_session(&inner, &self.camera_id)?;

        match session.set_preset(token, name).await {
            Ok(()) => {
                self.history
                    .record(
                        MoveAction::SetPreset,
                        json!({ "token": token, "name": name }),
                        &self.camera_id,
                    )
                    .await;
                tracing::info!(camera_id = %self.camera_id, token = %token, "Preset stored");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(
                    camera_id = %self.camera_id,
                    token = %token,
                    error = %e,
                    "Set preset failed"
                );
                Ok(false)
            }
        }
    }

    /// Delete a preset
    pub async fn remove_preset(&self, token: &str) -> Result<bool> {
        let inner = self.inner.lock().await;
        let session = Self::require_session(&inner, &self.camera_id)?;

        match session.remove_preset(token).await {
            Ok(()) => {
                self.history
                    .record(
                        MoveAction::RemovePreset,
                        json!({ "token": token }),
                        &self.camera_id,
                    )
                    .await;
                tracing::info!(camera_id = %self.camera_id, token = %token, "Preset removed");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(
                    camera_id = %self.camera_id,
                    token = %token,
                    error = %e,
                    "Remove preset failed"
                );
                Ok(false)
            }
        }
    }

    fn validate_finite(label: &str, value: f32) -> Result<()> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(Error::Validation(format!("{} is not a finite number", label)))
        }
    }

    fn require_session<'a>(inner: &'a Inner, camera_id: &str) -> Result<&'a dyn DeviceSession> {
        if !inner.state.connected {
            return Err(Error::NotConnected(format!("camera {}", camera_id)));
        }
        inner
            .session
            .as_deref()
            .ok_or_else(|| Error::NotConnected(format!("camera {}", camera_id)))
    }
}
