//! Hand-rolled device session mocks shared by the motion component tests

use super::types::{
    DeviceCapabilities, DeviceConnector, DeviceEndpoint, DeviceSession, DeviceStatus,
};
use crate::error::{Error, Result};
use crate::motion_commander::{PtzPosition, PtzVelocity};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Default)]
struct CallLog {
    absolute_moves: Vec<(PtzPosition, f32)>,
    continuous_moves: Vec<(PtzVelocity, Option<Duration>)>,
    relative_moves: Vec<(f32, f32, f32, f32)>,
    stops: Vec<(bool, bool)>,
    preset_calls: Vec<(String, String)>,
    fail_moves_after: Option<usize>,
    fail_presets_after: Option<usize>,
    fail_status: bool,
    status_position: Option<PtzPosition>,
}

/// Shared, inspectable log of every call a mock session received
#[derive(Clone, Default)]
pub struct SharedCalls {
    log: Arc<Mutex<CallLog>>,
}

impl SharedCalls {
    pub async fn absolute_moves(&self) -> Vec<(PtzPosition, f32)> {
        self.log.lock().await.absolute_moves.clone()
    }

    pub async fn continuous_moves(&self) -> Vec<(PtzVelocity, Option<Duration>)> {
        self.log.lock().await.continuous_moves.clone()
    }

    pub async fn relative_moves(&self) -> Vec<(f32, f32, f32, f32)> {
        self.log.lock().await.relative_moves.clone()
    }

    pub async fn stops(&self) -> Vec<(bool, bool)> {
        self.log.lock().await.stops.clone()
    }

    /// (operation, token) pairs in call order
    pub async fn preset_calls(&self) -> Vec<(String, String)> {
        self.log.lock().await.preset_calls.clone()
    }

    /// Absolute moves beyond the first `n` are recorded, then rejected
    pub async fn fail_moves_after(&self, n: usize) {
        self.log.lock().await.fail_moves_after = Some(n);
    }

    /// Goto-preset calls beyond the first `n` are recorded, then rejected
    pub async fn fail_presets_after(&self, n: usize) {
        self.log.lock().await.fail_presets_after = Some(n);
    }

    pub async fn fail_status(&self) {
        self.log.lock().await.fail_status = true;
    }

    pub async fn set_status_position(&self, position: PtzPosition) {
        self.log.lock().await.status_position = Some(position);
    }
}

/// In-memory device session recording every operation
pub struct MockSession {
    calls: SharedCalls,
}

#[async_trait]
impl DeviceSession for MockSession {
    async fn capabilities(&self) -> Result<DeviceCapabilities> {
        Ok(DeviceCapabilities {
            pan_limits: Some((-1.0, 1.0)),
            tilt_limits: Some((-1.0, 1.0)),
            zoom_limits: Some((0.0, 1.0)),
            absolute_move: true,
            probe_failed: false,
        })
    }

    async fn absolute_move(&self, position: PtzPosition, speed: f32) -> Result<()> {
        let mut log = self.calls.log.lock().await;
        let issued = log.absolute_moves.len();
        log.absolute_moves.push((position, speed));
        match log.fail_moves_after {
            Some(n) if issued >= n => Err(Error::Device("absolute move rejected".to_string())),
            _ => Ok(()),
        }
    }

    async fn continuous_move(
        &self,
        velocity: PtzVelocity,
        timeout: Option<Duration>,
    ) -> Result<()> {
        self.calls
            .log
            .lock()
            .await
            .continuous_moves
            .push((velocity, timeout));
        Ok(())
    }

    async fn relative_move(
        &self,
        pan_delta: f32,
        tilt_delta: f32,
        zoom_delta: f32,
        speed: f32,
    ) -> Result<()> {
        self.calls
            .log
            .lock()
            .await
            .relative_moves
            .push((pan_delta, tilt_delta, zoom_delta, speed));
        Ok(())
    }

    async fn stop(&self, pan_tilt: bool, zoom: bool) -> Result<()> {
        self.calls.log.lock().await.stops.push((pan_tilt, zoom));
        Ok(())
    }

    async fn status(&self) -> Result<DeviceStatus> {
        let log = self.calls.log.lock().await;
        if log.fail_status {
            return Err(Error::Device("status query rejected".to_string()));
        }
        Ok(DeviceStatus {
            position: Some(log.status_position.unwrap_or_default()),
            moving: false,
            utc_time: None,
        })
    }

    async fn goto_preset(&self, token: &str, _speed: Option<f32>) -> Result<()> {
        let mut log = self.calls.log.lock().await;
        let issued = log
            .preset_calls
            .iter()
            .filter(|(op, _)| op == "goto")
            .count();
        log.preset_calls
            .push(("goto".to_string(), token.to_string()));
        match log.fail_presets_after {
            Some(n) if issued >= n => Err(Error::Device("goto preset rejected".to_string())),
            _ => Ok(()),
        }
    }

    async fn set_preset(&self, token: &str, _name: Option<&str>) -> Result<()> {
        self.calls
            .log
            .lock()
            .await
            .preset_calls
            .push(("set".to_string(), token.to_string()));
        Ok(())
    }

    async fn remove_preset(&self, token: &str) -> Result<()> {
        self.calls
            .log
            .lock()
            .await
            .preset_calls
            .push(("remove".to_string(), token.to_string()));
        Ok(())
    }
}

/// Connector whose sessions either always open or always fail
pub enum MockConnector {
    Succeeding(SharedCalls),
    Failing,
}

impl MockConnector {
    pub fn succeeding(calls: SharedCalls) -> Self {
        Self::Succeeding(calls)
    }

    pub fn failing() -> Self {
        Self::Failing
    }
}

#[async_trait]
impl DeviceConnector for MockConnector {
    async fn open(&self, endpoint: &DeviceEndpoint) -> Result<Box<dyn DeviceSession>> {
        match self {
            Self::Succeeding(calls) => Ok(Box::new(MockSession {
                calls: calls.clone(),
            })),
            Self::Failing => Err(Error::Connection(format!(
                "unreachable endpoint {}:{}",
                endpoint.address, endpoint.port
            ))),
        }
    }
}
