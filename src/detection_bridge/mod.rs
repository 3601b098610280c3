//! Detection Bridge
//!
//! Admission control between the vision pipeline and the tracking
//! controller. Per-camera registration gates what gets forwarded;
//! malformed or low-confidence items are dropped before they reach the
//! controller. Every rejection path answers `false` rather than erroring
//! so a flaky pipeline cannot take the bridge down.

pub mod types;

pub use types::{BoundingBox, BridgeStatus, DetectionItem, FrameSize, TrackingController};

use crate::config::MotionConfig;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CameraEntry {
    active_tracking: bool,
    detection_count: u64,
    metadata: Value,
}

/// Routes detection batches to the attached tracking controller
pub struct DetectionBridge {
    config: MotionConfig,
    controller: RwLock<Option<Arc<dyn TrackingController>>>,
    cameras: RwLock<HashMap<String, CameraEntry>>,
}

impl DetectionBridge {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            controller: RwLock::new(None),
            cameras: RwLock::new(HashMap::new()),
        }
    }

    /// Attach (or replace) the downstream tracking controller
    pub async fn attach_controller(&self, controller: Arc<dyn TrackingController>) {
        *self.controller.write().await = Some(controller);
        tracing::info!("Tracking controller attached to detection bridge");
    }

    /// Register a camera for detection forwarding. Re-registration updates
    /// the metadata but keeps the tracking flag and detection counter.
    pub async fn register_camera(&self, camera_id: &str, metadata: Value) {
        let mut cameras = self.cameras.write().await;
        match cameras.get_mut(camera_id) {
            Some(entry) => {
                entry.metadata = metadata;
                tracing::debug!(camera_id = %camera_id, "Camera re-registered");
            }
            None => {
                cameras.insert(
                    camera_id.to_string(),
                    CameraEntry {
                        active_tracking: false,
                        detection_count: 0,
                        metadata,
                    },
                );
                tracing::info!(camera_id = %camera_id, "Camera registered");
            }
        }
    }

    /// Flip tracking on or off for a camera. Returns `false` for an
    /// unregistered camera.
    pub async fn set_tracking(&self, camera_id: &str, active: bool) -> bool {
        let mut cameras = self.cameras.write().await;
        match cameras.get_mut(camera_id) {
            Some(entry) => {
                entry.active_tracking = active;
                tracing::info!(camera_id = %camera_id, active = active, "Tracking toggled");
                true
            }
            None => {
                tracing::warn!(camera_id = %camera_id, "Tracking toggle for unknown camera");
                false
            }
        }
    }

    /// Forward a detection batch for one camera.
    ///
    /// Returns `true` only when at least one admissible item actually
    /// reached the controller. Any other outcome answers `false`: no
    /// controller, unknown or inactive camera, an idle controller, an
    /// all-malformed batch, or a controller error.
    pub async fn send_detections(
        &self,
        camera_id: &str,
        detections: &[DetectionItem],
        frame_size: FrameSize,
    ) -> bool {
        let controller = match self.controller.read().await.clone() {
            Some(controller) => controller,
            None => {
                tracing::debug!(camera_id = %camera_id, "Detections dropped: no controller");
                return false;
            }
        };

        {
            let cameras = self.cameras.read().await;
            match cameras.get(camera_id) {
                Some(entry) if entry.active_tracking => {}
                Some(_) => {
                    tracing::debug!(camera_id = %camera_id, "Detections dropped: tracking inactive");
                    return false;
                }
                None => {
                    tracing::debug!(camera_id = %camera_id, "Detections dropped: unknown camera");
                    return false;
                }
            }
        }

        if !controller.is_tracking_active() {
            tracing::debug!(camera_id = %camera_id, "Detections dropped: controller idle");
            return false;
        }

        let admitted: Vec<DetectionItem> = detections
            .iter()
            .filter(|item| item.is_well_formed() && item.confidence >= self.config.min_confidence)
            .cloned()
            .collect();

        let dropped = detections.len() - admitted.len();
        if dropped > 0 {
            tracing::debug!(
                camera_id = %camera_id,
                dropped = dropped,
                "Rejected malformed or low-confidence detections"
            );
        }

        if admitted.is_empty() {
            return false;
        }

        if let Err(e) = controller.update_detections(&admitted, frame_size).await {
            tracing::warn!(camera_id = %camera_id, error = %e, "Tracking controller update failed");
            return false;
        }

        let mut cameras = self.cameras.write().await;
        if let Some(entry) = cameras.get_mut(camera_id) {
            entry.detection_count += admitted.len() as u64;
        }
        true
    }

    /// Per-camera running detection count. `None` for unknown cameras.
    pub async fn detection_count(&self, camera_id: &str) -> Option<u64> {
        self.cameras
            .read()
            .await
            .get(camera_id)
            .map(|entry| entry.detection_count)
    }

    /// Registration metadata for a camera
    pub async fn camera_metadata(&self, camera_id: &str) -> Option<Value> {
        self.cameras
            .read()
            .await
            .get(camera_id)
            .map(|entry| entry.metadata.clone())
    }

    /// Aggregate view across the whole bridge
    pub async fn status(&self) -> BridgeStatus {
        let controller_attached = self.controller.read().await.is_some();
        let cameras = self.cameras.read().await;
        BridgeStatus {
            active: controller_attached && cameras.values().any(|entry| entry.active_tracking),
            registered_cameras: cameras.len(),
            total_detections: cameras.values().map(|entry| entry.detection_count).sum(),
            controller_attached,
        }
    }

    /// Drop every camera registration and counter. The controller stays
    /// attached; cameras registered afterwards forward as usual. Safe to
    /// call more than once.
    pub async fn cleanup(&self) {
        self.cameras.write().await.clear();
        tracing::info!("Detection bridge cleaned up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingController {
        batches: Mutex<Vec<Vec<DetectionItem>>>,
        idle: AtomicBool,
        fail: AtomicBool,
    }

    #[async_trait]
    impl TrackingController for RecordingController {
        async fn update_detections(
            &self,
            detections: &[DetectionItem],
            _frame_size: FrameSize,
        ) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Device("tracker rejected update".to_string()));
            }
            self.batches.lock().await.push(detections.to_vec());
            Ok(())
        }

        fn is_tracking_active(&self) -> bool {
            !self.idle.load(Ordering::SeqCst)
        }
    }

    fn item(width: f32, height: f32, confidence: f32) -> DetectionItem {
        DetectionItem {
            bbox: BoundingBox {
                x: 10.0,
                y: 20.0,
                width,
                height,
            },
            confidence,
            class_name: "person".to_string(),
            track_id: Some("t1".to_string()),
        }
    }

    const FRAME: FrameSize = FrameSize {
        width: 1920,
        height: 1080,
    };

    async fn bridge_with_camera() -> (DetectionBridge, Arc<RecordingController>) {
        let bridge = DetectionBridge::new(MotionConfig::default());
        let controller = Arc::new(RecordingController::default());
        bridge.attach_controller(controller.clone()).await;
        bridge.register_camera("cam1", json!({"name": "front door"})).await;
        bridge.set_tracking("cam1", true).await;
        (bridge, controller)
    }

    #[tokio::test]
    async fn test_inactive_camera_drops_batch_and_keeps_counter() {
        let (bridge, controller) = bridge_with_camera().await;
        bridge.set_tracking("cam1", false).await;

        let sent = bridge.send_detections("cam1", &[item(80.0, 60.0, 0.9)], FRAME).await;
        assert!(!sent);
        assert_eq!(bridge.detection_count("cam1").await, Some(0));
        assert!(controller.batches.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_item_is_filtered_out() {
        let (bridge, controller) = bridge_with_camera().await;

        let batch = vec![item(80.0, 60.0, 0.9), item(0.0, 60.0, 0.9)];
        let sent = bridge.send_detections("cam1", &batch, FRAME).await;
        assert!(sent);

        let batches = controller.batches.lock().await;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
        drop(batches);
        assert_eq!(bridge.detection_count("cam1").await, Some(1));
    }

    #[tokio::test]
    async fn test_low_confidence_item_is_filtered_out() {
        let (bridge, _controller) = bridge_with_camera().await;

        // Below the 0.6 floor; whole batch is inadmissible
        let sent = bridge.send_detections("cam1", &[item(80.0, 60.0, 0.4)], FRAME).await;
        assert!(!sent);
        assert_eq!(bridge.detection_count("cam1").await, Some(0));
    }

    #[tokio::test]
    async fn test_no_controller_drops_batch() {
        let bridge = DetectionBridge::new(MotionConfig::default());
        bridge.register_camera("cam1", json!({})).await;
        bridge.set_tracking("cam1", true).await;

        let sent = bridge.send_detections("cam1", &[item(80.0, 60.0, 0.9)], FRAME).await;
        assert!(!sent);
    }

    #[tokio::test]
    async fn test_unknown_camera_drops_batch() {
        let (bridge, _controller) = bridge_with_camera().await;
        let sent = bridge.send_detections("ghost", &[item(80.0, 60.0, 0.9)], FRAME).await;
        assert!(!sent);
    }

    #[tokio::test]
    async fn test_idle_controller_drops_batch() {
        let (bridge, controller) = bridge_with_camera().await;
        controller.idle.store(true, Ordering::SeqCst);

        let sent = bridge.send_detections("cam1", &[item(80.0, 60.0, 0.9)], FRAME).await;
        assert!(!sent);
        assert_eq!(bridge.detection_count("cam1").await, Some(0));
    }

    #[tokio::test]
    async fn test_controller_error_leaves_counter_unchanged() {
        let (bridge, controller) = bridge_with_camera().await;
        controller.fail.store(true, Ordering::SeqCst);

        let sent = bridge.send_detections("cam1", &[item(80.0, 60.0, 0.9)], FRAME).await;
        assert!(!sent);
        assert_eq!(bridge.detection_count("cam1").await, Some(0));
    }

    #[tokio::test]
    async fn test_reregistration_keeps_counter_and_flag() {
        let (bridge, _controller) = bridge_with_camera().await;
        assert!(bridge.send_detections("cam1", &[item(80.0, 60.0, 0.9)], FRAME).await);

        bridge.register_camera("cam1", json!({"name": "renamed"})).await;

        assert_eq!(bridge.detection_count("cam1").await, Some(1));
        assert_eq!(
            bridge.camera_metadata("cam1").await,
            Some(json!({"name": "renamed"}))
        );
        // Still active: the next batch goes through
        assert!(bridge.send_detections("cam1", &[item(80.0, 60.0, 0.9)], FRAME).await);
    }

    #[tokio::test]
    async fn test_set_tracking_on_unknown_camera_is_false() {
        let bridge = DetectionBridge::new(MotionConfig::default());
        assert!(!bridge.set_tracking("nobody", true).await);
    }

    #[tokio::test]
    async fn test_status_aggregates_counters() {
        let (bridge, _controller) = bridge_with_camera().await;
        bridge.register_camera("cam2", json!({})).await;
        assert!(bridge.send_detections("cam1", &[item(80.0, 60.0, 0.9)], FRAME).await);

        let status = bridge.status().await;
        assert!(status.active);
        assert!(status.controller_attached);
        assert_eq!(status.registered_cameras, 2);
        assert_eq!(status.total_detections, 1);
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let (bridge, _controller) = bridge_with_camera().await;
        bridge.cleanup().await;
        bridge.cleanup().await;

        let status = bridge.status().await;
        assert!(!status.active);
        assert!(status.controller_attached);
        assert_eq!(status.registered_cameras, 0);
        assert_eq!(status.total_detections, 0);
    }

    #[tokio::test]
    async fn test_camera_registered_after_cleanup_forwards_again() {
        let (bridge, controller) = bridge_with_camera().await;
        bridge.cleanup().await;

        // No re-attach needed; a fresh registration is enough
        bridge.register_camera("cam1", json!({})).await;
        bridge.set_tracking("cam1", true).await;

        assert!(bridge.send_detections("cam1", &[item(80.0, 60.0, 0.9)], FRAME).await);
        assert_eq!(controller.batches.lock().await.len(), 1);
        assert_eq!(bridge.detection_count("cam1").await, Some(1));
    }
}
