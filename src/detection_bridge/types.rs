//! Detection bridge type definitions

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// One detection from the vision pipeline. Transient: never stored beyond
/// per-call processing except for aggregate counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionItem {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub class_name: String,
    pub track_id: Option<String>,
}

impl DetectionItem {
    /// Shape validation. Fail-closed: an ambiguous item is rejected, not
    /// forwarded.
    pub fn is_well_formed(&self) -> bool {
        self.bbox.width > 0.0
            && self.bbox.height > 0.0
            && self.confidence.is_finite()
            && (0.0..=1.0).contains(&self.confidence)
    }
}

/// Frame dimensions accompanying a detection batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// Aggregate bridge status
#[derive(Debug, Clone, Serialize)]
pub struct BridgeStatus {
    pub active: bool,
    pub registered_cameras: usize,
    pub total_detections: u64,
    pub controller_attached: bool,
}

/// The tracking controller consuming forwarded detections. Temporal
/// reasoning (smoothing, prediction, target confirmation) lives behind
/// this seam, not in the bridge.
#[async_trait]
pub trait TrackingController: Send + Sync {
    async fn update_detections(
        &self,
        detections: &[DetectionItem],
        frame_size: FrameSize,
    ) -> Result<()>;

    fn is_tracking_active(&self) -> bool;
}
