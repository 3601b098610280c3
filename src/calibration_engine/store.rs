//! Calibration snapshot persistence
//!
//! One JSON document per device key, overwritten on each calibration run.
//! History, if anyone wants it, is this collaborator's concern, not the
//! engine's.

use super::CalibrationLimits;
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Persistence seam for calibration snapshots
#[async_trait]
pub trait CalibrationStore: Send + Sync {
    /// Overwrite the snapshot for `key`
    async fn save(&self, key: &str, limits: &CalibrationLimits) -> Result<()>;

    /// Load the snapshot for `key`, if one was ever saved
    async fn load(&self, key: &str) -> Result<Option<CalibrationLimits>>;
}

/// File-backed store writing `calibration_<key>.json` under one directory
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("calibration_{}.json", key))
    }
}

#[async_trait]
impl CalibrationStore for JsonFileStore {
    async fn save(&self, key: &str, limits: &CalibrationLimits) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec_pretty(limits)?;
        let path = self.path_for(key);
        fs::write(&path, json).await?;
        tracing::info!(path = %path.display(), "Calibration snapshot saved");
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<CalibrationLimits>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion_commander::PtzPosition;
    use chrono::Utc;

    fn sample_limits() -> CalibrationLimits {
        CalibrationLimits {
            pan_min: -1.0,
            pan_max: 1.0,
            tilt_min: -0.8,
            tilt_max: 0.8,
            zoom_min: 0.0,
            zoom_max: 1.0,
            initial_position: PtzPosition::new(0.1, 0.2, 0.3),
            calibrated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.save("192_168_1_50_80", &sample_limits()).await.unwrap();
        let loaded = store.load("192_168_1_50_80").await.unwrap().unwrap();

        assert_eq!(loaded.tilt_min, -0.8);
        assert_eq!(loaded.initial_position.pan, 0.1);
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.save("cam", &sample_limits()).await.unwrap();
        let mut updated = sample_limits();
        updated.pan_max = 0.5;
        store.save("cam", &updated).await.unwrap();

        let loaded = store.load("cam").await.unwrap().unwrap();
        assert_eq!(loaded.pan_max, 0.5);
    }

    #[tokio::test]
    async fn test_load_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load("nobody").await.unwrap().is_none());
    }
}
