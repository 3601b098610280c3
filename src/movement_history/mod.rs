//! Movement History Log (Ring Buffer)
//!
//! Bounded in-memory record of recent commands for diagnostics. Lost on
//! restart; this is acceptable because it is diagnostic, not authoritative
//! state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::RwLock;

/// Kind of command recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveAction {
    AbsoluteMove,
    ContinuousMove,
    RelativeMove,
    Stop,
    GotoPreset,
    SetPreset,
    RemovePreset,
}

/// One recorded command. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRecord {
    pub timestamp: DateTime<Utc>,
    pub action: MoveAction,
    pub params: serde_json::Value,
    pub camera_id: String,
}

/// Ring buffer of move records
struct HistoryRingBuffer {
    records: VecDeque<MoveRecord>,
    capacity: usize,
}

impl HistoryRingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, record: MoveRecord) {
        if self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Up to `limit` most recent records, oldest of the slice first
    fn recent(&self, limit: usize) -> Vec<MoveRecord> {
        let skip = self.records.len().saturating_sub(limit);
        self.records.iter().skip(skip).cloned().collect()
    }
}

/// MovementHistory instance
pub struct MovementHistory {
    buffer: RwLock<HistoryRingBuffer>,
}

impl MovementHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: RwLock::new(HistoryRingBuffer::new(capacity)),
        }
    }

    /// Append a record, evicting the oldest entry when full
    pub async fn record(
        &self,
        action: MoveAction,
        params: serde_json::Value,
        camera_id: &str,
    ) {
        let record = MoveRecord {
            timestamp: Utc::now(),
            action,
            params,
            camera_id: camera_id.to_string(),
        };
        let mut buffer = self.buffer.write().await;
        buffer.push(record);
        tracing::debug!(action = ?action, camera_id = %camera_id, "Move recorded");
    }

    /// Up to `limit` most recent records in chronological order
    pub async fn recent(&self, limit: usize) -> Vec<MoveRecord> {
        let buffer = self.buffer.read().await;
        buffer.recent(limit)
    }

    pub async fn len(&self) -> usize {
        self.buffer.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MovementHistory {
    fn default() -> Self {
        Self::new(100) // Default capacity
    }
}
