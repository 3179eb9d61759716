use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::stats::DataInfo;
use crate::time;

/// Default number of snapshots retained per instance.
pub const HISTORY_CAPACITY: usize = 120;

/// One reduced telemetry snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Local wall-clock time, `H:M:S` without padding.
    pub time: String,
    pub data: Vec<DataInfo>,
}

/// Bounded per-instance history of reduced telemetry.
///
/// Each instance id owns an independent FIFO buffer; once a buffer holds
/// more than `capacity` entries the oldest one is dropped.
pub struct TelemetryHistory {
    capacity: usize,
    buffers: Mutex<HashMap<String, VecDeque<HistoryEntry>>>,
}

impl Default for TelemetryHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl TelemetryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history with a custom per-instance capacity (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            buffers: Mutex::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a snapshot stamped with the current local time.
    pub async fn push(&self, id: &str, data: Vec<DataInfo>) {
        self.push_at(id, time::clock_label_now(), data).await;
    }

    /// Append a snapshot with an explicit time label.
    pub async fn push_at(&self, id: &str, time: String, data: Vec<DataInfo>) {
        let mut buffers = self.buffers.lock().await;
        let buffer = buffers.entry(id.to_string()).or_default();
        buffer.push_back(HistoryEntry { time, data });
        if buffer.len() > self.capacity {
            buffer.pop_front();
        }
    }

    /// Snapshots for an instance, oldest first. Unknown ids yield an
    /// empty list.
    pub async fn get(&self, id: &str) -> Vec<HistoryEntry> {
        let buffers = self.buffers.lock().await;
        buffers
            .get(id)
            .map(|b| b.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn len(&self, id: &str) -> usize {
        let buffers = self.buffers.lock().await;
        buffers.get(id).map(VecDeque::len).unwrap_or(0)
    }

    /// Drop the buffer for one instance.
    pub async fn evict(&self, id: &str) -> bool {
        let mut buffers = self.buffers.lock().await;
        let removed = buffers.remove(id).is_some();
        if removed {
            debug!(instance = %id, "Telemetry history evicted");
        }
        removed
    }

    /// Keep only the buffers whose id satisfies `keep`. Returns the number
    /// of buffers dropped.
    pub async fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let mut buffers = self.buffers.lock().await;
        let before = buffers.len();
        buffers.retain(|id, _| keep(id));
        let dropped = before - buffers.len();
        if dropped > 0 {
            debug!(dropped, "Telemetry history pruned");
        }
        dropped
    }
}
