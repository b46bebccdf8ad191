//! Event bus boundary.
//!
//! The state machine publishes stage changes here; delivery is someone
//! else's problem. Publishing is fire-and-forget: the publisher never
//! awaits confirmation and a missing subscriber is not an error.

use crate::id::TaskId;
use crate::types::KanbanStage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Topic for task stage changes.
pub const TOPIC_STAGE_CHANGED: &str = "task.stage_changed";

/// Payload published when a task moves between stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageChanged {
    /// Task that moved.
    pub task_id: TaskId,

    /// Stage before the move.
    pub old_stage: KanbanStage,

    /// Stage after the move.
    pub new_stage: KanbanStage,
}

/// A published event: topic plus JSON payload.
#[derive(Debug, Clone)]
pub struct BusEvent {
    /// Topic name.
    pub topic: String,

    /// JSON payload.
    pub payload: serde_json::Value,
}

/// Fire-and-forget publish seam.
pub trait EventBus: Send + Sync {
    /// Publish a payload to a topic. Never blocks, never fails the caller.
    fn publish(&self, topic: &str, payload: serde_json::Value);
}

/// Event bus backed by a tokio broadcast channel.
///
/// Slow or absent subscribers drop events; that is acceptable for the
/// real-time push use case this seam serves.
#[derive(Clone)]
pub struct BroadcastBus {
    sender: Arc<broadcast::Sender<BusEvent>>,
}

impl BroadcastBus {
    /// Create a bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to all published events.
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus for BroadcastBus {
    fn publish(&self, topic: &str, payload: serde_json::Value) {
        // A send error just means there are no subscribers right now.
        let _ = self.sender.send(BusEvent {
            topic: topic.to_string(),
            payload,
        });
    }
}

/// Bus that discards everything. Useful in tests that don't observe events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBus;

impl EventBus for NullBus {
    fn publish(&self, _topic: &str, _payload: serde_json::Value) {}
}
