use async_trait::async_trait;
use serde_json::Value;

use intentmap_core::{DeliveryError, EventRecord};

/// A contiguous snapshot of queued events, detached atomically at flush time.
///
/// The singular/bulk distinction is a wire contract, not an optimization:
/// both endpoint paths exist at the collaborator boundary and each expects
/// its own payload shape.
#[derive(Clone, Debug)]
pub struct DeliveryBatch {
    events: Vec<EventRecord>,
}

impl DeliveryBatch {
    /// The pipeline only flushes non-empty queues, so a batch always holds
    /// at least one event.
    pub fn new(events: Vec<EventRecord>) -> Self {
        debug_assert!(!events.is_empty(), "a delivery batch cannot be empty");
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn into_events(self) -> Vec<EventRecord> {
        self.events
    }

    /// `/track` for a single event, `/track/bulk` for two or more.
    pub fn endpoint_path(&self) -> &'static str {
        if self.events.len() > 1 {
            "/track/bulk"
        } else {
            "/track"
        }
    }

    /// The JSON body: the bare event for a singular batch, or
    /// `{"events": [...]}` for a bulk one.
    pub fn payload(&self) -> Value {
        if self.events.len() > 1 {
            serde_json::json!({ "events": self.events })
        } else {
            serde_json::to_value(&self.events[0]).unwrap_or(Value::Null)
        }
    }
}

/// Sends a batch to the ingestion endpoint and reports the outcome.
///
/// Implementations must not retry internally — retry policy (requeue with
/// bound) belongs to the pipeline.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, batch: &DeliveryBatch) -> Result<(), DeliveryError>;
}
