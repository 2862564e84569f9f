use async_trait::async_trait;
use std::sync::Mutex;

/// Topics the engine publishes on. Notification delivery is an external
/// concern; subscribers key off these names and the payload literals.
pub mod topics {
    pub const ORDER_CREATED: &str = "order.created";
    pub const ORDER_STATUS_CHANGED: &str = "order.status_changed";
    pub const ORDER_AUTO_CONFIRMED: &str = "order.auto_confirmed";
    pub const JOB_CLAIMED: &str = "job.claimed";
    pub const JOB_COMPLETED: &str = "job.completed";
    pub const BYPASS_RAISED: &str = "bypass.raised";
    pub const BYPASS_RESOLVED: &str = "bypass.resolved";
}

/// Outbound event seam. The store crate provides the Kafka-backed
/// implementation; tests record in memory.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Sink that drops everything. For embedders that do their own fan-out.
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn publish(
        &self,
        _topic: &str,
        _key: &str,
        _payload: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// Sink that keeps every published event, for assertions in tests.
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<RecordedEvent>>,
}

#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub topic: String,
    pub key: String,
    pub payload: String,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn topics_seen(&self) -> Vec<String> {
        self.recorded().into_iter().map(|e| e.topic).collect()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(RecordedEvent {
            topic: topic.to_string(),
            key: key.to_string(),
            payload: payload.to_string(),
        });
        Ok(())
    }
}
