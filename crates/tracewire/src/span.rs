//! Span model: a named unit of work on the active-span stack.

use crate::carrier::SpanRef;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Well-known tag keys.
pub mod tags {
    /// Topic the batch was received from.
    pub const MQ_TOPIC: &str = "mq.topic";
    /// Broker address, when known.
    pub const MQ_BROKER: &str = "mq.broker";
}

/// Span kind: where the unit of work sits relative to the process boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    /// Root of work observed to begin locally (e.g. message receipt).
    Entry,
    /// An outbound call to a remote service.
    Exit,
    /// Purely local work nested under another span.
    Local,
}

/// Layer classification of the instrumented technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanLayer {
    Db,
    Rpc,
    Http,
    Mq,
    Cache,
}

/// Component identifiers for instrumented client libraries.
///
/// The variants and their numeric ids mirror the backend's component
/// registry; the consumer crate only ever sets `KafkaConsumer`, the rest
/// exist so producer-side spans and unidentified components render
/// consistently in the same registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Unknown,
    KafkaProducer,
    KafkaConsumer,
}

impl Component {
    /// Numeric identifier understood by the backend.
    pub fn id(self) -> u32 {
        match self {
            Component::Unknown => 0,
            Component::KafkaProducer => 40,
            Component::KafkaConsumer => 41,
        }
    }
}

/// A timestamped event recorded on a span, typically a fault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanLog {
    /// Event time (Unix nanoseconds).
    pub timestamp: u64,
    /// Event payload.
    pub message: String,
}

/// A single span: one named unit of work with tags, upstream references,
/// and open/close timestamps.
///
/// Spans are created and closed exclusively through
/// [`TracingContext`](crate::TracingContext), which enforces the strict
/// stack discipline: only the top of the stack may be closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    /// Identifier within the owning segment (creation order, from 0).
    pub span_id: u32,
    /// Identifier of the enclosing span, absent for the segment root.
    pub parent_span_id: Option<u32>,
    /// Operation name.
    pub name: String,
    /// Span kind.
    pub kind: SpanKind,
    /// Instrumented component, if identified.
    pub component: Option<Component>,
    /// Layer classification, if identified.
    pub layer: Option<SpanLayer>,
    /// Remote peer address, if known.
    pub peer: Option<String>,
    /// Key/value tags; one value per key, last write wins.
    pub tags: Vec<(String, String)>,
    /// References to the upstream trace contexts this span continues from.
    pub refs: Vec<SpanRef>,
    /// Timestamped events, typically faults.
    pub logs: Vec<SpanLog>,
    /// Open time (Unix nanoseconds).
    pub start_time: u64,
    /// Close time (Unix nanoseconds); zero while the span is open.
    pub end_time: u64,
    /// Whether a fault was recorded on this span.
    pub is_error: bool,
}

pub(crate) fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64)
}

impl Span {
    pub(crate) fn new(span_id: u32, parent_span_id: Option<u32>, name: &str, kind: SpanKind) -> Self {
        Self {
            span_id,
            parent_span_id,
            name: name.to_string(),
            kind,
            component: None,
            layer: None,
            peer: None,
            tags: Vec::new(),
            refs: Vec::new(),
            logs: Vec::new(),
            start_time: now_nanos(),
            end_time: 0,
            is_error: false,
        }
    }

    /// Sets the component identifier.
    pub fn set_component(&mut self, component: Component) {
        self.component = Some(component);
    }

    /// Sets the layer classification.
    pub fn set_layer(&mut self, layer: SpanLayer) {
        self.layer = Some(layer);
    }

    /// Sets the remote peer address.
    pub fn set_peer(&mut self, peer: &str) {
        self.peer = Some(peer.to_string());
    }

    /// Sets a tag, replacing any previous value under the same key.
    pub fn tag(&mut self, key: &str, value: &str) {
        if let Some(entry) = self.tags.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value.to_string();
        } else {
            self.tags.push((key.to_string(), value.to_string()));
        }
    }

    /// Returns the tag value under `key`, if set.
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attaches a reference to an upstream trace context.
    pub fn add_ref(&mut self, span_ref: SpanRef) {
        self.refs.push(span_ref);
    }

    /// Records a fault on the span and flags it as errored.
    ///
    /// Does not close the span; closing remains the stack owner's job.
    pub fn log_error(&mut self, message: impl Into<String>) {
        self.is_error = true;
        self.logs.push(SpanLog {
            timestamp: now_nanos(),
            message: message.into(),
        });
    }

    pub(crate) fn close(&mut self) {
        self.end_time = now_nanos();
    }

    /// Duration of the span in nanoseconds; zero while still open.
    pub fn duration_nanos(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_overwrites_same_key() {
        let mut span = Span::new(0, None, "op", SpanKind::Entry);
        span.tag(tags::MQ_TOPIC, "orders");
        span.tag(tags::MQ_TOPIC, "payments");
        assert_eq!(span.tag_value(tags::MQ_TOPIC), Some("payments"));
        assert_eq!(span.tags.len(), 1);
    }

    #[test]
    fn log_error_marks_span_without_closing() {
        let mut span = Span::new(0, None, "op", SpanKind::Entry);
        span.log_error("broker unreachable");
        assert!(span.is_error);
        assert_eq!(span.logs.len(), 1);
        assert_eq!(span.end_time, 0);
    }

    #[test]
    fn component_ids_are_distinct() {
        assert_ne!(Component::KafkaConsumer.id(), Component::KafkaProducer.id());
        assert_eq!(Component::KafkaConsumer.id(), 41);
    }

    #[test]
    fn close_records_duration() {
        let mut span = Span::new(0, None, "op", SpanKind::Local);
        span.close();
        assert!(span.end_time >= span.start_time);
    }

    #[test]
    fn serializes_to_json() {
        let mut span = Span::new(1, Some(0), "op", SpanKind::Entry);
        span.set_component(Component::KafkaConsumer);
        span.set_layer(SpanLayer::Mq);
        let json = serde_json::to_value(&span).expect("serializable");
        assert_eq!(json["component"], "kafka_consumer");
        assert_eq!(json["layer"], "mq");
        assert_eq!(json["parent_span_id"], 0);
    }
}
