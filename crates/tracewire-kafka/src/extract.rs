//! Batch extraction driver.
//!
//! Given the batch a poll returned, decides whether to open the receive
//! entry span, rehydrates one [`ContextCarrier`] per record from that
//! record's headers, and fans every valid upstream context in to the
//! single batch span. A pure function over the [`RecordBatch`] contract:
//! nothing here knows how the poll was intercepted.

use crate::interceptor::ConsumerInvocation;
use crate::records::{ConsumerRecord, RecordBatch};
use tracewire::{tags, Component, ContextCarrier, SpanLayer, TracingContext};
use tracing::debug;

/// Leading segment of every operation name produced here.
pub const OPERATION_PREFIX: &str = "Kafka/";
/// Role segment identifying the consumer side.
pub const CONSUMER_OPERATION: &str = "/Consumer/";

/// Sentinel for peer, broker, and topic when unresolved at this layer.
const UNKNOWN: &str = "Unknown";

/// Canonical operation name for the batch-receive entry span.
///
/// Partition assignment is not part of the span identity at poll
/// granularity, so the name ends in a generic grouping token; the concrete
/// topic lands in a tag instead.
pub fn poll_operation_name() -> String {
    format!("{OPERATION_PREFIX}SpringKafka{CONSUMER_OPERATION}Group")
}

/// Runs the extraction algorithm for one polled batch.
///
/// - Empty batch: returns without touching the context. No span is
///   created for an empty poll, so span volume tracks message throughput.
/// - A pending operation name on `inv` (pre-registered by a wrapping
///   interceptor) opens an extra outer entry span first and flags it for
///   closing by the adapter.
/// - Every record is processed even when earlier records carried no or
///   partial context; one bare record never aborts the rest.
///
/// On return the batch span has been stopped; only the wrapper span, if
/// one was opened, remains for
/// [`ConsumerPollInterceptor::after_poll`](crate::interceptor::ConsumerPollInterceptor::after_poll)
/// to close.
pub fn trace_poll<B: RecordBatch>(
    ctx: &mut TracingContext,
    inv: &mut ConsumerInvocation,
    batch: &B,
) {
    if batch.count() == 0 {
        return;
    }

    if let Some(operation) = inv.pending_operation.take() {
        ctx.create_entry_span(&operation, None);
        inv.needs_extra_stop = true;
    }

    let operation_name = poll_operation_name();
    let span = ctx.create_entry_span(&operation_name, None);
    span.set_component(Component::KafkaConsumer);
    span.set_layer(SpanLayer::Mq);
    span.set_peer(UNKNOWN);
    span.tag(tags::MQ_BROKER, UNKNOWN);

    // Partition is a tag, not identity; first partition stands in for the
    // batch, Unknown when the partition set is empty.
    let partitions = batch.partitions();
    match partitions.first() {
        Some(tp) => span.tag(tags::MQ_TOPIC, &tp.topic),
        None => span.tag(tags::MQ_TOPIC, UNKNOWN),
    }

    for record in batch.records() {
        let mut carrier = ContextCarrier::new();
        for mut item in carrier.items_mut() {
            if let Some(value) = record.header(item.key()) {
                item.set_value(String::from_utf8_lossy(value).into_owned());
            }
        }
        ctx.extract(&carrier);
    }

    debug!(records = batch.count(), "extracted trace context from poll");
    ctx.stop_span();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{OwnedBatch, OwnedRecord, TopicPartition};
    use tracewire::carrier::{
        PARENT_SERVICE_KEY, SAMPLED_KEY, SEGMENT_ID_KEY, SPAN_ID_KEY, TRACE_ID_KEY,
    };

    fn traced_record(topic: &str, trace_id: &str) -> OwnedRecord {
        OwnedRecord::new(TopicPartition::new(topic, 0))
            .with_header(TRACE_ID_KEY, trace_id.as_bytes().to_vec())
            .with_header(SEGMENT_ID_KEY, b"S1".to_vec())
            .with_header(SPAN_ID_KEY, b"0".to_vec())
            .with_header(PARENT_SERVICE_KEY, b"orders".to_vec())
            .with_header(SAMPLED_KEY, b"1".to_vec())
    }

    #[test]
    fn operation_name_matches_template() {
        assert_eq!(poll_operation_name(), "Kafka/SpringKafka/Consumer/Group");
    }

    #[test]
    fn empty_batch_creates_no_span() {
        let mut ctx = TracingContext::new("svc");
        let mut inv = ConsumerInvocation::new();
        trace_poll(&mut ctx, &mut inv, &OwnedBatch::new());

        assert_eq!(ctx.depth(), 0);
        assert!(ctx.finish().is_none());
    }

    #[test]
    fn batch_span_is_fully_tagged() {
        let mut ctx = TracingContext::new("svc");
        let mut inv = ConsumerInvocation::new();
        let batch = OwnedBatch::new().with_record(traced_record("orders", "T1"));
        trace_poll(&mut ctx, &mut inv, &batch);

        let segment = ctx.finish().expect("segment");
        let span = &segment.spans[0];
        assert_eq!(span.name, "Kafka/SpringKafka/Consumer/Group");
        assert_eq!(span.component, Some(Component::KafkaConsumer));
        assert_eq!(span.layer, Some(SpanLayer::Mq));
        assert_eq!(span.peer.as_deref(), Some("Unknown"));
        assert_eq!(span.tag_value(tags::MQ_BROKER), Some("Unknown"));
        assert_eq!(span.tag_value(tags::MQ_TOPIC), Some("orders"));
    }

    #[test]
    fn all_upstream_contexts_fan_in_to_one_span() {
        let mut ctx = TracingContext::new("svc");
        let mut inv = ConsumerInvocation::new();
        let batch = OwnedBatch::new()
            .with_record(traced_record("orders", "T1"))
            .with_record(traced_record("orders", "T2"))
            .with_record(traced_record("orders", "T3"));
        trace_poll(&mut ctx, &mut inv, &batch);

        let segment = ctx.finish().expect("segment");
        assert_eq!(segment.spans.len(), 1);
        let refs = &segment.spans[0].refs;
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].trace_id, "T1");
        assert_eq!(refs[2].trace_id, "T3");
    }

    #[test]
    fn bare_records_do_not_abort_extraction() {
        let mut ctx = TracingContext::new("svc");
        let mut inv = ConsumerInvocation::new();
        let batch = OwnedBatch::new()
            .with_record(OwnedRecord::new(TopicPartition::new("orders", 0)))
            .with_record(traced_record("orders", "T1"))
            .with_record(
                // Partial context: trace id only.
                OwnedRecord::new(TopicPartition::new("orders", 1))
                    .with_header(TRACE_ID_KEY, b"T2".to_vec()),
            );
        trace_poll(&mut ctx, &mut inv, &batch);

        let segment = ctx.finish().expect("segment");
        let refs = &segment.spans[0].refs;
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].trace_id, "T1");
    }

    #[test]
    fn pending_operation_opens_wrapper_span() {
        let mut ctx = TracingContext::new("svc");
        let mut inv = ConsumerInvocation::new();
        inv.expect_operation("orders-listener");

        let batch = OwnedBatch::new().with_record(traced_record("orders", "T1"));
        trace_poll(&mut ctx, &mut inv, &batch);

        // Batch span stopped; wrapper still open, flagged for the adapter.
        assert_eq!(ctx.depth(), 1);
        assert!(inv.needs_extra_stop);
        assert!(inv.pending_operation.is_none());

        ctx.stop_span();
        let segment = ctx.finish().expect("segment");
        assert_eq!(segment.spans.len(), 2);
        assert_eq!(segment.spans[0].name, "Kafka/SpringKafka/Consumer/Group");
        assert_eq!(segment.spans[0].parent_span_id, Some(0));
        assert_eq!(segment.spans[1].name, "orders-listener");
    }
}
