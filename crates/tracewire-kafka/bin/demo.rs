//! # Consumer Instrumentation Demo
//!
//! Simulates three intercepted polls against an in-memory batch and prints
//! the resulting trace segments as JSON:
//!
//! 1. An empty poll (no span, by policy).
//! 2. A poll returning three records from two producers, one of them
//!    without trace headers.
//! 3. A poll that faults before returning anything, followed by a
//!    successful retry: the fault is invisible to tracing (no span was
//!    ever opened for it) and only the retry produces a segment.
//!
//! ## Running
//!
//! ```bash
//! cargo run -p tracewire-kafka --bin demo
//! ```

use tracewire::carrier::{
    PARENT_SERVICE_KEY, SAMPLED_KEY, SEGMENT_ID_KEY, SPAN_ID_KEY, TRACE_ID_KEY,
};
use tracewire::{SegmentReporter, StdoutReporter, TracingContext};
use tracewire_kafka::{
    ConsumerInvocation, ConsumerPollInterceptor, OwnedBatch, OwnedRecord, TopicPartition,
};

fn traced_record(topic: &str, partition: i32, trace_id: &str, producer: &str) -> OwnedRecord {
    OwnedRecord::new(TopicPartition::new(topic, partition))
        .with_header(TRACE_ID_KEY, trace_id.as_bytes().to_vec())
        .with_header(SEGMENT_ID_KEY, format!("{trace_id}-seg").into_bytes())
        .with_header(SPAN_ID_KEY, b"0".to_vec())
        .with_header(PARENT_SERVICE_KEY, producer.as_bytes().to_vec())
        .with_header(SAMPLED_KEY, b"1".to_vec())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let interceptor = ConsumerPollInterceptor::new();
    let reporter = StdoutReporter::new(true);

    // 1. Empty poll: no span.
    let mut ctx = TracingContext::new("demo-consumer");
    let mut inv = ConsumerInvocation::new();
    interceptor.before_poll(&mut inv);
    interceptor.after_poll(&mut ctx, &mut inv, Some(&OwnedBatch::new()));
    match ctx.finish() {
        Some(segment) => reporter.report(segment),
        None => println!("empty poll: no segment (as designed)"),
    }

    // 2. Batch with mixed upstream contexts fanning in to one span.
    let batch = OwnedBatch::new()
        .with_record(traced_record("orders", 0, "T1", "checkout"))
        .with_record(traced_record("orders", 1, "T2", "billing"))
        .with_record(OwnedRecord::new(TopicPartition::new("orders", 1)));

    let mut ctx = TracingContext::new("demo-consumer");
    let mut inv = ConsumerInvocation::new();
    inv.expect_operation("orders-listener");
    interceptor.before_poll(&mut inv);
    interceptor.after_poll(&mut ctx, &mut inv, Some(&batch));
    if let Some(segment) = ctx.finish() {
        reporter.report(segment);
    }

    // 3. Fault during poll, then a successful retry.
    let mut ctx = TracingContext::new("demo-consumer");
    let mut inv = ConsumerInvocation::new();
    interceptor.before_poll(&mut inv);
    interceptor.on_poll_error(&mut ctx, &"broker unreachable");
    interceptor.after_poll::<OwnedBatch>(&mut ctx, &mut inv, None);

    let retry = OwnedBatch::new().with_record(traced_record("orders", 0, "T3", "checkout"));
    interceptor.after_poll(&mut ctx, &mut inv, Some(&retry));
    if let Some(segment) = ctx.finish() {
        reporter.report(segment);
    }
}
