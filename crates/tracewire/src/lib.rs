//! Trace-Context Core for Message-Queue Instrumentation
//!
//! This crate provides the building blocks used by the consumer-side
//! instrumentation crates: the serialized trace-context carrier, the span
//! model, and the per-invocation [`TracingContext`] that drives the
//! entry-span lifecycle.
//!
//! # Design
//!
//! - **Explicit context passing**: a [`TracingContext`] is an owned value
//!   created for one intercepted call and dropped when that call completes.
//!   There is no thread-local or global span stack; ownership makes
//!   cross-invocation leakage impossible.
//! - **Absorb, never propagate**: every operation on a misused context
//!   (stop with an empty stack, extract with no active span) degrades to a
//!   logged no-op. Instrumentation must not be able to break the
//!   application it observes.
//! - **Fan-in references**: a single entry span may collect references to
//!   many upstream trace segments; one receive call is one unit of work no
//!   matter how many producers contributed messages to it.
//!
//! # Example
//!
//! ```
//! use tracewire::{ContextCarrier, SpanKind, TracingContext};
//!
//! let mut ctx = TracingContext::new("inventory-service");
//! let span = ctx.create_entry_span("Queue/Consumer/Group", None);
//! assert_eq!(span.kind, SpanKind::Entry);
//!
//! ctx.extract(&ContextCarrier::new()); // empty carrier: silently discarded
//! ctx.stop_span();
//!
//! let segment = ctx.finish().expect("one finished span");
//! assert_eq!(segment.spans.len(), 1);
//! ```

pub mod carrier;
pub mod context;
pub mod report;
pub mod span;

pub use carrier::{CarrierError, CarrierItem, ContextCarrier, SpanRef, CARRIER_KEYS};
pub use context::TracingContext;
pub use report::{NoopReporter, RecordingReporter, SegmentReporter, StdoutReporter, TraceSegment};
pub use span::{tags, Component, Span, SpanKind, SpanLayer, SpanLog};
