//! Consumer-Side Kafka Trace Instrumentation
//!
//! Instruments the batch-receive (`poll`) side of a Kafka consumer:
//! a single poll may return messages from many independent upstream trace
//! contexts, and this crate merges them into one local entry span without
//! losing causal links or unbalancing the active-span stack.
//!
//! The crate splits into three layers:
//!
//! - [`records`]: the read-only collaborator contract over the batch the
//!   intercepted poll returned, plus an owned in-memory realization for
//!   tests and demos.
//! - [`extract`]: the batch extraction driver — a pure function over a
//!   [`RecordBatch`](records::RecordBatch) and a
//!   [`TracingContext`](tracewire::TracingContext), independent of how the
//!   poll was intercepted.
//! - [`interceptor`]: the thin before/after/exception adapter the host
//!   interception mechanism invokes, carrying the strongly-typed
//!   per-invocation state.
//!
//! # Span policy
//!
//! No span is created for an empty poll; span volume tracks message
//! throughput, not polling frequency. When messages are present, exactly
//! one entry span represents the receive call and every record's upstream
//! context fans in to it as a reference.

pub mod extract;
pub mod interceptor;
pub mod records;

pub use extract::{poll_operation_name, trace_poll, CONSUMER_OPERATION, OPERATION_PREFIX};
pub use interceptor::{ConsumerInvocation, ConsumerPollInterceptor};
pub use records::{ConsumerRecord, OwnedBatch, OwnedRecord, RecordBatch, TopicPartition};
