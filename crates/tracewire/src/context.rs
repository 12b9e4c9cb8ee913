//! Per-invocation tracing context: the active-span stack and finished-span
//! buffer for one logical call.
//!
//! A [`TracingContext`] is created at the start of an intercepted call,
//! threaded by mutable reference through the before/after/exception hooks,
//! and consumed by [`finish`](TracingContext::finish) when the call
//! completes. Exclusive ownership replaces the thread-scoped ambient state
//! of classic agent designs: a context can never be observed by a
//! concurrent invocation.
//!
//! Every operation tolerates misuse. Stopping with an empty stack or
//! extracting with no active span logs a warning (or debug note) and does
//! nothing; the instrumentation path never panics and never returns an
//! error to the instrumented application.

use crate::carrier::ContextCarrier;
use crate::report::TraceSegment;
use crate::span::{Span, SpanKind};
use tracing::{debug, warn};

/// Active-span stack and finished-span buffer for one intercepted call.
#[derive(Debug)]
pub struct TracingContext {
    service: String,
    segment_id: u64,
    next_span_id: u32,
    active: Vec<Span>,
    finished: Vec<Span>,
}

impl TracingContext {
    /// Creates an empty context for the given local service name.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            segment_id: rand::random(),
            next_span_id: 0,
            active: Vec::new(),
            finished: Vec::new(),
        }
    }

    /// Local service name this context reports under.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Identifier of the segment this context will produce.
    pub fn segment_id(&self) -> u64 {
        self.segment_id
    }

    /// True iff the active-span stack is non-empty.
    pub fn is_active(&self) -> bool {
        !self.active.is_empty()
    }

    /// Current active-span stack depth.
    pub fn depth(&self) -> usize {
        self.active.len()
    }

    /// Pushes a new entry span onto the stack.
    ///
    /// If the stack is non-empty the new span nests under the current top;
    /// calling twice without an intervening [`stop_span`](Self::stop_span)
    /// therefore yields two nested spans. This is deliberate: a wrapping
    /// interceptor may pre-name an outer span before the inner
    /// instrumentation opens its own.
    ///
    /// A valid `carrier` is attached to the new span as its first upstream
    /// reference; an invalid or absent one is discarded.
    pub fn create_entry_span(
        &mut self,
        name: &str,
        carrier: Option<&ContextCarrier>,
    ) -> &mut Span {
        self.push_span(name, SpanKind::Entry);
        if let Some(carrier) = carrier {
            self.extract(carrier);
        }
        // Just pushed, so the stack is non-empty.
        self.active.last_mut().expect("span pushed above")
    }

    /// Pushes a new exit span (outbound call to `peer`) onto the stack.
    ///
    /// Consumer instrumentation only opens entry spans; this completes the
    /// span-kind model for producer-side crates built on the same context.
    pub fn create_exit_span(&mut self, name: &str, peer: &str) -> &mut Span {
        let span = self.push_span(name, SpanKind::Exit);
        span.set_peer(peer);
        span
    }

    /// Pushes a new local span onto the stack, for in-process work nested
    /// under an entry or exit span.
    pub fn create_local_span(&mut self, name: &str) -> &mut Span {
        self.push_span(name, SpanKind::Local)
    }

    fn push_span(&mut self, name: &str, kind: SpanKind) -> &mut Span {
        let parent = self.active.last().map(|s| s.span_id);
        let span = Span::new(self.next_span_id, parent, name, kind);
        self.next_span_id += 1;
        self.active.push(span);
        self.active.last_mut().expect("span pushed above")
    }

    /// Attaches a valid carrier to the current top-of-stack span as a
    /// remote reference.
    ///
    /// No-op when the carrier is absent or incomplete, when it fails to
    /// decode, or when no span is active. None of these is a fault: a
    /// record without trace context simply contributes no reference.
    pub fn extract(&mut self, carrier: &ContextCarrier) {
        if carrier.is_absent() {
            return;
        }
        if !carrier.is_valid() {
            debug!("discarding partial trace-context carrier");
            return;
        }
        let Some(span) = self.active.last_mut() else {
            debug!("extract called with no active span; carrier discarded");
            return;
        };
        match carrier.to_ref() {
            Ok(span_ref) => span.add_ref(span_ref),
            Err(err) => warn!(%err, "discarding undecodable trace-context carrier"),
        }
    }

    /// Pops and finalizes the top span, recording its close timestamp.
    ///
    /// Logs a warning and does nothing if the stack is empty.
    pub fn stop_span(&mut self) {
        match self.active.pop() {
            Some(mut span) => {
                span.close();
                self.finished.push(span);
            }
            None => warn!("stop_span called with an empty active-span stack"),
        }
    }

    /// Current top-of-stack span, if any.
    ///
    /// Callers on the exception path guard with
    /// [`is_active`](Self::is_active) and skip silently when inactive.
    pub fn active_span(&mut self) -> Option<&mut Span> {
        self.active.last_mut()
    }

    /// Consumes the context, producing the finished segment.
    ///
    /// Returns `None` when no span was ever closed (e.g. an empty poll).
    /// Spans still open at this point indicate an unbalanced hook sequence;
    /// they are force-closed with a warning so the segment is never lost.
    pub fn finish(mut self) -> Option<TraceSegment> {
        if !self.active.is_empty() {
            warn!(
                open = self.active.len(),
                "context finished with spans still open; force-closing"
            );
            while let Some(mut span) = self.active.pop() {
                span.close();
                self.finished.push(span);
            }
        }
        if self.finished.is_empty() {
            return None;
        }
        Some(TraceSegment {
            segment_id: self.segment_id,
            service: self.service,
            spans: self.finished,
        })
    }
}
