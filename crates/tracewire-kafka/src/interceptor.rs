//! Poll interceptor adapter.
//!
//! The host interception mechanism invokes three hooks around the
//! consumer's poll: before, after (with the return value, absent on
//! fault), and on-exception. The hooks share no call stack; everything
//! they need to coordinate travels in the [`ConsumerInvocation`] owned by
//! the intercepted call. Across every exit path the hooks leave the
//! active-span stack at the depth they found it.

use crate::extract::trace_poll;
use crate::records::RecordBatch;
use std::fmt::Display;
use tracewire::TracingContext;

/// Strongly-typed per-invocation state.
///
/// Replaces the string-keyed runtime flag map of classic agent designs: a
/// wrapping interceptor that wants the receive work reported under its own
/// operation name records that intent here, and the extraction step
/// records back that the resulting wrapper span still needs closing.
///
/// Created fresh per intercepted call, owned by it, dropped with it.
#[derive(Debug, Default)]
pub struct ConsumerInvocation {
    /// Operation name pre-registered by an outer interceptor; consumed by
    /// the driver to open an extra entry span around the batch span.
    pub pending_operation: Option<String>,
    /// Set once the wrapper span has been opened and must be closed before
    /// the invocation completes.
    pub needs_extra_stop: bool,
}

impl ConsumerInvocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-registers a wrapper operation name for the next poll.
    pub fn expect_operation(&mut self, name: impl Into<String>) {
        self.pending_operation = Some(name.into());
    }
}

/// Thin adapter between the host's interception hooks and the extraction
/// driver. Stateless; all per-call state lives in the
/// [`TracingContext`] and [`ConsumerInvocation`] the host threads through.
#[derive(Debug, Default)]
pub struct ConsumerPollInterceptor;

impl ConsumerPollInterceptor {
    pub fn new() -> Self {
        Self
    }

    /// Before-hook. Poll needs no setup; kept for hook symmetry.
    pub fn before_poll(&self, _inv: &mut ConsumerInvocation) {}

    /// After-hook, receiving the poll's return value.
    ///
    /// `None` means the call faulted before producing a batch; the
    /// exception hook owns that path and nothing happens here. Otherwise
    /// the driver runs, and any wrapper span it opened is closed so the
    /// stack is balanced when the hook returns.
    pub fn after_poll<B: RecordBatch>(
        &self,
        ctx: &mut TracingContext,
        inv: &mut ConsumerInvocation,
        batch: Option<&B>,
    ) {
        let Some(batch) = batch else {
            return;
        };

        trace_poll(ctx, inv, batch);

        if inv.needs_extra_stop {
            ctx.stop_span();
            inv.needs_extra_stop = false;
        }
    }

    /// Exception-hook, invoked when the poll raises a fault.
    ///
    /// May run before any span exists (fault before any record was
    /// returned), so it checks for an active span first. When one is
    /// active the fault is logged onto it without closing it; closing
    /// stays with the after-hook path, since before/after/exception
    /// ordering is not guaranteed to be mutually exclusive.
    pub fn on_poll_error(&self, ctx: &mut TracingContext, error: &dyn Display) {
        if let Some(span) = ctx.active_span() {
            span.log_error(error.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::OwnedBatch;

    #[test]
    fn absent_batch_is_a_noop() {
        let interceptor = ConsumerPollInterceptor::new();
        let mut ctx = TracingContext::new("svc");
        let mut inv = ConsumerInvocation::new();

        interceptor.before_poll(&mut inv);
        interceptor.after_poll::<OwnedBatch>(&mut ctx, &mut inv, None);

        assert_eq!(ctx.depth(), 0);
        assert!(ctx.finish().is_none());
    }

    #[test]
    fn error_without_active_span_is_dropped() {
        let interceptor = ConsumerPollInterceptor::new();
        let mut ctx = TracingContext::new("svc");

        interceptor.on_poll_error(&mut ctx, &"timeout");

        assert!(!ctx.is_active());
        assert!(ctx.finish().is_none());
    }

    #[test]
    fn error_with_active_span_is_logged_not_closed() {
        let interceptor = ConsumerPollInterceptor::new();
        let mut ctx = TracingContext::new("svc");
        ctx.create_entry_span("op", None);

        interceptor.on_poll_error(&mut ctx, &"timeout");

        assert_eq!(ctx.depth(), 1);
        let span = ctx.active_span().expect("still active");
        assert!(span.is_error);
        assert_eq!(span.logs[0].message, "timeout");
    }
}
