//! Segment reporting seam.
//!
//! Finished contexts produce a [`TraceSegment`]; a [`SegmentReporter`]
//! hands it to whatever ships spans to the backend. Reporting is
//! synchronous and infallible from the caller's point of view: a reporter
//! that cannot deliver logs and drops, it never surfaces an error into the
//! instrumented call.

use crate::span::Span;
use serde::Serialize;
use std::sync::Mutex;
use tracing::warn;

/// One locally-observed trace segment: every span closed by a single
/// tracing context, in close order.
#[derive(Debug, Clone, Serialize)]
pub struct TraceSegment {
    /// Locally generated segment identifier.
    pub segment_id: u64,
    /// Service the segment was recorded in.
    pub service: String,
    /// Finished spans, in close order.
    pub spans: Vec<Span>,
}

/// Receives finished segments for delivery to a backend.
pub trait SegmentReporter: Send + Sync {
    /// Delivers one finished segment. Must not panic or block.
    fn report(&self, segment: TraceSegment);

    /// Reporter name for diagnostics.
    fn name(&self) -> &str;
}

/// Discards every segment.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl NoopReporter {
    pub fn new() -> Self {
        Self
    }
}

impl SegmentReporter for NoopReporter {
    fn report(&self, _segment: TraceSegment) {}

    fn name(&self) -> &str {
        "noop"
    }
}

/// Prints segments as JSON to stdout, for demos and local debugging.
#[derive(Debug)]
pub struct StdoutReporter {
    pretty: bool,
}

impl StdoutReporter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl SegmentReporter for StdoutReporter {
    fn report(&self, segment: TraceSegment) {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&segment)
        } else {
            serde_json::to_string(&segment)
        };
        match rendered {
            Ok(json) => println!("{json}"),
            Err(err) => warn!(%err, "dropping unserializable segment"),
        }
    }

    fn name(&self) -> &str {
        "stdout"
    }
}

/// Records every reported segment for later inspection in tests.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    segments: Mutex<Vec<TraceSegment>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of segments reported so far.
    pub fn reported_count(&self) -> usize {
        self.segments.lock().map_or(0, |s| s.len())
    }

    /// Copies of every reported segment.
    pub fn segments(&self) -> Vec<TraceSegment> {
        self.segments.lock().map_or_else(|_| Vec::new(), |s| s.clone())
    }
}

impl SegmentReporter for RecordingReporter {
    fn report(&self, segment: TraceSegment) {
        if let Ok(mut segments) = self.segments.lock() {
            segments.push(segment);
        }
    }

    fn name(&self) -> &str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TracingContext;

    fn one_span_segment() -> TraceSegment {
        let mut ctx = TracingContext::new("svc");
        ctx.create_entry_span("op", None);
        ctx.stop_span();
        ctx.finish().expect("segment")
    }

    #[test]
    fn recording_reporter_captures_segments() {
        let reporter = RecordingReporter::new();
        reporter.report(one_span_segment());
        reporter.report(one_span_segment());

        assert_eq!(reporter.reported_count(), 2);
        let segments = reporter.segments();
        assert_eq!(segments[0].spans.len(), 1);
        assert_eq!(segments[0].spans[0].name, "op");
    }

    #[test]
    fn noop_reporter_accepts_anything() {
        let reporter = NoopReporter::new();
        reporter.report(one_span_segment());
        assert_eq!(reporter.name(), "noop");
    }

    #[test]
    fn segment_serializes_to_json() {
        let segment = one_span_segment();
        let json = serde_json::to_value(&segment).expect("serializable");
        assert_eq!(json["service"], "svc");
        assert_eq!(json["spans"][0]["kind"], "entry");
    }
}
