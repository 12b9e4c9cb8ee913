//! Serialized trace-context carrier.
//!
//! A [`ContextCarrier`] is the transport-neutral decomposition of one
//! upstream trace reference into a fixed, ordered set of named string
//! fields. The instrumentation fills the fields from transport headers via
//! the forward iterator returned by [`ContextCarrier::items_mut`], then
//! hands the carrier to the tracing context for extraction.
//!
//! Field order is part of the contract: every carrier iterates its items in
//! the same order, so header lookups by key are unambiguous regardless of
//! which transport populated them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header key for the upstream trace id.
pub const TRACE_ID_KEY: &str = "ctx-trace-id";
/// Header key for the upstream segment id.
pub const SEGMENT_ID_KEY: &str = "ctx-segment-id";
/// Header key for the parent span id within the upstream segment.
pub const SPAN_ID_KEY: &str = "ctx-span-id";
/// Header key for the upstream service name.
pub const PARENT_SERVICE_KEY: &str = "ctx-parent-service";
/// Header key for the upstream sampling decision ("0" or "1").
pub const SAMPLED_KEY: &str = "ctx-sampled";

/// All carrier keys, in iteration order.
pub const CARRIER_KEYS: [&str; 5] = [
    TRACE_ID_KEY,
    SEGMENT_ID_KEY,
    SPAN_ID_KEY,
    PARENT_SERVICE_KEY,
    SAMPLED_KEY,
];

const TRACE_ID: usize = 0;
const SEGMENT_ID: usize = 1;
const SPAN_ID: usize = 2;
const PARENT_SERVICE: usize = 3;
const SAMPLED: usize = 4;

/// Errors produced while decoding a carrier into a [`SpanRef`].
///
/// These never escape the instrumentation path; a carrier that fails to
/// decode simply contributes no reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CarrierError {
    /// A required field is absent or empty.
    #[error("carrier field {0:?} is absent or empty")]
    MissingField(&'static str),

    /// The span-id field is not a non-negative integer.
    #[error("carrier span id is not a valid integer: {0:?}")]
    InvalidSpanId(String),

    /// The sampling field is neither "0" nor "1".
    #[error("carrier sampling flag must be \"0\" or \"1\", got {0:?}")]
    InvalidSampled(String),
}

/// A decoded reference to a remote trace segment.
///
/// Attached to the local entry span for every message in a batch that
/// carried a complete context, linking the local unit of work back to the
/// producer that published the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanRef {
    /// Upstream trace id.
    pub trace_id: String,
    /// Upstream segment id.
    pub segment_id: String,
    /// Parent span id within the upstream segment.
    pub span_id: u32,
    /// Service that produced the message.
    pub parent_service: String,
    /// Upstream sampling decision.
    pub sampled: bool,
}

/// One serialized trace reference, decomposed into named string fields.
///
/// A freshly constructed carrier has every field absent. A carrier is
/// *valid* only once every field holds a non-empty value; an all-absent
/// carrier means "no upstream context" and is silently discarded by the
/// extraction path rather than treated as an error.
#[derive(Debug, Clone, Default)]
pub struct ContextCarrier {
    values: [Option<String>; 5],
}

/// One field of a carrier, yielded by the forward iterator.
///
/// Holds the fixed header key and a mutable slot for the value read from
/// the transport.
#[derive(Debug)]
pub struct CarrierItem<'a> {
    key: &'static str,
    value: &'a mut Option<String>,
}

impl<'a> CarrierItem<'a> {
    /// The transport header key to look up for this field.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// The value currently held, if any.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Stores the header value read from the transport.
    pub fn set_value(&mut self, value: String) {
        *self.value = Some(value);
    }
}

impl ContextCarrier {
    /// Creates a carrier with every field absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lazy forward iterator over the carrier's fields, in the fixed key
    /// order of [`CARRIER_KEYS`].
    pub fn items_mut(&mut self) -> impl Iterator<Item = CarrierItem<'_>> {
        CARRIER_KEYS
            .iter()
            .zip(self.values.iter_mut())
            .map(|(key, value)| CarrierItem { key, value })
    }

    /// Returns the value stored under `key`, if the key is one of the
    /// carrier keys and a value is present.
    pub fn get(&self, key: &str) -> Option<&str> {
        CARRIER_KEYS
            .iter()
            .position(|k| *k == key)
            .and_then(|i| self.values[i].as_deref())
    }

    /// True if every field holds a non-empty value.
    pub fn is_valid(&self) -> bool {
        self.values
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    }

    /// True if no field holds a value at all ("no upstream context").
    pub fn is_absent(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Decodes the carrier into a [`SpanRef`].
    ///
    /// Requires validity; callers on the extraction path check
    /// [`is_valid`](Self::is_valid) first and discard on any error.
    pub fn to_ref(&self) -> Result<SpanRef, CarrierError> {
        let field = |idx: usize| -> Result<&str, CarrierError> {
            self.values[idx]
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or(CarrierError::MissingField(CARRIER_KEYS[idx]))
        };

        let span_id_text = field(SPAN_ID)?;
        let span_id = span_id_text
            .parse::<u32>()
            .map_err(|_| CarrierError::InvalidSpanId(span_id_text.to_string()))?;

        let sampled = match field(SAMPLED)? {
            "0" => false,
            "1" => true,
            other => return Err(CarrierError::InvalidSampled(other.to_string())),
        };

        Ok(SpanRef {
            trace_id: field(TRACE_ID)?.to_string(),
            segment_id: field(SEGMENT_ID)?.to_string(),
            span_id,
            parent_service: field(PARENT_SERVICE)?.to_string(),
            sampled,
        })
    }
}
