//! Collaborator contract over the batch returned by an intercepted poll.
//!
//! The driver never touches the consumer client directly; it sees the
//! batch through [`RecordBatch`] and each message through
//! [`ConsumerRecord`]. The header lookup is deliberately first-wins: if a
//! header key carries multiple values only the first is visible, matching
//! the upstream consumer API's behavior for trace headers.
//!
//! [`OwnedBatch`] and [`OwnedRecord`] are the in-memory realization used
//! by tests and the demo bin.

/// Topic/partition identifier a record was read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: i32,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

/// One received message, as seen by the extraction driver.
pub trait ConsumerRecord {
    /// Topic and partition the record was read from.
    fn topic_partition(&self) -> &TopicPartition;

    /// First header value under `key`, if any (first-wins on duplicates).
    fn header(&self, key: &str) -> Option<&[u8]>;
}

/// The batch a single poll returned, read-only.
pub trait RecordBatch {
    type Record: ConsumerRecord;

    /// Number of records in the batch.
    fn count(&self) -> usize;

    /// Partitions present in the batch. Order may be arbitrary but must be
    /// deterministic within one call; "first" means index 0.
    fn partitions(&self) -> Vec<TopicPartition>;

    /// Records in receive order.
    fn records(&self) -> impl Iterator<Item = &Self::Record>;
}

/// Owned in-memory record with ordered, multi-valued headers.
#[derive(Debug, Clone)]
pub struct OwnedRecord {
    topic_partition: TopicPartition,
    headers: Vec<(String, Vec<u8>)>,
}

impl OwnedRecord {
    pub fn new(topic_partition: TopicPartition) -> Self {
        Self {
            topic_partition,
            headers: Vec::new(),
        }
    }

    /// Appends a header value; repeated keys accumulate (the trait lookup
    /// will only ever expose the first).
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

impl ConsumerRecord for OwnedRecord {
    fn topic_partition(&self) -> &TopicPartition {
        &self.topic_partition
    }

    fn header(&self, key: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }
}

/// Owned in-memory batch.
#[derive(Debug, Clone, Default)]
pub struct OwnedBatch {
    records: Vec<OwnedRecord>,
}

impl OwnedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, record: OwnedRecord) -> Self {
        self.records.push(record);
        self
    }
}

impl RecordBatch for OwnedBatch {
    type Record = OwnedRecord;

    fn count(&self) -> usize {
        self.records.len()
    }

    /// Partitions in first-seen record order, deduplicated.
    fn partitions(&self) -> Vec<TopicPartition> {
        let mut partitions: Vec<TopicPartition> = Vec::new();
        for record in &self.records {
            if !partitions.contains(record.topic_partition()) {
                partitions.push(record.topic_partition().clone());
            }
        }
        partitions
    }

    fn records(&self) -> impl Iterator<Item = &OwnedRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_first_wins() {
        let record = OwnedRecord::new(TopicPartition::new("orders", 0))
            .with_header("k", b"first".to_vec())
            .with_header("k", b"second".to_vec());

        assert_eq!(record.header("k"), Some(b"first".as_slice()));
        assert_eq!(record.header("missing"), None);
    }

    #[test]
    fn partitions_dedupe_in_first_seen_order() {
        let batch = OwnedBatch::new()
            .with_record(OwnedRecord::new(TopicPartition::new("orders", 1)))
            .with_record(OwnedRecord::new(TopicPartition::new("payments", 0)))
            .with_record(OwnedRecord::new(TopicPartition::new("orders", 1)));

        let partitions = batch.partitions();
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].topic, "orders");
        assert_eq!(partitions[1].topic, "payments");
    }

    #[test]
    fn empty_batch_has_no_partitions() {
        let batch = OwnedBatch::new();
        assert_eq!(batch.count(), 0);
        assert!(batch.partitions().is_empty());
    }

    #[test]
    fn records_iterate_in_receive_order() {
        let batch = OwnedBatch::new()
            .with_record(
                OwnedRecord::new(TopicPartition::new("orders", 0)).with_header("n", b"1".to_vec()),
            )
            .with_record(
                OwnedRecord::new(TopicPartition::new("orders", 0)).with_header("n", b"2".to_vec()),
            );

        let order: Vec<_> = batch
            .records()
            .filter_map(|r| r.header("n"))
            .collect();
        assert_eq!(order, vec![b"1".as_slice(), b"2".as_slice()]);
    }
}
