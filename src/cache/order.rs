//! Insertion Order Module
//!
//! Tracks insertion order for FIFO eviction.

use std::collections::BTreeMap;

// == Insertion Order ==
/// Tracks keys by insertion sequence number.
///
/// Every insert takes a fresh, strictly increasing sequence number, so the
/// smallest sequence is always the entry with the oldest `created_at`.
/// Reads never reorder keys.
#[derive(Debug, Default)]
pub struct InsertionOrder {
    /// Sequence number -> key
    order: BTreeMap<u64, String>,
    next_seq: u64,
}

impl InsertionOrder {
    pub fn new() -> Self {
        Self::default()
    }

    // == Push ==
    /// Records a newly inserted key and returns its sequence number.
    pub fn push(&mut self, key: &str) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.to_string());
        seq
    }

    // == Remove ==
    /// Forgets the slot of a removed entry. Unknown sequences are ignored.
    pub fn remove(&mut self, seq: u64) {
        self.order.remove(&seq);
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest key.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_first().map(|(_, key)| key)
    }

    pub fn peek_oldest(&self) -> Option<&str> {
        self.order.first_key_value().map(|(_, key)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}
