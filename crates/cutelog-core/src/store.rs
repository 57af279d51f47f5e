//! Bounded, ordered record store backing one tab

use std::collections::VecDeque;

use crate::record::LogRecord;

/// Ordered sequence of records with an optional capacity.
///
/// Records are kept in arrival order; only [`RecordStore::merge_with`] reorders
/// them, by timestamp. A `max_capacity` of zero means unbounded.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: VecDeque<LogRecord>,
    max_capacity: usize,
}

impl RecordStore {
    pub fn new(max_capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            max_capacity,
        }
    }

    /// Append a record, evicting the oldest first if the store is full.
    ///
    /// Returns how many records were evicted to make room.
    pub fn add_record(&mut self, record: LogRecord) -> usize {
        let evicted = if self.max_capacity > 0 {
            self.evict_oldest_until(self.max_capacity - 1)
        } else {
            0
        };
        self.records.push_back(record);
        evicted
    }

    /// Drop records from the front until at most `limit` remain.
    ///
    /// Returns the number of records removed.
    pub fn evict_oldest_until(&mut self, limit: usize) -> usize {
        let excess = self.records.len().saturating_sub(limit);
        self.records.drain(..excess);
        excess
    }

    /// Keep only the newest `n` records
    pub fn trim_except_last_n(&mut self, n: usize) -> usize {
        self.evict_oldest_until(n)
    }

    /// Change the capacity, trimming immediately if the store is over it.
    pub fn set_capacity(&mut self, max_capacity: usize) -> usize {
        self.max_capacity = max_capacity;
        if max_capacity > 0 {
            self.evict_oldest_until(max_capacity)
        } else {
            0
        }
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Merge another history into this one.
    ///
    /// The combined sequence is stably sorted by `created`, so records with equal
    /// timestamps keep this store's records ahead of the incoming ones and keep
    /// their relative order. The capacity is enforced afterwards.
    pub fn merge_with(&mut self, other: impl IntoIterator<Item = LogRecord>) -> usize {
        let mut merged: Vec<LogRecord> = self.records.drain(..).chain(other).collect();
        merged.sort_by(|a, b| a.created.total_cmp(&b.created));
        self.records = merged.into();
        if self.max_capacity > 0 {
            self.evict_oldest_until(self.max_capacity)
        } else {
            0
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Take every record out, leaving the store empty
    pub fn take_records(&mut self) -> Vec<LogRecord> {
        self.records.drain(..).collect()
    }

    pub fn get(&self, index: usize) -> Option<&LogRecord> {
        self.records.get(index)
    }

    pub fn last(&self) -> Option<&LogRecord> {
        self.records.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LogRecord> + ExactSizeIterator {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Fields;
    use serde_json::json;

    fn record(msg: &str, created: f64) -> LogRecord {
        let mut fields = Fields::new();
        fields.insert("msg".into(), json!(msg));
        fields.insert("created".into(), json!(created));
        LogRecord::from_fields(fields)
    }

    fn messages(store: &RecordStore) -> Vec<&str> {
        store.iter().filter_map(|r| r.message.as_deref()).collect()
    }

    #[test]
    fn test_unbounded_store_keeps_everything() {
        let mut store = RecordStore::new(0);
        for i in 0..100 {
            store.add_record(record(&i.to_string(), i as f64));
        }
        assert_eq!(store.len(), 100);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut store = RecordStore::new(3);
        for (i, msg) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            store.add_record(record(msg, i as f64));
        }
        assert_eq!(messages(&store), vec!["c", "d", "e"]);
    }

    #[test]
    fn test_add_record_reports_evictions() {
        let mut store = RecordStore::new(1);
        assert_eq!(store.add_record(record("a", 0.0)), 0);
        assert_eq!(store.add_record(record("b", 1.0)), 1);
    }

    #[test]
    fn test_arrival_order_not_time_order() {
        let mut store = RecordStore::new(0);
        store.add_record(record("late", 10.0));
        store.add_record(record("early", 1.0));
        assert_eq!(messages(&store), vec!["late", "early"]);
    }

    #[test]
    fn test_trim_except_last_n() {
        let mut store = RecordStore::new(0);
        for i in 0..10 {
            store.add_record(record(&i.to_string(), i as f64));
        }
        assert_eq!(store.trim_except_last_n(2), 8);
        assert_eq!(messages(&store), vec!["8", "9"]);
        assert_eq!(store.trim_except_last_n(5), 0);
    }

    #[test]
    fn test_set_capacity_trims() {
        let mut store = RecordStore::new(0);
        for i in 0..5 {
            store.add_record(record(&i.to_string(), i as f64));
        }
        assert_eq!(store.set_capacity(2), 3);
        assert_eq!(messages(&store), vec!["3", "4"]);
        assert_eq!(store.set_capacity(0), 0);
        assert_eq!(store.max_capacity(), 0);
    }

    #[test]
    fn test_merge_sorts_by_created_stably() {
        let mut store = RecordStore::new(0);
        store.add_record(record("t1", 1.0));
        store.add_record(record("t3-own", 3.0));

        store.merge_with(vec![record("t2", 2.0), record("t3-other", 3.0)]);
        assert_eq!(messages(&store), vec!["t1", "t2", "t3-own", "t3-other"]);
    }

    #[test]
    fn test_merge_respects_capacity() {
        let mut store = RecordStore::new(2);
        store.add_record(record("a", 1.0));
        store.merge_with(vec![record("b", 2.0), record("c", 3.0)]);
        assert_eq!(messages(&store), vec!["b", "c"]);
    }

    #[test]
    fn test_take_records_empties_store() {
        let mut store = RecordStore::new(0);
        store.add_record(record("a", 1.0));
        let taken = store.take_records();
        assert_eq!(taken.len(), 1);
        assert!(store.is_empty());
    }
}
