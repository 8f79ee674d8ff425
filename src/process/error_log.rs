use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::record::ErrorRecord;

/// Maximum number of error records a process keeps.
pub const ERROR_LOG_CAPACITY: usize = 20;

/// Bounded, insertion-ordered log of the most recent errors.
///
/// When full, pushing a record evicts the oldest one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ErrorRecord>", into = "Vec<ErrorRecord>")]
pub struct ErrorLog {
    entries: VecDeque<ErrorRecord>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ErrorRecord) {
        if self.entries.len() == ERROR_LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest first.
    pub fn to_list(&self) -> Vec<ErrorRecord> {
        self.entries.iter().cloned().collect()
    }

    /// Entries newest first.
    pub fn most_recent_first(&self) -> Vec<ErrorRecord> {
        self.entries.iter().rev().cloned().collect()
    }
}

impl From<Vec<ErrorRecord>> for ErrorLog {
    fn from(records: Vec<ErrorRecord>) -> Self {
        let mut log = ErrorLog::new();
        for record in records {
            log.push(record);
        }
        log
    }
}

impl From<ErrorLog> for Vec<ErrorRecord> {
    fn from(log: ErrorLog) -> Self {
        log.entries.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(i: i64) -> ErrorRecord {
        ErrorRecord::with_entity("TestError", i)
    }

    #[test]
    fn push_appends_in_order() {
        let mut log = ErrorLog::new();
        log.push(record(1));
        log.push(record(2));
        assert_eq!(log.to_list(), vec![record(1), record(2)]);
        assert_eq!(log.most_recent_first(), vec![record(2), record(1)]);
    }

    #[test]
    fn full_log_evicts_oldest() {
        let mut log = ErrorLog::new();
        for i in 0..22 {
            log.push(record(i));
        }
        assert_eq!(log.len(), ERROR_LOG_CAPACITY);
        let entries = log.to_list();
        assert_eq!(entries.first(), Some(&record(2)));
        assert_eq!(entries.last(), Some(&record(21)));
    }

    #[test]
    fn duplicates_are_kept() {
        let mut log = ErrorLog::new();
        log.push(record(7));
        log.push(record(7));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn deserializing_oversized_list_keeps_most_recent() {
        let records: Vec<ErrorRecord> = (0..25).map(record).collect();
        let json = serde_json::to_string(&records).unwrap();
        let log: ErrorLog = serde_json::from_str(&json).unwrap();
        assert_eq!(log.len(), ERROR_LOG_CAPACITY);
        assert_eq!(log.to_list()[0], record(5));
    }
}
