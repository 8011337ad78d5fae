//! The statement log kept by the coordinator.

use std::collections::VecDeque;
use std::fmt;

/// One logged statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Id of the connection that ran the statement.
    pub connection: String,
    /// The statement text.
    pub sql: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connection({}): {}", self.connection, self.sql)
    }
}

/// Append-only log of executed statements, in execution order.
///
/// Unbounded by default. With a capacity set, the oldest entries are
/// evicted once the capacity is reached, bounding memory in long-lived
/// processes.
#[derive(Debug, Default)]
pub struct QueryLog {
    entries: VecDeque<LogEntry>,
    capacity: Option<usize>,
}

impl QueryLog {
    /// Creates an unbounded log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a log that retains at most `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: Some(capacity),
        }
    }

    /// Appends an entry, evicting the oldest when over capacity.
    pub fn record(&mut self, connection: &str, sql: &str) {
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return;
            }
            while self.entries.len() >= capacity {
                self.entries.pop_front();
            }
        }
        self.entries.push_back(LogEntry {
            connection: String::from(connection),
            sql: String::from(sql),
        });
    }

    /// Returns the most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    /// Iterates the entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Returns the number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let mut log = QueryLog::new();
        log.record("a", "SELECT 1");
        log.record("b", "SELECT 2");
        let sqls: Vec<&str> = log.entries().map(|e| e.sql.as_str()).collect();
        assert_eq!(sqls, ["SELECT 1", "SELECT 2"]);
        assert_eq!(log.last().unwrap().connection, "b");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = QueryLog::with_capacity(2);
        log.record("a", "one");
        log.record("a", "two");
        log.record("a", "three");
        let sqls: Vec<&str> = log.entries().map(|e| e.sql.as_str()).collect();
        assert_eq!(sqls, ["two", "three"]);
    }

    #[test]
    fn test_display_format() {
        let entry = LogEntry {
            connection: String::from("main"),
            sql: String::from("SELECT 1"),
        };
        assert_eq!(entry.to_string(), "Connection(main): SELECT 1");
    }
}
