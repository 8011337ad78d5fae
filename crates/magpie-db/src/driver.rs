//! The physical driver seam.
//!
//! The access layer never talks to a database socket itself; it hands SQL
//! text to a [`Driver`] obtained from a [`Connector`]. Implementations wrap
//! an actual client library; tests script an in-memory fake.

use magpie_sql_core::{MysqlQuoter, Quoter, ToValue, Value};
use thiserror::Error;

use crate::config::ConnectionConfig;

/// An error reported by the underlying driver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DriverError {
    /// Driver-supplied message.
    pub message: String,
}

impl DriverError {
    /// Creates a driver error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type alias for driver operations.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// One result row: ordered column-name/value pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column value.
    #[must_use]
    pub fn with(mut self, column: &str, value: impl ToValue) -> Self {
        self.columns.push((String::from(column), value.to_value()));
        self
    }

    /// Returns the value of the named column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Iterates the columns in result order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// One physical database handle.
///
/// Synchronous by contract: every call blocks until the server answers.
/// The default [`Driver::quote`] escapes inline; a driver backed by a
/// server-side quoting primitive should override it.
pub trait Driver {
    /// Runs a statement and returns the affected-row count.
    fn execute(&mut self, sql: &str) -> DriverResult<u64>;

    /// Runs a query and returns its rows.
    fn query(&mut self, sql: &str) -> DriverResult<Vec<Row>>;

    /// Returns the id generated by the last INSERT on this handle.
    fn last_insert_id(&mut self) -> DriverResult<u64>;

    /// Begins a transaction.
    fn begin(&mut self) -> DriverResult<()>;

    /// Commits the active transaction.
    fn commit(&mut self) -> DriverResult<()>;

    /// Rolls back the active transaction.
    fn rollback(&mut self) -> DriverResult<()>;

    /// Quotes a value as a SQL literal.
    fn quote(&self, value: &Value) -> String {
        MysqlQuoter.quote(value)
    }
}

/// Establishes a [`Driver`] for a connection configuration.
///
/// Invoked at most once per connection; the handle is reused for the
/// connection's lifetime.
pub trait Connector {
    /// Opens a driver for `config`.
    fn connect(&self, config: &ConnectionConfig) -> DriverResult<Box<dyn Driver>>;
}

impl<F> Connector for F
where
    F: Fn(&ConnectionConfig) -> DriverResult<Box<dyn Driver>>,
{
    fn connect(&self, config: &ConnectionConfig) -> DriverResult<Box<dyn Driver>> {
        self(config)
    }
}
