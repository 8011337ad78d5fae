//! Error types for dispatch and execution.

use magpie_sql_core::CompileError;
use thiserror::Error;

use crate::driver::DriverError;

/// Errors surfaced by the coordinator.
///
/// Every error goes to the immediate caller; nothing is retried internally.
/// A compile or dispatch failure never executes a statement.
#[derive(Debug, Error)]
pub enum DbError {
    /// Clause compilation failed.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The dispatch delegate named a connection that does not exist.
    #[error("connection \"{0}\" not found")]
    ConnectionNotFound(String),

    /// No connection's allow-list permits the target table.
    #[error("no connection available for table \"{table}\"")]
    NoConnectionAvailable {
        /// The table the statement targeted.
        table: String,
    },

    /// A statement-issuing operation ran before a target table was set.
    #[error("no target table configured")]
    NoTable,

    /// `get` ran before a primary-key column was set.
    #[error("no primary-key column configured")]
    NoPrimaryKey,

    /// Establishing a connection failed.
    #[error("connect to \"{id}\" failed: {source}")]
    Connect {
        /// The connection id.
        id: String,
        /// The underlying driver error.
        source: DriverError,
    },

    /// The driver reported an error while running a statement.
    ///
    /// Carries the offending SQL text alongside the driver message.
    #[error("{source} SQL:{sql}")]
    Execution {
        /// The statement that failed.
        sql: String,
        /// The underlying driver error.
        source: DriverError,
    },

    /// A transaction control operation (begin/commit/rollback) failed.
    #[error("transaction error: {source}")]
    Transaction {
        /// The underlying driver error.
        source: DriverError,
    },
}

/// Result type alias for coordinator operations.
pub type Result<T> = std::result::Result<T, DbError>;
