//! # magpie-db
//!
//! The runtime half of the magpie access layer: a pool of lazily-connected
//! database connections, a pluggable dispatcher that routes each statement
//! to the least-loaded eligible connection, a statement log, and the [`Db`]
//! facade with transaction support.
//!
//! SQL text comes from [`magpie_sql_core`]; the physical database client
//! sits behind the [`Driver`]/[`Connector`] seam and is supplied by the
//! application (or by a scripted fake in tests).
//!
//! ## Dispatch
//!
//! Every statement is routed independently: a caller-installed
//! [`DispatchDelegate`] is consulted first, then the connection with the
//! lowest work-count among those whose allow-list permits the target table
//! wins. Inside a [`Db::action`] transaction the connection is pinned
//! instead, so all statements of the transaction share one handle.
//!
//! ## Concurrency
//!
//! Execution is synchronous and blocking; a `Db` is a single-writer
//! object. Share it across threads only behind external synchronization,
//! or give each worker its own `Db` over its own connections.

pub mod config;
pub mod connection;
pub mod db;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod log;

pub use config::ConnectionConfig;
pub use connection::Connection;
pub use db::{Action, Db, Queries, Tx};
pub use dispatch::{DispatchDelegate, Dispatcher};
pub use driver::{Connector, Driver, DriverError, DriverResult, Row};
pub use error::{DbError, Result};
pub use log::{LogEntry, QueryLog};

pub use magpie_sql_core::{
    Assignments, CompileError, Conditions, Direction, Group, Projection, ToValue, Value,
};
