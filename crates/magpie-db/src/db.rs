//! The coordinator facade: statement orchestration and transactions.

use magpie_sql_core::{
    quote_ident, Assignments, Conditions, MysqlQuoter, Projection, Quoter, StatementBuilder,
    ToValue, Value,
};
use tracing::{debug, warn};

use crate::connection::Connection;
use crate::dispatch::{DispatchDelegate, Dispatcher};
use crate::driver::{DriverError, Row};
use crate::error::{DbError, Result};
use crate::log::{LogEntry, QueryLog};

/// The outcome of a transaction closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<T> {
    /// Commit the transaction and yield the value.
    Commit(T),
    /// Roll the transaction back without an error.
    Rollback,
}

mod sealed {
    use magpie_sql_core::Quoter;

    use crate::driver::Row;
    use crate::error::Result;

    /// Internal execution hooks shared by [`crate::Db`] and [`crate::Tx`].
    pub trait Session {
        fn quoter(&self) -> &dyn Quoter;
        fn target_table(&self) -> Result<String>;
        fn pk_column(&self) -> Result<String>;
        fn run_query(&mut self, sql: String) -> Result<Vec<Row>>;
        fn run_exec(&mut self, sql: String) -> Result<u64>;
        fn generated_id(&mut self, sql: &str) -> Result<u64>;
    }
}

/// Statement-issuing operations, shared by [`Db`] and the transaction
/// handle [`Tx`].
///
/// Each operation compiles its SQL, resolves a connection, executes and
/// shapes the result. On [`Db`] the connection is chosen per statement by
/// the dispatcher; on [`Tx`] every statement runs on the connection the
/// transaction is pinned to.
pub trait Queries: sealed::Session {
    /// Fetches the row whose primary key equals `id`.
    fn get(&mut self, id: impl ToValue, projection: &Projection) -> Result<Option<Row>> {
        let pk = self.pk_column()?;
        let conditions = Conditions::new().with(&pk, id);
        self.fetch(&conditions, projection)
    }

    /// Fetches the first row matching the conditions.
    fn fetch(&mut self, conditions: &Conditions, projection: &Projection) -> Result<Option<Row>> {
        let rows = self.select(conditions, projection)?;
        Ok(rows.into_iter().next())
    }

    /// Returns all rows matching the conditions.
    fn select(&mut self, conditions: &Conditions, projection: &Projection) -> Result<Vec<Row>> {
        let table = self.target_table()?;
        let sql = StatementBuilder::new(self.quoter()).select(&table, projection, conditions)?;
        self.run_query(sql)
    }

    /// Returns whether any row matches the conditions.
    fn has(&mut self, conditions: &Conditions) -> Result<bool> {
        Ok(self.count(conditions)? > 0)
    }

    /// Counts the rows matching the conditions.
    ///
    /// With a GROUP BY request the full select is wrapped in a COUNT
    /// subquery so the result counts groups, not rows.
    fn count(&mut self, conditions: &Conditions) -> Result<u64> {
        let row = if conditions.has_group_by() {
            let table = self.target_table()?;
            let inner =
                StatementBuilder::new(self.quoter()).select(&table, &Projection::All, conditions)?;
            let sql = format!("SELECT COUNT(*) AS RowsNum FROM ({inner}) as nt");
            self.run_query(sql)?.into_iter().next()
        } else {
            self.fetch(conditions, &Projection::raw("COUNT(*) AS RowsNum"))?
        };
        Ok(row
            .and_then(|r| r.get("RowsNum").and_then(Value::as_u64))
            .unwrap_or(0))
    }

    /// Sums `column` over the rows matching the conditions. 0 when no row
    /// matches.
    fn sum(&mut self, conditions: &Conditions, column: &str) -> Result<f64> {
        let projection = Projection::raw(format!("SUM({}) AS SumValue", quote_ident(column)));
        let row = self.fetch(conditions, &projection)?;
        Ok(row
            .and_then(|r| r.get("SumValue").and_then(Value::as_f64))
            .unwrap_or(0.0))
    }

    /// Inserts a row and returns the generated primary key.
    ///
    /// Returns 0 when no row was affected. The generated id is read from
    /// the same connection that executed the statement.
    fn insert(&mut self, data: &Assignments) -> Result<u64> {
        let table = self.target_table()?;
        let sql = StatementBuilder::new(self.quoter()).insert(&table, data);
        let affected = self.run_exec(sql.clone())?;
        if affected == 0 {
            return Ok(0);
        }
        self.generated_id(&sql)
    }

    /// Updates matching rows and returns the affected-row count.
    fn update(&mut self, data: &Assignments, conditions: &Conditions) -> Result<u64> {
        let table = self.target_table()?;
        let sql = StatementBuilder::new(self.quoter()).update(&table, data, conditions)?;
        self.run_exec(sql)
    }

    /// Deletes matching rows and returns the affected-row count.
    fn delete(&mut self, conditions: &Conditions) -> Result<u64> {
        let table = self.target_table()?;
        let sql = StatementBuilder::new(self.quoter()).delete(&table, conditions)?;
        self.run_exec(sql)
    }

    /// Runs a raw query, dispatched and logged like a built statement.
    fn raw_query(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.run_query(String::from(sql))
    }

    /// Runs a raw statement, dispatched and logged like a built statement.
    fn raw_exec(&mut self, sql: &str) -> Result<u64> {
        self.run_exec(String::from(sql))
    }
}

/// The access-layer facade.
///
/// Owns the connection pool, the dispatcher, the value quoter and the
/// statement log. Synchronous and single-writer: statement operations take
/// `&mut self`, and sharing across threads requires external
/// synchronization or one `Db` per worker.
///
/// ```no_run
/// use magpie_db::{Conditions, Connection, ConnectionConfig, Connector, Db, Projection, Queries};
///
/// fn run(connector: impl Connector + 'static) -> magpie_db::Result<()> {
///     let conn = Connection::new(ConnectionConfig::new("shop").host("localhost"), connector);
///     let mut db = Db::new(vec![conn]);
///     db.table("user").id("user_id");
///
///     let admins = db.select(&Conditions::new().with("role", "admin"), &Projection::All)?;
///     println!("{} admins", admins.len());
///     Ok(())
/// }
/// ```
pub struct Db {
    connections: Vec<Connection>,
    dispatcher: Dispatcher,
    quoter: Box<dyn Quoter>,
    table: Option<String>,
    id_column: Option<String>,
    log: QueryLog,
    last_error: Option<String>,
    last_used: Option<usize>,
}

impl Db {
    /// Creates a coordinator over the given connections.
    #[must_use]
    pub fn new(connections: Vec<Connection>) -> Self {
        Self {
            connections,
            dispatcher: Dispatcher::new(),
            quoter: Box::new(MysqlQuoter),
            table: None,
            id_column: None,
            log: QueryLog::new(),
            last_error: None,
            last_used: None,
        }
    }

    /// Replaces the statement log, e.g. with a capacity-bounded one.
    #[must_use]
    pub fn with_log(mut self, log: QueryLog) -> Self {
        self.log = log;
        self
    }

    /// Replaces the value-quoting primitive.
    #[must_use]
    pub fn with_quoter(mut self, quoter: impl Quoter + 'static) -> Self {
        self.quoter = Box::new(quoter);
        self
    }

    /// Sets the target table for subsequent statements.
    pub fn table(&mut self, name: &str) -> &mut Self {
        self.table = Some(String::from(name));
        self
    }

    /// Returns the current target table.
    #[must_use]
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Sets the primary-key column used by [`Queries::get`].
    pub fn id(&mut self, column: &str) -> &mut Self {
        self.id_column = Some(String::from(column));
        self
    }

    /// Returns the current primary-key column.
    #[must_use]
    pub fn id_column(&self) -> Option<&str> {
        self.id_column.as_deref()
    }

    /// Installs a dispatch delegate consulted before least-loaded selection.
    pub fn set_dispatch_delegate(&mut self, delegate: impl DispatchDelegate + 'static) -> &mut Self {
        self.dispatcher.set_delegate(delegate);
        self
    }

    /// Removes the dispatch delegate.
    pub fn clear_dispatch_delegate(&mut self) -> &mut Self {
        self.dispatcher.clear_delegate();
        self
    }

    /// Returns the configured connections.
    #[must_use]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Returns the most recent log entry.
    #[must_use]
    pub fn last_log(&self) -> Option<&LogEntry> {
        self.log.last()
    }

    /// Iterates all retained log entries, oldest first.
    pub fn logs(&self) -> impl Iterator<Item = &LogEntry> {
        self.log.entries()
    }

    /// Returns the message of the most recent driver error, if the last
    /// statement failed.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Runs `f` inside a transaction.
    ///
    /// One connection is dispatched up front; `f` receives a [`Tx`] handle
    /// pinned to it, so every statement in the transaction runs on that
    /// connection. Returning [`Action::Commit`] commits and yields
    /// `Some(value)`; [`Action::Rollback`] rolls back and yields `None`
    /// without an error; an `Err` rolls back and then propagates.
    ///
    /// Nested transactions are not supported: [`Tx`] deliberately exposes
    /// no `action`.
    pub fn action<T, F>(&mut self, f: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut Tx<'_>) -> Result<Action<T>>,
    {
        let target = self.table.clone().unwrap_or_default();
        let index = self.dispatcher.dispatch(&target, &self.connections)?;
        self.connections[index].connect()?;
        self.connections[index]
            .begin()
            .map_err(|source| DbError::Transaction { source })?;
        debug!(connection = %self.connections[index].id(), "transaction begin");

        let Self {
            connections,
            quoter,
            table,
            id_column,
            log,
            last_error,
            ..
        } = self;
        let mut tx = Tx {
            conn: &mut connections[index],
            quoter: &**quoter,
            table: table.clone(),
            id_column: id_column.clone(),
            log,
            last_error,
        };

        match f(&mut tx) {
            Ok(Action::Commit(value)) => {
                tx.conn
                    .commit()
                    .map_err(|source| DbError::Transaction { source })?;
                debug!(connection = %tx.conn.id(), "transaction commit");
                Ok(Some(value))
            }
            Ok(Action::Rollback) => {
                warn!(connection = %tx.conn.id(), "transaction rolled back by caller");
                tx.conn
                    .rollback()
                    .map_err(|source| DbError::Transaction { source })?;
                Ok(None)
            }
            Err(err) => {
                warn!(connection = %tx.conn.id(), error = %err, "transaction failed, rolling back");
                if let Err(rollback_err) = tx.conn.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

impl sealed::Session for Db {
    fn quoter(&self) -> &dyn Quoter {
        &*self.quoter
    }

    fn target_table(&self) -> Result<String> {
        self.table.clone().ok_or(DbError::NoTable)
    }

    fn pk_column(&self) -> Result<String> {
        self.id_column.clone().ok_or(DbError::NoPrimaryKey)
    }

    fn run_query(&mut self, sql: String) -> Result<Vec<Row>> {
        let target = self.table.clone().unwrap_or_default();
        let index = self.dispatcher.dispatch(&target, &self.connections)?;
        self.last_used = Some(index);
        let conn = &mut self.connections[index];
        conn.connect()?;
        self.log.record(conn.id(), &sql);
        debug!(connection = %conn.id(), sql = %sql, "query");
        match conn.query(&sql) {
            Ok(rows) => {
                self.last_error = None;
                Ok(rows)
            }
            Err(source) => {
                self.last_error = Some(source.to_string());
                Err(DbError::Execution { sql, source })
            }
        }
    }

    fn run_exec(&mut self, sql: String) -> Result<u64> {
        let target = self.table.clone().unwrap_or_default();
        let index = self.dispatcher.dispatch(&target, &self.connections)?;
        self.last_used = Some(index);
        let conn = &mut self.connections[index];
        conn.connect()?;
        self.log.record(conn.id(), &sql);
        debug!(connection = %conn.id(), sql = %sql, "exec");
        match conn.execute(&sql) {
            Ok(affected) => {
                self.last_error = None;
                Ok(affected)
            }
            Err(source) => {
                self.last_error = Some(source.to_string());
                Err(DbError::Execution { sql, source })
            }
        }
    }

    fn generated_id(&mut self, sql: &str) -> Result<u64> {
        let index = self.last_used.ok_or_else(|| DbError::Execution {
            sql: String::from(sql),
            source: DriverError::new("no prior statement on this session"),
        })?;
        match self.connections[index].last_insert_id() {
            Ok(id) => Ok(id),
            Err(source) => {
                self.last_error = Some(source.to_string());
                Err(DbError::Execution {
                    sql: String::from(sql),
                    source,
                })
            }
        }
    }
}

impl Queries for Db {}

/// A transaction handle, pinned to one connection.
///
/// Exposes only the statement-issuing operations of [`Queries`]; table and
/// primary-key context are inherited from the coordinator at
/// [`Db::action`] time.
pub struct Tx<'a> {
    conn: &'a mut Connection,
    quoter: &'a dyn Quoter,
    table: Option<String>,
    id_column: Option<String>,
    log: &'a mut QueryLog,
    last_error: &'a mut Option<String>,
}

impl Tx<'_> {
    /// Returns the id of the connection the transaction runs on.
    #[must_use]
    pub fn connection_id(&self) -> &str {
        self.conn.id()
    }
}

impl sealed::Session for Tx<'_> {
    fn quoter(&self) -> &dyn Quoter {
        self.quoter
    }

    fn target_table(&self) -> Result<String> {
        self.table.clone().ok_or(DbError::NoTable)
    }

    fn pk_column(&self) -> Result<String> {
        self.id_column.clone().ok_or(DbError::NoPrimaryKey)
    }

    fn run_query(&mut self, sql: String) -> Result<Vec<Row>> {
        self.log.record(self.conn.id(), &sql);
        debug!(connection = %self.conn.id(), sql = %sql, "query");
        match self.conn.query(&sql) {
            Ok(rows) => {
                *self.last_error = None;
                Ok(rows)
            }
            Err(source) => {
                *self.last_error = Some(source.to_string());
                Err(DbError::Execution { sql, source })
            }
        }
    }

    fn run_exec(&mut self, sql: String) -> Result<u64> {
        self.log.record(self.conn.id(), &sql);
        debug!(connection = %self.conn.id(), sql = %sql, "exec");
        match self.conn.execute(&sql) {
            Ok(affected) => {
                *self.last_error = None;
                Ok(affected)
            }
            Err(source) => {
                *self.last_error = Some(source.to_string());
                Err(DbError::Execution { sql, source })
            }
        }
    }

    fn generated_id(&mut self, sql: &str) -> Result<u64> {
        match self.conn.last_insert_id() {
            Ok(id) => Ok(id),
            Err(source) => {
                *self.last_error = Some(source.to_string());
                Err(DbError::Execution {
                    sql: String::from(sql),
                    source,
                })
            }
        }
    }
}

impl Queries for Tx<'_> {}
