//! One pool member: configuration, lazy connect, work-count.

use tracing::info;

use crate::config::ConnectionConfig;
use crate::driver::{Connector, Driver, DriverError, DriverResult, Row};
use crate::error::{DbError, Result};

/// One configured database connection.
///
/// The driver handle is established on first use and reused for the
/// connection's lifetime. The work-count increments on every executed
/// statement and is never reset; the dispatcher reads it as the load
/// signal for least-loaded selection.
pub struct Connection {
    id: String,
    config: ConnectionConfig,
    connector: Box<dyn Connector>,
    driver: Option<Box<dyn Driver>>,
    work_count: u64,
}

impl Connection {
    /// Creates a connection from its configuration and a connector.
    ///
    /// When the configuration carries no id, a random one is assigned.
    #[must_use]
    pub fn new(config: ConnectionConfig, connector: impl Connector + 'static) -> Self {
        let id = config
            .id
            .clone()
            .unwrap_or_else(|| format!("conn-{:08x}", rand::random::<u32>()));
        Self {
            id,
            config,
            connector: Box::new(connector),
            driver: None,
            work_count: 0,
        }
    }

    /// Returns the connection id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Returns the number of statements executed on this connection.
    #[must_use]
    pub const fn work_count(&self) -> u64 {
        self.work_count
    }

    /// Returns whether the driver handle has been established.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.driver.is_some()
    }

    /// Returns whether this connection may serve the given table.
    ///
    /// An empty allow-list permits every table.
    #[must_use]
    pub fn allows(&self, table: &str) -> bool {
        self.config.allow.is_empty() || self.config.allow.iter().any(|t| t == table)
    }

    /// Establishes the driver handle if not yet connected.
    ///
    /// The configured character set is applied with `SET NAMES` right after
    /// the handle opens. Setup commands do not count as work.
    pub fn connect(&mut self) -> Result<()> {
        if self.driver.is_some() {
            return Ok(());
        }

        let mut driver =
            self.connector
                .connect(&self.config)
                .map_err(|source| DbError::Connect {
                    id: self.id.clone(),
                    source,
                })?;

        if let Some(charset) = &self.config.charset {
            driver
                .execute(&format!("SET NAMES '{charset}'"))
                .map_err(|source| DbError::Connect {
                    id: self.id.clone(),
                    source,
                })?;
        }

        info!(id = %self.id, source = %self.config.source(), "connection established");
        self.driver = Some(driver);
        Ok(())
    }

    fn driver_mut(&mut self) -> DriverResult<&mut Box<dyn Driver>> {
        self.driver
            .as_mut()
            .ok_or_else(|| DriverError::new("connection not established"))
    }

    /// Runs a statement, counting it as work.
    pub(crate) fn execute(&mut self, sql: &str) -> DriverResult<u64> {
        self.work_count += 1;
        self.driver_mut()?.execute(sql)
    }

    /// Runs a query, counting it as work.
    pub(crate) fn query(&mut self, sql: &str) -> DriverResult<Vec<Row>> {
        self.work_count += 1;
        self.driver_mut()?.query(sql)
    }

    pub(crate) fn last_insert_id(&mut self) -> DriverResult<u64> {
        self.driver_mut()?.last_insert_id()
    }

    pub(crate) fn begin(&mut self) -> DriverResult<()> {
        self.driver_mut()?.begin()
    }

    pub(crate) fn commit(&mut self) -> DriverResult<()> {
        self.driver_mut()?.commit()
    }

    pub(crate) fn rollback(&mut self) -> DriverResult<()> {
        self.driver_mut()?.rollback()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("work_count", &self.work_count)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
