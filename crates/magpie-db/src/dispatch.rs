//! Connection selection for a pending statement.

use crate::connection::Connection;
use crate::error::{DbError, Result};

/// A caller-supplied selection policy.
///
/// Consulted before the built-in least-loaded scan; returning `None` falls
/// through to it. The delegate sees every configured connection and its
/// choice is honored without an allow-list check.
pub trait DispatchDelegate {
    /// Picks a connection id for the pending statement, or `None` to defer.
    fn select(&self, candidates: &[&Connection]) -> Option<String>;
}

impl<F> DispatchDelegate for F
where
    F: Fn(&[&Connection]) -> Option<String>,
{
    fn select(&self, candidates: &[&Connection]) -> Option<String> {
        self(candidates)
    }
}

/// Chooses which connection executes each statement.
///
/// Without a delegate, the connection with the strictly lowest work-count
/// among those whose allow-list permits the target table wins; the first
/// one encountered wins ties. Selection itself does not increment the
/// work-count; that happens on actual execution.
#[derive(Default)]
pub struct Dispatcher {
    delegate: Option<Box<dyn DispatchDelegate>>,
    last_selected: Option<String>,
}

impl Dispatcher {
    /// Creates a dispatcher with no delegate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a selection delegate.
    pub fn set_delegate(&mut self, delegate: impl DispatchDelegate + 'static) {
        self.delegate = Some(Box::new(delegate));
    }

    /// Removes the selection delegate.
    pub fn clear_delegate(&mut self) {
        self.delegate = None;
    }

    /// Returns the id selected by the most recent dispatch.
    #[must_use]
    pub fn last_selected(&self) -> Option<&str> {
        self.last_selected.as_deref()
    }

    /// Selects a connection for a statement against `table`.
    ///
    /// Returns the index into `connections`. Fails with
    /// [`DbError::ConnectionNotFound`] when the delegate names an unknown
    /// id and [`DbError::NoConnectionAvailable`] when no connection is
    /// eligible.
    pub fn dispatch(&mut self, table: &str, connections: &[Connection]) -> Result<usize> {
        if let Some(delegate) = &self.delegate {
            let candidates: Vec<&Connection> = connections.iter().collect();
            if let Some(id) = delegate.select(&candidates) {
                let index = connections
                    .iter()
                    .position(|conn| conn.id() == id)
                    .ok_or(DbError::ConnectionNotFound(id))?;
                self.last_selected = Some(String::from(connections[index].id()));
                return Ok(index);
            }
        }

        let mut best: Option<usize> = None;
        for (index, conn) in connections.iter().enumerate() {
            if !conn.allows(table) {
                continue;
            }
            let better = match best {
                Some(current) => conn.work_count() < connections[current].work_count(),
                None => true,
            };
            if better {
                best = Some(index);
            }
        }

        let index = best.ok_or_else(|| DbError::NoConnectionAvailable {
            table: String::from(table),
        })?;
        self.last_selected = Some(String::from(connections[index].id()));
        Ok(index)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("has_delegate", &self.delegate.is_some())
            .field("last_selected", &self.last_selected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use crate::driver::{Connector, Driver, DriverResult, Row};

    struct NullDriver;

    impl Driver for NullDriver {
        fn execute(&mut self, _sql: &str) -> DriverResult<u64> {
            Ok(0)
        }
        fn query(&mut self, _sql: &str) -> DriverResult<Vec<Row>> {
            Ok(vec![])
        }
        fn last_insert_id(&mut self) -> DriverResult<u64> {
            Ok(0)
        }
        fn begin(&mut self) -> DriverResult<()> {
            Ok(())
        }
        fn commit(&mut self) -> DriverResult<()> {
            Ok(())
        }
        fn rollback(&mut self) -> DriverResult<()> {
            Ok(())
        }
    }

    struct NullConnector;

    impl Connector for NullConnector {
        fn connect(&self, _config: &ConnectionConfig) -> DriverResult<Box<dyn Driver>> {
            Ok(Box::new(NullDriver))
        }
    }

    fn conn(id: &str, allow: &[&str]) -> Connection {
        let mut config = ConnectionConfig::new("test").id(id);
        if !allow.is_empty() {
            config = config.allow(allow);
        }
        Connection::new(config, NullConnector)
    }

    fn worked(mut conn: Connection, statements: u64) -> Connection {
        conn.connect().unwrap();
        for _ in 0..statements {
            conn.execute("SELECT 1").unwrap();
        }
        conn
    }

    #[test]
    fn test_lowest_work_count_wins_first_on_tie() {
        let conns = vec![
            worked(conn("a", &[]), 3),
            worked(conn("b", &[]), 1),
            worked(conn("c", &[]), 1),
        ];
        let mut dispatcher = Dispatcher::new();
        let index = dispatcher.dispatch("user", &conns).unwrap();
        assert_eq!(conns[index].id(), "b");
        assert_eq!(dispatcher.last_selected(), Some("b"));
    }

    #[test]
    fn test_allow_list_filters_candidates() {
        let conns = vec![conn("a", &["order"]), conn("b", &[])];
        let mut dispatcher = Dispatcher::new();
        let index = dispatcher.dispatch("user", &conns).unwrap();
        assert_eq!(conns[index].id(), "b");
    }

    #[test]
    fn test_selection_does_not_touch_work_count() {
        let conns = vec![conn("a", &[])];
        let mut dispatcher = Dispatcher::new();
        dispatcher.dispatch("user", &conns).unwrap();
        assert_eq!(conns[0].work_count(), 0);
    }

    #[test]
    fn test_no_eligible_connection() {
        let conns = vec![conn("a", &["order"])];
        let mut dispatcher = Dispatcher::new();
        let err = dispatcher.dispatch("user", &conns).unwrap_err();
        assert!(matches!(err, DbError::NoConnectionAvailable { .. }));
        assert_eq!(dispatcher.last_selected(), None);
    }

    #[test]
    fn test_delegate_choice_must_exist() {
        let conns = vec![conn("a", &[])];
        let mut dispatcher = Dispatcher::new();
        dispatcher.set_delegate(|_: &[&Connection]| Some(String::from("ghost")));
        let err = dispatcher.dispatch("user", &conns).unwrap_err();
        assert!(matches!(err, DbError::ConnectionNotFound(id) if id == "ghost"));
    }
}
