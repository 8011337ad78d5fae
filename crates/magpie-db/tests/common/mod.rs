#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use magpie_db::{
    Connection, ConnectionConfig, Connector, Driver, DriverError, DriverResult, Row,
};

/// Scripted state and observed calls for one fake backend.
#[derive(Default)]
pub struct Backend {
    /// Journal of driver calls, in order: `connect`, `execute:<sql>`,
    /// `query:<sql>`, `last_insert_id`, `begin`, `commit`, `rollback`.
    pub calls: Vec<String>,
    /// Scripted results for `query`, consumed front to back. Empty rows
    /// when exhausted.
    pub query_results: VecDeque<DriverResult<Vec<Row>>>,
    /// Scripted results for `execute`, consumed front to back. One affected
    /// row when exhausted.
    pub exec_results: VecDeque<DriverResult<u64>>,
    /// Scripted results for `commit`, consumed front to back. Ok when
    /// exhausted.
    pub commit_results: VecDeque<DriverResult<()>>,
    /// Value returned by `last_insert_id`.
    pub last_insert_id: u64,
    /// How many times the connector was asked for a driver.
    pub connect_count: u32,
}

pub type Shared = Rc<RefCell<Backend>>;

pub fn backend() -> Shared {
    Rc::new(RefCell::new(Backend::default()))
}

struct FakeDriver {
    state: Shared,
}

impl Driver for FakeDriver {
    fn execute(&mut self, sql: &str) -> DriverResult<u64> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("execute:{sql}"));
        state.exec_results.pop_front().unwrap_or(Ok(1))
    }

    fn query(&mut self, sql: &str) -> DriverResult<Vec<Row>> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("query:{sql}"));
        state.query_results.pop_front().unwrap_or_else(|| Ok(vec![]))
    }

    fn last_insert_id(&mut self) -> DriverResult<u64> {
        let mut state = self.state.borrow_mut();
        state.calls.push(String::from("last_insert_id"));
        Ok(state.last_insert_id)
    }

    fn begin(&mut self) -> DriverResult<()> {
        self.state.borrow_mut().calls.push(String::from("begin"));
        Ok(())
    }

    fn commit(&mut self) -> DriverResult<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(String::from("commit"));
        state.commit_results.pop_front().unwrap_or(Ok(()))
    }

    fn rollback(&mut self) -> DriverResult<()> {
        self.state.borrow_mut().calls.push(String::from("rollback"));
        Ok(())
    }
}

pub struct FakeConnector {
    state: Shared,
    refuse: bool,
}

impl Connector for FakeConnector {
    fn connect(&self, _config: &ConnectionConfig) -> DriverResult<Box<dyn Driver>> {
        let mut state = self.state.borrow_mut();
        state.calls.push(String::from("connect"));
        state.connect_count += 1;
        if self.refuse {
            return Err(DriverError::new("connection refused"));
        }
        Ok(Box::new(FakeDriver {
            state: Rc::clone(&self.state),
        }))
    }
}

/// A connection backed by the given fake backend.
pub fn connection(id: &str, state: &Shared) -> Connection {
    connection_with(ConnectionConfig::new("test").id(id), state)
}

/// A connection with a custom configuration, backed by the given backend.
pub fn connection_with(config: ConnectionConfig, state: &Shared) -> Connection {
    Connection::new(
        config,
        FakeConnector {
            state: Rc::clone(state),
            refuse: false,
        },
    )
}

/// A connection whose connector always refuses.
pub fn refusing_connection(id: &str, state: &Shared) -> Connection {
    Connection::new(
        ConnectionConfig::new("test").id(id),
        FakeConnector {
            state: Rc::clone(state),
            refuse: true,
        },
    )
}

/// The journal of the given backend.
pub fn calls(state: &Shared) -> Vec<String> {
    state.borrow().calls.clone()
}
