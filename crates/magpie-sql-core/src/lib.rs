//! # magpie-sql-core
//!
//! SQL text generation for the magpie access layer: a typed condition tree,
//! the expression and condition compilers that turn it into
//! WHERE/ORDER/GROUP/LIMIT clause text, and the templates for the four
//! statement shapes (SELECT, INSERT, UPDATE, DELETE).
//!
//! This crate performs no I/O. Value quoting goes through the [`Quoter`]
//! seam so a database driver can substitute its own escaping primitive;
//! the default [`MysqlQuoter`] escapes inline.
//!
//! ## Building a statement
//!
//! ```
//! use magpie_sql_core::{Conditions, Direction, Group, MysqlQuoter, Projection, StatementBuilder};
//!
//! let conds = Conditions::new()
//!     .with("age,>=", 18)
//!     .group(Group::or().with("role", "admin").with("role", "editor"))
//!     .order("id", Direction::Desc)
//!     .limit(10);
//!
//! let sql = StatementBuilder::new(&MysqlQuoter)
//!     .select("user", &Projection::All, &conds)
//!     .unwrap();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT * FROM `user` WHERE (`age` >= 18) AND (`role` = 'admin' OR `role` = 'editor') \
//!      ORDER BY `id` DESC LIMIT 10,10"
//! );
//! ```
//!
//! ## Operator codes
//!
//! Predicates use `"column"` or `"column,opcode"` keys. Codes (case
//! insensitive): `=` (equality; lists become IN, NULL becomes IS), `!`
//! (negated equality), `>`, `>=`, `<`, `<=`, `<>` (BETWEEN), `><`
//! (NOT BETWEEN), `~` (LIKE with `%` wildcards), `fin` (FIND_IN_SET).
//! An unknown code fails compilation with [`CompileError::UnknownOperator`]
//! before any statement is dispatched.

pub mod condition;
pub mod error;
pub mod quote;
pub mod statement;
pub mod value;

pub use condition::{
    Comparison, ConditionCompiler, Conditions, Conjunction, Direction, Entry, Group, LimitSpec,
    OrderSpec,
};
pub use error::CompileError;
pub use quote::{quote_ident, MysqlQuoter, Quoter};
pub use statement::{Assignments, Projection, StatementBuilder, StatementKind};
pub use value::{ToValue, Value};
