//! The condition tree: a typed description of a WHERE clause request.
//!
//! Callers describe predicates with `"column"` or `"column,opcode"` keys and
//! plain values; the tree keeps them as tagged variants until compilation.
//! Boolean grouping nests through [`Group`]; ORDER/GROUP/LIMIT modifiers
//! live on the tree root.
//!
//! ```
//! use magpie_sql_core::{Conditions, Direction, Group};
//!
//! let conds = Conditions::new()
//!     .with("votes,>=", 100)
//!     .group(Group::or().with("role", "admin").with("role", "editor"))
//!     .order("created_at", Direction::Desc)
//!     .limit(10);
//! assert!(conds.has_predicates());
//! ```

mod compile;
mod expr;

pub use compile::ConditionCompiler;
pub(crate) use expr::compile_comparison;

use std::fmt;

use crate::value::{ToValue, Value};

/// The boolean operator joining a group of predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    /// All predicates must hold.
    And,
    /// At least one predicate must hold.
    Or,
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// One predicate leaf: a column, an optional operator code and a value.
///
/// The operator code is split off the `"column,opcode"` key at construction;
/// resolving it to an operator (and failing on an unknown code) happens at
/// compile time.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Column name.
    pub column: String,
    /// Raw operator code, absent for plain equality.
    pub opcode: Option<String>,
    /// Comparison value.
    pub value: Value,
}

impl Comparison {
    /// Parses a `"column"` or `"column,opcode"` key together with its value.
    ///
    /// The key is split on the first comma; whatever follows is kept verbatim
    /// as the operator code.
    #[must_use]
    pub fn parse(key: &str, value: impl ToValue) -> Self {
        let (column, opcode) = match key.split_once(',') {
            Some((column, code)) => (column.trim(), Some(String::from(code.trim()))),
            None => (key.trim(), None),
        };
        Self {
            column: String::from(column),
            opcode,
            value: value.to_value(),
        }
    }

    /// Returns the full `column,opcode` key, for error messages.
    #[must_use]
    pub fn key(&self) -> String {
        match &self.opcode {
            Some(code) => format!("{},{}", self.column, code),
            None => self.column.clone(),
        }
    }
}

/// One entry of a condition tree: a predicate leaf or a nested group.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A single comparison.
    Cmp(Comparison),
    /// A parenthesized sub-group with its own conjunction.
    Group(Group),
}

/// A group of predicates joined by one conjunction.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// The conjunction joining the group's entries.
    pub conjunction: Conjunction,
    /// The group's entries, in insertion order.
    pub entries: Vec<Entry>,
}

impl Group {
    /// Creates an empty AND group.
    #[must_use]
    pub const fn and() -> Self {
        Self {
            conjunction: Conjunction::And,
            entries: Vec::new(),
        }
    }

    /// Creates an empty OR group.
    #[must_use]
    pub const fn or() -> Self {
        Self {
            conjunction: Conjunction::Or,
            entries: Vec::new(),
        }
    }

    /// Adds a predicate to the group.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl ToValue) -> Self {
        self.entries.push(Entry::Cmp(Comparison::parse(key, value)));
        self
    }

    /// Adds a nested group.
    #[must_use]
    pub fn group(mut self, group: Group) -> Self {
        self.entries.push(Entry::Group(group));
        self
    }

    /// Returns whether the group has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sort direction for an ORDER BY column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "ASC"),
            Self::Desc => write!(f, "DESC"),
        }
    }
}

/// The ORDER BY request: column/direction pairs or a raw passthrough.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderSpec {
    /// Column/direction pairs, compiled with quoted identifiers.
    Columns(Vec<(String, Direction)>),
    /// A raw fragment emitted verbatim.
    Raw(String),
}

/// The LIMIT request.
///
/// A bare count normalizes to `offset = count` at compile time, an inherited
/// quirk preserved for compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSpec {
    /// A single row count.
    Count(u64),
    /// An explicit offset/count pair.
    Range {
        /// Rows to skip.
        offset: u64,
        /// Rows to return.
        count: u64,
    },
}

/// A full condition tree: predicates plus ORDER/GROUP/LIMIT modifiers.
///
/// Constructed fresh per call and discarded once compiled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    pub(crate) entries: Vec<Entry>,
    pub(crate) order: Option<OrderSpec>,
    pub(crate) group_by: Vec<String>,
    pub(crate) limit: Option<LimitSpec>,
}

impl Conditions {
    /// Creates an empty condition tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate from a `"column"` or `"column,opcode"` key.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl ToValue) -> Self {
        self.entries.push(Entry::Cmp(Comparison::parse(key, value)));
        self
    }

    /// Adds an explicit boolean group.
    #[must_use]
    pub fn group(mut self, group: Group) -> Self {
        self.entries.push(Entry::Group(group));
        self
    }

    /// Appends an ORDER BY column.
    ///
    /// Replaces a previously set raw ORDER fragment.
    #[must_use]
    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        match &mut self.order {
            Some(OrderSpec::Columns(cols)) => cols.push((String::from(column), direction)),
            _ => {
                self.order = Some(OrderSpec::Columns(vec![(String::from(column), direction)]));
            }
        }
        self
    }

    /// Sets a raw ORDER BY fragment, emitted verbatim.
    #[must_use]
    pub fn order_raw(mut self, fragment: &str) -> Self {
        self.order = Some(OrderSpec::Raw(String::from(fragment)));
        self
    }

    /// Appends a GROUP BY column.
    #[must_use]
    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by.push(String::from(column));
        self
    }

    /// Sets a LIMIT row count. Compiles to `offset = count` (see [`LimitSpec`]).
    #[must_use]
    pub const fn limit(mut self, count: u64) -> Self {
        self.limit = Some(LimitSpec::Count(count));
        self
    }

    /// Sets an explicit LIMIT offset/count pair.
    #[must_use]
    pub const fn limit_range(mut self, offset: u64, count: u64) -> Self {
        self.limit = Some(LimitSpec::Range { offset, count });
        self
    }

    /// Returns whether the tree carries any predicate.
    #[must_use]
    pub fn has_predicates(&self) -> bool {
        self.entries.iter().any(|e| match e {
            Entry::Cmp(_) => true,
            Entry::Group(g) => !g.is_empty(),
        })
    }

    /// Returns whether the tree carries a GROUP BY request.
    #[must_use]
    pub fn has_group_by(&self) -> bool {
        !self.group_by.is_empty()
    }

    /// Returns whether the tree is entirely empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self.order.is_none()
            && self.group_by.is_empty()
            && self.limit.is_none()
    }
}
