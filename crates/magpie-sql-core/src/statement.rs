//! Full statement assembly for the four supported statement shapes.
//!
//! ```
//! use magpie_sql_core::{Conditions, MysqlQuoter, Projection, StatementBuilder};
//!
//! let builder = StatementBuilder::new(&MysqlQuoter);
//! let sql = builder
//!     .select("user", &Projection::All, &Conditions::new().with("age,>", 18))
//!     .unwrap();
//! assert_eq!(sql, "SELECT * FROM `user` WHERE (`age` > 18)");
//! ```

use crate::condition::{ConditionCompiler, Conditions};
use crate::error::Result;
use crate::quote::{quote_ident, Quoter};
use crate::value::{ToValue, Value};

/// The four statement shapes this layer generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `SELECT ... FROM ...`
    Select,
    /// `INSERT INTO ... SET ...`
    Insert,
    /// `UPDATE ... SET ...`
    Update,
    /// `DELETE FROM ...`
    Delete,
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// The column projection of a SELECT statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// All columns (`*`).
    All,
    /// Named columns, each backtick-quoted.
    Cols(Vec<String>),
    /// A raw fragment emitted verbatim (aggregates, expressions).
    Raw(String),
}

impl Projection {
    /// Creates a named-column projection.
    #[must_use]
    pub fn cols(columns: &[&str]) -> Self {
        Self::Cols(columns.iter().map(|c| String::from(*c)).collect())
    }

    /// Creates a raw projection emitted verbatim.
    #[must_use]
    pub fn raw(fragment: impl Into<String>) -> Self {
        Self::Raw(fragment.into())
    }

    fn to_sql(&self) -> String {
        match self {
            Self::All => String::from("*"),
            Self::Cols(columns) => {
                let quoted: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
                quoted.join(", ")
            }
            Self::Raw(fragment) => fragment.clone(),
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::All
    }
}

/// Ordered column/value pairs for the write side of INSERT and UPDATE.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignments {
    pairs: Vec<(String, Value)>,
}

impl Assignments {
    /// Creates an empty assignment list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column/value pair.
    #[must_use]
    pub fn set(mut self, column: &str, value: impl ToValue) -> Self {
        self.pairs.push((String::from(column), value.to_value()));
        self
    }

    /// Returns whether no pairs have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates the pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.pairs.iter().map(|(c, v)| (c.as_str(), v))
    }
}

/// Assembles complete SQL text from a table name and a condition tree or
/// assignment list.
pub struct StatementBuilder<'a> {
    quoter: &'a dyn Quoter,
}

impl<'a> StatementBuilder<'a> {
    /// Creates a builder using the given value-quoting primitive.
    #[must_use]
    pub fn new(quoter: &'a dyn Quoter) -> Self {
        Self { quoter }
    }

    /// Builds the statement of the given kind.
    ///
    /// One entry point switching on [`StatementKind`]; arguments a kind
    /// does not use are ignored (INSERT takes no conditions, DELETE no
    /// data).
    pub fn build(
        &self,
        kind: StatementKind,
        table: &str,
        data: &Assignments,
        projection: &Projection,
        conditions: &Conditions,
    ) -> Result<String> {
        match kind {
            StatementKind::Select => self.select(table, projection, conditions),
            StatementKind::Insert => Ok(self.insert(table, data)),
            StatementKind::Update => self.update(table, data, conditions),
            StatementKind::Delete => self.delete(table, conditions),
        }
    }

    /// Builds a SELECT statement.
    pub fn select(
        &self,
        table: &str,
        projection: &Projection,
        conditions: &Conditions,
    ) -> Result<String> {
        let clause = ConditionCompiler::new(self.quoter).clause(conditions)?;
        Ok(format!(
            "SELECT {} FROM {}{}",
            projection.to_sql(),
            quote_ident(table),
            suffix(&clause)
        ))
    }

    /// Builds an INSERT statement (`INSERT INTO ... SET ...` form).
    #[must_use]
    pub fn insert(&self, table: &str, data: &Assignments) -> String {
        format!(
            "INSERT INTO {} SET {}",
            quote_ident(table),
            self.set_clause(data)
        )
    }

    /// Builds an UPDATE statement.
    pub fn update(&self, table: &str, data: &Assignments, conditions: &Conditions) -> Result<String> {
        let clause = ConditionCompiler::new(self.quoter).clause(conditions)?;
        Ok(format!(
            "UPDATE {} SET {}{}",
            quote_ident(table),
            self.set_clause(data),
            suffix(&clause)
        ))
    }

    /// Builds a DELETE statement.
    pub fn delete(&self, table: &str, conditions: &Conditions) -> Result<String> {
        let clause = ConditionCompiler::new(self.quoter).clause(conditions)?;
        Ok(format!(
            "DELETE FROM {}{}",
            quote_ident(table),
            suffix(&clause)
        ))
    }

    /// Compiles the `col = val, ...` list shared by INSERT and UPDATE.
    ///
    /// List values flatten to one comma-joined string before quoting; there
    /// is no IN expansion on the write side.
    fn set_clause(&self, data: &Assignments) -> String {
        let parts: Vec<String> = data
            .iter()
            .map(|(column, value)| {
                let value = match value {
                    Value::List(_) => Value::Text(value.to_plain_text()),
                    other => other.clone(),
                };
                format!("{} = {}", quote_ident(column), self.quoter.quote(&value))
            })
            .collect();
        parts.join(", ")
    }
}

fn suffix(clause: &str) -> String {
    if clause.is_empty() {
        String::new()
    } else {
        format!(" {clause}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Direction;
    use crate::quote::MysqlQuoter;

    fn builder() -> StatementBuilder<'static> {
        StatementBuilder::new(&MysqlQuoter)
    }

    #[test]
    fn test_select_all() {
        let sql = builder()
            .select("user", &Projection::All, &Conditions::new())
            .unwrap();
        assert_eq!(sql, "SELECT * FROM `user`");
    }

    #[test]
    fn test_select_columns_are_quoted() {
        let sql = builder()
            .select("user", &Projection::cols(&["id", "name"]), &Conditions::new())
            .unwrap();
        assert_eq!(sql, "SELECT `id`, `name` FROM `user`");
    }

    #[test]
    fn test_select_raw_projection() {
        let sql = builder()
            .select(
                "user",
                &Projection::raw("COUNT(*) AS RowsNum"),
                &Conditions::new(),
            )
            .unwrap();
        assert_eq!(sql, "SELECT COUNT(*) AS RowsNum FROM `user`");
    }

    #[test]
    fn test_select_with_full_clause() {
        let conds = Conditions::new()
            .with("age,>=", 18_i64)
            .order("id", Direction::Desc)
            .limit_range(0, 10);
        let sql = builder().select("user", &Projection::All, &conds).unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM `user` WHERE (`age` >= 18) ORDER BY `id` DESC LIMIT 0,10"
        );
    }

    #[test]
    fn test_insert() {
        let data = Assignments::new().set("name", "x").set("age", 30_i64);
        assert_eq!(
            builder().insert("user", &data),
            "INSERT INTO `user` SET `name` = 'x', `age` = 30"
        );
    }

    #[test]
    fn test_insert_flattens_list_values() {
        let data = Assignments::new().set("tags", vec!["a", "b"]);
        assert_eq!(
            builder().insert("post", &data),
            "INSERT INTO `post` SET `tags` = 'a,b'"
        );
    }

    #[test]
    fn test_update() {
        let data = Assignments::new().set("name", "y");
        let conds = Conditions::new().with("id", 3_i64);
        assert_eq!(
            builder().update("user", &data, &conds).unwrap(),
            "UPDATE `user` SET `name` = 'y' WHERE (`id` = 3)"
        );
    }

    #[test]
    fn test_delete() {
        let conds = Conditions::new().with("id", 3_i64);
        assert_eq!(
            builder().delete("user", &conds).unwrap(),
            "DELETE FROM `user` WHERE (`id` = 3)"
        );
    }

    #[test]
    fn test_delete_without_conditions() {
        assert_eq!(
            builder().delete("temp", &Conditions::new()).unwrap(),
            "DELETE FROM `temp`"
        );
    }

    #[test]
    fn test_build_switches_on_kind() {
        let data = Assignments::new().set("name", "x");
        let conds = Conditions::new().with("id", 1_i64);
        let b = builder();

        for (kind, expected) in [
            (StatementKind::Select, "SELECT * FROM `t` WHERE (`id` = 1)"),
            (StatementKind::Insert, "INSERT INTO `t` SET `name` = 'x'"),
            (
                StatementKind::Update,
                "UPDATE `t` SET `name` = 'x' WHERE (`id` = 1)",
            ),
            (StatementKind::Delete, "DELETE FROM `t` WHERE (`id` = 1)"),
        ] {
            let sql = b
                .build(kind, "t", &data, &Projection::All, &conds)
                .unwrap();
            assert_eq!(sql, expected, "{kind}");
        }
    }

    #[test]
    fn test_table_identifier_is_sanitized() {
        let sql = builder()
            .select("us`er", &Projection::All, &Conditions::new())
            .unwrap();
        assert_eq!(sql, "SELECT * FROM `user`");
    }

    #[test]
    fn test_write_value_is_escaped() {
        let data = Assignments::new().set("name", "it's");
        assert_eq!(
            builder().insert("user", &data),
            "INSERT INTO `user` SET `name` = 'it''s'"
        );
    }
}
