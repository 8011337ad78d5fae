//! Compiles a condition tree into WHERE/ORDER/GROUP/LIMIT clause text.

use crate::condition::{
    compile_comparison, Conditions, Conjunction, Entry, Group, LimitSpec, OrderSpec,
};
use crate::error::Result;
use crate::quote::{quote_ident, Quoter};

/// Compiles condition trees against one value-quoting primitive.
///
/// Top-level bare predicates and the entries of top-level AND groups merge
/// into a single implicit AND group; every other explicit group becomes its
/// own parenthesized unit. The resulting groups join with ` AND `, followed
/// by the ORDER BY, GROUP BY and LIMIT modifiers.
pub struct ConditionCompiler<'a> {
    quoter: &'a dyn Quoter,
}

impl<'a> ConditionCompiler<'a> {
    /// Creates a compiler using the given quoting primitive.
    #[must_use]
    pub fn new(quoter: &'a dyn Quoter) -> Self {
        Self { quoter }
    }

    /// Compiles the full clause suffix for a statement.
    ///
    /// Empty when the tree is empty. When the tree has modifiers but no
    /// predicates, the `WHERE` keyword is omitted and only the modifiers
    /// are emitted.
    pub fn clause(&self, conditions: &Conditions) -> Result<String> {
        let mut pieces: Vec<String> = Vec::new();

        let groups = self.predicate_groups(conditions)?;
        if !groups.is_empty() {
            pieces.push(format!("WHERE {}", groups.join(" AND ")));
        }

        if let Some(order) = &conditions.order {
            pieces.push(format!("ORDER BY {}", self.order_sql(order)));
        }

        // GROUP BY is suppressed whenever ORDER BY is present, a documented
        // quirk of the clause emitter.
        if !conditions.group_by.is_empty() && conditions.order.is_none() {
            let cols: Vec<String> = conditions.group_by.iter().map(|c| quote_ident(c)).collect();
            pieces.push(format!("GROUP BY {}", cols.join(",")));
        }

        if let Some(limit) = conditions.limit {
            let (offset, count) = match limit {
                // A bare count keeps offset = count, an inherited quirk.
                LimitSpec::Count(n) => (n, n),
                LimitSpec::Range { offset, count } => (offset, count),
            };
            pieces.push(format!("LIMIT {offset},{count}"));
        }

        Ok(pieces.join(" "))
    }

    /// Compiles the predicate text alone.
    ///
    /// Returns the no-op predicate `1` when the tree carries no predicates,
    /// so callers can always interpolate a non-empty WHERE body.
    pub fn where_body(&self, conditions: &Conditions) -> Result<String> {
        let groups = self.predicate_groups(conditions)?;
        if groups.is_empty() {
            return Ok(String::from("1"));
        }
        Ok(groups.join(" AND "))
    }

    /// Compiles the tree's top level into parenthesized predicate groups.
    fn predicate_groups(&self, conditions: &Conditions) -> Result<Vec<String>> {
        let mut bucket: Vec<String> = Vec::new();
        let mut explicit: Vec<String> = Vec::new();

        for entry in &conditions.entries {
            match entry {
                Entry::Cmp(cmp) => bucket.push(compile_comparison(cmp, self.quoter)?),
                Entry::Group(group) if group.conjunction == Conjunction::And => {
                    // Top-level AND groups merge with the bare predicates.
                    for child in &group.entries {
                        match child {
                            Entry::Cmp(cmp) => {
                                bucket.push(compile_comparison(cmp, self.quoter)?);
                            }
                            Entry::Group(inner) if !inner.is_empty() => {
                                bucket.push(format!("({})", self.group_sql(inner)?));
                            }
                            Entry::Group(_) => {}
                        }
                    }
                }
                Entry::Group(group) if !group.is_empty() => {
                    explicit.push(format!("({})", self.group_sql(group)?));
                }
                Entry::Group(_) => {}
            }
        }

        let mut groups = Vec::new();
        if !bucket.is_empty() {
            groups.push(format!("({})", bucket.join(" AND ")));
        }
        groups.extend(explicit);
        Ok(groups)
    }

    /// Compiles a group's entries joined by its conjunction.
    fn group_sql(&self, group: &Group) -> Result<String> {
        let mut parts: Vec<String> = Vec::new();
        for entry in &group.entries {
            match entry {
                Entry::Cmp(cmp) => parts.push(compile_comparison(cmp, self.quoter)?),
                Entry::Group(inner) if !inner.is_empty() => {
                    parts.push(format!("({})", self.group_sql(inner)?));
                }
                Entry::Group(_) => {}
            }
        }
        Ok(parts.join(&format!(" {} ", group.conjunction)))
    }

    fn order_sql(&self, order: &OrderSpec) -> String {
        match order {
            OrderSpec::Columns(cols) => {
                let parts: Vec<String> = cols
                    .iter()
                    .map(|(column, direction)| format!("{} {direction}", quote_ident(column)))
                    .collect();
                parts.join(",")
            }
            OrderSpec::Raw(fragment) => fragment.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Conjunction, Direction};
    use crate::quote::MysqlQuoter;

    fn clause(conditions: &Conditions) -> String {
        ConditionCompiler::new(&MysqlQuoter)
            .clause(conditions)
            .unwrap()
    }

    #[test]
    fn test_empty_tree_compiles_to_nothing() {
        assert_eq!(clause(&Conditions::new()), "");
    }

    #[test]
    fn test_single_predicate() {
        let c = Conditions::new().with("name", "x");
        assert_eq!(clause(&c), "WHERE (`name` = 'x')");
    }

    #[test]
    fn test_implicit_and() {
        let c = Conditions::new().with("a", 1_i64).with("b", 2_i64);
        assert_eq!(clause(&c), "WHERE (`a` = 1 AND `b` = 2)");
    }

    #[test]
    fn test_explicit_and_matches_implicit() {
        let implicit = Conditions::new().with("a", 1_i64).with("b", 2_i64);
        let explicit = Conditions::new().group(Group::and().with("a", 1_i64).with("b", 2_i64));
        assert_eq!(clause(&implicit), clause(&explicit));
    }

    #[test]
    fn test_or_group() {
        let c = Conditions::new().group(Group::or().with("role", "admin").with("role", "editor"));
        assert_eq!(clause(&c), "WHERE (`role` = 'admin' OR `role` = 'editor')");
    }

    #[test]
    fn test_and_and_or_groups_join_with_and() {
        let c = Conditions::new()
            .group(Group::or().with("x", 1_i64).with("y", 2_i64))
            .group(Group::and().with("a", 1_i64).with("b", 2_i64));
        assert_eq!(
            clause(&c),
            "WHERE (`a` = 1 AND `b` = 2) AND (`x` = 1 OR `y` = 2)"
        );
    }

    #[test]
    fn test_group_order_is_canonical_regardless_of_insertion() {
        let first = Conditions::new()
            .group(Group::and().with("a", 1_i64))
            .group(Group::or().with("x", 1_i64));
        let second = Conditions::new()
            .group(Group::or().with("x", 1_i64))
            .group(Group::and().with("a", 1_i64));
        assert_eq!(clause(&first), clause(&second));
    }

    #[test]
    fn test_nested_groups() {
        let c = Conditions::new().group(
            Group::or()
                .with("status", "new")
                .group(Group::and().with("age,>", 18_i64).with("verified", true)),
        );
        assert_eq!(
            clause(&c),
            "WHERE (`status` = 'new' OR (`age` > 18 AND `verified` = TRUE))"
        );
    }

    #[test]
    fn test_empty_groups_are_dropped() {
        let c = Conditions::new().with("a", 1_i64).group(Group::or());
        assert_eq!(clause(&c), "WHERE (`a` = 1)");
    }

    #[test]
    fn test_order_by_columns() {
        let c = Conditions::new()
            .with("a", 1_i64)
            .order("created", Direction::Desc)
            .order("id", Direction::Asc);
        assert_eq!(
            clause(&c),
            "WHERE (`a` = 1) ORDER BY `created` DESC,`id` ASC"
        );
    }

    #[test]
    fn test_order_raw_passthrough() {
        let c = Conditions::new().order_raw("FIELD(status, 'a', 'b')");
        assert_eq!(clause(&c), "ORDER BY FIELD(status, 'a', 'b')");
    }

    #[test]
    fn test_group_by() {
        let c = Conditions::new().group_by("kind");
        assert_eq!(clause(&c), "GROUP BY `kind`");
    }

    #[test]
    fn test_group_by_suppressed_by_order() {
        let c = Conditions::new()
            .order("id", Direction::Asc)
            .group_by("kind");
        assert_eq!(clause(&c), "ORDER BY `id` ASC");
    }

    #[test]
    fn test_limit_count_quirk() {
        let c = Conditions::new().limit(5);
        assert_eq!(clause(&c), "LIMIT 5,5");
    }

    #[test]
    fn test_limit_range() {
        let c = Conditions::new().limit_range(2, 5);
        assert_eq!(clause(&c), "LIMIT 2,5");
    }

    #[test]
    fn test_modifiers_without_predicates_omit_where() {
        let c = Conditions::new().order("id", Direction::Asc).limit(1);
        assert_eq!(clause(&c), "ORDER BY `id` ASC LIMIT 1,1");
    }

    #[test]
    fn test_where_body_no_op_predicate() {
        let compiler = ConditionCompiler::new(&MysqlQuoter);
        assert_eq!(compiler.where_body(&Conditions::new()).unwrap(), "1");
        let c = Conditions::new().with("a", 1_i64);
        assert_eq!(compiler.where_body(&c).unwrap(), "(`a` = 1)");
    }

    #[test]
    fn test_compile_error_propagates() {
        let c = Conditions::new().with("col,??", 1_i64);
        let err = ConditionCompiler::new(&MysqlQuoter).clause(&c).unwrap_err();
        assert_eq!(err.to_string(), "operator code in 'col,??' is not recognized");
    }

    #[test]
    fn test_conjunction_display() {
        assert_eq!(Conjunction::And.to_string(), "AND");
        assert_eq!(Conjunction::Or.to_string(), "OR");
    }
}
