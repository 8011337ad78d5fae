//! Compiles one comparison leaf into a SQL predicate fragment.
//!
//! Operator codes: `=`, `!`, `>`, `>=`, `<`, `<=`, `<>` (BETWEEN), `><`
//! (NOT BETWEEN), `~` (LIKE), `fin` (FIND_IN_SET), case-insensitive. An
//! absent code means equality. Equality-class operators rewrite to
//! IN/NOT IN for list values and IS/IS NOT for NULL.

use crate::condition::Comparison;
use crate::error::{CompileError, Result};
use crate::quote::{quote_ident, Quoter};
use crate::value::Value;

/// The resolved operator of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
    Between,
    NotBetween,
    Like,
    FindInSet,
}

/// Maps an operator code to its operator, case-insensitively.
fn resolve(code: &str) -> Option<Operator> {
    match code.to_ascii_lowercase().as_str() {
        "=" => Some(Operator::Eq),
        "!" => Some(Operator::NotEq),
        ">" => Some(Operator::Gt),
        ">=" => Some(Operator::GtEq),
        "<" => Some(Operator::Lt),
        "<=" => Some(Operator::LtEq),
        "<>" => Some(Operator::Between),
        "><" => Some(Operator::NotBetween),
        "~" => Some(Operator::Like),
        "fin" => Some(Operator::FindInSet),
        _ => None,
    }
}

/// Compiles a single comparison into a predicate fragment.
///
/// Fails with [`CompileError::UnknownOperator`] on an unrecognized code and
/// [`CompileError::ListValue`] when a list value reaches a scalar-only
/// operator.
pub(crate) fn compile_comparison(cmp: &Comparison, quoter: &dyn Quoter) -> Result<String> {
    let code = cmp.opcode.as_deref().unwrap_or("=");
    let op = resolve(code).ok_or_else(|| CompileError::UnknownOperator { key: cmp.key() })?;
    let column = quote_ident(&cmp.column);

    match op {
        Operator::Eq | Operator::NotEq => {
            let negated = op == Operator::NotEq;
            Ok(match &cmp.value {
                Value::List(items) => {
                    let keyword = if negated { "NOT IN" } else { "IN" };
                    let quoted: Vec<String> = items.iter().map(|v| quoter.quote(v)).collect();
                    format!("{column} {keyword} ({})", quoted.join(","))
                }
                Value::Null => {
                    let keyword = if negated { "IS NOT" } else { "IS" };
                    format!("{column} {keyword} NULL")
                }
                value => {
                    let symbol = if negated { "!=" } else { "=" };
                    format!("{column} {symbol} {}", quoter.quote(value))
                }
            })
        }
        Operator::Gt | Operator::GtEq | Operator::Lt | Operator::LtEq => {
            if cmp.value.is_list() {
                return Err(CompileError::ListValue { key: cmp.key() });
            }
            let symbol = match op {
                Operator::Gt => ">",
                Operator::GtEq => ">=",
                Operator::Lt => "<",
                _ => "<=",
            };
            Ok(format!("{column} {symbol} {}", quoter.quote(&cmp.value)))
        }
        Operator::Between | Operator::NotBetween => {
            let keyword = if op == Operator::NotBetween {
                "NOT BETWEEN"
            } else {
                "BETWEEN"
            };
            let (low, high) = match &cmp.value {
                Value::List(items) => match items.as_slice() {
                    [] => return Err(CompileError::ListValue { key: cmp.key() }),
                    [only] => (only, only),
                    [low, high, ..] => (low, high),
                },
                value => (value, value),
            };
            Ok(format!(
                "{column} {keyword} {} AND {}",
                quoter.quote(low),
                quoter.quote(high)
            ))
        }
        Operator::Like => {
            if cmp.value.is_list() {
                return Err(CompileError::ListValue { key: cmp.key() });
            }
            let pattern = Value::Text(format!("%{}%", cmp.value.to_plain_text()));
            Ok(format!("{column} LIKE {}", quoter.quote(&pattern)))
        }
        Operator::FindInSet => {
            let set = Value::Text(cmp.value.to_plain_text());
            Ok(format!("FIND_IN_SET({}, {column})", quoter.quote(&set)))
        }
    }
}
