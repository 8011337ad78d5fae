//! Error types for clause compilation.

use thiserror::Error;

/// Errors raised while compiling a condition tree to SQL text.
///
/// Compilation errors are always raised before any statement is dispatched
/// or executed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The operator code in a `column,opcode` key is not recognized.
    #[error("operator code in '{key}' is not recognized")]
    UnknownOperator {
        /// The offending `column,opcode` key.
        key: String,
    },

    /// A list value was given to an operator that only accepts scalars.
    #[error("list value for '{key}' requires an equality, range or FIND_IN_SET operator")]
    ListValue {
        /// The offending `column,opcode` key.
        key: String,
    },
}

/// Result type alias for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;
