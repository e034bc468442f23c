//! Error types for expression construction, dispatch and compilation.

use thiserror::Error;

/// Errors raised while building, dispatching or compiling expressions.
///
/// Each variant is raised at the earliest point it can be detected:
/// schema and dispatch errors at construction, configuration errors at
/// registry setup, rewrite errors at compile time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Requested column(s) absent from a table schema
    #[error("Unknown column(s) [{}] in table {table}", .missing.join(", "))]
    Schema { table: String, missing: Vec<String> },

    /// Malformed schema descriptor (duplicate column names, empty names)
    #[error("Invalid schema: {reason}")]
    InvalidSchema { reason: String },

    /// Conflicting or ambiguous operator registration
    #[error("Configuration error for operator {operator} on [{category}]: {reason}")]
    Configuration {
        operator: String,
        category: String,
        reason: String,
    },

    /// No registration matches the receiver's categories
    #[error(
        "Unsupported operation {operator} for categories [{}]",
        .categories.join(", ")
    )]
    UnsupportedOperation {
        operator: String,
        categories: Vec<String>,
    },

    /// Repeat exceeded its iteration ceiling
    #[error("Rewrite did not reach a fixpoint after {iterations} passes, last tree: {last}")]
    NonTerminatingRewrite { iterations: usize, last: String },

    /// Rewriting converged but the root is not a terminal value
    #[error(
        "Unresolved expression {operation} with argument categories [{}]",
        .argument_categories.join(", ")
    )]
    UnresolvedExpression {
        operation: String,
        argument_categories: Vec<String>,
    },

    /// Malformed expression text
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Execution substrate failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// Schema descriptor encoding failure
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type for expression operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Schema {
            table: "orders".to_string(),
            missing: vec!["missing".to_string(), "other".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unknown column(s) [missing, other] in table orders"
        );

        let err = Error::UnsupportedOperation {
            operator: "add".to_string(),
            categories: vec!["Value|Scalar|String".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unsupported operation add for categories [Value|Scalar|String]"
        );

        let err = Error::NonTerminatingRewrite {
            iterations: 3,
            last: "Add(1, 2)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Rewrite did not reach a fixpoint after 3 passes, last tree: Add(1, 2)"
        );

        let err = Error::UnresolvedExpression {
            operation: "Power".to_string(),
            argument_categories: vec!["Value|Scalar|Numeric|Integer".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unresolved expression Power with argument categories [Value|Scalar|Numeric|Integer]"
        );
    }
}
