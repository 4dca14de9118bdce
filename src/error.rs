//! Aggregation-compiler error types

use thiserror::Error;

/// Errors produced while compiling SELECT/GROUP BY clauses into aggregations
#[derive(Debug, Error)]
pub enum AggError {
    /// SQL parsing error
    #[error("SQL parse error: {0}")]
    Parse(String),

    /// Statement shape the compiler does not handle
    #[error("unsupported statement: {0}")]
    UnsupportedStatement(String),

    /// A bucket-function argument had an unexpected shape
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// A bucket function was called with the wrong number of arguments
    #[error("malformed arguments: {0}")]
    MalformedArguments(String),

    /// A reserved feature that is not implemented yet
    #[error("not supported: {0}")]
    NotSupported(String),

    /// A GROUP BY function outside the known bucket functions
    #[error("unsupported GROUP BY function: {0}")]
    UnsupportedFunction(String),
}

/// Result type for aggregation compilation
pub type Result<T> = std::result::Result<T, AggError>;

impl From<sqlparser::parser::ParserError> for AggError {
    fn from(e: sqlparser::parser::ParserError) -> Self {
        AggError::Parse(e.to_string())
    }
}
