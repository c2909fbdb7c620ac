//! Parser error types.

use thiserror::Error;

use super::classify::StatementKind;

/// Result type for parse operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors returned by [`parse`](super::parse).
///
/// References to unknown aliases are not errors: those fragments are skipped
/// and parsing continues.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// PL/SQL blocks, MERGE, INSERT ... VALUES and unrecognized statements.
    #[error("unsupported statement: {kind}")]
    UnsupportedStatement { kind: StatementKind },

    /// The statement shape was recognized but its structure could not be
    /// followed (unbalanced CTE parentheses, UPDATE without SET, ...).
    #[error("malformed statement: {0}")]
    MalformedStructure(String),
}

impl ParseError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedStructure(message.into())
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedStatement { .. })
    }
}
