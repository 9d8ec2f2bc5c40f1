/// Unified error type for the parser.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `UNION` / `UNION ALL` not followed by another SELECT.
    #[error("Malformed set operation: {0}")]
    MalformedSetOperation(String),
    /// A column's tokens match none of the recognised expression shapes.
    #[error("Unsupported column shape: {0}")]
    UnsupportedColumnShape(String),
    /// The token sequence ran out where a clause still needs a token.
    #[error("Unexpected end of input: expected {0}")]
    UnexpectedEndOfInput(String),
    /// A mandatory clause (FROM) is absent.
    #[error("Missing required clause: {0}")]
    MissingRequiredClause(String),
    /// An opening or closing parenthesis has no partner.
    #[error("Unmatched parenthesis in '{0}'")]
    UnmatchedParenthesis(String),
    /// A token is present but of the wrong kind.
    #[error("Unexpected token '{found}' at position {position}: expected {expected}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: usize,
    },
    /// A complete statement is followed by tokens nothing consumed.
    #[error("Unexpected token '{token}' after statement at position {position}")]
    TrailingTokens { token: String, position: usize },
    /// Parenthesis nesting or UNION chaining is deeper than allowed.
    #[error("Nesting exceeds the configured limit of {0}")]
    NestingTooDeep(usize),
}

/// Convenience type alias for Results using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
