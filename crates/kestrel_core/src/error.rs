//! Error types for the Kestrel front-end.

use thiserror::Error;

/// Which stage of the front-end rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// A malformed literal, comment or character rejected by the scanner.
    #[error("LexerError")]
    Lexer,

    /// An unexpected or missing token.
    #[error("SyntaxError")]
    Syntax,

    /// A construct that is only illegal in strict mode code.
    #[error("StrictModeError")]
    StrictMode,

    /// A binding or context rule: duplicate declarations, bad `break`
    /// targets, misplaced `super` or `new.target`.
    #[error("SemanticError")]
    Semantic,
}

/// A fatal parse failure.
///
/// The location is 1-based and refers to the first unit of the offending
/// token, relative to the start line of the parsed [`SourceText`].
///
/// [`SourceText`]: crate::source::SourceText
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message} ({file_name}:{line}:{column})")]
pub struct ParseError {
    /// Stage that produced the error.
    pub kind: ErrorKind,
    /// URL of the source being parsed.
    pub file_name: String,
    /// Human-readable description.
    pub message: String,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column, in units.
    pub column: u32,
}

/// Convenient `Result` alias for fallible front-end operations.
pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_location() {
        let error = ParseError {
            kind: ErrorKind::StrictMode,
            file_name: "app.js".to_owned(),
            message: "Delete of an unqualified identifier in strict mode".to_owned(),
            line: 3,
            column: 14,
        };
        assert_eq!(
            error.to_string(),
            "StrictModeError: Delete of an unqualified identifier in strict mode (app.js:3:14)"
        );
    }
}
