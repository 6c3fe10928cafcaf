//! Error types for the RCSS parser

use crate::tokenizer::{LexError, SpannedToken, TokenSpan};
use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Syntax error with location and context
///
/// These are hard grammar errors. A document containing any of them is not
/// loaded at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{line}:{column}: unexpected {found}, expected {expected}")]
    UnexpectedToken {
        span: TokenSpan,
        line: usize,
        column: usize,
        expected: String,
        found: String,
    },

    #[error("{line}:{column}: unexpected end of input, expected {expected}")]
    UnexpectedEof {
        span: TokenSpan,
        line: usize,
        column: usize,
        expected: String,
    },

    #[error("{line}:{column}: {message}")]
    InvalidSyntax {
        span: TokenSpan,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{line}:{column}: {message}")]
    LexError {
        span: TokenSpan,
        line: usize,
        column: usize,
        message: String,
    },
}

impl ParseError {
    pub fn unexpected_token(token: &SpannedToken<'_>, expected: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            span: token.span,
            line: token.line,
            column: token.column,
            expected: expected.into(),
            found: token.token.to_string(),
        }
    }

    pub fn unexpected_eof(
        span: TokenSpan,
        (line, column): (usize, usize),
        expected: impl Into<String>,
    ) -> Self {
        Self::UnexpectedEof {
            span,
            line,
            column,
            expected: expected.into(),
        }
    }

    pub fn invalid_syntax(token: &SpannedToken<'_>, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            span: token.span,
            line: token.line,
            column: token.column,
            message: message.into(),
        }
    }

    pub fn span(&self) -> TokenSpan {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. }
            | ParseError::InvalidSyntax { span, .. }
            | ParseError::LexError { span, .. } => *span,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { line, .. }
            | ParseError::UnexpectedEof { line, .. }
            | ParseError::InvalidSyntax { line, .. }
            | ParseError::LexError { line, .. } => *line,
        }
    }

    /// Message without the location prefix
    pub fn label(&self) -> String {
        match self {
            ParseError::UnexpectedToken { expected, .. }
            | ParseError::UnexpectedEof { expected, .. } => format!("expected {}", expected),
            ParseError::InvalidSyntax { message, .. } | ParseError::LexError { message, .. } => {
                message.clone()
            }
        }
    }
}

impl From<LexError> for ParseError {
    fn from(error: LexError) -> Self {
        ParseError::LexError {
            span: error.span,
            line: error.line,
            column: error.column,
            message: error.message,
        }
    }
}

/// Pretty-print errors with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_errors(source: &str, filename: &str, errors: &[ParseError]) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let mut output = Vec::new();

    for error in errors {
        let span = error.span();
        let end = span.end.max(span.start + 1).min(source.len().max(1));
        let start = span.start.min(end.saturating_sub(1));

        let report = Report::build(ReportKind::Error, filename, start)
            .with_message(error.to_string())
            .with_label(
                Label::new((filename, start..end))
                    .with_color(Color::Red)
                    .with_message(error.label()),
            )
            .finish();

        if report
            .write((filename, Source::from(source)), &mut output)
            .is_err()
        {
            output.extend_from_slice(format!("{}\n", error).as_bytes());
        }
    }

    String::from_utf8(output).unwrap_or_else(|_| "Error formatting failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_conversion_keeps_position() {
        let error = ParseError::from(LexError {
            span: TokenSpan { start: 4, end: 5 },
            line: 2,
            column: 3,
            message: "Unexpected input".to_string(),
        });

        assert_eq!(error.line(), 2);
        assert_eq!(error.span(), TokenSpan { start: 4, end: 5 });
        assert_eq!(error.to_string(), "2:3: Unexpected input");
    }

    #[cfg(feature = "pretty-errors")]
    #[test]
    fn test_format_errors_mentions_message() {
        let source = "a { b: c; }\n}";
        let error = ParseError::InvalidSyntax {
            span: TokenSpan { start: 12, end: 13 },
            line: 2,
            column: 1,
            message: "Unexpected '}'".to_string(),
        };

        let report = format_errors(source, "test.rcss", &[error]);
        assert!(report.contains("Unexpected '}'"));
    }
}
