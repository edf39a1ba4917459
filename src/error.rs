//! Error taxonomy for the frontend (§7). Every phase fails fast: the first
//! offending token or declaration aborts the current pass and the caller
//! receives enough context (a span, or a name) to report a diagnostic.

use crate::style::Style;
use crate::suggest::{find_similar, find_similar_owned, KNOWN_KEYWORDS};
use crate::token::{Span, TokenKind};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ParseError {
    pub span: Span,
    pub found: TokenKind,
    pub expected: String,
}

#[derive(Debug, Clone)]
pub enum RiddleError {
    Lex(LexError),
    Parse(ParseError),
    Io { path: PathBuf, message: String },
    DuplicateName { name: String, span: Option<Span> },
    UnresolvedName { name: String, span: Option<Span>, candidates: Vec<String> },
    TypeMismatch { expected: String, found: String, span: Option<Span> },
    Inconsistency { field: String, span: Option<Span> },
    NotImplemented { what: String },
}

impl RiddleError {
    pub fn span(&self) -> Option<Span> {
        match self {
            RiddleError::Lex(e) => Some(e.span),
            RiddleError::Parse(e) => Some(e.span),
            RiddleError::Io { .. } => None,
            RiddleError::DuplicateName { span, .. } => *span,
            RiddleError::UnresolvedName { span, .. } => *span,
            RiddleError::TypeMismatch { span, .. } => *span,
            RiddleError::Inconsistency { span, .. } => *span,
            RiddleError::NotImplemented { .. } => None,
        }
    }

    /// Renders the error with a `^^^` underline under the offending span
    /// in `source`, plus a best-effort "did you mean" hint.
    pub fn display_with_source(&self, source: &str) -> String {
        let Some(span) = self.span() else {
            return format!("{}: {}", Style::bold_red("error"), self);
        };
        let line_content = source.lines().nth(span.line.saturating_sub(1)).unwrap_or("");
        let col = span.start_col;
        let len = span.end_col.saturating_sub(span.start_col).max(1);
        let underline = format!("{}{}", " ".repeat(col), "^".repeat(len));

        let error_label = Style::bold_red("error");
        let line_num_str = Style::blue(&format!("{:4}", span.line));
        let pipe = Style::blue("|");
        let underline_colored = Style::red(&underline);

        let mut result = format!(
            "{}: {}\n\n{} {} {}\n     {} {}",
            error_label, self, line_num_str, pipe, line_content, pipe, underline_colored
        );

        if let Some(hint) = self.suggestion() {
            let help = Style::cyan("help");
            result.push_str(&format!("\n     {} {}: did you mean '{}'?", pipe, help, Style::green(&hint)));
        }

        result
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            RiddleError::UnresolvedName { name, candidates, .. } => find_similar_owned(name, candidates, 2),
            RiddleError::Parse(ParseError { found: TokenKind::Id(_), .. }) => None,
            _ => None,
        }
    }
}

impl fmt::Display for RiddleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiddleError::Lex(e) => write!(f, "{}", e.message),
            RiddleError::Parse(e) => {
                write!(f, "expected {}, found {}", e.expected, e.found.describe())?;
                if let TokenKind::Id(_) = &e.found {
                    if let Some(hint) = find_similar(&e.expected, KNOWN_KEYWORDS, 2) {
                        write!(f, " (close to keyword '{hint}'?)")?;
                    }
                }
                Ok(())
            }
            RiddleError::Io { path, message } => write!(f, "could not read '{}': {}", path.display(), message),
            RiddleError::DuplicateName { name, .. } => write!(f, "'{}' is already declared in this scope", name),
            RiddleError::UnresolvedName { name, .. } => write!(f, "could not resolve name '{}'", name),
            RiddleError::TypeMismatch { expected, found, .. } => {
                write!(f, "expected a value of type '{}', found '{}'", expected, found)
            }
            RiddleError::Inconsistency { field, .. } => {
                write!(f, "cannot initialize '{}': its type has no known instances", field)
            }
            RiddleError::NotImplemented { what } => write!(f, "not implemented: {}", what),
        }
    }
}

impl std::error::Error for RiddleError {}

impl From<LexError> for RiddleError {
    fn from(e: LexError) -> Self {
        RiddleError::Lex(e)
    }
}

impl From<ParseError> for RiddleError {
    fn from(e: ParseError) -> Self {
        RiddleError::Parse(e)
    }
}

pub type RResult<T> = Result<T, RiddleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_source_shows_line_and_underline() {
        let err = RiddleError::DuplicateName { name: "Foo".into(), span: Some(Span::new(2, 6, 9)) };
        let source = "class X {}\nclass Foo {}\n";
        let display = err.display_with_source(source);
        assert!(display.contains("class Foo {}"));
        assert!(display.contains("^^^"));
    }

    #[test]
    fn unresolved_name_suggests_close_candidate() {
        let err = RiddleError::UnresolvedName {
            name: "duratoin".into(),
            span: Some(Span::new(1, 0, 8)),
            candidates: vec!["duration".into(), "location".into()],
        };
        let display = err.display_with_source("duratoin;\n");
        assert!(display.contains("did you mean 'duration'?"));
    }

    #[test]
    fn io_error_has_no_span() {
        let err = RiddleError::Io { path: "missing.rid".into(), message: "not found".into() };
        assert!(err.span().is_none());
    }
}
