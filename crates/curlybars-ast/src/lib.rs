//! Lexer, parser and AST for Curlybars templates.
//!
//! Curlybars is a Handlebars-style template language whose templates render
//! against presenters. This crate turns template source into a validated
//! [`Program`]; it performs no I/O and knows nothing about presenters.
//!
//! ```rust
//! let program = curlybars_ast::parse("Hello, {{user.name}}!").unwrap();
//! assert_eq!(program.nodes().len(), 3);
//! ```

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{
    BlockHelperNode, ClosingTag, EachNode, Expression, HelperNode, IfNode, LiteralNode, Node,
    OptionNode, PartialNode, PathNode, Program, UnlessNode, WithNode,
};
pub use lexer::{lex, Lexer};
pub use parser::Parser;
pub use token::{Token, TokenKind};

/// File name used when a template is compiled without one.
pub const DEFAULT_FILE_NAME: &str = "(template)";

// ============================================================================
// Position
// ============================================================================

/// Location of a token or node in a template file (1-indexed).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    pub file: Arc<str>,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(file: impl Into<Arc<str>>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// The kind of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileErrorKind {
    InvalidToken,
    UnexpectedToken,
    UnclosedBlock,
    ClosingTagMismatch,
    InvalidOption,
}

impl CompileErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompileErrorKind::InvalidToken => "invalid_token",
            CompileErrorKind::UnexpectedToken => "unexpected_token",
            CompileErrorKind::UnclosedBlock => "unclosed_block",
            CompileErrorKind::ClosingTagMismatch => "closing_tag_mismatch",
            CompileErrorKind::InvalidOption => "invalid_option",
        }
    }
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised while lexing or parsing a template. Always fatal for that
/// template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {position}: {message}")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub message: String,
    pub position: Position,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, message: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            position,
        }
    }

    pub(crate) fn invalid_token(message: impl Into<String>, position: Position) -> Self {
        Self::new(CompileErrorKind::InvalidToken, message, position)
    }

    pub(crate) fn unexpected_token(message: impl Into<String>, position: Position) -> Self {
        Self::new(CompileErrorKind::UnexpectedToken, message, position)
    }

    pub(crate) fn invalid_option(message: impl Into<String>, position: Position) -> Self {
        Self::new(CompileErrorKind::InvalidOption, message, position)
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;

// ============================================================================
// Parsing
// ============================================================================

/// Parse template source into a validated [`Program`].
pub fn parse(source: &str) -> Result<Program> {
    parse_file(source, DEFAULT_FILE_NAME)
}

/// Parse template source, tagging every position with `file`.
pub fn parse_file(source: &str, file: impl Into<Arc<str>>) -> Result<Program> {
    let program = Parser::new(lex(source, file)).parse()?;
    tracing::debug!(nodes = program.nodes().len(), "parsed template");
    Ok(program)
}
