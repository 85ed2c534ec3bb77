//! Error types for the Curlybars runtime.

use std::fmt;

use thiserror::Error;

pub use curlybars_ast::{CompileError, CompileErrorKind, Position};

/// The kind of a [`RenderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderErrorKind {
    ContextIsNotAPresenter,
    ContextIsNotAnArrayOfPresenters,
    PathNotAllowed,
    InvalidHelperSignature,
    PartialNotFound,
    CircularPartial,
}

impl RenderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderErrorKind::ContextIsNotAPresenter => "context_is_not_a_presenter",
            RenderErrorKind::ContextIsNotAnArrayOfPresenters => {
                "context_is_not_an_array_of_presenters"
            }
            RenderErrorKind::PathNotAllowed => "path_not_allowed",
            RenderErrorKind::InvalidHelperSignature => "invalid_helper_signature",
            RenderErrorKind::PartialNotFound => "partial_not_found",
            RenderErrorKind::CircularPartial => "circular_partial",
        }
    }
}

impl fmt::Display for RenderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised while rendering. Rendering fails closed: nothing is
/// recovered internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {position}: {message}")]
pub struct RenderError {
    pub kind: RenderErrorKind,
    pub message: String,
    pub position: Position,
}

impl RenderError {
    pub fn new(kind: RenderErrorKind, message: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            position,
        }
    }
}

/// Error raised when a presenter type's whitelist is declared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error(
        "collection `{method}` on {presenter} must name exactly one presenter type, got {count}"
    )]
    InvalidCollection {
        presenter: String,
        method: String,
        count: usize,
    },
}

/// All errors that can occur in Curlybars
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurlybarsError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Declaration(#[from] DeclarationError),
}

/// Result type alias for Curlybars operations
pub type Result<T> = std::result::Result<T, CurlybarsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_error_display() {
        let err = RenderError::new(
            RenderErrorKind::PathNotAllowed,
            "`system` is not available",
            Position::new("posts/show.hbs", 3, 7),
        );
        assert_eq!(
            err.to_string(),
            "path_not_allowed at posts/show.hbs:3:7: `system` is not available"
        );
    }

    #[test]
    fn umbrella_error_is_transparent() {
        let err: CurlybarsError = DeclarationError::InvalidCollection {
            presenter: "PostPresenter".into(),
            method: "links".into(),
            count: 2,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "collection `links` on PostPresenter must name exactly one presenter type, got 2"
        );
    }
}
