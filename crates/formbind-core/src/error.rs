//! Error types for path compilation, resolution and document handling.

use crate::container::NodeKind;
use thiserror::Error;

/// Result alias for path operations.
pub type PathResult<T> = Result<T, PathError>;

/// Why a path string was rejected by the strict compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Malformed {
    #[error("empty identifier")]
    EmptyIdentifier,
    #[error("unbalanced brackets")]
    UnbalancedBrackets,
    #[error("condition without `=`")]
    MissingEquals,
    #[error("condition with an empty key")]
    EmptyConditionKey,
    #[error("condition with more than one `=`")]
    ExtraEquals,
}

/// Errors raised while compiling or resolving a nested path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path string does not follow the path grammar.
    #[error("malformed path `{path}`: {reason}")]
    MalformedPath { path: String, reason: Malformed },

    /// A segment met a value of the wrong shape.
    #[error("type mismatch in `{path}` at `{at}`: expected {expected}, found {found}")]
    TypeMismatch {
        /// Source path being resolved.
        path: String,
        /// Normalized location of the offending value.
        at: String,
        expected: NodeKind,
        found: NodeKind,
    },

    /// A resolved index points past the end of a sequence.
    #[error("index {index} out of bounds (len: {len}) at `{at}`")]
    IndexOutOfBounds { at: String, index: usize, len: usize },
}

impl PathError {
    #[inline]
    pub fn malformed(path: impl Into<String>, reason: Malformed) -> Self {
        PathError::MalformedPath {
            path: path.into(),
            reason,
        }
    }

    #[inline]
    pub fn type_mismatch(
        path: impl Into<String>,
        at: impl Into<String>,
        expected: NodeKind,
        found: NodeKind,
    ) -> Self {
        PathError::TypeMismatch {
            path: path.into(),
            at: at.into(),
            expected,
            found,
        }
    }

    /// Returns true for errors caused by the path text itself.
    pub fn is_malformed(&self) -> bool {
        matches!(self, PathError::MalformedPath { .. })
    }
}

/// Errors from loading documents, compiling rules and applying paths.
#[derive(Debug, Error)]
pub enum FormbindError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("empty file: {0}")]
    EmptyFile(String),
}
