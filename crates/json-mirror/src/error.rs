//! Error types for mirror maintenance.

use crate::{DocumentId, Patch, Path};
use thiserror::Error;

pub type MirrorResult<T> = Result<T, MirrorError>;

/// Errors raised while applying or scoping patches.
///
/// None of these are recoverable in place: containers touched by earlier
/// patches of the batch stay mutated, so the owner of the mirror has to
/// rebuild it from a fresh snapshot.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The patch carries an action this engine does not implement.
    #[error("patch action not implemented: {action}\n{patch:#?}")]
    UnsupportedPatchAction {
        action: &'static str,
        patch: Box<Patch>,
    },

    /// A record key or list index along the path does not exist.
    #[error("path not found: {path}")]
    PathNotFound { path: Path },

    /// A path step tried to index into a scalar, or used the wrong prop kind
    /// for the container (a key on a list, an index on a record).
    #[error("cannot index {found} at {path}")]
    NotAContainer { path: Path, found: &'static str },

    #[error("index {index} out of bounds (len: {len}) at {path}")]
    IndexOutOfBounds {
        path: Path,
        index: usize,
        len: usize,
    },

    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: Path,
        expected: &'static str,
        found: &'static str,
    },

    /// Splice or insert whose terminal prop is not a numeric position.
    #[error("expected a numeric position at the end of {path}")]
    InvalidPosition { path: Path },

    /// The patch moves the scoped subtree to another list index.
    #[error("patch at {path} shifts the scoped subtree")]
    ScopeShifted { path: Path },

    #[error("patch #{index} of batch failed: {source}")]
    BatchFailed {
        index: usize,
        #[source]
        source: Box<MirrorError>,
    },

    #[error("notification for document {found}, store mirrors {expected}")]
    DocumentMismatch {
        expected: DocumentId,
        found: DocumentId,
    },

    /// A previous batch failed; the mirror must be resynchronized first.
    #[error("mirror is desynchronized from its document")]
    Desynchronized,

    /// A thread panicked while holding a shared store's lock.
    #[error("shared mirror store lock poisoned")]
    Poisoned,

    /// The mirror is not equal to the upstream snapshot.
    #[error("mirror diverged from snapshot at {pointer:?}")]
    Diverged { pointer: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MirrorError {
    #[inline]
    pub fn path_not_found(path: impl Into<Path>) -> Self {
        MirrorError::PathNotFound { path: path.into() }
    }

    #[inline]
    pub fn type_mismatch(path: impl Into<Path>, expected: &'static str, found: &'static str) -> Self {
        MirrorError::TypeMismatch {
            path: path.into(),
            expected,
            found,
        }
    }

    /// The innermost error, looking through [`MirrorError::BatchFailed`].
    pub fn root_cause(&self) -> &MirrorError {
        match self {
            MirrorError::BatchFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// True for the resolution failures that indicate a patch inconsistent
    /// with the mirror it was applied to.
    pub fn is_path_resolution(&self) -> bool {
        matches!(
            self.root_cause(),
            MirrorError::PathNotFound { .. }
                | MirrorError::NotAContainer { .. }
                | MirrorError::IndexOutOfBounds { .. }
                | MirrorError::TypeMismatch { .. }
                | MirrorError::InvalidPosition { .. }
        )
    }
}

/// Name of a JSON value's type, used in error messages.
#[inline]
pub fn value_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
