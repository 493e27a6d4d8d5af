//! Engine-level errors.

use super::action::UndoActionError;
use super::snapshot::SnapshotError;

/// Errors returned by [`Undo`](super::Undo) operations.
///
/// The first four variants are call-pairing contract violations: the caller
/// began a session twice, ended one that was never begun, or passed an
/// empty subject list. They never modify the session table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UndoError {
    /// A recording session is already open for this subject.
    #[error("already recording {0}")]
    AlreadyRecording(String),
    /// No open recording session matches the requested subject.
    #[error("no recording session for {0}")]
    NoSession(String),
    /// The subject could not be resolved to a live object.
    #[error("object not found: {0}")]
    ObjectNotFound(String),
    /// A multi-object recording was started with no subjects.
    #[error("multi-object recording needs at least one subject")]
    EmptySubjects,
    /// A composite action was built from an empty list.
    #[error("composite action needs at least one child action")]
    EmptyComposite,
    /// Capturing or comparing a snapshot failed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// An action failed while being undone or redone.
    #[error("action '{label}' failed: {source}")]
    Action {
        label: String,
        #[source]
        source: UndoActionError,
    },
}

/// Result type for engine operations.
pub type UndoResult<T = ()> = Result<T, UndoError>;
