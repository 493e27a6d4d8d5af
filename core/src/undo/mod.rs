//! Undo/redo for editing sessions.
//!
//! This module is decoupled from any concrete scene representation. A host
//! implements [`UndoWorld`] for its object store and drives an [`Undo`]
//! engine from its tools:
//!
//! - [`Snapshot`] / [`FieldDiff`]: field-level capture and diffing of any
//!   `Serialize + Deserialize` type that implements [`Restore`]
//! - [`UndoAction`]: a reversible edit (Command pattern)
//! - [`ObjectAction`]: replays one object's field diff
//! - [`MultiAction`]: groups actions into one step, undone in reverse
//! - [`UndoHistory`]: bounded done/undone stacks
//! - [`Undo`]: recording sessions, commit, undo/redo, notifications
//! - [`UndoBlock`] / [`UndoMultiBlock`]: scoped recording sessions
//!
//! # Recording model
//!
//! Field edits are recorded by bracketing them: `record_begin` snapshots the
//! object, the edit mutates it in place, and `record_end` diffs the result.
//! Nothing is recorded if nothing changed. Structural edits that a field diff
//! cannot express (spawning, deleting, reparenting) are committed as
//! purpose-built actions with `add_action` after they happened.
//!
//! Actions locate their targets through the world on every replay. A target
//! deleted by a later edit is skipped with a warning rather than failing the
//! whole undo.
//!
//! # Scene edits
//!
//! Hosts that track per-scene dirty state can ask an action which scenes it
//! touched through [`UndoAction::as_scene_edit`]. Actions without that
//! capability can still be inspected by downcasting to [`ObjectAction`] or
//! [`MultiAction`] and mapping target keys through
//! [`UndoWorld::owning_scene`].

mod action;
mod block;
mod engine;
mod error;
mod events;
mod history;
mod multi_action;
mod object_action;
mod snapshot;
mod value;

pub use action::{
    AsAny, SceneEditAction, UndoAction, UndoActionError, UndoActionResult, UndoWorld,
};
pub use block::{UndoBlock, UndoMultiBlock};
pub use engine::Undo;
pub use error::{UndoError, UndoResult};
pub use events::{ListenerId, UndoEvent, UndoEventKind, UndoListener};
pub use history::{DEFAULT_CAPACITY, UndoHistory};
pub use multi_action::MultiAction;
pub use object_action::ObjectAction;
pub use snapshot::{
    Diffable, FieldChange, FieldDiff, FieldPath, PathSegment, Restore, Snapshot, SnapshotError,
};
pub use value::{FieldValue, from_field_value, to_field_value};
