//! Undo targets and reversible actions.
//!
//! This module defines the core abstractions for the undo system:
//!
//! - [`UndoWorld`]: the host's object store, which doubles as the identity
//!   resolution service used at undo/redo time
//! - [`UndoAction`]: a reversible edit (Command pattern)
//! - [`SceneEditAction`]: optional capability for actions that know which
//!   scenes they touch
//! - [`UndoActionError`] / [`UndoActionResult`]: error handling for actions
//!
//! Actions are self-contained: each implementation owns whatever payload it
//! needs (a field diff, saved objects, old/new parents) until it is disposed.

use std::any::Any;
use std::fmt;
use std::hash::Hash;

use super::snapshot::{Diffable, SnapshotError};

/// Helper trait for downcasting trait objects to concrete types.
///
/// Automatically implemented for all `'static` types. The scene-dirty
/// fallback uses it to recognise object and composite actions.
pub trait AsAny: 'static {
    /// Returns a reference to `self` as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T: 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The editing target: owns the tracked objects and resolves them by key.
///
/// Resolution may fail at any time: an object recorded earlier can be deleted
/// by a later action. Callers treat `None` as "no longer exists".
///
/// # Example
///
/// ```ignore
/// impl UndoWorld for MyScene {
///     type Key = NodeId;
///     type SceneId = ();
///
///     fn resolve(&self, key: &NodeId) -> Option<&dyn Diffable> {
///         self.nodes.get(key).map(|n| n as &dyn Diffable)
///     }
///
///     fn resolve_mut(&mut self, key: &NodeId) -> Option<&mut dyn Diffable> {
///         self.nodes.get_mut(key).map(|n| n as &mut dyn Diffable)
///     }
/// }
/// ```
pub trait UndoWorld: 'static {
    /// Identity of a tracked object.
    type Key: Clone + Eq + Hash + fmt::Debug + 'static;
    /// Identity of a container (scene) that objects belong to.
    type SceneId: Clone + Eq + Hash + fmt::Debug + 'static;

    /// Finds a live object by identity.
    fn resolve(&self, key: &Self::Key) -> Option<&dyn Diffable>;

    /// Finds a live object by identity for writing.
    fn resolve_mut(&mut self, key: &Self::Key) -> Option<&mut dyn Diffable>;

    /// The scene that owns `key`, if the object is a scene object.
    ///
    /// Used to decide which scenes an object edit dirties. The default says
    /// no object belongs to a scene.
    fn owning_scene(&self, _key: &Self::Key) -> Option<Self::SceneId> {
        None
    }
}

/// Error type for action execution failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UndoActionError {
    /// The target object was not found.
    #[error("target not found: {0}")]
    TargetNotFound(String),
    /// The target is in an invalid state for this action.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// A field diff could not be applied.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// A custom error with a description.
    #[error("{0}")]
    Custom(String),
}

/// Result type for action operations.
pub type UndoActionResult<T = ()> = Result<T, UndoActionError>;

/// A reversible editor action (Command pattern).
///
/// Actions are stored in the history as `Box<dyn UndoAction<W>>`, so the
/// trait is dyn-compatible.
///
/// Unlike a command that is executed on submission, most actions are built
/// *after* the edit already happened (from a field diff, or by a tool that
/// performed a structural change), so the history only calls
/// [`apply`](Self::apply) on redo.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug)]
/// struct Rename {
///     node: NodeId,
///     old: String,
///     new: String,
/// }
///
/// impl UndoAction<MyScene> for Rename {
///     fn apply(&mut self, scene: &mut MyScene) -> UndoActionResult {
///         scene.rename(self.node, &self.new)
///     }
///
///     fn undo(&mut self, scene: &mut MyScene) -> UndoActionResult {
///         scene.rename(self.node, &self.old)
///     }
///
///     fn label(&self) -> &str {
///         "Rename"
///     }
/// }
/// ```
pub trait UndoAction<W: UndoWorld>: fmt::Debug + AsAny {
    /// Applies the action to the world (forward / redo direction).
    fn apply(&mut self, world: &mut W) -> UndoActionResult;

    /// Reverses the action.
    ///
    /// Must restore the world to the state before [`apply`](Self::apply).
    /// Both directions are all-or-nothing: an action that returns an error
    /// leaves the world as it found it, so the history can keep it on its
    /// stack and retry later.
    fn undo(&mut self, world: &mut W) -> UndoActionResult;

    /// A short, human-readable label for the Edit menu.
    ///
    /// Examples: `"Move actor"`, `"Change light color"`.
    fn label(&self) -> &str;

    /// Releases the action's payload.
    ///
    /// Called exactly once when the history forgets the action (capacity
    /// eviction, redo branch discarded, history cleared or dropped). The
    /// action is not replayed afterwards.
    fn dispose(&mut self) {}

    /// Whether this action changes document content.
    ///
    /// Return `false` for recorded UI-state changes such as selection; they
    /// stay undoable but do not move the save point.
    ///
    /// Default: `true`.
    fn modifies_content(&self) -> bool {
        true
    }

    /// Explicit scene-edit capability.
    ///
    /// Actions that know which scenes they dirty return `Some(self)` here.
    /// Actions returning `None` are inspected by the scene-dirty fallback,
    /// which only understands object-diff and composite actions.
    fn as_scene_edit(&self) -> Option<&dyn SceneEditAction<W>> {
        None
    }
}

/// Capability for actions that report the scenes they edit.
///
/// Preferred over the structural fallback for every purpose-built action:
/// creation, deletion and reparenting know their scene even when the object
/// itself no longer exists.
pub trait SceneEditAction<W: UndoWorld> {
    /// Scenes touched by this action.
    fn edited_scenes(&self, world: &W) -> Vec<W::SceneId>;
}
