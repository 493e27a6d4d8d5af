//! Field-diff action for a single object.

use std::fmt;

use super::action::{UndoAction, UndoActionResult, UndoWorld};
use super::snapshot::FieldDiff;

/// Applies or reverts one object's recorded field changes.
///
/// Built by the engine when a recording session ends with a non-empty diff.
/// The target is looked up by key on every replay; if it no longer exists
/// (deleted by a later action), the replay is skipped with a warning.
pub struct ObjectAction<W: UndoWorld> {
    key: W::Key,
    label: String,
    diff: FieldDiff,
}

impl<W: UndoWorld> ObjectAction<W> {
    pub fn new(key: W::Key, label: impl Into<String>, diff: FieldDiff) -> Self {
        Self {
            key,
            label: label.into(),
            diff,
        }
    }

    /// The recorded object.
    pub fn key(&self) -> &W::Key {
        &self.key
    }

    pub fn diff(&self) -> &FieldDiff {
        &self.diff
    }
}

impl<W: UndoWorld> fmt::Debug for ObjectAction<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectAction")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("changes", &self.diff.len())
            .finish()
    }
}

impl<W: UndoWorld> UndoAction<W> for ObjectAction<W> {
    fn apply(&mut self, world: &mut W) -> UndoActionResult {
        let Some(target) = world.resolve_mut(&self.key) else {
            log::warn!("'{}': {:?} no longer exists, skipping redo", self.label, self.key);
            return Ok(());
        };
        self.diff.apply_new(target)?;
        Ok(())
    }

    fn undo(&mut self, world: &mut W) -> UndoActionResult {
        let Some(target) = world.resolve_mut(&self.key) else {
            log::warn!("'{}': {:?} no longer exists, skipping undo", self.label, self.key);
            return Ok(());
        };
        self.diff.apply_old(target)?;
        Ok(())
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn dispose(&mut self) {
        self.diff = FieldDiff::default();
    }
}
