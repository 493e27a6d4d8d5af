//! Composite action.

use std::fmt;

use super::action::{UndoAction, UndoActionError, UndoActionResult, UndoWorld};
use super::error::{UndoError, UndoResult};

/// An ordered group of actions that is undone and redone as one step.
///
/// Children are applied first to last and undone last to first, so a child
/// that depends on an earlier child's effect (a spawned parent, say) is torn
/// down before its dependency.
///
/// A child whose target is gone ([`UndoActionError::TargetNotFound`]) is
/// logged and skipped; the remaining children still run. Any other child
/// error stops the replay and is returned.
pub struct MultiAction<W: UndoWorld> {
    label: Option<String>,
    actions: Vec<Box<dyn UndoAction<W>>>,
}

impl<W: UndoWorld> MultiAction<W> {
    /// Groups `actions`, labelled after the first child.
    pub fn new(actions: Vec<Box<dyn UndoAction<W>>>) -> UndoResult<Self> {
        if actions.is_empty() {
            return Err(UndoError::EmptyComposite);
        }
        Ok(Self {
            label: None,
            actions,
        })
    }

    /// Groups `actions` under an explicit label.
    pub fn with_label(
        label: impl Into<String>,
        actions: Vec<Box<dyn UndoAction<W>>>,
    ) -> UndoResult<Self> {
        let mut multi = Self::new(actions)?;
        multi.label = Some(label.into());
        Ok(multi)
    }

    /// Child actions in application order.
    pub fn actions(&self) -> impl ExactSizeIterator<Item = &dyn UndoAction<W>> {
        self.actions.iter().map(|a| a.as_ref())
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Always `false`: construction rejects empty lists.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

fn skip_missing(label: &str, result: UndoActionResult) -> UndoActionResult {
    match result {
        Err(UndoActionError::TargetNotFound(what)) => {
            log::warn!("'{label}': skipping step, {what} no longer exists");
            Ok(())
        }
        other => other,
    }
}

fn log_rollback(label: &str, result: UndoActionResult) {
    if let Err(e) = result {
        log::error!("'{label}': rollback failed, world may be inconsistent: {e}");
    }
}

impl<W: UndoWorld> fmt::Debug for MultiAction<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiAction")
            .field("label", &self.label())
            .field("actions", &self.actions)
            .finish()
    }
}

impl<W: UndoWorld> UndoAction<W> for MultiAction<W> {
    /// Applies children in order. If one fails, the children already applied
    /// are undone again before the error is returned.
    fn apply(&mut self, world: &mut W) -> UndoActionResult {
        for index in 0..self.actions.len() {
            let action = &mut self.actions[index];
            let result = action.apply(world);
            if let Err(e) = skip_missing(action.label(), result) {
                for done in self.actions[..index].iter_mut().rev() {
                    let result = done.undo(world);
                    log_rollback(done.label(), skip_missing(done.label(), result));
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Undoes children in reverse order. If one fails, the children already
    /// undone are applied again before the error is returned.
    fn undo(&mut self, world: &mut W) -> UndoActionResult {
        for index in (0..self.actions.len()).rev() {
            let action = &mut self.actions[index];
            let result = action.undo(world);
            if let Err(e) = skip_missing(action.label(), result) {
                for undone in &mut self.actions[index + 1..] {
                    let result = undone.apply(world);
                    log_rollback(undone.label(), skip_missing(undone.label(), result));
                }
                return Err(e);
            }
        }
        Ok(())
    }

    fn label(&self) -> &str {
        match &self.label {
            Some(label) => label,
            None => self.actions.first().map_or("", |a| a.label()),
        }
    }

    fn dispose(&mut self) {
        for action in &mut self.actions {
            action.dispose();
        }
    }

    fn modifies_content(&self) -> bool {
        self.actions.iter().any(|a| a.modifies_content())
    }
}
