//! Bounded undo/redo stacks.
//!
//! [`UndoHistory`] keeps the done stack (undoable) and the undone stack
//! (redoable). Pushing a new action clears the undone stack, since redo after
//! a fresh edit would replay a diverged history. Every action the history
//! forgets, through eviction, redo clearing, [`clear`](UndoHistory::clear) or
//! drop, is [disposed](UndoAction::dispose) first.

use std::collections::VecDeque;
use std::fmt;

use super::action::{UndoAction, UndoActionError, UndoWorld};
use super::error::{UndoError, UndoResult};

/// Default number of undo steps kept.
pub const DEFAULT_CAPACITY: usize = 100;

/// Undo/redo stacks of boxed actions.
///
/// The done stack is a bounded [`VecDeque`]: once it holds more than
/// `capacity` entries the oldest is evicted from the front. The undone stack
/// is a plain [`Vec`] and can never outgrow the done stack.
pub struct UndoHistory<W: UndoWorld> {
    done: VecDeque<Box<dyn UndoAction<W>>>,
    undone: Vec<Box<dyn UndoAction<W>>>,
    capacity: usize,
    /// Distance from the saved state.
    ///
    /// - `Some(0)`: the current state is the saved one.
    /// - `Some(n)`, `n > 0`: `n` undos reach the saved state.
    /// - `Some(n)`, `n < 0`: `|n|` redos reach the saved state.
    /// - `None`: never saved, or the save point was evicted or discarded.
    save_distance: Option<i64>,
}

impl<W: UndoWorld> UndoHistory<W> {
    pub fn new(capacity: usize) -> Self {
        Self {
            done: VecDeque::new(),
            undone: Vec::new(),
            capacity,
            save_distance: Some(0),
        }
    }

    /// Pushes an already-performed action onto the done stack.
    ///
    /// Clears the undone stack and evicts the oldest entries past capacity.
    pub fn push(&mut self, action: Box<dyn UndoAction<W>>) {
        let is_content = action.modifies_content();

        if !self.undone.is_empty() {
            for mut dropped in self.undone.drain(..) {
                dropped.dispose();
            }
            // A save point that lived in the redo branch is gone.
            if is_content
                && let Some(d) = self.save_distance
                && d < 0
            {
                self.save_distance = None;
            }
        }

        if is_content && let Some(d) = &mut self.save_distance {
            *d += 1;
        }
        self.done.push_back(action);
        self.trim();
    }

    /// Undoes the most recent action and moves it to the undone stack.
    ///
    /// `notify` runs after the action was reverted, before it is moved.
    /// Returns `Ok(false)` when there is nothing to undo. A target that no
    /// longer exists is logged and skipped; on any other failure the action
    /// stays on the done stack.
    pub fn undo(
        &mut self,
        world: &mut W,
        notify: impl FnOnce(&dyn UndoAction<W>, &W),
    ) -> UndoResult<bool> {
        let Some(mut action) = self.done.pop_back() else {
            return Ok(false);
        };
        match action.undo(world) {
            Ok(()) => {}
            Err(UndoActionError::TargetNotFound(what)) => {
                log::warn!("undo '{}': {what} no longer exists, skipped", action.label());
            }
            Err(source) => {
                let label = action.label().to_owned();
                self.done.push_back(action);
                return Err(UndoError::Action { label, source });
            }
        }
        notify(action.as_ref(), &*world);
        if action.modifies_content()
            && let Some(d) = &mut self.save_distance
        {
            *d -= 1;
        }
        self.undone.push(action);
        Ok(true)
    }

    /// Re-applies the most recently undone action and moves it back to the
    /// done stack.
    ///
    /// `notify` runs after the action was applied, before it is moved.
    /// Returns `Ok(false)` when there is nothing to redo. Missing targets are
    /// skipped as in [`undo`](Self::undo); on any other failure the action
    /// stays on the undone stack.
    pub fn redo(
        &mut self,
        world: &mut W,
        notify: impl FnOnce(&dyn UndoAction<W>, &W),
    ) -> UndoResult<bool> {
        let Some(mut action) = self.undone.pop() else {
            return Ok(false);
        };
        match action.apply(world) {
            Ok(()) => {}
            Err(UndoActionError::TargetNotFound(what)) => {
                log::warn!("redo '{}': {what} no longer exists, skipped", action.label());
            }
            Err(source) => {
                let label = action.label().to_owned();
                self.undone.push(action);
                return Err(UndoError::Action { label, source });
            }
        }
        notify(action.as_ref(), &*world);
        if action.modifies_content()
            && let Some(d) = &mut self.save_distance
        {
            *d += 1;
        }
        self.done.push_back(action);
        self.trim();
        Ok(true)
    }

    fn trim(&mut self) {
        while self.done.len() > self.capacity {
            let Some(mut oldest) = self.done.pop_front() else {
                break;
            };
            log::trace!("evicting '{}' from undo history", oldest.label());
            oldest.dispose();
        }
        // A save point older than the oldest surviving entry is gone.
        if let Some(d) = self.save_distance
            && d > self.done.len() as i64
        {
            self.save_distance = None;
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the capacity, evicting the oldest entries immediately if the
    /// done stack is now too long.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.trim();
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.done.len()
    }

    pub fn redo_count(&self) -> usize {
        self.undone.len()
    }

    /// Undoable actions, most recent first.
    pub fn undo_actions(&self) -> impl Iterator<Item = &dyn UndoAction<W>> {
        self.done.iter().rev().map(|a| a.as_ref())
    }

    /// Redoable actions, most recent first.
    pub fn redo_actions(&self) -> impl Iterator<Item = &dyn UndoAction<W>> {
        self.undone.iter().rev().map(|a| a.as_ref())
    }

    /// Labels of undoable actions, most recent first.
    pub fn undo_labels(&self) -> impl Iterator<Item = &str> {
        self.done.iter().rev().map(|a| a.label())
    }

    /// Labels of redoable actions, most recent first.
    pub fn redo_labels(&self) -> impl Iterator<Item = &str> {
        self.undone.iter().rev().map(|a| a.label())
    }

    /// Label of the action [`undo`](Self::undo) would revert.
    pub fn first_undo_label(&self) -> Option<&str> {
        self.done.back().map(|a| a.label())
    }

    /// Label of the action [`redo`](Self::redo) would re-apply.
    pub fn first_redo_label(&self) -> Option<&str> {
        self.undone.last().map(|a| a.label())
    }

    /// Records the current state as the saved state.
    pub fn mark_saved(&mut self) {
        self.save_distance = Some(0);
    }

    /// Returns `true` if the current state differs from the last saved state,
    /// or if no save point is reachable.
    pub fn has_unsaved_changes(&self) -> bool {
        self.save_distance != Some(0)
    }

    /// Disposes and forgets every action on both stacks.
    ///
    /// Being at the save point survives a clear; any other save point is lost.
    pub fn clear(&mut self) {
        for mut action in self.done.drain(..).chain(self.undone.drain(..)) {
            action.dispose();
        }
        if self.save_distance != Some(0) {
            self.save_distance = None;
        }
    }
}

impl<W: UndoWorld> Default for UndoHistory<W> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<W: UndoWorld> Drop for UndoHistory<W> {
    fn drop(&mut self) {
        for action in self.done.iter_mut().chain(self.undone.iter_mut()) {
            action.dispose();
        }
    }
}

impl<W: UndoWorld> fmt::Debug for UndoHistory<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoHistory")
            .field("undo_count", &self.done.len())
            .field("redo_count", &self.undone.len())
            .field("capacity", &self.capacity)
            .field("save_distance", &self.save_distance)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::undo::action::UndoActionResult;
    use crate::undo::snapshot::Diffable;

    struct Counter {
        value: i32,
    }

    impl UndoWorld for Counter {
        type Key = ();
        type SceneId = ();

        fn resolve(&self, _key: &()) -> Option<&dyn Diffable> {
            None
        }

        fn resolve_mut(&mut self, _key: &()) -> Option<&mut dyn Diffable> {
            None
        }
    }

    #[derive(Debug)]
    struct Add {
        amount: i32,
        disposed: Rc<Cell<usize>>,
    }

    impl UndoAction<Counter> for Add {
        fn apply(&mut self, target: &mut Counter) -> UndoActionResult {
            target.value += self.amount;
            Ok(())
        }

        fn undo(&mut self, target: &mut Counter) -> UndoActionResult {
            target.value -= self.amount;
            Ok(())
        }

        fn label(&self) -> &str {
            "Add"
        }

        fn dispose(&mut self) {
            self.disposed.set(self.disposed.get() + 1);
        }
    }

    #[derive(Debug)]
    struct Select;

    impl UndoAction<Counter> for Select {
        fn apply(&mut self, _target: &mut Counter) -> UndoActionResult {
            Ok(())
        }

        fn undo(&mut self, _target: &mut Counter) -> UndoActionResult {
            Ok(())
        }

        fn label(&self) -> &str {
            "Select"
        }

        fn modifies_content(&self) -> bool {
            false
        }
    }

    #[derive(Debug)]
    struct FailingAction;

    impl UndoAction<Counter> for FailingAction {
        fn apply(&mut self, _target: &mut Counter) -> UndoActionResult {
            Err(UndoActionError::Custom("always fails".into()))
        }

        fn undo(&mut self, _target: &mut Counter) -> UndoActionResult {
            Err(UndoActionError::Custom("always fails".into()))
        }

        fn label(&self) -> &str {
            "Failing"
        }
    }

    /// Applies `amount` to the counter and records it, the way the engine
    /// does for actions performed before they reach the history.
    fn perform(history: &mut UndoHistory<Counter>, counter: &mut Counter, amount: i32) -> Rc<Cell<usize>> {
        let disposed = Rc::new(Cell::new(0));
        let mut action = Add {
            amount,
            disposed: disposed.clone(),
        };
        action.apply(counter).unwrap();
        history.push(Box::new(action));
        disposed
    }

    fn ignore(_: &dyn UndoAction<Counter>, _: &Counter) {}

    #[test]
    fn undo_reverses_and_moves_to_redo() {
        let mut history = UndoHistory::new(DEFAULT_CAPACITY);
        let mut counter = Counter { value: 0 };

        perform(&mut history, &mut counter, 5);
        assert!(history.undo(&mut counter, ignore).unwrap());

        assert_eq!(counter.value, 0);
        assert_eq!(history.undo_count(), 0);
        assert_eq!(history.redo_count(), 1);
    }

    #[test]
    fn redo_reapplies_and_moves_to_undo() {
        let mut history = UndoHistory::new(DEFAULT_CAPACITY);
        let mut counter = Counter { value: 0 };

        perform(&mut history, &mut counter, 5);
        history.undo(&mut counter, ignore).unwrap();
        assert!(history.redo(&mut counter, ignore).unwrap());

        assert_eq!(counter.value, 5);
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.redo_count(), 0);
    }

    #[test]
    fn push_clears_and_disposes_redo_stack() {
        let mut history = UndoHistory::new(DEFAULT_CAPACITY);
        let mut counter = Counter { value: 0 };

        let first = perform(&mut history, &mut counter, 5);
        history.undo(&mut counter, ignore).unwrap();
        assert!(history.can_redo());

        perform(&mut history, &mut counter, 3);
        assert!(!history.can_redo());
        assert_eq!(first.get(), 1);
        assert_eq!(counter.value, 3);
    }

    #[test]
    fn empty_stacks_are_a_no_op() {
        let mut history = UndoHistory::<Counter>::new(DEFAULT_CAPACITY);
        let mut counter = Counter { value: 0 };

        assert!(!history.undo(&mut counter, ignore).unwrap());
        assert!(!history.redo(&mut counter, ignore).unwrap());
    }

    #[test]
    fn capacity_evicts_and_disposes_oldest() {
        let mut history = UndoHistory::new(2);
        let mut counter = Counter { value: 0 };

        let a = perform(&mut history, &mut counter, 1);
        let b = perform(&mut history, &mut counter, 2);
        let c = perform(&mut history, &mut counter, 3);

        assert_eq!(history.undo_count(), 2);
        assert_eq!((a.get(), b.get(), c.get()), (1, 0, 0));

        history.undo(&mut counter, ignore).unwrap();
        history.undo(&mut counter, ignore).unwrap();
        assert_eq!(counter.value, 1);
        assert!(!history.can_undo());
    }

    #[test]
    fn shrinking_capacity_trims_immediately() {
        let mut history = UndoHistory::new(10);
        let mut counter = Counter { value: 0 };
        let handles: Vec<_> = (1..=4).map(|i| perform(&mut history, &mut counter, i)).collect();

        history.set_capacity(1);
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.capacity(), 1);
        let disposed: Vec<usize> = handles.iter().map(|h| h.get()).collect();
        assert_eq!(disposed, [1, 1, 1, 0]);
    }

    #[test]
    fn failed_undo_keeps_action_on_done_stack() {
        let mut history = UndoHistory::new(DEFAULT_CAPACITY);
        let mut counter = Counter { value: 0 };
        history.push(Box::new(FailingAction));

        let err = history.undo(&mut counter, ignore).unwrap_err();
        assert!(matches!(err, UndoError::Action { ref label, .. } if label == "Failing"));
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.redo_count(), 0);
    }

    #[derive(Debug)]
    struct Despawned;

    impl UndoAction<Counter> for Despawned {
        fn apply(&mut self, _target: &mut Counter) -> UndoActionResult {
            Err(UndoActionError::TargetNotFound("entity 3".into()))
        }

        fn undo(&mut self, _target: &mut Counter) -> UndoActionResult {
            Err(UndoActionError::TargetNotFound("entity 3".into()))
        }

        fn label(&self) -> &str {
            "Despawned"
        }
    }

    #[test]
    fn missing_target_is_skipped_not_fatal() {
        let mut history = UndoHistory::new(DEFAULT_CAPACITY);
        let mut counter = Counter { value: 0 };
        history.push(Box::new(Despawned));

        assert!(history.undo(&mut counter, ignore).unwrap());
        assert_eq!(history.redo_count(), 1);
        assert!(history.redo(&mut counter, ignore).unwrap());
        assert_eq!(history.undo_count(), 1);
    }

    #[test]
    fn notify_sees_reverted_state() {
        let mut history = UndoHistory::new(DEFAULT_CAPACITY);
        let mut counter = Counter { value: 0 };
        perform(&mut history, &mut counter, 4);

        let mut seen = None;
        history
            .undo(&mut counter, |action, world| {
                seen = Some((action.label().to_owned(), world.value));
            })
            .unwrap();
        assert_eq!(seen, Some(("Add".to_owned(), 0)));
    }

    #[test]
    fn labels_most_recent_first() {
        let mut history = UndoHistory::new(DEFAULT_CAPACITY);
        let mut counter = Counter { value: 0 };
        perform(&mut history, &mut counter, 1);
        history.push(Box::new(Select));
        perform(&mut history, &mut counter, 2);
        history.undo(&mut counter, ignore).unwrap();

        assert_eq!(history.undo_labels().collect::<Vec<_>>(), ["Select", "Add"]);
        assert_eq!(history.redo_labels().collect::<Vec<_>>(), ["Add"]);
        assert_eq!(history.first_undo_label(), Some("Select"));
        assert_eq!(history.first_redo_label(), Some("Add"));
        assert_eq!(history.undo_actions().count(), 2);
        assert_eq!(history.redo_actions().count(), 1);
    }

    #[test]
    fn clear_disposes_everything() {
        let mut history = UndoHistory::new(DEFAULT_CAPACITY);
        let mut counter = Counter { value: 0 };
        let a = perform(&mut history, &mut counter, 1);
        let b = perform(&mut history, &mut counter, 2);
        history.undo(&mut counter, ignore).unwrap();

        history.clear();
        assert_eq!((a.get(), b.get()), (1, 1));
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn drop_disposes_remaining_actions() {
        let mut counter = Counter { value: 0 };
        let handle = {
            let mut history = UndoHistory::new(DEFAULT_CAPACITY);
            perform(&mut history, &mut counter, 1)
        };
        assert_eq!(handle.get(), 1);
    }

    #[test]
    fn new_history_is_clean() {
        let history = UndoHistory::<Counter>::default();
        assert!(!history.has_unsaved_changes());
        assert_eq!(history.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn undo_back_to_save_point_is_clean() {
        let mut history = UndoHistory::new(DEFAULT_CAPACITY);
        let mut counter = Counter { value: 0 };
        perform(&mut history, &mut counter, 1);
        history.mark_saved();
        perform(&mut history, &mut counter, 2);
        assert!(history.has_unsaved_changes());

        history.undo(&mut counter, ignore).unwrap();
        assert!(!history.has_unsaved_changes());
        history.undo(&mut counter, ignore).unwrap();
        assert!(history.has_unsaved_changes());
        history.redo(&mut counter, ignore).unwrap();
        assert!(!history.has_unsaved_changes());
    }

    #[test]
    fn non_content_actions_keep_save_point() {
        let mut history = UndoHistory::new(DEFAULT_CAPACITY);
        history.mark_saved();
        history.push(Box::new(Select));
        assert!(!history.has_unsaved_changes());
    }

    #[test]
    fn discarded_redo_branch_loses_save_point() {
        let mut history = UndoHistory::new(DEFAULT_CAPACITY);
        let mut counter = Counter { value: 0 };
        perform(&mut history, &mut counter, 1);
        history.mark_saved();
        history.undo(&mut counter, ignore).unwrap();

        perform(&mut history, &mut counter, 7);
        history.undo(&mut counter, ignore).unwrap();
        assert!(history.has_unsaved_changes());
    }

    #[test]
    fn evicted_save_point_is_lost() {
        let mut history = UndoHistory::new(1);
        let mut counter = Counter { value: 0 };
        history.mark_saved();
        perform(&mut history, &mut counter, 1);
        perform(&mut history, &mut counter, 2);
        history.undo(&mut counter, ignore).unwrap();
        assert!(history.has_unsaved_changes());
    }

    #[test]
    fn clear_at_save_point_stays_clean() {
        let mut history = UndoHistory::new(DEFAULT_CAPACITY);
        let mut counter = Counter { value: 0 };
        perform(&mut history, &mut counter, 1);
        history.mark_saved();
        history.clear();
        assert!(!history.has_unsaved_changes());
    }
}
