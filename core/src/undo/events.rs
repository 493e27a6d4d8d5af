//! History change notifications.

use std::fmt;

use super::action::{UndoAction, UndoWorld};

/// What happened to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UndoEventKind {
    /// A new action was committed (recorded, added or executed).
    ActionDone,
    /// An action was undone.
    Undone,
    /// An action was redone.
    Redone,
}

/// A history notification.
///
/// `world` is the state right after the action took effect, so listeners can
/// resolve the objects the action touched.
pub struct UndoEvent<'a, W: UndoWorld> {
    pub kind: UndoEventKind,
    pub action: &'a dyn UndoAction<W>,
    pub world: &'a W,
}

impl<W: UndoWorld> fmt::Debug for UndoEvent<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoEvent")
            .field("kind", &self.kind)
            .field("action", &self.action.label())
            .finish()
    }
}

/// Callback registered with [`Undo::subscribe`](super::Undo::subscribe).
pub type UndoListener<W> = Box<dyn FnMut(&UndoEvent<'_, W>)>;

/// Handle returned by [`Undo::subscribe`](super::Undo::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) struct Listeners<W: UndoWorld> {
    next_id: u64,
    entries: Vec<(ListenerId, UndoListener<W>)>,
}

impl<W: UndoWorld> Listeners<W> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, listener: UndoListener<W>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Calls every listener in subscription order.
    pub(crate) fn emit(&mut self, kind: UndoEventKind, action: &dyn UndoAction<W>, world: &W) {
        let event = UndoEvent {
            kind,
            action,
            world,
        };
        for (_, listener) in &mut self.entries {
            listener(&event);
        }
    }
}
