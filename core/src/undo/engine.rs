//! The undo engine: recording sessions, history and notifications.

use std::fmt;

use super::action::{UndoAction, UndoWorld};
use super::error::{UndoError, UndoResult};
use super::events::{ListenerId, Listeners, UndoEvent, UndoEventKind};
use super::history::{DEFAULT_CAPACITY, UndoHistory};
use super::multi_action::MultiAction;
use super::object_action::ObjectAction;
use super::snapshot::Snapshot;

type BoxedAction<W> = Box<dyn UndoAction<W>>;

/// An open single-object recording session.
struct Session<K> {
    label: String,
    key: K,
    snapshot: Snapshot,
}

/// An open multi-object recording session, one baseline per subject.
struct MultiSession<K> {
    label: String,
    entries: Vec<(K, Snapshot)>,
}

/// Undo/redo manager for one editing world.
///
/// Edits are recorded in one of three ways:
///
/// - **Field recording**: [`record_begin`](Self::record_begin) snapshots an
///   object, the caller mutates it, [`record_end`](Self::record_end) diffs
///   the object against the snapshot and commits an [`ObjectAction`].
///   [`record_multi_begin`](Self::record_multi_begin) does the same for a
///   list of objects.
/// - **Pre-built actions**: [`add_action`](Self::add_action) commits an
///   action whose effect already happened (spawn, delete, reparent).
/// - **Execute**: [`execute`](Self::execute) applies an action, then
///   commits it.
///
/// Committing clears the redo stack and notifies subscribers. While the
/// engine is [disabled](Self::set_enabled) every recording and replay call
/// is a no-op returning `Ok(false)`.
///
/// Call-pairing mistakes (double begin, end without begin, empty subject
/// lists) come back as `Err` and leave the open sessions untouched.
///
/// # Example
///
/// ```ignore
/// let mut undo = Undo::new();
/// undo.record_begin(&world, actor, "Rename actor")?;
/// world.actor_mut(actor).name = "Lamp".into();
/// undo.record_end(&mut world, Some(&actor))?;
///
/// undo.perform_undo(&mut world)?;
/// ```
pub struct Undo<W: UndoWorld> {
    history: UndoHistory<W>,
    sessions: Vec<Session<W::Key>>,
    multi_sessions: Vec<MultiSession<W::Key>>,
    enabled: bool,
    listeners: Listeners<W>,
}

impl<W: UndoWorld> Undo<W> {
    /// Creates an enabled engine keeping [`DEFAULT_CAPACITY`] undo steps.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            history: UndoHistory::new(capacity),
            sessions: Vec::new(),
            multi_sessions: Vec::new(),
            enabled: true,
            listeners: Listeners::new(),
        }
    }

    // ---- recording ----

    /// Opens a recording session for `key`, snapshotting its current fields.
    ///
    /// Returns `Ok(false)` when disabled. Fails with
    /// [`UndoError::AlreadyRecording`] if `key` already has an open session
    /// and with [`UndoError::ObjectNotFound`] if it does not resolve.
    pub fn record_begin(
        &mut self,
        world: &W,
        key: W::Key,
        label: impl Into<String>,
    ) -> UndoResult<bool> {
        if !self.enabled {
            return Ok(false);
        }
        if self.find_single(Some(&key)).is_some() {
            return Err(UndoError::AlreadyRecording(format!("{key:?}")));
        }
        let target = world
            .resolve(&key)
            .ok_or_else(|| UndoError::ObjectNotFound(format!("{key:?}")))?;
        let snapshot = Snapshot::capture(target)?;
        let label = label.into();
        log::trace!("recording '{label}' on {key:?}");
        self.sessions.push(Session {
            label,
            key,
            snapshot,
        });
        Ok(true)
    }

    /// Closes the session for `key` (or the most recently opened
    /// single-object session when `None`) and commits its diff.
    ///
    /// Returns `Ok(true)` if an action was committed. An unchanged object
    /// commits nothing.
    pub fn record_end(&mut self, world: &mut W, key: Option<&W::Key>) -> UndoResult<bool> {
        self.record_end_with(world, key, None, None)
    }

    /// Like [`record_end`](Self::record_end), wrapping the diff between
    /// `before` and `after` into one composite action, in that order.
    ///
    /// `before` and `after` describe effects that already happened alongside
    /// the field edit. When nothing is committed they are disposed.
    pub fn record_end_with(
        &mut self,
        world: &mut W,
        key: Option<&W::Key>,
        before: Option<BoxedAction<W>>,
        after: Option<BoxedAction<W>>,
    ) -> UndoResult<bool> {
        let index = self.find_single(key);
        if !self.enabled {
            if let Some(index) = index {
                self.sessions.remove(index);
            }
            dispose_all(before.into_iter().chain(after));
            return Ok(false);
        }
        let Some(index) = index else {
            dispose_all(before.into_iter().chain(after));
            return Err(UndoError::NoSession(describe(key)));
        };
        let Session {
            label,
            key,
            snapshot,
        } = self.sessions.remove(index);

        let Some(target) = world.resolve(&key) else {
            log::warn!("'{label}': {key:?} was deleted while recording, nothing recorded");
            dispose_all(before.into_iter().chain(after));
            return Ok(false);
        };
        let diff = match snapshot.compare(target) {
            Ok(diff) => diff,
            Err(e) => {
                dispose_all(before.into_iter().chain(after));
                return Err(e.into());
            }
        };
        if diff.is_empty() {
            log::trace!("'{label}': no changes on {key:?}");
            dispose_all(before.into_iter().chain(after));
            return Ok(false);
        }

        let core: BoxedAction<W> = Box::new(ObjectAction::new(key, label.clone(), diff));
        let action = compose(label, before, vec![core], after)?;
        self.commit(action, world);
        Ok(true)
    }

    /// Opens one recording session covering every object in `keys`.
    ///
    /// Fails with [`UndoError::EmptySubjects`] for an empty list,
    /// [`UndoError::AlreadyRecording`] if the same list is already being
    /// recorded and [`UndoError::ObjectNotFound`] if any key does not
    /// resolve.
    pub fn record_multi_begin(
        &mut self,
        world: &W,
        keys: Vec<W::Key>,
        label: impl Into<String>,
    ) -> UndoResult<bool> {
        if !self.enabled {
            return Ok(false);
        }
        if keys.is_empty() {
            return Err(UndoError::EmptySubjects);
        }
        if self.find_multi(Some(keys.as_slice())).is_some() {
            return Err(UndoError::AlreadyRecording(format!("{keys:?}")));
        }
        let entries = keys
            .into_iter()
            .map(|key| {
                let target = world
                    .resolve(&key)
                    .ok_or_else(|| UndoError::ObjectNotFound(format!("{key:?}")))?;
                let snapshot = Snapshot::capture(target)?;
                Ok((key, snapshot))
            })
            .collect::<UndoResult<Vec<_>>>()?;
        let label = label.into();
        log::trace!("recording '{label}' on {} objects", entries.len());
        self.multi_sessions.push(MultiSession { label, entries });
        Ok(true)
    }

    /// Closes the multi-object session for `keys` (or the most recent one
    /// when `None`) and commits the changed objects.
    ///
    /// Unchanged objects are dropped. A single changed object commits a
    /// plain [`ObjectAction`]; several commit a [`MultiAction`]. Objects
    /// deleted while recording are skipped with a warning.
    pub fn record_multi_end(&mut self, world: &mut W, keys: Option<&[W::Key]>) -> UndoResult<bool> {
        self.record_multi_end_with(world, keys, None, None)
    }

    /// Like [`record_multi_end`](Self::record_multi_end), wrapping the diffs
    /// between `before` and `after`.
    pub fn record_multi_end_with(
        &mut self,
        world: &mut W,
        keys: Option<&[W::Key]>,
        before: Option<BoxedAction<W>>,
        after: Option<BoxedAction<W>>,
    ) -> UndoResult<bool> {
        let index = self.find_multi(keys);
        if !self.enabled {
            if let Some(index) = index {
                self.multi_sessions.remove(index);
            }
            dispose_all(before.into_iter().chain(after));
            return Ok(false);
        }
        let Some(index) = index else {
            dispose_all(before.into_iter().chain(after));
            return Err(UndoError::NoSession(describe(keys)));
        };
        let MultiSession { label, entries } = self.multi_sessions.remove(index);

        let mut changed: Vec<BoxedAction<W>> = Vec::new();
        for (key, snapshot) in entries {
            let Some(target) = world.resolve(&key) else {
                log::warn!("'{label}': {key:?} was deleted while recording, skipped");
                continue;
            };
            let diff = match snapshot.compare(target) {
                Ok(diff) => diff,
                Err(e) => {
                    dispose_all(changed.into_iter().chain(before).chain(after));
                    return Err(e.into());
                }
            };
            if !diff.is_empty() {
                changed.push(Box::new(ObjectAction::new(key, label.clone(), diff)));
            }
        }
        if changed.is_empty() {
            log::trace!("'{label}': no changes");
            dispose_all(before.into_iter().chain(after));
            return Ok(false);
        }

        let action = compose(label, before, changed, after)?;
        self.commit(action, world);
        Ok(true)
    }

    /// Abandons the single-object session for `key` (or the most recent one)
    /// without recording anything. Returns `false` if no session matched.
    pub fn cancel_recording(&mut self, key: Option<&W::Key>) -> bool {
        match self.find_single(key) {
            Some(index) => {
                let session = self.sessions.remove(index);
                log::trace!("cancelled recording '{}'", session.label);
                true
            }
            None => false,
        }
    }

    /// Abandons the multi-object session for `keys` (or the most recent one).
    pub fn cancel_multi_recording(&mut self, keys: Option<&[W::Key]>) -> bool {
        match self.find_multi(keys) {
            Some(index) => {
                let session = self.multi_sessions.remove(index);
                log::trace!("cancelled recording '{}'", session.label);
                true
            }
            None => false,
        }
    }

    /// Returns `true` while any recording session is open.
    pub fn is_recording(&self) -> bool {
        !self.sessions.is_empty() || !self.multi_sessions.is_empty()
    }

    /// Number of open recording sessions.
    pub fn open_sessions(&self) -> usize {
        self.sessions.len() + self.multi_sessions.len()
    }

    fn find_single(&self, key: Option<&W::Key>) -> Option<usize> {
        self.sessions
            .iter()
            .rposition(|s| key.is_none_or(|want| *want == s.key))
    }

    fn find_multi(&self, keys: Option<&[W::Key]>) -> Option<usize> {
        self.multi_sessions.iter().rposition(|s| {
            keys.is_none_or(|want| {
                want.len() == s.entries.len()
                    && want.iter().zip(&s.entries).all(|(a, (b, _))| a == b)
            })
        })
    }

    // ---- committing ----

    /// Commits an action whose effect has already been applied to the world.
    ///
    /// Used for edits a field diff cannot express, such as spawning,
    /// deleting or reparenting. While disabled the action is disposed and
    /// `Ok(false)` is returned.
    pub fn add_action(&mut self, world: &W, mut action: BoxedAction<W>) -> UndoResult<bool> {
        if !self.enabled {
            action.dispose();
            return Ok(false);
        }
        self.commit(action, world);
        Ok(true)
    }

    /// Applies `action` to the world, then commits it.
    ///
    /// A failed apply commits nothing; the action is disposed and the error
    /// returned.
    pub fn execute(&mut self, world: &mut W, mut action: BoxedAction<W>) -> UndoResult<bool> {
        if !self.enabled {
            action.dispose();
            return Ok(false);
        }
        if let Err(source) = action.apply(world) {
            let label = action.label().to_owned();
            action.dispose();
            return Err(UndoError::Action { label, source });
        }
        self.commit(action, world);
        Ok(true)
    }

    fn commit(&mut self, action: BoxedAction<W>, world: &W) {
        log::debug!("committed '{}'", action.label());
        self.listeners
            .emit(UndoEventKind::ActionDone, action.as_ref(), world);
        self.history.push(action);
    }

    // ---- replay ----

    /// Undoes the most recent action.
    ///
    /// Returns `Ok(false)` when disabled or when there is nothing to undo.
    pub fn perform_undo(&mut self, world: &mut W) -> UndoResult<bool> {
        if !self.enabled {
            return Ok(false);
        }
        let listeners = &mut self.listeners;
        self.history.undo(world, |action, world| {
            log::debug!("undo '{}'", action.label());
            listeners.emit(UndoEventKind::Undone, action, world);
        })
    }

    /// Redoes the most recently undone action.
    ///
    /// Returns `Ok(false)` when disabled or when there is nothing to redo.
    pub fn perform_redo(&mut self, world: &mut W) -> UndoResult<bool> {
        if !self.enabled {
            return Ok(false);
        }
        let listeners = &mut self.listeners;
        self.history.redo(world, |action, world| {
            log::debug!("redo '{}'", action.label());
            listeners.emit(UndoEventKind::Redone, action, world);
        })
    }

    // ---- state ----

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables the engine. History and open sessions are kept.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            log::debug!("undo {}", if enabled { "enabled" } else { "disabled" });
        }
        self.enabled = enabled;
    }

    pub fn capacity(&self) -> usize {
        self.history.capacity()
    }

    /// Changes how many undo steps are kept, evicting the oldest at once.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.history.set_capacity(capacity);
    }

    /// Whether the Undo menu item should be enabled.
    pub fn can_undo(&self) -> bool {
        self.enabled && self.history.can_undo()
    }

    /// Whether the Redo menu item should be enabled.
    pub fn can_redo(&self) -> bool {
        self.enabled && self.history.can_redo()
    }

    pub fn first_undo_label(&self) -> Option<&str> {
        self.history.first_undo_label()
    }

    pub fn first_redo_label(&self) -> Option<&str> {
        self.history.first_redo_label()
    }

    /// Read access to the stacks, for history views.
    pub fn history(&self) -> &UndoHistory<W> {
        &self.history
    }

    /// Disposes the whole history. Open sessions are kept.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.history.has_unsaved_changes()
    }

    // ---- notifications ----

    /// Registers a listener called for every commit, undo and redo.
    pub fn subscribe(&mut self, listener: impl FnMut(&UndoEvent<'_, W>) + 'static) -> ListenerId {
        self.listeners.add(Box::new(listener))
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

impl<W: UndoWorld> Default for Undo<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: UndoWorld> fmt::Debug for Undo<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Undo")
            .field("enabled", &self.enabled)
            .field("open_sessions", &self.open_sessions())
            .field("listeners", &self.listeners.len())
            .field("history", &self.history)
            .finish()
    }
}

fn describe<T: fmt::Debug + ?Sized>(subject: Option<&T>) -> String {
    subject.map_or_else(|| "the most recent subject".to_owned(), |s| format!("{s:?}"))
}

fn dispose_all<W: UndoWorld>(actions: impl IntoIterator<Item = BoxedAction<W>>) {
    for mut action in actions {
        action.dispose();
    }
}

/// Wraps `core` between the optional custom actions.
///
/// A lone core action without customs is returned as is.
fn compose<W: UndoWorld>(
    label: String,
    before: Option<BoxedAction<W>>,
    mut core: Vec<BoxedAction<W>>,
    after: Option<BoxedAction<W>>,
) -> UndoResult<BoxedAction<W>> {
    if before.is_none()
        && after.is_none()
        && core.len() == 1
        && let Some(single) = core.pop()
    {
        return Ok(single);
    }
    let actions = before.into_iter().chain(core).chain(after).collect();
    Ok(Box::new(MultiAction::with_label(label, actions)?))
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::undo::action::UndoActionResult;
    use crate::undo::snapshot::{Diffable, Restore};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Crate {
        label: String,
        weight: f32,
    }

    impl Restore for Crate {}

    #[derive(Default)]
    struct Yard {
        crates: HashMap<u32, Crate>,
    }

    impl Yard {
        fn with(ids: &[u32]) -> Self {
            let crates = ids
                .iter()
                .map(|&id| {
                    (
                        id,
                        Crate {
                            label: format!("crate {id}"),
                            weight: 1.0,
                        },
                    )
                })
                .collect();
            Self { crates }
        }

        fn get(&mut self, id: u32) -> &mut Crate {
            self.crates.get_mut(&id).unwrap()
        }
    }

    impl UndoWorld for Yard {
        type Key = u32;
        type SceneId = ();

        fn resolve(&self, key: &u32) -> Option<&dyn Diffable> {
            self.crates.get(key).map(|c| c as &dyn Diffable)
        }

        fn resolve_mut(&mut self, key: &u32) -> Option<&mut dyn Diffable> {
            self.crates.get_mut(key).map(|c| c as &mut dyn Diffable)
        }
    }

    #[derive(Debug)]
    struct Marker {
        name: &'static str,
        disposed: Rc<Cell<usize>>,
    }

    impl UndoAction<Yard> for Marker {
        fn apply(&mut self, _world: &mut Yard) -> UndoActionResult {
            Ok(())
        }

        fn undo(&mut self, _world: &mut Yard) -> UndoActionResult {
            Ok(())
        }

        fn label(&self) -> &str {
            self.name
        }

        fn dispose(&mut self) {
            self.disposed.set(self.disposed.get() + 1);
        }
    }

    fn marker(name: &'static str, disposed: &Rc<Cell<usize>>) -> BoxedAction<Yard> {
        Box::new(Marker {
            name,
            disposed: disposed.clone(),
        })
    }

    #[test]
    fn record_then_undo_restores_fields() {
        let mut yard = Yard::with(&[1]);
        let mut undo = Undo::new();

        undo.record_begin(&yard, 1, "Relabel").unwrap();
        yard.get(1).label = "fragile".into();
        assert!(undo.record_end(&mut yard, Some(&1)).unwrap());

        assert_eq!(undo.first_undo_label(), Some("Relabel"));
        undo.perform_undo(&mut yard).unwrap();
        assert_eq!(yard.get(1).label, "crate 1");
        undo.perform_redo(&mut yard).unwrap();
        assert_eq!(yard.get(1).label, "fragile");
    }

    #[test]
    fn unchanged_object_records_nothing() {
        let mut yard = Yard::with(&[1]);
        let mut undo = Undo::new();

        undo.record_begin(&yard, 1, "Nothing").unwrap();
        assert!(!undo.record_end(&mut yard, None).unwrap());
        assert!(!undo.can_undo());
        assert!(!undo.is_recording());
    }

    #[test]
    fn double_begin_keeps_first_session() {
        let mut yard = Yard::with(&[1]);
        let mut undo = Undo::new();

        undo.record_begin(&yard, 1, "First").unwrap();
        yard.get(1).weight = 2.0;
        let err = undo.record_begin(&yard, 1, "Second").unwrap_err();
        assert!(matches!(err, UndoError::AlreadyRecording(_)));
        assert_eq!(undo.open_sessions(), 1);

        undo.record_end(&mut yard, Some(&1)).unwrap();
        assert_eq!(undo.first_undo_label(), Some("First"));
    }

    #[test]
    fn end_without_begin_is_an_error() {
        let mut yard = Yard::with(&[1]);
        let mut undo = Undo::new();
        assert!(matches!(
            undo.record_end(&mut yard, Some(&1)),
            Err(UndoError::NoSession(_))
        ));
        assert!(matches!(
            undo.record_multi_end(&mut yard, None),
            Err(UndoError::NoSession(_))
        ));
    }

    #[test]
    fn begin_on_missing_object_fails() {
        let yard = Yard::with(&[1]);
        let mut undo = Undo::new();
        assert!(matches!(
            undo.record_begin(&yard, 9, "Ghost"),
            Err(UndoError::ObjectNotFound(_))
        ));
        assert!(matches!(
            undo.record_multi_begin(&yard, vec![1, 9], "Ghosts"),
            Err(UndoError::ObjectNotFound(_))
        ));
        assert!(matches!(
            undo.record_multi_begin(&yard, Vec::new(), "Nobody"),
            Err(UndoError::EmptySubjects)
        ));
        assert!(!undo.is_recording());
    }

    #[test]
    fn end_without_key_closes_most_recent() {
        let mut yard = Yard::with(&[1, 2]);
        let mut undo = Undo::new();

        undo.record_begin(&yard, 1, "Outer").unwrap();
        undo.record_begin(&yard, 2, "Inner").unwrap();
        yard.get(1).weight = 5.0;
        yard.get(2).weight = 6.0;

        undo.record_end(&mut yard, None).unwrap();
        assert_eq!(undo.first_undo_label(), Some("Inner"));
        undo.record_end(&mut yard, None).unwrap();
        assert_eq!(undo.first_undo_label(), Some("Outer"));
    }

    #[test]
    fn custom_actions_wrap_the_diff() {
        let mut yard = Yard::with(&[1]);
        let mut undo = Undo::new();
        let disposed = Rc::new(Cell::new(0));

        undo.record_begin(&yard, 1, "Weigh").unwrap();
        yard.get(1).weight = 3.0;
        undo.record_end_with(
            &mut yard,
            None,
            Some(marker("before", &disposed)),
            Some(marker("after", &disposed)),
        )
        .unwrap();

        let top = undo.history().undo_actions().next().unwrap();
        let multi = top.as_any().downcast_ref::<MultiAction<Yard>>().unwrap();
        let labels: Vec<&str> = multi.actions().map(|a| a.label()).collect();
        assert_eq!(labels, ["before", "Weigh", "after"]);
        assert_eq!(multi.label(), "Weigh");
    }

    #[test]
    fn custom_actions_disposed_when_nothing_changed() {
        let mut yard = Yard::with(&[1]);
        let mut undo = Undo::new();
        let disposed = Rc::new(Cell::new(0));

        undo.record_begin(&yard, 1, "Nothing").unwrap();
        let recorded = undo
            .record_end_with(&mut yard, None, Some(marker("before", &disposed)), None)
            .unwrap();
        assert!(!recorded);
        assert_eq!(disposed.get(), 1);
    }

    #[test]
    fn disabled_engine_is_inert() {
        let mut yard = Yard::with(&[1]);
        let mut undo = Undo::new();
        let disposed = Rc::new(Cell::new(0));
        undo.set_enabled(false);

        assert!(!undo.record_begin(&yard, 1, "Ignored").unwrap());
        yard.get(1).weight = 9.0;
        assert!(!undo.record_end(&mut yard, None).unwrap());
        assert!(!undo.add_action(&yard, marker("added", &disposed)).unwrap());
        assert!(!undo.perform_undo(&mut yard).unwrap());
        assert!(!undo.can_undo());
        assert_eq!(disposed.get(), 1);
    }

    #[test]
    fn disabling_mid_session_discards_it() {
        let mut yard = Yard::with(&[1]);
        let mut undo = Undo::new();

        undo.record_begin(&yard, 1, "Play").unwrap();
        undo.set_enabled(false);
        yard.get(1).weight = 9.0;
        assert!(!undo.record_end(&mut yard, Some(&1)).unwrap());
        assert!(!undo.is_recording());

        undo.set_enabled(true);
        assert!(!undo.can_undo());
    }

    #[test]
    fn multi_end_with_one_change_is_unwrapped() {
        let mut yard = Yard::with(&[1, 2]);
        let mut undo = Undo::new();

        undo.record_multi_begin(&yard, vec![1, 2], "Nudge").unwrap();
        yard.get(2).weight = 4.0;
        undo.record_multi_end(&mut yard, None).unwrap();

        let top = undo.history().undo_actions().next().unwrap();
        let object = top.as_any().downcast_ref::<ObjectAction<Yard>>().unwrap();
        assert_eq!(*object.key(), 2);
    }

    #[test]
    fn multi_end_skips_deleted_subjects() {
        let mut yard = Yard::with(&[1, 2]);
        let mut undo = Undo::new();

        undo.record_multi_begin(&yard, vec![1, 2], "Edit").unwrap();
        yard.get(1).weight = 4.0;
        yard.crates.remove(&2);
        assert!(undo.record_multi_end(&mut yard, Some(&[1, 2][..])).unwrap());

        undo.perform_undo(&mut yard).unwrap();
        assert_eq!(yard.get(1).weight, 1.0);
    }

    #[test]
    fn cancel_drops_session_without_recording() {
        let mut yard = Yard::with(&[1, 2]);
        let mut undo = Undo::new();

        undo.record_begin(&yard, 1, "Drag").unwrap();
        undo.record_multi_begin(&yard, vec![1, 2], "Box drag").unwrap();
        yard.get(1).weight = 8.0;

        assert!(undo.cancel_recording(Some(&1)));
        assert!(undo.cancel_multi_recording(None));
        assert!(!undo.cancel_recording(None));
        assert!(!undo.is_recording());
        assert!(!undo.can_undo());
    }

    #[test]
    fn execute_applies_before_commit() {
        #[derive(Debug)]
        struct Heavier(u32);

        impl UndoAction<Yard> for Heavier {
            fn apply(&mut self, world: &mut Yard) -> UndoActionResult {
                world.get(self.0).weight *= 2.0;
                Ok(())
            }

            fn undo(&mut self, world: &mut Yard) -> UndoActionResult {
                world.get(self.0).weight /= 2.0;
                Ok(())
            }

            fn label(&self) -> &str {
                "Heavier"
            }
        }

        let mut yard = Yard::with(&[1]);
        let mut undo = Undo::new();
        undo.execute(&mut yard, Box::new(Heavier(1))).unwrap();
        assert_eq!(yard.get(1).weight, 2.0);
        undo.perform_undo(&mut yard).unwrap();
        assert_eq!(yard.get(1).weight, 1.0);
    }

    #[test]
    fn listeners_see_every_event() {
        let mut yard = Yard::with(&[1]);
        let mut undo = Undo::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let id = undo.subscribe(move |event| {
            sink.borrow_mut()
                .push((event.kind, event.action.label().to_owned()));
        });

        undo.record_begin(&yard, 1, "Edit").unwrap();
        yard.get(1).weight = 2.0;
        undo.record_end(&mut yard, None).unwrap();
        undo.perform_undo(&mut yard).unwrap();
        undo.perform_redo(&mut yard).unwrap();

        assert_eq!(
            *events.borrow(),
            [
                (UndoEventKind::ActionDone, "Edit".to_owned()),
                (UndoEventKind::Undone, "Edit".to_owned()),
                (UndoEventKind::Redone, "Edit".to_owned()),
            ]
        );

        assert!(undo.unsubscribe(id));
        assert!(!undo.unsubscribe(id));
        undo.perform_undo(&mut yard).unwrap();
        assert_eq!(events.borrow().len(), 3);
    }

    #[test]
    fn saved_state_follows_history() {
        let mut yard = Yard::with(&[1]);
        let mut undo = Undo::new();
        undo.mark_saved();

        undo.record_begin(&yard, 1, "Edit").unwrap();
        yard.get(1).weight = 2.0;
        undo.record_end(&mut yard, None).unwrap();
        assert!(undo.has_unsaved_changes());

        undo.perform_undo(&mut yard).unwrap();
        assert!(!undo.has_unsaved_changes());
    }
}
