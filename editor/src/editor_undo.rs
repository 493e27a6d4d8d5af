//! Undo engine wrapper that tracks which scenes have unsaved edits.
//!
//! Every commit, undo and redo marks the scenes the action touched as dirty.
//! Actions that implement [`SceneEditAction`](tessel_core::undo::SceneEditAction)
//! say which scenes those are. For the rest, field-diff and composite actions
//! are recognised by type and their target keys are mapped to scenes through
//! [`UndoWorld::owning_scene`]; anything else is assumed not to touch a scene.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use tessel_core::undo::{MultiAction, ObjectAction, Undo, UndoAction, UndoWorld};

use crate::play_state::PlayState;
use crate::settings::UndoSettings;

/// Scenes touched by `action`.
///
/// Uses the action's own scene-edit capability when present and falls back
/// to structural inspection otherwise. The result has no duplicates.
pub fn edited_scenes<W: UndoWorld>(action: &dyn UndoAction<W>, world: &W) -> Vec<W::SceneId> {
    let mut scenes = Vec::new();
    collect_scenes(action, world, &mut scenes);
    scenes
}

fn collect_scenes<W: UndoWorld>(action: &dyn UndoAction<W>, world: &W, out: &mut Vec<W::SceneId>) {
    let mut push = |scene: W::SceneId| {
        if !out.contains(&scene) {
            out.push(scene);
        }
    };

    if let Some(edit) = action.as_scene_edit() {
        edit.edited_scenes(world).into_iter().for_each(&mut push);
        return;
    }

    let any = action.as_any();
    if let Some(object) = any.downcast_ref::<ObjectAction<W>>() {
        if let Some(scene) = world.owning_scene(object.key()) {
            push(scene);
        }
    } else if let Some(multi) = any.downcast_ref::<MultiAction<W>>() {
        for child in multi.actions() {
            collect_scenes(child, world, out);
        }
    } else {
        log::debug!("'{}' does not report edited scenes", action.label());
    }
}

/// An [`Undo`] engine bound to the editor's scene-dirty state and play mode.
pub struct EditorUndo<W: UndoWorld> {
    undo: Undo<W>,
    dirty: Rc<RefCell<HashSet<W::SceneId>>>,
    settings: UndoSettings,
    play_state: PlayState,
}

impl<W: UndoWorld> EditorUndo<W> {
    pub fn new(settings: UndoSettings) -> Self {
        let mut undo = Undo::with_capacity(settings.capacity);
        undo.set_enabled(settings.enabled);

        let dirty: Rc<RefCell<HashSet<W::SceneId>>> = Rc::default();
        let sink = Rc::clone(&dirty);
        undo.subscribe(move |event| {
            let scenes = edited_scenes(event.action, event.world);
            if !scenes.is_empty() {
                log::trace!("'{}' dirtied {} scene(s)", event.action.label(), scenes.len());
            }
            sink.borrow_mut().extend(scenes);
        });

        Self {
            undo,
            dirty,
            settings,
            play_state: PlayState::Editing,
        }
    }

    pub fn undo(&self) -> &Undo<W> {
        &self.undo
    }

    /// Mutable access for recording and replay.
    ///
    /// Enabling is owned by [`apply_play_state`](Self::apply_play_state);
    /// toggling it directly is overridden on the next state change.
    pub fn undo_mut(&mut self) -> &mut Undo<W> {
        &mut self.undo
    }

    pub fn play_state(&self) -> PlayState {
        self.play_state
    }

    /// Follows an editor mode change, enabling or disabling history.
    pub fn apply_play_state(&mut self, state: PlayState) {
        self.play_state = state;
        let enabled =
            self.settings.enabled && (!self.settings.disable_during_play || state.allows_undo());
        self.undo.set_enabled(enabled);
    }

    /// Dirty scenes, in no particular order.
    pub fn dirty_scenes(&self) -> Vec<W::SceneId> {
        self.dirty.borrow().iter().cloned().collect()
    }

    pub fn is_scene_dirty(&self, scene: &W::SceneId) -> bool {
        self.dirty.borrow().contains(scene)
    }

    /// Clears the dirty flag after the scene was written to disk.
    pub fn mark_scene_saved(&mut self, scene: &W::SceneId) {
        self.dirty.borrow_mut().remove(scene);
    }

    /// Clears all dirty flags and moves the history save point.
    pub fn mark_all_saved(&mut self) {
        self.dirty.borrow_mut().clear();
        self.undo.mark_saved();
    }
}
