//! Structural scene edits that a field diff cannot express.
//!
//! Each action is built by a `perform`/`new` constructor that carries out the
//! edit (or captures what it needs to), then handed to the undo engine. All of
//! them report their scene through [`SceneEditAction`], so scene-dirty
//! tracking never has to guess.

use tessel_core::undo::{SceneEditAction, UndoAction, UndoActionError, UndoActionResult};

use crate::scene::{Actor, ActorId, SceneId, SceneWorld, Transform};

/// Places a new actor in a scene.
#[derive(Debug)]
pub struct SpawnActorAction {
    id: ActorId,
    scene: SceneId,
    actor: Actor,
}

impl SpawnActorAction {
    /// Spawns `actor` in `scene` and returns the recorded action.
    pub fn perform(world: &mut SceneWorld, scene: SceneId, actor: Actor) -> UndoActionResult<Self> {
        if let Some(parent) = actor.parent
            && world.actor_scene(parent) != Some(scene)
        {
            return Err(UndoActionError::InvalidState(format!(
                "parent {} is not in the target scene",
                parent.0
            )));
        }
        let id = world
            .spawn_actor(scene, actor.clone())
            .ok_or_else(|| UndoActionError::TargetNotFound(format!("scene {}", scene.0)))?;
        Ok(Self { id, scene, actor })
    }

    pub fn id(&self) -> ActorId {
        self.id
    }
}

impl UndoAction<SceneWorld> for SpawnActorAction {
    fn apply(&mut self, world: &mut SceneWorld) -> UndoActionResult {
        if !world.insert_actor(self.id, self.scene, self.actor.clone()) {
            return Err(UndoActionError::InvalidState(format!(
                "actor {} already exists",
                self.id.0
            )));
        }
        Ok(())
    }

    fn undo(&mut self, world: &mut SceneWorld) -> UndoActionResult {
        let (_, actor) = world
            .remove_actor(self.id)
            .ok_or_else(|| UndoActionError::TargetNotFound("actor despawned".into()))?;
        // Keep field edits made after the spawn in sync for redo.
        self.actor = actor;
        Ok(())
    }

    fn label(&self) -> &str {
        "Spawn actor"
    }

    fn as_scene_edit(&self) -> Option<&dyn SceneEditAction<SceneWorld>> {
        Some(self)
    }
}

impl SceneEditAction<SceneWorld> for SpawnActorAction {
    fn edited_scenes(&self, _world: &SceneWorld) -> Vec<SceneId> {
        vec![self.scene]
    }
}

/// Removes an actor together with all of its descendants.
#[derive(Debug)]
pub struct DeleteActorAction {
    scene: SceneId,
    /// Removed actors, parents before children.
    removed: Vec<(ActorId, Actor)>,
}

impl DeleteActorAction {
    /// Deletes `id` and its subtree and returns the recorded action.
    pub fn perform(world: &mut SceneWorld, id: ActorId) -> UndoActionResult<Self> {
        let scene = world
            .actor_scene(id)
            .ok_or_else(|| UndoActionError::TargetNotFound(format!("actor {}", id.0)))?;
        let removed = world
            .subtree(id)
            .into_iter()
            .filter_map(|node| world.remove_actor(node).map(|(_, actor)| (node, actor)))
            .collect();
        Ok(Self { scene, removed })
    }

    /// Number of actors removed, the target included.
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

impl UndoAction<SceneWorld> for DeleteActorAction {
    fn apply(&mut self, world: &mut SceneWorld) -> UndoActionResult {
        for (id, actor) in &mut self.removed {
            if let Some((_, current)) = world.remove_actor(*id) {
                *actor = current;
            }
        }
        Ok(())
    }

    fn undo(&mut self, world: &mut SceneWorld) -> UndoActionResult {
        // Check everything first so a refused restore leaves the world untouched.
        if world.scene_name(self.scene).is_none() {
            return Err(UndoActionError::InvalidState(format!(
                "scene {} no longer exists",
                self.scene.0
            )));
        }
        if let Some((id, _)) = self.removed.iter().find(|(id, _)| world.contains_actor(*id)) {
            return Err(UndoActionError::InvalidState(format!(
                "cannot restore actor {}, id is taken",
                id.0
            )));
        }
        for (id, actor) in &self.removed {
            world.insert_actor(*id, self.scene, actor.clone());
        }
        Ok(())
    }

    fn label(&self) -> &str {
        "Delete actor"
    }

    fn dispose(&mut self) {
        self.removed.clear();
    }

    fn as_scene_edit(&self) -> Option<&dyn SceneEditAction<SceneWorld>> {
        Some(self)
    }
}

impl SceneEditAction<SceneWorld> for DeleteActorAction {
    fn edited_scenes(&self, _world: &SceneWorld) -> Vec<SceneId> {
        vec![self.scene]
    }
}

/// Moves an actor under a new parent (or to the scene root).
#[derive(Debug)]
pub struct ReparentAction {
    scene: SceneId,
    actor: ActorId,
    old_parent: Option<ActorId>,
    new_parent: Option<ActorId>,
}

impl ReparentAction {
    /// Reparents `actor` and returns the recorded action.
    ///
    /// Fails if the new parent lives in another scene or is `actor` itself or
    /// one of its descendants.
    pub fn perform(
        world: &mut SceneWorld,
        actor: ActorId,
        new_parent: Option<ActorId>,
    ) -> UndoActionResult<Self> {
        let scene = world
            .actor_scene(actor)
            .ok_or_else(|| UndoActionError::TargetNotFound(format!("actor {}", actor.0)))?;
        let old_parent = world.actor(actor).and_then(|a| a.parent);
        let mut action = Self {
            scene,
            actor,
            old_parent,
            new_parent,
        };
        action.apply(world)?;
        Ok(action)
    }
}

impl UndoAction<SceneWorld> for ReparentAction {
    fn apply(&mut self, world: &mut SceneWorld) -> UndoActionResult {
        set_parent(world, self.scene, self.actor, self.new_parent)
    }

    fn undo(&mut self, world: &mut SceneWorld) -> UndoActionResult {
        set_parent(world, self.scene, self.actor, self.old_parent)
    }

    fn label(&self) -> &str {
        "Reparent actor"
    }

    fn as_scene_edit(&self) -> Option<&dyn SceneEditAction<SceneWorld>> {
        Some(self)
    }
}

impl SceneEditAction<SceneWorld> for ReparentAction {
    fn edited_scenes(&self, _world: &SceneWorld) -> Vec<SceneId> {
        vec![self.scene]
    }
}

fn set_parent(
    world: &mut SceneWorld,
    scene: SceneId,
    actor: ActorId,
    parent: Option<ActorId>,
) -> UndoActionResult {
    if !world.contains_actor(actor) {
        return Err(UndoActionError::TargetNotFound("actor despawned".into()));
    }
    if let Some(p) = parent {
        if world.actor_scene(p) != Some(scene) {
            return Err(UndoActionError::TargetNotFound("parent despawned".into()));
        }
        if world.is_ancestor(actor, p) {
            return Err(UndoActionError::InvalidState(
                "cannot parent an actor under itself".into(),
            ));
        }
    }
    if let Some(target) = world.actor_mut(actor) {
        target.parent = parent;
    }
    Ok(())
}

/// Sets an actor's transform, remembering the previous one.
///
/// Meant for [`Undo::execute`](tessel_core::undo::Undo::execute): the
/// transform is written on the first apply.
#[derive(Debug)]
pub struct SetTransformAction {
    scene: SceneId,
    actor: ActorId,
    old: Transform,
    new: Transform,
}

impl SetTransformAction {
    pub fn new(world: &SceneWorld, actor: ActorId, new: Transform) -> UndoActionResult<Self> {
        let (scene, old) = world
            .actor_scene(actor)
            .zip(world.actor(actor).map(|a| a.transform))
            .ok_or_else(|| UndoActionError::TargetNotFound(format!("actor {}", actor.0)))?;
        Ok(Self {
            scene,
            actor,
            old,
            new,
        })
    }

    fn write(&self, world: &mut SceneWorld, transform: Transform) -> UndoActionResult {
        let target = world
            .actor_mut(self.actor)
            .ok_or_else(|| UndoActionError::TargetNotFound("actor despawned".into()))?;
        target.transform = transform;
        Ok(())
    }
}

impl UndoAction<SceneWorld> for SetTransformAction {
    fn apply(&mut self, world: &mut SceneWorld) -> UndoActionResult {
        self.write(world, self.new)
    }

    fn undo(&mut self, world: &mut SceneWorld) -> UndoActionResult {
        self.write(world, self.old)
    }

    fn label(&self) -> &str {
        "Set transform"
    }

    fn as_scene_edit(&self) -> Option<&dyn SceneEditAction<SceneWorld>> {
        Some(self)
    }
}

impl SceneEditAction<SceneWorld> for SetTransformAction {
    fn edited_scenes(&self, _world: &SceneWorld) -> Vec<SceneId> {
        vec![self.scene]
    }
}
