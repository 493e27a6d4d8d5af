//! In-memory scene model edited through the undo engine.
//!
//! A [`SceneWorld`] holds any number of scenes, the actors placed in them and
//! scene-less asset import settings. Actors and assets are plain serde types,
//! so every field edit can be recorded by snapshot diffing.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tessel_core::undo::{Diffable, Restore, UndoWorld};

/// Identity of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(pub u32);

/// Identity of an actor. Stable across delete and undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

/// Identity of an asset's import settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u32);

/// Anything the undo engine can snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectId {
    Actor(ActorId),
    Asset(AssetId),
}

impl From<ActorId> for ObjectId {
    fn from(id: ActorId) -> Self {
        Self::Actor(id)
    }
}

impl From<AssetId> for ObjectId {
    fn from(id: AssetId) -> Self {
        Self::Asset(id)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actor(id) => write!(f, "actor {}", id.0),
            Self::Asset(id) => write!(f, "asset {}", id.0),
        }
    }
}

/// Local transform: translation, rotation quaternion (x, y, z, w), scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0; 3],
    };

    pub fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A placed object in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub transform: Transform,
    pub parent: Option<ActorId>,
    pub enabled: bool,
    pub tags: Vec<String>,
}

impl Restore for Actor {}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            parent: None,
            enabled: true,
            tags: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Texture compression used when importing an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compression {
    None,
    Bc7,
    Astc { block: u8 },
}

/// Import settings of an asset. Not owned by any scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSettings {
    pub path: String,
    pub max_size: u32,
    pub srgb: bool,
    pub compression: Compression,
}

impl Restore for AssetSettings {}

impl AssetSettings {
    pub fn texture(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            max_size: 2048,
            srgb: true,
            compression: Compression::Bc7,
        }
    }
}

#[derive(Debug, Clone)]
struct ActorSlot {
    scene: SceneId,
    actor: Actor,
}

/// Scenes, actors and assets of an editing session.
#[derive(Debug, Default)]
pub struct SceneWorld {
    scenes: BTreeMap<SceneId, String>,
    actors: BTreeMap<ActorId, ActorSlot>,
    assets: BTreeMap<AssetId, AssetSettings>,
    next_scene: u32,
    next_actor: u32,
    next_asset: u32,
}

impl SceneWorld {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- scenes ----

    pub fn add_scene(&mut self, name: impl Into<String>) -> SceneId {
        let id = SceneId(self.next_scene);
        self.next_scene += 1;
        self.scenes.insert(id, name.into());
        id
    }

    pub fn scene_name(&self, id: SceneId) -> Option<&str> {
        self.scenes.get(&id).map(String::as_str)
    }

    pub fn scene_ids(&self) -> impl Iterator<Item = SceneId> + '_ {
        self.scenes.keys().copied()
    }

    /// Actors placed in `scene`, in id order.
    pub fn actors_in(&self, scene: SceneId) -> impl Iterator<Item = ActorId> + '_ {
        self.actors
            .iter()
            .filter(move |(_, slot)| slot.scene == scene)
            .map(|(id, _)| *id)
    }

    // ---- actors ----

    /// Places a new actor in `scene` and returns its id.
    ///
    /// Returns `None` if the scene does not exist.
    pub fn spawn_actor(&mut self, scene: SceneId, actor: Actor) -> Option<ActorId> {
        if !self.scenes.contains_key(&scene) {
            return None;
        }
        let id = ActorId(self.next_actor);
        self.next_actor += 1;
        self.actors.insert(id, ActorSlot { scene, actor });
        Some(id)
    }

    /// Puts an actor back under a known id, e.g. when undoing its deletion.
    ///
    /// Returns `false` if the id is taken or the scene does not exist.
    pub fn insert_actor(&mut self, id: ActorId, scene: SceneId, actor: Actor) -> bool {
        if self.actors.contains_key(&id) || !self.scenes.contains_key(&scene) {
            return false;
        }
        self.next_actor = self.next_actor.max(id.0 + 1);
        self.actors.insert(id, ActorSlot { scene, actor });
        true
    }

    /// Removes an actor, returning its scene and data.
    pub fn remove_actor(&mut self, id: ActorId) -> Option<(SceneId, Actor)> {
        self.actors.remove(&id).map(|slot| (slot.scene, slot.actor))
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id).map(|slot| &slot.actor)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id).map(|slot| &mut slot.actor)
    }

    pub fn actor_scene(&self, id: ActorId) -> Option<SceneId> {
        self.actors.get(&id).map(|slot| slot.scene)
    }

    pub fn contains_actor(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Direct children of `id`.
    pub fn children(&self, id: ActorId) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|(_, slot)| slot.actor.parent == Some(id))
            .map(|(child, _)| *child)
            .collect()
    }

    /// `id` followed by all of its descendants, parents before children.
    pub fn subtree(&self, id: ActorId) -> Vec<ActorId> {
        let mut out = vec![id];
        let mut i = 0;
        while i < out.len() {
            out.extend(self.children(out[i]));
            i += 1;
        }
        out
    }

    /// Returns `true` if `ancestor` is `id` or one of its parents.
    pub fn is_ancestor(&self, ancestor: ActorId, id: ActorId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.actor(node).and_then(|a| a.parent);
        }
        false
    }

    // ---- assets ----

    pub fn add_asset(&mut self, settings: AssetSettings) -> AssetId {
        let id = AssetId(self.next_asset);
        self.next_asset += 1;
        self.assets.insert(id, settings);
        id
    }

    pub fn asset(&self, id: AssetId) -> Option<&AssetSettings> {
        self.assets.get(&id)
    }

    pub fn asset_mut(&mut self, id: AssetId) -> Option<&mut AssetSettings> {
        self.assets.get_mut(&id)
    }
}

impl UndoWorld for SceneWorld {
    type Key = ObjectId;
    type SceneId = SceneId;

    fn resolve(&self, key: &ObjectId) -> Option<&dyn Diffable> {
        match key {
            ObjectId::Actor(id) => self.actor(*id).map(|a| a as &dyn Diffable),
            ObjectId::Asset(id) => self.asset(*id).map(|a| a as &dyn Diffable),
        }
    }

    fn resolve_mut(&mut self, key: &ObjectId) -> Option<&mut dyn Diffable> {
        match key {
            ObjectId::Actor(id) => self.actor_mut(*id).map(|a| a as &mut dyn Diffable),
            ObjectId::Asset(id) => self.asset_mut(*id).map(|a| a as &mut dyn Diffable),
        }
    }

    fn owning_scene(&self, key: &ObjectId) -> Option<SceneId> {
        match key {
            ObjectId::Actor(id) => self.actor_scene(*id),
            ObjectId::Asset(_) => None,
        }
    }
}
