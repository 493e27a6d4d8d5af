//! # Tessel Editor
//!
//! Editor-side integration of the undo engine: the scene model, structural
//! scene actions, scene-dirty tracking, play-mode gating and the Edit menu
//! and history panel views.

pub mod editor_undo;
pub mod history_panel;
pub mod log_capture;
pub mod menu;
pub mod play_state;
pub mod scene;
pub mod scene_actions;
pub mod settings;

pub use editor_undo::{EditorUndo, edited_scenes};
pub use history_panel::{HistoryPanel, HistoryRow};
pub use menu::{EditMenu, MenuAction, MenuItem};
pub use play_state::{PlayCommand, PlayState};
pub use scene::{Actor, ActorId, AssetId, AssetSettings, ObjectId, SceneId, SceneWorld, Transform};
pub use settings::{EditorSettings, SettingsError, UndoSettings};
