use tessel_core::undo::{Undo, UndoResult, UndoWorld};

/// Actions that can be triggered from the Edit menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Undo,
    Redo,
}

impl MenuAction {
    /// Maps a keyboard shortcut such as `"ctrl+z"` to a menu action.
    pub fn from_shortcut(shortcut: &str) -> Option<Self> {
        match shortcut.to_ascii_lowercase().as_str() {
            "ctrl+z" | "cmd+z" => Some(Self::Undo),
            "ctrl+y" | "ctrl+shift+z" | "cmd+shift+z" => Some(Self::Redo),
            _ => None,
        }
    }

    /// Runs the action against the engine.
    ///
    /// Returns `Ok(false)` when there was nothing to do.
    pub fn dispatch<W: UndoWorld>(self, undo: &mut Undo<W>, world: &mut W) -> UndoResult<bool> {
        match self {
            Self::Undo => undo.perform_undo(world),
            Self::Redo => undo.perform_redo(world),
        }
    }
}

/// One Edit menu entry as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub text: String,
    pub enabled: bool,
}

impl MenuItem {
    fn new(verb: &str, label: Option<&str>, enabled: bool) -> Self {
        let text = match label {
            Some(label) if enabled => format!("{verb} {label}"),
            _ => verb.to_owned(),
        };
        Self { text, enabled }
    }
}

/// The Undo/Redo entries of the Edit menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditMenu {
    pub undo: MenuItem,
    pub redo: MenuItem,
}

impl EditMenu {
    /// Builds the entries from the engine's current state.
    pub fn from_undo<W: UndoWorld>(undo: &Undo<W>) -> Self {
        Self {
            undo: MenuItem::new("Undo", undo.first_undo_label(), undo.can_undo()),
            redo: MenuItem::new("Redo", undo.first_redo_label(), undo.can_redo()),
        }
    }

    pub fn item(&self, action: MenuAction) -> &MenuItem {
        match action {
            MenuAction::Undo => &self.undo,
            MenuAction::Redo => &self.redo,
        }
    }
}
