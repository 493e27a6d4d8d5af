/// Editor play state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayState {
    #[default]
    Editing,
    Playing,
    Paused,
    /// A player build is running; the scene is read-only until it finishes.
    Building,
}

/// Toolbar commands that move between play states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayCommand {
    Play,
    Pause,
    Resume,
    Stop,
    Build,
    BuildFinished,
}

impl PlayState {
    /// The state after `command`, or `None` if the command does not apply.
    pub fn next(self, command: PlayCommand) -> Option<PlayState> {
        use PlayCommand::*;
        use PlayState::*;

        match (self, command) {
            (Editing, Play) => Some(Playing),
            (Editing, Build) => Some(Building),
            (Playing, Pause) => Some(Paused),
            (Paused, Resume) => Some(Playing),
            (Playing | Paused, Stop) => Some(Editing),
            (Building, BuildFinished) => Some(Editing),
            _ => None,
        }
    }

    /// Only edit mode records history; simulation changes must not
    /// accumulate as undo steps.
    pub fn allows_undo(self) -> bool {
        matches!(self, PlayState::Editing)
    }

    /// Commands the toolbar offers in this state.
    pub fn commands(self) -> &'static [PlayCommand] {
        match self {
            PlayState::Editing => &[PlayCommand::Play, PlayCommand::Build],
            PlayState::Playing => &[PlayCommand::Pause, PlayCommand::Stop],
            PlayState::Paused => &[PlayCommand::Resume, PlayCommand::Stop],
            PlayState::Building => &[PlayCommand::BuildFinished],
        }
    }
}
