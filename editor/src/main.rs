use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tessel_core::undo::{UndoBlock, UndoMultiBlock};
use tessel_editor::log_capture;
use tessel_editor::scene::Compression;
use tessel_editor::scene_actions::{ReparentAction, SetTransformAction, SpawnActorAction};
use tessel_editor::settings::{self, LogSettings};
use tessel_editor::{
    Actor, AssetSettings, EditMenu, EditorUndo, HistoryPanel, MenuAction, ObjectId, PlayCommand, PlayState,
    SceneWorld, Transform,
};

/// Scripted editing session exercising the undo engine.
#[derive(Parser, Debug)]
#[command(name = "tessel-editor", version, about)]
struct Args {
    /// Settings file
    #[arg(long, default_value = "tessel.toml")]
    settings: PathBuf,

    /// Override the number of undo steps kept
    #[arg(long)]
    capacity: Option<usize>,

    /// Print captured log entries at the end
    #[arg(long)]
    show_log: bool,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    // The log filter lives in the settings file, so peek at it before the
    // logger exists; the real load below reports problems through the logger.
    let filter = settings::load_settings(&args.settings)
        .map(|s| s.log.filter)
        .unwrap_or_else(|_| LogSettings::default().filter);
    log_capture::install(&filter)?;
    let mut editor_settings = settings::load_or_default(&args.settings);
    if let Some(capacity) = args.capacity {
        editor_settings.undo.capacity = capacity;
    }

    let mut world = SceneWorld::new();
    let main_scene = world.add_scene("Main");
    let ui_scene = world.add_scene("UI");
    let rock = world.add_asset(AssetSettings::texture("textures/rock.png"));
    let mut editor = EditorUndo::new(editor_settings.undo.clone());

    let spawn = SpawnActorAction::perform(&mut world, main_scene, Actor::new("Player"))?;
    let player = spawn.id();
    editor.undo_mut().add_action(&world, Box::new(spawn))?;
    let spawn = SpawnActorAction::perform(&mut world, main_scene, Actor::new("Camera"))?;
    let camera = spawn.id();
    editor.undo_mut().add_action(&world, Box::new(spawn))?;
    let spawn = SpawnActorAction::perform(&mut world, ui_scene, Actor::new("HUD"))?;
    let hud = spawn.id();
    editor.undo_mut().add_action(&world, Box::new(spawn))?;

    {
        let key = ObjectId::Actor(player);
        let mut block = UndoBlock::begin(editor.undo_mut(), &mut world, key, "Move Player")?;
        if let Some(actor) = block.actor_mut(player) {
            actor.transform.translation = [4.0, 0.0, -2.0];
        }
    }

    {
        let keys = vec![ObjectId::Actor(camera), ObjectId::Actor(hud)];
        let mut block = UndoMultiBlock::begin(editor.undo_mut(), &mut world, keys, "Tag selection")?;
        for id in [camera, hud] {
            if let Some(actor) = block.actor_mut(id) {
                actor.tags.push("persistent".into());
            }
        }
        block.finish()?;
    }

    let reparent = ReparentAction::perform(&mut world, camera, Some(player))?;
    editor.undo_mut().add_action(&world, Box::new(reparent))?;

    {
        let key = ObjectId::Asset(rock);
        let mut block = UndoBlock::begin(editor.undo_mut(), &mut world, key, "Rock import settings")?;
        if let Some(asset) = block.asset_mut(rock) {
            asset.max_size = 1024;
            asset.compression = Compression::Astc { block: 6 };
        }
    }

    let raise = SetTransformAction::new(&world, player, Transform::from_translation([4.0, 1.5, -2.0]))?;
    editor.undo_mut().execute(&mut world, Box::new(raise))?;

    for shortcut in ["ctrl+z", "ctrl+z", "ctrl+y"] {
        if let Some(action) = MenuAction::from_shortcut(shortcut) {
            let done = action.dispatch(editor.undo_mut(), &mut world)?;
            log::info!("{shortcut} -> {action:?} ({})", if done { "applied" } else { "nothing to do" });
        }
    }

    let mut state = PlayState::Editing;
    for command in [PlayCommand::Play, PlayCommand::Stop] {
        if let Some(next) = state.next(command) {
            state = next;
            editor.apply_play_state(state);
            log::info!("{command:?}: now {state:?}, undo enabled: {}", editor.undo().is_enabled());
        }
        if state == PlayState::Playing {
            // Simulation edits while playing are not recorded.
            let recorded = editor
                .undo_mut()
                .record_begin(&world, ObjectId::Actor(player), "Physics step")?;
            if let Some(actor) = world.actor_mut(player) {
                actor.transform.translation[1] -= 0.5;
            }
            if recorded {
                editor.undo_mut().record_end(&mut world, None)?;
            }
        }
    }

    println!("{}", HistoryPanel::new(editor.undo().history()));
    let menu = EditMenu::from_undo(editor.undo());
    println!("Edit menu: [{}] [{}]", menu.undo.text, menu.redo.text);

    let mut dirty = editor.dirty_scenes();
    dirty.sort();
    let names: Vec<&str> = dirty.iter().filter_map(|id| world.scene_name(*id)).collect();
    println!("Unsaved scenes: {}", if names.is_empty() { "none".to_owned() } else { names.join(", ") });

    if args.show_log
        && let Some(buffer) = log_capture::log_buffer()
        && let Ok(guard) = buffer.lock()
    {
        println!("\nLog ({} entries):", guard.entries().len());
        for entry in guard.entries() {
            println!("  {entry}");
        }
    }
    Ok(())
}
