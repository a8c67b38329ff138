use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use proximity_engine::{EntityId, PersistenceError};
use tracing::{error, info, warn};

use super::bootstrap::AppWiring;
use super::console::{CommandConsole, ParsedCommand, SceneCommand};
use super::controller::{format_vec3, ControllerError, LoadOutcome, SceneController};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

pub(crate) fn run(mut app: AppWiring) -> ExitCode {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut output = stdout.lock();
    if let Err(err) = run_session(&mut app.controller, &app.console, stdin.lock(), &mut output) {
        error!(error = %err, "console_io_failed");
        return ExitCode::FAILURE;
    }

    info!("session_ended");
    ExitCode::SUCCESS
}

/// Processes one command per input line until `quit` or end of input.
pub(crate) fn run_session<R: BufRead, W: Write>(
    controller: &mut SceneController,
    console: &CommandConsole,
    input: R,
    output: &mut W,
) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        let (lines, flow) = match console.parse_line(&line) {
            Ok(None) => continue,
            Ok(Some(ParsedCommand::Help)) => (console.help_lines(), Flow::Continue),
            Ok(Some(ParsedCommand::Scene(command))) => execute(controller, command),
            Err(message) => (vec![message], Flow::Continue),
        };
        for text in lines {
            writeln!(output, "{text}")?;
        }
        output.flush()?;
        if flow == Flow::Quit {
            break;
        }
    }
    Ok(())
}

pub(crate) fn execute(controller: &mut SceneController, command: SceneCommand) -> (Vec<String>, Flow) {
    let result = match command {
        SceneCommand::Quit => return (vec!["ok: bye".to_string()], Flow::Quit),
        SceneCommand::State => Ok(controller.status_lines()),
        SceneCommand::Spawn { category, position } => controller
            .spawn(category, position)
            .map(|id| vec![format!("ok: spawned {} {}", category.label(), id.0)]),
        SceneCommand::Move {
            entity_id,
            position,
        } => controller
            .move_entity(EntityId(entity_id), position)
            .map(|changed| vec![move_line(entity_id, changed)]),
        SceneCommand::MovePlayer { position } => controller.move_player(position).map(|changed| {
            let id = controller.player().map_or(0, |player| player.0);
            vec![move_line(id, changed)]
        }),
        SceneCommand::Walk {
            direction,
            distance,
        } => controller.walk(direction, distance).map(|position| {
            vec![format!(
                "ok: player walked {} to {}",
                direction.label(),
                format_vec3(position)
            )]
        }),
        SceneCommand::Despawn { entity_id } => controller
            .despawn(EntityId(entity_id))
            .map(|kind| vec![format!("ok: despawned {} {entity_id}", kind.label())]),
        SceneCommand::Save => controller
            .save()
            .map(|path| vec![format!("ok: saved to {}", path.display())]),
        SceneCommand::Load => controller.load().map(|outcome| match outcome {
            LoadOutcome::Loaded { items, bots } => vec![format!(
                "ok: loaded {items} items and {bots} bots from {}",
                controller.save_file().path().display()
            )],
            LoadOutcome::NotFound(path) => {
                vec![format!("warning: file not found: {}", path.display())]
            }
        }),
    };

    match result {
        Ok(lines) => (lines, Flow::Continue),
        Err(err) => {
            log_command_error(&err);
            (vec![format!("error: {err}")], Flow::Continue)
        }
    }
}

fn move_line(entity_id: u64, changed: bool) -> String {
    if changed {
        format!("ok: moved {entity_id}")
    } else {
        format!("ok: {entity_id} already there")
    }
}

fn log_command_error(err: &ControllerError) {
    match err {
        ControllerError::Persistence(PersistenceError::Parse { .. }) => {
            warn!(error = %err, "load_failed");
        }
        ControllerError::Persistence(_) => warn!(error = %err, "persistence_failed"),
        _ => warn!(error = %err, "command_failed"),
    }
}
