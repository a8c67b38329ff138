use std::collections::HashMap;

use proximity_engine::{Category, Vec3};

use super::controller::WalkDirection;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SceneCommand {
    Spawn {
        category: Category,
        position: Option<Vec3>,
    },
    Move {
        entity_id: u64,
        position: Vec3,
    },
    MovePlayer {
        position: Vec3,
    },
    Walk {
        direction: WalkDirection,
        distance: Option<f32>,
    },
    Despawn {
        entity_id: u64,
    },
    Save,
    Load,
    State,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParsedCommand {
    Help,
    Scene(SceneCommand),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CommandParseError {
    reason: String,
    usage: String,
}

impl CommandParseError {
    fn new(reason: impl Into<String>, usage: &str) -> Self {
        Self {
            reason: reason.into(),
            usage: usage.to_string(),
        }
    }
}

type ParseFn = dyn Fn(&[String]) -> Result<ParsedCommand, CommandParseError>;
type BuiltinParseFn = fn(&[String]) -> Result<ParsedCommand, CommandParseError>;

pub(crate) struct CommandSpec {
    name: String,
    help: String,
    arg_schema: String,
    parse: Box<ParseFn>,
}

pub(crate) struct ConsoleCommandRegistry {
    specs: Vec<CommandSpec>,
    lookup_by_lower_name: HashMap<String, usize>,
}

impl ConsoleCommandRegistry {
    pub(crate) fn new() -> Self {
        Self {
            specs: Vec::new(),
            lookup_by_lower_name: HashMap::new(),
        }
    }

    pub(crate) fn with_scene_builtins() -> Self {
        let builtins: [(&str, &str, &str, BuiltinParseFn); 11] = [
            ("help", "List commands", "", parse_help_command),
            (
                "spawn_item",
                "Spawn an item (random position if omitted)",
                "[x:f32 y:f32 z:f32]",
                parse_spawn_item_command,
            ),
            (
                "spawn_bot",
                "Spawn a bot (random position if omitted)",
                "[x:f32 y:f32 z:f32]",
                parse_spawn_bot_command,
            ),
            (
                "move",
                "Move an entity",
                "<entity_id:u64> <x:f32> <y:f32> <z:f32>",
                parse_move_command,
            ),
            (
                "move_player",
                "Move the player",
                "<x:f32> <y:f32> <z:f32>",
                parse_move_player_command,
            ),
            (
                "walk",
                "Step the player along an axis",
                "<dir:forward|back|left|right|up|down> [distance:f32]",
                parse_walk_command,
            ),
            (
                "despawn",
                "Destroy an entity by id",
                "<entity_id:u64>",
                parse_despawn_command,
            ),
            ("save", "Save positions to file", "", parse_save_command),
            ("load", "Load positions from file", "", parse_load_command),
            ("state", "Print entities and highlights", "", parse_state_command),
            ("quit", "Quit", "", parse_quit_command),
        ];

        let mut registry = Self::new();
        for (name, help, arg_schema, parse) in builtins {
            registry
                .register(name, help, arg_schema, parse)
                .expect("built-in command registration should not fail");
        }
        registry
    }

    pub(crate) fn register<F>(
        &mut self,
        name: impl Into<String>,
        help: impl Into<String>,
        arg_schema: impl Into<String>,
        parse: F,
    ) -> Result<(), String>
    where
        F: Fn(&[String]) -> Result<ParsedCommand, CommandParseError> + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("command name cannot be empty".to_string());
        }
        let lower = name.to_ascii_lowercase();
        if self.lookup_by_lower_name.contains_key(&lower) {
            return Err(format!("duplicate command registration: {name}"));
        }

        self.specs.push(CommandSpec {
            name,
            help: help.into(),
            arg_schema: arg_schema.into(),
            parse: Box::new(parse),
        });
        self.lookup_by_lower_name
            .insert(lower, self.specs.len() - 1);
        Ok(())
    }

    pub(crate) fn lookup(&self, input_name: &str) -> Option<&CommandSpec> {
        let lower = input_name.to_ascii_lowercase();
        let index = self.lookup_by_lower_name.get(&lower)?;
        self.specs.get(*index)
    }

    pub(crate) fn iter_specs_in_order(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.specs.iter().map(|spec| {
            (
                spec.name.as_str(),
                spec.help.as_str(),
                spec.arg_schema.as_str(),
            )
        })
    }
}

/// Turns raw console lines into commands. Errors come back already
/// formatted for display.
pub(crate) struct CommandConsole {
    registry: ConsoleCommandRegistry,
}

impl CommandConsole {
    pub(crate) fn new() -> Self {
        Self {
            registry: ConsoleCommandRegistry::with_scene_builtins(),
        }
    }

    pub(crate) fn parse_line(&self, raw_line: &str) -> Result<Option<ParsedCommand>, String> {
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let tokens =
            tokenize_line(trimmed).map_err(|reason| format!("error: {reason}. usage: help"))?;
        let Some((command_name, args)) = tokens.split_first() else {
            return Ok(None);
        };
        let Some(spec) = self.registry.lookup(command_name) else {
            return Err(format!(
                "error: unknown command '{command_name}'. try: help"
            ));
        };

        (spec.parse)(args)
            .map(Some)
            .map_err(|error| format!("error: {}. usage: {}", error.reason, error.usage))
    }

    pub(crate) fn help_lines(&self) -> Vec<String> {
        self.registry
            .iter_specs_in_order()
            .map(|(name, help, arg_schema)| {
                if arg_schema.is_empty() {
                    format!("{name} - {help}")
                } else {
                    format!("{name} {arg_schema} - {help}")
                }
            })
            .collect()
    }
}

fn tokenize_line(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut pending_token = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                pending_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if pending_token {
                    tokens.push(std::mem::take(&mut current));
                    pending_token = false;
                }
            }
            _ => {
                current.push(ch);
                pending_token = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quoted string".to_string());
    }
    if pending_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_help_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    require_no_args(args, "help")?;
    Ok(ParsedCommand::Help)
}

fn parse_spawn_item_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    parse_spawn(args, Category::Item, "spawn_item [x y z]")
}

fn parse_spawn_bot_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    parse_spawn(args, Category::Bot, "spawn_bot [x y z]")
}

fn parse_spawn(
    args: &[String],
    category: Category,
    usage: &str,
) -> Result<ParsedCommand, CommandParseError> {
    let position = match args.len() {
        0 => None,
        3 => Some(parse_vec3(args, usage)?),
        _ => {
            return Err(CommandParseError::new(
                "expected no arguments or <x> <y> <z>",
                usage,
            ));
        }
    };
    Ok(ParsedCommand::Scene(SceneCommand::Spawn { category, position }))
}

fn parse_move_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    const USAGE: &str = "move <entity_id> <x> <y> <z>";
    let [entity_id, coords @ ..] = args else {
        return Err(CommandParseError::new(
            "expected <entity_id> <x> <y> <z>",
            USAGE,
        ));
    };
    if coords.len() != 3 {
        return Err(CommandParseError::new(
            "expected <entity_id> <x> <y> <z>",
            USAGE,
        ));
    }
    let entity_id = parse_entity_id(entity_id, USAGE)?;
    let position = parse_vec3(coords, USAGE)?;
    Ok(ParsedCommand::Scene(SceneCommand::Move {
        entity_id,
        position,
    }))
}

fn parse_move_player_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    const USAGE: &str = "move_player <x> <y> <z>";
    if args.len() != 3 {
        return Err(CommandParseError::new("expected <x> <y> <z>", USAGE));
    }
    let position = parse_vec3(args, USAGE)?;
    Ok(ParsedCommand::Scene(SceneCommand::MovePlayer { position }))
}

fn parse_walk_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    const USAGE: &str = "walk <dir> [distance]";
    let (raw_direction, raw_distance) = match args {
        [direction] => (direction, None),
        [direction, distance] => (direction, Some(distance)),
        _ => {
            return Err(CommandParseError::new(
                "expected <dir> or <dir> <distance>",
                USAGE,
            ));
        }
    };

    let direction = WalkDirection::from_label(raw_direction).ok_or_else(|| {
        CommandParseError::new(
            format!(
                "unknown direction '{raw_direction}' (expected forward|back|left|right|up|down)"
            ),
            USAGE,
        )
    })?;
    let distance = raw_distance
        .map(|raw| parse_coordinate(raw, "distance", USAGE))
        .transpose()?;

    Ok(ParsedCommand::Scene(SceneCommand::Walk {
        direction,
        distance,
    }))
}

fn parse_despawn_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    const USAGE: &str = "despawn <entity_id>";
    let [entity_id] = args else {
        return Err(CommandParseError::new(
            "expected exactly one argument <entity_id>",
            USAGE,
        ));
    };
    let entity_id = parse_entity_id(entity_id, USAGE)?;
    Ok(ParsedCommand::Scene(SceneCommand::Despawn { entity_id }))
}

fn parse_save_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    require_no_args(args, "save")?;
    Ok(ParsedCommand::Scene(SceneCommand::Save))
}

fn parse_load_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    require_no_args(args, "load")?;
    Ok(ParsedCommand::Scene(SceneCommand::Load))
}

fn parse_state_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    require_no_args(args, "state")?;
    Ok(ParsedCommand::Scene(SceneCommand::State))
}

fn parse_quit_command(args: &[String]) -> Result<ParsedCommand, CommandParseError> {
    require_no_args(args, "quit")?;
    Ok(ParsedCommand::Scene(SceneCommand::Quit))
}

fn parse_entity_id(raw: &str, usage: &str) -> Result<u64, CommandParseError> {
    raw.parse::<u64>().map_err(|_| {
        CommandParseError::new(format!("invalid entity id '{raw}' (expected u64)"), usage)
    })
}

fn parse_coordinate(raw: &str, axis: &str, usage: &str) -> Result<f32, CommandParseError> {
    match raw.parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(CommandParseError::new(
            format!("invalid {axis} '{raw}' (expected finite f32)"),
            usage,
        )),
    }
}

fn parse_vec3(args: &[String], usage: &str) -> Result<Vec3, CommandParseError> {
    let [x, y, z] = args else {
        return Err(CommandParseError::new("expected <x> <y> <z>", usage));
    };
    Ok(Vec3::new(
        parse_coordinate(x, "x coordinate", usage)?,
        parse_coordinate(y, "y coordinate", usage)?,
        parse_coordinate(z, "z coordinate", usage)?,
    ))
}

fn require_no_args(args: &[String], usage: &str) -> Result<(), CommandParseError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandParseError::new("unexpected extra arguments", usage))
    }
}
