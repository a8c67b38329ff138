use std::path::PathBuf;

use proximity_engine::{
    Category, EntityId, EntityKind, Highlight, Movable, PersistenceError, ProximityTracker,
    SaveFile, SceneSnapshot, SceneWorld, TrackedWorld, TrackerError, Vec3,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::config::{SceneConfig, MAX_SPAWN_HALF_EXTENT};

#[derive(Debug, Error)]
pub(crate) enum ControllerError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("unknown entity {0}")]
    UnknownEntity(u64),
    #[error("position must be finite, got {0}")]
    NonFinitePosition(String),
}

pub(crate) type ControllerResult<T> = Result<T, ControllerError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LoadOutcome {
    Loaded { items: usize, bots: usize },
    NotFound(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum WalkDirection {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

impl WalkDirection {
    pub(crate) const ALL: [WalkDirection; 6] = [
        WalkDirection::Forward,
        WalkDirection::Back,
        WalkDirection::Left,
        WalkDirection::Right,
        WalkDirection::Up,
        WalkDirection::Down,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            WalkDirection::Forward => "forward",
            WalkDirection::Back => "back",
            WalkDirection::Left => "left",
            WalkDirection::Right => "right",
            WalkDirection::Up => "up",
            WalkDirection::Down => "down",
        }
    }

    pub(crate) fn from_label(raw: &str) -> Option<Self> {
        let lower = raw.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|direction| direction.label() == lower)
    }

    // Y up, Z forward.
    fn unit(self) -> Vec3 {
        match self {
            WalkDirection::Forward => Vec3::new(0.0, 0.0, 1.0),
            WalkDirection::Back => Vec3::new(0.0, 0.0, -1.0),
            WalkDirection::Left => Vec3::new(-1.0, 0.0, 0.0),
            WalkDirection::Right => Vec3::new(1.0, 0.0, 0.0),
            WalkDirection::Up => Vec3::new(0.0, 1.0, 0.0),
            WalkDirection::Down => Vec3::new(0.0, -1.0, 0.0),
        }
    }
}

/// Owns the scene and routes entity lifecycle events to the tracker:
/// spawn registers, despawn unregisters, and every position change raises a
/// moved report.
pub(crate) struct SceneController {
    config: SceneConfig,
    world: SceneWorld,
    tracker: ProximityTracker,
    save_file: SaveFile,
    rng: StdRng,
}

impl SceneController {
    pub(crate) fn new(config: SceneConfig, save_file: SaveFile) -> Self {
        let rng = match config.spawn_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut controller = Self {
            tracker: ProximityTracker::new(config.palette),
            world: SceneWorld::default(),
            save_file,
            rng,
            config,
        };
        controller.spawn_player(controller.config.player_spawn);
        controller
    }

    #[cfg(test)]
    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    #[cfg(test)]
    pub(crate) fn tracker(&self) -> &ProximityTracker {
        &self.tracker
    }

    pub(crate) fn save_file(&self) -> &SaveFile {
        &self.save_file
    }

    pub(crate) fn player(&self) -> Option<EntityId> {
        self.tracker.player()
    }

    fn spawn_player(&mut self, position: Vec3) -> EntityId {
        let id = self.world.spawn(EntityKind::Player, position);
        self.tracker
            .register(&mut self.world, Movable::Player(id));
        info!(entity = id.0, position = %format_vec3(position), "player_spawned");
        id
    }

    pub(crate) fn spawn(
        &mut self,
        category: Category,
        position: Option<Vec3>,
    ) -> ControllerResult<EntityId> {
        let position = match position {
            Some(position) => ensure_finite(position)?,
            None => self.random_spawn_position(),
        };
        let kind = EntityKind::from(category);
        let id = self.world.spawn(kind, position);
        self.tracker.register(&mut self.world, Movable::new(kind, id));
        info!(
            kind = kind.label(),
            entity = id.0,
            position = %format_vec3(position),
            "entity_spawned"
        );
        Ok(id)
    }

    fn random_spawn_position(&mut self) -> Vec3 {
        let extent = self.config.spawn_half_extent;
        if extent.is_nan() || extent <= 0.0 {
            return Vec3::ZERO;
        }
        let extent = extent.min(MAX_SPAWN_HALF_EXTENT);
        Vec3::new(
            self.rng.gen_range(-extent..=extent),
            self.rng.gen_range(-extent..=extent),
            self.rng.gen_range(-extent..=extent),
        )
    }

    /// Returns `false` when the entity was already at `position`; no moved
    /// report is raised in that case.
    pub(crate) fn move_entity(&mut self, id: EntityId, position: Vec3) -> ControllerResult<bool> {
        let position = ensure_finite(position)?;
        let kind = self
            .world
            .find_entity(id)
            .map(|entity| entity.kind)
            .ok_or(ControllerError::UnknownEntity(id.0))?;
        let changed = self
            .world
            .set_position(id, position)
            .ok_or(ControllerError::UnknownEntity(id.0))?;
        if !changed {
            return Ok(false);
        }

        debug!(
            kind = kind.label(),
            entity = id.0,
            position = %format_vec3(position),
            "entity_moved"
        );
        self.tracker
            .report_moved(&mut self.world, Movable::new(kind, id))?;
        Ok(true)
    }

    pub(crate) fn move_player(&mut self, position: Vec3) -> ControllerResult<bool> {
        let player = self.tracker.player().ok_or(TrackerError::PlayerUnset)?;
        self.move_entity(player, position)
    }

    pub(crate) fn walk(
        &mut self,
        direction: WalkDirection,
        distance: Option<f32>,
    ) -> ControllerResult<Vec3> {
        let step = distance.unwrap_or(self.config.walk_step_units);
        let current = self.tracker.player_position(&self.world)?;
        let next = current.add(direction.unit().scale(step));
        self.move_player(next)?;
        Ok(next)
    }

    pub(crate) fn despawn(&mut self, id: EntityId) -> ControllerResult<EntityKind> {
        let kind = self
            .world
            .find_entity(id)
            .map(|entity| entity.kind)
            .ok_or(ControllerError::UnknownEntity(id.0))?;
        self.tracker
            .unregister(&mut self.world, Movable::new(kind, id));
        self.world.despawn(id);
        info!(kind = kind.label(), entity = id.0, "entity_despawned");
        Ok(kind)
    }

    pub(crate) fn snapshot(&self) -> ControllerResult<SceneSnapshot> {
        let player_position = self.tracker.player_position(&self.world)?;
        Ok(SceneSnapshot {
            player_position,
            item_positions: self.tracked_positions(Category::Item),
            bot_positions: self.tracked_positions(Category::Bot),
        })
    }

    fn tracked_positions(&self, category: Category) -> Vec<Vec3> {
        self.tracker
            .tracked(category)
            .iter()
            .filter_map(|id| self.world.position_of(*id))
            .collect()
    }

    pub(crate) fn save(&self) -> ControllerResult<PathBuf> {
        let snapshot = self.snapshot()?;
        self.save_file.write(&snapshot)?;
        Ok(self.save_file.path().to_path_buf())
    }

    /// A missing save is reported as [`LoadOutcome::NotFound`] and leaves the
    /// scene untouched. Parse failures also leave the scene untouched since
    /// the file is fully decoded before anything is despawned.
    pub(crate) fn load(&mut self) -> ControllerResult<LoadOutcome> {
        if !self.save_file.exists() {
            let path = self.save_file.path().to_path_buf();
            warn!(path = %path.display(), "load_file_not_found");
            return Ok(LoadOutcome::NotFound(path));
        }
        let snapshot = self.save_file.read()?;
        self.apply_snapshot(snapshot)
    }

    fn apply_snapshot(&mut self, snapshot: SceneSnapshot) -> ControllerResult<LoadOutcome> {
        for category in Category::ALL {
            let existing = self.tracker.tracked(category).to_vec();
            for id in existing {
                self.tracker
                    .unregister(&mut self.world, Movable::new(category.into(), id));
                self.world.despawn(id);
            }
        }

        let player = match self.tracker.player() {
            Some(player) if self.world.find_entity(player).is_some() => {
                self.world.set_position(player, snapshot.player_position);
                player
            }
            _ => self.spawn_player(snapshot.player_position),
        };

        for position in &snapshot.item_positions {
            let id = self.world.spawn(EntityKind::Item, *position);
            self.tracker.register(&mut self.world, Movable::Item(id));
        }
        for position in &snapshot.bot_positions {
            let id = self.world.spawn(EntityKind::Bot, *position);
            self.tracker.register(&mut self.world, Movable::Bot(id));
        }
        self.tracker
            .report_moved(&mut self.world, Movable::Player(player))?;

        let outcome = LoadOutcome::Loaded {
            items: snapshot.item_positions.len(),
            bots: snapshot.bot_positions.len(),
        };
        info!(
            path = %self.save_file.path().display(),
            items = snapshot.item_positions.len(),
            bots = snapshot.bot_positions.len(),
            "save_loaded"
        );
        Ok(outcome)
    }

    pub(crate) fn status_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.world.entity_count() + 3);
        match self.tracker.player() {
            Some(player) => match self.world.position_of(player) {
                Some(position) => {
                    lines.push(format!("player {} at {}", player.0, format_vec3(position)))
                }
                None => lines.push(format!("player {} (no position)", player.0)),
            },
            None => lines.push("player: none".to_string()),
        }

        let palette = self.tracker.palette();
        for entity in self.world.entities() {
            let Some(category) = entity.kind.category() else {
                continue;
            };
            let state = match entity
                .color
                .and_then(|color| palette.highlight_of(category, color))
            {
                Some(Highlight::Closest) => "closest",
                Some(Highlight::Default) => "default",
                None => "unhighlighted",
            };
            lines.push(format!(
                "{} {} at {} {}",
                entity.kind.label(),
                entity.id.0,
                format_vec3(entity.position),
                state
            ));
        }

        for category in Category::ALL {
            let nearest = self
                .tracker
                .nearest(category)
                .map_or_else(|| "none".to_string(), |id| id.0.to_string());
            lines.push(format!("nearest {}: {nearest}", category.label()));
        }
        lines
    }
}

fn ensure_finite(position: Vec3) -> ControllerResult<Vec3> {
    if position.is_finite() {
        Ok(position)
    } else {
        Err(ControllerError::NonFinitePosition(format_vec3(position)))
    }
}

pub(crate) fn format_vec3(position: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", position.x, position.y, position.z)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use proximity_engine::Color;
    use tempfile::TempDir;

    use super::*;

    fn seeded_config() -> SceneConfig {
        SceneConfig {
            spawn_seed: Some(7),
            ..SceneConfig::default()
        }
    }

    fn controller_in(dir: &TempDir) -> SceneController {
        SceneController::new(
            seeded_config(),
            SaveFile::in_dir(dir.path(), "positions.json"),
        )
    }

    fn x(value: f32) -> Vec3 {
        Vec3::new(value, 0.0, 0.0)
    }

    fn color_of(controller: &SceneController, id: EntityId) -> Option<Color> {
        controller.world().find_entity(id).expect("entity").color
    }

    #[test]
    fn new_controller_spawns_and_tracks_player() {
        let dir = TempDir::new().expect("tempdir");
        let controller = controller_in(&dir);
        let player = controller.player().expect("player");
        assert_eq!(
            controller.world().find_entity(player).expect("player").kind,
            EntityKind::Player
        );
        assert_eq!(controller.world().entity_count(), 1);
    }

    #[test]
    fn spawned_items_are_recolored_as_player_moves() {
        let dir = TempDir::new().expect("tempdir");
        let mut controller = controller_in(&dir);
        let a = controller.spawn(Category::Item, Some(x(5.0))).expect("a");
        let b = controller.spawn(Category::Item, Some(x(3.0))).expect("b");
        let c = controller.spawn(Category::Item, Some(x(6.0))).expect("c");
        assert_eq!(color_of(&controller, b), Some(Color::RED));
        assert_eq!(color_of(&controller, a), Some(Color::WHITE));

        assert!(controller.move_player(x(7.0)).expect("move"));
        assert_eq!(color_of(&controller, c), Some(Color::RED));
        assert_eq!(color_of(&controller, a), Some(Color::WHITE));
        assert_eq!(color_of(&controller, b), Some(Color::WHITE));
    }

    #[test]
    fn unchanged_position_raises_no_move() {
        let dir = TempDir::new().expect("tempdir");
        let mut controller = controller_in(&dir);
        let bot = controller.spawn(Category::Bot, Some(x(1.0))).expect("bot");
        assert!(!controller.move_entity(bot, x(1.0)).expect("same spot"));
        assert!(controller.move_entity(bot, x(2.0)).expect("new spot"));
    }

    #[test]
    fn oversized_extent_is_clamped_before_sampling() {
        let dir = TempDir::new().expect("tempdir");
        let mut controller = SceneController::new(
            SceneConfig {
                spawn_half_extent: f32::MAX,
                ..seeded_config()
            },
            SaveFile::in_dir(dir.path(), "positions.json"),
        );
        let id = controller.spawn(Category::Item, None).expect("spawn");
        let position = controller.world().find_entity(id).expect("item").position;
        assert!(position.is_finite());
        assert!(position.x.abs() <= MAX_SPAWN_HALF_EXTENT);
    }

    #[test]
    fn random_spawns_stay_inside_the_cube() {
        let dir = TempDir::new().expect("tempdir");
        let mut controller = controller_in(&dir);
        let extent = controller.config.spawn_half_extent;
        for _ in 0..32 {
            let id = controller.spawn(Category::Bot, None).expect("spawn");
            let position = controller.world().find_entity(id).expect("bot").position;
            for value in [position.x, position.y, position.z] {
                assert!((-extent..=extent).contains(&value), "{value} out of bounds");
            }
        }
        assert_eq!(controller.tracker().tracked(Category::Bot).len(), 32);
        assert!(controller.tracker().nearest(Category::Bot).is_some());
    }

    #[test]
    fn same_seed_spawns_same_positions() {
        let first_dir = TempDir::new().expect("tempdir");
        let second_dir = TempDir::new().expect("tempdir");
        let mut first = controller_in(&first_dir);
        let mut second = controller_in(&second_dir);
        for _ in 0..4 {
            let a = first.spawn(Category::Item, None).expect("a");
            let b = second.spawn(Category::Item, None).expect("b");
            assert_eq!(
                first.world().find_entity(a).expect("a").position,
                second.world().find_entity(b).expect("b").position
            );
        }
    }

    #[test]
    fn walk_steps_player_along_axis() {
        let dir = TempDir::new().expect("tempdir");
        let mut controller = controller_in(&dir);
        let near = controller.spawn(Category::Item, Some(x(-2.0))).expect("near");
        let far = controller.spawn(Category::Item, Some(x(3.0))).expect("far");
        assert_eq!(controller.tracker().nearest(Category::Item), Some(near));

        let position = controller
            .walk(WalkDirection::Right, Some(2.0))
            .expect("walk");
        assert_eq!(position, x(2.0));
        assert_eq!(controller.tracker().nearest(Category::Item), Some(far));

        let position = controller.walk(WalkDirection::Up, None).expect("walk up");
        assert_eq!(position, Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn despawning_closest_promotes_next_nearest() {
        let dir = TempDir::new().expect("tempdir");
        let mut controller = controller_in(&dir);
        let a = controller.spawn(Category::Item, Some(x(5.0))).expect("a");
        let b = controller.spawn(Category::Item, Some(x(3.0))).expect("b");

        assert_eq!(controller.despawn(b).expect("despawn"), EntityKind::Item);
        assert!(controller.world().find_entity(b).is_none());
        assert_eq!(controller.tracker().nearest(Category::Item), Some(a));
        assert_eq!(color_of(&controller, a), Some(Color::RED));
        assert!(matches!(
            controller.despawn(b),
            Err(ControllerError::UnknownEntity(_))
        ));
    }

    #[test]
    fn despawning_player_leaves_tracking_inert() {
        let dir = TempDir::new().expect("tempdir");
        let mut controller = controller_in(&dir);
        let item = controller.spawn(Category::Item, Some(x(1.0))).expect("item");
        let player = controller.player().expect("player");

        controller.despawn(player).expect("despawn player");
        assert_eq!(controller.player(), None);
        controller.despawn(item).expect("despawn last item without player");

        assert!(matches!(
            controller.move_player(x(1.0)),
            Err(ControllerError::Tracker(TrackerError::PlayerUnset))
        ));
        assert!(matches!(
            controller.save(),
            Err(ControllerError::Tracker(TrackerError::PlayerUnset))
        ));
    }

    #[test]
    fn non_finite_positions_are_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let mut controller = controller_in(&dir);
        assert!(matches!(
            controller.spawn(Category::Item, Some(x(f32::INFINITY))),
            Err(ControllerError::NonFinitePosition(_))
        ));
        assert_eq!(controller.world().entity_count(), 1);
    }

    #[test]
    fn save_then_load_restores_positions_and_highlights() {
        let dir = TempDir::new().expect("tempdir");
        let mut controller = controller_in(&dir);
        controller.spawn(Category::Item, Some(x(5.0))).expect("item");
        controller.spawn(Category::Item, Some(x(3.0))).expect("item");
        controller.spawn(Category::Bot, Some(x(-4.0))).expect("bot");
        controller.move_player(x(1.0)).expect("move");
        let saved = controller.snapshot().expect("snapshot");
        controller.save().expect("save");

        controller.spawn(Category::Item, Some(x(0.5))).expect("extra");
        controller.move_player(x(-9.0)).expect("move away");

        let outcome = controller.load().expect("load");
        assert_eq!(outcome, LoadOutcome::Loaded { items: 2, bots: 1 });
        assert_eq!(controller.snapshot().expect("snapshot"), saved);

        let nearest_item = controller.tracker().nearest(Category::Item).expect("item");
        assert_eq!(
            controller.world().find_entity(nearest_item).expect("item").position,
            x(3.0)
        );
        assert_eq!(color_of(&controller, nearest_item), Some(Color::RED));
        assert_eq!(controller.world().entity_count(), 4);
    }

    #[test]
    fn load_respawns_player_when_missing() {
        let dir = TempDir::new().expect("tempdir");
        let mut controller = controller_in(&dir);
        controller.spawn(Category::Bot, Some(x(2.0))).expect("bot");
        controller.save().expect("save");

        let player = controller.player().expect("player");
        controller.despawn(player).expect("despawn");
        controller.load().expect("load");

        assert!(controller.player().is_some());
        assert_eq!(
            controller.snapshot().expect("snapshot").player_position,
            Vec3::ZERO
        );
        assert_eq!(controller.tracker().tracked(Category::Bot).len(), 1);
    }

    #[test]
    fn load_without_file_reports_not_found_and_keeps_state() {
        let dir = TempDir::new().expect("tempdir");
        let mut controller = controller_in(&dir);
        let item = controller.spawn(Category::Item, Some(x(2.0))).expect("item");
        let before = controller.snapshot().expect("snapshot");

        let outcome = controller.load().expect("load");

        assert_eq!(
            outcome,
            LoadOutcome::NotFound(dir.path().join("positions.json"))
        );
        assert_eq!(controller.snapshot().expect("snapshot"), before);
        assert_eq!(controller.tracker().nearest(Category::Item), Some(item));
    }

    #[test]
    fn malformed_save_fails_load_without_touching_scene() {
        let dir = TempDir::new().expect("tempdir");
        let mut controller = controller_in(&dir);
        controller.spawn(Category::Item, Some(x(2.0))).expect("item");
        fs::write(controller.save_file().path(), "{\"player_position\": 3}").expect("write");
        let before = controller.snapshot().expect("snapshot");

        assert!(matches!(
            controller.load(),
            Err(ControllerError::Persistence(PersistenceError::Parse { .. }))
        ));
        assert_eq!(controller.snapshot().expect("snapshot"), before);
    }

    #[test]
    fn status_lines_describe_highlights() {
        let dir = TempDir::new().expect("tempdir");
        let mut controller = controller_in(&dir);
        let item = controller.spawn(Category::Item, Some(x(1.0))).expect("item");
        controller.spawn(Category::Item, Some(x(2.0))).expect("item");

        let lines = controller.status_lines();
        assert_eq!(lines[0], "player 0 at (0.00, 0.00, 0.00)");
        assert_eq!(lines[1], "item 1 at (1.00, 0.00, 0.00) closest");
        assert_eq!(lines[2], "item 2 at (2.00, 0.00, 0.00) default");
        assert_eq!(lines[3], format!("nearest item: {}", item.0));
        assert_eq!(lines[4], "nearest bot: none");
    }

    #[test]
    fn walk_direction_labels_round_trip() {
        for direction in WalkDirection::ALL {
            assert_eq!(WalkDirection::from_label(direction.label()), Some(direction));
        }
        assert_eq!(WalkDirection::from_label("LEFT"), Some(WalkDirection::Left));
        assert_eq!(WalkDirection::from_label("sideways"), None);
    }
}
