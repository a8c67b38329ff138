use thiserror::Error;
use tracing::{debug, warn};

use super::highlight::{Category, Color, Highlight, HighlightPalette};
use crate::scene::{EntityId, EntityKind, Vec3};

/// Read positions and write highlight colors for tracked handles. The
/// tracker never caches positions; every recompute reads them fresh.
pub trait TrackedWorld {
    fn position_of(&self, id: EntityId) -> Option<Vec3>;
    fn apply_highlight(&mut self, id: EntityId, color: Color);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Movable {
    Player(EntityId),
    Item(EntityId),
    Bot(EntityId),
}

impl Movable {
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        match kind {
            EntityKind::Player => Movable::Player(id),
            EntityKind::Item => Movable::Item(id),
            EntityKind::Bot => Movable::Bot(id),
        }
    }

    pub fn id(self) -> EntityId {
        match self {
            Movable::Player(id) | Movable::Item(id) | Movable::Bot(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("no player is set")]
    PlayerUnset,
    #[error("entity {actual:?} is not the tracked player {expected:?}")]
    PlayerMismatch { expected: EntityId, actual: EntityId },
    #[error("{category:?} entity {id:?} is not registered")]
    NotTracked { category: Category, id: EntityId },
    #[error("no position available for entity {0:?}")]
    MissingPosition(EntityId),
}

#[derive(Debug, Default)]
struct CategoryState {
    // Registration order; ties in distance resolve to the earliest entry.
    members: Vec<EntityId>,
    nearest: Option<EntityId>,
}

impl CategoryState {
    fn contains(&self, id: EntityId) -> bool {
        self.members.contains(&id)
    }

    fn remove(&mut self, id: EntityId) -> bool {
        let Some(index) = self.members.iter().position(|member| *member == id) else {
            return false;
        };
        self.members.remove(index);
        if self.nearest == Some(id) {
            self.nearest = None;
        }
        true
    }
}

#[derive(Debug, Default)]
pub struct ProximityTracker {
    palette: HighlightPalette,
    player: Option<EntityId>,
    items: CategoryState,
    bots: CategoryState,
}

impl ProximityTracker {
    pub fn new(palette: HighlightPalette) -> Self {
        Self {
            palette,
            ..Self::default()
        }
    }

    pub fn palette(&self) -> &HighlightPalette {
        &self.palette
    }

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    /// Does not recompute; highlights catch up on the next registration
    /// or move report.
    pub fn set_player(&mut self, id: EntityId) {
        debug!(player = id.0, "player_set");
        self.player = Some(id);
    }

    pub fn nearest(&self, category: Category) -> Option<EntityId> {
        self.state(category).nearest
    }

    pub fn tracked(&self, category: Category) -> &[EntityId] {
        &self.state(category).members
    }

    pub fn player_position<W: TrackedWorld>(&self, world: &W) -> Result<Vec3, TrackerError> {
        let player = self.player.ok_or(TrackerError::PlayerUnset)?;
        world
            .position_of(player)
            .ok_or(TrackerError::MissingPosition(player))
    }

    /// Returns `false` if the entity was already registered.
    pub fn register<W: TrackedWorld>(&mut self, world: &mut W, movable: Movable) -> bool {
        let category = match movable {
            Movable::Player(id) => {
                self.set_player(id);
                return true;
            }
            Movable::Item(_) => Category::Item,
            Movable::Bot(_) => Category::Bot,
        };

        let id = movable.id();
        let state = self.state_mut(category);
        if state.contains(id) {
            return false;
        }
        state.members.push(id);
        debug!(
            category = category.label(),
            entity = id.0,
            tracked = state.members.len(),
            "entity_registered"
        );
        self.recompute(world, category);
        true
    }

    /// With no player set this is a pure removal: nothing is recomputed and
    /// nothing fails.
    pub fn unregister<W: TrackedWorld>(&mut self, world: &mut W, movable: Movable) -> bool {
        let category = match movable {
            Movable::Player(id) => {
                if self.player != Some(id) {
                    return false;
                }
                debug!(player = id.0, "player_cleared");
                self.player = None;
                return true;
            }
            Movable::Item(_) => Category::Item,
            Movable::Bot(_) => Category::Bot,
        };

        let id = movable.id();
        if !self.state_mut(category).remove(id) {
            return false;
        }
        debug!(
            category = category.label(),
            entity = id.0,
            "entity_unregistered"
        );
        if self.player.is_some() {
            self.recompute(world, category);
        }
        true
    }

    pub fn report_moved<W: TrackedWorld>(
        &mut self,
        world: &mut W,
        movable: Movable,
    ) -> Result<(), TrackerError> {
        match movable {
            Movable::Player(id) => {
                let expected = self.player.ok_or(TrackerError::PlayerUnset)?;
                if expected != id {
                    return Err(TrackerError::PlayerMismatch {
                        expected,
                        actual: id,
                    });
                }
                for category in Category::ALL {
                    self.recompute(world, category);
                }
                Ok(())
            }
            Movable::Item(id) => self.report_member_moved(world, Category::Item, id),
            Movable::Bot(id) => self.report_member_moved(world, Category::Bot, id),
        }
    }

    fn report_member_moved<W: TrackedWorld>(
        &mut self,
        world: &mut W,
        category: Category,
        id: EntityId,
    ) -> Result<(), TrackerError> {
        if !self.state(category).contains(id) {
            return Err(TrackerError::NotTracked { category, id });
        }
        self.recompute(world, category);
        Ok(())
    }

    fn recompute<W: TrackedWorld>(&mut self, world: &mut W, category: Category) {
        let Some(player) = self.player else {
            return;
        };
        let Some(origin) = world.position_of(player) else {
            warn!(player = player.0, "player_position_missing");
            return;
        };

        let palette = self.palette;
        let state = self.state_mut(category);
        let nearest = nearest_to(&*world, origin, &state.members);
        for id in &state.members {
            let highlight = Highlight::from_nearest(Some(*id) == nearest);
            world.apply_highlight(*id, palette.color_for(category, highlight));
        }

        if state.nearest != nearest {
            debug!(
                category = category.label(),
                nearest = nearest.map(|id| id.0),
                "nearest_changed"
            );
        }
        state.nearest = nearest;
    }

    fn state(&self, category: Category) -> &CategoryState {
        match category {
            Category::Item => &self.items,
            Category::Bot => &self.bots,
        }
    }

    fn state_mut(&mut self, category: Category) -> &mut CategoryState {
        match category {
            Category::Item => &mut self.items,
            Category::Bot => &mut self.bots,
        }
    }
}

fn nearest_to<W: TrackedWorld>(world: &W, origin: Vec3, members: &[EntityId]) -> Option<EntityId> {
    let mut best: Option<(f64, EntityId)> = None;
    for id in members {
        let Some(position) = world.position_of(*id) else {
            continue;
        };
        let distance = origin.distance_squared(position);
        if distance.is_nan() {
            continue;
        }
        match best {
            Some((best_distance, _)) if best_distance <= distance => {}
            _ => best = Some((distance, *id)),
        }
    }
    best.map(|(_, id)| id)
}
