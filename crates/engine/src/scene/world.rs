use crate::proximity::{Category, Color, TrackedWorld};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance. Ordering matches true distance, so
    /// nearest-neighbor selection never needs the square root. Widened to
    /// `f64`, which stays finite for any pair of finite `f32` positions.
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        let dz = f64::from(self.z) - f64::from(other.z);
        dx * dx + dy * dy + dz * dz
    }

    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Item,
    Bot,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Item => "item",
            EntityKind::Bot => "bot",
        }
    }

    pub fn category(self) -> Option<Category> {
        match self {
            EntityKind::Player => None,
            EntityKind::Item => Some(Category::Item),
            EntityKind::Bot => Some(Category::Bot),
        }
    }
}

impl From<Category> for EntityKind {
    fn from(category: Category) -> Self {
        match category {
            Category::Item => EntityKind::Item,
            Category::Bot => EntityKind::Bot,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec3,
    pub color: Option<Color>,
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Owns every live entity in spawn order. Positions are mutated here and
/// nowhere else; the tracker only reads them through [`TrackedWorld`].
#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
}

impl SceneWorld {
    pub fn spawn(&mut self, kind: EntityKind, position: Vec3) -> EntityId {
        let id = self.allocator.allocate();
        self.entities.push(Entity {
            id,
            kind,
            position,
            color: None,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|entity| entity.id == id)?;
        Some(self.entities.remove(index))
    }

    /// Returns `Some(true)` when the stored position actually changed.
    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> Option<bool> {
        let entity = self.find_entity_mut(id)?;
        if entity.position == position {
            return Some(false);
        }
        entity.position = position;
        Some(true)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }
}

impl TrackedWorld for SceneWorld {
    fn position_of(&self, id: EntityId) -> Option<Vec3> {
        self.find_entity(id).map(|entity| entity.position)
    }

    fn apply_highlight(&mut self, id: EntityId, color: Color) {
        if let Some(entity) = self.find_entity_mut(id) {
            entity.color = Some(color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_squared_skips_square_root() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 6.0, 3.0);
        assert_eq!(a.distance_squared(b), 25.0);
        assert_eq!(b.distance_squared(a), 25.0);
    }

    #[test]
    fn allocator_hands_out_increasing_ids() {
        let mut world = SceneWorld::default();
        let first = world.spawn(EntityKind::Item, Vec3::ZERO);
        let second = world.spawn(EntityKind::Bot, Vec3::ZERO);
        assert!(second > first);

        world.despawn(first).expect("first exists");
        let third = world.spawn(EntityKind::Item, Vec3::ZERO);
        assert!(third > second);
    }

    #[test]
    fn despawn_missing_entity_returns_none() {
        let mut world = SceneWorld::default();
        assert!(world.despawn(EntityId(99)).is_none());
    }

    #[test]
    fn set_position_reports_whether_anything_changed() {
        let mut world = SceneWorld::default();
        let id = world.spawn(EntityKind::Item, Vec3::new(1.0, 0.0, 0.0));

        assert_eq!(world.set_position(id, Vec3::new(1.0, 0.0, 0.0)), Some(false));
        assert_eq!(world.set_position(id, Vec3::new(2.0, 0.0, 0.0)), Some(true));
        assert_eq!(
            world.find_entity(id).expect("entity").position,
            Vec3::new(2.0, 0.0, 0.0)
        );
        assert_eq!(world.set_position(EntityId(42), Vec3::ZERO), None);
    }

    #[test]
    fn distance_squared_stays_finite_at_the_edge_of_f32() {
        let far = Vec3::new(f32::MAX, f32::MAX, f32::MAX);
        let opposite = Vec3::new(f32::MIN, f32::MIN, f32::MIN);
        assert!(far.distance_squared(opposite).is_finite());
        assert!(Vec3::ZERO.distance_squared(far) < far.distance_squared(opposite));
    }

    #[test]
    fn apply_highlight_ignores_unknown_ids() {
        let mut world = SceneWorld::default();
        let id = world.spawn(EntityKind::Bot, Vec3::ZERO);
        world.apply_highlight(EntityId(1234), Color::WHITE);
        world.apply_highlight(id, Color::WHITE);
        assert_eq!(world.find_entity(id).expect("bot").color, Some(Color::WHITE));
    }
}
