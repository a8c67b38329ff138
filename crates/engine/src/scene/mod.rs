mod world;

pub use world::{Entity, EntityId, EntityIdAllocator, EntityKind, SceneWorld, Vec3};
