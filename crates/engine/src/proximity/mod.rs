mod highlight;
mod tracker;

pub use highlight::{Category, Color, Highlight, HighlightPalette};
pub use tracker::{Movable, ProximityTracker, TrackedWorld, TrackerError};
