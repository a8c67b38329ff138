use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::atomic_io::write_text_atomic;
use crate::scene::Vec3;

/// Positions captured for save/load. Item and bot lists keep registration
/// order so a reload reproduces the same tie-break order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneSnapshot {
    pub player_position: Vec3,
    pub item_positions: Vec<Vec3>,
    pub bot_positions: Vec<Vec3>,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("save file not found: {0}")]
    NotFound(PathBuf),
    #[error("parse save json at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("validation failed at {path}: expected finite number, got {value}")]
    Invalid { path: String, value: f32 },
    #[error("encode save json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("{action} save '{path}': {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct SavedVec3 {
    x: f32,
    y: f32,
    z: f32,
}

impl SavedVec3 {
    fn from_vec3(value: Vec3) -> Self {
        Self {
            x: value.x,
            y: value.y,
            z: value.z,
        }
    }

    fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SavedScene {
    player_position: SavedVec3,
    item_positions: Vec<SavedVec3>,
    bot_positions: Vec<SavedVec3>,
}

pub fn encode_snapshot(snapshot: &SceneSnapshot) -> Result<String, PersistenceError> {
    validate_snapshot(snapshot)?;
    let saved = SavedScene {
        player_position: SavedVec3::from_vec3(snapshot.player_position),
        item_positions: snapshot
            .item_positions
            .iter()
            .copied()
            .map(SavedVec3::from_vec3)
            .collect(),
        bot_positions: snapshot
            .bot_positions
            .iter()
            .copied()
            .map(SavedVec3::from_vec3)
            .collect(),
    };
    serde_json::to_string_pretty(&saved).map_err(PersistenceError::Encode)
}

pub fn decode_snapshot(raw: &str) -> Result<SceneSnapshot, PersistenceError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let saved = serde_path_to_error::deserialize::<_, SavedScene>(&mut deserializer)
        .map_err(|error| {
            let path = error.path().to_string();
            PersistenceError::Parse {
                path,
                source: error.into_inner(),
            }
        })?;
    deserializer.end().map_err(|source| PersistenceError::Parse {
        path: ".".to_string(),
        source,
    })?;

    let snapshot = SceneSnapshot {
        player_position: saved.player_position.to_vec3(),
        item_positions: saved
            .item_positions
            .into_iter()
            .map(SavedVec3::to_vec3)
            .collect(),
        bot_positions: saved
            .bot_positions
            .into_iter()
            .map(SavedVec3::to_vec3)
            .collect(),
    };
    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

fn validate_snapshot(snapshot: &SceneSnapshot) -> Result<(), PersistenceError> {
    validate_position("player_position", snapshot.player_position)?;
    for (index, position) in snapshot.item_positions.iter().enumerate() {
        validate_position(&format!("item_positions[{index}]"), *position)?;
    }
    for (index, position) in snapshot.bot_positions.iter().enumerate() {
        validate_position(&format!("bot_positions[{index}]"), *position)?;
    }
    Ok(())
}

fn validate_position(path: &str, position: Vec3) -> Result<(), PersistenceError> {
    for (axis, value) in [("x", position.x), ("y", position.y), ("z", position.z)] {
        if !value.is_finite() {
            return Err(PersistenceError::Invalid {
                path: format!("{path}.{axis}"),
                value,
            });
        }
    }
    Ok(())
}

/// A single save slot on disk. Existence is checked by the caller before
/// loading so a missing file can be reported as a warning rather than a
/// failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFile {
    path: PathBuf,
}

impl SaveFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path, file_name: &str) -> Self {
        Self::new(dir.join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn write(&self, snapshot: &SceneSnapshot) -> Result<(), PersistenceError> {
        let json = encode_snapshot(snapshot)?;
        write_text_atomic(&self.path, &json).map_err(|source| PersistenceError::Io {
            action: "write",
            path: self.path.clone(),
            source,
        })?;
        info!(
            path = %self.path.display(),
            items = snapshot.item_positions.len(),
            bots = snapshot.bot_positions.len(),
            "save_written"
        );
        Ok(())
    }

    pub fn read(&self) -> Result<SceneSnapshot, PersistenceError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(PersistenceError::NotFound(self.path.clone()));
            }
            Err(source) => {
                return Err(PersistenceError::Io {
                    action: "read",
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let snapshot = decode_snapshot(&raw)?;
        debug!(path = %self.path.display(), "save_read");
        Ok(snapshot)
    }
}
