use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod persistence;
pub mod proximity;
pub mod scene;

pub use persistence::{decode_snapshot, encode_snapshot, PersistenceError, SaveFile, SceneSnapshot};
pub use proximity::{
    Category, Color, Highlight, HighlightPalette, Movable, ProximityTracker, TrackedWorld,
    TrackerError,
};
pub use scene::{Entity, EntityId, EntityIdAllocator, EntityKind, SceneWorld, Vec3};

pub const DATA_DIR_ENV_VAR: &str = "PROXIMITY_DATA_DIR";
pub const APP_DIR_NAME: &str = "proximity-highlighter";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error(
        "no platform data directory is available on this system.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"$HOME/.local/share/{app_dir}\""
    )]
    NoPlatformDataDir {
        env_var: &'static str,
        app_dir: &'static str,
    },
    #[error("failed to create data directory at {path}: {source}")]
    CreateDataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let data_dir = resolve_data_dir()?;
    fs::create_dir_all(&data_dir).map_err(|source| StartupError::CreateDataDir {
        path: data_dir.clone(),
        source,
    })?;

    Ok(AppPaths {
        data_dir: normalize_path(&data_dir),
    })
}

fn resolve_data_dir() -> Result<PathBuf, StartupError> {
    match env::var(DATA_DIR_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => Ok(PathBuf::from(value)),
        Ok(_) | Err(env::VarError::NotPresent) => dirs::data_dir()
            .map(|base| base.join(APP_DIR_NAME))
            .ok_or(StartupError::NoPlatformDataDir {
                env_var: DATA_DIR_ENV_VAR,
                app_dir: APP_DIR_NAME,
            }),
        Err(source) => Err(StartupError::EnvVar {
            var: DATA_DIR_ENV_VAR,
            source,
        }),
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
