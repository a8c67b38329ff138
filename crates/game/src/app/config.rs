use std::env;

use proximity_engine::{HighlightPalette, Vec3};
use tracing::warn;

pub(crate) const SAVE_FILE_ENV_VAR: &str = "PROXIMITY_SAVE_FILE";
pub(crate) const SPAWN_SEED_ENV_VAR: &str = "PROXIMITY_SPAWN_SEED";
pub(crate) const SPAWN_EXTENT_ENV_VAR: &str = "PROXIMITY_SPAWN_EXTENT";

const DEFAULT_SAVE_FILE_NAME: &str = "positions.json";
const DEFAULT_SPAWN_HALF_EXTENT: f32 = 10.0;
const DEFAULT_WALK_STEP_UNITS: f32 = 1.0;
/// Keeps the sampled span `2 * half_extent` finite for the uniform sampler.
pub(crate) const MAX_SPAWN_HALF_EXTENT: f32 = f32::MAX / 4.0;

#[derive(Debug, Clone)]
pub(crate) struct SceneConfig {
    pub(crate) palette: HighlightPalette,
    pub(crate) player_spawn: Vec3,
    /// Random spawns land in the cube `[-half_extent, half_extent]^3`.
    pub(crate) spawn_half_extent: f32,
    pub(crate) walk_step_units: f32,
    pub(crate) save_file_name: String,
    pub(crate) spawn_seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            palette: HighlightPalette::default(),
            player_spawn: Vec3::ZERO,
            spawn_half_extent: DEFAULT_SPAWN_HALF_EXTENT,
            walk_step_units: DEFAULT_WALK_STEP_UNITS,
            save_file_name: DEFAULT_SAVE_FILE_NAME.to_string(),
            spawn_seed: None,
        }
    }
}

impl SceneConfig {
    pub(crate) fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(SAVE_FILE_ENV_VAR) {
            let trimmed = raw.trim();
            if is_plain_file_name(trimmed) {
                config.save_file_name = trimmed.to_string();
            } else {
                warn!(var = SAVE_FILE_ENV_VAR, value = %raw, "config_value_ignored");
            }
        }

        if let Some(raw) = lookup(SPAWN_SEED_ENV_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(seed) => config.spawn_seed = Some(seed),
                Err(_) => warn!(var = SPAWN_SEED_ENV_VAR, value = %raw, "config_value_ignored"),
            }
        }

        if let Some(raw) = lookup(SPAWN_EXTENT_ENV_VAR) {
            match raw.trim().parse::<f32>() {
                Ok(extent) if (0.0..=MAX_SPAWN_HALF_EXTENT).contains(&extent) => {
                    config.spawn_half_extent = extent;
                }
                _ => warn!(var = SPAWN_EXTENT_ENV_VAR, value = %raw, "config_value_ignored"),
            }
        }

        config
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> SceneConfig {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        SceneConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.save_file_name, DEFAULT_SAVE_FILE_NAME);
        assert_eq!(config.spawn_half_extent, DEFAULT_SPAWN_HALF_EXTENT);
        assert_eq!(config.spawn_seed, None);
        assert_eq!(config.player_spawn, Vec3::ZERO);
    }

    #[test]
    fn valid_overrides_are_applied() {
        let config = config_from(&[
            (SAVE_FILE_ENV_VAR, " slot_b.json "),
            (SPAWN_SEED_ENV_VAR, "42"),
            (SPAWN_EXTENT_ENV_VAR, "2.5"),
        ]);
        assert_eq!(config.save_file_name, "slot_b.json");
        assert_eq!(config.spawn_seed, Some(42));
        assert_eq!(config.spawn_half_extent, 2.5);
    }

    #[test]
    fn invalid_overrides_fall_back_to_defaults() {
        let config = config_from(&[
            (SAVE_FILE_ENV_VAR, "../escape.json"),
            (SPAWN_SEED_ENV_VAR, "-1"),
            (SPAWN_EXTENT_ENV_VAR, "inf"),
        ]);
        assert_eq!(config.save_file_name, DEFAULT_SAVE_FILE_NAME);
        assert_eq!(config.spawn_seed, None);
        assert_eq!(config.spawn_half_extent, DEFAULT_SPAWN_HALF_EXTENT);
    }

    #[test]
    fn extent_too_wide_to_sample_is_ignored() {
        for raw in ["3e38", "1e38", "NaN", "-0.5"] {
            let config = config_from(&[(SPAWN_EXTENT_ENV_VAR, raw)]);
            assert_eq!(config.spawn_half_extent, DEFAULT_SPAWN_HALF_EXTENT, "{raw}");
        }

        let config = config_from(&[(SPAWN_EXTENT_ENV_VAR, "1e30")]);
        assert_eq!(config.spawn_half_extent, 1e30);
    }
}
