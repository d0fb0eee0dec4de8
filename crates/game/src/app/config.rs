use std::time::Duration;

use tracing::warn;

use super::world::player::{DEFAULT_INVENTORY_SIZE, DEFAULT_REACH, DEFAULT_WALK_SPEED};
use super::world::room::DEFAULT_WALK_MARGIN;

pub(crate) const DEBUG_ENV_VAR: &str = "COTTAGE_DEBUG";
pub(crate) const SAVE_KEY_ENV_VAR: &str = "COTTAGE_SAVE_KEY";
pub(crate) const NEW_GAME_ENV_VAR: &str = "COTTAGE_NEW_GAME";
pub(crate) const INVENTORY_SIZE_ENV_VAR: &str = "COTTAGE_INVENTORY_SIZE";

pub(crate) const DEFAULT_SAVE_KEY: &str = "cottage.save";

/// Gameplay tunables. Defaults match the shipped content.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GameConfig {
    pub(crate) debug: bool,
    pub(crate) new_game: bool,
    pub(crate) save_key: String,
    pub(crate) world_url: String,
    pub(crate) progress_url: String,
    pub(crate) inventory_size: usize,
    pub(crate) transition: Duration,
    pub(crate) walk_margin: f32,
    pub(crate) reach: f32,
    pub(crate) walk_speed: f32,
    pub(crate) toast: Duration,
    pub(crate) speech_timeout: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            debug: false,
            new_game: false,
            save_key: DEFAULT_SAVE_KEY.to_string(),
            world_url: "world.json".to_string(),
            progress_url: "progress.json".to_string(),
            inventory_size: DEFAULT_INVENTORY_SIZE,
            transition: Duration::from_millis(500),
            walk_margin: DEFAULT_WALK_MARGIN,
            reach: DEFAULT_REACH,
            walk_speed: DEFAULT_WALK_SPEED,
            toast: Duration::from_secs(2),
            speech_timeout: Duration::from_secs(10),
        }
    }
}

impl GameConfig {
    pub(crate) fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Applies overrides from `lookup`; malformed values warn and keep the default.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(DEBUG_ENV_VAR) {
            config.debug = parse_flag(DEBUG_ENV_VAR, &raw, config.debug);
        }
        if let Some(raw) = lookup(NEW_GAME_ENV_VAR) {
            config.new_game = parse_flag(NEW_GAME_ENV_VAR, &raw, config.new_game);
        }
        if let Some(raw) = lookup(SAVE_KEY_ENV_VAR) {
            let key = raw.trim();
            if key.is_empty() {
                warn!(var = SAVE_KEY_ENV_VAR, "config_value_empty");
            } else {
                config.save_key = key.to_string();
            }
        }
        if let Some(raw) = lookup(INVENTORY_SIZE_ENV_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => config.inventory_size = size,
                _ => warn!(var = INVENTORY_SIZE_ENV_VAR, value = %raw, "config_value_invalid"),
            }
        }
        config
    }
}

fn parse_flag(var: &str, raw: &str, fallback: bool) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" | "" => false,
        _ => {
            warn!(var, value = raw, "config_value_invalid");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let config = GameConfig::from_lookup(lookup(&[]));
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.inventory_size, 5);
        assert_eq!(config.save_key, "cottage.save");
    }

    #[test]
    fn overrides_are_applied() {
        let config = GameConfig::from_lookup(lookup(&[
            (DEBUG_ENV_VAR, "true"),
            (NEW_GAME_ENV_VAR, "1"),
            (SAVE_KEY_ENV_VAR, " slot-2 "),
            (INVENTORY_SIZE_ENV_VAR, "8"),
        ]));
        assert!(config.debug);
        assert!(config.new_game);
        assert_eq!(config.save_key, "slot-2");
        assert_eq!(config.inventory_size, 8);
    }

    #[test]
    fn malformed_values_keep_defaults() {
        let config = GameConfig::from_lookup(lookup(&[
            (DEBUG_ENV_VAR, "maybe"),
            (INVENTORY_SIZE_ENV_VAR, "0"),
        ]));
        assert!(!config.debug);
        assert_eq!(config.inventory_size, DEFAULT_INVENTORY_SIZE);
    }
}
