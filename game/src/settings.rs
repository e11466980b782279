use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::coordinate::Coordinate;
use crate::tileset::TilesetConfig;

pub const MIN_MAP_SIDE: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_map_side")]
    pub map_width: usize,
    #[serde(default = "default_map_side")]
    pub map_height: usize,
    #[serde(default = "default_fall_delay_ms")]
    pub fall_delay_ms: u64,
    /// Seed for the piece generator. 0 picks a fixed built-in seed.
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub tileset: TilesetConfig,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            map_width: default_map_side(),
            map_height: default_map_side(),
            fall_delay_ms: default_fall_delay_ms(),
            seed: 0,
            tileset: TilesetConfig::default(),
        }
    }
}

impl GameSettings {
    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        self.map_width = self.map_width.max(MIN_MAP_SIDE);
        self.map_height = self.map_height.max(MIN_MAP_SIDE);
        self.fall_delay_ms = self.fall_delay_ms.max(1);
        self.tileset.fall_height = self.tileset.fall_height.max(1);
        self.tileset.landing_ceiling = self.tileset.landing_ceiling.max(self.tileset.fall_height);
        self
    }

    pub fn spawn_point(&self) -> Coordinate {
        Coordinate::new((self.map_width / 2) as i32, (self.map_height / 2) as i32)
    }

    pub fn fall_delay(&self) -> Duration {
        Duration::from_millis(self.fall_delay_ms)
    }
}

fn default_version() -> u32 {
    1
}

fn default_map_side() -> usize {
    10
}

fn default_fall_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        if let Some(explicit) = std::env::var_os("ISOTET_SETTINGS_PATH") {
            return Self::new(explicit);
        }

        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));

        Self::new(base.join("isotet").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable files fall back to defaults.
    pub fn load(&self) -> GameSettings {
        let Ok(bytes) = fs::read(&self.path) else {
            debug!(path = %self.path.display(), "no settings file, using defaults");
            return GameSettings::default();
        };
        match serde_json::from_slice::<GameSettings>(&bytes) {
            Ok(settings) => settings.sanitized(),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unparsable settings");
                GameSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &GameSettings) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(settings)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_clamps_board_and_timing() {
        let settings = GameSettings {
            version: 7,
            map_width: 1,
            map_height: 0,
            fall_delay_ms: 0,
            seed: 3,
            tileset: TilesetConfig {
                fall_height: 0,
                landing_ceiling: 0,
                ..TilesetConfig::default()
            },
        }
        .sanitized();

        assert_eq!(settings.version, 1);
        assert_eq!(settings.map_width, MIN_MAP_SIDE);
        assert_eq!(settings.map_height, MIN_MAP_SIDE);
        assert_eq!(settings.fall_delay_ms, 1);
        assert_eq!(settings.tileset.fall_height, 1);
        assert_eq!(settings.tileset.landing_ceiling, 1);
        assert_eq!(settings.seed, 3);
    }

    #[test]
    fn landing_ceiling_never_below_fall_height() {
        let settings = GameSettings {
            tileset: TilesetConfig {
                fall_height: 12,
                ..TilesetConfig::default()
            },
            ..GameSettings::default()
        }
        .sanitized();
        assert_eq!(settings.tileset.landing_ceiling, 12);
    }

    #[test]
    fn serde_defaults_fill_missing_fields() {
        let parsed: GameSettings =
            serde_json::from_str(r#"{"map_width":6,"tileset":{"fall_height":3}}"#)
                .expect("settings JSON should parse");
        assert_eq!(parsed.map_width, 6);
        assert_eq!(parsed.map_height, 10);
        assert_eq!(parsed.fall_delay_ms, 1000);
        assert_eq!(parsed.tileset.fall_height, 3);
        assert_eq!(parsed.tileset.landing_ceiling, 10);
        assert_eq!(parsed.tileset.layer_bonus, 100);
    }

    #[test]
    fn spawn_point_is_board_centre() {
        let settings = GameSettings {
            map_width: 7,
            map_height: 10,
            ..GameSettings::default()
        };
        assert_eq!(settings.spawn_point(), Coordinate::new(3, 5));
    }

    #[test]
    fn store_round_trips_and_tolerates_garbage() {
        let dir = std::env::temp_dir().join(format!("isotet-settings-{}", std::process::id()));
        let store = SettingsStore::new(dir.join("settings.json"));

        let settings = GameSettings {
            seed: 42,
            map_width: 8,
            ..GameSettings::default()
        };
        store.save(&settings).expect("save settings");
        assert_eq!(store.load(), settings);

        fs::write(store.path(), "{ not json").expect("write garbage");
        assert_eq!(store.load(), GameSettings::default());

        let _ = fs::remove_dir_all(&dir);
    }
}
