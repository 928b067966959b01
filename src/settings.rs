//! Driver settings with persistence
//!
//! Settings are saved to `~/.config/ashen/settings.toml`

use std::fs;
use std::path::{Path, PathBuf};

use ashen_core::TimeConfig;
use ashen_game::{CooldownScope, WorldConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All driver settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub simulation: SimulationSettings,
    pub combat: CombatSettings,
    pub save: SaveSettings,
}

impl GameSettings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ashen"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load from an explicit file, falling back to defaults on any problem
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(dir) = Self::config_dir() else {
            anyhow::bail!("Could not determine config directory");
        };
        self.save_to(&dir.join("settings.toml"))
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Clock configuration for the simulation loop
    pub fn time_config(&self) -> TimeConfig {
        TimeConfig {
            time_scale: self.simulation.time_scale,
            fixed_timestep: 1.0 / self.simulation.tick_rate.max(1) as f32,
            max_delta_time: self.simulation.max_delta,
        }
    }

    /// Rules handed to the world
    pub fn world_config(&self) -> WorldConfig {
        let mut config = WorldConfig {
            seed: self.simulation.seed,
            cooldown_scope: self.combat.cooldown_scope,
            respawn_delay: self.combat.respawn_delay,
            despawn_delay: self.combat.despawn_delay,
            basic_attack_range: self.combat.basic_attack_range,
            basic_attack_cooldown: self.combat.basic_attack_cooldown,
            ..WorldConfig::default()
        };
        config.player_profile.hit_invulnerability = self.combat.invulnerability_window;
        config
    }
}

/// Simulation clock settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Fixed simulation steps per second
    pub tick_rate: u32,
    /// Time scale multiplier (affects gameplay speed)
    pub time_scale: f32,
    /// Largest frame delta fed to the clock, in seconds
    pub max_delta: f32,
    /// Seed for every random draw
    pub seed: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_rate: 30,
            time_scale: 1.0,
            max_delta: 0.25,
            seed: 0,
        }
    }
}

/// Combat rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatSettings {
    pub cooldown_scope: CooldownScope,
    /// Seconds of invulnerability after the player is hit
    pub invulnerability_window: f32,
    pub respawn_delay: f32,
    pub despawn_delay: f32,
    pub basic_attack_range: f32,
    pub basic_attack_cooldown: f32,
}

impl Default for CombatSettings {
    fn default() -> Self {
        let world = WorldConfig::default();
        Self {
            cooldown_scope: world.cooldown_scope,
            invulnerability_window: world.player_profile.hit_invulnerability,
            respawn_delay: world.respawn_delay,
            despawn_delay: world.despawn_delay,
            basic_attack_range: world.basic_attack_range,
            basic_attack_cooldown: world.basic_attack_cooldown,
        }
    }
}

/// Save settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveSettings {
    /// Auto-save enabled
    pub auto_save: bool,
    /// Auto-save interval in seconds
    pub auto_save_interval: u32,
    /// Auto-saves kept before the oldest is deleted
    pub keep_auto_saves: usize,
}

impl Default for SaveSettings {
    fn default() -> Self {
        Self {
            auto_save: true,
            auto_save_interval: 300, // 5 minutes
            keep_auto_saves: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_world() {
        let settings = GameSettings::default();
        assert_eq!(settings.world_config(), WorldConfig::default());

        let time = settings.time_config();
        assert!((time.fixed_timestep - 1.0 / 30.0).abs() < 1e-6);
        assert!(time.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings: GameSettings = toml::from_str(
            r#"
            [combat]
            cooldown_scope = "shared"
            respawn_delay = 5.0
            "#,
        )
        .unwrap();
        assert_eq!(settings.combat.cooldown_scope, CooldownScope::Shared);
        assert_eq!(settings.combat.respawn_delay, 5.0);
        assert_eq!(settings.combat.basic_attack_range, 2.0);
        assert_eq!(settings.save.keep_auto_saves, 5);
        assert_eq!(settings.world_config().cooldown_scope, CooldownScope::Shared);
    }

    #[test]
    fn test_round_trip_through_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config").join("settings.toml");
        assert_eq!(GameSettings::load_from(&path), GameSettings::default());

        let mut settings = GameSettings::default();
        settings.simulation.seed = 42;
        settings.save_to(&path).unwrap();
        assert_eq!(GameSettings::load_from(&path), settings);

        fs::write(&path, "not [valid toml").unwrap();
        assert_eq!(GameSettings::load_from(&path), GameSettings::default());
    }
}
