//! Enemy templates and level scaling

pub mod ai;

use serde::{Deserialize, Serialize};

use crate::actor::stats::{Attributes, StatBlock, StatProfile};
use crate::combat::loot::LootDropper;
pub use ai::{AiConfig, AiOutput, AiState, EnemyBrain};

/// Base experience reward at level 1
pub const BASE_EXPERIENCE_REWARD: f64 = 25.0;
/// Experience reward growth per level
pub const EXPERIENCE_SCALING: f64 = 1.1;
/// Base strike damage at level 1
pub const BASE_ENEMY_DAMAGE: i32 = 10;
/// Extra strike damage per level above 1
pub const DAMAGE_PER_LEVEL: i32 = 2;

fn default_level() -> u32 {
    1
}

/// Everything needed to spawn one kind of enemy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyProfile {
    pub id: String,
    pub name: String,
    /// Kill objectives match on this
    pub enemy_type: String,
    #[serde(default = "default_level")]
    pub level: u32,
    /// Flat damage reduction
    #[serde(default)]
    pub armor: i32,
    #[serde(default)]
    pub is_boss: bool,
    #[serde(default)]
    pub loot_table: Option<String>,
    #[serde(default)]
    pub loot: LootDropper,
    #[serde(default)]
    pub ai: AiConfig,
}

impl EnemyProfile {
    pub fn new(id: impl Into<String>, enemy_type: impl Into<String>, level: u32) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            enemy_type: enemy_type.into(),
            level: level.max(1),
            armor: 0,
            is_boss: false,
            loot_table: None,
            loot: LootDropper::default(),
            ai: AiConfig::default(),
        }
    }

    /// Change the level; derived numbers follow
    pub fn set_level(&mut self, level: u32) {
        self.level = level.max(1);
    }

    /// Damage of one strike before mitigation
    pub fn base_damage(&self) -> i32 {
        BASE_ENEMY_DAMAGE + (self.level.max(1) as i32 - 1) * DAMAGE_PER_LEVEL
    }

    /// Experience granted to whoever lands the killing blow
    pub fn experience_reward(&self) -> u32 {
        let scale = EXPERIENCE_SCALING.powi(self.level.max(1) as i32 - 1);
        (BASE_EXPERIENCE_REWARD * scale).round() as u32
    }

    /// Fresh stat block at full health
    pub fn stat_block(&self) -> StatBlock {
        let mut stats = StatBlock::new(StatProfile::enemy(self.level), Attributes::ZERO);
        stats.add_armor_bonus(self.armor);
        stats
    }

    /// Rescale an existing block after a level change, keeping the health ratio
    pub fn rescale(&self, stats: &mut StatBlock) {
        stats.set_profile(StatProfile::enemy(self.level));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_scaling() {
        let mut profile = EnemyProfile::new("wolf", "wolf", 1);
        assert_eq!(profile.base_damage(), 10);
        assert_eq!(profile.experience_reward(), 25);
        assert_eq!(profile.stat_block().max_health(), 100);

        profile.set_level(3);
        assert_eq!(profile.base_damage(), 14);
        assert_eq!(profile.experience_reward(), 30);
        assert_eq!(profile.stat_block().max_health(), 144);
    }

    #[test]
    fn test_rescale_keeps_ratio() {
        let mut profile = EnemyProfile::new("wolf", "wolf", 1);
        let mut stats = profile.stat_block();
        stats.take_damage(50);
        profile.set_level(2);
        profile.rescale(&mut stats);
        assert_eq!(stats.max_health(), 120);
        assert_eq!(stats.current_health(), 60);
    }

    #[test]
    fn test_armor_and_crit() {
        let mut profile = EnemyProfile::new("golem", "golem", 1);
        profile.armor = 4;
        let stats = profile.stat_block();
        assert_eq!(stats.armor(), 4);
        assert_eq!(stats.critical_multiplier(), 1.5);
        assert!(stats.is_alive());
    }

    #[test]
    fn test_from_json_defaults() {
        let profile: EnemyProfile =
            serde_json::from_str(r#"{ "id": "rat", "name": "Rat", "enemy_type": "rat" }"#).unwrap();
        assert_eq!(profile.level, 1);
        assert_eq!(profile.loot.drop_chance, 0.7);
        assert_eq!(profile.ai.detection_range, 5.0);
    }
}
