//! Experience curve, level-ups, and attribute points

use serde::{Deserialize, Serialize};
use tracing::info;

use super::stats::{Attribute, StatBlock};
use crate::error::GameError;

/// Attribute points granted per level gained
pub const POINTS_PER_LEVEL: u32 = 5;

/// Attribute points a new character starts with
pub const STARTING_ATTRIBUTE_POINTS: u32 = 5;

/// Experience needed to reach `level` from the level before it
pub fn experience_required_for_level(level: u32) -> u32 {
    100 * level + 10 * level * level
}

/// One level gained during [`Progression::gain_experience`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub new_level: u32,
    pub health_gained: i32,
    pub mana_gained: i32,
}

/// Level, experience, and unspent points for one actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub level: u32,
    /// Experience toward the next level
    pub experience: u32,
    /// Experience earned over the whole lifetime
    pub total_experience: u64,
    pub attribute_points: u32,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
            total_experience: 0,
            attribute_points: STARTING_ATTRIBUTE_POINTS,
        }
    }
}

impl Progression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at a given level with no points to spend (enemies, fixtures)
    pub fn at_level(level: u32) -> Self {
        Self {
            level: level.max(1),
            experience: 0,
            total_experience: 0,
            attribute_points: 0,
        }
    }

    /// Threshold for the next level
    pub fn experience_to_next_level(&self) -> u32 {
        experience_required_for_level(self.level + 1)
    }

    /// Progress toward the next level (0.0 - 1.0)
    pub fn level_progress(&self) -> f32 {
        let needed = self.experience_to_next_level();
        if needed == 0 {
            return 0.0;
        }
        (self.experience as f32 / needed as f32).min(1.0)
    }

    /// Add experience and resolve every level-up it pays for.
    ///
    /// Each level-up recalculates `stats` and restores only the increase in
    /// maximum health and mana.
    pub fn gain_experience(&mut self, stats: &mut StatBlock, amount: u32) -> Vec<LevelUp> {
        self.experience += amount;
        self.total_experience += amount as u64;

        let mut gained = Vec::new();
        while self.experience >= self.experience_to_next_level() {
            self.experience -= self.experience_to_next_level();
            gained.push(self.level_up(stats));
        }
        gained
    }

    fn level_up(&mut self, stats: &mut StatBlock) -> LevelUp {
        self.level += 1;
        self.attribute_points += POINTS_PER_LEVEL;

        let old_health = stats.max_health();
        let old_mana = stats.max_mana();
        stats.recalculate();

        let health_gained = stats.heal(stats.max_health() - old_health);
        let mana_gained = stats.restore_mana(stats.max_mana() - old_mana);

        info!("Level up! Now level {}", self.level);
        LevelUp {
            new_level: self.level,
            health_gained,
            mana_gained,
        }
    }

    /// Spend one unspent point on `attribute`
    pub fn spend_attribute_point(
        &mut self,
        stats: &mut StatBlock,
        attribute: Attribute,
    ) -> Result<(), GameError> {
        if self.attribute_points == 0 {
            return Err(GameError::NoAttributePoints);
        }
        self.attribute_points -= 1;
        stats.add_to_base(attribute, 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::stats::{Attributes, StatProfile};

    fn stats() -> StatBlock {
        StatBlock::new(StatProfile::static_player(), Attributes::uniform(10))
    }

    #[test]
    fn test_curve() {
        assert_eq!(experience_required_for_level(1), 110);
        assert_eq!(experience_required_for_level(2), 240);
        assert_eq!(experience_required_for_level(3), 390);
    }

    #[test]
    fn test_exact_threshold_levels_once() {
        let mut stats = stats();
        let mut progression = Progression::new();
        let start_points = progression.attribute_points;

        let gained = progression.gain_experience(&mut stats, experience_required_for_level(2));

        assert_eq!(gained.len(), 1);
        assert_eq!(progression.level, 2);
        assert_eq!(progression.experience, 0);
        assert_eq!(progression.attribute_points, start_points + 5);
    }

    #[test]
    fn test_overflow_multiple_levels() {
        let mut stats = stats();
        let mut progression = Progression::new();

        // 240 to level 2, 390 to level 3, 10 left over
        let gained = progression.gain_experience(&mut stats, 640);
        assert_eq!(gained.len(), 2);
        assert_eq!(gained[1].new_level, 3);
        assert_eq!(progression.level, 3);
        assert_eq!(progression.experience, 10);
        assert_eq!(progression.total_experience, 640);
    }

    #[test]
    fn test_below_threshold_no_level() {
        let mut stats = stats();
        let mut progression = Progression::new();
        assert!(progression.gain_experience(&mut stats, 239).is_empty());
        assert_eq!(progression.level, 1);
        assert!((progression.level_progress() - 239.0 / 240.0).abs() < 1e-6);
    }

    #[test]
    fn test_level_up_does_not_refill() {
        let mut stats = stats();
        let mut progression = Progression::new();
        stats.take_damage(105);
        let hurt = stats.current_health();

        progression.gain_experience(&mut stats, 240);
        // Attributes unchanged by the level itself, so nothing is restored
        assert_eq!(stats.current_health(), hurt);
    }

    #[test]
    fn test_spend_points() {
        let mut stats = stats();
        let mut progression = Progression::new();
        progression.attribute_points = 1;

        progression
            .spend_attribute_point(&mut stats, Attribute::Vitality)
            .unwrap();
        assert_eq!(stats.base().vitality, 11);
        assert_eq!(stats.max_health(), 210);

        let err = progression.spend_attribute_point(&mut stats, Attribute::Strength);
        assert!(matches!(err, Err(GameError::NoAttributePoints)));
        assert_eq!(stats.base().strength, 10);
    }
}
