//! Damage calculation
//!
//! Pure functions apart from the critical roll, which always draws from the
//! random source passed in so results can be reproduced with a seeded rng.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Armor constant in `armor / (armor + ARMOR_CONSTANT)`
pub const ARMOR_CONSTANT: f32 = 100.0;

/// Damage bonus per attacker level above 1
pub const LEVEL_DAMAGE_BONUS: f32 = 0.1;

/// Random bonus range added to a basic attack
pub const BASIC_ATTACK_SPREAD: i32 = 5;

/// Outcome of one damage calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRoll {
    pub amount: i32,
    pub is_critical: bool,
}

/// Fraction of incoming damage removed by armor (0.0 - 1.0)
pub fn armor_reduction(armor: i32) -> f32 {
    let armor = armor.max(0) as f32;
    armor / (armor + ARMOR_CONSTANT)
}

/// Uniform draw below `chance`
pub fn roll_critical(chance: f32, rng: &mut impl Rng) -> bool {
    rng.gen::<f32>() < chance
}

/// Full damage pipeline: level scaling, armor, crit, rounding, floor of 1
pub fn compute_damage(
    base: i32,
    attacker_level: u32,
    defender_armor: i32,
    critical_chance: f32,
    critical_multiplier: f32,
    rng: &mut impl Rng,
) -> DamageRoll {
    let level_bonus = LEVEL_DAMAGE_BONUS * (attacker_level.max(1) - 1) as f32;
    let mut damage = base as f32 * (1.0 + level_bonus);
    damage *= 1.0 - armor_reduction(defender_armor);

    let is_critical = roll_critical(critical_chance, rng);
    if is_critical {
        damage *= critical_multiplier;
    }

    DamageRoll {
        amount: (damage.round() as i32).max(1),
        is_critical,
    }
}

/// Base for a basic weapon swing: strength plus a small random spread
pub fn basic_attack_base(strength: i32, rng: &mut impl Rng) -> i32 {
    strength + rng.gen_range(0..BASIC_ATTACK_SPREAD)
}

/// Base for a damage or heal ability
pub fn ability_power(power: i32, intelligence: i32, scaling: f32) -> i32 {
    (power as f32 + intelligence as f32 * scaling).round() as i32
}
