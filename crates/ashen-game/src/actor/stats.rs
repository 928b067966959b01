//! Attribute-driven stat block
//!
//! Holds the four base attributes of an actor, the buffs layered on top of
//! them, and the derived resources (health, mana, armor, crit) computed from
//! both. Derived values are only ever written by [`StatBlock::recalculate`].

use serde::{Deserialize, Serialize};

use crate::combat::buff::{BuffEntry, BuffLedger};

/// The four base attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Strength,
    Dexterity,
    Intelligence,
    Vitality,
}

impl Attribute {
    /// All attribute variants
    pub fn all() -> &'static [Attribute] {
        &[
            Self::Strength,
            Self::Dexterity,
            Self::Intelligence,
            Self::Vitality,
        ]
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Strength => "Strength",
            Self::Dexterity => "Dexterity",
            Self::Intelligence => "Intelligence",
            Self::Vitality => "Vitality",
        }
    }
}

/// A value for each attribute. Used both for base values and for deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default)]
    pub strength: i32,
    #[serde(default)]
    pub dexterity: i32,
    #[serde(default)]
    pub intelligence: i32,
    #[serde(default)]
    pub vitality: i32,
}

impl Attributes {
    pub const ZERO: Attributes = Attributes::new(0, 0, 0, 0);

    pub const fn new(strength: i32, dexterity: i32, intelligence: i32, vitality: i32) -> Self {
        Self {
            strength,
            dexterity,
            intelligence,
            vitality,
        }
    }

    /// Same value for every attribute
    pub const fn uniform(value: i32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Dexterity => self.dexterity,
            Attribute::Intelligence => self.intelligence,
            Attribute::Vitality => self.vitality,
        }
    }

    pub fn get_mut(&mut self, attribute: Attribute) -> &mut i32 {
        match attribute {
            Attribute::Strength => &mut self.strength,
            Attribute::Dexterity => &mut self.dexterity,
            Attribute::Intelligence => &mut self.intelligence,
            Attribute::Vitality => &mut self.vitality,
        }
    }

    /// Add another set of values onto this one
    pub fn add(&mut self, other: &Attributes) {
        self.strength += other.strength;
        self.dexterity += other.dexterity;
        self.intelligence += other.intelligence;
        self.vitality += other.vitality;
    }

    /// Sum of two sets
    pub fn combined(&self, other: &Attributes) -> Attributes {
        let mut result = *self;
        result.add(other);
        result
    }

    /// True when every value is zero
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// True when at least one value is negative (a debuff)
    pub fn has_negative(&self) -> bool {
        Attribute::all().iter().any(|a| self.get(*a) < 0)
    }
}

/// Rules that turn attributes into derived resources.
///
/// Players derive health from vitality; enemies use a level-scaled flat base
/// and ignore vitality. Both go through the same recalculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatProfile {
    pub base_health: i32,
    pub health_per_vitality: i32,
    pub base_mana: i32,
    pub mana_per_intelligence: i32,
    /// Armor gained per point of dexterity is `dexterity / armor_dexterity_divisor`
    pub armor_dexterity_divisor: i32,
    pub base_critical_chance: f32,
    pub critical_chance_per_dexterity: f32,
    pub critical_multiplier: f32,
    /// Health points regenerated per second while alive
    pub health_regen_rate: f32,
    /// Mana points regenerated per second while alive
    pub mana_regen_rate: f32,
    /// Seconds of invulnerability granted after taking a hit
    pub hit_invulnerability: f32,
}

impl StatProfile {
    /// Rules for the player character
    pub fn player() -> Self {
        Self {
            base_health: 100,
            health_per_vitality: 10,
            base_mana: 50,
            mana_per_intelligence: 5,
            armor_dexterity_divisor: 2,
            base_critical_chance: 0.05,
            critical_chance_per_dexterity: 0.002,
            critical_multiplier: 2.0,
            health_regen_rate: 1.0,
            mana_regen_rate: 2.0,
            hit_invulnerability: 0.5,
        }
    }

    /// Rules for an enemy of the given level
    pub fn enemy(level: u32) -> Self {
        let scale = 1.2_f64.powi(level.max(1) as i32 - 1);
        Self {
            base_health: (100.0 * scale).round() as i32,
            health_per_vitality: 0,
            base_mana: 0,
            mana_per_intelligence: 0,
            armor_dexterity_divisor: 2,
            base_critical_chance: 0.05,
            critical_chance_per_dexterity: 0.002,
            critical_multiplier: 1.5,
            health_regen_rate: 0.0,
            mana_regen_rate: 0.0,
            hit_invulnerability: 0.0,
        }
    }

    /// Player rules with regeneration and hit invulnerability turned off
    pub fn static_player() -> Self {
        Self {
            health_regen_rate: 0.0,
            mana_regen_rate: 0.0,
            hit_invulnerability: 0.0,
            ..Self::player()
        }
    }
}

impl Default for StatProfile {
    fn default() -> Self {
        Self::player()
    }
}

/// Result of a call to [`StatBlock::take_damage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DamageTaken {
    /// Health actually removed
    pub dealt: i32,
    /// Whether this hit killed the actor
    pub died: bool,
}

/// What happened during one [`StatBlock::tick`]
#[derive(Debug, Clone, Default)]
pub struct StatTick {
    pub expired_buffs: Vec<BuffEntry>,
    pub health_regenerated: i32,
    pub mana_regenerated: i32,
}

/// Base attributes, buffs, and derived resources for one actor
#[derive(Debug, Clone)]
pub struct StatBlock {
    profile: StatProfile,
    base: Attributes,
    /// Flat armor from equipment, added after the dexterity term
    armor_bonus: i32,
    buffs: BuffLedger,

    max_health: i32,
    current_health: i32,
    max_mana: i32,
    current_mana: i32,
    armor: i32,
    critical_chance: f32,

    dead: bool,
    invulnerable_for: f32,
    health_regen_timer: f32,
    mana_regen_timer: f32,
}

impl StatBlock {
    /// Build a block at full health and mana
    pub fn new(profile: StatProfile, base: Attributes) -> Self {
        let mut block = Self {
            profile,
            base,
            armor_bonus: 0,
            buffs: BuffLedger::new(),
            max_health: 0,
            current_health: 0,
            max_mana: 0,
            current_mana: 0,
            armor: 0,
            critical_chance: 0.0,
            dead: false,
            invulnerable_for: 0.0,
            health_regen_timer: 0.0,
            mana_regen_timer: 0.0,
        };
        block.recalculate();
        block
    }

    /// Default player block: 10 in every attribute
    pub fn player() -> Self {
        Self::new(StatProfile::player(), Attributes::uniform(10))
    }

    pub fn profile(&self) -> &StatProfile {
        &self.profile
    }

    /// Swap derivation rules (enemy level change) and recalculate
    pub fn set_profile(&mut self, profile: StatProfile) {
        self.profile = profile;
        self.recalculate();
    }

    /// Base attributes, including equipment deltas
    pub fn base(&self) -> Attributes {
        self.base
    }

    /// Base plus the deltas of every active buff
    pub fn total(&self, attribute: Attribute) -> i32 {
        self.base.get(attribute) + self.buffs.total_delta(attribute)
    }

    pub fn totals(&self) -> Attributes {
        self.base.combined(&self.buffs.totals())
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn current_health(&self) -> i32 {
        self.current_health
    }

    pub fn max_mana(&self) -> i32 {
        self.max_mana
    }

    pub fn current_mana(&self) -> i32 {
        self.current_mana
    }

    pub fn armor(&self) -> i32 {
        self.armor
    }

    pub fn armor_bonus(&self) -> i32 {
        self.armor_bonus
    }

    pub fn critical_chance(&self) -> f32 {
        self.critical_chance
    }

    pub fn critical_multiplier(&self) -> f32 {
        self.profile.critical_multiplier
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_for > 0.0
    }

    /// Health as a 0.0-1.0 fraction
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0 {
            return 0.0;
        }
        (self.current_health as f32 / self.max_health as f32).clamp(0.0, 1.0)
    }

    /// Mana as a 0.0-1.0 fraction
    pub fn mana_fraction(&self) -> f32 {
        if self.max_mana <= 0 {
            return 0.0;
        }
        (self.current_mana as f32 / self.max_mana as f32).clamp(0.0, 1.0)
    }

    /// Recompute derived resources from base attributes and buffs.
    ///
    /// Current health and mana keep their ratio to the maximum when the
    /// maximum changes.
    pub fn recalculate(&mut self) {
        let totals = self.totals();
        let p = &self.profile;

        let new_max_health = (p.base_health + p.health_per_vitality * totals.vitality).max(0);
        let new_max_mana = (p.base_mana + p.mana_per_intelligence * totals.intelligence).max(0);
        let divisor = p.armor_dexterity_divisor.max(1);

        self.armor = totals.dexterity / divisor + self.armor_bonus;
        self.critical_chance = p.base_critical_chance + p.critical_chance_per_dexterity * totals.dexterity as f32;

        self.current_health = rescale(self.current_health, self.max_health, new_max_health);
        self.current_mana = rescale(self.current_mana, self.max_mana, new_max_mana);
        self.max_health = new_max_health;
        self.max_mana = new_max_mana;

        if self.dead {
            self.current_health = 0;
        }
    }

    /// Shift one base attribute (spent points, equipment, permanent potions)
    pub fn add_to_base(&mut self, attribute: Attribute, delta: i32) {
        *self.base.get_mut(attribute) += delta;
        self.recalculate();
    }

    /// Shift the flat armor bonus
    pub fn add_armor_bonus(&mut self, delta: i32) {
        self.armor_bonus += delta;
        self.recalculate();
    }

    /// Apply a hit. Armor removes a flat amount, but at least 1 always lands.
    pub fn take_damage(&mut self, amount: i32) -> DamageTaken {
        if self.dead || self.is_invulnerable() {
            return DamageTaken::default();
        }

        let mitigated = (amount - self.armor).max(1);
        let before = self.current_health;
        self.current_health = (self.current_health - mitigated).max(0);

        if self.profile.hit_invulnerability > 0.0 {
            self.invulnerable_for = self.profile.hit_invulnerability;
        }

        let died = self.current_health == 0;
        if died {
            self.dead = true;
        }

        DamageTaken {
            dealt: before - self.current_health,
            died,
        }
    }

    /// Heal. Returns the amount actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if self.dead || amount <= 0 {
            return 0;
        }
        let before = self.current_health;
        self.current_health = (self.current_health + amount).min(self.max_health);
        self.current_health - before
    }

    /// Spend mana. Returns false and changes nothing if there is not enough.
    pub fn use_mana(&mut self, amount: i32) -> bool {
        if amount < 0 || self.current_mana < amount {
            return false;
        }
        self.current_mana -= amount;
        true
    }

    /// Restore mana. Returns the amount actually restored.
    pub fn restore_mana(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let before = self.current_mana;
        self.current_mana = (self.current_mana + amount).min(self.max_mana);
        self.current_mana - before
    }

    /// Block incoming damage for `seconds`
    pub fn set_invulnerable(&mut self, seconds: f32) {
        self.invulnerable_for = self.invulnerable_for.max(seconds);
    }

    /// Bring a dead actor back with a fraction of its resources
    pub fn revive(&mut self, fraction: f32) {
        self.dead = false;
        self.invulnerable_for = 0.0;
        self.current_health = ((self.max_health as f32 * fraction).round() as i32).clamp(1, self.max_health.max(1));
        self.current_mana = ((self.max_mana as f32 * fraction).round() as i32).clamp(0, self.max_mana);
    }

    /// Refill health and mana
    pub fn full_restore(&mut self) {
        if self.dead {
            return;
        }
        self.current_health = self.max_health;
        self.current_mana = self.max_mana;
    }

    /// Overwrite current resources from a saved record. Values are clamped.
    pub fn restore_resources(&mut self, health: i32, mana: i32) {
        self.current_health = health.clamp(0, self.max_health);
        self.current_mana = mana.clamp(0, self.max_mana);
        self.dead = self.current_health == 0;
    }

    pub fn buffs(&self) -> &BuffLedger {
        &self.buffs
    }

    /// Cap concurrent buffs; the oldest entry is evicted on overflow
    pub fn set_buff_cap(&mut self, cap: Option<usize>) {
        self.buffs.set_max_entries(cap);
        self.recalculate();
    }

    /// Add a buff. It takes effect immediately.
    pub fn apply_buff(&mut self, entry: BuffEntry) {
        self.buffs.apply(entry);
        self.recalculate();
    }

    pub fn has_buff(&self, source: &str) -> bool {
        self.buffs.has(source)
    }

    /// Remove every buff from `source`. Returns how many were removed.
    pub fn remove_buff(&mut self, source: &str) -> usize {
        let removed = self.buffs.remove(source);
        if removed > 0 {
            self.recalculate();
        }
        removed
    }

    /// Remove every buff that lowers an attribute
    pub fn remove_debuffs(&mut self) -> usize {
        let removed = self.buffs.remove_where(|entry| entry.deltas.has_negative());
        if removed > 0 {
            self.recalculate();
        }
        removed
    }

    /// Advance buff durations, regeneration, and invulnerability by `dt` seconds
    pub fn tick(&mut self, dt: f32) -> StatTick {
        let mut report = StatTick::default();

        if self.invulnerable_for > 0.0 {
            self.invulnerable_for = (self.invulnerable_for - dt).max(0.0);
        }

        report.expired_buffs = self.buffs.tick(dt);
        if !report.expired_buffs.is_empty() {
            self.recalculate();
        }

        if self.dead {
            return report;
        }

        let (health_gain, health_timer) = regen_points(
            self.health_regen_timer + dt,
            self.profile.health_regen_rate,
            self.max_health - self.current_health,
        );
        self.health_regen_timer = health_timer;
        self.current_health += health_gain;
        report.health_regenerated = health_gain;

        let (mana_gain, mana_timer) = regen_points(
            self.mana_regen_timer + dt,
            self.profile.mana_regen_rate,
            self.max_mana - self.current_mana,
        );
        self.mana_regen_timer = mana_timer;
        self.current_mana += mana_gain;
        report.mana_regenerated = mana_gain;

        report
    }
}

impl Default for StatBlock {
    fn default() -> Self {
        Self::player()
    }
}

fn rescale(current: i32, old_max: i32, new_max: i32) -> i32 {
    if old_max <= 0 {
        return new_max;
    }
    if old_max == new_max {
        return current.clamp(0, new_max);
    }
    let ratio = current as f64 / old_max as f64;
    ((new_max as f64 * ratio).round() as i32).clamp(0, new_max)
}

/// One point per `1/rate` seconds, never banking time while full
fn regen_points(timer: f32, rate: f32, missing: i32) -> (i32, f32) {
    if rate <= 0.0 || missing <= 0 {
        return (0, 0.0);
    }
    let interval = 1.0 / rate;
    let ticks = (timer / interval).floor() as i32;
    let gained = ticks.min(missing);
    if gained == missing {
        (gained, 0.0)
    } else {
        (gained, timer - ticks as f32 * interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_player() -> StatBlock {
        StatBlock::new(StatProfile::static_player(), Attributes::uniform(10))
    }

    #[test]
    fn test_derived_stats_from_attributes() {
        let stats = StatBlock::player();
        assert_eq!(stats.max_health(), 200);
        assert_eq!(stats.max_mana(), 100);
        assert_eq!(stats.armor(), 5);
        assert!((stats.critical_chance() - 0.07).abs() < 1e-6);
        assert_eq!(stats.current_health(), 200);
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let mut stats = quiet_player();
        stats.take_damage(77);
        stats.apply_buff(BuffEntry::new("might", 10.0, Attributes::new(3, 1, 0, 4)));
        let snapshot = (
            stats.max_health(),
            stats.current_health(),
            stats.max_mana(),
            stats.armor(),
            stats.critical_chance(),
        );
        stats.recalculate();
        stats.recalculate();
        assert_eq!(
            snapshot,
            (
                stats.max_health(),
                stats.current_health(),
                stats.max_mana(),
                stats.armor(),
                stats.critical_chance()
            )
        );
    }

    #[test]
    fn test_max_change_keeps_ratio() {
        let mut stats = quiet_player();
        // 200 max, drop to 100 (half), armor 5 so hit for 105
        stats.take_damage(105);
        assert_eq!(stats.current_health(), 100);

        stats.add_to_base(Attribute::Vitality, 10);
        assert_eq!(stats.max_health(), 300);
        assert_eq!(stats.current_health(), 150);
    }

    #[test]
    fn test_take_damage_floors_at_one_and_zero() {
        let mut stats = quiet_player();
        let hit = stats.take_damage(2);
        assert_eq!(hit.dealt, 1);

        let hit = stats.take_damage(10_000);
        assert!(hit.died);
        assert_eq!(stats.current_health(), 0);
        assert!(!stats.is_alive());

        // Dead actors ignore further damage and healing
        assert_eq!(stats.take_damage(50), DamageTaken::default());
        assert_eq!(stats.heal(50), 0);
        assert_eq!(stats.current_health(), 0);
    }

    #[test]
    fn test_heal_never_exceeds_max() {
        let mut stats = quiet_player();
        stats.take_damage(25);
        assert_eq!(stats.heal(1000), 20);
        assert_eq!(stats.current_health(), stats.max_health());
    }

    #[test]
    fn test_hit_invulnerability_window() {
        let mut stats = StatBlock::player();
        assert_eq!(stats.take_damage(30).dealt, 25);
        assert!(stats.is_invulnerable());
        assert_eq!(stats.take_damage(30).dealt, 0);

        stats.tick(0.5);
        assert!(!stats.is_invulnerable());
        assert_eq!(stats.take_damage(30).dealt, 25);
    }

    #[test]
    fn test_mana_spend_and_restore() {
        let mut stats = quiet_player();
        assert!(stats.use_mana(30));
        assert_eq!(stats.current_mana(), 70);
        assert!(!stats.use_mana(500));
        assert_eq!(stats.current_mana(), 70);
        assert_eq!(stats.restore_mana(100), 30);
    }

    #[test]
    fn test_buff_applies_and_expires() {
        let mut stats = quiet_player();
        stats.apply_buff(BuffEntry::new("stoneskin", 2.0, Attributes::new(0, 0, 0, 5)));
        assert_eq!(stats.total(Attribute::Vitality), 15);
        assert_eq!(stats.max_health(), 250);
        assert_eq!(stats.current_health(), 250);

        let report = stats.tick(1.0);
        assert!(report.expired_buffs.is_empty());
        let report = stats.tick(1.0);
        assert_eq!(report.expired_buffs.len(), 1);
        assert_eq!(stats.max_health(), 200);
        assert_eq!(stats.current_health(), 200);
    }

    #[test]
    fn test_regeneration() {
        let mut stats = StatBlock::player();
        stats.take_damage(15);
        stats.use_mana(10);
        let before = stats.current_health();

        let report = stats.tick(3.0);
        assert_eq!(report.health_regenerated, 3);
        assert_eq!(report.mana_regenerated, 6);
        assert_eq!(stats.current_health(), before + 3);
    }

    #[test]
    fn test_remove_debuffs_only() {
        let mut stats = quiet_player();
        stats.apply_buff(BuffEntry::new("curse", 10.0, Attributes::new(-2, 0, 0, 0)));
        stats.apply_buff(BuffEntry::new("bless", 10.0, Attributes::new(2, 0, 0, 0)));
        assert_eq!(stats.remove_debuffs(), 1);
        assert_eq!(stats.total(Attribute::Strength), 12);
    }

    #[test]
    fn test_revive_half_resources() {
        let mut stats = quiet_player();
        stats.take_damage(10_000);
        stats.revive(0.5);
        assert!(stats.is_alive());
        assert_eq!(stats.current_health(), 100);
        assert_eq!(stats.current_mana(), 50);
    }

    #[test]
    fn test_enemy_profile_scales_with_level() {
        let level_one = StatBlock::new(StatProfile::enemy(1), Attributes::ZERO);
        let level_three = StatBlock::new(StatProfile::enemy(3), Attributes::ZERO);
        assert_eq!(level_one.max_health(), 100);
        assert_eq!(level_three.max_health(), 144);
        assert_eq!(level_three.armor(), 0);
        assert_eq!(level_three.max_mana(), 0);
    }
}
