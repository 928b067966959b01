//! Ability definitions and the player's ability bar

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::buff::BuffEntry;
use super::damage::ability_power;
use crate::actor::stats::Attributes;

/// Number of ability slots on the bar
pub const MAX_ABILITY_SLOTS: usize = 4;

/// What an ability does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Hits every enemy within range
    Damage,
    /// Restores the caster's health
    Heal,
    /// Timed attribute bonus on the caster
    Buff,
    /// Timed attribute penalty on enemies within range
    Debuff,
}

fn default_mana_cost() -> i32 {
    10
}
fn default_cooldown() -> f32 {
    5.0
}
fn default_power() -> i32 {
    50
}
fn default_scaling() -> f32 {
    1.0
}
fn default_range() -> f32 {
    5.0
}

/// An ability template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    /// Unique key, also the cooldown id
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: AbilityKind,
    #[serde(default = "default_mana_cost")]
    pub mana_cost: i32,
    #[serde(default = "default_cooldown")]
    pub cooldown: f32,
    #[serde(default = "default_power")]
    pub power: i32,
    /// Intelligence multiplier added to power
    #[serde(default = "default_scaling")]
    pub scaling: f32,
    #[serde(default = "default_range")]
    pub range: f32,
    /// Buff/debuff length in seconds
    #[serde(default)]
    pub duration: f32,
    /// Buff/debuff attribute changes
    #[serde(default)]
    pub deltas: Attributes,
}

impl Ability {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: AbilityKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            kind,
            mana_cost: default_mana_cost(),
            cooldown: default_cooldown(),
            power: default_power(),
            scaling: default_scaling(),
            range: default_range(),
            duration: 0.0,
            deltas: Attributes::ZERO,
        }
    }

    /// Damage or healing before mitigation for a caster with `intelligence`
    pub fn power_for(&self, intelligence: i32) -> i32 {
        ability_power(self.power, intelligence, self.scaling)
    }

    /// The buff this ability leaves behind, if it has a duration
    pub fn buff_entry(&self) -> Option<BuffEntry> {
        (self.duration > 0.0).then(|| BuffEntry::new(self.id.clone(), self.duration, self.deltas))
    }
}

/// Four slots of abilities
#[derive(Debug, Clone, Default)]
pub struct AbilityBar {
    slots: [Option<Arc<Ability>>; MAX_ABILITY_SLOTS],
}

impl AbilityBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Ability>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Put an ability in a slot, returning the previous one
    pub fn set(&mut self, index: usize, ability: Arc<Ability>) -> Option<Option<Arc<Ability>>> {
        let slot = self.slots.get_mut(index)?;
        Some(slot.replace(ability))
    }

    /// Put an ability in the first empty slot. Returns the slot index.
    pub fn learn(&mut self, ability: Arc<Ability>) -> Option<usize> {
        if self.knows(&ability.id) {
            return None;
        }
        let index = self.slots.iter().position(Option::is_none)?;
        self.slots[index] = Some(ability);
        Some(index)
    }

    pub fn knows(&self, ability_id: &str) -> bool {
        self.slots.iter().flatten().any(|a| a.id == ability_id)
    }

    /// Ability ids in slot order
    pub fn ids(&self) -> Vec<Option<String>> {
        self.slots.iter().map(|s| s.as_ref().map(|a| a.id.clone())).collect()
    }
}
