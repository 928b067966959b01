//! Actors: anything with combat stats
//!
//! Every actor carries a stat block, progression and its own cooldowns. The
//! role-specific parts (the player's bag and gear, an enemy's brain and
//! template) live in [`Role`].

pub mod progression;
pub mod stats;

use std::collections::BTreeSet;
use std::sync::Arc;

use ashen_core::{EntityId, Vec3};

use crate::combat::ability::AbilityBar;
use crate::combat::cooldown::CooldownRegistry;
use crate::combat::equipment::EquipmentSet;
use crate::combat::inventory::Inventory;
use crate::enemy::{EnemyBrain, EnemyProfile};
use crate::environment::Faction;
pub use progression::{LevelUp, Progression};
pub use stats::{Attribute, Attributes, StatBlock, StatProfile};

/// Lifetime tallies kept for the save record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub enemies_killed: u32,
    pub items_collected: u32,
    pub quests_completed: u32,
}

/// Parts only the player has
#[derive(Debug, Clone)]
pub struct Hero {
    pub equipment: EquipmentSet,
    pub inventory: Inventory,
    pub abilities: AbilityBar,
    pub gold: u64,
    pub counters: Counters,
    /// Keys granted by quest access rewards
    pub unlocked: BTreeSet<String>,
    /// Where the player comes back after dying
    pub spawn: Vec3,
    /// Seconds until respawn while dead
    pub respawn_in: Option<f32>,
}

impl Hero {
    pub fn new(inventory_size: usize, spawn: Vec3) -> Self {
        Self {
            equipment: EquipmentSet::new(),
            inventory: Inventory::new(inventory_size),
            abilities: AbilityBar::new(),
            gold: 0,
            counters: Counters::default(),
            unlocked: BTreeSet::new(),
            spawn,
            respawn_in: None,
        }
    }
}

/// Parts only enemies have
#[derive(Debug, Clone)]
pub struct Foe {
    pub profile: Arc<EnemyProfile>,
    pub brain: EnemyBrain,
    /// Seconds until the corpse is removed
    pub despawn_in: Option<f32>,
}

#[derive(Debug, Clone)]
pub enum Role {
    Player(Box<Hero>),
    Enemy(Box<Foe>),
}

/// One participant in the simulation
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: EntityId,
    pub name: String,
    pub stats: StatBlock,
    pub progression: Progression,
    /// Used when cooldowns are scoped per actor
    pub cooldowns: CooldownRegistry,
    pub role: Role,
}

impl Actor {
    pub fn faction(&self) -> Faction {
        match self.role {
            Role::Player(_) => Faction::Player,
            Role::Enemy(_) => Faction::Enemy,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.stats.is_alive()
    }

    pub fn level(&self) -> u32 {
        self.progression.level
    }

    pub fn hero(&self) -> Option<&Hero> {
        match &self.role {
            Role::Player(hero) => Some(&**hero),
            Role::Enemy(_) => None,
        }
    }

    pub fn hero_mut(&mut self) -> Option<&mut Hero> {
        match &mut self.role {
            Role::Player(hero) => Some(&mut **hero),
            Role::Enemy(_) => None,
        }
    }

    pub fn foe(&self) -> Option<&Foe> {
        match &self.role {
            Role::Enemy(foe) => Some(&**foe),
            Role::Player(_) => None,
        }
    }

    pub fn foe_mut(&mut self) -> Option<&mut Foe> {
        match &mut self.role {
            Role::Enemy(foe) => Some(&mut **foe),
            Role::Player(_) => None,
        }
    }

    /// Base attributes with equipment bonuses taken back out
    pub fn natural_attributes(&self) -> Attributes {
        let mut attributes = self.stats.base();
        if let Some(hero) = self.hero() {
            for (_, item) in hero.equipment.iter() {
                for modifier in &item.stat_modifiers {
                    if let Some(attribute) = modifier.stat.attribute() {
                        *attributes.get_mut(attribute) -= modifier.value;
                    }
                }
            }
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::item::{Item, ItemType, StatType};

    #[test]
    fn test_natural_attributes_ignore_gear() {
        let mut actor = Actor {
            id: EntityId::from_u128(1),
            name: "Ash".into(),
            stats: StatBlock::player(),
            progression: Progression::new(),
            cooldowns: CooldownRegistry::new(),
            role: Role::Player(Box::new(Hero::new(30, Vec3::ZERO))),
        };
        let ring = Arc::new(
            Item::new("ring", "Ring", ItemType::Armor)
                .with_slot(crate::combat::equipment::EquipmentSlot::Ring)
                .with_modifier(StatType::Strength, 4),
        );

        let Role::Player(hero) = &mut actor.role else {
            unreachable!()
        };
        hero.equipment.equip(ring, &mut actor.stats).unwrap();

        assert_eq!(actor.stats.base().strength, 14);
        assert_eq!(actor.natural_attributes().strength, 10);
        assert_eq!(actor.faction(), Faction::Player);
    }
}
