//! Item data model
//!
//! Items are immutable templates shared through `Arc` by inventories and
//! equipment. They are loaded once from the content catalog.

use serde::{Deserialize, Serialize};

use super::equipment::EquipmentSlot;
use crate::actor::stats::{Attribute, Attributes};
use crate::error::GameError;

/// Item kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Weapon,
    Armor,
    Consumable,
    Quest,
    Misc,
    Material,
    Currency,
}

impl ItemType {
    /// Whether items of this type go into an equipment slot
    pub fn is_equipment(self) -> bool {
        matches!(self, Self::Weapon | Self::Armor)
    }
}

/// Item rarity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ItemRarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl ItemRarity {
    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Uncommon => "Uncommon",
            Self::Rare => "Rare",
            Self::Epic => "Epic",
            Self::Legendary => "Legendary",
            Self::Mythic => "Mythic",
        }
    }

    /// Color as [r, g, b] floats
    pub fn color(self) -> [f32; 3] {
        match self {
            Self::Common => [1.0, 1.0, 1.0],
            Self::Uncommon => [0.0, 1.0, 0.0],
            Self::Rare => [0.0, 0.0, 1.0],
            Self::Epic => [0.5, 0.0, 0.5],
            Self::Legendary => [1.0, 0.5, 0.0],
            Self::Mythic => [1.0, 0.0, 0.0],
        }
    }
}

/// Stats an item modifier can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatType {
    Strength,
    Dexterity,
    Intelligence,
    Vitality,
    Health,
    Mana,
    Armor,
    Damage,
    CriticalChance,
    CriticalDamage,
    AttackSpeed,
    MovementSpeed,
}

impl StatType {
    /// The base attribute this stat writes to, if any
    pub fn attribute(self) -> Option<Attribute> {
        match self {
            Self::Strength => Some(Attribute::Strength),
            Self::Dexterity => Some(Attribute::Dexterity),
            Self::Intelligence => Some(Attribute::Intelligence),
            Self::Vitality => Some(Attribute::Vitality),
            _ => None,
        }
    }
}

/// Flat signed bonus to one stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatModifier {
    pub stat: StatType,
    pub value: i32,
}

/// What a consumable effect does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    RestoreHealth { amount: i32 },
    RestoreMana { amount: i32 },
    TemporaryBuff { duration: f32, deltas: Attributes },
    PermanentStat { attribute: Attribute, amount: i32 },
    RemoveDebuff,
    Experience { amount: u32 },
}

/// One effect of a consumable, with its own success roll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumableEffect {
    #[serde(flatten)]
    pub kind: EffectKind,
    /// Probability the effect fires (0.0 - 1.0)
    #[serde(default = "default_success_chance")]
    pub success_chance: f32,
}

fn default_success_chance() -> f32 {
    1.0
}

impl ConsumableEffect {
    /// An effect that always fires
    pub fn certain(kind: EffectKind) -> Self {
        Self {
            kind,
            success_chance: 1.0,
        }
    }
}

fn default_max_stack() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// An item template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique key, also used by save records
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub item_type: ItemType,
    #[serde(default)]
    pub rarity: ItemRarity,
    /// Shop value
    #[serde(default)]
    pub value: u32,
    #[serde(default)]
    pub stackable: bool,
    #[serde(default = "default_max_stack")]
    pub max_stack_size: u32,
    /// Minimum level to use or equip
    #[serde(default)]
    pub min_level: u32,
    #[serde(default)]
    pub equipment_slot: Option<EquipmentSlot>,
    #[serde(default)]
    pub stat_modifiers: Vec<StatModifier>,
    #[serde(default)]
    pub consumable_effects: Vec<ConsumableEffect>,
    #[serde(default)]
    pub quest_item: bool,
    #[serde(default = "default_true")]
    pub consume_on_use: bool,
}

impl Item {
    /// A plain non-stackable item
    pub fn new(id: impl Into<String>, name: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            item_type,
            rarity: ItemRarity::Common,
            value: 0,
            stackable: false,
            max_stack_size: 1,
            min_level: 0,
            equipment_slot: None,
            stat_modifiers: Vec::new(),
            consumable_effects: Vec::new(),
            quest_item: false,
            consume_on_use: true,
        }
        .normalized()
    }

    /// Make the item stack up to `max`
    pub fn with_stack(mut self, max: u32) -> Self {
        self.stackable = true;
        self.max_stack_size = max;
        self.normalized()
    }

    pub fn with_slot(mut self, slot: EquipmentSlot) -> Self {
        self.equipment_slot = Some(slot);
        self
    }

    pub fn with_modifier(mut self, stat: StatType, value: i32) -> Self {
        self.stat_modifiers.push(StatModifier { stat, value });
        self
    }

    pub fn with_effect(mut self, effect: ConsumableEffect) -> Self {
        self.consumable_effects.push(effect);
        self
    }

    pub fn with_min_level(mut self, level: u32) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_rarity(mut self, rarity: ItemRarity) -> Self {
        self.rarity = rarity;
        self
    }

    /// Fix up inconsistent fields. Applied to every item loaded from content.
    pub fn normalized(mut self) -> Self {
        if !self.stackable {
            self.max_stack_size = 1;
        } else if self.max_stack_size < 1 {
            self.max_stack_size = 1;
        }

        if self.equipment_slot.is_none() {
            self.equipment_slot = match self.item_type {
                ItemType::Weapon => Some(EquipmentSlot::MainHand),
                ItemType::Armor => Some(EquipmentSlot::Chest),
                _ => None,
            };
        }
        self
    }

    /// Largest quantity one inventory slot can hold
    pub fn stack_limit(&self) -> u32 {
        if self.stackable {
            self.max_stack_size.max(1)
        } else {
            1
        }
    }

    /// Sum of every modifier on `stat`
    pub fn modifier_total(&self, stat: StatType) -> i32 {
        self.stat_modifiers
            .iter()
            .filter(|m| m.stat == stat)
            .map(|m| m.value)
            .sum()
    }

    /// Check whether an actor of `level` may use this item
    pub fn check_usable(&self, level: u32) -> Result<(), GameError> {
        if self.quest_item {
            return Err(GameError::InvalidItem(format!("{} is a quest item", self.name)));
        }
        if level < self.min_level {
            return Err(GameError::LevelTooLow {
                required: self.min_level,
                actual: level,
            });
        }
        Ok(())
    }
}
