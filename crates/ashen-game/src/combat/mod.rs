//! Combat system module
//!
//! Provides damage resolution, abilities, buffs, cooldowns, items,
//! equipment, inventory, consumables, and loot.

pub mod ability;
pub mod buff;
pub mod consumable;
pub mod cooldown;
pub mod damage;
pub mod equipment;
pub mod inventory;
pub mod item;
pub mod loot;

pub use ability::{Ability, AbilityBar, AbilityKind, MAX_ABILITY_SLOTS};
pub use buff::{BuffEntry, BuffLedger};
pub use consumable::{consume, EffectOutcome, EffectTarget};
pub use cooldown::{CooldownEvent, CooldownRegistry, CooldownScope};
pub use damage::{compute_damage, DamageRoll};
pub use equipment::{EquipError, EquipmentSet, EquipmentSlot};
pub use inventory::{Inventory, InventorySlot, SlotRecord, DEFAULT_INVENTORY_SIZE};
pub use item::{ConsumableEffect, EffectKind, Item, ItemRarity, ItemType, StatModifier, StatType};
pub use loot::{LootContext, LootDrop, LootDropper, LootEntry, LootTable};
