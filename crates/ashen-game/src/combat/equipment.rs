//! Equipment slots
//!
//! Equipping writes an item's attribute and armor modifiers straight into the
//! wearer's base stats; unequipping writes the exact negation, so the two are
//! inverses.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::item::{Item, ItemType, StatType};
use crate::actor::stats::StatBlock;
use crate::error::GameError;

/// The ten equipment slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EquipmentSlot {
    MainHand,
    OffHand,
    Helmet,
    Chest,
    Legs,
    Boots,
    Gloves,
    Ring,
    Amulet,
    Belt,
}

impl EquipmentSlot {
    /// All equipment slot variants
    pub fn all() -> &'static [EquipmentSlot] {
        &[
            Self::MainHand,
            Self::OffHand,
            Self::Helmet,
            Self::Chest,
            Self::Legs,
            Self::Boots,
            Self::Gloves,
            Self::Ring,
            Self::Amulet,
            Self::Belt,
        ]
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::MainHand => "Main Hand",
            Self::OffHand => "Off Hand",
            Self::Helmet => "Helmet",
            Self::Chest => "Chest",
            Self::Legs => "Legs",
            Self::Boots => "Boots",
            Self::Gloves => "Gloves",
            Self::Ring => "Ring",
            Self::Amulet => "Amulet",
            Self::Belt => "Belt",
        }
    }
}

/// Error when equipping an item
#[derive(Debug, Clone, PartialEq)]
pub enum EquipError {
    /// Only weapons and armor can be worn
    NotEquipment { item: String, item_type: ItemType },
    /// Item has no slot to go into
    NoSlot { item: String },
    /// Item belongs in a different slot
    WrongSlot { expected: EquipmentSlot, got: EquipmentSlot },
}

impl fmt::Display for EquipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEquipment { item, item_type } => {
                write!(f, "{} is {:?}, not equipment", item, item_type)
            }
            Self::NoSlot { item } => write!(f, "{} has no equipment slot", item),
            Self::WrongSlot { expected, got } => {
                write!(f, "Item goes in {}, not {}", expected.name(), got.name())
            }
        }
    }
}

impl std::error::Error for EquipError {}

impl From<EquipError> for GameError {
    fn from(err: EquipError) -> Self {
        GameError::InvalidItem(err.to_string())
    }
}

/// Items currently worn by one actor
#[derive(Debug, Clone, Default)]
pub struct EquipmentSet {
    pub main_hand: Option<Arc<Item>>,
    pub off_hand: Option<Arc<Item>>,
    pub helmet: Option<Arc<Item>>,
    pub chest: Option<Arc<Item>>,
    pub legs: Option<Arc<Item>>,
    pub boots: Option<Arc<Item>>,
    pub gloves: Option<Arc<Item>>,
    pub ring: Option<Arc<Item>>,
    pub amulet: Option<Arc<Item>>,
    pub belt: Option<Arc<Item>>,
}

impl EquipmentSet {
    /// Create an empty equipment set
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the item in a slot
    pub fn get(&self, slot: EquipmentSlot) -> Option<&Arc<Item>> {
        match slot {
            EquipmentSlot::MainHand => self.main_hand.as_ref(),
            EquipmentSlot::OffHand => self.off_hand.as_ref(),
            EquipmentSlot::Helmet => self.helmet.as_ref(),
            EquipmentSlot::Chest => self.chest.as_ref(),
            EquipmentSlot::Legs => self.legs.as_ref(),
            EquipmentSlot::Boots => self.boots.as_ref(),
            EquipmentSlot::Gloves => self.gloves.as_ref(),
            EquipmentSlot::Ring => self.ring.as_ref(),
            EquipmentSlot::Amulet => self.amulet.as_ref(),
            EquipmentSlot::Belt => self.belt.as_ref(),
        }
    }

    fn get_mut(&mut self, slot: EquipmentSlot) -> &mut Option<Arc<Item>> {
        match slot {
            EquipmentSlot::MainHand => &mut self.main_hand,
            EquipmentSlot::OffHand => &mut self.off_hand,
            EquipmentSlot::Helmet => &mut self.helmet,
            EquipmentSlot::Chest => &mut self.chest,
            EquipmentSlot::Legs => &mut self.legs,
            EquipmentSlot::Boots => &mut self.boots,
            EquipmentSlot::Gloves => &mut self.gloves,
            EquipmentSlot::Ring => &mut self.ring,
            EquipmentSlot::Amulet => &mut self.amulet,
            EquipmentSlot::Belt => &mut self.belt,
        }
    }

    /// Equip an item into its own slot. Returns the previously equipped item.
    pub fn equip(
        &mut self,
        item: Arc<Item>,
        stats: &mut StatBlock,
    ) -> Result<Option<Arc<Item>>, EquipError> {
        let slot = item.equipment_slot.ok_or_else(|| EquipError::NoSlot {
            item: item.name.clone(),
        })?;
        self.equip_in(slot, item, stats)
    }

    /// Equip an item into `slot`. The previous occupant's modifiers are
    /// fully reversed before the new item's are applied.
    pub fn equip_in(
        &mut self,
        slot: EquipmentSlot,
        item: Arc<Item>,
        stats: &mut StatBlock,
    ) -> Result<Option<Arc<Item>>, EquipError> {
        if !item.item_type.is_equipment() {
            return Err(EquipError::NotEquipment {
                item: item.name.clone(),
                item_type: item.item_type,
            });
        }
        if let Some(expected) = item.equipment_slot {
            if expected != slot {
                return Err(EquipError::WrongSlot { expected, got: slot });
            }
        }

        let previous = self.unequip(slot, stats);
        apply_modifiers(stats, &item, 1);
        *self.get_mut(slot) = Some(item);
        Ok(previous)
    }

    /// Remove the item in `slot`, reversing its modifiers
    pub fn unequip(&mut self, slot: EquipmentSlot, stats: &mut StatBlock) -> Option<Arc<Item>> {
        let item = self.get_mut(slot).take()?;
        apply_modifiers(stats, &item, -1);
        Some(item)
    }

    /// Occupied slots in slot order
    pub fn iter(&self) -> impl Iterator<Item = (EquipmentSlot, &Arc<Item>)> {
        EquipmentSlot::all()
            .iter()
            .filter_map(move |slot| self.get(*slot).map(|item| (*slot, item)))
    }

    /// Slot to item id, as stored in save records
    pub fn item_ids(&self) -> BTreeMap<EquipmentSlot, String> {
        self.iter().map(|(slot, item)| (slot, item.id.clone())).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// Write `sign` times each modifier into the stat block
fn apply_modifiers(stats: &mut StatBlock, item: &Item, sign: i32) {
    for modifier in &item.stat_modifiers {
        let delta = modifier.value * sign;
        if let Some(attribute) = modifier.stat.attribute() {
            stats.add_to_base(attribute, delta);
        } else if modifier.stat == StatType::Armor {
            stats.add_armor_bonus(delta);
        }
    }
}
