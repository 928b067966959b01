//! Slot-based inventory
//!
//! A fixed array of slots. Stackable items top off existing stacks before
//! spilling into empty slots.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::item::Item;
use crate::error::GameError;

/// Default number of inventory slots
pub const DEFAULT_INVENTORY_SIZE: usize = 30;

/// One inventory slot. Empty slots hold no item and a quantity of 0.
#[derive(Debug, Clone, Default)]
pub struct InventorySlot {
    item: Option<Arc<Item>>,
    quantity: u32,
}

impl InventorySlot {
    pub fn item(&self) -> Option<&Arc<Item>> {
        self.item.as_ref()
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn is_empty(&self) -> bool {
        self.item.is_none()
    }

    fn holds(&self, item: &Item) -> bool {
        self.item.as_ref().is_some_and(|held| held.id == item.id)
    }

    fn clear(&mut self) {
        self.item = None;
        self.quantity = 0;
    }

    /// Take up to `amount` from this slot, emptying it at zero
    fn take(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.quantity);
        self.quantity -= taken;
        if self.quantity == 0 {
            self.clear();
        }
        taken
    }
}

/// Serialized form of one slot: item id and quantity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub item_id: Option<String>,
    pub quantity: u32,
}

/// Fixed-size inventory
#[derive(Debug, Clone)]
pub struct Inventory {
    slots: Vec<InventorySlot>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(DEFAULT_INVENTORY_SIZE)
    }
}

impl Inventory {
    /// Create an empty inventory with `capacity` slots
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![InventorySlot::default(); capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[InventorySlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&InventorySlot> {
        self.slots.get(index)
    }

    /// Add `quantity` of `item`.
    ///
    /// Existing stacks are filled first, then empty slots. When space runs out
    /// the units already placed stay placed and the error reports the split.
    pub fn add_item(&mut self, item: &Arc<Item>, quantity: u32) -> Result<(), GameError> {
        if quantity == 0 {
            return Err(GameError::InvalidItem(format!("zero quantity of {}", item.name)));
        }

        let limit = item.stack_limit();
        let mut remaining = quantity;

        if item.stackable {
            for slot in self.slots.iter_mut().filter(|s| s.holds(item)) {
                if remaining == 0 {
                    break;
                }
                let space = limit.saturating_sub(slot.quantity);
                let moved = space.min(remaining);
                slot.quantity += moved;
                remaining -= moved;
            }
        }

        for slot in self.slots.iter_mut().filter(|s| s.is_empty()) {
            if remaining == 0 {
                break;
            }
            let moved = limit.min(remaining);
            slot.item = Some(Arc::clone(item));
            slot.quantity = moved;
            remaining -= moved;
        }

        if remaining > 0 {
            return Err(GameError::InventoryFull {
                placed: quantity - remaining,
                remaining,
            });
        }
        Ok(())
    }

    /// Remove up to `quantity` of `item` across slots. Returns how many were removed.
    pub fn remove_item(&mut self, item: &Item, quantity: u32) -> u32 {
        let mut remaining = quantity;
        for slot in self.slots.iter_mut().filter(|s| s.holds(item)) {
            if remaining == 0 {
                break;
            }
            remaining -= slot.take(remaining);
        }
        quantity - remaining
    }

    /// Remove `quantity` from one slot. Returns the item and the amount taken.
    pub fn remove_from_slot(
        &mut self,
        index: usize,
        quantity: u32,
    ) -> Result<(Arc<Item>, u32), GameError> {
        let slot = self.slots.get_mut(index).ok_or(GameError::InvalidSlot(index))?;
        let item = slot.item.clone().ok_or(GameError::InvalidSlot(index))?;
        let taken = slot.take(quantity);
        Ok((item, taken))
    }

    /// Exchange the contents of two slots
    pub fn swap_slots(&mut self, a: usize, b: usize) -> Result<(), GameError> {
        let len = self.slots.len();
        if a >= len {
            return Err(GameError::InvalidSlot(a));
        }
        if b >= len {
            return Err(GameError::InvalidSlot(b));
        }
        self.slots.swap(a, b);
        Ok(())
    }

    /// Total quantity of `item_id` across all slots
    pub fn item_count(&self, item_id: &str) -> u32 {
        self.slots
            .iter()
            .filter(|s| s.item.as_ref().is_some_and(|i| i.id == item_id))
            .map(|s| s.quantity)
            .sum()
    }

    pub fn has_item(&self, item_id: &str, quantity: u32) -> bool {
        self.item_count(item_id) >= quantity
    }

    pub fn first_empty_slot(&self) -> Option<usize> {
        self.slots.iter().position(InventorySlot::is_empty)
    }

    pub fn is_full(&self) -> bool {
        self.first_empty_slot().is_none()
    }

    /// Empty every slot
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(InventorySlot::clear);
    }

    /// Slot-by-slot snapshot for save records
    pub fn to_records(&self) -> Vec<SlotRecord> {
        self.slots
            .iter()
            .map(|s| SlotRecord {
                item_id: s.item.as_ref().map(|i| i.id.clone()),
                quantity: s.quantity,
            })
            .collect()
    }

    /// Rebuild slots from a save record. Unknown ids leave the slot empty.
    pub fn load_records(
        &mut self,
        records: &[SlotRecord],
        lookup: impl Fn(&str) -> Option<Arc<Item>>,
    ) -> Vec<String> {
        self.clear();
        let mut missing = Vec::new();

        for (slot, record) in self.slots.iter_mut().zip(records) {
            let Some(id) = record.item_id.as_deref() else {
                continue;
            };
            if record.quantity == 0 {
                continue;
            }
            match lookup(id) {
                Some(item) => {
                    slot.quantity = record.quantity.min(item.stack_limit());
                    slot.item = Some(item);
                }
                None => missing.push(id.to_string()),
            }
        }
        missing
    }
}
