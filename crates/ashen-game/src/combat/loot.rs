//! Loot tables and drop rolls
//!
//! Selection is weighted: draw uniformly in `[0, total_weight)` and walk the
//! entries in table order until the running sum reaches the draw. Table order
//! therefore decides ties and keeps seeded tests stable.

use rand::Rng;
use serde::{Deserialize, Serialize};

fn default_quantity() -> u32 {
    1
}

/// One row of a loot table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootEntry {
    pub item_id: String,
    /// Relative weight
    pub weight: f32,
    #[serde(default = "default_quantity")]
    pub min_quantity: u32,
    #[serde(default = "default_quantity")]
    pub max_quantity: u32,
    /// Killer level needed for the entry to drop
    #[serde(default)]
    pub minimum_level: u32,
    /// Only drops from bosses
    #[serde(default)]
    pub requires_boss: bool,
}

impl LootEntry {
    pub fn new(item_id: impl Into<String>, weight: f32) -> Self {
        Self {
            item_id: item_id.into(),
            weight,
            min_quantity: 1,
            max_quantity: 1,
            minimum_level: 0,
            requires_boss: false,
        }
    }

    pub fn with_quantity(mut self, min: u32, max: u32) -> Self {
        self.min_quantity = min;
        self.max_quantity = max;
        self
    }

    /// Whether this entry may drop for a killer of `level` from a (non-)boss
    pub fn can_drop(&self, level: u32, is_boss: bool) -> bool {
        level >= self.minimum_level && (!self.requires_boss || is_boss)
    }

    /// Uniform quantity in `[min_quantity, max_quantity]`
    pub fn roll_quantity(&self, rng: &mut impl Rng) -> u32 {
        let min = self.min_quantity.max(1);
        let max = self.max_quantity.max(min);
        rng.gen_range(min..=max)
    }
}

/// Who is being looted, used to filter entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LootContext {
    pub killer_level: u32,
    pub is_boss: bool,
}

impl Default for LootContext {
    fn default() -> Self {
        Self {
            killer_level: u32::MAX,
            is_boss: true,
        }
    }
}

/// A dropped stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LootDrop {
    pub item_id: String,
    pub quantity: u32,
}

/// An ordered drop table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootTable {
    pub id: String,
    pub entries: Vec<LootEntry>,
    /// `roll_many` always yields at least one drop
    #[serde(default)]
    pub guarantee_drop: bool,
    #[serde(default = "default_max_drops")]
    pub max_drops: u32,
}

fn default_max_drops() -> u32 {
    3
}

impl LootTable {
    pub fn new(id: impl Into<String>, entries: Vec<LootEntry>) -> Self {
        Self {
            id: id.into(),
            entries,
            guarantee_drop: false,
            max_drops: default_max_drops(),
        }
    }

    /// Weighted pick over every entry
    pub fn random_entry(&self, rng: &mut impl Rng) -> Option<&LootEntry> {
        self.random_entry_for(LootContext::default(), rng)
    }

    /// Weighted pick over the entries eligible for `context`
    pub fn random_entry_for(&self, context: LootContext, rng: &mut impl Rng) -> Option<&LootEntry> {
        let eligible = || {
            self.entries
                .iter()
                .filter(move |e| e.weight > 0.0 && e.can_drop(context.killer_level, context.is_boss))
        };

        let total: f32 = eligible().map(|e| e.weight).sum();
        if total <= 0.0 {
            return None;
        }

        let draw = rng.gen_range(0.0..total);
        let mut cumulative = 0.0;
        let mut last = None;
        for entry in eligible() {
            cumulative += entry.weight;
            if cumulative >= draw {
                return Some(entry);
            }
            last = Some(entry);
        }
        // Float rounding can leave the draw just above the final sum
        last
    }

    /// Several independent picks: 0..=max_drops, or 1..=max_drops when a drop is guaranteed
    pub fn roll_many(&self, context: LootContext, rng: &mut impl Rng) -> Vec<LootDrop> {
        let min = if self.guarantee_drop { 1 } else { 0 };
        let max = self.max_drops.max(min);
        let count = rng.gen_range(min..=max);

        (0..count)
            .filter_map(|_| {
                let entry = self.random_entry_for(context, rng)?;
                Some(LootDrop {
                    item_id: entry.item_id.clone(),
                    quantity: entry.roll_quantity(rng),
                })
            })
            .collect()
    }
}

/// Per-enemy drop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootDropper {
    /// Probability anything drops at all
    pub drop_chance: f32,
    pub min_items: u32,
    pub max_items: u32,
}

impl Default for LootDropper {
    fn default() -> Self {
        Self {
            drop_chance: 0.7,
            min_items: 1,
            max_items: 3,
        }
    }
}

impl LootDropper {
    /// Roll a corpse's loot. Nothing drops with probability `1 - drop_chance`;
    /// otherwise `[min_items, max_items]` independent picks (duplicates allowed).
    pub fn drop_loot(
        &self,
        table: &LootTable,
        context: LootContext,
        rng: &mut impl Rng,
    ) -> Vec<LootDrop> {
        if rng.gen::<f32>() >= self.drop_chance {
            return Vec::new();
        }

        let max = self.max_items.max(self.min_items);
        let count = rng.gen_range(self.min_items..=max);

        let mut drops = Vec::with_capacity(count as usize);
        for _ in 0..count {
            if let Some(entry) = table.random_entry_for(context, rng) {
                drops.push(LootDrop {
                    item_id: entry.item_id.clone(),
                    quantity: entry.roll_quantity(rng),
                });
            }
        }
        drops
    }
}
