//! Content catalog: every immutable game record, keyed by id
//!
//! Loaded once from JSON at startup and shared through `Arc`. Loading checks
//! that ids are unique and that cross references (loot tables, quest rewards,
//! starter kit) point at content that exists.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::combat::ability::Ability;
use crate::combat::item::Item;
use crate::combat::loot::LootTable;
use crate::enemy::EnemyProfile;
use crate::error::GameError;
use crate::quest::{QuestDef, QuestReward};

/// Problems found while building a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to parse content: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate {kind} id: {id}")]
    Duplicate { kind: &'static str, id: String },

    #[error("{owner} references unknown {kind} '{id}'")]
    MissingReference {
        owner: String,
        kind: &'static str,
        id: String,
    },
}

/// A stack handed to a new character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarterStack {
    pub item_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// What a freshly created character starts with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StarterKit {
    #[serde(default)]
    pub items: Vec<StarterStack>,
    /// Item ids equipped straight away
    #[serde(default)]
    pub equipment: Vec<String>,
    /// Ability ids placed on the bar in order
    #[serde(default)]
    pub abilities: Vec<String>,
    /// Quest ids started straight away
    #[serde(default)]
    pub quests: Vec<String>,
}

/// On-disk layout of a content file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentFile {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub abilities: Vec<Ability>,
    #[serde(default)]
    pub loot_tables: Vec<LootTable>,
    #[serde(default)]
    pub quests: Vec<QuestDef>,
    #[serde(default)]
    pub enemies: Vec<EnemyProfile>,
    #[serde(default)]
    pub starter: StarterKit,
}

#[derive(Debug, Clone, Default)]
pub struct ContentCatalog {
    items: HashMap<String, Arc<Item>>,
    abilities: HashMap<String, Arc<Ability>>,
    loot_tables: HashMap<String, Arc<LootTable>>,
    quests: HashMap<String, Arc<QuestDef>>,
    enemies: HashMap<String, Arc<EnemyProfile>>,
    starter: StarterKit,
}

fn index<T>(
    kind: &'static str,
    records: Vec<T>,
    id: impl Fn(&T) -> &str,
) -> Result<HashMap<String, Arc<T>>, CatalogError> {
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        let key = id(&record).to_string();
        if map.contains_key(&key) {
            return Err(CatalogError::Duplicate { kind, id: key });
        }
        map.insert(key, Arc::new(record));
    }
    Ok(map)
}

impl ContentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON content file
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: ContentFile = serde_json::from_str(json)?;
        Self::from_content(file)
    }

    /// Index and validate parsed content. Items are normalized.
    pub fn from_content(file: ContentFile) -> Result<Self, CatalogError> {
        let items: Vec<Item> = file.items.into_iter().map(Item::normalized).collect();
        let catalog = Self {
            items: index("item", items, |i: &Item| i.id.as_str())?,
            abilities: index("ability", file.abilities, |a: &Ability| a.id.as_str())?,
            loot_tables: index("loot table", file.loot_tables, |t: &LootTable| t.id.as_str())?,
            quests: index("quest", file.quests, |q: &QuestDef| q.id.as_str())?,
            enemies: index("enemy", file.enemies, |e: &EnemyProfile| e.id.as_str())?,
            starter: file.starter,
        };
        catalog.check_references()?;

        info!(
            "Content loaded: {} items, {} abilities, {} loot tables, {} quests, {} enemies",
            catalog.items.len(),
            catalog.abilities.len(),
            catalog.loot_tables.len(),
            catalog.quests.len(),
            catalog.enemies.len()
        );
        Ok(catalog)
    }

    fn check_references(&self) -> Result<(), CatalogError> {
        let missing = |owner: &str, kind: &'static str, id: &str| CatalogError::MissingReference {
            owner: owner.to_string(),
            kind,
            id: id.to_string(),
        };

        for table in self.loot_tables.values() {
            if let Some(entry) = table.entries.iter().find(|e| !self.items.contains_key(&e.item_id)) {
                return Err(missing(&table.id, "item", &entry.item_id));
            }
        }

        for enemy in self.enemies.values() {
            if let Some(table) = &enemy.loot_table {
                if !self.loot_tables.contains_key(table) {
                    return Err(missing(&enemy.id, "loot table", table));
                }
            }
        }

        for quest in self.quests.values() {
            if let Some(prereq) = quest.prerequisites.iter().find(|p| !self.quests.contains_key(*p)) {
                return Err(missing(&quest.id, "quest", prereq));
            }
            for reward in &quest.rewards {
                match reward {
                    QuestReward::Item { item_id, .. } if !self.items.contains_key(item_id) => {
                        return Err(missing(&quest.id, "item", item_id));
                    }
                    QuestReward::Ability { ability_id } if !self.abilities.contains_key(ability_id) => {
                        return Err(missing(&quest.id, "ability", ability_id));
                    }
                    _ => {}
                }
            }
        }

        let kit = &self.starter;
        for id in kit.items.iter().map(|s| &s.item_id).chain(&kit.equipment) {
            if !self.items.contains_key(id) {
                return Err(missing("starter kit", "item", id));
            }
        }
        if let Some(id) = kit.abilities.iter().find(|a| !self.abilities.contains_key(*a)) {
            return Err(missing("starter kit", "ability", id));
        }
        if let Some(id) = kit.quests.iter().find(|q| !self.quests.contains_key(*q)) {
            return Err(missing("starter kit", "quest", id));
        }
        Ok(())
    }

    pub fn item(&self, id: &str) -> Option<Arc<Item>> {
        self.items.get(id).cloned()
    }

    pub fn ability(&self, id: &str) -> Option<Arc<Ability>> {
        self.abilities.get(id).cloned()
    }

    pub fn loot_table(&self, id: &str) -> Option<Arc<LootTable>> {
        self.loot_tables.get(id).cloned()
    }

    pub fn quest(&self, id: &str) -> Option<Arc<QuestDef>> {
        self.quests.get(id).cloned()
    }

    pub fn enemy(&self, id: &str) -> Option<Arc<EnemyProfile>> {
        self.enemies.get(id).cloned()
    }

    /// Like [`item`](Self::item) but reports a missing id as an error
    pub fn require_item(&self, id: &str) -> Result<Arc<Item>, GameError> {
        self.item(id).ok_or_else(|| GameError::UnknownContent(id.to_string()))
    }

    pub fn require_ability(&self, id: &str) -> Result<Arc<Ability>, GameError> {
        self.ability(id).ok_or_else(|| GameError::UnknownContent(id.to_string()))
    }

    pub fn require_quest(&self, id: &str) -> Result<Arc<QuestDef>, GameError> {
        self.quest(id).ok_or_else(|| GameError::UnknownContent(id.to_string()))
    }

    pub fn require_enemy(&self, id: &str) -> Result<Arc<EnemyProfile>, GameError> {
        self.enemy(id).ok_or_else(|| GameError::UnknownContent(id.to_string()))
    }

    pub fn starter(&self) -> &StarterKit {
        &self.starter
    }

    /// Add or replace an item (tests, tooling)
    pub fn insert_item(&mut self, item: Item) {
        let item = item.normalized();
        self.items.insert(item.id.clone(), Arc::new(item));
    }

    pub fn insert_ability(&mut self, ability: Ability) {
        self.abilities.insert(ability.id.clone(), Arc::new(ability));
    }

    pub fn insert_loot_table(&mut self, table: LootTable) {
        self.loot_tables.insert(table.id.clone(), Arc::new(table));
    }

    pub fn insert_quest(&mut self, quest: QuestDef) {
        self.quests.insert(quest.id.clone(), Arc::new(quest));
    }

    pub fn insert_enemy(&mut self, enemy: EnemyProfile) {
        self.enemies.insert(enemy.id.clone(), Arc::new(enemy));
    }

    pub fn set_starter(&mut self, starter: StarterKit) {
        self.starter = starter;
    }

    /// Quest ids, sorted
    pub fn quest_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.quests.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Enemy template ids, sorted
    pub fn enemy_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.enemies.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::equipment::EquipmentSlot;
    use crate::combat::item::ItemType;

    const CONTENT: &str = r#"{
        "items": [
            { "id": "sword", "name": "Rusty Sword", "item_type": "Weapon",
              "stat_modifiers": [{ "stat": "Strength", "value": 3 }] },
            { "id": "potion", "name": "Potion", "item_type": "Consumable",
              "stackable": true, "max_stack_size": 20,
              "consumable_effects": [{ "type": "restore_health", "amount": 50 }] }
        ],
        "abilities": [{ "id": "fireball", "name": "Fireball", "kind": "Damage", "mana_cost": 20 }],
        "loot_tables": [{ "id": "wolf", "entries": [{ "item_id": "potion", "weight": 1.0 }] }],
        "quests": [{ "id": "hunt", "name": "Hunt",
                     "objectives": [{ "id": "kill", "kind": "Kill", "target_id": "wolf", "target_progress": 3 }],
                     "rewards": [{ "type": "item", "item_id": "sword", "quantity": 1 }] }],
        "enemies": [{ "id": "wolf", "name": "Wolf", "enemy_type": "wolf", "level": 2, "loot_table": "wolf" }],
        "starter": { "items": [{ "item_id": "potion", "quantity": 3 }], "abilities": ["fireball"] }
    }"#;

    #[test]
    fn test_load_content() {
        let catalog = ContentCatalog::from_json(CONTENT).unwrap();
        let sword = catalog.item("sword").unwrap();
        assert_eq!(sword.item_type, ItemType::Weapon);
        assert_eq!(sword.equipment_slot, Some(EquipmentSlot::MainHand));
        assert_eq!(catalog.item("potion").unwrap().stack_limit(), 20);
        assert_eq!(catalog.ability("fireball").unwrap().mana_cost, 20);
        assert_eq!(catalog.enemy("wolf").unwrap().level, 2);
        assert_eq!(catalog.quest_ids(), vec!["hunt"]);
        assert_eq!(catalog.starter().items[0].quantity, 3);
    }

    #[test]
    fn test_missing_reference() {
        let broken = CONTENT.replace(r#""loot_table": "wolf""#, r#""loot_table": "bear""#);
        assert!(matches!(
            ContentCatalog::from_json(&broken),
            Err(CatalogError::MissingReference { kind: "loot table", .. })
        ));
    }

    #[test]
    fn test_duplicate_id() {
        let file = ContentFile {
            items: vec![
                Item::new("a", "A", ItemType::Misc),
                Item::new("a", "A again", ItemType::Misc),
            ],
            ..Default::default()
        };
        assert!(matches!(
            ContentCatalog::from_content(file),
            Err(CatalogError::Duplicate { kind: "item", .. })
        ));
    }

    #[test]
    fn test_require_unknown() {
        let catalog = ContentCatalog::new();
        assert_eq!(
            catalog.require_item("ghost").unwrap_err(),
            GameError::UnknownContent("ghost".into())
        );
    }
}
