//! Player record and the storage seam
//!
//! The engine only knows how to turn a world into a [`PlayerRecord`] and back.
//! Where the record lives is up to a [`PlayerStore`]. A record that fails to
//! parse or validate is reported as an error and treated as "no data".

use std::collections::{BTreeMap, BTreeSet};

use ashen_core::EntityId;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::actor::stats::Attributes;
use crate::combat::buff::BuffEntry;
use crate::combat::equipment::EquipmentSlot;
use crate::combat::inventory::SlotRecord;
use crate::error::PersistenceError;

/// Current record layout version
pub const RECORD_VERSION: u32 = 1;

/// Everything persisted about the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(default = "default_version")]
    pub version: u32,
    pub id: EntityId,
    pub name: String,
    pub level: u32,
    pub experience: u32,
    #[serde(default)]
    pub total_experience: u64,
    /// Base attributes without equipment bonuses
    pub attributes: Attributes,
    pub attribute_points: u32,
    /// Resources as shown at save time, buffs and equipment included
    pub current_health: i32,
    pub max_health: i32,
    pub current_mana: i32,
    pub max_mana: i32,
    /// Buffs still running when the record was taken
    #[serde(default)]
    pub buffs: Vec<BuffEntry>,
    #[serde(default)]
    pub equipment: BTreeMap<EquipmentSlot, String>,
    #[serde(default)]
    pub inventory: Vec<SlotRecord>,
    /// Ability ids in bar order
    #[serde(default)]
    pub abilities: Vec<Option<String>>,
    #[serde(default)]
    pub gold: u64,
    #[serde(default)]
    pub play_time_seconds: f64,
    #[serde(default)]
    pub enemies_killed: u32,
    #[serde(default)]
    pub items_collected: u32,
    #[serde(default)]
    pub quests_completed: u32,
    #[serde(default)]
    pub completed_quests: Vec<String>,
    /// Keys granted by quest access rewards
    #[serde(default)]
    pub unlocked: BTreeSet<String>,
    /// RFC 3339 timestamp set by the store on save
    #[serde(default)]
    pub last_played: Option<String>,
}

fn default_version() -> u32 {
    RECORD_VERSION
}

impl PlayerRecord {
    /// Reject records no live player could have produced
    pub fn validate(&self) -> Result<(), PersistenceError> {
        if self.name.trim().is_empty() {
            return Err(PersistenceError::Invalid("empty name".into()));
        }
        if self.level < 1 {
            return Err(PersistenceError::Invalid(format!("level {}", self.level)));
        }
        if self.max_health <= 0 {
            return Err(PersistenceError::Invalid(format!("max health {}", self.max_health)));
        }
        if self.max_mana < 0 {
            return Err(PersistenceError::Invalid(format!("max mana {}", self.max_mana)));
        }
        if self.version > RECORD_VERSION {
            return Err(PersistenceError::Invalid(format!("unknown version {}", self.version)));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let record: PlayerRecord = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }
}

/// Somewhere a player record can be kept
pub trait PlayerStore {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<PlayerRecord>, PersistenceError>;

    fn save(&mut self, record: &PlayerRecord) -> Result<(), PersistenceError>;

    /// Load, mapping every failure to "no data"
    fn load_or_none(&self) -> Option<PlayerRecord> {
        match self.load() {
            Ok(record) => record,
            Err(err) => {
                warn!("Discarding player record: {}", err);
                None
            }
        }
    }
}

/// Keeps the serialized record in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    json: Option<String>,
    saves: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from raw JSON (possibly corrupt)
    pub fn with_json(json: impl Into<String>) -> Self {
        Self {
            json: Some(json.into()),
            saves: 0,
        }
    }

    pub fn save_count(&self) -> u32 {
        self.saves
    }

    pub fn raw(&self) -> Option<&str> {
        self.json.as_deref()
    }
}

impl PlayerStore for MemoryStore {
    fn load(&self) -> Result<Option<PlayerRecord>, PersistenceError> {
        self.json.as_deref().map(PlayerRecord::from_json).transpose()
    }

    fn save(&mut self, record: &PlayerRecord) -> Result<(), PersistenceError> {
        record.validate()?;
        self.json = Some(record.to_json()?);
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_record() -> PlayerRecord {
        let mut equipment = BTreeMap::new();
        equipment.insert(EquipmentSlot::MainHand, "sword".to_string());
        PlayerRecord {
            version: RECORD_VERSION,
            id: EntityId::from_u128(7),
            name: "Ash".into(),
            level: 3,
            experience: 40,
            total_experience: 600,
            attributes: Attributes::new(12, 10, 10, 11),
            attribute_points: 2,
            current_health: 150,
            max_health: 210,
            current_mana: 90,
            max_mana: 100,
            buffs: vec![BuffEntry::new("war_cry", 10.0, Attributes::new(5, 0, 0, 0))],
            equipment,
            inventory: vec![
                SlotRecord {
                    item_id: Some("potion".into()),
                    quantity: 4,
                },
                SlotRecord {
                    item_id: None,
                    quantity: 0,
                },
            ],
            abilities: vec![Some("fireball".into()), None, None, None],
            gold: 55,
            play_time_seconds: 321.5,
            enemies_killed: 9,
            items_collected: 14,
            quests_completed: 1,
            completed_quests: vec!["hunt".into()],
            unlocked: BTreeSet::from(["old_road".to_string()]),
            last_played: Some("2026-01-01T12:00:00Z".into()),
        }
    }

    #[test]
    fn test_round_trip() {
        let record = sample_record();
        let mut store = MemoryStore::new();
        assert_eq!(store.load().unwrap(), None);

        store.save(&record).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, record);

        // Saving what was loaded changes nothing
        let before = store.raw().map(str::to_string);
        store.save(&loaded).unwrap();
        assert_eq!(store.raw().map(str::to_string), before);
        assert_eq!(store.save_count(), 2);
    }

    #[test]
    fn test_validation() {
        let mut record = sample_record();
        record.name = "  ".into();
        assert!(matches!(record.validate(), Err(PersistenceError::Invalid(_))));

        let mut record = sample_record();
        record.level = 0;
        assert!(record.validate().is_err());

        let mut record = sample_record();
        record.max_health = 0;
        assert!(record.validate().is_err());

        let mut record = sample_record();
        record.max_mana = -1;
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_corrupt_data_is_no_data() {
        let store = MemoryStore::with_json("{ not json");
        assert!(matches!(store.load(), Err(PersistenceError::Malformed(_))));
        assert_eq!(store.load_or_none(), None);
    }
}
