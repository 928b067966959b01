//! Ashen Game - Combat and progression rules
//!
//! Provides stats, abilities, items, enemy AI, quests, and the world that ties
//! them together. Nothing in this crate performs I/O; the host supplies an
//! [`Environment`], a [`PlayerStore`], and drives [`World::tick`].

pub mod actor;
pub mod catalog;
pub mod combat;
pub mod enemy;
pub mod environment;
pub mod error;
pub mod events;
pub mod persistence;
pub mod quest;
pub mod world;

pub use actor::{Actor, Attribute, Attributes, Hero, LevelUp, Progression, StatBlock, StatProfile};
pub use catalog::{CatalogError, ContentCatalog, ContentFile, StarterKit};
pub use enemy::{AiConfig, AiState, EnemyBrain, EnemyProfile};
pub use environment::{EntityFilter, Environment, Faction, Movement, OpenField, Perception};
pub use error::{GameError, PersistenceError};
pub use events::{EventBus, GameEvent, Notifier, SubscriberId, Topic, TracingNotifier};
pub use persistence::{MemoryStore, PlayerRecord, PlayerStore};
pub use quest::{QuestDef, QuestLog, QuestReward};
pub use world::{HitReport, World, WorldConfig, Worn};

// Combat system re-exports
pub use combat::{
    Ability, AbilityBar, AbilityKind, CooldownRegistry, CooldownScope, EquipError, EquipmentSet,
    EquipmentSlot, Inventory, Item, ItemRarity, ItemType, LootDropper, LootTable,
};
