use ashen_core::EntityId;
use thiserror::Error;

/// Recoverable failures of a game command. None of them stop the simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("Not enough mana: need {needed}, have {available}")]
    InsufficientResource { needed: i32, available: i32 },

    #[error("{ability} is on cooldown ({remaining:.1}s left)")]
    OnCooldown { ability: String, remaining: f32 },

    #[error("Invalid slot index: {0}")]
    InvalidSlot(usize),

    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("Inventory full: placed {placed}, {remaining} did not fit")]
    InventoryFull { placed: u32, remaining: u32 },

    #[error("Prerequisite not met: {0}")]
    PrerequisiteNotMet(String),

    #[error("Target {0} is unreachable")]
    TargetUnreachable(EntityId),

    #[error("Unknown actor: {0}")]
    UnknownActor(EntityId),

    #[error("Actor {0} is dead")]
    ActorDead(EntityId),

    #[error("Requires level {required}, currently level {actual}")]
    LevelTooLow { required: u32, actual: u32 },

    #[error("No attribute points to spend")]
    NoAttributePoints,

    #[error("Unknown content id: {0}")]
    UnknownContent(String),
}

impl GameError {
    /// Short text shown to the player when a command is rejected
    pub fn notification(&self) -> String {
        match self {
            Self::InsufficientResource { .. } => "Not enough mana!".to_string(),
            Self::OnCooldown { ability, .. } => format!("{} is on cooldown", ability),
            Self::InventoryFull { .. } => "Inventory full!".to_string(),
            Self::LevelTooLow { required, .. } => format!("Requires level {}", required),
            other => other.to_string(),
        }
    }
}

/// Failures loading or validating a persisted player record
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Malformed player record: {0}")]
    Malformed(String),

    #[error("Invalid player record: {0}")]
    Invalid(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Malformed(err.to_string())
    }
}
