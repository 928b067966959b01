//! Core types shared by every Ashen crate

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// World-space position of an actor
pub type Position = Vec3;

/// Unique identifier for any actor in the simulation (player or enemy)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an entity ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Deterministic ID built from a small integer, handy for fixtures and replays
    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// First eight hex digits, used in log lines
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_are_unique() {
        let a = EntityId::new();
        let b = EntityId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_deterministic_id() {
        assert_eq!(EntityId::from_u128(7), EntityId::from_u128(7));
        assert_eq!(EntityId::from_u128(7).short().len(), 8);
    }

    #[test]
    fn test_entity_id_serde() {
        let id = EntityId::from_u128(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
