//! Perception and movement services
//!
//! The rule engine never moves anything or casts rays itself. It asks an
//! [`Environment`] where actors are, what they can see, and to walk them
//! somewhere. [`OpenField`] is a straight-line implementation with optional
//! spherical sight blockers, used by the headless driver and by tests.

use std::collections::HashMap;

use ashen_core::{EntityId, Vec3};
use serde::{Deserialize, Serialize};

/// Which side an actor fights on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Enemy,
}

/// Filter for radius queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityFilter {
    Any,
    Players,
    Enemies,
}

impl EntityFilter {
    pub fn matches(self, faction: Faction) -> bool {
        match self {
            Self::Any => true,
            Self::Players => faction == Faction::Player,
            Self::Enemies => faction == Faction::Enemy,
        }
    }
}

/// An entity seen by a perception query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityRef {
    pub id: EntityId,
    pub position: Vec3,
}

/// Read-only snapshot queries for the current tick
pub trait Perception {
    /// Entities within `radius` of `center`, nearest first
    fn find_entities_within_radius(&self, center: Vec3, radius: f32, filter: EntityFilter) -> Vec<EntityRef>;

    fn has_line_of_sight(&self, from: Vec3, to: Vec3) -> bool;

    /// Current position, `None` once the entity is gone
    fn position_of(&self, entity: EntityId) -> Option<Vec3>;
}

/// Pathfinding and locomotion
pub trait Movement {
    fn move_to(&mut self, entity: EntityId, point: Vec3);

    /// Drop the current path
    fn stop(&mut self, entity: EntityId);

    fn has_arrived(&self, entity: EntityId) -> bool;

    fn remaining_distance(&self, entity: EntityId) -> f32;

    /// Snap a point onto walkable ground within `max_distance`
    fn sample_position(&self, point: Vec3, _max_distance: f32) -> Option<Vec3> {
        Some(point)
    }
}

/// Everything the simulation needs from the host world
pub trait Environment: Perception + Movement {
    /// Register an entity at a position
    fn place(&mut self, entity: EntityId, faction: Faction, position: Vec3);

    /// Forget an entity entirely
    fn remove(&mut self, entity: EntityId);
}

/// A sphere that blocks line of sight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SightBlocker {
    pub center: Vec3,
    pub radius: f32,
}

impl SightBlocker {
    fn blocks(&self, from: Vec3, to: Vec3) -> bool {
        let segment = to - from;
        let length_sq = segment.length_squared();
        let t = if length_sq > 0.0 {
            ((self.center - from).dot(segment) / length_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (from + segment * t).distance(self.center) < self.radius
    }
}

#[derive(Debug, Clone)]
struct Body {
    faction: Faction,
    position: Vec3,
    destination: Option<Vec3>,
    speed: f32,
}

/// Flat, obstacle-free ground with straight-line movement
#[derive(Debug, Clone)]
pub struct OpenField {
    bodies: HashMap<EntityId, Body>,
    blockers: Vec<SightBlocker>,
    /// Speed given to newly placed entities
    pub default_speed: f32,
    /// Distance at which a walker counts as arrived
    pub arrival_tolerance: f32,
}

impl Default for OpenField {
    fn default() -> Self {
        Self {
            bodies: HashMap::new(),
            blockers: Vec::new(),
            default_speed: 3.5,
            arrival_tolerance: 0.5,
        }
    }
}

impl OpenField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_blocker(&mut self, blocker: SightBlocker) {
        self.blockers.push(blocker);
    }

    /// Teleport an entity (host input, tests)
    pub fn set_position(&mut self, entity: EntityId, position: Vec3) {
        if let Some(body) = self.bodies.get_mut(&entity) {
            body.position = position;
        }
    }

    pub fn set_speed(&mut self, entity: EntityId, speed: f32) {
        if let Some(body) = self.bodies.get_mut(&entity) {
            body.speed = speed.max(0.0);
        }
    }

    pub fn destination(&self, entity: EntityId) -> Option<Vec3> {
        self.bodies.get(&entity).and_then(|b| b.destination)
    }

    /// Walk every entity toward its destination
    pub fn advance(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            let Some(destination) = body.destination else {
                continue;
            };
            let offset = destination - body.position;
            let distance = offset.length();
            let step = body.speed * dt;
            if distance <= step {
                body.position = destination;
            } else {
                body.position += offset / distance * step;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl Perception for OpenField {
    fn find_entities_within_radius(&self, center: Vec3, radius: f32, filter: EntityFilter) -> Vec<EntityRef> {
        let mut found: Vec<(f32, EntityRef)> = self
            .bodies
            .iter()
            .filter(|(_, body)| filter.matches(body.faction))
            .map(|(id, body)| (body.position.distance(center), EntityRef { id: *id, position: body.position }))
            .filter(|(distance, _)| *distance <= radius)
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.id.cmp(&b.1.id)));
        found.into_iter().map(|(_, entity)| entity).collect()
    }

    fn has_line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        !self.blockers.iter().any(|b| b.blocks(from, to))
    }

    fn position_of(&self, entity: EntityId) -> Option<Vec3> {
        self.bodies.get(&entity).map(|b| b.position)
    }
}

impl Movement for OpenField {
    fn move_to(&mut self, entity: EntityId, point: Vec3) {
        if let Some(body) = self.bodies.get_mut(&entity) {
            body.destination = Some(point);
        }
    }

    fn stop(&mut self, entity: EntityId) {
        if let Some(body) = self.bodies.get_mut(&entity) {
            body.destination = None;
        }
    }

    fn has_arrived(&self, entity: EntityId) -> bool {
        self.remaining_distance(entity) < self.arrival_tolerance
    }

    fn remaining_distance(&self, entity: EntityId) -> f32 {
        self.bodies
            .get(&entity)
            .and_then(|b| b.destination.map(|d| d.distance(b.position)))
            .unwrap_or(0.0)
    }
}

impl Environment for OpenField {
    fn place(&mut self, entity: EntityId, faction: Faction, position: Vec3) {
        self.bodies.insert(
            entity,
            Body {
                faction,
                position,
                destination: None,
                speed: self.default_speed,
            },
        );
    }

    fn remove(&mut self, entity: EntityId) {
        self.bodies.remove(&entity);
    }
}
