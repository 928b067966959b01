//! Ashen Core - Shared primitives for the Ashen simulation
//!
//! This crate provides the foundational types used by the rule engine and the driver:
//! - Mathematical primitives (re-exported from glam)
//! - Entity identifiers
//! - Simulation clock with fixed-step accumulation

pub mod time;
pub mod types;

pub use glam::Vec3;
pub use time::{GameTime, TimeConfig, TimeError};
pub use types::{EntityId, Position};
