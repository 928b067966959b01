//! Quest definitions and per-run progress
//!
//! A [`QuestDef`] is immutable catalog data. Starting a quest creates a
//! [`QuestInstance`] that tracks progress for each objective.

pub mod log;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use log::{QuestLog, QuestUpdate};

/// What an objective counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveKind {
    /// Enemies of `target_id` type killed
    Kill,
    /// Units of item `target_id` picked up
    Collect,
    /// Conversations with npc `target_id`
    Talk,
    /// Visits to location `target_id`
    Reach,
    /// Character level reached; `target_progress` is the level
    Level,
}

fn default_target() -> u32 {
    1
}

/// One step of a quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveDef {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub kind: ObjectiveKind,
    #[serde(default)]
    pub target_id: String,
    #[serde(default = "default_target")]
    pub target_progress: u32,
}

impl ObjectiveDef {
    pub fn new(id: impl Into<String>, kind: ObjectiveKind, target_id: impl Into<String>, target: u32) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            kind,
            target_id: target_id.into(),
            target_progress: target,
        }
    }
}

/// Something handed out when a quest completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestReward {
    Experience { amount: u32 },
    Gold { amount: u32 },
    Item { item_id: String, quantity: u32 },
    Ability { ability_id: String },
    /// Unlocks an area or feature by key
    Access { key: String },
}

/// Static description of a quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Quest ids that must be completed first
    #[serde(default)]
    pub prerequisites: Vec<String>,
    pub objectives: Vec<ObjectiveDef>,
    #[serde(default)]
    pub rewards: Vec<QuestReward>,
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default)]
    pub main_quest: bool,
    #[serde(default = "default_target")]
    pub recommended_level: u32,
}

impl QuestDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            prerequisites: Vec::new(),
            objectives: Vec::new(),
            rewards: Vec::new(),
            repeatable: false,
            main_quest: false,
            recommended_level: 1,
        }
    }

    pub fn with_objective(mut self, objective: ObjectiveDef) -> Self {
        self.objectives.push(objective);
        self
    }

    pub fn with_reward(mut self, reward: QuestReward) -> Self {
        self.rewards.push(reward);
        self
    }

    pub fn with_prerequisite(mut self, quest_id: impl Into<String>) -> Self {
        self.prerequisites.push(quest_id.into());
        self
    }
}

/// A started quest
#[derive(Debug, Clone)]
pub struct QuestInstance {
    def: Arc<QuestDef>,
    progress: Vec<u32>,
}

impl QuestInstance {
    /// Fresh instance with every objective at zero
    pub fn new(def: Arc<QuestDef>) -> Self {
        let progress = vec![0; def.objectives.len()];
        Self { def, progress }
    }

    pub fn def(&self) -> &Arc<QuestDef> {
        &self.def
    }

    pub fn id(&self) -> &str {
        &self.def.id
    }

    pub fn objective_index(&self, objective_id: &str) -> Option<usize> {
        self.def.objectives.iter().position(|o| o.id == objective_id)
    }

    pub fn progress(&self, objective_id: &str) -> Option<u32> {
        self.objective_index(objective_id).map(|i| self.progress[i])
    }

    pub fn objective_complete(&self, index: usize) -> bool {
        match (self.def.objectives.get(index), self.progress.get(index)) {
            (Some(def), Some(current)) => *current >= def.target_progress,
            _ => false,
        }
    }

    /// Every objective has reached its target
    pub fn is_complete(&self) -> bool {
        (0..self.progress.len()).all(|i| self.objective_complete(i))
    }

    /// Average objective completion, 0.0 for a quest with no objectives
    pub fn completion_fraction(&self) -> f32 {
        if self.progress.is_empty() {
            return 0.0;
        }
        let sum: f32 = self
            .def
            .objectives
            .iter()
            .zip(&self.progress)
            .map(|(def, current)| {
                if def.target_progress == 0 {
                    1.0
                } else {
                    (*current as f32 / def.target_progress as f32).min(1.0)
                }
            })
            .sum();
        sum / self.progress.len() as f32
    }

    /// Add progress, clamped at the target. Returns true if this call
    /// finished the objective.
    fn advance(&mut self, index: usize, amount: u32) -> bool {
        let Some(def) = self.def.objectives.get(index) else {
            return false;
        };
        let was_complete = self.progress[index] >= def.target_progress;
        self.progress[index] = self.progress[index].saturating_add(amount).min(def.target_progress);
        !was_complete && self.progress[index] >= def.target_progress
    }

    fn fill(&mut self, index: usize) -> bool {
        let target = self.def.objectives.get(index).map(|o| o.target_progress).unwrap_or(0);
        let was_complete = self.progress.get(index).is_some_and(|p| *p >= target);
        if let Some(p) = self.progress.get_mut(index) {
            *p = target;
        }
        !was_complete
    }
}
