//! Active and completed quests for one player

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use super::{ObjectiveKind, QuestDef, QuestInstance, QuestReward};
use crate::error::GameError;

/// A change the world should react to
#[derive(Debug, Clone, PartialEq)]
pub enum QuestUpdate {
    Started { quest_id: String },
    ObjectiveCompleted { quest_id: String, objective_id: String },
    /// Moved to the completed list; `rewards` are owed to the player
    Completed { quest_id: String, rewards: Vec<QuestReward> },
}

#[derive(Debug, Clone, Default)]
pub struct QuestLog {
    active: Vec<QuestInstance>,
    completed: BTreeSet<String>,
    /// Times each quest has been completed, repeatable quests included
    completions: u32,
}

impl QuestLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, quest_id: &str) -> bool {
        self.active.iter().any(|q| q.id() == quest_id)
    }

    pub fn is_completed(&self, quest_id: &str) -> bool {
        self.completed.contains(quest_id)
    }

    pub fn active(&self) -> &[QuestInstance] {
        &self.active
    }

    pub fn get(&self, quest_id: &str) -> Option<&QuestInstance> {
        self.active.iter().find(|q| q.id() == quest_id)
    }

    pub fn completed_ids(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    pub fn completion_count(&self) -> u32 {
        self.completions
    }

    /// Mark quests completed from a save without granting rewards
    pub fn restore_completed<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.completed.extend(ids.into_iter().map(Into::into));
    }

    /// Begin a quest.
    ///
    /// Rejected when it is already active, already completed and not
    /// repeatable, or a prerequisite has not been completed.
    pub fn start(&mut self, def: Arc<QuestDef>) -> Result<QuestUpdate, GameError> {
        if self.is_active(&def.id) {
            return Err(GameError::PrerequisiteNotMet(format!("{} is already active", def.name)));
        }
        if self.is_completed(&def.id) && !def.repeatable {
            return Err(GameError::PrerequisiteNotMet(format!("{} is already completed", def.name)));
        }
        if let Some(missing) = def.prerequisites.iter().find(|p| !self.is_completed(p)) {
            return Err(GameError::PrerequisiteNotMet(format!("{} requires {}", def.name, missing)));
        }

        info!("Quest started: {}", def.name);
        let quest_id = def.id.clone();
        self.active.push(QuestInstance::new(def));
        Ok(QuestUpdate::Started { quest_id })
    }

    /// Add progress to one objective. Completes the quest once every
    /// objective is done.
    pub fn update_progress(&mut self, quest_id: &str, objective_id: &str, amount: u32) -> Vec<QuestUpdate> {
        let mut updates = Vec::new();
        let Some(quest) = self.active.iter_mut().find(|q| q.id() == quest_id) else {
            return updates;
        };
        let Some(index) = quest.objective_index(objective_id) else {
            return updates;
        };

        if quest.advance(index, amount) {
            updates.push(QuestUpdate::ObjectiveCompleted {
                quest_id: quest_id.to_string(),
                objective_id: objective_id.to_string(),
            });
        }
        self.complete_if_done(quest_id, &mut updates);
        updates
    }

    /// Hand in a quest. Fails while any objective is unfinished.
    pub fn complete(&mut self, quest_id: &str) -> Result<QuestUpdate, GameError> {
        let index = self
            .active
            .iter()
            .position(|q| q.id() == quest_id)
            .ok_or_else(|| GameError::PrerequisiteNotMet(format!("{} is not active", quest_id)))?;

        if !self.active[index].is_complete() {
            return Err(GameError::PrerequisiteNotMet(format!(
                "{} has unfinished objectives",
                quest_id
            )));
        }

        let quest = self.active.remove(index);
        let def = quest.def();
        info!("Quest completed: {}", def.name);
        self.completed.insert(def.id.clone());
        self.completions += 1;
        Ok(QuestUpdate::Completed {
            quest_id: def.id.clone(),
            rewards: def.rewards.clone(),
        })
    }

    pub fn on_enemy_killed(&mut self, enemy_type: &str) -> Vec<QuestUpdate> {
        self.progress_matching(ObjectiveKind::Kill, enemy_type, 1)
    }

    pub fn on_item_collected(&mut self, item_id: &str, quantity: u32) -> Vec<QuestUpdate> {
        self.progress_matching(ObjectiveKind::Collect, item_id, quantity)
    }

    pub fn on_talked_to(&mut self, npc_id: &str) -> Vec<QuestUpdate> {
        self.progress_matching(ObjectiveKind::Talk, npc_id, 1)
    }

    pub fn on_location_reached(&mut self, location_id: &str) -> Vec<QuestUpdate> {
        self.progress_matching(ObjectiveKind::Reach, location_id, 1)
    }

    /// Level objectives complete outright once the level is high enough
    pub fn on_level_reached(&mut self, level: u32) -> Vec<QuestUpdate> {
        let mut updates = Vec::new();
        let mut touched = Vec::new();

        for quest in &mut self.active {
            let matching: Vec<usize> = quest
                .def()
                .objectives
                .iter()
                .enumerate()
                .filter(|(_, o)| o.kind == ObjectiveKind::Level && level >= o.target_progress)
                .map(|(i, _)| i)
                .collect();
            for index in matching {
                if quest.fill(index) {
                    updates.push(QuestUpdate::ObjectiveCompleted {
                        quest_id: quest.id().to_string(),
                        objective_id: quest.def().objectives[index].id.clone(),
                    });
                }
                touched.push(quest.id().to_string());
            }
        }

        for quest_id in touched {
            self.complete_if_done(&quest_id, &mut updates);
        }
        updates
    }

    fn progress_matching(&mut self, kind: ObjectiveKind, target_id: &str, amount: u32) -> Vec<QuestUpdate> {
        let targets: Vec<(String, String)> = self
            .active
            .iter()
            .flat_map(|q| {
                q.def()
                    .objectives
                    .iter()
                    .filter(|o| o.kind == kind && o.target_id == target_id)
                    .map(move |o| (q.id().to_string(), o.id.clone()))
            })
            .collect();

        let mut updates = Vec::new();
        for (quest_id, objective_id) in targets {
            updates.extend(self.update_progress(&quest_id, &objective_id, amount));
        }
        updates
    }

    fn complete_if_done(&mut self, quest_id: &str, updates: &mut Vec<QuestUpdate>) {
        let done = self.get(quest_id).is_some_and(QuestInstance::is_complete);
        if !done {
            return;
        }
        match self.complete(quest_id) {
            Ok(update) => updates.push(update),
            Err(err) => debug!("Quest {} not completed: {}", quest_id, err),
        }
    }
}
