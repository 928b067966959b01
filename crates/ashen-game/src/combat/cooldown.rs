//! Named ability cooldowns
//!
//! A registry tracks remaining and total time per ability id. Each change is
//! reported back to the caller as a [`CooldownEvent`] so the owning world can
//! forward it to subscribers within the same tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Remaining and total time for one ability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CooldownEntry {
    pub remaining: f32,
    pub total: f32,
}

/// Change notifications produced by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CooldownEvent {
    Started { id: String, duration: f32 },
    Updated { id: String, remaining: f32, total: f32 },
    Finished { id: String },
}

impl CooldownEvent {
    /// Ability id the event refers to
    pub fn id(&self) -> &str {
        match self {
            Self::Started { id, .. } | Self::Updated { id, .. } | Self::Finished { id } => id,
        }
    }
}

/// Whether cooldowns are tracked per actor or shared by everyone using an ability id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownScope {
    #[default]
    PerActor,
    Shared,
}

/// Active cooldowns keyed by ability id
#[derive(Debug, Clone, Default)]
pub struct CooldownRegistry {
    entries: BTreeMap<String, CooldownEntry>,
}

impl CooldownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a cooldown. Ignored for empty ids and non-positive durations.
    pub fn start(&mut self, id: &str, duration: f32) -> Option<CooldownEvent> {
        if id.is_empty() || duration <= 0.0 {
            return None;
        }
        self.entries.insert(
            id.to_string(),
            CooldownEntry {
                remaining: duration,
                total: duration,
            },
        );
        Some(CooldownEvent::Started {
            id: id.to_string(),
            duration,
        })
    }

    /// Count every entry down. Entries that reach zero are removed and reported
    /// as finished in this same call.
    pub fn tick(&mut self, dt: f32) -> Vec<CooldownEvent> {
        let mut events = Vec::with_capacity(self.entries.len());
        let mut finished = Vec::new();

        for (id, entry) in &mut self.entries {
            entry.remaining -= dt;
            events.push(CooldownEvent::Updated {
                id: id.clone(),
                remaining: entry.remaining.max(0.0),
                total: entry.total,
            });
            if entry.remaining <= 0.0 {
                finished.push(id.clone());
            }
        }

        for id in finished {
            self.entries.remove(&id);
            events.push(CooldownEvent::Finished { id });
        }

        events
    }

    pub fn is_on_cooldown(&self, id: &str) -> bool {
        self.entries.get(id).is_some_and(|e| e.remaining > 0.0)
    }

    /// Seconds left, 0 when the ability is ready
    pub fn remaining(&self, id: &str) -> f32 {
        self.entries.get(id).map_or(0.0, |e| e.remaining.max(0.0))
    }

    /// Completion as 0.0-1.0 (1.0 = ready).
    ///
    /// A positive `total_override` replaces the stored total; anything else
    /// falls back to it. Unknown ids are ready.
    pub fn progress(&self, id: &str, total_override: Option<f32>) -> f32 {
        let Some(entry) = self.entries.get(id) else {
            return 1.0;
        };
        let total = match total_override {
            Some(t) if t > 0.0 => t,
            _ => entry.total,
        };
        if total <= 0.0 {
            return 1.0;
        }
        (1.0 - entry.remaining / total).clamp(0.0, 1.0)
    }

    /// Drop one cooldown, reporting it as finished
    pub fn clear(&mut self, id: &str) -> Option<CooldownEvent> {
        self.entries
            .remove(id)
            .map(|_| CooldownEvent::Finished { id: id.to_string() })
    }

    /// Drop every cooldown, reporting each as finished
    pub fn clear_all(&mut self) -> Vec<CooldownEvent> {
        std::mem::take(&mut self.entries)
            .into_keys()
            .map(|id| CooldownEvent::Finished { id })
            .collect()
    }

    /// Copy of every active entry
    pub fn snapshot(&self) -> Vec<(String, CooldownEntry)> {
        self.entries.iter().map(|(id, e)| (id.clone(), *e)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
