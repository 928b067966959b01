//! Timed attribute buffs
//!
//! A [`BuffLedger`] is owned by one actor's stat block. Entries are ticked
//! down every simulation step and dropped when their time runs out.

use serde::{Deserialize, Serialize};

use crate::actor::stats::{Attribute, Attributes};

/// One active buff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffEntry {
    /// Ability (or consumable) that created the buff
    pub source: String,
    /// Full duration in seconds
    pub duration: f32,
    /// Seconds left
    pub remaining: f32,
    /// Attribute changes while active
    pub deltas: Attributes,
}

impl BuffEntry {
    pub fn new(source: impl Into<String>, duration: f32, deltas: Attributes) -> Self {
        Self {
            source: source.into(),
            duration,
            remaining: duration,
            deltas,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Remaining time as a 0.0-1.0 fraction
    pub fn fraction_remaining(&self) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.remaining / self.duration).clamp(0.0, 1.0)
    }
}

/// Active buffs on one actor
#[derive(Debug, Clone, Default)]
pub struct BuffLedger {
    entries: Vec<BuffEntry>,
    max_entries: Option<usize>,
}

impl BuffLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit concurrent entries. `None` means unbounded.
    pub fn set_max_entries(&mut self, max: Option<usize>) {
        self.max_entries = max;
        self.enforce_cap();
    }

    /// Append a buff. Returns the entries evicted by the cap, oldest first.
    pub fn apply(&mut self, entry: BuffEntry) -> Vec<BuffEntry> {
        self.entries.push(entry);
        self.enforce_cap()
    }

    fn enforce_cap(&mut self) -> Vec<BuffEntry> {
        match self.max_entries {
            Some(max) if self.entries.len() > max => {
                let overflow = self.entries.len() - max;
                self.entries.drain(..overflow).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Count down every entry and remove the expired ones in a single pass
    pub fn tick(&mut self, dt: f32) -> Vec<BuffEntry> {
        for entry in &mut self.entries {
            entry.remaining -= dt;
        }

        let (expired, active): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.entries).into_iter().partition(BuffEntry::is_expired);
        self.entries = active;
        expired
    }

    /// Sum of one attribute across every active entry
    pub fn total_delta(&self, attribute: Attribute) -> i32 {
        self.entries.iter().map(|e| e.deltas.get(attribute)).sum()
    }

    /// Sum of all attributes across every active entry
    pub fn totals(&self) -> Attributes {
        self.entries.iter().fold(Attributes::ZERO, |acc, e| acc.combined(&e.deltas))
    }

    pub fn has(&self, source: &str) -> bool {
        self.entries.iter().any(|e| e.source == source)
    }

    /// Remove every entry from `source`
    pub fn remove(&mut self, source: &str) -> usize {
        self.remove_where(|e| e.source == source)
    }

    /// Remove every entry matching `predicate`
    pub fn remove_where(&mut self, predicate: impl Fn(&BuffEntry) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !predicate(e));
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuffEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_and_total() {
        let mut ledger = BuffLedger::new();
        ledger.apply(BuffEntry::new("war_cry", 5.0, Attributes::new(4, 0, 0, 0)));
        ledger.apply(BuffEntry::new("war_cry", 5.0, Attributes::new(4, 0, 0, 2)));

        assert_eq!(ledger.total_delta(Attribute::Strength), 8);
        assert_eq!(ledger.totals(), Attributes::new(8, 0, 0, 2));
        assert!(ledger.has("war_cry"));
    }

    #[test]
    fn test_tick_expires_in_one_pass() {
        let mut ledger = BuffLedger::new();
        ledger.apply(BuffEntry::new("short", 1.0, Attributes::uniform(1)));
        ledger.apply(BuffEntry::new("long", 3.0, Attributes::uniform(1)));
        ledger.apply(BuffEntry::new("short2", 0.5, Attributes::uniform(1)));

        let expired = ledger.tick(1.0);
        assert_eq!(expired.len(), 2);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.has("long"));
        assert!((ledger.iter().next().unwrap().remaining - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_remove_by_source() {
        let mut ledger = BuffLedger::new();
        ledger.apply(BuffEntry::new("a", 5.0, Attributes::uniform(1)));
        ledger.apply(BuffEntry::new("b", 5.0, Attributes::uniform(1)));
        assert_eq!(ledger.remove("a"), 1);
        assert_eq!(ledger.remove("a"), 0);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut ledger = BuffLedger::new();
        ledger.set_max_entries(Some(2));
        ledger.apply(BuffEntry::new("first", 5.0, Attributes::uniform(1)));
        ledger.apply(BuffEntry::new("second", 5.0, Attributes::uniform(1)));
        let evicted = ledger.apply(BuffEntry::new("third", 5.0, Attributes::uniform(1)));

        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].source, "first");
        assert!(!ledger.has("first"));
        assert_eq!(ledger.len(), 2);
    }
}
