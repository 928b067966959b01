//! Consumable effect dispatch
//!
//! Each [`EffectKind`] maps to one handler. Every effect rolls its own
//! success chance before it is applied.

use rand::Rng;

use super::buff::BuffEntry;
use super::item::{ConsumableEffect, EffectKind, Item};
use crate::actor::progression::{LevelUp, Progression};
use crate::actor::stats::StatBlock;

/// What one effect ended up doing
#[derive(Debug, Clone, PartialEq)]
pub enum EffectOutcome {
    Healed(i32),
    ManaRestored(i32),
    Buffed { source: String, duration: f32 },
    StatRaised { attribute: crate::actor::stats::Attribute, amount: i32 },
    DebuffsRemoved(usize),
    Experience { amount: u32, level_ups: Vec<LevelUp> },
    /// The success roll failed
    Fizzled,
}

/// Target of a consumable
pub struct EffectTarget<'a> {
    pub stats: &'a mut StatBlock,
    pub progression: &'a mut Progression,
}

type Handler = fn(&Item, &EffectKind, &mut EffectTarget<'_>) -> EffectOutcome;

fn handler(kind: &EffectKind) -> Handler {
    match kind {
        EffectKind::RestoreHealth { .. } => restore_health,
        EffectKind::RestoreMana { .. } => restore_mana,
        EffectKind::TemporaryBuff { .. } => temporary_buff,
        EffectKind::PermanentStat { .. } => permanent_stat,
        EffectKind::RemoveDebuff => remove_debuff,
        EffectKind::Experience { .. } => experience,
    }
}

fn restore_health(_: &Item, kind: &EffectKind, target: &mut EffectTarget<'_>) -> EffectOutcome {
    let EffectKind::RestoreHealth { amount } = kind else {
        return EffectOutcome::Fizzled;
    };
    EffectOutcome::Healed(target.stats.heal(*amount))
}

fn restore_mana(_: &Item, kind: &EffectKind, target: &mut EffectTarget<'_>) -> EffectOutcome {
    let EffectKind::RestoreMana { amount } = kind else {
        return EffectOutcome::Fizzled;
    };
    EffectOutcome::ManaRestored(target.stats.restore_mana(*amount))
}

fn temporary_buff(item: &Item, kind: &EffectKind, target: &mut EffectTarget<'_>) -> EffectOutcome {
    let EffectKind::TemporaryBuff { duration, deltas } = kind else {
        return EffectOutcome::Fizzled;
    };
    target.stats.apply_buff(BuffEntry::new(item.id.clone(), *duration, *deltas));
    EffectOutcome::Buffed {
        source: item.id.clone(),
        duration: *duration,
    }
}

fn permanent_stat(_: &Item, kind: &EffectKind, target: &mut EffectTarget<'_>) -> EffectOutcome {
    let EffectKind::PermanentStat { attribute, amount } = kind else {
        return EffectOutcome::Fizzled;
    };
    target.stats.add_to_base(*attribute, *amount);
    EffectOutcome::StatRaised {
        attribute: *attribute,
        amount: *amount,
    }
}

fn remove_debuff(_: &Item, _: &EffectKind, target: &mut EffectTarget<'_>) -> EffectOutcome {
    EffectOutcome::DebuffsRemoved(target.stats.remove_debuffs())
}

fn experience(_: &Item, kind: &EffectKind, target: &mut EffectTarget<'_>) -> EffectOutcome {
    let EffectKind::Experience { amount } = kind else {
        return EffectOutcome::Fizzled;
    };
    let level_ups = target.progression.gain_experience(target.stats, *amount);
    EffectOutcome::Experience {
        amount: *amount,
        level_ups,
    }
}

/// Roll and apply one effect
pub fn apply_effect(
    item: &Item,
    effect: &ConsumableEffect,
    target: &mut EffectTarget<'_>,
    rng: &mut impl Rng,
) -> EffectOutcome {
    if effect.success_chance < 1.0 && rng.gen::<f32>() >= effect.success_chance {
        return EffectOutcome::Fizzled;
    }
    handler(&effect.kind)(item, &effect.kind, target)
}

/// Apply every effect of `item` in order
pub fn consume(item: &Item, target: &mut EffectTarget<'_>, rng: &mut impl Rng) -> Vec<EffectOutcome> {
    item.consumable_effects
        .iter()
        .map(|effect| apply_effect(item, effect, target, rng))
        .collect()
}
