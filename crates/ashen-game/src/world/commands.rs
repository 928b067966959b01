//! Commands the host issues on behalf of the player
//!
//! Every command validates first and changes nothing when it fails. A
//! rejection is logged, shown through the notifier, and returned.

use std::sync::Arc;

use ashen_core::EntityId;
use tracing::{debug, info, warn};

use super::{HitReport, World, BASIC_ATTACK_ID};
use crate::actor::{Actor, Attribute, Hero, Role, StatBlock};
use crate::combat::ability::{AbilityKind, MAX_ABILITY_SLOTS};
use crate::combat::consumable::{consume, EffectOutcome, EffectTarget};
use crate::combat::damage::basic_attack_base;
use crate::combat::equipment::{EquipError, EquipmentSlot};
use crate::combat::item::Item;
use crate::environment::{EntityFilter, Environment};
use crate::error::GameError;
use crate::events::GameEvent;

/// An item moved from the bag onto the body
#[derive(Debug, Clone)]
pub struct Worn {
    pub slot: EquipmentSlot,
    pub item: Arc<Item>,
    /// Whatever the slot held before, now back in the bag
    pub previous: Option<Arc<Item>>,
}

/// Where the unit being worn is taken from
#[derive(Debug, Clone, Copy)]
enum Source {
    /// First bag slot holding the item
    Bag,
    /// This bag slot
    Slot(usize),
}

/// Move one unit of `item` out of the bag and wear it. The displaced item
/// goes back into the bag; if it does not fit, nothing changes.
fn wear(
    hero: &mut Hero,
    stats: &mut StatBlock,
    item: Arc<Item>,
    level: u32,
    source: Source,
) -> Result<Worn, GameError> {
    item.check_usable(level)?;
    if !item.item_type.is_equipment() {
        return Err(EquipError::NotEquipment {
            item: item.name.clone(),
            item_type: item.item_type,
        }
        .into());
    }
    let slot = item.equipment_slot.ok_or_else(|| EquipError::NoSlot {
        item: item.name.clone(),
    })?;
    let taken = match source {
        Source::Bag => hero.inventory.remove_item(&item, 1),
        Source::Slot(index) => hero.inventory.remove_from_slot(index, 1)?.1,
    };
    if taken == 0 {
        return Err(GameError::InvalidItem(format!("{} is not in the inventory", item.name)));
    }

    let previous = match hero.equipment.equip_in(slot, Arc::clone(&item), stats) {
        Ok(previous) => previous,
        Err(err) => {
            return_to_bag(hero, &item);
            return Err(err.into());
        }
    };

    if let Some(old) = &previous {
        if let Err(err) = hero.inventory.add_item(old, 1) {
            hero.equipment.unequip(slot, stats);
            if let Err(e) = hero.equipment.equip_in(slot, Arc::clone(old), stats) {
                warn!("Could not re-equip {}: {}", old.id, e);
            }
            return_to_bag(hero, &item);
            return Err(err);
        }
    }
    Ok(Worn { slot, item, previous })
}

fn return_to_bag(hero: &mut Hero, item: &Arc<Item>) {
    if let Err(e) = hero.inventory.add_item(item, 1) {
        warn!("Could not return {} to the bag: {}", item.id, e);
    }
}

impl<E: Environment> World<E> {
    /// Fire the ability in `slot`.
    ///
    /// Checks run in order: caster alive, slot filled, cooldown ready, mana
    /// available. On success mana is spent and the cooldown starts before
    /// the effect resolves. Returns the hits that landed.
    pub fn use_ability(&mut self, actor: EntityId, slot: usize) -> Result<Vec<HitReport>, GameError> {
        self.try_use_ability(actor, slot).map_err(|err| self.reject(err))
    }

    fn try_use_ability(&mut self, actor: EntityId, slot: usize) -> Result<Vec<HitReport>, GameError> {
        let caster = self.living(actor)?;
        let hero = caster.hero().ok_or(GameError::UnknownActor(actor))?;
        if slot >= MAX_ABILITY_SLOTS {
            return Err(GameError::InvalidSlot(slot));
        }
        let ability = hero.abilities.get(slot).cloned().ok_or(GameError::InvalidSlot(slot))?;
        let intelligence = caster.stats.total(Attribute::Intelligence);
        self.check_cooldown(actor, &ability.id, &ability.name)?;

        let caster = self.actors.get_mut(&actor).ok_or(GameError::UnknownActor(actor))?;
        if !caster.stats.use_mana(ability.mana_cost) {
            return Err(GameError::InsufficientResource {
                needed: ability.mana_cost,
                available: caster.stats.current_mana(),
            });
        }
        self.start_cooldown(actor, &ability.id, ability.cooldown);
        self.emit(GameEvent::AbilityUsed {
            actor,
            ability_id: ability.id.clone(),
        });
        debug!("{} casts {}", actor, ability.name);

        let power = ability.power_for(intelligence);
        let mut hits = Vec::new();
        match ability.kind {
            AbilityKind::Damage => {
                for target in self.enemies_in_range(actor, ability.range) {
                    hits.extend(self.deal_damage(actor, target, power));
                }
            }
            AbilityKind::Heal => {
                let healed = self
                    .actors
                    .get_mut(&actor)
                    .map(|a| a.stats.heal(power))
                    .unwrap_or(0);
                if healed > 0 {
                    self.emit(GameEvent::PlayerHealed { amount: healed });
                }
            }
            AbilityKind::Buff => {
                if let (Some(entry), Some(caster)) = (ability.buff_entry(), self.actors.get_mut(&actor)) {
                    caster.stats.apply_buff(entry);
                }
            }
            AbilityKind::Debuff => {
                let Some(entry) = ability.buff_entry() else {
                    return Ok(hits);
                };
                for target in self.enemies_in_range(actor, ability.range) {
                    if let Some(enemy) = self.actors.get_mut(&target) {
                        enemy.stats.apply_buff(entry.clone());
                    }
                    self.provoke(target, actor);
                }
            }
        }
        Ok(hits)
    }

    /// Living enemies around `actor`, nearest first
    fn enemies_in_range(&self, actor: EntityId, range: f32) -> Vec<EntityId> {
        let Some(center) = self.env.position_of(actor) else {
            return Vec::new();
        };
        self.env
            .find_entities_within_radius(center, range, EntityFilter::Enemies)
            .into_iter()
            .map(|found| found.id)
            .filter(|id| *id != actor && self.actors.get(id).is_some_and(Actor::is_alive))
            .collect()
    }

    /// Swing the equipped weapon at one target
    pub fn attack_target(&mut self, actor: EntityId, target: EntityId) -> Result<HitReport, GameError> {
        self.try_attack(actor, target).map_err(|err| self.reject(err))
    }

    fn try_attack(&mut self, actor: EntityId, target: EntityId) -> Result<HitReport, GameError> {
        let attacker = self.living(actor)?;
        let strength = attacker.stats.total(Attribute::Strength);
        let faction = attacker.faction();

        let defender = self.actors.get(&target).ok_or(GameError::TargetUnreachable(target))?;
        if !defender.is_alive() {
            return Err(GameError::ActorDead(target));
        }
        if defender.faction() == faction {
            return Err(GameError::TargetUnreachable(target));
        }
        self.check_cooldown(actor, BASIC_ATTACK_ID, "Attack")?;

        let (Some(from), Some(to)) = (self.env.position_of(actor), self.env.position_of(target)) else {
            return Err(GameError::TargetUnreachable(target));
        };
        if from.distance(to) > self.config.basic_attack_range {
            return Err(GameError::TargetUnreachable(target));
        }

        let base = basic_attack_base(strength, &mut self.rng);
        self.start_cooldown(actor, BASIC_ATTACK_ID, self.config.basic_attack_cooldown);
        self.deal_damage(actor, target, base)
            .ok_or(GameError::TargetUnreachable(target))
    }

    /// Wear an item from the bag, by id
    pub fn equip_item(&mut self, actor: EntityId, item_id: &str) -> Result<Worn, GameError> {
        self.try_equip(actor, |hero| {
            hero.inventory
                .slots()
                .iter()
                .find_map(|slot| slot.item().filter(|item| item.id == item_id).cloned())
                .ok_or_else(|| GameError::InvalidItem(format!("{} is not in the inventory", item_id)))
        })
        .map_err(|err| self.reject(err))
    }

    fn try_equip(
        &mut self,
        actor: EntityId,
        pick: impl FnOnce(&Hero) -> Result<Arc<Item>, GameError>,
    ) -> Result<Worn, GameError> {
        let level = self.living(actor)?.level();
        let Some(Actor {
            stats,
            role: Role::Player(hero),
            ..
        }) = self.actors.get_mut(&actor)
        else {
            return Err(GameError::UnknownActor(actor));
        };
        let item = pick(&**hero)?;
        let worn = wear(hero, stats, item, level, Source::Bag)?;
        self.announce_worn(&worn);
        Ok(worn)
    }

    fn announce_worn(&mut self, worn: &Worn) {
        if let Some(previous) = &worn.previous {
            self.emit(GameEvent::ItemUnequipped {
                slot: worn.slot,
                item_id: previous.id.clone(),
            });
        }
        info!("Equipped {} in {}", worn.item.name, worn.slot.name());
        self.emit(GameEvent::ItemEquipped {
            slot: worn.slot,
            item_id: worn.item.id.clone(),
        });
    }

    /// Take off whatever is in `slot` and put it in the bag
    pub fn unequip_item(&mut self, actor: EntityId, slot: EquipmentSlot) -> Result<Arc<Item>, GameError> {
        self.try_unequip(actor, slot).map_err(|err| self.reject(err))
    }

    fn try_unequip(&mut self, actor: EntityId, slot: EquipmentSlot) -> Result<Arc<Item>, GameError> {
        let Some(Actor {
            stats,
            role: Role::Player(hero),
            ..
        }) = self.actors.get_mut(&actor)
        else {
            return Err(GameError::UnknownActor(actor));
        };
        let item = hero
            .equipment
            .get(slot)
            .cloned()
            .ok_or_else(|| GameError::InvalidItem(format!("Nothing equipped in {}", slot.name())))?;
        hero.inventory.add_item(&item, 1)?;
        hero.equipment.unequip(slot, stats);

        self.emit(GameEvent::ItemUnequipped {
            slot,
            item_id: item.id.clone(),
        });
        Ok(item)
    }

    /// Use whatever sits in inventory slot `index`: equipment is worn,
    /// consumables are applied and one unit is spent.
    pub fn use_inventory_slot(&mut self, actor: EntityId, index: usize) -> Result<Vec<EffectOutcome>, GameError> {
        self.try_use_slot(actor, index).map_err(|err| self.reject(err))
    }

    fn try_use_slot(&mut self, actor: EntityId, index: usize) -> Result<Vec<EffectOutcome>, GameError> {
        let level = self.living(actor)?.level();
        let Some(Actor {
            stats,
            progression,
            role: Role::Player(hero),
            ..
        }) = self.actors.get_mut(&actor)
        else {
            return Err(GameError::UnknownActor(actor));
        };
        let item = hero
            .inventory
            .slot(index)
            .and_then(|slot| slot.item().cloned())
            .ok_or(GameError::InvalidSlot(index))?;
        item.check_usable(level)?;

        if item.item_type.is_equipment() {
            let worn = wear(hero, stats, item, level, Source::Slot(index))?;
            self.announce_worn(&worn);
            return Ok(Vec::new());
        }
        if item.consumable_effects.is_empty() {
            return Err(GameError::InvalidItem(format!("{} cannot be used", item.name)));
        }
        if item.consume_on_use {
            hero.inventory.remove_from_slot(index, 1)?;
        }
        let outcomes = consume(&item, &mut EffectTarget { stats, progression }, &mut self.rng);

        self.emit(GameEvent::ItemUsed { item_id: item.id.clone() });
        for outcome in &outcomes {
            match outcome {
                EffectOutcome::Healed(amount) if *amount > 0 => {
                    self.emit(GameEvent::PlayerHealed { amount: *amount })
                }
                EffectOutcome::Experience { amount, level_ups } => {
                    self.emit(GameEvent::ExperienceGained { actor, amount: *amount });
                    self.announce_level_ups(actor, level_ups);
                }
                EffectOutcome::Fizzled => self.notify(&format!("{} had no effect", item.name)),
                _ => {}
            }
        }
        Ok(outcomes)
    }

    /// Spend one unspent point
    pub fn spend_attribute_point(&mut self, actor: EntityId, attribute: Attribute) -> Result<(), GameError> {
        let result = match self.actors.get_mut(&actor) {
            Some(owner) => owner.progression.spend_attribute_point(&mut owner.stats, attribute),
            None => Err(GameError::UnknownActor(actor)),
        };
        match result {
            Ok(()) => {
                self.emit(GameEvent::AttributeIncreased { actor, attribute });
                Ok(())
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    /// Put a catalog ability on the bar
    pub fn assign_ability(&mut self, actor: EntityId, slot: usize, ability_id: &str) -> Result<(), GameError> {
        let result = self.catalog.require_ability(ability_id).and_then(|ability| {
            let hero = self
                .actors
                .get_mut(&actor)
                .and_then(|a| a.hero_mut())
                .ok_or(GameError::UnknownActor(actor))?;
            hero.abilities.set(slot, ability).ok_or(GameError::InvalidSlot(slot))?;
            Ok(())
        });
        result.map_err(|err| self.reject(err))
    }

    /// Pick up `quantity` of a catalog item
    pub fn pick_up(&mut self, actor: EntityId, item_id: &str, quantity: u32) -> Result<(), GameError> {
        let item = self.catalog.require_item(item_id).map_err(|err| self.reject(err))?;
        self.give_item(actor, &item, quantity)
    }

    pub fn start_quest(&mut self, quest_id: &str) -> Result<(), GameError> {
        let result = self
            .catalog
            .require_quest(quest_id)
            .and_then(|def| self.quests.start(def));
        match result {
            Ok(update) => {
                self.apply_to_player(vec![update]);
                Ok(())
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    /// Hand in a quest whose objectives are all done
    pub fn complete_quest(&mut self, quest_id: &str) -> Result<(), GameError> {
        match self.quests.complete(quest_id) {
            Ok(update) => {
                self.apply_to_player(vec![update]);
                Ok(())
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    /// Credit advancement on one objective directly
    pub fn progress_objective(&mut self, quest_id: &str, objective_id: &str, amount: u32) {
        let updates = self.quests.update_progress(quest_id, objective_id, amount);
        self.apply_to_player(updates);
    }

    pub fn talk_to(&mut self, npc_id: &str) {
        let updates = self.quests.on_talked_to(npc_id);
        self.apply_to_player(updates);
    }

    pub fn reach_location(&mut self, location_id: &str) {
        let updates = self.quests.on_location_reached(location_id);
        self.apply_to_player(updates);
    }

    fn apply_to_player(&mut self, updates: Vec<crate::quest::QuestUpdate>) {
        match self.player {
            Some(player) => self.apply_quest_updates(player, updates),
            None if !updates.is_empty() => debug!("Quest updates with no player to reward"),
            None => {}
        }
    }
}
