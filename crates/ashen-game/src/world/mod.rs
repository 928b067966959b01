//! The simulation world
//!
//! Owns every actor, the random source, cooldowns, quests and the event bus,
//! and resolves what happens between actors: hits, deaths, experience, loot
//! and quest rewards. The host drives it through the commands in
//! `commands.rs` and [`World::tick`].

mod commands;
mod tick;

use std::collections::BTreeMap;
use std::sync::Arc;

use ashen_core::{EntityId, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::actor::{Actor, Attributes, Counters, Foe, Hero, LevelUp, Progression, Role, StatBlock, StatProfile};
use crate::catalog::ContentCatalog;
use crate::combat::cooldown::{CooldownEvent, CooldownRegistry, CooldownScope};
use crate::combat::damage::compute_damage;
use crate::combat::inventory::DEFAULT_INVENTORY_SIZE;
use crate::combat::item::Item;
use crate::combat::loot::LootContext;
use crate::enemy::{AiOutput, EnemyBrain, EnemyProfile};
use crate::environment::{Environment, Faction};
use crate::error::{GameError, PersistenceError};
use crate::events::{EventBus, GameEvent, Notifier, TracingNotifier};
use crate::persistence::{PlayerRecord, RECORD_VERSION};
use crate::quest::{QuestLog, QuestReward, QuestUpdate};

pub use commands::Worn;

/// Cooldown id shared by every basic attack
pub const BASIC_ATTACK_ID: &str = "basic_attack";

/// Rules the world runs with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed for every random draw
    pub seed: u64,
    pub cooldown_scope: CooldownScope,
    /// Derivation rules for the player's stat block
    pub player_profile: StatProfile,
    /// Seconds between player death and respawn
    pub respawn_delay: f32,
    /// Health and mana fraction restored on respawn
    pub respawn_fraction: f32,
    /// Seconds a dead enemy stays in the world
    pub despawn_delay: f32,
    pub basic_attack_range: f32,
    pub basic_attack_cooldown: f32,
    /// Maximum concurrent buffs per actor
    pub buff_cap: Option<usize>,
    pub inventory_size: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            cooldown_scope: CooldownScope::PerActor,
            player_profile: StatProfile::player(),
            respawn_delay: 3.0,
            respawn_fraction: 0.5,
            despawn_delay: 2.0,
            basic_attack_range: 2.0,
            basic_attack_cooldown: 1.0,
            buff_cap: None,
            inventory_size: DEFAULT_INVENTORY_SIZE,
        }
    }
}

/// One hit that landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitReport {
    pub target: EntityId,
    pub amount: i32,
    pub critical: bool,
    pub killed: bool,
}

pub struct World<E: Environment> {
    env: E,
    catalog: Arc<ContentCatalog>,
    config: WorldConfig,
    rng: StdRng,
    actors: BTreeMap<EntityId, Actor>,
    player: Option<EntityId>,
    shared_cooldowns: CooldownRegistry,
    quests: QuestLog,
    bus: EventBus,
    notifier: Box<dyn Notifier>,
    play_time: f64,
}

impl<E: Environment> World<E> {
    pub fn new(env: E, catalog: Arc<ContentCatalog>, config: WorldConfig) -> Self {
        Self {
            env,
            catalog,
            rng: StdRng::seed_from_u64(config.seed),
            config,
            actors: BTreeMap::new(),
            player: None,
            shared_cooldowns: CooldownRegistry::new(),
            quests: QuestLog::new(),
            bus: EventBus::new(),
            notifier: Box::new(TracingNotifier),
            play_time: 0.0,
        }
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    /// Host access for moving entities and advancing locomotion
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    pub fn catalog(&self) -> &Arc<ContentCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn set_notifier(&mut self, notifier: Box<dyn Notifier>) {
        self.notifier = notifier;
    }

    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: EntityId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player
    }

    pub fn player(&self) -> Option<&Actor> {
        self.player.and_then(|id| self.actors.get(&id))
    }

    pub fn quests(&self) -> &QuestLog {
        &self.quests
    }

    /// Living enemies
    pub fn enemy_count(&self) -> usize {
        self.actors
            .values()
            .filter(|a| a.faction() == Faction::Enemy && a.is_alive())
            .count()
    }

    /// Seconds of simulated play
    pub fn play_time(&self) -> f64 {
        self.play_time
    }

    /// Whether the player holds an access key from a quest reward
    pub fn has_access(&self, key: &str) -> bool {
        self.player()
            .and_then(Actor::hero)
            .is_some_and(|hero| hero.unlocked.contains(key))
    }

    /// Cooldowns that apply to `actor` under the configured scope
    pub fn cooldowns(&self, actor: EntityId) -> Option<&CooldownRegistry> {
        match self.config.cooldown_scope {
            CooldownScope::Shared => Some(&self.shared_cooldowns),
            CooldownScope::PerActor => self.actors.get(&actor).map(|a| &a.cooldowns),
        }
    }

    fn cooldowns_mut(&mut self, actor: EntityId) -> Option<&mut CooldownRegistry> {
        match self.config.cooldown_scope {
            CooldownScope::Shared => Some(&mut self.shared_cooldowns),
            CooldownScope::PerActor => self.actors.get_mut(&actor).map(|a| &mut a.cooldowns),
        }
    }

    /// Ids come from the seeded rng so whole runs replay identically
    fn next_id(&mut self) -> EntityId {
        EntityId::from_u128(self.rng.gen())
    }

    fn is_player(&self, id: EntityId) -> bool {
        self.player == Some(id)
    }

    fn emit(&mut self, event: GameEvent) {
        self.bus.publish(&event);
    }

    fn notify(&mut self, message: &str) {
        self.notifier.notify(message);
        self.emit(GameEvent::Notification(message.to_string()));
    }

    /// Surface a rejected command. Vanished targets are dropped silently.
    fn reject(&mut self, err: GameError) -> GameError {
        debug!("Command rejected: {}", err);
        if !matches!(err, GameError::TargetUnreachable(_)) {
            self.notify(&err.notification());
        }
        err
    }

    fn living(&self, id: EntityId) -> Result<&Actor, GameError> {
        let actor = self.actors.get(&id).ok_or(GameError::UnknownActor(id))?;
        if !actor.is_alive() {
            return Err(GameError::ActorDead(id));
        }
        Ok(actor)
    }

    fn player_stats(&self, profile: StatProfile, base: Attributes) -> StatBlock {
        let mut stats = StatBlock::new(profile, base);
        stats.set_buff_cap(self.config.buff_cap);
        stats
    }

    fn remove_player(&mut self) {
        if let Some(old) = self.player.take() {
            self.actors.remove(&old);
            self.env.remove(old);
        }
    }

    /// Create the player, replacing any existing one, and hand out the starter kit
    pub fn spawn_player(&mut self, name: impl Into<String>, position: Vec3) -> EntityId {
        self.remove_player();
        let id = self.next_id();
        let name = name.into();
        info!("Player {} enters the world", name);

        let actor = Actor {
            id,
            name,
            stats: self.player_stats(self.config.player_profile.clone(), Attributes::uniform(10)),
            progression: Progression::new(),
            cooldowns: CooldownRegistry::new(),
            role: Role::Player(Box::new(Hero::new(self.config.inventory_size, position))),
        };
        self.env.place(id, Faction::Player, position);
        self.actors.insert(id, actor);
        self.player = Some(id);
        self.apply_starter_kit(id);
        id
    }

    fn apply_starter_kit(&mut self, id: EntityId) {
        let catalog = Arc::clone(&self.catalog);
        let kit = catalog.starter();

        for stack in &kit.items {
            if let Some(item) = catalog.item(&stack.item_id) {
                if let Err(err) = self.give_item(id, &item, stack.quantity) {
                    warn!("Starter item {} not given: {}", stack.item_id, err);
                }
            }
        }

        if let Some(actor) = self.actors.get_mut(&id) {
            if let Actor {
                stats,
                role: Role::Player(hero),
                ..
            } = actor
            {
                for item in kit.equipment.iter().filter_map(|i| catalog.item(i)) {
                    if let Err(err) = hero.equipment.equip(item, stats) {
                        warn!("Starter equipment rejected: {}", err);
                    }
                }
                for ability in kit.abilities.iter().filter_map(|a| catalog.ability(a)) {
                    hero.abilities.learn(ability);
                }
            }
        }

        for quest_id in &kit.quests {
            if let Err(err) = self.start_quest(quest_id) {
                warn!("Starter quest {} not started: {}", quest_id, err);
            }
        }
    }

    /// Spawn an enemy from a catalog template
    pub fn spawn_enemy(&mut self, template_id: &str, position: Vec3) -> Result<EntityId, GameError> {
        let profile = self.catalog.require_enemy(template_id)?;
        Ok(self.spawn_enemy_from(profile, position))
    }

    pub fn spawn_enemy_from(&mut self, profile: Arc<EnemyProfile>, position: Vec3) -> EntityId {
        let id = self.next_id();
        let mut stats = profile.stat_block();
        stats.set_buff_cap(self.config.buff_cap);

        self.env.place(id, Faction::Enemy, position);
        let mut brain = EnemyBrain::new(id, position, profile.ai.clone());
        brain.start(&mut self.env, &mut self.rng);

        debug!("Spawned {} (level {}) as {}", profile.name, profile.level, id);
        let actor = Actor {
            id,
            name: profile.name.clone(),
            stats,
            progression: Progression::at_level(profile.level),
            cooldowns: CooldownRegistry::new(),
            role: Role::Enemy(Box::new(Foe {
                profile,
                brain,
                despawn_in: None,
            })),
        };
        self.actors.insert(id, actor);
        id
    }

    fn start_cooldown(&mut self, actor: EntityId, id: &str, duration: f32) {
        let owner = (self.config.cooldown_scope == CooldownScope::PerActor).then_some(actor);
        let started = self.cooldowns_mut(actor).and_then(|r| r.start(id, duration));
        if let Some(CooldownEvent::Started { id, duration }) = started {
            self.emit(GameEvent::CooldownStarted {
                actor: owner,
                id,
                duration,
            });
        }
    }

    fn check_cooldown(&self, actor: EntityId, id: &str, name: &str) -> Result<(), GameError> {
        match self.cooldowns(actor) {
            Some(registry) if registry.is_on_cooldown(id) => Err(GameError::OnCooldown {
                ability: name.to_string(),
                remaining: registry.remaining(id),
            }),
            _ => Ok(()),
        }
    }

    /// Run `base` through the damage resolver from `source` to `target`.
    /// `None` when the target is gone, dead or invulnerable.
    fn deal_damage(&mut self, source: EntityId, target: EntityId, base: i32) -> Option<HitReport> {
        let attacker = self.actors.get(&source)?;
        let level = attacker.level();
        let chance = attacker.stats.critical_chance();
        let multiplier = attacker.stats.critical_multiplier();
        let source_faction = attacker.faction();

        let Some(defender) = self.actors.get_mut(&target) else {
            debug!("{}", GameError::TargetUnreachable(target));
            return None;
        };
        if !defender.is_alive() {
            return None;
        }
        let roll = compute_damage(base, level, defender.stats.armor(), chance, multiplier, &mut self.rng);
        let taken = defender.stats.take_damage(roll.amount);
        let defender_faction = defender.faction();
        if taken.dealt == 0 && !taken.died {
            return None;
        }

        if let Some(position) = self.env.position_of(target) {
            self.notifier.damage_shown(position, taken.dealt, roll.is_critical);
        }
        self.emit(GameEvent::DamageDealt {
            source,
            target,
            amount: taken.dealt,
        });
        match defender_faction {
            Faction::Enemy => {
                self.emit(GameEvent::EnemyDamaged {
                    enemy: target,
                    amount: taken.dealt,
                    critical: roll.is_critical,
                });
                if source_faction == Faction::Player && !taken.died {
                    self.provoke(target, source);
                }
            }
            Faction::Player => self.emit(GameEvent::PlayerDamaged { amount: taken.dealt }),
        }

        if taken.died {
            self.handle_death(target, Some(source));
        }
        Some(HitReport {
            target,
            amount: taken.dealt,
            critical: roll.is_critical,
            killed: taken.died,
        })
    }

    fn provoke(&mut self, enemy: EntityId, attacker: EntityId) {
        let Some(foe) = self.actors.get_mut(&enemy).and_then(|a| a.foe_mut()) else {
            return;
        };
        let outputs = foe.brain.provoke(attacker, &mut self.env);
        self.handle_ai_outputs(enemy, outputs);
    }

    fn handle_ai_outputs(&mut self, enemy: EntityId, outputs: Vec<AiOutput>) {
        for output in outputs {
            match output {
                AiOutput::StateChanged { from, to } => self.emit(GameEvent::AiStateChanged { enemy, from, to }),
                AiOutput::Strike { target } => {
                    let base = self
                        .actors
                        .get(&enemy)
                        .and_then(Actor::foe)
                        .map(|foe| foe.profile.base_damage());
                    if let Some(base) = base {
                        self.deal_damage(enemy, target, base);
                    }
                }
                AiOutput::AttackStarted { target } => debug!("{} swings at {}", enemy, target),
                AiOutput::AlertRaised | AiOutput::AlertCleared => {}
            }
        }
    }

    fn handle_death(&mut self, id: EntityId, killer: Option<EntityId>) {
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        info!("{} died", actor.name);

        match &mut actor.role {
            Role::Enemy(foe) => {
                foe.brain.disable(&mut self.env);
                foe.despawn_in = Some(self.config.despawn_delay);
                let profile = Arc::clone(&foe.profile);

                self.emit(GameEvent::EnemyDied {
                    enemy: id,
                    enemy_type: profile.enemy_type.clone(),
                    killer,
                });
                if let Some(killer) = killer.filter(|k| self.is_player(*k)) {
                    self.reward_kill(killer, &profile);
                }
            }
            Role::Player(hero) => {
                hero.respawn_in = Some(self.config.respawn_delay);
                self.env.remove(id);
                for other in self.actors.values_mut() {
                    if let Some(foe) = other.foe_mut() {
                        foe.brain.drop_target(id);
                    }
                }
                self.emit(GameEvent::PlayerDied);
                self.notify("You died!");
            }
        }
    }

    fn reward_kill(&mut self, killer: EntityId, profile: &EnemyProfile) {
        self.grant_experience(killer, profile.experience_reward());
        if let Some(hero) = self.actors.get_mut(&killer).and_then(|a| a.hero_mut()) {
            hero.counters.enemies_killed += 1;
        }
        let updates = self.quests.on_enemy_killed(&profile.enemy_type);
        self.apply_quest_updates(killer, updates);
        self.roll_loot(killer, profile);
    }

    fn roll_loot(&mut self, killer: EntityId, profile: &EnemyProfile) {
        let Some(table_id) = profile.loot_table.as_deref() else {
            return;
        };
        let Some(table) = self.catalog.loot_table(table_id) else {
            warn!("{} references missing loot table {}", profile.id, table_id);
            return;
        };
        let context = LootContext {
            killer_level: self.actors.get(&killer).map(Actor::level).unwrap_or(1),
            is_boss: profile.is_boss,
        };

        for drop in profile.loot.drop_loot(&table, context, &mut self.rng) {
            let Some(item) = self.catalog.item(&drop.item_id) else {
                warn!("Loot table {} dropped unknown item {}", table_id, drop.item_id);
                continue;
            };
            if let Err(err) = self.give_item(killer, &item, drop.quantity) {
                debug!("Loot {} lost: {}", item.id, err);
            }
        }
    }

    /// Put items into an actor's bag, counting pickups for quests.
    /// A partial fit keeps what was placed.
    pub fn give_item(&mut self, actor: EntityId, item: &Arc<Item>, quantity: u32) -> Result<(), GameError> {
        let hero = self
            .actors
            .get_mut(&actor)
            .and_then(|a| a.hero_mut())
            .ok_or(GameError::UnknownActor(actor))?;

        let result = hero.inventory.add_item(item, quantity);
        let placed = match &result {
            Ok(()) => quantity,
            Err(GameError::InventoryFull { placed, .. }) => *placed,
            Err(_) => 0,
        };
        hero.counters.items_collected += placed;

        if placed > 0 {
            self.emit(GameEvent::ItemPickedUp {
                item_id: item.id.clone(),
                quantity: placed,
            });
            let updates = self.quests.on_item_collected(&item.id, placed);
            self.apply_quest_updates(actor, updates);
        }
        result.map_err(|err| self.reject(err))
    }

    fn grant_experience(&mut self, actor: EntityId, amount: u32) {
        let Some(target) = self.actors.get_mut(&actor) else {
            return;
        };
        let level_ups = target.progression.gain_experience(&mut target.stats, amount);
        self.emit(GameEvent::ExperienceGained { actor, amount });
        self.announce_level_ups(actor, &level_ups);
    }

    fn announce_level_ups(&mut self, actor: EntityId, level_ups: &[LevelUp]) {
        let Some(last) = level_ups.last() else {
            return;
        };
        for level_up in level_ups {
            self.emit(GameEvent::LevelUp {
                actor,
                level: level_up.new_level,
            });
        }
        self.notify(&format!("Level up! You are now level {}", last.new_level));

        if self.is_player(actor) {
            let updates = self.quests.on_level_reached(last.new_level);
            self.apply_quest_updates(actor, updates);
        }
    }

    fn apply_quest_updates(&mut self, player: EntityId, updates: Vec<QuestUpdate>) {
        for update in updates {
            match update {
                QuestUpdate::Started { quest_id } => {
                    let name = self.quest_name(&quest_id);
                    self.notify(&format!("Quest Started: {}", name));
                    self.emit(GameEvent::QuestStarted { quest_id });
                }
                QuestUpdate::ObjectiveCompleted { quest_id, objective_id } => {
                    self.emit(GameEvent::ObjectiveCompleted { quest_id, objective_id });
                }
                QuestUpdate::Completed { quest_id, rewards } => {
                    if let Some(hero) = self.actors.get_mut(&player).and_then(|a| a.hero_mut()) {
                        hero.counters.quests_completed += 1;
                    }
                    let name = self.quest_name(&quest_id);
                    self.notify(&format!("Quest Completed: {}", name));
                    self.emit(GameEvent::QuestCompleted { quest_id });
                    for reward in rewards {
                        self.grant_reward(player, reward);
                    }
                }
            }
        }
    }

    fn quest_name(&self, quest_id: &str) -> String {
        self.catalog
            .quest(quest_id)
            .map(|q| q.name.clone())
            .unwrap_or_else(|| quest_id.to_string())
    }

    fn grant_reward(&mut self, player: EntityId, reward: QuestReward) {
        match reward {
            QuestReward::Experience { amount } => self.grant_experience(player, amount),
            QuestReward::Gold { amount } => {
                if let Some(hero) = self.actors.get_mut(&player).and_then(|a| a.hero_mut()) {
                    hero.gold += u64::from(amount);
                }
            }
            QuestReward::Item { item_id, quantity } => match self.catalog.item(&item_id) {
                Some(item) => {
                    if let Err(err) = self.give_item(player, &item, quantity) {
                        warn!("Reward {} not fully delivered: {}", item_id, err);
                    }
                }
                None => warn!("Unknown reward item {}", item_id),
            },
            QuestReward::Ability { ability_id } => {
                let Some(ability) = self.catalog.ability(&ability_id) else {
                    warn!("Unknown reward ability {}", ability_id);
                    return;
                };
                if let Some(hero) = self.actors.get_mut(&player).and_then(|a| a.hero_mut()) {
                    match hero.abilities.learn(ability) {
                        Some(slot) => info!("Learned {} in slot {}", ability_id, slot),
                        None => debug!("{} not learned: already known or bar full", ability_id),
                    }
                }
            }
            QuestReward::Access { key } => {
                if let Some(hero) = self.actors.get_mut(&player).and_then(|a| a.hero_mut()) {
                    info!("Unlocked {}", key);
                    hero.unlocked.insert(key);
                }
            }
        }
    }

    /// Snapshot of the player for the persistence collaborator
    pub fn to_record(&self) -> Option<PlayerRecord> {
        let actor = self.player()?;
        let hero = actor.hero()?;
        Some(PlayerRecord {
            version: RECORD_VERSION,
            id: actor.id,
            name: actor.name.clone(),
            level: actor.progression.level,
            experience: actor.progression.experience,
            total_experience: actor.progression.total_experience,
            attributes: actor.natural_attributes(),
            attribute_points: actor.progression.attribute_points,
            current_health: actor.stats.current_health(),
            max_health: actor.stats.max_health(),
            current_mana: actor.stats.current_mana(),
            max_mana: actor.stats.max_mana(),
            buffs: actor.stats.buffs().iter().cloned().collect(),
            equipment: hero.equipment.item_ids(),
            inventory: hero.inventory.to_records(),
            abilities: hero.abilities.ids(),
            gold: hero.gold,
            play_time_seconds: self.play_time,
            enemies_killed: hero.counters.enemies_killed,
            items_collected: hero.counters.items_collected,
            quests_completed: hero.counters.quests_completed,
            completed_quests: self.quests.completed_ids().map(str::to_string).collect(),
            unlocked: hero.unlocked.clone(),
            last_played: None,
        })
    }

    /// Rebuild the player from a saved record, replacing any existing one.
    /// Content ids that no longer exist are skipped with a warning.
    pub fn load_player(&mut self, record: &PlayerRecord, position: Vec3) -> Result<EntityId, PersistenceError> {
        record.validate()?;
        self.remove_player();

        let mut stats = self.player_stats(self.config.player_profile.clone(), record.attributes);
        let mut hero = Hero::new(self.config.inventory_size, position);

        for (slot, item_id) in &record.equipment {
            match self.catalog.item(item_id) {
                Some(item) => {
                    if let Err(err) = hero.equipment.equip_in(*slot, item, &mut stats) {
                        warn!("Saved equipment {} rejected: {}", item_id, err);
                    }
                }
                None => warn!("Saved equipment {} no longer exists", item_id),
            }
        }
        for missing in hero.inventory.load_records(&record.inventory, |id| self.catalog.item(id)) {
            warn!("Saved item {} no longer exists", missing);
        }
        for (index, ability_id) in record.abilities.iter().enumerate() {
            if let Some(ability) = ability_id.as_deref().and_then(|id| self.catalog.ability(id)) {
                hero.abilities.set(index, ability);
            }
        }
        for buff in record.buffs.iter().filter(|b| !b.is_expired()) {
            stats.apply_buff(buff.clone());
        }
        hero.gold = record.gold;
        hero.unlocked = record.unlocked.clone();
        hero.counters = Counters {
            enemies_killed: record.enemies_killed,
            items_collected: record.items_collected,
            quests_completed: record.quests_completed,
        };

        if stats.max_health() != record.max_health || stats.max_mana() != record.max_mana {
            warn!(
                "Saved maximums {}/{} differ from derived {}/{}; current values are clamped",
                record.max_health,
                record.max_mana,
                stats.max_health(),
                stats.max_mana()
            );
        }
        stats.restore_resources(record.current_health, record.current_mana);
        if !stats.is_alive() {
            hero.respawn_in = Some(self.config.respawn_delay);
        } else {
            self.env.place(record.id, Faction::Player, position);
        }

        self.quests = QuestLog::new();
        self.quests.restore_completed(record.completed_quests.iter().cloned());
        self.play_time = record.play_time_seconds;

        self.actors.insert(
            record.id,
            Actor {
                id: record.id,
                name: record.name.clone(),
                stats,
                progression: Progression {
                    level: record.level,
                    experience: record.experience,
                    total_experience: record.total_experience,
                    attribute_points: record.attribute_points,
                },
                cooldowns: CooldownRegistry::new(),
                role: Role::Player(Box::new(hero)),
            },
        );
        self.player = Some(record.id);
        info!("Loaded {} (level {})", record.name, record.level);
        Ok(record.id)
    }
}

#[cfg(test)]
mod tests;
