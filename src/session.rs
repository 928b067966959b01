//! Headless play session
//!
//! Spawns the player and waves of enemies around it, then plays a simple
//! script each step: drink a potion when low, cast whatever is ready, swing
//! when in reach, otherwise walk to the nearest enemy.

use std::f32::consts::TAU;
use std::sync::Arc;

use anyhow::{Context, Result};
use ashen_core::{EntityId, GameTime, Vec3};
use ashen_game::combat::{EffectKind, MAX_ABILITY_SLOTS};
use ashen_game::world::BASIC_ATTACK_ID;
use ashen_game::{
    AbilityKind, Attribute, ContentCatalog, EntityFilter, Movement, OpenField, Perception, PlayerStore, World,
};
use tracing::{debug, info, warn};

use crate::save::{format_play_time, SaveSlots};
use crate::settings::{GameSettings, SaveSettings};

/// Enemies spawn on a ring this far from the origin
const ARENA_RADIUS: f32 = 12.0;
/// Health fraction below which the script drinks a potion
const LOW_HEALTH: f32 = 0.35;
/// Health fraction below which healing abilities are worth casting
const HEAL_THRESHOLD: f32 = 0.7;
/// Every n-th wave brings a boss
const BOSS_WAVE: usize = 5;
const MAIN_SLOT: &str = "main";

pub struct Session {
    world: World<OpenField>,
    clock: GameTime,
    slots: SaveSlots,
    save_settings: SaveSettings,
    player: EntityId,
    since_autosave: f32,
    wave: usize,
}

impl Session {
    /// Restore the player from the main slot, or create a new one
    pub fn new(settings: &GameSettings, catalog: Arc<ContentCatalog>, slots: SaveSlots, name: &str) -> Result<Self> {
        let time_config = settings.time_config();
        time_config.validate().context("Invalid simulation settings")?;

        let mut world = World::new(OpenField::new(), catalog, settings.world_config());
        let player = match slots.store(MAIN_SLOT).load_or_none() {
            Some(record) => world
                .load_player(&record, Vec3::ZERO)
                .context("Failed to restore player")?,
            None => world.spawn_player(name, Vec3::ZERO),
        };

        Ok(Self {
            world,
            clock: GameTime::new(time_config),
            slots,
            save_settings: settings.save.clone(),
            player,
            since_autosave: 0.0,
            wave: 0,
        })
    }

    pub fn world(&self) -> &World<OpenField> {
        &self.world
    }

    /// Feed one host frame
    pub fn update(&mut self, delta: f32) -> Result<()> {
        self.clock.update(delta);
        let step = self.clock.step();

        for _ in 0..self.clock.fixed_steps() {
            self.spawn_wave_if_clear();
            self.drive_player();
            self.world.env_mut().advance(step);
            self.world.tick(step);
            self.since_autosave += step;
        }
        self.autosave_if_due()
    }

    fn spawn_wave_if_clear(&mut self) {
        if self.world.enemy_count() > 0 {
            return;
        }
        self.wave += 1;

        let catalog = Arc::clone(self.world.catalog());
        let (bosses, regulars): (Vec<&str>, Vec<&str>) = catalog
            .enemy_ids()
            .into_iter()
            .partition(|id| catalog.enemy(id).is_some_and(|e| e.is_boss));
        if regulars.is_empty() && bosses.is_empty() {
            return;
        }

        let mut roster: Vec<&str> = Vec::new();
        if !regulars.is_empty() {
            let count = (2 + self.wave / 2).min(6);
            roster.extend((0..count).map(|i| regulars[(self.wave + i) % regulars.len()]));
        }
        if self.wave % BOSS_WAVE == 0 || regulars.is_empty() {
            roster.extend(bosses.first());
        }

        info!("Wave {}: {} enemies", self.wave, roster.len());
        for (i, id) in roster.iter().enumerate() {
            let angle = TAU * i as f32 / roster.len() as f32;
            let position = Vec3::new(angle.cos() * ARENA_RADIUS, 0.0, angle.sin() * ARENA_RADIUS);
            if let Err(e) = self.world.spawn_enemy(id, position) {
                warn!("Could not spawn {}: {}", id, e);
            }
        }
    }

    fn drive_player(&mut self) {
        let Some(position) = self.world.env().position_of(self.player) else {
            return;
        };
        self.spend_points();
        self.equip_free_slots();

        if let Some(slot) = self.potion_slot() {
            if let Err(e) = self.world.use_inventory_slot(self.player, slot) {
                debug!("Potion refused: {}", e);
            }
            return;
        }

        let Some((enemy, enemy_position)) = self.nearest_enemy(position) else {
            self.world.env_mut().stop(self.player);
            return;
        };
        let distance = position.distance(enemy_position);

        if let Some(slot) = self.ready_ability(distance) {
            if let Err(e) = self.world.use_ability(self.player, slot) {
                debug!("Ability refused: {}", e);
            }
            return;
        }

        if distance > self.world.config().basic_attack_range {
            self.world.env_mut().move_to(self.player, enemy_position);
            return;
        }
        self.world.env_mut().stop(self.player);
        let swing_ready = self
            .world
            .cooldowns(self.player)
            .is_some_and(|c| !c.is_on_cooldown(BASIC_ATTACK_ID));
        if swing_ready {
            if let Err(e) = self.world.attack_target(self.player, enemy) {
                debug!("Attack refused: {}", e);
            }
        }
    }

    fn nearest_enemy(&self, position: Vec3) -> Option<(EntityId, Vec3)> {
        self.world
            .env()
            .find_entities_within_radius(position, ARENA_RADIUS * 3.0, EntityFilter::Enemies)
            .into_iter()
            .find(|found| self.world.actor(found.id).is_some_and(|a| a.is_alive()))
            .map(|found| (found.id, found.position))
    }

    fn potion_slot(&self) -> Option<usize> {
        let player = self.world.player()?;
        if player.stats.health_fraction() >= LOW_HEALTH {
            return None;
        }
        player.hero()?.inventory.slots().iter().position(|slot| {
            slot.item().is_some_and(|item| {
                item.consumable_effects
                    .iter()
                    .any(|effect| matches!(effect.kind, EffectKind::RestoreHealth { .. }))
            })
        })
    }

    fn ready_ability(&self, distance: f32) -> Option<usize> {
        let player = self.world.player()?;
        let hero = player.hero()?;
        let cooldowns = self.world.cooldowns(self.player)?;

        (0..MAX_ABILITY_SLOTS).find(|&slot| {
            let Some(ability) = hero.abilities.get(slot) else {
                return false;
            };
            if cooldowns.is_on_cooldown(&ability.id) || player.stats.current_mana() < ability.mana_cost {
                return false;
            }
            match ability.kind {
                AbilityKind::Damage | AbilityKind::Debuff => distance <= ability.range,
                AbilityKind::Heal => player.stats.health_fraction() < HEAL_THRESHOLD,
                AbilityKind::Buff => distance <= ability.range && !player.stats.has_buff(&ability.id),
            }
        })
    }

    /// Alternate unspent points between vitality and strength
    fn spend_points(&mut self) {
        let Some(points) = self.world.player().map(|p| p.progression.attribute_points) else {
            return;
        };
        for i in 0..points {
            let attribute = if i % 2 == 0 { Attribute::Vitality } else { Attribute::Strength };
            if self.world.spend_attribute_point(self.player, attribute).is_err() {
                break;
            }
        }
    }

    /// Wear anything in the bag whose slot is still empty
    fn equip_free_slots(&mut self) {
        let Some(hero) = self.world.player().and_then(|p| p.hero()) else {
            return;
        };
        let level = self.world.player().map_or(1, |p| p.level());
        let candidates: Vec<String> = hero
            .inventory
            .slots()
            .iter()
            .filter_map(|slot| slot.item())
            .filter(|item| item.item_type.is_equipment() && item.min_level <= level)
            .filter(|item| {
                item.equipment_slot
                    .is_some_and(|slot| hero.equipment.get(slot).is_none())
            })
            .map(|item| item.id.clone())
            .collect();

        for item_id in candidates {
            if let Err(e) = self.world.equip_item(self.player, &item_id) {
                debug!("Could not equip {}: {}", item_id, e);
            }
        }
    }

    fn autosave_if_due(&mut self) -> Result<()> {
        if !self.save_settings.auto_save || self.since_autosave < self.save_settings.auto_save_interval as f32 {
            return Ok(());
        }
        self.since_autosave = 0.0;
        if let Some(record) = self.world.to_record() {
            self.slots.autosave(&record, self.save_settings.keep_auto_saves)?;
        }
        Ok(())
    }

    /// One-line summary of the player's progress
    pub fn summary(&self) -> String {
        let Some((player, hero)) = self.world.player().and_then(|p| p.hero().map(|h| (p, h))) else {
            return "No player".to_string();
        };
        format!(
            "{} - level {} ({} xp), {} kills, {} gold, {} quests, played {}",
            player.name,
            player.level(),
            player.progression.total_experience,
            hero.counters.enemies_killed,
            hero.gold,
            hero.counters.quests_completed,
            format_play_time(self.world.play_time()),
        )
    }

    /// Persist the player to the main slot
    pub fn shutdown(&mut self) -> Result<()> {
        let Some(record) = self.world.to_record() else {
            warn!("No player to save");
            return Ok(());
        };
        self.slots
            .store(MAIN_SLOT)
            .save(&record)
            .context("Failed to save player")?;
        info!("{}", self.summary());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONTENT: &str = include_str!("../data/content.json");

    fn session(slots: &SaveSlots) -> Session {
        let catalog = Arc::new(ContentCatalog::from_json(CONTENT).unwrap());
        let mut settings = GameSettings::default();
        settings.simulation.seed = 11;
        settings.save.auto_save_interval = 20;
        Session::new(&settings, catalog, slots.clone(), "Ash").unwrap()
    }

    fn kills(session: &Session) -> u32 {
        session.world().player().and_then(|p| p.hero()).unwrap().counters.enemies_killed
    }

    #[test]
    fn test_bundled_content_loads() {
        let catalog = ContentCatalog::from_json(CONTENT).unwrap();
        assert_eq!(catalog.enemy_ids(), vec!["bandit", "chieftain", "wolf"]);
        assert!(catalog.require_item("rusty_sword").is_ok());
    }

    #[test]
    fn test_session_plays_and_resumes() {
        let temp_dir = TempDir::new().unwrap();
        let slots = SaveSlots::open(temp_dir.path()).unwrap();

        let mut first = session(&slots);
        let player = first.player;
        for _ in 0..1800 {
            first.update(1.0 / 30.0).unwrap();
        }
        assert!((first.world().play_time() - 60.0).abs() < 0.5);
        assert!(first.wave >= 1);
        assert!(kills(&first) > 0);
        assert!(slots.latest_autosave().unwrap().is_some());
        first.shutdown().unwrap();

        let second = session(&slots);
        assert_eq!(second.player, player);
        assert_eq!(kills(&second), kills(&first));
    }
}
