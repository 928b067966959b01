use ashen_core::EntityId;
use tracing::info;

use super::World;
use crate::actor::{Actor, Role};
use crate::combat::cooldown::{CooldownEvent, CooldownScope};
use crate::environment::{Environment, Faction};
use crate::events::GameEvent;

impl<E: Environment> World<E> {
    /// Advance the simulation by `dt` seconds.
    ///
    /// Order: stats and buffs, cooldowns, player respawn, enemy brains,
    /// corpse removal. Non-positive steps are ignored.
    pub fn tick(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.play_time += f64::from(dt);

        self.tick_stats(dt);
        self.tick_cooldowns(dt);
        self.tick_respawn(dt);
        self.tick_enemies(dt);
        self.tick_despawn(dt);
    }

    fn actor_ids(&self) -> Vec<EntityId> {
        self.actors.keys().copied().collect()
    }

    fn tick_stats(&mut self, dt: f32) {
        for id in self.actor_ids() {
            let Some(actor) = self.actors.get_mut(&id) else {
                continue;
            };
            let report = actor.stats.tick(dt);
            for expired in report.expired_buffs {
                self.emit(GameEvent::BuffExpired {
                    actor: id,
                    source: expired.source,
                });
            }
        }
    }

    fn tick_cooldowns(&mut self, dt: f32) {
        match self.config.cooldown_scope {
            CooldownScope::Shared => {
                let events = self.shared_cooldowns.tick(dt);
                self.forward_cooldowns(None, events);
            }
            CooldownScope::PerActor => {
                for id in self.actor_ids() {
                    let Some(actor) = self.actors.get_mut(&id) else {
                        continue;
                    };
                    let events = actor.cooldowns.tick(dt);
                    self.forward_cooldowns(Some(id), events);
                }
            }
        }
    }

    /// Only completions go to the bus; per-tick countdowns stay internal
    fn forward_cooldowns(&mut self, owner: Option<EntityId>, events: Vec<CooldownEvent>) {
        for event in events {
            if let CooldownEvent::Finished { id } = event {
                self.emit(GameEvent::CooldownFinished { actor: owner, id });
            }
        }
    }

    fn tick_respawn(&mut self, dt: f32) {
        let Some(id) = self.player else {
            return;
        };
        let Some(Actor {
            stats,
            role: Role::Player(hero),
            ..
        }) = self.actors.get_mut(&id)
        else {
            return;
        };
        let Some(remaining) = hero.respawn_in.as_mut() else {
            return;
        };
        *remaining -= dt;
        if *remaining > 0.0 {
            return;
        }

        hero.respawn_in = None;
        stats.revive(self.config.respawn_fraction);
        let spawn = hero.spawn;
        self.env.place(id, Faction::Player, spawn);
        info!("Player respawned");
        self.emit(GameEvent::PlayerRespawned);
    }

    fn tick_enemies(&mut self, dt: f32) {
        let enemies: Vec<EntityId> = self
            .actors
            .values()
            .filter(|a| a.foe().is_some() && a.is_alive())
            .map(|a| a.id)
            .collect();

        for id in enemies {
            let Some(foe) = self.actors.get_mut(&id).and_then(|a| a.foe_mut()) else {
                continue;
            };
            let outputs = foe.brain.tick(&mut self.env, dt, &mut self.rng);
            self.handle_ai_outputs(id, outputs);
        }
    }

    fn tick_despawn(&mut self, dt: f32) {
        let mut gone = Vec::new();
        for (id, actor) in self.actors.iter_mut() {
            let Some(timer) = actor.foe_mut().and_then(|foe| foe.despawn_in.as_mut()) else {
                continue;
            };
            *timer -= dt;
            if *timer <= 0.0 {
                gone.push(*id);
            }
        }

        for id in gone {
            self.actors.remove(&id);
            self.env.remove(id);
            self.emit(GameEvent::EnemyDespawned { enemy: id });
        }
    }
}
