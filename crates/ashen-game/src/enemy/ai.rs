//! Enemy state machine
//!
//! Patrol around a spawn point, chase what it sees, attack in range, and walk
//! back when the chase is lost. Attack swings are a two-phase timer (windup,
//! recovery) that keeps running even if the state changes mid-swing.

use ashen_core::{EntityId, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::environment::{EntityFilter, Movement, Perception};

/// AI states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiState {
    Patrolling,
    Waiting,
    Chasing,
    Attacking,
    Returning,
}

impl AiState {
    /// Whether the enemy is engaged with a target
    pub fn is_engaged(self) -> bool {
        matches!(self, Self::Chasing | Self::Attacking)
    }
}

/// Tuning for one enemy's behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub detection_range: f32,
    pub attack_range: f32,
    pub patrol_radius: f32,
    /// Seconds spent idling at a patrol point
    pub wait_time: f32,
    /// Seconds before giving up a chase
    pub chase_timeout: f32,
    /// Seconds between attack starts
    pub attack_cooldown: f32,
    /// Length of the attack swing
    pub attack_animation_length: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            detection_range: 5.0,
            attack_range: 2.0,
            patrol_radius: 10.0,
            wait_time: 2.0,
            chase_timeout: 10.0,
            attack_cooldown: 2.0,
            attack_animation_length: 1.0,
        }
    }
}

/// Fraction of the swing before the hit lands
const WINDUP_FRACTION: f32 = 0.6;
/// Chase is abandoned beyond this multiple of the detection range
const LOSE_TARGET_FACTOR: f32 = 1.5;
/// Chase is abandoned beyond this multiple of the patrol radius from spawn
const LEASH_FACTOR: f32 = 2.0;
/// Attacking falls back to chasing beyond this multiple of the attack range
const ATTACK_EXIT_FACTOR: f32 = 1.2;
/// Distance from spawn at which a return trip is complete
const RETURN_THRESHOLD: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum SwingPhase {
    Ready,
    Windup { remaining: f32 },
    Recovery { remaining: f32 },
}

/// Things the brain wants the world to know about
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AiOutput {
    StateChanged { from: AiState, to: AiState },
    AlertRaised,
    AlertCleared,
    /// Swing started (animation trigger)
    AttackStarted { target: EntityId },
    /// The swing connected with a target still in range
    Strike { target: EntityId },
}

/// State machine for one enemy
#[derive(Debug, Clone)]
pub struct EnemyBrain {
    id: EntityId,
    pub config: AiConfig,
    state: AiState,
    spawn: Vec3,
    patrol_point: Vec3,
    target: Option<EntityId>,
    alert: bool,
    enabled: bool,
    facing: Vec3,
    wait_timer: f32,
    chase_timer: f32,
    cooldown_timer: f32,
    swing: SwingPhase,
}

impl EnemyBrain {
    pub fn new(id: EntityId, spawn: Vec3, config: AiConfig) -> Self {
        Self {
            id,
            config,
            state: AiState::Patrolling,
            spawn,
            patrol_point: spawn,
            target: None,
            alert: false,
            enabled: true,
            facing: Vec3::Z,
            wait_timer: 0.0,
            chase_timer: 0.0,
            cooldown_timer: 0.0,
            swing: SwingPhase::Ready,
        }
    }

    /// Pick the first patrol point and start walking
    pub fn start<E, R>(&mut self, env: &mut E, rng: &mut R)
    where
        E: Perception + Movement + ?Sized,
        R: Rng + ?Sized,
    {
        self.pick_patrol_point(env, rng);
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn state(&self) -> AiState {
        self.state
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    pub fn spawn(&self) -> Vec3 {
        self.spawn
    }

    pub fn patrol_point(&self) -> Vec3 {
        self.patrol_point
    }

    pub fn is_alert(&self) -> bool {
        self.alert
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_mid_swing(&self) -> bool {
        self.swing != SwingPhase::Ready
    }

    /// Unit direction the enemy is facing
    pub fn facing(&self) -> Vec3 {
        self.facing
    }

    /// Advance the brain by one step
    pub fn tick<E, R>(&mut self, env: &mut E, dt: f32, rng: &mut R) -> Vec<AiOutput>
    where
        E: Perception + Movement + ?Sized,
        R: Rng + ?Sized,
    {
        let mut out = Vec::new();
        if !self.enabled {
            return out;
        }
        let Some(position) = env.position_of(self.id) else {
            return out;
        };

        self.cooldown_timer = (self.cooldown_timer - dt).max(0.0);
        self.advance_swing(env, position, dt, &mut out);

        match self.state {
            AiState::Patrolling => {
                if env.has_arrived(self.id) {
                    self.change_state(AiState::Waiting, env, &mut out);
                }
            }
            AiState::Waiting => {
                self.wait_timer -= dt;
                if self.wait_timer <= 0.0 {
                    self.pick_patrol_point(env, rng);
                    self.change_state(AiState::Patrolling, env, &mut out);
                }
            }
            AiState::Chasing => self.update_chasing(env, position, dt, &mut out),
            AiState::Attacking => self.update_attacking(env, position, &mut out),
            AiState::Returning => {
                env.move_to(self.id, self.spawn);
                if env.remaining_distance(self.id) < RETURN_THRESHOLD {
                    self.chase_timer = 0.0;
                    self.pick_patrol_point(env, rng);
                    self.change_state(AiState::Patrolling, env, &mut out);
                }
            }
        }

        if !self.state.is_engaged() {
            self.look_for_targets(env, position, &mut out);
        }

        out
    }

    /// Being hit pulls a disengaged enemy into a chase against the attacker
    pub fn provoke<E>(&mut self, attacker: EntityId, env: &mut E) -> Vec<AiOutput>
    where
        E: Perception + Movement + ?Sized,
    {
        let mut out = Vec::new();
        if !self.enabled || self.state.is_engaged() {
            return out;
        }
        self.target = Some(attacker);
        self.change_state(AiState::Chasing, env, &mut out);
        out
    }

    /// Forget a target that died or left
    pub fn drop_target(&mut self, entity: EntityId) {
        if self.target == Some(entity) {
            self.target = None;
        }
    }

    /// Shut the brain down for good (death)
    pub fn disable<E>(&mut self, env: &mut E)
    where
        E: Movement + ?Sized,
    {
        self.enabled = false;
        self.alert = false;
        self.swing = SwingPhase::Ready;
        env.stop(self.id);
    }

    fn update_chasing<E>(&mut self, env: &mut E, position: Vec3, dt: f32, out: &mut Vec<AiOutput>)
    where
        E: Perception + Movement + ?Sized,
    {
        let Some(target_position) = self.target.and_then(|t| env.position_of(t)) else {
            self.change_state(AiState::Returning, env, out);
            return;
        };

        if position.distance(self.spawn) > self.config.patrol_radius * LEASH_FACTOR {
            self.change_state(AiState::Returning, env, out);
            return;
        }

        self.chase_timer += dt;
        if self.chase_timer > self.config.chase_timeout {
            self.change_state(AiState::Returning, env, out);
            return;
        }

        let distance = position.distance(target_position);
        if distance <= self.config.attack_range {
            self.change_state(AiState::Attacking, env, out);
        } else if distance > self.config.detection_range * LOSE_TARGET_FACTOR {
            self.change_state(AiState::Returning, env, out);
        } else {
            env.move_to(self.id, target_position);
        }
    }

    fn update_attacking<E>(&mut self, env: &mut E, position: Vec3, out: &mut Vec<AiOutput>)
    where
        E: Perception + Movement + ?Sized,
    {
        let Some(target) = self.target else {
            self.change_state(AiState::Returning, env, out);
            return;
        };
        let Some(target_position) = env.position_of(target) else {
            self.change_state(AiState::Returning, env, out);
            return;
        };

        if position.distance(target_position) > self.config.attack_range * ATTACK_EXIT_FACTOR {
            self.change_state(AiState::Chasing, env, out);
            return;
        }

        let direction = (target_position - position).normalize_or_zero();
        if direction != Vec3::ZERO {
            self.facing = direction;
        }

        if self.cooldown_timer <= 0.0 && self.swing == SwingPhase::Ready {
            self.cooldown_timer = self.config.attack_cooldown;
            self.swing = SwingPhase::Windup {
                remaining: self.config.attack_animation_length * WINDUP_FRACTION,
            };
            out.push(AiOutput::AttackStarted { target });
        }
    }

    fn advance_swing<E>(&mut self, env: &E, position: Vec3, dt: f32, out: &mut Vec<AiOutput>)
    where
        E: Perception + ?Sized,
    {
        let mut budget = dt;
        loop {
            match self.swing {
                SwingPhase::Ready => return,
                SwingPhase::Windup { remaining } => {
                    if remaining > budget {
                        self.swing = SwingPhase::Windup { remaining: remaining - budget };
                        return;
                    }
                    budget -= remaining;
                    self.land_hit(env, position, out);
                    self.swing = SwingPhase::Recovery {
                        remaining: self.config.attack_animation_length * (1.0 - WINDUP_FRACTION),
                    };
                }
                SwingPhase::Recovery { remaining } => {
                    if remaining > budget {
                        self.swing = SwingPhase::Recovery { remaining: remaining - budget };
                    } else {
                        self.swing = SwingPhase::Ready;
                    }
                    return;
                }
            }
        }
    }

    fn land_hit<E>(&self, env: &E, position: Vec3, out: &mut Vec<AiOutput>)
    where
        E: Perception + ?Sized,
    {
        let Some(target) = self.target else {
            return;
        };
        match env.position_of(target) {
            Some(target_position) if position.distance(target_position) <= self.config.attack_range => {
                out.push(AiOutput::Strike { target });
            }
            Some(_) => debug!("Enemy {} swung at {} out of range", self.id, target),
            None => debug!("Enemy {} lost target {} mid-swing", self.id, target),
        }
    }

    fn look_for_targets<E>(&mut self, env: &mut E, position: Vec3, out: &mut Vec<AiOutput>)
    where
        E: Perception + Movement + ?Sized,
    {
        let spotted = env
            .find_entities_within_radius(position, self.config.detection_range, EntityFilter::Players)
            .into_iter()
            .find(|candidate| env.has_line_of_sight(position, candidate.position));

        if let Some(candidate) = spotted {
            self.target = Some(candidate.id);
            self.change_state(AiState::Chasing, env, out);
        }
    }

    fn pick_patrol_point<E, R>(&mut self, env: &mut E, rng: &mut R)
    where
        E: Perception + Movement + ?Sized,
        R: Rng + ?Sized,
    {
        let offset = random_in_unit_disc(rng) * self.config.patrol_radius;
        let candidate = Vec3::new(self.spawn.x + offset.x, self.spawn.y, self.spawn.z + offset.z);

        if let Some(point) = env.sample_position(candidate, self.config.patrol_radius) {
            self.patrol_point = point;
            env.move_to(self.id, point);
        }
    }

    fn change_state<E>(&mut self, next: AiState, env: &mut E, out: &mut Vec<AiOutput>)
    where
        E: Movement + ?Sized,
    {
        if self.state == next {
            return;
        }

        if self.state == AiState::Chasing && self.alert {
            self.alert = false;
            out.push(AiOutput::AlertCleared);
        }

        let from = self.state;
        self.state = next;
        debug!("Enemy {} {:?} -> {:?}", self.id, from, next);
        out.push(AiOutput::StateChanged { from, to: next });

        match next {
            AiState::Waiting => {
                self.wait_timer = self.config.wait_time;
                env.stop(self.id);
            }
            AiState::Attacking => env.stop(self.id),
            AiState::Chasing => {
                self.chase_timer = 0.0;
                self.alert = true;
                out.push(AiOutput::AlertRaised);
            }
            AiState::Returning => {
                self.alert = false;
                env.move_to(self.id, self.spawn);
            }
            AiState::Patrolling => {}
        }
    }
}

/// Uniform point in the unit disc on the XZ plane
fn random_in_unit_disc<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let x = rng.gen_range(-1.0..=1.0_f32);
        let z = rng.gen_range(-1.0..=1.0_f32);
        if x * x + z * z <= 1.0 {
            return Vec3::new(x, 0.0, z);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{Environment, Faction, OpenField, SightBlocker};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Scene {
        field: OpenField,
        brain: EnemyBrain,
        hero: EntityId,
        rng: StdRng,
    }

    fn scene() -> Scene {
        let mut field = OpenField::new();
        let enemy = EntityId::from_u128(1);
        let hero = EntityId::from_u128(2);
        field.place(enemy, Faction::Enemy, Vec3::ZERO);
        field.place(hero, Faction::Player, Vec3::new(50.0, 0.0, 0.0));

        let mut rng = StdRng::seed_from_u64(7);
        let mut brain = EnemyBrain::new(enemy, Vec3::ZERO, AiConfig::default());
        brain.start(&mut field, &mut rng);
        Scene { field, brain, hero, rng }
    }

    fn states(out: &[AiOutput]) -> Vec<AiState> {
        out.iter()
            .filter_map(|o| match o {
                AiOutput::StateChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_initial_patrol_point_within_radius() {
        let s = scene();
        assert_eq!(s.brain.state(), AiState::Patrolling);
        assert!(s.brain.patrol_point().distance(Vec3::ZERO) <= 10.0 + 1e-4);
        assert_eq!(s.field.destination(s.brain.id()), Some(s.brain.patrol_point()));
    }

    #[test]
    fn test_detect_then_lose_target() {
        let mut s = scene();
        s.field.stop(s.brain.id());
        s.field.set_position(s.hero, Vec3::new(4.0, 0.0, 0.0));

        let out = s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        assert_eq!(s.brain.state(), AiState::Chasing);
        assert!(out.contains(&AiOutput::AlertRaised));
        assert_eq!(s.brain.target(), Some(s.hero));

        s.field.set_position(s.hero, Vec3::new(8.0, 0.0, 0.0));
        let out = s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        assert_eq!(s.brain.state(), AiState::Returning);
        assert!(out.contains(&AiOutput::AlertCleared));
        assert!(!s.brain.is_alert());
        assert_eq!(s.field.destination(s.brain.id()), Some(Vec3::ZERO));
    }

    #[test]
    fn test_detect_while_walking_patrol() {
        let mut s = scene();
        let id = s.brain.id();
        s.field.move_to(id, Vec3::new(0.0, 0.0, -6.0));
        s.field.advance(0.5);
        assert_eq!(s.brain.state(), AiState::Patrolling);
        assert!(!s.field.has_arrived(id));

        s.field.set_position(s.hero, Vec3::new(3.0, 0.0, 0.0));
        let out = s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        assert_eq!(states(&out), vec![AiState::Chasing]);
        assert_eq!(s.brain.target(), Some(s.hero));

        s.field.set_position(s.hero, Vec3::new(10.0, 0.0, 0.0));
        let out = s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        assert_eq!(states(&out), vec![AiState::Returning]);
    }

    #[test]
    fn test_no_detection_without_line_of_sight() {
        let mut s = scene();
        s.field.add_blocker(SightBlocker {
            center: Vec3::new(2.0, 0.0, 0.0),
            radius: 0.5,
        });
        s.field.set_position(s.hero, Vec3::new(4.0, 0.0, 0.0));
        s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        assert_ne!(s.brain.state(), AiState::Chasing);
    }

    #[test]
    fn test_patrol_wait_patrol() {
        let mut s = scene();
        s.field.stop(s.brain.id());

        let out = s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        assert_eq!(states(&out), vec![AiState::Waiting]);

        s.brain.tick(&mut s.field, 1.0, &mut s.rng);
        assert_eq!(s.brain.state(), AiState::Waiting);
        let out = s.brain.tick(&mut s.field, 1.0, &mut s.rng);
        assert_eq!(states(&out), vec![AiState::Patrolling]);
        assert!(s.field.destination(s.brain.id()).is_some());
    }

    #[test]
    fn test_attack_sequence_strikes_once() {
        let mut s = scene();
        s.field.set_position(s.hero, Vec3::new(1.5, 0.0, 0.0));

        // Detect, then close enough to attack
        s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        let out = s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        assert_eq!(s.brain.state(), AiState::Attacking);
        assert!(out.is_empty() || states(&out) == vec![AiState::Attacking]);

        let out = s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        assert!(out.contains(&AiOutput::AttackStarted { target: s.hero }));
        assert!(s.brain.is_mid_swing());

        // Cooldown is 2s, so no second swing starts within 1.5s
        let mut strikes = 0;
        for _ in 0..15 {
            let out = s.brain.tick(&mut s.field, 0.1, &mut s.rng);
            strikes += out.iter().filter(|o| matches!(o, AiOutput::Strike { .. })).count();
        }
        assert_eq!(strikes, 1);
        assert!(!s.brain.is_mid_swing());
        assert!((s.brain.facing() - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_swing_misses_when_target_steps_away() {
        let mut s = scene();
        s.field.set_position(s.hero, Vec3::new(1.5, 0.0, 0.0));
        s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        assert!(s.brain.is_mid_swing());

        // Out of attack range but the swing keeps going
        s.field.set_position(s.hero, Vec3::new(3.0, 0.0, 0.0));
        let mut strikes = 0;
        for _ in 0..10 {
            let out = s.brain.tick(&mut s.field, 0.1, &mut s.rng);
            strikes += out.iter().filter(|o| matches!(o, AiOutput::Strike { .. })).count();
        }
        assert_eq!(strikes, 0);
    }

    #[test]
    fn test_chase_timeout_returns() {
        let mut s = scene();
        s.brain.config.chase_timeout = 1.0;
        s.field.set_position(s.hero, Vec3::new(4.0, 0.0, 0.0));
        s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        assert_eq!(s.brain.state(), AiState::Chasing);

        // Outside detection but inside the lose-target range, so only the timer matters
        s.field.set_position(s.hero, Vec3::new(6.0, 0.0, 0.0));
        for _ in 0..9 {
            s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        }
        assert_eq!(s.brain.state(), AiState::Chasing);
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.extend(states(&s.brain.tick(&mut s.field, 0.1, &mut s.rng)));
        }
        assert_eq!(seen.first(), Some(&AiState::Returning));
    }

    #[test]
    fn test_provoke_and_return_home() {
        let mut s = scene();
        s.field.stop(s.brain.id());
        let out = s.brain.provoke(s.hero, &mut s.field);
        assert_eq!(states(&out), vec![AiState::Chasing]);

        // Hero is 50 units away, so the chase is dropped at once
        s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        assert_eq!(s.brain.state(), AiState::Returning);

        // Already at spawn: return completes on the next tick
        let out = s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        assert_eq!(states(&out), vec![AiState::Patrolling]);
    }

    #[test]
    fn test_provoke_ignored_when_engaged() {
        let mut s = scene();
        s.field.set_position(s.hero, Vec3::new(4.0, 0.0, 0.0));
        s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        let other = EntityId::from_u128(99);
        assert!(s.brain.provoke(other, &mut s.field).is_empty());
        assert_eq!(s.brain.target(), Some(s.hero));
    }

    #[test]
    fn test_lost_target_returns() {
        let mut s = scene();
        s.field.set_position(s.hero, Vec3::new(4.0, 0.0, 0.0));
        s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        s.field.remove(s.hero);
        s.brain.tick(&mut s.field, 0.1, &mut s.rng);
        assert_eq!(s.brain.state(), AiState::Returning);
    }

    #[test]
    fn test_disabled_brain_does_nothing() {
        let mut s = scene();
        s.brain.disable(&mut s.field);
        s.field.set_position(s.hero, Vec3::new(1.0, 0.0, 0.0));
        assert!(s.brain.tick(&mut s.field, 0.1, &mut s.rng).is_empty());
        assert!(s.field.destination(s.brain.id()).is_none());
    }
}
