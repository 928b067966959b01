use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::actor::Attribute;
use crate::combat::buff::BuffEntry;
use crate::combat::consumable::EffectOutcome;
use crate::combat::equipment::EquipmentSlot;
use crate::enemy::AiState;
use crate::environment::{OpenField, Perception};

const CONTENT: &str = r#"{
    "items": [
        { "id": "potion", "name": "Potion", "item_type": "Consumable",
          "stackable": true, "max_stack_size": 10,
          "consumable_effects": [{ "type": "restore_health", "amount": 50 }] },
        { "id": "sword", "name": "Sword", "item_type": "Weapon",
          "stat_modifiers": [{ "stat": "Strength", "value": 3 }] },
        { "id": "axe", "name": "Axe", "item_type": "Weapon",
          "stat_modifiers": [{ "stat": "Strength", "value": 5 }] },
        { "id": "dagger", "name": "Dagger", "item_type": "Weapon",
          "stackable": true, "max_stack_size": 5,
          "stat_modifiers": [{ "stat": "Strength", "value": 1 }] },
        { "id": "tail", "name": "Rat Tail", "item_type": "Material",
          "stackable": true, "max_stack_size": 20 }
    ],
    "abilities": [
        { "id": "fireball", "name": "Fireball", "kind": "Damage",
          "mana_cost": 10, "cooldown": 5.0, "power": 500, "range": 5.0 },
        { "id": "nova", "name": "Nova", "kind": "Damage", "mana_cost": 500 }
    ],
    "loot_tables": [{ "id": "rat", "entries": [{ "item_id": "tail", "weight": 1.0 }] }],
    "quests": [{ "id": "rats", "name": "Rat Problem",
                 "objectives": [{ "id": "kill", "kind": "Kill", "target_id": "rat", "target_progress": 1 }],
                 "rewards": [{ "type": "gold", "amount": 10 }, { "type": "experience", "amount": 50 },
                             { "type": "access", "key": "sewers" }] }],
    "enemies": [
        { "id": "rat", "name": "Rat", "enemy_type": "rat", "loot_table": "rat",
          "loot": { "drop_chance": 1.0, "min_items": 1, "max_items": 1 } },
        { "id": "brute", "name": "Brute", "enemy_type": "brute", "level": 20 }
    ],
    "starter": { "items": [{ "item_id": "potion", "quantity": 3 }],
                 "abilities": ["fireball", "nova"], "quests": ["rats"] }
}"#;

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<String>>>);

impl Notifier for Recorder {
    fn notify(&mut self, message: &str) {
        self.0.borrow_mut().push(message.to_string());
    }

    fn damage_shown(&mut self, _position: Vec3, _amount: i32, _is_critical: bool) {}
}

struct Harness {
    world: World<OpenField>,
    player: EntityId,
    notes: Recorder,
    events: Rc<RefCell<Vec<GameEvent>>>,
}

fn catalog() -> Arc<ContentCatalog> {
    Arc::new(ContentCatalog::from_json(CONTENT).unwrap())
}

fn quiet_config() -> WorldConfig {
    WorldConfig {
        seed: 7,
        player_profile: StatProfile::static_player(),
        ..WorldConfig::default()
    }
}

fn harness_with(config: WorldConfig) -> Harness {
    let mut world = World::new(OpenField::new(), catalog(), config);
    let notes = Recorder::default();
    world.set_notifier(Box::new(notes.clone()));
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    world.events_mut().subscribe(move |e| sink.borrow_mut().push(e.clone()));
    let player = world.spawn_player("Ash", Vec3::ZERO);
    Harness {
        world,
        player,
        notes,
        events,
    }
}

fn harness() -> Harness {
    harness_with(quiet_config())
}

fn hero(h: &Harness) -> &Hero {
    h.world.player().and_then(Actor::hero).unwrap()
}

fn count(h: &Harness, pred: impl Fn(&GameEvent) -> bool) -> usize {
    h.events.borrow().iter().filter(|e| pred(e)).count()
}

#[test]
fn test_spawn_applies_starter_kit() {
    let h = harness();
    let hero = hero(&h);
    assert_eq!(hero.inventory.item_count("potion"), 3);
    assert_eq!(hero.abilities.ids()[0].as_deref(), Some("fireball"));
    assert!(h.world.quests().is_active("rats"));
    assert_eq!(h.world.player().unwrap().stats.max_health(), 200);
    assert!(h.world.env().position_of(h.player).is_some());
}

#[test]
fn test_same_seed_same_ids() {
    let a = harness();
    let b = harness();
    assert_eq!(a.player, b.player);
}

#[test]
fn test_unknown_enemy_template() {
    let mut h = harness();
    let err = h.world.spawn_enemy("dragon", Vec3::ZERO).unwrap_err();
    assert_eq!(err, GameError::UnknownContent("dragon".into()));
}

#[test]
fn test_kill_grants_experience_loot_and_quest() {
    let mut h = harness();
    let rat = h.world.spawn_enemy("rat", Vec3::new(1.0, 0.0, 0.0)).unwrap();

    let hits = h.world.use_ability(h.player, 0).unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].killed);
    assert_eq!(h.world.enemy_count(), 0);

    let player = h.world.player().unwrap();
    // 25 for the rat, 50 from the quest
    assert_eq!(player.progression.total_experience, 75);
    let hero = hero(&h);
    assert_eq!(hero.gold, 10);
    assert_eq!(hero.inventory.item_count("tail"), 1);
    assert_eq!(hero.counters.enemies_killed, 1);
    assert_eq!(hero.counters.quests_completed, 1);
    assert_eq!(hero.counters.items_collected, 4);
    assert!(h.world.quests().is_completed("rats"));
    assert_eq!(count(&h, |e| matches!(e, GameEvent::EnemyDied { .. })), 1);
    assert!(h.notes.0.borrow().iter().any(|n| n == "Quest Completed: Rat Problem"));

    // The corpse lingers for the despawn delay
    h.world.tick(1.0);
    assert!(h.world.actor(rat).is_some());
    h.world.tick(1.0);
    assert!(h.world.actor(rat).is_none());
    assert!(h.world.env().position_of(rat).is_none());
    assert_eq!(count(&h, |e| matches!(e, GameEvent::EnemyDespawned { .. })), 1);
}

#[test]
fn test_quest_reward_granted_once() {
    let mut h = harness();
    h.world.spawn_enemy("rat", Vec3::new(1.0, 0.0, 0.0)).unwrap();
    h.world.use_ability(h.player, 0).unwrap();
    h.world.tick(5.0);

    h.world.spawn_enemy("rat", Vec3::new(1.0, 0.0, 0.0)).unwrap();
    let hits = h.world.use_ability(h.player, 0).unwrap();
    assert!(hits[0].killed);

    assert_eq!(hero(&h).gold, 10);
    assert_eq!(hero(&h).counters.enemies_killed, 2);
    assert_eq!(count(&h, |e| matches!(e, GameEvent::QuestCompleted { .. })), 1);
}

#[test]
fn test_ability_rejections_change_nothing() {
    let mut h = harness();

    let err = h.world.use_ability(h.player, 1).unwrap_err();
    assert_eq!(
        err,
        GameError::InsufficientResource {
            needed: 500,
            available: 100
        }
    );
    assert_eq!(h.notes.0.borrow().last().map(String::as_str), Some("Not enough mana!"));
    assert_eq!(h.world.player().unwrap().stats.current_mana(), 100);
    assert!(!h.world.cooldowns(h.player).unwrap().is_on_cooldown("nova"));

    assert_eq!(h.world.use_ability(h.player, 3), Err(GameError::InvalidSlot(3)));
    assert_eq!(h.world.use_ability(h.player, 9), Err(GameError::InvalidSlot(9)));

    assert!(h.world.use_ability(h.player, 0).unwrap().is_empty());
    assert_eq!(h.world.player().unwrap().stats.current_mana(), 90);
    assert!(matches!(
        h.world.use_ability(h.player, 0),
        Err(GameError::OnCooldown { .. })
    ));
    assert_eq!(h.world.player().unwrap().stats.current_mana(), 90);

    h.world.tick(5.0);
    assert_eq!(count(&h, |e| matches!(e, GameEvent::CooldownFinished { .. })), 1);
    assert!(h.world.use_ability(h.player, 0).is_ok());
}

#[test]
fn test_cooldown_scopes() {
    let mut per_actor = harness();
    let rat = per_actor.world.spawn_enemy("rat", Vec3::new(30.0, 0.0, 0.0)).unwrap();
    per_actor.world.use_ability(per_actor.player, 0).unwrap();
    assert!(per_actor.world.cooldowns(per_actor.player).unwrap().is_on_cooldown("fireball"));
    assert!(!per_actor.world.cooldowns(rat).unwrap().is_on_cooldown("fireball"));

    let mut shared = harness_with(WorldConfig {
        cooldown_scope: CooldownScope::Shared,
        ..quiet_config()
    });
    let rat = shared.world.spawn_enemy("rat", Vec3::new(30.0, 0.0, 0.0)).unwrap();
    shared.world.use_ability(shared.player, 0).unwrap();
    assert!(shared.world.cooldowns(rat).unwrap().is_on_cooldown("fireball"));
    assert_eq!(
        count(&shared, |e| matches!(e, GameEvent::CooldownStarted { actor: None, .. })),
        1
    );
}

#[test]
fn test_basic_attack_range_and_cooldown() {
    let mut h = harness();
    let near = h.world.spawn_enemy("rat", Vec3::new(1.0, 0.0, 0.0)).unwrap();
    let far = h.world.spawn_enemy("rat", Vec3::new(10.0, 0.0, 0.0)).unwrap();

    let hit = h.world.attack_target(h.player, near).unwrap();
    assert!(hit.amount > 0);
    let brain = &h.world.actor(near).and_then(Actor::foe).unwrap().brain;
    assert_eq!(brain.state(), AiState::Chasing);

    assert!(matches!(
        h.world.attack_target(h.player, near),
        Err(GameError::OnCooldown { .. })
    ));

    h.world.tick(1.0);
    let notes_before = h.notes.0.borrow().len();
    assert_eq!(
        h.world.attack_target(h.player, far),
        Err(GameError::TargetUnreachable(far))
    );
    assert_eq!(h.notes.0.borrow().len(), notes_before);
}

#[test]
fn test_player_death_and_respawn() {
    let mut h = harness();
    h.world.spawn_enemy("brute", Vec3::new(1.0, 0.0, 0.0)).unwrap();

    for _ in 0..100 {
        h.world.tick(0.1);
        if !h.world.player().unwrap().is_alive() {
            break;
        }
    }
    assert!(!h.world.player().unwrap().is_alive());
    assert!(h.world.env().position_of(h.player).is_none());
    assert_eq!(count(&h, |e| *e == GameEvent::PlayerDied), 1);
    assert!(h.notes.0.borrow().iter().any(|n| n == "You died!"));

    // Commands are refused while dead
    assert_eq!(h.world.use_ability(h.player, 0), Err(GameError::ActorDead(h.player)));

    let mut ticks = 0;
    while !h.world.player().unwrap().is_alive() && ticks < 40 {
        h.world.tick(0.1);
        ticks += 1;
    }
    assert!((29..=31).contains(&ticks));
    let player = h.world.player().unwrap();
    assert_eq!(player.stats.current_health(), 100);
    assert_eq!(player.stats.current_mana(), 50);
    assert_eq!(h.world.env().position_of(h.player), Some(Vec3::ZERO));
    assert_eq!(count(&h, |e| *e == GameEvent::PlayerRespawned), 1);
}

#[test]
fn test_potion_from_inventory() {
    let mut h = harness();
    h.world.actor_mut(h.player).unwrap().stats.take_damage(100);
    assert_eq!(h.world.player().unwrap().stats.current_health(), 105);

    let outcomes = h.world.use_inventory_slot(h.player, 0).unwrap();
    assert_eq!(outcomes, vec![EffectOutcome::Healed(50)]);
    assert_eq!(h.world.player().unwrap().stats.current_health(), 155);
    assert_eq!(hero(&h).inventory.item_count("potion"), 2);

    assert_eq!(h.world.use_inventory_slot(h.player, 5), Err(GameError::InvalidSlot(5)));
}

#[test]
fn test_equip_from_bag_swaps_back() {
    let mut h = harness();
    h.world.pick_up(h.player, "sword", 1).unwrap();
    assert!(h.world.use_inventory_slot(h.player, 1).unwrap().is_empty());
    assert_eq!(h.world.player().unwrap().stats.total(Attribute::Strength), 13);
    assert_eq!(hero(&h).inventory.item_count("sword"), 0);

    h.world.pick_up(h.player, "axe", 1).unwrap();
    let worn = h.world.equip_item(h.player, "axe").unwrap();
    assert_eq!(worn.previous.map(|i| i.id.clone()), Some("sword".to_string()));
    assert_eq!(h.world.player().unwrap().stats.total(Attribute::Strength), 15);
    assert_eq!(hero(&h).inventory.item_count("sword"), 1);
    assert_eq!(hero(&h).inventory.item_count("axe"), 0);

    assert!(h.world.equip_item(h.player, "axe").is_err());

    h.world.unequip_item(h.player, EquipmentSlot::MainHand).unwrap();
    assert_eq!(h.world.player().unwrap().stats.total(Attribute::Strength), 10);
    assert_eq!(hero(&h).inventory.item_count("axe"), 1);
}

#[test]
fn test_use_slot_wears_from_that_slot() {
    let mut h = harness();
    h.world.pick_up(h.player, "sword", 2).unwrap();
    assert_eq!(hero(&h).inventory.item_count("sword"), 2);

    h.world.use_inventory_slot(h.player, 2).unwrap();
    let bag = &hero(&h).inventory;
    assert!(bag.slot(2).unwrap().is_empty());
    assert_eq!(bag.slot(1).unwrap().item().map(|i| i.id.as_str()), Some("sword"));
    assert_eq!(h.world.player().unwrap().stats.total(Attribute::Strength), 13);
}

#[test]
fn test_swap_into_full_bag_changes_nothing() {
    let mut h = harness_with(WorldConfig {
        inventory_size: 3,
        ..quiet_config()
    });
    h.world.pick_up(h.player, "sword", 1).unwrap();
    h.world.equip_item(h.player, "sword").unwrap();
    h.world.pick_up(h.player, "dagger", 2).unwrap();
    h.world.pick_up(h.player, "tail", 1).unwrap();
    assert!(hero(&h).inventory.is_full());

    let err = h.world.use_inventory_slot(h.player, 1).unwrap_err();
    assert!(matches!(err, GameError::InventoryFull { .. }));
    assert!(h.notes.0.borrow().iter().any(|n| n == "Inventory full!"));

    let hero = hero(&h);
    assert_eq!(hero.equipment.get(EquipmentSlot::MainHand).map(|i| i.id.as_str()), Some("sword"));
    assert_eq!(hero.inventory.item_count("dagger"), 2);
    assert_eq!(hero.inventory.slot(1).unwrap().quantity(), 2);
    assert_eq!(h.world.player().unwrap().stats.total(Attribute::Strength), 13);
}

#[test]
fn test_spend_attribute_points() {
    let mut h = harness();
    for _ in 0..5 {
        h.world.spend_attribute_point(h.player, Attribute::Vitality).unwrap();
    }
    assert_eq!(
        h.world.spend_attribute_point(h.player, Attribute::Vitality),
        Err(GameError::NoAttributePoints)
    );
    assert_eq!(h.world.player().unwrap().stats.max_health(), 250);
}

#[test]
fn test_save_and_load_round_trip() {
    let mut h = harness();
    h.world.pick_up(h.player, "sword", 1).unwrap();
    h.world.equip_item(h.player, "sword").unwrap();
    h.world.actor_mut(h.player).unwrap().stats.take_damage(40);
    h.world.actor_mut(h.player).and_then(Actor::hero_mut).unwrap().gold = 42;
    h.world.tick(1.5);

    let record = h.world.to_record().unwrap();
    assert_eq!(record.attributes.strength, 10);
    assert_eq!(record.current_health, 165);
    assert_eq!(record.play_time_seconds, 1.5);

    let mut restored = World::new(OpenField::new(), catalog(), quiet_config());
    let id = restored.load_player(&record, Vec3::ZERO).unwrap();
    assert_eq!(id, h.player);
    assert_eq!(restored.player().unwrap().stats.total(Attribute::Strength), 13);
    assert_eq!(restored.to_record().unwrap(), record);
}

#[test]
fn test_buffed_save_reloads_exactly() {
    let mut h = harness();
    let stats = &mut h.world.actor_mut(h.player).unwrap().stats;
    stats.apply_buff(BuffEntry::new("fort", 30.0, Attributes::new(0, 0, 0, 5)));
    stats.take_damage(40);

    let record = h.world.to_record().unwrap();
    assert_eq!(record.max_health, 250);
    assert_eq!(record.current_health, 215);
    assert_eq!(record.attributes.vitality, 10);
    assert_eq!(record.buffs.len(), 1);

    let mut restored = World::new(OpenField::new(), catalog(), quiet_config());
    restored.load_player(&record, Vec3::ZERO).unwrap();
    let player = restored.player().unwrap();
    assert!(player.stats.has_buff("fort"));
    assert_eq!(player.stats.max_health(), 250);
    assert_eq!(player.stats.current_health(), 215);
    assert_eq!(restored.to_record().unwrap(), record);

    // The buff still runs out after loading
    restored.tick(30.5);
    assert_eq!(restored.player().unwrap().stats.max_health(), 200);
}

#[test]
fn test_dead_save_reloads_exactly() {
    let mut h = harness();
    h.world.actor_mut(h.player).unwrap().stats.take_damage(10_000);
    let record = h.world.to_record().unwrap();
    assert_eq!(record.current_health, 0);

    let mut restored = World::new(OpenField::new(), catalog(), quiet_config());
    let id = restored.load_player(&record, Vec3::ZERO).unwrap();
    assert!(!restored.player().unwrap().is_alive());
    assert!(restored.env().position_of(id).is_none());
    assert_eq!(restored.to_record().unwrap(), record);

    restored.tick(3.1);
    let player = restored.player().unwrap();
    assert!(player.is_alive());
    assert_eq!(player.stats.current_health(), 100);
    assert!(restored.env().position_of(id).is_some());
}

#[test]
fn test_load_clamps_to_derived_maximum() {
    let h = harness();
    let mut record = h.world.to_record().unwrap();
    record.max_health = 999;
    record.current_health = 900;

    let mut restored = World::new(OpenField::new(), catalog(), quiet_config());
    restored.load_player(&record, Vec3::ZERO).unwrap();
    let resaved = restored.to_record().unwrap();
    assert_eq!(resaved.max_health, 200);
    assert_eq!(resaved.current_health, 200);

    // Once normalized, the record is stable
    let mut again = World::new(OpenField::new(), catalog(), quiet_config());
    again.load_player(&resaved, Vec3::ZERO).unwrap();
    assert_eq!(again.to_record().unwrap(), resaved);
}

#[test]
fn test_access_reward_survives_reload() {
    let mut h = harness();
    assert!(!h.world.has_access("sewers"));
    h.world.spawn_enemy("rat", Vec3::new(1.0, 0.0, 0.0)).unwrap();
    h.world.use_ability(h.player, 0).unwrap();
    assert!(h.world.has_access("sewers"));

    let record = h.world.to_record().unwrap();
    assert!(record.unlocked.contains("sewers"));

    let mut restored = World::new(OpenField::new(), catalog(), quiet_config());
    restored.load_player(&record, Vec3::ZERO).unwrap();
    assert!(restored.has_access("sewers"));
    assert!(!restored.has_access("castle"));
}

#[test]
fn test_load_rejects_invalid_record() {
    let h = harness();
    let mut record = h.world.to_record().unwrap();
    record.level = 0;

    let mut world = World::new(OpenField::new(), catalog(), quiet_config());
    assert!(world.load_player(&record, Vec3::ZERO).is_err());
    assert!(world.player().is_none());
}
