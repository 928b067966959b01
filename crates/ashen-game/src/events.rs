//! Synchronous game event bus and player-facing notifications
//!
//! Subscribers are called in registration order, inside the same tick that
//! produced the event. A subscriber may filter by [`Topic`].

use ashen_core::{EntityId, Vec3};
use tracing::{debug, info};

use crate::actor::stats::Attribute;
use crate::combat::equipment::EquipmentSlot;
use crate::enemy::AiState;

/// Broad event categories for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Player,
    Enemy,
    Item,
    Combat,
    Quest,
    System,
}

/// Everything the simulation reports to the outside
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    // Player
    PlayerDamaged { amount: i32 },
    PlayerHealed { amount: i32 },
    PlayerDied,
    PlayerRespawned,
    LevelUp { actor: EntityId, level: u32 },
    ExperienceGained { actor: EntityId, amount: u32 },
    AttributeIncreased { actor: EntityId, attribute: Attribute },

    // Enemy
    EnemyDamaged { enemy: EntityId, amount: i32, critical: bool },
    EnemyDied { enemy: EntityId, enemy_type: String, killer: Option<EntityId> },
    EnemyDespawned { enemy: EntityId },
    AiStateChanged { enemy: EntityId, from: AiState, to: AiState },

    // Items
    ItemPickedUp { item_id: String, quantity: u32 },
    ItemEquipped { slot: EquipmentSlot, item_id: String },
    ItemUnequipped { slot: EquipmentSlot, item_id: String },
    ItemUsed { item_id: String },

    // Combat
    DamageDealt { source: EntityId, target: EntityId, amount: i32 },
    AbilityUsed { actor: EntityId, ability_id: String },
    /// `actor` is `None` for the shared registry
    CooldownStarted { actor: Option<EntityId>, id: String, duration: f32 },
    CooldownFinished { actor: Option<EntityId>, id: String },
    BuffExpired { actor: EntityId, source: String },

    // Quests
    QuestStarted { quest_id: String },
    ObjectiveCompleted { quest_id: String, objective_id: String },
    QuestCompleted { quest_id: String },

    // System
    Notification(String),
}

impl GameEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::PlayerDamaged { .. }
            | Self::PlayerHealed { .. }
            | Self::PlayerDied
            | Self::PlayerRespawned
            | Self::LevelUp { .. }
            | Self::ExperienceGained { .. }
            | Self::AttributeIncreased { .. } => Topic::Player,
            Self::EnemyDamaged { .. }
            | Self::EnemyDied { .. }
            | Self::EnemyDespawned { .. }
            | Self::AiStateChanged { .. } => Topic::Enemy,
            Self::ItemPickedUp { .. }
            | Self::ItemEquipped { .. }
            | Self::ItemUnequipped { .. }
            | Self::ItemUsed { .. } => Topic::Item,
            Self::DamageDealt { .. }
            | Self::AbilityUsed { .. }
            | Self::CooldownStarted { .. }
            | Self::CooldownFinished { .. }
            | Self::BuffExpired { .. } => Topic::Combat,
            Self::QuestStarted { .. } | Self::ObjectiveCompleted { .. } | Self::QuestCompleted { .. } => {
                Topic::Quest
            }
            Self::Notification(_) => Topic::System,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Handler = Box<dyn FnMut(&GameEvent)>;

struct Subscriber {
    id: SubscriberId,
    topic: Option<Topic>,
    handler: Handler,
}

/// In-process observer list
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
    next_id: u64,
    published: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("published", &self.published)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event
    pub fn subscribe(&mut self, handler: impl FnMut(&GameEvent) + 'static) -> SubscriberId {
        self.register(None, Box::new(handler))
    }

    /// Receive only events of one topic
    pub fn subscribe_topic(&mut self, topic: Topic, handler: impl FnMut(&GameEvent) + 'static) -> SubscriberId {
        self.register(Some(topic), Box::new(handler))
    }

    fn register(&mut self, topic: Option<Topic>, handler: Handler) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber { id, topic, handler });
        id
    }

    /// Returns false if the id was not registered
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Deliver to every matching subscriber before returning
    pub fn publish(&mut self, event: &GameEvent) {
        self.published += 1;
        let topic = event.topic();
        for subscriber in &mut self.subscribers {
            if subscriber.topic.map_or(true, |t| t == topic) {
                (subscriber.handler)(event);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Total events published since creation
    pub fn published(&self) -> u64 {
        self.published
    }
}

/// Display-facing output. Implementations must not fail loudly.
pub trait Notifier {
    fn notify(&mut self, message: &str);

    fn damage_shown(&mut self, position: Vec3, amount: i32, is_critical: bool);
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&mut self, message: &str) {
        info!("{}", message);
    }

    fn damage_shown(&mut self, position: Vec3, amount: i32, is_critical: bool) {
        if is_critical {
            debug!("{} CRIT at ({:.1}, {:.1}, {:.1})", amount, position.x, position.y, position.z);
        } else {
            debug!("{} at ({:.1}, {:.1}, {:.1})", amount, position.x, position.y, position.z);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_publish_reaches_subscribers_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = seen.clone();
        bus.subscribe(move |_| first.borrow_mut().push(1));
        let second = seen.clone();
        bus.subscribe(move |_| second.borrow_mut().push(2));

        bus.publish(&GameEvent::PlayerDied);
        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(bus.published(), 1);
    }

    #[test]
    fn test_topic_filter() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let counter = count.clone();
        bus.subscribe_topic(Topic::Quest, move |_| *counter.borrow_mut() += 1);

        bus.publish(&GameEvent::PlayerDied);
        bus.publish(&GameEvent::QuestStarted { quest_id: "q".into() });
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let counter = count.clone();
        let id = bus.subscribe(move |_| *counter.borrow_mut() += 1);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&GameEvent::Notification("hi".into()));
        assert_eq!(*count.borrow(), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
