//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use skill_core::{CastOccurred, NotificationBus};

use super::types::{CastEvent, ProgressionEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Cast lifecycle (started, occurred, resolved)
    Cast,
    /// Level-ups and evolution choices
    Progression,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Cast(CastEvent),
    Progression(ProgressionEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Cast(_) => Topic::Cast,
            Event::Progression(_) => Topic::Progression,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Publishing is best-effort: events sent while a
/// topic has no subscribers are dropped.
#[derive(Clone)]
pub struct EventBus {
    cast: broadcast::Sender<Event>,
    progression: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            cast: broadcast::channel(capacity).0,
            progression: broadcast::channel(capacity).0,
        }
    }

    fn channel(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Cast => &self.cast,
            Topic::Progression => &self.progression,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.channel(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channel(topic).subscribe()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.channel(topic).receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("cast_subscribers", &self.cast.receiver_count())
            .field("progression_subscribers", &self.progression.receiver_count())
            .finish()
    }
}

/// Cast-occurred notifications from the resource stage land on the cast topic.
impl NotificationBus for EventBus {
    fn publish(&self, event: CastOccurred) {
        EventBus::publish(self, Event::Cast(CastEvent::Occurred(event)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skill_core::{EntityId, SkillId, SlotIndex};

    #[test]
    fn events_route_by_topic() {
        let bus = EventBus::with_capacity(8);
        let mut casts = bus.subscribe(Topic::Cast);
        let mut progression = bus.subscribe(Topic::Progression);

        NotificationBus::publish(
            &bus,
            CastOccurred {
                player_id: EntityId(1),
                slot: SlotIndex(0),
                skill: SkillId::new("fireball"),
            },
        );

        let event = casts.try_recv().unwrap();
        assert!(matches!(event, Event::Cast(CastEvent::Occurred(_))));
        assert!(progression.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        bus.publish(Event::Cast(CastEvent::Failed {
            slot: SlotIndex(1),
            skill: SkillId::new("spark"),
            spent: 0,
        }));
        assert_eq!(bus.subscriber_count(Topic::Cast), 0);
    }
}
