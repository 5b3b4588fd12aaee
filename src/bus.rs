//! EventBus - synchronous publish/subscribe channel between joystick and consumers
//!
//! The bus is an explicitly constructed handle: clone it and pass it to every
//! producer and consumer that should share the same listener table. Publishing
//! invokes every listener of the event's topic, in registration order, before
//! returning. Nothing is queued.

use glam::Vec2;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

use crate::joystick::{Mode, MovementEvent};

/// Channel topic, one per kind of payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    TouchStart,
    TouchMove,
    TouchEnd,
    SetJoystickMode,
}

impl Topic {
    pub fn all() -> &'static [Topic] {
        &[
            Topic::TouchStart,
            Topic::TouchMove,
            Topic::TouchEnd,
            Topic::SetJoystickMode,
        ]
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Topic::TouchStart => "touch-start",
            Topic::TouchMove => "touch-move",
            Topic::TouchEnd => "touch-end",
            Topic::SetJoystickMode => "set-joystick-mode",
        };
        f.write_str(name)
    }
}

/// Payload carried on the bus
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BusEvent {
    /// A touch began at this UI-space point
    TouchStart(Vec2),
    /// Joystick moved; carries the tier and direction
    TouchMove(MovementEvent),
    /// Touch released or cancelled; tier is always `Stop`
    TouchEnd(MovementEvent),
    /// External request to switch the joystick interaction mode
    SetJoystickMode(Mode),
}

impl BusEvent {
    pub fn topic(&self) -> Topic {
        match self {
            BusEvent::TouchStart(_) => Topic::TouchStart,
            BusEvent::TouchMove(_) => Topic::TouchMove,
            BusEvent::TouchEnd(_) => Topic::TouchEnd,
            BusEvent::SetJoystickMode(_) => Topic::SetJoystickMode,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type ListenerFn = Arc<dyn Fn(&BusEvent) + Send + Sync>;

struct Listener {
    id: SubscriptionId,
    callback: ListenerFn,
}

#[derive(Default)]
struct Inner {
    listeners: RwLock<HashMap<Topic, Vec<Listener>>>,
    next_id: AtomicU64,
}

/// Shared listener table with synchronous dispatch
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one topic
    pub fn subscribe<F>(&self, topic: Topic, listener: F) -> SubscriptionId
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .write()
            .entry(topic)
            .or_default()
            .push(Listener {
                id,
                callback: Arc::new(listener),
            });
        trace!("Subscribed {:?} to {}", id, topic);
        id
    }

    /// Remove a listener. Returns false if it was not registered on `topic`.
    pub fn unsubscribe(&self, topic: Topic, id: SubscriptionId) -> bool {
        let mut listeners = self.inner.listeners.write();
        let Some(list) = listeners.get_mut(&topic) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != id);
        let removed = list.len() != before;
        if removed {
            trace!("Unsubscribed {:?} from {}", id, topic);
        }
        removed
    }

    /// Invoke every listener of the event's topic and return how many ran.
    ///
    /// Dispatch walks a snapshot of the listener list, so listeners may
    /// subscribe, unsubscribe or publish re-entrantly.
    pub fn publish(&self, event: BusEvent) -> usize {
        let topic = event.topic();
        let snapshot: Vec<ListenerFn> = {
            let listeners = self.inner.listeners.read();
            listeners
                .get(&topic)
                .map(|list| list.iter().map(|l| l.callback.clone()).collect())
                .unwrap_or_default()
        };

        trace!("Publishing {} to {} listener(s)", topic, snapshot.len());
        for callback in &snapshot {
            callback(&event);
        }
        snapshot.len()
    }

    pub fn listener_count(&self, topic: Topic) -> usize {
        self.inner
            .listeners
            .read()
            .get(&topic)
            .map_or(0, |list| list.len())
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.inner.listeners.read();
        let counts: HashMap<Topic, usize> =
            listeners.iter().map(|(t, l)| (*t, l.len())).collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joystick::SpeedTier;
    use parking_lot::Mutex;

    #[test]
    fn test_publish_reaches_only_matching_topic() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        bus.subscribe(Topic::TouchEnd, move |e| s.lock().push(*e));
        let s = seen.clone();
        bus.subscribe(Topic::SetJoystickMode, move |e| s.lock().push(*e));

        assert_eq!(bus.publish(BusEvent::TouchEnd(MovementEvent::stop())), 1);
        assert_eq!(bus.publish(BusEvent::TouchStart(Vec2::ZERO)), 0);

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].topic(), Topic::TouchEnd);
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let o = order.clone();
            bus.subscribe(Topic::TouchMove, move |_| o.lock().push(n));
        }

        bus.publish(BusEvent::TouchMove(MovementEvent::moving(
            SpeedTier::Normal,
            Vec2::X,
        )));
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new();
        let id = bus.subscribe(Topic::TouchEnd, |_| {});
        assert_eq!(bus.listener_count(Topic::TouchEnd), 1);

        // Wrong topic does not remove it
        assert!(!bus.unsubscribe(Topic::TouchMove, id));
        assert!(bus.unsubscribe(Topic::TouchEnd, id));
        assert!(!bus.unsubscribe(Topic::TouchEnd, id));
        assert_eq!(bus.listener_count(Topic::TouchEnd), 0);
    }

    #[test]
    fn test_reentrant_publish_and_unsubscribe() {
        let bus = EventBus::new();
        let hits = Arc::new(Mutex::new(0));

        let h = hits.clone();
        bus.subscribe(Topic::TouchEnd, move |_| *h.lock() += 1);

        // A mode listener that publishes and unsubscribes from inside dispatch
        let inner_bus = bus.clone();
        let own_id: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
        let own = own_id.clone();
        let id = bus.subscribe(Topic::SetJoystickMode, move |_| {
            inner_bus.publish(BusEvent::TouchEnd(MovementEvent::stop()));
            if let Some(id) = *own.lock() {
                inner_bus.unsubscribe(Topic::SetJoystickMode, id);
            }
        });
        *own_id.lock() = Some(id);

        bus.publish(BusEvent::SetJoystickMode(Mode::Follow));
        bus.publish(BusEvent::SetJoystickMode(Mode::Follow));

        assert_eq!(*hits.lock(), 1);
        assert_eq!(bus.listener_count(Topic::SetJoystickMode), 0);
    }

    #[test]
    fn test_clones_share_listeners() {
        let bus = EventBus::new();
        let other = bus.clone();
        other.subscribe(Topic::TouchStart, |_| {});
        assert_eq!(bus.listener_count(Topic::TouchStart), 1);
        assert_eq!(EventBus::new().listener_count(Topic::TouchStart), 0);
    }
}
