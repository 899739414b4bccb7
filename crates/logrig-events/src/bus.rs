//! Callback-list event bus

use parking_lot::{ReentrantMutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::warn;

use crate::error::{EventError, Result};

/// Event type that receives every published event
pub const WILDCARD: &str = "*";

/// Something that can travel over an [`EventBus`]
pub trait Event: Send + Sync + 'static {
    /// Name subscribers use to select this event
    fn event_type(&self) -> &'static str;
}

type Callback<E> = Arc<dyn Fn(&E) -> Result<()> + Send + Sync>;

struct BusInner<E> {
    next_id: AtomicU64,
    subscribers: RwLock<HashMap<String, Vec<(u64, Callback<E>)>>>,
    // serializes delivery so same-type events arrive in publish order;
    // reentrant so a callback may publish
    delivery: ReentrantMutex<()>,
}

impl<E> BusInner<E> {
    fn remove(&self, event_type: &str, id: u64) -> bool {
        let mut subscribers = self.subscribers.write();
        let Some(list) = subscribers.get_mut(event_type) else {
            return false;
        };
        let before = list.len();
        list.retain(|(sid, _)| *sid != id);
        let removed = list.len() != before;
        if list.is_empty() {
            subscribers.remove(event_type);
        }
        removed
    }
}

/// Synchronous in-process publish/subscribe channel
///
/// Cloning the bus yields another handle to the same subscriber list.
pub struct EventBus<E> {
    inner: Arc<BusInner<E>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribers = self.inner.subscribers.read();
        let counts: HashMap<&str, usize> = subscribers
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        f.debug_struct("EventBus").field("subscribers", &counts).finish()
    }
}

/// Outcome of one [`EventBus::publish`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Callbacks that returned `Ok`
    pub delivered: usize,
    /// Callbacks that returned an error or panicked
    pub failed: usize,
}

impl PublishReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }
}

impl<E: Event> EventBus<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                next_id: AtomicU64::new(1),
                subscribers: RwLock::new(HashMap::new()),
                delivery: ReentrantMutex::new(()),
            }),
        }
    }

    /// Register `callback` for `event_type` (`*` for every type)
    pub fn subscribe<F>(&self, event_type: &str, callback: F) -> Subscription<E>
    where
        F: Fn(&E) -> Result<()> + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .write()
            .entry(event_type.to_string())
            .or_default()
            .push((id, Arc::new(callback)));

        Subscription {
            id,
            event_type: event_type.to_string(),
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Remove a subscription; false if it was already gone
    pub fn unsubscribe(&self, subscription: &Subscription<E>) -> bool {
        self.inner.remove(&subscription.event_type, subscription.id)
    }

    /// Deliver `event` to every callback subscribed at this moment
    pub fn publish(&self, event: &E) -> PublishReport {
        let _delivery = self.inner.delivery.lock();
        let event_type = event.event_type();

        // snapshot, so callbacks can (un)subscribe without deadlocking
        let callbacks: Vec<Callback<E>> = {
            let subscribers = self.inner.subscribers.read();
            [event_type, WILDCARD]
                .iter()
                .filter_map(|t| subscribers.get(*t))
                .flatten()
                .map(|(_, cb)| Arc::clone(cb))
                .collect()
        };

        let mut report = PublishReport::default();
        for callback in callbacks {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(result) => result,
                Err(payload) => Err(EventError::Panicked(panic_message(payload.as_ref()))),
            };
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(target: "logrig::events", event = event_type, "Subscriber failed: {}", e);
                }
            }
        }
        report
    }

    /// Number of callbacks subscribed to exactly `event_type`
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.inner
            .subscribers
            .read()
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Drop every subscription
    pub fn clear(&self) {
        self.inner.subscribers.write().clear();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Handle to one registered callback
///
/// Dropping it leaves the callback in place; call [`Subscription::cancel`]
/// to tear it down.
pub struct Subscription<E> {
    id: u64,
    event_type: String,
    bus: Weak<BusInner<E>>,
}

impl<E> Subscription<E> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Whether the callback is still registered
    pub fn is_active(&self) -> bool {
        self.bus.upgrade().is_some_and(|bus| {
            bus.subscribers
                .read()
                .get(&self.event_type)
                .is_some_and(|list| list.iter().any(|(id, _)| *id == self.id))
        })
    }

    /// Remove the callback from its bus; false if it was already gone
    pub fn cancel(&self) -> bool {
        self.bus
            .upgrade()
            .is_some_and(|bus| bus.remove(&self.event_type, self.id))
    }
}

impl<E> fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::thread;

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Registered(String),
        Updated(String),
    }

    impl Event for TestEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TestEvent::Registered(_) => "registered",
                TestEvent::Updated(_) => "updated",
            }
        }
    }

    fn recorder(bus: &EventBus<TestEvent>, event_type: &str) -> (Subscription<TestEvent>, Arc<Mutex<Vec<TestEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = bus.subscribe(event_type, move |e| {
            sink.lock().push(e.clone());
            Ok(())
        });
        (sub, seen)
    }

    #[test]
    fn test_publish_reaches_matching_subscribers() {
        let bus = EventBus::new();
        let (_reg, registered) = recorder(&bus, "registered");
        let (_upd, updated) = recorder(&bus, "updated");

        let report = bus.publish(&TestEvent::Registered("a".into()));
        assert_eq!(report.delivered, 1);
        assert_eq!(*registered.lock(), vec![TestEvent::Registered("a".into())]);
        assert!(updated.lock().is_empty());
    }

    #[test]
    fn test_wildcard_receives_everything() {
        let bus = EventBus::new();
        let (_all, seen) = recorder(&bus, WILDCARD);
        bus.publish(&TestEvent::Registered("a".into()));
        bus.publish(&TestEvent::Updated("a".into()));
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn test_failing_callback_is_isolated() {
        let bus = EventBus::new();
        let _bad = bus.subscribe("updated", |_| Err(EventError::callback("nope")));
        let _panics = bus.subscribe("updated", |_| panic!("boom"));
        let (_good, seen) = recorder(&bus, "updated");

        let report = bus.publish(&TestEvent::Updated("x".into()));
        assert_eq!(report.failed, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.attempted(), 3);
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_cancel_and_unsubscribe() {
        let bus = EventBus::new();
        let (sub, seen) = recorder(&bus, "updated");
        assert!(sub.is_active());
        assert!(sub.cancel());
        assert!(!sub.cancel());
        assert!(!bus.unsubscribe(&sub));
        assert!(!sub.is_active());

        bus.publish(&TestEvent::Updated("x".into()));
        assert!(seen.lock().is_empty());
        assert_eq!(bus.subscriber_count("updated"), 0);
    }

    #[test]
    fn test_cancel_after_bus_dropped() {
        let bus = EventBus::<TestEvent>::new();
        let sub = bus.subscribe("updated", |_| Ok(()));
        drop(bus);
        assert!(!sub.cancel());
    }

    #[test]
    fn test_callback_may_publish() {
        let bus = EventBus::new();
        let inner_bus = bus.clone();
        let _chain = bus.subscribe("registered", move |e| {
            if let TestEvent::Registered(name) = e {
                inner_bus.publish(&TestEvent::Updated(name.clone()));
            }
            Ok(())
        });
        let (_upd, updated) = recorder(&bus, "updated");
        bus.publish(&TestEvent::Registered("n".into()));
        assert_eq!(*updated.lock(), vec![TestEvent::Updated("n".into())]);
    }

    #[test]
    fn test_same_type_publish_order() {
        let bus = EventBus::new();
        let (_sub, seen) = recorder(&bus, "updated");

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let bus = bus.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        bus.publish(&TestEvent::Updated(format!("{}-{}", t, i)));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let seen = seen.lock();
        assert_eq!(seen.len(), 200);
        // each publisher's own events stay in order
        for t in 0..4 {
            let prefix = format!("{}-", t);
            let order: Vec<usize> = seen
                .iter()
                .filter_map(|e| match e {
                    TestEvent::Updated(n) => n.strip_prefix(&prefix).map(|i| i.parse().unwrap()),
                    _ => None,
                })
                .collect();
            assert_eq!(order, (0..50).collect::<Vec<_>>());
        }
    }
}
