//! Logger registry
//!
//! Maps logical names to live handles. A registry is an ordinary value:
//! create one at startup, share it (clones refer to the same registry), and
//! tear it down with [`LoggerRegistry::shutdown`].

use logrig_core::{LoggerSettings, Result};
use logrig_events::{EventBus, Result as EventResult, Subscription};
use logrig_logs::LoggerHandle;
use parking_lot::{Mutex, RwLock};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::info;

use crate::attach::{AttachKey, Binding, ConfigShared};
use crate::event::LoggerEvent;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct RegistryInner {
    pub(crate) id: u64,
    handles: RwLock<HashMap<String, LoggerHandle>>,
    /// name -> config that owns its binding
    pub(crate) ledger: Mutex<HashMap<String, Weak<ConfigShared>>>,
    pub(crate) bus: EventBus<LoggerEvent>,
}

/// Process-wide name to handle index
#[derive(Clone)]
pub struct LoggerRegistry {
    pub(crate) inner: Arc<RegistryInner>,
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::with_bus(EventBus::new())
    }

    /// Registry publishing its lifecycle events on an existing bus
    pub fn with_bus(bus: EventBus<LoggerEvent>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
                handles: RwLock::new(HashMap::new()),
                ledger: Mutex::new(HashMap::new()),
                bus,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Handle for `name`, creating a console handle on first use
    pub fn create_or_get(&self, name: &str) -> LoggerHandle {
        let (handle, created) = self.create_or_get_inner(name);
        if created {
            self.publish(vec![LoggerEvent::Registered {
                name: name.to_string(),
                handle: handle.clone(),
            }]);
        }
        handle
    }

    pub(crate) fn create_or_get_inner(&self, name: &str) -> (LoggerHandle, bool) {
        if let Some(handle) = self.inner.handles.read().get(name) {
            return (handle.clone(), false);
        }
        let mut handles = self.inner.handles.write();
        match handles.entry(name.to_string()) {
            Entry::Occupied(e) => (e.get().clone(), false),
            Entry::Vacant(e) => {
                let handle = LoggerHandle::console(name);
                e.insert(handle.clone());
                info!("Registered logger '{}'", name);
                (handle, true)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<LoggerHandle> {
        self.inner.handles.read().get(name).cloned()
    }

    /// Registered names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.handles.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.handles.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.handles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.handles.read().is_empty()
    }

    /// Id of the config `name` is bound to, if any
    pub fn bound_config(&self, name: &str) -> Option<u64> {
        self.inner
            .ledger
            .lock()
            .get(name)
            .and_then(Weak::upgrade)
            .map(|c| c.id)
    }

    /// Remove `name`: drop its binding, close its sink. A later
    /// `create_or_get` builds a fresh handle with no memory of this one.
    pub fn unregister(&self, name: &str) -> bool {
        {
            // held until the handle is closed, so no bind can slip in between
            let mut ledger = self.inner.ledger.lock();
            let Some(handle) = self.inner.handles.write().remove(name) else {
                return false;
            };
            if let Some(config) = ledger.remove(name).and_then(|w| w.upgrade()) {
                config
                    .state
                    .lock()
                    .attached
                    .remove(&AttachKey::new(self.inner.id, name));
            }
            handle.close();
        }

        info!("Unregistered logger '{}'", name);
        self.publish(vec![LoggerEvent::Unregistered {
            name: name.to_string(),
        }]);
        true
    }

    /// Close the handle for `name` and put a fresh one in its place. If the
    /// name is bound, the new handle inherits the binding and its settings.
    pub fn recreate(&self, name: &str) -> Result<LoggerHandle> {
        let handle = {
            let ledger = self.inner.ledger.lock();
            let owner = ledger.get(name).and_then(Weak::upgrade);
            let mut state = owner.as_ref().map(|c| c.state.lock());

            let settings = state
                .as_ref()
                .map(|s| s.settings.clone())
                .unwrap_or_else(LoggerSettings::default);
            let handle = LoggerHandle::new(name, settings)?;

            if let Some(state) = state.as_mut() {
                state.attached.insert(
                    AttachKey::new(self.inner.id, name),
                    Binding {
                        handle: handle.clone(),
                        registry: Arc::downgrade(&self.inner),
                    },
                );
            }
            let old = self
                .inner
                .handles
                .write()
                .insert(name.to_string(), handle.clone());
            drop(state);
            if let Some(old) = old {
                old.close();
            }
            handle
        };

        info!("Recreated logger '{}'", name);
        self.publish(vec![LoggerEvent::Registered {
            name: name.to_string(),
            handle: handle.clone(),
        }]);
        Ok(handle)
    }

    /// Unregister every name; returns how many there were
    pub fn shutdown(&self) -> usize {
        let names = self.list();
        let count = names.iter().filter(|name| self.unregister(name)).count();
        info!("Logger registry shut down ({} loggers)", count);
        count
    }

    /// Subscribe to lifecycle events (`registered`, `bound`, `updated`,
    /// `detached`, `unregistered`, or `*`)
    pub fn subscribe<F>(&self, event_type: &str, callback: F) -> Subscription<LoggerEvent>
    where
        F: Fn(&LoggerEvent) -> EventResult<()> + Send + Sync + 'static,
    {
        self.inner.bus.subscribe(event_type, callback)
    }

    pub fn bus(&self) -> &EventBus<LoggerEvent> {
        &self.inner.bus
    }

    pub(crate) fn publish(&self, events: Vec<LoggerEvent>) {
        for event in &events {
            self.inner.bus.publish(event);
        }
    }
}

impl fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("id", &self.inner.id)
            .field("loggers", &self.list())
            .finish()
    }
}
