//! Attachment ledger and broadcast
//!
//! Each config owns its attachment set, which is the source of truth for
//! which names it broadcasts to. Each registry keeps a ledger from name to
//! the config currently owning it, used only to find and evict the previous
//! owner on rebinding.
//!
//! Lock order: registry ledger, then config states (ascending config id),
//! then handle states. The registry name map is a leaf: nothing else is
//! acquired while it is held.

use logrig_core::{ConfigParams, Error, LoggerSettings, Result};
use logrig_logs::LoggerHandle;
use parking_lot::{Mutex, MutexGuard};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

use crate::event::LoggerEvent;
use crate::registry::{LoggerRegistry, RegistryInner};

/// A name within one registry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct AttachKey {
    pub(crate) registry: u64,
    pub(crate) name: String,
}

impl AttachKey {
    pub(crate) fn new(registry: u64, name: &str) -> Self {
        Self {
            registry,
            name: name.to_string(),
        }
    }
}

pub(crate) struct Binding {
    pub(crate) handle: LoggerHandle,
    pub(crate) registry: Weak<RegistryInner>,
}

pub(crate) struct ConfigState {
    pub(crate) settings: LoggerSettings,
    pub(crate) attached: BTreeMap<AttachKey, Binding>,
}

pub(crate) struct ConfigShared {
    pub(crate) id: u64,
    pub(crate) state: Mutex<ConfigState>,
}

impl ConfigShared {
    pub(crate) fn new(id: u64, settings: LoggerSettings) -> Self {
        Self {
            id,
            state: Mutex::new(ConfigState {
                settings,
                attached: BTreeMap::new(),
            }),
        }
    }
}

/// Bind `names` in `registry` to `config`, creating handles as needed, and
/// apply the config's current settings to them
pub(crate) fn bind(
    config: &Arc<ConfigShared>,
    registry: &LoggerRegistry,
    names: &[String],
) -> Result<Vec<LoggerHandle>> {
    let mut registered = Vec::new();
    let mut handles = Vec::with_capacity(names.len());
    for name in names {
        let (handle, created) = registry.create_or_get_inner(name);
        if created {
            registered.push(LoggerEvent::Registered {
                name: name.clone(),
                handle: handle.clone(),
            });
        }
        handles.push(handle);
    }

    let bound = transfer(config, registry, names, &handles);
    registry.publish(registered);
    registry.publish(bound?);
    Ok(handles)
}

fn transfer(
    config: &Arc<ConfigShared>,
    registry: &LoggerRegistry,
    names: &[String],
    handles: &[LoggerHandle],
) -> Result<Vec<LoggerEvent>> {
    let registry_id = registry.id();
    let mut ledger = registry.inner.ledger.lock();

    // a name unregistered or recreated since its handle was fetched
    for (name, handle) in names.iter().zip(handles) {
        if !registry.get(name).is_some_and(|current| current.ptr_eq(handle)) {
            return Err(Error::HandleUnavailable(name.clone()));
        }
    }

    // every other config that currently owns one of the names
    let mut owners: BTreeMap<u64, Arc<ConfigShared>> = BTreeMap::new();
    for name in names {
        if let Some(owner) = ledger.get(name).and_then(Weak::upgrade) {
            if owner.id != config.id {
                owners.insert(owner.id, owner);
            }
        }
    }

    // lock configs in ascending id order, the target included
    let mut others: Vec<(u64, MutexGuard<'_, ConfigState>)> = owners
        .values()
        .filter(|c| c.id < config.id)
        .map(|c| (c.id, c.state.lock()))
        .collect();
    let mut target = config.state.lock();
    others.extend(
        owners
            .values()
            .filter(|c| c.id > config.id)
            .map(|c| (c.id, c.state.lock())),
    );

    // all fallible work first: nothing is rebound if any sink fails to open
    let prepared = handles
        .iter()
        .map(|h| h.prepare(&target.settings))
        .collect::<Result<Vec<_>>>()?;

    let mut events = Vec::with_capacity(names.len());
    for (name, handle) in names.iter().zip(handles) {
        let key = AttachKey::new(registry_id, name);

        if let Some(owner) = ledger.get(name).and_then(Weak::upgrade) {
            if owner.id != config.id {
                let removed = others
                    .iter_mut()
                    .find(|(id, _)| *id == owner.id)
                    .and_then(|(_, state)| state.attached.remove(&key));
                assert!(
                    removed.is_some(),
                    "duplicate binding conflict: ledger binds logger '{}' to config {} but its attachment set disagrees",
                    name,
                    owner.id
                );
                debug!("Moving logger '{}' from config {} to config {}", name, owner.id, config.id);
            }
        }

        target.attached.insert(
            key,
            Binding {
                handle: handle.clone(),
                registry: Arc::downgrade(&registry.inner),
            },
        );
        ledger.insert(name.clone(), Arc::downgrade(config));
        events.push(LoggerEvent::Bound {
            name: name.clone(),
            config_id: config.id,
        });
    }

    LoggerHandle::commit_all(prepared);
    info!(config = config.id, loggers = names.len(), "Bound loggers to config");
    Ok(events)
}

/// Remove bindings for `names` (all bindings when `None`). Handles stay
/// registered with their last settings. Returns the detached names.
pub(crate) fn detach(config: &Arc<ConfigShared>, names: Option<&BTreeSet<String>>) -> Vec<String> {
    let wanted: Vec<(AttachKey, Weak<RegistryInner>)> = {
        let state = config.state.lock();
        state
            .attached
            .iter()
            .filter(|(key, _)| names.map_or(true, |n| n.contains(&key.name)))
            .map(|(key, binding)| (key.clone(), binding.registry.clone()))
            .collect()
    };

    let own = Arc::downgrade(config);
    let mut detached = Vec::new();
    for (key, registry) in wanted {
        match registry.upgrade() {
            Some(registry) => {
                let removed = {
                    let mut ledger = registry.ledger.lock();
                    let mut state = config.state.lock();
                    let removed = state.attached.remove(&key).is_some();
                    if removed && ledger.get(&key.name).is_some_and(|w| w.ptr_eq(&own)) {
                        ledger.remove(&key.name);
                    }
                    removed
                };
                if removed {
                    registry.bus.publish(&LoggerEvent::Detached {
                        name: key.name.clone(),
                        config_id: config.id,
                    });
                    detached.push(key.name);
                }
            }
            // registry is gone, only our side remains
            None => {
                if config.state.lock().attached.remove(&key).is_some() {
                    detached.push(key.name);
                }
            }
        }
    }
    detached.sort();
    detached.dedup();
    detached
}

/// Validate `overrides`, then re-apply the resulting settings to every
/// handle bound at the moment the update began. Either every live handle
/// switches or none does.
pub(crate) fn broadcast(config: &Arc<ConfigShared>, overrides: &ConfigParams) -> Result<()> {
    let mut state = config.state.lock();
    let next = state.settings.with_overrides(overrides)?;

    let mut prepared = Vec::with_capacity(state.attached.len());
    let mut notify = Vec::with_capacity(state.attached.len());
    for (key, binding) in &state.attached {
        match binding.handle.prepare(&next) {
            Ok(p) => {
                prepared.push(p);
                notify.push((binding.registry.clone(), key.name.clone(), binding.handle.clone()));
            }
            Err(Error::HandleUnavailable(_)) => {
                debug!("Skipping closed logger '{}'", key.name);
            }
            Err(e) => return Err(e),
        }
    }

    LoggerHandle::commit_all(prepared);
    state.settings = next;
    drop(state);

    info!(config = config.id, loggers = notify.len(), "Broadcast config update");
    for (registry, name, handle) in notify {
        if let Some(registry) = registry.upgrade() {
            registry.bus.publish(&LoggerEvent::Updated { name, handle });
        }
    }
    Ok(())
}

/// Names bound to `config`, sorted and deduplicated across registries
pub(crate) fn attached_names(config: &ConfigShared) -> Vec<String> {
    let state = config.state.lock();
    let names: BTreeSet<&str> = state.attached.keys().map(|k| k.name.as_str()).collect();
    names.into_iter().map(str::to_string).collect()
}
