//! Logger handles
//!
//! A handle is the only surface callers log through: `write`, `configure`,
//! `close`. Reconfiguration is split into [`LoggerHandle::prepare`], which
//! does all fallible work (validation against the handle state, opening a
//! new file), and [`LoggerHandle::commit_all`], which swaps the prepared
//! state into any number of handles at once and cannot fail.

use chrono::{Local, NaiveDateTime};
use logrig_core::{Error, Level, LoggerSettings, Result};
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::format::{render_line, Fields};
use crate::writer::FileSink;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

struct HandleState {
    settings: LoggerSettings,
    sink: Option<FileSink>,
    closed: bool,
}

struct HandleInner {
    id: u64,
    name: String,
    state: Mutex<HandleState>,
}

/// Named sink endpoint. Clones refer to the same underlying sink.
#[derive(Clone)]
pub struct LoggerHandle {
    inner: Arc<HandleInner>,
}

/// New settings for one handle, validated and with any new file already open
pub struct PreparedConfig {
    handle: LoggerHandle,
    settings: LoggerSettings,
    // None: keep the current sink
    replacement: Option<Option<FileSink>>,
}

impl PreparedConfig {
    pub fn handle(&self) -> &LoggerHandle {
        &self.handle
    }
}

impl LoggerHandle {
    /// Create a handle and open its sink
    pub fn new(name: impl Into<String>, settings: LoggerSettings) -> Result<Self> {
        let name = name.into();
        let sink = FileSink::open(&settings, &name, now()).map_err(|e| Error::sink_io(&name, e))?;
        Ok(Self {
            inner: Arc::new(HandleInner {
                id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
                name,
                state: Mutex::new(HandleState {
                    settings,
                    sink,
                    closed: false,
                }),
            }),
        })
    }

    /// Handle on default settings: console output at INFO
    pub fn console(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
                name: name.into(),
                state: Mutex::new(HandleState {
                    settings: LoggerSettings::default(),
                    sink: None,
                    closed: false,
                }),
            }),
        }
    }

    /// Process-unique id; never reused
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether both values refer to the same underlying sink
    pub fn ptr_eq(&self, other: &LoggerHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Snapshot of the settings currently in effect
    pub fn settings(&self) -> LoggerSettings {
        self.inner.state.lock().settings.clone()
    }

    pub fn level(&self) -> Level {
        self.inner.state.lock().settings.level
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Path of the file currently written, if any
    pub fn active_file(&self) -> Option<PathBuf> {
        self.inner
            .state
            .lock()
            .sink
            .as_ref()
            .map(|s| s.path().to_path_buf())
    }

    /// Write one record. Records below the handle's level are dropped.
    pub fn write(&self, level: Level, message: &str, fields: &Fields) -> Result<()> {
        let mut state = self.open_state()?;
        if !state.settings.level.allows(level) {
            return Ok(());
        }

        let at = now();
        let line = render_line(&state.settings.format, at, level, &self.inner.name, message, fields);
        match state.sink.as_mut() {
            Some(sink) => sink
                .write_line(&line, at)
                .map_err(|e| Error::sink_io(&self.inner.name, e)),
            None => {
                let mut stderr = std::io::stderr().lock();
                writeln!(stderr, "{}", line).map_err(|e| Error::sink_io(&self.inner.name, e))
            }
        }
    }

    /// Apply `settings` to this handle
    pub fn configure(&self, settings: &LoggerSettings) -> Result<()> {
        let prepared = self.prepare(settings)?;
        Self::commit_all(vec![prepared]);
        Ok(())
    }

    /// Do the fallible half of [`LoggerHandle::configure`]: open the new
    /// file if the destination changes. Nothing observable changes yet.
    pub fn prepare(&self, settings: &LoggerSettings) -> Result<PreparedConfig> {
        let state = self.open_state()?;
        let replacement = if state.settings.sink_differs(settings, &self.inner.name) || state.sink.is_none() {
            drop(state);
            let sink = FileSink::open(settings, &self.inner.name, now())
                .map_err(|e| Error::sink_io(&self.inner.name, e))?;
            Some(sink)
        } else {
            None
        };
        Ok(PreparedConfig {
            handle: self.clone(),
            settings: settings.clone(),
            replacement,
        })
    }

    /// Swap prepared settings into their handles. Every handle in the batch
    /// is locked (in id order) before the first one changes, so no reader
    /// sees a mix of old and new settings across the batch. Handles closed
    /// since preparation are skipped.
    pub fn commit_all(batch: Vec<PreparedConfig>) {
        let mut batch = batch;
        batch.sort_by_key(|p| p.handle.id());
        batch.dedup_by_key(|p| p.handle.id());

        let handles: Vec<LoggerHandle> = batch.iter().map(|p| p.handle.clone()).collect();
        let mut guards: Vec<MutexGuard<'_, HandleState>> =
            handles.iter().map(|h| h.inner.state.lock()).collect();

        for (state, prepared) in guards.iter_mut().zip(batch) {
            if state.closed {
                continue;
            }
            match prepared.replacement {
                Some(sink) => state.sink = sink,
                None => {
                    if let Some(sink) = state.sink.as_mut() {
                        sink.reconfigure(&prepared.settings);
                    }
                }
            }
            state.settings = prepared.settings;
        }
        drop(guards);

        for handle in &handles {
            debug!("Reconfigured logger '{}'", handle.name());
        }
    }

    /// Run retention on this handle's rotated files now; returns how many
    /// were removed
    pub fn clean(&self) -> Result<usize> {
        let state = self.open_state()?;
        match state.sink.as_ref() {
            Some(sink) => sink
                .clean()
                .map(|removed| removed.len())
                .map_err(|e| Error::sink_io(&self.inner.name, e)),
            None => Ok(0),
        }
    }

    /// Force a rollover of the active file
    pub fn rotate(&self) -> Result<Option<PathBuf>> {
        let mut state = self.open_state()?;
        match state.sink.as_mut() {
            Some(sink) => sink
                .rotate(now())
                .map(Some)
                .map_err(|e| Error::sink_io(&self.inner.name, e)),
            None => Ok(None),
        }
    }

    pub fn flush(&self) -> Result<()> {
        let mut state = self.open_state()?;
        if let Some(sink) = state.sink.as_mut() {
            sink.flush().map_err(|e| Error::sink_io(&self.inner.name, e))?;
        }
        Ok(())
    }

    /// Release the sink. Later writes fail with `HandleUnavailable`.
    /// Returns false if the handle was already closed.
    pub fn close(&self) -> bool {
        let mut state = self.inner.state.lock();
        if state.closed {
            return false;
        }
        state.closed = true;
        state.sink = None;
        debug!("Closed logger '{}'", self.inner.name);
        true
    }

    fn open_state(&self) -> Result<MutexGuard<'_, HandleState>> {
        let state = self.inner.state.lock();
        if state.closed {
            return Err(Error::HandleUnavailable(self.inner.name.clone()));
        }
        Ok(state)
    }
}

impl PartialEq for LoggerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for LoggerHandle {}

impl fmt::Debug for LoggerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerHandle")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .finish()
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
