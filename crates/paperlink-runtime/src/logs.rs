//! Per-module log store.
//!
//! Holds the decoded log lines for each UI panel and the latest analysis
//! progress, and broadcasts every change so views can follow along.

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use paperlink_core::{AnalyzeProgress, LogEvent, LogEventSink, LogModule};
use serde::Serialize;
use tokio::sync::broadcast;

/// Capacity of the update broadcast channel.
const BROADCAST_CAPACITY: usize = 1000;

/// A change to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StoreUpdate {
    Appended {
        module: LogModule,
        message: String,
        received_at: DateTime<Utc>,
    },
    Cleared {
        module: LogModule,
    },
    Progress(AnalyzeProgress),
    ProgressCleared,
}

/// Lines for one module, oldest first.
#[derive(Debug, Default)]
struct LogBuffer {
    lines: VecDeque<String>,
}

impl LogBuffer {
    /// Add a line, evicting the oldest when over `capacity`.
    fn push(&mut self, line: String, capacity: Option<NonZeroUsize>) {
        if let Some(cap) = capacity {
            while self.lines.len() >= cap.get() {
                self.lines.pop_front();
            }
        }
        self.lines.push_back(line);
    }
}

/// In-memory log store keyed by [`LogModule`].
///
/// Unbounded by default; pass a capacity to keep only the newest lines per
/// module.
pub struct LogStore {
    buffers: RwLock<HashMap<LogModule, LogBuffer>>,
    progress: RwLock<Option<AnalyzeProgress>>,
    capacity: Option<NonZeroUsize>,
    broadcast_tx: broadcast::Sender<StoreUpdate>,
}

impl LogStore {
    pub fn new(capacity: Option<NonZeroUsize>) -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            buffers: RwLock::new(HashMap::new()),
            progress: RwLock::new(None),
            capacity,
            broadcast_tx,
        }
    }

    /// Append a line to `module` (sync, callable from any thread).
    pub fn append(&self, module: LogModule, message: impl Into<String>) {
        let message = message.into();
        {
            let mut buffers = self.buffers.write().unwrap_or_else(PoisonError::into_inner);
            buffers
                .entry(module)
                .or_default()
                .push(message.clone(), self.capacity);
        }

        // Ignore if no receivers
        let _ = self.broadcast_tx.send(StoreUpdate::Appended {
            module,
            message,
            received_at: Utc::now(),
        });
    }

    /// Remove every line of `module`. Other modules are untouched.
    pub fn clear(&self, module: LogModule) {
        {
            let mut buffers = self.buffers.write().unwrap_or_else(PoisonError::into_inner);
            buffers.remove(&module);
        }
        let _ = self.broadcast_tx.send(StoreUpdate::Cleared { module });
    }

    /// Lines of `module`, oldest first.
    pub fn snapshot(&self, module: LogModule) -> Vec<String> {
        let buffers = self.buffers.read().unwrap_or_else(PoisonError::into_inner);
        buffers
            .get(&module)
            .map(|b| b.lines.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, module: LogModule) -> usize {
        let buffers = self.buffers.read().unwrap_or_else(PoisonError::into_inner);
        buffers.get(&module).map_or(0, |b| b.lines.len())
    }

    pub fn is_empty(&self, module: LogModule) -> bool {
        self.len(module) == 0
    }

    /// Replace the latest progress.
    pub fn set_progress(&self, update: AnalyzeProgress) {
        *self.progress.write().unwrap_or_else(PoisonError::into_inner) = Some(update.clone());
        let _ = self.broadcast_tx.send(StoreUpdate::Progress(update));
    }

    pub fn progress(&self) -> Option<AnalyzeProgress> {
        self.progress
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_progress(&self) {
        *self.progress.write().unwrap_or_else(PoisonError::into_inner) = None;
        let _ = self.broadcast_tx.send(StoreUpdate::ProgressCleared);
    }

    /// Receiver for every subsequent change.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreUpdate> {
        self.broadcast_tx.subscribe()
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl LogEventSink for LogStore {
    fn deliver(&self, event: LogEvent) {
        self.append(event.module, event.message);
    }

    fn progress(&self, update: AnalyzeProgress) {
        self.set_progress(update);
    }
}
