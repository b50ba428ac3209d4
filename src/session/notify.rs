//! Fire-and-forget delivery to haptic and sync collaborators.
//!
//! Sinks are called from a dedicated worker thread fed through a bounded
//! queue, so a slow or unreachable sink never stalls sample ingestion. A full
//! queue drops the notification. Sink failures are logged and counted, never
//! retried, and never roll back the local rep count.

use crate::stats::SharedSessionStats;
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use uuid::Uuid;

/// Capacity of the notification queue.
pub const NOTIFY_QUEUE_CAPACITY: usize = 64;

/// Kind of haptic feedback to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HapticKind {
    /// A single rep finished
    Rep,
    /// The target rep count was reached
    Goal,
}

/// A finished set, as handed to the sync collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSet {
    pub id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub rep_count: u32,
}

impl CompletedSet {
    pub fn new(rep_count: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            completed_at: Utc::now(),
            rep_count,
        }
    }
}

/// Errors a sink may report.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Peer unreachable: {0}")]
    Unreachable(String),
    #[error("Sink rejected message: {0}")]
    Rejected(String),
}

/// Plays haptic or notification feedback on the device.
pub trait HapticSink: Send + Sync {
    fn trigger(&self, kind: HapticKind) -> Result<(), SinkError>;
}

/// Forwards a completed set to a paired device.
pub trait SyncSink: Send + Sync {
    fn notify_completed_set(&self, set: &CompletedSet) -> Result<(), SinkError>;
}

/// A sink that accepts and discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl HapticSink for NullSink {
    fn trigger(&self, _kind: HapticKind) -> Result<(), SinkError> {
        Ok(())
    }
}

impl SyncSink for NullSink {
    fn notify_completed_set(&self, _set: &CompletedSet) -> Result<(), SinkError> {
        Ok(())
    }
}

#[derive(Debug)]
enum Notification {
    Haptic(HapticKind),
    CompletedSet(CompletedSet),
}

/// Cloneable enqueue side of the notifier.
#[derive(Debug, Clone)]
pub struct NotifierHandle {
    sender: Sender<Notification>,
    stats: SharedSessionStats,
}

impl NotifierHandle {
    pub fn haptic(&self, kind: HapticKind) {
        self.enqueue(Notification::Haptic(kind));
    }

    pub fn completed_set(&self, set: CompletedSet) {
        self.enqueue(Notification::CompletedSet(set));
    }

    fn enqueue(&self, notification: Notification) {
        match self.sender.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(notification)) => {
                self.stats.record_dropped();
                tracing::warn!(?notification, "notification queue full, dropping");
            }
            Err(TrySendError::Disconnected(notification)) => {
                self.stats.record_dropped();
                tracing::warn!(?notification, "notifier shut down, dropping");
            }
        }
    }
}

/// Owns the worker thread that calls the sinks.
pub struct Notifier {
    handle: Option<NotifierHandle>,
    worker: Option<JoinHandle<()>>,
}

impl Notifier {
    /// Start the worker thread.
    pub fn spawn(
        haptics: Arc<dyn HapticSink>,
        sync: Arc<dyn SyncSink>,
        stats: SharedSessionStats,
    ) -> Self {
        let (sender, receiver) = bounded::<Notification>(NOTIFY_QUEUE_CAPACITY);
        let worker_stats = Arc::clone(&stats);

        let worker = thread::spawn(move || {
            for notification in receiver.iter() {
                let result = match &notification {
                    Notification::Haptic(kind) => haptics.trigger(*kind),
                    Notification::CompletedSet(set) => sync.notify_completed_set(set),
                };

                match (result, &notification) {
                    (Ok(()), Notification::CompletedSet(set)) => {
                        worker_stats.record_set_synced();
                        tracing::info!(reps = set.rep_count, id = %set.id, "completed set sent");
                    }
                    (Ok(()), Notification::Haptic(_)) => {}
                    (Err(e), _) => {
                        worker_stats.record_sink_failure();
                        tracing::warn!(?notification, "sink failed: {e}");
                    }
                }
            }
        });

        Self {
            handle: Some(NotifierHandle { sender, stats }),
            worker: Some(worker),
        }
    }

    /// A handle for enqueueing from other threads; `None` after shutdown.
    pub fn handle(&self) -> Option<NotifierHandle> {
        self.handle.clone()
    }

    pub fn haptic(&self, kind: HapticKind) {
        if let Some(handle) = &self.handle {
            handle.haptic(kind);
        }
    }

    pub fn completed_set(&self, set: CompletedSet) {
        if let Some(handle) = &self.handle {
            handle.completed_set(set);
        }
    }

    /// Deliver everything queued so far and stop the worker.
    ///
    /// Blocks until outstanding handles are dropped and the queue is drained.
    pub fn shutdown(&mut self) {
        self.handle.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.shutdown();
    }
}
