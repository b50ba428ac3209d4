//! Discrete events the session publishes to its consumer.

use crate::stats::SharedSessionStats;
use crossbeam_channel::{Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Status strings shown to the user.
pub mod status {
    pub const READY: &str = "Ready";
    pub const STARTED: &str = "Started!";
    pub const IN_REP: &str = "In Rep...";
    pub const DONE: &str = "Done!";
    pub const GOAL_REACHED: &str = "Goal Reached!";
    pub const PREDICTION_ERROR: &str = "Prediction Error";
    pub const SENSORS_UNAVAILABLE: &str = "Sensors not available";
}

/// A state change of the running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Ingestion began
    Started,
    /// A rep began (debounced signal rose)
    RepStarted,
    /// A rep finished; `count` is the session total
    RepCompleted { count: u32 },
    /// The session total reached the target
    GoalReached { count: u32 },
    /// User-visible status text changed
    StatusChanged { message: String },
    /// The sensor stream ended without `stop()` being called
    StreamEnded,
    /// Ingestion halted
    Stopped { rep_count: u32 },
}

/// Non-blocking publisher of session events.
///
/// A consumer that falls behind loses events rather than stalling ingestion.
/// Status changes are published only when the text differs from the last one
/// sent, so a run of failing windows cannot flood the queue.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    sender: Sender<SessionEvent>,
    stats: SharedSessionStats,
    last_status: Arc<Mutex<Option<String>>>,
}

impl EventEmitter {
    pub fn new(sender: Sender<SessionEvent>, stats: SharedSessionStats) -> Self {
        Self {
            sender,
            stats,
            last_status: Arc::new(Mutex::new(None)),
        }
    }

    pub fn emit(&self, event: SessionEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.stats.record_dropped();
                tracing::warn!(?event, "event queue full, dropping event");
            }
            // Nobody is listening
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Publish a status message unless it repeats the current one.
    pub fn status(&self, message: &str) {
        {
            let mut last = self
                .last_status
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if last.as_deref() == Some(message) {
                return;
            }
            *last = Some(message.to_string());
        }
        self.emit(SessionEvent::StatusChanged {
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::create_shared_stats;
    use crossbeam_channel::bounded;

    #[test]
    fn test_full_queue_drops_and_counts() {
        let (sender, receiver) = bounded(1);
        let stats = create_shared_stats();
        let emitter = EventEmitter::new(sender, stats.clone());

        emitter.emit(SessionEvent::Started);
        emitter.status(status::READY);

        assert_eq!(receiver.try_recv().unwrap(), SessionEvent::Started);
        assert!(receiver.try_recv().is_err());
        assert_eq!(stats.snapshot().dropped_messages, 1);
    }

    #[test]
    fn test_repeated_status_published_once() {
        let (sender, receiver) = bounded(8);
        let emitter = EventEmitter::new(sender, create_shared_stats());
        let worker_side = emitter.clone();

        emitter.status(status::PREDICTION_ERROR);
        worker_side.status(status::PREDICTION_ERROR);
        worker_side.status(status::PREDICTION_ERROR);
        emitter.status(status::READY);
        emitter.status(status::PREDICTION_ERROR);

        let messages: Vec<SessionEvent> = receiver.try_iter().collect();
        assert_eq!(
            messages,
            vec![
                SessionEvent::StatusChanged {
                    message: status::PREDICTION_ERROR.to_string()
                },
                SessionEvent::StatusChanged {
                    message: status::READY.to_string()
                },
                SessionEvent::StatusChanged {
                    message: status::PREDICTION_ERROR.to_string()
                },
            ]
        );
    }

    #[test]
    fn test_disconnected_consumer_is_ignored() {
        let (sender, receiver) = bounded(1);
        drop(receiver);
        let stats = create_shared_stats();
        EventEmitter::new(sender, stats.clone()).emit(SessionEvent::Started);
        assert_eq!(stats.snapshot().dropped_messages, 0);
    }
}
