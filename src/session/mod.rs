//! Session orchestration for the rep counter.
//!
//! This module contains:
//! - The session controller and its ingestion thread
//! - Session events and user-visible status strings
//! - Fire-and-forget delivery to haptic and sync collaborators

pub mod controller;
pub mod events;
pub mod notify;

use crate::config::ConfigError;
use crate::sensor::SensorError;
use thiserror::Error;

// Re-export commonly used types
pub use controller::{SessionController, SessionSettings, EVENT_QUEUE_CAPACITY};
pub use events::{status, EventEmitter, SessionEvent};
pub use notify::{
    CompletedSet, HapticKind, HapticSink, Notifier, NotifierHandle, NullSink, SinkError, SyncSink,
};

/// Errors surfaced by the session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Sensors not available")]
    SensorUnavailable,
    #[error("Session is already running")]
    AlreadyRunning,
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error("Sensor error: {0}")]
    Sensor(#[source] SensorError),
}
