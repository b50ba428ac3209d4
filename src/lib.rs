//! Rep Counter - exercise repetition counting from streaming inertial data.
//!
//! This library turns a continuous 6-axis motion stream into a stable rep
//! count. A windowed activity classifier labels the stream every half second;
//! confidence gating and majority debouncing remove noisy predictions, and a
//! two-state machine counts one rep per sustained activation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Rep Counter                            │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐       │
//! │  │  Sensor  │──▶│  Window  │──▶│   Gate   │──▶│  Jitter  │       │
//! │  │ (50 Hz)  │   │ (100/25) │   │ (p≥0.5)  │   │  (3/5)   │       │
//! │  └──────────┘   └──────────┘   └──────────┘   └──────────┘       │
//! │                                                     │            │
//! │                                                     ▼            │
//! │  ┌──────────┐                ┌──────────┐   ┌──────────┐         │
//! │  │  Sinks   │◀───────────────│ Session  │◀──│   Reps   │         │
//! │  │(haptic,  │                │controller│   │Idle/InRep│         │
//! │  │  sync)   │                └──────────┘   └──────────┘         │
//! │  └──────────┘                                                    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use rep_counter::{Config, MotionEnergyClassifier, NullSink, ReplaySource, SessionController};
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let classifier = Arc::new(MotionEnergyClassifier::from_config(&config.counter));
//! let source = ReplaySource::from_csv_file("curls.csv".as_ref(), true).unwrap();
//!
//! let mut session = SessionController::new(
//!     &config,
//!     classifier,
//!     Box::new(source),
//!     Arc::new(NullSink),
//!     Arc::new(NullSink),
//! )
//! .unwrap();
//!
//! session.start().unwrap();
//! // Events can be received from session.events()
//! ```

pub mod config;
pub mod core;
pub mod sensor;
pub mod session;
pub mod stats;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, CounterConfig};
pub use core::{
    BinaryLabel, ClassificationGate, Classifier, ClassifierError, ClassifierOutput, JitterFilter,
    MotionEnergyClassifier, RepCounter, RepState, RepStateMachine, SlidingWindowBuffer, Window,
};
pub use sensor::{NoopSource, ReplaySource, Sample, SensorError, SensorSource};
pub use session::{
    CompletedSet, HapticKind, HapticSink, NullSink, SessionController, SessionError,
    SessionEvent, SinkError, SyncSink,
};
pub use stats::{SessionStats, SharedSessionStats, StatsSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
