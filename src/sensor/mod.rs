//! Sensor sources for the rep counter.
//!
//! A source pushes fixed-rate 6-axis samples into a bounded channel once
//! subscribed. The counting core only ever sees the receiving end.

pub mod noop;
pub mod replay;
pub mod types;

use crossbeam_channel::Receiver;
use thiserror::Error;

pub use noop::NoopSource;
pub use replay::ReplaySource;
pub use types::{Sample, CHANNELS, CSV_HEADER};

/// Capacity of the channel between a source and the ingestion thread.
///
/// Two seconds of samples at 50 Hz, enough to absorb a slow classification
/// without dropping input.
pub const SAMPLE_CHANNEL_CAPACITY: usize = 100;

/// A push source of inertial samples.
pub trait SensorSource: Send {
    /// Whether the underlying hardware (or recording) can deliver samples.
    fn is_available(&self) -> bool;

    /// Begin delivering samples at `rate_hz`.
    ///
    /// The returned receiver disconnects once the source is unsubscribed or
    /// runs out of data.
    fn subscribe(&mut self, rate_hz: f64) -> Result<Receiver<Sample>, SensorError>;

    /// Stop delivering samples. No sample is sent after this returns.
    fn unsubscribe(&mut self);
}

/// Errors raised by sensor sources.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("Motion sensors are not available")]
    Unavailable,
    #[error("Sensor source is already subscribed")]
    AlreadySubscribed,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed sample at line {line}")]
    Parse { line: usize },
}
