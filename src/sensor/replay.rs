//! Replay of recorded inertial samples.
//!
//! Plays back a recording (for example a CSV file produced by the data-capture
//! logger) through the same push interface a live motion sensor uses. Playback
//! happens on a background thread, either paced at the subscription rate or as
//! fast as the consumer drains the channel.

use crate::sensor::{Sample, SensorError, SensorSource, SAMPLE_CHANNEL_CAPACITY};
use crossbeam_channel::{bounded, Receiver, SendTimeoutError};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long a blocked send waits before re-checking the running flag.
const SEND_POLL: Duration = Duration::from_millis(20);

/// A sensor source backed by a recorded sample list.
pub struct ReplaySource {
    samples: Arc<[Sample]>,
    realtime: bool,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl ReplaySource {
    /// Create a replay source over `samples`.
    ///
    /// With `realtime` set, samples are released at the subscription rate;
    /// otherwise they are pushed as fast as the channel accepts them.
    pub fn new(samples: Vec<Sample>, realtime: bool) -> Self {
        Self {
            samples: samples.into(),
            realtime,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Load a recording in the logger's CSV format.
    ///
    /// The header row and blank lines are skipped; any other unparseable row is
    /// an error.
    pub fn from_csv_file(path: &Path, realtime: bool) -> Result<Self, SensorError> {
        let content = std::fs::read_to_string(path)?;
        let samples = parse_csv(&content)?;
        Ok(Self::new(samples, realtime))
    }

    /// Number of recorded samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Check if playback is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Parse the logger's CSV rows into samples.
pub fn parse_csv(content: &str) -> Result<Vec<Sample>, SensorError> {
    let mut samples = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("timestamp") {
            continue;
        }
        let sample =
            Sample::from_csv_line(trimmed).ok_or(SensorError::Parse { line: index + 1 })?;
        samples.push(sample);
    }
    Ok(samples)
}

impl SensorSource for ReplaySource {
    fn is_available(&self) -> bool {
        !self.samples.is_empty()
    }

    fn subscribe(&mut self, rate_hz: f64) -> Result<Receiver<Sample>, SensorError> {
        if !self.is_available() {
            return Err(SensorError::Unavailable);
        }
        if self.running.load(Ordering::SeqCst) || self.thread_handle.is_some() {
            return Err(SensorError::AlreadySubscribed);
        }

        let (sender, receiver) = bounded(SAMPLE_CHANNEL_CAPACITY);
        self.running.store(true, Ordering::SeqCst);

        let samples = Arc::clone(&self.samples);
        let running = Arc::clone(&self.running);
        // A rate too small to express as an interval plays back unpaced
        let interval = if self.realtime && rate_hz > 0.0 {
            Duration::try_from_secs_f64(1.0 / rate_hz).ok()
        } else {
            None
        };

        let handle = thread::spawn(move || {
            let started = Instant::now();
            'samples: for (index, sample) in samples.iter().enumerate() {
                if let Some(interval) = interval {
                    let due = started + interval * index as u32;
                    let now = Instant::now();
                    if due > now {
                        thread::sleep(due - now);
                    }
                }

                let mut pending = *sample;
                loop {
                    if !running.load(Ordering::SeqCst) {
                        break 'samples;
                    }
                    match sender.send_timeout(pending, SEND_POLL) {
                        Ok(()) => break,
                        Err(SendTimeoutError::Timeout(sample)) => pending = sample,
                        Err(SendTimeoutError::Disconnected(_)) => break 'samples,
                    }
                }
            }
            tracing::debug!(samples = samples.len(), "replay finished");
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        Ok(receiver)
    }

    fn unsubscribe(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            // The thread exits within one send poll once running is false
            let _ = handle.join();
        }
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::CSV_HEADER;

    fn ramp(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| Sample::new([i as f64, 0.0, 0.0], [0.0; 3]))
            .collect()
    }

    #[test]
    fn test_replay_delivers_all_samples_in_order() {
        let mut source = ReplaySource::new(ramp(250), false);
        let receiver = source.subscribe(50.0).unwrap();

        let received: Vec<Sample> = receiver.iter().collect();
        assert_eq!(received.len(), 250);
        assert!(received
            .iter()
            .enumerate()
            .all(|(i, s)| s.accel[0] == i as f64));

        source.unsubscribe();
        assert!(!source.is_running());
    }

    #[test]
    fn test_unrepresentable_rate_plays_unpaced() {
        let mut source = ReplaySource::new(ramp(50), true);
        let receiver = source.subscribe(f64::MIN_POSITIVE / 4.0).unwrap();
        assert_eq!(receiver.iter().count(), 50);
        source.unsubscribe();
    }

    #[test]
    fn test_empty_replay_is_unavailable() {
        let mut source = ReplaySource::new(Vec::new(), false);
        assert!(!source.is_available());
        assert!(matches!(
            source.subscribe(50.0),
            Err(SensorError::Unavailable)
        ));
    }

    #[test]
    fn test_double_subscribe_rejected() {
        let mut source = ReplaySource::new(ramp(1_000), false);
        let _receiver = source.subscribe(50.0).unwrap();
        assert!(matches!(
            source.subscribe(50.0),
            Err(SensorError::AlreadySubscribed)
        ));
        source.unsubscribe();
    }

    #[test]
    fn test_unsubscribe_stops_blocked_playback() {
        let mut source = ReplaySource::new(ramp(10_000), false);
        let receiver = source.subscribe(50.0).unwrap();

        // Nobody drains the channel, so playback is blocked on a full queue.
        source.unsubscribe();
        assert!(!source.is_running());

        let drained = receiver.iter().count();
        assert!(drained <= SAMPLE_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_parse_csv_with_header() {
        let content = format!("{CSV_HEADER}\n0.00,1,2,3,4,5,6\n0.02,1,2,3,4,5,6\n\n");
        let samples = parse_csv(&content).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].gyro, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_parse_csv_reports_bad_line() {
        let content = format!("{CSV_HEADER}\n0.00,1,2,3,4,5,6\nbroken\n");
        match parse_csv(&content) {
            Err(SensorError::Parse { line }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
