//! Session counters for the rep counter.
//!
//! Tracks how much input was processed and how the pipeline behaved
//! (windows gated, classifier failures, sink failures) without retaining any
//! raw sensor data. Counters can be persisted so they accumulate across runs.

use crate::core::gate::{Classification, GateOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Atomic counters shared between the controller, the ingestion thread and
/// the notification worker.
#[derive(Debug)]
pub struct SessionStats {
    samples_ingested: AtomicU64,
    windows_classified: AtomicU64,
    windows_gated: AtomicU64,
    classifier_errors: AtomicU64,
    reps_completed: AtomicU64,
    goals_reached: AtomicU64,
    sets_synced: AtomicU64,
    sink_failures: AtomicU64,
    dropped_messages: AtomicU64,
    started_at: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            samples_ingested: AtomicU64::new(0),
            windows_classified: AtomicU64::new(0),
            windows_gated: AtomicU64::new(0),
            classifier_errors: AtomicU64::new(0),
            reps_completed: AtomicU64::new(0),
            goals_reached: AtomicU64::new(0),
            sets_synced: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            dropped_messages: AtomicU64::new(0),
            started_at: Utc::now(),
            persist_path: None,
        }
    }

    /// Create counters that load from and save to `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(path);

        if let Err(e) = stats.load() {
            tracing::warn!("Could not load previous statistics: {e}");
        }

        stats
    }

    pub fn record_sample(&self) {
        self.samples_ingested.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one classified window and how the gate treated it.
    pub fn record_window(&self, classification: &Classification) {
        self.windows_classified.fetch_add(1, Ordering::Relaxed);
        match classification.outcome {
            GateOutcome::Accepted => {}
            GateOutcome::LowConfidence(_) | GateOutcome::MissingConfidence => {
                self.windows_gated.fetch_add(1, Ordering::Relaxed);
            }
            GateOutcome::Failed(_) => {
                self.classifier_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_rep(&self) {
        self.reps_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_goal(&self) {
        self.goals_reached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_set_synced(&self) {
        self.sets_synced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// An event or notification was dropped because its queue was full.
    pub fn record_dropped(&self) {
        self.dropped_messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            samples_ingested: self.samples_ingested.load(Ordering::Relaxed),
            windows_classified: self.windows_classified.load(Ordering::Relaxed),
            windows_gated: self.windows_gated.load(Ordering::Relaxed),
            classifier_errors: self.classifier_errors.load(Ordering::Relaxed),
            reps_completed: self.reps_completed.load(Ordering::Relaxed),
            goals_reached: self.goals_reached.load(Ordering::Relaxed),
            sets_synced: self.sets_synced.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            dropped_messages: self.dropped_messages.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Session Statistics:\n\
             - Samples ingested: {}\n\
             - Windows classified: {}\n\
             - Windows gated (low confidence): {}\n\
             - Classifier errors: {}\n\
             - Reps completed: {}\n\
             - Goals reached: {}\n\
             - Sets synced: {}\n\
             - Sink failures: {}\n\
             - Dropped messages: {}",
            stats.samples_ingested,
            stats.windows_classified,
            stats.windows_gated,
            stats.classifier_errors,
            stats.reps_completed,
            stats.goals_reached,
            stats.sets_synced,
            stats.sink_failures,
            stats.dropped_messages,
        )
    }

    /// Save counters to disk, if persistence is configured.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(ref path) = self.persist_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let stats = self.snapshot();
        let persisted = PersistedStats {
            samples_ingested: stats.samples_ingested,
            windows_classified: stats.windows_classified,
            windows_gated: stats.windows_gated,
            classifier_errors: stats.classifier_errors,
            reps_completed: stats.reps_completed,
            goals_reached: stats.goals_reached,
            sets_synced: stats.sets_synced,
            sink_failures: stats.sink_failures,
            dropped_messages: stats.dropped_messages,
            last_updated: Utc::now(),
        };

        let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        let Some(ref path) = self.persist_path else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(path)?;
        let persisted: PersistedStats =
            serde_json::from_str(&content).map_err(std::io::Error::other)?;

        self.samples_ingested
            .store(persisted.samples_ingested, Ordering::Relaxed);
        self.windows_classified
            .store(persisted.windows_classified, Ordering::Relaxed);
        self.windows_gated
            .store(persisted.windows_gated, Ordering::Relaxed);
        self.classifier_errors
            .store(persisted.classifier_errors, Ordering::Relaxed);
        self.reps_completed
            .store(persisted.reps_completed, Ordering::Relaxed);
        self.goals_reached
            .store(persisted.goals_reached, Ordering::Relaxed);
        self.sets_synced.store(persisted.sets_synced, Ordering::Relaxed);
        self.sink_failures
            .store(persisted.sink_failures, Ordering::Relaxed);
        self.dropped_messages
            .store(persisted.dropped_messages, Ordering::Relaxed);
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in [
            &self.samples_ingested,
            &self.windows_classified,
            &self.windows_gated,
            &self.classifier_errors,
            &self.reps_completed,
            &self.goals_reached,
            &self.sets_synced,
            &self.sink_failures,
            &self.dropped_messages,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub samples_ingested: u64,
    pub windows_classified: u64,
    pub windows_gated: u64,
    pub classifier_errors: u64,
    pub reps_completed: u64,
    pub goals_reached: u64,
    pub sets_synced: u64,
    pub sink_failures: u64,
    pub dropped_messages: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    samples_ingested: u64,
    windows_classified: u64,
    windows_gated: u64,
    classifier_errors: u64,
    reps_completed: u64,
    goals_reached: u64,
    sets_synced: u64,
    sink_failures: u64,
    dropped_messages: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared counters.
pub type SharedSessionStats = Arc<SessionStats>;

pub fn create_shared_stats() -> SharedSessionStats {
    Arc::new(SessionStats::new())
}

pub fn create_shared_stats_with_persistence(path: PathBuf) -> SharedSessionStats {
    Arc::new(SessionStats::with_persistence(path))
}
