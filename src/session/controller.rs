//! Session lifecycle: start, ingest, stop.
//!
//! The controller owns the sensor source, the classifier and the
//! collaborators. `start()` builds a fresh counting pipeline and hands it to
//! a single ingestion thread; `stop()` unsubscribes, joins that thread and
//! forwards the finished set. Samples are processed strictly in arrival order
//! and classification runs inline on the ingestion thread, so there is never
//! more than one window in flight.

use crate::config::{Config, ConfigError, CounterConfig};
use crate::core::counter::{RepCounter, WindowReport};
use crate::core::gate::Classifier;
use crate::core::reps::{RepEvent, RepState};
use crate::sensor::{Sample, SensorError, SensorSource};
use crate::session::events::{status, EventEmitter, SessionEvent};
use crate::session::notify::{
    CompletedSet, HapticKind, HapticSink, Notifier, NotifierHandle, SyncSink,
};
use crate::session::SessionError;
use crate::stats::{create_shared_stats, SharedSessionStats};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Capacity of the session event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// How long the ingestion thread waits for a sample before re-checking the
/// running flag.
const INGEST_POLL: Duration = Duration::from_millis(50);

/// Settings that may change while a session runs.
#[derive(Debug)]
pub struct SessionSettings {
    target_reps: AtomicU32,
    haptics_enabled: AtomicBool,
}

impl SessionSettings {
    pub fn new(target_reps: u32, haptics_enabled: bool) -> Self {
        Self {
            target_reps: AtomicU32::new(target_reps),
            haptics_enabled: AtomicBool::new(haptics_enabled),
        }
    }

    pub fn target_reps(&self) -> u32 {
        self.target_reps.load(Ordering::Relaxed)
    }

    pub fn haptics_enabled(&self) -> bool {
        self.haptics_enabled.load(Ordering::Relaxed)
    }
}

/// Live view of the counter, updated by the ingestion thread.
#[derive(Debug, Default)]
struct Progress {
    rep_count: AtomicU32,
    in_rep: AtomicU8,
}

impl Progress {
    fn update(&self, rep_count: u32, state: RepState) {
        self.rep_count.store(rep_count, Ordering::Relaxed);
        self.in_rep
            .store(u8::from(state == RepState::InRep), Ordering::Relaxed);
    }

    fn state(&self) -> RepState {
        if self.in_rep.load(Ordering::Relaxed) == 1 {
            RepState::InRep
        } else {
            RepState::Idle
        }
    }
}

/// Orchestrates one counting session at a time.
pub struct SessionController {
    config: CounterConfig,
    settings: Arc<SessionSettings>,
    classifier: Arc<dyn Classifier>,
    source: Box<dyn SensorSource>,
    notifier: Notifier,
    stats: SharedSessionStats,
    emitter: EventEmitter,
    events: Receiver<SessionEvent>,
    running: Arc<AtomicBool>,
    progress: Arc<Progress>,
    ingestion: Option<JoinHandle<u32>>,
}

impl SessionController {
    /// Create a controller. An invalid configuration is rejected here, never
    /// at runtime.
    pub fn new(
        config: &Config,
        classifier: Arc<dyn Classifier>,
        source: Box<dyn SensorSource>,
        haptics: Arc<dyn HapticSink>,
        sync: Arc<dyn SyncSink>,
    ) -> Result<Self, SessionError> {
        Self::with_stats(config, classifier, source, haptics, sync, create_shared_stats())
    }

    /// Create a controller that records into existing counters.
    pub fn with_stats(
        config: &Config,
        classifier: Arc<dyn Classifier>,
        source: Box<dyn SensorSource>,
        haptics: Arc<dyn HapticSink>,
        sync: Arc<dyn SyncSink>,
        stats: SharedSessionStats,
    ) -> Result<Self, SessionError> {
        config.validate()?;

        let (sender, events) = bounded(EVENT_QUEUE_CAPACITY);
        let emitter = EventEmitter::new(sender, Arc::clone(&stats));
        let notifier = Notifier::spawn(haptics, sync, Arc::clone(&stats));

        Ok(Self {
            config: config.counter.clone(),
            settings: Arc::new(SessionSettings::new(
                config.target_reps,
                config.haptics_enabled,
            )),
            classifier,
            source,
            notifier,
            stats,
            emitter,
            events,
            running: Arc::new(AtomicBool::new(false)),
            progress: Arc::new(Progress::default()),
            ingestion: None,
        })
    }

    /// Start a new session.
    ///
    /// Fails with [`SessionError::SensorUnavailable`] (and a status event)
    /// when the source cannot deliver samples, and with
    /// [`SessionError::AlreadyRunning`] when a session is in progress; in both
    /// cases no state changes.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }

        if !self.source.is_available() {
            self.emitter.status(status::SENSORS_UNAVAILABLE);
            return Err(SessionError::SensorUnavailable);
        }

        let counter = RepCounter::new(Arc::clone(&self.classifier), &self.config)?;

        let samples = match self.source.subscribe(self.config.sampling_rate_hz) {
            Ok(receiver) => receiver,
            Err(SensorError::Unavailable) => {
                self.emitter.status(status::SENSORS_UNAVAILABLE);
                return Err(SessionError::SensorUnavailable);
            }
            Err(e) => return Err(SessionError::Sensor(e)),
        };

        self.progress.update(0, RepState::Idle);
        self.running.store(true, Ordering::SeqCst);

        let worker = IngestionWorker {
            samples,
            running: Arc::clone(&self.running),
            settings: Arc::clone(&self.settings),
            progress: Arc::clone(&self.progress),
            stats: Arc::clone(&self.stats),
            emitter: self.emitter.clone(),
            notifier: self.notifier.handle(),
        };

        tracing::info!(
            window = self.config.window_size,
            overlap = self.config.overlap,
            target_reps = self.settings.target_reps(),
            "session started"
        );
        self.emitter.emit(SessionEvent::Started);
        self.emitter.status(status::STARTED);

        self.ingestion = Some(thread::spawn(move || worker.run(counter)));
        Ok(())
    }

    /// Stop the running session.
    ///
    /// Returns once ingestion has fully quiesced. A partially filled window is
    /// discarded. If any reps were counted, the finished set is forwarded to
    /// the sync collaborator exactly once and also returned. Calling this
    /// while no session runs does nothing.
    pub fn stop(&mut self) -> Option<CompletedSet> {
        let handle = self.ingestion.take()?;

        self.running.store(false, Ordering::SeqCst);
        self.source.unsubscribe();

        let rep_count = match handle.join() {
            Ok(count) => count,
            Err(_) => {
                tracing::error!("ingestion thread panicked");
                self.progress.rep_count.load(Ordering::Relaxed)
            }
        };

        tracing::info!(rep_count, "session stopped");
        self.emitter.emit(SessionEvent::Stopped { rep_count });
        self.emitter.status(status::READY);

        if rep_count == 0 {
            return None;
        }

        let set = CompletedSet::new(rep_count);
        self.notifier.completed_set(set.clone());
        Some(set)
    }

    pub fn is_running(&self) -> bool {
        self.ingestion.is_some()
    }

    /// Whether the running session's sensor stream has run dry.
    ///
    /// Unlike [`SessionEvent::StreamEnded`] this cannot be lost to a full
    /// event queue. The session still counts as running until `stop()`.
    pub fn stream_ended(&self) -> bool {
        self.ingestion
            .as_ref()
            .is_some_and(|handle| handle.is_finished())
    }

    /// Reps counted in the current (or last) session.
    pub fn rep_count(&self) -> u32 {
        self.progress.rep_count.load(Ordering::Relaxed)
    }

    pub fn rep_state(&self) -> RepState {
        self.progress.state()
    }

    /// Receiver for session events.
    pub fn events(&self) -> &Receiver<SessionEvent> {
        &self.events
    }

    pub fn stats(&self) -> &SharedSessionStats {
        &self.stats
    }

    pub fn target_reps(&self) -> u32 {
        self.settings.target_reps()
    }

    /// Change the target; takes effect for the next completed rep.
    pub fn set_target_reps(&self, target_reps: u32) -> Result<(), SessionError> {
        if target_reps == 0 {
            return Err(SessionError::Configuration(ConfigError::Invalid(
                "target_reps must be at least 1".to_string(),
            )));
        }
        self.settings
            .target_reps
            .store(target_reps, Ordering::Relaxed);
        Ok(())
    }

    pub fn set_haptics_enabled(&self, enabled: bool) {
        self.settings
            .haptics_enabled
            .store(enabled, Ordering::Relaxed);
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything the ingestion thread needs, moved onto it at start.
struct IngestionWorker {
    samples: Receiver<Sample>,
    running: Arc<AtomicBool>,
    settings: Arc<SessionSettings>,
    progress: Arc<Progress>,
    stats: SharedSessionStats,
    emitter: EventEmitter,
    notifier: Option<NotifierHandle>,
}

impl IngestionWorker {
    /// Consume samples until stopped or the stream ends. Returns the final
    /// rep count.
    fn run<C: Classifier>(self, mut counter: RepCounter<C>) -> u32 {
        while self.running.load(Ordering::SeqCst) {
            match self.samples.recv_timeout(INGEST_POLL) {
                Ok(sample) => {
                    // Samples still queued at stop() are discarded
                    if !self.running.load(Ordering::SeqCst) {
                        break;
                    }
                    self.stats.record_sample();

                    if let Some(report) = counter.push(sample, self.settings.target_reps()) {
                        self.handle_report(&report);
                        self.progress.update(counter.rep_count(), counter.state());
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    if self.running.load(Ordering::SeqCst) {
                        tracing::info!("sensor stream ended");
                        self.emitter.emit(SessionEvent::StreamEnded);
                    }
                    break;
                }
            }
        }

        counter.rep_count()
    }

    fn handle_report(&self, report: &WindowReport) {
        self.stats.record_window(&report.classification);

        if report.classification.is_failure() {
            self.emitter.status(status::PREDICTION_ERROR);
        }

        for event in &report.events {
            match *event {
                RepEvent::RepStarted => {
                    self.emitter.emit(SessionEvent::RepStarted);
                    self.emitter.status(status::IN_REP);
                }
                RepEvent::RepCompleted { count } => {
                    self.stats.record_rep();
                    tracing::info!(count, "rep completed");
                    self.emitter.emit(SessionEvent::RepCompleted { count });
                    self.emitter.status(status::DONE);
                    if self.settings.haptics_enabled() {
                        self.haptic(HapticKind::Rep);
                    }
                }
                RepEvent::GoalReached { count } => {
                    self.stats.record_goal();
                    tracing::info!(count, "goal reached");
                    self.emitter.emit(SessionEvent::GoalReached { count });
                    self.emitter.status(status::GOAL_REACHED);
                    self.haptic(HapticKind::Goal);
                }
            }
        }
    }

    fn haptic(&self, kind: HapticKind) {
        if let Some(notifier) = &self.notifier {
            notifier.haptic(kind);
        }
    }
}
