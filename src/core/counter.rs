//! Per-session counting pipeline.
//!
//! Wires the stages together in stream order:
//! sample -> sliding window -> classification gate -> jitter filter -> rep
//! state machine. A [`RepCounter`] is created fresh for every session, which
//! is how all four stages are reset together.

use crate::config::{ConfigError, CounterConfig};
use crate::core::gate::{BinaryLabel, Classification, ClassificationGate, Classifier};
use crate::core::jitter::JitterFilter;
use crate::core::reps::{RepEvent, RepState, RepStateMachine};
use crate::core::window::SlidingWindowBuffer;
use crate::sensor::Sample;

/// What happened when a sample completed a window.
#[derive(Debug, Clone)]
pub struct WindowReport {
    /// Gated classifier result for the window
    pub classification: Classification,
    /// Label after majority debouncing
    pub smoothed: BinaryLabel,
    /// State machine events, in emission order
    pub events: Vec<RepEvent>,
}

/// The full pipeline for one session.
pub struct RepCounter<C> {
    buffer: SlidingWindowBuffer,
    gate: ClassificationGate<C>,
    filter: JitterFilter,
    machine: RepStateMachine,
}

impl<C: Classifier> RepCounter<C> {
    /// Build a pipeline, rejecting an invalid configuration up front.
    pub fn new(classifier: C, config: &CounterConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            buffer: SlidingWindowBuffer::from_config(config)?,
            gate: ClassificationGate::from_config(classifier, config),
            filter: JitterFilter::from_config(config),
            machine: RepStateMachine::new(),
        })
    }

    /// Ingest one sample. Returns a report when the sample completed a window.
    ///
    /// A window whose classification failed is reported but leaves the label
    /// history and rep state untouched.
    pub fn push(&mut self, sample: Sample, target_reps: u32) -> Option<WindowReport> {
        let gate = &self.gate;
        let classification = self.buffer.push(sample, |window| gate.classify(&window))?;

        if classification.is_failure() {
            return Some(WindowReport {
                smoothed: self.filter.current(),
                classification,
                events: Vec::new(),
            });
        }

        let smoothed = self.filter.filter(classification.label);
        let events = self.machine.advance(smoothed, target_reps);

        Some(WindowReport {
            classification,
            smoothed,
            events,
        })
    }

    /// Return every stage to its initial state.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.filter.reset();
        self.machine.reset();
    }

    pub fn rep_count(&self) -> u32 {
        self.machine.rep_count()
    }

    pub fn state(&self) -> RepState {
        self.machine.state()
    }

    pub fn buffer(&self) -> &SlidingWindowBuffer {
        &self.buffer
    }

    pub fn filter(&self) -> &JitterFilter {
        &self.filter
    }
}
