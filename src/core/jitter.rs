//! Majority-vote debouncing of gated labels.
//!
//! Single-window misclassifications are common at window boundaries. The
//! filter keeps the last `history_size` gated labels and reports `Target` only
//! while at least `threshold` of them agree.

use crate::config::CounterConfig;
use crate::core::gate::BinaryLabel;
use std::collections::VecDeque;

/// Rolling label history with a confirmation threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JitterFilter {
    history: VecDeque<BinaryLabel>,
    capacity: usize,
    threshold: usize,
}

impl JitterFilter {
    pub fn new(capacity: usize, threshold: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            threshold,
        }
    }

    pub fn from_config(config: &CounterConfig) -> Self {
        Self::new(config.history_size, config.confirmation_threshold)
    }

    /// Pure transition: consume the filter and a label, return the next filter
    /// and the debounced label.
    pub fn step(mut self, label: BinaryLabel) -> (Self, BinaryLabel) {
        let smoothed = self.filter(label);
        (self, smoothed)
    }

    /// Record `label` and return the debounced label.
    pub fn filter(&mut self, label: BinaryLabel) -> BinaryLabel {
        self.history.push_back(label);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
        self.current()
    }

    /// Debounced label for the current history.
    pub fn current(&self) -> BinaryLabel {
        if self.target_count() >= self.threshold {
            BinaryLabel::Target
        } else {
            BinaryLabel::Other
        }
    }

    /// Number of `Target` labels in the history.
    pub fn target_count(&self) -> usize {
        self.history.iter().filter(|l| l.is_target()).count()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}
