//! Core counting pipeline.
//!
//! This module contains:
//! - The overlap-preserving sliding window over sensor samples
//! - Classifier invocation and confidence gating
//! - Majority-vote jitter filtering of gated labels
//! - The two-state rep machine
//! - A reference classifier and the per-session composition of all stages

pub mod classifier;
pub mod counter;
pub mod gate;
pub mod jitter;
pub mod reps;
pub mod window;

// Re-export commonly used types
pub use classifier::{MotionEnergyClassifier, OTHER_LABEL};
pub use counter::{RepCounter, WindowReport};
pub use gate::{
    gate, AuxState, BinaryLabel, Classification, ClassificationGate, Classifier,
    ClassifierError, ClassifierOutput, GateOutcome, GatePolicy,
};
pub use jitter::JitterFilter;
pub use reps::{RepEvent, RepState, RepStateMachine};
pub use window::{SlidingWindowBuffer, Window};
