//! Classifier invocation and confidence gating.
//!
//! The activity classifier is an opaque, stateless function from a window to a
//! label plus per-label confidences. The gate reduces its output to a
//! [`BinaryLabel`]: anything that is not a confident prediction of the target
//! exercise becomes [`BinaryLabel::Other`], including classifier failures.

use crate::config::CounterConfig;
use crate::core::window::Window;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Gated classification result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryLabel {
    /// Confident prediction of the tracked exercise
    Target,
    /// Anything else
    Other,
}

impl BinaryLabel {
    pub fn is_target(self) -> bool {
        self == BinaryLabel::Target
    }
}

/// Raw classifier prediction for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierOutput {
    /// Top label chosen by the classifier
    pub label: String,
    /// Confidence per known label, in [0, 1]
    pub probabilities: HashMap<String, f64>,
}

impl ClassifierOutput {
    pub fn new(label: impl Into<String>, probabilities: HashMap<String, f64>) -> Self {
        Self {
            label: label.into(),
            probabilities,
        }
    }

    /// Confidence reported for the top label itself, if present.
    pub fn confidence(&self) -> Option<f64> {
        self.probabilities.get(&self.label).copied()
    }
}

/// Auxiliary input the classifier receives unchanged on every call.
///
/// Some model exports carry a recurrent state input; the counter treats the
/// model as stateless and always supplies the same zeroed vector.
#[derive(Debug, Clone, PartialEq)]
pub struct AuxState(Arc<[f64]>);

impl AuxState {
    /// A zero-filled state of `len` values.
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len].into())
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Errors a classifier may report for a window.
#[derive(Debug, Clone, Error)]
pub enum ClassifierError {
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Input shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

/// An activity classifier over sensor windows.
///
/// Implementations must be pure with respect to the window: the same window
/// and auxiliary state always give the same output.
pub trait Classifier: Send + Sync {
    fn predict(&self, window: &Window<'_>, aux: &AuxState)
        -> Result<ClassifierOutput, ClassifierError>;
}

impl<C: Classifier + ?Sized> Classifier for Arc<C> {
    fn predict(
        &self,
        window: &Window<'_>,
        aux: &AuxState,
    ) -> Result<ClassifierOutput, ClassifierError> {
        (**self).predict(window, aux)
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn predict(
        &self,
        window: &Window<'_>,
        aux: &AuxState,
    ) -> Result<ClassifierOutput, ClassifierError> {
        (**self).predict(window, aux)
    }
}

/// Thresholds applied to a classifier output.
#[derive(Debug, Clone, PartialEq)]
pub struct GatePolicy {
    pub target_label: String,
    pub confidence_threshold: f64,
}

impl GatePolicy {
    pub fn new(target_label: impl Into<String>, confidence_threshold: f64) -> Self {
        Self {
            target_label: target_label.into(),
            confidence_threshold,
        }
    }

    pub fn from_config(config: &CounterConfig) -> Self {
        Self::new(config.target_label.clone(), config.confidence_threshold)
    }
}

/// Why the gate produced its label.
#[derive(Debug, Clone)]
pub enum GateOutcome {
    /// Top label was confident; the label reflects whether it is the target
    Accepted,
    /// Top label confidence was below the threshold
    LowConfidence(f64),
    /// Top label had no entry in the confidence map
    MissingConfidence,
    /// The classifier returned an error
    Failed(ClassifierError),
}

/// Result of gating one window.
#[derive(Debug, Clone)]
pub struct Classification {
    pub label: BinaryLabel,
    pub outcome: GateOutcome,
}

impl Classification {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, GateOutcome::Failed(_))
    }
}

/// Reduce a classifier output to a binary label.
///
/// Only the top label's own confidence is considered: a missing,
/// sub-threshold or NaN value yields `Other` even if another label is
/// confident.
pub fn gate(output: &ClassifierOutput, policy: &GatePolicy) -> Classification {
    let outcome = match output.confidence() {
        None => GateOutcome::MissingConfidence,
        Some(c) if c.is_nan() || c < policy.confidence_threshold => {
            GateOutcome::LowConfidence(c)
        }
        Some(_) => GateOutcome::Accepted,
    };

    let label = match outcome {
        GateOutcome::Accepted if output.label == policy.target_label => BinaryLabel::Target,
        _ => BinaryLabel::Other,
    };

    Classification { label, outcome }
}

/// Runs the classifier on completed windows and gates the result.
pub struct ClassificationGate<C> {
    classifier: C,
    aux: AuxState,
    policy: GatePolicy,
}

impl<C: Classifier> ClassificationGate<C> {
    pub fn new(classifier: C, aux: AuxState, policy: GatePolicy) -> Self {
        Self {
            classifier,
            aux,
            policy,
        }
    }

    pub fn from_config(classifier: C, config: &CounterConfig) -> Self {
        Self::new(
            classifier,
            AuxState::zeros(config.aux_state_len),
            GatePolicy::from_config(config),
        )
    }

    /// Classify one window. Classifier errors become `Other`.
    pub fn classify(&self, window: &Window<'_>) -> Classification {
        match self.classifier.predict(window, &self.aux) {
            Ok(output) => {
                let classification = gate(&output, &self.policy);
                tracing::debug!(
                    label = %output.label,
                    confidence = ?output.confidence(),
                    gated = ?classification.label,
                    "window classified"
                );
                classification
            }
            Err(e) => {
                tracing::warn!("Prediction error: {e}");
                Classification {
                    label: BinaryLabel::Other,
                    outcome: GateOutcome::Failed(e),
                }
            }
        }
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<ClassifierOutput, ClassifierError>);

    impl Classifier for Fixed {
        fn predict(
            &self,
            _window: &Window<'_>,
            _aux: &AuxState,
        ) -> Result<ClassifierOutput, ClassifierError> {
            self.0.clone()
        }
    }

    fn output(label: &str, probs: &[(&str, f64)]) -> ClassifierOutput {
        ClassifierOutput::new(
            label,
            probs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        )
    }

    fn policy() -> GatePolicy {
        GatePolicy::new("target", 0.50)
    }

    #[test]
    fn test_confident_target_passes() {
        let result = gate(&output("target", &[("target", 0.8), ("other", 0.2)]), &policy());
        assert_eq!(result.label, BinaryLabel::Target);
        assert!(matches!(result.outcome, GateOutcome::Accepted));
    }

    #[test]
    fn test_low_confidence_target_gated() {
        let result = gate(&output("target", &[("target", 0.40), ("other", 0.35)]), &policy());
        assert_eq!(result.label, BinaryLabel::Other);
        assert!(matches!(result.outcome, GateOutcome::LowConfidence(c) if (c - 0.40).abs() < 1e-9));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let result = gate(&output("target", &[("target", 0.50), ("other", 0.50)]), &policy());
        assert_eq!(result.label, BinaryLabel::Target);
    }

    #[test]
    fn test_nan_confidence_gated() {
        let result = gate(&output("target", &[("target", f64::NAN)]), &policy());
        assert_eq!(result.label, BinaryLabel::Other);
        assert!(matches!(result.outcome, GateOutcome::LowConfidence(c) if c.is_nan()));
    }

    #[test]
    fn test_missing_confidence_gated() {
        let result = gate(&output("target", &[("other", 0.9)]), &policy());
        assert_eq!(result.label, BinaryLabel::Other);
        assert!(matches!(result.outcome, GateOutcome::MissingConfidence));
    }

    #[test]
    fn test_confident_non_target_is_other() {
        let result = gate(&output("walking", &[("walking", 0.9), ("target", 0.1)]), &policy());
        assert_eq!(result.label, BinaryLabel::Other);
        assert!(matches!(result.outcome, GateOutcome::Accepted));
    }

    #[test]
    fn test_other_label_confidence_ignored() {
        // A confident target that is not the top label does not count.
        let result = gate(&output("walking", &[("walking", 0.3), ("target", 0.7)]), &policy());
        assert_eq!(result.label, BinaryLabel::Other);
    }

    #[test]
    fn test_classifier_error_becomes_other() {
        let gate = ClassificationGate::new(
            Fixed(Err(ClassifierError::Inference("boom".to_string()))),
            AuxState::zeros(4),
            policy(),
        );
        let channel = [0.0; 4];
        let window = Window::new([&channel[..]; 6]);

        let result = gate.classify(&window);
        assert_eq!(result.label, BinaryLabel::Other);
        assert!(result.is_failure());
    }

    #[test]
    fn test_gate_from_config_uses_target_label() {
        let config = CounterConfig::default();
        let gate = ClassificationGate::from_config(
            Fixed(Ok(output("bicep_curl", &[("bicep_curl", 0.9), ("other", 0.1)]))),
            &config,
        );
        let channel = [0.0; 4];
        let window = Window::new([&channel[..]; 6]);

        assert_eq!(gate.classify(&window).label, BinaryLabel::Target);
        assert_eq!(gate.policy().target_label, "bicep_curl");
    }

    #[test]
    fn test_aux_state_zeroed() {
        let aux = AuxState::zeros(400);
        assert_eq!(aux.len(), 400);
        assert!(aux.values().iter().all(|v| *v == 0.0));
    }
}
