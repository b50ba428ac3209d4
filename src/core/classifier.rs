//! Reference motion-energy classifier.
//!
//! Used by the CLI when no trained model is plugged in. It scores a window by
//! the variability of the rotation-rate magnitude: curling a weight swings the
//! forearm through a large rotation twice per rep, while rest and slow
//! drifting barely move it.

use crate::config::CounterConfig;
use crate::core::gate::{AuxState, Classifier, ClassifierError, ClassifierOutput};
use crate::core::window::Window;
use statrs::statistics::Statistics;
use std::collections::HashMap;

/// Label for every window that is not the target exercise.
pub const OTHER_LABEL: &str = "other";

/// Default standard deviation (rad/s) at which the target probability is 0.5.
const DEFAULT_MIDPOINT: f64 = 0.5;

/// Default slope of the logistic curve.
const DEFAULT_STEEPNESS: f64 = 8.0;

/// Stateless classifier over gyro-magnitude spread.
#[derive(Debug, Clone)]
pub struct MotionEnergyClassifier {
    target_label: String,
    aux_state_len: usize,
    midpoint: f64,
    steepness: f64,
}

impl MotionEnergyClassifier {
    pub fn new(target_label: impl Into<String>, aux_state_len: usize) -> Self {
        Self {
            target_label: target_label.into(),
            aux_state_len,
            midpoint: DEFAULT_MIDPOINT,
            steepness: DEFAULT_STEEPNESS,
        }
    }

    pub fn from_config(config: &CounterConfig) -> Self {
        Self::new(config.target_label.clone(), config.aux_state_len)
    }

    /// Override the logistic curve.
    pub fn with_curve(mut self, midpoint: f64, steepness: f64) -> Self {
        self.midpoint = midpoint;
        self.steepness = steepness;
        self
    }

    /// Probability that the window shows the target exercise.
    pub fn target_probability(&self, window: &Window<'_>) -> f64 {
        let magnitudes: Vec<f64> = window.samples().map(|s| s.gyro_magnitude()).collect();
        let spread = magnitudes.iter().std_dev();
        let spread = if spread.is_finite() { spread } else { 0.0 };

        1.0 / (1.0 + (-self.steepness * (spread - self.midpoint)).exp())
    }
}

impl Classifier for MotionEnergyClassifier {
    fn predict(
        &self,
        window: &Window<'_>,
        aux: &AuxState,
    ) -> Result<ClassifierOutput, ClassifierError> {
        if aux.len() != self.aux_state_len {
            return Err(ClassifierError::ShapeMismatch {
                expected: self.aux_state_len,
                actual: aux.len(),
            });
        }
        if window.is_empty() {
            return Err(ClassifierError::Inference("empty window".to_string()));
        }

        let p_target = self.target_probability(window);
        let label = if p_target >= 0.5 {
            self.target_label.as_str()
        } else {
            OTHER_LABEL
        };

        let probabilities = HashMap::from([
            (self.target_label.clone(), p_target),
            (OTHER_LABEL.to_string(), 1.0 - p_target),
        ]);

        Ok(ClassifierOutput::new(label, probabilities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::window::SlidingWindowBuffer;
    use crate::sensor::Sample;

    fn classify(classifier: &MotionEnergyClassifier, samples: &[Sample]) -> ClassifierOutput {
        let mut buffer = SlidingWindowBuffer::new(samples.len(), 1).unwrap();
        let aux = AuxState::zeros(400);
        samples
            .iter()
            .filter_map(|s| buffer.push(*s, |w| classifier.predict(&w, &aux)))
            .last()
            .unwrap()
            .unwrap()
    }

    fn curl_like(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| {
                let phase = i as f64 / 50.0 * std::f64::consts::TAU * 0.5;
                Sample::new([0.0; 3], [3.0 * phase.sin(), 0.0, 0.0])
            })
            .collect()
    }

    #[test]
    fn test_still_window_is_other() {
        let classifier = MotionEnergyClassifier::new("bicep_curl", 400);
        let output = classify(&classifier, &vec![Sample::default(); 100]);
        assert_eq!(output.label, OTHER_LABEL);
        assert!(output.confidence().unwrap() > 0.9);
    }

    #[test]
    fn test_swinging_window_is_target() {
        let classifier = MotionEnergyClassifier::new("bicep_curl", 400);
        let output = classify(&classifier, &curl_like(100));
        assert_eq!(output.label, "bicep_curl");
        assert!(output.confidence().unwrap() > 0.5);
    }

    #[test]
    fn test_curve_midpoint_shifts_decision() {
        let strict = MotionEnergyClassifier::new("bicep_curl", 400).with_curve(5.0, 8.0);
        let output = classify(&strict, &curl_like(100));
        assert_eq!(output.label, OTHER_LABEL);
        assert!(strict.target_probability(&Window::new([&[0.0; 4][..]; 6])) < 0.01);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let classifier = MotionEnergyClassifier::new("bicep_curl", 400);
        let output = classify(&classifier, &curl_like(100));
        let total: f64 = output.probabilities.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_aux_shape_mismatch() {
        let classifier = MotionEnergyClassifier::new("bicep_curl", 400);
        let channel = [0.0; 10];
        let window = Window::new([&channel[..]; 6]);
        let result = classifier.predict(&window, &AuxState::zeros(3));
        assert!(matches!(
            result,
            Err(ClassifierError::ShapeMismatch { expected: 400, actual: 3 })
        ));
    }
}
