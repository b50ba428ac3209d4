//! Sensor source for targets without motion hardware.

use crate::sensor::{Sample, SensorError, SensorSource};
use crossbeam_channel::Receiver;

/// A source that is never available.
#[derive(Debug, Default)]
pub struct NoopSource;

impl NoopSource {
    pub fn new() -> Self {
        Self
    }
}

impl SensorSource for NoopSource {
    fn is_available(&self) -> bool {
        false
    }

    fn subscribe(&mut self, _rate_hz: f64) -> Result<Receiver<Sample>, SensorError> {
        Err(SensorError::Unavailable)
    }

    fn unsubscribe(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_is_unavailable() {
        let mut source = NoopSource::new();
        assert!(!source.is_available());
        assert!(matches!(
            source.subscribe(50.0),
            Err(SensorError::Unavailable)
        ));
    }
}
