//! Fixed-capacity sliding window over the six sensor channels.
//!
//! Samples are written column-wise into one buffer per channel. When the
//! buffer fills, the completed window is lent out for classification and the
//! newest `window_size - overlap` samples are shifted to the front, so a new
//! window completes every `overlap` samples while consecutive windows share
//! most of their data.

use crate::config::{ConfigError, CounterConfig};
use crate::sensor::{Sample, CHANNELS};

/// Read-only view of a completed window, one slice per channel.
///
/// Channel order is accel x/y/z followed by gyro x/y/z. Every slice has the
/// configured window length.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    channels: [&'a [f64]; CHANNELS],
}

impl<'a> Window<'a> {
    /// Build a window from per-channel slices of equal length.
    pub fn new(channels: [&'a [f64]; CHANNELS]) -> Self {
        debug_assert!(channels.iter().all(|c| c.len() == channels[0].len()));
        Self { channels }
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values of one channel (0..6).
    pub fn channel(&self, index: usize) -> &'a [f64] {
        self.channels[index]
    }

    pub fn channels(&self) -> &[&'a [f64]; CHANNELS] {
        &self.channels
    }

    /// Reassemble the sample at position `index`.
    pub fn sample(&self, index: usize) -> Sample {
        let c = &self.channels;
        Sample::new(
            [c[0][index], c[1][index], c[2][index]],
            [c[3][index], c[4][index], c[5][index]],
        )
    }

    /// Iterate the window's samples in arrival order.
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.len()).map(move |i| self.sample(i))
    }
}

/// Overlap-preserving sample buffer.
#[derive(Debug, Clone)]
pub struct SlidingWindowBuffer {
    channels: [Vec<f64>; CHANNELS],
    window_size: usize,
    overlap: usize,
    index: usize,
}

impl SlidingWindowBuffer {
    /// Create a buffer holding `window_size` samples that completes a window
    /// every `overlap` samples once primed.
    pub fn new(window_size: usize, overlap: usize) -> Result<Self, ConfigError> {
        if window_size == 0 || overlap == 0 || overlap >= window_size {
            return Err(ConfigError::Invalid(format!(
                "overlap must satisfy 0 < overlap < window_size (got {overlap} with window_size {window_size})"
            )));
        }

        Ok(Self {
            channels: std::array::from_fn(|_| vec![0.0; window_size]),
            window_size,
            overlap,
            index: 0,
        })
    }

    pub fn from_config(config: &CounterConfig) -> Result<Self, ConfigError> {
        Self::new(config.window_size, config.overlap)
    }

    /// Append one sample.
    ///
    /// If the sample completes a window, `on_full` is called with it before the
    /// buffer slides, and its result is returned.
    pub fn push<R>(&mut self, sample: Sample, on_full: impl FnOnce(Window<'_>) -> R) -> Option<R> {
        for (buffer, value) in self.channels.iter_mut().zip(sample.channels()) {
            buffer[self.index] = value;
        }
        self.index += 1;

        if self.index < self.window_size {
            return None;
        }

        let result = on_full(self.window());
        self.slide();
        Some(result)
    }

    /// Zero every channel and rewind to an empty buffer.
    pub fn reset(&mut self) {
        for buffer in &mut self.channels {
            buffer.fill(0.0);
        }
        self.index = 0;
    }

    /// Current write position, always within `0..=window_size`.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Samples still needed before the next window completes.
    pub fn remaining(&self) -> usize {
        self.window_size - self.index
    }

    fn window(&self) -> Window<'_> {
        Window::new(std::array::from_fn(|i| self.channels[i].as_slice()))
    }

    /// Keep the newest `window_size - overlap` samples at the front.
    fn slide(&mut self) {
        for buffer in &mut self.channels {
            buffer.copy_within(self.overlap.., 0);
        }
        self.index = self.window_size - self.overlap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(v: f64) -> Sample {
        Sample::new([v, v + 0.1, v + 0.2], [v + 0.3, v + 0.4, v + 0.5])
    }

    /// Sample indices (0-based) at which a window completed.
    fn trigger_points(buffer: &mut SlidingWindowBuffer, count: usize) -> Vec<usize> {
        (0..count)
            .filter(|&i| buffer.push(sample(i as f64), |_| ()).is_some())
            .collect()
    }

    #[test]
    fn test_rejects_invalid_overlap() {
        assert!(SlidingWindowBuffer::new(100, 100).is_err());
        assert!(SlidingWindowBuffer::new(100, 150).is_err());
        assert!(SlidingWindowBuffer::new(100, 0).is_err());
        assert!(SlidingWindowBuffer::new(0, 0).is_err());
        assert!(SlidingWindowBuffer::new(100, 25).is_ok());
    }

    #[test]
    fn test_first_window_after_window_size_samples() {
        let mut buffer = SlidingWindowBuffer::new(100, 25).unwrap();
        for i in 0..99 {
            assert!(buffer.push(sample(i as f64), |_| ()).is_none());
        }
        assert_eq!(buffer.index(), 99);
        assert!(buffer.push(sample(99.0), |_| ()).is_some());
        assert_eq!(buffer.index(), 75);
    }

    #[test]
    fn test_cadence_default_config() {
        let mut buffer = SlidingWindowBuffer::from_config(&CounterConfig::default()).unwrap();
        let points = trigger_points(&mut buffer, 200);
        assert_eq!(points, vec![99, 124, 149, 174, 199]);
    }

    #[test]
    fn test_window_contents_slide() {
        let mut buffer = SlidingWindowBuffer::new(4, 2).unwrap();
        let mut windows = Vec::new();
        for i in 0..8 {
            if let Some(w) = buffer.push(sample(i as f64), |w| w.channel(0).to_vec()) {
                windows.push(w);
            }
        }
        assert_eq!(
            windows,
            vec![
                vec![0.0, 1.0, 2.0, 3.0],
                vec![2.0, 3.0, 4.0, 5.0],
                vec![4.0, 5.0, 6.0, 7.0],
            ]
        );
    }

    #[test]
    fn test_window_reassembles_samples() {
        let mut buffer = SlidingWindowBuffer::new(3, 1).unwrap();
        buffer.push(sample(1.0), |_| ());
        buffer.push(sample(2.0), |_| ());
        let samples = buffer
            .push(sample(3.0), |w| w.samples().collect::<Vec<_>>())
            .unwrap();
        assert_eq!(samples, vec![sample(1.0), sample(2.0), sample(3.0)]);
    }

    #[test]
    fn test_window_channels_are_channel_major() {
        let mut buffer = SlidingWindowBuffer::new(2, 1).unwrap();
        buffer.push(sample(1.0), |_| ());
        let channels = buffer
            .push(sample(2.0), |w| {
                w.channels().iter().map(|c| c.to_vec()).collect::<Vec<_>>()
            })
            .unwrap();
        assert_eq!(channels.len(), CHANNELS);
        assert_eq!(channels[0], vec![1.0, 2.0]);
        assert_eq!(channels[3], vec![1.0 + 0.3, 2.0 + 0.3]);
    }

    #[test]
    fn test_reset_zero_fills() {
        let mut buffer = SlidingWindowBuffer::new(4, 1).unwrap();
        for i in 0..6 {
            buffer.push(sample(i as f64 + 1.0), |_| ());
        }
        buffer.reset();
        assert_eq!(buffer.index(), 0);
        assert_eq!(buffer.remaining(), 4);

        // The first window after reset holds only fresh samples.
        let mut last = None;
        for i in 0..4 {
            last = buffer.push(sample(10.0 + i as f64), |w| w.channel(0).to_vec());
        }
        assert_eq!(last.unwrap(), vec![10.0, 11.0, 12.0, 13.0]);
    }

    proptest! {
        // Property: the write index never leaves 0..=window_size
        #[test]
        fn prop_index_bounded(
            window_size in 2usize..64,
            overlap_seed in 1usize..64,
            pushes in 0usize..500,
        ) {
            let overlap = 1 + overlap_seed % (window_size - 1);
            let mut buffer = SlidingWindowBuffer::new(window_size, overlap).unwrap();
            for i in 0..pushes {
                buffer.push(sample(i as f64), |w| assert_eq!(w.len(), window_size));
                prop_assert!(buffer.index() <= window_size);
            }
        }

        // Property: first trigger after window_size samples, then every overlap samples
        #[test]
        fn prop_trigger_cadence(
            window_size in 2usize..64,
            overlap_seed in 1usize..64,
            pushes in 0usize..500,
        ) {
            let overlap = 1 + overlap_seed % (window_size - 1);
            let mut buffer = SlidingWindowBuffer::new(window_size, overlap).unwrap();
            let points = trigger_points(&mut buffer, pushes);

            let expected: Vec<usize> = (0..pushes)
                .filter(|&i| i + 1 >= window_size && (i + 1 - window_size) % overlap == 0)
                .collect();
            prop_assert_eq!(points, expected);
        }

        // Property: reset reproduces the trigger points of a fresh buffer
        #[test]
        fn prop_reset_matches_fresh(
            window_size in 2usize..64,
            overlap_seed in 1usize..64,
            warmup in 0usize..300,
            pushes in 0usize..300,
        ) {
            let overlap = 1 + overlap_seed % (window_size - 1);
            let mut used = SlidingWindowBuffer::new(window_size, overlap).unwrap();
            trigger_points(&mut used, warmup);
            used.reset();

            let mut fresh = SlidingWindowBuffer::new(window_size, overlap).unwrap();
            prop_assert_eq!(
                trigger_points(&mut used, pushes),
                trigger_points(&mut fresh, pushes)
            );
        }
    }
}
