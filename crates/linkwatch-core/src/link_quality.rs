//! Trailing-window link-quality averaging
//!
//! Every tracked device keeps its last `N` LQI samples in a fixed ring buffer
//! together with an incrementally maintained sum, so accepting a sample never
//! rescans the window and never allocates.

use serde::{Deserialize, Serialize};

/// Number of LQI samples in each device's averaging window.
pub const LQI_WINDOW_LEN: usize = 6;

/// How the average is derived before the window has been filled once.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AveragingMode {
    /// Always divide by the full window length.
    ///
    /// Unwritten slots count as zero, so the average under-reports until the
    /// window has been filled once. This is the deployed behaviour.
    #[default]
    FullWindow,
    /// Divide by the number of samples written so far until the window has
    /// been filled once, then by the full window length.
    SamplesSeen,
}

/// Fixed-capacity ring buffer of LQI samples with a running sum.
///
/// Invariants:
/// - `cursor` is always in `0..N`
/// - `running_sum` equals the sum of `samples`
/// - `initialized` becomes true after exactly `N` samples and stays true
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkQualityWindow<const N: usize> {
    samples: [u8; N],
    cursor: usize,
    initialized: bool,
    running_sum: u32,
    average: u8,
}

impl<const N: usize> LinkQualityWindow<N> {
    pub const fn new() -> Self {
        const { assert!(N > 0, "LQI window must hold at least one sample") };
        Self {
            samples: [0; N],
            cursor: 0,
            initialized: false,
            running_sum: 0,
            average: 0,
        }
    }

    /// Accept one measured LQI value and return the recomputed average.
    ///
    /// Callers only pass real measurements; a zero LQI means "no measurement"
    /// upstream and is filtered before reaching the window.
    pub fn record(&mut self, sample: u8, mode: AveragingMode) -> u8 {
        let evicted = self.samples[self.cursor];
        if self.initialized {
            self.running_sum -= u32::from(evicted);
        }
        self.samples[self.cursor] = sample;
        self.running_sum += u32::from(sample);

        self.cursor += 1;
        if self.cursor == N {
            self.cursor = 0;
            self.initialized = true;
        }

        let divisor = match mode {
            AveragingMode::SamplesSeen if !self.initialized => self.cursor,
            _ => N,
        };
        self.average = (self.running_sum / divisor as u32) as u8;

        debug_assert_eq!(
            self.running_sum,
            self.samples.iter().map(|&s| u32::from(s)).sum::<u32>(),
            "LQI running sum diverged from window contents"
        );

        self.average
    }

    /// Samples in slot order (not chronological order).
    pub fn samples(&self) -> &[u8; N] {
        &self.samples
    }

    /// Index of the slot the next sample overwrites.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the window has been filled at least once.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn running_sum(&self) -> u32 {
        self.running_sum
    }

    pub fn average(&self) -> u8 {
        self.average
    }
}

impl<const N: usize> Default for LinkQualityWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}
