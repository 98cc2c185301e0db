//! R-wave peak detection.
//!
//! A sample is a peak when it is tall enough, is the largest sample around
//! it, and the signal dips below zero shortly before and after it. The
//! baseline is removed first with a sliding median so slow wander does not
//! hide or fake peaks.
use log::debug;

use crate::filter::median_filter;

/// Knobs of the peak search, in samples and mV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakConfig {
    /// Smallest value a peak may have.
    pub threshold: f64,
    /// Half-width of the window the peak must be the maximum of.
    pub max_window: usize,
    /// How far before and after the peak to look for a negative sample.
    pub negative_window: usize,
    /// Median window used to remove the baseline.
    pub baseline_window: usize,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            threshold: 25.0,
            max_window: 10,
            negative_window: 10,
            baseline_window: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeakDetector {
    config: PeakConfig,
}

impl PeakDetector {
    pub fn new(config: PeakConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PeakConfig {
        &self.config
    }

    /// Whether `signal[index]` is a peak. Out of range indices are not.
    pub fn is_peak(&self, signal: &[f64], index: usize) -> bool {
        let Some(&value) = signal.get(index) else {
            return false;
        };
        let PeakConfig {
            threshold,
            max_window,
            negative_window,
            ..
        } = self.config;

        if value.is_nan() || value < threshold {
            return false;
        }
        // the first sample of a plateau is not a peak
        if index > 0 && signal[index - 1] == value {
            return false;
        }

        let lo = index.saturating_sub(max_window);
        let hi = (index + max_window).min(signal.len() - 1);
        if signal[lo..=hi].iter().any(|&v| v > value) {
            return false;
        }

        let negative = |window: &[f64]| window.iter().any(|&v| v < 0.0);
        if index >= negative_window && !negative(&signal[index - negative_window..index]) {
            return false;
        }
        if index + negative_window < signal.len()
            && !negative(&signal[index + 1..=index + negative_window])
        {
            return false;
        }
        true
    }

    /// Indices of the peaks in `signal` after baseline removal, ascending.
    pub fn peak_indices(&self, signal: &[f64]) -> Vec<usize> {
        let baseline = median_filter(signal, self.config.baseline_window);
        let flattened: Vec<f64> = signal.iter().zip(baseline).map(|(x, m)| x - m).collect();
        let peaks: Vec<usize> = (0..flattened.len())
            .filter(|&i| self.is_peak(&flattened, i))
            .collect();
        debug!("Found {} peaks in {} samples", peaks.len(), signal.len());
        peaks
    }
}

pub fn is_peak(signal: &[f64], index: usize) -> bool {
    PeakDetector::default().is_peak(signal, index)
}

pub fn peak_indices(signal: &[f64]) -> Vec<usize> {
    PeakDetector::default().peak_indices(signal)
}

/// Amplitudes of `samples` at `peaks`, skipping indices past the end.
pub fn peak_values(samples: &[f64], peaks: &[usize]) -> Vec<f64> {
    peaks.iter().filter_map(|&i| samples.get(i).copied()).collect()
}
