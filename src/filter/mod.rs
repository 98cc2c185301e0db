//! Processing modes applied to a strip before display, peak search or
//! saving.
//!
//! Every mode is a pure function of [`FilterParams`] and the input samples:
//! the input is never modified and the output has the same length.
use std::{fmt, str::FromStr};

use log::{debug, warn};
use md100a_format::layout::SAMPLE_RATE;

pub mod butterworth;
pub mod median;

pub use median::median_filter;

pub const DEFAULT_MEDIAN_WINDOW: usize = 50;
pub const DEFAULT_LOWPASS_CUTOFF: f64 = 8.0;

/// Number of standard deviations above the mean a sample needs to count
/// towards the peak average used by the scaled mode.
const PEAK_AVERAGE_SIGMA: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("Median window must be at least 1, got {0}")]
    MedianWindow(i64),

    #[error("Low-pass cutoff must be between 0 and {1} Hz, got {0}")]
    LowPassCutoff(f64, f64),

    #[error("Unknown processing mode {0:?}")]
    UnknownMode(String),
}

/// Tunable parameters of the processing modes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    median_window: usize,
    lowpass_cutoff: f64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            median_window: DEFAULT_MEDIAN_WINDOW,
            lowpass_cutoff: DEFAULT_LOWPASS_CUTOFF,
        }
    }
}

impl FilterParams {
    pub fn try_new(median_window: i64, lowpass_cutoff: f64) -> Result<Self, ParamError> {
        Ok(Self {
            median_window: check_window(median_window)?,
            lowpass_cutoff: check_cutoff(lowpass_cutoff)?,
        })
    }

    /// Like [`FilterParams::try_new`], but replaces each invalid value with
    /// its default.
    pub fn new_or_default(median_window: i64, lowpass_cutoff: f64) -> Self {
        let median_window = check_window(median_window).unwrap_or_else(|e| {
            warn!("{e}, using {DEFAULT_MEDIAN_WINDOW}");
            DEFAULT_MEDIAN_WINDOW
        });
        let lowpass_cutoff = check_cutoff(lowpass_cutoff).unwrap_or_else(|e| {
            warn!("{e}, using {DEFAULT_LOWPASS_CUTOFF}");
            DEFAULT_LOWPASS_CUTOFF
        });
        Self {
            median_window,
            lowpass_cutoff,
        }
    }

    pub fn median_window(&self) -> usize {
        self.median_window
    }

    pub fn lowpass_cutoff(&self) -> f64 {
        self.lowpass_cutoff
    }
}

fn check_window(window: i64) -> Result<usize, ParamError> {
    usize::try_from(window)
        .ok()
        .filter(|&w| w >= 1)
        .ok_or(ParamError::MedianWindow(window))
}

fn check_cutoff(cutoff: f64) -> Result<f64, ParamError> {
    let nyquist = SAMPLE_RATE / 2.0;
    if cutoff.is_finite() && cutoff > 0.0 && cutoff < nyquist {
        Ok(cutoff)
    } else {
        Err(ParamError::LowPassCutoff(cutoff, nyquist))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProcessingMode {
    #[default]
    Identity,
    MedianSubtracted,
    Median,
    Butterworth,
    ButterworthLowPass,
    MedianSubtractedButterworthLowPassScaled,
}

type ProcessFn = fn(&FilterParams, &[f64]) -> Vec<f64>;

struct ModeEntry {
    mode: ProcessingMode,
    name: &'static str,
    process: ProcessFn,
}

static MODES: [ModeEntry; 6] = [
    ModeEntry {
        mode: ProcessingMode::Identity,
        name: "Default",
        process: identity,
    },
    ModeEntry {
        mode: ProcessingMode::MedianSubtracted,
        name: "Median Subtracted",
        process: median_subtracted,
    },
    ModeEntry {
        mode: ProcessingMode::Median,
        name: "Median",
        process: median,
    },
    ModeEntry {
        mode: ProcessingMode::Butterworth,
        name: "Butterworth",
        process: band_pass,
    },
    ModeEntry {
        mode: ProcessingMode::ButterworthLowPass,
        name: "Butterworth Low Pass",
        process: low_pass,
    },
    ModeEntry {
        mode: ProcessingMode::MedianSubtractedButterworthLowPassScaled,
        name: "Median Subtracted Butterworth Low Pass Scaled",
        process: median_subtracted_low_pass_scaled,
    },
];

impl ProcessingMode {
    pub const ALL: [ProcessingMode; 6] = [
        ProcessingMode::Identity,
        ProcessingMode::MedianSubtracted,
        ProcessingMode::Median,
        ProcessingMode::Butterworth,
        ProcessingMode::ButterworthLowPass,
        ProcessingMode::MedianSubtractedButterworthLowPassScaled,
    ];

    fn entry(&self) -> &'static ModeEntry {
        // MODES lists every variant in declaration order
        &MODES[*self as usize]
    }

    pub fn name(&self) -> &'static str {
        self.entry().name
    }

    pub fn process(&self, params: &FilterParams, data: &[f64]) -> Vec<f64> {
        debug!("Processing {} samples with {}", data.len(), self.name());
        (self.entry().process)(params, data)
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProcessingMode {
    type Err = ParamError;

    /// Accepts the display name in any case, with or without spaces,
    /// dashes or underscores, plus `identity` for the default mode.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        if wanted == "identity" {
            return Ok(ProcessingMode::Identity);
        }
        MODES
            .iter()
            .find(|entry| normalize(entry.name) == wanted)
            .map(|entry| entry.mode)
            .ok_or_else(|| ParamError::UnknownMode(s.to_string()))
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn identity(_: &FilterParams, data: &[f64]) -> Vec<f64> {
    data.to_vec()
}

fn median(params: &FilterParams, data: &[f64]) -> Vec<f64> {
    median_filter(data, params.median_window)
}

fn median_subtracted(params: &FilterParams, data: &[f64]) -> Vec<f64> {
    let baseline = median_filter(data, params.median_window);
    data.iter().zip(baseline).map(|(x, m)| x - m).collect()
}

fn band_pass(_: &FilterParams, data: &[f64]) -> Vec<f64> {
    butterworth::band_pass(data)
}

fn low_pass(params: &FilterParams, data: &[f64]) -> Vec<f64> {
    butterworth::low_pass(data, SAMPLE_RATE, params.lowpass_cutoff)
}

fn median_subtracted_low_pass_scaled(params: &FilterParams, data: &[f64]) -> Vec<f64> {
    let subtracted = median_subtracted(params, data);
    let before = peak_average(&subtracted, PEAK_AVERAGE_SIGMA);
    let mut filtered = low_pass(params, &subtracted);
    let after = peak_average(&filtered, PEAK_AVERAGE_SIGMA);
    let factor = if after != 0.0 && after.is_finite() && before.is_finite() {
        before / after
    } else {
        1.0
    };
    debug!("Low-pass peak average {after}, rescaling by {factor}");
    filtered.iter_mut().for_each(|x| *x *= factor);
    filtered
}

/// Mean of the samples above `mean + n_sigma * sigma`, where sigma is the
/// sample standard deviation. NaN samples are ignored; NaN if no sample
/// qualifies.
pub fn peak_average(data: &[f64], n_sigma: f64) -> f64 {
    let finite = || data.iter().copied().filter(|x| x.is_finite());
    let (n, sum, sum_sq) = finite().fold((0usize, 0.0, 0.0), |(n, s, ss), x| {
        (n + 1, s + x, ss + x * x)
    });
    if n == 0 {
        return f64::NAN;
    }
    let mean = sum / n as f64;
    let sigma = if n > 1 {
        ((sum_sq - n as f64 * mean * mean) / (n - 1) as f64)
            .max(0.0)
            .sqrt()
    } else {
        0.0
    };
    let threshold = mean + n_sigma * sigma;
    let (count, total) = finite()
        .filter(|&x| x > threshold)
        .fold((0usize, 0.0), |(c, t), x| (c + 1, t + x));
    if count == 0 {
        f64::NAN
    } else {
        total / count as f64
    }
}
