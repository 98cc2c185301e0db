//! Reading, analysing and writing ECG recordings from the MD100A portable
//! recorder (`.cEcg` files).
//!
//! A file is a patient [`Header`] followed by 30 second [`Strip`]s of 7500
//! samples at 250 Hz. Strips can be filtered with a [`ProcessingMode`],
//! searched for R peaks and summarised as beat-to-beat intervals (RSA), and
//! a selection of them written back out as a new file.
pub use md100a_format;
pub use md100a_format::{Diagnosis, FormatError, Header, RawStrip, StripMetadata};

pub mod error;
pub mod filter;
pub mod peaks;
pub mod reader;
pub mod rsa;
pub mod strip;
pub mod writer;

pub use error::Md100aError;
pub use filter::{FilterParams, ParamError, ProcessingMode};
pub use peaks::{PeakConfig, PeakDetector};
pub use reader::FileContainer;
pub use rsa::RSA_OUTLIER_FRACTION;
pub use strip::{EncodeStats, Strip};
pub use writer::{PatientId, SaveOptions, StripSelection};

use md100a_format::layout::STRIP_DATA_START;

/// Decode a whole file held in memory.
pub fn load_file(data: &[u8]) -> Result<FileContainer, Md100aError> {
    FileContainer::from_bytes(data)
}

/// Build a new file from `strips` as selected and processed by `options`.
pub fn save_file(
    header: &Header,
    strips: &[Strip],
    options: &SaveOptions,
) -> Result<Vec<u8>, Md100aError> {
    writer::save_file(header, strips, options)
}

/// Samples of one complete strip block, preamble included.
pub fn decode_strip(block: &[u8]) -> Vec<f64> {
    strip::decode_waveform(block.get(STRIP_DATA_START..).unwrap_or_default())
}

pub fn process(mode: ProcessingMode, params: &FilterParams, samples: &[f64]) -> Vec<f64> {
    mode.process(params, samples)
}

pub fn find_peaks(samples: &[f64]) -> Vec<usize> {
    peaks::peak_indices(samples)
}

pub fn compute_rsa(peaks: &[usize], samples: &[f64], fraction: f64) -> Vec<f64> {
    rsa::rsa_array(peaks, samples, fraction)
}

#[cfg(doctest)]
doc_comment::doctest!("../README.md", readme);
