//! Fixed offsets and sizes of the MD100A `.cEcg` file.
//!
//! A file is a header followed by one or more strips. A strip is a preamble
//! (metadata and a marker) followed by waveform data split into segments.
//! Every segment has one more byte than the number of samples it holds,
//! because its first sample is stored as two bytes.
//!
//! ```text
//! <header: 1392 bytes>
//! <strip 0: 7541 bytes>
//!     <metadata: 12 x i16 LE> <marker: 0x55 0xAA>
//!     <segment 0: 501 bytes> ... <segment 14: 501 bytes>
//! <strip 1: 7541 bytes>
//! ...
//! ```
//!
//! Any change to one of these widths is a compatibility break.

/// Length of the file header.
pub const HEADER_LENGTH: usize = 1392;

/// Byte widths of the UTF-16LE header strings, in file order.
pub const HEADER_STRING_WIDTHS: [usize; 10] = [32, 82, 20, 112, 28, 30, 130, 210, 130, 614];

/// Length of a whole strip block.
pub const STRIP_LENGTH: usize = 7541;

/// Offset of the first strip.
pub const STRIP_START: usize = HEADER_LENGTH;

/// Number of 16-bit metadata fields at the start of a strip.
pub const STRIP_METADATA_FIELDS: usize = 12;

/// Offset of the waveform data in a strip, just after the `0x55 0xAA` marker.
pub const STRIP_DATA_START: usize = 26;

/// Marker the device writes between the metadata and the waveform.
pub const STRIP_MARKER: [u8; 2] = [0x55, 0xAA];

/// Number of bytes of waveform data in a strip.
pub const STRIP_N_DATA_BYTES: usize = STRIP_LENGTH - STRIP_DATA_START;

/// Number of samples in a strip.
pub const STRIP_N_DATA_VALS: usize = 7500;

/// Number of segments in a strip waveform.
pub const STRIP_N_DATA_SEGMENTS: usize = 15;

/// Number of samples in a segment.
pub const SEGMENT_N_DATA_VALS: usize = 500;

/// Length of a segment.
pub const SEGMENT_LENGTH: usize = SEGMENT_N_DATA_VALS + 1;

/// Raw ADC value corresponding to 0 mV.
pub const BASELINE: i32 = 512;

/// Sample rate in Hz.
pub const SAMPLE_RATE: f64 = 250.0;

/// Duration of a strip in seconds.
pub const STRIP_SAMPLE_TIME: f64 = 30.0;

/// Seconds between two samples.
pub const INDEX_TO_SEC: f64 = STRIP_SAMPLE_TIME / STRIP_N_DATA_VALS as f64;

/// Largest patient id the device accepts.
pub const MAX_PATIENT_ID: u64 = 999_999_999_999_999;

/// Time in seconds of the sample at `index` from the start of its strip.
pub fn time_for_index(index: usize) -> f64 {
    index as f64 * INDEX_TO_SEC
}
