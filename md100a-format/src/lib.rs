//! Byte layout of the files written by the MD100A portable ECG recorder.
//!
//! This crate only knows where things are in a `.cEcg` file: the patient
//! [`Header`], the fixed-size strip blocks and the metadata at the start of
//! each strip. Turning waveform bytes into samples is left to the `md100a`
//! crate.
mod error;
pub mod container;
pub mod header;
pub mod layout;
pub mod strip;

pub use error::{FormatError, HeaderError, StripError};
pub use header::Header;
pub use strip::{Diagnosis, RawStrip, StripMetadata};
