//! Strip blocks and their metadata preamble.
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    error::StripError,
    layout::{STRIP_DATA_START, STRIP_LENGTH, STRIP_METADATA_FIELDS},
    FormatError,
};

/// The bytes of one strip exactly as they appear in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStrip(Vec<u8>);

impl RawStrip {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn preamble(&self) -> &[u8] {
        &self.0[..STRIP_DATA_START.min(self.0.len())]
    }

    /// Waveform bytes following the preamble, may be shorter than a full
    /// strip for hand-built blocks.
    pub fn waveform(&self) -> &[u8] {
        self.0.get(STRIP_DATA_START..).unwrap_or_default()
    }

    pub fn is_complete(&self) -> bool {
        self.0.len() == STRIP_LENGTH
    }

    pub fn metadata(&self) -> Result<StripMetadata, FormatError> {
        StripMetadata::from_bytes(&self.0)
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for RawStrip {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Recording time and the device's own analysis of a strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripMetadata {
    pub sentinel: i16,
    pub year: i16,
    pub month: i16,
    pub day: i16,
    pub hour: i16,
    pub minute: i16,
    pub second: i16,
    pub diagnostic: i16,
    pub heart_rate: i16,
}

impl StripMetadata {
    /// Read the little-endian 16-bit fields at the start of a strip block.
    ///
    /// Fails if the block is shorter than the preamble, which also holds the
    /// marker before the waveform.
    pub fn from_bytes(block: &[u8]) -> Result<Self, FormatError> {
        if block.len() < STRIP_DATA_START {
            return Err(StripError::PreambleTruncated(block.len(), STRIP_DATA_START).into());
        }
        let mut fields = [0i16; STRIP_METADATA_FIELDS];
        for (field, pair) in fields.iter_mut().zip(block.chunks_exact(2)) {
            *field = i16::from_le_bytes([pair[0], pair[1]]);
        }
        // Fields 3, 8 and 11 are not used by the device
        Ok(Self {
            sentinel: fields[0],
            year: fields[1],
            month: fields[2],
            day: fields[4],
            hour: fields[5],
            minute: fields[6],
            second: fields[7],
            diagnostic: fields[9],
            heart_rate: fields[10],
        })
    }

    /// Start of the recording, `None` if the device wrote an invalid date.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let to_u32 = |v: i16| u32::try_from(v).ok();
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            to_u32(self.month)?,
            to_u32(self.day)?,
        )?
        .and_hms_opt(
            to_u32(self.hour)?,
            to_u32(self.minute)?,
            to_u32(self.second)?,
        )
    }

    pub fn diagnosis(&self) -> Diagnosis {
        Diagnosis::from_code(self.diagnostic)
    }
}

/// Rhythm classification the recorder stores with each strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnosis {
    SinusHalted,
    FastBeat,
    SlowBeat,
    MissingBeat,
    RepeatingEarlyBeat,
    Trigeminy,
    Bigeminy,
    ROnT,
    TwinEarlyBeat,
    EarlyBeat,
    OtherArrhythmia,
    PoorSignal,
    Stable,
    Unrecognized(i16),
}

impl Diagnosis {
    pub fn from_code(code: i16) -> Self {
        match code {
            1 => Self::SinusHalted,
            2 => Self::FastBeat,
            3 => Self::SlowBeat,
            4 => Self::MissingBeat,
            5 => Self::RepeatingEarlyBeat,
            6 => Self::Trigeminy,
            7 => Self::Bigeminy,
            8 => Self::ROnT,
            9 => Self::TwinEarlyBeat,
            10 => Self::EarlyBeat,
            11 => Self::OtherArrhythmia,
            12 => Self::PoorSignal,
            13 => Self::Stable,
            other => Self::Unrecognized(other),
        }
    }

    /// Human readable description, empty for a stable waveform.
    pub fn description(&self) -> String {
        let text = match self {
            Self::SinusHalted => "Suspected sinus halted beat",
            Self::FastBeat => "Suspected fast beat",
            Self::SlowBeat => "Suspected slow beat",
            Self::MissingBeat => "Suspected missing beat",
            Self::RepeatingEarlyBeat => "Suspected repeating early beat",
            Self::Trigeminy => "Suspected trigeminy",
            Self::Bigeminy => "Suspected bigeminy",
            Self::ROnT => "Suspected R wave on T wave",
            Self::TwinEarlyBeat => "Suspected twin early beat",
            Self::EarlyBeat => "Suspected early beat",
            Self::OtherArrhythmia => "Suspected other arrhythmia",
            Self::PoorSignal => "Poor signal",
            Self::Stable => "",
            Self::Unrecognized(code) => return format!("Unrecognized diagnostic: {code}"),
        };
        text.to_string()
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}
