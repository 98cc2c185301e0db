//! Writing a new `.cEcg` file from a selection of processed strips.
use std::{
    collections::BTreeSet,
    fmt,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    str::FromStr,
};

use log::{debug, info, warn};
use md100a_format::{container, layout::MAX_PATIENT_ID, Header};

use crate::{
    error::Md100aError,
    filter::{FilterParams, ProcessingMode},
    reader::FileContainer,
    strip::{EncodeStats, Strip},
};

/// Patient id as stored in the header, 1 to 999 999 999 999 999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatientId(u64);

impl PatientId {
    pub fn new(id: u64) -> Result<Self, Md100aError> {
        if (1..=MAX_PATIENT_ID).contains(&id) {
            Ok(Self(id))
        } else {
            Err(Md100aError::InvalidPatientId(id.to_string(), MAX_PATIENT_ID))
        }
    }

    pub fn parse(s: &str) -> Result<Self, Md100aError> {
        let invalid = || Md100aError::InvalidPatientId(s.to_string(), MAX_PATIENT_ID);
        let id = s.trim().parse::<u64>().map_err(|_| invalid())?;
        Self::new(id).map_err(|_| invalid())
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl FromStr for PatientId {
    type Err = Md100aError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sorted, duplicate free, 0-based strip indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripSelection(Vec<usize>);

impl StripSelection {
    /// Parse a list of 1-based strip numbers and inclusive ranges such as
    /// `1-2, 3, 9-10`. Whitespace is ignored.
    pub fn parse(spec: &str, n_strips: usize) -> Result<Self, Md100aError> {
        let invalid = || Md100aError::InvalidStripSelection(spec.to_string(), n_strips);
        let number = |token: &str| {
            token
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=n_strips).contains(n))
                .ok_or_else(invalid)
        };

        let compact: String = spec.chars().filter(|c| !c.is_whitespace()).collect();
        let mut selected = BTreeSet::new();
        for token in compact.split(',') {
            match token.split_once('-') {
                None => {
                    selected.insert(number(token)? - 1);
                }
                Some((start, end)) => {
                    let (start, end) = (number(start)?, number(end)?);
                    if start > end {
                        return Err(invalid());
                    }
                    selected.extend(start - 1..end);
                }
            }
        }
        Ok(Self(selected.into_iter().collect()))
    }

    pub fn all(n_strips: usize) -> Self {
        Self((0..n_strips).collect())
    }

    /// From 0-based indices, each of which must be below `n_strips`.
    pub fn from_indices<I>(indices: I, n_strips: usize) -> Result<Self, Md100aError>
    where
        I: IntoIterator<Item = usize>,
    {
        let selected = indices
            .into_iter()
            .map(|i| {
                if i < n_strips {
                    Ok(i)
                } else {
                    Err(Md100aError::StripOutOfRange(i + 1, n_strips))
                }
            })
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self(selected.into_iter().collect()))
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What to write when saving.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOptions {
    pub patient_id: PatientId,
    pub strips: StripSelection,
    pub mode: ProcessingMode,
    pub params: FilterParams,
}

impl SaveOptions {
    pub fn new(patient_id: PatientId, strips: StripSelection) -> Self {
        Self {
            patient_id,
            strips,
            mode: ProcessingMode::default(),
            params: FilterParams::default(),
        }
    }

    pub fn with_mode(mut self, mode: ProcessingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_params(mut self, params: FilterParams) -> Self {
        self.params = params;
        self
    }
}

/// Build a file holding the selected `strips`, processed with the chosen
/// mode, behind a copy of `header` carrying the new id and strip count.
pub fn save_file(
    header: &Header,
    strips: &[Strip],
    options: &SaveOptions,
) -> Result<Vec<u8>, Md100aError> {
    if options.strips.is_empty() {
        return Err(Md100aError::NoStripsSelected);
    }
    let mut total = EncodeStats::default();
    let mut blocks = Vec::with_capacity(options.strips.len());
    for &index in options.strips.indices() {
        let strip = strips
            .get(index)
            .ok_or(Md100aError::StripOutOfRange(index + 1, strips.len()))?;
        let samples = strip.processed(options.mode, &options.params);
        let (block, stats) = strip.encode_samples(&samples);
        if !stats.is_lossless() {
            debug!("Strip {} encoded with {stats:?}", index + 1);
        }
        total += stats;
        blocks.push(block);
    }
    if total.saturated > 0 {
        warn!(
            "{} samples were clipped while saving {} strips",
            total.saturated,
            blocks.len()
        );
    }

    let header = header.with_id(options.patient_id.to_string());
    let data = container::encode(&header, &blocks)?;
    info!(
        "Saved {} strips ({} bytes) with mode {}",
        blocks.len(),
        data.len(),
        options.mode
    );
    Ok(data)
}

impl FileContainer {
    pub fn save(&self, options: &SaveOptions) -> Result<Vec<u8>, Md100aError> {
        save_file(self.header(), self.strips(), options)
    }

    pub fn save_to_path<P: AsRef<Path>>(
        &self,
        path: P,
        options: &SaveOptions,
    ) -> Result<(), Md100aError> {
        let data = self.save(options)?;
        write_to_path(path, &data)
    }
}

pub struct Writer<W>
where
    W: Write,
{
    writer: W,
}

impl<W> Writer<W>
where
    W: Write,
{
    pub fn from_writer(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_file(
        &mut self,
        file: &FileContainer,
        options: &SaveOptions,
    ) -> Result<(), Md100aError> {
        let data = file.save(options)?;
        self.write_bytes(&data)
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), Md100aError> {
        self.writer.write_all(data)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W, Md100aError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Write a finished file buffer, replacing anything at `path`.
pub fn write_to_path<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<(), Md100aError> {
    let file = File::create(path)?;
    let mut writer = Writer::from_writer(BufWriter::new(file));
    writer.write_bytes(data)?;
    writer.finish()?;
    Ok(())
}
