//! Reading from a `.cEcg` file.
use std::{fs::File, io::Read, path::Path};

use log::debug;
use md100a_format::{container, Header};

use crate::{error::Md100aError, strip::Strip};

/// A whole file, decoded.
#[derive(Debug, Clone)]
pub struct FileContainer {
    header: Header,
    strips: Vec<Strip>,
}

impl FileContainer {
    pub fn new(header: Header, strips: Vec<Strip>) -> Self {
        Self { header, strips }
    }

    /// Decode a complete file held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Md100aError> {
        let (header, raw_strips) = container::decode(data)?;
        let strips = raw_strips
            .into_iter()
            .map(Strip::new)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Loaded {} strips for patient {:?}",
            strips.len(),
            header.name()
        );
        Ok(Self { header, strips })
    }

    pub fn from_reader<R>(mut reader: R) -> Result<Self, Md100aError>
    where
        R: Read,
    {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Md100aError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn strips(&self) -> &[Strip] {
        &self.strips
    }

    pub fn strips_mut(&mut self) -> &mut [Strip] {
        &mut self.strips
    }

    pub fn strip(&self, index: usize) -> Option<&Strip> {
        self.strips.get(index)
    }

    pub fn len(&self) -> usize {
        self.strips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strips.is_empty()
    }
}
