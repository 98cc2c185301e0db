use std::io;

use md100a_format::FormatError;

use crate::filter::ParamError;

#[derive(Debug, thiserror::Error)]
pub enum Md100aError {
    #[error("Failed to parse file, {0}")]
    FormatError(#[from] FormatError),

    #[error("{0}")]
    IOError(#[from] io::Error),

    #[error("Invalid filter setting, {0}")]
    ParamError(#[from] ParamError),

    #[error("Invalid patient id {0:?}, must be a number from 1 to {1}")]
    InvalidPatientId(String, u64),

    #[error("Invalid strip specification {0:?}, expected a comma-separated list like 1-2, 3, 9-10 with strips from 1 to {1}")]
    InvalidStripSelection(String, usize),

    #[error("Strip {0} requested but the file only has {1} strips")]
    StripOutOfRange(usize, usize),

    #[error("No strips selected for saving")]
    NoStripsSelected,
}
