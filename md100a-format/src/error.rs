#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("Error encountered in Header operation: {0}")]
    HeaderError(#[from] HeaderError),

    #[error("Error encountered in Strip operation: {0}")]
    StripError(#[from] StripError),
}

#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    /// The buffer ended before the fixed-size header did
    #[error("File is {0} bytes, too short for the {1} byte header")]
    Truncated(usize, usize),

    #[error("Header declares a negative number of strips: {0}")]
    NegativeStripCount(i32),

    #[error("Header declares more strips than can be written: {0}")]
    TooManyStrips(usize),
}

#[derive(thiserror::Error, Debug)]
pub enum StripError {
    /// The file ended before one of the strips declared in the header
    #[error("Strip {index} needs bytes up to offset {needed}, file is only {available} bytes")]
    Truncated {
        index: usize,
        needed: usize,
        available: usize,
    },

    /// The block ended before the metadata and marker preamble
    #[error("Strip block is {0} bytes, too short for the {1} byte preamble")]
    PreambleTruncated(usize, usize),

    /// Blocks handed to the writer must be exactly one strip long
    #[error("Strip {index} block is {length} bytes, expected {expected}")]
    StripLength {
        index: usize,
        length: usize,
        expected: usize,
    },
}
