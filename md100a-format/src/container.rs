//! Splitting a whole file into its header and strip blocks, and back.
use log::{debug, warn};

use crate::{
    error::{HeaderError, StripError},
    layout::{HEADER_LENGTH, STRIP_LENGTH, STRIP_START},
    FormatError, Header, RawStrip,
};

/// Split a file buffer into the header and the strip blocks it declares.
///
/// The buffer must hold every strip the header declares. Anything after the
/// last strip is ignored.
pub fn decode(data: &[u8]) -> Result<(Header, Vec<RawStrip>), FormatError> {
    let header = Header::from_bytes(data)?;
    // from_bytes rejects negative counts
    let n_strips = header.n_strips() as usize;
    debug!("Header declares {n_strips} strips");

    // check the whole length before trusting the count for an allocation
    let used = n_strips
        .checked_mul(STRIP_LENGTH)
        .and_then(|n| n.checked_add(STRIP_START))
        .unwrap_or(usize::MAX);
    if data.len() < used {
        let index = data.len().saturating_sub(STRIP_START) / STRIP_LENGTH;
        return Err(StripError::Truncated {
            index,
            needed: STRIP_START + (index + 1) * STRIP_LENGTH,
            available: data.len(),
        }
        .into());
    }

    let mut strips = Vec::with_capacity(n_strips);
    for index in 0..n_strips {
        let start = STRIP_START + index * STRIP_LENGTH;
        let end = start + STRIP_LENGTH;
        let block = data.get(start..end).ok_or(StripError::Truncated {
            index,
            needed: end,
            available: data.len(),
        })?;
        strips.push(RawStrip::new(block.to_vec()));
    }

    if data.len() > used {
        warn!(
            "Ignoring {} bytes after the last of {n_strips} strips",
            data.len() - used
        );
    }
    Ok((header, strips))
}

/// Assemble a file buffer from a header and complete strip blocks.
///
/// The strip count written is the number of blocks given, whatever the
/// header says, so the file is always self-consistent.
pub fn encode(header: &Header, strips: &[RawStrip]) -> Result<Vec<u8>, FormatError> {
    let n_strips =
        i32::try_from(strips.len()).map_err(|_| HeaderError::TooManyStrips(strips.len()))?;
    if header.n_strips() != n_strips {
        debug!(
            "Rewriting strip count from {} to {n_strips}",
            header.n_strips()
        );
    }
    let header = header.with_strip_count(n_strips);

    let mut data = Vec::with_capacity(HEADER_LENGTH + strips.len() * STRIP_LENGTH);
    data.extend_from_slice(&header.to_bytes());
    for (index, strip) in strips.iter().enumerate() {
        if !strip.is_complete() {
            return Err(StripError::StripLength {
                index,
                length: strip.as_ref().len(),
                expected: STRIP_LENGTH,
            }
            .into());
        }
        data.extend_from_slice(strip.as_ref());
    }
    Ok(data)
}
