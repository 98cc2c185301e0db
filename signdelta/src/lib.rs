//! This implements the sample compression used in MD100A waveform segments.
//!
//! A segment stores its first sample as an absolute big-endian 16-bit value,
//! then one byte per following sample holding the change from the previous
//! sample. The change is sign-magnitude, not two's complement: the low 7 bits
//! are the magnitude and the high bit marks a decrease. A byte can therefore
//! only express changes in -127..=127.
//!
//! ```text
//! <first: u16 BE> <delta 1: u8> <delta 2: u8> ... <delta n-1: u8>
//! ```

use delta_encoding::{DeltaDecoderExt, DeltaEncoderExt};

/// Largest change a single delta byte can hold.
pub const MAX_DELTA: i64 = 127;

/// Largest absolute first sample.
pub const MAX_FIRST: i64 = u16::MAX as i64;

/// Conversion between a signed change and its sign-magnitude byte.
pub trait SignMagnitude: Sized {
    fn decode(byte: u8) -> Self;

    /// `None` if the value is outside -127..=127.
    fn encode(self) -> Option<u8>;
}

impl SignMagnitude for i64 {
    fn decode(byte: u8) -> Self {
        if byte < 0x80 {
            i64::from(byte)
        } else {
            -(i64::from(byte) - 0x80)
        }
    }

    fn encode(self) -> Option<u8> {
        if !(-MAX_DELTA..=MAX_DELTA).contains(&self) {
            return None;
        }
        if self >= 0 {
            Some(self as u8)
        } else {
            // Same as (-(delta + 128)) & 0xff
            Some(0x80 | (-self) as u8)
        }
    }
}

/// Yields the first absolute sample followed by the decoded changes.
///
/// Stops early when the bytes run out, a first sample missing its low byte
/// yields nothing.
struct DecodeIter<'a> {
    bytes: &'a [u8],
    idx: usize,
}

impl<'a> DecodeIter<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, idx: 0 }
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx == 0 {
            let (&high, &low) = (self.bytes.first()?, self.bytes.get(1)?);
            self.idx = 2;
            // Same as high * 256 + low
            return Some(i64::from(u16::from_be_bytes([high, low])));
        }
        let byte = *self.bytes.get(self.idx)?;
        self.idx += 1;
        Some(SignMagnitude::decode(byte))
    }
}

/// first + sign-magnitude deltas -> running sum
///
/// Decodes as many samples as `segment` holds bytes for, which is one less
/// than its length for a segment of two or more bytes.
pub fn decode(segment: &[u8]) -> Vec<i64> {
    DecodeIter::new(segment).original().collect()
}

/// Output of [`encode`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    /// Number of samples that could not be represented exactly.
    pub saturated: usize,
}

/// running sum -> deltas -> sign-magnitude bytes
///
/// A first sample outside 0..=65535 or a change outside -127..=127 is
/// clamped to the nearest value the format can hold. What could not be
/// written is carried into the next change, so the decoded samples
/// catch up with the requested ones as soon as the format allows instead
/// of staying offset for the rest of the segment.
pub fn encode(samples: &[i64]) -> Encoded {
    let mut encoded = Encoded {
        bytes: Vec::with_capacity(samples.len() + 1),
        saturated: 0,
    };
    let mut carry = 0i64;
    for (position, delta) in samples.iter().copied().deltas().enumerate() {
        let wanted = delta.saturating_add(carry);
        let written = if position == 0 {
            let first = wanted.clamp(0, MAX_FIRST);
            encoded.bytes.extend_from_slice(&(first as u16).to_be_bytes());
            first
        } else {
            let change = wanted.clamp(-MAX_DELTA, MAX_DELTA);
            // clamped into range, so the byte always exists
            encoded.bytes.extend(change.encode());
            change
        };
        carry = wanted - written;
        if carry != 0 {
            encoded.saturated += 1;
        }
    }
    encoded
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use proptest::{collection::vec, prelude::*};

    use super::*;

    #[test]
    fn test_sign_magnitude_table() {
        assert_eq!(i64::decode(0), 0);
        assert_eq!(i64::decode(1), 1);
        assert_eq!(i64::decode(127), 127);
        assert_eq!(i64::decode(128), 0);
        assert_eq!(i64::decode(129), -1);
        assert_eq!(i64::decode(255), -127);

        assert_eq!(5i64.encode(), Some(5));
        assert_eq!((-1i64).encode(), Some(129));
        assert_eq!((-127i64).encode(), Some(255));
        assert_eq!(128i64.encode(), None);
        assert_eq!((-128i64).encode(), None);
    }

    #[test]
    fn test_encode_matches_reference_formula() {
        for delta in -MAX_DELTA..=MAX_DELTA {
            let reference = if delta >= 0 {
                (delta & 0xff) as u8
            } else {
                ((-(delta + 128)) & 0xff) as u8
            };
            assert_eq!(delta.encode(), Some(reference), "delta {delta}");
        }
    }

    #[test]
    fn test_decoder() {
        // 2 * 256 + 0 = 512, +3, -2, +0
        let xs = [2u8, 0, 3, 130, 0];
        assert_eq!(decode(&xs), vec![512, 515, 513, 513]);
    }

    #[test]
    fn test_decoder_short() {
        assert_eq!(decode(&[]), Vec::<i64>::new());
        assert_eq!(decode(&[2]), Vec::<i64>::new());
        assert_eq!(decode(&[1, 1]), vec![257]);
    }

    #[test]
    fn test_roundtrip() {
        let nums = [512i64, 515, 513, 513, 400, 527];
        let encoded = encode(&nums);
        assert_eq!(encoded.saturated, 0);
        assert_eq!(encoded.bytes.len(), nums.len() + 1);
        assert_eq!(decode(&encoded.bytes), nums);
    }

    #[test]
    fn test_saturation_catches_up() {
        let nums = [0i64, 300, 300, 300, 300];
        let encoded = encode(&nums);
        // 127, 254 are short, 300 reached on the third change
        assert_eq!(decode(&encoded.bytes), vec![0, 127, 254, 300, 300]);
        assert_eq!(encoded.saturated, 2);
    }

    #[test]
    fn test_first_sample_clamped() {
        let encoded = encode(&[-5, -5, 70_000]);
        assert_eq!(&encoded.bytes[..2], &[0, 0]);
        // -5 is reachable again by the first change
        assert_eq!(decode(&encoded.bytes), vec![0, -5, 122]);
        assert_eq!(encoded.saturated, 2);
    }

    #[test]
    fn test_extreme_samples() {
        // changes wrap in the delta stage, the carry saturates
        let encoded = encode(&[i64::MAX, i64::MIN, 0]);
        assert_eq!(encoded.bytes.len(), 4);
        assert_eq!(encoded.saturated, 3);
        assert_eq!(decode(&encoded.bytes), vec![65535, 65662, 65535]);
    }

    fn in_range_segment() -> impl Strategy<Value = Vec<i64>> {
        (0..=MAX_FIRST, vec(-MAX_DELTA..=MAX_DELTA, 0..600)).prop_map(|(first, deltas)| {
            std::iter::once(first)
                .chain(deltas)
                .scan(0, |acc, d| {
                    *acc += d;
                    Some(*acc)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn proptest_round_trip(ref nums in in_range_segment()) {
            let encoded = encode(nums);
            prop_assert_eq!(encoded.saturated, 0);
            prop_assert_eq!(&decode(&encoded.bytes), nums);
        }

        #[test]
        fn proptest_decode_length(ref bytes in vec(any::<u8>(), 0..600)) {
            let expected = bytes.len().saturating_sub(1);
            prop_assert_eq!(decode(bytes).len(), if bytes.len() < 2 { 0 } else { expected });
        }
    }
}
