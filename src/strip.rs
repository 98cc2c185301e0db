//! Decoded strips: the waveform codec on top of a [`RawStrip`] and the
//! lazily computed values derived from it.
use std::cell::OnceCell;

use log::{debug, warn};
use md100a_format::{
    layout::{
        BASELINE, SEGMENT_LENGTH, SEGMENT_N_DATA_VALS, STRIP_DATA_START, STRIP_N_DATA_SEGMENTS,
        STRIP_N_DATA_VALS,
    },
    FormatError, RawStrip, StripMetadata,
};

use crate::{
    filter::{FilterParams, ProcessingMode},
    peaks::{self, PeakDetector},
    rsa,
};

/// Decode the waveform bytes that follow a strip preamble into 7500
/// zero-centered samples.
///
/// Samples the bytes run out before are NaN, so a cut-off strip still
/// lines up in time with complete ones.
pub fn decode_waveform(waveform: &[u8]) -> Vec<f64> {
    let baseline = i64::from(BASELINE);
    let mut samples = Vec::with_capacity(STRIP_N_DATA_VALS);
    let mut segments = waveform.chunks(SEGMENT_LENGTH);
    for index in 0..STRIP_N_DATA_SEGMENTS {
        let bytes = segments.next().unwrap_or_default();
        let decoded = signdelta::decode(bytes);
        if decoded.len() < SEGMENT_N_DATA_VALS {
            warn!(
                "Segment {index} holds {} of {SEGMENT_N_DATA_VALS} samples, filling with NaN",
                decoded.len()
            );
        }
        samples.extend(decoded.into_iter().map(|v| (v - baseline) as f64));
        samples.resize((index + 1) * SEGMENT_N_DATA_VALS, f64::NAN);
    }
    samples
}

/// What was lost while encoding a waveform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Samples whose change from the previous sample was too large to store.
    pub saturated: usize,
    /// NaN or infinite samples, stored as a repeat of the previous sample.
    pub non_finite: usize,
}

impl EncodeStats {
    pub fn is_lossless(&self) -> bool {
        self.saturated == 0 && self.non_finite == 0
    }
}

impl std::ops::AddAssign for EncodeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.saturated += rhs.saturated;
        self.non_finite += rhs.non_finite;
    }
}

/// Round half up to the nearest integer and restore the baseline.
///
/// Values beyond twice the largest first sample are pinned there. No
/// segment can reach them, so the codec counts them as saturated.
fn to_raw(sample: f64) -> i64 {
    let limit = 2.0 * signdelta::MAX_FIRST as f64;
    (sample + 0.5).floor().clamp(-limit, limit) as i64 + i64::from(BASELINE)
}

/// Encode `samples` behind `preamble` into a complete strip block.
///
/// The preamble is copied verbatim, padded with zeros or cut to 26 bytes.
/// Missing samples past the end of `samples` are encoded like NaN ones;
/// samples past 7500 are dropped.
pub fn encode_waveform(preamble: &[u8], samples: &[f64]) -> (RawStrip, EncodeStats) {
    let mut block = Vec::with_capacity(STRIP_DATA_START + SEGMENT_LENGTH * STRIP_N_DATA_SEGMENTS);
    block.extend(preamble.iter().copied().take(STRIP_DATA_START));
    block.resize(STRIP_DATA_START, 0);
    if samples.len() > STRIP_N_DATA_VALS {
        warn!(
            "Dropping {} samples past the end of the strip",
            samples.len() - STRIP_N_DATA_VALS
        );
    }

    let mut stats = EncodeStats::default();
    for index in 0..STRIP_N_DATA_SEGMENTS {
        let start = index * SEGMENT_N_DATA_VALS;
        let mut previous = i64::from(BASELINE);
        let raw: Vec<i64> = (start..start + SEGMENT_N_DATA_VALS)
            .map(|i| match samples.get(i) {
                Some(s) if s.is_finite() => {
                    previous = to_raw(*s);
                    previous
                }
                _ => {
                    stats.non_finite += 1;
                    previous
                }
            })
            .collect();
        let encoded = signdelta::encode(&raw);
        stats.saturated += encoded.saturated;
        block.extend(encoded.bytes);
    }

    if stats.saturated > 0 {
        warn!(
            "{} samples changed too fast to be stored exactly",
            stats.saturated
        );
    }
    if stats.non_finite > 0 {
        debug!("{} missing samples stored as repeats", stats.non_finite);
    }
    (RawStrip::new(block), stats)
}

/// One 30 second recording.
///
/// Samples and peak indices are computed on first use and kept until the
/// strip is changed through [`Strip::replace_samples`] or
/// [`Strip::invalidate`].
#[derive(Debug, Clone)]
pub struct Strip {
    raw: RawStrip,
    metadata: StripMetadata,
    samples: OnceCell<Vec<f64>>,
    peaks: OnceCell<Vec<usize>>,
}

impl Strip {
    pub fn new(raw: RawStrip) -> Result<Self, FormatError> {
        let metadata = raw.metadata()?;
        Ok(Self {
            raw,
            metadata,
            samples: OnceCell::new(),
            peaks: OnceCell::new(),
        })
    }

    pub fn raw(&self) -> &RawStrip {
        &self.raw
    }

    pub fn metadata(&self) -> &StripMetadata {
        &self.metadata
    }

    pub fn samples(&self) -> &[f64] {
        self.samples
            .get_or_init(|| decode_waveform(self.raw.waveform()))
    }

    /// Peaks of the unprocessed samples.
    pub fn peak_indices(&self) -> &[usize] {
        self.peaks
            .get_or_init(|| PeakDetector::default().peak_indices(self.samples()))
    }

    pub fn peak_values(&self) -> Vec<f64> {
        peaks::peak_values(self.samples(), self.peak_indices())
    }

    pub fn rsa_array(&self, fraction: f64) -> Vec<f64> {
        rsa::rsa_array(self.peak_indices(), self.samples(), fraction)
    }

    pub fn average_peak_interval(&self, fraction: f64) -> f64 {
        rsa::average_peak_interval(self.peak_indices(), fraction)
    }

    pub fn average_heart_rate(&self, fraction: f64) -> Option<f64> {
        rsa::average_heart_rate(self.peak_indices(), fraction)
    }

    pub fn processed(&self, mode: ProcessingMode, params: &FilterParams) -> Vec<f64> {
        mode.process(params, self.samples())
    }

    /// Encode `samples` with this strip's preamble, leaving the strip as is.
    pub fn encode_samples(&self, samples: &[f64]) -> (RawStrip, EncodeStats) {
        encode_waveform(self.raw.preamble(), samples)
    }

    /// Store `samples` as the new waveform. The cached samples are decoded
    /// again from the stored block, so they show any rounding or saturation.
    pub fn replace_samples(&mut self, samples: &[f64]) -> EncodeStats {
        let (raw, stats) = self.encode_samples(samples);
        self.raw = raw;
        self.invalidate();
        stats
    }

    /// Drop the cached samples and peaks.
    pub fn invalidate(&mut self) {
        self.samples = OnceCell::new();
        self.peaks = OnceCell::new();
    }
}

#[cfg(test)]
pub(crate) mod test {
    use md100a_format::layout::{STRIP_LENGTH, STRIP_MARKER};
    use pretty_assertions::assert_eq;
    use proptest::{collection::vec, prelude::*};

    use super::*;

    pub(crate) fn preamble() -> Vec<u8> {
        let fields: [i16; 12] = [0, 2024, 3, 0, 17, 9, 41, 5, 0, 13, 72, 0];
        let mut bytes: Vec<u8> = fields.iter().flat_map(|f| f.to_le_bytes()).collect();
        bytes.extend_from_slice(&STRIP_MARKER);
        bytes
    }

    /// Each segment starts at raw 512 and climbs by one per sample.
    pub(crate) fn ramp_block() -> Vec<u8> {
        let mut block = preamble();
        for _ in 0..STRIP_N_DATA_SEGMENTS {
            block.extend_from_slice(&[2, 0]);
            block.extend(std::iter::repeat(1u8).take(SEGMENT_N_DATA_VALS - 1));
        }
        block
    }

    #[test]
    fn test_ramp() {
        let block = ramp_block();
        assert_eq!(block.len(), STRIP_LENGTH);
        let samples = decode_waveform(&block[STRIP_DATA_START..]);
        assert_eq!(samples.len(), STRIP_N_DATA_VALS);
        for (i, s) in samples.iter().enumerate() {
            assert_eq!(*s, (i % SEGMENT_N_DATA_VALS) as f64);
        }
    }

    #[test]
    fn test_truncated_segment_is_nan() {
        let block = ramp_block();
        // first segment complete, second cut after its first sample and 9 deltas
        let cut = STRIP_DATA_START + SEGMENT_LENGTH + 11;
        let samples = decode_waveform(&block[STRIP_DATA_START..cut]);
        assert_eq!(samples.len(), STRIP_N_DATA_VALS);
        assert_eq!(samples[499], 499.0);
        assert_eq!(samples[509], 9.0);
        assert!(samples[510..].iter().all(|s| s.is_nan()));
    }

    #[test]
    fn test_lone_first_byte_is_nan() {
        let block = ramp_block();
        let cut = STRIP_DATA_START + SEGMENT_LENGTH + 1;
        let samples = decode_waveform(&block[STRIP_DATA_START..cut]);
        assert!(samples[500].is_nan());
    }

    #[test]
    fn test_encode_keeps_block() -> eyre::Result<()> {
        let block = ramp_block();
        let strip = Strip::new(RawStrip::new(block.clone()))?;
        let (raw, stats) = strip.encode_samples(strip.samples());
        assert!(stats.is_lossless());
        assert_eq!(raw.as_ref(), &block[..]);
        Ok(())
    }

    #[test]
    fn test_encode_rounds_half_up() {
        let (raw, _) = encode_waveform(&preamble(), &[0.5, 1.49, -0.5, -0.51]);
        let samples = decode_waveform(raw.waveform());
        assert_eq!(&samples[..4], &[1.0, 1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_encode_missing_samples() {
        let mut samples = vec![3.0; 10];
        samples[4] = f64::NAN;
        let (raw, stats) = encode_waveform(&preamble(), &samples);
        assert!(raw.is_complete());
        assert_eq!(stats.non_finite, STRIP_N_DATA_VALS - 9);
        let decoded = decode_waveform(raw.waveform());
        assert_eq!(&decoded[..10], &[3.0; 10]);
        // later segments have nothing to repeat and sit on the baseline
        assert!(decoded[500..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_encode_saturation_counted() {
        let mut samples = vec![0.0; STRIP_N_DATA_VALS];
        samples[10..20].fill(300.0);
        let (raw, stats) = encode_waveform(&preamble(), &samples);
        assert_eq!(stats.saturated, 4);
        let decoded = decode_waveform(raw.waveform());
        assert_eq!(&decoded[10..13], &[127.0, 254.0, 300.0]);
        assert_eq!(&decoded[20..23], &[173.0, 46.0, 0.0]);
    }

    #[test]
    fn test_encode_huge_values() {
        let (raw, stats) = encode_waveform(&preamble(), &[1e19, -1e19, 0.0]);
        assert!(raw.is_complete());
        assert_eq!(stats.non_finite, STRIP_N_DATA_VALS - 3);
        // the first segment never catches up
        assert_eq!(stats.saturated, SEGMENT_N_DATA_VALS);
        let decoded = decode_waveform(raw.waveform());
        assert_eq!(&decoded[..3], &[65023.0, 64896.0, 64769.0]);
        assert!(decoded[SEGMENT_N_DATA_VALS..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_strip_metadata() -> eyre::Result<()> {
        let strip = Strip::new(RawStrip::new(ramp_block()))?;
        assert_eq!(strip.metadata().year, 2024);
        assert_eq!(strip.metadata().heart_rate, 72);
        assert!(Strip::new(RawStrip::new(vec![0; 10])).is_err());
        Ok(())
    }

    #[test]
    fn test_replace_samples() -> eyre::Result<()> {
        let mut strip = Strip::new(RawStrip::new(ramp_block()))?;
        assert_eq!(strip.samples()[1], 1.0);
        let flat = vec![-7.0; STRIP_N_DATA_VALS];
        let stats = strip.replace_samples(&flat);
        assert!(stats.is_lossless());
        assert_eq!(strip.samples(), &flat[..]);
        assert_eq!(strip.raw().preamble(), &preamble()[..]);
        assert!(strip.peak_indices().is_empty());
        Ok(())
    }

    proptest! {
        #[test]
        fn proptest_decode_length(ref waveform in vec(any::<u8>(), 0..8000)) {
            prop_assert_eq!(decode_waveform(waveform).len(), STRIP_N_DATA_VALS);
        }

        #[test]
        fn proptest_encode_keeps_in_range(
            ref firsts in vec(-512i64..2000, STRIP_N_DATA_SEGMENTS),
            ref steps in vec(-127i64..=127, STRIP_N_DATA_VALS),
        ) {
            // each segment restarts from a storable absolute value
            let samples: Vec<f64> = steps
                .chunks(SEGMENT_N_DATA_VALS)
                .zip(firsts)
                .flat_map(|(chunk, &first)| {
                    std::iter::once(first).chain(chunk[1..].iter().scan(first, |acc, d| {
                        *acc += d;
                        Some(*acc)
                    }))
                })
                .map(|v| v as f64)
                .collect();
            let (raw, stats) = encode_waveform(&preamble(), &samples);
            prop_assert!(stats.is_lossless());
            prop_assert_eq!(raw.preamble(), &preamble()[..]);
            prop_assert_eq!(decode_waveform(raw.waveform()), samples);
        }
    }
}
