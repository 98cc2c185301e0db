//! Beat-to-beat interval statistics and the respiratory sinus arrhythmia
//! (RSA) step function derived from peak indices.
//!
//! Peak indices are expected in ascending order, as produced by
//! [`crate::peaks::peak_indices`].
use itertools::Itertools;
use md100a_format::layout::INDEX_TO_SEC;

use crate::filter::median::median;

/// Intervals further than this fraction from the typical interval are
/// treated as missed or extra beats.
pub const RSA_OUTLIER_FRACTION: f64 = 0.2;

/// Mean of the values within `fraction` of their median, 0 if none are.
fn trimmed_mean(values: &[f64], fraction: f64) -> f64 {
    let mut scratch: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let center = median(&mut scratch);
    if center.is_nan() {
        return 0.0;
    }
    let (a, b) = ((1.0 - fraction) * center, (1.0 + fraction) * center);
    let (lo, hi) = (a.min(b), a.max(b));
    let (count, sum) = scratch
        .iter()
        .filter(|&&v| v > lo && v < hi)
        .fold((0usize, 0.0), |(c, s), v| (c + 1, s + v));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn intervals(peaks: &[usize]) -> Vec<f64> {
    peaks
        .iter()
        .tuple_windows()
        .map(|(&prev, &next)| next as f64 - prev as f64)
        .collect()
}

/// Mean number of samples between consecutive peaks, ignoring outliers.
/// 0 with fewer than three peaks.
///
/// Intervals are kept when they lie within `fraction` of the median
/// interval. The MD100A desktop software measures that band around the
/// plain mean instead, so a single long gap from a missed beat shifts its
/// band and its result. Here such a gap is dropped and the regular
/// intervals keep their mean.
pub fn average_peak_interval(peaks: &[usize], fraction: f64) -> f64 {
    let deltas = intervals(peaks);
    if deltas.len() < 2 {
        return 0.0;
    }
    trimmed_mean(&deltas, fraction)
}

/// Typical peak amplitude, ignoring outliers. 0 for no values.
pub fn average_peak_value(values: &[f64], fraction: f64) -> f64 {
    trimmed_mean(values, fraction)
}

/// Heart rate in beats per minute from the typical peak interval.
pub fn average_heart_rate(peaks: &[usize], fraction: f64) -> Option<f64> {
    let interval = average_peak_interval(peaks, fraction);
    (interval > 0.0).then(|| 60.0 / (interval * INDEX_TO_SEC))
}

/// RSA only makes sense once an interval has both neighbours.
pub fn rsa_is_meaningful(peaks: &[usize]) -> bool {
    peaks.len() >= 3
}

/// One value per sample: from each peak on, how much longer (in seconds)
/// the interval ending at that peak was than the typical one. NaN before
/// the second peak, and everywhere with fewer than two peaks.
pub fn rsa_array(peaks: &[usize], samples: &[f64], fraction: f64) -> Vec<f64> {
    let n = samples.len();
    let mut rsa = vec![f64::NAN; n];
    let average = average_peak_interval(peaks, fraction);
    let ends = peaks.iter().skip(2).copied().chain(std::iter::once(n));
    for ((&prev, &peak), end) in peaks.iter().tuple_windows().zip(ends) {
        let start = peak.min(n);
        let value = INDEX_TO_SEC * (peak as f64 - prev as f64 - average);
        rsa[start..end.clamp(start, n)].fill(value);
    }
    rsa
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use proptest::{collection::btree_set, prelude::*};

    use super::*;

    fn peaks_from_intervals(intervals: &[usize]) -> Vec<usize> {
        std::iter::once(0)
            .chain(intervals.iter().scan(0, |acc, d| {
                *acc += d;
                Some(*acc)
            }))
            .collect()
    }

    #[test]
    fn test_interval_excludes_outlier() {
        let peaks = peaks_from_intervals(&[10, 10, 10, 10, 100]);
        assert_eq!(average_peak_interval(&peaks, 0.2), 10.0);
    }

    #[test]
    fn test_interval_centered_on_median() {
        // a mean of 112 would keep all five intervals
        let peaks = peaks_from_intervals(&[100, 100, 100, 130, 130]);
        assert_eq!(average_peak_interval(&peaks, 0.2), 100.0);
    }

    #[test]
    fn test_interval_too_few_peaks() {
        assert_eq!(average_peak_interval(&[], 0.2), 0.0);
        assert_eq!(average_peak_interval(&[5], 0.2), 0.0);
        assert_eq!(average_peak_interval(&[5, 200], 0.2), 0.0);
        assert_eq!(average_peak_interval(&[5, 200, 390], 0.2), 192.5);
    }

    #[test]
    fn test_peak_value() {
        assert_eq!(average_peak_value(&[], 0.2), 0.0);
        assert_eq!(average_peak_value(&[100.0, 110.0, 90.0, 400.0], 0.2), 100.0);
        assert_eq!(average_peak_value(&[-100.0, -110.0, -90.0], 0.2), -100.0);
    }

    #[test]
    fn test_heart_rate() {
        // 250 samples = 1 s between beats
        let peaks = [10, 260, 510, 760];
        let bpm = average_heart_rate(&peaks, RSA_OUTLIER_FRACTION).unwrap();
        assert!((bpm - 60.0).abs() < 1e-9);
        assert_eq!(average_heart_rate(&[10, 260], RSA_OUTLIER_FRACTION), None);
    }

    #[test]
    fn test_rsa_steps() {
        let samples = vec![0.0; 40];
        let peaks = [5, 15, 27, 35];
        // intervals 10, 12, 8 -> median 10, only 10 is strictly inside (8, 12)
        let average = average_peak_interval(&peaks, 0.2);
        assert_eq!(average, 10.0);
        let rsa = rsa_array(&peaks, &samples, 0.2);
        assert_eq!(rsa.len(), 40);
        assert!(rsa[..15].iter().all(|v| v.is_nan()));
        assert!(rsa[15..27].iter().all(|&v| v == 0.0));
        assert!(rsa[27..35]
            .iter()
            .all(|&v| (v - 2.0 * INDEX_TO_SEC).abs() < 1e-12));
        assert!(rsa[35..]
            .iter()
            .all(|&v| (v + 2.0 * INDEX_TO_SEC).abs() < 1e-12));
    }

    #[test]
    fn test_rsa_too_few_peaks() {
        let samples = vec![0.0; 20];
        assert!(rsa_array(&[], &samples, 0.2).iter().all(|v| v.is_nan()));
        assert!(rsa_array(&[4], &samples, 0.2).iter().all(|v| v.is_nan()));
        assert!(!rsa_is_meaningful(&[4, 9]));
        assert!(rsa_is_meaningful(&[4, 9, 14]));
    }

    #[test]
    fn test_rsa_peak_past_end() {
        let samples = vec![0.0; 20];
        let rsa = rsa_array(&[2, 10, 25], &samples, 0.2);
        assert!(rsa[..10].iter().all(|v| v.is_nan()));
        assert!(rsa[10..].iter().all(|v| v.is_finite()));
    }

    proptest! {
        #[test]
        fn proptest_nan_before_second_peak(peaks in btree_set(0usize..500, 2..20)) {
            let peaks: Vec<usize> = peaks.into_iter().collect();
            let samples = vec![0.0; 500];
            let rsa = rsa_array(&peaks, &samples, RSA_OUTLIER_FRACTION);
            prop_assert_eq!(rsa.len(), samples.len());
            prop_assert!(rsa[..peaks[1]].iter().all(|v| v.is_nan()));
            prop_assert!(rsa[peaks[1]..].iter().all(|v| v.is_finite()));
        }
    }
}
