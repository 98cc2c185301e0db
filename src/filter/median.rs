//! Centered sliding-window median.
//!
//! Used to estimate the slowly wandering baseline of a strip, which is then
//! subtracted before looking for R peaks.
//!
//! The window for sample `i` covers `[i - w/2, i - w/2 + w - 1]`. Near the
//! ends of the array the window shrinks to the samples that exist instead
//! of padding. NaN samples (from a truncated segment) are left out of the
//! window; a window with nothing but NaN gives NaN.

/// Median of every centered window of `window` samples.
///
/// A `window` of 0 is treated as 1, which returns the input unchanged.
pub fn median_filter(data: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let before = window / 2;
    let after = window - before;
    let mut scratch = Vec::with_capacity(window);
    (0..data.len())
        .map(|i| {
            let lo = i.saturating_sub(before);
            let hi = (i + after).min(data.len());
            scratch.clear();
            scratch.extend(data[lo..hi].iter().copied().filter(|v| !v.is_nan()));
            median(&mut scratch)
        })
        .collect()
}

/// Median of `values`, reordering them. Even counts average the two middle
/// values. NaN for an empty slice.
pub(crate) fn median(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    let mid = n / 2;
    let (lower, upper, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    if n % 2 == 1 {
        *upper
    } else {
        let below = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (below + *upper) / 2.0
    }
}
