//! Causal Butterworth IIR filters built from second-order sections.
//!
//! Both filters run forward only, sample by sample, so the output lags the
//! input the way it would on the recorder itself.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Normalized biquad coefficients (`a0 == 1`).
///
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Biquad {
    pub const fn new(b0: f64, b1: f64, b2: f64, a1: f64, a2: f64) -> Self {
        Self { b0, b1, b2, a1, a2 }
    }

    /// 2-pole Butterworth low-pass, bilinear transform with prewarping.
    pub fn low_pass(sample_rate: f64, cutoff: f64) -> Self {
        let omega = 2.0 * PI * cutoff / sample_rate;
        let (sin_omega, cos_omega) = omega.sin_cos();
        // Q = 1/sqrt(2)
        let alpha = sin_omega / (2.0 * FRAC_1_SQRT_2);

        let a0 = 1.0 + alpha;
        let b0 = (1.0 - cos_omega) / 2.0;
        Self {
            b0: b0 / a0,
            b1: (1.0 - cos_omega) / a0,
            b2: b0 / a0,
            a1: -2.0 * cos_omega / a0,
            a2: (1.0 - alpha) / a0,
        }
    }
}

/// 0.5 to 75 Hz band-pass at 250 Hz, 3rd order per edge (6 poles), as
/// three cascaded sections.
pub const BAND_PASS: [Biquad; 3] = [
    Biquad::new(
        0.632_324_456_935_955_2,
        0.0,
        -0.632_324_456_935_955_2,
        -1.987_412_205_424_456_3,
        0.987_569_845_352_129_9,
    ),
    Biquad::new(
        0.632_324_456_935_955_2,
        0.0,
        -0.632_324_456_935_955_2,
        0.416_918_166_911_102_7,
        0.358_151_837_300_466_57,
    ),
    Biquad::new(
        0.632_324_456_935_955_2,
        0.0,
        -0.632_324_456_935_955_2,
        -0.833_507_636_434_137,
        -0.151_949_956_008_605_4,
    ),
];

/// Direct form I delay line of one section.
#[derive(Debug, Default, Clone, Copy)]
struct Delay {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Delay {
    fn step(&mut self, c: &Biquad, x: f64) -> f64 {
        let y = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

/// Runs `data` through `sections` in order.
///
/// A NaN sample is fed to the filter as 0 and comes out as NaN, so one
/// missing segment does not blank the rest of the strip.
pub fn cascade(sections: &[Biquad], data: &[f64]) -> Vec<f64> {
    let mut delays = vec![Delay::default(); sections.len()];
    data.iter()
        .map(|&x| {
            let input = if x.is_nan() { 0.0 } else { x };
            let y = sections
                .iter()
                .zip(delays.iter_mut())
                .fold(input, |acc, (section, delay)| delay.step(section, acc));
            if x.is_nan() {
                f64::NAN
            } else {
                y
            }
        })
        .collect()
}

pub fn band_pass(data: &[f64]) -> Vec<f64> {
    cascade(&BAND_PASS, data)
}

pub fn low_pass(data: &[f64], sample_rate: f64, cutoff: f64) -> Vec<f64> {
    cascade(&[Biquad::low_pass(sample_rate, cutoff)], data)
}

#[cfg(test)]
mod test {
    use super::*;

    const FS: f64 = 250.0;

    fn sine(freq: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / FS).sin())
            .collect()
    }

    fn max_abs(xs: &[f64]) -> f64 {
        xs.iter().fold(0.0, |acc, x| acc.max(x.abs()))
    }

    #[test]
    fn test_low_pass_unity_dc_gain() {
        let c = Biquad::low_pass(FS, 8.0);
        let gain = (c.b0 + c.b1 + c.b2) / (1.0 + c.a1 + c.a2);
        assert!((gain - 1.0).abs() < 1e-12, "{gain}");

        let out = low_pass(&[50.0; 1000], FS, 8.0);
        assert!((out[999] - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_low_pass_attenuates_high_frequency() {
        let out = low_pass(&sine(100.0, 2000), FS, 8.0);
        assert!(max_abs(&out[1000..]) < 0.05);
    }

    #[test]
    fn test_band_pass_blocks_dc() {
        let out = band_pass(&[100.0; 7500]);
        assert!(max_abs(&out[7000..]) < 1e-6);
    }

    #[test]
    fn test_band_pass_passes_ten_hz() {
        let out = band_pass(&sine(10.0, 7500));
        let peak = max_abs(&out[6000..]);
        assert!((0.95..1.05).contains(&peak), "{peak}");
    }

    #[test]
    fn test_band_pass_cuts_high_frequency() {
        let out = band_pass(&sine(120.0, 7500));
        assert!(max_abs(&out[6000..]) < 0.01);
    }

    #[test]
    fn test_nan_stays_local() {
        let mut data = vec![1.0; 100];
        data[5] = f64::NAN;
        let out = low_pass(&data, FS, 8.0);
        assert!(out[5].is_nan());
        assert!(out.iter().enumerate().all(|(i, y)| i == 5 || y.is_finite()));
    }

    #[test]
    fn test_empty() {
        assert!(band_pass(&[]).is_empty());
    }
}
