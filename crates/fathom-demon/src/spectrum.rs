//! Envelope spectrum: direct DFT, self-noise notch, whitening, smoothing.
//!
//! Spectra are indexed by integer frequency in Hz. Index 0 (DC) is kept
//! at zero so that `spectrum[f]` is the magnitude at `f` Hz.

use std::f64::consts::PI;

/// Hann-windowed DFT magnitude at each integer frequency in `1..=max_freq_hz`.
///
/// Normalized by the window sum, so a unit-amplitude cosine reads about 0.5.
pub fn envelope_spectrum(envelope: &[f64], rate: f64, max_freq_hz: usize) -> Vec<f64> {
    let mut spectrum = vec![0.0; max_freq_hz + 1];
    let n = envelope.len();
    if n < 2 || !(rate > 0.0) {
        return spectrum;
    }

    let window: Vec<f64> = (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect();
    let window_sum: f64 = window.iter().sum();
    if window_sum <= 0.0 {
        return spectrum;
    }

    for (f, bin) in spectrum.iter_mut().enumerate().skip(1) {
        let omega = 2.0 * PI * f as f64 / rate;
        let (mut re, mut im) = (0.0, 0.0);
        for (i, (&x, &w)) in envelope.iter().zip(&window).enumerate() {
            let phase = omega * i as f64;
            let v = x * w;
            re += v * phase.cos();
            im -= v * phase.sin();
        }
        *bin = (re * re + im * im).sqrt() / window_sum;
    }
    spectrum
}

/// Attenuate own-ship blade harmonics with Gaussian notches.
pub fn apply_self_noise_notch(spectrum: &mut [f64], own_bpf_hz: f64, depth: f64, width_hz: f64) {
    if !(own_bpf_hz > 0.0) || !own_bpf_hz.is_finite() || !(width_hz > 0.0) {
        return;
    }
    let depth = depth.clamp(0.0, 1.0);
    let max_freq = spectrum.len().saturating_sub(1) as f64;
    let harmonics: Vec<f64> = (1..)
        .map(|k| k as f64 * own_bpf_hz)
        .take_while(|&h| h <= max_freq + 3.0 * width_hz)
        .collect();

    for (f, bin) in spectrum.iter_mut().enumerate().skip(1) {
        let f = f as f64;
        for &h in &harmonics {
            let z = (f - h) / width_hz;
            *bin *= 1.0 - depth * (-0.5 * z * z).exp();
        }
    }
}

/// Subtract a scaled local mean (center excluded), clamp at zero, and
/// normalize to the strongest bin. An all-zero result stays zero.
pub fn whiten(spectrum: &[f64], radius: usize, factor: f64) -> Vec<f64> {
    let len = spectrum.len();
    let mut out = vec![0.0; len];
    if len < 2 {
        return out;
    }
    let max_idx = len - 1;

    for i in 1..=max_idx {
        let lo = i.saturating_sub(radius).max(1);
        let hi = (i + radius).min(max_idx);
        let (sum, count) = (lo..=hi)
            .filter(|&j| j != i)
            .fold((0.0, 0usize), |(s, c), j| (s + spectrum[j], c + 1));
        let mean = if count > 0 { sum / count as f64 } else { 0.0 };
        out[i] = (spectrum[i] - factor * mean).max(0.0);
    }

    let peak = out.iter().cloned().fold(0.0, f64::max);
    if peak > 0.0 {
        for v in &mut out {
            *v /= peak;
        }
    }
    out
}

/// Attack and release coefficients for a responsiveness in [0, 1].
pub fn smoothing_coefficients(responsiveness: f64) -> (f64, f64) {
    let r = if responsiveness.is_finite() {
        responsiveness.clamp(0.0, 1.0)
    } else {
        0.5
    };
    (0.2 + 0.6 * r, 0.05 + 0.3 * r)
}

/// Asymmetric exponential smoothing of `fresh` into `smoothed`.
pub fn smooth_into(smoothed: &mut Vec<f64>, fresh: &[f64], responsiveness: f64) {
    if smoothed.len() != fresh.len() {
        *smoothed = fresh.to_vec();
        return;
    }
    let (attack, release) = smoothing_coefficients(responsiveness);
    for (s, &f) in smoothed.iter_mut().zip(fresh) {
        let k = if f > *s { attack } else { release };
        *s += (f - *s) * k;
    }
}

/// Fraction of spectral energy within one bin of any of `peaks_hz`.
pub fn signal_quality(spectrum: &[f64], peaks_hz: &[f64]) -> f64 {
    let total: f64 = spectrum.iter().skip(1).map(|v| v * v).sum();
    if total <= 0.0 || peaks_hz.is_empty() {
        return 0.0;
    }
    let near: f64 = spectrum
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(f, _)| peaks_hz.iter().any(|p| (*f as f64 - p).abs() <= 1.0))
        .map(|(_, v)| v * v)
        .sum();
    (near / total).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tone(freq: f64, rate: f64, n: usize, amp: f64) -> Vec<f64> {
        (0..n)
            .map(|i| amp * (2.0 * PI * freq * i as f64 / rate).cos())
            .collect()
    }

    #[test]
    fn test_dft_peaks_at_tone() {
        let bins = envelope_spectrum(&tone(18.0, 500.0, 1000, 1.0), 500.0, 120);
        assert_eq!(bins.len(), 121);
        assert_eq!(bins[0], 0.0);
        let peak = (1..=120)
            .max_by(|&a, &b| bins[a].total_cmp(&bins[b]))
            .unwrap();
        assert_eq!(peak, 18);
        assert_abs_diff_eq!(bins[18], 0.5, epsilon = 0.02);
        assert!(bins[40] < 0.01);
    }

    #[test]
    fn test_whiten_normalizes_and_keeps_zero() {
        let mut bins = vec![0.1; 31];
        bins[0] = 0.0;
        bins[10] = 1.0;
        let w = whiten(&bins, 3, 0.92);
        assert_abs_diff_eq!(w[10], 1.0, epsilon = 1e-12);
        assert!(w.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(w[20] < 0.05, "flat floor mostly removed");

        let zero = whiten(&vec![0.0; 31], 3, 0.92);
        assert!(zero.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_notch_attenuates_own_harmonics() {
        let mut bins = vec![1.0; 121];
        apply_self_noise_notch(&mut bins, 20.0, 0.85, 0.8);
        assert_abs_diff_eq!(bins[20], 0.15, epsilon = 1e-9);
        assert_abs_diff_eq!(bins[40], 0.15, epsilon = 1e-9);
        assert!(bins[30] > 0.99);
        assert!(bins[21] > 0.15 && bins[21] < 1.0);
    }

    #[test]
    fn test_smoothing_is_asymmetric() {
        let mut s = vec![0.0, 0.0, 1.0];
        smooth_into(&mut s, &[0.0, 1.0, 0.0], 0.5);
        assert_abs_diff_eq!(s[1], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(s[2], 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_signal_quality_fraction() {
        let mut bins = vec![0.0; 11];
        bins[5] = 1.0;
        bins[9] = 1.0;
        assert_abs_diff_eq!(signal_quality(&bins, &[5.0]), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(signal_quality(&bins, &[5.0, 9.0]), 1.0, epsilon = 1e-12);
        assert_eq!(signal_quality(&bins, &[]), 0.0);
    }
}
