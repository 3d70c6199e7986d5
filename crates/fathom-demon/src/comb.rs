//! Harmonic comb scoring of a candidate blade-passing frequency.

use serde::{Deserialize, Serialize};

use fathom_core::constants::DEMON_COMB_HARMONICS;

const HIT_MIN_PROMINENCE: f64 = 0.08;
const HIT_MIN_VALUE: f64 = 0.1;
/// Prominence that earns a harmonic its full weight.
const FULL_PROMINENCE: f64 = 0.35;
const NOISE_RING_BINS: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CombScore {
    /// Weighted harmonic support, 0..=1.
    pub score: f64,
    pub harmonic_hits: u32,
    /// Harmonics that fit inside the spectrum.
    pub harmonic_count: u32,
}

/// Score how well `bpf_hz` and its harmonics explain `spectrum`.
///
/// Harmonic `k` is weighted `1/sqrt(k)`. Its contribution is its
/// prominence over a ring of neighboring bins just outside the tolerance
/// window, scaled to full credit at `FULL_PROMINENCE`.
pub fn score_comb(spectrum: &[f64], bpf_hz: f64) -> CombScore {
    let len = spectrum.len();
    if len < 3 || !bpf_hz.is_finite() || bpf_hz < 1.0 {
        return CombScore::default();
    }
    let max_freq = (len - 1) as f64;

    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    let mut hits = 0;
    let mut count = 0;

    for k in 1..=DEMON_COMB_HARMONICS {
        let f = k as f64 * bpf_hz;
        if f > max_freq - 1.0 {
            break;
        }
        let tol = (0.03 * f).max(1.0);
        let lo = ((f - tol).round().max(1.0)) as usize;
        let hi = ((f + tol).round() as usize).min(len - 1);
        let value = spectrum[lo..=hi].iter().cloned().fold(0.0, f64::max);

        let center = f.round() as usize;
        let reach = tol.ceil() as usize;
        let ring: Vec<f64> = (reach + 1..=reach + NOISE_RING_BINS)
            .flat_map(|d| [center.checked_sub(d), Some(center + d)])
            .flatten()
            .filter(|&j| j >= 1 && j < len)
            .map(|j| spectrum[j])
            .collect();
        let noise = if ring.is_empty() {
            0.0
        } else {
            ring.iter().sum::<f64>() / ring.len() as f64
        };
        let prominence = value - noise;

        let weight = 1.0 / (k as f64).sqrt();
        total_weight += weight;
        weighted += weight * (prominence / FULL_PROMINENCE).clamp(0.0, 1.0);
        count += 1;
        if prominence >= HIT_MIN_PROMINENCE && value >= HIT_MIN_VALUE {
            hits += 1;
        }
    }

    CombScore {
        score: if total_weight > 0.0 {
            (weighted / total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        },
        harmonic_hits: hits,
        harmonic_count: count,
    }
}
