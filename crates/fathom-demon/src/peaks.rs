//! Peak candidates and frame-to-frame peak tracks.

use serde::{Deserialize, Serialize};

use fathom_core::constants::*;

/// Track strength multiplier for every frame a track goes unmatched.
const TRACK_DECAY: f64 = 0.86;
/// Candidates kept per frame.
const MAX_CANDIDATES: usize = 12;
/// Tracks younger than this count as stable even when unmatched.
const YOUNG_AGE: u32 = 2;
/// Stable peaks closer than this are merged.
const STABLE_DEDUP_HZ: f64 = 0.75;

/// A spectral peak followed across frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakTrack {
    pub hz: f64,
    /// 0..=1.
    pub strength: f64,
    pub prominence: f64,
    /// Frames since last matched.
    pub age: u32,
    /// Matched this frame.
    pub seen: bool,
}

/// A local maximum in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCandidate {
    pub hz: f64,
    pub value: f64,
    pub prominence: f64,
    pub score: f64,
}

/// Nothing peak-like in the frame: too weak, or no dynamic range.
pub fn is_flat(spectrum: &[f64]) -> bool {
    let bins = spectrum.get(1..).unwrap_or(&[]);
    if bins.is_empty() {
        return true;
    }
    let max = bins.iter().cloned().fold(f64::MIN, f64::max);
    let mean = bins.iter().sum::<f64>() / bins.len() as f64;
    max < DEMON_FLAT_MAX || max - mean < DEMON_FLAT_DYNAMIC_RANGE
}

/// Local maxima with enough prominence, best first.
///
/// Prominence is the value above the mean of the two bins on either side.
/// Positions are refined by parabolic interpolation.
pub fn find_candidates(spectrum: &[f64]) -> Vec<PeakCandidate> {
    let len = spectrum.len();
    let mut out = Vec::new();
    if len < 4 {
        return out;
    }

    for i in 2..len - 1 {
        let (l, c, r) = (spectrum[i - 1], spectrum[i], spectrum[i + 1]);
        if !(c > l && c >= r) {
            continue;
        }
        let shoulders: Vec<f64> = [i.checked_sub(2), Some(i - 1), Some(i + 1), Some(i + 2)]
            .into_iter()
            .flatten()
            .filter(|&j| j >= 1 && j < len)
            .map(|j| spectrum[j])
            .collect();
        let prominence = c - shoulders.iter().sum::<f64>() / shoulders.len() as f64;
        if prominence < DEMON_MIN_PROMINENCE {
            continue;
        }

        let denom = l - 2.0 * c + r;
        let offset = if denom.abs() > 1e-12 {
            (0.5 * (l - r) / denom).clamp(-0.5, 0.5)
        } else {
            0.0
        };
        out.push(PeakCandidate {
            hz: i as f64 + offset,
            value: c,
            prominence,
            score: 0.75 * c + 0.25 * prominence,
        });
    }

    out.sort_by(|a, b| b.score.total_cmp(&a.score));
    out.truncate(MAX_CANDIDATES);
    out
}

/// Matching window (Hz) for a focus setting in [0, 1].
pub fn match_window_hz(focus: f64) -> f64 {
    let focus = if focus.is_finite() {
        focus.clamp(0.0, 1.0)
    } else {
        0.5
    };
    0.6 + 1.8 * (1.0 - focus)
}

/// Arena of live peak tracks.
#[derive(Debug, Clone, Default)]
pub struct PeakTracker {
    tracks: Vec<PeakTrack>,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[PeakTrack] {
        &self.tracks
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Fold one frame of candidates into the tracks.
    pub fn update(&mut self, candidates: &[PeakCandidate], focus: f64) {
        let window = match_window_hz(focus);
        for t in &mut self.tracks {
            t.seen = false;
        }

        for cand in candidates {
            let nearest = self
                .tracks
                .iter_mut()
                .filter(|t| !t.seen && (t.hz - cand.hz).abs() <= window)
                .min_by(|a, b| (a.hz - cand.hz).abs().total_cmp(&(b.hz - cand.hz).abs()));

            match nearest {
                Some(t) => {
                    t.hz = 0.72 * t.hz + 0.28 * cand.hz;
                    t.strength = (0.55 * t.strength + 0.90 * cand.score).min(1.0);
                    t.prominence = cand.prominence;
                    t.age = 0;
                    t.seen = true;
                }
                None => self.tracks.push(PeakTrack {
                    hz: cand.hz,
                    strength: (0.6 * cand.score).min(1.0),
                    prominence: cand.prominence,
                    age: 0,
                    seen: true,
                }),
            }
        }

        self.age_unseen();
        self.prune();
    }

    /// Age every track as if nothing matched this frame.
    pub fn decay(&mut self) {
        for t in &mut self.tracks {
            t.seen = false;
        }
        self.age_unseen();
        self.prune();
    }

    fn age_unseen(&mut self) {
        for t in self.tracks.iter_mut().filter(|t| !t.seen) {
            t.age += 1;
            t.strength *= TRACK_DECAY;
        }
    }

    fn prune(&mut self) {
        self.tracks
            .retain(|t| t.age <= DEMON_TRACK_MAX_AGE && t.strength >= DEMON_TRACK_MIN_STRENGTH);
    }

    /// Strong, current tracks, deduplicated and sorted by frequency.
    pub fn stable_peaks(&self) -> Vec<PeakTrack> {
        let mut strong: Vec<PeakTrack> = self
            .tracks
            .iter()
            .filter(|t| t.strength >= DEMON_STABLE_STRENGTH && (t.seen || t.age <= YOUNG_AGE))
            .cloned()
            .collect();
        strong.sort_by(|a, b| b.strength.total_cmp(&a.strength));

        let mut kept: Vec<PeakTrack> = Vec::with_capacity(strong.len());
        for t in strong {
            if kept.iter().all(|k| (k.hz - t.hz).abs() >= STABLE_DEDUP_HZ) {
                kept.push(t);
            }
        }
        kept.sort_by(|a, b| a.hz.total_cmp(&b.hz));
        kept
    }
}
