//! DEMON analyzer: raw samples in, blade-rate lock out.
//!
//! `update` is called once per presentation frame with whatever samples
//! arrived since the last call. Samples always go into the ring; the
//! heavy analysis runs on every `analysis_cadence`-th call.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use fathom_core::enums::{AnalysisSource, LockState};
use fathom_core::target::TargetId;

use crate::buffer::SampleRing;
use crate::comb::{score_comb, CombScore};
use crate::config::DemonConfig;
use crate::filters::extract_envelope;
use crate::lock::DemonLock;
use crate::peaks::{find_candidates, is_flat, PeakTrack, PeakTracker};
use crate::spectrum::{apply_self_noise_notch, envelope_spectrum, signal_quality, smooth_into, whiten};

/// Blade-rate candidates outside this band are ignored (Hz).
const BPF_SEARCH_MIN_HZ: f64 = 2.0;
const BPF_SEARCH_MAX_HZ: f64 = 60.0;
/// Weight of the prior estimate in the rolling BPF blend.
const BPF_PRIOR_WEIGHT: f64 = 0.74;
const COMB_EVIDENCE_WEIGHT: f64 = 0.78;
const QUALITY_EVIDENCE_WEIGHT: f64 = 0.22;

/// Own-ship propulsion, used to notch self noise out of the composite bus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OwnSignature {
    pub rpm: f64,
    pub blade_count: u32,
    pub bpf_hz: f64,
}

/// Analyzer output for display.
#[derive(Debug, Clone, Serialize)]
pub struct DemonReadout {
    pub target_id: Option<TargetId>,
    pub source: AnalysisSource,
    /// Smoothed, whitened envelope spectrum indexed by Hz.
    pub spectrum: Vec<f64>,
    pub stable_peaks: Vec<PeakTrack>,
    pub lock: Option<DemonLock>,
    pub signal_quality: f64,
    pub ping_suppressed: bool,
}

impl DemonReadout {
    pub fn state(&self) -> LockState {
        self.lock.as_ref().map_or(LockState::Searching, |l| l.state)
    }

    pub fn confidence(&self) -> f64 {
        self.lock.as_ref().map_or(0.0, |l| l.confidence)
    }

    pub fn bpf_estimate_hz(&self) -> Option<f64> {
        self.lock.as_ref().and_then(|l| l.bpf_estimate_hz)
    }
}

/// Per-target analysis state kept while another target is selected.
#[derive(Debug, Clone, Default)]
struct TargetCache {
    smoothed: Vec<f64>,
    tracker: PeakTracker,
    quality: f64,
}

pub struct DemonEngine {
    config: DemonConfig,
    ring: SampleRing,
    calls: u32,
    analyses: u64,
    target: Option<TargetId>,
    source: AnalysisSource,
    own_signature: Option<OwnSignature>,
    smoothed: Vec<f64>,
    tracker: PeakTracker,
    quality: f64,
    locks: HashMap<TargetId, DemonLock>,
    cache: HashMap<TargetId, TargetCache>,
    ping_until: Option<f64>,
    ping_suppressed: bool,
}

impl DemonEngine {
    pub fn new(mut config: DemonConfig) -> Self {
        config.analysis_cadence = config.analysis_cadence.max(1);
        let ring = SampleRing::new(config.buffer_capacity());
        Self {
            config,
            ring,
            calls: 0,
            analyses: 0,
            target: None,
            source: AnalysisSource::default(),
            own_signature: None,
            smoothed: Vec::new(),
            tracker: PeakTracker::new(),
            quality: 0.0,
            locks: HashMap::new(),
            cache: HashMap::new(),
            ping_until: None,
            ping_suppressed: false,
        }
    }

    pub fn config(&self) -> &DemonConfig {
        &self.config
    }

    pub fn ring(&self) -> &SampleRing {
        &self.ring
    }

    /// Analyses run (or suppressed) so far.
    pub fn analysis_count(&self) -> u64 {
        self.analyses
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn smoothed_spectrum(&self) -> &[f64] {
        &self.smoothed
    }

    pub fn lock(&self, target_id: &str) -> Option<&DemonLock> {
        self.locks.get(target_id)
    }

    pub fn set_source(&mut self, source: AnalysisSource) {
        self.source = source;
    }

    pub fn set_own_signature(&mut self, signature: Option<OwnSignature>) {
        self.own_signature = signature;
    }

    pub fn set_responsiveness(&mut self, responsiveness: f64) {
        if responsiveness.is_finite() {
            self.config.responsiveness = responsiveness.clamp(0.0, 1.0);
        }
    }

    pub fn set_focus_width(&mut self, focus: f64) {
        if focus.is_finite() {
            self.config.focus_width = focus.clamp(0.0, 1.0);
        }
    }

    /// Mask the composite bus for `hold_secs` after a transmission.
    pub fn begin_ping_transient(&mut self, now: f64, hold_secs: f64) {
        if now.is_finite() && hold_secs.is_finite() {
            self.ping_until = Some(now + hold_secs.max(0.0));
        }
    }

    pub fn end_ping_transient(&mut self) {
        self.ping_until = None;
    }

    fn ping_active(&self, now: f64) -> bool {
        self.ping_until.is_some_and(|until| now < until)
    }

    /// Switch the analysis target.
    ///
    /// The outgoing target's spectrum and tracks are cached, the sample
    /// history is discarded, and any cached state for the incoming target
    /// is restored.
    pub fn select_target(&mut self, target: Option<TargetId>) {
        if self.target == target {
            return;
        }
        if let Some(prev) = self.target.take() {
            self.cache.insert(
                prev,
                TargetCache {
                    smoothed: std::mem::take(&mut self.smoothed),
                    tracker: std::mem::take(&mut self.tracker),
                    quality: self.quality,
                },
            );
        }

        let head = self.ring.capacity().min(self.config.min_window());
        self.ring.reset(head);
        self.calls = 0;

        let restored = target
            .as_ref()
            .and_then(|id| self.cache.remove(id))
            .unwrap_or_default();
        self.smoothed = restored.smoothed;
        self.tracker = restored.tracker;
        self.quality = restored.quality;

        info!(target_id = ?target, "demon target selected");
        self.target = target;
    }

    /// Feed new samples. Returns true when an analysis frame ran.
    pub fn update(&mut self, samples: &[f32], now: f64) -> bool {
        self.ring.push_slice(samples);
        self.calls = self.calls.wrapping_add(1);
        if self.calls % self.config.analysis_cadence != 0 {
            return false;
        }

        self.prune_stale(now);

        let Some(window) = self.config.window_for(self.ring.live_count()) else {
            debug!(live = self.ring.live_count(), "demon history too short");
            return false;
        };

        self.analyses += 1;
        self.ping_suppressed = self.ping_active(now) && self.source == AnalysisSource::Composite;
        if self.ping_suppressed {
            let factor = self.config.ping_suppression;
            for v in &mut self.smoothed {
                *v *= factor;
            }
            self.tracker.decay();
            return true;
        }

        let raw = self.ring.latest(window);
        let (envelope, rate) = extract_envelope(&raw, &self.config);
        let mut spectrum = envelope_spectrum(&envelope, rate, self.config.max_freq_hz);
        if self.source == AnalysisSource::Composite {
            if let Some(own) = self.own_signature {
                apply_self_noise_notch(
                    &mut spectrum,
                    own.bpf_hz,
                    self.config.notch_depth,
                    self.config.notch_width_hz,
                );
            }
        }
        let white = whiten(&spectrum, self.config.whiten_radius, self.config.whiten_factor);
        smooth_into(&mut self.smoothed, &white, self.config.responsiveness);

        if is_flat(&self.smoothed) {
            self.tracker.decay();
        } else {
            let candidates = find_candidates(&self.smoothed);
            self.tracker.update(&candidates, self.config.focus_width);
        }

        let stable = self.tracker.stable_peaks();
        let peak_hz: Vec<f64> = stable.iter().map(|t| t.hz).collect();
        self.quality = signal_quality(&self.smoothed, &peak_hz);

        if let Some(target) = self.target.clone() {
            self.update_lock(target, &peak_hz, now);
        }
        true
    }

    fn update_lock(&mut self, target: TargetId, peak_hz: &[f64], now: f64) {
        let smoothed = &self.smoothed;
        let config = &self.config;
        let quality = self.quality;
        let lock = self
            .locks
            .entry(target)
            .or_insert_with_key(|id| DemonLock::new(id.clone(), now));

        let best = bpf_candidates(peak_hz)
            .into_iter()
            .map(|hz| (hz, score_comb(smoothed, hz)))
            .max_by(|a, b| candidate_rank(&a.1).total_cmp(&candidate_rank(&b.1)))
            .map(|(hz, _)| hz);

        let estimate = match (lock.bpf_estimate_hz, best) {
            (Some(prior), Some(new)) => Some(BPF_PRIOR_WEIGHT * prior + (1.0 - BPF_PRIOR_WEIGHT) * new),
            (None, new) => new,
            (prior, None) => prior,
        };
        let comb = estimate
            .map(|hz| score_comb(smoothed, hz))
            .unwrap_or_default();

        lock.bpf_estimate_hz = estimate;
        lock.harmonic_hits = comb.harmonic_hits;
        lock.harmonic_count = comb.harmonic_count;
        let evidence = COMB_EVIDENCE_WEIGHT * comb.score + QUALITY_EVIDENCE_WEIGHT * quality;
        lock.integrate(evidence, quality, now, config);

        if let Some(before) = lock.advance_state(config) {
            info!(
                target_id = %lock.target_id,
                from = ?before,
                to = ?lock.state,
                confidence = lock.confidence,
                bpf_hz = ?lock.bpf_estimate_hz,
                "demon lock state changed"
            );
        }
    }

    fn prune_stale(&mut self, now: f64) {
        let timeout = self.config.stale_timeout_secs;
        let current = self.target.as_deref();
        let stale: Vec<TargetId> = self
            .locks
            .iter()
            .filter(|(id, lock)| Some(id.as_str()) != current && lock.is_stale(now, timeout))
            .map(|(id, _)| id.clone())
            .collect();
        for id in stale {
            debug!(target_id = %id, "pruning stale demon lock");
            self.locks.remove(&id);
            self.cache.remove(&id);
        }
    }

    pub fn readout(&self) -> DemonReadout {
        DemonReadout {
            target_id: self.target.clone(),
            source: self.source,
            spectrum: self.smoothed.clone(),
            stable_peaks: self.tracker.stable_peaks(),
            lock: self
                .target
                .as_ref()
                .and_then(|id| self.locks.get(id))
                .cloned(),
            signal_quality: self.quality,
            ping_suppressed: self.ping_suppressed,
        }
    }
}

/// Blade-rate hypotheses: the stable peaks themselves and the spacings
/// between neighboring peaks, restricted to the search band.
fn bpf_candidates(peak_hz: &[f64]) -> Vec<f64> {
    let in_band = |hz: &f64| (BPF_SEARCH_MIN_HZ..=BPF_SEARCH_MAX_HZ).contains(hz);
    peak_hz
        .iter()
        .copied()
        .chain(peak_hz.windows(2).map(|w| w[1] - w[0]))
        .filter(in_band)
        .collect()
}

fn candidate_rank(comb: &CombScore) -> f64 {
    comb.score * (1.0 + 0.1 * comb.harmonic_hits as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bpf_candidates_include_spacings() {
        let c = bpf_candidates(&[18.0, 36.0, 54.0, 72.0]);
        assert_eq!(c, vec![18.0, 36.0, 54.0, 18.0, 18.0, 18.0]);
        assert!(bpf_candidates(&[1.0, 70.0]).is_empty());
    }

    #[test]
    fn test_cadence_and_short_history() {
        let mut engine = DemonEngine::new(DemonConfig::with_sample_rate(8000.0));
        assert!(!engine.update(&[0.0; 100], 0.0));
        assert!(!engine.update(&[0.0; 100], 0.1));
        assert!(!engine.update(&[0.0; 100], 0.2), "not enough history yet");
        assert_eq!(engine.analysis_count(), 0);

        engine.update(&[0.0; 9000], 0.3);
        engine.update(&[], 0.4);
        assert!(engine.update(&[], 0.5));
        assert_eq!(engine.analysis_count(), 1);
    }

    #[test]
    fn test_silence_is_flat() {
        let mut engine = DemonEngine::new(DemonConfig::with_sample_rate(8000.0));
        engine.select_target(Some("quiet".into()));
        for i in 0..30 {
            engine.update(&[0.0; 1000], i as f64 * 0.1);
        }
        let r = engine.readout();
        assert!(r.spectrum.iter().all(|&v| v == 0.0));
        assert!(r.stable_peaks.is_empty());
        assert_eq!(r.state(), LockState::Searching);
        assert_eq!(r.bpf_estimate_hz(), None);
    }
}
