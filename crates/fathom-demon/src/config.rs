//! DEMON analyzer configuration.

use serde::{Deserialize, Serialize};

use fathom_core::constants::*;

const DEFAULT_SAMPLE_RATE_HZ: f64 = 48_000.0;

/// Tuning for the DEMON envelope-spectrum pipeline.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemonConfig {
    /// Input sample rate (Hz).
    pub sample_rate_hz: f64,
    /// Seconds of raw history kept in the ring.
    pub buffer_secs: f64,
    /// Run the heavy analysis every Nth `update` call.
    pub analysis_cadence: u32,
    /// Candidate analysis window lengths (samples), ascending.
    pub window_sizes: Vec<usize>,

    pub highpass_hz: f64,
    pub lowpass_hz: f64,
    /// Target rate of the decimated envelope (Hz).
    pub decimated_rate_hz: f64,
    /// DC-removal corner on the decimated envelope (Hz).
    pub dc_highpass_hz: f64,
    /// Highest envelope frequency analyzed (Hz).
    pub max_freq_hz: usize,

    pub whiten_radius: usize,
    pub whiten_factor: f64,

    /// 0 = sluggish, 1 = twitchy. Drives spectrum smoothing.
    pub responsiveness: f64,
    /// 0 = wide peak matching window, 1 = narrow.
    pub focus_width: f64,

    pub tentative_on: f64,
    pub tentative_off: f64,
    pub lock_on: f64,
    pub lock_off: f64,
    /// Confidence rise time constant (s).
    pub attack_secs: f64,
    /// Confidence fall time constant (s); halved when signal quality is poor.
    pub release_secs: f64,

    /// Locks without updates for this long are dropped (s).
    pub stale_timeout_secs: f64,
    /// Per-frame decay applied while a ping transient masks the composite bus.
    pub ping_suppression: f64,
    /// Depth of the own-ship self-noise notch, 0..=1.
    pub notch_depth: f64,
    /// Gaussian width of the self-noise notch (Hz).
    pub notch_width_hz: f64,
}

impl Default for DemonConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            buffer_secs: DEMON_BUFFER_SECS,
            analysis_cadence: DEMON_ANALYSIS_CADENCE,
            window_sizes: DEMON_WINDOW_SIZES.to_vec(),
            highpass_hz: DEMON_HIGHPASS_HZ,
            lowpass_hz: DEMON_LOWPASS_HZ,
            decimated_rate_hz: DEMON_DECIMATED_RATE_HZ,
            dc_highpass_hz: DEMON_DC_HIGHPASS_HZ,
            max_freq_hz: DEMON_MAX_FREQ_HZ,
            whiten_radius: DEMON_WHITEN_RADIUS,
            whiten_factor: DEMON_WHITEN_FACTOR,
            responsiveness: 0.5,
            focus_width: 0.5,
            tentative_on: 0.32,
            tentative_off: 0.2,
            lock_on: 0.58,
            lock_off: 0.42,
            attack_secs: 1.5,
            release_secs: 3.0,
            stale_timeout_secs: DEMON_STALE_TIMEOUT_SECS,
            ping_suppression: DEMON_PING_SUPPRESSION,
            notch_depth: 0.85,
            notch_width_hz: 0.8,
        }
    }
}

impl DemonConfig {
    /// Config for a given input sample rate, other fields default.
    pub fn with_sample_rate(sample_rate_hz: f64) -> Self {
        Self {
            sample_rate_hz,
            ..Self::default()
        }
    }

    /// Input sample rate, falling back to 48 kHz when unset or invalid.
    pub fn effective_sample_rate(&self) -> f64 {
        if self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0 {
            self.sample_rate_hz
        } else {
            DEFAULT_SAMPLE_RATE_HZ
        }
    }

    /// Ring capacity in samples.
    pub fn buffer_capacity(&self) -> usize {
        let rate = self.effective_sample_rate();
        let secs = if self.buffer_secs.is_finite() && self.buffer_secs > 0.0 {
            self.buffer_secs
        } else {
            DEMON_BUFFER_SECS
        };
        ((rate * secs).round() as usize).max(self.min_window())
    }

    /// Smallest analysis window.
    pub fn min_window(&self) -> usize {
        self.window_sizes
            .iter()
            .copied()
            .filter(|&n| n > 0)
            .min()
            .unwrap_or(DEMON_WINDOW_SIZES[0])
    }

    /// Largest configured window that `available` samples can fill.
    pub fn window_for(&self, available: usize) -> Option<usize> {
        self.window_sizes
            .iter()
            .copied()
            .filter(|&n| n > 0 && n <= available)
            .max()
    }
}
