//! Envelope extraction: band-limit, rectify, decimate.
//!
//! One-pole IIR sections in the RC-discretized form:
//! high-pass `y[n] = a * (y[n-1] + x[n] - x[n-1])`,
//! low-pass `y[n] = y[n-1] + a * (x[n] - y[n-1])`.

use std::f64::consts::PI;

use crate::config::DemonConfig;

fn rc(cutoff_hz: f64) -> f64 {
    1.0 / (2.0 * PI * cutoff_hz.max(f64::EPSILON))
}

/// Single-pole high-pass.
#[derive(Debug, Clone)]
pub struct OnePoleHighPass {
    alpha: f64,
    prev_input: f64,
    prev_output: f64,
}

impl OnePoleHighPass {
    pub fn new(cutoff_hz: f64, sample_rate: f64) -> Self {
        let rc = rc(cutoff_hz);
        let dt = 1.0 / sample_rate.max(f64::EPSILON);
        Self {
            alpha: rc / (rc + dt),
            prev_input: 0.0,
            prev_output: 0.0,
        }
    }

    pub fn process(&mut self, x: f64) -> f64 {
        let y = self.alpha * (self.prev_output + x - self.prev_input);
        self.prev_input = x;
        self.prev_output = y;
        y
    }

    pub fn process_in_place(&mut self, samples: &mut [f64]) {
        for s in samples {
            *s = self.process(*s);
        }
    }
}

/// Single-pole low-pass.
#[derive(Debug, Clone)]
pub struct OnePoleLowPass {
    alpha: f64,
    state: f64,
}

impl OnePoleLowPass {
    pub fn new(cutoff_hz: f64, sample_rate: f64) -> Self {
        let rc = rc(cutoff_hz);
        let dt = 1.0 / sample_rate.max(f64::EPSILON);
        Self {
            alpha: dt / (rc + dt),
            state: 0.0,
        }
    }

    pub fn process(&mut self, x: f64) -> f64 {
        self.state += self.alpha * (x - self.state);
        self.state
    }

    pub fn process_in_place(&mut self, samples: &mut [f64]) {
        for s in samples {
            *s = self.process(*s);
        }
    }
}

pub fn remove_mean(samples: &mut [f64]) {
    if samples.is_empty() {
        return;
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    for s in samples {
        *s -= mean;
    }
}

/// Full-wave rectification.
pub fn rectify(samples: &mut [f64]) {
    for s in samples {
        *s = s.abs();
    }
}

/// Integer factor bringing `sample_rate` closest to `target_rate`, at least 1.
pub fn decimation_factor(sample_rate: f64, target_rate: f64) -> usize {
    if !(sample_rate > 0.0 && target_rate > 0.0) {
        return 1;
    }
    ((sample_rate / target_rate).round() as usize).max(1)
}

/// Block-average decimation. A trailing partial block is dropped.
pub fn decimate(samples: &[f64], factor: usize) -> Vec<f64> {
    let factor = factor.max(1);
    samples
        .chunks_exact(factor)
        .map(|block| block.iter().sum::<f64>() / factor as f64)
        .collect()
}

/// Demodulated envelope of a raw window and its sample rate.
pub fn extract_envelope(raw: &[f64], config: &DemonConfig) -> (Vec<f64>, f64) {
    let rate = config.effective_sample_rate();
    let mut x = raw.to_vec();

    remove_mean(&mut x);
    OnePoleHighPass::new(config.highpass_hz, rate).process_in_place(&mut x);
    OnePoleLowPass::new(config.lowpass_hz, rate).process_in_place(&mut x);
    rectify(&mut x);

    let factor = decimation_factor(rate, config.decimated_rate_hz);
    let mut env = decimate(&x, factor);
    let env_rate = rate / factor as f64;

    remove_mean(&mut env);
    OnePoleHighPass::new(config.dc_highpass_hz, env_rate).process_in_place(&mut env);
    (env, env_rate)
}
