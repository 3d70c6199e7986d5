use approx::assert_abs_diff_eq;

use fathom_core::enums::{AnalysisSource, LockState};

use crate::config::DemonConfig;
use crate::engine::{DemonEngine, OwnSignature};
use crate::signal::BladeRateSignal;

const RATE: f64 = 8000.0;
/// Samples per presentation frame at 60 fps.
const FRAME: usize = 133;

fn engine() -> DemonEngine {
    DemonEngine::new(DemonConfig::with_sample_rate(RATE))
}

/// Drive `frames` updates from `signal`, starting at frame `start`.
fn run(engine: &mut DemonEngine, signal: &mut BladeRateSignal, start: usize, frames: usize) -> f64 {
    let mut now = 0.0;
    for i in start..start + frames {
        now = i as f64 / 60.0;
        let samples = signal.generate(FRAME);
        engine.update(&samples, now);
    }
    now
}

/// Keep feeding until exactly one more analysis has run.
fn run_one_analysis(engine: &mut DemonEngine, signal: &mut BladeRateSignal, mut frame: usize) -> usize {
    let before = engine.analysis_count();
    while engine.analysis_count() == before {
        let samples = signal.generate(FRAME);
        engine.update(&samples, frame as f64 / 60.0);
        frame += 1;
    }
    frame
}

fn max_bin(spectrum: &[f64]) -> f64 {
    spectrum.iter().cloned().fold(0.0, f64::max)
}

// ---- Blade-rate recovery ----

#[test]
fn test_recovers_blade_rate() {
    let mut engine = engine();
    engine.select_target(Some("target-01".into()));
    let mut signal = BladeRateSignal::new(RATE, 18.0, 7);

    run(&mut engine, &mut signal, 0, 400);

    let readout = engine.readout();
    let bpf = readout.bpf_estimate_hz().expect("bpf estimate");
    assert!((bpf - 18.0).abs() < 18.0 * 0.2, "bpf {bpf}");
    assert!(readout.confidence() > 0.45, "confidence {}", readout.confidence());
    assert_ne!(readout.state(), LockState::Searching);
    assert!(readout.stable_peaks.iter().any(|p| (p.hz - 18.0).abs() < 1.5));
    assert!(readout.signal_quality > 0.0);
}

#[test]
fn test_from_shaft_rate() {
    // 216 rpm, 5 blades: 18 Hz.
    let signal = BladeRateSignal::from_shaft(RATE, 216.0, 5, 1);
    assert_abs_diff_eq!(signal.bpf_hz(), 18.0, epsilon = 1e-12);
}

#[test]
fn test_interference_scores_below_modulated() {
    // Same engine tone and biological clicks on both; only one has blade rate.
    let mut modulated = engine();
    modulated.select_target(Some("a".into()));
    let mut signal = BladeRateSignal::new(RATE, 18.0, 3)
        .with_engine_line(250.0, 0.2)
        .with_bio_clicks(3.0, 0.5);
    run(&mut modulated, &mut signal, 0, 400);

    let mut interference = engine();
    interference.select_target(Some("a".into()));
    let mut signal = BladeRateSignal::noise_only(RATE, 3)
        .with_engine_line(250.0, 0.2)
        .with_bio_clicks(3.0, 0.5);
    run(&mut interference, &mut signal, 0, 400);

    let m = modulated.readout();
    let i = interference.readout();
    assert!(
        i.confidence() < m.confidence(),
        "interference {} vs modulated {}",
        i.confidence(),
        m.confidence()
    );
    let bpf = m.bpf_estimate_hz().unwrap_or(0.0);
    assert!((bpf - 18.0).abs() < 18.0 * 0.2, "bpf {bpf}");
}

// ---- Target switching ----

#[test]
fn test_target_switch_discards_history() {
    let mut engine = engine();
    engine.select_target(Some("a".into()));
    let mut signal = BladeRateSignal::new(RATE, 18.0, 11);
    run(&mut engine, &mut signal, 0, 200);
    assert!(engine.ring().live_count() > 0);

    engine.select_target(Some("b".into()));
    assert_eq!(engine.ring().live_count(), 0);
    assert_eq!(engine.ring().write_index(), 0);
    let head = engine.config().min_window();
    assert!(engine.ring().raw()[..head].iter().all(|&s| s == 0.0));
    assert!(engine.smoothed_spectrum().is_empty());
    assert!(engine.readout().lock.is_none());
}

#[test]
fn test_target_switch_restores_cached_state() {
    let mut engine = engine();
    engine.select_target(Some("a".into()));
    let mut signal = BladeRateSignal::new(RATE, 18.0, 5);
    let now = run(&mut engine, &mut signal, 0, 300);
    let cached = engine.smoothed_spectrum().to_vec();
    let lock = engine.lock("a").cloned().expect("lock for a");

    engine.select_target(Some("b".into()));
    engine.update(&signal.generate(FRAME), now + 0.02);
    engine.select_target(Some("a".into()));

    assert_eq!(engine.smoothed_spectrum(), cached.as_slice());
    let readout = engine.readout();
    assert_eq!(readout.target_id.as_deref(), Some("a"));
    assert_eq!(readout.lock, Some(lock));
}

#[test]
fn test_reselecting_same_target_keeps_history() {
    let mut engine = engine();
    engine.select_target(Some("a".into()));
    engine.update(&[0.1; 500], 0.0);
    engine.select_target(Some("a".into()));
    assert_eq!(engine.ring().live_count(), 500);
}

// ---- Ping suppression ----

#[test]
fn test_composite_ping_suppresses_spectrum() {
    let mut engine = engine();
    engine.select_target(Some("a".into()));
    let mut signal = BladeRateSignal::new(RATE, 18.0, 21);
    run(&mut engine, &mut signal, 0, 300);
    let before = engine.smoothed_spectrum().to_vec();
    let lock_before = engine.lock("a").cloned();

    engine.begin_ping_transient(300.0 / 60.0, 1.0);
    run_one_analysis(&mut engine, &mut signal, 300);

    let after = engine.smoothed_spectrum();
    assert_eq!(after.len(), before.len());
    for (a, b) in after.iter().zip(&before) {
        assert_abs_diff_eq!(*a, b * 0.92, epsilon = 1e-12);
    }
    assert!(engine.readout().ping_suppressed);
    assert_eq!(engine.lock("a").cloned(), lock_before, "lock untouched while masked");
}

#[test]
fn test_selected_bus_ignores_ping() {
    let mut engine = engine();
    engine.set_source(AnalysisSource::Selected);
    engine.select_target(Some("a".into()));
    let mut signal = BladeRateSignal::new(RATE, 18.0, 21);
    run(&mut engine, &mut signal, 0, 300);
    let before_max = max_bin(engine.smoothed_spectrum());

    engine.begin_ping_transient(300.0 / 60.0, 1.0);
    run_one_analysis(&mut engine, &mut signal, 300);

    assert!(!engine.readout().ping_suppressed);
    assert!(max_bin(engine.smoothed_spectrum()) > before_max * 0.92 + 0.01);
}

#[test]
fn test_ping_transient_expires() {
    let mut engine = engine();
    engine.select_target(Some("a".into()));
    let mut signal = BladeRateSignal::new(RATE, 18.0, 2);
    run(&mut engine, &mut signal, 0, 300);

    engine.begin_ping_transient(0.0, 0.5);
    run_one_analysis(&mut engine, &mut signal, 300);
    assert!(!engine.readout().ping_suppressed);
}

// ---- Self-noise notch ----

#[test]
fn test_own_signature_notch_on_composite() {
    let mut plain = engine();
    let mut notched = engine();
    notched.set_own_signature(Some(OwnSignature {
        rpm: 216.0,
        blade_count: 5,
        bpf_hz: 18.0,
    }));
    run(&mut plain, &mut BladeRateSignal::new(RATE, 18.0, 9), 0, 200);
    run(&mut notched, &mut BladeRateSignal::new(RATE, 18.0, 9), 0, 200);

    let p = plain.smoothed_spectrum();
    let n = notched.smoothed_spectrum();
    let mean = |s: &[f64]| s.iter().skip(1).sum::<f64>() / (s.len() - 1) as f64;
    assert!(n[18] / mean(n).max(1e-9) < p[18] / mean(p).max(1e-9));
}

// ---- Determinism ----

#[test]
fn test_deterministic_readout() {
    let make = || {
        let mut engine = engine();
        engine.select_target(Some("a".into()));
        run(&mut engine, &mut BladeRateSignal::new(RATE, 24.0, 99), 0, 250);
        serde_json::to_string(&engine.readout()).expect("serialize readout")
    };
    assert_eq!(make(), make());
}

#[test]
fn test_non_finite_samples_are_silenced() {
    let mut engine = engine();
    engine.select_target(Some("a".into()));
    for i in 0..90 {
        engine.update(&[f32::NAN; FRAME], i as f64 / 60.0);
    }
    let readout = engine.readout();
    assert!(readout.spectrum.iter().all(|v| v.is_finite()));
    assert_eq!(readout.state(), LockState::Searching);
}
