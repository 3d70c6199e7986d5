//! Simulation constants and tuning parameters.

/// Default simulation tick length (seconds).
pub const TICK_SECS: f64 = 0.1;

/// Meters per simulation distance unit.
pub const RANGE_SCALE_METERS: f64 = 10.0;

/// Nominal speed of sound used for echo travel time (m/s).
pub const ECHO_SOUND_SPEED: f64 = 1500.0;

// --- Depths ---

/// Own-ship depth when no terrain oracle is available (meters).
pub const DEFAULT_OWN_SHIP_DEPTH: f64 = 5.0;

/// Target depth when no terrain oracle is available (meters).
pub const DEFAULT_TARGET_DEPTH: f64 = 10.0;

/// Minimum clearance kept between a target and the seabed (meters).
pub const SEABED_CLEARANCE: f64 = 2.0;

// --- Environment ---

/// Sea-state noise base level (dB).
pub const SEA_STATE_NOISE_BASE_DB: f64 = 40.0;

/// Shipping noise below the low-frequency corner (dB).
pub const SHIPPING_NOISE_LOW_DB: f64 = 60.0;

/// Shipping noise at or above the low-frequency corner (dB).
pub const SHIPPING_NOISE_HIGH_DB: f64 = 40.0;

/// Frequency separating low and high shipping noise (Hz).
pub const SHIPPING_NOISE_CORNER_HZ: f64 = 500.0;

/// Depth below which ambient noise is reduced (meters).
pub const DEEP_NOISE_DEPTH: f64 = 500.0;

/// Ambient noise reduction in deep water (dB).
pub const DEEP_NOISE_REDUCTION_DB: f64 = 3.0;

/// Temperature below the isothermal depth (deg C).
pub const DEEP_WATER_TEMP: f64 = 4.0;

/// Temperature drop across the mixed layer (deg C).
pub const MIXED_LAYER_TEMP_DROP: f64 = 1.0;

/// Surface duct SNR bonus (dB).
pub const DUCT_SNR_BONUS_DB: f64 = 4.5;

/// Surface duct echo gain multiplier.
pub const DUCT_ECHO_GAIN: f64 = 1.16;

/// Range window in which the surface duct applies (meters).
pub const DUCT_MIN_RANGE: f64 = 200.0;
pub const DUCT_MAX_RANGE: f64 = 2200.0;

/// Convergence zone SNR bonus (dB).
pub const CZ_SNR_BONUS_DB: f64 = 3.0;

/// Convergence zone echo gain multiplier.
pub const CZ_ECHO_GAIN: f64 = 1.1;

// --- Passive detection ---

/// Frequency at which passive ambient noise is evaluated (Hz).
pub const PASSIVE_ANALYSIS_FREQ_HZ: f64 = 1000.0;

/// SNR above which a target is detected (dB).
pub const DETECTION_THRESHOLD_DB: f64 = 6.0;

/// Seconds without detection before a tracked target is lost.
pub const LOST_TRACK_TIMEOUT_SECS: f64 = 10.0;

/// Attenuation when own-ship and target are on opposite sides of the thermocline (dB).
pub const SHADOW_ZONE_ATTENUATION_DB: f64 = 15.0;

/// Attenuation when terrain blocks line-of-sight (dB).
pub const OCCLUSION_ATTENUATION_DB: f64 = 25.0;

/// Multipath fading spatial frequency (radians per meter).
pub const MULTIPATH_FREQUENCY: f64 = 0.5;

/// Multipath fading amplitude (dB).
pub const MULTIPATH_STRENGTH_DB: f64 = 3.0;

/// Default number of line-of-sight samples.
pub const LOS_SAMPLES: usize = 10;

// --- Classification ---

/// Margin above detection threshold required for classification to advance (dB).
pub const CLASSIFICATION_MARGIN_DB: f64 = 2.0;

/// Progress rate for the operator-selected target (per second).
pub const CLASSIFY_RATE_SELECTED: f64 = 0.06;

/// Progress rate for background targets (per second).
pub const CLASSIFY_RATE_BACKGROUND: f64 = 0.015;

/// Progress decay rate when signal is weak (per second).
pub const CLASSIFY_DECAY_RATE: f64 = 0.01;

/// Progress above which a target is ambiguous.
pub const CLASSIFY_AMBIGUOUS_AT: f64 = 0.2;

/// Progress at which a target is classified.
pub const CLASSIFY_CLASSIFIED_AT: f64 = 0.6;

/// Progress at which a classification is confirmed.
pub const CLASSIFY_CONFIRMED_AT: f64 = 0.95;

/// Progress below which classification reverts to undetected.
pub const CLASSIFY_FORGET_BELOW: f64 = 0.1;

// --- Active sonar ---

/// Wavefront growth per tick (simulation units).
pub const PING_RADIUS_STEP: f64 = 15.0;

/// Wavefront radius at which a ping completes (simulation units).
pub const PING_MAX_RADIUS: f64 = 600.0;

/// Echo intensity floor so distant returns remain audible.
pub const ECHO_MIN_INTENSITY: f64 = 0.05;

/// Duration of an evasive reaction before reverting (seconds).
pub const EVASION_DURATION_SECS: f64 = 30.0;

/// Speed multiplier while evading.
pub const EVASION_SPEED_FACTOR: f64 = 1.6;

/// Turn applied when evading, away from the ping bearing (degrees).
pub const EVASION_TURN_DEG: f64 = 90.0;

/// Torpedo speed multiplier when homing on a ping.
pub const INTERCEPT_SPEED_FACTOR: f64 = 1.25;

// --- Contact registry ---

/// Seconds without detection before a contact is marked lost.
pub const CONTACT_LOST_TIMEOUT_SECS: f64 = 10.0;

/// Bearing separation under which contacts fuse into a group (degrees).
pub const FUSION_BEARING_DEG: f64 = 8.0;

/// Range separation under which contacts fuse into a group (meters).
pub const FUSION_RANGE_METERS: f64 = 250.0;

/// Range at which the range component of threat score reaches zero (meters).
pub const THREAT_RANGE_REF: f64 = 3000.0;

/// Meters per threat point in the range component.
pub const THREAT_RANGE_DIVISOR: f64 = 30.0;

/// Cap on the range component of threat score.
pub const THREAT_RANGE_CAP: f64 = 100.0;

pub const THREAT_BONUS_AMBIGUOUS: f64 = 15.0;
pub const THREAT_BONUS_TRACKED: f64 = 10.0;
pub const THREAT_BONUS_PINNED: f64 = 25.0;

/// Maximum alias length (characters).
pub const ALIAS_MAX_LEN: usize = 12;

/// Manual solution error scales.
pub const SOLUTION_ANGLE_SCALE_DEG: f64 = 180.0;
pub const SOLUTION_RANGE_SCALE: f64 = 3000.0;
pub const SOLUTION_SPEED_SCALE: f64 = 40.0;

// --- DEMON ---

/// Seconds of raw audio held in the analysis ring.
pub const DEMON_BUFFER_SECS: f64 = 3.0;

/// Heavy analysis runs once per this many update calls.
pub const DEMON_ANALYSIS_CADENCE: u32 = 3;

/// Analysis window lengths (samples), smallest first.
pub const DEMON_WINDOW_SIZES: [usize; 3] = [8192, 16384, 65536];

/// Band-limit corners applied before rectification (Hz).
pub const DEMON_HIGHPASS_HZ: f64 = 20.0;
pub const DEMON_LOWPASS_HZ: f64 = 1800.0;

/// Target rate after envelope decimation (Hz).
pub const DEMON_DECIMATED_RATE_HZ: f64 = 500.0;

/// DC-drift high-pass on the decimated envelope (Hz).
pub const DEMON_DC_HIGHPASS_HZ: f64 = 1.0;

/// Highest DEMON bin (Hz). Bins are integer frequencies 1..=max.
pub const DEMON_MAX_FREQ_HZ: usize = 120;

/// Whitening neighborhood radius (bins) and subtraction factor.
pub const DEMON_WHITEN_RADIUS: usize = 3;
pub const DEMON_WHITEN_FACTOR: f64 = 0.92;

/// Flat-spectrum guards: peak search is skipped below these.
pub const DEMON_FLAT_MAX: f64 = 0.22;
pub const DEMON_FLAT_DYNAMIC_RANGE: f64 = 0.08;

/// Minimum candidate prominence over its neighbors.
pub const DEMON_MIN_PROMINENCE: f64 = 0.03;

/// Peak track aging limits.
pub const DEMON_TRACK_MAX_AGE: u32 = 14;
pub const DEMON_TRACK_MIN_STRENGTH: f64 = 0.12;

/// Strength at which a track is reported as a stable peak.
pub const DEMON_STABLE_STRENGTH: f64 = 0.24;

/// Highest harmonic scored by the comb.
pub const DEMON_COMB_HARMONICS: u32 = 8;

/// Ping-transient suppression factor applied to the smoothed spectrum.
pub const DEMON_PING_SUPPRESSION: f64 = 0.92;

/// Seconds without analysis before a lock is pruned.
pub const DEMON_STALE_TIMEOUT_SECS: f64 = 45.0;
