//! Ocean environment model.
//!
//! Pure functions of depth and range over an immutable `OceanProfile`.
//! Formulas are simplified approximations tuned for plausibility.

use serde::{Deserialize, Serialize};

use fathom_core::constants::*;
use fathom_core::enums::OceanPreset;
use fathom_core::types::finite_or;

/// Acoustic properties of the scenario ocean. Depths and ranges in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OceanProfile {
    /// Sea surface temperature (deg C).
    pub surface_temp: f64,
    pub thermocline_depth: f64,
    pub isothermal_depth: f64,
    pub bottom_depth: f64,
    pub surface_duct_depth: f64,
    pub convergence_zone_start: f64,
    pub convergence_zone_interval: f64,
    pub convergence_zone_width: f64,
    /// Douglas sea state, 0..=9.
    pub sea_state: f64,
}

/// Convergence zone membership for a range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceZoneBand {
    /// Range is within the zone width of the nearest band center.
    pub in_zone: bool,
    /// Index of the nearest band (0 = first zone).
    pub index: u32,
}

/// Combined environment effects on one own-ship/target geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcousticModifiers {
    pub snr_modifier_db: f64,
    pub echo_gain: f64,
    pub duct_active: bool,
    /// Band index when the convergence-zone bonus applied.
    pub convergence_band: Option<u32>,
}

impl Default for AcousticModifiers {
    fn default() -> Self {
        Self {
            snr_modifier_db: 0.0,
            echo_gain: 1.0,
            duct_active: false,
            convergence_band: None,
        }
    }
}

impl OceanProfile {
    /// Profile for a named preset.
    pub fn preset(preset: OceanPreset) -> Self {
        match preset {
            OceanPreset::Temperate => Self {
                surface_temp: 15.0,
                thermocline_depth: 60.0,
                isothermal_depth: 900.0,
                bottom_depth: 3500.0,
                surface_duct_depth: 45.0,
                convergence_zone_start: 2600.0,
                convergence_zone_interval: 2600.0,
                convergence_zone_width: 180.0,
                sea_state: 3.0,
            },
            OceanPreset::Tropical => Self {
                surface_temp: 27.0,
                thermocline_depth: 90.0,
                isothermal_depth: 1100.0,
                bottom_depth: 4500.0,
                surface_duct_depth: 70.0,
                convergence_zone_start: 3200.0,
                convergence_zone_interval: 3200.0,
                convergence_zone_width: 220.0,
                sea_state: 2.0,
            },
            OceanPreset::Arctic => Self {
                surface_temp: 1.0,
                thermocline_depth: 25.0,
                isothermal_depth: 300.0,
                bottom_depth: 2500.0,
                surface_duct_depth: 90.0,
                convergence_zone_start: 2000.0,
                convergence_zone_interval: 2000.0,
                convergence_zone_width: 150.0,
                sea_state: 1.0,
            },
            OceanPreset::Littoral => Self {
                surface_temp: 18.0,
                thermocline_depth: 30.0,
                isothermal_depth: 150.0,
                bottom_depth: 180.0,
                surface_duct_depth: 20.0,
                convergence_zone_start: 5000.0,
                convergence_zone_interval: 5000.0,
                convergence_zone_width: 120.0,
                sea_state: 4.0,
            },
        }
    }
}

impl Default for OceanProfile {
    fn default() -> Self {
        Self::preset(OceanPreset::default())
    }
}

/// Environment queries over a fixed profile.
#[derive(Debug, Clone, Default)]
pub struct OceanEnvironment {
    profile: OceanProfile,
}

impl OceanEnvironment {
    pub fn new(profile: OceanProfile) -> Self {
        Self { profile }
    }

    pub fn from_preset(preset: OceanPreset) -> Self {
        Self::new(OceanProfile::preset(preset))
    }

    pub fn profile(&self) -> &OceanProfile {
        &self.profile
    }

    /// Water temperature at depth (deg C).
    ///
    /// Mixed layer cools by `MIXED_LAYER_TEMP_DROP` down to the thermocline,
    /// the thermocline cools linearly to `DEEP_WATER_TEMP` at the isothermal
    /// depth, and deeper water holds that temperature.
    pub fn temperature(&self, depth: f64) -> f64 {
        let p = &self.profile;
        let depth = finite_or(depth, 0.0).max(0.0);
        let top_of_thermocline = p.surface_temp - MIXED_LAYER_TEMP_DROP;

        if depth <= p.thermocline_depth {
            let frac = if p.thermocline_depth > 0.0 {
                depth / p.thermocline_depth
            } else {
                1.0
            };
            p.surface_temp - MIXED_LAYER_TEMP_DROP * frac
        } else if depth < p.isothermal_depth {
            let span = p.isothermal_depth - p.thermocline_depth;
            let frac = (depth - p.thermocline_depth) / span;
            top_of_thermocline + (DEEP_WATER_TEMP - top_of_thermocline) * frac
        } else {
            DEEP_WATER_TEMP
        }
    }

    /// Sound speed at depth (m/s): cubic temperature fit plus pressure term.
    pub fn sound_speed(&self, depth: f64) -> f64 {
        let depth = finite_or(depth, 0.0).max(0.0);
        let t = self.temperature(depth);
        1449.2 + 4.6 * t - 0.055 * t * t + 0.00029 * t * t * t + 0.016 * depth
    }

    /// Ambient noise level (dB) at depth for a frequency.
    pub fn ambient_noise(&self, depth: f64, freq_hz: f64) -> f64 {
        let depth = finite_or(depth, 0.0);
        let freq_hz = finite_or(freq_hz, PASSIVE_ANALYSIS_FREQ_HZ);
        let sea_state = finite_or(self.profile.sea_state, 0.0).max(0.0);

        let sea = SEA_STATE_NOISE_BASE_DB + 20.0 * (sea_state + 1.0).log10();
        let shipping = if freq_hz < SHIPPING_NOISE_CORNER_HZ {
            SHIPPING_NOISE_LOW_DB
        } else {
            SHIPPING_NOISE_HIGH_DB
        };
        let deep = if depth > DEEP_NOISE_DEPTH {
            DEEP_NOISE_REDUCTION_DB
        } else {
            0.0
        };
        sea + shipping - deep
    }

    /// Thermocline lies strictly between the two depths.
    pub fn is_thermocline_between(&self, depth_a: f64, depth_b: f64) -> bool {
        let td = self.profile.thermocline_depth;
        let (lo, hi) = if depth_a <= depth_b {
            (depth_a, depth_b)
        } else {
            (depth_b, depth_a)
        };
        lo < td && td < hi
    }

    pub fn is_in_surface_duct(&self, depth: f64) -> bool {
        depth <= self.profile.surface_duct_depth
    }

    /// Nearest convergence-zone band for a range (meters).
    pub fn convergence_zone_band(&self, range: f64) -> ConvergenceZoneBand {
        let p = &self.profile;
        if !range.is_finite() || p.convergence_zone_interval <= 0.0 {
            return ConvergenceZoneBand {
                in_zone: false,
                index: 0,
            };
        }
        let index = ((range - p.convergence_zone_start) / p.convergence_zone_interval)
            .round()
            .max(0.0);
        let center = p.convergence_zone_start + index * p.convergence_zone_interval;
        ConvergenceZoneBand {
            in_zone: (range - center).abs() <= p.convergence_zone_width,
            index: index as u32,
        }
    }

    /// Environment modifiers for a geometry. Duct and convergence bonuses stack.
    pub fn acoustic_modifiers(
        &self,
        own_depth: f64,
        target_depth: f64,
        range: f64,
    ) -> AcousticModifiers {
        let own_depth = finite_or(own_depth, DEFAULT_OWN_SHIP_DEPTH);
        let target_depth = finite_or(target_depth, DEFAULT_TARGET_DEPTH);
        let mut mods = AcousticModifiers::default();
        if !range.is_finite() {
            return mods;
        }

        if self.is_in_surface_duct(own_depth)
            && self.is_in_surface_duct(target_depth)
            && (DUCT_MIN_RANGE..=DUCT_MAX_RANGE).contains(&range)
        {
            mods.snr_modifier_db += DUCT_SNR_BONUS_DB;
            mods.echo_gain *= DUCT_ECHO_GAIN;
            mods.duct_active = true;
        }

        let band = self.convergence_zone_band(range);
        let duct = self.profile.surface_duct_depth;
        if band.in_zone && (own_depth >= duct || target_depth >= duct) {
            mods.snr_modifier_db += CZ_SNR_BONUS_DB;
            mods.echo_gain *= CZ_ECHO_GAIN;
            mods.convergence_band = Some(band.index);
        }

        mods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn temperate() -> OceanEnvironment {
        OceanEnvironment::from_preset(OceanPreset::Temperate)
    }

    #[test]
    fn test_temperature_segments() {
        let env = temperate();
        assert_abs_diff_eq!(env.temperature(0.0), 15.0, epsilon = 1e-9);
        assert_abs_diff_eq!(env.temperature(30.0), 14.5, epsilon = 1e-9);
        assert_abs_diff_eq!(env.temperature(60.0), 14.0, epsilon = 1e-9);
        // Halfway through the thermocline: 14 -> 4.
        assert_abs_diff_eq!(env.temperature(480.0), 9.0, epsilon = 1e-9);
        assert_abs_diff_eq!(env.temperature(900.0), 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(env.temperature(3000.0), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sound_speed_pressure_term() {
        let env = temperate();
        let t = 4.0;
        let base = 1449.2 + 4.6 * t - 0.055 * t * t + 0.00029 * t * t * t;
        assert_abs_diff_eq!(env.sound_speed(1000.0), base + 16.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            env.sound_speed(2000.0) - env.sound_speed(1000.0),
            16.0,
            epsilon = 1e-9
        );
        assert!(env.sound_speed(f64::NAN).is_finite());
    }

    #[test]
    fn test_ambient_noise_terms() {
        let env = temperate();
        let sea = 40.0 + 20.0 * 4.0f64.log10();
        assert_abs_diff_eq!(env.ambient_noise(10.0, 1000.0), sea + 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(env.ambient_noise(10.0, 100.0), sea + 60.0, epsilon = 1e-9);
        assert_abs_diff_eq!(env.ambient_noise(800.0, 100.0), sea + 57.0, epsilon = 1e-9);
        // Exactly 500 Hz counts as high frequency.
        assert_abs_diff_eq!(env.ambient_noise(10.0, 500.0), sea + 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_thermocline_between_is_strict() {
        let env = temperate();
        assert!(env.is_thermocline_between(5.0, 100.0));
        assert!(env.is_thermocline_between(100.0, 5.0));
        assert!(!env.is_thermocline_between(60.0, 100.0));
        assert!(!env.is_thermocline_between(5.0, 30.0));
    }

    #[test]
    fn test_convergence_zone_bands() {
        let env = temperate();
        let b = env.convergence_zone_band(2600.0);
        assert!(b.in_zone);
        assert_eq!(b.index, 0);

        let b = env.convergence_zone_band(5200.0 + 150.0);
        assert!(b.in_zone);
        assert_eq!(b.index, 1);

        assert!(!env.convergence_zone_band(3900.0).in_zone);
        assert!(!env.convergence_zone_band(500.0).in_zone);
    }

    #[test]
    fn test_duct_modifier() {
        let env = temperate();
        let m = env.acoustic_modifiers(5.0, 10.0, 1000.0);
        assert!(m.duct_active);
        assert_abs_diff_eq!(m.snr_modifier_db, 4.5, epsilon = 1e-12);
        assert_abs_diff_eq!(m.echo_gain, 1.16, epsilon = 1e-12);
        assert!(m.convergence_band.is_none());

        // Outside the duct range window.
        let m = env.acoustic_modifiers(5.0, 10.0, 2500.0);
        assert!(!m.duct_active);
    }

    #[test]
    fn test_convergence_requires_deep_end() {
        let env = temperate();
        // Both shallow: no CZ bonus even in band.
        let m = env.acoustic_modifiers(5.0, 10.0, 2600.0);
        assert!(m.convergence_band.is_none());
        assert_abs_diff_eq!(m.snr_modifier_db, 0.0, epsilon = 1e-12);

        // Deep target inside the band.
        let m = env.acoustic_modifiers(5.0, 120.0, 2600.0);
        assert_eq!(m.convergence_band, Some(0));
        assert_abs_diff_eq!(m.snr_modifier_db, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.echo_gain, 1.1, epsilon = 1e-12);
    }

    #[test]
    fn test_duct_and_convergence_stack() {
        let profile = OceanProfile {
            convergence_zone_start: 1000.0,
            convergence_zone_interval: 1000.0,
            convergence_zone_width: 100.0,
            ..OceanProfile::default()
        };
        let env = OceanEnvironment::new(profile);
        // Target sits exactly at the duct depth: ducted and deep enough for CZ.
        let m = env.acoustic_modifiers(5.0, 45.0, 1000.0);
        assert!(m.duct_active);
        assert_eq!(m.convergence_band, Some(0));
        assert_abs_diff_eq!(m.snr_modifier_db, 7.5, epsilon = 1e-12);
        assert_abs_diff_eq!(m.echo_gain, 1.16 * 1.1, epsilon = 1e-12);
    }
}
