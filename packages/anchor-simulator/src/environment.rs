//! environment.rs — Wind and tide generator
//!
//! Wind is refreshed on a slow cadence (≈1 Hz), independent of the physics tick:
//! - speed: base + bounded uniform gust, clamped to [min, max] knots
//! - direction: base + steady sinusoidal oscillation (swinging at anchor)
//!   + a rarer, larger random shift every `shift_interval_s`
//!
//! Tide is a pure cosine model anchored on a known high-water instant.
//! Nothing here touches the boat.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::Serialize;
use tracing::debug;

use crate::config::{SimConfig, TideConfig, WindConfig};
use crate::geo::wrap_deg;

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TideState {
    pub height_now: f64,
    pub height_high: f64,
    pub height_low: f64,
    /// Next high water
    pub time_high: DateTime<Utc>,
    /// Next low water
    pub time_low: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentState {
    /// Knots, within the configured [min, max]
    #[serde(rename = "windSpeed")]
    pub wind_speed_kn: f64,
    /// Direction the wind comes FROM, degrees [0, 360)
    #[serde(rename = "windDirection")]
    pub wind_direction_deg: f64,
    /// Meters
    #[serde(rename = "depth")]
    pub depth_m: f64,
    pub tide: Option<TideState>,
}

/// h(t) = mean + amplitude · cos(2π (t − high_water) / period)
#[derive(Debug, Clone, PartialEq)]
pub struct TideModel {
    pub mean_height_m: f64,
    pub amplitude_m: f64,
    pub period_s: f64,
    pub high_water_at: DateTime<Utc>,
}

impl TideModel {
    pub fn from_config(cfg: &TideConfig, start: DateTime<Utc>) -> Self {
        Self {
            mean_height_m: cfg.mean_height_m,
            amplitude_m: cfg.amplitude_m,
            period_s: cfg.period_s,
            high_water_at: cfg.high_water_at.unwrap_or(start),
        }
    }

    fn phase_s(&self, now: DateTime<Utc>) -> f64 {
        let since = (now - self.high_water_at).num_milliseconds() as f64 / 1000.0;
        since.rem_euclid(self.period_s)
    }

    pub fn height_at(&self, now: DateTime<Utc>) -> f64 {
        let phase = self.phase_s(now) / self.period_s;
        self.mean_height_m + self.amplitude_m * (std::f64::consts::TAU * phase).cos()
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> TideState {
        let phase = self.phase_s(now);
        let to_high = self.period_s - phase;
        let half = self.period_s / 2.0;
        let to_low = if phase < half { half - phase } else { self.period_s + half - phase };
        TideState {
            height_now: self.height_at(now),
            height_high: self.mean_height_m + self.amplitude_m,
            height_low: self.mean_height_m - self.amplitude_m,
            time_high: now + Duration::milliseconds((to_high * 1000.0) as i64),
            time_low: now + Duration::milliseconds((to_low * 1000.0) as i64),
        }
    }
}

// ── Generator ─────────────────────────────────────────────────────────────────

pub struct Environment {
    wind_cfg: WindConfig,
    base_depth_m: f64,
    tide: Option<TideModel>,
    state: EnvironmentState,
    rng: StdRng,

    /// Seconds of wind history (drives the oscillation phase)
    elapsed_s: f64,
    since_shift_s: f64,
    shift_offset_deg: f64,
}

impl Environment {
    pub fn new(cfg: &SimConfig, start: DateTime<Utc>) -> Self {
        let rng = match cfg.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let tide = cfg.tide.enabled.then(|| TideModel::from_config(&cfg.tide, start));
        let mut env = Self {
            wind_cfg: cfg.wind.clone(),
            base_depth_m: cfg.environment.depth_m,
            tide,
            state: EnvironmentState {
                wind_speed_kn: cfg.wind.initial_speed_kn,
                wind_direction_deg: wrap_deg(cfg.wind.initial_direction_deg),
                depth_m: cfg.environment.depth_m,
                tide: None,
            },
            rng,
            elapsed_s: 0.0,
            since_shift_s: 0.0,
            shift_offset_deg: 0.0,
        };
        env.update_depth(start, None);
        env
    }

    pub fn state(&self) -> &EnvironmentState { &self.state }

    /// Wind refresh. `interval_s` is the time since the previous call.
    pub fn update_wind(&mut self, interval_s: f64) {
        let w = &self.wind_cfg;
        self.elapsed_s += interval_s;
        self.since_shift_s += interval_s;

        // (a) gust
        let gust = if w.gust_kn > 0.0 {
            Uniform::new_inclusive(-w.gust_kn, w.gust_kn).sample(&mut self.rng)
        } else {
            0.0
        };
        self.state.wind_speed_kn = (w.initial_speed_kn + gust).clamp(w.min_speed_kn, w.max_speed_kn);

        // (c) rare shift
        if self.since_shift_s >= w.shift_interval_s {
            self.since_shift_s = 0.0;
            if w.max_shift_deg > 0.0 {
                let shift = Normal::new(0.0, w.max_shift_deg / 2.0)
                    .map(|n| n.sample(&mut self.rng))
                    .unwrap_or(0.0)
                    .clamp(-w.max_shift_deg, w.max_shift_deg);
                self.shift_offset_deg = wrap_deg(self.shift_offset_deg + shift);
                debug!("Wind shift {shift:+.1}° (offset now {:.1}°)", self.shift_offset_deg);
            }
        }

        // (b) steady oscillation
        let osc = w.oscillation_amplitude_deg
            * (std::f64::consts::TAU * self.elapsed_s / w.oscillation_period_s).sin();

        self.state.wind_direction_deg = wrap_deg(w.initial_direction_deg + self.shift_offset_deg + osc);
    }

    /// None when tide modelling is disabled
    pub fn tide_state(&self, now: DateTime<Utc>) -> Option<TideState> {
        self.tide.as_ref().map(|t| t.state_at(now))
    }

    /// External override wins; otherwise base depth, shifted by the tide.
    pub fn update_depth(&mut self, now: DateTime<Utc>, override_m: Option<f64>) {
        self.state.tide = self.tide_state(now);
        self.state.depth_m = match (override_m, &self.tide) {
            (Some(d), _) => d,
            (None, Some(t)) => (self.base_depth_m + t.height_at(now) - t.mean_height_m).max(0.0),
            (None, None) => self.base_depth_m,
        };
    }

    /// Force a steady wind (tests, manual control). Gust/oscillation still
    /// apply on the next `update_wind`.
    pub fn set_wind(&mut self, speed_kn: f64, direction_deg: f64) {
        self.wind_cfg.initial_speed_kn = speed_kn;
        self.wind_cfg.initial_direction_deg = direction_deg;
        self.state.wind_speed_kn = speed_kn.clamp(self.wind_cfg.min_speed_kn, self.wind_cfg.max_speed_kn);
        self.state.wind_direction_deg = wrap_deg(direction_deg);
    }

    pub fn apply_config(&mut self, cfg: &SimConfig, start: DateTime<Utc>) {
        self.wind_cfg = cfg.wind.clone();
        self.base_depth_m = cfg.environment.depth_m;
        self.tide = cfg.tide.enabled.then(|| TideModel::from_config(&cfg.tide, start));
        self.state.wind_speed_kn = self
            .state
            .wind_speed_kn
            .clamp(self.wind_cfg.min_speed_kn, self.wind_cfg.max_speed_kn);
    }

    /// Fresh generator; a configured seed replays the same wind
    pub fn reset(&mut self, cfg: &SimConfig, start: DateTime<Utc>) {
        *self = Self::new(cfg, start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SimConfig {
        let mut cfg = SimConfig::default();
        cfg.simulation.seed = Some(7);
        cfg
    }

    #[test]
    fn gusts_stay_within_bounds() {
        let mut cfg = cfg();
        cfg.wind.initial_speed_kn = 19.0;
        cfg.wind.gust_kn = 5.0;
        cfg.wind.min_speed_kn = 15.0;
        cfg.wind.max_speed_kn = 20.0;
        let mut env = Environment::new(&cfg, Utc::now());
        for _ in 0..1000 {
            env.update_wind(1.0);
            let s = env.state().wind_speed_kn;
            assert!((15.0..=20.0).contains(&s), "speed {s} escaped bounds");
            let d = env.state().wind_direction_deg;
            assert!((0.0..360.0).contains(&d));
        }
    }

    #[test]
    fn oscillation_swings_direction_without_shifts() {
        let mut cfg = cfg();
        cfg.wind.initial_direction_deg = 0.0;
        cfg.wind.gust_kn = 0.0;
        cfg.wind.max_shift_deg = 0.0;
        cfg.wind.oscillation_amplitude_deg = 10.0;
        cfg.wind.oscillation_period_s = 40.0;
        let mut env = Environment::new(&cfg, Utc::now());

        env.update_wind(10.0); // quarter period → +10°
        assert!((env.state().wind_direction_deg - 10.0).abs() < 1e-9);
        env.update_wind(20.0); // three quarters → −10° → 350°
        assert!((env.state().wind_direction_deg - 350.0).abs() < 1e-9);
        assert_eq!(env.state().wind_speed_kn, cfg.wind.initial_speed_kn);
    }

    #[test]
    fn tide_disabled_returns_none() {
        let env = Environment::new(&cfg(), Utc::now());
        assert!(env.tide_state(Utc::now()).is_none());
    }

    #[test]
    fn tide_high_then_low_half_period_later() {
        let start = Utc::now();
        let mut cfg = cfg();
        cfg.tide.enabled = true;
        cfg.tide.high_water_at = Some(start);
        let mut env = Environment::new(&cfg, start);

        let t = env.tide_state(start).unwrap();
        assert!((t.height_now - 2.5).abs() < 1e-9);
        assert!((t.height_high - 2.5).abs() < 1e-9);
        assert!((t.height_low - 0.5).abs() < 1e-9);
        let to_low = (t.time_low - start).num_seconds();
        assert!((to_low - 22_356).abs() <= 1);

        // depth follows the tide around the base depth
        env.update_depth(start, None);
        assert!((env.state().depth_m - 4.0).abs() < 1e-9);
        env.update_depth(start, Some(9.0));
        assert_eq!(env.state().depth_m, 9.0);
    }
}
