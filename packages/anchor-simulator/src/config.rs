//! config.rs — Simulation parameters (populated from config.toml)
//!
//! Every section has tuned defaults so a partial TOML file is enough.
//! Runtime changes go through `ConfigOverrides` + `SimConfig::apply_overrides`,
//! which validates the merged result before committing it.
//!
//! Keys are snake_case in TOML and camelCase on the HTTP side.

use std::path::Path;

use anchor_types::LatLon;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;

/// Shipped defaults, used when the config file is missing
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config.toml");

// ── Sections ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct SimulationConfig {
    /// Physics tick, seconds
    pub dt_s: f64,
    pub wind_update_hz: f64,
    /// Fixed RNG seed for reproducible wind; entropy when unset
    pub seed: Option<u64>,
    /// Seconds after a manual reposition before chain constraints reapply
    pub grace_period_s: f64,
    pub initial_position: LatLon,
    pub initial_heading_deg: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt_s: 0.05,
            wind_update_hz: 1.0,
            seed: None,
            grace_period_s: 5.0,
            initial_position: LatLon::new(43.59738, -79.5073),
            initial_heading_deg: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct BoatConfig {
    pub mass_kg: f64,
    /// Hard cap on yaw rate, deg/s
    pub max_angular_velocity_dps: f64,
    /// Yaw damping, 1/s
    pub rotational_damping: f64,
    /// Weathervane yaw acceleration per degree of heading error (deg/s² per deg)
    pub weathervane_gain: f64,
    /// Anchor-pointing yaw acceleration per degree of heading error
    pub anchor_gain: f64,
}

impl Default for BoatConfig {
    fn default() -> Self {
        Self {
            mass_kg: 10_000.0,
            max_angular_velocity_dps: 10.0,
            rotational_damping: 0.8,
            weathervane_gain: 0.5,
            anchor_gain: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct WindConfig {
    /// Base (mean) wind speed, knots
    pub initial_speed_kn: f64,
    /// Base direction the wind comes FROM, degrees
    pub initial_direction_deg: f64,
    pub min_speed_kn: f64,
    pub max_speed_kn: f64,
    /// Gust half-width, knots
    pub gust_kn: f64,
    pub oscillation_amplitude_deg: f64,
    pub oscillation_period_s: f64,
    /// Seconds between rare large direction shifts
    pub shift_interval_s: f64,
    pub max_shift_deg: f64,
    pub air_density: f64,
    pub windage_area_m2: f64,
    pub drag_coefficient: f64,
    /// Wind speed at which the weathervane factor saturates at 1.0
    pub weathervane_cap_kn: f64,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            initial_speed_kn: 10.0,
            initial_direction_deg: 180.0,
            min_speed_kn: 0.0,
            max_speed_kn: 40.0,
            gust_kn: 2.0,
            oscillation_amplitude_deg: 15.0,
            oscillation_period_s: 60.0,
            shift_interval_s: 300.0,
            max_shift_deg: 30.0,
            air_density: 1.225,
            windage_area_m2: 12.0,
            drag_coefficient: 1.0,
            weathervane_cap_kn: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct EnvironmentConfig {
    /// Base water depth, meters
    pub depth_m: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self { depth_m: 3.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct TideConfig {
    pub enabled: bool,
    pub mean_height_m: f64,
    pub amplitude_m: f64,
    /// Semi-diurnal period, seconds
    pub period_s: f64,
    /// A high-water instant; defaults to simulation start
    pub high_water_at: Option<DateTime<Utc>>,
}

impl Default for TideConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mean_height_m: 1.5,
            amplitude_m: 1.0,
            period_s: 44_712.0, // 12 h 25 m 12 s
            high_water_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct ForcesConfig {
    pub wind: bool,
    pub water_drag: bool,
    pub slack_constraint: bool,
    pub motor: bool,
}

impl Default for ForcesConfig {
    fn default() -> Self {
        Self { wind: true, water_drag: true, slack_constraint: true, motor: true }
    }
}

/// Quadratic drag coefficients, N/(m/s)². Forward is the easiest direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct WaterDragConfig {
    pub forward: f64,
    pub sideways: f64,
    pub backward: f64,
    /// Below this speed drag is zero
    pub min_speed_mps: f64,
}

impl Default for WaterDragConfig {
    fn default() -> Self {
        Self { forward: 28.0, sideways: 449.0, backward: 112.0, min_speed_mps: 1e-3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct ChainConfig {
    pub weight_per_meter_kg: f64,
    pub gravity: f64,
    /// Dead-stop constraint engages at slack ≤ this, meters
    pub activation_buffer_m: f64,
    /// Anchor share of yaw torque with a taut chain
    pub tension_factor_max: f64,
    /// Anchor share of yaw torque with all rode slack
    pub tension_factor_min: f64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            weight_per_meter_kg: 2.5,
            gravity: 9.81,
            activation_buffer_m: 0.5,
            tension_factor_max: 0.95,
            tension_factor_min: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct MotorConfig {
    pub forward_thrust_n: f64,
    pub backward_thrust_n: f64,
    /// Retrieval thrust starts tapering inside this distance to the anchor
    pub ramp_distance_m: f64,
    /// Thrust cuts out inside this distance (only with little rode out)
    pub stop_distance_m: f64,
    /// Rode must be below this for the close-in cut-out
    pub stop_max_rode_m: f64,
    /// Lower bound on the taper unless cut out
    pub ramp_min_factor: f64,
    pub overspeed_mps: f64,
    pub overspeed_factor: f64,
    /// Manual commands suppress auto control this long
    pub manual_timeout_s: f64,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            forward_thrust_n: 500.0,
            backward_thrust_n: 300.0,
            ramp_distance_m: 10.0,
            stop_distance_m: 2.0,
            stop_max_rode_m: 5.0,
            ramp_min_factor: 0.15,
            overspeed_mps: 0.5,
            overspeed_factor: 0.5,
            manual_timeout_s: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct AutoMotorConfig {
    pub enabled: bool,
    /// Max throttle change per second
    pub throttle_ramp_rate: f64,
    /// Below this boat speed the deploy assist engages
    pub deploy_min_speed: f64,
    /// Target speed with plenty of slack
    pub deploy_target_speed: f64,
    /// Target speed with moderate slack
    pub deploy_mid_speed: f64,
    pub deploy_throttle_gain: f64,
    pub deploy_min_throttle: f64,
    pub deploy_max_throttle: f64,
    pub retrieve_max_throttle: f64,
    /// Throttle at the top of the light-assist band (slack = 1 m)
    pub retrieve_light_throttle: f64,
    /// Throttle below this counts as off
    pub idle_epsilon: f64,
}

impl Default for AutoMotorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            throttle_ramp_rate: 0.5,
            deploy_min_speed: 0.3,
            deploy_target_speed: 0.8,
            deploy_mid_speed: 0.4,
            deploy_throttle_gain: 1.0,
            deploy_min_throttle: 0.1,
            deploy_max_throttle: 0.6,
            retrieve_max_throttle: 1.0,
            retrieve_light_throttle: 0.3,
            idle_epsilon: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct AlarmConfig {
    /// Used when no rode is deployed
    pub radius_m: f64,
    pub warning_fraction: f64,
    pub alarm_fraction: f64,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self { radius_m: 30.0, warning_fraction: 0.9, alarm_fraction: 1.1 }
    }
}

// ── Root ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct SimConfig {
    pub simulation: SimulationConfig,
    pub boat: BoatConfig,
    pub wind: WindConfig,
    pub environment: EnvironmentConfig,
    pub tide: TideConfig,
    pub forces: ForcesConfig,
    pub drag: WaterDragConfig,
    pub chain: ChainConfig,
    pub motor: MotorConfig,
    pub auto_motor: AutoMotorConfig,
    pub alarm: AlarmConfig,
}

fn check(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, min, max })
    }
}

impl SimConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: SimConfig = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `path`, falling back to the embedded defaults when the file
    /// does not exist. A file that exists but is malformed is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(raw) => {
                info!("Loaded config from {}", path.display());
                Self::from_toml_str(&raw)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("{} not found, using built-in config", path.display());
                Self::from_toml_str(DEFAULT_CONFIG_TOML)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.simulation;
        check("simulation.dt_s", s.dt_s, 1e-4, 1.0)?;
        check("simulation.wind_update_hz", s.wind_update_hz, 0.01, 50.0)?;
        check("simulation.grace_period_s", s.grace_period_s, 0.0, 600.0)?;
        check("simulation.initial_heading_deg", s.initial_heading_deg, 0.0, 360.0)?;
        if !s.initial_position.is_valid() {
            return Err(ConfigError::Invalid {
                field: "simulation.initial_position",
                reason: format!("{:?} is not a valid lat/lon", s.initial_position),
            });
        }

        let b = &self.boat;
        check("boat.mass_kg", b.mass_kg, 1.0, 1e7)?;
        check("boat.max_angular_velocity_dps", b.max_angular_velocity_dps, 0.1, 180.0)?;
        check("boat.rotational_damping", b.rotational_damping, 0.0, 20.0)?;
        check("boat.weathervane_gain", b.weathervane_gain, 0.0, 20.0)?;
        check("boat.anchor_gain", b.anchor_gain, 0.0, 20.0)?;

        let w = &self.wind;
        check("wind.min_speed_kn", w.min_speed_kn, 0.0, 100.0)?;
        check("wind.max_speed_kn", w.max_speed_kn, w.min_speed_kn, 100.0)?;
        check("wind.initial_speed_kn", w.initial_speed_kn, w.min_speed_kn, w.max_speed_kn)?;
        check("wind.initial_direction_deg", w.initial_direction_deg, 0.0, 360.0)?;
        check("wind.gust_kn", w.gust_kn, 0.0, 50.0)?;
        check("wind.oscillation_amplitude_deg", w.oscillation_amplitude_deg, 0.0, 180.0)?;
        check("wind.oscillation_period_s", w.oscillation_period_s, 1.0, 86_400.0)?;
        check("wind.shift_interval_s", w.shift_interval_s, 1.0, 86_400.0)?;
        check("wind.max_shift_deg", w.max_shift_deg, 0.0, 180.0)?;
        check("wind.air_density", w.air_density, 0.5, 2.0)?;
        check("wind.windage_area_m2", w.windage_area_m2, 0.0, 500.0)?;
        check("wind.drag_coefficient", w.drag_coefficient, 0.0, 5.0)?;
        check("wind.weathervane_cap_kn", w.weathervane_cap_kn, 0.1, 100.0)?;

        check("environment.depth_m", self.environment.depth_m, 0.0, 500.0)?;

        let t = &self.tide;
        check("tide.mean_height_m", t.mean_height_m, -20.0, 20.0)?;
        check("tide.amplitude_m", t.amplitude_m, 0.0, 20.0)?;
        check("tide.period_s", t.period_s, 60.0, 1e6)?;

        let d = &self.drag;
        check("drag.forward", d.forward, 0.0, 1e5)?;
        check("drag.sideways", d.sideways, 0.0, 1e5)?;
        check("drag.backward", d.backward, 0.0, 1e5)?;
        check("drag.min_speed_mps", d.min_speed_mps, 0.0, 1.0)?;

        let c = &self.chain;
        check("chain.weight_per_meter_kg", c.weight_per_meter_kg, 0.0, 100.0)?;
        check("chain.gravity", c.gravity, 0.0, 30.0)?;
        check("chain.activation_buffer_m", c.activation_buffer_m, 0.0, 10.0)?;
        check("chain.tension_factor_max", c.tension_factor_max, 0.0, 1.0)?;
        check("chain.tension_factor_min", c.tension_factor_min, 0.0, c.tension_factor_max)?;

        let m = &self.motor;
        check("motor.forward_thrust_n", m.forward_thrust_n, 0.0, 1e5)?;
        check("motor.backward_thrust_n", m.backward_thrust_n, 0.0, 1e5)?;
        check("motor.ramp_distance_m", m.ramp_distance_m, 0.0, 1000.0)?;
        check("motor.stop_distance_m", m.stop_distance_m, 0.0, m.ramp_distance_m)?;
        check("motor.stop_max_rode_m", m.stop_max_rode_m, 0.0, 1000.0)?;
        check("motor.ramp_min_factor", m.ramp_min_factor, 0.0, 1.0)?;
        check("motor.overspeed_mps", m.overspeed_mps, 0.0, 20.0)?;
        check("motor.overspeed_factor", m.overspeed_factor, 0.0, 1.0)?;
        check("motor.manual_timeout_s", m.manual_timeout_s, 0.0, 3600.0)?;

        let a = &self.auto_motor;
        check("auto_motor.throttle_ramp_rate", a.throttle_ramp_rate, 0.01, 10.0)?;
        check("auto_motor.deploy_min_speed", a.deploy_min_speed, 0.0, 10.0)?;
        check("auto_motor.deploy_target_speed", a.deploy_target_speed, 0.0, 10.0)?;
        check("auto_motor.deploy_mid_speed", a.deploy_mid_speed, 0.0, a.deploy_target_speed)?;
        check("auto_motor.deploy_throttle_gain", a.deploy_throttle_gain, 0.0, 10.0)?;
        check("auto_motor.deploy_max_throttle", a.deploy_max_throttle, 0.0, 1.0)?;
        check("auto_motor.deploy_min_throttle", a.deploy_min_throttle, 0.0, a.deploy_max_throttle)?;
        check("auto_motor.retrieve_max_throttle", a.retrieve_max_throttle, 0.0, 1.0)?;
        check("auto_motor.retrieve_light_throttle", a.retrieve_light_throttle, 0.0, a.retrieve_max_throttle)?;
        check("auto_motor.idle_epsilon", a.idle_epsilon, 0.0, 0.5)?;

        let al = &self.alarm;
        check("alarm.radius_m", al.radius_m, 1.0, 10_000.0)?;
        check("alarm.warning_fraction", al.warning_fraction, 0.1, 1.0)?;
        check("alarm.alarm_fraction", al.alarm_fraction, 1.0, 5.0)?;

        Ok(())
    }

    /// Merge a partial override. The merged config is validated as a whole;
    /// on any failure `self` is left unchanged.
    pub fn apply_overrides(&mut self, o: &ConfigOverrides) -> Result<(), ConfigError> {
        let mut next = self.clone();
        o.merge_into(&mut next);
        next.validate()?;
        *self = next;
        Ok(())
    }
}

// ── Overrides ─────────────────────────────────────────────────────────────────

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SimulationOverrides {
    pub dt_s: Option<f64>,
    pub grace_period_s: Option<f64>,
    pub initial_position: Option<LatLon>,
    pub initial_heading_deg: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BoatOverrides {
    pub mass_kg: Option<f64>,
    pub max_angular_velocity_dps: Option<f64>,
    pub rotational_damping: Option<f64>,
    pub weathervane_gain: Option<f64>,
    pub anchor_gain: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WindOverrides {
    #[serde(alias = "initialSpeed")]
    pub initial_speed_kn: Option<f64>,
    #[serde(alias = "initialDirection")]
    pub initial_direction_deg: Option<f64>,
    pub min_speed_kn: Option<f64>,
    pub max_speed_kn: Option<f64>,
    pub gust_kn: Option<f64>,
    pub oscillation_amplitude_deg: Option<f64>,
    pub oscillation_period_s: Option<f64>,
    pub shift_interval_s: Option<f64>,
    pub max_shift_deg: Option<f64>,
    pub windage_area_m2: Option<f64>,
    pub drag_coefficient: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnvironmentOverrides {
    #[serde(alias = "depth")]
    pub depth_m: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TideOverrides {
    pub enabled: Option<bool>,
    pub mean_height_m: Option<f64>,
    pub amplitude_m: Option<f64>,
    pub period_s: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ForcesOverrides {
    pub wind: Option<ForceToggle>,
    pub water_drag: Option<ForceToggle>,
    pub slack_constraint: Option<ForceToggle>,
    pub motor: Option<ForceToggle>,
}

/// A force flag, either bare (`"wind": false`) or as `{"enabled": false}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ForceToggle {
    Flag(bool),
    Section { enabled: bool },
}

impl ForceToggle {
    pub fn enabled(self) -> bool {
        match self {
            Self::Flag(on) | Self::Section { enabled: on } => on,
        }
    }
}

fn toggle(target: &mut bool, value: &Option<ForceToggle>) {
    if let Some(t) = value {
        *target = t.enabled();
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DragOverrides {
    pub forward: Option<f64>,
    pub sideways: Option<f64>,
    pub backward: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChainOverrides {
    pub weight_per_meter_kg: Option<f64>,
    pub activation_buffer_m: Option<f64>,
    pub tension_factor_max: Option<f64>,
    pub tension_factor_min: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MotorOverrides {
    pub forward_thrust_n: Option<f64>,
    pub backward_thrust_n: Option<f64>,
    pub ramp_distance_m: Option<f64>,
    pub stop_distance_m: Option<f64>,
    pub stop_max_rode_m: Option<f64>,
    pub manual_timeout_s: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AutoMotorOverrides {
    pub enabled: Option<bool>,
    pub throttle_ramp_rate: Option<f64>,
    pub deploy_min_speed: Option<f64>,
    pub deploy_target_speed: Option<f64>,
    pub deploy_mid_speed: Option<f64>,
    pub deploy_min_throttle: Option<f64>,
    pub deploy_max_throttle: Option<f64>,
    pub retrieve_max_throttle: Option<f64>,
    pub retrieve_light_throttle: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AlarmOverrides {
    pub radius_m: Option<f64>,
    pub warning_fraction: Option<f64>,
    pub alarm_fraction: Option<f64>,
}

/// Partial config accepted at runtime (`PUT /simulation/config`), camelCase.
/// Unknown keys are rejected rather than ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(default)]
    pub simulation: SimulationOverrides,
    #[serde(default)]
    pub boat: BoatOverrides,
    #[serde(default)]
    pub wind: WindOverrides,
    #[serde(default)]
    pub environment: EnvironmentOverrides,
    #[serde(default)]
    pub tide: TideOverrides,
    #[serde(default)]
    pub forces: ForcesOverrides,
    #[serde(default)]
    pub drag: DragOverrides,
    #[serde(default)]
    pub chain: ChainOverrides,
    #[serde(default)]
    pub motor: MotorOverrides,
    #[serde(default)]
    pub auto_motor: AutoMotorOverrides,
    #[serde(default)]
    pub alarm: AlarmOverrides,
}

impl ConfigOverrides {
    fn merge_into(&self, cfg: &mut SimConfig) {
        let s = &self.simulation;
        set(&mut cfg.simulation.dt_s, &s.dt_s);
        set(&mut cfg.simulation.grace_period_s, &s.grace_period_s);
        set(&mut cfg.simulation.initial_position, &s.initial_position);
        set(&mut cfg.simulation.initial_heading_deg, &s.initial_heading_deg);

        let b = &self.boat;
        set(&mut cfg.boat.mass_kg, &b.mass_kg);
        set(&mut cfg.boat.max_angular_velocity_dps, &b.max_angular_velocity_dps);
        set(&mut cfg.boat.rotational_damping, &b.rotational_damping);
        set(&mut cfg.boat.weathervane_gain, &b.weathervane_gain);
        set(&mut cfg.boat.anchor_gain, &b.anchor_gain);

        let w = &self.wind;
        set(&mut cfg.wind.initial_speed_kn, &w.initial_speed_kn);
        set(&mut cfg.wind.initial_direction_deg, &w.initial_direction_deg);
        set(&mut cfg.wind.min_speed_kn, &w.min_speed_kn);
        set(&mut cfg.wind.max_speed_kn, &w.max_speed_kn);
        set(&mut cfg.wind.gust_kn, &w.gust_kn);
        set(&mut cfg.wind.oscillation_amplitude_deg, &w.oscillation_amplitude_deg);
        set(&mut cfg.wind.oscillation_period_s, &w.oscillation_period_s);
        set(&mut cfg.wind.shift_interval_s, &w.shift_interval_s);
        set(&mut cfg.wind.max_shift_deg, &w.max_shift_deg);
        set(&mut cfg.wind.windage_area_m2, &w.windage_area_m2);
        set(&mut cfg.wind.drag_coefficient, &w.drag_coefficient);

        set(&mut cfg.environment.depth_m, &self.environment.depth_m);

        let t = &self.tide;
        set(&mut cfg.tide.enabled, &t.enabled);
        set(&mut cfg.tide.mean_height_m, &t.mean_height_m);
        set(&mut cfg.tide.amplitude_m, &t.amplitude_m);
        set(&mut cfg.tide.period_s, &t.period_s);

        let f = &self.forces;
        toggle(&mut cfg.forces.wind, &f.wind);
        toggle(&mut cfg.forces.water_drag, &f.water_drag);
        toggle(&mut cfg.forces.slack_constraint, &f.slack_constraint);
        toggle(&mut cfg.forces.motor, &f.motor);

        let d = &self.drag;
        set(&mut cfg.drag.forward, &d.forward);
        set(&mut cfg.drag.sideways, &d.sideways);
        set(&mut cfg.drag.backward, &d.backward);

        let c = &self.chain;
        set(&mut cfg.chain.weight_per_meter_kg, &c.weight_per_meter_kg);
        set(&mut cfg.chain.activation_buffer_m, &c.activation_buffer_m);
        set(&mut cfg.chain.tension_factor_max, &c.tension_factor_max);
        set(&mut cfg.chain.tension_factor_min, &c.tension_factor_min);

        let m = &self.motor;
        set(&mut cfg.motor.forward_thrust_n, &m.forward_thrust_n);
        set(&mut cfg.motor.backward_thrust_n, &m.backward_thrust_n);
        set(&mut cfg.motor.ramp_distance_m, &m.ramp_distance_m);
        set(&mut cfg.motor.stop_distance_m, &m.stop_distance_m);
        set(&mut cfg.motor.stop_max_rode_m, &m.stop_max_rode_m);
        set(&mut cfg.motor.manual_timeout_s, &m.manual_timeout_s);

        let a = &self.auto_motor;
        set(&mut cfg.auto_motor.enabled, &a.enabled);
        set(&mut cfg.auto_motor.throttle_ramp_rate, &a.throttle_ramp_rate);
        set(&mut cfg.auto_motor.deploy_min_speed, &a.deploy_min_speed);
        set(&mut cfg.auto_motor.deploy_target_speed, &a.deploy_target_speed);
        set(&mut cfg.auto_motor.deploy_mid_speed, &a.deploy_mid_speed);
        set(&mut cfg.auto_motor.deploy_min_throttle, &a.deploy_min_throttle);
        set(&mut cfg.auto_motor.deploy_max_throttle, &a.deploy_max_throttle);
        set(&mut cfg.auto_motor.retrieve_max_throttle, &a.retrieve_max_throttle);
        set(&mut cfg.auto_motor.retrieve_light_throttle, &a.retrieve_light_throttle);

        let al = &self.alarm;
        set(&mut cfg.alarm.radius_m, &al.radius_m);
        set(&mut cfg.alarm.warning_fraction, &al.warning_fraction);
        set(&mut cfg.alarm.alarm_fraction, &al.alarm_fraction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_parses_and_validates() {
        let cfg = SimConfig::from_toml_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(cfg.simulation.dt_s, 0.05);
        assert!(cfg.forces.wind && cfg.forces.water_drag);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = SimConfig::from_toml_str("[environment]\ndepth_m = 7.5\n").unwrap();
        assert_eq!(cfg.environment.depth_m, 7.5);
        assert_eq!(cfg.boat, BoatConfig::default());
    }

    #[test]
    fn out_of_range_override_leaves_config_unchanged() {
        let mut cfg = SimConfig::default();
        let before = cfg.clone();
        let o: ConfigOverrides = serde_json::from_str(
            r#"{"wind": {"initialSpeedKn": 12.0}, "chain": {"tensionFactorMax": 1.5}}"#,
        )
        .unwrap();

        let err = cfg.apply_overrides(&o).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "chain.tension_factor_max", .. }));
        assert_eq!(cfg, before);
    }

    #[test]
    fn valid_override_is_merged() {
        let mut cfg = SimConfig::default();
        let o: ConfigOverrides = serde_json::from_str(
            r#"{"forces": {"slackConstraint": false}, "environment": {"depthM": 5.0}}"#,
        )
        .unwrap();
        cfg.apply_overrides(&o).unwrap();
        assert!(!cfg.forces.slack_constraint);
        assert_eq!(cfg.environment.depth_m, 5.0);
    }

    #[test]
    fn unknown_override_keys_are_rejected() {
        let parsed = serde_json::from_str::<ConfigOverrides>(r#"{"wind": {"speed": 3}}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn harness_payloads_are_accepted() {
        let mut cfg = SimConfig::default();
        let o: ConfigOverrides = serde_json::from_str(
            r#"{"wind": {"initialSpeed": 12, "initialDirection": 180}, "environment": {"depth": 5}}"#,
        )
        .unwrap();
        cfg.apply_overrides(&o).unwrap();
        assert_eq!(cfg.wind.initial_speed_kn, 12.0);
        assert_eq!(cfg.wind.initial_direction_deg, 180.0);
        assert_eq!(cfg.environment.depth_m, 5.0);

        cfg.forces.slack_constraint = false;
        let o: ConfigOverrides =
            serde_json::from_str(r#"{"forces": {"slackConstraint": {"enabled": true}, "wind": false}}"#).unwrap();
        cfg.apply_overrides(&o).unwrap();
        assert!(cfg.forces.slack_constraint);
        assert!(!cfg.forces.wind);
    }

    #[test]
    fn config_serializes_camel_case() {
        let json = serde_json::to_value(SimConfig::default()).unwrap();
        assert_eq!(json["wind"]["initialSpeedKn"], 10.0);
        assert_eq!(json["autoMotor"]["throttleRampRate"], 0.5);
        assert!(json["forces"]["slackConstraint"].as_bool().unwrap());
    }
}
