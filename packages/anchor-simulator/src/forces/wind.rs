//! wind.rs — Windage force and heading torques
//!
//! F = ½ · ρ · A · Cd · v², pushing the boat away from where the wind comes
//! FROM. Heading torques:
//! - weathervane: bow seeks the wind, stronger in more wind (saturates at the cap)
//! - anchor: bow seeks the bearing to the anchor
//! - anchored boats blend the two by the chain tension factor

use crate::config::{BoatConfig, ChainConfig, WindConfig};
use crate::geo::{angle_diff, wrap_deg, Vec2, MPS_PER_KNOT};

/// Where the wind pushes the boat, degrees
pub fn push_direction(wind_from_deg: f64) -> f64 {
    wrap_deg(wind_from_deg + 180.0)
}

pub fn wind_force(speed_kn: f64, wind_from_deg: f64, cfg: &WindConfig) -> Vec2 {
    let v = speed_kn * MPS_PER_KNOT;
    let magnitude = 0.5 * cfg.air_density * cfg.windage_area_m2 * cfg.drag_coefficient * v * v;
    Vec2::from_bearing(push_direction(wind_from_deg)).scale(magnitude)
}

/// Turns the bow toward the wind-FROM direction.
pub fn weathervane_torque(heading_deg: f64, wind_from_deg: f64, speed_kn: f64, boat: &BoatConfig, wind: &WindConfig) -> f64 {
    let factor = (speed_kn / wind.weathervane_cap_kn).clamp(0.0, 1.0);
    boat.weathervane_gain * angle_diff(heading_deg, wind_from_deg) * factor
}

pub fn anchor_torque(heading_deg: f64, bearing_to_anchor_deg: f64, boat: &BoatConfig) -> f64 {
    boat.anchor_gain * angle_diff(heading_deg, bearing_to_anchor_deg)
}

/// Anchor share of the heading torque, from the slack ratio
/// (rode − distance) / rode. Taut → max, all slack → min.
pub fn tension_factor(rode_deployed_m: f64, distance_m: f64, cfg: &ChainConfig) -> f64 {
    if rode_deployed_m <= 0.0 {
        return cfg.tension_factor_max;
    }
    let slack_ratio = ((rode_deployed_m - distance_m) / rode_deployed_m).clamp(0.0, 1.0);
    cfg.tension_factor_max - (cfg.tension_factor_max - cfg.tension_factor_min) * slack_ratio
}

pub fn blended_torque(anchor: f64, weathervane: f64, tension_factor: f64) -> f64 {
    tension_factor * anchor + (1.0 - tension_factor) * weathervane
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_is_opposite_wind_source() {
        for from in [0.0, 45.0, 180.0, 270.0, 359.0] {
            let f = wind_force(10.0, from, &WindConfig::default());
            let expected = (from + 180.0) % 360.0;
            assert!(angle_diff(f.bearing(), expected).abs() < 1e-6, "from {from}");
        }
    }

    #[test]
    fn force_scales_with_speed_squared() {
        let cfg = WindConfig::default();
        let f10 = wind_force(10.0, 90.0, &cfg).length();
        let f20 = wind_force(20.0, 90.0, &cfg).length();
        assert!((f20 / f10 - 4.0).abs() < 1e-9);
        // 10 kn on the default boat
        assert!((f10 - 194.6).abs() < 0.5);
    }

    #[test]
    fn weathervane_turns_toward_wind_and_saturates() {
        let (boat, wind) = (BoatConfig::default(), WindConfig::default());
        // heading 90, wind from 180: turn clockwise
        assert!(weathervane_torque(90.0, 180.0, 10.0, &boat, &wind) > 0.0);
        assert!(weathervane_torque(270.0, 180.0, 10.0, &boat, &wind) < 0.0);
        let at_cap = weathervane_torque(90.0, 180.0, 20.0, &boat, &wind);
        let above = weathervane_torque(90.0, 180.0, 35.0, &boat, &wind);
        assert_eq!(at_cap, above);
    }

    #[test]
    fn tension_factor_spans_configured_range() {
        let c = ChainConfig::default();
        assert!((tension_factor(20.0, 20.0, &c) - 0.95).abs() < 1e-12);
        assert!((tension_factor(20.0, 0.0, &c) - 0.6).abs() < 1e-12);
        assert!((tension_factor(20.0, 25.0, &c) - 0.95).abs() < 1e-12);
        assert_eq!(tension_factor(0.0, 5.0, &c), c.tension_factor_max);

        let t = tension_factor(20.0, 5.0, &c);
        assert!(t > 0.6 && t < 0.95);
        // shares sum to one
        assert!((blended_torque(1.0, 1.0, t) - 1.0).abs() < 1e-12);
    }
}
