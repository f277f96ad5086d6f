//! telemetry.rs — Outbound SignalK delta, one per physics tick
//!
//! Units follow SignalK: radians for angles, m/s for speeds, meters for
//! depth and tide heights.

use anchor_types::{Delta, LatLon, MotorDirection};
use chrono::SecondsFormat;
use serde_json::json;

use crate::geo::MPS_PER_KNOT;
use crate::simulation::Simulation;

pub const SOURCE_LABEL: &str = "anchor-simulator";

/// "forward 45% (auto)", "backward 20% (manual)", "stopped"
pub fn motor_description(direction: MotorDirection, percent: Option<u8>, manual: bool) -> String {
    match (direction, percent) {
        (MotorDirection::Stop, _) | (_, None) => "stopped".to_string(),
        (dir, Some(pct)) => {
            let mode = if manual { "manual" } else { "auto" };
            format!("{} {pct}% ({mode})", dir.as_str())
        }
    }
}

pub fn build_delta(sim: &Simulation) -> Delta {
    let now = sim.now();
    let mut delta = Delta::new(SOURCE_LABEL, now.to_rfc3339_opts(SecondsFormat::Millis, true));

    let boat = sim.boat().state();
    let env = sim.environment().state();
    let motor = sim.motor();

    let LatLon { latitude, longitude } = boat.position;
    delta.push("navigation.position", json!({ "latitude": latitude, "longitude": longitude }));
    delta.push("navigation.speedOverGround", boat.speed());
    delta.push("navigation.headingTrue", boat.heading_deg.to_radians());

    delta.push("environment.wind.speedTrue", env.wind_speed_kn * MPS_PER_KNOT);
    delta.push("environment.wind.directionTrue", env.wind_direction_deg.to_radians());
    delta.push("environment.depth.belowSurface", env.depth_m);

    if let Some(tide) = env.tide {
        delta.push("environment.tide.heightNow", tide.height_now);
        delta.push("environment.tide.heightHigh", tide.height_high);
        delta.push("environment.tide.heightLow", tide.height_low);
        delta.push("environment.tide.timeHigh", tide.time_high.to_rfc3339_opts(SecondsFormat::Secs, true));
        delta.push("environment.tide.timeLow", tide.time_low.to_rfc3339_opts(SecondsFormat::Secs, true));
    }

    let percent = motor.throttle_percent();
    delta.push("navigation.anchor.motor.direction", motor.direction.as_str());
    if let Some(pct) = percent {
        delta.push("navigation.anchor.motor.throttle", pct);
    }
    delta.push(
        "navigation.anchor.motor.description",
        motor_description(motor.direction, percent, motor.is_manual()),
    );

    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    #[test]
    fn description_reflects_mode() {
        assert_eq!(motor_description(MotorDirection::Forward, Some(45), false), "forward 45% (auto)");
        assert_eq!(motor_description(MotorDirection::Backward, Some(20), true), "backward 20% (manual)");
        assert_eq!(motor_description(MotorDirection::Stop, Some(20), true), "stopped");
        assert_eq!(motor_description(MotorDirection::Forward, None, false), "stopped");
    }

    #[test]
    fn delta_uses_signalk_units_and_omits_idle_throttle() {
        let mut cfg = SimConfig::default();
        cfg.simulation.seed = Some(3);
        cfg.simulation.initial_heading_deg = 90.0;
        let sim = Simulation::new(cfg).unwrap();
        let delta = build_delta(&sim);

        let heading = delta.get("navigation.headingTrue").and_then(|v| v.as_f64()).unwrap();
        assert!((heading - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        let wind = delta.get("environment.wind.speedTrue").and_then(|v| v.as_f64()).unwrap();
        assert!((wind - 10.0 * MPS_PER_KNOT).abs() < 1e-9);
        assert!(delta.get("navigation.anchor.motor.throttle").is_none());
        assert!(delta.get("environment.tide.heightNow").is_none());
        assert_eq!(delta.get("navigation.anchor.motor.description"), Some(&json!("stopped")));
    }
}
