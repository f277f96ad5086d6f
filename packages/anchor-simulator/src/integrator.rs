//! integrator.rs — One physics tick
//!
//! Order per tick:
//!   1. wind force (+ weathervane torque when free)
//!   2. directional water drag
//!   3. anchored heading torque (tension-factor blend, or anchor-only)
//!   4. motor thrust (retrieval steering + taper)
//!   5. chain weight + dead-stop constraint (anchored, slack known)
//!   6–7. apply totals, advance the boat
//!   8. hand back the force sample
//!
//! Every force checks its own enable flag; a disabled force contributes and
//! records exactly zero.

use tracing::{debug, error};

use crate::boat::Boat;
use crate::config::SimConfig;
use crate::environment::EnvironmentState;
use crate::error::SimError;
use crate::external::{ExternalState, Intent};
use crate::forces::motor::{self, MotorContext, MotorState};
use crate::forces::{slack, water_drag, wind, ForceSample, ForceVector};
use crate::geo::Vec2;

/// Everything the integrator reads besides the boat
pub struct StepInput<'a> {
    pub environment: &'a EnvironmentState,
    pub external: &'a ExternalState,
    pub motor: &'a MotorState,
    pub intent: Intent,
    /// True during the grace period after a manual reposition
    pub constraints_suppressed: bool,
}

#[derive(Debug, Default)]
pub struct Integrator {
    last: ForceSample,
    iterations: u64,
}

impl Integrator {
    pub fn new() -> Self { Self::default() }

    pub fn last_sample(&self) -> &ForceSample { &self.last }
    pub fn iterations(&self) -> u64 { self.iterations }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn step(&mut self, boat: &mut Boat, input: &StepInput<'_>, cfg: &SimConfig, dt: f64) -> Result<ForceSample, SimError> {
        let env = input.environment;
        let ext = input.external;
        let state = boat.state().clone();
        let anchored = state.is_anchored();
        let bearing = boat.bearing_to_anchor();
        let distance = boat.distance_to_anchor();

        let mut sample = ForceSample::default();
        let mut total = Vec2::zero();
        let mut torque = 0.0;

        // 1. Wind
        let mut weathervane = 0.0;
        if cfg.forces.wind {
            let f = wind::wind_force(env.wind_speed_kn, env.wind_direction_deg, &cfg.wind);
            weathervane = wind::weathervane_torque(
                state.heading_deg,
                env.wind_direction_deg,
                env.wind_speed_kn,
                &cfg.boat,
                &cfg.wind,
            );
            total = total.add(&f);
            sample.wind.enabled = true;
            sample.wind.force = ForceVector::from_vec(f);
            sample.wind.push_direction_deg = wind::push_direction(env.wind_direction_deg);
            sample.wind.weathervane_torque = weathervane;
            if !anchored {
                torque += weathervane;
                sample.torque.wind = weathervane;
            }
        }

        // 2. Water drag
        if cfg.forces.water_drag {
            let (f, coefficient, angle) = water_drag::drag_force(state.velocity(), state.heading_deg, &cfg.drag);
            total = total.add(&f);
            sample.water_drag.enabled = true;
            sample.water_drag.force = ForceVector::from_vec(f);
            sample.water_drag.coefficient = coefficient;
            sample.water_drag.angle_deg = angle;
        }

        // 3. Anchored heading torque
        if let (Some(bearing), Some(distance)) = (bearing, distance) {
            let anchor_t = wind::anchor_torque(state.heading_deg, bearing, &cfg.boat);
            if cfg.forces.wind {
                let t = wind::tension_factor(ext.rode_deployed, distance, &cfg.chain);
                let blended = wind::blended_torque(anchor_t, weathervane, t);
                torque += blended;
                sample.torque.tension_factor = t;
                sample.torque.anchor = t * anchor_t;
                sample.torque.wind = (1.0 - t) * weathervane;
            } else {
                torque += anchor_t;
                sample.torque.tension_factor = 1.0;
                sample.torque.anchor = anchor_t;
            }
        }

        // 4. Motor
        if cfg.forces.motor {
            let ctx = MotorContext {
                heading_deg: state.heading_deg,
                speed_mps: state.speed(),
                retrieving: input.intent == Intent::Retrieving,
                bearing_to_anchor_deg: bearing,
                distance_to_anchor_m: distance,
                rode_deployed_m: ext.rode_deployed,
            };
            let (f, ramp) = motor::motor_force(input.motor, &ctx, &cfg.motor);
            total = total.add(&f);
            sample.motor.enabled = true;
            sample.motor.force = ForceVector::from_vec(f);
            sample.motor.direction = input.motor.direction;
            sample.motor.throttle = input.motor.throttle;
            sample.motor.ramp_factor = ramp;
        }

        // 5. Chain weight + dead-stop
        if cfg.forces.slack_constraint {
            sample.constraint.enabled = true;
            sample.constraint.slack_m = ext.chain_slack;
            if let (Some(bearing), Some(slack_m), false) = (bearing, ext.chain_slack, input.constraints_suppressed) {
                if input.intent == Intent::Deploying {
                    sample.constraint.chain_weight_suppressed = true;
                } else {
                    let (f, suspended) = slack::chain_weight_force(env.depth_m, slack_m, bearing, &cfg.chain);
                    total = total.add(&f);
                    sample.constraint.force = ForceVector::from_vec(f);
                    sample.constraint.suspended_length_m = suspended;
                }
                if slack::velocity_constraint_active(slack_m, &cfg.chain) {
                    boat.set_velocity_constraint(true, bearing);
                    sample.constraint.velocity_constraint_active = true;
                }
            }
        }

        // 6. Apply
        boat.apply_force(total.x, total.y);
        boat.apply_torque(torque);
        sample.torque.total = torque;
        sample.total = ForceVector::from_vec(total);
        self.last = sample;
        self.iterations += 1;

        // 7. Advance
        if let Err(e) = boat.update(dt) {
            error!(
                "💥 Fatal physics error at iteration {}: {e}\nforces: {}\nboat: {:?}",
                self.iterations,
                serde_json::to_string(&sample).unwrap_or_default(),
                boat.state(),
            );
            return Err(e);
        }

        debug!(
            "tick {} | F=({:.1}, {:.1}) N | τ={:.2} °/s² | v={:.2} m/s",
            self.iterations,
            total.x,
            total.y,
            torque,
            boat.speed()
        );

        // 8.
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::MPS_PER_KNOT;
    use anchor_types::MotorDirection;

    fn calm() -> EnvironmentState {
        EnvironmentState { wind_speed_kn: 0.0, wind_direction_deg: 0.0, depth_m: 3.0, tide: None }
    }

    fn input<'a>(env: &'a EnvironmentState, ext: &'a ExternalState, motor: &'a MotorState) -> StepInput<'a> {
        StepInput { environment: env, external: ext, motor, intent: ext.intent(), constraints_suppressed: false }
    }

    #[test]
    fn disabled_forces_record_zero() {
        let mut cfg = SimConfig::default();
        cfg.forces.wind = false;
        cfg.forces.water_drag = false;
        cfg.forces.motor = false;
        cfg.forces.slack_constraint = false;
        let mut boat = Boat::new(&cfg);
        boat.set_velocity(1.0, 0.0);
        let env = EnvironmentState { wind_speed_kn: 25.0, ..calm() };
        let ext = ExternalState::default();
        let motor = MotorState { direction: MotorDirection::Forward, throttle: 1.0, manual_remaining_s: 0.0 };

        let s = Integrator::new().step(&mut boat, &input(&env, &ext, &motor), &cfg, 0.05).unwrap();
        assert_eq!(s.total.magnitude, 0.0);
        assert!(!s.wind.enabled && !s.water_drag.enabled && !s.motor.enabled && !s.constraint.enabled);
        assert_eq!(s.wind.force.magnitude, 0.0);
        assert_eq!(boat.state().vx, 1.0);
    }

    #[test]
    fn free_boat_gets_weathervane_torque_only() {
        let cfg = SimConfig::default();
        let mut boat = Boat::new(&cfg);
        boat.set_heading(90.0);
        let env = EnvironmentState { wind_speed_kn: 20.0, wind_direction_deg: 180.0, ..calm() };
        let ext = ExternalState::default();
        let motor = MotorState::default();

        let s = Integrator::new().step(&mut boat, &input(&env, &ext, &motor), &cfg, 0.05).unwrap();
        assert!(s.torque.total > 0.0);
        assert_eq!(s.torque.anchor, 0.0);
        assert_eq!(s.torque.total, s.wind.weathervane_torque);
        // pushed north
        assert!(s.wind.force.fy > 0.0);
        let v = 20.0 * MPS_PER_KNOT;
        assert!((s.wind.force.magnitude - 0.5 * 1.225 * 12.0 * v * v).abs() < 1e-9);
    }

    #[test]
    fn chain_weight_suppressed_while_deploying() {
        let cfg = SimConfig::default();
        let mut boat = Boat::new(&cfg);
        let anchor = boat.scale().displace(&boat.state().position, Vec2::new(0.0, 10.0));
        boat.set_anchor(Some(anchor));
        let env = calm();
        let mut ext = ExternalState {
            anchor_position: Some(anchor),
            rode_deployed: 10.0,
            chain_slack: Some(0.0),
            chain_direction: anchor_types::ChainDirection::Down,
            ..Default::default()
        };
        let motor = MotorState::default();
        let mut integrator = Integrator::new();

        let s = integrator.step(&mut boat, &input(&env, &ext, &motor), &cfg, 0.05).unwrap();
        assert!(s.constraint.chain_weight_suppressed);
        assert_eq!(s.constraint.force.magnitude, 0.0);
        assert!(s.constraint.velocity_constraint_active);

        ext.chain_direction = anchor_types::ChainDirection::Idle;
        let s = integrator.step(&mut boat, &input(&env, &ext, &motor), &cfg, 0.05).unwrap();
        assert!((s.constraint.force.magnitude - 73.575).abs() < 1e-9);
        assert!(s.constraint.force.fy > 0.0);
        assert_eq!(integrator.iterations(), 2);
    }

    #[test]
    fn grace_period_suppresses_constraints() {
        let cfg = SimConfig::default();
        let mut boat = Boat::new(&cfg);
        let anchor = boat.scale().displace(&boat.state().position, Vec2::new(0.0, 10.0));
        boat.set_anchor(Some(anchor));
        let env = calm();
        let ext = ExternalState { anchor_position: Some(anchor), chain_slack: Some(0.0), ..Default::default() };
        let motor = MotorState::default();
        let step = StepInput { constraints_suppressed: true, ..input(&env, &ext, &motor) };

        let s = Integrator::new().step(&mut boat, &step, &cfg, 0.05).unwrap();
        assert!(!s.constraint.velocity_constraint_active);
        assert_eq!(s.constraint.force.magnitude, 0.0);
    }

    #[test]
    fn nan_input_is_fatal() {
        let cfg = SimConfig::default();
        let mut boat = Boat::new(&cfg);
        let env = EnvironmentState { wind_speed_kn: f64::NAN, ..calm() };
        let ext = ExternalState::default();
        let motor = MotorState::default();
        let err = Integrator::new().step(&mut boat, &input(&env, &ext, &motor), &cfg, 0.05).unwrap_err();
        assert!(matches!(err, SimError::NonFinite { .. }));
    }
}
