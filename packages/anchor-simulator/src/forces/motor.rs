//! motor.rs — Motor state and thrust
//!
//! Forward thrust follows the heading, except while retrieving an anchor:
//! then it is steered along the bearing to the anchor and tapered as the
//! boat closes in. Backward thrust is reverse, opposite the heading.

use anchor_types::MotorDirection;
use serde::Serialize;

use crate::config::MotorConfig;
use crate::geo::{wrap_deg, Vec2};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MotorState {
    pub direction: MotorDirection,
    /// 0.0–1.0
    pub throttle: f64,
    /// Seconds left before auto control may act again; 0 = not manual
    pub manual_remaining_s: f64,
}

impl MotorState {
    pub fn set_direction(&mut self, direction: MotorDirection) {
        self.direction = direction;
    }

    pub fn set_throttle(&mut self, throttle: f64) {
        self.throttle = if throttle.is_finite() { throttle.clamp(0.0, 1.0) } else { 0.0 };
    }

    pub fn stop(&mut self) {
        self.direction = MotorDirection::Stop;
        self.throttle = 0.0;
    }

    pub fn arm_manual(&mut self, timeout_s: f64) {
        self.manual_remaining_s = timeout_s.max(0.0);
    }

    pub fn is_manual(&self) -> bool {
        self.manual_remaining_s > 0.0
    }

    /// Count down the manual-mode timer. Returns true when it just expired.
    pub fn tick_manual(&mut self, dt: f64) -> bool {
        if !self.is_manual() {
            return false;
        }
        self.manual_remaining_s = (self.manual_remaining_s - dt).max(0.0);
        !self.is_manual()
    }

    pub fn is_running(&self) -> bool {
        self.direction != MotorDirection::Stop && self.throttle > 0.0
    }

    /// Published throttle, integer percent 1–100; None while not running
    pub fn throttle_percent(&self) -> Option<u8> {
        self.is_running()
            .then(|| (self.throttle * 100.0).round().clamp(1.0, 100.0) as u8)
    }
}

/// What the motor needs to know about the boat this tick
#[derive(Debug, Clone, Copy, Default)]
pub struct MotorContext {
    pub heading_deg: f64,
    pub speed_mps: f64,
    pub retrieving: bool,
    pub bearing_to_anchor_deg: Option<f64>,
    pub distance_to_anchor_m: Option<f64>,
    pub rode_deployed_m: f64,
}

/// Retrieval taper: quadratic inside the ramp distance, floored at
/// `ramp_min_factor`, halved again on over-speed, and cut to zero close in
/// (only once little rode is left out).
pub fn ramp_factor(distance_m: f64, rode_deployed_m: f64, speed_mps: f64, cfg: &MotorConfig) -> f64 {
    if distance_m < cfg.stop_distance_m && rode_deployed_m < cfg.stop_max_rode_m {
        return 0.0;
    }
    if distance_m >= cfg.ramp_distance_m || cfg.ramp_distance_m <= 0.0 {
        return 1.0;
    }
    let mut factor = (distance_m / cfg.ramp_distance_m).powi(2).max(cfg.ramp_min_factor);
    if speed_mps > cfg.overspeed_mps {
        factor *= cfg.overspeed_factor;
    }
    factor
}

/// Thrust vector and the ramp factor applied
pub fn motor_force(state: &MotorState, ctx: &MotorContext, cfg: &MotorConfig) -> (Vec2, f64) {
    let (bearing, max_thrust, ramp) = match state.direction {
        MotorDirection::Stop => return (Vec2::zero(), 0.0),
        MotorDirection::Backward => (wrap_deg(ctx.heading_deg + 180.0), cfg.backward_thrust_n, 1.0),
        MotorDirection::Forward => match (ctx.retrieving, ctx.bearing_to_anchor_deg, ctx.distance_to_anchor_m) {
            (true, Some(bearing), Some(distance)) => (
                bearing,
                cfg.forward_thrust_n,
                ramp_factor(distance, ctx.rode_deployed_m, ctx.speed_mps, cfg),
            ),
            _ => (ctx.heading_deg, cfg.forward_thrust_n, 1.0),
        },
    };
    let magnitude = max_thrust * state.throttle * ramp;
    (Vec2::from_bearing(bearing).scale(magnitude), ramp)
}
