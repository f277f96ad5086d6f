//! forces/ — Per-tick force and torque models
//!
//! Each submodule is a set of pure functions over (state, config). The
//! only owned state is the motor's gear/throttle/manual flag (`MotorState`).
//!
//! Sign conventions: forces in Newtons in the local East-North frame,
//! torques as yaw accelerations in deg/s² (positive = clockwise).

pub mod motor;
pub mod slack;
pub mod water_drag;
pub mod wind;

use anchor_types::MotorDirection;
use serde::Serialize;

use crate::geo::Vec2;

/// (fx, fy) plus magnitude, as logged and published in diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ForceVector {
    pub fx: f64,
    pub fy: f64,
    pub magnitude: f64,
}

impl ForceVector {
    pub fn from_vec(v: Vec2) -> Self {
        Self { fx: v.x, fy: v.y, magnitude: v.length() }
    }

    pub fn vec(&self) -> Vec2 { Vec2::new(self.fx, self.fy) }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindSample {
    pub enabled: bool,
    #[serde(flatten)]
    pub force: ForceVector,
    /// Direction the boat is pushed toward, degrees
    pub push_direction_deg: f64,
    pub weathervane_torque: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragSample {
    pub enabled: bool,
    #[serde(flatten)]
    pub force: ForceVector,
    pub coefficient: f64,
    /// Angle between velocity and heading, [0, 180]
    pub angle_deg: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintSample {
    pub enabled: bool,
    /// Chain-weight (catenary) pull toward the anchor
    #[serde(flatten)]
    pub force: ForceVector,
    pub suspended_length_m: f64,
    pub slack_m: Option<f64>,
    /// Chain weight held off while paying out
    pub chain_weight_suppressed: bool,
    pub velocity_constraint_active: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MotorSample {
    pub enabled: bool,
    #[serde(flatten)]
    pub force: ForceVector,
    pub direction: MotorDirection,
    pub throttle: f64,
    pub ramp_factor: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TorqueSample {
    pub wind: f64,
    pub anchor: f64,
    pub total: f64,
    /// Anchor share of the blended torque; wind share is 1 − this
    pub tension_factor: f64,
}

/// Everything one tick applied to the boat. Disabled forces record zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceSample {
    pub wind: WindSample,
    pub water_drag: DragSample,
    pub constraint: ConstraintSample,
    pub motor: MotorSample,
    pub torque: TorqueSample,
    pub total: ForceVector,
}
