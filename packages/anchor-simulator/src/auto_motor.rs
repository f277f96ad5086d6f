//! auto_motor.rs — Slack-driven motor assist
//!
//! Runs once per tick after the physics step:
//! - Deploying: reverse gently so the chain lays out instead of piling up.
//!   Target boat speed comes from slack (<1 m: 0, <3 m: mid, else high).
//!   Engages when the boat is slower than `deploy_min_speed` and keeps
//!   driving until the target speed is reached.
//! - Retrieving: forward assist from slack bands, hardest when the chain is
//!   bar-tight so the windlass is never stalled. A running motor is put in
//!   forward at once and its throttle ramped from where it is.
//! - Idle: wind down and stop.
//!
//! Throttle always moves at `throttle_ramp_rate` per second. Engaging
//! reverse for a deploy first ramps a running forward gear to zero. Manual
//! commands lock the controller out until their timer expires.

use anchor_types::MotorDirection;
use tracing::debug;

use crate::config::AutoMotorConfig;
use crate::external::{ExternalState, Intent};
use crate::forces::motor::MotorState;

#[derive(Debug, Default)]
pub struct AutoMotor {
    intent: Intent,
}

impl AutoMotor {
    pub fn new() -> Self { Self::default() }

    pub fn intent(&self) -> Intent { self.intent }

    pub fn reset(&mut self) {
        self.intent = Intent::Idle;
    }

    /// Gear rule checked before thrust is computed: while retrieving, a
    /// running motor is always in forward.
    pub fn hold_gear(&self, motor: &mut MotorState, ext: &ExternalState, cfg: &AutoMotorConfig) {
        if !cfg.enabled || motor.is_manual() || ext.intent() != Intent::Retrieving {
            return;
        }
        if motor.direction != MotorDirection::Forward && motor.throttle > 0.0 {
            debug!("Auto-motor: retrieving, {} → forward at {:.2}", motor.direction.as_str(), motor.throttle);
            motor.set_direction(MotorDirection::Forward);
        }
    }

    pub fn update(&mut self, motor: &mut MotorState, ext: &ExternalState, speed_mps: f64, cfg: &AutoMotorConfig, dt: f64) {
        if !cfg.enabled || motor.is_manual() {
            return;
        }
        self.hold_gear(motor, ext, cfg);

        let intent = ext.intent();
        if intent != self.intent {
            debug!("Auto-motor: {:?} → {:?}", self.intent, intent);
            self.intent = intent;
        }

        match intent {
            Intent::Deploying => {
                let target = deploy_throttle(ext.chain_slack, speed_mps, motor, cfg);
                drive(motor, MotorDirection::Backward, target, cfg, dt);
            }
            Intent::Retrieving => {
                let target = retrieve_throttle(ext.chain_slack, cfg);
                drive(motor, MotorDirection::Forward, target, cfg, dt);
            }
            Intent::Idle => {
                let gear = motor.direction;
                drive(motor, gear, 0.0, cfg, dt);
            }
        }
    }
}

/// Boat speed to aim for while paying out chain
pub fn deploy_target_speed(slack_m: f64, cfg: &AutoMotorConfig) -> f64 {
    if slack_m < 1.0 {
        0.0
    } else if slack_m < 3.0 {
        cfg.deploy_mid_speed
    } else {
        cfg.deploy_target_speed
    }
}

fn deploy_throttle(slack: Option<f64>, speed_mps: f64, motor: &MotorState, cfg: &AutoMotorConfig) -> f64 {
    let Some(slack) = slack else { return 0.0 };
    let target_speed = deploy_target_speed(slack, cfg);
    let assisting = motor.direction == MotorDirection::Backward && motor.throttle > cfg.idle_epsilon;
    let engage = speed_mps < cfg.deploy_min_speed || (assisting && speed_mps < target_speed);
    if target_speed > 0.0 && engage {
        ((target_speed - speed_mps) * cfg.deploy_throttle_gain)
            .clamp(cfg.deploy_min_throttle, cfg.deploy_max_throttle)
    } else {
        0.0
    }
}

/// Forward assist by slack band
pub fn retrieve_throttle(slack: Option<f64>, cfg: &AutoMotorConfig) -> f64 {
    let Some(slack) = slack else { return 0.0 };
    let (max, light) = (cfg.retrieve_max_throttle, cfg.retrieve_light_throttle);
    if slack < 0.5 {
        max
    } else if slack < 1.0 {
        light + (1.0 - slack) / 0.5 * (max - light)
    } else if slack < 3.0 {
        (3.0 - slack) / 2.0 * light
    } else {
        0.0
    }
}

fn ramp_toward(current: f64, target: f64, max_step: f64) -> f64 {
    current + (target - current).clamp(-max_step, max_step)
}

/// Move the motor toward `target` throttle in `gear`, never stepping.
fn drive(motor: &mut MotorState, gear: MotorDirection, target: f64, cfg: &AutoMotorConfig, dt: f64) {
    let step = cfg.throttle_ramp_rate * dt;

    // Forward still turning when reverse is wanted: bring it down first
    if gear == MotorDirection::Backward && motor.direction == MotorDirection::Forward && motor.throttle > cfg.idle_epsilon {
        motor.set_throttle(ramp_toward(motor.throttle, 0.0, step));
        return;
    }

    if target > 0.0 && gear != MotorDirection::Stop {
        if motor.direction != gear {
            debug!("Auto-motor: engaging {}", gear.as_str());
            motor.set_throttle(0.0);
        }
        motor.set_direction(gear);
        motor.set_throttle(ramp_toward(motor.throttle, target, step));
        return;
    }

    motor.set_throttle(ramp_toward(motor.throttle, 0.0, step));
    if motor.throttle <= cfg.idle_epsilon && motor.direction != MotorDirection::Stop {
        debug!("Auto-motor: stopped");
        motor.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_types::ChainDirection;

    fn deploying(slack: f64) -> ExternalState {
        ExternalState {
            chain_slack: Some(slack),
            chain_direction: ChainDirection::Down,
            ..Default::default()
        }
    }

    #[test]
    fn deploy_targets_by_slack() {
        let cfg = AutoMotorConfig::default();
        assert_eq!(deploy_target_speed(0.5, &cfg), 0.0);
        assert_eq!(deploy_target_speed(2.0, &cfg), 0.4);
        assert_eq!(deploy_target_speed(4.0, &cfg), 0.8);
    }

    #[test]
    fn retrieve_bands_are_continuous() {
        let cfg = AutoMotorConfig::default();
        assert_eq!(retrieve_throttle(Some(0.2), &cfg), 1.0);
        assert!((retrieve_throttle(Some(0.5), &cfg) - 1.0).abs() < 1e-12);
        assert!((retrieve_throttle(Some(0.999_999), &cfg) - 0.3).abs() < 1e-5);
        assert!((retrieve_throttle(Some(1.0), &cfg) - 0.3).abs() < 1e-12);
        assert!((retrieve_throttle(Some(2.0), &cfg) - 0.15).abs() < 1e-12);
        assert_eq!(retrieve_throttle(Some(3.0), &cfg), 0.0);
        assert_eq!(retrieve_throttle(None, &cfg), 0.0);
    }

    #[test]
    fn throttle_ramps_instead_of_stepping() {
        let cfg = AutoMotorConfig::default();
        let mut motor = MotorState::default();
        let mut ctl = AutoMotor::new();
        ctl.update(&mut motor, &deploying(4.0), 0.0, &cfg, 0.05);
        assert_eq!(motor.direction, MotorDirection::Backward);
        assert!((motor.throttle - 0.025).abs() < 1e-12);
        assert_eq!(ctl.intent(), Intent::Deploying);
    }

    #[test]
    fn retrieval_never_runs_in_reverse() {
        let cfg = AutoMotorConfig::default();
        let mut motor = MotorState { direction: MotorDirection::Backward, throttle: 0.6, manual_remaining_s: 0.0 };
        let mut ctl = AutoMotor::new();
        let retrieving = ExternalState {
            chain_slack: Some(0.2),
            chain_direction: ChainDirection::Up,
            ..Default::default()
        };

        ctl.hold_gear(&mut motor, &retrieving, &cfg);
        assert_eq!(motor.direction, MotorDirection::Forward);
        assert_eq!(motor.throttle, 0.6);

        let mut motor = MotorState { direction: MotorDirection::Backward, throttle: 0.6, manual_remaining_s: 0.0 };
        for _ in 0..30 {
            ctl.update(&mut motor, &retrieving, 0.0, &cfg, 0.05);
            if motor.throttle > 0.0 {
                assert_eq!(motor.direction, MotorDirection::Forward);
            }
        }
        // ramped up from 0.6 rather than from zero
        assert!((motor.throttle - 1.0).abs() < 1e-9);
    }

    #[test]
    fn deploy_brings_forward_gear_down_first() {
        let cfg = AutoMotorConfig::default();
        let mut motor = MotorState { direction: MotorDirection::Forward, throttle: 0.5, manual_remaining_s: 0.0 };
        let mut ctl = AutoMotor::new();
        ctl.update(&mut motor, &deploying(4.0), 0.0, &cfg, 0.1);
        assert_eq!(motor.direction, MotorDirection::Forward);
        assert!((motor.throttle - 0.45).abs() < 1e-12);

        for _ in 0..20 {
            ctl.update(&mut motor, &deploying(4.0), 0.0, &cfg, 0.1);
        }
        assert_eq!(motor.direction, MotorDirection::Backward);
        assert!(motor.throttle > 0.0);
    }

    #[test]
    fn idle_winds_down_to_stop() {
        let cfg = AutoMotorConfig::default();
        let mut motor = MotorState { direction: MotorDirection::Forward, throttle: 0.3, manual_remaining_s: 0.0 };
        let mut ctl = AutoMotor::new();
        for _ in 0..20 {
            ctl.update(&mut motor, &ExternalState::default(), 0.0, &cfg, 0.05);
        }
        assert_eq!(motor.direction, MotorDirection::Stop);
        assert_eq!(motor.throttle, 0.0);
    }

    #[test]
    fn manual_mode_locks_controller_out() {
        let cfg = AutoMotorConfig::default();
        let mut motor = MotorState { direction: MotorDirection::Forward, throttle: 0.7, manual_remaining_s: 30.0 };
        let mut ctl = AutoMotor::new();
        ctl.update(&mut motor, &ExternalState::default(), 0.0, &cfg, 0.05);
        assert_eq!(motor.direction, MotorDirection::Forward);
        assert_eq!(motor.throttle, 0.7);
    }
}
