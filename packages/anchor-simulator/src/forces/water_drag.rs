//! water_drag.rs — Directional quadratic hull drag
//!
//! F = −v̂ · c(θ) · |v|², θ = angle between velocity and heading.
//! c(θ) blends the three tuned coefficients:
//!   0–45°    forward → sideways
//!   45–135°  sideways
//!   135–180° sideways → backward

use crate::config::WaterDragConfig;
use crate::geo::{angle_diff, Vec2};

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

pub fn drag_coefficient(angle_deg: f64, cfg: &WaterDragConfig) -> f64 {
    let a = angle_deg.abs().min(180.0);
    if a <= 45.0 {
        lerp(cfg.forward, cfg.sideways, a / 45.0)
    } else if a <= 135.0 {
        cfg.sideways
    } else {
        lerp(cfg.sideways, cfg.backward, (a - 135.0) / 45.0)
    }
}

/// Drag force plus the coefficient and angle used. Zero below the minimum speed.
pub fn drag_force(velocity: Vec2, heading_deg: f64, cfg: &WaterDragConfig) -> (Vec2, f64, f64) {
    let speed = velocity.length();
    if speed < cfg.min_speed_mps {
        return (Vec2::zero(), 0.0, 0.0);
    }
    let angle = angle_diff(heading_deg, velocity.bearing()).abs();
    let c = drag_coefficient(angle, cfg);
    let force = velocity.scale(-c * speed); // −v̂ · c · speed²
    (force, c, angle)
}

/// Speed at which drag balances a steady force along the given angle.
pub fn terminal_velocity(force_n: f64, angle_deg: f64, cfg: &WaterDragConfig) -> f64 {
    let c = drag_coefficient(angle_deg, cfg);
    if c <= 0.0 { f64::INFINITY } else { (force_n / c).sqrt() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficient_bands() {
        let cfg = WaterDragConfig::default();
        assert_eq!(drag_coefficient(0.0, &cfg), 28.0);
        assert_eq!(drag_coefficient(90.0, &cfg), 449.0);
        assert_eq!(drag_coefficient(180.0, &cfg), 112.0);
        let mid = drag_coefficient(22.5, &cfg);
        assert!((mid - (28.0 + 449.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn forward_is_easiest_sideways_hardest() {
        let cfg = WaterDragConfig::default();
        let v = Vec2::new(0.0, 1.0); // moving north at 1 m/s
        let fwd = drag_force(v, 0.0, &cfg).0.length();
        let side = drag_force(v, 90.0, &cfg).0.length();
        let back = drag_force(v, 180.0, &cfg).0.length();
        assert!(fwd < back && back < side);
    }

    #[test]
    fn antiparallel_and_quadratic() {
        let cfg = WaterDragConfig::default();
        let v = Vec2::new(0.6, -0.8);
        let (f1, _, _) = drag_force(v, 10.0, &cfg);
        let (f2, _, _) = drag_force(v.scale(2.0), 10.0, &cfg);
        let cos = f1.dot(&v) / (f1.length() * v.length());
        assert!((cos + 1.0).abs() < 1e-12);
        assert!((f2.length() / f1.length() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn zero_at_rest() {
        let (f, c, _) = drag_force(Vec2::zero(), 0.0, &WaterDragConfig::default());
        assert_eq!(f, Vec2::zero());
        assert_eq!(c, 0.0);
    }
}
