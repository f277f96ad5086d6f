//! boat.rs — Boat rigid-body state
//!
//! Point-mass / point-inertia approximation of a swinging, anchored vessel:
//! - Position in lat/lon degrees, velocity in m/s (+x = East, +y = North)
//! - Heading in degrees (0 = North, clockwise) with a damped, capped yaw rate
//! - Optional anchor reference, owned by the host and only set via `set_anchor`
//!
//! Forces and torques are accumulated per tick and consumed by `update`.

use anchor_types::LatLon;
use serde::Serialize;

use crate::config::SimConfig;
use crate::error::SimError;
use crate::geo::{wrap_deg, GeoScale, Vec2};

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoatState {
    pub position: LatLon,
    /// East velocity, m/s
    pub vx: f64,
    /// North velocity, m/s
    pub vy: f64,
    /// True heading, degrees [0, 360)
    pub heading_deg: f64,
    /// Yaw rate, deg/s (positive = clockwise)
    pub angular_velocity_dps: f64,
    pub mass_kg: f64,
    pub anchor: Option<LatLon>,
}

impl BoatState {
    pub fn velocity(&self) -> Vec2 { Vec2::new(self.vx, self.vy) }
    pub fn speed(&self) -> f64 { self.vx.hypot(self.vy) }
    pub fn is_anchored(&self) -> bool { self.anchor.is_some() }
}

pub struct Boat {
    state: BoatState,
    initial: BoatState,
    scale: GeoScale,
    max_angular_velocity_dps: f64,
    rotational_damping: f64,

    // Per-tick accumulators
    force: Vec2,
    torque: f64,
    /// Bearing to anchor while the dead-stop constraint is active
    constraint_bearing: Option<f64>,

    last_acceleration: Vec2,
    updates: u64,
}

impl Boat {
    pub fn new(cfg: &SimConfig) -> Self {
        let initial = BoatState {
            position: cfg.simulation.initial_position,
            vx: 0.0,
            vy: 0.0,
            heading_deg: wrap_deg(cfg.simulation.initial_heading_deg),
            angular_velocity_dps: 0.0,
            mass_kg: cfg.boat.mass_kg,
            anchor: None,
        };
        Self {
            state: initial.clone(),
            scale: GeoScale::at_latitude(initial.position.latitude),
            initial,
            max_angular_velocity_dps: cfg.boat.max_angular_velocity_dps,
            rotational_damping: cfg.boat.rotational_damping,
            force: Vec2::zero(),
            torque: 0.0,
            constraint_bearing: None,
            last_acceleration: Vec2::zero(),
            updates: 0,
        }
    }

    /// Pick up boat tuning after a config override. Mass is fixed per run,
    /// so it lands in the initial conditions with position and heading and
    /// takes effect on the next `reset`.
    pub fn apply_config(&mut self, cfg: &SimConfig) {
        self.max_angular_velocity_dps = cfg.boat.max_angular_velocity_dps;
        self.rotational_damping = cfg.boat.rotational_damping;
        self.initial.mass_kg = cfg.boat.mass_kg;
        self.initial.position = cfg.simulation.initial_position;
        self.initial.heading_deg = wrap_deg(cfg.simulation.initial_heading_deg);
    }

    pub fn state(&self) -> &BoatState { &self.state }
    pub fn scale(&self) -> GeoScale { self.scale }
    pub fn speed(&self) -> f64 { self.state.speed() }
    pub fn last_acceleration(&self) -> Vec2 { self.last_acceleration }
    pub fn is_constrained(&self) -> bool { self.constraint_bearing.is_some() }

    // ── Accumulation ──────────────────────────────────────────────────────────

    pub fn apply_force(&mut self, fx: f64, fy: f64) {
        self.force.x += fx;
        self.force.y += fy;
    }

    /// Yaw acceleration, deg/s²
    pub fn apply_torque(&mut self, torque: f64) {
        self.torque += torque;
    }

    /// Arm (or clear) the dead-stop clamp for the next `update`. While armed,
    /// any velocity component pointing away from `bearing_to_anchor` is
    /// removed; inward and perpendicular components are left alone.
    pub fn set_velocity_constraint(&mut self, active: bool, bearing_to_anchor: f64) {
        self.constraint_bearing = if active { Some(bearing_to_anchor) } else { None };
    }

    // ── Integration ───────────────────────────────────────────────────────────

    /// Semi-implicit Euler step. Consumes the accumulated force/torque and
    /// the constraint. Any non-finite result is fatal.
    pub fn update(&mut self, dt: f64) -> Result<(), SimError> {
        self.updates += 1;

        let accel = self.force.scale(1.0 / self.state.mass_kg);
        self.last_acceleration = accel;
        if !accel.is_finite() {
            return Err(self.non_finite("acceleration"));
        }

        let mut v = self.state.velocity().add(&accel.scale(dt));

        if let Some(bearing) = self.constraint_bearing.take() {
            let inward = Vec2::from_bearing(bearing);
            let radial = v.dot(&inward);
            if radial < 0.0 {
                v = v.sub(&inward.scale(radial));
            }
        }

        self.state.vx = v.x;
        self.state.vy = v.y;
        if !v.is_finite() {
            return Err(self.non_finite("velocity"));
        }

        self.state.position = self.scale.displace(&self.state.position, v.scale(dt));
        if !self.state.position.is_finite() {
            return Err(self.non_finite("position"));
        }

        // Yaw: torque is an angular acceleration; damping opposes the rate
        let max_w = self.max_angular_velocity_dps;
        let w = self.state.angular_velocity_dps
            + (self.torque - self.rotational_damping * self.state.angular_velocity_dps) * dt;
        self.state.angular_velocity_dps = w.clamp(-max_w, max_w);
        self.state.heading_deg = wrap_deg(self.state.heading_deg + self.state.angular_velocity_dps * dt);
        if !self.state.heading_deg.is_finite() || !self.state.angular_velocity_dps.is_finite() {
            return Err(self.non_finite("heading"));
        }

        self.force = Vec2::zero();
        self.torque = 0.0;
        Ok(())
    }

    fn non_finite(&self, quantity: &'static str) -> SimError {
        SimError::NonFinite {
            quantity,
            iteration: self.updates,
            boat: Box::new(self.state.clone()),
        }
    }

    // ── Anchor geometry ───────────────────────────────────────────────────────

    pub fn set_anchor(&mut self, anchor: Option<LatLon>) {
        self.state.anchor = anchor;
    }

    pub fn bearing_to_anchor(&self) -> Option<f64> {
        self.state.anchor.map(|a| self.scale.bearing(&self.state.position, &a))
    }

    pub fn distance_to_anchor(&self) -> Option<f64> {
        self.state.anchor.map(|a| self.scale.distance(&self.state.position, &a))
    }

    // ── Manual control ────────────────────────────────────────────────────────

    /// Teleport; velocity and yaw rate are zeroed and the local scale is
    /// re-centred on the new latitude
    pub fn set_position(&mut self, position: LatLon) {
        self.state.position = position;
        self.scale = GeoScale::at_latitude(position.latitude);
        self.state.vx = 0.0;
        self.state.vy = 0.0;
        self.state.angular_velocity_dps = 0.0;
        self.force = Vec2::zero();
        self.torque = 0.0;
        self.constraint_bearing = None;
    }

    pub fn set_velocity(&mut self, vx: f64, vy: f64) {
        self.state.vx = vx;
        self.state.vy = vy;
    }

    pub fn set_heading(&mut self, heading_deg: f64) {
        self.state.heading_deg = wrap_deg(heading_deg);
    }

    /// Restore initial conditions. The anchor reference is the host's and
    /// is cleared until the next snapshot re-supplies it.
    pub fn reset(&mut self) {
        self.state = self.initial.clone();
        self.scale = GeoScale::at_latitude(self.initial.position.latitude);
        self.force = Vec2::zero();
        self.torque = 0.0;
        self.constraint_bearing = None;
        self.last_acceleration = Vec2::zero();
        self.updates = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boat() -> Boat {
        Boat::new(&SimConfig::default())
    }

    #[test]
    fn constant_force_accelerates_along_it() {
        let mut b = boat();
        let start = b.state().position;
        for _ in 0..20 {
            b.apply_force(0.0, 1000.0);
            b.update(0.05).unwrap();
        }
        // a = 0.1 m/s², 1 s
        assert!((b.state().vy - 0.1).abs() < 1e-9);
        assert!(b.state().vx.abs() < 1e-12);
        assert!(b.state().position.latitude > start.latitude);
    }

    #[test]
    fn accumulators_are_cleared_each_update() {
        let mut b = boat();
        b.apply_force(500.0, 0.0);
        b.apply_torque(5.0);
        b.update(0.05).unwrap();
        let vx = b.state().vx;
        b.update(0.05).unwrap();
        assert_eq!(b.state().vx, vx);
    }

    #[test]
    fn yaw_rate_is_capped_and_heading_wraps() {
        let mut b = boat();
        b.set_heading(359.0);
        for _ in 0..200 {
            b.apply_torque(100.0);
            b.update(0.05).unwrap();
        }
        assert!(b.state().angular_velocity_dps <= 10.0 + 1e-9);
        assert!(b.state().heading_deg >= 0.0 && b.state().heading_deg < 360.0);
    }

    #[test]
    fn dead_stop_removes_only_outward_component() {
        let mut b = boat();
        let anchor = b.scale().displace(&b.state().position, Vec2::new(0.0, 20.0));
        b.set_anchor(Some(anchor));

        // Drifting south-east: southward part points away from the anchor
        b.set_velocity(0.3, -0.5);
        let bearing = b.bearing_to_anchor().unwrap();
        b.set_velocity_constraint(true, bearing);
        b.update(0.05).unwrap();

        let inward = Vec2::from_bearing(bearing);
        assert!(b.state().velocity().dot(&inward) >= -1e-12);
        assert!((b.state().vx - 0.3).abs() < 1e-6);
    }

    #[test]
    fn dead_stop_leaves_inward_motion_alone() {
        let mut b = boat();
        let anchor = b.scale().displace(&b.state().position, Vec2::new(0.0, 20.0));
        b.set_anchor(Some(anchor));
        b.set_velocity(0.0, 0.4);
        b.set_velocity_constraint(true, b.bearing_to_anchor().unwrap());
        b.update(0.05).unwrap();
        assert!((b.state().vy - 0.4).abs() < 1e-12);
    }

    #[test]
    fn nan_force_is_fatal() {
        let mut b = boat();
        b.apply_force(f64::NAN, 0.0);
        let err = b.update(0.05).unwrap_err();
        assert!(matches!(err, SimError::NonFinite { quantity: "acceleration", .. }));
    }

    #[test]
    fn teleport_rescales_to_new_latitude() {
        let mut b = boat();
        let far_north = LatLon::new(60.0, 10.0);
        b.set_position(far_north);
        let anchor = GeoScale::at_latitude(60.0).displace(&far_north, Vec2::new(10.0, 0.0));
        b.set_anchor(Some(anchor));
        assert!((b.distance_to_anchor().unwrap() - 10.0).abs() < 1e-6);
        assert!((b.bearing_to_anchor().unwrap() - 90.0).abs() < 1e-6);
    }

    #[test]
    fn mass_override_waits_for_reset() {
        let mut b = boat();
        let mut cfg = SimConfig::default();
        cfg.boat.mass_kg = 2_000.0;
        b.apply_config(&cfg);
        assert_eq!(b.state().mass_kg, 10_000.0);

        b.apply_force(1000.0, 0.0);
        b.update(1.0).unwrap();
        assert!((b.state().vx - 0.1).abs() < 1e-12);

        b.reset();
        assert_eq!(b.state().mass_kg, 2_000.0);
    }

    #[test]
    fn reset_restores_initial_conditions() {
        let mut b = boat();
        let initial = b.state().clone();
        b.set_velocity(1.0, 1.0);
        b.set_heading(123.0);
        b.update(0.05).unwrap();
        b.reset();
        assert_eq!(b.state(), &initial);
    }
}
