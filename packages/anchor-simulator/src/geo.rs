//! geo.rs — Local flat-earth geometry
//!
//! Positions are lat/lon degrees; forces and velocities live in a local
//! East-North frame in meters (+x = East, +y = North). Compass angles are
//! degrees, 0 = North, clockwise.

use anchor_types::LatLon;
use serde::{Deserialize, Serialize};

/// Meters per degree of latitude (fixed, spherical earth)
pub const METERS_PER_DEG_LAT: f64 = 111_111.0;

pub const MPS_PER_KNOT: f64 = 0.514_444;

/// 2D vector in the local East-North frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64, // East
    pub y: f64, // North
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self { Self { x, y } }
    pub fn zero() -> Self { Self { x: 0.0, y: 0.0 } }

    /// Unit vector pointing along a compass bearing
    pub fn from_bearing(bearing_deg: f64) -> Self {
        let r = bearing_deg.to_radians();
        Self::new(r.sin(), r.cos())
    }

    pub fn length(&self) -> f64 { self.x.hypot(self.y) }
    pub fn add(&self, o: &Vec2) -> Vec2 { Vec2::new(self.x + o.x, self.y + o.y) }
    pub fn sub(&self, o: &Vec2) -> Vec2 { Vec2::new(self.x - o.x, self.y - o.y) }
    pub fn scale(&self, s: f64) -> Vec2 { Vec2::new(self.x * s, self.y * s) }
    pub fn dot(&self, o: &Vec2) -> f64 { self.x * o.x + self.y * o.y }

    /// Compass bearing this vector points along, [0, 360)
    pub fn bearing(&self) -> f64 { wrap_deg(self.x.atan2(self.y).to_degrees()) }

    pub fn is_finite(&self) -> bool { self.x.is_finite() && self.y.is_finite() }
}

/// Wrap to [0, 360)
pub fn wrap_deg(deg: f64) -> f64 {
    let w = deg.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if w >= 360.0 { 0.0 } else { w }
}

/// Signed shortest rotation from `from` to `to`, in [-180, 180)
pub fn angle_diff(from: f64, to: f64) -> f64 {
    (to - from + 180.0).rem_euclid(360.0) - 180.0
}

/// Fixed meters-per-degree factors for a reference latitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoScale {
    pub m_per_deg_lat: f64,
    pub m_per_deg_lon: f64,
}

impl GeoScale {
    pub fn at_latitude(lat_deg: f64) -> Self {
        Self {
            m_per_deg_lat: METERS_PER_DEG_LAT,
            m_per_deg_lon: METERS_PER_DEG_LAT * lat_deg.to_radians().cos().max(1e-6),
        }
    }

    /// East-North offset in meters from `from` to `to`
    pub fn offset(&self, from: &LatLon, to: &LatLon) -> Vec2 {
        Vec2::new(
            (to.longitude - from.longitude) * self.m_per_deg_lon,
            (to.latitude - from.latitude) * self.m_per_deg_lat,
        )
    }

    /// Move `from` by an East-North displacement in meters
    pub fn displace(&self, from: &LatLon, d: Vec2) -> LatLon {
        LatLon::new(
            from.latitude + d.y / self.m_per_deg_lat,
            from.longitude + d.x / self.m_per_deg_lon,
        )
    }

    pub fn distance(&self, from: &LatLon, to: &LatLon) -> f64 {
        self.offset(from, to).length()
    }

    pub fn bearing(&self, from: &LatLon, to: &LatLon) -> f64 {
        self.offset(from, to).bearing()
    }
}
