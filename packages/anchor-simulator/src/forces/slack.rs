//! slack.rs — Chain weight and the dead-stop constraint
//!
//! Both effects are driven by the collaborator's chain slack and the depth;
//! the simulation never computes slack itself.

use crate::config::ChainConfig;
use crate::geo::Vec2;

/// Chain hanging between seabed and bow: clamp(depth − slack, 0, depth)
pub fn suspended_length(depth_m: f64, slack_m: f64) -> f64 {
    let depth = depth_m.max(0.0);
    (depth - slack_m).clamp(0.0, depth)
}

/// Catenary approximation: weight of the suspended chain, pulling toward
/// the anchor. Returns the force and the suspended length.
pub fn chain_weight_force(depth_m: f64, slack_m: f64, bearing_to_anchor_deg: f64, cfg: &ChainConfig) -> (Vec2, f64) {
    let suspended = suspended_length(depth_m, slack_m);
    let magnitude = suspended * cfg.weight_per_meter_kg * cfg.gravity;
    (Vec2::from_bearing(bearing_to_anchor_deg).scale(magnitude), suspended)
}

/// Engages slightly before the chain is bar-tight.
pub fn velocity_constraint_active(slack_m: f64, cfg: &ChainConfig) -> bool {
    slack_m <= cfg.activation_buffer_m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_depth_of_chain_at_zero_slack() {
        let (f, suspended) = chain_weight_force(3.0, 0.0, 0.0, &ChainConfig::default());
        assert_eq!(suspended, 3.0);
        assert!((f.length() - 73.575).abs() < 1e-9);
        assert!(f.y > 0.0 && f.x.abs() < 1e-9);
    }

    #[test]
    fn no_pull_once_slack_reaches_depth() {
        let cfg = ChainConfig::default();
        assert_eq!(chain_weight_force(3.0, 3.0, 90.0, &cfg).0.length(), 0.0);
        assert_eq!(chain_weight_force(3.0, 12.0, 90.0, &cfg).0.length(), 0.0);
    }

    #[test]
    fn pull_decreases_with_slack() {
        let cfg = ChainConfig::default();
        let mut last = f64::INFINITY;
        for i in 0..=30 {
            let slack = i as f64 * 0.1;
            let m = chain_weight_force(3.0, slack, 45.0, &cfg).0.length();
            assert!(m <= last);
            last = m;
        }
        // negative slack cannot lift more than the water column
        assert_eq!(suspended_length(3.0, -2.0), 3.0);
    }

    #[test]
    fn constraint_engages_at_buffer_not_zero() {
        let cfg = ChainConfig::default();
        assert!(!velocity_constraint_active(0.6, &cfg));
        assert!(velocity_constraint_active(0.5, &cfg));
        assert!(velocity_constraint_active(0.2, &cfg));
    }
}
