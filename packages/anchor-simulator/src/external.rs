//! external.rs — Per-tick snapshot of collaborator inputs
//!
//! The host supplies rode, anchor, slack, chain direction, command and depth
//! as optional values. `ExternalState::resolve` turns whatever was received
//! into a complete snapshot with visible defaults.

use anchor_types::{AnchorCommand, ChainDirection, ExternalInputs, LatLon};
use serde::Serialize;

/// What the chain is doing, from the collaborator's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Deploying,
    Retrieving,
    #[default]
    Idle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalState {
    /// Meters; 0 until reported
    pub rode_deployed: f64,
    /// None = not anchored
    pub anchor_position: Option<LatLon>,
    /// None = slack not reported; chain effects stay off
    pub chain_slack: Option<f64>,
    pub chain_direction: ChainDirection,
    pub command: Option<String>,
    /// Overrides the modelled depth when present
    pub depth: Option<f64>,
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

impl ExternalState {
    /// Build this tick's snapshot.
    ///
    /// `inputs` is None when the store could not be read; the previous
    /// snapshot is reused as-is. Otherwise numeric fields the host has not
    /// (validly) supplied carry over from `previous`. The anchor position and
    /// command are taken exactly as stored, since their absence is meaningful.
    pub fn resolve(inputs: Option<&ExternalInputs>, previous: &ExternalState) -> Self {
        let Some(inputs) = inputs else {
            return previous.clone();
        };
        Self {
            rode_deployed: finite(inputs.rode_deployed)
                .map(|r| r.max(0.0))
                .unwrap_or(previous.rode_deployed),
            anchor_position: inputs.anchor_position.filter(|p| p.is_valid()),
            chain_slack: finite(inputs.chain_slack).or(previous.chain_slack),
            chain_direction: inputs.chain_direction.unwrap_or(previous.chain_direction),
            command: inputs.command.clone(),
            depth: finite(inputs.depth).map(|d| d.max(0.0)).or(previous.depth),
        }
    }

    /// Command wins over chain direction when present.
    pub fn intent(&self) -> Intent {
        match self.command.as_deref().map(AnchorCommand::parse) {
            Some(AnchorCommand::AutoDrop) => Intent::Deploying,
            Some(AnchorCommand::AutoRetrieve) => Intent::Retrieving,
            Some(AnchorCommand::Other(_)) => Intent::Idle,
            None => match self.chain_direction {
                ChainDirection::Down => Intent::Deploying,
                ChainDirection::Up => Intent::Retrieving,
                ChainDirection::Idle => Intent::Idle,
            },
        }
    }

    pub fn is_anchored(&self) -> bool {
        self.anchor_position.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_carry_over() {
        let previous = ExternalState {
            rode_deployed: 18.0,
            chain_slack: Some(2.0),
            depth: Some(4.0),
            ..Default::default()
        };
        let inputs = ExternalInputs { chain_slack: Some(f64::NAN), ..Default::default() };
        let s = ExternalState::resolve(Some(&inputs), &previous);
        assert_eq!(s.rode_deployed, 18.0);
        assert_eq!(s.chain_slack, Some(2.0));
        assert_eq!(s.depth, Some(4.0));
        assert!(!s.is_anchored());
    }

    #[test]
    fn failed_read_reuses_previous() {
        let previous = ExternalState { rode_deployed: 7.0, ..Default::default() };
        assert_eq!(ExternalState::resolve(None, &previous), previous);
    }

    #[test]
    fn command_overrides_chain_direction() {
        let mut s = ExternalState { chain_direction: ChainDirection::Up, ..Default::default() };
        assert_eq!(s.intent(), Intent::Retrieving);
        s.command = Some("autoDrop".into());
        assert_eq!(s.intent(), Intent::Deploying);
        s.command = Some("manual".into());
        assert_eq!(s.intent(), Intent::Idle);
    }
}
