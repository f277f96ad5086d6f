//! commands.rs — Manual test-control commands
//!
//! Commands are queued by the control surface and applied by the tick loop
//! between ticks. Rejections are structured (`CommandError`) and never stop
//! the simulation.

use anchor_types::LatLon;
use serde::Serialize;

use crate::config::{ConfigOverrides, SimConfig};
use crate::simulation::Snapshot;

/// Named alarm zones, as fractions of the alarm radius
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Warning,
    Alarm,
}

#[derive(Debug, Clone)]
pub enum SimCommand {
    /// Teleport; zeroes velocity and arms the constraint grace period
    SetPosition(LatLon),
    MoveToZone(Zone),
    /// "forward" | "backward" | "stop"
    SetMotorDirection(String),
    /// Integer percent, 1–100
    SetMotorThrottle(i64),
    Reset,
    ApplyOverrides(Box<ConfigOverrides>),
    Snapshot,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CommandReply {
    Ack { ok: bool, message: String },
    State(Box<Snapshot>),
    Config(Box<SimConfig>),
}

impl CommandReply {
    pub fn ack(message: impl Into<String>) -> Self {
        Self::Ack { ok: true, message: message.into() }
    }
}
