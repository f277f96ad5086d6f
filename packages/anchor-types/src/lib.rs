//! # anchor-types
//!
//! Shared wire structures between the anchor simulator and the host
//! messaging layer (SignalK server + anchor alarm connector).
//!
//! These types are used by:
//! - `anchor-simulator`: ingesting collaborator measurements each tick and
//!   publishing position / heading / wind / motor state back out
//! - the control surface: JSON bodies for `PUT /external`
//!
//! ## Conventions
//!
//! - Positions are WGS84 degrees (`latitude`, `longitude`)
//! - Angles on the wire are radians, speeds are m/s (SignalK units)
//! - Every collaborator field is optional; absence means "not received"

use serde::{Deserialize, Deserializer, Serialize};

// ── Geographic ────────────────────────────────────────────────────────────────

/// WGS84 position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Latitude within ±90 and longitude within ±180
    pub fn is_valid(&self) -> bool {
        self.is_finite() && self.latitude.abs() <= 90.0 && self.longitude.abs() <= 180.0
    }
}

// ── Chain / windlass ──────────────────────────────────────────────────────────

/// Direction the windlass is moving chain, as reported by the chain counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainDirection {
    /// Chain paying out (deployment)
    Down,
    /// Chain coming in (retrieval)
    Up,
    /// Stopped, unset, or anything unrecognised
    #[default]
    Idle,
}

impl ChainDirection {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "down" => Self::Down,
            "up" => Self::Up,
            _ => Self::Idle,
        }
    }
}

impl<'de> Deserialize<'de> for ChainDirection {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(Self::parse(&raw))
    }
}

/// Anchor automation command issued by the connector (`navigation.anchor.command`).
/// Free-form on the wire; only the two automation tokens carry meaning here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorCommand {
    AutoDrop,
    AutoRetrieve,
    Other(String),
}

impl AnchorCommand {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "autoDrop" => Self::AutoDrop,
            "autoRetrieve" => Self::AutoRetrieve,
            other => Self::Other(other.to_string()),
        }
    }
}

// ── Motor ─────────────────────────────────────────────────────────────────────

/// Simulated motor gear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorDirection {
    Forward,
    Backward,
    #[default]
    Stop,
}

impl MotorDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Stop => "stop",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "forward" => Some(Self::Forward),
            "backward" | "reverse" => Some(Self::Backward),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

// ── Collaborator inputs ───────────────────────────────────────────────────────

/// Latest values received from the host for the measurements the simulation
/// consumes. `None` = never received (or explicitly cleared, for the anchor).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalInputs {
    /// Rode let out, meters
    pub rode_deployed: Option<f64>,
    /// Anchor drop position; `None` = not anchored
    pub anchor_position: Option<LatLon>,
    /// Rode deployed minus straight-line distance to anchor (signed, meters)
    pub chain_slack: Option<f64>,
    pub chain_direction: Option<ChainDirection>,
    /// Free-form command token such as "autoDrop" / "autoRetrieve"
    pub command: Option<String>,
    /// Depth override, meters
    pub depth: Option<f64>,
}

/// Partial update for [`ExternalInputs`]. Omitted fields are left alone;
/// `anchorPosition: null` explicitly clears the anchor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalPatch {
    pub rode_deployed: Option<f64>,
    #[serde(default, deserialize_with = "present")]
    pub anchor_position: Option<Option<LatLon>>,
    pub chain_slack: Option<f64>,
    pub chain_direction: Option<ChainDirection>,
    #[serde(default, deserialize_with = "present")]
    pub command: Option<Option<String>>,
    pub depth: Option<f64>,
}

/// Distinguishes a field that is present-but-null from an absent one.
fn present<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

impl ExternalInputs {
    pub fn merge(&mut self, patch: ExternalPatch) {
        if let Some(v) = patch.rode_deployed { self.rode_deployed = Some(v); }
        if let Some(v) = patch.anchor_position { self.anchor_position = v; }
        if let Some(v) = patch.chain_slack { self.chain_slack = Some(v); }
        if let Some(v) = patch.chain_direction { self.chain_direction = Some(v); }
        if let Some(v) = patch.command { self.command = v; }
        if let Some(v) = patch.depth { self.depth = Some(v); }
    }
}

// ── Outbound delta (SignalK shape) ────────────────────────────────────────────

/// One `path`/`value` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathValue {
    pub path: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub source: Source,
    /// ISO-8601 UTC
    pub timestamp: String,
    pub values: Vec<PathValue>,
}

/// A SignalK delta message carrying a single update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub context: String,
    pub updates: Vec<Update>,
}

impl Delta {
    pub fn new(source_label: &str, timestamp: String) -> Self {
        Self {
            context: "vessels.self".to_string(),
            updates: vec![Update {
                source: Source { label: source_label.to_string() },
                timestamp,
                values: Vec::new(),
            }],
        }
    }

    /// Append a value. Values that fail to serialize become `null`.
    pub fn push(&mut self, path: &str, value: impl Serialize) {
        let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        if let Some(update) = self.updates.last_mut() {
            update.values.push(PathValue { path: path.to_string(), value });
        }
    }

    pub fn get(&self, path: &str) -> Option<&serde_json::Value> {
        self.updates
            .iter()
            .flat_map(|u| u.values.iter())
            .find(|pv| pv.path == path)
            .map(|pv| &pv.value)
    }
}
