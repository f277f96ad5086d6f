//! # anchor-simulator
//!
//! Physics simulation of a free-swinging anchored vessel under wind, water
//! drag, chain and motor forces, for exercising anchor automation without a
//! boat.
//!
//! - `Simulation` owns all mutable state and exposes `step` / `advance`
//! - `runner` drives it in real time and publishes SignalK deltas
//! - force models in `forces`, slack-driven motor assist in `auto_motor`

pub mod auto_motor;
pub mod boat;
pub mod commands;
pub mod config;
pub mod environment;
pub mod error;
pub mod external;
pub mod forces;
pub mod geo;
pub mod integrator;
pub mod runner;
pub mod simulation;
pub mod telemetry;
pub mod udp_tx;

pub use boat::{Boat, BoatState};
pub use commands::{CommandReply, SimCommand, Zone};
pub use config::{ConfigOverrides, SimConfig};
pub use environment::{Environment, EnvironmentState, TideState};
pub use error::{CommandError, CommandErrorCode, ConfigError, SimError};
pub use external::{ExternalState, Intent};
pub use forces::ForceSample;
pub use simulation::{BoatView, Simulation, Snapshot};
