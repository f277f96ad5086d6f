//! runner.rs — Real-time tick loop
//!
//! Runs three event sources on one task, so the `Simulation` has a single
//! owner and needs no lock:
//!   1. Physics timer (dt): snapshot external inputs, step, publish
//!   2. Wind timer (≈1 Hz): refresh wind
//!   3. Command channel: manual commands, applied between ticks
//!
//! Collaborator inputs live in `ExternalStore`; the loop only ever
//! `try_read`s it and falls back to the previous snapshot when busy.

use std::sync::Arc;
use std::time::Duration;

use anchor_types::ExternalInputs;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::commands::{CommandReply, SimCommand};
use crate::error::{CommandError, CommandErrorCode, SimError};
use crate::simulation::Simulation;
use crate::telemetry;
use crate::udp_tx::UdpTransmitter;

pub type ExternalStore = Arc<RwLock<ExternalInputs>>;
pub type CommandResult = Result<CommandReply, CommandError>;

pub struct CommandRequest {
    pub command: SimCommand,
    pub reply: oneshot::Sender<CommandResult>,
}

/// Cloneable front door to a running loop
#[derive(Clone)]
pub struct SimHandle {
    tx: mpsc::Sender<CommandRequest>,
}

fn stopped() -> CommandError {
    CommandError::new(CommandErrorCode::SimulationStopped, "simulation loop is not running")
}

impl SimHandle {
    pub async fn send(&self, command: SimCommand) -> CommandResult {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(CommandRequest { command, reply }).await.is_err() {
            return Err(stopped());
        }
        rx.await.unwrap_or_else(|_| Err(stopped()))
    }
}

pub fn command_channel(capacity: usize) -> (SimHandle, mpsc::Receiver<CommandRequest>) {
    let (tx, rx) = mpsc::channel(capacity);
    (SimHandle { tx }, rx)
}

/// Where each tick's delta goes
pub struct Outputs {
    /// JSON deltas for WebSocket subscribers
    pub telemetry: broadcast::Sender<String>,
    pub udp: Option<UdpTransmitter>,
}

fn ticker(period_s: f64) -> Interval {
    let mut t = interval(Duration::from_secs_f64(period_s));
    t.set_missed_tick_behavior(MissedTickBehavior::Delay);
    t
}

fn publish(sim: &Simulation, outputs: &Outputs) {
    let delta = telemetry::build_delta(sim);
    let json = match serde_json::to_string(&delta) {
        Ok(j) => j,
        Err(e) => { warn!("Delta serialize failed: {e}"); return; }
    };
    if let Some(udp) = &outputs.udp {
        udp.send_raw(json.as_bytes());
    }
    // No subscribers is fine
    let _ = outputs.telemetry.send(json);
}

/// Run until the command channel closes (Ok) or the physics fails (Err).
/// `speed` scales simulated time against wall time.
pub async fn run(
    mut sim: Simulation,
    mut commands: mpsc::Receiver<CommandRequest>,
    store: ExternalStore,
    outputs: Outputs,
    speed: f64,
) -> Result<(), SimError> {
    let mut dt_s = sim.config().simulation.dt_s;
    let wind_period_s = 1.0 / sim.config().simulation.wind_update_hz;
    let mut physics = ticker(dt_s);
    let mut wind = ticker(wind_period_s);

    info!("⚓ Sim loop running at {:.0} Hz (wind every {wind_period_s:.1}s, {speed}× real time)", 1.0 / dt_s);

    loop {
        tokio::select! {
            _ = physics.tick() => {
                let inputs = match store.try_read() {
                    Ok(guard) => Some(guard.clone()),
                    Err(_) => {
                        warn!("External inputs busy, reusing previous snapshot");
                        None
                    }
                };

                if let Err(e) = sim.step(dt_s * speed, inputs.as_ref()) {
                    error!("🛑 Sim loop stopped at iteration {}", sim.iteration());
                    return Err(e);
                }
                publish(&sim, &outputs);

                if sim.iteration() % 20 == 0 {
                    let b = sim.boat().state();
                    info!(
                        "⏱ iter={} | hdg={:.0}° | sog={:.2} m/s | anchor={} | motor={} {:.0}%",
                        sim.iteration(),
                        b.heading_deg,
                        b.speed(),
                        sim.boat().distance_to_anchor().map(|d| format!("{d:.1}m")).unwrap_or_else(|| "-".into()),
                        sim.motor().direction.as_str(),
                        sim.motor().throttle * 100.0,
                    );
                }
            }
            _ = wind.tick() => {
                sim.update_wind(wind_period_s * speed);
            }
            request = commands.recv() => {
                let Some(CommandRequest { command, reply }) = request else {
                    info!("Command channel closed, sim loop exiting");
                    return Ok(());
                };
                let result = sim.apply_command(command);
                if let Err(e) = &result {
                    warn!("Command rejected: {e}");
                }
                let _ = reply.send(result);

                // dt is runtime-tunable
                let new_dt = sim.config().simulation.dt_s;
                if new_dt != dt_s {
                    info!("Physics tick now {new_dt}s");
                    dt_s = new_dt;
                    physics = ticker(dt_s);
                }
            }
        }
    }
}
