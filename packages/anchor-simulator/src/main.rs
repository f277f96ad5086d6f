//! main.rs — Anchor simulator entry point
//!
//! Runs two concurrent tasks:
//!   1. Sim loop: physics tick + wind refresh + manual commands
//!      (see `anchor_simulator::runner`)
//!   2. Control server: manual test routes, collaborator input
//!      (`PUT /external`) and live SignalK deltas over WebSocket (`/ws`)
//!
//! A fatal physics error stops the sim loop and exits non-zero.

use std::sync::Arc;

use anchor_simulator::runner::{self, ExternalStore, Outputs, SimHandle};
use anchor_simulator::udp_tx::UdpTransmitter;
use anchor_simulator::{CommandError, CommandErrorCode, ConfigOverrides, SimCommand, SimConfig, Simulation, Zone};
use anchor_types::{ExternalInputs, ExternalPatch, LatLon};
use anyhow::Context;
use axum::{
    extract::{ws::{Message, WebSocket}, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use clap::Parser;
use serde::Deserialize;
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "anchor-sim", about = "Anchored vessel physics simulator")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Control server port
    #[arg(long, default_value = "9090")]
    ctrl_port: u16,
    /// SignalK UDP data connection, e.g. 127.0.0.1:8375
    #[arg(long)]
    signalk_udp: Option<String>,
    /// Simulation speed multiplier (1.0 = real-time)
    #[arg(long, default_value = "1.0")]
    speed: f64,
    /// Fixed wind RNG seed (overrides config)
    #[arg(long)]
    seed: Option<u64>,
}

// ── Shared state ──────────────────────────────────────────────────────────────

#[derive(Clone)]
struct AppState {
    sim: SimHandle,
    external: ExternalStore,
    telemetry: Arc<broadcast::Sender<String>>,
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anchor_simulator=info,anchor_sim=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut cfg = SimConfig::load(&args.config).with_context(|| format!("loading {}", args.config))?;
    if args.seed.is_some() {
        cfg.simulation.seed = args.seed;
    }
    let speed = args.speed.clamp(0.1, 20.0);

    info!(
        "🛥  Anchor simulator starting — {:.0} kg boat, {:.0} kn wind from {:.0}°, depth {:.1} m",
        cfg.boat.mass_kg, cfg.wind.initial_speed_kn, cfg.wind.initial_direction_deg, cfg.environment.depth_m
    );

    let sim = Simulation::new(cfg)?;

    let udp = match &args.signalk_udp {
        Some(addr) => {
            let tx = UdpTransmitter::new(addr).context("binding UDP socket")?;
            info!("📡 Publishing deltas to SignalK UDP {}", tx.target());
            Some(tx)
        }
        None => None,
    };

    let (telem_tx, _) = broadcast::channel::<String>(64);
    let telemetry = Arc::new(telem_tx);
    let external: ExternalStore = Arc::new(RwLock::new(ExternalInputs::default()));
    let (handle, commands) = runner::command_channel(32);

    let sim_task = tokio::spawn(runner::run(
        sim,
        commands,
        external.clone(),
        Outputs { telemetry: (*telemetry).clone(), udp },
        speed,
    ));

    let ctrl_addr = format!("0.0.0.0:{}", args.ctrl_port);
    info!("🖥  Control server at http://{ctrl_addr} (ws://{ctrl_addr}/ws)");

    let app = router(AppState { sim: handle, external, telemetry });
    let listener = tokio::net::TcpListener::bind(&ctrl_addr)
        .await
        .with_context(|| format!("binding {ctrl_addr}"))?;

    tokio::select! {
        joined = sim_task => {
            joined.context("sim loop panicked")??;
            info!("Sim loop finished");
        }
        served = async { axum::serve(listener, app).await } => {
            served.context("control server failed")?;
        }
    }
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/simulation/state", get(get_state))
        .route("/simulation/config", put(put_config))
        .route("/simulation/reset", put(put_reset))
        .route("/simulation/position", put(put_position))
        .route("/movetowarning", put(move_to_warning))
        .route("/movetoalarm", put(move_to_alarm))
        .route("/motorforward", put(motor_forward))
        .route("/motorbackward", put(motor_backward))
        .route("/motorstop", put(motor_stop))
        .route("/motor", put(put_motor))
        .route("/motorthrottle", put(put_throttle))
        .route("/external", put(put_external).get(get_external))
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "anchor-sim ok" }))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

// ── Command routes ────────────────────────────────────────────────────────────

fn rejected(err: CommandError) -> Response {
    let status = match err.code {
        CommandErrorCode::SimulationStopped => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(err)).into_response()
}

async fn dispatch(state: &AppState, command: SimCommand) -> Response {
    match state.sim.send(command).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => rejected(e),
    }
}

async fn get_state(State(s): State<AppState>) -> Response {
    dispatch(&s, SimCommand::Snapshot).await
}

async fn put_config(State(s): State<AppState>, Json(body): Json<serde_json::Value>) -> Response {
    match serde_json::from_value::<ConfigOverrides>(body) {
        Ok(o) => dispatch(&s, SimCommand::ApplyOverrides(Box::new(o))).await,
        Err(e) => rejected(CommandError::new(CommandErrorCode::InvalidConfig, e.to_string())),
    }
}

async fn put_reset(State(s): State<AppState>) -> Response {
    dispatch(&s, SimCommand::Reset).await
}

async fn put_position(State(s): State<AppState>, Json(body): Json<serde_json::Value>) -> Response {
    match serde_json::from_value::<LatLon>(body) {
        Ok(p) => dispatch(&s, SimCommand::SetPosition(p)).await,
        Err(e) => rejected(CommandError::new(CommandErrorCode::InvalidPosition, e.to_string())),
    }
}

async fn move_to_warning(State(s): State<AppState>) -> Response {
    dispatch(&s, SimCommand::MoveToZone(Zone::Warning)).await
}

async fn move_to_alarm(State(s): State<AppState>) -> Response {
    dispatch(&s, SimCommand::MoveToZone(Zone::Alarm)).await
}

async fn motor_forward(State(s): State<AppState>) -> Response {
    dispatch(&s, SimCommand::SetMotorDirection("forward".into())).await
}

async fn motor_backward(State(s): State<AppState>) -> Response {
    dispatch(&s, SimCommand::SetMotorDirection("backward".into())).await
}

async fn motor_stop(State(s): State<AppState>) -> Response {
    dispatch(&s, SimCommand::SetMotorDirection("stop".into())).await
}

#[derive(Deserialize)]
struct DirectionBody {
    direction: String,
}

async fn put_motor(State(s): State<AppState>, Json(body): Json<serde_json::Value>) -> Response {
    match serde_json::from_value::<DirectionBody>(body) {
        Ok(b) => dispatch(&s, SimCommand::SetMotorDirection(b.direction)).await,
        Err(e) => rejected(CommandError::new(CommandErrorCode::InvalidDirection, e.to_string())),
    }
}

async fn put_throttle(State(s): State<AppState>, Json(body): Json<serde_json::Value>) -> Response {
    // Fractional or non-numeric values are rejected here; range in the sim
    match body.get("throttle").and_then(|v| v.as_i64()) {
        Some(t) => dispatch(&s, SimCommand::SetMotorThrottle(t)).await,
        None => rejected(CommandError::new(
            CommandErrorCode::InvalidThrottle,
            format!("throttle must be an integer 1-100, got {}", body.get("throttle").unwrap_or(&serde_json::Value::Null)),
        )),
    }
}

// ── Collaborator input ────────────────────────────────────────────────────────

async fn put_external(State(s): State<AppState>, Json(patch): Json<ExternalPatch>) -> Json<ExternalInputs> {
    let mut inputs = s.external.write().await;
    inputs.merge(patch);
    Json(inputs.clone())
}

async fn get_external(State(s): State<AppState>) -> Json<ExternalInputs> {
    Json(s.external.read().await.clone())
}

// ── WebSocket telemetry ───────────────────────────────────────────────────────

async fn ws_handler(ws: WebSocketUpgrade, State(s): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_ws(socket, s.telemetry))
}

async fn handle_ws(mut socket: WebSocket, telemetry: Arc<broadcast::Sender<String>>) {
    let mut rx = telemetry.subscribe();
    info!("🔌 Telemetry subscriber connected");

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Ok(delta) => {
                    if socket.send(Message::Text(delta)).await.is_err() { break; }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => warn!("WS subscriber lagged, dropped {n} deltas"),
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
    info!("🔌 Telemetry subscriber disconnected");
}
