//! Command channel + real-time loop.

use std::sync::Arc;
use std::time::Duration;

use anchor_simulator::runner::{self, ExternalStore, Outputs};
use anchor_simulator::{CommandErrorCode, CommandReply, SimCommand, SimConfig, Simulation, Zone};
use anchor_types::{Delta, ExternalInputs, ExternalPatch};
use tokio::sync::{broadcast, RwLock};
use tokio::time::{sleep, timeout};

fn config() -> SimConfig {
    let mut cfg = SimConfig::default();
    cfg.simulation.seed = Some(9);
    cfg.wind.initial_speed_kn = 0.0;
    cfg.wind.gust_kn = 0.0;
    cfg
}

#[tokio::test]
async fn commands_are_applied_by_the_loop() {
    let sim = Simulation::new(config()).unwrap();
    let (handle, commands) = runner::command_channel(8);
    let store: ExternalStore = Arc::new(RwLock::new(ExternalInputs::default()));
    let (telem_tx, mut telem_rx) = broadcast::channel(64);

    let task = tokio::spawn(runner::run(
        sim,
        commands,
        store.clone(),
        Outputs { telemetry: telem_tx, udp: None },
        1.0,
    ));

    // rejected without disturbing the motor
    let err = handle.send(SimCommand::SetMotorThrottle(0)).await.unwrap_err();
    assert_eq!(err.code, CommandErrorCode::InvalidThrottle);
    handle.send(SimCommand::SetMotorThrottle(50)).await.unwrap();

    let err = handle.send(SimCommand::MoveToZone(Zone::Warning)).await.unwrap_err();
    assert_eq!(err.code, CommandErrorCode::NoAnchor);

    // collaborator drops the anchor 10 m north; picked up on a later tick
    let anchor = {
        let here = Simulation::new(config()).unwrap();
        here.boat().scale().displace(&here.boat().state().position, anchor_simulator::geo::Vec2::new(0.0, 10.0))
    };
    let patch: ExternalPatch = serde_json::from_value(serde_json::json!({
        "anchorPosition": { "latitude": anchor.latitude, "longitude": anchor.longitude },
        "chainSlack": 8.0,
    }))
    .unwrap();
    store.write().await.merge(patch);
    sleep(Duration::from_millis(200)).await;

    handle.send(SimCommand::MoveToZone(Zone::Warning)).await.unwrap();
    let snapshot = match handle.send(SimCommand::Snapshot).await.unwrap() {
        CommandReply::State(s) => s,
        other => panic!("unexpected reply {other:?}"),
    };
    assert!((snapshot.motor.throttle - 0.5).abs() < 1e-12);
    assert!(snapshot.external.anchor_position.is_some());
    // no rode reported: configured radius × warning fraction
    let d = snapshot.distance_to_anchor_m.unwrap();
    assert!((d - 27.0).abs() < 0.5, "distance {d}");

    // deltas are flowing
    let msg = timeout(Duration::from_secs(2), telem_rx.recv()).await.unwrap().unwrap();
    let delta: Delta = serde_json::from_str(&msg).unwrap();
    assert!(delta.get("navigation.position").is_some());

    drop(handle);
    timeout(Duration::from_secs(2), task).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn closed_loop_reports_simulation_stopped() {
    let (handle, commands) = runner::command_channel(1);
    drop(commands);
    let err = handle.send(SimCommand::Snapshot).await.unwrap_err();
    assert_eq!(err.code, CommandErrorCode::SimulationStopped);
}
