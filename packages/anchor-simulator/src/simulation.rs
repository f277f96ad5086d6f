//! simulation.rs — Orchestrator: owns every piece of mutable state
//!
//! One `Simulation` per run. The production loop calls `step` on the physics
//! timer and `update_wind` on the wind timer; tests drive `advance`, which
//! does both on the simulated clock.
//!
//! Manual commands go through `apply_command`, which the tick loop only calls
//! between ticks.

use anchor_types::{ExternalInputs, LatLon, MotorDirection};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auto_motor::AutoMotor;
use crate::boat::{Boat, BoatState};
use crate::commands::{CommandReply, SimCommand, Zone};
use crate::config::{ConfigOverrides, SimConfig};
use crate::environment::{Environment, EnvironmentState};
use crate::error::{CommandError, CommandErrorCode, SimError};
use crate::external::{ExternalState, Intent};
use crate::forces::motor::MotorState;
use crate::forces::{wind, ForceSample};
use crate::geo::Vec2;
use crate::integrator::{Integrator, StepInput};

/// Boat as reported by `GET /simulation/state`: flat lat/lon, degrees and
/// m/s, with the anchor split out
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoatView {
    pub latitude: f64,
    pub longitude: f64,
    pub heading: f64,
    pub speed: f64,
    pub vx: f64,
    pub vy: f64,
    pub angular_velocity: f64,
    pub mass_kg: f64,
    pub is_anchored: bool,
    pub anchor_latitude: Option<f64>,
    pub anchor_longitude: Option<f64>,
}

impl From<&BoatState> for BoatView {
    fn from(b: &BoatState) -> Self {
        Self {
            latitude: b.position.latitude,
            longitude: b.position.longitude,
            heading: b.heading_deg,
            speed: b.speed(),
            vx: b.vx,
            vy: b.vy,
            angular_velocity: b.angular_velocity_dps,
            mass_kg: b.mass_kg,
            is_anchored: b.is_anchored(),
            anchor_latitude: b.anchor.map(|a| a.latitude),
            anchor_longitude: b.anchor.map(|a| a.longitude),
        }
    }
}

/// Full diagnostic view (`GET /simulation/state`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub run_id: Uuid,
    pub iteration: u64,
    pub elapsed_s: f64,
    pub timestamp: DateTime<Utc>,
    pub boat: BoatView,
    pub environment: EnvironmentState,
    pub forces: ForceSample,
    pub motor: MotorState,
    pub intent: Intent,
    pub external: ExternalState,
    pub distance_to_anchor_m: Option<f64>,
    pub bearing_to_anchor_deg: Option<f64>,
    pub alarm_radius_m: f64,
    pub grace_remaining_s: f64,
    pub config: SimConfig,
}

pub struct Simulation {
    config: SimConfig,
    boat: Boat,
    environment: Environment,
    motor: MotorState,
    controller: AutoMotor,
    integrator: Integrator,
    external: ExternalState,

    started_at: DateTime<Utc>,
    elapsed_s: f64,
    iteration: u64,
    /// Constraints stay off while > 0 (after a manual reposition)
    grace_remaining_s: f64,
    wind_accum_s: f64,
    run_id: Uuid,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        Self::starting_at(config, Utc::now())
    }

    /// Fix the simulated clock's origin (tide tests)
    pub fn starting_at(config: SimConfig, start: DateTime<Utc>) -> Result<Self, SimError> {
        config.validate()?;
        let run_id = Uuid::new_v4();
        let p = config.simulation.initial_position;
        info!("⚓ Simulation run {run_id} starting at ({:.6}, {:.6})", p.latitude, p.longitude);
        Ok(Self {
            boat: Boat::new(&config),
            environment: Environment::new(&config, start),
            motor: MotorState::default(),
            controller: AutoMotor::new(),
            integrator: Integrator::new(),
            external: ExternalState::default(),
            started_at: start,
            elapsed_s: 0.0,
            iteration: 0,
            grace_remaining_s: 0.0,
            wind_accum_s: 0.0,
            run_id,
            config,
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig { &self.config }
    pub fn boat(&self) -> &Boat { &self.boat }
    pub fn boat_mut(&mut self) -> &mut Boat { &mut self.boat }
    pub fn environment(&self) -> &Environment { &self.environment }
    pub fn environment_mut(&mut self) -> &mut Environment { &mut self.environment }
    pub fn motor(&self) -> &MotorState { &self.motor }
    pub fn external(&self) -> &ExternalState { &self.external }
    pub fn last_sample(&self) -> &ForceSample { self.integrator.last_sample() }
    pub fn intent(&self) -> Intent { self.controller.intent() }
    pub fn iteration(&self) -> u64 { self.iteration }
    pub fn elapsed_s(&self) -> f64 { self.elapsed_s }
    pub fn run_id(&self) -> Uuid { self.run_id }
    pub fn grace_remaining_s(&self) -> f64 { self.grace_remaining_s }

    /// Simulated wall clock
    pub fn now(&self) -> DateTime<Utc> {
        self.started_at + Duration::milliseconds((self.elapsed_s * 1000.0) as i64)
    }

    /// Rode deployed when any is out, else the configured radius
    pub fn alarm_radius_m(&self) -> f64 {
        if self.external.rode_deployed > 0.0 {
            self.external.rode_deployed
        } else {
            self.config.alarm.radius_m
        }
    }

    // ── Ticking ───────────────────────────────────────────────────────────────

    /// One physics tick. `inputs` is this tick's read of the collaborator
    /// store, or None when the read failed.
    pub fn step(&mut self, dt: f64, inputs: Option<&ExternalInputs>) -> Result<ForceSample, SimError> {
        self.external = ExternalState::resolve(inputs, &self.external);
        self.boat.set_anchor(self.external.anchor_position);
        let now = self.now();
        self.environment.update_depth(now, self.external.depth);

        if self.motor.tick_manual(dt) {
            info!("🕹  Manual motor control expired, auto control resumes");
        }
        self.controller.hold_gear(&mut self.motor, &self.external, &self.config.auto_motor);

        let input = StepInput {
            environment: self.environment.state(),
            external: &self.external,
            motor: &self.motor,
            intent: self.external.intent(),
            constraints_suppressed: self.grace_remaining_s > 0.0,
        };
        let sample = self.integrator.step(&mut self.boat, &input, &self.config, dt)?;

        self.controller.update(&mut self.motor, &self.external, self.boat.speed(), &self.config.auto_motor, dt);

        self.grace_remaining_s = (self.grace_remaining_s - dt).max(0.0);
        self.elapsed_s += dt;
        self.iteration += 1;
        Ok(sample)
    }

    /// One wind refresh covering `interval_s` of simulated time
    pub fn update_wind(&mut self, interval_s: f64) {
        self.environment.update_wind(interval_s);
        let s = self.environment.state();
        debug!("🌬  Wind {:.1} kn from {:.0}°", s.wind_speed_kn, s.wind_direction_deg);
    }

    /// Physics tick at the configured dt, plus any wind refreshes that fall
    /// due on the simulated clock. The synchronous harness entry point.
    pub fn advance(&mut self, inputs: Option<&ExternalInputs>) -> Result<ForceSample, SimError> {
        let dt = self.config.simulation.dt_s;
        let sample = self.step(dt, inputs)?;
        let period = 1.0 / self.config.simulation.wind_update_hz;
        self.wind_accum_s += dt;
        while self.wind_accum_s >= period {
            self.wind_accum_s -= period;
            self.update_wind(period);
        }
        Ok(sample)
    }

    // ── Manual control ────────────────────────────────────────────────────────

    pub fn apply_command(&mut self, cmd: SimCommand) -> Result<CommandReply, CommandError> {
        match cmd {
            SimCommand::SetPosition(position) => {
                if !position.is_valid() {
                    return Err(CommandError::new(
                        CommandErrorCode::InvalidPosition,
                        format!("({}, {}) is not a valid position", position.latitude, position.longitude),
                    ));
                }
                self.reposition(position);
                Ok(CommandReply::ack("position set"))
            }
            SimCommand::MoveToZone(zone) => self.move_to_zone(zone),
            SimCommand::SetMotorDirection(raw) => {
                let direction = MotorDirection::parse(&raw).ok_or_else(|| {
                    CommandError::new(CommandErrorCode::InvalidDirection, format!("unknown motor direction '{raw}'"))
                })?;
                if direction == MotorDirection::Stop {
                    self.motor.stop();
                } else {
                    self.motor.set_direction(direction);
                }
                self.motor.arm_manual(self.config.motor.manual_timeout_s);
                info!("🕹  Motor {} (manual)", direction.as_str());
                Ok(CommandReply::ack(format!("motor {}", direction.as_str())))
            }
            SimCommand::SetMotorThrottle(percent) => {
                if !(1..=100).contains(&percent) {
                    return Err(CommandError::new(
                        CommandErrorCode::InvalidThrottle,
                        format!("throttle must be 1-100, got {percent}"),
                    ));
                }
                self.motor.set_throttle(percent as f64 / 100.0);
                self.motor.arm_manual(self.config.motor.manual_timeout_s);
                info!("🕹  Motor throttle {percent}% (manual)");
                Ok(CommandReply::ack(format!("throttle {percent}%")))
            }
            SimCommand::Reset => {
                self.reset();
                Ok(CommandReply::ack("simulation reset"))
            }
            SimCommand::ApplyOverrides(overrides) => {
                self.apply_overrides(&overrides)?;
                Ok(CommandReply::Config(Box::new(self.config.clone())))
            }
            SimCommand::Snapshot => Ok(CommandReply::State(Box::new(self.snapshot()))),
        }
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<(), CommandError> {
        self.config.apply_overrides(overrides)?;
        self.boat.apply_config(&self.config);
        self.environment.apply_config(&self.config, self.started_at);
        info!("⚙  Config overrides applied");
        Ok(())
    }

    fn reposition(&mut self, position: LatLon) {
        self.boat.set_position(position);
        self.grace_remaining_s = self.config.simulation.grace_period_s;
        info!(
            "📍 Boat moved to ({:.6}, {:.6}), constraints off for {:.1}s",
            position.latitude, position.longitude, self.grace_remaining_s
        );
    }

    /// Place the boat at the zone's distance from the anchor, keeping the
    /// current anchor→boat bearing (downwind when sitting on the anchor).
    fn move_to_zone(&mut self, zone: Zone) -> Result<CommandReply, CommandError> {
        let anchor = self
            .external
            .anchor_position
            .ok_or_else(|| CommandError::new(CommandErrorCode::NoAnchor, "no anchor position set"))?;

        let fraction = match zone {
            Zone::Warning => self.config.alarm.warning_fraction,
            Zone::Alarm => self.config.alarm.alarm_fraction,
        };
        let distance = self.alarm_radius_m() * fraction;

        let scale = self.boat.scale();
        let offset = scale.offset(&anchor, &self.boat.state().position);
        let bearing = if offset.length() > 0.01 {
            offset.bearing()
        } else {
            wind::push_direction(self.environment.state().wind_direction_deg)
        };

        let target = scale.displace(&anchor, Vec2::from_bearing(bearing).scale(distance));
        self.reposition(target);
        Ok(CommandReply::ack(format!("moved to {zone:?} zone, {distance:.1} m at {bearing:.0}°")))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            run_id: self.run_id,
            iteration: self.iteration,
            elapsed_s: self.elapsed_s,
            timestamp: self.now(),
            boat: BoatView::from(self.boat.state()),
            environment: self.environment.state().clone(),
            forces: *self.integrator.last_sample(),
            motor: self.motor.clone(),
            intent: self.controller.intent(),
            external: self.external.clone(),
            distance_to_anchor_m: self.boat.distance_to_anchor(),
            bearing_to_anchor_deg: self.boat.bearing_to_anchor(),
            alarm_radius_m: self.alarm_radius_m(),
            grace_remaining_s: self.grace_remaining_s,
            config: self.config.clone(),
        }
    }

    /// Back to initial conditions under the current config, as a new run
    pub fn reset(&mut self) {
        let start = Utc::now();
        self.boat.reset();
        self.environment.reset(&self.config, start);
        self.motor = MotorState::default();
        self.controller.reset();
        self.integrator.reset();
        self.external = ExternalState::default();
        self.started_at = start;
        self.elapsed_s = 0.0;
        self.iteration = 0;
        self.grace_remaining_s = 0.0;
        self.wind_accum_s = 0.0;
        self.run_id = Uuid::new_v4();
        info!("↺ Simulation reset, run {}", self.run_id);
    }
}
