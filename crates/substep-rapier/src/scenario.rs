//! Headless single-body scenarios loaded from TOML.

use nalgebra::Vector3;
use rapier3d::prelude::RigidBodyHandle;
use serde::{Deserialize, Serialize};
use substep_core::config::{BodyConfig, SolverConfig};
use substep_core::error::{BodyError, ConfigError, SubstepError};
use substep_core::time::SimTime;
use substep_core::types::RigidBodyState;
use substep_solver::SubstepSolver;
use substep_solver::substep::Substep;
use tracing::info;

use crate::world::RapierWorld;

const fn default_host_dt() -> f32 {
    0.02
}
const fn default_duration() -> f32 {
    1.0
}
const fn default_gravity() -> [f32; 3] {
    [0.0, -9.81, 0.0]
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// ThrustConfig
// ---------------------------------------------------------------------------

/// Constant wrench submitted from a sub-step callback on every sub-step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThrustConfig {
    /// World-frame force.
    #[serde(default)]
    pub force: [f32; 3],
    /// World-frame torque.
    #[serde(default)]
    pub torque: [f32; 3],
    /// Point of application in body frame. The force acts through the center
    /// of mass when absent.
    #[serde(default)]
    pub point: Option<[f32; 3]>,
}

impl ThrustConfig {
    pub fn is_zero(&self) -> bool {
        self.force == [0.0; 3] && self.torque == [0.0; 3]
    }

    fn apply(&self, s: &mut Substep<'_>) {
        let force = Vector3::from(self.force);
        match self.point {
            Some(point) => {
                let body = s.body();
                let world = body.position + body.orientation * Vector3::from(point);
                s.add_force_at_position(force, world);
            }
            None => s.add_force(force),
        }
        s.add_torque(Vector3::from(self.torque));
    }
}

// ---------------------------------------------------------------------------
// ScenarioConfig
// ---------------------------------------------------------------------------

/// One rigid body in a rapier world, driven through the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Host physics step in seconds.
    #[serde(default = "default_host_dt")]
    pub host_dt: f32,
    /// Simulated time in seconds.
    #[serde(default = "default_duration")]
    pub duration: f32,
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 3],
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub body: BodyConfig,
    #[serde(default)]
    pub thrust: ThrustConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            host_dt: default_host_dt(),
            duration: default_duration(),
            gravity: default_gravity(),
            solver: SolverConfig::default(),
            body: BodyConfig::default(),
            thrust: ThrustConfig::default(),
        }
    }
}

impl ScenarioConfig {
    /// Parse from a TOML string. The sub-step rate is clamped, everything
    /// else is taken as written.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.solver = config.solver.clamped();
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse without clamping and [`validate`](Self::validate), so an
    /// out-of-range rate is reported instead of corrected.
    pub fn from_toml_str_strict(content: &str) -> Result<Self, SubstepError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file_strict(path: impl AsRef<std::path::Path>) -> Result<Self, SubstepError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_toml_str_strict(&content)
    }

    /// Check everything needed to run without touching rapier.
    pub fn validate(&self) -> Result<(), SubstepError> {
        if !(self.host_dt.is_finite() && self.host_dt > 0.0) {
            return Err(invalid("host_dt", format!("must be positive, got {}", self.host_dt)).into());
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(
                invalid("duration", format!("must be non-negative, got {}", self.duration)).into(),
            );
        }
        if self.gravity.iter().any(|g| !g.is_finite()) {
            return Err(invalid("gravity", "must be finite").into());
        }
        self.solver.validate()?;
        self.body.validate()?;
        Ok(())
    }

    /// Host steps needed to cover `duration`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn host_steps(&self) -> u64 {
        (f64::from(self.duration) / f64::from(self.host_dt)).round() as u64
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// Totals from a finished scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioSummary {
    pub host_steps: u64,
    pub substeps: u64,
    /// Host steps too short for any sub-step.
    pub idle_steps: u64,
    pub time: SimTime,
    pub final_state: RigidBodyState,
    /// Solver velocity estimate at the end of the last host step.
    pub predicted_velocity: Vector3<f32>,
}

/// A built scenario ready to step.
pub struct Scenario {
    config: ScenarioConfig,
    world: RapierWorld,
    handle: RigidBodyHandle,
    solver: SubstepSolver,
}

impl Scenario {
    pub fn new(config: ScenarioConfig) -> Result<Self, SubstepError> {
        config.validate()?;
        let mut world = RapierWorld::new(Vector3::from(config.gravity), config.host_dt);
        let handle = world.insert_body(&config.body)?;
        let mut solver = world.attach_solver(config.solver, handle)?;
        if !config.thrust.is_zero() {
            let thrust = config.thrust.clone();
            solver.subscribe(move |s: &mut Substep<'_>| thrust.apply(s));
        }
        Ok(Self {
            config,
            world,
            handle,
            solver,
        })
    }

    pub const fn world(&self) -> &RapierWorld {
        &self.world
    }

    pub const fn solver(&self) -> &SubstepSolver {
        &self.solver
    }

    pub const fn solver_mut(&mut self) -> &mut SubstepSolver {
        &mut self.solver
    }

    pub const fn handle(&self) -> RigidBodyHandle {
        self.handle
    }

    /// Run every host step of the configured duration.
    pub fn run(&mut self) -> Result<ScenarioSummary, SubstepError> {
        let host_steps = self.config.host_steps();
        let mut substeps = 0;
        let mut idle_steps = 0;
        let mut predicted_velocity = self.solver.velocity();
        for _ in 0..host_steps {
            let report = self.world.step(&mut self.solver, self.handle)?;
            predicted_velocity = report.predicted_velocity;
            substeps += u64::from(report.substeps);
            if report.is_idle() {
                idle_steps += 1;
            }
        }

        let final_state = self
            .world
            .state(self.handle)
            .ok_or(BodyError::Missing)?;
        let summary = ScenarioSummary {
            host_steps,
            substeps,
            idle_steps,
            time: self.world.time(),
            final_state,
            predicted_velocity,
        };
        info!(
            host_steps,
            substeps,
            idle_steps,
            time = %summary.time,
            "scenario finished"
        );
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
