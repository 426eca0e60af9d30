use std::time::Duration;

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{BodyError, ConfigError};
use crate::types::RigidBodyState;

/// Lowest accepted sub-step rate (operations per second).
pub const MIN_OPERATIONS: u32 = 60;
/// Highest accepted sub-step rate (operations per second).
pub const MAX_OPERATIONS: u32 = 1000;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_operations() -> u32 {
    250
}
const fn default_mass() -> f32 {
    1.0
}
const fn default_inertia() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}
const fn default_orientation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

/// Quaternions with a norm at or below this are not rotations.
const ROTATION_NORM_EPSILON: f32 = 1e-6;

/// `[x, y, z, w]` to a normalized quaternion.
fn quat_from_xyzw(q: [f32; 4]) -> UnitQuaternion<f32> {
    UnitQuaternion::from_quaternion(Quaternion::new(q[3], q[0], q[1], q[2]))
}

// ---------------------------------------------------------------------------
// SolverConfig
// ---------------------------------------------------------------------------

/// Sub-step rate configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Logical sub-steps per second of host time (default: 250).
    /// Valid range is [`MIN_OPERATIONS`, `MAX_OPERATIONS`].
    #[serde(default = "default_operations")]
    pub operations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            operations: default_operations(),
        }
    }
}

impl SolverConfig {
    /// Create a config, clamping `operations` into the valid range.
    pub fn new(operations: u32) -> Self {
        Self { operations }.clamped()
    }

    /// Return a copy with `operations` clamped into the valid range, logging
    /// a warning when the value had to change.
    #[must_use]
    pub fn clamped(self) -> Self {
        let operations = self.operations.clamp(MIN_OPERATIONS, MAX_OPERATIONS);
        if operations != self.operations {
            warn!(
                requested = self.operations,
                clamped = operations,
                "sub-step rate outside [{MIN_OPERATIONS}, {MAX_OPERATIONS}], clamping"
            );
        }
        Self { operations }
    }

    /// Strict validation: reject instead of clamping.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_OPERATIONS..=MAX_OPERATIONS).contains(&self.operations) {
            return Err(ConfigError::OperationsOutOfRange {
                value: self.operations,
                min: MIN_OPERATIONS,
                max: MAX_OPERATIONS,
            });
        }
        Ok(())
    }

    /// Fixed sub-step duration, truncated to whole nanoseconds so it never
    /// exceeds `1 / operations`.
    pub fn substep_delta(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.operations.max(1)))
    }

    /// Fixed sub-step duration in seconds.
    pub fn substep_secs(&self) -> f32 {
        self.substep_delta().as_secs_f32()
    }

    /// Parse from a TOML string. Out-of-range rates are clamped.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        Ok(config.clamped())
    }

    /// Load from a TOML file. Out-of-range rates are clamped.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// BodyConfig
// ---------------------------------------------------------------------------

/// Initial rigid-body description, used to set up a host body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    #[serde(default = "default_mass")]
    pub mass: f32,
    /// Principal moments of inertia.
    #[serde(default = "default_inertia")]
    pub principal_inertia: [f32; 3],
    /// Principal inertia frame relative to the body, `[x, y, z, w]`.
    #[serde(default = "default_orientation")]
    pub inertia_rotation: [f32; 4],
    /// Center of mass in body frame.
    #[serde(default)]
    pub center_of_mass: [f32; 3],
    #[serde(default)]
    pub position: [f32; 3],
    /// `[x, y, z, w]`.
    #[serde(default = "default_orientation")]
    pub orientation: [f32; 4],
    #[serde(default)]
    pub linear_velocity: [f32; 3],
    #[serde(default)]
    pub angular_velocity: [f32; 3],
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            mass: default_mass(),
            principal_inertia: default_inertia(),
            inertia_rotation: default_orientation(),
            center_of_mass: [0.0; 3],
            position: [0.0; 3],
            orientation: default_orientation(),
            linear_velocity: [0.0; 3],
            angular_velocity: [0.0; 3],
        }
    }
}

impl BodyConfig {
    /// The body state this config describes, without validation.
    pub fn to_state(&self) -> RigidBodyState {
        let position = Vector3::from(self.position);
        let orientation = quat_from_xyzw(self.orientation);
        RigidBodyState {
            position,
            orientation,
            linear_velocity: Vector3::from(self.linear_velocity),
            angular_velocity: Vector3::from(self.angular_velocity),
            mass: self.mass,
            principal_inertia: Vector3::from(self.principal_inertia),
            inertia_rotation: quat_from_xyzw(self.inertia_rotation),
            center_of_mass: position + orientation * Vector3::from(self.center_of_mass),
        }
    }

    /// Rejects zero-norm quaternions before normalization turns them into
    /// NaN, then everything [`RigidBodyState::validate`] checks.
    pub fn validate(&self) -> Result<(), BodyError> {
        let rotations = [
            ("orientation", self.orientation),
            ("inertia_rotation", self.inertia_rotation),
        ];
        for (name, [x, y, z, w]) in rotations {
            if UnitQuaternion::try_new(Quaternion::new(w, x, y, z), ROTATION_NORM_EPSILON).is_none() {
                return Err(BodyError::DegenerateRotation(name));
            }
        }
        self.to_state().validate()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use approx::assert_relative_eq;

    use super::*;
    use crate::types::Axis;

    // ---- SolverConfig ----

    #[test]
    fn solver_config_default() {
        let cfg = SolverConfig::default();
        assert_eq!(cfg.operations, 250);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.substep_delta(), Duration::from_millis(4));
    }

    #[test]
    fn solver_config_new_clamps_low_and_high() {
        assert_eq!(SolverConfig::new(10).operations, MIN_OPERATIONS);
        assert_eq!(SolverConfig::new(50_000).operations, MAX_OPERATIONS);
        assert_eq!(SolverConfig::new(500).operations, 500);
    }

    #[test]
    fn solver_config_validate_rejects_out_of_range() {
        let cfg = SolverConfig { operations: 59 };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OperationsOutOfRange { value: 59, .. })
        ));
        assert!(SolverConfig { operations: 1001 }.validate().is_err());
        assert!(SolverConfig { operations: 60 }.validate().is_ok());
        assert!(SolverConfig { operations: 1000 }.validate().is_ok());
    }

    #[test]
    fn substep_delta_never_exceeds_rate() {
        for operations in MIN_OPERATIONS..=MAX_OPERATIONS {
            let cfg = SolverConfig { operations };
            let delta = cfg.substep_delta().as_secs_f64();
            assert!(delta <= 1.0 / f64::from(operations));
            assert!(1.0 / f64::from(operations) - delta < 1e-9);
        }
    }

    #[test]
    fn substep_secs_for_hundred_hz() {
        let cfg = SolverConfig::new(100);
        assert_relative_eq!(cfg.substep_secs(), 0.01);
    }

    #[test]
    fn solver_config_toml_defaults() {
        let cfg = SolverConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, SolverConfig::default());
    }

    #[test]
    fn solver_config_toml_clamps() {
        let cfg = SolverConfig::from_toml_str("operations = 5").unwrap();
        assert_eq!(cfg.operations, MIN_OPERATIONS);
    }

    #[test]
    fn solver_config_toml_parse_error() {
        let err = SolverConfig::from_toml_str("operations = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn solver_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "operations = 400").unwrap();
        let cfg = SolverConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.operations, 400);
    }

    #[test]
    fn solver_config_missing_file() {
        let err = SolverConfig::from_file("/nonexistent/substep.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    // ---- BodyConfig ----

    #[test]
    fn body_config_default_is_valid() {
        let cfg = BodyConfig::default();
        assert!(cfg.validate().is_ok());
        let state = cfg.to_state();
        assert_relative_eq!(state.mass, 1.0);
        assert_eq!(state.center_of_mass, Vector3::zeros());
    }

    #[test]
    fn body_config_toml_deserialization() {
        let toml_str = r"
            mass = 2.0
            principal_inertia = [0.1, 0.2, 0.3]
            center_of_mass = [0.0, 0.0, 0.5]
            position = [1.0, 0.0, 0.0]
            linear_velocity = [0.0, 3.0, 0.0]
        ";
        let cfg: BodyConfig = toml::from_str(toml_str).unwrap();
        let state = cfg.to_state();
        assert_relative_eq!(state.mass, 2.0);
        assert_relative_eq!(state.principal_inertia, Vector3::new(0.1, 0.2, 0.3));
        assert_relative_eq!(state.center_of_mass, Vector3::new(1.0, 0.0, 0.5));
        assert_relative_eq!(state.linear_velocity, Vector3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn body_config_center_of_mass_follows_orientation() {
        let half_turn_z = [0.0, 0.0, 1.0, 0.0];
        let cfg = BodyConfig {
            orientation: half_turn_z,
            center_of_mass: [1.0, 0.0, 0.0],
            ..BodyConfig::default()
        };
        assert_relative_eq!(
            cfg.to_state().center_of_mass,
            Vector3::new(-1.0, 0.0, 0.0),
            epsilon = 1e-6
        );
    }

    #[test]
    fn body_config_rejects_zero_inertia() {
        let cfg = BodyConfig {
            principal_inertia: [1.0, 0.0, 1.0],
            ..BodyConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(BodyError::NonPositiveInertia {
                axis: Axis::Y,
                value: 0.0
            })
        );
    }

    #[test]
    fn body_config_rejects_negative_mass() {
        let cfg = BodyConfig {
            mass: -1.0,
            ..BodyConfig::default()
        };
        assert_eq!(cfg.validate(), Err(BodyError::NonPositiveMass(-1.0)));
    }

    #[test]
    fn body_config_rejects_zero_quaternions() {
        let cfg = BodyConfig {
            inertia_rotation: [0.0; 4],
            ..BodyConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(BodyError::DegenerateRotation("inertia_rotation"))
        );

        let cfg = BodyConfig {
            orientation: [0.0; 4],
            ..BodyConfig::default()
        };
        assert_eq!(cfg.validate(), Err(BodyError::DegenerateRotation("orientation")));
    }

    #[test]
    fn body_config_rejects_nan_quaternion() {
        let cfg = BodyConfig {
            orientation: [f32::NAN, 0.0, 0.0, 1.0],
            ..BodyConfig::default()
        };
        assert_eq!(cfg.validate(), Err(BodyError::NonFinite("orientation")));
    }

    #[test]
    fn body_config_accepts_unnormalized_quaternion() {
        let cfg = BodyConfig {
            inertia_rotation: [0.0, 0.0, 0.0, 2.0],
            ..BodyConfig::default()
        };
        assert!(cfg.validate().is_ok());
        assert_relative_eq!(cfg.to_state().inertia_rotation.w, 1.0);
    }
}
