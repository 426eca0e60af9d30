use thiserror::Error;

use crate::types::Axis;

/// Top-level error type for the substep solver.
#[derive(Debug, Error)]
pub enum SubstepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rigid body error: {0}")]
    Body(#[from] BodyError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("operations {value} outside valid range [{min}, {max}]")]
    OperationsOutOfRange { value: u32, min: u32, max: u32 },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Host rigid-body properties that would make prediction produce non-numeric
/// results.
///
/// Copy + static messages for cheap propagation on every host step.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BodyError {
    #[error("mass must be strictly positive, got {0}")]
    NonPositiveMass(f32),

    #[error("principal inertia {axis} must be strictly positive, got {value}")]
    NonPositiveInertia { axis: Axis, value: f32 },

    #[error("{0} is not finite")]
    NonFinite(&'static str),

    #[error("{0} has near-zero norm and is not a rotation")]
    DegenerateRotation(&'static str),

    #[error("host body not found")]
    Missing,
}
