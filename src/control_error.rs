//! Error handling for the controller, its configuration and per-tick faults

use std::io;
use thiserror::Error;

/// Unified error of the controller. Configuration errors are fatal and surface before the
/// first tick. `InfeasibleSolve` and `NumericDegeneracy` are per-tick faults: the controller
/// recovers from them by commanding zero velocity and reports them in the tick report.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Velocity damper influence margin must be strictly larger than the safety margin.
    #[error("Invalid damper margins: influence {influence} must exceed safety {safety}")]
    InvalidDamperMargins { safety: f64, influence: f64 },

    #[error("Dimension mismatch in {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Configuration Error: {0}")]
    Configuration(String),

    /// The solver returned no solution for this tick, robot is held.
    #[error("QP infeasible or not solved at tick {tick}")]
    InfeasibleSolve { tick: usize },

    #[error("Numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    #[error("IO Error: {0}")]
    IoError(#[from] io::Error),

    #[error("Parse Error: {0}")]
    ParseError(String),

    #[error("Missing Field: {0}")]
    MissingField(String),

    #[error("Wrong angle representation: {0}")]
    WrongAngle(String),
}

impl ControlError {
    /// True for errors the control loop recovers from locally (skips the command and continues).
    pub fn is_per_tick(&self) -> bool {
        matches!(self, ControlError::InfeasibleSolve { .. } | ControlError::NumericDegeneracy(_))
    }
}

pub type ControlResult<T> = Result<T, ControlError>;
