//! Error and diagnostic types for the simulation engine.
//!
//! [`SimError`] covers failures that reject an operation outright (bad
//! construction parameters, stale handles). [`Diagnostic`] covers conditions
//! the engine recovers from on its own; they are reported through
//! [`StepReport`](crate::world::StepReport) and never stop a step.

use thiserror::Error;

use crate::core::types::{ParticleId, SpringId};
use crate::utils::allocator::ForceId;

/// Errors returned by fallible engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f32,
        reason: &'static str,
    },
    #[error("particle index {index} out of bounds (count: {count})")]
    ParticleOutOfBounds { index: usize, count: usize },
    #[error("spring endpoints must be distinct (both are {0})")]
    SelfLoop(ParticleId),
    #[error("unknown force handle {0}")]
    UnknownForce(ForceId),
}

impl SimError {
    pub(crate) fn invalid(name: &'static str, value: f32, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}

/// Convenient Result alias for engine operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Non-fatal conditions observed while stepping.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    /// A spring collapsed to zero length; its force was skipped for the step.
    #[error("spring {spring} has zero length, force skipped")]
    DegenerateGeometry { spring: SpringId },
    /// The adaptive stepper hit its refinement limit without meeting the tolerance.
    #[error("adaptive step {step} s left error {error} above tolerance {tolerance}")]
    StabilityWarning {
        step: f32,
        error: f32,
        tolerance: f32,
    },
}

impl Diagnostic {
    pub fn is_stability_warning(&self) -> bool {
        matches!(self, Self::StabilityWarning { .. })
    }
}
