//! Core simulation entities: particles, springs and their identifiers.

pub mod particle;
pub mod spring;
pub mod types;

pub use particle::{Particle, ParticleState};
pub use spring::{Spring, SpringEvaluation, SpringJacobian};
pub use types::{ParticleId, SpringId};
