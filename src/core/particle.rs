use glam::Vec3;

use crate::error::{Result, SimError};

/// Point mass with a force accumulator.
///
/// The accumulator is cleared at the start of every derivative evaluation and
/// only grows through [`Particle::accumulate_force`] while forces are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub force: Vec3,
    /// Position restored by [`Particle::reset_to_start`].
    pub start_position: Vec3,
    /// Fixed particles are never moved by an integrator.
    pub fixed: bool,
    mass: f32,
    inverse_mass: f32,
}

impl Particle {
    /// Creates a free particle at rest. Fails on a non-positive or non-finite mass.
    pub fn new(position: Vec3, mass: f32) -> Result<Self> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(SimError::invalid("mass", mass, "must be positive and finite"));
        }
        Ok(Self {
            position,
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            start_position: position,
            fixed: false,
            mass,
            inverse_mass: 1.0 / mass,
        })
    }

    /// Creates a pinned particle.
    pub fn fixed(position: Vec3, mass: f32) -> Result<Self> {
        let mut particle = Self::new(position, mass)?;
        particle.fixed = true;
        Ok(particle)
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Zero for fixed particles.
    pub fn inverse_mass(&self) -> f32 {
        if self.fixed {
            0.0
        } else {
            self.inverse_mass
        }
    }

    pub fn accumulate_force(&mut self, force: Vec3) {
        self.force += force;
    }

    pub fn clear_force(&mut self) {
        self.force = Vec3::ZERO;
    }

    /// `force / mass` for free particles, zero for fixed ones.
    pub fn acceleration(&self) -> Vec3 {
        self.force * self.inverse_mass()
    }

    pub fn reset_to_start(&mut self) {
        self.position = self.start_position;
        self.velocity = Vec3::ZERO;
        self.force = Vec3::ZERO;
    }

    pub fn pin(&mut self) {
        self.fixed = true;
        self.velocity = Vec3::ZERO;
    }

    pub fn unpin(&mut self) {
        self.fixed = false;
    }

    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.velocity.length_squared()
    }

    pub fn state(&self) -> ParticleState {
        ParticleState {
            position: self.position,
            velocity: self.velocity,
        }
    }

    pub fn set_state(&mut self, state: ParticleState) {
        self.position = state.position;
        self.velocity = state.velocity;
    }
}

/// Phase-space state of one particle, used for integrator stages.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParticleState {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Copies the phase-space state of every particle.
pub fn capture(particles: &[Particle]) -> Vec<ParticleState> {
    particles.iter().map(Particle::state).collect()
}

/// Writes a previously captured state back.
pub fn restore(particles: &mut [Particle], states: &[ParticleState]) {
    for (particle, state) in particles.iter_mut().zip(states) {
        particle.set_state(*state);
    }
}
