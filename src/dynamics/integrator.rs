use glam::Vec3;

use crate::core::particle::{capture, ParticleState};
use crate::core::{Particle, SpringJacobian};

/// Source of forces for a given particle state.
///
/// Integrators call [`ForceField::accumulate`] once per derivative
/// evaluation, after moving the particles to the stage state they need.
pub trait ForceField {
    /// Clears every accumulator, then adds all active forces.
    fn accumulate(&mut self, particles: &mut [Particle]);

    /// Linearizes the velocity- and position-dependent forces around `particles`.
    fn linearize(&self, particles: &[Particle]) -> Linearization;
}

/// Spring coupling between particles `a` and `b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coupling {
    pub a: usize,
    pub b: usize,
    pub jacobian: SpringJacobian,
}

/// Force Jacobians used by implicit integration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linearization {
    pub couplings: Vec<Coupling>,
    /// Isotropic viscous damping applied to every free particle.
    pub velocity_damping: f32,
}

/// Time derivative of one particle's phase-space state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Derivative {
    pub velocity: Vec3,
    pub acceleration: Vec3,
}

/// Evaluates `(x', v') = (v, F/m)` for every particle at its current state.
pub fn evaluate(particles: &mut [Particle], field: &mut dyn ForceField) -> Vec<Derivative> {
    field.accumulate(particles);
    particles
        .iter()
        .map(|particle| {
            if particle.fixed {
                Derivative::default()
            } else {
                Derivative {
                    velocity: particle.velocity,
                    acceleration: particle.acceleration(),
                }
            }
        })
        .collect()
}

/// Moves every free particle to `base + h * derivative`.
fn offset(particles: &mut [Particle], base: &[ParticleState], derivatives: &[Derivative], h: f32) {
    for ((particle, state), derivative) in particles.iter_mut().zip(base).zip(derivatives) {
        if particle.fixed {
            continue;
        }
        particle.position = state.position + derivative.velocity * h;
        particle.velocity = state.velocity + derivative.acceleration * h;
    }
}

/// Capability shared by every time integrator.
pub trait Integrator {
    /// Advances `particles` by `dt`. Fixed particles are left untouched.
    fn integrate(&self, particles: &mut [Particle], field: &mut dyn ForceField, dt: f32);
}

/// Forward Euler: position advances with the velocity from the start of the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExplicitEuler;

impl Integrator for ExplicitEuler {
    fn integrate(&self, particles: &mut [Particle], field: &mut dyn ForceField, dt: f32) {
        let derivatives = evaluate(particles, field);
        for (particle, derivative) in particles.iter_mut().zip(&derivatives) {
            if particle.fixed {
                continue;
            }
            particle.position += derivative.velocity * dt;
            particle.velocity += derivative.acceleration * dt;
        }
    }
}

/// Symplectic Euler: position advances with the freshly updated velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SemiImplicitEuler;

impl Integrator for SemiImplicitEuler {
    fn integrate(&self, particles: &mut [Particle], field: &mut dyn ForceField, dt: f32) {
        let derivatives = evaluate(particles, field);
        for (particle, derivative) in particles.iter_mut().zip(&derivatives) {
            if particle.fixed {
                continue;
            }
            particle.velocity += derivative.acceleration * dt;
            particle.position += particle.velocity * dt;
        }
    }
}

/// Second-order Runge-Kutta using the derivative at the half step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Midpoint;

impl Integrator for Midpoint {
    fn integrate(&self, particles: &mut [Particle], field: &mut dyn ForceField, dt: f32) {
        let start = capture(particles);
        let k1 = evaluate(particles, field);
        offset(particles, &start, &k1, 0.5 * dt);
        let k2 = evaluate(particles, field);
        offset(particles, &start, &k2, dt);
    }
}

/// Classic fourth-order Runge-Kutta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RungeKutta4;

impl Integrator for RungeKutta4 {
    fn integrate(&self, particles: &mut [Particle], field: &mut dyn ForceField, dt: f32) {
        let start = capture(particles);
        let k1 = evaluate(particles, field);
        offset(particles, &start, &k1, 0.5 * dt);
        let k2 = evaluate(particles, field);
        offset(particles, &start, &k2, 0.5 * dt);
        let k3 = evaluate(particles, field);
        offset(particles, &start, &k3, dt);
        let k4 = evaluate(particles, field);

        let combined: Vec<Derivative> = k1
            .iter()
            .zip(&k2)
            .zip(&k3)
            .zip(&k4)
            .map(|(((d1, d2), d3), d4)| Derivative {
                velocity: (d1.velocity + 2.0 * (d2.velocity + d3.velocity) + d4.velocity) / 6.0,
                acceleration: (d1.acceleration
                    + 2.0 * (d2.acceleration + d3.acceleration)
                    + d4.acceleration)
                    / 6.0,
            })
            .collect();
        offset(particles, &start, &combined, dt);
    }
}
