//! Linearized backward Euler.
//!
//! Each step linearizes the spring and drag forces once around the current
//! state and solves
//!
//! ```text
//! (M - dt ∂f/∂v - dt² ∂f/∂x) Δv = dt (f₀ + dt ∂f/∂x v₀)
//! ```
//!
//! with Jacobi-preconditioned conjugate gradient. The iteration count is
//! bounded, so the cost per step is predictable even when the solve has not
//! fully converged.

use glam::Vec3;
use log::trace;

use super::integrator::{evaluate, Coupling, ForceField, Integrator, Linearization};
use crate::core::Particle;
use crate::utils::math::{diagonal, safe_div};

/// Default conjugate-gradient iteration budget per step.
pub const DEFAULT_MAX_ITERATIONS: u32 = 32;

/// Default relative residual at which the solve stops early.
pub const DEFAULT_TOLERANCE: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImplicitEuler {
    pub max_iterations: u32,
    pub tolerance: f32,
}

impl Default for ImplicitEuler {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Matrix-free view of the implicit system restricted to free particles.
struct SystemMatrix<'a> {
    masses: Vec<f32>,
    free: Vec<bool>,
    couplings: &'a [Coupling],
    damping: f32,
    dt: f32,
}

impl SystemMatrix<'_> {
    fn multiply(&self, x: &[Vec3], out: &mut [Vec3]) {
        for (i, value) in out.iter_mut().enumerate() {
            *value = if self.free[i] {
                x[i] * (self.masses[i] + self.dt * self.damping)
            } else {
                Vec3::ZERO
            };
        }
        for coupling in self.couplings {
            let block = coupling.jacobian.damping * self.dt
                + coupling.jacobian.stiffness * (self.dt * self.dt);
            let relative = block * (x[coupling.a] - x[coupling.b]);
            if self.free[coupling.a] {
                out[coupling.a] += relative;
            }
            if self.free[coupling.b] {
                out[coupling.b] -= relative;
            }
        }
    }

    fn preconditioner(&self) -> Vec<Vec3> {
        let mut diag: Vec<Vec3> = self
            .masses
            .iter()
            .map(|mass| Vec3::splat(mass + self.dt * self.damping))
            .collect();
        for coupling in self.couplings {
            let block = coupling.jacobian.damping * self.dt
                + coupling.jacobian.stiffness * (self.dt * self.dt);
            let d = diagonal(&block);
            diag[coupling.a] += d;
            diag[coupling.b] += d;
        }
        diag
    }

    fn mask(&self, v: &mut [Vec3]) {
        for (value, free) in v.iter_mut().zip(&self.free) {
            if !free {
                *value = Vec3::ZERO;
            }
        }
    }
}

fn dot(a: &[Vec3], b: &[Vec3]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x.dot(*y)).sum()
}

impl ImplicitEuler {
    pub fn new(max_iterations: u32, tolerance: f32) -> Self {
        Self {
            max_iterations,
            tolerance,
        }
    }

    /// Right-hand side `dt (f₀ + dt ∂f/∂x v₀)`.
    fn right_hand_side(
        particles: &[Particle],
        linearization: &Linearization,
        dt: f32,
    ) -> Vec<Vec3> {
        let mut stiffness_times_velocity = vec![Vec3::ZERO; particles.len()];
        for coupling in &linearization.couplings {
            let relative = particles[coupling.b].velocity - particles[coupling.a].velocity;
            let df = coupling.jacobian.stiffness * relative;
            stiffness_times_velocity[coupling.a] += df;
            stiffness_times_velocity[coupling.b] -= df;
        }
        particles
            .iter()
            .zip(&stiffness_times_velocity)
            .map(|(particle, kv)| {
                if particle.fixed {
                    Vec3::ZERO
                } else {
                    (particle.force + *kv * dt) * dt
                }
            })
            .collect()
    }

    /// Solves for the velocity change; returns it with the iterations used.
    fn solve(&self, matrix: &SystemMatrix<'_>, rhs: &[Vec3]) -> (Vec<Vec3>, u32) {
        let n = rhs.len();
        let preconditioner = matrix.preconditioner();
        let mut x = vec![Vec3::ZERO; n];
        let mut residual = rhs.to_vec();
        matrix.mask(&mut residual);
        let mut z: Vec<Vec3> = residual
            .iter()
            .zip(&preconditioner)
            .map(|(r, d)| safe_div(*r, *d))
            .collect();
        let mut direction = z.clone();
        let mut rz = dot(&residual, &z);
        let rhs_norm = dot(rhs, rhs).sqrt();
        let mut product = vec![Vec3::ZERO; n];

        let mut iterations = 0;
        while iterations < self.max_iterations {
            if dot(&residual, &residual).sqrt() <= self.tolerance * rhs_norm {
                break;
            }
            matrix.multiply(&direction, &mut product);
            let curvature = dot(&direction, &product);
            if !(curvature.is_finite() && curvature > f32::EPSILON) {
                break;
            }
            let alpha = rz / curvature;
            for i in 0..n {
                x[i] += direction[i] * alpha;
                residual[i] -= product[i] * alpha;
            }
            for i in 0..n {
                z[i] = safe_div(residual[i], preconditioner[i]);
            }
            let rz_next = dot(&residual, &z);
            let beta = rz_next / rz;
            rz = rz_next;
            for i in 0..n {
                direction[i] = z[i] + direction[i] * beta;
            }
            matrix.mask(&mut direction);
            iterations += 1;
        }
        (x, iterations)
    }
}

impl Integrator for ImplicitEuler {
    fn integrate(&self, particles: &mut [Particle], field: &mut dyn ForceField, dt: f32) {
        // Leaves f₀ in the accumulators for the right-hand side.
        evaluate(particles, field);
        let linearization = field.linearize(particles);
        let rhs = Self::right_hand_side(particles, &linearization, dt);
        let matrix = SystemMatrix {
            masses: particles.iter().map(Particle::mass).collect(),
            free: particles.iter().map(|p| !p.fixed).collect(),
            couplings: &linearization.couplings,
            damping: linearization.velocity_damping,
            dt,
        };

        let (delta_v, iterations) = self.solve(&matrix, &rhs);
        trace!("implicit euler converged in {iterations} iterations");

        for (particle, dv) in particles.iter_mut().zip(&delta_v) {
            if particle.fixed {
                continue;
            }
            particle.velocity += *dv;
            particle.position += particle.velocity * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ParticleId, Spring};
    use crate::dynamics::forces::SpringForce;

    struct SpringField(Vec<Spring>);

    impl ForceField for SpringField {
        fn accumulate(&mut self, particles: &mut [Particle]) {
            particles.iter_mut().for_each(Particle::clear_force);
            SpringForce::new(&self.0).accumulate(particles);
        }

        fn linearize(&self, particles: &[Particle]) -> Linearization {
            Linearization {
                couplings: self
                    .0
                    .iter()
                    .filter_map(|s| {
                        s.linearize(particles).map(|jacobian| Coupling {
                            a: s.a.index(),
                            b: s.b.index(),
                            jacobian,
                        })
                    })
                    .collect(),
                velocity_damping: 0.0,
            }
        }
    }

    #[test]
    fn fixed_anchor_is_not_moved() {
        let mut particles = vec![
            Particle::fixed(Vec3::ZERO, 1.0).unwrap(),
            Particle::new(Vec3::new(2.0, 0.0, 0.0), 1.0).unwrap(),
        ];
        let spring = Spring::new(ParticleId(0), ParticleId(1), 1.0, 1000.0, 0.0).unwrap();
        let mut field = SpringField(vec![spring]);
        ImplicitEuler::default().integrate(&mut particles, &mut field, 0.1);
        assert_eq!(particles[0].position, Vec3::ZERO);
        assert!(particles[1].position.x < 2.0);
        assert!(particles[1].position.x > 0.5);
    }
}
