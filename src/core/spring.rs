use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use super::particle::Particle;
use super::types::ParticleId;
use crate::error::{Result, SimError};
use crate::utils::math::outer;

/// Outcome of evaluating one spring against the current particle state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpringEvaluation {
    /// Force to add to endpoint `a`; endpoint `b` receives the negation.
    Active { force_on_a: Vec3 },
    /// Endpoints coincide, so the spring has no direction this evaluation.
    Degenerate,
    Broken,
}

/// Force derivatives of a spring with respect to the endpoint separation.
///
/// `stiffness` is `∂f_a/∂x_b` and `damping` is `∂f_a/∂v_b`; the remaining
/// blocks follow by symmetry (`∂f_a/∂x_a = -stiffness`, and so on).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringJacobian {
    pub stiffness: Mat3,
    pub damping: Mat3,
}

/// Damped Hookean link between two particles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    pub a: ParticleId,
    pub b: ParticleId,
    rest_length: f32,
    stiffness: f32,
    damping: f32,
    broken: bool,
}

impl Spring {
    pub fn new(
        a: ParticleId,
        b: ParticleId,
        rest_length: f32,
        stiffness: f32,
        damping: f32,
    ) -> Result<Self> {
        if a == b {
            return Err(SimError::SelfLoop(a));
        }
        if !(rest_length.is_finite() && rest_length >= 0.0) {
            return Err(SimError::invalid(
                "rest_length",
                rest_length,
                "must be non-negative and finite",
            ));
        }
        if !(stiffness.is_finite() && stiffness > 0.0) {
            return Err(SimError::invalid("stiffness", stiffness, "must be positive and finite"));
        }
        if !(damping.is_finite() && damping >= 0.0) {
            return Err(SimError::invalid("damping", damping, "must be non-negative and finite"));
        }
        Ok(Self {
            a,
            b,
            rest_length,
            stiffness,
            damping,
            broken: false,
        })
    }

    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }

    pub fn stiffness(&self) -> f32 {
        self.stiffness
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn endpoints(&self) -> (ParticleId, ParticleId) {
        (self.a, self.b)
    }

    fn separation(&self, particles: &[Particle]) -> Vec3 {
        particles[self.b.index()].position - particles[self.a.index()].position
    }

    pub fn length(&self, particles: &[Particle]) -> f32 {
        self.separation(particles).length()
    }

    /// Current length minus rest length.
    pub fn extension(&self, particles: &[Particle]) -> f32 {
        self.length(particles) - self.rest_length
    }

    pub fn compute_force(&self, particles: &[Particle]) -> SpringEvaluation {
        if self.broken {
            return SpringEvaluation::Broken;
        }
        let pa = &particles[self.a.index()];
        let pb = &particles[self.b.index()];
        let delta = pb.position - pa.position;
        let len = delta.length();
        if len < f32::EPSILON {
            return SpringEvaluation::Degenerate;
        }
        let dir = delta / len;
        let elastic = self.stiffness * (len - self.rest_length);
        let damping = self.damping * (pb.velocity - pa.velocity).dot(dir);
        SpringEvaluation::Active {
            force_on_a: dir * (elastic + damping),
        }
    }

    /// Evaluates the spring and adds the result to both endpoint accumulators.
    pub fn apply(&self, particles: &mut [Particle]) -> SpringEvaluation {
        let evaluation = self.compute_force(particles);
        if let SpringEvaluation::Active { force_on_a } = evaluation {
            particles[self.a.index()].accumulate_force(force_on_a);
            particles[self.b.index()].accumulate_force(-force_on_a);
        }
        evaluation
    }

    /// Whether the spring is stretched past `rest_length * threshold` beyond rest.
    pub fn exceeds_limit(&self, particles: &[Particle], threshold: f32) -> bool {
        !self.broken && self.extension(particles) > self.rest_length * threshold
    }

    /// Marks the spring broken. Returns `true` on the transition only.
    pub fn break_spring(&mut self) -> bool {
        let transitioned = !self.broken;
        self.broken = true;
        transitioned
    }

    /// Un-breaks the spring; only a system reset does this.
    pub fn restore(&mut self) {
        self.broken = false;
    }

    /// Linearizes the spring around the current state.
    ///
    /// The transverse stiffness term is clamped at zero for compressed springs
    /// so the assembled system matrix stays positive definite.
    pub fn linearize(&self, particles: &[Particle]) -> Option<SpringJacobian> {
        if self.broken {
            return None;
        }
        let delta = self.separation(particles);
        let len = delta.length();
        if len < f32::EPSILON {
            return None;
        }
        let dir = delta / len;
        let axial = outer(dir, dir);
        let transverse = (1.0 - self.rest_length / len).max(0.0);
        Some(SpringJacobian {
            stiffness: (axial + (Mat3::IDENTITY - axial) * transverse) * self.stiffness,
            damping: axial * self.damping,
        })
    }

    pub fn potential_energy(&self, particles: &[Particle]) -> f32 {
        if self.broken {
            return 0.0;
        }
        let extension = self.extension(particles);
        0.5 * self.stiffness * extension * extension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pair(separation: f32) -> Vec<Particle> {
        vec![
            Particle::new(Vec3::ZERO, 1.0).unwrap(),
            Particle::new(Vec3::new(separation, 0.0, 0.0), 1.0).unwrap(),
        ]
    }

    #[test]
    fn stretched_spring_pulls_endpoints_together() {
        let mut particles = pair(1.5);
        let spring = Spring::new(ParticleId(0), ParticleId(1), 1.0, 50.0, 0.0).unwrap();
        spring.apply(&mut particles);
        assert_relative_eq!(particles[0].force.x, 25.0, epsilon = 1e-5);
        assert_relative_eq!(particles[1].force.x, -25.0, epsilon = 1e-5);
    }

    #[test]
    fn damping_opposes_relative_velocity() {
        let mut particles = pair(1.0);
        particles[1].velocity = Vec3::new(2.0, 0.0, 0.0);
        let spring = Spring::new(ParticleId(0), ParticleId(1), 1.0, 10.0, 0.5).unwrap();
        match spring.compute_force(&particles) {
            SpringEvaluation::Active { force_on_a } => {
                assert_relative_eq!(force_on_a.x, 1.0, epsilon = 1e-6)
            }
            other => panic!("unexpected evaluation {other:?}"),
        }
    }

    #[test]
    fn coincident_endpoints_are_degenerate() {
        let particles = pair(0.0);
        let spring = Spring::new(ParticleId(0), ParticleId(1), 1.0, 10.0, 0.0).unwrap();
        assert_eq!(spring.compute_force(&particles), SpringEvaluation::Degenerate);
        assert!(spring.linearize(&particles).is_none());
    }

    #[test]
    fn rejects_invalid_parameters() {
        let a = ParticleId(0);
        let b = ParticleId(1);
        assert!(matches!(Spring::new(a, a, 1.0, 1.0, 0.0), Err(SimError::SelfLoop(_))));
        assert!(Spring::new(a, b, 1.0, 0.0, 0.0).is_err());
        assert!(Spring::new(a, b, 1.0, 1.0, -0.1).is_err());
        assert!(Spring::new(a, b, -1.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn linearized_stiffness_matches_finite_difference() {
        let particles = pair(1.5);
        let spring = Spring::new(ParticleId(0), ParticleId(1), 1.0, 20.0, 0.0).unwrap();
        let jacobian = spring.linearize(&particles).unwrap();

        let h = 1e-3;
        let mut moved = particles.clone();
        moved[1].position.x += h;
        let force = |ps: &[Particle]| match spring.compute_force(ps) {
            SpringEvaluation::Active { force_on_a } => force_on_a,
            _ => Vec3::ZERO,
        };
        let numeric = (force(&moved) - force(&particles)) / h;
        assert_relative_eq!(numeric.x, jacobian.stiffness.x_axis.x, epsilon = 1e-2);
    }
}
