use glam::Vec3;
use log::{debug, info, warn};

use crate::{
    builder::Topology,
    config::SystemConfig,
    core::{Particle, ParticleId, Spring, SpringId},
    dynamics::{
        adaptive::AdaptiveStepper,
        boundary::GroundPlane,
        forces::{Force, ForceRegistry, SpringForce},
        integrator::{Coupling, ForceField, Integrator, Linearization},
        solver::Solver,
    },
    error::{Diagnostic, Result, SimError},
    utils::{allocator::ForceId, logging::StepTimer},
};

/// What happened during one call to [`ParticleSystem::step`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Simulated time covered by the step.
    pub dt: f32,
    /// Integrator invocations that were committed (1 unless adaptive).
    pub substeps: u32,
    /// Springs that snapped during this step.
    pub broken_springs: Vec<SpringId>,
    pub diagnostics: Vec<Diagnostic>,
}

impl StepReport {
    pub fn has_stability_warning(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_stability_warning)
    }
}

/// Force field seen by the integrators: registered forces plus every spring.
struct SystemField<'a> {
    forces: &'a ForceRegistry,
    springs: &'a [Spring],
    degenerate: Vec<SpringId>,
}

impl<'a> SystemField<'a> {
    fn new(forces: &'a ForceRegistry, springs: &'a [Spring]) -> Self {
        Self {
            forces,
            springs,
            degenerate: Vec::new(),
        }
    }

    fn into_diagnostics(mut self) -> Vec<Diagnostic> {
        self.degenerate.sort_unstable();
        self.degenerate.dedup();
        self.degenerate
            .into_iter()
            .map(|spring| Diagnostic::DegenerateGeometry { spring })
            .collect()
    }
}

impl ForceField for SystemField<'_> {
    fn accumulate(&mut self, particles: &mut [Particle]) {
        for particle in particles.iter_mut() {
            particle.clear_force();
        }
        self.forces.apply_all(particles);
        let degenerate = SpringForce::new(self.springs).accumulate(particles);
        self.degenerate.extend(degenerate);
    }

    fn linearize(&self, particles: &[Particle]) -> Linearization {
        let couplings = self
            .springs
            .iter()
            .filter_map(|spring| {
                spring.linearize(particles).map(|jacobian| Coupling {
                    a: spring.a.index(),
                    b: spring.b.index(),
                    jacobian,
                })
            })
            .collect();
        Linearization {
            couplings,
            velocity_damping: self.forces.velocity_damping(),
        }
    }
}

/// Owns the particles, springs and forces of one simulated body.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    springs: Vec<Spring>,
    forces: ForceRegistry,
    solver: Solver,
    config: SystemConfig,
    topology: Topology,
    stepper: AdaptiveStepper,
    time: f32,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new(SystemConfig::default())
    }
}

impl ParticleSystem {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            particles: Vec::new(),
            springs: Vec::new(),
            forces: ForceRegistry::new(),
            solver: Solver::default(),
            config,
            topology: Topology::Custom,
            stepper: AdaptiveStepper::new(config.adaptive),
            time: 0.0,
        }
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    pub fn add_particle(&mut self, particle: Particle) -> ParticleId {
        self.particles.push(particle);
        ParticleId(self.particles.len() - 1)
    }

    /// Registers a spring; both endpoints must already exist.
    pub fn add_spring(&mut self, spring: Spring) -> Result<SpringId> {
        for endpoint in [spring.a, spring.b] {
            self.check_particle(endpoint)?;
        }
        self.springs.push(spring);
        Ok(SpringId(self.springs.len() - 1))
    }

    /// Connects two particles with a spring at rest at their current distance.
    pub fn connect(
        &mut self,
        a: ParticleId,
        b: ParticleId,
        stiffness: f32,
        damping: f32,
    ) -> Result<SpringId> {
        self.check_particle(a)?;
        self.check_particle(b)?;
        let rest_length = self.particles[a.index()]
            .position
            .distance(self.particles[b.index()].position);
        self.add_spring(Spring::new(a, b, rest_length, stiffness, damping)?)
    }

    pub fn add_force(&mut self, force: Force) -> Result<ForceId> {
        if let Some(index) = force.targets().out_of_bounds(self.particles.len()) {
            return Err(SimError::ParticleOutOfBounds {
                index,
                count: self.particles.len(),
            });
        }
        Ok(self.forces.add_force(force))
    }

    pub fn remove_force(&mut self, id: ForceId) -> Result<Force> {
        self.forces.remove_force(id).ok_or(SimError::UnknownForce(id))
    }

    /// Flips a force's active flag and returns the new state.
    pub fn toggle_force(&mut self, id: ForceId) -> Result<bool> {
        self.forces
            .get_mut(id)
            .map(Force::toggle)
            .ok_or(SimError::UnknownForce(id))
    }

    pub fn force(&self, id: ForceId) -> Option<&Force> {
        self.forces.get(id)
    }

    pub fn force_mut(&mut self, id: ForceId) -> Option<&mut Force> {
        self.forces.get_mut(id)
    }

    pub fn forces(&self) -> impl Iterator<Item = (ForceId, &Force)> + '_ {
        self.forces.iter()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id.index())
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id.index())
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    pub fn spring(&self, id: SpringId) -> Option<&Spring> {
        self.springs.get(id.index())
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    /// Replaces the active solver; the next step uses it.
    pub fn set_solver(&mut self, solver: Solver) {
        info!("Using {}", solver.name());
        self.solver = solver;
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SystemConfig {
        &mut self.config
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn set_topology(&mut self, topology: Topology) {
        self.topology = topology;
    }

    /// Simulated time since construction or the last reset.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Advances the simulation by the configured timestep.
    pub fn step(&mut self, adaptive: bool) -> StepReport {
        self.advance(self.config.dt, adaptive)
    }

    /// Advances the simulation by `dt`.
    ///
    /// Forces are accumulated inside every derivative evaluation the solver
    /// makes. After integration the ground plane is enforced and overstretched
    /// springs are broken.
    pub fn advance(&mut self, dt: f32, adaptive: bool) -> StepReport {
        let mut report = StepReport {
            dt,
            ..StepReport::default()
        };
        if !(dt.is_finite() && dt > 0.0) {
            warn!("ignoring step with non-positive timestep {dt}");
            report.dt = 0.0;
            return report;
        }
        if self.particles.is_empty() {
            return report;
        }

        let ground = GroundPlane::from_config(&self.config);
        let resolve_ground = |particles: &mut [Particle]| {
            if let Some(plane) = ground {
                plane.resolve(particles);
            }
        };

        {
            let mut field = SystemField::new(&self.forces, &self.springs);
            let _timer = StepTimer::start(self.solver.name());
            if adaptive {
                self.stepper.settings = self.config.adaptive;
                let outcome = self.stepper.advance(
                    &mut self.particles,
                    &self.solver,
                    &mut field,
                    dt,
                    resolve_ground,
                );
                report.substeps = outcome.substeps;
                report.diagnostics.extend(outcome.warnings);
            } else {
                self.solver.integrate(&mut self.particles, &mut field, dt);
                resolve_ground(&mut self.particles);
                report.substeps = 1;
            }
            for diagnostic in field.into_diagnostics() {
                debug!("{diagnostic}");
                report.diagnostics.push(diagnostic);
            }
        }

        if self.config.springs_can_break {
            report.broken_springs = self.break_overstretched();
        }
        self.time += dt;
        report
    }

    fn break_overstretched(&mut self) -> Vec<SpringId> {
        let threshold = self.config.break_threshold;
        let mut broken = Vec::new();
        for (index, spring) in self.springs.iter_mut().enumerate() {
            if spring.exceeds_limit(&self.particles, threshold) && spring.break_spring() {
                debug!("spring {} snapped", SpringId(index));
                broken.push(SpringId(index));
            }
        }
        broken
    }

    /// Restores the seeded state: start positions, zero velocities, intact
    /// springs, no transient forces.
    pub fn reset(&mut self) {
        for particle in &mut self.particles {
            particle.reset_to_start();
        }
        for spring in &mut self.springs {
            spring.restore();
        }
        let removed = self.forces.clear_transient();
        self.stepper.reset();
        self.time = 0.0;
        info!(
            "reset {} particles, {} springs ({} transient forces removed)",
            self.particles.len(),
            self.springs.len(),
            removed.len()
        );
    }

    /// Releases every particle, spring and force.
    pub fn free(&mut self) {
        self.particles.clear();
        self.springs.clear();
        self.forces.clear();
        self.stepper.reset();
        self.time = 0.0;
    }

    /// Particle closest to `point`, if any.
    pub fn nearest_particle(&self, point: Vec3) -> Option<ParticleId> {
        self.particles
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.position
                    .distance_squared(point)
                    .total_cmp(&b.position.distance_squared(point))
            })
            .map(|(index, _)| ParticleId(index))
    }

    pub fn kinetic_energy(&self) -> f32 {
        self.particles.iter().map(Particle::kinetic_energy).sum()
    }

    /// Elastic energy stored in the unbroken springs.
    pub fn potential_energy(&self) -> f32 {
        self.springs
            .iter()
            .map(|spring| spring.potential_energy(&self.particles))
            .sum()
    }

    pub fn total_energy(&self) -> f32 {
        self.kinetic_energy() + self.potential_energy()
    }

    fn check_particle(&self, id: ParticleId) -> Result<()> {
        if id.index() < self.particles.len() {
            Ok(())
        } else {
            Err(SimError::ParticleOutOfBounds {
                index: id.index(),
                count: self.particles.len(),
            })
        }
    }
}
