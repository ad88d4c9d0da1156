use glam::Vec3;

use crate::config::{DEFAULT_GRAVITY, DEFAULT_WIND};
use crate::core::{Particle, ParticleId, Spring, SpringEvaluation, SpringId};
use crate::error::{Result, SimError};
use crate::utils::allocator::{Arena, ForceId};

/// Capability shared by every force: add a contribution into particle accumulators.
///
/// Implementations only ever add into `Particle::force`; they never read
/// another force's output, so application order does not matter.
pub trait ForceGenerator {
    fn apply(&self, particles: &mut [Particle]);

    /// Isotropic `∂f/∂v` coefficient (as `-c I`) this force adds to every free particle.
    fn velocity_damping(&self) -> f32 {
        0.0
    }
}

/// Particles a force acts upon.
#[derive(Debug, Clone, PartialEq)]
pub enum ForceTargets {
    All,
    Particles(Vec<ParticleId>),
}

impl ForceTargets {
    pub fn single(particle: ParticleId) -> Self {
        Self::Particles(vec![particle])
    }

    /// First target index that does not exist in a system of `count` particles.
    pub fn out_of_bounds(&self, count: usize) -> Option<usize> {
        match self {
            Self::All => None,
            Self::Particles(ids) => ids.iter().map(|id| id.index()).find(|&index| index >= count),
        }
    }

    fn for_each(&self, particles: &mut [Particle], mut f: impl FnMut(&mut Particle)) {
        match self {
            Self::All => particles.iter_mut().for_each(f),
            Self::Particles(ids) => {
                for id in ids {
                    if let Some(particle) = particles.get_mut(id.index()) {
                        f(particle);
                    }
                }
            }
        }
    }
}

/// Constant gravitational acceleration scaled by each particle's mass.
#[derive(Debug, Clone, PartialEq)]
pub struct GravityForce {
    pub gravity: Vec3,
}

impl GravityForce {
    pub fn new(gravity: Vec3) -> Self {
        Self { gravity }
    }
}

impl Default for GravityForce {
    fn default() -> Self {
        Self::new(Vec3::from_array(DEFAULT_GRAVITY))
    }
}

impl ForceGenerator for GravityForce {
    fn apply(&self, particles: &mut [Particle]) {
        for particle in particles.iter_mut().filter(|p| !p.fixed) {
            let force = self.gravity * particle.mass();
            particle.accumulate_force(force);
        }
    }
}

/// Fixed force vector pushed onto a set of particles (wind, interactive drag).
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalForce {
    pub targets: ForceTargets,
    /// Updated continuously by the controller while a drag gesture is live.
    pub direction: Vec3,
}

impl DirectionalForce {
    pub fn new(targets: ForceTargets, direction: Vec3) -> Self {
        Self { targets, direction }
    }
}

impl ForceGenerator for DirectionalForce {
    fn apply(&self, particles: &mut [Particle]) {
        let direction = self.direction;
        self.targets
            .for_each(particles, |particle| particle.accumulate_force(direction));
    }
}

/// Viscous drag resisting the motion of every free particle.
#[derive(Debug, Clone, PartialEq)]
pub struct DragForce {
    pub coefficient: f32,
}

impl ForceGenerator for DragForce {
    fn apply(&self, particles: &mut [Particle]) {
        for particle in particles.iter_mut().filter(|p| !p.fixed) {
            let drag = -particle.velocity * self.coefficient;
            particle.accumulate_force(drag);
        }
    }

    fn velocity_damping(&self) -> f32 {
        self.coefficient
    }
}

/// Closed set of force variants a system can register.
#[derive(Debug, Clone, PartialEq)]
pub enum ForceKind {
    Gravity(GravityForce),
    Directional(DirectionalForce),
    Drag(DragForce),
}

/// Whether a force survives [`ParticleSystem::reset`](crate::world::ParticleSystem::reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceLifetime {
    Persistent,
    /// Removed on reset, e.g. the interactive drag force.
    Transient,
}

/// A registered force: variant data plus its activation state.
#[derive(Debug, Clone, PartialEq)]
pub struct Force {
    kind: ForceKind,
    active: bool,
    lifetime: ForceLifetime,
}

impl Force {
    fn from_kind(kind: ForceKind) -> Self {
        Self {
            kind,
            active: true,
            lifetime: ForceLifetime::Persistent,
        }
    }

    pub fn gravity(gravity: Vec3) -> Self {
        Self::from_kind(ForceKind::Gravity(GravityForce::new(gravity)))
    }

    pub fn directional(targets: ForceTargets, direction: Vec3) -> Self {
        Self::from_kind(ForceKind::Directional(DirectionalForce::new(targets, direction)))
    }

    /// Default wind acting on every particle.
    pub fn wind() -> Self {
        Self::directional(ForceTargets::All, Vec3::from_array(DEFAULT_WIND))
    }

    /// Transient single-particle force driven by a drag gesture; starts at zero.
    pub fn mouse_drag(particle: ParticleId) -> Self {
        Self::directional(ForceTargets::single(particle), Vec3::ZERO).transient()
    }

    pub fn drag(coefficient: f32) -> Result<Self> {
        if !(coefficient.is_finite() && coefficient >= 0.0) {
            return Err(SimError::invalid(
                "drag_coefficient",
                coefficient,
                "must be non-negative and finite",
            ));
        }
        Ok(Self::from_kind(ForceKind::Drag(DragForce { coefficient })))
    }

    pub fn transient(mut self) -> Self {
        self.lifetime = ForceLifetime::Transient;
        self
    }

    pub fn kind(&self) -> &ForceKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ForceKind {
        &mut self.kind
    }

    pub fn lifetime(&self) -> ForceLifetime {
        self.lifetime
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Flips the active flag and returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        self.active
    }

    /// Force vector of a directional force, `None` for other variants.
    pub fn direction(&self) -> Option<Vec3> {
        match &self.kind {
            ForceKind::Directional(force) => Some(force.direction),
            _ => None,
        }
    }

    /// Sets the vector of a directional force. Returns `false` for other variants.
    pub fn set_direction(&mut self, direction: Vec3) -> bool {
        match &mut self.kind {
            ForceKind::Directional(force) => {
                force.direction = direction;
                true
            }
            _ => false,
        }
    }

    pub fn targets(&self) -> ForceTargets {
        match &self.kind {
            ForceKind::Directional(force) => force.targets.clone(),
            ForceKind::Gravity(_) | ForceKind::Drag(_) => ForceTargets::All,
        }
    }

    /// Retargets a directional force. Returns `false` for other variants.
    pub fn set_targets(&mut self, targets: ForceTargets) -> bool {
        match &mut self.kind {
            ForceKind::Directional(force) => {
                force.targets = targets;
                true
            }
            _ => false,
        }
    }
}

impl ForceGenerator for Force {
    fn apply(&self, particles: &mut [Particle]) {
        if !self.active {
            return;
        }
        match &self.kind {
            ForceKind::Gravity(force) => force.apply(particles),
            ForceKind::Directional(force) => force.apply(particles),
            ForceKind::Drag(force) => force.apply(particles),
        }
    }

    fn velocity_damping(&self) -> f32 {
        if !self.active {
            return 0.0;
        }
        match &self.kind {
            ForceKind::Drag(force) => force.velocity_damping(),
            ForceKind::Gravity(_) | ForceKind::Directional(_) => 0.0,
        }
    }
}

/// Aggregates the elastic and damping forces of every unbroken spring.
pub struct SpringForce<'a> {
    springs: &'a [Spring],
}

impl<'a> SpringForce<'a> {
    pub fn new(springs: &'a [Spring]) -> Self {
        Self { springs }
    }

    /// Applies every spring and returns the ones skipped as degenerate.
    pub fn accumulate(&self, particles: &mut [Particle]) -> Vec<SpringId> {
        let mut degenerate = Vec::new();
        for (index, spring) in self.springs.iter().enumerate() {
            if spring.apply(particles) == SpringEvaluation::Degenerate {
                degenerate.push(SpringId(index));
            }
        }
        degenerate
    }
}

impl ForceGenerator for SpringForce<'_> {
    fn apply(&self, particles: &mut [Particle]) {
        self.accumulate(particles);
    }
}

/// Collection of forces applied on every derivative evaluation.
#[derive(Debug, Clone, Default)]
pub struct ForceRegistry {
    forces: Arena<Force>,
}

impl ForceRegistry {
    pub fn new() -> Self {
        Self {
            forces: Arena::new(),
        }
    }

    pub fn add_force(&mut self, force: Force) -> ForceId {
        self.forces.insert(force)
    }

    pub fn remove_force(&mut self, id: ForceId) -> Option<Force> {
        self.forces.remove(id)
    }

    pub fn get(&self, id: ForceId) -> Option<&Force> {
        self.forces.get(id)
    }

    pub fn get_mut(&mut self, id: ForceId) -> Option<&mut Force> {
        self.forces.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ForceId, &Force)> + '_ {
        self.forces.iter()
    }

    pub fn len(&self) -> usize {
        self.forces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    pub fn apply_all(&self, particles: &mut [Particle]) {
        for force in self.forces.values() {
            force.apply(particles);
        }
    }

    /// Sum of the velocity damping coefficients of all active forces.
    pub fn velocity_damping(&self) -> f32 {
        self.forces.values().map(|force| force.velocity_damping()).sum()
    }

    /// Drops every transient force and returns the freed handles.
    pub fn clear_transient(&mut self) -> Vec<ForceId> {
        self.forces
            .retain(|force| force.lifetime() == ForceLifetime::Persistent)
    }

    pub fn clear(&mut self) {
        self.forces.clear();
    }
}
