//! Canonical topologies (cloth grid, hair strands) wired into a [`ParticleSystem`].

use glam::Vec3;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    config::{SystemConfig, DEFAULT_DRAG_COEFFICIENT},
    core::{Particle, ParticleId},
    dynamics::{forces::Force, solver::Solver},
    error::{Result, SimError},
    world::ParticleSystem,
};

pub const DEFAULT_CLOTH_RESOLUTION: usize = 10;
pub const DEFAULT_HAIR_STRANDS: usize = 8;
pub const DEFAULT_HAIR_SEGMENTS: usize = 12;

/// Which body a particle system was seeded with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Topology {
    /// Wired by hand through `add_particle` / `add_spring`.
    Custom,
    /// Square grid of `resolution²` particles with two pinned corners.
    Cloth { resolution: usize, size: f32 },
    /// Strands hanging from fixed roots.
    Hair {
        strands: usize,
        segments: usize,
        length: f32,
    },
}

impl Topology {
    pub fn cloth() -> Self {
        Self::Cloth {
            resolution: DEFAULT_CLOTH_RESOLUTION,
            size: 1.0,
        }
    }

    pub fn hair() -> Self {
        Self::Hair {
            strands: DEFAULT_HAIR_STRANDS,
            segments: DEFAULT_HAIR_SEGMENTS,
            length: 1.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Topology::Custom => "custom",
            Topology::Cloth { .. } => "cloth",
            Topology::Hair { .. } => "hair",
        }
    }
}

/// Builds particle systems for the canonical topologies.
///
/// ```
/// use mass_spring::builder::{SystemBuilder, Topology};
///
/// let system = SystemBuilder::new().build(Topology::cloth()).unwrap();
/// assert_eq!(system.particles().len(), 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemBuilder {
    pub config: SystemConfig,
    pub solver: Solver,
    pub particle_mass: f32,
    /// Stiffness of structural and shear springs.
    pub stiffness: f32,
    pub damping: f32,
    /// Stiffness of the springs skipping one particle.
    pub bend_stiffness: f32,
    /// Viscous drag registered with the system, 0 to skip.
    pub drag: f32,
    /// Height of pinned particles.
    pub anchor_height: f32,
}

impl Default for SystemBuilder {
    fn default() -> Self {
        Self {
            config: SystemConfig::default(),
            solver: Solver::default(),
            particle_mass: 1.0,
            stiffness: 150.0,
            damping: 1.5,
            bend_stiffness: 40.0,
            drag: DEFAULT_DRAG_COEFFICIENT,
            anchor_height: 1.0,
        }
    }
}

impl SystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: SystemConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_particle_mass(mut self, mass: f32) -> Self {
        self.particle_mass = mass;
        self
    }

    pub fn with_springs(mut self, stiffness: f32, damping: f32) -> Self {
        self.stiffness = stiffness;
        self.damping = damping;
        self
    }

    pub fn with_bend_stiffness(mut self, stiffness: f32) -> Self {
        self.bend_stiffness = stiffness;
        self
    }

    pub fn with_drag(mut self, coefficient: f32) -> Self {
        self.drag = coefficient;
        self
    }

    pub fn with_anchor_height(mut self, height: f32) -> Self {
        self.anchor_height = height;
        self
    }

    pub fn build(&self, topology: Topology) -> Result<ParticleSystem> {
        let mut system = ParticleSystem::new(self.config).with_solver(self.solver);
        match topology {
            Topology::Custom => {}
            Topology::Cloth { resolution, size } => {
                self.weave_cloth(&mut system, resolution, size)?
            }
            Topology::Hair {
                strands,
                segments,
                length,
            } => self.grow_hair(&mut system, strands, segments, length)?,
        }

        if self.config.gravity != Vec3::ZERO {
            system.add_force(Force::gravity(self.config.gravity))?;
        }
        if self.drag > 0.0 {
            system.add_force(Force::drag(self.drag)?)?;
        }
        system.set_topology(topology);
        info!(
            "built {} with {} particles and {} springs",
            topology.name(),
            system.particles().len(),
            system.springs().len()
        );
        Ok(system)
    }

    fn weave_cloth(&self, system: &mut ParticleSystem, resolution: usize, size: f32) -> Result<()> {
        if resolution < 2 {
            return Err(SimError::invalid(
                "resolution",
                resolution as f32,
                "cloth needs at least 2x2 particles",
            ));
        }
        if !(size.is_finite() && size > 0.0) {
            return Err(SimError::invalid("size", size, "must be positive and finite"));
        }

        let spacing = size / (resolution - 1) as f32;
        let half = 0.5 * size;
        let index = |i: usize, j: usize| ParticleId(j * resolution + i);

        for j in 0..resolution {
            for i in 0..resolution {
                let position = Vec3::new(
                    -half + i as f32 * spacing,
                    self.anchor_height,
                    -half + j as f32 * spacing,
                );
                let pinned = j == 0 && (i == 0 || i == resolution - 1);
                let particle = if pinned {
                    Particle::fixed(position, self.particle_mass)?
                } else {
                    Particle::new(position, self.particle_mass)?
                };
                system.add_particle(particle);
            }
        }

        let (ks, kd, kb) = (self.stiffness, self.damping, self.bend_stiffness);
        for j in 0..resolution {
            for i in 0..resolution {
                if i + 1 < resolution {
                    system.connect(index(i, j), index(i + 1, j), ks, kd)?;
                }
                if j + 1 < resolution {
                    system.connect(index(i, j), index(i, j + 1), ks, kd)?;
                }
                if i + 1 < resolution && j + 1 < resolution {
                    system.connect(index(i, j), index(i + 1, j + 1), ks, kd)?;
                    system.connect(index(i + 1, j), index(i, j + 1), ks, kd)?;
                }
                if i + 2 < resolution {
                    system.connect(index(i, j), index(i + 2, j), kb, kd)?;
                }
                if j + 2 < resolution {
                    system.connect(index(i, j), index(i, j + 2), kb, kd)?;
                }
            }
        }
        Ok(())
    }

    fn grow_hair(
        &self,
        system: &mut ParticleSystem,
        strands: usize,
        segments: usize,
        length: f32,
    ) -> Result<()> {
        if strands == 0 {
            return Err(SimError::invalid("strands", 0.0, "need at least one strand"));
        }
        if segments == 0 {
            return Err(SimError::invalid("segments", 0.0, "need at least one segment"));
        }
        if !(length.is_finite() && length > 0.0) {
            return Err(SimError::invalid("length", length, "must be positive and finite"));
        }

        let segment_length = length / segments as f32;
        let direction = Vec3::new(0.0, -1.0, 0.3).normalize();
        let (ks, kd, kb) = (self.stiffness, self.damping, self.bend_stiffness);

        for strand in 0..strands {
            let x = if strands == 1 {
                0.0
            } else {
                -0.5 + strand as f32 / (strands - 1) as f32
            };
            let root = Vec3::new(x, self.anchor_height, 0.0);
            let first = system.particles().len();

            for k in 0..=segments {
                // Alternating sideways offset gives the bend springs a kink to hold.
                let wiggle = if k % 2 == 0 { 0.0 } else { 0.15 * segment_length };
                let position = root + direction * (k as f32 * segment_length) + Vec3::X * wiggle;
                let particle = if k == 0 {
                    Particle::fixed(position, self.particle_mass)?
                } else {
                    Particle::new(position, self.particle_mass)?
                };
                system.add_particle(particle);
            }

            for k in 0..segments {
                system.connect(ParticleId(first + k), ParticleId(first + k + 1), ks, kd)?;
                if k + 2 <= segments {
                    system.connect(ParticleId(first + k), ParticleId(first + k + 2), kb, kd)?;
                }
            }
        }
        Ok(())
    }
}
