use crate::config::SystemConfig;
use crate::core::Particle;

/// Horizontal ground plane the particles may not sink below.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundPlane {
    pub height: f32,
    /// 0 = the vertical velocity is zeroed, 1 = it is fully reflected.
    pub restitution: f32,
}

impl GroundPlane {
    pub fn new(height: f32, restitution: f32) -> Self {
        Self {
            height,
            restitution: restitution.clamp(0.0, 1.0),
        }
    }

    /// Plane described by `config`, or `None` when the wall is disabled.
    pub fn from_config(config: &SystemConfig) -> Option<Self> {
        config
            .wall_exists
            .then(|| Self::new(config.floor_height, config.wall_restitution))
    }

    /// Projects penetrating particles back onto the plane. Returns the contact count.
    pub fn resolve(&self, particles: &mut [Particle]) -> usize {
        let mut contacts = 0;
        for particle in particles.iter_mut().filter(|p| !p.fixed) {
            if particle.position.y < self.height {
                particle.position.y = self.height;
                if particle.velocity.y < 0.0 {
                    particle.velocity.y = -particle.velocity.y * self.restitution;
                }
                contacts += 1;
            }
        }
        contacts
    }
}
