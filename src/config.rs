//! Global configuration constants and the per-system runtime configuration.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::dynamics::adaptive::AdaptiveSettings;

/// Default gravity vector applied by the builder (Y-up).
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, -9.81, 0.0];

/// Default integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 0.01;

/// Amount by which the controller nudges the timestep up or down.
pub const TIME_STEP_INCREMENT: f32 = 0.001;

/// Smallest timestep the controller will decrease to.
pub const MIN_TIME_STEP: f32 = 0.001;

/// Height of the ground plane when the wall is enabled.
pub const DEFAULT_FLOOR_HEIGHT: f32 = 0.0;

/// Fraction of the vertical velocity kept (and reversed) on ground contact.
pub const DEFAULT_WALL_RESTITUTION: f32 = 0.0;

/// Relative stretch beyond rest length at which a breakable spring snaps.
pub const DEFAULT_BREAK_THRESHOLD: f32 = 0.5;

/// Default viscous drag coefficient registered by the builder.
pub const DEFAULT_DRAG_COEFFICIENT: f32 = 0.02;

/// Wind force applied to every particle when wind is switched on.
pub const DEFAULT_WIND: [f32; 3] = [5.0, 3.0, 5.0];

/// Gain converting the drag gesture offset (world units) into a force.
pub const DRAG_FORCE_GAIN: f32 = 150.0;

/// Frame budget used to flag slow steps in the controller.
pub const FRAME_BUDGET_MS: f32 = 1000.0 / 60.0;

/// Runtime configuration of a [`ParticleSystem`](crate::world::ParticleSystem).
///
/// Every field may be changed between steps through
/// [`ParticleSystem::config_mut`](crate::world::ParticleSystem::config_mut);
/// changes take effect on the next step.
///
/// ```
/// use mass_spring::config::SystemConfig;
///
/// let config = SystemConfig::default()
///     .with_time_step(0.005)
///     .with_wall(true)
///     .with_breakable_springs(true);
/// assert!(config.wall_exists);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Timestep used by [`ParticleSystem::step`](crate::world::ParticleSystem::step).
    pub dt: f32,
    /// Gravity registered by the builder when seeding a topology.
    pub gravity: Vec3,
    /// Whether the ground plane is active.
    pub wall_exists: bool,
    pub floor_height: f32,
    /// 0 zeroes the vertical velocity on contact, 1 reflects it fully.
    pub wall_restitution: f32,
    /// System-wide toggle for spring breaking.
    pub springs_can_break: bool,
    pub break_threshold: f32,
    pub adaptive: AdaptiveSettings,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_TIME_STEP,
            gravity: Vec3::from_array(DEFAULT_GRAVITY),
            wall_exists: false,
            floor_height: DEFAULT_FLOOR_HEIGHT,
            wall_restitution: DEFAULT_WALL_RESTITUTION,
            springs_can_break: false,
            break_threshold: DEFAULT_BREAK_THRESHOLD,
            adaptive: AdaptiveSettings::default(),
        }
    }
}

impl SystemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_step(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_wall(mut self, enabled: bool) -> Self {
        self.wall_exists = enabled;
        self
    }

    pub fn with_floor_height(mut self, height: f32) -> Self {
        self.floor_height = height;
        self
    }

    pub fn with_wall_restitution(mut self, restitution: f32) -> Self {
        self.wall_restitution = restitution.clamp(0.0, 1.0);
        self
    }

    pub fn with_breakable_springs(mut self, enabled: bool) -> Self {
        self.springs_can_break = enabled;
        self
    }

    pub fn with_break_threshold(mut self, threshold: f32) -> Self {
        self.break_threshold = threshold;
        self
    }

    pub fn with_adaptive(mut self, settings: AdaptiveSettings) -> Self {
        self.adaptive = settings;
        self
    }
}
