//! Mass-spring simulation of deformable bodies (cloth, hair).
//!
//! Bodies are networks of point masses joined by damped springs. A
//! [`ParticleSystem`] owns the particles, springs and registered forces and
//! advances them with one of several interchangeable integrators: explicit,
//! semi-implicit and implicit Euler, midpoint, and 4th-order Runge-Kutta,
//! optionally under step-doubling error control. Springs can be made
//! breakable, and a ground plane keeps particles above the floor.
//!
//! ```
//! use mass_spring::*;
//!
//! let mut system = ParticleSystem::new(SystemConfig::default().with_time_step(0.01));
//! let anchor = system.add_particle(Particle::fixed(Vec3::ZERO, 1.0).unwrap());
//! let bob = system.add_particle(Particle::new(Vec3::new(1.5, 0.0, 0.0), 1.0).unwrap());
//! system.add_spring(Spring::new(anchor, bob, 1.0, 50.0, 0.0).unwrap()).unwrap();
//!
//! let report = system.step(false);
//! assert_eq!(report.substeps, 1);
//! assert!(system.particles()[1].position.x < 1.5);
//! ```

pub mod builder;
pub mod config;
pub mod control;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::{Mat3, Vec3};

pub use builder::{SystemBuilder, Topology};
pub use config::SystemConfig;
pub use control::{Command, SimulationController};
pub use crate::core::{Particle, ParticleId, ParticleState, Spring, SpringEvaluation, SpringId};
pub use dynamics::{
    adaptive::{AdaptiveSettings, AdaptiveStepper},
    forces::{
        DirectionalForce, DragForce, Force, ForceGenerator, ForceKind, ForceLifetime,
        ForceRegistry, ForceTargets, GravityForce, SpringForce,
    },
    implicit::ImplicitEuler,
    integrator::{ForceField, Integrator},
    solver::{Euler, EulerMode, Solver, SolverKind},
};
pub use error::{Diagnostic, Result, SimError};
pub use utils::allocator::{Arena, ForceId};
pub use world::{ParticleSystem, StepReport};
