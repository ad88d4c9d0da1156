//! Simulation dynamics: forces, integrators, adaptive stepping and the ground plane.

pub mod adaptive;
pub mod boundary;
pub mod forces;
pub mod implicit;
pub mod integrator;
pub mod solver;

pub use adaptive::{AdaptiveOutcome, AdaptiveSettings, AdaptiveStepper};
pub use boundary::GroundPlane;
pub use forces::{
    DirectionalForce, DragForce, Force, ForceGenerator, ForceKind, ForceLifetime, ForceRegistry,
    ForceTargets, GravityForce, SpringForce,
};
pub use implicit::ImplicitEuler;
pub use integrator::{
    Coupling, Derivative, ExplicitEuler, ForceField, Integrator, Linearization, Midpoint,
    RungeKutta4, SemiImplicitEuler,
};
pub use solver::{Euler, EulerMode, Solver, SolverKind};
