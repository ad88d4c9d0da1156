use serde::{Deserialize, Serialize};
use std::fmt;

use super::implicit::ImplicitEuler;
use super::integrator::{
    ExplicitEuler, ForceField, Integrator, Midpoint, RungeKutta4, SemiImplicitEuler,
};
use crate::core::Particle;

/// Flavours of the Euler method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EulerMode {
    Explicit,
    SemiImplicit,
    Implicit,
}

/// Euler integrator; `implicit` only matters in [`EulerMode::Implicit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Euler {
    pub mode: EulerMode,
    pub implicit: ImplicitEuler,
}

impl Euler {
    pub fn new(mode: EulerMode) -> Self {
        Self {
            mode,
            implicit: ImplicitEuler::default(),
        }
    }
}

impl Integrator for Euler {
    fn integrate(&self, particles: &mut [Particle], field: &mut dyn ForceField, dt: f32) {
        match self.mode {
            EulerMode::Explicit => ExplicitEuler.integrate(particles, field, dt),
            EulerMode::SemiImplicit => SemiImplicitEuler.integrate(particles, field, dt),
            EulerMode::Implicit => self.implicit.integrate(particles, field, dt),
        }
    }
}

/// Serializable tag naming a solver variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolverKind {
    ExplicitEuler,
    SemiImplicitEuler,
    ImplicitEuler,
    Midpoint,
    RungeKutta4,
}

impl SolverKind {
    pub const ALL: [SolverKind; 5] = [
        SolverKind::ExplicitEuler,
        SolverKind::SemiImplicitEuler,
        SolverKind::ImplicitEuler,
        SolverKind::Midpoint,
        SolverKind::RungeKutta4,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SolverKind::ExplicitEuler => "Explicit Euler",
            SolverKind::SemiImplicitEuler => "Semi Explicit Euler",
            SolverKind::ImplicitEuler => "Implicit Euler",
            SolverKind::Midpoint => "Midpoint",
            SolverKind::RungeKutta4 => "4th order Runge-Kutta",
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The active time integrator of a particle system.
///
/// Solvers carry no particle state, so swapping one mid-run only changes how
/// the next step is taken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Solver {
    Euler(Euler),
    Midpoint(Midpoint),
    RungeKutta4(RungeKutta4),
}

impl Default for Solver {
    fn default() -> Self {
        Self::semi_implicit_euler()
    }
}

impl Solver {
    pub fn explicit_euler() -> Self {
        Self::Euler(Euler::new(EulerMode::Explicit))
    }

    pub fn semi_implicit_euler() -> Self {
        Self::Euler(Euler::new(EulerMode::SemiImplicit))
    }

    pub fn implicit_euler() -> Self {
        Self::Euler(Euler::new(EulerMode::Implicit))
    }

    /// Implicit Euler with a custom linear-solve budget.
    pub fn implicit_euler_with(settings: ImplicitEuler) -> Self {
        Self::Euler(Euler {
            mode: EulerMode::Implicit,
            implicit: settings,
        })
    }

    pub fn midpoint() -> Self {
        Self::Midpoint(Midpoint)
    }

    pub fn runge_kutta4() -> Self {
        Self::RungeKutta4(RungeKutta4)
    }

    pub fn from_kind(kind: SolverKind) -> Self {
        match kind {
            SolverKind::ExplicitEuler => Self::explicit_euler(),
            SolverKind::SemiImplicitEuler => Self::semi_implicit_euler(),
            SolverKind::ImplicitEuler => Self::implicit_euler(),
            SolverKind::Midpoint => Self::midpoint(),
            SolverKind::RungeKutta4 => Self::runge_kutta4(),
        }
    }

    pub fn kind(&self) -> SolverKind {
        match self {
            Solver::Euler(euler) => match euler.mode {
                EulerMode::Explicit => SolverKind::ExplicitEuler,
                EulerMode::SemiImplicit => SolverKind::SemiImplicitEuler,
                EulerMode::Implicit => SolverKind::ImplicitEuler,
            },
            Solver::Midpoint(_) => SolverKind::Midpoint,
            Solver::RungeKutta4(_) => SolverKind::RungeKutta4,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

impl From<SolverKind> for Solver {
    fn from(kind: SolverKind) -> Self {
        Self::from_kind(kind)
    }
}

impl Integrator for Solver {
    fn integrate(&self, particles: &mut [Particle], field: &mut dyn ForceField, dt: f32) {
        match self {
            Solver::Euler(euler) => euler.integrate(particles, field, dt),
            Solver::Midpoint(midpoint) => midpoint.integrate(particles, field, dt),
            Solver::RungeKutta4(rk4) => rk4.integrate(particles, field, dt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_factory() {
        for kind in SolverKind::ALL {
            assert_eq!(Solver::from_kind(kind).kind(), kind);
        }
    }
}
