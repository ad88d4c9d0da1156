//! Step-doubling error control.
//!
//! A sub-step of size `h` is compared against two sub-steps of `h / 2`; the
//! largest particle position difference is the local error estimate. The
//! accepted sub-step size carries over to the next frame.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::integrator::{ForceField, Integrator};
use super::solver::Solver;
use crate::core::particle::{capture, restore, ParticleState};
use crate::core::Particle;
use crate::error::Diagnostic;

/// Bounds for adaptive sub-stepping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveSettings {
    /// Maximum position error allowed per sub-step (world units).
    pub tolerance: f32,
    /// Smallest sub-step the stepper will try.
    pub min_step: f32,
    /// Halvings attempted per sub-step before giving up on the tolerance.
    pub max_halvings: u32,
    /// Sub-steps per frame before the remainder is taken in one go.
    pub max_substeps: u32,
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            min_step: 1e-5,
            max_halvings: 8,
            max_substeps: 256,
        }
    }
}

/// Result of covering one frame with adaptive sub-steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdaptiveOutcome {
    pub substeps: u32,
    pub simulated: f32,
    pub warnings: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default)]
pub struct AdaptiveStepper {
    pub settings: AdaptiveSettings,
    step: Option<f32>,
}

fn max_position_error(reference: &[ParticleState], particles: &[Particle]) -> f32 {
    reference
        .iter()
        .zip(particles)
        .map(|(state, particle)| state.position.distance(particle.position))
        .fold(0.0, f32::max)
}

impl AdaptiveStepper {
    pub fn new(settings: AdaptiveSettings) -> Self {
        Self {
            settings,
            step: None,
        }
    }

    /// Sub-step size that will be tried first on the next frame.
    pub fn current_step(&self) -> Option<f32> {
        self.step
    }

    pub fn reset(&mut self) {
        self.step = None;
    }

    /// Covers `dt` with error-controlled sub-steps.
    ///
    /// `after_substep` runs on every committed sub-step (boundary handling).
    pub fn advance<F>(
        &mut self,
        particles: &mut [Particle],
        solver: &Solver,
        field: &mut dyn ForceField,
        dt: f32,
        mut after_substep: F,
    ) -> AdaptiveOutcome
    where
        F: FnMut(&mut [Particle]),
    {
        let settings = self.settings;
        // Never above dt, even when dt itself is subnormal.
        let min_step = settings.min_step.max(f32::MIN_POSITIVE).min(dt);
        let mut h = self.step.unwrap_or(dt).clamp(min_step, dt);
        let mut outcome = AdaptiveOutcome::default();
        let mut remaining = dt;
        let finish = dt * 1e-6;

        while remaining > finish && outcome.substeps < settings.max_substeps {
            let start = capture(particles);
            let limited = remaining < h;
            let mut trial = h.min(remaining);
            let mut halvings = 0;

            loop {
                solver.integrate(particles, field, trial);
                let full = capture(particles);
                restore(particles, &start);
                solver.integrate(particles, field, 0.5 * trial);
                solver.integrate(particles, field, 0.5 * trial);
                let error = max_position_error(&full, particles);

                if error <= settings.tolerance {
                    if !limited {
                        h = if error < 0.25 * settings.tolerance {
                            (2.0 * trial).min(dt)
                        } else {
                            trial
                        };
                    }
                    break;
                }
                if halvings >= settings.max_halvings || 0.5 * trial < min_step {
                    warn!(
                        "adaptive step {trial:e} s left error {error:e} above tolerance {:e}",
                        settings.tolerance
                    );
                    outcome.warnings.push(Diagnostic::StabilityWarning {
                        step: trial,
                        error,
                        tolerance: settings.tolerance,
                    });
                    h = trial;
                    break;
                }
                restore(particles, &start);
                trial *= 0.5;
                halvings += 1;
                debug!("adaptive step halved to {trial:e} s (error {error:e})");
            }

            after_substep(particles);
            remaining -= trial;
            outcome.simulated += trial;
            outcome.substeps += 1;
        }

        if remaining > finish {
            warn!("adaptive sub-step budget exhausted, taking remaining {remaining:e} s at once");
            solver.integrate(particles, field, remaining);
            after_substep(particles);
            outcome.simulated += remaining;
            outcome.substeps += 1;
        }

        self.step = Some(h);
        outcome
    }
}
