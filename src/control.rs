//! Command-driven control surface for hosts that drive the simulation from
//! user input.
//!
//! The host owns a [`SimulationController`] and forwards its already
//! translated input as [`Command`]s; the controller owns the
//! [`ParticleSystem`] and applies them between steps.

use std::time::Instant;

use glam::Vec3;
use log::info;

use crate::{
    builder::{SystemBuilder, Topology},
    config::{DRAG_FORCE_GAIN, FRAME_BUDGET_MS, MIN_TIME_STEP, TIME_STEP_INCREMENT},
    core::ParticleId,
    dynamics::{forces::Force, forces::ForceTargets, solver::SolverKind},
    error::Result,
    utils::{allocator::ForceId, logging::FrameBudget},
    world::{ParticleSystem, StepReport},
};

/// Simulation commands a host can issue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Starts (after a reset) or pauses stepping.
    ToggleSimulation,
    SelectSolver(SolverKind),
    ToggleWall,
    ToggleBreakableSprings,
    ToggleAdaptive,
    IncreaseTimeStep,
    DecreaseTimeStep,
    /// Creates the wind force on first use, toggles it afterwards.
    ToggleWind,
    /// Grabs the particle nearest to `target`.
    BeginDrag { target: Vec3 },
    /// Moves the point the grabbed particle is pulled toward.
    UpdateDrag { target: Vec3 },
    EndDrag,
    /// Rebuilds the system with another topology.
    SwitchTopology(Topology),
    /// Frees the system; the controller stops running.
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragGesture {
    force: ForceId,
    particle: ParticleId,
    target: Vec3,
}

#[derive(Debug)]
pub struct SimulationController {
    system: ParticleSystem,
    builder: SystemBuilder,
    simulating: bool,
    adaptive: bool,
    running: bool,
    wind: Option<ForceId>,
    drag: Option<DragGesture>,
}

impl SimulationController {
    pub fn new(builder: SystemBuilder, topology: Topology) -> Result<Self> {
        let system = builder.build(topology)?;
        Ok(Self::from_system(system, builder))
    }

    pub fn from_system(system: ParticleSystem, builder: SystemBuilder) -> Self {
        Self {
            system,
            builder,
            simulating: false,
            adaptive: false,
            running: true,
            wind: None,
            drag: None,
        }
    }

    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut ParticleSystem {
        &mut self.system
    }

    pub fn is_simulating(&self) -> bool {
        self.simulating
    }

    pub fn is_adaptive(&self) -> bool {
        self.adaptive
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn wind(&self) -> Option<ForceId> {
        self.wind
    }

    /// Particle currently grabbed by a drag gesture.
    pub fn dragged_particle(&self) -> Option<ParticleId> {
        self.drag.map(|gesture| gesture.particle)
    }

    pub fn handle(&mut self, command: Command) -> Result<()> {
        match command {
            Command::ToggleSimulation => {
                self.simulating = !self.simulating;
                if self.simulating {
                    self.reset();
                }
            }
            Command::SelectSolver(kind) => self.system.set_solver(kind.into()),
            Command::ToggleWall => {
                let config = self.system.config_mut();
                config.wall_exists = !config.wall_exists;
                info!("Wall {}", if config.wall_exists { "on" } else { "off" });
            }
            Command::ToggleBreakableSprings => {
                let config = self.system.config_mut();
                config.springs_can_break = !config.springs_can_break;
                if config.springs_can_break {
                    info!("Springs can now break");
                } else {
                    info!("Springs can no longer break");
                }
            }
            Command::ToggleAdaptive => {
                self.adaptive = !self.adaptive;
                info!("Adaptive {}", if self.adaptive { "on" } else { "off" });
            }
            Command::IncreaseTimeStep => {
                let config = self.system.config_mut();
                config.dt += TIME_STEP_INCREMENT;
                info!("Increase dt: {}", config.dt);
            }
            Command::DecreaseTimeStep => {
                let config = self.system.config_mut();
                config.dt = (config.dt - TIME_STEP_INCREMENT).max(MIN_TIME_STEP);
                info!("Decrease dt: {}", config.dt);
            }
            Command::ToggleWind => self.toggle_wind()?,
            Command::BeginDrag { target } => self.begin_drag(target)?,
            Command::UpdateDrag { target } => {
                if let Some(gesture) = self.drag.as_mut() {
                    gesture.target = target;
                }
                self.refresh_drag();
            }
            Command::EndDrag => {
                if let Some(gesture) = self.drag {
                    if let Some(force) = self.system.force_mut(gesture.force) {
                        force.set_active(false);
                    }
                }
            }
            Command::SwitchTopology(topology) => {
                self.system = self.builder.build(topology)?;
                self.wind = None;
                self.drag = None;
                info!("Switched to {}", topology.name());
            }
            Command::Quit => {
                self.system.free();
                self.wind = None;
                self.drag = None;
                self.simulating = false;
                self.running = false;
            }
        }
        Ok(())
    }

    /// Steps the system once if the simulation is running.
    pub fn tick(&mut self) -> Option<StepReport> {
        if !(self.running && self.simulating) {
            return None;
        }
        self.refresh_drag();
        let started = Instant::now();
        let report = self.system.step(self.adaptive);
        FrameBudget::from_millis(FRAME_BUDGET_MS).check(started.elapsed(), report.substeps);
        Some(report)
    }

    fn reset(&mut self) {
        self.system.reset();
        // Transient forces are gone after a reset.
        self.drag = None;
    }

    fn toggle_wind(&mut self) -> Result<()> {
        match self.wind {
            Some(id) => {
                let active = self.system.toggle_force(id)?;
                info!("wind {}", if active { "active" } else { "not active" });
            }
            None => {
                self.wind = Some(self.system.add_force(Force::wind())?);
                info!("wind created");
            }
        }
        Ok(())
    }

    fn begin_drag(&mut self, target: Vec3) -> Result<()> {
        let Some(particle) = self.system.nearest_particle(target) else {
            return Ok(());
        };
        let existing = self
            .drag
            .map(|gesture| gesture.force)
            .filter(|id| self.system.force(*id).is_some());
        let force = match existing {
            Some(id) => {
                if let Some(force) = self.system.force_mut(id) {
                    force.set_targets(ForceTargets::single(particle));
                    force.set_active(true);
                }
                id
            }
            None => self.system.add_force(Force::mouse_drag(particle))?,
        };
        self.drag = Some(DragGesture {
            force,
            particle,
            target,
        });
        self.refresh_drag();
        Ok(())
    }

    /// Points the drag force from the grabbed particle toward the gesture target.
    fn refresh_drag(&mut self) {
        let Some(gesture) = self.drag else {
            return;
        };
        let Some(position) = self.system.particle(gesture.particle).map(|p| p.position) else {
            return;
        };
        if let Some(force) = self.system.force_mut(gesture.force) {
            if force.is_active() {
                force.set_direction(DRAG_FORCE_GAIN * (gesture.target - position));
            }
        }
    }
}
