use approx::assert_relative_eq;
use mass_spring::*;

fn breakable() -> ParticleSystem {
    let config = SystemConfig::default()
        .with_breakable_springs(true)
        .with_break_threshold(0.5);
    let mut system = ParticleSystem::new(config);
    let a = system.add_particle(Particle::fixed(Vec3::ZERO, 1.0).unwrap());
    let b = system.add_particle(Particle::fixed(Vec3::new(1.5, 0.0, 0.0), 1.0).unwrap());
    system
        .add_spring(Spring::new(a, b, 1.0, 100.0, 0.0).unwrap())
        .unwrap();
    system
}

#[test]
fn spring_breaks_only_past_the_threshold() {
    let mut system = breakable();

    // Extension equal to rest * threshold is still allowed.
    let report = system.step(false);
    assert!(report.broken_springs.is_empty());
    assert!(!system.springs()[0].is_broken());

    system.particle_mut(ParticleId(1)).unwrap().position.x = 1.51;
    let report = system.step(false);
    assert_eq!(report.broken_springs, vec![SpringId(0)]);
    assert!(system.springs()[0].is_broken());

    // Stays broken and reports the transition only once.
    let report = system.step(false);
    assert!(report.broken_springs.is_empty());
}

#[test]
fn broken_spring_exerts_no_force_even_when_shortened() {
    let mut system = breakable();
    system.particle_mut(ParticleId(1)).unwrap().position.x = 2.0;
    system.step(false);
    assert!(system.springs()[0].is_broken());

    let particle = system.particle_mut(ParticleId(1)).unwrap();
    particle.position.x = 0.5;
    particle.unpin();
    for _ in 0..10 {
        system.step(false);
    }
    let particle = system.particle(ParticleId(1)).unwrap();
    assert_eq!(particle.velocity, Vec3::ZERO);
    assert_relative_eq!(particle.position.x, 0.5);
    assert_eq!(
        system.springs()[0].compute_force(system.particles()),
        SpringEvaluation::Broken
    );
}

#[test]
fn springs_do_not_break_when_breaking_is_disabled() {
    let mut system = breakable();
    system.config_mut().springs_can_break = false;
    system.particle_mut(ParticleId(1)).unwrap().position.x = 3.0;
    let report = system.step(false);
    assert!(report.broken_springs.is_empty());
    assert!(!system.springs()[0].is_broken());
}

#[test]
fn reset_restores_seeded_state() {
    let mut system = SystemBuilder::new()
        .with_config(
            SystemConfig::default()
                .with_breakable_springs(true)
                .with_break_threshold(0.01),
        )
        .build(Topology::cloth())
        .unwrap();
    let wind = system.add_force(Force::wind()).unwrap();
    let grab = system
        .add_force(Force::mouse_drag(ParticleId(5)).transient())
        .unwrap();

    for _ in 0..50 {
        system.step(false);
    }
    assert!(system.springs().iter().any(Spring::is_broken));
    assert!(system.time() > 0.0);

    system.reset();

    for particle in system.particles() {
        assert_eq!(particle.position, particle.start_position);
        assert_eq!(particle.velocity, Vec3::ZERO);
    }
    assert!(system.springs().iter().all(|s| !s.is_broken()));
    assert!(system.force(grab).is_none());
    assert!(system.force(wind).is_some());
    assert_eq!(system.time(), 0.0);
}

#[test]
fn toggling_a_force_twice_is_a_no_op() {
    let build = || {
        let mut system = ParticleSystem::new(SystemConfig::default());
        let p = system.add_particle(Particle::new(Vec3::ZERO, 1.0).unwrap());
        let id = system
            .add_force(Force::directional(
                ForceTargets::single(p),
                Vec3::new(2.0, 0.0, 0.0),
            ))
            .unwrap();
        (system, id)
    };

    let (mut reference, _) = build();
    let (mut toggled, id) = build();
    assert!(!toggled.toggle_force(id).unwrap());
    assert!(toggled.toggle_force(id).unwrap());

    for _ in 0..5 {
        reference.step(false);
        toggled.step(false);
    }
    assert_eq!(reference.particles()[0].position, toggled.particles()[0].position);
    assert!(reference.particles()[0].velocity.x > 0.0);
}

#[test]
fn removed_force_no_longer_contributes() {
    let mut system = ParticleSystem::new(SystemConfig::default());
    system.add_particle(Particle::new(Vec3::ZERO, 1.0).unwrap());
    let gravity = system.add_force(Force::gravity(Vec3::new(0.0, -9.81, 0.0))).unwrap();
    system.step(false);
    let velocity = system.particles()[0].velocity;
    assert!(velocity.y < 0.0);

    system.remove_force(gravity).unwrap();
    system.step(false);
    assert_eq!(system.particles()[0].velocity, velocity);

    assert!(matches!(
        system.remove_force(gravity),
        Err(SimError::UnknownForce(id)) if id == gravity
    ));
    assert!(system.toggle_force(gravity).is_err());
}

#[test]
fn inactive_drag_does_not_slow_particles() {
    let mut system = ParticleSystem::new(SystemConfig::default());
    system.add_particle(Particle::new(Vec3::ZERO, 1.0).unwrap().with_velocity(Vec3::X));
    let drag = system.add_force(Force::drag(0.5).unwrap()).unwrap();
    system.step(false);
    assert!(system.particles()[0].velocity.x < 1.0);

    system.toggle_force(drag).unwrap();
    let before = system.particles()[0].velocity;
    system.step(false);
    assert_eq!(system.particles()[0].velocity, before);
}

#[test]
fn hanging_chain_never_sinks_below_the_wall() {
    for kind in SolverKind::ALL {
        let config = SystemConfig::default().with_wall(true).with_floor_height(0.0);
        let mut system = ParticleSystem::new(config).with_solver(kind.into());
        let root = system.add_particle(Particle::fixed(Vec3::new(0.0, 0.5, 0.0), 1.0).unwrap());
        let mid = system.add_particle(Particle::new(Vec3::new(0.5, 0.5, 0.0), 1.0).unwrap());
        let tip = system.add_particle(Particle::new(Vec3::new(1.0, 0.5, 0.0), 1.0).unwrap());
        system.connect(root, mid, 100.0, 2.0).unwrap();
        system.connect(mid, tip, 100.0, 2.0).unwrap();
        system.add_force(Force::gravity(Vec3::new(0.0, -9.81, 0.0))).unwrap();

        let mut touched = false;
        for _ in 0..300 {
            system.step(false);
            for particle in system.particles() {
                assert!(particle.position.y >= 0.0, "{kind}: {}", particle.position);
            }
            touched |= system.particles()[2].position.y == 0.0;
        }
        assert!(touched, "{kind}: the chain never reached the floor");
    }
}

#[test]
fn adaptive_step_covers_the_full_timestep() {
    let mut system = ParticleSystem::new(SystemConfig::default().with_time_step(0.01));
    system.add_particle(Particle::new(Vec3::Y, 1.0).unwrap());
    system.add_force(Force::gravity(Vec3::new(0.0, -9.81, 0.0))).unwrap();

    let report = system.step(true);
    assert!(report.substeps >= 2, "substeps {}", report.substeps);
    assert!(!report.has_stability_warning());
    assert_relative_eq!(system.time(), 0.01);

    // Approaches the analytic free fall as the sub-steps shrink.
    let expected = 1.0 - 0.5 * 9.81 * 0.01 * 0.01;
    assert_relative_eq!(system.particles()[0].position.y, expected, epsilon = 5e-4);
}

#[test]
fn unreachable_tolerance_emits_a_stability_warning() {
    let adaptive = AdaptiveSettings {
        tolerance: 1e-12,
        min_step: 1e-4,
        max_halvings: 3,
        max_substeps: 16,
    };
    let mut system = ParticleSystem::new(SystemConfig::default().with_adaptive(adaptive))
        .with_solver(Solver::explicit_euler());
    let a = system.add_particle(Particle::fixed(Vec3::ZERO, 1.0).unwrap());
    let b = system.add_particle(Particle::new(Vec3::new(1.5, 0.0, 0.0), 1.0).unwrap());
    system
        .add_spring(Spring::new(a, b, 1.0, 1000.0, 0.0).unwrap())
        .unwrap();

    let report = system.advance(0.01, true);
    assert!(report.has_stability_warning());
    assert!(report.substeps <= adaptive.max_substeps + 1);
    assert_relative_eq!(system.time(), 0.01);
    assert!(system.particles()[1].position.is_finite());
}

#[test]
fn coincident_endpoints_are_reported_not_propagated() {
    let mut system = ParticleSystem::new(SystemConfig::default());
    let a = system.add_particle(Particle::new(Vec3::ONE, 1.0).unwrap());
    let b = system.add_particle(Particle::new(Vec3::ONE, 1.0).unwrap());
    system.connect(a, b, 50.0, 1.0).unwrap();

    let report = system.step(false);
    assert!(report
        .diagnostics
        .contains(&Diagnostic::DegenerateGeometry { spring: SpringId(0) }));
    for particle in system.particles() {
        assert!(particle.position.is_finite());
        assert!(particle.velocity.is_finite());
    }
}

#[test]
fn invalid_parameters_are_rejected() {
    assert!(Particle::new(Vec3::ZERO, 0.0).is_err());
    assert!(Particle::new(Vec3::ZERO, -1.0).is_err());
    assert!(Particle::new(Vec3::ZERO, f32::NAN).is_err());

    let (a, b) = (ParticleId(0), ParticleId(1));
    assert!(Spring::new(a, b, -1.0, 10.0, 0.0).is_err());
    assert!(Spring::new(a, b, 1.0, 0.0, 0.0).is_err());
    assert!(Spring::new(a, b, 1.0, 10.0, -0.1).is_err());
    assert!(matches!(
        Spring::new(a, a, 1.0, 10.0, 0.0),
        Err(SimError::SelfLoop(_))
    ));
    assert!(Force::drag(-1.0).is_err());

    let mut system = ParticleSystem::new(SystemConfig::default());
    system.add_particle(Particle::new(Vec3::ZERO, 1.0).unwrap());
    assert!(matches!(
        system.connect(a, b, 10.0, 0.0),
        Err(SimError::ParticleOutOfBounds { index: 1, count: 1 })
    ));
    assert!(system
        .add_force(Force::directional(ForceTargets::single(ParticleId(3)), Vec3::X))
        .is_err());
}

#[test]
fn non_positive_timestep_is_ignored() {
    let mut system = ParticleSystem::new(SystemConfig::default());
    system.add_particle(Particle::new(Vec3::ZERO, 1.0).unwrap().with_velocity(Vec3::X));
    let report = system.advance(0.0, false);
    assert_eq!(report.substeps, 0);
    let report = system.advance(-0.01, true);
    assert_eq!(report.substeps, 0);
    assert_eq!(system.particles()[0].position, Vec3::ZERO);
    assert_eq!(system.time(), 0.0);
}

#[test]
fn freed_system_steps_as_a_no_op() {
    let mut system = SystemBuilder::new().build(Topology::hair()).unwrap();
    assert!(!system.is_empty());
    system.free();
    assert!(system.is_empty());
    assert!(system.springs().is_empty());
    assert_eq!(system.forces().count(), 0);
    let report = system.step(false);
    assert_eq!(report.substeps, 0);
}

#[test]
fn energy_is_split_between_motion_and_springs() {
    let mut system = ParticleSystem::new(SystemConfig::default());
    let a = system.add_particle(Particle::fixed(Vec3::ZERO, 1.0).unwrap());
    let b = system.add_particle(
        Particle::new(Vec3::new(1.5, 0.0, 0.0), 2.0)
            .unwrap()
            .with_velocity(Vec3::Y),
    );
    system
        .add_spring(Spring::new(a, b, 1.0, 50.0, 0.0).unwrap())
        .unwrap();
    assert_relative_eq!(system.kinetic_energy(), 1.0);
    assert_relative_eq!(system.potential_energy(), 6.25);
    assert_relative_eq!(system.total_energy(), 7.25);
}

#[test]
fn connect_rests_at_the_current_separation() {
    let mut system = ParticleSystem::new(SystemConfig::default());
    let a = system.add_particle(Particle::fixed(Vec3::ZERO, 1.0).unwrap());
    let b = system.add_particle(Particle::new(Vec3::new(1.5, 0.0, 0.0), 1.0).unwrap());
    let spring = system.connect(a, b, 100.0, 0.0).unwrap();
    assert_relative_eq!(system.spring(spring).unwrap().rest_length(), 1.5);
    assert_relative_eq!(system.potential_energy(), 0.0);
}

#[test]
fn subnormal_adaptive_timestep_is_taken_without_panicking() {
    let mut system = ParticleSystem::new(SystemConfig::default());
    system.add_particle(Particle::new(Vec3::ZERO, 1.0).unwrap().with_velocity(Vec3::X));
    let dt = 1e-40_f32;
    assert!(dt > 0.0 && dt < f32::MIN_POSITIVE);

    let report = system.advance(dt, true);
    assert!(report.substeps >= 1);
    assert!(!report.has_stability_warning());
    assert!(system.particles()[0].position.is_finite());

    // The stepper recovers a normal sub-step size on the next frame.
    let report = system.advance(0.01, true);
    assert!(report.substeps >= 1);
    assert_relative_eq!(system.particles()[0].position.x, 0.01, epsilon = 1e-6);
}
