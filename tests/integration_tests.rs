use mass_spring::*;

#[test]
fn cloth_sags_under_gravity() {
    let mut system = SystemBuilder::new().build(Topology::cloth()).unwrap();
    let start: Vec<f32> = system.particles().iter().map(|p| p.position.y).collect();

    for _ in 0..30 {
        system.step(false);
    }

    for (particle, y) in system.particles().iter().zip(start) {
        if particle.fixed {
            assert_eq!(particle.position.y, y);
        } else {
            assert!(particle.position.y < y, "particle should fall, y = {}", particle.position.y);
        }
    }
}

#[test]
fn cloth_topology_counts() {
    let system = SystemBuilder::new()
        .build(Topology::Cloth {
            resolution: 3,
            size: 1.0,
        })
        .unwrap();
    assert_eq!(system.particles().len(), 9);
    // 12 structural, 8 shear, 6 bend.
    assert_eq!(system.springs().len(), 26);
    assert_eq!(system.particles().iter().filter(|p| p.fixed).count(), 2);
}

#[test]
fn hair_strands_hang_from_fixed_roots() {
    let config = SystemConfig::default().with_wall(true);
    let mut system = SystemBuilder::new()
        .with_config(config)
        .with_solver(Solver::implicit_euler())
        .build(Topology::Hair {
            strands: 3,
            segments: 4,
            length: 1.0,
        })
        .unwrap();
    assert_eq!(system.particles().len(), 15);
    assert_eq!(system.particles().iter().filter(|p| p.fixed).count(), 3);

    for _ in 0..100 {
        let report = system.step(false);
        assert!(report.diagnostics.is_empty());
    }
    for particle in system.particles() {
        assert!(particle.position.is_finite());
        assert!(particle.position.y >= 0.0);
    }
}

#[test]
fn every_solver_runs_the_default_cloth() {
    for kind in SolverKind::ALL {
        let mut system = SystemBuilder::new()
            .with_solver(kind.into())
            .build(Topology::cloth())
            .unwrap();
        for _ in 0..20 {
            system.step(false);
        }
        assert!(
            system.particles().iter().all(|p| p.position.is_finite()),
            "{kind} produced non-finite positions"
        );
    }
}

#[test]
fn adaptive_cloth_step_stays_finite() {
    let mut system = SystemBuilder::new()
        .with_config(SystemConfig::default().with_wall(true))
        .build(Topology::cloth())
        .unwrap();
    for _ in 0..10 {
        let report = system.step(true);
        assert!(report.substeps >= 1);
    }
    assert!(system.particles().iter().all(|p| p.position.y >= 0.0));
}
