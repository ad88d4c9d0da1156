use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mass_spring::*;
use std::hint::black_box;

const DT: f32 = 0.01;

fn prepare_cloth(resolution: usize, kind: SolverKind) -> ParticleSystem {
    SystemBuilder::new()
        .with_config(SystemConfig::default().with_time_step(DT).with_wall(true))
        .with_solver(kind.into())
        .build(Topology::Cloth {
            resolution,
            size: 1.0,
        })
        .unwrap()
}

fn bench_cloth_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("cloth_step");
    for &resolution in &[10usize, 20, 40] {
        for kind in SolverKind::ALL {
            group.bench_with_input(
                BenchmarkId::new(kind.name(), resolution),
                &resolution,
                |b, &resolution| {
                    let mut system = prepare_cloth(resolution, kind);
                    b.iter(|| {
                        black_box(system.advance(black_box(DT), false));
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_adaptive_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("adaptive_step");
    for kind in [SolverKind::SemiImplicitEuler, SolverKind::RungeKutta4] {
        group.bench_function(kind.name(), |b| {
            let mut system = prepare_cloth(20, kind);
            b.iter(|| {
                black_box(system.advance(black_box(DT), true));
            })
        });
    }
    group.finish();
}

fn bench_hair_step(c: &mut Criterion) {
    c.bench_function("hair_implicit_step", |b| {
        let mut system = SystemBuilder::new()
            .with_solver(Solver::implicit_euler())
            .build(Topology::Hair {
                strands: 32,
                segments: 24,
                length: 1.0,
            })
            .unwrap();
        b.iter(|| {
            black_box(system.step(false));
        })
    });
}

criterion_group!(benches, bench_cloth_step, bench_adaptive_step, bench_hair_step);
criterion_main!(benches);
