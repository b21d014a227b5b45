//! Benchmarks for the phase equilibrium solvers and the batch functions.
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::arr1;
use saft_gamma::gamma_mie::{self, GammaMie};
use saft_gamma::gamma_sw::{self, GammaSw};
use saft_gamma_core::batch::{bubble_points, saturation_properties, Dispatch};
use saft_gamma_core::{PhaseEquilibrium, Residual, SolverOptions};
use std::sync::Arc;

fn vle<E: Residual>(c: &mut Criterion, group_name: &str, pure: Arc<E>, mixture: Arc<E>) {
    let options = SolverOptions::default();
    let mut group = c.benchmark_group(group_name);
    for t in [250.0, 300.0, 350.0] {
        group.bench_with_input(BenchmarkId::new("pure", t), &t, |b, &t| {
            b.iter(|| PhaseEquilibrium::pure(&pure, t, &arr1(&[1.0]), options))
        });
    }
    let x = arr1(&[0.3, 0.7]);
    group.bench_function("bubble_point", |b| {
        b.iter(|| PhaseEquilibrium::bubble_point(&mixture, 320.0, &x, None, options))
    });
    group.bench_function("dew_point", |b| {
        b.iter(|| PhaseEquilibrium::dew_point(&mixture, 320.0, &x, None, options))
    });
    group.bench_function("binary_flash", |b| {
        b.iter(|| PhaseEquilibrium::binary_flash(&mixture, 320.0, 5e4, None, options))
    });

    let temperatures: Vec<f64> = (0..20).map(|i| 250.0 + 5.0 * i as f64).collect();
    group.bench_function("saturation_properties", |b| {
        b.iter(|| {
            saturation_properties(
                &pure,
                &temperatures,
                &[arr1(&[1.0])],
                options,
                Dispatch::Serial,
            )
        })
    });
    group.bench_function("bubble_points", |b| {
        b.iter(|| {
            bubble_points(
                &mixture,
                &temperatures,
                &[x.clone()],
                options,
                Dispatch::Serial,
            )
        })
    });
}

fn gamma_sw(c: &mut Criterion) {
    let pure = Arc::new(GammaSw::new(Arc::new(gamma_sw::utils::butane().unwrap())));
    let mixture = Arc::new(GammaSw::new(Arc::new(
        gamma_sw::utils::butane_hexane().unwrap(),
    )));
    vle(c, "phase_equilibria_gamma_sw", pure, mixture);
}

fn gamma_mie(c: &mut Criterion) {
    let pure = Arc::new(GammaMie::new(Arc::new(gamma_mie::utils::butane().unwrap())));
    let mixture = Arc::new(GammaMie::new(Arc::new(
        gamma_mie::utils::butane_hexane().unwrap(),
    )));
    vle(c, "phase_equilibria_gamma_mie", pure, mixture);
}

criterion_group!(bench, gamma_sw, gamma_mie);
criterion_main!(bench);
