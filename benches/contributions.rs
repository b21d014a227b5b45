//! Benchmarks for the evaluation of the residual Helmholtz energy
//! for different types of dual numbers.
//! These should give an idea about the expected slow-down depending
//! on the derivative that is computed, without the overhead of the
//! `State` creation.
use criterion::{criterion_group, criterion_main, Criterion};
use ndarray::arr1;
use num_dual::{Dual2_64, Dual64, DualNum, HyperDual64};
use saft_gamma::gamma_mie::{self, GammaMie};
use saft_gamma::gamma_sw::{self, GammaSw};
use saft_gamma_core::{CompositionVariables, Residual};
use std::sync::Arc;

fn a_res<D: DualNum<f64> + Copy, E: Residual>(
    eos: &E,
    temperature: D,
    density: D,
    composition: &CompositionVariables<D>,
) -> D {
    eos.residual_helmholtz_energy(temperature, density, composition)
}

/// Benchmark of one model at a liquid-like state point.
fn bench_dual_numbers<E: Residual>(c: &mut Criterion, group_name: &str, eos: &E, density: f64) {
    let x = arr1(&[0.5, 0.5]);
    let composition = eos.composition(&x).unwrap();
    let t = 300.0;
    let mut group = c.benchmark_group(group_name);
    group.bench_function("a_f64", |b| {
        b.iter(|| a_res(eos, t, density, composition.as_ref()))
    });

    let c_dual = composition.lift::<Dual64>();
    let rho = Dual64::from_re(density).derivative();
    group.bench_function("a_dual", |b| {
        b.iter(|| a_res(eos, Dual64::from_re(t), rho, &c_dual))
    });

    let c_dual2 = composition.lift::<Dual2_64>();
    let rho = Dual2_64::from_re(density).derivative();
    group.bench_function("a_dual2", |b| {
        b.iter(|| a_res(eos, Dual2_64::from_re(t), rho, &c_dual2))
    });

    let c_hyperdual = composition.lift::<HyperDual64>();
    let t_hd = HyperDual64::from_re(t).derivative1();
    let rho = HyperDual64::from_re(density).derivative2();
    group.bench_function("a_hyperdual", |b| {
        b.iter(|| a_res(eos, t_hd, rho, &c_hyperdual))
    });
}

fn gamma_sw(c: &mut Criterion) {
    let eos = GammaSw::new(Arc::new(gamma_sw::utils::butane_hexane().unwrap()));
    bench_dual_numbers(c, "dual_numbers_gamma_sw_butane_hexane", &eos, 7000.0);
}

fn gamma_mie(c: &mut Criterion) {
    let eos = GammaMie::new(Arc::new(gamma_mie::utils::butane_hexane().unwrap()));
    bench_dual_numbers(c, "dual_numbers_gamma_mie_butane_hexane", &eos, 7000.0);

    let x = arr1(&[0.5, 0.5]);
    let rho = [1000.0, 3000.0, 5000.0, 7000.0];
    let mut group = c.benchmark_group("gamma_mie_terms");
    group.bench_function("hs_diameter", |b| b.iter(|| eos.hs_diameter(300.0)));
    group.bench_function("a_monomer", |b| b.iter(|| eos.a_monomer(rho, 300.0, &x)));
    group.bench_function("a_chain", |b| b.iter(|| eos.a_chain(rho, 300.0, &x)));
}

criterion_group!(bench, gamma_sw, gamma_mie);
criterion_main!(bench);
