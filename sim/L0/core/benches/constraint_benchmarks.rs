//! Benchmarks for constraint Jacobian assembly.
//!
//! Run with: `cargo bench -p sim-core`
//!
//! Compares dense and sparse storage on hinge chains of growing length.
//! Every link carries an active bilateral limit and touches the next link,
//! so the number of rows grows with `nv` while each sparse row only holds
//! the DOFs of one or two sub-chains.

#![allow(
    missing_docs,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::ignored_unit_patterns
)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nalgebra::Vector3;
use sim_core::{ConstraintOptions, Contact, Data, Model};

/// Chain of `n` links with a contact between each pair of neighbors.
fn bench_setup(n: usize) -> (Model, Data) {
    let model = match Model::hinge_chain(n) {
        Ok(m) => m,
        Err(e) => panic!("bench model: {e}"),
    };
    let mut data = model.make_data();
    for i in 0..n {
        data.qpos[i] = 0.3 * ((i as f64) * 0.7).sin();
        data.qvel[i] = 0.1 * (i as f64).cos();
    }
    data.contacts = (1..n)
        .map(|g| Contact::new(Vector3::new(0.0, 0.0, -(g as f64)), Vector3::x(), -0.001, g - 1, g, 0.9))
        .collect();
    (model, data)
}

fn bench_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("constraint_assembly");

    for &n in &[10, 40, 120] {
        let (model, data) = bench_setup(n);
        for (label, options) in [
            ("dense", ConstraintOptions::dense()),
            ("sparse", ConstraintOptions::sparse()),
        ] {
            group.bench_with_input(BenchmarkId::new(label, n), &n, |b, _| {
                let mut data = data.clone();
                b.iter(|| {
                    data.forward_with(&model, &options).ok();
                    black_box(data.nefc)
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_assembly);
criterion_main!(benches);
