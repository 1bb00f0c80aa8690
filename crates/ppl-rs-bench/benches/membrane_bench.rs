//! Membrane overhead benchmarks.
//!
//! Measures what every call pays before the engine does any work: the
//! global lock, status translation and handle bookkeeping.

use criterion::{Criterion, criterion_group, criterion_main};
use num_bigint::BigInt;
use ppl_rs_membrane::coefficient::{coefficient_from, read_coefficient};
use ppl_rs_membrane::kinds::PolyhedronKind;
use ppl_rs_membrane::{NativeHandle, library};
use ppl_rs_native::{PPL_TOPOLOGY_CLOSED, polyhedron_abi};

fn bench_locked_call(c: &mut Criterion) {
    c.bench_function("max_space_dimension", |b| {
        b.iter(|| {
            criterion::black_box(library::max_space_dimension().expect("call"));
        });
    });
}

fn bench_handle_churn(c: &mut Criterion) {
    c.bench_function("polyhedron_handle_churn", |b| {
        b.iter(|| {
            let h: NativeHandle<PolyhedronKind> = NativeHandle::acquire(|out| unsafe {
                polyhedron_abi::new_from_space_dimension(out, PPL_TOPOLOGY_CLOSED, 4, 0)
            })
            .expect("acquire");
            criterion::black_box(h.as_ptr());
        });
    });
}

fn bench_coefficient_round_trip(c: &mut Criterion) {
    let small = BigInt::from(42);
    let large = BigInt::from(3).pow(200);
    c.bench_function("coefficient_small", |b| {
        b.iter(|| {
            let coeff = coefficient_from(&small).expect("coefficient");
            criterion::black_box(read_coefficient(&coeff).expect("read"));
        });
    });
    c.bench_function("coefficient_large", |b| {
        b.iter(|| {
            let coeff = coefficient_from(&large).expect("coefficient");
            criterion::black_box(read_coefficient(&coeff).expect("read"));
        });
    });
}

criterion_group!(
    benches,
    bench_locked_call,
    bench_handle_churn,
    bench_coefficient_round_trip
);
criterion_main!(benches);
