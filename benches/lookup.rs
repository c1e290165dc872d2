//! Rate lookup and channel stepping benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use channel_kinetics::{ChannelId, ChannelParameters, RateFormula, RateTable};

fn squid_table(id: ChannelId) -> RateTable {
    let mut gate = RateTable::new(id);
    let parms = [
        1.0, 0.0, 1.0, 0.05, -0.01, // alpha
        1.0, 0.0, 1.0, -0.05, 0.01, // beta
        3000.0, -0.1, 0.05,
    ];
    gate.setup_alpha(id, &parms).unwrap();
    gate
}

fn bench_table_lookup(c: &mut Criterion) {
    let id = ChannelId::next();
    let gate = squid_table(id);

    c.bench_function("table_lookup", |b| {
        b.iter(|| gate.lookup_both(black_box(-0.042)))
    });
}

fn bench_formula_eval(c: &mut Criterion) {
    let id = ChannelId::next();
    let mut gate = RateFormula::new(id);
    gate.set_alpha(id, "1 / (1 + exp(-(v + 0.05) / 0.01))")
        .unwrap();
    gate.set_beta(id, "1 / (1 + exp((v - 0.05) / 0.01))")
        .unwrap();

    c.bench_function("formula_eval", |b| {
        b.iter(|| gate.lookup_both(black_box(-0.042)))
    });
}

fn bench_channel_step(c: &mut Criterion) {
    let mut chan = ChannelParameters::default().build().unwrap();
    chan.set_vm(-0.065);
    chan.reinit();
    chan.set_vm(-0.02);

    c.bench_function("channel_step", |b| {
        b.iter(|| chan.process(black_box(25e-6)))
    });
}

criterion_group!(
    benches,
    bench_table_lookup,
    bench_formula_eval,
    bench_channel_step
);
criterion_main!(benches);
