use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ingredient_canon::convert::convert;
use ingredient_canon::dimension::{BridgeRequired, CanonicalUnit};
use ingredient_canon::units::UnitEnum;

fn direct_conversions(c: &mut Criterion) {
    let mut group = c.benchmark_group("direct unit conversions");

    let input = black_box(vec![
        (CanonicalUnit::G, BridgeRequired::None, UnitEnum::Oz),
        (CanonicalUnit::G, BridgeRequired::None, UnitEnum::Lb),
        (CanonicalUnit::Ml, BridgeRequired::None, UnitEnum::Cup),
        (CanonicalUnit::Ml, BridgeRequired::None, UnitEnum::Tsp),
    ]);

    group.bench_function("mass-and-volume", |b| {
        b.iter(|| {
            for (unit, bridge, source) in &input {
                black_box(convert(Some(*unit), *bridge, Some(*source), None, Some(1.0), Some(2.0)));
            }
        })
    });
}

fn density_bridged_conversions(c: &mut Criterion) {
    let mut group = c.benchmark_group("density-bridged conversions");

    group.bench_function("vol-to-mass", |b| {
        b.iter(|| {
            black_box(convert(
                Some(CanonicalUnit::G),
                BridgeRequired::VolToMass,
                Some(UnitEnum::Cup),
                Some(0.528),
                Some(1.0),
                Some(1.0),
            ));
        })
    });
}

criterion_group!(benches, direct_conversions, density_bridged_conversions);
criterion_main!(benches);
