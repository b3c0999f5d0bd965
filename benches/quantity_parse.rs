use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ingredient_canon::error::RowReport;
use ingredient_canon::quantity::parse_quantity;

fn syntax_variety(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantity syntax variety");

    let input = black_box(vec![
        "2",
        "2.5",
        "1/2",
        "\u{215B}",
        "1 1/2",
        "1-1/2",
        "1\u{00BD}",
        "1-2",
        "1 to 2",
        "~2",
        "about 2 1/2",
        "1,234",
        "two",
    ]);

    group.bench_function("parse_quantity", |b| {
        b.iter(|| {
            for s in &input {
                let mut report = RowReport::new();
                black_box(parse_quantity(Some(s), &mut report));
            }
        })
    });
}

criterion_group!(benches, syntax_variety);
criterion_main!(benches);
