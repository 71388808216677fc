use criterion::{black_box, criterion_group, criterion_main, Criterion};

use timed_links::utils::{generate_code, CodeFormat};

fn bench_generate_code(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_code");
    group.bench_function("compact", |b| {
        b.iter(|| generate_code(black_box(CodeFormat::Compact)))
    });
    group.bench_function("separated", |b| {
        b.iter(|| generate_code(black_box(CodeFormat::Separated('-'))))
    });
    group.finish();
}

criterion_group!(benches, bench_generate_code);
criterion_main!(benches);
