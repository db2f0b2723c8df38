use criterion::{Criterion, criterion_group, criterion_main};
use smartspidy_rag::rag::{build_context, estimate_confidence};
use smartspidy_rag::search::RetrievedChunk;
use std::hint::black_box;

fn sample_chunks(count: usize) -> Vec<RetrievedChunk> {
    (0..count)
        .map(|i| {
            RetrievedChunk::new(
                i.to_string(),
                "Volunteers can create fundraisers, track donations and set reminders. ".repeat(12),
                1.0 - i as f64 * 0.01,
            )
        })
        .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let chunks = sample_chunks(20);
    c.bench_function("build_context", |b| {
        b.iter(|| build_context(black_box(&chunks)))
    });
    c.bench_function("estimate_confidence", |b| {
        b.iter(|| estimate_confidence(black_box(&chunks)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
