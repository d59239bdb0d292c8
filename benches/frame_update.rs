//! Per-frame CPU cost of a mounted preview: animation, particle drift, camera and scene
//! extraction. No GPU work is involved.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use foldcard::{CardConfiguration, CardFormat, CardPreview, InputEvent, PreviewSettings};
use foldcard_test_scenes::bifold_new_year;

fn mounted(format: CardFormat, particles: usize) -> CardPreview {
    let config = bifold_new_year();
    CardPreview::mount(
        CardConfiguration::new(config.image, config.theme, format),
        PreviewSettings::default().with_particle_count(particles),
        || {},
    )
    .expect("canonical configurations always build")
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    for format in CardFormat::ALL {
        group.bench_with_input(BenchmarkId::new("folding", format), &format, |b, format| {
            let mut preview = mounted(*format, 500);
            preview.handle_input(InputEvent::Toggle);
            let mut elapsed = 0.0f32;
            b.iter(|| {
                elapsed += 1.0 / 60.0;
                let snapshot = preview.frame(elapsed);
                black_box(snapshot.map(|frame| frame.draws.len()))
            });
        });
    }
    group.finish();
}

fn bench_particles(c: &mut Criterion) {
    let mut group = c.benchmark_group("particles");
    for count in [0usize, 500, 5_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, count| {
            let mut preview = mounted(CardFormat::Bifold, *count);
            let mut elapsed = 0.0f32;
            b.iter(|| {
                elapsed += 1.0 / 60.0;
                black_box(preview.frame(elapsed).is_some())
            });
        });
    }
    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    c.bench_function("set_format", |b| {
        let mut preview = mounted(CardFormat::Bifold, 0);
        let mut quad = false;
        b.iter(|| {
            quad = !quad;
            let format = if quad {
                CardFormat::Quadfold
            } else {
                CardFormat::Bifold
            };
            black_box(preview.set_format(format).is_ok())
        });
    });
}

criterion_group!(benches, bench_frame, bench_particles, bench_rebuild);
criterion_main!(benches);
