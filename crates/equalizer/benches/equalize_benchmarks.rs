//! Benchmarks for the equalizer crate - histogram accumulation and full frames.
//!
//! Run with: cargo bench --package equalizer -- histogram
//! Or: cargo bench --package equalizer --bench equalize_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use equalizer::{
    AccumulationStrategy, BuilderConfig, EqualizationMapper, EqualizationPipeline,
    HistogramBuilder, Image, PipelineConfig, PixelLayout, RemapStage,
};
use rand::Rng;

/// Generate random RGB pixel data.
fn generate_rgb_image(width: u32, height: u32) -> Image {
    let mut rng = rand::thread_rng();
    let data: Vec<u8> = (0..width as usize * height as usize * 3)
        .map(|_| rng.gen())
        .collect();
    Image::from_raw(width, height, PixelLayout::Rgb8, data).unwrap()
}

/// Generate a washed-out photo-like image: smooth gradient plus mild noise,
/// squeezed into the middle of the range.
fn generate_low_contrast_image(width: u32, height: u32) -> Image {
    let mut rng = rand::thread_rng();
    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            let base = 96.0 + 64.0 * (x as f32 / width as f32 + y as f32 / height as f32) / 2.0;
            for _ in 0..3 {
                let noisy: f32 = base + rng.gen_range(-6.0..6.0);
                data.push(noisy.clamp(0.0, 255.0) as u8);
            }
        }
    }
    Image::from_raw(width, height, PixelLayout::Rgb8, data).unwrap()
}

const SIZES: [(u32, u32); 3] = [(256, 256), (1024, 1024), (3840, 2160)];

fn bench_histogram_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("histogram");

    for (width, height) in SIZES {
        let image = generate_rgb_image(width, height);
        group.throughput(Throughput::Elements(width as u64 * height as u64));

        for strategy in [
            AccumulationStrategy::Sequential,
            AccumulationStrategy::Atomic,
            AccumulationStrategy::LocalMerge,
        ] {
            let builder = HistogramBuilder::new(BuilderConfig {
                strategy,
                rows_per_task: None,
                verify: false,
            });
            group.bench_with_input(
                BenchmarkId::new(strategy.as_str(), format!("{}x{}", width, height)),
                &image,
                |b, image| b.iter(|| builder.build(black_box(&image.view())).unwrap()),
            );
        }
    }

    group.finish();
}

fn bench_mapping(c: &mut Criterion) {
    let image = generate_low_contrast_image(1024, 1024);
    let histogram = HistogramBuilder::default().build(&image.view()).unwrap();
    let mapper = EqualizationMapper::default();

    c.bench_function("mapping/3x256", |b| b.iter(|| mapper.map(black_box(&histogram))));
}

fn bench_remap(c: &mut Criterion) {
    let mut group = c.benchmark_group("remap");

    for (width, height) in SIZES {
        let image = generate_low_contrast_image(width, height);
        let histogram = HistogramBuilder::default().build(&image.view()).unwrap();
        let table = EqualizationMapper::default().map(&histogram);
        let stage = RemapStage::new();

        group.throughput(Throughput::Elements(width as u64 * height as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &image,
            |b, image| b.iter(|| stage.apply(black_box(&image.view()), &table).unwrap()),
        );
    }

    group.finish();
}

fn bench_full_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    group.sample_size(20);

    let pipeline = EqualizationPipeline::new(PipelineConfig::default()).unwrap();
    for (width, height) in SIZES {
        let image = generate_low_contrast_image(width, height);
        group.throughput(Throughput::Elements(width as u64 * height as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &image,
            |b, image| b.iter(|| pipeline.equalize(black_box(image.view())).unwrap()),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_histogram_strategies,
    bench_mapping,
    bench_remap,
    bench_full_frame
);
criterion_main!(benches);
