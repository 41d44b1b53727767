#[path = "../util/util.rs"]
mod util;

use util::bench_images;

use std::time::Duration;

use criterion::{
    criterion_group, criterion_main, measurement::WallTime, Bencher, BenchmarkId, Criterion,
    SamplingMode,
};
use medcut::{mmcq, ColorSlice, Histogram, PalettePipeline, PaletteSize, PixelFilter, Quality};

fn bench<T>(
    c: &mut Criterion,
    group: &str,
    inputs: &[(String, T)],
    mut f: impl FnMut(&mut Bencher<WallTime>, &(PaletteSize, &T)),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500));

    for (k, secs) in [
        (PaletteSize::default(), 2),
        (PaletteSize::from_clamped(64), 3),
        (PaletteSize::MAX, 4),
    ] {
        group.measurement_time(Duration::from_secs(secs));
        for (path, input) in inputs {
            group.bench_with_input(BenchmarkId::new(k.to_string(), path), &(k, input), &mut f);
        }
    }
}

fn histograms() -> Vec<(String, Histogram)> {
    bench_images()
        .iter()
        .map(|(path, image)| {
            (
                path.clone(),
                Histogram::new(
                    ColorSlice::try_from(image).unwrap(),
                    Quality::EXHAUSTIVE,
                    PixelFilter::new(),
                )
                .unwrap(),
            )
        })
        .collect()
}

fn mmcq_palette(c: &mut Criterion) {
    let histograms = histograms();
    bench(c, "mmcq_palette", &histograms, |b, &(k, histogram)| {
        b.iter(|| mmcq::palette(histogram, k))
    })
}

fn pipeline_palette_single(c: &mut Criterion) {
    bench(c, "pipeline_palette_single", bench_images(), |b, &(k, image)| {
        b.iter(|| {
            PalettePipeline::try_from(image)
                .unwrap()
                .palette_size(k)
                .palette()
        })
    })
}

fn pipeline_palette_par(c: &mut Criterion) {
    bench(c, "pipeline_palette_par", bench_images(), |b, &(k, image)| {
        b.iter(|| {
            PalettePipeline::try_from(image)
                .unwrap()
                .palette_size(k)
                .palette_par()
        })
    })
}

criterion_group!(benches, mmcq_palette, pipeline_palette_single, pipeline_palette_par);
criterion_main!(benches);
