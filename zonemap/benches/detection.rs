use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use common::CancelToken;
use raster::{PixelBuffer, Rect, Rgba};
use zonemap::{DetectionConfig, Palette, ScanJob, detect_blocks};

/// 1200x900 map with a grid of zone blocks in every default palette color.
fn synthetic_map() -> PixelBuffer {
    let colors = [
        Rgba::new(239, 68, 68, 255),
        Rgba::new(34, 197, 94, 255),
        Rgba::new(168, 85, 247, 255),
        Rgba::new(59, 130, 246, 255),
    ];
    let mut image = PixelBuffer::new_filled(1200, 900, Rgba::WHITE);
    for row in 0..6u32 {
        for col in 0..8u32 {
            let color = colors[((row + col) % colors.len() as u32) as usize];
            image.fill_rect(Rect::new(20 + col * 145, 20 + row * 145, 120, 120), color);
        }
    }
    image
}

fn bench_detection(c: &mut Criterion) {
    let image = synthetic_map();
    let palette = Palette::default();
    let config = DetectionConfig::default();

    c.bench_function("detect_blocks_1200x900", |b| {
        b.iter(|| {
            let blocks = detect_blocks(black_box(&image), &palette, &config)
                .expect("detection failed on the synthetic map");
            black_box(blocks);
        })
    });

    c.bench_function("scan_job_first_chunk", |b| {
        b.iter(|| {
            let mut job = ScanJob::new(&image, palette.clone(), config.clone(), CancelToken::new())
                .expect("invalid scan job");
            black_box(job.run_chunk().expect("chunk failed"));
        })
    });
}

criterion_group!(benches, bench_detection);
criterion_main!(benches);
