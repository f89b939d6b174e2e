//! Benchmarks for region detection and text splicing.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic page rasters and text.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, Rgb, RgbImage};
use pagesplice::{splice_text, BoundingBox, RegionClassifier, RegionDetector, Splice};

/// Creates a white page with a grid of dark rectangles of mixed sizes.
fn create_test_page(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let mut boxes = Vec::new();

    // Word-sized specks in rows
    for row in 0..(height / 40) {
        for col in 0..(width / 60) {
            boxes.push(BoundingBox::new(col * 60 + 5, row * 40 + 5, 40, 12));
        }
    }
    // A few equation and figure sized regions
    boxes.push(BoundingBox::new(50, 100, 120, 30));
    boxes.push(BoundingBox::new(50, 400, 400, 250));

    for b in boxes {
        for y in b.y..b.bottom().min(height) {
            for x in b.x..b.right().min(width) {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
    }
    DynamicImage::ImageRgb8(img)
}

/// Creates page text with `count` equation snippets spread through prose.
fn create_test_text(count: usize) -> (String, Vec<Splice>) {
    let mut text = String::new();
    let mut splices = Vec::with_capacity(count);
    for i in 0..count {
        text.push_str("Lorem ipsum dolor sit amet, consectetur adipiscing elit. ");
        text.push_str(&format!("x_{} = y^{} ", i, i));
        splices.push(Splice::new(
            format!("x_{} = y^{}", i, i),
            format!("$x_{{{}}} = y^{{{}}}$", i, i),
        ));
    }
    (text, splices)
}

/// Benchmark splicing at various region counts.
fn bench_splice_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("splice_text");

    for count in [1, 10, 100].iter() {
        let (text, splices) = create_test_text(*count);

        group.bench_function(format!("{}_regions", count), |b| {
            b.iter(|| splice_text(black_box(&text), black_box(&splices)));
        });
    }

    group.finish();
}

/// Benchmark detection and classification on a page raster.
fn bench_detection(c: &mut Criterion) {
    let page = create_test_page(1240, 1754);
    let detector = RegionDetector::new();
    let classifier = RegionClassifier::new();

    c.bench_function("detect_a4_150dpi", |b| {
        b.iter(|| detector.detect(black_box(&page)));
    });

    c.bench_function("detect_and_classify_a4_150dpi", |b| {
        b.iter(|| classifier.classify_all(detector.detect(black_box(&page))));
    });
}

criterion_group!(benches, bench_splice_text, bench_detection);
criterion_main!(benches);
