//! Benchmarks for the per-frame passes.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use driftfield::{DrawSurface, FieldSettings, ImageSurface, ParticleField, Pointer, Rgba, SurfaceDimensions, Vec2};

const SURFACE: SurfaceDimensions = SurfaceDimensions::new(1280.0, 480.0);

/// Counts draw calls and throws them away.
#[derive(Default)]
struct Sink {
    calls: usize,
}

impl DrawSurface for Sink {
    fn clear_rect(&mut self, _x: f32, _y: f32, _width: f32, _height: f32) {
        self.calls += 1;
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, _color: Rgba) {
        black_box((center, radius));
        self.calls += 1;
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, _width: f32, _color: Rgba) {
        black_box((from, to));
        self.calls += 1;
    }
}

fn seeded_field(count: usize) -> ParticleField {
    let mut field = ParticleField::with_seed(FieldSettings::default().with_particle_count(count), 7);
    field.reseed(SURFACE, SURFACE.width);
    field
}

fn bench_draw_links(c: &mut Criterion) {
    let mut group = c.benchmark_group("draw_links");

    for count in [40, 80, 160, 320, 640] {
        let field = seeded_field(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &field, |b, field| {
            b.iter(|| {
                let mut sink = Sink::default();
                field.draw_links(&mut sink);
                black_box(sink.calls)
            })
        });
    }

    group.finish();
}

fn bench_full_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    let pointer = Pointer {
        position: Vec2::new(640.0, 240.0),
        radius: 150.0,
    };

    for count in [80, 320] {
        let mut field = seeded_field(count);
        group.bench_function(BenchmarkId::new("recorded", count), |b| {
            b.iter(|| {
                let mut sink = Sink::default();
                sink.clear_rect(0.0, 0.0, SURFACE.width, SURFACE.height);
                field.update_all(Some(&pointer), &mut sink);
                field.draw_links(&mut sink);
                field.draw_pointer_links(Some(&pointer), &mut sink);
                black_box(sink.calls)
            })
        });
    }

    let mut field = seeded_field(80);
    let mut surface = ImageSurface::new(1280, 480, Rgba::rgb(15, 23, 42));
    group.bench_function("raster_80", |b| {
        b.iter(|| {
            surface.clear_rect(0.0, 0.0, SURFACE.width, SURFACE.height);
            field.update_all(Some(&pointer), &mut surface);
            field.draw_links(&mut surface);
            field.draw_pointer_links(Some(&pointer), &mut surface);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_draw_links, bench_full_frame);
criterion_main!(benches);
