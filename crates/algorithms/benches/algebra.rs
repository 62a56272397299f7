//! Benchmarks for the LST algebra stages

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use landtherm_algorithms::imagery::{evaluate, Formula, Operand};
use landtherm_core::{GeoTransform, RasterGrid};

fn create_band(size: usize, base: f64) -> RasterGrid {
    let mut r = RasterGrid::new(size, size);
    r.set_transform(GeoTransform::new(0.0, size as f64 * 30.0, 30.0, -30.0));
    for row in 0..size {
        for col in 0..size {
            let v = base + ((row * 7 + col * 13) % 2000) as f64;
            r.set(row, col, v).unwrap();
        }
    }
    r
}

fn bench_reflectance(c: &mut Criterion) {
    let mut group = c.benchmark_group("algebra/reflectance");
    let formula = Formula::Reflectance {
        mult: 2.0e-5,
        add: -0.1,
        sun_elevation: 0.9,
    };
    for size in [256, 512, 1024, 2048] {
        let band = create_band(size, 8_000.0);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                evaluate(black_box(&formula), &[Operand::new("b4", black_box(&band))]).unwrap()
            })
        });
    }
    group.finish();
}

fn bench_emissivity(c: &mut Criterion) {
    let mut group = c.benchmark_group("algebra/emissivity");
    let formula = Formula::emissivity(0.6);
    for size in [256, 512, 1024, 2048] {
        let rifl5 = create_band(size, 0.3);
        let rifl4 = create_band(size, 0.1);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                evaluate(
                    black_box(&formula),
                    &[Operand::new("rifl5", &rifl5), Operand::new("rifl4", &rifl4)],
                )
                .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_reflectance, bench_emissivity);
criterion_main!(benches);
