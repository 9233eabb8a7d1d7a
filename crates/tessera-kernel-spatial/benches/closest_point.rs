//! Benchmarks for nearest-point queries.
//!
//! Run with: cargo bench -p tessera-kernel-spatial

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tessera_kernel_math::Point3;
use tessera_kernel_mesh::uv_sphere;
use tessera_kernel_spatial::{closest_point_brute_force, KdTree};

/// Query points on a shell slightly outside the unit sphere.
fn query_points(count: usize) -> Vec<Point3> {
    (0..count)
        .map(|i| {
            let t = i as f64 / count as f64;
            let theta = t * std::f64::consts::PI;
            let phi = t * 97.0;
            Point3::new(
                1.1 * theta.sin() * phi.cos(),
                1.1 * theta.sin() * phi.sin(),
                1.1 * theta.cos(),
            )
        })
        .collect()
}

fn bench_closest_point(c: &mut Criterion) {
    let mut group = c.benchmark_group("closest_point");
    let points = query_points(256);

    for &(stacks, slices) in &[(16u32, 32u32), (48, 96)] {
        let mesh = uv_sphere(1.0, stacks, slices);
        let label = mesh.triangle_count();
        group.throughput(Throughput::Elements(points.len() as u64));

        group.bench_with_input(BenchmarkId::new("kd_tree", label), &mesh, |b, mesh| {
            let tree = KdTree::build(mesh);
            b.iter(|| {
                for p in &points {
                    black_box(tree.find_closest_point(black_box(p)));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("brute_force", label), &mesh, |b, mesh| {
            b.iter(|| {
                for p in &points {
                    black_box(closest_point_brute_force(mesh, black_box(p)));
                }
            });
        });
    }

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mesh = uv_sphere(1.0, 64, 128);
    c.bench_function("kd_tree_build", |b| {
        b.iter(|| KdTree::build(black_box(&mesh)));
    });
}

criterion_group!(benches, bench_closest_point, bench_build);
criterion_main!(benches);
