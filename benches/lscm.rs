//! Benchmarks for LSCM parameterization.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use unfold::algo::parameterize::{conformal_energy, connected_components};
use unfold::prelude::*;
use nalgebra::Point3;

/// An `n` x `n` grid bent into a quarter cylinder, so the map is not trivial.
fn create_curved_grid(n: usize) -> HalfEdgeMesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            let angle = std::f64::consts::FRAC_PI_2 * i as f64 / n as f64;
            vertices.push(Point3::new(angle.cos(), angle.sin(), j as f64 / n as f64));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

/// `copies` disjoint grids laid out along the x axis.
fn create_grid_islands(n: usize, copies: usize) -> HalfEdgeMesh {
    let grid = create_curved_grid(n);
    let (positions, triangles) = unfold::mesh::to_face_vertex(&grid).unwrap();

    let mut vertices = Vec::with_capacity(positions.len() * copies);
    let mut faces = Vec::with_capacity(triangles.len() * copies);
    for c in 0..copies {
        let base = vertices.len();
        let shift = nalgebra::Vector3::new(3.0 * c as f64, 0.0, 0.0);
        vertices.extend(positions.iter().map(|p| p + shift));
        faces.extend(triangles.iter().map(|t| [t[0] + base, t[1] + base, t[2] + base]));
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

fn bench_lscm(c: &mut Criterion) {
    let mut group = c.benchmark_group("lscm");
    group.sample_size(10);

    for n in [8, 16, 32, 64] {
        let mesh = create_curved_grid(n);
        group.bench_with_input(BenchmarkId::new("jacobi_cg", n), &mesh, |b, mesh| {
            let options = LscmOptions::default();
            b.iter(|| lscm(black_box(mesh), &options).unwrap());
        });
    }

    for n in [4, 8] {
        let mesh = create_curved_grid(n);
        group.bench_with_input(BenchmarkId::new("dense_svd", n), &mesh, |b, mesh| {
            let options = LscmOptions::default().with_solver(DenseSvdSolver::default());
            b.iter(|| lscm(black_box(mesh), &options).unwrap());
        });
    }

    group.finish();
}

fn bench_atlas(c: &mut Criterion) {
    let mesh = create_grid_islands(16, 8);
    let mut group = c.benchmark_group("lscm_atlas");
    group.sample_size(10);

    group.bench_function("parallel", |b| {
        let options = AtlasOptions::default();
        b.iter(|| lscm_atlas(black_box(&mesh), &options).unwrap());
    });

    group.bench_function("sequential", |b| {
        let options = AtlasOptions::default().with_parallel(false);
        b.iter(|| lscm_atlas(black_box(&mesh), &options).unwrap());
    });

    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let mesh = create_curved_grid(64);
    let uv = lscm(&mesh, &LscmOptions::default()).unwrap();

    c.bench_function("connected_components_64", |b| {
        b.iter(|| connected_components(black_box(&mesh)).len());
    });

    c.bench_function("conformal_energy_64", |b| {
        b.iter(|| conformal_energy(black_box(&mesh), &uv));
    });
}

criterion_group!(benches, bench_lscm, bench_atlas, bench_analysis);
criterion_main!(benches);
