//! Distortion measures for a parameterization.
//!
//! Only triangular faces are measured; other faces are ignored.

use nalgebra::{Point2, Point3};

use crate::mesh::{FaceId, SurfaceMesh, VertexId};

use super::basis::project_triangle;
use super::maps::UVMap;

fn triangle<M: SurfaceMesh>(mesh: &M, f: FaceId<M::Index>) -> Option<[VertexId<M::Index>; 3]> {
    let mut it = mesh.halfedges_around_face(f).map(|he| mesh.target(he));
    let tri = [it.next()?, it.next()?, it.next()?];
    it.next().is_none().then_some(tri)
}

/// Sum of squared conformality residuals over all triangles.
///
/// Zero exactly when every triangle is mapped by a similarity. This is the
/// quantity LSCM minimizes, so it is also a check on the solve.
pub fn conformal_energy<M: SurfaceMesh>(mesh: &M, uv: &UVMap<M::Index>) -> f64 {
    mesh.faces()
        .filter_map(|f| triangle(mesh, f))
        .map(|[v0, v1, v2]| {
            let t = project_triangle(&mesh.point(v0), &mesh.point(v1), &mesh.point(v2));
            let (a, c, d) = (t.z1.x, t.z2.x, t.z2.y);
            let (p0, p1, p2) = (uv.get(v0), uv.get(v1), uv.get(v2));

            let re = (-a + c) * p0.x - d * p0.y - c * p1.x + d * p1.y + a * p2.x;
            let im = d * p0.x + (-a + c) * p0.y - d * p1.x - c * p1.y + a * p2.y;
            re * re + im * im
        })
        .sum()
}

fn angle3(at: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a - at).angle(&(b - at))
}

fn angle2(at: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    (a - at).angle(&(b - at))
}

/// Mean absolute difference between 3D and UV corner angles, in radians.
///
/// Returns zero for a mesh without triangles.
pub fn angle_distortion<M: SurfaceMesh>(mesh: &M, uv: &UVMap<M::Index>) -> f64 {
    let mut total = 0.0;
    let mut corners = 0usize;

    for [v0, v1, v2] in mesh.faces().filter_map(|f| triangle(mesh, f)) {
        let p = [mesh.point(v0), mesh.point(v1), mesh.point(v2)];
        let q = [uv.get(v0), uv.get(v1), uv.get(v2)];
        for k in 0..3 {
            let (i, j) = ((k + 1) % 3, (k + 2) % 3);
            let d = angle3(&p[k], &p[i], &p[j]) - angle2(&q[k], &q[i], &q[j]);
            if d.is_finite() {
                total += d.abs();
                corners += 1;
            }
        }
    }

    if corners == 0 {
        0.0
    } else {
        total / corners as f64
    }
}

/// Number of faces with negative signed UV area.
///
/// LSCM does not guarantee a bijective map, so folds can occur on strongly
/// curved input.
pub fn flipped_faces<M: SurfaceMesh>(mesh: &M, uv: &UVMap<M::Index>) -> usize {
    mesh.faces().filter(|&f| uv.signed_area(mesh, f) < 0.0).count()
}
