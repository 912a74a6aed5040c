//! Mesh construction utilities.
//!
//! This module provides functions for building half-edge meshes from
//! face-vertex lists as found in mesh file formats.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{Result, UnfoldError};

/// Build a half-edge mesh from vertices and triangle faces.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of triangle faces, each as [v0, v1, v2] indices
///
/// # Example
/// ```
/// use unfold::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    build_from_polygons(vertices, faces)
}

/// Build a half-edge mesh from vertices and polygonal faces.
///
/// Faces are given as counter-clockwise vertex index lists with at least three
/// distinct entries. Mixed triangle/quad/n-gon input is accepted.
///
/// # Errors
///
/// - [`UnfoldError::EmptyMesh`] if there are no faces
/// - [`UnfoldError::InvalidVertexIndex`] if a face references a missing vertex
/// - [`UnfoldError::DegenerateFace`] if a face repeats a vertex or has fewer than 3
/// - [`UnfoldError::NonManifoldEdge`] if a directed edge is used twice
pub fn build_from_polygons<I: MeshIndex, F: AsRef<[usize]>>(
    vertices: &[Point3<f64>],
    faces: &[F],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(UnfoldError::EmptyMesh);
    }

    let mut num_corners = 0;
    for (fi, face) in faces.iter().enumerate() {
        let face = face.as_ref();
        if face.len() < 3 {
            return Err(UnfoldError::DegenerateFace { face: fi });
        }
        for (k, &vi) in face.iter().enumerate() {
            if vi >= vertices.len() {
                return Err(UnfoldError::InvalidVertexIndex { face: fi, vertex: vi });
            }
            if face[k + 1..].contains(&vi) {
                return Err(UnfoldError::DegenerateFace { face: fi });
            }
        }
        num_corners += face.len();
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len(), num_corners);

    let vertex_ids: Vec<VertexId<I>> = vertices.iter().map(|&pos| mesh.add_vertex(pos)).collect();

    // Directed edge (v0, v1) -> interior half-edge
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId<I>> = HashMap::with_capacity(num_corners);
    // Directed edges in creation order, so twin linking is deterministic
    let mut directed: Vec<(usize, usize)> = Vec::with_capacity(num_corners);

    // First pass: create interior half-edges and faces
    for face in faces {
        let face = face.as_ref();
        let n = face.len();
        let base = mesh.num_halfedges();
        let face_id = FaceId::<I>::new(mesh.num_faces());

        mesh.faces.push(Face::new(HalfEdgeId::new(base)));

        for k in 0..n {
            let v0 = face[k];
            let v1 = face[(k + 1) % n];

            let mut he = HalfEdge::new();
            he.origin = vertex_ids[v0];
            he.next = HalfEdgeId::new(base + (k + 1) % n);
            he.prev = HalfEdgeId::new(base + (k + n - 1) % n);
            he.face = face_id;
            mesh.halfedges.push(he);

            let id = HalfEdgeId::new(base + k);
            if edge_map.insert((v0, v1), id).is_some() {
                return Err(UnfoldError::NonManifoldEdge { v0, v1 });
            }
            directed.push((v0, v1));
            mesh.vertex_mut(vertex_ids[v0]).halfedge = id;
        }
    }

    // Second pass: link twins, creating boundary half-edges where needed
    for (i, &(v0, v1)) in directed.iter().enumerate() {
        let he = HalfEdgeId::<I>::new(i);
        if let Some(&twin) = edge_map.get(&(v1, v0)) {
            mesh.halfedge_mut(he).twin = twin;
        } else {
            let boundary_he = HalfEdgeId::<I>::new(mesh.num_halfedges());
            let mut bhe = HalfEdge::new();
            bhe.origin = vertex_ids[v1];
            bhe.twin = he;
            mesh.halfedges.push(bhe);

            mesh.halfedge_mut(he).twin = boundary_he;
            // Boundary vertices point at an outgoing boundary half-edge
            mesh.vertex_mut(vertex_ids[v1]).halfedge = boundary_he;
        }
    }

    link_boundary_loops(&mut mesh)?;

    Ok(mesh)
}

/// Link boundary half-edges into loops, one per hole.
///
/// A vertex with two outgoing boundary half-edges sits between two border
/// fans; `next` would be ambiguous there, so it is rejected.
fn link_boundary_loops<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) -> Result<()> {
    let boundary_hes: Vec<HalfEdgeId<I>> = mesh.boundary_halfedges().collect();

    let mut outgoing: HashMap<VertexId<I>, HalfEdgeId<I>> =
        HashMap::with_capacity(boundary_hes.len());
    for &he in &boundary_hes {
        let origin = mesh.origin(he);
        if outgoing.insert(origin, he).is_some() {
            return Err(UnfoldError::NonManifoldVertex {
                vertex: origin.index(),
            });
        }
    }

    for &he in &boundary_hes {
        // The next boundary half-edge starts where this one ends
        if let Some(&next_he) = outgoing.get(&mesh.dest(he)) {
            mesh.halfedge_mut(he).next = next_he;
            mesh.halfedge_mut(next_he).prev = he;
        }
    }

    Ok(())
}

/// Convert a triangle mesh back to a face-vertex representation.
///
/// Returns (vertices, faces). Polygon meshes go through [`triangulate`] or
/// [`to_polygons`] instead.
///
/// # Errors
///
/// [`UnfoldError::NotATriangle`] for the first face with more than three
/// corners.
pub fn to_face_vertex<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
) -> Result<(Vec<Point3<f64>>, Vec<[usize; 3]>)> {
    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

    let faces = mesh
        .face_ids()
        .map(|f| match mesh.face_degree(f) {
            3 => {
                let [v0, v1, v2] = mesh.face_triangle(f);
                Ok([v0.index(), v1.index(), v2.index()])
            }
            corners => Err(UnfoldError::NotATriangle {
                face: f.index(),
                corners,
            }),
        })
        .collect::<Result<Vec<[usize; 3]>>>()?;

    Ok((vertices, faces))
}

/// Convert a polygon mesh back to per-face vertex index lists.
pub fn to_polygons<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<Vec<usize>> {
    mesh.face_ids()
        .map(|f| mesh.face_vertices(f).map(|v| v.index()).collect())
        .collect()
}

/// Fan-triangulate every face with more than three corners.
///
/// Each polygon `[v0, v1, ..., vn]` becomes `[v0, vi, vi+1]`. Triangles are
/// copied unchanged, so a triangle mesh comes back with the same face order.
pub fn triangulate<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Result<HalfEdgeMesh<I>> {
    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();
    let mut triangles = Vec::with_capacity(mesh.num_faces());

    for polygon in to_polygons(mesh) {
        for i in 1..polygon.len() - 1 {
            triangles.push([polygon[0], polygon[i], polygon[i + 1]]);
        }
    }

    build_from_triangles(&vertices, &triangles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        // Two triangles sharing an edge
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3]];
        (vertices, faces)
    }

    #[test]
    fn test_single_triangle() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        // 3 interior half-edges + 3 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 6);
        assert!(mesh.is_valid());
        assert_eq!(mesh.boundary_halfedges().count(), 3);
    }

    #[test]
    fn test_two_triangles() {
        let (vertices, faces) = two_triangles();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        // 6 interior half-edges + 4 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 10);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_roundtrip() {
        let (vertices, faces) = two_triangles();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        let (out_verts, out_faces) = to_face_vertex(&mesh).unwrap();
        assert_eq!(out_verts, vertices);
        assert_eq!(out_faces, faces);
    }

    #[test]
    fn test_mixed_polygons() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.5, 0.0),
        ];
        let faces: Vec<Vec<usize>> = vec![vec![0, 1, 2, 3], vec![1, 4, 2]];
        let mesh: HalfEdgeMesh<u32> = build_from_polygons(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_faces(), 2);
        // 7 interior + 5 boundary
        assert_eq!(mesh.num_halfedges(), 12);
        assert!(mesh.is_valid());
        assert!(!mesh.is_triangle_mesh());
        assert_eq!(to_polygons(&mesh), faces);
    }

    #[test]
    fn test_invalid_vertex_index() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &[[0, 1, 2]]);
        assert!(matches!(
            result,
            Err(UnfoldError::InvalidVertexIndex { face: 0, vertex: 1 })
        ));
    }

    #[test]
    fn test_degenerate_face() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &[[0, 0, 2]]);
        assert!(matches!(result, Err(UnfoldError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_inconsistent_orientation() {
        let (vertices, _) = two_triangles();
        // Second face repeats the directed edge 0 -> 1
        let result: Result<HalfEdgeMesh<u32>> =
            build_from_triangles(&vertices, &[[0, 1, 2], [0, 1, 3]]);
        assert!(matches!(result, Err(UnfoldError::NonManifoldEdge { v0: 0, v1: 1 })));
    }

    #[test]
    fn test_triangulate() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.5, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces: Vec<Vec<usize>> = vec![vec![0, 1, 2, 3, 4]];
        let pentagon: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();

        let mesh = triangulate(&pentagon).unwrap();
        assert_eq!(mesh.num_faces(), 3);
        assert!(mesh.is_triangle_mesh());
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(to_polygons(&mesh), vec![vec![0, 1, 2], vec![0, 2, 3], vec![0, 3, 4]]);
    }

    #[test]
    fn test_to_face_vertex_rejects_polygons() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces: Vec<Vec<usize>> = vec![vec![0, 1, 2, 3]];
        let quad: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();

        match to_face_vertex(&quad) {
            Err(UnfoldError::NotATriangle { face: 0, corners: 4 }) => (),
            other => panic!("expected NotATriangle, got {:?}", other),
        }
        let (_, triangles) = to_face_vertex(&triangulate(&quad).unwrap()).unwrap();
        assert_eq!(triangles, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_bowtie_vertex_is_rejected() {
        // Two triangles touching only at vertex 0
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(-1.0, -1.0, 0.0),
        ];
        let result: Result<HalfEdgeMesh> = build_from_triangles(&vertices, &[[0, 1, 2], [0, 3, 4]]);
        match result {
            Err(UnfoldError::NonManifoldVertex { vertex: 0 }) => (),
            other => panic!("expected NonManifoldVertex, got {:?}", other.map(|m| m.num_faces())),
        }
    }

    #[test]
    fn test_shared_vertex_inside_one_fan_is_accepted() {
        // A fan of three triangles around vertex 0 with one gap is still a
        // single border fan
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh =
            build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3], [0, 3, 4]]).unwrap();
        assert!(mesh.is_valid());
        let start = mesh.boundary_halfedges().next().unwrap();
        assert_eq!(mesh.boundary_loop(start).count(), 5);
    }
}
