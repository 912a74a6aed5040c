//! Connected components of a surface.
//!
//! Two faces are connected when they share an edge. Components are found by
//! breadth-first search across `opposite` half-edges, so the discovery order
//! depends only on the mesh connectivity and the seed.

use std::collections::VecDeque;

use crate::mesh::{FaceId, HalfEdgeId, SurfaceMesh, VertexId};

/// Faces of the component containing `seed`, in discovery order.
///
/// The seed comes first.
pub fn connected_component<M: SurfaceMesh>(
    mesh: &M,
    seed: FaceId<M::Index>,
) -> Vec<FaceId<M::Index>> {
    let mut visited = vec![false; mesh.num_faces()];
    flood(mesh, seed, &mut visited)
}

/// All components, ordered by their lowest face index.
pub fn connected_components<M: SurfaceMesh>(mesh: &M) -> Vec<Vec<FaceId<M::Index>>> {
    let mut visited = vec![false; mesh.num_faces()];
    let mut components = Vec::new();

    for f in mesh.faces() {
        if !visited[f.index()] {
            components.push(flood(mesh, f, &mut visited));
        }
    }

    components
}

fn flood<M: SurfaceMesh>(
    mesh: &M,
    seed: FaceId<M::Index>,
    visited: &mut [bool],
) -> Vec<FaceId<M::Index>> {
    let mut faces = Vec::new();
    let mut queue = VecDeque::new();

    visited[seed.index()] = true;
    queue.push_back(seed);

    while let Some(f) = queue.pop_front() {
        faces.push(f);
        for he in mesh.halfedges_around_face(f) {
            if let Some(neighbor) = mesh.face(mesh.opposite(he)) {
                if !visited[neighbor.index()] {
                    visited[neighbor.index()] = true;
                    queue.push_back(neighbor);
                }
            }
        }
    }

    faces
}

/// Vertices of a face set, each once, in the order they are first met
/// walking the faces' half-edges.
pub fn component_vertices<M: SurfaceMesh>(
    mesh: &M,
    faces: &[FaceId<M::Index>],
) -> Vec<VertexId<M::Index>> {
    let mut seen = vec![false; mesh.num_vertices()];
    let mut vertices = Vec::new();

    for &f in faces {
        for he in mesh.halfedges_around_face(f) {
            let v = mesh.target(he);
            if !seen[v.index()] {
                seen[v.index()] = true;
                vertices.push(v);
            }
        }
    }

    vertices
}

/// A border half-edge bounding the given faces, if there is one.
///
/// Faces are scanned in order, so the result is the first hole met from the
/// first face that touches one.
pub fn border_halfedge<M: SurfaceMesh>(
    mesh: &M,
    faces: &[FaceId<M::Index>],
) -> Option<HalfEdgeId<M::Index>> {
    faces.iter().find_map(|&f| {
        mesh.halfedges_around_face(f)
            .map(|he| mesh.opposite(he))
            .find(|&opp| mesh.is_border(opp))
    })
}
