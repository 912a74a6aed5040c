//! Mesh access interface used by the parameterization algorithms.
//!
//! Algorithms only need a handful of connectivity queries, so they are written
//! against [`SurfaceMesh`] instead of a concrete mesh type. Any representation
//! that can answer these queries in O(1) can be parameterized.

use nalgebra::Point3;

use super::halfedge::HalfEdgeMesh;
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};

/// Read-only half-edge connectivity.
///
/// Conventions:
/// - a face's half-edges form a closed `next` cycle;
/// - `target(he)` is the vertex `he` points to;
/// - a border half-edge has no face, and its `opposite` lies inside a face.
pub trait SurfaceMesh {
    /// Integer type backing the element handles.
    type Index: MeshIndex;

    /// Number of vertices (handles are `0..num_vertices()`).
    fn num_vertices(&self) -> usize;

    /// Number of faces (handles are `0..num_faces()`).
    fn num_faces(&self) -> usize;

    /// Number of half-edges, border half-edges included. Bounds every
    /// `next` walk.
    fn num_halfedges(&self) -> usize;

    /// All vertex handles.
    fn vertices(&self) -> impl Iterator<Item = VertexId<Self::Index>> + '_;

    /// All face handles.
    fn faces(&self) -> impl Iterator<Item = FaceId<Self::Index>> + '_;

    /// One half-edge of `f`.
    fn face_halfedge(&self, f: FaceId<Self::Index>) -> HalfEdgeId<Self::Index>;

    /// The next half-edge around the face (or hole) of `he`.
    fn next(&self, he: HalfEdgeId<Self::Index>) -> HalfEdgeId<Self::Index>;

    /// The oppositely oriented half-edge of the same edge.
    fn opposite(&self, he: HalfEdgeId<Self::Index>) -> HalfEdgeId<Self::Index>;

    /// The vertex `he` points to.
    fn target(&self, he: HalfEdgeId<Self::Index>) -> VertexId<Self::Index>;

    /// The face `he` belongs to, `None` on the border.
    fn face(&self, he: HalfEdgeId<Self::Index>) -> Option<FaceId<Self::Index>>;

    /// Position of `v`.
    fn point(&self, v: VertexId<Self::Index>) -> Point3<f64>;

    /// Check if `he` lies on the border.
    fn is_border(&self, he: HalfEdgeId<Self::Index>) -> bool {
        self.face(he).is_none()
    }

    /// Half-edges around `f`, starting at [`SurfaceMesh::face_halfedge`].
    fn halfedges_around_face(
        &self,
        f: FaceId<Self::Index>,
    ) -> impl Iterator<Item = HalfEdgeId<Self::Index>> + '_ {
        cycle(self, self.face_halfedge(f))
    }

    /// Half-edges of the hole containing the border half-edge `he`.
    fn halfedges_around_hole(
        &self,
        he: HalfEdgeId<Self::Index>,
    ) -> impl Iterator<Item = HalfEdgeId<Self::Index>> + '_ {
        cycle(self, he)
    }
}

/// Walk a `next` cycle once, starting (and stopping) at `start`.
///
/// Yields at most `num_halfedges()` items, so a broken chain that never
/// returns to `start` still ends; callers that need a closed cycle check
/// `next(last) == start`.
fn cycle<M: SurfaceMesh + ?Sized>(
    mesh: &M,
    start: HalfEdgeId<M::Index>,
) -> impl Iterator<Item = HalfEdgeId<M::Index>> + '_ {
    let mut current = start.is_valid().then_some(start);
    std::iter::from_fn(move || {
        let he = current?;
        let next = mesh.next(he);
        current = (next.is_valid() && next != start).then_some(next);
        Some(he)
    })
    .take(mesh.num_halfedges())
}

impl<I: MeshIndex> SurfaceMesh for HalfEdgeMesh<I> {
    type Index = I;

    #[inline]
    fn num_vertices(&self) -> usize {
        HalfEdgeMesh::num_vertices(self)
    }

    #[inline]
    fn num_faces(&self) -> usize {
        HalfEdgeMesh::num_faces(self)
    }

    #[inline]
    fn num_halfedges(&self) -> usize {
        HalfEdgeMesh::num_halfedges(self)
    }

    fn vertices(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_ids()
    }

    fn faces(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.face_ids()
    }

    #[inline]
    fn face_halfedge(&self, f: FaceId<I>) -> HalfEdgeId<I> {
        HalfEdgeMesh::face(self, f).halfedge
    }

    #[inline]
    fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        HalfEdgeMesh::next(self, he)
    }

    #[inline]
    fn opposite(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.twin(he)
    }

    #[inline]
    fn target(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.dest(he)
    }

    #[inline]
    fn face(&self, he: HalfEdgeId<I>) -> Option<FaceId<I>> {
        let f = self.face_of(he);
        f.is_valid().then_some(f)
    }

    #[inline]
    fn point(&self, v: VertexId<I>) -> Point3<f64> {
        *self.position(v)
    }
}
