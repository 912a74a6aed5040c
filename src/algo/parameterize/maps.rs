//! Per-vertex maps read and written by the parameterizers.
//!
//! - [`UVMap`]: the 2D coordinates, both input (pins, initial guess) and output
//! - [`PinnedMap`]: which vertices keep their UV fixed
//! - [`VertexIndexMap`]: vertex → slot in the linear system

use std::marker::PhantomData;

use nalgebra::Point2;

use crate::mesh::{FaceId, MeshIndex, SurfaceMesh, VertexId};

use super::component::component_vertices;

/// UV coordinates for mesh vertices.
///
/// This structure stores the 2D parameterization (UV coordinates) computed
/// for each vertex in a mesh. Coordinates are unbounded while solving; use
/// [`UVMap::normalize`] to bring them into the unit square.
///
/// # Example
///
/// ```
/// use unfold::algo::parameterize::UVMap;
/// use unfold::mesh::VertexId;
/// use nalgebra::Point2;
///
/// let mut uv: UVMap = UVMap::zeros(2);
/// uv.set(VertexId::new(1), Point2::new(4.0, 2.0));
/// uv.normalize();
/// assert_eq!(uv.get(VertexId::new(1)), Point2::new(1.0, 0.5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UVMap<I: MeshIndex = u32> {
    coords: Vec<Point2<f64>>,
    _marker: PhantomData<I>,
}

impl<I: MeshIndex> UVMap<I> {
    /// Create a UV map from coordinates indexed by vertex.
    pub fn new(coords: Vec<Point2<f64>>) -> Self {
        Self {
            coords,
            _marker: PhantomData,
        }
    }

    /// Create a UV map with every vertex at the origin.
    pub fn zeros(n: usize) -> Self {
        Self::new(vec![Point2::origin(); n])
    }

    /// Get the UV coordinates for a vertex.
    #[inline]
    pub fn get(&self, v: VertexId<I>) -> Point2<f64> {
        self.coords[v.index()]
    }

    /// Get a mutable reference to UV coordinates for a vertex.
    #[inline]
    pub fn get_mut(&mut self, v: VertexId<I>) -> &mut Point2<f64> {
        &mut self.coords[v.index()]
    }

    /// Set the UV coordinates for a vertex.
    #[inline]
    pub fn set(&mut self, v: VertexId<I>, uv: Point2<f64>) {
        self.coords[v.index()] = uv;
    }

    /// Get the number of UV coordinates.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Iterate over all UV coordinates with their vertex IDs.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId<I>, Point2<f64>)> + '_ {
        self.coords
            .iter()
            .enumerate()
            .map(|(i, &uv)| (VertexId::new(i), uv))
    }

    /// Get the raw coordinates slice.
    pub fn as_slice(&self) -> &[Point2<f64>] {
        &self.coords
    }

    /// Compute the bounding box of all coordinates.
    ///
    /// Returns `None` if the UV map is empty.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        bounds(self.coords.iter().copied())
    }

    /// Bounding box of the given vertices only.
    pub fn bounding_box_of(&self, vertices: &[VertexId<I>]) -> Option<(Point2<f64>, Point2<f64>)> {
        bounds(vertices.iter().map(|&v| self.get(v)))
    }

    /// Fit all coordinates into [0, 1]², keeping the aspect ratio.
    pub fn normalize(&mut self) {
        if let Some((min, max)) = self.bounding_box() {
            let scale = (max.x - min.x).max(max.y - min.y);
            if scale > 1e-10 {
                for uv in &mut self.coords {
                    *uv = Point2::from((*uv - min) / scale);
                }
            }
        }
    }

    /// Fit the given vertices into [0, 1]², keeping the aspect ratio.
    ///
    /// Other vertices are left untouched.
    pub fn normalize_vertices(&mut self, vertices: &[VertexId<I>]) {
        if let Some((min, max)) = self.bounding_box_of(vertices) {
            let scale = (max.x - min.x).max(max.y - min.y);
            if scale > 1e-10 {
                for &v in vertices {
                    let uv = self.get_mut(v);
                    *uv = Point2::from((*uv - min) / scale);
                }
            }
        }
    }

    /// Unsigned area covered in UV space by the faces of `mesh`.
    ///
    /// Polygons are measured with the shoelace formula.
    pub fn total_area<M: SurfaceMesh<Index = I>>(&self, mesh: &M) -> f64 {
        mesh.faces().map(|f| self.signed_area(mesh, f).abs()).sum()
    }

    /// Signed UV area of a face; negative when the face is flipped.
    pub fn signed_area<M: SurfaceMesh<Index = I>>(&self, mesh: &M, f: FaceId<I>) -> f64 {
        let corners: Vec<Point2<f64>> = mesh
            .halfedges_around_face(f)
            .map(|he| self.get(mesh.target(he)))
            .collect();

        let n = corners.len();
        let twice: f64 = (0..n)
            .map(|k| {
                let p = corners[k];
                let q = corners[(k + 1) % n];
                p.x * q.y - q.x * p.y
            })
            .sum();
        0.5 * twice
    }
}

fn bounds(mut points: impl Iterator<Item = Point2<f64>>) -> Option<(Point2<f64>, Point2<f64>)> {
    let first = points.next()?;
    Some(points.fold((first, first), |(min, max), p| {
        (
            Point2::new(min.x.min(p.x), min.y.min(p.y)),
            Point2::new(max.x.max(p.x), max.y.max(p.y)),
        )
    }))
}

/// Per-vertex "UV is fixed" flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedMap<I: MeshIndex = u32> {
    flags: Vec<bool>,
    _marker: PhantomData<I>,
}

impl<I: MeshIndex> PinnedMap<I> {
    /// Create a map over `n` vertices with nothing pinned.
    pub fn new(n: usize) -> Self {
        Self {
            flags: vec![false; n],
            _marker: PhantomData,
        }
    }

    /// Check if a vertex is pinned.
    #[inline]
    pub fn is_pinned(&self, v: VertexId<I>) -> bool {
        self.flags[v.index()]
    }

    /// Set the flag of a vertex.
    #[inline]
    pub fn set(&mut self, v: VertexId<I>, pinned: bool) {
        self.flags[v.index()] = pinned;
    }

    /// Pin a vertex.
    #[inline]
    pub fn pin(&mut self, v: VertexId<I>) {
        self.set(v, true);
    }

    /// Number of pinned vertices.
    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&p| p).count()
    }

    /// Pinned vertices in index order.
    pub fn pinned(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, &p)| p)
            .map(|(i, _)| VertexId::new(i))
    }

    /// Get the number of vertices covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Injective map from vertices to `0..len()`.
///
/// Slot `i` owns the unknowns `2i` (u) and `2i + 1` (v) of the linear
/// system. Vertices without an entry take no part in the solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexIndexMap<I: MeshIndex = u32> {
    slots: Vec<Option<usize>>,
    vertices: Vec<VertexId<I>>,
}

impl<I: MeshIndex> VertexIndexMap<I> {
    /// Identity map over `n` vertices.
    pub fn dense(n: usize) -> Self {
        Self {
            slots: (0..n).map(Some).collect(),
            vertices: (0..n).map(VertexId::new).collect(),
        }
    }

    /// Number the given vertices in order.
    ///
    /// `num_vertices` is the vertex count of the mesh they belong to.
    /// Repeated vertices keep their first index.
    pub fn from_vertices(num_vertices: usize, vertices: &[VertexId<I>]) -> Self {
        let mut slots = vec![None; num_vertices];
        let mut order = Vec::with_capacity(vertices.len());
        for &v in vertices {
            if slots[v.index()].is_none() {
                slots[v.index()] = Some(order.len());
                order.push(v);
            }
        }
        Self {
            slots,
            vertices: order,
        }
    }

    /// Compact numbering of the vertices of a face set, in first-seen order.
    pub fn from_component<M: SurfaceMesh<Index = I>>(mesh: &M, faces: &[FaceId<I>]) -> Self {
        Self::from_vertices(mesh.num_vertices(), &component_vertices(mesh, faces))
    }

    /// Index of a vertex, `None` if it is not numbered.
    #[inline]
    pub fn get(&self, v: VertexId<I>) -> Option<usize> {
        self.slots.get(v.index()).copied().flatten()
    }

    /// The vertex at slot `i`.
    #[inline]
    pub fn vertex(&self, i: usize) -> VertexId<I> {
        self.vertices[i]
    }

    /// Numbered vertices in slot order.
    pub fn vertices(&self) -> &[VertexId<I>] {
        &self.vertices
    }

    /// Number of numbered vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}
