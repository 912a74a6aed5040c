//! Least Squares Conformal Maps (LSCM) parameterization.
//!
//! LSCM computes a conformal (angle-preserving) parameterization of a triangle
//! mesh with boundary. Each triangle contributes the discrete conformality
//! condition
//!
//! ```text
//! (Z1 − Z0)(U2 − U0) = (Z2 − Z0)(U1 − U0)
//! ```
//!
//! where `Zk` are the corners in a local frame of the triangle and
//! `Uk = uk + i·vk` the unknown UVs, as one real and one imaginary row of a
//! sparse least squares system. Pinned vertices are locked unknowns, so the
//! solve only spans the free ones.
//!
//! A run goes through `border pinned → system built → solved → done`; any
//! failure aborts it and leaves UVs outside the pinned vertices untouched.
//!
//! # References
//!
//! - Lévy, B., Petitjean, S., Ray, N., & Maillot, J. (2002). "Least squares
//!   conformal maps for automatic texture atlas generation." ACM SIGGRAPH.

use std::sync::Arc;

use nalgebra::Point2;

use crate::error::{Result, UnfoldError};
use crate::linalg::{ConjugateGradientSolver, LeastSquaresSystem, LinearSolver, SolveReport};
use crate::mesh::{FaceId, HalfEdgeId, MeshIndex, SurfaceMesh, VertexId};

use super::basis::project_triangle;
use super::border::{BorderParameterizer, BorderStrategy};
use super::component::{border_halfedge, component_vertices, connected_component};
use super::maps::{PinnedMap, UVMap, VertexIndexMap};

/// Options for [`lscm`].
#[derive(Debug, Clone)]
pub struct LscmOptions {
    /// Strategy for selecting pinned (fixed) vertices.
    pub border: BorderStrategy,

    /// Backend for the sparse least squares solve.
    pub solver: Arc<dyn LinearSolver>,

    /// Fit the result into [0, 1]², keeping the aspect ratio.
    pub normalize: bool,
}

impl Default for LscmOptions {
    fn default() -> Self {
        Self {
            border: BorderStrategy::default(),
            solver: Arc::new(ConjugateGradientSolver::default()),
            normalize: true,
        }
    }
}

impl LscmOptions {
    /// Set the border strategy.
    pub fn with_border(mut self, border: BorderStrategy) -> Self {
        self.border = border;
        self
    }

    /// Set the linear solver backend.
    pub fn with_solver<S: LinearSolver + 'static>(mut self, solver: S) -> Self {
        self.solver = Arc::new(solver);
        self
    }

    /// Enable or disable normalization of the result.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

/// Add the two conformality rows of triangle `f` to `system`.
///
/// The corners are the targets of the face's half-edges in `next` order.
/// Degenerate triangles are accepted and yield (near) zero rows.
///
/// # Errors
///
/// - [`UnfoldError::TriangleSetup`] if `f` is not a triangle
/// - [`UnfoldError::MissingVertexIndex`] if a corner has no index
pub fn setup_triangle_relations<M: SurfaceMesh>(
    mesh: &M,
    f: FaceId<M::Index>,
    index: &VertexIndexMap<M::Index>,
    system: &mut LeastSquaresSystem,
) -> Result<()> {
    let mut corners = [None; 3];
    let mut degree = 0;
    for he in mesh.halfedges_around_face(f) {
        if degree < 3 {
            corners[degree] = Some(mesh.target(he));
        }
        degree += 1;
    }
    let [Some(c0), Some(c1), Some(c2)] = corners else {
        return Err(triangle_error(f, degree));
    };
    if degree != 3 {
        return Err(triangle_error(f, degree));
    }

    let slot = |v| {
        index
            .get(v)
            .ok_or(UnfoldError::MissingVertexIndex { vertex: v.index() })
    };
    let (id0, id1, id2) = (slot(c0)?, slot(c1)?, slot(c2)?);

    let t = project_triangle(&mesh.point(c0), &mesh.point(c1), &mesh.point(c2));

    // (a, b) = z1 - z0 with b = 0, (c, d) = z2 - z0
    let a = t.z1.x - t.z0.x;
    let c = t.z2.x - t.z0.x;
    let d = t.z2.y - t.z0.y;

    let (u0, v0) = (2 * id0, 2 * id0 + 1);
    let (u1, v1) = (2 * id1, 2 * id1 + 1);
    let (u2, v2) = (2 * id2, 2 * id2 + 1);

    // Real part
    system.begin_row();
    system.add_coefficient(u0, -a + c);
    system.add_coefficient(v0, -d);
    system.add_coefficient(u1, -c);
    system.add_coefficient(v1, d);
    system.add_coefficient(u2, a);
    system.end_row();

    // Imaginary part
    system.begin_row();
    system.add_coefficient(u0, d);
    system.add_coefficient(v0, -a + c);
    system.add_coefficient(u1, -d);
    system.add_coefficient(v1, -c);
    system.add_coefficient(v2, a);
    system.end_row();

    Ok(())
}

fn triangle_error<I: MeshIndex>(f: FaceId<I>, degree: usize) -> UnfoldError {
    UnfoldError::TriangleSetup {
        face: f.index(),
        reason: format!("face has {} corners, LSCM needs triangles", degree),
    }
}

/// Seed the unknowns from `uv` and lock those of pinned vertices.
///
/// Runs over every vertex of the mesh; vertices without an index are
/// skipped.
pub fn initialize_system_from_mesh_border<M: SurfaceMesh>(
    system: &mut LeastSquaresSystem,
    mesh: &M,
    uv: &UVMap<M::Index>,
    index: &VertexIndexMap<M::Index>,
    pinned: &PinnedMap<M::Index>,
) {
    for v in mesh.vertices() {
        let Some(i) = index.get(v) else {
            continue;
        };
        let p = uv.get(v);
        system.variable_mut(2 * i).set_value(p.x);
        system.variable_mut(2 * i + 1).set_value(p.y);

        if pinned.is_pinned(v) {
            system.variable_mut(2 * i).lock();
            system.variable_mut(2 * i + 1).lock();
        }
    }
}

/// LSCM parameterizer: a border strategy plus a solver backend.
///
/// # Example
///
/// ```
/// use unfold::algo::parameterize::{LscmParameterizer, UVMap};
/// use unfold::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
/// let bhd = mesh.boundary_halfedges().next().unwrap();
///
/// let mut uv = UVMap::zeros(mesh.num_vertices());
/// LscmParameterizer::default().parameterize(&mesh, bhd, &mut uv).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct LscmParameterizer {
    /// Strategy for pinning vertices.
    pub border: BorderStrategy,
    /// Backend for the solve.
    pub solver: Arc<dyn LinearSolver>,
}

impl Default for LscmParameterizer {
    fn default() -> Self {
        let options = LscmOptions::default();
        Self::new(options.border, options.solver)
    }
}

impl LscmParameterizer {
    /// Create a parameterizer.
    pub fn new(border: BorderStrategy, solver: Arc<dyn LinearSolver>) -> Self {
        Self { border, solver }
    }

    /// Parameterize the component bounded by `bhd` with a compact vertex
    /// numbering and fresh pinned flags.
    ///
    /// Only the UVs of that component's vertices are written.
    pub fn parameterize<M: SurfaceMesh>(
        &self,
        mesh: &M,
        bhd: HalfEdgeId<M::Index>,
        uv: &mut UVMap<M::Index>,
    ) -> Result<SolveReport> {
        let seed = seed_face(mesh, bhd)?;
        let faces = connected_component(mesh, seed);
        let index = VertexIndexMap::from_component(mesh, &faces);
        let mut pinned = PinnedMap::new(mesh.num_vertices());
        self.parameterize_with_maps(mesh, bhd, uv, &index, &mut pinned)
    }

    /// Parameterize the component bounded by `bhd` using caller-owned maps.
    ///
    /// `index` must number every vertex of the component; the system has
    /// `2 * index.len()` unknowns. The border strategy writes into `uv` and
    /// `pinned`; on success the solved UVs of the component's vertices are
    /// written into `uv`.
    ///
    /// # Errors
    ///
    /// - [`UnfoldError::BorderParameterization`] if fewer than two vertices
    ///   of the component end up pinned at distinct UVs
    /// - [`UnfoldError::TriangleSetup`] / [`UnfoldError::MissingVertexIndex`]
    ///   if a face cannot be assembled
    /// - [`UnfoldError::CannotSolveLinearSystem`] if the backend fails
    pub fn parameterize_with_maps<M: SurfaceMesh>(
        &self,
        mesh: &M,
        bhd: HalfEdgeId<M::Index>,
        uv: &mut UVMap<M::Index>,
        index: &VertexIndexMap<M::Index>,
        pinned: &mut PinnedMap<M::Index>,
    ) -> Result<SolveReport> {
        let seed = seed_face(mesh, bhd)?;

        self.border.parameterize_border(mesh, bhd, uv, pinned)?;
        log::debug!("lscm: border pinned ({} vertices)", pinned.count());

        let faces = connected_component(mesh, seed);
        let vertices = component_vertices(mesh, &faces);
        check_pins(&vertices, uv, pinned)?;

        let mut system = LeastSquaresSystem::new(2 * index.len());
        system.set_least_squares(true);
        initialize_system_from_mesh_border(&mut system, mesh, uv, index, pinned);

        system.begin_system();
        for &f in &faces {
            setup_triangle_relations(mesh, f, index, &mut system)?;
        }
        system.end_system();
        log::debug!(
            "lscm: system built ({} faces, {} vertices, {} of {} unknowns free)",
            faces.len(),
            vertices.len(),
            system.num_free(),
            system.num_variables()
        );

        let report = system.solve(self.solver.as_ref()).map_err(|e| {
            log::warn!("lscm: {}", e);
            e
        })?;
        log::debug!(
            "lscm: solved with {} ({} iterations, residual {:.3e})",
            report.solver,
            report.iterations,
            report.relative_residual
        );

        for &v in &vertices {
            // Every component vertex was checked during assembly
            if let Some(i) = index.get(v) {
                let u = system.variable(2 * i).value();
                let w = system.variable(2 * i + 1).value();
                uv.set(v, Point2::new(u, w));
            }
        }
        log::debug!("lscm: done");

        Ok(report)
    }
}

/// The face on the inner side of the border half-edge `bhd`.
fn seed_face<M: SurfaceMesh>(mesh: &M, bhd: HalfEdgeId<M::Index>) -> Result<FaceId<M::Index>> {
    if !mesh.is_border(bhd) {
        return Err(UnfoldError::border(format!("{:?} is not a border half-edge", bhd)));
    }
    mesh.face(mesh.opposite(bhd))
        .ok_or_else(|| UnfoldError::border("border half-edge has no face on its other side"))
}

/// At least two pinned vertices of the component, not all at the same UV.
fn check_pins<I: MeshIndex>(
    vertices: &[VertexId<I>],
    uv: &UVMap<I>,
    pinned: &PinnedMap<I>,
) -> Result<()> {
    let mut pins = vertices.iter().filter(|&&v| pinned.is_pinned(v)).map(|&v| uv.get(v));
    let Some(first) = pins.next() else {
        return Err(UnfoldError::border("no vertex of the component is pinned"));
    };
    if pins.any(|p| p != first) {
        Ok(())
    } else {
        Err(UnfoldError::border(
            "fewer than two pinned vertices with distinct UVs in the component",
        ))
    }
}

/// Parameterize the component bounded by `bhd` with the default
/// parameterizer (two-vertices border, conjugate gradient).
pub fn parameterize<M: SurfaceMesh>(
    mesh: &M,
    bhd: HalfEdgeId<M::Index>,
    uv: &mut UVMap<M::Index>,
) -> Result<SolveReport> {
    LscmParameterizer::default().parameterize(mesh, bhd, uv)
}

/// Compute an LSCM parameterization of a mesh with boundary.
///
/// The component containing the first border found (scanning faces in
/// order) is parameterized; vertices of other components stay at the origin.
///
/// # Errors
///
/// Returns an error if:
/// - The mesh is empty
/// - The mesh has no boundary (closed mesh)
/// - Pinning, assembly or the solve fails
///
/// # Example
///
/// ```
/// use unfold::algo::parameterize::{lscm, LscmOptions};
/// use unfold::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(2.0, 0.0, 0.0),
///     Point3::new(2.0, 1.0, 0.5),
///     Point3::new(0.0, 1.0, 0.5),
/// ];
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
///
/// let uv = lscm(&mesh, &LscmOptions::default()).unwrap();
/// let (min, max) = uv.bounding_box().unwrap();
/// assert!(min.x.abs() < 1e-9 && (max.x - 1.0).abs() < 1e-9);
/// ```
pub fn lscm<M: SurfaceMesh>(mesh: &M, options: &LscmOptions) -> Result<UVMap<M::Index>> {
    if mesh.num_faces() == 0 {
        return Err(UnfoldError::EmptyMesh);
    }
    let all: Vec<_> = mesh.faces().collect();
    let bhd = border_halfedge(mesh, &all).ok_or(UnfoldError::NoBoundary)?;

    let seed = seed_face(mesh, bhd)?;
    let faces = connected_component(mesh, seed);
    let index = VertexIndexMap::from_component(mesh, &faces);

    let mut uv = UVMap::zeros(mesh.num_vertices());
    let mut pinned = PinnedMap::new(mesh.num_vertices());
    LscmParameterizer::new(options.border.clone(), options.solver.clone())
        .parameterize_with_maps(mesh, bhd, &mut uv, &index, &mut pinned)?;

    if options.normalize {
        uv.normalize_vertices(index.vertices());
    }

    Ok(uv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::parameterize::PinnedVertex;
    use crate::linalg::DenseSvdSolver;
    use crate::mesh::{build_from_polygons, build_from_triangles, HalfEdgeMesh};
    use nalgebra::Point3;

    fn create_single_triangle() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap()
    }

    fn create_disk_mesh() -> HalfEdgeMesh {
        // Center vertex + 6 boundary vertices, lifted into a shallow cone
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.3),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 0.866, 0.0),
            Point3::new(-0.5, 0.866, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(-0.5, -0.866, 0.0),
            Point3::new(0.5, -0.866, 0.0),
        ];
        let faces = vec![
            [0, 1, 2],
            [0, 2, 3],
            [0, 3, 4],
            [0, 4, 5],
            [0, 5, 6],
            [0, 6, 1],
        ];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn create_grid_mesh(n: usize) -> HalfEdgeMesh {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();

        // (n+1)x(n+1) grid with a little in-plane shear
        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3::new(i as f64 + 0.25 * j as f64, j as f64, 0.0));
            }
        }

        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = j * (n + 1) + i + 1;
                let v01 = (j + 1) * (n + 1) + i;
                let v11 = (j + 1) * (n + 1) + i + 1;

                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }

        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn create_tetrahedron() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn pinned_at_positions(mesh: &HalfEdgeMesh, vertices: &[usize]) -> BorderStrategy {
        BorderStrategy::Pinned(
            vertices
                .iter()
                .map(|&i| {
                    let p = mesh.position(VertexId::new(i));
                    PinnedVertex::new(i, p.x, p.y)
                })
                .collect(),
        )
    }

    fn first_border(mesh: &HalfEdgeMesh) -> HalfEdgeId {
        mesh.boundary_halfedges().next().unwrap()
    }

    #[test]
    fn test_single_triangle_reproduces_itself() {
        let mesh = create_single_triangle();
        let border = pinned_at_positions(&mesh, &[0, 1]);

        for solver in [
            Arc::new(ConjugateGradientSolver::default()) as Arc<dyn LinearSolver>,
            Arc::new(DenseSvdSolver::default()),
        ] {
            let mut uv = UVMap::zeros(3);
            let report = LscmParameterizer::new(border.clone(), solver)
                .parameterize(&mesh, first_border(&mesh), &mut uv)
                .unwrap();

            assert_eq!(report.num_free, 2);
            let v2 = uv.get(VertexId::new(2));
            assert!((v2.x - 0.0).abs() < 1e-9, "u2 = {}", v2.x);
            assert!((v2.y - 1.0).abs() < 1e-9, "v2 = {}", v2.y);
            assert_eq!(uv.get(VertexId::new(1)), Point2::new(1.0, 0.0));
        }
    }

    #[test]
    fn test_flat_mesh_round_trip() {
        let mesh = create_grid_mesh(4);
        let border = pinned_at_positions(&mesh, &[0, 4]);
        let mut uv = UVMap::zeros(mesh.num_vertices());

        LscmParameterizer::new(border, Arc::new(ConjugateGradientSolver::default()))
            .parameterize(&mesh, first_border(&mesh), &mut uv)
            .unwrap();

        for v in mesh.vertex_ids() {
            let p = mesh.position(v);
            let q = uv.get(v);
            assert!(
                (p.x - q.x).abs() < 1e-7 && (p.y - q.y).abs() < 1e-7,
                "{:?}: {} vs {}",
                v,
                p,
                q
            );
        }
    }

    #[test]
    fn test_deterministic() {
        let mesh = create_disk_mesh();
        let a = lscm(&mesh, &LscmOptions::default()).unwrap();
        let b = lscm(&mesh, &LscmOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_lscm_disk_is_normalized() {
        let mesh = create_disk_mesh();
        let uv = lscm(&mesh, &LscmOptions::default()).unwrap();
        assert_eq!(uv.len(), 7);

        let (min, max) = uv.bounding_box().unwrap();
        assert!(min.x.abs() < 1e-9 && min.y.abs() < 1e-9);
        assert!((max.x.max(max.y) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_lscm_all_border_strategies() {
        let mesh = create_grid_mesh(3);
        for border in [
            BorderStrategy::TwoVertices,
            BorderStrategy::FarthestPair,
            BorderStrategy::Circular,
            pinned_at_positions(&mesh, &[0, 15]),
        ] {
            let options = LscmOptions::default().with_border(border.clone());
            let uv = lscm(&mesh, &options).unwrap();
            assert_eq!(uv.len(), 16, "{:?}", border);
            assert!(uv.iter().all(|(_, p)| p.x.is_finite() && p.y.is_finite()));
        }
    }

    #[test]
    fn test_lscm_closed_mesh_fails() {
        let mesh = create_tetrahedron();
        match lscm(&mesh, &LscmOptions::default()) {
            Err(UnfoldError::NoBoundary) => (),
            other => panic!("Expected NoBoundary error, got {:?}", other),
        }
    }

    #[test]
    fn test_single_pin_is_rejected() {
        let mesh = create_grid_mesh(2);
        let border = BorderStrategy::Pinned(vec![
            PinnedVertex::new(0, 0.0, 0.0),
            PinnedVertex::new(1, 0.0, 0.0),
        ]);
        let mut uv = UVMap::zeros(mesh.num_vertices());
        let result = LscmParameterizer::new(border, Arc::new(ConjugateGradientSolver::default()))
            .parameterize(&mesh, first_border(&mesh), &mut uv);
        assert!(matches!(result, Err(UnfoldError::BorderParameterization { .. })));
    }

    #[test]
    fn test_under_pinned_system_is_rank_deficient() {
        // One locked vertex leaves rotation and scale free
        let mesh = create_single_triangle();
        let index = VertexIndexMap::dense(3);
        let uv = UVMap::zeros(3);
        let mut pinned = PinnedMap::new(3);
        pinned.pin(VertexId::new(0));

        let mut system = LeastSquaresSystem::new(6);
        system.set_least_squares(true);
        initialize_system_from_mesh_border(&mut system, &mesh, &uv, &index, &pinned);
        system.begin_system();
        setup_triangle_relations(&mesh, FaceId::new(0), &index, &mut system).unwrap();
        system.end_system();

        assert_eq!(system.num_variables(), 6);
        assert_eq!(system.num_free(), 4);
        assert!(matches!(
            system.solve(&DenseSvdSolver::default()),
            Err(UnfoldError::CannotSolveLinearSystem { .. })
        ));
    }

    #[test]
    fn test_rows_of_single_triangle() {
        let mesh = create_single_triangle();
        let index = VertexIndexMap::dense(3);
        let mut system = LeastSquaresSystem::new(6);
        system.begin_system();
        setup_triangle_relations(&mesh, FaceId::new(0), &index, &mut system).unwrap();

        // Corners are walked 1, 2, 0: a = √2, c = d = √2 / 2
        let s = 2.0f64.sqrt();
        let rows = system.rows();
        assert_eq!(rows.len(), 2);
        let real: Vec<usize> = rows[0].coefficients.iter().map(|&(i, _)| i).collect();
        let imag: Vec<usize> = rows[1].coefficients.iter().map(|&(i, _)| i).collect();
        assert_eq!(real, vec![2, 3, 4, 5, 0]);
        assert_eq!(imag, vec![2, 3, 4, 5, 1]);

        let expected_real = [-s / 2.0, -s / 2.0, -s / 2.0, s / 2.0, s];
        for (&(_, got), want) in rows[0].coefficients.iter().zip(expected_real) {
            assert!((got - want).abs() < 1e-12, "{} vs {}", got, want);
        }
    }

    #[test]
    fn test_zero_area_triangle_does_not_disturb_neighbors() {
        // Triangle 0 is regular, triangle 1 shares its edge (1, 2) and is
        // collinear
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, -1.0, 0.0),
        ];
        let clean: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let mixed: HalfEdgeMesh =
            build_from_triangles(&vertices, &[[0, 1, 2], [2, 1, 3]]).unwrap();
        let index = VertexIndexMap::dense(4);

        let assemble = |mesh: &HalfEdgeMesh| {
            let mut system = LeastSquaresSystem::new(8);
            system.begin_system();
            for f in mesh.face_ids() {
                setup_triangle_relations(mesh, f, &index, &mut system).unwrap();
            }
            system.rows().to_vec()
        };

        let clean_rows = assemble(&clean);
        let mixed_rows = assemble(&mixed);
        assert_eq!(mixed_rows.len(), 4);
        assert_eq!(&mixed_rows[..2], &clean_rows[..]);
        for row in &mixed_rows[2..] {
            assert!(row.coefficients.iter().all(|&(_, c)| c.is_finite()));
        }

        // The full pipeline survives it as well
        let result = lscm(&mixed, &LscmOptions::default());
        if let Ok(uv) = result {
            assert!(uv.iter().all(|(_, p)| p.x.is_finite() && p.y.is_finite()));
        }
    }

    #[test]
    fn test_non_triangle_face_is_rejected() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces: Vec<Vec<usize>> = vec![vec![0, 1, 2, 3]];
        let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();

        match lscm(&mesh, &LscmOptions::default()) {
            Err(UnfoldError::TriangleSetup { face: 0, reason }) => {
                assert!(reason.contains("4 corners"), "{}", reason)
            }
            other => panic!("expected TriangleSetup, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_index_is_reported() {
        let mesh = create_single_triangle();
        let index = VertexIndexMap::from_vertices(3, &[VertexId::new(0), VertexId::new(1)]);
        let mut system = LeastSquaresSystem::new(4);
        system.begin_system();
        assert!(matches!(
            setup_triangle_relations(&mesh, FaceId::new(0), &index, &mut system),
            Err(UnfoldError::MissingVertexIndex { vertex: 2 })
        ));
    }

    #[test]
    fn test_only_component_vertices_are_written() {
        // Sheared grid plus a far away triangle
        let grid = create_grid_mesh(2);
        let mut vertices: Vec<Point3<f64>> = grid.vertex_ids().map(|v| *grid.position(v)).collect();
        let mut faces: Vec<[usize; 3]> = grid
            .face_ids()
            .map(|f| {
                let [a, b, c] = grid.face_triangle(f);
                [a.index(), b.index(), c.index()]
            })
            .collect();
        let base = vertices.len();
        vertices.extend([
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(11.0, 0.0, 0.0),
            Point3::new(10.0, 1.0, 0.0),
        ]);
        faces.push([base, base + 1, base + 2]);
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        let marker = Point2::new(-7.0, -7.0);
        let mut uv = UVMap::new(vec![marker; mesh.num_vertices()]);
        let bhd = first_border(&mesh);
        let report = parameterize(&mesh, bhd, &mut uv).unwrap();

        // Compact indexing: only the grid's 9 vertices, 2 of them locked
        assert_eq!(report.num_free, 2 * 9 - 4);
        for k in 0..3 {
            assert_eq!(uv.get(VertexId::new(base + k)), marker);
        }
        assert_ne!(uv.get(VertexId::new(4)), marker);
    }

    #[test]
    fn test_dense_index_over_whole_mesh() {
        // Initializer runs over all vertices; with a dense index the isolated
        // vertex is a free unknown no row touches, which CG leaves at its seed
        let mut vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        vertices.push(Point3::new(5.0, 5.0, 5.0));
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();

        let index = VertexIndexMap::dense(4);
        let mut uv = UVMap::zeros(4);
        uv.set(VertexId::new(3), Point2::new(0.25, 0.5));
        let mut pinned = PinnedMap::new(4);
        let parameterizer = LscmParameterizer::new(
            pinned_at_positions(&mesh, &[0, 1]),
            Arc::new(ConjugateGradientSolver::default().with_preconditioner(false)),
        );
        parameterizer
            .parameterize_with_maps(&mesh, first_border(&mesh), &mut uv, &index, &mut pinned)
            .unwrap();

        let v2 = uv.get(VertexId::new(2));
        assert!((v2.x - 0.0).abs() < 1e-9 && (v2.y - 1.0).abs() < 1e-9);
        assert_eq!(uv.get(VertexId::new(3)), Point2::new(0.25, 0.5));
    }

    #[test]
    fn test_lscm_empty_mesh() {
        let mesh: HalfEdgeMesh = HalfEdgeMesh::new();
        assert!(matches!(
            lscm(&mesh, &LscmOptions::default()),
            Err(UnfoldError::EmptyMesh)
        ));
    }
}
