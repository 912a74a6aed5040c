//! Texture atlas: LSCM on every connected component of a mesh.
//!
//! Each component (chart) is copied into its own small mesh, parameterized
//! independently and normalized. Charts are then placed left to right with a
//! margin between them and the whole atlas is fitted into [0, 1]².
//!
//! Closed components cannot be flattened without cuts and are skipped.

use nalgebra::{Point2, Point3, Vector2};
use rayon::prelude::*;

use crate::error::{Result, UnfoldError};
use crate::mesh::{build_from_polygons, FaceId, HalfEdgeMesh, MeshIndex, SurfaceMesh, VertexId};

use super::border::{BorderStrategy, PinnedVertex};
use super::component::{border_halfedge, connected_components};
use super::lscm::{LscmOptions, LscmParameterizer};
use super::maps::UVMap;

/// Options for [`lscm_atlas`].
#[derive(Debug, Clone)]
pub struct AtlasOptions {
    /// Per-chart LSCM options. `normalize` is ignored, charts are always
    /// normalized before packing.
    pub lscm: LscmOptions,

    /// Parameterize charts in parallel.
    pub parallel: bool,

    /// Horizontal gap between charts, relative to a unit chart.
    pub margin: f64,
}

impl Default for AtlasOptions {
    fn default() -> Self {
        Self {
            lscm: LscmOptions::default(),
            parallel: true,
            margin: 0.05,
        }
    }
}

impl AtlasOptions {
    /// Set the per-chart LSCM options.
    pub fn with_lscm(mut self, lscm: LscmOptions) -> Self {
        self.lscm = lscm;
        self
    }

    /// Enable or disable parallel chart processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the gap between charts.
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }
}

/// What happened to a chart.
#[derive(Debug)]
pub enum ChartStatus {
    /// Parameterized and placed in the atlas.
    Parameterized {
        /// Solver iterations.
        iterations: usize,
        /// Lower left corner of the chart before the atlas was rescaled.
        offset: Vector2<f64>,
    },
    /// The component has no boundary.
    Closed,
    /// Parameterization failed; the chart's vertices stay at the origin.
    Failed(UnfoldError),
}

/// One connected component of the mesh.
#[derive(Debug)]
pub struct Chart<I: MeshIndex = u32> {
    /// Faces of the component.
    pub faces: Vec<FaceId<I>>,
    /// Vertices of the component in first-seen order.
    pub vertices: Vec<VertexId<I>>,
    /// Outcome.
    pub status: ChartStatus,
}

impl<I: MeshIndex> Chart<I> {
    /// Check if the chart made it into the atlas.
    pub fn is_parameterized(&self) -> bool {
        matches!(self.status, ChartStatus::Parameterized { .. })
    }
}

/// Result of [`lscm_atlas`].
#[derive(Debug)]
pub struct Atlas<I: MeshIndex = u32> {
    /// UVs of the whole mesh.
    pub uv: UVMap<I>,
    /// Charts in component order.
    pub charts: Vec<Chart<I>>,
}

impl<I: MeshIndex> Atlas<I> {
    /// Number of charts that were parameterized.
    pub fn num_parameterized(&self) -> usize {
        self.charts.iter().filter(|c| c.is_parameterized()).count()
    }
}

/// A component copied into a standalone mesh.
struct ChartMesh<I: MeshIndex> {
    mesh: HalfEdgeMesh,
    /// Local vertex → vertex of the source mesh.
    vertices: Vec<VertexId<I>>,
}

fn extract_chart<M: SurfaceMesh>(
    mesh: &M,
    faces: &[FaceId<M::Index>],
) -> Result<ChartMesh<M::Index>> {
    let mut local = vec![usize::MAX; mesh.num_vertices()];
    let mut vertices = Vec::new();
    let mut positions: Vec<Point3<f64>> = Vec::new();

    let polygons: Vec<Vec<usize>> = faces
        .iter()
        .map(|&f| {
            mesh.halfedges_around_face(f)
                .map(|he| {
                    let v = mesh.target(he);
                    if local[v.index()] == usize::MAX {
                        local[v.index()] = vertices.len();
                        vertices.push(v);
                        positions.push(mesh.point(v));
                    }
                    local[v.index()]
                })
                .collect()
        })
        .collect();

    Ok(ChartMesh {
        mesh: build_from_polygons(&positions, &polygons)?,
        vertices,
    })
}

/// Translate the border strategy into the chart's local vertex numbering.
///
/// Explicit pins name vertices of the source mesh; pins on other charts are
/// dropped.
fn chart_border<I: MeshIndex>(border: &BorderStrategy, chart: &ChartMesh<I>) -> BorderStrategy {
    match border {
        BorderStrategy::Pinned(pins) => BorderStrategy::Pinned(
            pins.iter()
                .filter_map(|pin| {
                    let local = chart.vertices.iter().position(|v| v.index() == pin.vertex)?;
                    Some(PinnedVertex::new(local, pin.u, pin.v))
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Parameterize one chart into normalized local coordinates.
fn unfold_chart<I: MeshIndex>(
    chart: &ChartMesh<I>,
    options: &LscmOptions,
) -> Result<Option<(UVMap, usize)>> {
    let faces: Vec<FaceId> = chart.mesh.face_ids().collect();
    let Some(bhd) = border_halfedge(&chart.mesh, &faces) else {
        return Ok(None);
    };

    let mut uv = UVMap::zeros(chart.mesh.num_vertices());
    let border = chart_border(&options.border, chart);
    let report = LscmParameterizer::new(border, options.solver.clone())
        .parameterize(&chart.mesh, bhd, &mut uv)?;
    uv.normalize();

    Ok(Some((uv, report.iterations)))
}

/// Compute an LSCM texture atlas over all components of `mesh`.
///
/// A chart that fails to parameterize does not abort the atlas; its error is
/// recorded in [`ChartStatus::Failed`].
///
/// [`BorderStrategy::Pinned`] vertices are given in the numbering of `mesh`.
/// Each chart keeps the pins that fall on it, so a chart with fewer than two
/// fails with [`UnfoldError::BorderParameterization`].
///
/// # Errors
///
/// [`UnfoldError::EmptyMesh`] if the mesh has no faces, or any error from
/// copying a component into its own mesh.
///
/// # Example
///
/// ```
/// use unfold::algo::parameterize::{lscm_atlas, AtlasOptions};
/// use unfold::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(5.0, 0.0, 0.0),
///     Point3::new(6.0, 0.0, 0.0),
///     Point3::new(5.0, 1.0, 0.0),
/// ];
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2], [3, 4, 5]]).unwrap();
///
/// let atlas = lscm_atlas(&mesh, &AtlasOptions::default()).unwrap();
/// assert_eq!(atlas.charts.len(), 2);
/// assert_eq!(atlas.num_parameterized(), 2);
/// ```
pub fn lscm_atlas<M: SurfaceMesh>(mesh: &M, options: &AtlasOptions) -> Result<Atlas<M::Index>> {
    if mesh.num_faces() == 0 {
        return Err(UnfoldError::EmptyMesh);
    }

    let components = connected_components(mesh);
    let charts = components
        .iter()
        .map(|faces| extract_chart(mesh, faces))
        .collect::<Result<Vec<_>>>()?;
    log::debug!("atlas: {} components", charts.len());

    let unfold = |chart: &ChartMesh<M::Index>| unfold_chart(chart, &options.lscm);
    let results: Vec<Result<Option<(UVMap, usize)>>> = if options.parallel {
        charts.par_iter().map(unfold).collect()
    } else {
        charts.iter().map(unfold).collect()
    };

    // Pack in component order so the layout does not depend on scheduling
    let mut uv = UVMap::zeros(mesh.num_vertices());
    let mut placed: Vec<VertexId<M::Index>> = Vec::new();
    let mut cursor = 0.0;
    let mut out = Vec::with_capacity(charts.len());

    for ((faces, chart), result) in components.into_iter().zip(charts).zip(results) {
        let status = match result {
            Ok(Some((local, iterations))) => {
                let offset = Vector2::new(cursor, 0.0);
                let mut width: f64 = 0.0;
                for (k, &v) in chart.vertices.iter().enumerate() {
                    let p = local.as_slice()[k];
                    uv.set(v, p + offset);
                    width = width.max(p.x);
                }
                placed.extend_from_slice(&chart.vertices);
                cursor += width + options.margin;
                ChartStatus::Parameterized { iterations, offset }
            }
            Ok(None) => {
                log::warn!("atlas: skipping closed component of {} faces", faces.len());
                ChartStatus::Closed
            }
            Err(e) => {
                log::warn!("atlas: component of {} faces failed: {}", faces.len(), e);
                ChartStatus::Failed(e)
            }
        };
        out.push(Chart {
            faces,
            vertices: chart.vertices,
            status,
        });
    }

    // Fit the packed charts into the unit square, keeping the origin fixed
    if let Some((_, max)) = uv.bounding_box_of(&placed) {
        let scale = max.x.max(max.y);
        if scale > 1.0 {
            for &v in &placed {
                let p = uv.get(v);
                uv.set(v, Point2::from(p.coords / scale));
            }
        }
    }

    Ok(Atlas { uv, charts: out })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;

    /// A flat square, a tetrahedron and a slanted triangle.
    fn three_components() -> HalfEdgeMesh {
        let vertices = vec![
            // square
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            // tetrahedron
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(3.5, 1.0, 0.0),
            Point3::new(3.5, 0.5, 1.0),
            // triangle
            Point3::new(6.0, 0.0, 0.0),
            Point3::new(7.0, 0.0, 1.0),
            Point3::new(6.0, 2.0, 0.0),
        ];
        let faces = vec![
            [0, 1, 2],
            [0, 2, 3],
            [4, 6, 5],
            [4, 5, 7],
            [5, 6, 7],
            [6, 4, 7],
            [8, 9, 10],
        ];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_atlas_charts() {
        let mesh = three_components();
        let atlas = lscm_atlas(&mesh, &AtlasOptions::default()).unwrap();

        assert_eq!(atlas.charts.len(), 3);
        assert!(atlas.charts[0].is_parameterized());
        assert!(matches!(atlas.charts[1].status, ChartStatus::Closed));
        assert!(atlas.charts[2].is_parameterized());
        assert_eq!(atlas.num_parameterized(), 2);

        // Closed chart stays at the origin
        for &v in &atlas.charts[1].vertices {
            assert_eq!(atlas.uv.get(v), Point2::origin());
        }
    }

    #[test]
    fn test_atlas_layout() {
        let mesh = three_components();
        let atlas = lscm_atlas(&mesh, &AtlasOptions::default().with_margin(0.5)).unwrap();

        let first = atlas.uv.bounding_box_of(&atlas.charts[0].vertices).unwrap();
        let last = atlas.uv.bounding_box_of(&atlas.charts[2].vertices).unwrap();
        // Charts do not overlap and sit left to right
        assert!(first.1.x < last.0.x);

        let all: Vec<_> = atlas
            .charts
            .iter()
            .filter(|c| c.is_parameterized())
            .flat_map(|c| c.vertices.iter().copied())
            .collect();
        let (min, max) = atlas.uv.bounding_box_of(&all).unwrap();
        assert!(min.x >= -1e-12 && min.y >= -1e-12);
        assert!(max.x <= 1.0 + 1e-12 && max.y <= 1.0 + 1e-12);
    }

    #[test]
    fn test_atlas_parallel_matches_sequential() {
        let mesh = three_components();
        let parallel = lscm_atlas(&mesh, &AtlasOptions::default()).unwrap();
        let sequential = lscm_atlas(&mesh, &AtlasOptions::default().with_parallel(false)).unwrap();
        assert_eq!(parallel.uv, sequential.uv);
    }

    #[test]
    fn test_atlas_records_failures() {
        let mesh = three_components();
        let options = AtlasOptions::default().with_lscm(
            LscmOptions::default().with_border(BorderStrategy::Pinned(vec![])),
        );
        let atlas = lscm_atlas(&mesh, &options).unwrap();
        assert_eq!(atlas.num_parameterized(), 0);
        assert!(matches!(
            atlas.charts[0].status,
            ChartStatus::Failed(UnfoldError::BorderParameterization { .. })
        ));
    }

    #[test]
    fn test_atlas_pins_use_source_numbering() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(6.0, 0.0, 0.0),
            Point3::new(5.0, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh =
            build_from_triangles(&vertices, &[[0, 1, 2], [3, 4, 5]]).unwrap();
        let pinned = |pins: Vec<PinnedVertex>| {
            AtlasOptions::default()
                .with_lscm(LscmOptions::default().with_border(BorderStrategy::Pinned(pins)))
        };

        // Pins only on the second triangle: the first has none left
        let atlas = lscm_atlas(
            &mesh,
            &pinned(vec![PinnedVertex::new(3, 0.0, 0.0), PinnedVertex::new(4, 1.0, 0.0)]),
        )
        .unwrap();
        assert!(matches!(
            atlas.charts[0].status,
            ChartStatus::Failed(UnfoldError::BorderParameterization { .. })
        ));
        assert!(atlas.charts[1].is_parameterized());
        let expected = [(3, 0.0, 0.0), (4, 1.0, 0.0), (5, 0.0, 1.0)];
        for (i, u, v) in expected {
            let p = atlas.uv.get(VertexId::new(i));
            assert!((p.x - u).abs() < 1e-6 && (p.y - v).abs() < 1e-6, "{}: {}", i, p);
        }

        // Pins on both triangles
        let atlas = lscm_atlas(
            &mesh,
            &pinned(vec![
                PinnedVertex::new(0, 0.0, 0.0),
                PinnedVertex::new(1, 1.0, 0.0),
                PinnedVertex::new(4, 1.0, 0.0),
                PinnedVertex::new(3, 0.0, 0.0),
            ]),
        )
        .unwrap();
        assert_eq!(atlas.num_parameterized(), 2);
    }

    #[test]
    fn test_chart_border_keeps_other_strategies() {
        let mesh = three_components();
        let chart = extract_chart(&mesh, &[FaceId::new(6)]).unwrap();
        assert!(matches!(
            chart_border(&BorderStrategy::Circular, &chart),
            BorderStrategy::Circular
        ));
        let pins = vec![PinnedVertex::new(10, 0.5, 0.5), PinnedVertex::new(0, 1.0, 1.0)];
        match chart_border(&BorderStrategy::Pinned(pins), &chart) {
            BorderStrategy::Pinned(pins) => {
                assert_eq!(pins.len(), 1);
                assert_eq!(pins[0].vertex, 1);
            }
            other => panic!("expected pins, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_chart() {
        let mesh = three_components();
        let faces = vec![FaceId::new(6)];
        let chart = extract_chart(&mesh, &faces).unwrap();
        assert_eq!(chart.mesh.num_vertices(), 3);
        assert_eq!(chart.mesh.num_faces(), 1);
        assert_eq!(
            chart.vertices.iter().map(|v| v.index()).collect::<Vec<_>>(),
            vec![9, 10, 8]
        );
    }
}
