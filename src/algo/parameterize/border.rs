//! Border parameterization: choosing and placing the pinned vertices.
//!
//! LSCM only determines the map up to a similarity, so at least two vertices
//! need fixed UVs before the system can be solved. A [`BorderParameterizer`]
//! picks those vertices, writes their UV and sets their pinned flag. It must
//! not touch the flags of vertices it does not pin.

use std::f64::consts::TAU;

use nalgebra::{Point2, Point3};

use crate::error::{Result, UnfoldError};
use crate::mesh::{HalfEdgeId, SurfaceMesh, VertexId};

use super::component::{component_vertices, connected_component};
use super::maps::{PinnedMap, UVMap};

/// A strategy that pins border (or other) vertices before the solve.
pub trait BorderParameterizer {
    /// Pin vertices of the component bounded by the border half-edge `bhd`.
    ///
    /// # Errors
    ///
    /// [`UnfoldError::BorderParameterization`] if the strategy cannot pin
    /// two vertices with distinct UVs.
    fn parameterize_border<M: SurfaceMesh>(
        &self,
        mesh: &M,
        bhd: HalfEdgeId<M::Index>,
        uv: &mut UVMap<M::Index>,
        pinned: &mut PinnedMap<M::Index>,
    ) -> Result<()>;
}

/// Vertices around the hole of `bhd`, starting at its target.
///
/// Fails if the `next` chain does not lead back to `bhd`.
fn border_loop<M: SurfaceMesh>(
    mesh: &M,
    bhd: HalfEdgeId<M::Index>,
) -> Result<Vec<VertexId<M::Index>>> {
    if !mesh.is_border(bhd) {
        return Err(UnfoldError::border(format!("{:?} is not a border half-edge", bhd)));
    }

    let halfedges: Vec<_> = mesh.halfedges_around_hole(bhd).collect();
    match halfedges.last() {
        Some(&last) if mesh.next(last) == bhd => {}
        _ => {
            return Err(UnfoldError::border(format!(
                "hole of {:?} does not close after {} half-edges",
                bhd,
                halfedges.len()
            )))
        }
    }

    Ok(halfedges.into_iter().map(|he| mesh.target(he)).collect())
}

/// Pin the two extreme vertices along the longest bounding box axis.
///
/// All vertices of the component are projected onto the two longest axes of
/// its bounding box; the vertices with the smallest and largest coordinate
/// along the longest one are pinned. U spans [0, 1] and V uses the same
/// scale, so the pins keep their relative 3D placement.
///
/// The pinned vertices need not lie on the border.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoVerticesBorder;

impl BorderParameterizer for TwoVerticesBorder {
    fn parameterize_border<M: SurfaceMesh>(
        &self,
        mesh: &M,
        bhd: HalfEdgeId<M::Index>,
        uv: &mut UVMap<M::Index>,
        pinned: &mut PinnedMap<M::Index>,
    ) -> Result<()> {
        let seed = mesh
            .face(mesh.opposite(bhd))
            .ok_or_else(|| UnfoldError::border("border half-edge has no face on its other side"))?;
        let faces = connected_component(mesh, seed);
        let vertices = component_vertices(mesh, &faces);
        if vertices.len() < 2 {
            return Err(UnfoldError::border("component has fewer than two vertices"));
        }

        let points: Vec<Point3<f64>> = vertices.iter().map(|&v| mesh.point(v)).collect();

        // Longest and second longest axes of the bounding box
        let mut min = points[0];
        let mut max = points[0];
        for p in &points {
            min = min.inf(p);
            max = max.sup(p);
        }
        let extent = max - min;
        let mut axes = [0usize, 1, 2];
        axes.sort_by(|&a, &b| extent[b].total_cmp(&extent[a]));
        let (long, second) = (axes[0], axes[1]);

        if extent[long] <= 0.0 {
            return Err(UnfoldError::border("component has zero extent"));
        }

        let mut vmin = 0;
        let mut vmax = 0;
        for (i, p) in points.iter().enumerate() {
            if p[long] < points[vmin][long] {
                vmin = i;
            }
            if p[long] > points[vmax][long] {
                vmax = i;
            }
        }
        if vmin == vmax {
            return Err(UnfoldError::border("extreme vertices coincide"));
        }

        let scale = 1.0 / extent[long];
        for i in [vmin, vmax] {
            let p = points[i];
            let v = vertices[i];
            uv.set(
                v,
                Point2::new((p[long] - min[long]) * scale, (p[second] - min[second]) * scale),
            );
            pinned.pin(v);
        }

        log::trace!(
            "two-vertices border: pinned {:?} and {:?}",
            vertices[vmin],
            vertices[vmax]
        );
        Ok(())
    }
}

/// Pin the two border vertices farthest apart at `(0, 0)` and `(d, 0)`,
/// `d` being their 3D distance.
///
/// Only the loop containing `bhd` is searched.
#[derive(Debug, Clone, Copy, Default)]
pub struct FarthestPairBorder;

impl BorderParameterizer for FarthestPairBorder {
    fn parameterize_border<M: SurfaceMesh>(
        &self,
        mesh: &M,
        bhd: HalfEdgeId<M::Index>,
        uv: &mut UVMap<M::Index>,
        pinned: &mut PinnedMap<M::Index>,
    ) -> Result<()> {
        let border = border_loop(mesh, bhd)?;
        let points: Vec<Point3<f64>> = border.iter().map(|&v| mesh.point(v)).collect();

        let mut max_dist = 0.0;
        let mut best = None;
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                let dist = (points[j] - points[i]).norm_squared();
                if dist > max_dist {
                    max_dist = dist;
                    best = Some((i, j));
                }
            }
        }

        let (i, j) = best.ok_or_else(|| UnfoldError::border("border vertices all coincide"))?;

        uv.set(border[i], Point2::origin());
        uv.set(border[j], Point2::new(max_dist.sqrt(), 0.0));
        pinned.pin(border[i]);
        pinned.pin(border[j]);
        Ok(())
    }
}

/// A vertex pinned to a specific UV coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinnedVertex {
    /// The vertex index to pin.
    pub vertex: usize,
    /// The fixed U coordinate.
    pub u: f64,
    /// The fixed V coordinate.
    pub v: f64,
}

impl PinnedVertex {
    /// Create a new pinned vertex.
    pub fn new(vertex: usize, u: f64, v: f64) -> Self {
        Self { vertex, u, v }
    }
}

/// Pin caller-chosen vertices at caller-chosen UVs.
#[derive(Debug, Clone, Default)]
pub struct PinnedVerticesBorder {
    /// The pins.
    pub pins: Vec<PinnedVertex>,
}

impl PinnedVerticesBorder {
    /// Create a strategy from a list of pins.
    pub fn new(pins: Vec<PinnedVertex>) -> Self {
        Self { pins }
    }
}

impl BorderParameterizer for PinnedVerticesBorder {
    fn parameterize_border<M: SurfaceMesh>(
        &self,
        mesh: &M,
        _bhd: HalfEdgeId<M::Index>,
        uv: &mut UVMap<M::Index>,
        pinned: &mut PinnedMap<M::Index>,
    ) -> Result<()> {
        pin_vertices(&self.pins, mesh, uv, pinned)
    }
}

fn pin_vertices<M: SurfaceMesh>(
    pins: &[PinnedVertex],
    mesh: &M,
    uv: &mut UVMap<M::Index>,
    pinned: &mut PinnedMap<M::Index>,
) -> Result<()> {
    if pins.len() < 2 {
        return Err(UnfoldError::border(format!(
            "need at least two pinned vertices, got {}",
            pins.len()
        )));
    }
    if let Some(pin) = pins.iter().find(|p| p.vertex >= mesh.num_vertices()) {
        return Err(UnfoldError::border(format!(
            "pinned vertex {} out of range ({} vertices)",
            pin.vertex,
            mesh.num_vertices()
        )));
    }
    let first = pins[0];
    if pins.iter().all(|p| p.u == first.u && p.v == first.v) {
        return Err(UnfoldError::border("all pins share the same UV"));
    }

    for pin in pins {
        let v = VertexId::new(pin.vertex);
        uv.set(v, Point2::new(pin.u, pin.v));
        pinned.pin(v);
    }
    Ok(())
}

/// Pin every vertex of the border loop on the unit circle.
///
/// Vertices are spaced by arc length along the loop, starting at the target
/// of `bhd` at angle zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircularBorder;

impl BorderParameterizer for CircularBorder {
    fn parameterize_border<M: SurfaceMesh>(
        &self,
        mesh: &M,
        bhd: HalfEdgeId<M::Index>,
        uv: &mut UVMap<M::Index>,
        pinned: &mut PinnedMap<M::Index>,
    ) -> Result<()> {
        let border = border_loop(mesh, bhd)?;
        if border.len() < 3 {
            return Err(UnfoldError::border(format!(
                "border loop has {} vertices",
                border.len()
            )));
        }

        let n = border.len();
        let lengths: Vec<f64> = (0..n)
            .map(|k| (mesh.point(border[(k + 1) % n]) - mesh.point(border[k])).norm())
            .collect();
        let total: f64 = lengths.iter().sum();
        if total <= 0.0 {
            return Err(UnfoldError::border("border loop has zero length"));
        }

        let mut arc = 0.0;
        for (k, &v) in border.iter().enumerate() {
            let angle = TAU * arc / total;
            uv.set(v, Point2::new(angle.cos(), angle.sin()));
            pinned.pin(v);
            arc += lengths[k];
        }
        Ok(())
    }
}

/// Runtime choice of border strategy.
#[derive(Debug, Clone, Default)]
pub enum BorderStrategy {
    /// See [`TwoVerticesBorder`].
    #[default]
    TwoVertices,
    /// See [`FarthestPairBorder`].
    FarthestPair,
    /// See [`PinnedVerticesBorder`].
    Pinned(Vec<PinnedVertex>),
    /// See [`CircularBorder`].
    Circular,
}

impl BorderParameterizer for BorderStrategy {
    fn parameterize_border<M: SurfaceMesh>(
        &self,
        mesh: &M,
        bhd: HalfEdgeId<M::Index>,
        uv: &mut UVMap<M::Index>,
        pinned: &mut PinnedMap<M::Index>,
    ) -> Result<()> {
        match self {
            BorderStrategy::TwoVertices => {
                TwoVerticesBorder.parameterize_border(mesh, bhd, uv, pinned)
            }
            BorderStrategy::FarthestPair => {
                FarthestPairBorder.parameterize_border(mesh, bhd, uv, pinned)
            }
            BorderStrategy::Pinned(pins) => pin_vertices(pins, mesh, uv, pinned),
            BorderStrategy::Circular => CircularBorder.parameterize_border(mesh, bhd, uv, pinned),
        }
    }
}
