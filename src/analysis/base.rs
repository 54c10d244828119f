// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Base footprint extraction
//!
//! Vertices in a thin band above the lowest point are projected onto the
//! (x, z) ground plane and traced into an ordered, simple, counter-clockwise
//! polygon.
//!
//! The tracers read an outline source rather than every band vertex. When
//! faces lie wholly inside the band, the source is their boundary: edges used
//! by exactly one such face. Interior cap vertices such as a fan apex never
//! reach the tracer. Meshes without band faces fall back to the band
//! vertices. An optional slice above the base replaces both.
//!
//! Three tracers are available:
//!
//! - **Convex hull**: minimal and robust, but fills in a flat or concave back.
//! - **Radial trace**: keeps the farthest point of each angular sector around
//!   the outline centroid. Preserves the flat back of a D-shaped base.
//! - **Grid trace**: outer contour of a hole-filled occupancy grid, smoothed
//!   with a moving average. The outline edges are rasterized so a coarse
//!   base still closes into one region.
//!
//! The extractor never widens its own band. Callers that want to retry on
//! [`AnalysisError::InsufficientBaseGeometry`] do so themselves.

use crate::config::{AnalysisConfig, BoundaryMethod};
use crate::error::{AnalysisError, AnalysisResult};
use crate::geometry::polygon::{self, convex_hull, dedup_ring, find_self_intersection, signed_area};
use crate::geometry::Mesh;
use ahash::AHashMap;
use nalgebra::{Point2, Point3, Vector2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use tracing::debug;

/// Relative area below which a ring is treated as collinear
const COLLINEAR_EPSILON: f64 = 1e-12;

/// Grid padding as a fraction of the candidate extent
const GRID_PADDING: f64 = 0.02;

/// A slice must hold more vertices than this to replace the base band
pub const MIN_SLICE_VERTICES: usize = 10;

/// Half-thickness of the outline slice, relative to its height above ground
const SLICE_HALF_WIDTH: f64 = 0.1;

/// Ground level and height of a mesh along Y
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerticalExtent {
    pub ground: f64,
    pub top: f64,
}

impl VerticalExtent {
    pub fn of(mesh: &Mesh) -> AnalysisResult<Self> {
        if mesh.vertices.is_empty() {
            return Err(AnalysisError::degenerate("mesh has no vertices"));
        }
        let bbox = mesh.bounding_box();
        let extent = Self {
            ground: bbox.min.y,
            top: bbox.max.y,
        };
        if !(extent.height() > COLLINEAR_EPSILON * bbox.diagonal()) {
            return Err(AnalysisError::degenerate(format!(
                "mesh has no vertical extent (height {:e})",
                extent.height()
            )));
        }
        Ok(extent)
    }

    pub fn height(&self) -> f64 {
        self.top - self.ground
    }
}

/// Where the traced outline points came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlineSource {
    /// Boundary of the faces lying wholly inside the base band
    BandBoundary,
    /// Every vertex in the base band
    BandVertices,
    /// Vertices of a thin horizontal slice above the base
    Slice,
    /// Polygon handed in by the caller
    Supplied,
}

impl fmt::Display for OutlineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BandBoundary => "band boundary",
            Self::BandVertices => "band vertices",
            Self::Slice => "slice",
            Self::Supplied => "supplied",
        };
        write!(f, "{}", name)
    }
}

/// Ground-contact outline of a mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseFootprint {
    /// Counter-clockwise ring in (x, z), no repeated closing point
    pub polygon: Vec<Point2<f64>>,
    /// Lowest Y of the mesh
    pub ground_level: f64,
    /// Upper Y of the candidate band
    pub band_top: f64,
    /// Vertices that fell inside the band
    pub candidate_count: usize,
    /// Tracer used; `None` for footprints supplied directly
    pub method: Option<BoundaryMethod>,
    pub outline: OutlineSource,
}

impl BaseFootprint {
    /// Wrap an existing outline, enforcing the same invariants as extraction
    pub fn from_polygon(points: Vec<Point2<f64>>) -> AnalysisResult<Self> {
        let candidate_count = points.len();
        let polygon = finalize_ring(&points, 0.0, candidate_count, 0.0)?;
        Ok(Self {
            polygon,
            ground_level: 0.0,
            band_top: 0.0,
            candidate_count,
            method: None,
            outline: OutlineSource::Supplied,
        })
    }

    pub fn len(&self) -> usize {
        self.polygon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygon.is_empty()
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.polygon).abs()
    }

    /// Area centroid of the outline
    pub fn centroid(&self) -> Point2<f64> {
        polygon::area_centroid(&self.polygon)
    }

    /// Axis-aligned bounds as (min, max)
    pub fn bounds(&self) -> (Point2<f64>, Point2<f64>) {
        polygon::bounds(&self.polygon).unwrap_or((Point2::origin(), Point2::origin()))
    }

    /// Extent along X
    pub fn width(&self) -> f64 {
        let (min, max) = self.bounds();
        max.x - min.x
    }

    /// Extent along Z
    pub fn depth(&self) -> f64 {
        let (min, max) = self.bounds();
        max.y - min.y
    }

    /// Edges as (start, end) pairs; edge `i` starts at vertex `i`
    pub fn edges(&self) -> impl Iterator<Item = (Point2<f64>, Point2<f64>)> + '_ {
        let n = self.polygon.len();
        (0..n).map(move |i| (self.polygon[i], self.polygon[(i + 1) % n]))
    }
}

fn project(v: &Point3<f64>) -> Point2<f64> {
    Point2::new(v.x, v.z)
}

/// Project the vertices at or below `band_top` onto the ground plane
pub fn base_candidates(mesh: &Mesh, band_top: f64) -> Vec<Point2<f64>> {
    mesh.vertices
        .iter()
        .filter(|v| v.y <= band_top)
        .map(project)
        .collect()
}

/// Boundary of the faces whose three corners sit at or below `band_top`.
///
/// Vertices sharing exact coordinates are welded first. Each returned pair is
/// an edge used by exactly one band face, as indices of the first vertex at
/// each position. Edges come out in face order.
pub fn band_boundary_edges(mesh: &Mesh, band_top: f64) -> Vec<[usize; 2]> {
    let mut first_at: AHashMap<[u64; 3], usize> = AHashMap::with_capacity(mesh.vertices.len());
    let welded: Vec<usize> = mesh
        .vertices
        .iter()
        .enumerate()
        .map(|(i, v)| {
            // Adding zero folds -0.0 into 0.0
            let key = [(v.x + 0.0).to_bits(), (v.y + 0.0).to_bits(), (v.z + 0.0).to_bits()];
            *first_at.entry(key).or_insert(i)
        })
        .collect();

    let band_faces: Vec<[usize; 3]> = mesh
        .triangles
        .iter()
        .map(|t| t.indices.map(|i| welded[i]))
        .filter(|face| face.iter().all(|&i| mesh.vertices[i].y <= band_top))
        .collect();

    let face_edges = |face: &[usize; 3]| {
        [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])]
            .into_iter()
            .filter(|(a, b)| a != b)
    };

    let mut uses: AHashMap<(usize, usize), usize> = AHashMap::new();
    for face in &band_faces {
        for (a, b) in face_edges(face) {
            *uses.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }

    band_faces
        .iter()
        .flat_map(|face| face_edges(face))
        .filter(|&(a, b)| uses.get(&(a.min(b), a.max(b))) == Some(&1))
        .map(|(a, b)| [a, b])
        .collect()
}

/// Projected vertices within a thin slice `fraction` of the height above ground
pub fn slice_points(mesh: &Mesh, extent: &VerticalExtent, fraction: f64) -> Vec<Point2<f64>> {
    let offset = fraction * extent.height();
    let level = extent.ground + offset;
    let half_width = SLICE_HALF_WIDTH * offset;
    mesh.vertices
        .iter()
        .filter(|v| (v.y - level).abs() <= half_width)
        .map(project)
        .collect()
}

/// Points and optional edges the tracers work from
#[derive(Debug, Clone)]
struct Outline {
    source: OutlineSource,
    points: Vec<Point2<f64>>,
    segments: Vec<(Point2<f64>, Point2<f64>)>,
}

fn select_outline(
    mesh: &Mesh,
    extent: &VerticalExtent,
    band_top: f64,
    fraction: Option<f64>,
    candidates: &[Point2<f64>],
) -> Outline {
    if let Some(fraction) = fraction {
        let points = slice_points(mesh, extent, fraction);
        if points.len() > MIN_SLICE_VERTICES {
            return Outline {
                source: OutlineSource::Slice,
                points,
                segments: Vec::new(),
            };
        }
        debug!(fraction, found = points.len(), "outline slice too sparse, using the base band");
    }

    let edges = band_boundary_edges(mesh, band_top);
    if !edges.is_empty() {
        let mut covered = vec![false; mesh.vertices.len()];
        for triangle in &mesh.triangles {
            if triangle.indices.iter().all(|&i| mesh.vertices[i].y <= band_top) {
                for &i in &triangle.indices {
                    covered[i] = true;
                }
            }
        }

        let mut taken = vec![false; mesh.vertices.len()];
        let mut points = Vec::new();
        for index in edges.iter().flatten().copied() {
            if !taken[index] {
                taken[index] = true;
                points.push(project(&mesh.vertices[index]));
            }
        }
        // Band vertices outside every band face touch the ground on their own
        points.extend(
            mesh.vertices
                .iter()
                .enumerate()
                .filter(|&(i, v)| v.y <= band_top && !covered[i])
                .map(|(_, v)| project(v)),
        );

        if spans_area(&points) {
            let segments = edges
                .iter()
                .map(|&[a, b]| (project(&mesh.vertices[a]), project(&mesh.vertices[b])))
                .collect();
            return Outline {
                source: OutlineSource::BandBoundary,
                points,
                segments,
            };
        }
    }

    Outline {
        source: OutlineSource::BandVertices,
        points: candidates.to_vec(),
        segments: Vec::new(),
    }
}

/// Whether the points enclose a non-negligible area
fn spans_area(points: &[Point2<f64>]) -> bool {
    if points.len() < 3 {
        return false;
    }
    let hull = convex_hull(points);
    let spread = polygon::bounds_extent(points);
    hull.len() >= 3 && signed_area(&hull).abs() > COLLINEAR_EPSILON * spread * spread
}

/// Extract the footprint with the tolerances and tracer from `config`
pub fn extract_footprint(mesh: &Mesh, config: &AnalysisConfig) -> AnalysisResult<BaseFootprint> {
    mesh.validate()?;
    let extent = VerticalExtent::of(mesh)?;
    let height = extent.height();
    let band = config.base_tolerance * height;
    let band_top = extent.ground + band;

    let candidates = base_candidates(mesh, band_top);
    debug!(
        ground = extent.ground,
        band_top,
        candidates = candidates.len(),
        "selected base candidates"
    );

    if candidates.len() < 3 {
        return Err(AnalysisError::insufficient_base(
            candidates.len(),
            band,
            "need at least 3 vertices in the base band",
        ));
    }

    if !spans_area(&candidates) {
        let hull = convex_hull(&candidates);
        return Err(AnalysisError::insufficient_base(
            hull.len().min(2),
            band,
            "base candidates are collinear",
        ));
    }

    let outline = select_outline(mesh, &extent, band_top, config.outline_slice, &candidates);
    debug!(
        source = ?outline.source,
        points = outline.points.len(),
        edges = outline.segments.len(),
        "selected outline source"
    );

    let merge_distance = config.dedup_tolerance * height;
    let traced = match config.boundary {
        BoundaryMethod::ConvexHull => convex_hull(&outline.points),
        BoundaryMethod::RadialTrace { bins } => radial_trace(&outline.points, bins, merge_distance),
        BoundaryMethod::GridTrace {
            resolution,
            smoothing,
        } => grid_trace(&outline.points, &outline.segments, resolution, smoothing).ok_or_else(|| {
            AnalysisError::insufficient_base(
                outline.points.len(),
                band,
                "base outline splits into separate regions on the occupancy grid",
            )
        })?,
    };

    let polygon = finalize_ring(&traced, merge_distance, candidates.len(), band)?;
    debug!(
        method = %config.boundary,
        points = polygon.len(),
        area = signed_area(&polygon),
        "traced base footprint"
    );

    Ok(BaseFootprint {
        polygon,
        ground_level: extent.ground,
        band_top,
        candidate_count: candidates.len(),
        method: Some(config.boundary),
        outline: outline.source,
    })
}

/// Farthest point per angular sector around the candidate centroid, in angle order
pub fn radial_trace(points: &[Point2<f64>], bins: usize, merge_distance: f64) -> Vec<Point2<f64>> {
    if points.is_empty() || bins == 0 {
        return Vec::new();
    }

    let center = points
        .iter()
        .fold(Vector2::zeros(), |acc, p| acc + p.coords)
        / points.len() as f64;
    let center = Point2::from(center);

    let mut farthest: Vec<Option<(f64, Point2<f64>)>> = vec![None; bins];
    for p in points {
        let offset = p - center;
        let radius = offset.norm();
        if radius <= merge_distance {
            continue;
        }

        let angle = offset.y.atan2(offset.x);
        let sector = (((angle + PI) / (2.0 * PI)) * bins as f64).floor() as usize;
        let sector = sector.min(bins - 1);

        match farthest[sector] {
            Some((best, _)) if best >= radius => {}
            _ => farthest[sector] = Some((radius, *p)),
        }
    }

    farthest.into_iter().flatten().map(|(_, p)| p).collect()
}

/// Outer contour of an occupancy grid over the points, smoothed.
///
/// Every point marks its cell and every segment is rasterized as a
/// 4-connected run of cells, so a closed outline stays closed however coarse
/// its vertices are. Without segments the points are joined in angle order
/// around their mean. Empty cells that cannot reach the grid border through
/// 4-connected empty cells are filled next. The walk keeps filled cells on
/// its left, so the ring comes out counter-clockwise.
///
/// Returns `None` when the filled cells form more than one region, since a
/// single contour would then drop part of the base.
pub fn grid_trace(
    points: &[Point2<f64>],
    segments: &[(Point2<f64>, Point2<f64>)],
    resolution: usize,
    smoothing: usize,
) -> Option<Vec<Point2<f64>>> {
    let Some((min, max)) = polygon::bounds(points) else {
        return Some(Vec::new());
    };
    if resolution < 2 {
        return Some(Vec::new());
    }

    let padding = GRID_PADDING * (max.x - min.x).max(max.y - min.y);
    let origin = Point2::new(min.x - padding, min.y - padding);
    let cells = resolution - 1;
    let step = Vector2::new(
        (max.x - min.x + 2.0 * padding) / cells as f64,
        (max.y - min.y + 2.0 * padding) / cells as f64,
    );
    if !(step.x > 0.0 && step.y > 0.0) {
        return Some(Vec::new());
    }

    // One empty cell of margin on every side; rows follow z, columns follow x
    let side = cells + 2;
    let cell_of = |p: &Point2<f64>| -> (usize, usize) {
        let col = (((p.x - origin.x) / step.x).floor() as isize).clamp(0, cells as isize - 1);
        let row = (((p.y - origin.y) / step.y).floor() as isize).clamp(0, cells as isize - 1);
        (col as usize + 1, row as usize + 1)
    };

    let mut occupied = vec![false; side * side];
    for p in points {
        let (col, row) = cell_of(p);
        occupied[row * side + col] = true;
    }

    let star;
    let segments = if segments.is_empty() {
        star = star_segments(points);
        &star[..]
    } else {
        segments
    };

    // Samples at most half a cell apart never skip a cell
    let spacing = 0.5 * step.x.min(step.y);
    for &(a, b) in segments {
        let samples = ((b - a).norm() / spacing).ceil() as usize + 1;
        let mut previous = cell_of(&a);
        occupied[previous.1 * side + previous.0] = true;
        for k in 1..=samples {
            let cell = cell_of(&(a + (b - a) * (k as f64 / samples as f64)));
            if cell.0 != previous.0 && cell.1 != previous.1 {
                // Diagonal move: bridge through the side cell
                occupied[previous.1 * side + cell.0] = true;
            }
            occupied[cell.1 * side + cell.0] = true;
            previous = cell;
        }
    }

    let solid = fill_enclosed(&occupied, side);
    let filled = |col: isize, row: isize| -> bool {
        col >= 0
            && row >= 0
            && (col as usize) < side
            && (row as usize) < side
            && solid[row as usize * side + col as usize]
    };

    let Some(first) = solid.iter().position(|&cell| cell) else {
        return Some(Vec::new());
    };
    let start = ((first % side) as isize, (first / side) as isize);

    // Directions E, N, W, S; turning left is +1
    const STEPS: [(isize, isize); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
    // Cells ahead-left and ahead-right of a lattice corner, per direction
    let ahead = |corner: (isize, isize), dir: usize| -> (bool, bool) {
        let (c, r) = corner;
        let (ne, nw, sw, se) = (
            filled(c, r),
            filled(c - 1, r),
            filled(c - 1, r - 1),
            filled(c, r - 1),
        );
        match dir {
            0 => (ne, se),
            1 => (nw, ne),
            2 => (sw, nw),
            _ => (se, sw),
        }
    };

    let mut contour = vec![start];
    let mut corner = start;
    let mut dir = 0;
    let mut closed = false;
    for _ in 0..4 * side * side {
        corner = (corner.0 + STEPS[dir].0, corner.1 + STEPS[dir].1);
        let (left, right) = ahead(corner, dir);
        dir = if !left {
            (dir + 1) % 4
        } else if right {
            (dir + 3) % 4
        } else {
            dir
        };
        if corner == start && dir == 0 {
            closed = true;
            break;
        }
        contour.push(corner);
    }

    // A closed walk around one region encloses every filled cell
    let n = contour.len();
    let doubled_area: isize = (0..n)
        .map(|i| {
            let (x0, y0) = contour[i];
            let (x1, y1) = contour[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum();
    let filled_cells = solid.iter().filter(|&&cell| cell).count() as isize;
    if !closed || doubled_area != 2 * filled_cells {
        debug!(
            enclosed = doubled_area / 2,
            filled = filled_cells,
            "occupancy grid holds more than one region"
        );
        return None;
    }

    // Lattice corner (c, r) sits at the low corner of padded cell (c, r)
    let ring: Vec<Point2<f64>> = contour
        .iter()
        .map(|&(c, r)| {
            Point2::new(
                origin.x + (c - 1) as f64 * step.x,
                origin.y + (r - 1) as f64 * step.y,
            )
        })
        .collect();
    Some(smooth_ring(&ring, smoothing))
}

/// Closed loop through the points in angle order around their mean
fn star_segments(points: &[Point2<f64>]) -> Vec<(Point2<f64>, Point2<f64>)> {
    if points.len() < 2 {
        return Vec::new();
    }
    let center = Point2::from(
        points
            .iter()
            .fold(Vector2::zeros(), |acc, p| acc + p.coords)
            / points.len() as f64,
    );

    let mut ordered = points.to_vec();
    ordered.sort_by(|a, b| {
        let (da, db) = (*a - center, *b - center);
        da.y.atan2(da.x)
            .total_cmp(&db.y.atan2(db.x))
            .then(da.norm_squared().total_cmp(&db.norm_squared()))
    });

    let n = ordered.len();
    (0..n).map(|i| (ordered[i], ordered[(i + 1) % n])).collect()
}

/// Occupied cells plus every empty cell the border cannot reach
fn fill_enclosed(occupied: &[bool], side: usize) -> Vec<bool> {
    let mut outside = vec![false; occupied.len()];
    let mut stack = vec![0usize];
    outside[0] = true;

    while let Some(index) = stack.pop() {
        let (col, row) = (index % side, index / side);
        let neighbours = [
            (col > 0).then(|| index - 1),
            (col + 1 < side).then(|| index + 1),
            (row > 0).then(|| index - side),
            (row + 1 < side).then(|| index + side),
        ];
        for next in neighbours.into_iter().flatten() {
            if !outside[next] && !occupied[next] {
                outside[next] = true;
                stack.push(next);
            }
        }
    }

    outside.into_iter().map(|reached| !reached).collect()
}

/// Circular moving average over `window` points
fn smooth_ring(points: &[Point2<f64>], window: usize) -> Vec<Point2<f64>> {
    let n = points.len();
    if window < 2 || n < window {
        return points.to_vec();
    }

    let half = window / 2;
    (0..n)
        .map(|i| {
            let sum = (0..window).fold(Vector2::zeros(), |acc, k| {
                acc + points[(i + n - half + k) % n].coords
            });
            Point2::from(sum / window as f64)
        })
        .collect()
}

/// Deduplicate, orient counter-clockwise and enforce the footprint invariants
fn finalize_ring(
    ring: &[Point2<f64>],
    merge_distance: f64,
    candidate_count: usize,
    band: f64,
) -> AnalysisResult<Vec<Point2<f64>>> {
    let mut ring = dedup_ring(ring, merge_distance);
    if ring.len() < 3 {
        return Err(AnalysisError::insufficient_base(
            ring.len(),
            band,
            format!(
                "{} candidate(s) reduced to {} distinct boundary point(s)",
                candidate_count,
                ring.len()
            ),
        ));
    }

    let spread = polygon::bounds_extent(&ring);
    if signed_area(&ring).abs() <= COLLINEAR_EPSILON * spread * spread {
        return Err(AnalysisError::insufficient_base(
            ring.len(),
            band,
            "boundary points are collinear",
        ));
    }

    polygon::make_ccw(&mut ring);

    if let Some((first, second)) = find_self_intersection(&ring) {
        return Err(AnalysisError::NonSimplePolygon { first, second });
    }

    Ok(ring)
}
