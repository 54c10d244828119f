// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Static stability of a center of mass over its base footprint

use crate::analysis::base::BaseFootprint;
use crate::config::FrontAxis;
use crate::error::{AnalysisError, AnalysisResult};
use crate::geometry::polygon::{self, outward_normal, point_in_polygon, segment_distance};
use nalgebra::{Point2, Point3, Vector2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Points this close to an edge, relative to the footprint extent, count as on it
const BOUNDARY_EPSILON: f64 = 1e-9;

/// Outcome of the containment test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityResult {
    /// Center of mass dropped onto the ground plane, as (x, z)
    pub projected: Point2<f64>,
    /// Projection lies inside the footprint or on its boundary
    pub stable: bool,
    /// Footprint edge facing the front axis; edge `i` starts at vertex `i`
    pub front_edge_index: usize,
    /// Distance to the front edge, positive on its inner side
    pub front_edge_distance: f64,
    /// Distance to the closest edge, positive when stable
    pub nearest_edge_distance: f64,
}

/// Drop the vertical component
pub fn project_to_ground(point: &Point3<f64>) -> Point2<f64> {
    Point2::new(point.x, point.z)
}

/// Test whether `com` stands over `footprint` and measure its edge margins
pub fn evaluate_stability(
    com: &Point3<f64>,
    footprint: &BaseFootprint,
    front_axis: FrontAxis,
) -> AnalysisResult<StabilityResult> {
    evaluate_projected(project_to_ground(com), footprint, front_axis)
}

/// Same as [`evaluate_stability`] for a point already on the ground plane
pub fn evaluate_projected(
    projected: Point2<f64>,
    footprint: &BaseFootprint,
    front_axis: FrontAxis,
) -> AnalysisResult<StabilityResult> {
    let ring = &footprint.polygon;
    if ring.len() < 3 {
        return Err(AnalysisError::insufficient_base(
            ring.len(),
            footprint.band_top - footprint.ground_level,
            "footprint needs at least 3 vertices for a containment test",
        ));
    }

    let nearest = footprint
        .edges()
        .map(|(a, b)| segment_distance(&projected, &a, &b))
        .fold(f64::INFINITY, f64::min);
    let on_boundary = nearest <= BOUNDARY_EPSILON * polygon::bounds_extent(ring);
    let stable = on_boundary || point_in_polygon(&projected, ring);

    let (front_edge_index, front_edge_distance) = front_edge(&projected, footprint, front_axis)?;
    let nearest_edge_distance = if stable { nearest } else { -nearest };

    debug!(
        x = projected.x,
        z = projected.y,
        stable,
        front_edge = front_edge_index,
        front_edge_distance,
        "evaluated stability"
    );

    Ok(StabilityResult {
        projected,
        stable,
        front_edge_index,
        front_edge_distance,
        nearest_edge_distance,
    })
}

/// Index of the edge facing `front_axis` and the signed distance to it.
///
/// Ties keep the first edge.
fn front_edge(
    point: &Point2<f64>,
    footprint: &BaseFootprint,
    front_axis: FrontAxis,
) -> AnalysisResult<(usize, f64)> {
    let front = front_axis.direction();

    let mut best: Option<(usize, f64, Vector2<f64>)> = None;
    for (i, (a, b)) in footprint.edges().enumerate() {
        let Some(normal) = outward_normal(&a, &b) else {
            continue;
        };
        let facing = normal.dot(&front);
        if best.map_or(true, |(_, score, _)| facing > score) {
            best = Some((i, facing, normal));
        }
    }

    let (index, _, normal) = best.ok_or_else(|| {
        AnalysisError::insufficient_base(footprint.len(), 0.0, "footprint has no edge of non-zero length")
    })?;

    let a = footprint.polygon[index];
    let b = footprint.polygon[(index + 1) % footprint.len()];
    let distance = segment_distance(point, &a, &b);
    if (point - a).dot(&normal) > 0.0 {
        Ok((index, -distance))
    } else {
        Ok((index, distance))
    }
}
