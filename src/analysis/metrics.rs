// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Derived lean and height metrics
//!
//! Lengths come out multiplied by the scale factor. Angles and percentages
//! do not depend on it.

use crate::analysis::base::{BaseFootprint, VerticalExtent};
use crate::analysis::stability::project_to_ground;
use crate::config::FrontAxis;
use crate::error::{AnalysisError, AnalysisResult};
use crate::utils::math::{percent, tilt_deg};
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_height: f64,
    /// Center of mass height above the ground level
    pub com_height: f64,
    /// Center of mass height as a percentage of total height
    pub height_fraction: f64,
    /// Area centroid of the footprint, in scaled (x, z)
    pub base_center: Point2<f64>,
    /// Planar distance from the base center to the projected center of mass
    pub horizontal_offset: f64,
    pub lean_angle_deg: f64,
    /// Positive toward the front
    pub forward_lean_deg: f64,
    /// Positive toward the statue's right
    pub lateral_lean_deg: f64,
    pub lateral_offset: f64,
    pub longitudinal_offset: f64,
    /// Distance along the front axis to the front-most support line, positive behind it
    pub front_clearance: f64,
    /// Forward tilt at which the center of mass passes the front support line
    pub front_tipping_angle_deg: f64,
    /// Horizontal shift of the top implied by the forward lean
    pub top_displacement: f64,
}

/// Compute the metrics for a center of mass standing on `footprint`
pub fn compute_metrics(
    com: &Point3<f64>,
    footprint: &BaseFootprint,
    extent: &VerticalExtent,
    front_axis: FrontAxis,
    scale_factor: f64,
) -> AnalysisResult<Metrics> {
    let total_height = extent.height();
    if !(total_height > 0.0) {
        return Err(AnalysisError::degenerate("total height is not positive"));
    }
    let com_height = com.y - extent.ground;
    if !(com_height > 0.0) {
        return Err(AnalysisError::degenerate(format!(
            "center of mass sits at or below the ground ({:e} above it)",
            com_height
        )));
    }

    let front = front_axis.direction();
    let lateral = front_axis.lateral();

    let projected = project_to_ground(com);
    let base_center = footprint.centroid();
    let offset = projected - base_center;
    let longitudinal_offset = offset.dot(&front);
    let lateral_offset = offset.dot(&lateral);

    let front_line = footprint
        .polygon
        .iter()
        .map(|p| p.coords.dot(&front))
        .fold(f64::NEG_INFINITY, f64::max);
    let front_clearance = front_line - projected.coords.dot(&front);

    let forward_lean_deg = tilt_deg(longitudinal_offset, com_height);
    let top_displacement = total_height * forward_lean_deg.abs().to_radians().tan();

    Ok(Metrics {
        total_height: total_height * scale_factor,
        com_height: com_height * scale_factor,
        height_fraction: percent(com_height, total_height),
        base_center: base_center * scale_factor,
        horizontal_offset: offset.norm() * scale_factor,
        lean_angle_deg: tilt_deg(offset.norm(), com_height),
        forward_lean_deg,
        lateral_lean_deg: tilt_deg(lateral_offset, com_height),
        lateral_offset: lateral_offset * scale_factor,
        longitudinal_offset: longitudinal_offset * scale_factor,
        front_clearance: front_clearance * scale_factor,
        front_tipping_angle_deg: tilt_deg(front_clearance, com_height),
        top_displacement: top_displacement * scale_factor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> BaseFootprint {
        BaseFootprint::from_polygon(vec![
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, -1.0),
            Point2::new(1.0, 1.0),
            Point2::new(-1.0, 1.0),
        ])
        .unwrap()
    }

    fn extent(top: f64) -> VerticalExtent {
        VerticalExtent { ground: 0.0, top }
    }

    #[test]
    fn test_height_fraction() {
        let com = Point3::new(-0.047, 0.609, -0.069);
        let metrics = compute_metrics(&com, &square(), &extent(1.5), FrontAxis::PosZ, 1.0).unwrap();
        assert_relative_eq!(metrics.height_fraction, 40.6, epsilon = 1e-9);
        assert_relative_eq!(metrics.com_height, 0.609, epsilon = 1e-12);
    }

    #[test]
    fn test_forward_lean() {
        let com = Point3::new(0.0, 1.0, 1.0);
        let metrics = compute_metrics(&com, &square(), &extent(2.0), FrontAxis::PosZ, 1.0).unwrap();

        assert_relative_eq!(metrics.longitudinal_offset, 1.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.lateral_offset, 0.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.lean_angle_deg, 45.0, epsilon = 1e-9);
        assert_relative_eq!(metrics.forward_lean_deg, 45.0, epsilon = 1e-9);
        assert_relative_eq!(metrics.front_clearance, 0.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.front_tipping_angle_deg, 0.0, epsilon = 1e-9);
        assert_relative_eq!(metrics.top_displacement, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_lateral_axis_follows_front() {
        let com = Point3::new(0.5, 1.0, 0.0);

        let facing_z = compute_metrics(&com, &square(), &extent(2.0), FrontAxis::PosZ, 1.0).unwrap();
        assert_relative_eq!(facing_z.lateral_offset, 0.5, epsilon = 1e-12);
        assert!(facing_z.lateral_lean_deg > 0.0);

        let facing_back = compute_metrics(&com, &square(), &extent(2.0), FrontAxis::NegZ, 1.0).unwrap();
        assert_relative_eq!(facing_back.lateral_offset, -0.5, epsilon = 1e-12);

        let facing_x = compute_metrics(&com, &square(), &extent(2.0), FrontAxis::PosX, 1.0).unwrap();
        assert_relative_eq!(facing_x.longitudinal_offset, 0.5, epsilon = 1e-12);
        assert_relative_eq!(facing_x.front_clearance, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_scale_factor_applies_to_lengths_only() {
        let com = Point3::new(0.2, 0.8, -0.3);
        let unit = compute_metrics(&com, &square(), &extent(2.0), FrontAxis::PosZ, 1.0).unwrap();
        let scaled = compute_metrics(&com, &square(), &extent(2.0), FrontAxis::PosZ, 4.0).unwrap();

        assert_relative_eq!(scaled.total_height, 4.0 * unit.total_height);
        assert_relative_eq!(scaled.front_clearance, 4.0 * unit.front_clearance);
        assert_relative_eq!(scaled.base_center, unit.base_center * 4.0);
        assert_eq!(scaled.height_fraction, unit.height_fraction);
        assert_eq!(scaled.lean_angle_deg, unit.lean_angle_deg);
    }

    #[test]
    fn test_grounded_com_is_degenerate() {
        let com = Point3::new(0.0, 0.0, 0.0);
        let err = compute_metrics(&com, &square(), &extent(2.0), FrontAxis::PosZ, 1.0).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateMesh { .. }));
    }
}
