// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! End-to-end analysis: center of mass, footprint, stability and metrics

use crate::analysis::base::{extract_footprint, BaseFootprint, OutlineSource, VerticalExtent};
use crate::analysis::centroid::{center_of_mass, CenterOfMass};
use crate::analysis::metrics::{compute_metrics, Metrics};
use crate::analysis::stability::{evaluate_stability, StabilityResult};
use crate::config::{AnalysisConfig, BoundaryMethod, FrontAxis, MassModel};
use crate::error::{AnalysisError, AnalysisResult};
use crate::geometry::Mesh;
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Widening factor used by [`analyze_with_retry`] callers that have no preference
pub const DEFAULT_RETRY_FACTOR: f64 = 2.0;

/// Attempts used by [`analyze_with_retry`] callers that have no preference
pub const DEFAULT_RETRY_ATTEMPTS: usize = 4;

/// Widening never pushes the base band past half the statue
const MAX_RETRY_TOLERANCE: f64 = 0.5;

/// Complete analysis of one mesh. Lengths are in scaled units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// File the mesh came from, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    pub center_of_mass: Point3<f64>,
    /// Center of mass on the ground plane, as (x, z)
    pub projected_com: Point2<f64>,
    pub surface_area: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    pub mass_model: MassModel,

    pub ground_level: f64,
    pub total_height: f64,
    pub com_height: f64,
    pub height_fraction: f64,

    pub base_polygon: Vec<Point2<f64>>,
    pub base_center: Point2<f64>,
    pub base_width: f64,
    pub base_depth: f64,
    pub base_area: f64,
    pub base_vertex_count: usize,
    pub base_candidate_count: usize,
    pub base_tolerance: f64,
    pub boundary: BoundaryMethod,
    pub base_outline: OutlineSource,

    pub stable: bool,
    pub front_axis: FrontAxis,
    pub front_edge_index: usize,
    pub front_edge_distance: f64,
    pub nearest_edge_distance: f64,
    pub front_clearance: f64,

    pub lean_angle_deg: f64,
    pub forward_lean_deg: f64,
    pub lateral_lean_deg: f64,
    pub front_tipping_angle_deg: f64,
    pub horizontal_offset: f64,
    pub lateral_offset: f64,
    pub longitudinal_offset: f64,
    pub top_displacement: f64,

    pub vertex_count: usize,
    pub triangle_count: usize,
    pub scale_factor: f64,
}

impl AnalysisReport {
    fn assemble(
        mesh: &Mesh,
        config: &AnalysisConfig,
        com: &CenterOfMass,
        footprint: &BaseFootprint,
        stability: &StabilityResult,
        metrics: &Metrics,
    ) -> Self {
        let k = config.scale_factor;
        Self {
            source: None,
            center_of_mass: com.point * k,
            projected_com: stability.projected * k,
            surface_area: com.surface_area * k * k,
            volume: com.volume.map(|v| v * k * k * k),
            mass_model: com.model,
            ground_level: footprint.ground_level * k,
            total_height: metrics.total_height,
            com_height: metrics.com_height,
            height_fraction: metrics.height_fraction,
            base_polygon: footprint.polygon.iter().map(|p| *p * k).collect(),
            base_center: metrics.base_center,
            base_width: footprint.width() * k,
            base_depth: footprint.depth() * k,
            base_area: footprint.area() * k * k,
            base_vertex_count: footprint.len(),
            base_candidate_count: footprint.candidate_count,
            base_tolerance: config.base_tolerance,
            boundary: config.boundary,
            base_outline: footprint.outline,
            stable: stability.stable,
            front_axis: config.front_axis,
            front_edge_index: stability.front_edge_index,
            front_edge_distance: stability.front_edge_distance * k,
            nearest_edge_distance: stability.nearest_edge_distance * k,
            front_clearance: metrics.front_clearance,
            lean_angle_deg: metrics.lean_angle_deg,
            forward_lean_deg: metrics.forward_lean_deg,
            lateral_lean_deg: metrics.lateral_lean_deg,
            front_tipping_angle_deg: metrics.front_tipping_angle_deg,
            horizontal_offset: metrics.horizontal_offset,
            lateral_offset: metrics.lateral_offset,
            longitudinal_offset: metrics.longitudinal_offset,
            top_displacement: metrics.top_displacement,
            vertex_count: mesh.vertex_count(),
            triangle_count: mesh.triangle_count(),
            scale_factor: k,
        }
    }

    /// Tag the report with the file it was computed from
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Longest footprint side, used to size figures
    pub fn base_span(&self) -> f64 {
        self.base_width.max(self.base_depth)
    }
}

/// Run the full analysis once with `config`
pub fn analyze(mesh: &Mesh, config: &AnalysisConfig) -> AnalysisResult<AnalysisReport> {
    config.validate()?;
    mesh.validate()?;

    let com = center_of_mass(mesh, config.mass_model)?;
    let extent = VerticalExtent::of(mesh)?;
    let footprint = extract_footprint(mesh, config)?;
    let stability = evaluate_stability(&com.point, &footprint, config.front_axis)?;
    let metrics = compute_metrics(
        &com.point,
        &footprint,
        &extent,
        config.front_axis,
        config.scale_factor,
    )?;

    let report = AnalysisReport::assemble(mesh, config, &com, &footprint, &stability, &metrics);
    info!(
        vertices = report.vertex_count,
        triangles = report.triangle_count,
        stable = report.stable,
        height_fraction = report.height_fraction,
        lean_deg = report.lean_angle_deg,
        "analysis complete"
    );
    Ok(report)
}

/// Run [`analyze`], widening the base tolerance by `factor` while the footprint is too thin.
///
/// Only [`AnalysisError::InsufficientBaseGeometry`] is retried. The tolerance
/// that succeeded is recorded in the report.
pub fn analyze_with_retry(
    mesh: &Mesh,
    config: &AnalysisConfig,
    factor: f64,
    max_attempts: usize,
) -> AnalysisResult<AnalysisReport> {
    if !(factor > 1.0) {
        return Err(AnalysisError::invalid_config(format!(
            "retry factor must be greater than 1, got {}",
            factor
        )));
    }

    let mut config = config.clone();
    let mut attempt = 1;
    loop {
        match analyze(mesh, &config) {
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let widened = (config.base_tolerance * factor).min(MAX_RETRY_TOLERANCE);
                if widened <= config.base_tolerance {
                    return Err(err);
                }
                warn!(
                    attempt,
                    from = config.base_tolerance,
                    to = widened,
                    "base footprint too thin, widening tolerance"
                );
                config.base_tolerance = widened;
                attempt += 1;
            }
            result => return result,
        }
    }
}
