// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Center of mass aggregation
//!
//! The surface model weights each triangle centroid by its area, which
//! approximates a uniform-density body as the triangles shrink. The solid
//! model integrates the enclosed volume with signed tetrahedra and only makes
//! sense for closed, outward-facing meshes.

use crate::config::MassModel;
use crate::error::{AnalysisError, AnalysisResult};
use crate::geometry::{Facet, Mesh};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Relative threshold below which areas and volumes count as zero
const DEGENERACY_EPSILON: f64 = 1e-12;

/// Aggregated center of mass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CenterOfMass {
    pub point: Point3<f64>,
    /// Total surface area in squared model units
    pub surface_area: f64,
    /// Enclosed volume, only computed by the solid model
    pub volume: Option<f64>,
    pub model: MassModel,
}

/// Compute the center of mass with the requested weighting
pub fn center_of_mass(mesh: &Mesh, model: MassModel) -> AnalysisResult<CenterOfMass> {
    match model {
        MassModel::Surface => surface_center_of_mass(mesh),
        MassModel::Solid => solid_center_of_mass(mesh),
    }
}

/// Area-weighted mean of triangle centroids
pub fn surface_center_of_mass(mesh: &Mesh) -> AnalysisResult<CenterOfMass> {
    let (reference, scale) = check_mesh(mesh)?;

    let mut weighted = Vector3::zeros();
    let mut total_area = 0.0;
    for facet in mesh.facets() {
        let facet = facet?;
        let area = facet.area();
        weighted += (facet.centroid() - reference) * area;
        total_area += area;
    }

    if !(total_area > DEGENERACY_EPSILON * scale * scale) {
        return Err(AnalysisError::degenerate(format!(
            "total surface area is {:e}; every triangle has zero area",
            total_area
        )));
    }

    let point = reference + weighted / total_area;
    debug!(
        x = point.x,
        y = point.y,
        z = point.z,
        area = total_area,
        "surface center of mass"
    );

    Ok(CenterOfMass {
        point,
        surface_area: total_area,
        volume: None,
        model: MassModel::Surface,
    })
}

/// Volume-weighted centroid of the enclosed solid
pub fn solid_center_of_mass(mesh: &Mesh) -> AnalysisResult<CenterOfMass> {
    let (reference, scale) = check_mesh(mesh)?;

    if !mesh.is_watertight() {
        warn!("mesh is not watertight; solid center of mass may be inaccurate");
    }

    let mut weighted = Vector3::zeros();
    let mut total_volume = 0.0;
    let mut total_area = 0.0;
    for facet in mesh.facets() {
        let facet = facet?;
        total_area += facet.area();

        // Tetrahedra are taken against the reference point to limit cancellation
        let local = Facet::new(
            Point3::from(facet.a - reference),
            Point3::from(facet.b - reference),
            Point3::from(facet.c - reference),
        );
        let volume = local.signed_volume();
        weighted += (local.a.coords + local.b.coords + local.c.coords) * (volume / 4.0);
        total_volume += volume;
    }

    if !(total_volume.abs() > DEGENERACY_EPSILON * scale.powi(3)) {
        return Err(AnalysisError::degenerate(format!(
            "enclosed volume is {:e}; the mesh does not bound a solid",
            total_volume
        )));
    }
    if total_volume < 0.0 {
        warn!("enclosed volume is negative; faces appear to point inward");
    }

    let point = reference + weighted / total_volume;
    debug!(
        x = point.x,
        y = point.y,
        z = point.z,
        volume = total_volume.abs(),
        "solid center of mass"
    );

    Ok(CenterOfMass {
        point,
        surface_area: total_area,
        volume: Some(total_volume.abs()),
        model: MassModel::Solid,
    })
}

/// Shared preconditions; returns the bounding-box center and diagonal
fn check_mesh(mesh: &Mesh) -> AnalysisResult<(Point3<f64>, f64)> {
    if mesh.triangles.is_empty() {
        return Err(AnalysisError::degenerate("mesh has no faces"));
    }
    mesh.validate()?;

    let bbox = mesh.bounding_box();
    Ok((bbox.center(), bbox.diagonal()))
}
