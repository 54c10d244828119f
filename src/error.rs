// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Error taxonomy for the analysis core
//!
//! Every variant aborts the analysis of the mesh it was raised for. Only
//! [`AnalysisError::InsufficientBaseGeometry`] is worth retrying, and only by
//! the caller with a wider base tolerance.

use thiserror::Error;

/// Result type alias for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors raised by the center-of-mass and stability pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Mesh has no faces, zero total area, zero height or zero enclosed volume.
    #[error("degenerate mesh: {details}")]
    DegenerateMesh { details: String },

    /// Face references a missing vertex, or a coordinate is not finite.
    #[error("malformed mesh: {details}")]
    MalformedMesh { details: String },

    /// Fewer than three usable ground-contact points.
    #[error("insufficient base geometry: {found} usable point(s) within {band:.6} of the ground ({details})")]
    InsufficientBaseGeometry {
        found: usize,
        band: f64,
        details: String,
    },

    /// Footprint boundary crosses itself, so containment is undefined.
    #[error("footprint polygon is not simple: edge {first} intersects edge {second}")]
    NonSimplePolygon { first: usize, second: usize },

    /// A configuration value was rejected before the analysis started.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AnalysisError {
    #[must_use]
    pub fn degenerate(details: impl Into<String>) -> Self {
        Self::DegenerateMesh {
            details: details.into(),
        }
    }

    #[must_use]
    pub fn malformed(details: impl Into<String>) -> Self {
        Self::MalformedMesh {
            details: details.into(),
        }
    }

    #[must_use]
    pub fn insufficient_base(found: usize, band: f64, details: impl Into<String>) -> Self {
        Self::InsufficientBaseGeometry {
            found,
            band,
            details: details.into(),
        }
    }

    #[must_use]
    pub fn invalid_config(details: impl Into<String>) -> Self {
        Self::InvalidConfig(details.into())
    }

    /// Whether a caller may retry with a wider base tolerance.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InsufficientBaseGeometry { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalysisError::degenerate("total area is zero");
        assert!(format!("{err}").contains("total area is zero"));

        let err = AnalysisError::NonSimplePolygon { first: 1, second: 4 };
        assert!(format!("{err}").contains("edge 1 intersects edge 4"));

        let err = AnalysisError::insufficient_base(2, 0.03, "collinear");
        assert!(format!("{err}").contains("2 usable point"));
    }

    #[test]
    fn test_only_base_geometry_is_retryable() {
        assert!(AnalysisError::insufficient_base(0, 0.1, "none").is_retryable());
        assert!(!AnalysisError::degenerate("x").is_retryable());
        assert!(!AnalysisError::malformed("x").is_retryable());
        assert!(!AnalysisError::NonSimplePolygon { first: 0, second: 2 }.is_retryable());
    }
}
