// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Analysis module - center of mass, base footprint, stability and metrics

pub mod base;
pub mod centroid;
pub mod metrics;
pub mod pipeline;
pub mod stability;

pub use base::{extract_footprint, BaseFootprint, OutlineSource, VerticalExtent};
pub use centroid::{center_of_mass, CenterOfMass};
pub use metrics::{compute_metrics, Metrics};
pub use pipeline::{analyze, analyze_with_retry, AnalysisReport};
pub use stability::{evaluate_stability, project_to_ground, StabilityResult};
