// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Hotuiti statue stability analysis
//!
//! Computes the center of mass of a triangulated statue, extracts the
//! outline of its base and checks whether the center of mass stands over it.
//! Y is vertical; the ground plane is X/Z.

pub mod analysis;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod report;
pub mod utils;

pub use analysis::{analyze, analyze_with_retry, AnalysisReport};
pub use config::{AnalysisConfig, BoundaryMethod, FrontAxis, MassModel};
pub use error::{AnalysisError, AnalysisResult};
pub use geometry::{Mesh, Primitive};

use anyhow::{Context, Result};
use std::path::Path;

/// Load a mesh file and analyze it, tagging the report with the file name
pub fn analyze_file(path: &Path, config: &AnalysisConfig) -> Result<(Mesh, AnalysisReport)> {
    let mesh = io::load_mesh(path)?;
    let report = analyze(&mesh, config)
        .with_context(|| format!("Failed to analyze {}", path.display()))?
        .with_source(path.display().to_string());
    Ok((mesh, report))
}
