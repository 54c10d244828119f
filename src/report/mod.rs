// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Reporting back-ends for analysis results
//!
//! Each back-end implements the capabilities it supports and inherits an
//! error for the rest, so callers can pick back-ends at runtime and still get
//! a clear message when they ask for something a back-end cannot produce.

mod console;
mod html;
mod raster;

pub use console::{describe_lean, ConsoleReporter};
pub use html::HtmlReporter;
pub use raster::RasterReporter;

use crate::analysis::AnalysisReport;
use crate::geometry::Mesh;
use anyhow::{bail, Result};
use std::fmt;
use std::path::Path;

/// What a reporter can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Text summary on the terminal
    Summary,
    /// Static image file
    Static,
    /// Interactive document
    Interactive,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Summary => "summary",
            Self::Static => "static figure",
            Self::Interactive => "interactive figure",
        };
        write!(f, "{}", name)
    }
}

/// Everything a reporter needs to draw one analysis
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub mesh: &'a Mesh,
    pub report: &'a AnalysisReport,
    pub title: &'a str,
}

impl<'a> ReportContext<'a> {
    pub fn new(mesh: &'a Mesh, report: &'a AnalysisReport, title: &'a str) -> Self {
        Self { mesh, report, title }
    }
}

/// A reporting back-end
pub trait Reporter {
    /// Short name used in error messages
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> &'static [Capability];

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    fn print_summary(&self, _ctx: &ReportContext<'_>) -> Result<()> {
        unsupported(self.name(), Capability::Summary)
    }

    fn render_static(&self, _ctx: &ReportContext<'_>, _output: &Path) -> Result<()> {
        unsupported(self.name(), Capability::Static)
    }

    fn render_interactive(&self, _ctx: &ReportContext<'_>, _output: &Path) -> Result<()> {
        unsupported(self.name(), Capability::Interactive)
    }
}

fn unsupported(name: &str, capability: Capability) -> Result<()> {
    bail!("{} reporter does not support {} output", name, capability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_are_disjoint() {
        assert!(ConsoleReporter.supports(Capability::Summary));
        assert!(!ConsoleReporter.supports(Capability::Static));
        assert!(RasterReporter::default().supports(Capability::Static));
        assert!(HtmlReporter.supports(Capability::Interactive));
        assert!(!HtmlReporter.supports(Capability::Summary));
    }

    #[test]
    fn test_unsupported_names_the_backend() {
        let err = unsupported("console", Capability::Static).unwrap_err();
        assert_eq!(err.to_string(), "console reporter does not support static figure output");
    }
}
