// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Terminal summary with colored formatting

use super::{Capability, ReportContext, Reporter};
use crate::analysis::AnalysisReport;
use anyhow::Result;
use colored::*;

/// Leans smaller than this read as upright
const UPRIGHT_DEG: f64 = 0.5;

/// Colored terminal summary
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    /// Build the summary text without printing it
    pub fn format_summary(ctx: &ReportContext<'_>) -> String {
        let r = ctx.report;
        let rule = "━".repeat(72).bright_black().to_string();
        let mut out = Vec::new();

        out.push(rule.clone());
        out.push(format!("{} {}", "Statue:".bold(), ctx.title.cyan()));
        out.push(rule.clone());

        if r.stable {
            out.push(format!("{} {}", "✅".green(), "STABLE".green().bold()));
        } else {
            out.push(format!("{} {}", "❌".red(), "UNSTABLE".red().bold()));
        }
        out.push(format!("   {}", describe_lean(r)));

        out.push(String::new());
        out.push("Center of mass:".bold().to_string());
        out.push(line(
            "Position",
            &format!(
                "({:.4}, {:.4}, {:.4})",
                r.center_of_mass.x, r.center_of_mass.y, r.center_of_mass.z
            ),
        ));
        out.push(line(
            "Height",
            &format!(
                "{:.4} of {:.4} ({:.1}%)",
                r.com_height, r.total_height, r.height_fraction
            ),
        ));
        out.push(line("Model", &r.mass_model.to_string()));

        out.push(String::new());
        out.push("Base:".bold().to_string());
        out.push(line(
            "Footprint",
            &format!(
                "{:.4} x {:.4}, area {:.4}",
                r.base_width, r.base_depth, r.base_area
            ),
        ));
        out.push(line(
            "Outline",
            &format!(
                "{} points from {} candidates ({}, {})",
                r.base_vertex_count, r.base_candidate_count, r.boundary, r.base_outline
            ),
        ));

        out.push(String::new());
        out.push("Stability:".bold().to_string());
        out.push(margin("Front edge", r.front_edge_distance));
        out.push(margin("Nearest edge", r.nearest_edge_distance));
        out.push(margin("Front clearance", r.front_clearance));
        out.push(line(
            "Lean",
            &format!(
                "{:.2}° (forward {:+.2}°, lateral {:+.2}°)",
                r.lean_angle_deg, r.forward_lean_deg, r.lateral_lean_deg
            ),
        ));
        out.push(line(
            "Tipping angle",
            &format!("{:.2}° forward", r.front_tipping_angle_deg),
        ));
        out.push(line("Top displacement", &format!("{:.4}", r.top_displacement)));
        out.push(rule);

        out.join("\n")
    }
}

impl Reporter for ConsoleReporter {
    fn name(&self) -> &'static str {
        "console"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::Summary]
    }

    fn print_summary(&self, ctx: &ReportContext<'_>) -> Result<()> {
        println!("\n{}", Self::format_summary(ctx));
        Ok(())
    }
}

/// Plain-language lean direction, as seen from the front
pub fn describe_lean(report: &AnalysisReport) -> String {
    let mut parts = Vec::new();

    if report.forward_lean_deg >= UPRIGHT_DEG {
        parts.push(format!("{:.1}° forward", report.forward_lean_deg));
    } else if report.forward_lean_deg <= -UPRIGHT_DEG {
        parts.push(format!("{:.1}° backward", -report.forward_lean_deg));
    }

    if report.lateral_lean_deg >= UPRIGHT_DEG {
        parts.push(format!("{:.1}° to the right", report.lateral_lean_deg));
    } else if report.lateral_lean_deg <= -UPRIGHT_DEG {
        parts.push(format!("{:.1}° to the left", -report.lateral_lean_deg));
    }

    if parts.is_empty() {
        "stands upright".to_string()
    } else {
        format!("leans {}", parts.join(" and "))
    }
}

fn line(name: &str, value: &str) -> String {
    format!("  {} {}", format!("{}:", name).bright_black(), value.cyan())
}

/// Signed distance, red when negative
fn margin(name: &str, value: f64) -> String {
    let text = format!("{:+.4}", value);
    let colored = if value >= 0.0 { text.green() } else { text.red() };
    format!("  {} {}", format!("{}:", name).bright_black(), colored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::config::AnalysisConfig;
    use crate::geometry::Primitive;
    use nalgebra::{Point2, Vector2};

    fn leaning_report(shear: Vector2<f64>) -> AnalysisReport {
        let outline = vec![
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, -1.0),
            Point2::new(1.0, 1.0),
            Point2::new(-1.0, 1.0),
        ];
        let mesh = Primitive::leaning_prism(outline, 4.0, shear).to_mesh();
        analyze(&mesh, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_describe_lean() {
        assert_eq!(describe_lean(&leaning_report(Vector2::zeros())), "stands upright");

        let forward = describe_lean(&leaning_report(Vector2::new(0.0, 0.8)));
        assert!(forward.starts_with("leans"), "{}", forward);
        assert!(forward.contains("forward"), "{}", forward);

        let left = describe_lean(&leaning_report(Vector2::new(-0.8, 0.0)));
        assert!(left.contains("to the left"), "{}", left);
        assert!(!left.contains("forward"), "{}", left);
    }

    #[test]
    fn test_summary_mentions_verdict() {
        let outline = vec![
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, -1.0),
            Point2::new(1.0, 1.0),
            Point2::new(-1.0, 1.0),
        ];
        let mesh = Primitive::prism(outline, 2.0).to_mesh();
        let report = analyze(&mesh, &AnalysisConfig::default()).unwrap();

        let text = ConsoleReporter::format_summary(&ReportContext::new(&mesh, &report, "block"));
        assert!(text.contains("STABLE"));
        assert!(!text.contains("UNSTABLE"));
        assert!(text.contains("block"));
        assert!(text.contains("stands upright"));
    }
}
