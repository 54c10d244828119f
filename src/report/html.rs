// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Interactive HTML figure rendered by plotly.js
//!
//! Plotly treats its third axis as vertical, so model Y is written to plotly
//! `z` and model Z to plotly `y`.

use super::{Capability, ReportContext, Reporter};
use anyhow::{Context, Result};
use chrono::Local;
use serde_json::{json, Value};
use std::path::Path;
use tracing::info;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Self-contained HTML page with a 3D view
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlReporter;

impl Reporter for HtmlReporter {
    fn name(&self) -> &'static str {
        "html"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::Interactive]
    }

    fn render_interactive(&self, ctx: &ReportContext<'_>, output: &Path) -> Result<()> {
        let page = Self::page(ctx)?;
        std::fs::write(output, page)
            .with_context(|| format!("Failed to write HTML report to {}", output.display()))?;
        info!("Wrote interactive report to {:?}", output);
        Ok(())
    }
}

impl HtmlReporter {
    /// Plotly traces: mesh, center of mass, plumb line and footprint
    pub fn traces(ctx: &ReportContext<'_>) -> Value {
        let r = ctx.report;
        let k = r.scale_factor;
        let mesh = ctx.mesh;
        let verdict = if r.stable { "#50dc78" } else { "#f04646" };

        let xs: Vec<f64> = mesh.vertices.iter().map(|v| v.x * k).collect();
        let ys: Vec<f64> = mesh.vertices.iter().map(|v| v.z * k).collect();
        let zs: Vec<f64> = mesh.vertices.iter().map(|v| v.y * k).collect();
        let is: Vec<usize> = mesh.triangles.iter().map(|t| t.indices[0]).collect();
        let js: Vec<usize> = mesh.triangles.iter().map(|t| t.indices[1]).collect();
        let ks: Vec<usize> = mesh.triangles.iter().map(|t| t.indices[2]).collect();

        // Closed footprint ring at ground level
        let mut ring = r.base_polygon.clone();
        if let Some(first) = r.base_polygon.first() {
            ring.push(*first);
        }
        let ground = vec![r.ground_level; ring.len()];

        let com = r.center_of_mass;
        json!([
            {
                "type": "mesh3d",
                "name": "statue",
                "x": xs, "y": ys, "z": zs,
                "i": is, "j": js, "k": ks,
                "color": "#b4a68c",
                "opacity": 0.35,
                "flatshading": true,
                "hoverinfo": "skip"
            },
            {
                "type": "scatter3d",
                "mode": "markers",
                "name": "center of mass",
                "x": [com.x], "y": [com.z], "z": [com.y],
                "marker": { "size": 6, "color": verdict }
            },
            {
                "type": "scatter3d",
                "mode": "lines",
                "name": "plumb line",
                "x": [com.x, com.x], "y": [com.z, com.z], "z": [com.y, r.ground_level],
                "line": { "color": verdict, "width": 4, "dash": "dash" }
            },
            {
                "type": "scatter3d",
                "mode": "lines",
                "name": "footprint",
                "x": ring.iter().map(|p| p.x).collect::<Vec<_>>(),
                "y": ring.iter().map(|p| p.y).collect::<Vec<_>>(),
                "z": ground,
                "line": { "color": "#5aaaf0", "width": 5 }
            }
        ])
    }

    /// Full HTML document
    pub fn page(ctx: &ReportContext<'_>) -> Result<String> {
        let r = ctx.report;
        let traces = serde_json::to_string(&Self::traces(ctx)).context("Failed to serialize plot traces")?;
        let report = serde_json::to_string_pretty(r).context("Failed to serialize report")?;
        let layout = json!({
            "title": format!(
                "{}: {} ({:.1}% height, lean {:.2}°)",
                ctx.title,
                if r.stable { "stable" } else { "unstable" },
                r.height_fraction,
                r.lean_angle_deg
            ),
            "scene": {
                "aspectmode": "data",
                "xaxis": { "title": "X" },
                "yaxis": { "title": "Z" },
                "zaxis": { "title": "Y (height)" }
            },
            "paper_bgcolor": "#0f121a",
            "font": { "color": "#dddddd" }
        });

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}"></script>
</head>
<body style="margin:0;background:#0f121a;color:#ddd;font-family:monospace">
<div id="plot" style="width:100vw;height:85vh"></div>
<details style="padding:0 1em"><summary>Report ({generated})</summary><pre>{report}</pre></details>
<script>
Plotly.newPlot("plot", {traces}, {layout});
</script>
</body>
</html>
"#,
            title = ctx.title,
            cdn = PLOTLY_CDN,
            generated = Local::now().format("%Y-%m-%d %H:%M:%S"),
            report = report,
            traces = traces,
            layout = layout,
        ))
    }
}
