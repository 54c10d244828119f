// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Static PNG figure: side elevation and top-down footprint
//!
//! The left panel plots a sample of mesh vertices against height along the
//! front axis, with the center of mass and its plumb line. The right panel
//! shows the footprint outline, base center and projected center of mass.

use super::{Capability, ReportContext, Reporter};
use anyhow::{bail, Context, Result};
use image::{Rgb, RgbImage};
use nalgebra::{Point2, Vector2};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use std::path::Path;
use tracing::debug;

const BACKGROUND: Rgb<u8> = Rgb([15, 18, 26]);
const GRID: Rgb<u8> = Rgb([60, 64, 76]);
const VERTEX: Rgb<u8> = Rgb([150, 140, 120]);
const OUTLINE: Rgb<u8> = Rgb([90, 170, 240]);
const BASE_CENTER: Rgb<u8> = Rgb([240, 200, 60]);
const STABLE: Rgb<u8> = Rgb([80, 220, 120]);
const UNSTABLE: Rgb<u8> = Rgb([240, 70, 70]);

/// PNG figure writer
#[derive(Debug, Clone)]
pub struct RasterReporter {
    pub width: u32,
    pub height: u32,
    /// Upper bound on vertices drawn in the side panel
    pub max_points: usize,
    /// Seed for the vertex sample, so figures are reproducible
    pub seed: u64,
}

impl Default for RasterReporter {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            max_points: 20_000,
            seed: 42,
        }
    }
}

impl Reporter for RasterReporter {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::Static]
    }

    fn render_static(&self, ctx: &ReportContext<'_>, output: &Path) -> Result<()> {
        let image = self.render(ctx)?;
        image
            .save(output)
            .with_context(|| format!("Failed to save PNG to {}", output.display()))?;
        Ok(())
    }
}

impl RasterReporter {
    /// Draw both panels into an image
    pub fn render(&self, ctx: &ReportContext<'_>) -> Result<RgbImage> {
        if self.width < 100 || self.height < 100 {
            bail!("Figure size {}x{} is too small", self.width, self.height);
        }
        let r = ctx.report;
        let k = r.scale_factor;
        let front = r.front_axis.direction();
        let verdict = if r.stable { STABLE } else { UNSTABLE };

        let mut image = RgbImage::from_pixel(self.width, self.height, BACKGROUND);
        let half = self.width / 2;
        let margin = 24.0;

        // Side elevation: horizontal is distance along the front axis, vertical is height
        let along = |p: &Point2<f64>| p.coords.dot(&front);
        let sampled = self.sample_vertices(ctx.mesh.vertices.len());
        let side_points: Vec<Point2<f64>> = sampled
            .iter()
            .map(|&i| {
                let v = ctx.mesh.vertices[i] * k;
                Point2::new(along(&Point2::new(v.x, v.z)), v.y)
            })
            .collect();
        let com_along = along(&r.projected_com);
        let mut side_bounds = side_points.clone();
        side_bounds.push(Point2::new(com_along, r.center_of_mass.y));
        let side = Viewport::fit(&side_bounds, (0.0, 0.0, half as f64, self.height as f64), margin);

        let ground = r.ground_level;
        side.line(
            &mut image,
            Point2::new(side.min.x, ground),
            Point2::new(side.max.x, ground),
            GRID,
        );
        for p in &side_points {
            side.dot(&mut image, *p, 1, VERTEX);
        }
        let base_along: Vec<f64> = r.base_polygon.iter().map(along).collect();
        let (base_min, base_max) = base_along
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        side.line(
            &mut image,
            Point2::new(base_min, ground),
            Point2::new(base_max, ground),
            OUTLINE,
        );
        let com_side = Point2::new(com_along, r.center_of_mass.y);
        side.line(&mut image, com_side, Point2::new(com_along, ground), verdict);
        side.dot(&mut image, com_side, 5, verdict);

        // Top-down footprint
        let mut top_bounds = r.base_polygon.clone();
        top_bounds.push(r.projected_com);
        let top = Viewport::fit(
            &top_bounds,
            (half as f64, 0.0, half as f64, self.height as f64),
            margin,
        );
        let n = r.base_polygon.len();
        for i in 0..n {
            top.line(&mut image, r.base_polygon[i], r.base_polygon[(i + 1) % n], OUTLINE);
        }
        top.dot(&mut image, r.base_center, 4, BASE_CENTER);
        top.line(&mut image, r.base_center, r.projected_com, GRID);
        top.dot(&mut image, r.projected_com, 5, verdict);

        // Front arrow from the base center
        let arrow = r.base_center + front * (0.25 * r.base_span());
        top.line(&mut image, r.base_center, arrow, BASE_CENTER);
        top.dot(&mut image, arrow, 2, BASE_CENTER);

        // Panel divider
        for y in 0..self.height {
            image.put_pixel(half, y, GRID);
        }

        debug!(points = side_points.len(), "rendered figure");
        Ok(image)
    }

    /// Reproducible vertex subset, all vertices when under the cap
    fn sample_vertices(&self, count: usize) -> Vec<usize> {
        if count <= self.max_points {
            return (0..count).collect();
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut picked = sample(&mut rng, count, self.max_points).into_vec();
        picked.sort_unstable();
        picked
    }
}

/// Maps a world rectangle onto a pixel panel with equal axis scales, Y up
struct Viewport {
    min: Point2<f64>,
    max: Point2<f64>,
    scale: f64,
    offset: Vector2<f64>,
    panel_height: f64,
}

impl Viewport {
    fn fit(points: &[Point2<f64>], panel: (f64, f64, f64, f64), margin: f64) -> Self {
        let (left, top, width, height) = panel;
        let mut min = Point2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            min = min.inf(p);
            max = max.sup(p);
        }
        if points.is_empty() {
            min = Point2::origin();
            max = Point2::new(1.0, 1.0);
        }

        let span = (max - min).map(|s| s.max(1e-9));
        let scale = ((width - 2.0 * margin) / span.x).min((height - 2.0 * margin) / span.y);
        let offset = Vector2::new(
            left + (width - span.x * scale) * 0.5,
            top + (height - span.y * scale) * 0.5,
        );
        Self {
            min,
            max,
            scale,
            offset,
            panel_height: span.y * scale,
        }
    }

    fn to_pixel(&self, p: Point2<f64>) -> (i64, i64) {
        let x = (p.x - self.min.x) * self.scale + self.offset.x;
        let y = self.panel_height - (p.y - self.min.y) * self.scale + self.offset.y;
        (x.round() as i64, y.round() as i64)
    }

    fn dot(&self, image: &mut RgbImage, p: Point2<f64>, radius: i64, color: Rgb<u8>) {
        let (cx, cy) = self.to_pixel(p);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    put(image, cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Bresenham line
    fn line(&self, image: &mut RgbImage, a: Point2<f64>, b: Point2<f64>, color: Rgb<u8>) {
        let (mut x0, mut y0) = self.to_pixel(a);
        let (x1, y1) = self.to_pixel(b);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            put(image, x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }
}

fn put(image: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, color);
    }
}
