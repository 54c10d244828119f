// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Planar polygon helpers for footprints in the (x, z) ground plane
//!
//! Polygons are open rings: the closing edge from the last point back to the
//! first is implicit.

use nalgebra::{Point2, Vector2};
use std::cmp::Ordering;

/// Z component of `(a - o) × (b - o)`
pub fn cross(o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let u = a - o;
    let v = b - o;
    u.x * v.y - u.y * v.x
}

/// Computes the signed area of a polygon.
/// Positive for counter-clockwise, negative for clockwise.
pub fn signed_area(polygon: &[Point2<f64>]) -> f64 {
    let n = polygon.len();
    let mut area = 0.0;

    for i in 0..n {
        let j = (i + 1) % n;
        area += polygon[i].x * polygon[j].y;
        area -= polygon[j].x * polygon[i].y;
    }

    area / 2.0
}

/// Area centroid; falls back to the vertex mean for zero-area rings
pub fn area_centroid(polygon: &[Point2<f64>]) -> Point2<f64> {
    let n = polygon.len();
    if n == 0 {
        return Point2::origin();
    }

    // Shift to the first vertex to keep the products small
    let origin = polygon[0];
    let mut twice_area = 0.0;
    let mut acc = Vector2::zeros();
    for i in 0..n {
        let a = polygon[i] - origin;
        let b = polygon[(i + 1) % n] - origin;
        let w = a.x * b.y - b.x * a.y;
        twice_area += w;
        acc += (a + b) * w;
    }

    if twice_area.abs() <= f64::EPSILON * bounds_extent(polygon).powi(2) {
        let mean = polygon
            .iter()
            .fold(Vector2::zeros(), |sum, p| sum + p.coords)
            / n as f64;
        return Point2::from(mean);
    }

    origin + acc / (3.0 * twice_area)
}

/// Largest side of the axis-aligned bounds
pub fn bounds_extent(points: &[Point2<f64>]) -> f64 {
    match bounds(points) {
        Some((min, max)) => (max.x - min.x).max(max.y - min.y),
        None => 0.0,
    }
}

/// Axis-aligned bounds as (min, max)
pub fn bounds(points: &[Point2<f64>]) -> Option<(Point2<f64>, Point2<f64>)> {
    let first = points.first()?;
    let mut min = *first;
    let mut max = *first;
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some((min, max))
}

/// Reorder in place so the ring winds counter-clockwise
pub fn make_ccw(polygon: &mut [Point2<f64>]) {
    if signed_area(polygon) < 0.0 {
        polygon.reverse();
    }
}

/// Convex hull by Andrew's monotone chain, counter-clockwise, collinear points dropped
pub fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
    });
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<Point2<f64>> = Vec::with_capacity(sorted.len() * 2);

    // Lower hull
    for p in &sorted {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }

    // Upper hull
    let lower_len = hull.len() + 1;
    for p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(*p);
    }

    hull.pop();
    hull
}

/// Distance from a point to the segment `a..b`
pub fn segment_distance(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Outward unit normal of edge `a -> b` on a counter-clockwise ring
pub fn outward_normal(a: &Point2<f64>, b: &Point2<f64>) -> Option<Vector2<f64>> {
    let edge = b - a;
    let len = edge.norm();
    if len == 0.0 {
        return None;
    }
    Some(Vector2::new(edge.y, -edge.x) / len)
}

/// Winding number of the ring around `point`; non-zero means inside
pub fn winding_number(point: &Point2<f64>, polygon: &[Point2<f64>]) -> i32 {
    let n = polygon.len();
    let mut winding = 0;

    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[(i + 1) % n];
        if a.y <= point.y {
            if b.y > point.y && cross(a, b, point) > 0.0 {
                winding += 1;
            }
        } else if b.y <= point.y && cross(a, b, point) < 0.0 {
            winding -= 1;
        }
    }

    winding
}

/// Checks if a point is strictly inside a polygon of either orientation
pub fn point_in_polygon(point: &Point2<f64>, polygon: &[Point2<f64>]) -> bool {
    polygon.len() >= 3 && winding_number(point, polygon) != 0
}

fn on_segment(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Closed-segment intersection test, including touching and collinear overlap
pub fn segments_intersect(
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
    d: &Point2<f64>,
) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(a, c, d))
        || (d2 == 0.0 && on_segment(b, c, d))
        || (d3 == 0.0 && on_segment(c, a, b))
        || (d4 == 0.0 && on_segment(d, a, b))
}

/// First pair of non-adjacent edges that touch, if any.
///
/// Edge `i` runs from vertex `i` to vertex `i + 1` (wrapping).
pub fn find_self_intersection(polygon: &[Point2<f64>]) -> Option<(usize, usize)> {
    let n = polygon.len();
    if n < 4 {
        return None;
    }

    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[(i + 1) % n];
        for j in (i + 2)..n {
            // First and last edges share vertex 0
            if i == 0 && j == n - 1 {
                continue;
            }
            let c = &polygon[j];
            let d = &polygon[(j + 1) % n];
            if segments_intersect(a, b, c, d) {
                return Some((i, j));
            }
        }
    }

    None
}

/// Drop consecutive points closer than `tolerance`, including the wrap-around pair
pub fn dedup_ring(points: &[Point2<f64>], tolerance: f64) -> Vec<Point2<f64>> {
    let mut ring: Vec<Point2<f64>> = Vec::with_capacity(points.len());
    for p in points {
        match ring.last() {
            Some(last) if (p - last).norm() <= tolerance => {}
            _ => ring.push(*p),
        }
    }

    while ring.len() > 1 {
        let first = ring[0];
        match ring.last() {
            Some(last) if (first - last).norm() <= tolerance => {
                ring.pop();
            }
            _ => break,
        }
    }

    ring
}
