// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Closed test solids with Y as the vertical axis

use super::polygon::signed_area;
use super::{Mesh, Triangle};
use nalgebra::{Point2, Point3, Vector2, Vector3};
use std::f64::consts::PI;

/// Geometric primitives
///
/// All solids except the sphere are watertight and outward-oriented, so they
/// work with both mass models.
pub enum Primitive {
    Cube { size: Vector3<f64>, center: bool },
    Sphere { r: f64, segments: u32 },
    Cylinder { h: f64, r: f64, segments: u32 },
    /// Outline in the (x, z) ground plane extruded upward along Y.
    /// The top face is translated by `shear`, which makes the solid lean.
    Prism {
        outline: Vec<Point2<f64>>,
        height: f64,
        shear: Vector2<f64>,
    },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    /// Box spanning `0..size` on every axis
    pub fn cuboid(size: Vector3<f64>) -> Self {
        Self::Cube {
            size,
            center: false,
        }
    }

    pub fn sphere(r: f64, segments: u32) -> Self {
        let segments = if segments > 0 { segments } else { 32 };
        Self::Sphere { r, segments }
    }

    pub fn cylinder(h: f64, r: f64, segments: u32) -> Self {
        let segments = if segments > 2 { segments } else { 32 };
        Self::Cylinder { h, r, segments }
    }

    pub fn prism(outline: Vec<Point2<f64>>, height: f64) -> Self {
        Self::Prism {
            outline,
            height,
            shear: Vector2::zeros(),
        }
    }

    pub fn leaning_prism(outline: Vec<Point2<f64>>, height: f64, shear: Vector2<f64>) -> Self {
        Self::Prism {
            outline,
            height,
            shear,
        }
    }

    pub fn to_mesh(&self) -> Mesh {
        match self {
            Self::Cube { size, center } => generate_cube_mesh(*size, *center),
            Self::Sphere { r, segments } => generate_sphere_mesh(*r, *segments),
            Self::Cylinder { h, r, segments } => {
                let outline = (0..*segments)
                    .map(|i| {
                        let angle = 2.0 * PI * i as f64 / *segments as f64;
                        Point2::new(r * angle.cos(), r * angle.sin())
                    })
                    .collect::<Vec<_>>();
                generate_prism_mesh(&outline, *h, Vector2::zeros())
            }
            Self::Prism {
                outline,
                height,
                shear,
            } => generate_prism_mesh(outline, *height, *shear),
        }
    }
}

fn generate_cube_mesh(size: Vector3<f64>, center: bool) -> Mesh {
    let mut mesh = Mesh::with_capacity(8, 12);

    let offset = if center { size / 2.0 } else { Vector3::zeros() };
    let (min_x, max_x) = (-offset.x, size.x - offset.x);
    let (min_y, max_y) = (-offset.y, size.y - offset.y);
    let (min_z, max_z) = (-offset.z, size.z - offset.z);

    // 8 shared corners so the box is watertight
    for position in [
        Point3::new(min_x, min_y, min_z),
        Point3::new(max_x, min_y, min_z),
        Point3::new(max_x, max_y, min_z),
        Point3::new(min_x, max_y, min_z),
        Point3::new(min_x, min_y, max_z),
        Point3::new(max_x, min_y, max_z),
        Point3::new(max_x, max_y, max_z),
        Point3::new(min_x, max_y, max_z),
    ] {
        mesh.add_vertex(position);
    }

    let faces = [
        // Front (z+)
        [4, 5, 6],
        [4, 6, 7],
        // Back (z-)
        [1, 0, 3],
        [1, 3, 2],
        // Right (x+)
        [5, 1, 2],
        [5, 2, 6],
        // Left (x-)
        [0, 4, 7],
        [0, 7, 3],
        // Top (y+)
        [7, 6, 2],
        [7, 2, 3],
        // Bottom (y-)
        [0, 1, 5],
        [0, 5, 4],
    ];

    for indices in faces {
        mesh.add_triangle(Triangle::new(indices));
    }

    mesh
}

fn generate_sphere_mesh(radius: f64, segments: u32) -> Mesh {
    let mut mesh = Mesh::new();
    let stacks = segments as usize;
    let slices = segments as usize;

    for i in 0..=stacks {
        let phi = PI * i as f64 / stacks as f64;
        let y = radius * phi.cos();
        let r = radius * phi.sin();

        for j in 0..=slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            mesh.add_vertex(Point3::new(r * theta.cos(), y, r * theta.sin()));
        }
    }

    for i in 0..stacks {
        for j in 0..slices {
            let first = i * (slices + 1) + j;
            let second = first + slices + 1;

            mesh.add_triangle(Triangle::new([first, second, first + 1]));
            mesh.add_triangle(Triangle::new([second, second + 1, first + 1]));
        }
    }

    mesh
}

/// Extrude a star-shaped outline. Caps are fanned from the outline centroid.
fn generate_prism_mesh(outline: &[Point2<f64>], height: f64, shear: Vector2<f64>) -> Mesh {
    let n = outline.len();
    let mut mesh = Mesh::with_capacity(2 * n + 2, 4 * n);
    if n < 3 {
        return mesh;
    }

    // Work counter-clockwise in (x, z) so every face winds outward
    let ring: Vec<Point2<f64>> = if signed_area(outline) < 0.0 {
        outline.iter().rev().copied().collect()
    } else {
        outline.to_vec()
    };
    let center = ring
        .iter()
        .fold(Vector2::zeros(), |acc, p| acc + p.coords)
        / n as f64;

    let bottom_center = mesh.add_vertex(Point3::new(center.x, 0.0, center.y));
    let top_center = mesh.add_vertex(Point3::new(
        center.x + shear.x,
        height,
        center.y + shear.y,
    ));

    let bottom: Vec<usize> = ring
        .iter()
        .map(|p| mesh.add_vertex(Point3::new(p.x, 0.0, p.y)))
        .collect();
    let top: Vec<usize> = ring
        .iter()
        .map(|p| mesh.add_vertex(Point3::new(p.x + shear.x, height, p.y + shear.y)))
        .collect();

    for i in 0..n {
        let j = (i + 1) % n;
        mesh.add_triangle(Triangle::new([bottom_center, bottom[i], bottom[j]]));
        mesh.add_triangle(Triangle::new([top_center, top[j], top[i]]));
        mesh.add_triangle(Triangle::new([bottom[i], top[i], top[j]]));
        mesh.add_triangle(Triangle::new([bottom[i], top[j], bottom[j]]));
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cube_counts_and_area() {
        let mesh = Primitive::cuboid(Vector3::new(1.0, 2.0, 3.0)).to_mesh();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert_relative_eq!(mesh.surface_area().unwrap(), 2.0 * (2.0 + 3.0 + 6.0));
    }

    #[test]
    fn test_cube_faces_point_outward() {
        let mesh = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh();
        for facet in mesh.facets() {
            let facet = facet.unwrap();
            assert!(facet.cross().dot(&facet.centroid().coords) > 0.0);
        }
    }

    #[test]
    fn test_prism_is_closed_and_outward() {
        let outline = vec![
            Point2::new(-1.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, -1.0),
            Point2::new(-1.0, -1.0),
        ];
        let mesh = Primitive::prism(outline, 3.0).to_mesh();
        assert!(mesh.is_watertight());

        let volume: f64 = mesh.facets().map(|f| f.unwrap().signed_volume()).sum();
        assert_relative_eq!(volume, 12.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cylinder_area() {
        let mesh = Primitive::cylinder(2.0, 1.0, 256).to_mesh();
        let expected = 2.0 * PI + 2.0 * PI * 2.0;
        assert!((mesh.surface_area().unwrap() - expected).abs() < expected * 0.01);
    }
}
