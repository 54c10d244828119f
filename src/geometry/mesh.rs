// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Mesh representation and utilities

use super::BoundingBox;
use crate::error::{AnalysisError, AnalysisResult};
use ahash::AHashMap;
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }
}

/// Resolved triangle: the three corner positions of a face.
///
/// Facets are never stored; they are rebuilt from the mesh whenever a
/// component needs positions, so they carry no identity of their own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facet {
    pub a: Point3<f64>,
    pub b: Point3<f64>,
    pub c: Point3<f64>,
}

impl Facet {
    pub fn new(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Self {
        Self { a, b, c }
    }

    /// Arithmetic mean of the three corners
    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.a.coords + self.b.coords + self.c.coords) / 3.0)
    }

    /// Unnormalized normal, `(b - a) × (c - a)`
    pub fn cross(&self) -> Vector3<f64> {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    pub fn area(&self) -> f64 {
        self.cross().norm() * 0.5
    }

    /// Signed volume of the tetrahedron spanned by the facet and the origin
    pub fn signed_volume(&self) -> f64 {
        self.a.coords.dot(&self.b.coords.cross(&self.c.coords)) / 6.0
    }
}

/// Triangular mesh
///
/// Y is the vertical axis. Once loaded a mesh is only ever borrowed by the
/// analysis; nothing in the pipeline mutates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Point3<f64>>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Build a mesh from raw coordinate and index arrays
    pub fn from_arrays(vertices: &[[f64; 3]], faces: &[[usize; 3]]) -> Self {
        Self {
            vertices: vertices
                .iter()
                .map(|v| Point3::new(v[0], v[1], v[2]))
                .collect(),
            triangles: faces.iter().map(|f| Triangle::new(*f)).collect(),
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, position: Point3<f64>) -> usize {
        let index = self.vertices.len();
        self.vertices.push(position);
        index
    }

    /// Add a triangle
    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.triangles.is_empty()
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }

    /// Transform all vertices by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for vertex in &mut self.vertices {
            *vertex = matrix.transform_point(vertex);
        }
    }

    /// Copy of the mesh with every coordinate multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Mesh {
        let mut mesh = self.clone();
        mesh.transform(&Matrix4::new_scaling(factor));
        mesh
    }

    /// Merge with another mesh (no welding)
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);

        for triangle in &other.triangles {
            self.triangles.push(Triangle::new([
                triangle.indices[0] + offset,
                triangle.indices[1] + offset,
                triangle.indices[2] + offset,
            ]));
        }
    }

    /// Check the structural invariants the analysis relies on.
    ///
    /// Every face index must address an existing vertex and every coordinate
    /// must be finite.
    pub fn validate(&self) -> AnalysisResult<()> {
        if let Some((index, vertex)) = self
            .vertices
            .iter()
            .enumerate()
            .find(|(_, v)| !(v.x.is_finite() && v.y.is_finite() && v.z.is_finite()))
        {
            return Err(AnalysisError::malformed(format!(
                "vertex {} has a non-finite coordinate ({}, {}, {})",
                index, vertex.x, vertex.y, vertex.z
            )));
        }

        let vertex_count = self.vertices.len();
        for (face, triangle) in self.triangles.iter().enumerate() {
            if let Some(&bad) = triangle.indices.iter().find(|&&i| i >= vertex_count) {
                return Err(AnalysisError::malformed(format!(
                    "face {} references vertex {} but the mesh has {} vertices",
                    face, bad, vertex_count
                )));
            }
        }

        Ok(())
    }

    /// Resolve a face into its corner positions
    pub fn facet(&self, face: usize) -> AnalysisResult<Facet> {
        let triangle = self.triangles.get(face).ok_or_else(|| {
            AnalysisError::malformed(format!(
                "face {} requested but the mesh has {} faces",
                face,
                self.triangles.len()
            ))
        })?;
        let corner = |i: usize| {
            self.vertices.get(triangle.indices[i]).copied().ok_or_else(|| {
                AnalysisError::malformed(format!(
                    "face {} references vertex {} but the mesh has {} vertices",
                    face,
                    triangle.indices[i],
                    self.vertices.len()
                ))
            })
        };
        Ok(Facet::new(corner(0)?, corner(1)?, corner(2)?))
    }

    /// Iterate over all faces as resolved facets, failing on the first bad index
    pub fn facets(&self) -> impl Iterator<Item = AnalysisResult<Facet>> + '_ {
        (0..self.triangles.len()).map(move |face| self.facet(face))
    }

    /// Total surface area
    pub fn surface_area(&self) -> AnalysisResult<f64> {
        self.facets().map(|f| f.map(|f| f.area())).sum()
    }

    /// A mesh is watertight if every edge is shared by exactly 2 triangles
    pub fn is_watertight(&self) -> bool {
        if self.triangles.is_empty() {
            return false;
        }

        let mut edge_count: AHashMap<(usize, usize), usize> = AHashMap::new();
        for triangle in &self.triangles {
            let indices = &triangle.indices;
            for i in 0..3 {
                let v1 = indices[i];
                let v2 = indices[(i + 1) % 3];
                let edge = if v1 < v2 { (v1, v2) } else { (v2, v1) };
                *edge_count.entry(edge).or_insert(0) += 1;
            }
        }

        edge_count.values().all(|&count| count == 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;

    fn single_triangle() -> Mesh {
        Mesh::from_arrays(
            &[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 2.0]],
            &[[0, 1, 2]],
        )
    }

    #[test]
    fn test_facet_centroid_and_area() {
        let mesh = single_triangle();
        let facet = mesh.facet(0).unwrap();
        assert_relative_eq!(facet.area(), 2.0);
        assert_relative_eq!(facet.centroid(), Point3::new(2.0 / 3.0, 0.0, 2.0 / 3.0));
    }

    #[test]
    fn test_validate_rejects_out_of_range_index() {
        let mesh = Mesh::from_arrays(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], &[[0, 1, 5]]);
        let err = mesh.validate().unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedMesh { .. }));
        assert!(err.to_string().contains("vertex 5"));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let mesh = Mesh::from_arrays(
            &[[0.0, f64::NAN, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0, 1, 2]],
        );
        assert!(matches!(
            mesh.validate(),
            Err(AnalysisError::MalformedMesh { .. })
        ));
    }

    #[test]
    fn test_scaled_copy_leaves_original() {
        let mesh = single_triangle();
        let scaled = mesh.scaled(3.0);
        assert_relative_eq!(scaled.vertices[1], Point3::new(6.0, 0.0, 0.0));
        assert_relative_eq!(mesh.vertices[1], Point3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(scaled.surface_area().unwrap(), 18.0);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut mesh = single_triangle();
        mesh.merge(&single_triangle());
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.triangles[1].indices, [3, 4, 5]);
    }

    #[test]
    fn test_watertight_detection() {
        let cube = Primitive::cuboid(Vector3::new(1.0, 1.0, 1.0)).to_mesh();
        assert!(cube.is_watertight());
        assert!(!single_triangle().is_watertight());
    }
}
