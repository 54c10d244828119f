// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Mesh file import and export

use crate::geometry::{Mesh, Triangle};
use anyhow::{bail, Context, Result};
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Supported mesh file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Stl,
    Obj,
}

impl MeshFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .and_then(|ext| match ext.as_str() {
                "stl" => Some(MeshFormat::Stl),
                "obj" => Some(MeshFormat::Obj),
                _ => None,
            })
    }
}

/// Load a mesh, picking the reader from the file extension
pub fn load_mesh(path: &Path) -> Result<Mesh> {
    let Some(format) = MeshFormat::from_path(path) else {
        bail!("Unsupported mesh format: {:?}", path);
    };

    info!("Loading mesh from {:?} (format: {:?})", path, format);
    let mesh = match format {
        MeshFormat::Stl => load_stl(path)?,
        MeshFormat::Obj => load_obj(path)?,
    };

    debug!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "mesh loaded"
    );
    Ok(mesh)
}

/// Load an ASCII or binary STL file
pub fn load_stl(path: &Path) -> Result<Mesh> {
    let file = File::open(path).with_context(|| format!("Failed to open STL file: {:?}", path))?;
    let mut reader = BufReader::new(file);

    let stl = stl_io::read_stl(&mut reader)
        .with_context(|| format!("Failed to read STL file: {:?}", path))?;

    let mut mesh = Mesh::with_capacity(stl.vertices.len(), stl.faces.len());
    for v in &stl.vertices {
        mesh.add_vertex(Point3::new(v[0] as f64, v[1] as f64, v[2] as f64));
    }
    for face in &stl.faces {
        mesh.add_triangle(Triangle::new(face.vertices));
    }

    Ok(mesh)
}

/// Load an OBJ file, triangulating faces and merging every model
pub fn load_obj(path: &Path) -> Result<Mesh> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .with_context(|| format!("Failed to read OBJ file: {:?}", path))?;

    if models.is_empty() {
        bail!("OBJ file contains no models: {:?}", path);
    }

    let mut mesh = Mesh::new();
    for model in &models {
        debug!("OBJ model '{}': loading", model.name);
        let offset = mesh.vertex_count();

        for chunk in model.mesh.positions.chunks_exact(3) {
            mesh.add_vertex(Point3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64));
        }
        for chunk in model.mesh.indices.chunks_exact(3) {
            mesh.add_triangle(Triangle::new([
                offset + chunk[0] as usize,
                offset + chunk[1] as usize,
                offset + chunk[2] as usize,
            ]));
        }
    }

    Ok(mesh)
}

/// Write a binary STL file
pub fn save_stl(mesh: &Mesh, path: &Path) -> Result<()> {
    let triangles = mesh
        .facets()
        .map(|facet| {
            let facet = facet?;
            let normal = facet.cross().try_normalize(0.0).unwrap_or_else(Vector3::zeros);
            Ok(stl_io::Triangle {
                normal: stl_io::Normal::new([normal.x as f32, normal.y as f32, normal.z as f32]),
                vertices: [facet.a, facet.b, facet.c]
                    .map(|p| stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32])),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let file = File::create(path).with_context(|| format!("Failed to create STL file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    stl_io::write_stl(&mut writer, triangles.iter())
        .with_context(|| format!("Failed to write STL file: {:?}", path))?;
    writer.flush()?;

    info!("Saved {} triangles to {:?}", triangles.len(), path);
    Ok(())
}
