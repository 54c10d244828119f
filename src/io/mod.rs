// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! I/O module - loading and saving statue meshes

mod importer;

pub use importer::{load_mesh, load_obj, load_stl, save_stl, MeshFormat};
