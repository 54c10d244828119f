// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Geometry module - mesh representation, test solids and planar polygons

mod bbox;
mod mesh;
pub mod polygon;
mod primitives;

pub use bbox::BoundingBox;
pub use mesh::{Facet, Mesh, Triangle};
pub use primitives::Primitive;
