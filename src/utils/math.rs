// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Math utilities

/// Signed angle from vertical, in degrees, of a point `offset` to the side at `height`
pub fn tilt_deg(offset: f64, height: f64) -> f64 {
    offset.atan2(height).to_degrees()
}

/// Percentage of `part` in `whole`
pub fn percent(part: f64, whole: f64) -> f64 {
    part / whole * 100.0
}
