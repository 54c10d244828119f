// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Analysis configuration
//!
//! Everything the pipeline treats as a tunable lives here with a documented
//! default. Configs can be loaded from TOML and overridden through
//! `HOTUITI_*` environment variables.

use crate::error::{AnalysisError, AnalysisResult};
use anyhow::{Context, Result};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Scale for the reference moai model: 7.35 m real height over 1.502 model units.
pub const MOAI_SCALE_FACTOR: f64 = 4.894;

/// Default base band, as a fraction of total height.
pub const DEFAULT_BASE_TOLERANCE: f64 = 0.02;

/// Default merge distance for footprint points, as a fraction of total height.
pub const DEFAULT_DEDUP_TOLERANCE: f64 = 1e-4;

/// Default number of angular sectors for the radial trace.
pub const DEFAULT_RADIAL_BINS: usize = 72;

/// Default config file looked up by [`AnalysisConfig::load`].
pub const CONFIG_FILE: &str = "hotuiti.toml";

/// How the footprint outline is traced from the base candidate points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum BoundaryMethod {
    /// Convex hull of the candidates. Fills any concavity.
    ConvexHull,
    /// Farthest candidate per angular sector around the candidate centroid.
    RadialTrace { bins: usize },
    /// Outer contour of an occupancy grid with `resolution` lines per side,
    /// smoothed with a circular moving average of `smoothing` points.
    GridTrace { resolution: usize, smoothing: usize },
}

impl Default for BoundaryMethod {
    fn default() -> Self {
        Self::RadialTrace {
            bins: DEFAULT_RADIAL_BINS,
        }
    }
}

impl fmt::Display for BoundaryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConvexHull => write!(f, "hull"),
            Self::RadialTrace { bins } => write!(f, "radial:{}", bins),
            Self::GridTrace {
                resolution,
                smoothing,
            } => write!(f, "grid:{}:{}", resolution, smoothing),
        }
    }
}

impl FromStr for BoundaryMethod {
    type Err = String;

    /// Accepts `hull`, `radial[:BINS]` and `grid[:RESOLUTION[:SMOOTHING]]`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();
        let mut next_number = |default: usize| -> std::result::Result<usize, String> {
            match parts.next() {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| format!("'{}' is not a valid count in '{}'", raw, s)),
                None => Ok(default),
            }
        };

        match name.as_str() {
            "hull" | "convex" | "convex_hull" => Ok(Self::ConvexHull),
            "radial" | "radial_trace" => Ok(Self::RadialTrace {
                bins: next_number(DEFAULT_RADIAL_BINS)?,
            }),
            "grid" | "grid_trace" => Ok(Self::GridTrace {
                resolution: next_number(25)?,
                smoothing: next_number(7)?,
            }),
            other => Err(format!(
                "unknown boundary method '{}' (expected hull, radial[:BINS] or grid[:RES[:SMOOTH]])",
                other
            )),
        }
    }
}

/// Ground-plane direction the statue faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrontAxis {
    #[serde(rename = "+x")]
    PosX,
    #[serde(rename = "-x")]
    NegX,
    #[default]
    #[serde(rename = "+z")]
    PosZ,
    #[serde(rename = "-z")]
    NegZ,
}

impl FrontAxis {
    /// Unit direction in (x, z)
    pub fn direction(&self) -> Vector2<f64> {
        match self {
            Self::PosX => Vector2::new(1.0, 0.0),
            Self::NegX => Vector2::new(-1.0, 0.0),
            Self::PosZ => Vector2::new(0.0, 1.0),
            Self::NegZ => Vector2::new(0.0, -1.0),
        }
    }

    /// Right-hand direction when viewing the statue from the front.
    /// For a +z front this is +x.
    pub fn lateral(&self) -> Vector2<f64> {
        let front = self.direction();
        Vector2::new(front.y, -front.x)
    }
}

impl fmt::Display for FrontAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PosX => "+x",
            Self::NegX => "-x",
            Self::PosZ => "+z",
            Self::NegZ => "-z",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for FrontAxis {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "+x" | "x" => Ok(Self::PosX),
            "-x" => Ok(Self::NegX),
            "+z" | "z" => Ok(Self::PosZ),
            "-z" => Ok(Self::NegZ),
            other => Err(format!("unknown front axis '{}' (expected +x, -x, +z or -z)", other)),
        }
    }
}

/// What the center of mass is weighted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MassModel {
    /// Triangle centroids weighted by area
    #[default]
    Surface,
    /// Enclosed solid via signed tetrahedra; needs a closed, outward mesh
    Solid,
}

impl fmt::Display for MassModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surface => write!(f, "surface"),
            Self::Solid => write!(f, "solid"),
        }
    }
}

impl FromStr for MassModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "surface" => Ok(Self::Surface),
            "solid" | "volume" => Ok(Self::Solid),
            other => Err(format!("unknown mass model '{}' (expected surface or solid)", other)),
        }
    }
}

/// Analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Model units to meters
    pub scale_factor: f64,
    /// Height of the base band above the lowest vertex, as a fraction of total height
    pub base_tolerance: f64,
    /// Footprint points closer than this fraction of total height are merged
    pub dedup_tolerance: f64,
    /// Footprint tracing algorithm
    pub boundary: BoundaryMethod,
    /// Which way the statue faces
    pub front_axis: FrontAxis,
    /// Center of mass weighting
    pub mass_model: MassModel,
    /// Trace the outline from a thin slice this fraction of the height above
    /// the base, when the slice holds enough vertices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline_slice: Option<f64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            base_tolerance: DEFAULT_BASE_TOLERANCE,
            dedup_tolerance: DEFAULT_DEDUP_TOLERANCE,
            boundary: BoundaryMethod::default(),
            front_axis: FrontAxis::default(),
            mass_model: MassModel::default(),
            outline_slice: None,
        }
    }
}

impl AnalysisConfig {
    /// Defaults with the reference moai scale
    pub fn moai() -> Self {
        Self {
            scale_factor: MOAI_SCALE_FACTOR,
            ..Self::default()
        }
    }

    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_base_tolerance(mut self, base_tolerance: f64) -> Self {
        self.base_tolerance = base_tolerance;
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryMethod) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_front_axis(mut self, front_axis: FrontAxis) -> Self {
        self.front_axis = front_axis;
        self
    }

    pub fn with_mass_model(mut self, mass_model: MassModel) -> Self {
        self.mass_model = mass_model;
        self
    }

    pub fn with_outline_slice(mut self, fraction: Option<f64>) -> Self {
        self.outline_slice = fraction;
        self
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> AnalysisResult<()> {
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(AnalysisError::invalid_config(format!(
                "scale_factor must be positive, got {}",
                self.scale_factor
            )));
        }
        if !(self.base_tolerance > 0.0 && self.base_tolerance < 1.0) {
            return Err(AnalysisError::invalid_config(format!(
                "base_tolerance must be in (0, 1), got {}",
                self.base_tolerance
            )));
        }
        if !(self.dedup_tolerance >= 0.0 && self.dedup_tolerance < self.base_tolerance) {
            return Err(AnalysisError::invalid_config(format!(
                "dedup_tolerance must be in [0, base_tolerance), got {}",
                self.dedup_tolerance
            )));
        }
        if let Some(fraction) = self.outline_slice {
            if !(fraction > 0.0 && fraction < 1.0) {
                return Err(AnalysisError::invalid_config(format!(
                    "outline_slice must be in (0, 1), got {}",
                    fraction
                )));
            }
        }
        match self.boundary {
            BoundaryMethod::RadialTrace { bins } if bins < 3 => Err(
                AnalysisError::invalid_config(format!("radial trace needs at least 3 bins, got {}", bins)),
            ),
            BoundaryMethod::GridTrace { resolution, .. } if resolution < 3 => {
                Err(AnalysisError::invalid_config(format!(
                    "grid trace needs a resolution of at least 3, got {}",
                    resolution
                )))
            }
            _ => Ok(()),
        }
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: AnalysisConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `hotuiti.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply the `HOTUITI_SCALE_FACTOR`, `HOTUITI_BASE_TOLERANCE`,
    /// `HOTUITI_OUTLINE_SLICE` and `HOTUITI_FRONT_AXIS` overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(scale) = std::env::var("HOTUITI_SCALE_FACTOR") {
            self.scale_factor = scale
                .parse()
                .with_context(|| format!("HOTUITI_SCALE_FACTOR is not a number: {}", scale))?;
        }

        if let Ok(tolerance) = std::env::var("HOTUITI_BASE_TOLERANCE") {
            self.base_tolerance = tolerance
                .parse()
                .with_context(|| format!("HOTUITI_BASE_TOLERANCE is not a number: {}", tolerance))?;
        }

        if let Ok(slice) = std::env::var("HOTUITI_OUTLINE_SLICE") {
            self.outline_slice = Some(
                slice
                    .parse()
                    .with_context(|| format!("HOTUITI_OUTLINE_SLICE is not a number: {}", slice))?,
            );
        }

        if let Ok(axis) = std::env::var("HOTUITI_FRONT_AXIS") {
            self.front_axis = axis.parse().map_err(anyhow::Error::msg)?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.front_axis, FrontAxis::PosZ);
        assert_eq!(config.boundary, BoundaryMethod::RadialTrace { bins: 72 });
        assert_eq!(AnalysisConfig::moai().scale_factor, MOAI_SCALE_FACTOR);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(AnalysisConfig::default().with_scale_factor(0.0).validate().is_err());
        assert!(AnalysisConfig::default().with_base_tolerance(1.5).validate().is_err());
        assert!(AnalysisConfig::default()
            .with_boundary(BoundaryMethod::RadialTrace { bins: 2 })
            .validate()
            .is_err());
        assert!(AnalysisConfig::default().with_outline_slice(Some(1.0)).validate().is_err());
        assert!(AnalysisConfig::default().with_outline_slice(Some(0.1)).validate().is_ok());
    }

    #[test]
    fn test_boundary_method_parsing() {
        assert_eq!("hull".parse::<BoundaryMethod>(), Ok(BoundaryMethod::ConvexHull));
        assert_eq!(
            "radial:36".parse::<BoundaryMethod>(),
            Ok(BoundaryMethod::RadialTrace { bins: 36 })
        );
        assert_eq!(
            "grid".parse::<BoundaryMethod>(),
            Ok(BoundaryMethod::GridTrace {
                resolution: 25,
                smoothing: 7
            })
        );
        assert!("radial:many".parse::<BoundaryMethod>().is_err());
        assert!("alpha".parse::<BoundaryMethod>().is_err());
    }

    #[test]
    fn test_front_axis_lateral_is_right_hand() {
        assert_eq!(FrontAxis::PosZ.lateral(), Vector2::new(1.0, 0.0));
        assert_eq!(FrontAxis::PosX.lateral(), Vector2::new(0.0, -1.0));
        assert_eq!("-z".parse::<FrontAxis>(), Ok(FrontAxis::NegZ));
        assert_eq!(FrontAxis::NegX.to_string(), "-x");
    }

    #[test]
    fn test_toml_round_trip() -> Result<()> {
        let config = AnalysisConfig::moai()
            .with_front_axis(FrontAxis::NegZ)
            .with_boundary(BoundaryMethod::GridTrace {
                resolution: 40,
                smoothing: 5,
            })
            .with_outline_slice(Some(0.1));

        let file = NamedTempFile::new()?;
        config.save(file.path())?;
        let loaded = AnalysisConfig::from_file(file.path())?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AnalysisConfig = toml::from_str("scale_factor = 2.0\nfront_axis = \"-x\"\n").unwrap();
        assert_eq!(config.scale_factor, 2.0);
        assert_eq!(config.front_axis, FrontAxis::NegX);
        assert_eq!(config.base_tolerance, DEFAULT_BASE_TOLERANCE);
    }
}
