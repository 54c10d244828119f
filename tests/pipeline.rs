// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! End-to-end analysis tests on synthetic statues

use approx::assert_relative_eq;
use hotuiti::analysis::pipeline::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_FACTOR};
use hotuiti::analysis::{BaseFootprint, OutlineSource};
use hotuiti::{
    analyze, analyze_with_retry, AnalysisConfig, AnalysisError, BoundaryMethod, FrontAxis,
    MassModel, Mesh, Primitive,
};
use nalgebra::{Matrix4, Point2, Vector2, Vector3};
use std::f64::consts::PI;

/// D-shaped outline: rounded front toward +z, flat back
fn d_outline(radius: f64, back: f64, segments: usize) -> Vec<Point2<f64>> {
    let mut outline: Vec<Point2<f64>> = (0..=segments)
        .map(|i| {
            let angle = PI * i as f64 / segments as f64;
            Point2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect();
    outline.push(Point2::new(-radius, -back));
    outline.push(Point2::new(radius, -back));
    outline
}

/// Torso on a D-shaped base with a head overhanging the front
fn moai() -> Mesh {
    let mut statue = Primitive::prism(d_outline(0.5, 0.1, 24), 3.0).to_mesh();
    let mut head = Primitive::cuboid(Vector3::new(0.6, 0.8, 0.5)).to_mesh();
    head.transform(&Matrix4::new_translation(&Vector3::new(-0.3, 3.0, 0.1)));
    statue.merge(&head);
    statue
}

/// D-shaped prism whose bottom cap fans out from `apex` rather than the outline mean
fn d_prism_with_apex(apex: Point2<f64>, height: f64) -> (Mesh, Vec<Point2<f64>>) {
    let outline = d_outline(1.0, 0.2, 16);
    let n = outline.len();
    let mut vertices = Vec::with_capacity(2 * n + 2);
    for y in [0.0, height] {
        vertices.extend(outline.iter().map(|p| [p.x, y, p.y]));
    }
    let top_center = outline.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords) / n as f64;
    vertices.push([apex.x, 0.0, apex.y]);
    vertices.push([top_center.x, height, top_center.y]);

    let (bottom, top) = (2 * n, 2 * n + 1);
    let mut faces = Vec::with_capacity(4 * n);
    for i in 0..n {
        let j = (i + 1) % n;
        faces.push([bottom, j, i]);
        faces.push([top, n + i, n + j]);
        faces.push([i, j, n + j]);
        faces.push([i, n + j, n + i]);
    }
    (Mesh::from_arrays(&vertices, &faces), outline)
}

/// Floor and four walls, no lid
fn open_box(side: f64, height: f64) -> Mesh {
    let corners = [[0.0, 0.0], [side, 0.0], [side, side], [0.0, side]];
    let mut vertices = Vec::with_capacity(8);
    for y in [0.0, height] {
        vertices.extend(corners.iter().map(|&[x, z]| [x, y, z]));
    }
    let mut faces = vec![[0, 2, 1], [0, 3, 2]];
    for i in 0..4 {
        let j = (i + 1) % 4;
        faces.push([i, j, 4 + j]);
        faces.push([i, 4 + j, 4 + i]);
    }
    Mesh::from_arrays(&vertices, &faces)
}

fn square(half: f64) -> Vec<Point2<f64>> {
    vec![
        Point2::new(-half, -half),
        Point2::new(half, -half),
        Point2::new(half, half),
        Point2::new(-half, half),
    ]
}

#[test]
fn test_moai_stands_and_leans_forward() {
    let report = analyze(&moai(), &AnalysisConfig::default()).unwrap();

    println!("Moai: {}", serde_json::to_string_pretty(&report).unwrap());

    assert!(report.stable);
    assert_relative_eq!(report.total_height, 3.8, epsilon = 1e-12);
    assert!(report.height_fraction > 30.0 && report.height_fraction < 70.0);
    assert!(report.forward_lean_deg > 0.0);
    assert!(report.lateral_lean_deg.abs() < 1e-6);
    assert!(report.front_edge_distance > 0.0);
    assert!(report.front_clearance > 0.0);
    assert!(report.front_tipping_angle_deg > 0.0);
    assert_relative_eq!(report.base_width, 1.0, epsilon = 1e-9);
    assert_relative_eq!(report.base_depth, 0.6, epsilon = 1e-9);
    assert_eq!(report.triangle_count, moai().triangle_count());
}

#[test]
fn test_runs_are_bitwise_identical() {
    let mesh = moai();
    let config = AnalysisConfig::default();
    let first = analyze(&mesh, &config).unwrap();
    let second = analyze(&mesh, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_scaling_the_mesh_scales_lengths_only() {
    let mesh = moai();
    let config = AnalysisConfig::default();
    let unit = analyze(&mesh, &config).unwrap();
    let doubled = analyze(&mesh.scaled(2.0), &config).unwrap();

    assert_relative_eq!(doubled.center_of_mass, unit.center_of_mass * 2.0, epsilon = 1e-9);
    assert_relative_eq!(doubled.front_edge_distance, 2.0 * unit.front_edge_distance, epsilon = 1e-9);
    assert_relative_eq!(doubled.lateral_offset, 2.0 * unit.lateral_offset, epsilon = 1e-9);
    assert_relative_eq!(doubled.longitudinal_offset, 2.0 * unit.longitudinal_offset, epsilon = 1e-9);
    assert_relative_eq!(doubled.base_area, 4.0 * unit.base_area, epsilon = 1e-9);
    assert_relative_eq!(doubled.height_fraction, unit.height_fraction, epsilon = 1e-9);
    assert_relative_eq!(doubled.lean_angle_deg, unit.lean_angle_deg, epsilon = 1e-9);
    assert_relative_eq!(doubled.forward_lean_deg, unit.forward_lean_deg, epsilon = 1e-9);
    assert_eq!(doubled.stable, unit.stable);
}

#[test]
fn test_scale_factor_converts_units() {
    let mesh = moai();
    let model_units = analyze(&mesh, &AnalysisConfig::default()).unwrap();
    let meters = analyze(&mesh, &AnalysisConfig::moai()).unwrap();

    assert_relative_eq!(meters.total_height, 3.8 * 4.894, epsilon = 1e-9);
    assert_relative_eq!(meters.com_height, model_units.com_height * 4.894, epsilon = 1e-9);
    assert_relative_eq!(meters.height_fraction, model_units.height_fraction, epsilon = 1e-12);
    assert_relative_eq!(meters.lean_angle_deg, model_units.lean_angle_deg, epsilon = 1e-12);
    assert_eq!(meters.stable, model_units.stable);
}

#[test]
fn test_heavy_overhang_is_unstable() {
    let mesh = Primitive::leaning_prism(square(0.5), 2.0, Vector2::new(0.0, 3.0)).to_mesh();
    let report = analyze(&mesh, &AnalysisConfig::default()).unwrap();

    assert!(!report.stable);
    assert!(report.front_edge_distance < 0.0);
    assert!(report.nearest_edge_distance < 0.0);
    assert!(report.front_clearance < 0.0);
    assert!(report.front_tipping_angle_deg < 0.0);
    assert!(report.forward_lean_deg > 30.0);
}

#[test]
fn test_front_axis_flips_the_lean() {
    let mesh = Primitive::leaning_prism(square(1.0), 4.0, Vector2::new(0.0, 1.0)).to_mesh();
    let facing_z = analyze(&mesh, &AnalysisConfig::default()).unwrap();
    let facing_back = analyze(
        &mesh,
        &AnalysisConfig::default().with_front_axis(FrontAxis::NegZ),
    )
    .unwrap();

    assert!(facing_z.forward_lean_deg > 0.0);
    assert_relative_eq!(facing_back.forward_lean_deg, -facing_z.forward_lean_deg, epsilon = 1e-9);
    assert_relative_eq!(facing_back.lean_angle_deg, facing_z.lean_angle_deg, epsilon = 1e-9);
}

#[test]
fn test_tracers_agree_on_a_round_base() {
    let mesh = Primitive::cylinder(2.0, 1.0, 64).to_mesh();
    let hull = analyze(
        &mesh,
        &AnalysisConfig::default().with_boundary(BoundaryMethod::ConvexHull),
    )
    .unwrap();
    let radial = analyze(&mesh, &AnalysisConfig::default()).unwrap();
    let grid = analyze(
        &mesh,
        &AnalysisConfig::default().with_boundary(BoundaryMethod::GridTrace {
            resolution: 15,
            smoothing: 5,
        }),
    )
    .unwrap();

    assert_relative_eq!(radial.base_area, hull.base_area, epsilon = 1e-9);
    assert!((grid.base_area - hull.base_area).abs() < 0.35 * hull.base_area);
    for report in [&hull, &radial] {
        assert!(report.stable);
        assert!(report.lean_angle_deg < 1e-6);
    }
    // The grid outline is only symmetric up to one cell
    assert!(grid.stable);
    assert!(grid.lean_angle_deg < 5.0);
}

#[test]
fn test_off_centre_fan_apex_keeps_the_flat_back() {
    let (mesh, outline) = d_prism_with_apex(Point2::origin(), 2.0);
    let expected = BaseFootprint::from_polygon(outline).unwrap();

    let radial = analyze(&mesh, &AnalysisConfig::default()).unwrap();
    let hull = analyze(
        &mesh,
        &AnalysisConfig::default().with_boundary(BoundaryMethod::ConvexHull),
    )
    .unwrap();

    assert_eq!(radial.base_outline, OutlineSource::BandBoundary);
    assert_eq!(radial.base_candidate_count, expected.len() + 1);
    assert_relative_eq!(radial.base_area, expected.area(), epsilon = 1e-9);
    assert_relative_eq!(radial.base_area, hull.base_area, epsilon = 1e-9);
    assert_relative_eq!(radial.base_center, expected.centroid(), epsilon = 1e-9);
    // The fan apex at the origin never reaches the outline
    assert!(radial.base_polygon.iter().all(|p| p.coords.norm() > 0.1));
}

#[test]
fn test_grid_trace_closes_a_coarse_cylinder() {
    let mesh = Primitive::cylinder(2.0, 1.0, 16).to_mesh();
    let true_area = 8.0 * (PI / 8.0).sin();
    let report = analyze(
        &mesh,
        &AnalysisConfig::default().with_boundary(BoundaryMethod::GridTrace {
            resolution: 25,
            smoothing: 7,
        }),
    )
    .unwrap();

    assert!(
        (report.base_area - true_area).abs() < 0.25 * true_area,
        "grid area {} against {}",
        report.base_area,
        true_area
    );
    assert!(report.base_vertex_count > 16);
    assert!(report.stable);
    assert!(report.lean_angle_deg < 5.0);
}

#[test]
fn test_grid_trace_rejects_a_split_base() {
    // Two feet a full width apart
    let mut mesh = Primitive::cuboid(Vector3::new(1.0, 2.0, 1.0)).to_mesh();
    let mut right = mesh.clone();
    right.transform(&Matrix4::new_translation(&Vector3::new(3.0, 0.0, 0.0)));
    mesh.merge(&right);

    let grid = AnalysisConfig::default().with_boundary(BoundaryMethod::GridTrace {
        resolution: 40,
        smoothing: 3,
    });
    let err = analyze(&mesh, &grid).unwrap_err();
    assert!(matches!(err, AnalysisError::InsufficientBaseGeometry { .. }));
    assert!(analyze(&mesh, &AnalysisConfig::default()).is_ok());
}

#[test]
fn test_open_box_matches_the_worked_example() {
    // Floor weighs s^2 at y = 0, the walls 6s at y = 0.75
    let side = 1.389;
    let report = analyze(&open_box(side, 1.5), &AnalysisConfig::default()).unwrap();

    assert_relative_eq!(report.ground_level, 0.0);
    assert_relative_eq!(report.total_height, 1.5, epsilon = 1e-12);
    assert_relative_eq!(report.base_tolerance * report.total_height, 0.03, epsilon = 1e-12);
    assert_relative_eq!(report.com_height, 4.5 / (side + 6.0), epsilon = 1e-9);
    assert_relative_eq!(report.com_height, 0.609, epsilon = 1e-3);
    assert_relative_eq!(report.height_fraction, 40.6, epsilon = 0.01);
    assert_relative_eq!(report.base_area, side * side, epsilon = 1e-9);
    assert!(report.lean_angle_deg < 1e-6);
    assert!(report.stable);
}

#[test]
fn test_solid_model_matches_surface_on_symmetric_solid() {
    let mesh = Primitive::cylinder(2.0, 1.0, 64).to_mesh();
    let surface = analyze(&mesh, &AnalysisConfig::default()).unwrap();
    let solid = analyze(
        &mesh,
        &AnalysisConfig::default().with_mass_model(MassModel::Solid),
    )
    .unwrap();

    assert_eq!(solid.mass_model, MassModel::Solid);
    assert_relative_eq!(solid.center_of_mass, surface.center_of_mass, epsilon = 1e-9);
    assert_relative_eq!(solid.volume.unwrap(), 2.0 * solid.base_area, epsilon = 1e-6);
    assert!(surface.volume.is_none());
}

#[test]
fn test_retry_recovers_a_pointed_base() {
    // Single vertex on the ground under a ring slightly above it
    let mesh = Mesh::from_arrays(
        &[
            [0.0, 0.0, 0.0],
            [1.0, 0.05, 0.0],
            [0.0, 0.05, 1.0],
            [-1.0, 0.05, 0.0],
            [0.0, 0.05, -1.0],
            [0.0, 1.0, 0.0],
        ],
        &[
            [0, 1, 4],
            [0, 4, 3],
            [0, 3, 2],
            [0, 2, 1],
            [5, 1, 2],
            [5, 2, 3],
            [5, 3, 4],
            [5, 4, 1],
        ],
    );

    let err = analyze(&mesh, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::InsufficientBaseGeometry { .. }));

    let report = analyze_with_retry(
        &mesh,
        &AnalysisConfig::default(),
        DEFAULT_RETRY_FACTOR,
        DEFAULT_RETRY_ATTEMPTS,
    )
    .unwrap();
    assert!(report.base_tolerance > 0.05);
    assert_relative_eq!(report.base_area, 2.0, epsilon = 1e-9);
}

#[test]
fn test_failures_are_classified() {
    let coincident = Mesh::from_arrays(&[[1.0, 2.0, 3.0]; 3], &[[0, 1, 2], [1, 2, 0]]);
    assert!(matches!(
        analyze(&coincident, &AnalysisConfig::default()),
        Err(AnalysisError::DegenerateMesh { .. })
    ));

    let flat = Primitive::prism(square(1.0), 0.0).to_mesh();
    assert!(matches!(
        analyze(&flat, &AnalysisConfig::default()),
        Err(AnalysisError::DegenerateMesh { .. })
    ));

    let dangling = Mesh::from_arrays(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &[[0, 1, 7]]);
    assert!(matches!(
        analyze(&dangling, &AnalysisConfig::default()),
        Err(AnalysisError::MalformedMesh { .. })
    ));

    let bad_config = AnalysisConfig::default().with_base_tolerance(0.0);
    assert!(matches!(
        analyze(&moai(), &bad_config),
        Err(AnalysisError::InvalidConfig(_))
    ));
}

#[test]
fn test_report_serializes_to_json() {
    let report = analyze(&moai(), &AnalysisConfig::default())
        .unwrap()
        .with_source("moai.stl");
    let json = serde_json::to_string(&report).unwrap();
    let back: hotuiti::AnalysisReport = serde_json::from_str(&json).unwrap();

    assert_eq!(back.source.as_deref(), Some("moai.stl"));
    assert_eq!(back.stable, report.stable);
    assert_eq!(back.base_polygon.len(), report.base_polygon.len());
    assert!(json.contains("\"front_axis\":\"+z\""));
}
