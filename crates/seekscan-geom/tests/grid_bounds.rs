use proptest::prelude::*;
use seekscan_core::Point2D;
use seekscan_geom::{make_grid, make_offsets, tile_offsets, TileSpec};

fn rotate(point: &Point2D, angle: f64) -> Point2D {
    let (sin, cos) = angle.sin_cos();
    Point2D::new(cos * point.x - sin * point.y, sin * point.x + cos * point.y)
}

#[test]
fn positive_angle_turns_the_grid_clockwise() {
    let plain = make_offsets(10.0, Some(30.0), 75.0, 2.0, 1.0, 0.0).unwrap();
    let turned = make_offsets(10.0, Some(30.0), 75.0, 2.0, 1.0, std::f64::consts::FRAC_PI_2).unwrap();
    assert_eq!(plain.len(), turned.len());
    for (original, rotated) in plain.iter().zip(turned.iter()) {
        assert!((rotated.x - original.y).abs() < 1e-9);
        assert!((rotated.y + original.x).abs() < 1e-9);
    }
}

#[test]
fn camera_angle_rotates_corner_tile_into_lower_right() {
    let plain = make_offsets(10.0, Some(30.0), 75.0, 2.0, 1.0, 0.0).unwrap();
    let turned = make_offsets(10.0, Some(30.0), 75.0, 2.0, 1.0, -0.95).unwrap();
    let (sin, cos) = (-0.95f64).sin_cos();
    for (original, rotated) in plain.iter().zip(turned.iter()) {
        let expected = Point2D::new(
            original.x * cos + original.y * sin,
            -original.x * sin + original.y * cos,
        );
        assert!(rotated.distance(&expected) < 1e-9);
    }
    let corner = Point2D::new(-37.5, -37.5);
    let idx = plain
        .iter()
        .position(|p| p.distance(&corner) < 1e-9)
        .expect("corner tile present");
    let rotated = turned.iter().nth(idx).unwrap();
    assert!((rotated.x - 8.690).abs() < 1e-3);
    assert!((rotated.y + 52.316).abs() < 1e-3);
}

#[test]
fn tile_count_matches_diameter_over_pitch() {
    let (_, summary) = tile_offsets(&TileSpec::square(10.0), 75.0).unwrap();
    assert_eq!(summary.nx, 13);
    assert_eq!(summary.ny, 13);
    assert!(summary.count > 0);
}

#[test]
fn rectangular_tiles_count_axes_independently() {
    let spec = TileSpec {
        box_x: 10.0,
        box_y: Some(4.0),
        padding: 2.0,
        k: 1.0,
        angle: 0.0,
    };
    let (_, summary) = tile_offsets(&spec, 75.0).unwrap();
    assert_eq!(summary.nx, 13);
    assert_eq!(summary.ny, 26);
    assert_eq!(summary.box_y, 4.0);
}

#[test]
fn lattice_is_row_major_and_centered() {
    let grid = make_grid(3, 3, 10.0, 0.0);
    // Only the center and the four edge midpoints sit strictly inside the unit circle.
    let expected = vec![
        Point2D::new(0.0, -10.0),
        Point2D::new(-10.0, 0.0),
        Point2D::new(0.0, 0.0),
        Point2D::new(10.0, 0.0),
        Point2D::new(0.0, 10.0),
    ];
    let kept: Vec<Point2D> = grid.iter().copied().collect();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0], Point2D::ORIGIN);
    let relaxed = make_grid(3, 3, 10.0, -0.01);
    assert_eq!(relaxed.as_slice(), expected.as_slice());
}

#[test]
fn oversized_tiles_collapse_to_single_center_point() {
    let grid = make_offsets(200.0, None, 75.0, 2.0, 1.0, 0.3).unwrap();
    assert_eq!(grid.as_slice(), &[Point2D::ORIGIN]);
}

#[test]
fn extreme_border_is_clamped_to_an_empty_grid() {
    let (grid, summary) = tile_offsets(
        &TileSpec {
            box_x: 10.0,
            box_y: None,
            padding: 2.0,
            k: 20.0,
            angle: 0.0,
        },
        75.0,
    )
    .unwrap();
    assert_eq!(summary.borderwidth, 1.0);
    assert!(grid.is_empty());
}

#[test]
fn negative_k_is_clamped_to_no_border() {
    let (_, summary) = tile_offsets(
        &TileSpec {
            box_x: 10.0,
            box_y: None,
            padding: 2.0,
            k: -1.0,
            angle: 0.0,
        },
        75.0,
    )
    .unwrap();
    assert_eq!(summary.borderwidth, 0.0);
}

#[test]
fn invalid_parameters_are_rejected() {
    assert!(make_offsets(10.0, None, 0.0, 2.0, 1.0, 0.0).is_err());
    assert!(make_offsets(0.0, None, 75.0, 2.0, 1.0, 0.0).is_err());
    assert!(make_offsets(10.0, None, 75.0, -10.0, 1.0, 0.0).is_err());
    assert!(make_offsets(10.0, None, f64::NAN, 2.0, 1.0, 0.0).is_err());
}

proptest! {
    #[test]
    fn offsets_stay_inside_usable_interior(
        box_x in 1.0f64..40.0,
        box_y in proptest::option::of(1.0f64..40.0),
        radius in 20.0f64..200.0,
        padding in 0.0f64..5.0,
        k in 0.0f64..1.5,
    ) {
        let spec = TileSpec { box_x, box_y, padding, k, angle: 0.0 };
        let (grid, summary) = tile_offsets(&spec, radius).unwrap();
        prop_assume!(summary.nx > 1 || summary.ny > 1);
        let limit = radius * (1.0 - summary.borderwidth);
        for offset in grid.iter() {
            prop_assert!(offset.norm() < limit + 1e-9 * radius);
        }
    }

    #[test]
    fn generation_is_deterministic(
        box_x in 2.0f64..30.0,
        radius in 20.0f64..150.0,
        angle in -3.1f64..3.1,
    ) {
        let a = make_offsets(box_x, None, radius, 2.0, 1.0, angle).unwrap();
        let b = make_offsets(box_x, None, radius, 2.0, 1.0, angle).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn rotating_back_restores_the_grid(
        box_x in 2.0f64..30.0,
        radius in 20.0f64..150.0,
        angle in -3.1f64..3.1,
    ) {
        prop_assume!(angle.abs() > 1e-6);
        let plain = make_offsets(box_x, None, radius, 2.0, 1.0, 0.0).unwrap();
        let rotated = make_offsets(box_x, None, radius, 2.0, 1.0, angle).unwrap();
        prop_assert_eq!(plain.len(), rotated.len());
        for (original, turned) in plain.iter().zip(rotated.iter()) {
            let back = rotate(turned, angle);
            prop_assert!(back.distance(original) < 1e-9 * radius.max(1.0));
            prop_assert!((turned.norm() - original.norm()).abs() < 1e-9 * radius.max(1.0));
        }
    }
}
