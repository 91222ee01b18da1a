use flowmap_core::cell::{outside_unit_square, Cell, Flux};
use flowmap_core::error::FlowError;
use glam::DVec2;
use proptest::prelude::*;

fn square(size: f64, flux: Flux) -> Cell {
    Cell::new(
        [
            DVec2::new(0.0, 0.0),
            DVec2::new(size, 0.0),
            DVec2::new(size, size),
            DVec2::new(0.0, size),
        ],
        0,
        0,
        flux,
    )
}

fn trapezoid() -> Cell {
    Cell::new(
        [
            DVec2::new(0.0, 0.0),
            DVec2::new(4.0, 0.0),
            DVec2::new(3.0, 2.0),
            DVec2::new(1.0, 2.0),
        ],
        1,
        2,
        Flux::ZERO,
    )
}

#[test]
fn test_denormalize_hits_corners() {
    let cell = trapezoid();
    let expected = [
        (DVec2::new(0.0, 0.0), DVec2::new(0.0, 0.0)),
        (DVec2::new(1.0, 0.0), DVec2::new(4.0, 0.0)),
        (DVec2::new(1.0, 1.0), DVec2::new(3.0, 2.0)),
        (DVec2::new(0.0, 1.0), DVec2::new(1.0, 2.0)),
    ];
    for (normal, world) in expected {
        let p = cell.denormalize(normal).unwrap();
        assert!(p.distance(world) < 1e-12, "{:?} -> {:?}, expected {:?}", normal, p, world);
    }
    let centre = cell.denormalize(DVec2::splat(0.5)).unwrap();
    assert!(centre.distance(DVec2::new(2.0, 1.0)) < 1e-12);
}

#[test]
fn test_outside_unit_square_rejected() {
    let cell = square(1.0, Flux::ZERO);
    assert!(outside_unit_square(DVec2::new(1.5, 0.5)));
    assert!(matches!(
        cell.denormalize(DVec2::new(1.5, 0.5)),
        Err(FlowError::OutsideUnitSquare { .. })
    ));
    assert!(cell.jacobian(DVec2::new(0.5, -0.1)).is_err());
    assert!(cell.denormalize(DVec2::new(f64::NAN, 0.5)).is_err());
}

#[test]
fn test_jacobian_of_scaled_square() {
    let cell = square(3.0, Flux::ZERO);
    let jac = cell.jacobian(DVec2::new(0.25, 0.75)).unwrap();
    assert_eq!(jac.value(0, 0), Some(3.0));
    assert_eq!(jac.value(0, 1), Some(0.0));
    assert_eq!(jac.value(1, 0), Some(0.0));
    assert_eq!(jac.value(1, 1), Some(3.0));
    assert_eq!(jac.determinant().unwrap(), 9.0);
}

#[test]
fn test_normal_velocity_interpolates_flux() {
    let cell = square(1.0, Flux::new(1.0, 2.0, 3.0, 4.0));

    let at_low = cell.normal_velocity(DVec2::ZERO).unwrap();
    assert!(at_low.distance(DVec2::new(1.0, 2.0)) < 1e-12);

    let at_high = cell.normal_velocity(DVec2::ONE).unwrap();
    assert!(at_high.distance(DVec2::new(3.0, 4.0)) < 1e-12);

    let mid = cell.normal_velocity(DVec2::splat(0.5)).unwrap();
    assert!(mid.distance(DVec2::new(2.0, 3.0)) < 1e-12);
}

#[test]
fn test_normal_velocity_scales_with_area() {
    let small = square(1.0, Flux::new(1.0, 1.0, 1.0, 1.0));
    let large = square(2.0, Flux::new(1.0, 1.0, 1.0, 1.0));
    let vs = small.normal_velocity(DVec2::splat(0.5)).unwrap();
    let vl = large.normal_velocity(DVec2::splat(0.5)).unwrap();
    assert!((vs.x / vl.x - 4.0).abs() < 1e-12);
}

#[test]
fn test_max_normal_speed() {
    let cell = square(1.0, Flux::new(0.0, 0.0, 3.0, 4.0));
    assert!((cell.max_normal_speed() - 5.0).abs() < 1e-12);
}

#[test]
fn test_degenerate_cell_detected() {
    let collapsed = Cell::new([DVec2::new(1.0, 1.0); 4], 4, 5, Flux::new(1.0, 1.0, 1.0, 1.0));
    assert!(matches!(
        collapsed.normal_velocity(DVec2::splat(0.5)),
        Err(FlowError::DegenerateCell { i: 4, j: 5 })
    ));
    assert_eq!(collapsed.max_normal_speed(), 0.0);

    let line = Cell::new(
        [
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(3.0, 0.0),
        ],
        0,
        0,
        Flux::ZERO,
    );
    assert!(matches!(
        line.normalize(DVec2::new(1.0, 1.0)),
        Err(FlowError::DegenerateCell { .. })
    ));
}

#[test]
fn test_normalize_inverts_denormalize() {
    let cell = trapezoid();
    for &(x, y) in &[(0.1, 0.2), (0.5, 0.5), (0.9, 0.7), (0.0, 1.0), (1.0, 0.0)] {
        let normal = DVec2::new(x, y);
        let world = cell.denormalize(normal).unwrap();
        let back = cell.normalize(world).unwrap();
        assert!(back.distance(normal) < 1e-9, "{:?} -> {:?} -> {:?}", normal, world, back);
    }
}

#[test]
fn test_contains() {
    let cell = trapezoid();
    assert!(cell.contains(DVec2::new(2.0, 1.0)));
    assert!(cell.contains(DVec2::new(0.5, 0.5)));
    assert!(!cell.contains(DVec2::new(0.1, 1.9)));
    assert!(!cell.contains(DVec2::new(5.0, 1.0)));
}

#[test]
fn test_extent() {
    assert!((square(1.0, Flux::ZERO).extent() - 2f64.sqrt()).abs() < 1e-12);
    assert!((trapezoid().extent() - 4.0).abs() < 1e-12);
    assert_eq!(trapezoid().corners()[2], DVec2::new(3.0, 2.0));
}

#[test]
fn test_jacobian_matches_finite_difference() {
    let cell = trapezoid();
    let p = DVec2::new(0.4, 0.3);
    let h = 1e-6;
    let jac = cell.jacobian(p).unwrap();
    let base = cell.denormalize(p).unwrap();
    let dx = (cell.denormalize(p + DVec2::new(h, 0.0)).unwrap() - base) / h;
    let dy = (cell.denormalize(p + DVec2::new(0.0, h)).unwrap() - base) / h;
    for (row, expected) in [(0, dx), (1, dy)] {
        let got = jac.row(row).unwrap().to_dvec2();
        assert!(got.distance(expected) < 1e-6, "row {}: {:?} vs {:?}", row, got, expected);
    }

    // Velocity is divided by the same area element.
    let flux = Flux::new(1.0, 0.0, 1.0, 0.0);
    let moving = Cell::new(*cell.corners(), 1, 2, flux);
    let det = jac.determinant().unwrap().abs();
    let v = moving.normal_velocity(p).unwrap();
    assert!((v.x - 1.0 / det).abs() < 1e-12);
}

/// Unit square with each corner jittered by less than 0.2, which keeps the
/// quadrilateral convex.
fn convex_quad() -> impl Strategy<Value = Cell> {
    prop::collection::vec((-0.2..0.2f64, -0.2..0.2f64), 4).prop_map(|jitter| {
        let base = [
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
        ];
        let mut corners = base;
        for (c, (dx, dy)) in corners.iter_mut().zip(jitter) {
            *c += DVec2::new(dx, dy);
        }
        Cell::new(corners, 0, 0, Flux::ZERO)
    })
}

proptest! {
    #[test]
    fn jacobian_is_nondegenerate_inside_convex_cells(
        cell in convex_quad(),
        x in 0.01..0.99f64,
        y in 0.01..0.99f64,
    ) {
        let det = cell.jacobian(DVec2::new(x, y)).unwrap().determinant().unwrap();
        prop_assert!(det.abs() > 0.0, "det = {}", det);
    }

    #[test]
    fn normalize_roundtrips_in_convex_cells(
        cell in convex_quad(),
        x in 0.0..=1.0f64,
        y in 0.0..=1.0f64,
    ) {
        let normal = DVec2::new(x, y);
        let world = cell.denormalize(normal).unwrap();
        let back = cell.normalize(world).unwrap();
        prop_assert!(back.distance(normal) < 1e-8, "{:?} vs {:?}", back, normal);
    }
}
