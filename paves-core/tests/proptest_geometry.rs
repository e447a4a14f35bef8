//! Property-based tests for geometric types
//!
//! Invariants of Rect and Matrix that the rest of the crate relies on:
//! normalized corners, union as a bounding operation, and matrix
//! composition order.

use paves::geometry::{get_bound, get_bound_rects};
use paves::{Matrix, Point, Rect};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1e4..1e4f64,
        Just(0.0),
        Just(1.0),
        Just(-1.0),
        Just(612.0),
        Just(792.0),
    ]
}

prop_compose! {
    fn point_strategy()(x in coord(), y in coord()) -> Point {
        Point::new(x, y)
    }
}

prop_compose! {
    fn rect_strategy()(a in point_strategy(), b in point_strategy()) -> Rect {
        Rect::from_corners(a, b)
    }
}

prop_compose! {
    // Scale, shear and translation small enough to keep errors tiny
    fn matrix_strategy()(
        a in -4.0..4.0f64,
        b in -4.0..4.0f64,
        c in -4.0..4.0f64,
        d in -4.0..4.0f64,
        e in -1e3..1e3f64,
        f in -1e3..1e3f64
    ) -> Matrix {
        Matrix::new(a, b, c, d, e, f)
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
}

proptest! {
    #[test]
    fn test_from_corners_is_normalized(a in point_strategy(), b in point_strategy()) {
        let rect = Rect::from_corners(a, b);
        prop_assert!(rect.x0 <= rect.x1);
        prop_assert!(rect.y0 <= rect.y1);
        prop_assert!(rect.contains_point(a));
        prop_assert!(rect.contains_point(b));
        prop_assert!(rect.width() >= 0.0 && rect.height() >= 0.0);
    }

    #[test]
    fn test_union_contains_both(r1 in rect_strategy(), r2 in rect_strategy()) {
        let union = r1.union(&r2);
        prop_assert_eq!(union, r2.union(&r1));
        for r in [r1, r2] {
            prop_assert!(union.x0 <= r.x0 && union.y0 <= r.y0);
            prop_assert!(union.x1 >= r.x1 && union.y1 >= r.y1);
        }
    }

    #[test]
    fn test_none_is_union_identity(r in rect_strategy()) {
        prop_assert!(Rect::NONE.is_none());
        prop_assert_eq!(Rect::NONE.union(&r), r);
        prop_assert_eq!(get_bound_rects([r]), r);
        prop_assert!(get_bound_rects(std::iter::empty()).is_none());
    }

    #[test]
    fn test_bound_of_points(points in prop::collection::vec(point_strategy(), 1..20)) {
        let bound = get_bound(points.iter().copied());
        prop_assert!(!bound.is_none());
        for p in &points {
            prop_assert!(bound.contains_point(*p));
        }
    }

    #[test]
    fn test_translation_moves_rect(r in rect_strategy(), tx in coord(), ty in coord()) {
        let moved = r.transform(&Matrix::translation(tx, ty));
        prop_assert!(close(moved.x0, r.x0 + tx));
        prop_assert!(close(moved.y1, r.y1 + ty));
        prop_assert!(close(moved.width(), r.width()));
    }

    #[test]
    fn test_transformed_rect_stays_normalized(r in rect_strategy(), m in matrix_strategy()) {
        let t = r.transform(&m);
        prop_assert!(t.x0 <= t.x1);
        prop_assert!(t.y0 <= t.y1);
        let c = m.apply(r.center());
        prop_assert!(t.x0 - 1e-6 <= c.x && c.x <= t.x1 + 1e-6);
        prop_assert!(t.y0 - 1e-6 <= c.y && c.y <= t.y1 + 1e-6);
    }

    #[test]
    fn test_multiply_applies_self_first(
        m1 in matrix_strategy(),
        m2 in matrix_strategy(),
        p in point_strategy()
    ) {
        let composed = m1.multiply(&m2).apply(p);
        let stepwise = m2.apply(m1.apply(p));
        prop_assert!(close(composed.x, stepwise.x));
        prop_assert!(close(composed.y, stepwise.y));
    }

    #[test]
    fn test_identity_is_neutral(m in matrix_strategy(), p in point_strategy()) {
        prop_assert_eq!(Matrix::IDENTITY.multiply(&m), m);
        prop_assert_eq!(m.multiply(&Matrix::IDENTITY), m);
        prop_assert_eq!(Matrix::IDENTITY.apply(p), p);
    }
}
