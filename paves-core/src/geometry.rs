//! Basic geometric types for PDF coordinates
//!
//! Points, rectangles and affine transformation matrices in the
//! `[a b c d e f]` form used throughout PDF.

use serde::Serialize;
use std::fmt;

/// A point in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Origin point (0, 0)
    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle given by its two extreme corners
///
/// `x0 <= x1` and `y0 <= y1` hold for every rectangle produced by this
/// crate except [`Rect::NONE`], which is "inside out" so that it acts
/// as the identity for [`Rect::union`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    /// The empty bounding box.
    pub const NONE: Rect = Rect {
        x0: f64::INFINITY,
        y0: f64::INFINITY,
        x1: f64::NEG_INFINITY,
        y1: f64::NEG_INFINITY,
    };

    /// Create a rectangle from its corners, as given
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Create a rectangle from two arbitrary corners
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x0: a.x.min(b.x),
            y0: a.y.min(b.y),
            x1: a.x.max(b.x),
            y1: a.y.max(b.y),
        }
    }

    /// Create a rectangle from position and size
    pub fn from_position_and_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_corners(Point::new(x, y), Point::new(x + width, y + height))
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Get the center point
    pub fn center(&self) -> Point {
        Point::new((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// True for [`Rect::NONE`] and anything else with no extent.
    pub fn is_none(&self) -> bool {
        self.x0 > self.x1 || self.y0 > self.y1
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Strict overlap test (touching edges do not overlap).
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(other.x1 <= self.x0 || self.x1 <= other.x0 || other.y1 <= self.y0 || self.y1 <= other.y0)
    }

    pub fn contains_point(&self, p: Point) -> bool {
        self.x0 <= p.x && p.x <= self.x1 && self.y0 <= p.y && p.y <= self.y1
    }

    /// Bounding box of this rectangle after transformation.
    pub fn transform(&self, matrix: &Matrix) -> Rect {
        get_bound([
            matrix.apply(Point::new(self.x0, self.y0)),
            matrix.apply(Point::new(self.x0, self.y1)),
            matrix.apply(Point::new(self.x1, self.y1)),
            matrix.apply(Point::new(self.x1, self.y0)),
        ])
    }

    pub fn scale(&self, factor: f64) -> Rect {
        Rect::new(
            self.x0 * factor,
            self.y0 * factor,
            self.x1 * factor,
            self.y1 * factor,
        )
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3},{:.3},{:.3},{:.3}",
            self.x0, self.y0, self.x1, self.y1
        )
    }
}

/// Affine transformation matrix `[a b c d e f]`
///
/// A point `(x, y)` maps to `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Matrix(pub [f64; 6]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Matrix([a, b, c, d, e, f])
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Matrix([sx, 0.0, 0.0, sy, 0.0, 0.0])
    }

    /// Compose two transformations: `self` is applied first, then `other`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a0, b0, c0, d0, e0, f0] = other.0;
        Matrix([
            a0 * a1 + c0 * b1,
            b0 * a1 + d0 * b1,
            a0 * c1 + c0 * d1,
            b0 * c1 + d0 * d1,
            a0 * e1 + c0 * f1 + e0,
            b0 * e1 + d0 * f1 + f0,
        ])
    }

    /// Translate within the space of this matrix.
    pub fn translate(&self, dx: f64, dy: f64) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        Matrix([a, b, c, d, dx * a + dy * c + e, dx * b + dy * d + f])
    }

    /// Transform a point
    pub fn apply(&self, p: Point) -> Point {
        let [a, b, c, d, e, f] = self.0;
        Point::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
    }

    /// Transform a distance vector (ignores translation)
    pub fn apply_norm(&self, p: Point) -> Point {
        let [a, b, c, d, _, _] = self.0;
        Point::new(a * p.x + c * p.y, b * p.x + d * p.y)
    }

    pub fn a(&self) -> f64 {
        self.0[0]
    }
    pub fn b(&self) -> f64 {
        self.0[1]
    }
    pub fn c(&self) -> f64 {
        self.0[2]
    }
    pub fn d(&self) -> f64 {
        self.0[3]
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, ff] = self.0;
        write!(f, "[{a:.2},{b:.2},{c:.2},{d:.2}, ({e:.2},{ff:.2})]")
    }
}

/// Bounding box of a set of points.
pub fn get_bound<I: IntoIterator<Item = Point>>(points: I) -> Rect {
    let mut rect = Rect::NONE;
    for p in points {
        rect.x0 = rect.x0.min(p.x);
        rect.y0 = rect.y0.min(p.y);
        rect.x1 = rect.x1.max(p.x);
        rect.y1 = rect.y1.max(p.y);
    }
    rect
}

/// Bounding box of a set of rectangles.
pub fn get_bound_rects<I: IntoIterator<Item = Rect>>(rects: I) -> Rect {
    rects
        .into_iter()
        .fold(Rect::NONE, |acc, rect| acc.union(&rect))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point() {
        let p = Point::new(10.0, 20.0);
        assert_eq!(p.x, 10.0);
        assert_eq!(p.y, 20.0);
        assert_eq!(Point::origin(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_rect() {
        let rect = Rect::from_corners(Point::new(110.0, 120.0), Point::new(10.0, 20.0));
        assert_eq!(rect, Rect::new(10.0, 20.0, 110.0, 120.0));
        assert_eq!(rect.width(), 100.0);
        assert_eq!(rect.height(), 100.0);
        assert_eq!(rect.center(), Point::new(60.0, 70.0));
    }

    #[test]
    fn test_rect_none_is_union_identity() {
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert!(Rect::NONE.is_none());
        assert_eq!(Rect::NONE.union(&rect), rect);
        assert_eq!(get_bound_rects(Vec::new()), Rect::NONE);
    }

    #[test]
    fn test_rect_overlaps_is_strict() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 20.0, 10.0);
        let c = Rect::new(5.0, 5.0, 15.0, 15.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_matrix_multiplication() {
        let translation = Matrix::translation(10.0, 20.0);
        assert_eq!(Matrix::IDENTITY.multiply(&translation), translation);
        assert_eq!(translation.multiply(&Matrix::IDENTITY), translation);

        // scale first, then translate
        let m = Matrix::scaling(2.0, 3.0).multiply(&translation);
        assert_eq!(m.apply(Point::new(1.0, 1.0)), Point::new(12.0, 23.0));
        // translate first, then scale
        let m = translation.multiply(&Matrix::scaling(2.0, 3.0));
        assert_eq!(m.apply(Point::new(1.0, 1.0)), Point::new(22.0, 63.0));
    }

    #[test]
    fn test_matrix_translate_in_own_space() {
        let m = Matrix::scaling(2.0, 2.0).translate(5.0, 0.0);
        assert_eq!(m.apply(Point::origin()), Point::new(10.0, 0.0));
    }

    #[test]
    fn test_rotation_transform_bbox() {
        let rotation = Matrix::new(0.0, 1.0, -1.0, 0.0, 0.0, 0.0);
        let p = rotation.apply(Point::new(1.0, 0.0));
        assert_eq!(p, Point::new(0.0, 1.0));
        let rect = Rect::new(0.0, 0.0, 2.0, 1.0).transform(&rotation);
        assert_eq!(rect, Rect::new(-1.0, 0.0, 0.0, 2.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Rect::new(1.0, 2.0, 3.0, 4.0).to_string(),
            "1.000,2.000,3.000,4.000"
        );
        assert_eq!(
            Matrix::IDENTITY.to_string(),
            "[1.00,0.00,0.00,1.00, (0.00,0.00)]"
        );
    }
}
