//! Geometric primitives for diagram layout and connector placement.
//!
//! This module provides the geometry kernel used throughout Lintmap
//! for positioning class boxes and attaching connectors to their borders.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis-aligned box defined by minimum and maximum coordinates
//! - [`Insets`] - Padding/margin values for four sides
//! - [`Segment`] - A line segment with the intersection primitive
//!
//! # Coordinate System
//!
//! Lintmap uses a screen coordinate system:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! - **Origin**: Top-left corner of the canvas at `(0, 0)`
//! - **X-axis**: Increases rightward
//! - **Y-axis**: Increases downward, so the "top" edge of a box is its `min_y`
//!
//! All coordinates are `f64`.

/// A 2D point representing a position in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use lintmap_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f64 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f64 {
        self.y
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the hypotenuse (Euclidean distance from origin)
    pub fn hypot(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Point) -> f64 {
        self.sub_point(other).hypot()
    }

    /// Multiplies both coordinates by the given factor.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lintmap_core::geometry::Point;
    /// let point = Point::new(10.0, 20.0);
    ///
    /// let doubled = point.scale(2.0);
    /// assert_eq!(doubled.x(), 20.0);
    /// assert_eq!(doubled.y(), 40.0);
    /// ```
    pub fn scale(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Returns the unit vector pointing in the same direction, or `None` for the zero vector.
    pub fn normalize(self) -> Option<Self> {
        let length = self.hypot();
        if length == 0.0 {
            None
        } else {
            Some(self.scale(1.0 / length))
        }
    }

    /// Returns the vector rotated by 90 degrees (clockwise on screen).
    pub fn perpendicular(self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f64,
    height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f64 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f64 {
        self.height
    }

    /// Half of the width and height, as used by center-based boxes
    pub fn half_extents(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Returns a new Size with padding added to both width and height
    pub fn add_padding(self, insets: Insets) -> Self {
        Self {
            width: self.width + insets.left + insets.right,
            height: self.height + insets.top + insets.bottom,
        }
    }

    /// Multiplies both dimensions by the given factor
    pub fn scale(self, factor: f64) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}

/// Represents an axis-aligned box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Bounds {
    /// Creates a new bounds from a center point and a size
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f64 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f64 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f64 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f64 {
        self.max_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f64 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f64 {
        self.max_y - self.min_y
    }

    /// Converts bounds to a Size object
    pub fn to_size(self) -> Size {
        Size {
            width: self.width(),
            height: self.height(),
        }
    }

    /// North-west (top-left) corner
    pub fn north_west(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// North-east (top-right) corner
    pub fn north_east(self) -> Point {
        Point::new(self.max_x, self.min_y)
    }

    /// South-west (bottom-left) corner
    pub fn south_west(self) -> Point {
        Point::new(self.min_x, self.max_y)
    }

    /// South-east (bottom-right) corner
    pub fn south_east(self) -> Point {
        Point::new(self.max_x, self.max_y)
    }

    /// Returns the four edges of the box in attachment priority order:
    /// top (NE→NW), bottom (SE→SW), left (SW→NW), right (NE→SE).
    pub fn edges(self) -> [Segment; 4] {
        [
            Segment::new(self.north_east(), self.north_west()),
            Segment::new(self.south_east(), self.south_west()),
            Segment::new(self.south_west(), self.north_west()),
            Segment::new(self.north_east(), self.south_east()),
        ]
    }

    /// Returns true if the point lies inside the box or on its border
    pub fn contains(self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Merges two bounds to create a larger bounds that contains both.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lintmap_core::geometry::{Bounds, Point, Size};
    /// let a = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 30.0));
    /// let b = Bounds::new_from_top_left(Point::new(10.0, 40.0), Size::new(120.0, 80.0));
    ///
    /// let combined = a.merge(&b);
    /// assert_eq!(combined.width(), 130.0);
    /// assert_eq!(combined.height(), 120.0);
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// Represents spacing around an element (padding, margin, etc.)
/// with potentially different values for each side
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Insets {
    top: f64,
    right: f64,
    bottom: f64,
    left: f64,
}

impl Insets {
    /// Creates uniform insets with the same value for all sides
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

/// A line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    start: Point,
    end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn start(self) -> Point {
        self.start
    }

    pub fn end(self) -> Point {
        self.end
    }

    /// Returns the crossing point of two segments.
    ///
    /// The crossing is returned only if it lies within `[0, 1]` (inclusive)
    /// of both segments' parameter ranges. Segments whose determinant is
    /// exactly zero are treated as parallel and never intersect; there is
    /// no epsilon tolerance.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lintmap_core::geometry::{Point, Segment};
    /// let horizontal = Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
    /// let vertical = Segment::new(Point::new(5.0, -5.0), Point::new(5.0, 5.0));
    /// assert_eq!(horizontal.intersection(&vertical), Some(Point::new(5.0, 0.0)));
    ///
    /// // The vertical span never reaches y = 0
    /// let short = Segment::new(Point::new(5.0, 5.0), Point::new(5.0, 6.0));
    /// assert_eq!(horizontal.intersection(&short), None);
    /// ```
    pub fn intersection(&self, other: &Segment) -> Option<Point> {
        let (a, b) = (self.start.x, self.start.y);
        let (c, d) = (self.end.x, self.end.y);
        let (e, f) = (other.start.x, other.start.y);
        let (g, h) = (other.end.x, other.end.y);

        let det = (c - a) * (h - f) - (g - e) * (d - b);
        if det == 0.0 {
            return None;
        }

        let y = (b * (c - a) * (h - f) - a * (d - b) * (h - f) - f * (g - e) * (d - b)
            + e * (d - b) * (h - f))
            / det;

        // A non-zero determinant guarantees at least one of the two
        // vertical extents is non-zero.
        let x = if (d - b).abs() >= (h - f).abs() {
            a + (c - a) * (y - b) / (d - b)
        } else {
            e + (g - e) * (y - f) / (h - f)
        };
        let point = Point::new(x, y);

        let within = |t: f64| (0.0..=1.0).contains(&t);
        if !within(self.parameter_of(point)?) || !within(other.parameter_of(point)?) {
            return None;
        }

        Some(point)
    }

    /// Parameter `t` such that `start + t * (end - start)` equals `point`,
    /// measured along the segment's dominant axis.
    ///
    /// Returns `None` for a degenerate (zero-length) segment.
    fn parameter_of(self, point: Point) -> Option<f64> {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        if dx == 0.0 && dy == 0.0 {
            None
        } else if dx.abs() >= dy.abs() {
            Some((point.x - self.start.x) / dx)
        } else {
            Some((point.y - self.start.y) / dy)
        }
    }
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1000.0f64..1000.0, -1000.0f64..1000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    fn segment_strategy() -> impl Strategy<Value = Segment> {
        (point_strategy(), point_strategy()).prop_map(|(a, b)| Segment::new(a, b))
    }

    /// Skips nearly parallel or nearly degenerate pairs, where the
    /// closed-form solution is ill-conditioned.
    fn well_conditioned(s1: Segment, s2: Segment) -> bool {
        let d1 = s1.end().sub_point(s1.start());
        let d2 = s2.end().sub_point(s2.start());
        match (d1.normalize(), d2.normalize()) {
            (Some(u1), Some(u2)) => {
                d1.hypot() > 1e-3
                    && d2.hypot() > 1e-3
                    && (u1.x() * u2.y() - u1.y() * u2.x()).abs() > 1e-3
            }
            _ => false,
        }
    }

    /// A returned crossing lies on both segments (within floating tolerance).
    fn check_intersection_lies_on_both(s1: Segment, s2: Segment) -> Result<(), TestCaseError> {
        prop_assume!(well_conditioned(s1, s2));
        if let Some(point) = s1.intersection(&s2) {
            for segment in [s1, s2] {
                let len = segment.start().distance(segment.end());
                let via = segment.start().distance(point) + point.distance(segment.end());
                prop_assert!(
                    approx_eq!(f64, len, via, epsilon = 1e-6 * len.max(1.0)),
                    "{point:?} is not on {segment:?}"
                );
            }
        }
        Ok(())
    }

    /// Intersection is symmetric in its arguments.
    fn check_intersection_symmetric(s1: Segment, s2: Segment) -> Result<(), TestCaseError> {
        prop_assume!(well_conditioned(s1, s2));
        let forward = s1.intersection(&s2);
        let backward = s2.intersection(&s1);
        match (forward, backward) {
            (Some(p), Some(q)) => {
                prop_assert!(approx_eq!(f64, p.x(), q.x(), epsilon = 1e-6));
                prop_assert!(approx_eq!(f64, p.y(), q.y(), epsilon = 1e-6));
            }
            (None, None) => {}
            // Crossings that touch an endpoint may be lost to rounding on one side only
            (Some(p), None) | (None, Some(p)) => {
                let near_end = [s1.start(), s1.end(), s2.start(), s2.end()]
                    .iter()
                    .any(|end| end.distance(p) < 1e-6);
                prop_assert!(near_end, "asymmetric crossing at {p:?}");
            }
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn intersection_lies_on_both(s1 in segment_strategy(), s2 in segment_strategy()) {
            check_intersection_lies_on_both(s1, s2)?;
        }

        #[test]
        fn intersection_symmetric(s1 in segment_strategy(), s2 in segment_strategy()) {
            check_intersection_symmetric(s1, s2)?;
        }
    }
}
