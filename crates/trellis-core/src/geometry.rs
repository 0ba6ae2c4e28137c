//! Geometric primitives shared by the layout engines.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in layout space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis-aligned rectangle defined by minimum and maximum coordinates
//! - [`Insets`] - Per-side inset values used for framing
//!
//! # Coordinate System
//!
//! Layouts use screen coordinates:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Angles are measured in radians from the +X axis towards +Y, so a positive
//! angle turns clockwise on screen.

use serde::{Deserialize, Serialize};

/// A 2D point in layout space.
///
/// # Examples
///
/// ```
/// # use trellis_core::geometry::Point;
/// let anchor = Point::new(100.0, 100.0);
/// let offset = Point::from_polar(50.0, 0.0);
///
/// let placed = anchor.add_point(offset);
/// assert_eq!(placed.x(), 150.0);
/// assert_eq!(placed.y(), 100.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Creates the offset vector of length `radius` pointing at `angle`.
    pub fn from_polar(radius: f32, angle: f32) -> Self {
        Self {
            x: radius * angle.cos(),
            y: radius * angle.sin(),
        }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Checks that neither coordinate is NaN or infinite
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
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

    /// Euclidean length of the point treated as a vector
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Point) -> f32 {
        self.sub_point(other).hypot()
    }

    /// Angle of the vector from this point towards `other`, in radians.
    pub fn angle_to(self, other: Point) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Multiplies both coordinates by the given factor.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Converts a point and size into a bounds rectangle
    ///
    /// The point is treated as the center of the bounds.
    pub fn to_bounds(self, size: Size) -> Bounds {
        Bounds::new_from_center(self, size)
    }
}

/// Width and height of an element
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Creates a square size
    pub fn square(side: f32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }
}

/// An axis-aligned rectangle with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates bounds from the `(x, y, width, height)` quadruple used by layout callers.
    ///
    /// # Examples
    ///
    /// ```
    /// # use trellis_core::geometry::Bounds;
    /// let bounds = Bounds::new(10.0, 20.0, 300.0, 100.0);
    /// assert_eq!(bounds.max_x(), 310.0);
    /// assert_eq!(bounds.center().y(), 70.0);
    /// ```
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new_from_top_left(Point::new(x, y), Size::new(width, height))
    }

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
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
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
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the area of the bounds
    pub fn area(self) -> f32 {
        self.width() * self.height()
    }

    /// Returns the length of the shorter side
    pub fn short_side(self) -> f32 {
        self.width().min(self.height())
    }

    /// Converts bounds to a Size object
    pub fn to_size(self) -> Size {
        Size {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Shrinks the bounds by the given insets.
    ///
    /// Sides never cross: an inset larger than the available extent collapses
    /// that axis onto its midline.
    ///
    /// # Examples
    ///
    /// ```
    /// # use trellis_core::geometry::{Bounds, Insets};
    /// let framed = Bounds::new(0.0, 0.0, 100.0, 50.0).shrink(Insets::uniform(5.0));
    /// assert_eq!(framed.min_x(), 5.0);
    /// assert_eq!(framed.width(), 90.0);
    /// assert_eq!(framed.height(), 40.0);
    /// ```
    pub fn shrink(&self, insets: Insets) -> Self {
        let mut min_x = self.min_x + insets.left();
        let mut max_x = self.max_x - insets.right();
        if min_x > max_x {
            let mid = (self.min_x + self.max_x) / 2.0;
            min_x = mid;
            max_x = mid;
        }
        let mut min_y = self.min_y + insets.top();
        let mut max_y = self.max_y - insets.bottom();
        if min_y > max_y {
            let mid = (self.min_y + self.max_y) / 2.0;
            min_y = mid;
            max_y = mid;
        }
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Clamps the center of an element of `size` so the element stays inside.
    ///
    /// Returns the clamped point together with flags telling which axes were
    /// clamped. An element larger than the bounds is centered on that axis.
    pub fn clamp_center(self, center: Point, size: Size) -> (Point, bool, bool) {
        let x = clamp_axis(center.x, self.min_x, self.max_x, size.width / 2.0);
        let y = clamp_axis(center.y, self.min_y, self.max_y, size.height / 2.0);
        (Point::new(x, y), x != center.x, y != center.y)
    }
}

/// Clamps `value` into `[min + half, max - half]`, centering when the range is empty.
fn clamp_axis(value: f32, min: f32, max: f32, half: f32) -> f32 {
    let low = min + half;
    let high = max - half;
    if low > high {
        (min + max) / 2.0
    } else {
        value.clamp(low, high)
    }
}

/// Spacing on each side of a rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Insets {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
}

impl Insets {
    /// Creates new insets with specified values for each side
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Creates uniform insets with the same value for all sides
    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Returns the top inset value
    pub fn top(self) -> f32 {
        self.top
    }

    /// Returns the right inset value
    pub fn right(self) -> f32 {
        self.right
    }

    /// Returns the bottom inset value
    pub fn bottom(self) -> f32 {
        self.bottom
    }

    /// Returns the left inset value
    pub fn left(self) -> f32 {
        self.left
    }
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn bounds_strategy() -> impl Strategy<Value = Bounds> {
        (
            -1000.0f32..1000.0,
            -1000.0f32..1000.0,
            1.0f32..500.0,
            1.0f32..500.0,
        )
            .prop_map(|(x, y, w, h)| Bounds::new(x, y, w, h))
    }

    fn size_strategy() -> impl Strategy<Value = Size> {
        (0.0f32..1000.0, 0.0f32..1000.0).prop_map(|(w, h)| Size::new(w, h))
    }

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-5000.0f32..5000.0, -5000.0f32..5000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    /// A clamped center always keeps the element inside the bounds.
    fn check_clamp_center_stays_inside(
        bounds: Bounds,
        center: Point,
        size: Size,
    ) -> Result<(), TestCaseError> {
        let (clamped, _, _) = bounds.clamp_center(center, size);

        prop_assert!(
            (bounds.min_x()..=bounds.max_x()).contains(&clamped.x())
                && (bounds.min_y()..=bounds.max_y()).contains(&clamped.y()),
            "{clamped:?} outside {bounds:?}"
        );
        Ok(())
    }

    /// Polar offsets have the requested length.
    fn check_polar_length(radius: f32, angle: f32) -> Result<(), TestCaseError> {
        let offset = Point::from_polar(radius, angle);

        prop_assert!(approx_eq!(f32, offset.hypot(), radius, epsilon = 0.01));
        Ok(())
    }

    /// Shrinking never produces inverted bounds.
    fn check_shrink_never_inverts(bounds: Bounds, inset: f32) -> Result<(), TestCaseError> {
        let shrunk = bounds.shrink(Insets::uniform(inset));

        prop_assert!(shrunk.width() >= 0.0);
        prop_assert!(shrunk.height() >= 0.0);
        Ok(())
    }

    proptest! {
        #[test]
        fn clamp_center_stays_inside(bounds in bounds_strategy(), center in point_strategy(), size in size_strategy()) {
            check_clamp_center_stays_inside(bounds, center, size)?;
        }

        #[test]
        fn polar_length(radius in 0.0f32..1000.0, angle in -10.0f32..10.0) {
            check_polar_length(radius, angle)?;
        }

        #[test]
        fn shrink_never_inverts(bounds in bounds_strategy(), inset in 0.0f32..600.0) {
            check_shrink_never_inverts(bounds, inset)?;
        }
    }
}
