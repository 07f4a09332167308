#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! All values are logical units (`f32`). Device-pixel conversion happens
//! outside this crate as a pure scalar transform.

use serde::{Deserialize, Serialize};

/// Clamp a single extent so it is never negative.
///
/// `NaN` and infinities pass through untouched: `NaN` is the "auto" sentinel
/// and `+inf` means "unconstrained".
#[inline]
pub fn non_negative(value: f32) -> f32 {
    if value < 0.0 { 0.0 } else { value }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    /// Zero area.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Unconstrained on both axes.
    pub const INFINITY: Self = Self::new(f32::INFINITY, f32::INFINITY);

    /// Create a new size.
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Replace negative components with zero, keeping `NaN` and infinities.
    #[inline]
    pub fn non_negative(self) -> Self {
        Self::new(non_negative(self.width), non_negative(self.height))
    }

    /// Replace `NaN` components with zero.
    #[inline]
    pub fn or_zero(self) -> Self {
        Self::new(
            if self.width.is_nan() { 0.0 } else { self.width },
            if self.height.is_nan() { 0.0 } else { self.height },
        )
    }

    /// Shrink by a thickness, flooring each axis at zero.
    #[inline]
    pub fn deflate(self, t: Thickness) -> Self {
        Self::new(
            non_negative(self.width - t.horizontal_sum()),
            non_negative(self.height - t.vertical_sum()),
        )
    }

    /// Grow by a thickness.
    #[inline]
    pub fn inflate(self, t: Thickness) -> Self {
        Self::new(self.width + t.horizontal_sum(), self.height + t.vertical_sum())
    }

    /// Component-wise maximum. `NaN` components lose to numbers.
    #[inline]
    pub fn max(self, other: Size) -> Self {
        Self::new(self.width.max(other.width), self.height.max(other.height))
    }

    /// Component-wise minimum. `NaN` components lose to numbers.
    #[inline]
    pub fn min(self, other: Size) -> Self {
        Self::new(self.width.min(other.width), self.height.min(other.height))
    }

    /// Bitwise equality, treating two `NaN` components as equal.
    ///
    /// Used for memoization keys where `NaN` is a legitimate value.
    #[inline]
    pub fn same_as(&self, other: &Size) -> bool {
        self.width.to_bits() == other.width.to_bits()
            && self.height.to_bits() == other.height.to_bits()
    }

    /// Check if either axis has zero (or `NaN`) extent.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// A point in logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// The origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Translate by another point treated as a vector.
    #[inline]
    pub fn offset(self, by: Point) -> Self {
        Self::new(self.x + by.x, self.y + by.y)
    }
}

/// A rectangle for layout bounds, scissor regions, and hit testing.
///
/// Origin at top-left; `x`/`y` grow right/down.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: f32,
    /// Top edge (inclusive).
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Create a rectangle from an origin and a size.
    #[inline]
    pub const fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Left edge (alias for x).
    #[inline]
    pub const fn left(&self) -> f32 {
        self.x
    }

    /// Top edge (alias for y).
    #[inline]
    pub const fn top(&self) -> f32 {
        self.y
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Top-left corner.
    #[inline]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Width and height.
    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Area in square units.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size().is_empty()
    }

    /// Check if a point is inside the rectangle (right/bottom exclusive).
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Check if `other` lies entirely inside this rectangle.
    #[inline]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Move the rectangle by a vector.
    #[inline]
    pub fn translate(&self, by: Point) -> Rect {
        Rect::new(self.x + by.x, self.y + by.y, self.width, self.height)
    }

    /// Compute the intersection with another rectangle.
    ///
    /// Returns an empty rectangle positioned at the clamped origin if the
    /// rectangles don't overlap, so the result is always contained in both
    /// inputs' bounding region and never has negative extent.
    #[inline]
    pub fn intersection(&self, other: &Rect) -> Rect {
        self.intersection_opt(other).unwrap_or_else(|| {
            let x = self.x.max(other.x);
            let y = self.y.max(other.y);
            Rect::new(x, y, 0.0, 0.0)
        })
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    #[inline]
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Create a new rectangle inside the current one with the given thickness.
    pub fn inner(&self, t: Thickness) -> Rect {
        Rect {
            x: self.x + t.left,
            y: self.y + t.top,
            width: non_negative(self.width - t.horizontal_sum()),
            height: non_negative(self.height - t.vertical_sum()),
        }
    }

    /// Create a new rectangle that is the union of this rectangle and another.
    ///
    /// The result is the smallest rectangle that contains both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        Rect {
            x,
            y,
            width: non_negative(right - x),
            height: non_negative(bottom - y),
        }
    }
}

/// Edge thickness for margin and padding, in `(left, top, right, bottom)` order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Thickness {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Thickness {
    /// No thickness.
    pub const ZERO: Self = Self::all(0.0);

    /// Create new thickness with equal values.
    pub const fn all(val: f32) -> Self {
        Self {
            left: val,
            top: val,
            right: val,
            bottom: val,
        }
    }

    /// Left and right only.
    pub const fn horizontal(val: f32) -> Self {
        Self::new(val, 0.0, val, 0.0)
    }

    /// Top and bottom only.
    pub const fn vertical(val: f32) -> Self {
        Self::new(0.0, val, 0.0, val)
    }

    /// Create new thickness with specific values.
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Sum of left and right.
    #[inline]
    pub fn horizontal_sum(&self) -> f32 {
        self.left + self.right
    }

    /// Sum of top and bottom.
    #[inline]
    pub fn vertical_sum(&self) -> f32 {
        self.top + self.bottom
    }

    /// Replace negative or `NaN` edges with zero.
    pub fn sanitized(self) -> Self {
        let fix = |v: f32| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        Self::new(fix(self.left), fix(self.top), fix(self.right), fix(self.bottom))
    }
}

impl From<f32> for Thickness {
    fn from(val: f32) -> Self {
        Self::all(val)
    }
}

impl From<(f32, f32)> for Thickness {
    fn from((horizontal, vertical): (f32, f32)) -> Self {
        Self::new(horizontal, vertical, horizontal, vertical)
    }
}

impl From<(f32, f32, f32, f32)> for Thickness {
    fn from((left, top, right, bottom): (f32, f32, f32, f32)) -> Self {
        Self::new(left, top, right, bottom)
    }
}
