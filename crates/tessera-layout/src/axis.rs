//! Axis helpers shared by the sequential, flow, and grid strategies.

use serde::{Deserialize, Serialize};
use tessera_core::geometry::{Point, Size, Thickness};

/// The direction children are laid out in.
///
/// Horizontal lays out left to right (cross axis top to bottom); vertical
/// lays out top to bottom (cross axis left to right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Left to right.
    Horizontal,
    /// Top to bottom.
    #[default]
    Vertical,
}

impl Orientation {
    /// Returns the opposite axis.
    #[inline]
    pub fn cross(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }

    /// Returns true if this is the horizontal axis.
    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Orientation::Horizontal)
    }

    /// Extent of `size` along this axis.
    #[inline]
    pub fn main_of(self, size: Size) -> f32 {
        match self {
            Orientation::Horizontal => size.width,
            Orientation::Vertical => size.height,
        }
    }

    /// Extent of `size` across this axis.
    #[inline]
    pub fn cross_of(self, size: Size) -> f32 {
        self.cross().main_of(size)
    }

    /// Build a size from main/cross extents.
    #[inline]
    pub fn size(self, main: f32, cross: f32) -> Size {
        match self {
            Orientation::Horizontal => Size::new(main, cross),
            Orientation::Vertical => Size::new(cross, main),
        }
    }

    /// Build a point from main/cross coordinates.
    #[inline]
    pub fn point(self, main: f32, cross: f32) -> Point {
        match self {
            Orientation::Horizontal => Point::new(main, cross),
            Orientation::Vertical => Point::new(cross, main),
        }
    }

    /// Leading edge (left or top) of a thickness along this axis.
    #[inline]
    pub fn leading(self, t: &Thickness) -> f32 {
        match self {
            Orientation::Horizontal => t.left,
            Orientation::Vertical => t.top,
        }
    }

    /// Trailing edge (right or bottom) of a thickness along this axis.
    #[inline]
    pub fn trailing(self, t: &Thickness) -> f32 {
        match self {
            Orientation::Horizontal => t.right,
            Orientation::Vertical => t.bottom,
        }
    }

    /// Leading plus trailing edge along this axis.
    #[inline]
    pub fn edges(self, t: &Thickness) -> f32 {
        self.leading(t) + self.trailing(t)
    }
}
