#![forbid(unsafe_code)]

//! Panel arrangement strategies.
//!
//! Each strategy has a sizing half (`measure`) and a placement half
//! (`arrange`). Both receive only the participating children, in child
//! order; collapsed children occupy no slot.
//!
//! Margins belong to the parent: a strategy deflates the available size by
//! a child's margin before measuring it, and adds the margin back into the
//! child's footprint. Child rectangles are written relative to the parent's
//! origin, so the parent's padding offset is already included.

pub mod canvas;
pub mod grid;
pub(crate) mod host;
pub mod stack;
pub mod wrap;

pub use grid::{Cell, CellArena, GridPanel};
pub use stack::StackPanel;
pub use wrap::WrapPanel;

use tessera_core::geometry::{Rect, Size, non_negative};

use crate::axis::Orientation;
use crate::node::{LayoutProps, clamp_between};

/// The composite strategies a panel node can use.
#[derive(Debug, Clone)]
pub enum Panel {
    /// Absolute edge offsets.
    Canvas,
    /// Sequential stacking with cross-axis alignment.
    Stack(StackPanel),
    /// Greedy line-wrapping flow.
    Wrap(WrapPanel),
    /// Fixed/auto/proportional tracks.
    Grid(GridPanel),
}

impl Panel {
    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Panel::Canvas => "canvas",
            Panel::Stack(_) => "stack",
            Panel::Wrap(_) => "wrap",
            Panel::Grid(_) => "grid",
        }
    }
}

/// Place a child along one axis inside a slot that starts at `start` and is
/// `extent` long. Returns `(position, size)`.
///
/// A stretched child fills the slot minus its margins but never shrinks
/// below its desired size; either way the size respects its min/max.
pub(crate) fn place_axis(
    props: &LayoutProps,
    orientation: Orientation,
    start: f32,
    extent: f32,
    desired: f32,
) -> (f32, f32) {
    let margin = props.effective_margin();
    let leading = orientation.leading(&margin);
    let trailing = orientation.trailing(&margin);
    let (lo, hi) = props.bounds(orientation);
    let stretched = clamp_between(
        non_negative(extent - leading - trailing).max(desired),
        lo,
        hi,
    );
    let (offset, size) =
        props
            .alignment(orientation)
            .place(extent, desired, stretched, leading, trailing);
    (start + offset, non_negative(size))
}

/// Place a child inside `slot` on both axes.
pub(crate) fn place_in_slot(props: &LayoutProps, desired: Size, slot: Rect) -> Rect {
    let (x, width) = place_axis(
        props,
        Orientation::Horizontal,
        slot.x,
        slot.width,
        desired.width,
    );
    let (y, height) = place_axis(props, Orientation::Vertical, slot.y, slot.height, desired.height);
    Rect::new(x, y, width, height)
}
