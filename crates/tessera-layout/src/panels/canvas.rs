#![forbid(unsafe_code)]

//! Canvas: absolute edge offsets.
//!
//! Each child may set any of `left`/`top`/`right`/`bottom`. Per axis:
//!
//! | Edges set        | Position                       | Size                          |
//! |------------------|--------------------------------|-------------------------------|
//! | leading+trailing | `lead + margin`                | `extent − lead − trail − margins` |
//! | leading only     | `lead + margin`                | desired                       |
//! | trailing only    | `extent − trail − margin − d`  | desired                       |
//! | neither          | `margin`                       | desired                       |
//!
//! Desired size is the bounding box of every child's footprint: its size
//! plus margins plus the edge offsets it consumes. A child whose content
//! could not be measured on an axis is left out of that axis.

use tessera_core::geometry::{Rect, Size, non_negative};

use crate::axis::Orientation;
use crate::node::{LayoutProps, NodeId, clamp_between};
use crate::tree::LayoutTree;

const AXES: [Orientation; 2] = [Orientation::Horizontal, Orientation::Vertical];

/// Space offered to a child along one axis: only a child pinned to both
/// edges is constrained.
fn child_available(props: &LayoutProps, orientation: Orientation, available: f32) -> f32 {
    let margin = props.effective_margin();
    match props.canvas.along(orientation) {
        (Some(lead), Some(trail)) if available.is_finite() => {
            non_negative(available - lead - trail - orientation.edges(&margin))
        }
        _ => f32::INFINITY,
    }
}

fn footprint(props: &LayoutProps, orientation: Orientation, desired: f32) -> f32 {
    let margin = props.effective_margin();
    let (lead, trail) = props.canvas.along(orientation);
    lead.unwrap_or(0.0) + trail.unwrap_or(0.0) + orientation.edges(&margin) + desired
}

/// Position and size of a child along one axis of a canvas `extent` long.
pub fn place(props: &LayoutProps, orientation: Orientation, extent: f32, desired: f32) -> (f32, f32) {
    let margin = props.effective_margin();
    let leading = orientation.leading(&margin);
    let trailing = orientation.trailing(&margin);
    match props.canvas.along(orientation) {
        (Some(lead), Some(trail)) => {
            let (lo, hi) = props.bounds(orientation);
            let size = clamp_between(
                non_negative(extent - lead - trail - leading - trailing),
                lo,
                hi,
            );
            (lead + leading, size)
        }
        (Some(lead), None) => (lead + leading, desired),
        (None, Some(trail)) => (extent - trail - trailing - desired, desired),
        (None, None) => (leading, desired),
    }
}

pub(crate) fn measure(tree: &mut LayoutTree, children: &[NodeId], available: Size) -> Size {
    let mut extent = Size::ZERO;
    for &child in children {
        let props = tree.props_of(child);
        let offered = Size::new(
            child_available(&props, Orientation::Horizontal, available.width),
            child_available(&props, Orientation::Vertical, available.height),
        );
        let desired = tree.measure_node(child, offered);
        let indeterminate = tree.indeterminate_of(child);
        for axis in AXES {
            if indeterminate.along(axis) {
                continue;
            }
            let reach = footprint(&props, axis, axis.main_of(desired));
            match axis {
                Orientation::Horizontal => extent.width = extent.width.max(reach),
                Orientation::Vertical => extent.height = extent.height.max(reach),
            }
        }
    }
    extent
}

pub(crate) fn arrange(tree: &mut LayoutTree, children: &[NodeId], content: Rect) {
    for &child in children {
        let props = tree.props_of(child);
        let desired = tree.desired_of(child);
        let (x, width) = place(&props, Orientation::Horizontal, content.width, desired.width);
        let (y, height) = place(&props, Orientation::Vertical, content.height, desired.height);
        tree.arrange_node(child, Rect::new(content.x + x, content.y + y, width, height));
    }
}
