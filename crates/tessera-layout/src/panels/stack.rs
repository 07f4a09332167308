#![forbid(unsafe_code)]

//! Stack: sequential placement along one axis.
//!
//! Children are offered unbounded space along the stacking axis and the
//! panel's extent (minus margins) across it. Each child sits at the running
//! position plus its leading margin; the cross axis is resolved by the
//! child's alignment within the stack's cross extent.

use serde::{Deserialize, Serialize};
use tessera_core::geometry::{Rect, Size, non_negative};

use super::place_axis;
use crate::axis::Orientation;
use crate::node::NodeId;
use crate::tree::LayoutTree;

/// Stack panel settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StackPanel {
    pub orientation: Orientation,
}

impl StackPanel {
    pub const fn new(orientation: Orientation) -> Self {
        Self { orientation }
    }

    pub(crate) fn measure(self, tree: &mut LayoutTree, children: &[NodeId], available: Size) -> Size {
        let o = self.orientation;
        let cross_available = o.cross_of(available);
        let mut main = 0.0f32;
        let mut cross = 0.0f32;
        for &child in children {
            let margin = tree.props_of(child).effective_margin();
            let offered = o.size(
                f32::INFINITY,
                non_negative(cross_available - o.cross().edges(&margin)),
            );
            let desired = tree.measure_node(child, offered);
            main += o.main_of(desired) + o.edges(&margin);
            cross = cross.max(o.cross_of(desired) + o.cross().edges(&margin));
        }
        o.size(main, cross)
    }

    pub(crate) fn arrange(self, tree: &mut LayoutTree, children: &[NodeId], content: Rect) {
        let o = self.orientation;
        let cross_extent = o.cross_of(content.size());
        let mut position = 0.0f32;
        for &child in children {
            let props = tree.props_of(child);
            let margin = props.effective_margin();
            let desired = tree.desired_of(child);

            let main_offset = position + o.leading(&margin);
            let main_size = o.main_of(desired);
            let (cross_offset, cross_size) =
                place_axis(&props, o.cross(), 0.0, cross_extent, o.cross_of(desired));

            let origin = content.origin().offset(o.point(main_offset, cross_offset));
            let size = o.size(main_size, cross_size);
            tree.arrange_node(child, Rect::from_origin_size(origin, size));

            position = main_offset + main_size + o.trailing(&margin);
        }
    }
}
