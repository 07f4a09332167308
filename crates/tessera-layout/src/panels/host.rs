//! Single-child content host.

use tessera_core::geometry::{Rect, Size};

use super::place_in_slot;
use crate::node::NodeId;
use crate::tree::LayoutTree;

/// Desired size is the child's desired size plus its margin.
pub(crate) fn measure(tree: &mut LayoutTree, children: &[NodeId], available: Size) -> Size {
    let Some(&child) = children.first() else {
        return Size::ZERO;
    };
    let margin = tree.props_of(child).effective_margin();
    tree.measure_node(child, available.deflate(margin))
        .inflate(margin)
}

/// The child is aligned inside the whole content rectangle.
pub(crate) fn arrange(tree: &mut LayoutTree, children: &[NodeId], content: Rect) {
    let Some(&child) = children.first() else {
        return;
    };
    let props = tree.props_of(child);
    let rect = place_in_slot(&props, tree.desired_of(child), content);
    tree.arrange_node(child, rect);
}
