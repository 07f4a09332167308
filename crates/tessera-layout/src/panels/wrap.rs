#![forbid(unsafe_code)]

//! Wrap: greedy line-wrapping flow.
//!
//! Children are laid out along the orientation axis; a line closes when the
//! next child's margin-inclusive footprint would push it past the extent.
//! A line always holds at least one child, so an oversized child gets a line
//! of its own. Line thickness is the largest member footprint across the
//! axis; members are aligned inside that thickness.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tessera_core::geometry::{Rect, Size};

use super::place_axis;
use crate::axis::Orientation;
use crate::node::NodeId;
use crate::tree::LayoutTree;

/// Slack for float noise when a line is filled exactly.
const LINE_EPSILON: f32 = 1e-4;

/// Wrap panel settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapPanel {
    pub orientation: Orientation,
}

impl Default for WrapPanel {
    fn default() -> Self {
        Self {
            orientation: Orientation::Horizontal,
        }
    }
}

/// Partition footprints into lines no longer than `extent`.
///
/// Returns contiguous, non-empty, in-order index ranges covering every
/// footprint exactly once. A non-finite extent yields a single line.
pub fn partition_lines(footprints: &[f32], extent: f32) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut length = 0.0f32;
    for (i, &footprint) in footprints.iter().enumerate() {
        if i > start && length + footprint > extent + LINE_EPSILON {
            lines.push(start..i);
            start = i;
            length = 0.0;
        }
        length += footprint;
    }
    if start < footprints.len() {
        lines.push(start..footprints.len());
    }
    lines
}

struct Footprints {
    main: SmallVec<[f32; 16]>,
    cross: SmallVec<[f32; 16]>,
}

impl WrapPanel {
    pub const fn new(orientation: Orientation) -> Self {
        Self { orientation }
    }

    fn footprints(self, tree: &LayoutTree, children: &[NodeId]) -> Footprints {
        let o = self.orientation;
        let mut main = SmallVec::with_capacity(children.len());
        let mut cross = SmallVec::with_capacity(children.len());
        for &child in children {
            let margin = tree.props_of(child).effective_margin();
            let desired = tree.desired_of(child);
            main.push(o.main_of(desired) + o.edges(&margin));
            cross.push(o.cross_of(desired) + o.cross().edges(&margin));
        }
        Footprints { main, cross }
    }

    pub(crate) fn measure(self, tree: &mut LayoutTree, children: &[NodeId], available: Size) -> Size {
        for &child in children {
            let margin = tree.props_of(child).effective_margin();
            tree.measure_node(child, available.deflate(margin));
        }

        let o = self.orientation;
        let fp = self.footprints(tree, children);
        let mut longest = 0.0f32;
        let mut thickness = 0.0f32;
        for line in partition_lines(&fp.main, o.main_of(available)) {
            longest = longest.max(fp.main[line.clone()].iter().sum::<f32>());
            thickness += fp.cross[line].iter().copied().fold(0.0, f32::max);
        }
        o.size(longest, thickness)
    }

    pub(crate) fn arrange(self, tree: &mut LayoutTree, children: &[NodeId], content: Rect) {
        let o = self.orientation;
        let fp = self.footprints(tree, children);
        let mut line_start = 0.0f32;
        for line in partition_lines(&fp.main, o.main_of(content.size())) {
            let thickness = fp.cross[line.clone()].iter().copied().fold(0.0, f32::max);
            let mut position = 0.0f32;
            for index in line {
                let child = children[index];
                let props = tree.props_of(child);
                let margin = props.effective_margin();
                let desired = tree.desired_of(child);

                let main_offset = position + o.leading(&margin);
                let main_size = o.main_of(desired);
                let (cross_offset, cross_size) =
                    place_axis(&props, o.cross(), line_start, thickness, o.cross_of(desired));

                let origin = content.origin().offset(o.point(main_offset, cross_offset));
                tree.arrange_node(child, Rect::from_origin_size(origin, o.size(main_size, cross_size)));

                position += fp.main[index];
            }
            line_start += thickness;
        }
    }
}
