#![forbid(unsafe_code)]

//! Screen-space snapshot for the renderer and hit testing.
//!
//! Final rectangles are parent-relative. The snapshot walks the arranged
//! tree in paint order (pre-order, children in order), resolves each rect
//! to screen space, and carries the effective clip down: a container's
//! content clip and, under a grid, the per-cell clip of the child's cell.
//! Clips intersect on the way down, so a deeper clip is never larger than
//! any clip above it.

use serde::Serialize;
use tessera_core::geometry::{Point, Rect};

use crate::clip;
use crate::node::NodeId;
use crate::tree::LayoutTree;

/// One arranged node as the renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisualEntry {
    pub node: NodeId,
    /// Final rectangle in viewport coordinates.
    pub screen_rect: Rect,
    /// Scissor rectangle from ancestors, in viewport coordinates.
    pub clip: Option<Rect>,
    /// False if the node or an ancestor is hidden.
    pub visible: bool,
    /// Distance from the root.
    pub depth: u32,
}

impl VisualEntry {
    /// The part of the node that can actually be seen.
    pub fn visible_rect(&self) -> Rect {
        match self.clip {
            Some(clip) => self.screen_rect.intersection(&clip),
            None => self.screen_rect,
        }
    }

    /// Returns true if `point` lands on the drawn part of the node.
    pub fn hit(&self, point: Point) -> bool {
        self.visible
            && self.screen_rect.contains(point)
            && self.clip.is_none_or(|clip| clip.contains(point))
    }
}

struct Frame {
    node: NodeId,
    origin: Point,
    clip: Option<Rect>,
    visible: bool,
    depth: u32,
}

impl LayoutTree {
    /// Lay out if needed, then return the paint-ordered snapshot.
    pub fn visuals(&mut self) -> Vec<VisualEntry> {
        if self.needs_layout() {
            self.update_layout();
        }
        self.collect_visuals()
    }

    /// Snapshot of the current arrangement without running layout.
    ///
    /// Collapsed nodes and nodes that were never arranged are omitted along
    /// with their subtrees.
    pub fn collect_visuals(&self) -> Vec<VisualEntry> {
        let mut out = Vec::with_capacity(self.len());
        let Some(root) = self.root() else {
            return out;
        };
        let mut stack = vec![Frame {
            node: root,
            origin: Point::ORIGIN,
            clip: None,
            visible: true,
            depth: 0,
        }];

        while let Some(frame) = stack.pop() {
            let Some(props) = self.props(frame.node) else {
                continue;
            };
            if !props.participates() {
                continue;
            }
            let Some(rect) = self.final_rect(frame.node) else {
                continue;
            };
            let screen_rect = rect.translate(frame.origin);
            let visible = frame.visible && props.visibility.is_visible();
            out.push(VisualEntry {
                node: frame.node,
                screen_rect,
                clip: frame.clip,
                visible,
                depth: frame.depth,
            });

            let own = self
                .clip_region(frame.node)
                .and_then(|region| region.active())
                .map(|r| r.translate(screen_rect.origin()));
            let inherited = clip::nest(frame.clip, own);
            let grid = self.grid(frame.node);
            let content_origin = screen_rect
                .origin()
                .offset(Point::new(props.effective_padding().left, props.effective_padding().top));

            for &child in self.children(frame.node).iter().rev() {
                let mut child_clip = inherited;
                if let (Some(grid), Some(child_props)) = (grid, self.props(child)) {
                    let (row, column) = grid.resolve_placement(child_props);
                    if let Some(cell) = grid.cell(row, column) {
                        if cell.requires_clip() {
                            let cell_rect = cell.rect().translate(content_origin);
                            child_clip = clip::nest(child_clip, Some(cell_rect));
                        }
                    }
                }
                stack.push(Frame {
                    node: child,
                    origin: screen_rect.origin(),
                    clip: child_clip,
                    visible,
                    depth: frame.depth + 1,
                });
            }
        }
        out
    }

    /// Topmost visible node under `point`, laying out first if needed.
    pub fn hit_test(&mut self, point: Point) -> Option<NodeId> {
        self.visuals()
            .iter()
            .rev()
            .find(|entry| entry.hit(point))
            .map(|entry| entry.node)
    }

    /// Screen rectangle of `id`, resolved through its ancestors.
    pub fn screen_rect(&self, id: NodeId) -> Option<Rect> {
        let mut rect = self.final_rect(id)?;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            rect = rect.translate(self.final_rect(parent)?.origin());
            current = self.parent(parent);
        }
        Some(rect)
    }
}
