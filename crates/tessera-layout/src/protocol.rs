#![forbid(unsafe_code)]

//! The two-pass measure/arrange protocol and the frame-boundary drain.
//!
//! # State machine
//!
//! ```text
//!   Unmeasured ──measure──▶ MeasureValid ──arrange──▶ Valid
//!       ▲                                              │
//!       └──────── affects-measure invalidation ────────┤
//!                 MeasureValid ◀── affects-arrange ────┘
//! ```
//!
//! `measure` is memoized on the available size: a measure-valid node asked
//! again with a bit-identical available size returns its cached desired
//! size without running the core routine. `arrange` is memoized on the
//! final rectangle the same way.
//!
//! # Frame boundary
//!
//! [`LayoutTree::update_layout`] drains the measure queue shallowest-first.
//! A queued node is re-measured with the constraint its parent last gave
//! it; if its desired size changes, the parent is re-measured in turn. A
//! node that was never measured defers to its parent, and so does every
//! node inside a grid cell: the grid re-measures its cells at arrange time,
//! so only the grid's own measure reproduces the sizes its tracks came
//! from. Then the arrange queue is drained the same way, so arrange-only
//! updates skip measurement.
//!
//! # Failure Modes
//!
//! None. Negative extents clamp to zero, `NaN` available extents are
//! unconstrained, non-finite desired sizes resolve to zero.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tessera_core::geometry::{Rect, Size, non_negative};

use crate::clip;
use crate::error::{LayoutError, Result};
use crate::invalidation::InvalidationKind;
use crate::node::{IndeterminateAxes, NodeFlags, NodeId, NodeKind};
use crate::panels::{GridPanel, Panel, StackPanel, WrapPanel, canvas, host};
use crate::tree::LayoutTree;

/// Core routine selected for a node, with panel data lifted out of the
/// arena so the routine can borrow the tree mutably.
enum Strategy {
    /// Leaves are answered on the spot with their natural size.
    Leaf(Size),
    Host,
    Canvas,
    Stack(StackPanel),
    Wrap(WrapPanel),
    Grid(GridPanel),
}

fn sanitize_available(size: Size) -> Size {
    let axis = |v: f32| if v.is_nan() { f32::INFINITY } else { non_negative(v) };
    Size::new(axis(size.width), axis(size.height))
}

fn sanitize_desired(size: Size) -> Size {
    let axis = |v: f32| if v.is_finite() && v > 0.0 { v } else { 0.0 };
    Size::new(axis(size.width), axis(size.height))
}

fn sanitize_rect(rect: Rect) -> Rect {
    let position = |v: f32| if v.is_finite() { v } else { 0.0 };
    let extent = |v: f32| if v.is_finite() && v > 0.0 { v } else { 0.0 };
    Rect::new(
        position(rect.x),
        position(rect.y),
        extent(rect.width),
        extent(rect.height),
    )
}

type DepthHeap = BinaryHeap<Reverse<(u32, NodeId)>>;

impl LayoutTree {
    // ── Public protocol ─────────────────────────────────────────────

    /// Measure `id` against `available` and return its desired size.
    pub fn measure(&mut self, id: NodeId, available: Size) -> Result<Size> {
        if !self.contains(id) {
            return Err(LayoutError::UnknownNode(id));
        }
        Ok(self.measure_node(id, available))
    }

    /// Arrange `id` into `rect` (relative to its parent).
    pub fn arrange(&mut self, id: NodeId, rect: Rect) -> Result<()> {
        if !self.contains(id) {
            return Err(LayoutError::UnknownNode(id));
        }
        self.arrange_node(id, rect);
        Ok(())
    }

    // ── Measure ─────────────────────────────────────────────────────

    pub(crate) fn measure_node(&mut self, id: NodeId, available: Size) -> Size {
        let Some(node) = self.get(id) else {
            return Size::ZERO;
        };
        if !node.props.participates() {
            return Size::ZERO;
        }
        let available = sanitize_available(available);
        let props = node.props;
        let cached = !self.config.force_full
            && node.is_measure_valid()
            && node
                .measure_constraint
                .is_some_and(|previous| previous.same_as(&available));
        let previous_desired = node.desired_size;

        self.stats.measure_calls += 1;
        if cached {
            return previous_desired;
        }
        self.stats.measure_computations += 1;

        let padding = props.effective_padding();
        let inner = props.clamp_size(available).deflate(padding);
        let content = self.measure_core(id, inner).inflate(padding);
        let indeterminate = IndeterminateAxes::of(content, &props);
        let desired = sanitize_desired(props.clamp_size(content));

        if let Some(node) = self.get_mut(id) {
            node.desired_size = desired;
            node.indeterminate = indeterminate;
            node.measure_constraint = Some(available);
            node.flags.remove(NodeFlags::MEASURE_DIRTY);
            node.flags.insert(NodeFlags::ARRANGE_DIRTY);
        }
        self.queues.push(id, InvalidationKind::Arrange);
        tracing::trace!(
            node = %id,
            width = desired.width,
            height = desired.height,
            "measured"
        );
        desired
    }

    /// Lift the node's strategy out of the arena.
    ///
    /// Leaves measure their content against `leaf_available` here; a grid's
    /// panel data must be handed back with [`Self::restore_grid`].
    fn take_strategy(&mut self, id: NodeId, leaf_available: Size) -> Option<Strategy> {
        let node = self.get_mut(id)?;
        Some(match &mut node.kind {
            NodeKind::Leaf(content) => Strategy::Leaf(content.natural_size(leaf_available)),
            NodeKind::ContentHost => Strategy::Host,
            NodeKind::Panel(Panel::Canvas) => Strategy::Canvas,
            NodeKind::Panel(Panel::Stack(stack)) => Strategy::Stack(*stack),
            NodeKind::Panel(Panel::Wrap(wrap)) => Strategy::Wrap(*wrap),
            NodeKind::Panel(Panel::Grid(grid)) => Strategy::Grid(std::mem::take(grid)),
        })
    }

    fn restore_grid(&mut self, id: NodeId, grid: GridPanel) {
        if let Some(node) = self.get_mut(id) {
            if let NodeKind::Panel(Panel::Grid(slot)) = &mut node.kind {
                *slot = grid;
            }
        }
    }

    fn measure_core(&mut self, id: NodeId, available: Size) -> Size {
        let Some(strategy) = self.take_strategy(id, available) else {
            return Size::ZERO;
        };
        let children = self.layout_children(id);
        match strategy {
            Strategy::Leaf(natural) => natural,
            Strategy::Host => host::measure(self, &children, available),
            Strategy::Canvas => canvas::measure(self, &children, available),
            Strategy::Stack(stack) => stack.measure(self, &children, available),
            Strategy::Wrap(wrap) => wrap.measure(self, &children, available),
            Strategy::Grid(mut grid) => {
                let size = grid.measure(self, id, &children, available);
                self.restore_grid(id, grid);
                size
            }
        }
    }

    // ── Arrange ─────────────────────────────────────────────────────

    pub(crate) fn arrange_node(&mut self, id: NodeId, rect: Rect) {
        let Some(node) = self.get(id) else {
            return;
        };
        if !node.props.participates() {
            return;
        }
        let rect = sanitize_rect(rect);
        let remeasure = (!node.is_measure_valid())
            .then(|| node.measure_constraint.unwrap_or(rect.size()));
        self.stats.arrange_calls += 1;

        if let Some(constraint) = remeasure {
            self.measure_node(id, constraint);
        }

        let Some(node) = self.get(id) else {
            return;
        };
        let cached =
            !self.config.force_full && node.is_arrange_valid() && node.final_rect == Some(rect);
        let padding = node.props.effective_padding();
        if cached {
            return;
        }
        self.stats.arrange_computations += 1;

        let content = Rect::from_size(rect.size()).inner(padding);
        if let Some(node) = self.get_mut(id) {
            node.final_rect = Some(rect);
        }
        self.arrange_core(id, content);

        let children = self.layout_children(id);
        let mut extent: Option<Rect> = None;
        let mut visible = Vec::with_capacity(children.len());
        for &child in &children {
            let Some(child_node) = self.get(child) else {
                continue;
            };
            let Some(child_rect) = child_node.final_rect else {
                continue;
            };
            extent = Some(extent.map_or(child_rect, |e| e.union(&child_rect)));
            if child_node.props.visibility.is_visible() {
                visible.push(child_rect);
            }
        }
        let region = clip::compute(content, visible);
        if region.requires_clip {
            tracing::trace!(node = %id, "children overflow content; clip required");
        }

        if let Some(node) = self.get_mut(id) {
            node.content_extent = extent.unwrap_or_default();
            node.clip = region;
            node.flags.remove(NodeFlags::ARRANGE_DIRTY);
        }
    }

    fn arrange_core(&mut self, id: NodeId, content: Rect) {
        if matches!(self.kind(id), None | Some(NodeKind::Leaf(_))) {
            return;
        }
        let Some(strategy) = self.take_strategy(id, content.size()) else {
            return;
        };
        let children = self.layout_children(id);
        match strategy {
            Strategy::Leaf(_) => {}
            Strategy::Host => host::arrange(self, &children, content),
            Strategy::Canvas => canvas::arrange(self, &children, content),
            Strategy::Stack(stack) => stack.arrange(self, &children, content),
            Strategy::Wrap(wrap) => wrap.arrange(self, &children, content),
            Strategy::Grid(mut grid) => {
                grid.arrange(self, id, &children, content);
                self.restore_grid(id, grid);
            }
        }
    }

    // ── Frame boundary ──────────────────────────────────────────────

    /// Process every pending invalidation: external requests, then the
    /// measure queue, then the arrange queue.
    ///
    /// Invalidations raised while this runs are held for the next call.
    pub fn update_layout(&mut self) {
        let _span = tracing::info_span!(
            "layout_update",
            measure_queued = self.queues.measure_len(),
            arrange_queued = self.queues.arrange_len()
        )
        .entered();

        for (id, kind) in self.queues.take_external() {
            match kind {
                InvalidationKind::Measure => self.mark_measure_dirty(id),
                InvalidationKind::Arrange => self.mark_arrange_dirty(id),
            }
        }
        if self.config.force_full {
            if let Some(root) = self.root {
                self.mark_measure_dirty(root);
            }
        }

        self.queues.begin_pass();
        self.drain_measure();
        self.drain_arrange();
        let deferred = self.queues.end_pass();

        self.stats.deferred_invalidations += deferred;
        self.stats.passes += 1;
        tracing::debug!(
            measure_computations = self.stats.measure_computations,
            arrange_computations = self.stats.arrange_computations,
            deferred,
            "layout pass complete"
        );
    }

    fn root_slot(&self, root: NodeId) -> Rect {
        let margin = self.props_of(root).effective_margin();
        Rect::from_size(sanitize_available(self.viewport)).inner(margin)
    }

    fn depth_heap(&self, queued: Vec<NodeId>) -> DepthHeap {
        let mut heap = BinaryHeap::with_capacity(queued.len());
        for id in queued {
            match self.layout_depth(id) {
                Some(depth) => heap.push(Reverse((depth, id))),
                None => tracing::trace!(node = %id, "skipping node outside the laid-out tree"),
            }
        }
        heap
    }

    /// Flag `parent` dirty for `flag` and schedule it on `heap`.
    fn escalate(&mut self, heap: &mut DepthHeap, depth: u32, parent: NodeId, flag: NodeFlags) {
        if let Some(node) = self.get_mut(parent) {
            node.flags.insert(flag | NodeFlags::ARRANGE_DIRTY);
            heap.push(Reverse((depth.saturating_sub(1), parent)));
        }
    }

    fn drain_measure(&mut self) {
        let queued = self.queues.take_measure();
        let mut heap = self.depth_heap(queued);
        while let Some(Reverse((depth, id))) = heap.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            if node.is_measure_valid() {
                continue;
            }
            let (parent, constraint, before) = (node.parent, node.measure_constraint, node.desired_size);
            self.stats.measure_drained += 1;

            if self.root == Some(id) {
                let slot = self.root_slot(id);
                self.measure_node(id, slot.size());
                continue;
            }
            let Some(parent) = parent else {
                continue;
            };
            // A grid re-measures its cells' subtrees at arrange time, so the
            // stored constraint is not the one its tracks were sized from.
            if self.has_grid_ancestor(id) {
                tracing::trace!(node = %id, %parent, "inside a grid cell; re-measuring parent");
                self.escalate(&mut heap, depth, parent, NodeFlags::MEASURE_DIRTY);
                continue;
            }
            match constraint {
                Some(constraint) => {
                    let after = self.measure_node(id, constraint);
                    if !after.same_as(&before) {
                        tracing::trace!(node = %id, %parent, "desired size changed; re-measuring parent");
                        self.escalate(&mut heap, depth, parent, NodeFlags::MEASURE_DIRTY);
                    }
                }
                None => self.escalate(&mut heap, depth, parent, NodeFlags::MEASURE_DIRTY),
            }
        }
    }

    fn drain_arrange(&mut self) {
        loop {
            let queued = self.queues.take_arrange();
            if queued.is_empty() {
                break;
            }
            let mut heap = self.depth_heap(queued);
            while let Some(Reverse((depth, id))) = heap.pop() {
                let Some(node) = self.get(id) else {
                    continue;
                };
                if node.is_arrange_valid() {
                    continue;
                }
                let (rect, parent) = (node.final_rect, node.parent);
                self.stats.arrange_drained += 1;

                if self.root == Some(id) {
                    let slot = self.root_slot(id);
                    self.arrange_node(id, slot);
                    continue;
                }
                match (rect, parent) {
                    (Some(rect), _) => self.arrange_node(id, rect),
                    (None, Some(parent)) => {
                        self.escalate(&mut heap, depth, parent, NodeFlags::ARRANGE_DIRTY);
                    }
                    (None, None) => {}
                }
            }
        }
    }
}
