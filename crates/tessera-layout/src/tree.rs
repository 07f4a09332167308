#![forbid(unsafe_code)]

//! The node arena and its structural and property APIs.
//!
//! # Design
//!
//! Nodes live in a slot vector addressed by generation-checked [`NodeId`]s.
//! Removed slots go onto a free list and their generation is bumped, so
//! stale handles (including stale queue entries) never alias a new node.
//!
//! ```text
//! slots:  [ N0v0 root ][ N1v0 grid ][ N2v1 leaf ][  free  ][ N4v0 leaf ]
//!                                                    ^
//! free_list: [3]  ───────────────────────────────────┘
//! ```
//!
//! Structure edits and typed property setters never lay anything out.
//! They flip dirty flags and enqueue; [`LayoutTree::update_layout`] is the
//! frame boundary.
//!
//! # Reparenting
//!
//! Attaching a node that already has a parent detaches it first. Both the
//! old and the new parent are invalidated, the moved subtree is
//! deregistered from the queues, and every node in it re-enters the
//! all-dirty state.

use smallvec::SmallVec;
use tessera_core::geometry::{Rect, Size, Thickness};

use crate::alignment::Alignment;
use crate::axis::Orientation;
use crate::clip::ClipRegion;
use crate::config::LayoutConfig;
use crate::debug::{LayoutDebugger, TrackSolveRecord};
use crate::error::{LayoutError, Result};
use crate::invalidation::{InvalidationHandle, InvalidationKind, InvalidationQueues};
use crate::node::{
    Affects, CanvasEdges, IndeterminateAxes, LayoutNode, LayoutProps, LeafContent, NodeFlags,
    NodeId, NodeKind, Visibility,
};
use crate::panels::{GridPanel, Panel};
use crate::stats::LayoutStats;
use crate::track::Track;

/// Children list as seen by a strategy.
pub(crate) type ChildList = SmallVec<[NodeId; 8]>;

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<LayoutNode>,
}

/// Equality used to turn same-value writes into no-ops.
trait PropValue: Copy {
    fn same(&self, other: &Self) -> bool;
}

impl PropValue for f32 {
    fn same(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

macro_rules! prop_value_by_eq {
    ($($ty:ty),*) => {
        $(impl PropValue for $ty {
            fn same(&self, other: &Self) -> bool {
                self == other
            }
        })*
    };
}

prop_value_by_eq!(Thickness, Alignment, CanvasEdges, usize);

/// A retained layout tree.
#[derive(Debug)]
pub struct LayoutTree {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    live: usize,
    pub(crate) root: Option<NodeId>,
    pub(crate) viewport: Size,
    pub(crate) queues: InvalidationQueues,
    pub(crate) stats: LayoutStats,
    pub(crate) config: LayoutConfig,
    debugger: LayoutDebugger,
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::new(Size::ZERO)
    }
}

impl LayoutTree {
    /// Create an empty tree laid out into `viewport`.
    pub fn new(viewport: Size) -> Self {
        Self::with_config(viewport, LayoutConfig::default())
    }

    /// Create an empty tree with explicit configuration.
    pub fn with_config(viewport: Size, config: LayoutConfig) -> Self {
        let mut debugger = LayoutDebugger::new();
        debugger.set_enabled(config.record_solves);
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
            root: None,
            viewport: viewport.non_negative(),
            queues: InvalidationQueues::new(),
            stats: LayoutStats::default(),
            config,
            debugger,
        }
    }

    /// Create an empty tree configured from the environment.
    pub fn from_env(viewport: Size) -> Self {
        Self::with_config(viewport, LayoutConfig::from_env())
    }

    // ── Arena ───────────────────────────────────────────────────────

    pub(crate) fn get(&self, id: NodeId) -> Option<&LayoutNode> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut LayoutNode> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    fn node(&self, id: NodeId) -> Result<&LayoutNode> {
        self.get(id).ok_or(LayoutError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut LayoutNode> {
        self.get_mut(id).ok_or(LayoutError::UnknownNode(id))
    }

    fn insert(&mut self, node: LayoutNode) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId::new(index, 0)
        }
    }

    /// Returns true if `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    // ── Creation ────────────────────────────────────────────────────

    /// Create a detached leaf.
    pub fn create_leaf(&mut self, content: LeafContent, props: LayoutProps) -> NodeId {
        self.insert(LayoutNode::new(NodeKind::Leaf(content), props))
    }

    /// Create a detached single-child content host.
    pub fn create_content_host(&mut self, props: LayoutProps) -> NodeId {
        self.insert(LayoutNode::new(NodeKind::ContentHost, props))
    }

    /// Create a detached panel.
    pub fn create_panel(&mut self, panel: Panel, props: LayoutProps) -> NodeId {
        self.insert(LayoutNode::new(NodeKind::Panel(panel), props))
    }

    // ── Structure ───────────────────────────────────────────────────

    /// The node laid out into the viewport.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Make `id` the root, detaching it from any parent.
    pub fn set_root(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        if self.root == Some(id) {
            return Ok(());
        }
        if self.get(id).and_then(|n| n.parent).is_some() {
            self.detach(id)?;
        }
        if let Some(old) = self.root {
            self.queues.remove(old);
        }
        self.root = Some(id);
        self.reset_subtree(id);
        self.mark_measure_dirty(id);
        Ok(())
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Resize the viewport; the root is re-measured on change.
    pub fn set_viewport(&mut self, viewport: Size) {
        let viewport = viewport.non_negative();
        if viewport.same_as(&self.viewport) {
            return;
        }
        self.viewport = viewport;
        if let Some(root) = self.root {
            self.mark_measure_dirty(root);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Children in order, including collapsed ones. Empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Returns true if `ancestor` is `id` or lies on its parent chain.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.node(parent)?.children.len();
        self.insert_child(parent, index, child)
    }

    /// Insert `child` at `index` (clamped to the child count) under `parent`.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        let parent_node = self.node(parent)?;
        self.node(child)?;
        match parent_node.kind {
            NodeKind::Leaf(_) => return Err(LayoutError::NotAContainer(parent)),
            NodeKind::ContentHost
                if parent_node.children.iter().any(|&existing| existing != child) =>
            {
                return Err(LayoutError::ContentHostOccupied(parent));
            }
            _ => {}
        }
        if self.is_ancestor(child, parent) {
            return Err(LayoutError::WouldCreateCycle { parent, child });
        }

        if self.parent(child).is_some() {
            self.detach(child)?;
        }
        if self.root == Some(child) {
            tracing::debug!(node = %child, "root attached under a parent; tree has no root");
            self.root = None;
        }

        let parent_node = self.node_mut(parent)?;
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);

        self.reset_subtree(child);
        self.mark_measure_dirty(parent);
        tracing::trace!(%parent, %child, index, "attached");
        Ok(())
    }

    /// Detach `child` from its parent. The subtree stays alive.
    pub fn detach(&mut self, child: NodeId) -> Result<()> {
        let Some(parent) = self.node(child)?.parent else {
            return Ok(());
        };
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.children.retain(|&c| c != child);
        }
        self.node_mut(child)?.parent = None;
        self.reset_subtree(child);
        self.mark_measure_dirty(parent);
        tracing::trace!(%parent, %child, "detached");
        Ok(())
    }

    /// Remove `id` and its whole subtree. Handles into it become stale.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        self.detach(id)?;
        for node in self.subtree(id) {
            self.queues.remove(node);
            if self.root == Some(node) {
                self.root = None;
            }
            let slot = &mut self.slots[node.index() as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free_list.push(node.index());
            self.live -= 1;
        }
        Ok(())
    }

    /// `id` and all descendants, pre-order.
    pub(crate) fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if let Some(n) = self.get(node) {
                out.push(node);
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    /// Deregister a subtree from the queues and return it to all-dirty.
    fn reset_subtree(&mut self, id: NodeId) {
        for node in self.subtree(id) {
            self.queues.remove(node);
            if let Some(n) = self.get_mut(node) {
                n.flags = NodeFlags::all();
            }
        }
    }

    /// Depth below the root, or `None` if `id` is detached or it or an
    /// ancestor is collapsed.
    pub(crate) fn layout_depth(&self, id: NodeId) -> Option<u32> {
        let mut depth = 0;
        let mut current = id;
        loop {
            let node = self.get(current)?;
            if !node.props.participates() {
                return None;
            }
            match node.parent {
                Some(parent) => {
                    current = parent;
                    depth += 1;
                }
                None => return (self.root == Some(current)).then_some(depth),
            }
        }
    }

    /// Participating children of `id`, in order.
    pub(crate) fn layout_children(&self, id: NodeId) -> ChildList {
        let Some(node) = self.get(id) else {
            return ChildList::new();
        };
        node.children
            .iter()
            .copied()
            .filter(|&c| self.get(c).is_some_and(|n| n.props.participates()))
            .collect()
    }

    // ── Results ─────────────────────────────────────────────────────

    /// Margin-exclusive desired size from the last measure.
    pub fn desired_size(&self, id: NodeId) -> Option<Size> {
        self.get(id).map(|n| n.desired_size)
    }

    /// Final rectangle relative to the parent, from the last arrange.
    pub fn final_rect(&self, id: NodeId) -> Option<Rect> {
        self.get(id).and_then(|n| n.final_rect)
    }

    /// Clip state from the last arrange.
    pub fn clip_region(&self, id: NodeId) -> Option<ClipRegion> {
        self.get(id).map(|n| n.clip)
    }

    /// Union of arranged child rectangles, relative to the node.
    pub fn content_extent(&self, id: NodeId) -> Option<Rect> {
        self.get(id).map(|n| n.content_extent)
    }

    pub fn is_measure_valid(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(LayoutNode::is_measure_valid)
    }

    pub fn is_arrange_valid(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(LayoutNode::is_arrange_valid)
    }

    pub fn props(&self, id: NodeId) -> Option<&LayoutProps> {
        self.get(id).map(|n| &n.props)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|n| &n.kind)
    }

    /// Grid data (tracks, cells) of a grid panel.
    pub fn grid(&self, id: NodeId) -> Option<&GridPanel> {
        match self.kind(id)? {
            NodeKind::Panel(Panel::Grid(grid)) => Some(grid),
            _ => None,
        }
    }

    pub(crate) fn props_of(&self, id: NodeId) -> LayoutProps {
        self.get(id).map(|n| n.props).unwrap_or_default()
    }

    pub(crate) fn indeterminate_of(&self, id: NodeId) -> IndeterminateAxes {
        self.get(id).map_or(IndeterminateAxes::empty(), |n| n.indeterminate)
    }

    pub(crate) fn desired_of(&self, id: NodeId) -> Size {
        self.get(id).map_or(Size::ZERO, |n| n.desired_size)
    }

    // ── Engine state ────────────────────────────────────────────────

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Toggle memo bypass at runtime.
    pub fn set_force_full(&mut self, force_full: bool) {
        self.config.force_full = force_full;
    }

    pub fn stats(&self) -> &LayoutStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = LayoutStats::default();
    }

    pub fn debugger(&self) -> &LayoutDebugger {
        &self.debugger
    }

    pub fn debugger_mut(&mut self) -> &mut LayoutDebugger {
        &mut self.debugger
    }

    pub(crate) fn record_solve(&mut self, record: impl FnOnce() -> TrackSolveRecord) {
        if self.debugger.enabled() {
            self.debugger.record(record());
        }
    }

    /// A handle for collaborators that cannot borrow the tree.
    pub fn invalidation_handle(&self) -> InvalidationHandle {
        self.queues.handle()
    }

    /// True if the next [`update_layout`](Self::update_layout) has work.
    pub fn needs_layout(&self) -> bool {
        self.queues.has_pending()
    }

    // ── Invalidation ────────────────────────────────────────────────

    pub(crate) fn mark_measure_dirty(&mut self, id: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.flags.insert(NodeFlags::MEASURE_DIRTY | NodeFlags::ARRANGE_DIRTY);
            self.queues.push(id, InvalidationKind::Measure);
        }
    }

    pub(crate) fn mark_arrange_dirty(&mut self, id: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.flags.insert(NodeFlags::ARRANGE_DIRTY);
            self.queues.push(id, InvalidationKind::Arrange);
        }
    }

    /// Mark `id` for re-measure at the next frame boundary.
    pub fn invalidate_measure(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        self.mark_measure_dirty(id);
        Ok(())
    }

    /// Mark `id` for re-arrange at the next frame boundary.
    pub fn invalidate_arrange(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        self.mark_arrange_dirty(id);
        Ok(())
    }

    fn apply_affects(&mut self, id: NodeId, affects: Affects) {
        if affects.contains(Affects::MEASURE) {
            self.mark_measure_dirty(id);
        }
        if affects.contains(Affects::ARRANGE) {
            self.mark_arrange_dirty(id);
        }
        if let Some(parent) = self.parent(id) {
            if affects.contains(Affects::PARENT_MEASURE) {
                self.mark_measure_dirty(parent);
            }
            if affects.contains(Affects::PARENT_ARRANGE) {
                self.mark_arrange_dirty(parent);
            }
        }
    }

    fn parent_is_grid(&self, id: NodeId) -> bool {
        self.parent(id).and_then(|p| self.grid(p)).is_some()
    }

    pub(crate) fn has_grid_ancestor(&self, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            if self.grid(ancestor).is_some() {
                return true;
            }
            current = self.parent(ancestor);
        }
        false
    }

    // ── Property setters ────────────────────────────────────────────

    fn set_prop<T: PropValue>(
        &mut self,
        id: NodeId,
        affects: Affects,
        field: impl FnOnce(&mut LayoutProps) -> &mut T,
        value: T,
    ) -> Result<()> {
        let slot = field(&mut self.node_mut(id)?.props);
        if slot.same(&value) {
            return Ok(());
        }
        *slot = value;
        self.apply_affects(id, affects);
        Ok(())
    }

    /// Explicit width; `NaN` means auto.
    pub fn set_width(&mut self, id: NodeId, width: f32) -> Result<()> {
        self.set_prop(id, Affects::MEASURE, |p| &mut p.width, width)
    }

    /// Explicit height; `NaN` means auto.
    pub fn set_height(&mut self, id: NodeId, height: f32) -> Result<()> {
        self.set_prop(id, Affects::MEASURE, |p| &mut p.height, height)
    }

    pub fn set_min_width(&mut self, id: NodeId, value: f32) -> Result<()> {
        self.set_prop(id, Affects::MEASURE, |p| &mut p.min_width, value)
    }

    pub fn set_max_width(&mut self, id: NodeId, value: f32) -> Result<()> {
        self.set_prop(id, Affects::MEASURE, |p| &mut p.max_width, value)
    }

    pub fn set_min_height(&mut self, id: NodeId, value: f32) -> Result<()> {
        self.set_prop(id, Affects::MEASURE, |p| &mut p.min_height, value)
    }

    pub fn set_max_height(&mut self, id: NodeId, value: f32) -> Result<()> {
        self.set_prop(id, Affects::MEASURE, |p| &mut p.max_height, value)
    }

    pub fn set_padding(&mut self, id: NodeId, padding: impl Into<Thickness>) -> Result<()> {
        self.set_prop(id, Affects::MEASURE, |p| &mut p.padding, padding.into())
    }

    /// Margins are consumed by the parent.
    pub fn set_margin(&mut self, id: NodeId, margin: impl Into<Thickness>) -> Result<()> {
        self.set_prop(id, Affects::PARENT_MEASURE, |p| &mut p.margin, margin.into())
    }

    pub fn set_horizontal_alignment(&mut self, id: NodeId, alignment: Alignment) -> Result<()> {
        let affects = self.alignment_affects(id);
        self.set_prop(id, affects, |p| &mut p.horizontal_alignment, alignment)
    }

    pub fn set_vertical_alignment(&mut self, id: NodeId, alignment: Alignment) -> Result<()> {
        let affects = self.alignment_affects(id);
        self.set_prop(id, affects, |p| &mut p.vertical_alignment, alignment)
    }

    /// Alignment decides whether a grid child drives auto tracks.
    fn alignment_affects(&self, id: NodeId) -> Affects {
        if self.parent_is_grid(id) {
            Affects::PARENT_ARRANGE | Affects::PARENT_MEASURE
        } else {
            Affects::PARENT_ARRANGE
        }
    }

    /// Entering or leaving `Collapsed` changes the parent's size; toggling
    /// between `Visible` and `Hidden` only re-derives the parent's clip.
    pub fn set_visibility(&mut self, id: NodeId, visibility: Visibility) -> Result<()> {
        let node = self.node_mut(id)?;
        let before = node.props.visibility;
        if before == visibility {
            return Ok(());
        }
        node.props.visibility = visibility;
        let affects = if before.participates() != visibility.participates() {
            Affects::MEASURE | Affects::PARENT_MEASURE
        } else {
            Affects::PARENT_ARRANGE
        };
        if !before.participates() && visibility.participates() {
            self.requeue_dirty(id);
        }
        self.apply_affects(id, affects);
        Ok(())
    }

    /// Re-enqueue the dirty nodes of a subtree rejoining layout.
    ///
    /// Invalidations raised under a collapsed ancestor are dropped at drain
    /// time while their flags stay set; a clean parent would otherwise
    /// answer from cache and never reach them.
    fn requeue_dirty(&mut self, id: NodeId) {
        for node in self.subtree(id) {
            let Some(flags) = self.get(node).map(|n| n.flags) else {
                continue;
            };
            if flags.contains(NodeFlags::MEASURE_DIRTY) {
                self.queues.push(node, InvalidationKind::Measure);
            } else if flags.contains(NodeFlags::ARRANGE_DIRTY) {
                self.queues.push(node, InvalidationKind::Arrange);
            }
        }
    }

    pub fn set_canvas_edges(&mut self, id: NodeId, edges: CanvasEdges) -> Result<()> {
        self.set_prop(id, Affects::PARENT_MEASURE, |p| &mut p.canvas, edges)
    }

    pub fn set_grid_row(&mut self, id: NodeId, row: usize) -> Result<()> {
        self.set_prop(id, Affects::PARENT_MEASURE, |p| &mut p.grid.row, row)
    }

    pub fn set_grid_column(&mut self, id: NodeId, column: usize) -> Result<()> {
        self.set_prop(id, Affects::PARENT_MEASURE, |p| &mut p.grid.column, column)
    }

    /// Replace a leaf's content.
    pub fn set_leaf_content(&mut self, id: NodeId, content: LeafContent) -> Result<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Leaf(slot) => *slot = content,
            _ => {
                return Err(LayoutError::KindMismatch {
                    node: id,
                    expected: "leaf",
                });
            }
        }
        self.apply_affects(id, Affects::MEASURE);
        Ok(())
    }

    /// Stacking or flow direction of a stack or wrap panel.
    pub fn set_orientation(&mut self, id: NodeId, orientation: Orientation) -> Result<()> {
        let current = match &mut self.node_mut(id)?.kind {
            NodeKind::Panel(Panel::Stack(stack)) => &mut stack.orientation,
            NodeKind::Panel(Panel::Wrap(wrap)) => &mut wrap.orientation,
            _ => {
                return Err(LayoutError::KindMismatch {
                    node: id,
                    expected: "stack or wrap panel",
                });
            }
        };
        if *current == orientation {
            return Ok(());
        }
        *current = orientation;
        self.apply_affects(id, Affects::MEASURE);
        Ok(())
    }

    /// Replace a grid's column definitions.
    pub fn set_columns(&mut self, id: NodeId, columns: Vec<Track>) -> Result<()> {
        self.set_tracks(id, Orientation::Horizontal, columns)
    }

    /// Replace a grid's row definitions.
    pub fn set_rows(&mut self, id: NodeId, rows: Vec<Track>) -> Result<()> {
        self.set_tracks(id, Orientation::Vertical, rows)
    }

    fn set_tracks(&mut self, id: NodeId, axis: Orientation, tracks: Vec<Track>) -> Result<()> {
        let changed = match &mut self.node_mut(id)?.kind {
            NodeKind::Panel(Panel::Grid(grid)) => grid.set_tracks(axis, tracks),
            _ => {
                return Err(LayoutError::KindMismatch {
                    node: id,
                    expected: "grid",
                });
            }
        };
        if changed {
            self.apply_affects(id, Affects::MEASURE);
        }
        Ok(())
    }
}
