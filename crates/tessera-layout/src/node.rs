#![forbid(unsafe_code)]

//! Layout nodes: identity, per-node properties, cached results.
//!
//! A node is a tagged variant ([`NodeKind`]) rather than a class hierarchy.
//! Every node carries the same [`LayoutProps`] block; panel-specific data
//! lives inside [`Panel`].

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tessera_core::geometry::{Rect, Size, Thickness};

use crate::alignment::Alignment;
use crate::axis::Orientation;
use crate::clip::ClipRegion;
use crate::panels::Panel;

// ============================================================================
// NodeId
// ============================================================================

/// Generation-checked handle into a [`LayoutTree`](crate::LayoutTree).
///
/// Slots are recycled; a handle whose generation no longer matches its slot
/// is stale and every lookup through it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index.
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at the time the handle was issued.
    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}v{}", self.index, self.generation)
    }
}

// ============================================================================
// Flags
// ============================================================================

bitflags! {
    /// Validity state of a node.
    ///
    /// A freshly created node has both bits set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Desired size is stale.
        const MEASURE_DIRTY = 1 << 0;
        /// Final rectangle (and clip) are stale.
        const ARRANGE_DIRTY = 1 << 1;
    }
}

bitflags! {
    /// Which invalidation hooks a property change fires.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Affects: u8 {
        /// The node's own desired size.
        const MEASURE = 1 << 0;
        /// The node's own placement of its children.
        const ARRANGE = 1 << 1;
        /// The parent's desired size (e.g. margins, attached grid indices).
        const PARENT_MEASURE = 1 << 2;
        /// The parent's placement of this node (e.g. alignment).
        const PARENT_ARRANGE = 1 << 3;
    }
}

bitflags! {
    /// Axes on which the last measure produced no usable size: the content
    /// reported `NaN` and no explicit size pinned the axis.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IndeterminateAxes: u8 {
        const WIDTH = 1 << 0;
        const HEIGHT = 1 << 1;
    }
}

impl IndeterminateAxes {
    pub(crate) fn of(content: Size, props: &LayoutProps) -> Self {
        let mut axes = Self::empty();
        for (orientation, flag) in [
            (Orientation::Horizontal, Self::WIDTH),
            (Orientation::Vertical, Self::HEIGHT),
        ] {
            let (lo, hi) = props.bounds(orientation);
            if orientation.main_of(content).is_nan() && lo < hi {
                axes |= flag;
            }
        }
        axes
    }

    /// Returns true if the axis along `orientation` is indeterminate.
    #[inline]
    pub fn along(self, orientation: Orientation) -> bool {
        match orientation {
            Orientation::Horizontal => self.contains(Self::WIDTH),
            Orientation::Vertical => self.contains(Self::HEIGHT),
        }
    }
}

// ============================================================================
// Visibility
// ============================================================================

/// Whether a node is drawn and whether it takes part in layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Visible,
    /// Measured and arranged, but neither drawn nor hit-tested.
    Hidden,
    /// Skipped by measure and arrange; occupies no panel slot.
    Collapsed,
}

impl Visibility {
    /// Returns true unless collapsed.
    #[inline]
    pub fn participates(self) -> bool {
        !matches!(self, Visibility::Collapsed)
    }

    /// Returns true only for [`Visibility::Visible`].
    #[inline]
    pub fn is_visible(self) -> bool {
        matches!(self, Visibility::Visible)
    }
}

// ============================================================================
// Attached properties
// ============================================================================

/// Optional edge offsets consulted by a canvas parent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasEdges {
    pub left: Option<f32>,
    pub top: Option<f32>,
    pub right: Option<f32>,
    pub bottom: Option<f32>,
}

impl CanvasEdges {
    /// Leading/trailing edge pair along `orientation`.
    pub fn along(&self, orientation: Orientation) -> (Option<f32>, Option<f32>) {
        let keep = |v: Option<f32>| v.filter(|v| v.is_finite());
        match orientation {
            Orientation::Horizontal => (keep(self.left), keep(self.right)),
            Orientation::Vertical => (keep(self.top), keep(self.bottom)),
        }
    }
}

/// Row/column a grid parent assigns a child to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPlacement {
    pub row: usize,
    pub column: usize,
}

// ============================================================================
// LayoutProps
// ============================================================================

/// Layout inputs of a node.
///
/// Written by the property system through the typed setters on
/// [`LayoutTree`](crate::LayoutTree); never written by layout itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutProps {
    /// Explicit width; `NaN` means auto.
    pub width: f32,
    /// Explicit height; `NaN` means auto.
    pub height: f32,
    pub min_width: f32,
    pub max_width: f32,
    pub min_height: f32,
    pub max_height: f32,
    pub margin: Thickness,
    pub padding: Thickness,
    pub horizontal_alignment: Alignment,
    pub vertical_alignment: Alignment,
    pub visibility: Visibility,
    pub canvas: CanvasEdges,
    pub grid: GridPlacement,
}

impl Default for LayoutProps {
    fn default() -> Self {
        Self {
            width: f32::NAN,
            height: f32::NAN,
            min_width: 0.0,
            max_width: f32::INFINITY,
            min_height: 0.0,
            max_height: f32::INFINITY,
            margin: Thickness::ZERO,
            padding: Thickness::ZERO,
            horizontal_alignment: Alignment::Stretch,
            vertical_alignment: Alignment::Stretch,
            visibility: Visibility::Visible,
            canvas: CanvasEdges::default(),
            grid: GridPlacement::default(),
        }
    }
}

/// `value.max(lo).min(hi)`: never panics, a `NaN` value resolves to `lo`.
#[inline]
pub(crate) fn clamp_between(value: f32, lo: f32, hi: f32) -> f32 {
    value.max(lo).min(hi)
}

fn axis_bounds(explicit: f32, min: f32, max: f32) -> (f32, f32) {
    let lo = if min.is_finite() && min > 0.0 { min } else { 0.0 };
    let hi = if max.is_nan() { f32::INFINITY } else { max.max(lo) };
    if explicit.is_finite() && explicit >= 0.0 {
        let exact = clamp_between(explicit, lo, hi);
        (exact, exact)
    } else {
        (lo, hi)
    }
}

impl LayoutProps {
    // ── Builders ────────────────────────────────────────────────────

    #[must_use]
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    #[must_use]
    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_min_size(mut self, min_width: f32, min_height: f32) -> Self {
        self.min_width = min_width;
        self.min_height = min_height;
        self
    }

    #[must_use]
    pub fn with_max_size(mut self, max_width: f32, max_height: f32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    #[must_use]
    pub fn with_margin(mut self, margin: impl Into<Thickness>) -> Self {
        self.margin = margin.into();
        self
    }

    #[must_use]
    pub fn with_padding(mut self, padding: impl Into<Thickness>) -> Self {
        self.padding = padding.into();
        self
    }

    #[must_use]
    pub fn with_alignment(mut self, horizontal: Alignment, vertical: Alignment) -> Self {
        self.horizontal_alignment = horizontal;
        self.vertical_alignment = vertical;
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn with_canvas(mut self, edges: CanvasEdges) -> Self {
        self.canvas = edges;
        self
    }

    #[must_use]
    pub fn with_grid(mut self, row: usize, column: usize) -> Self {
        self.grid = GridPlacement { row, column };
        self
    }

    // ── Derived ─────────────────────────────────────────────────────

    /// Collapsed nodes are skipped by measure and arrange.
    #[inline]
    pub fn participates(&self) -> bool {
        self.visibility.participates()
    }

    /// Margin with negative or non-finite edges zeroed.
    #[inline]
    pub fn effective_margin(&self) -> Thickness {
        self.margin.sanitized()
    }

    /// Padding with negative or non-finite edges zeroed.
    #[inline]
    pub fn effective_padding(&self) -> Thickness {
        self.padding.sanitized()
    }

    /// Sanitized `(lo, hi)` size bounds along `orientation`.
    ///
    /// An explicit size collapses the range to a single value (itself
    /// clamped through min/max).
    pub fn bounds(&self, orientation: Orientation) -> (f32, f32) {
        match orientation {
            Orientation::Horizontal => axis_bounds(self.width, self.min_width, self.max_width),
            Orientation::Vertical => axis_bounds(self.height, self.min_height, self.max_height),
        }
    }

    /// Clamp both axes of `size` into the bounds.
    pub fn clamp_size(&self, size: Size) -> Size {
        let (w_lo, w_hi) = self.bounds(Orientation::Horizontal);
        let (h_lo, h_hi) = self.bounds(Orientation::Vertical);
        Size::new(
            clamp_between(size.width, w_lo, w_hi),
            clamp_between(size.height, h_lo, h_hi),
        )
    }

    /// Alignment along `orientation`.
    #[inline]
    pub fn alignment(&self, orientation: Orientation) -> Alignment {
        match orientation {
            Orientation::Horizontal => self.horizontal_alignment,
            Orientation::Vertical => self.vertical_alignment,
        }
    }
}

// ============================================================================
// Node kinds
// ============================================================================

/// Natural-size oracle for leaf content (text, images).
pub trait ContentMeasure {
    /// Natural size of the content given the space available to it.
    fn measure(&self, available: Size) -> Size;
}

impl<F> ContentMeasure for F
where
    F: Fn(Size) -> Size,
{
    fn measure(&self, available: Size) -> Size {
        self(available)
    }
}

/// Intrinsic content of a leaf.
#[derive(Default)]
pub enum LeafContent {
    #[default]
    Empty,
    /// A constant natural size.
    Fixed(Size),
    /// Delegate to an external oracle.
    Measured(Box<dyn ContentMeasure>),
}

impl LeafContent {
    /// Wrap a closure or oracle.
    pub fn measured(oracle: impl ContentMeasure + 'static) -> Self {
        LeafContent::Measured(Box::new(oracle))
    }

    pub(crate) fn natural_size(&self, available: Size) -> Size {
        match self {
            LeafContent::Empty => Size::ZERO,
            LeafContent::Fixed(size) => *size,
            LeafContent::Measured(oracle) => oracle.measure(available),
        }
    }
}

impl fmt::Debug for LeafContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafContent::Empty => f.write_str("Empty"),
            LeafContent::Fixed(size) => f.debug_tuple("Fixed").field(size).finish(),
            LeafContent::Measured(_) => f.write_str("Measured(..)"),
        }
    }
}

/// What a node is.
#[derive(Debug)]
pub enum NodeKind {
    /// No children; sized by its content.
    Leaf(LeafContent),
    /// At most one child, sized to that child plus its margin.
    ContentHost,
    /// Any number of children placed by a strategy.
    Panel(Panel),
}

impl NodeKind {
    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Leaf(_) => "leaf",
            NodeKind::ContentHost => "content host",
            NodeKind::Panel(panel) => panel.name(),
        }
    }

    /// Returns true if children can be attached.
    pub fn is_container(&self) -> bool {
        !matches!(self, NodeKind::Leaf(_))
    }
}

// ============================================================================
// LayoutNode
// ============================================================================

/// Arena entry: inputs, structure, and cached results of one node.
#[derive(Debug)]
pub(crate) struct LayoutNode {
    pub(crate) kind: NodeKind,
    pub(crate) props: LayoutProps,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Margin-exclusive desired size.
    pub(crate) desired_size: Size,
    /// Available size passed to the last computing measure.
    pub(crate) measure_constraint: Option<Size>,
    /// Slot passed to the last computing arrange, relative to the parent.
    pub(crate) final_rect: Option<Rect>,
    /// Union of arranged child rects, relative to this node.
    pub(crate) content_extent: Rect,
    pub(crate) clip: ClipRegion,
    pub(crate) flags: NodeFlags,
    pub(crate) indeterminate: IndeterminateAxes,
}

impl LayoutNode {
    pub(crate) fn new(kind: NodeKind, props: LayoutProps) -> Self {
        Self {
            kind,
            props,
            parent: None,
            children: Vec::new(),
            desired_size: Size::ZERO,
            measure_constraint: None,
            final_rect: None,
            content_extent: Rect::default(),
            clip: ClipRegion::default(),
            flags: NodeFlags::all(),
            indeterminate: IndeterminateAxes::empty(),
        }
    }

    #[inline]
    pub(crate) fn is_measure_valid(&self) -> bool {
        !self.flags.contains(NodeFlags::MEASURE_DIRTY)
    }

    #[inline]
    pub(crate) fn is_arrange_valid(&self) -> bool {
        !self.flags.contains(NodeFlags::ARRANGE_DIRTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_display() {
        assert_eq!(NodeId::new(3, 7).to_string(), "N3v7");
    }

    #[test]
    fn default_props_are_auto() {
        let props = LayoutProps::default();
        assert!(props.width.is_nan());
        assert_eq!(props.bounds(Orientation::Horizontal), (0.0, f32::INFINITY));
        assert!(props.participates());
    }

    #[test]
    fn explicit_size_pins_bounds() {
        let props = LayoutProps::default()
            .with_width(50.0)
            .with_max_size(40.0, f32::INFINITY);
        assert_eq!(props.bounds(Orientation::Horizontal), (40.0, 40.0));
    }

    #[test]
    fn inverted_min_max_resolves_to_min() {
        let props = LayoutProps::default().with_min_size(30.0, 0.0).with_max_size(10.0, f32::NAN);
        assert_eq!(props.bounds(Orientation::Horizontal), (30.0, 30.0));
        assert_eq!(props.bounds(Orientation::Vertical), (0.0, f32::INFINITY));
    }

    #[test]
    fn clamp_size_resolves_nan_to_min() {
        let props = LayoutProps::default().with_min_size(5.0, 0.0);
        let clamped = props.clamp_size(Size::new(f32::NAN, -3.0));
        assert_eq!(clamped, Size::new(5.0, 0.0));
    }

    #[test]
    fn negative_explicit_size_is_auto() {
        let props = LayoutProps::default().with_height(-10.0);
        assert_eq!(props.bounds(Orientation::Vertical), (0.0, f32::INFINITY));
    }

    #[test]
    fn canvas_edges_ignore_non_finite() {
        let edges = CanvasEdges {
            left: Some(f32::NAN),
            right: Some(4.0),
            ..CanvasEdges::default()
        };
        assert_eq!(edges.along(Orientation::Horizontal), (None, Some(4.0)));
        assert_eq!(edges.along(Orientation::Vertical), (None, None));
    }

    #[test]
    fn visibility_states() {
        assert!(Visibility::Hidden.participates());
        assert!(!Visibility::Hidden.is_visible());
        assert!(!Visibility::Collapsed.participates());
    }

    #[test]
    fn closure_is_a_content_oracle() {
        let content = LeafContent::measured(|avail: Size| Size::new(avail.width.min(30.0), 12.0));
        assert_eq!(content.natural_size(Size::new(20.0, 5.0)), Size::new(20.0, 12.0));
        assert_eq!(format!("{content:?}"), "Measured(..)");
    }

    #[test]
    fn nan_content_is_indeterminate_unless_pinned() {
        let free = LayoutProps::default();
        let axes = IndeterminateAxes::of(Size::new(f32::NAN, 10.0), &free);
        assert!(axes.along(Orientation::Horizontal));
        assert!(!axes.along(Orientation::Vertical));

        let pinned = LayoutProps::default().with_width(40.0);
        assert!(IndeterminateAxes::of(Size::new(f32::NAN, 10.0), &pinned).is_empty());
    }

    #[test]
    fn new_node_is_fully_dirty() {
        let node = LayoutNode::new(NodeKind::ContentHost, LayoutProps::default());
        assert!(!node.is_measure_valid());
        assert!(!node.is_arrange_valid());
        assert!(node.kind.is_container());
    }
}
