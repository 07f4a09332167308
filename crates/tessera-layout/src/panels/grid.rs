#![forbid(unsafe_code)]

//! Grid: cell assignment over solved tracks.
//!
//! # Measure
//!
//! Each child is offered the extent of its primary track on each axis
//! (`Fixed` → the fixed size, `Auto` → unbounded, `Proportional` → the
//! grid's own available extent) minus its margin. Stretch children then
//! contribute their margin-inclusive footprint to their track, and both
//! axes are solved in [`SolveMode::Desired`]. The grid's desired size is the
//! sum of the solved tracks.
//!
//! # Arrange
//!
//! Both axes are solved in [`SolveMode::Arrange`] against the content
//! extent, reusing the contributions recorded by the last measure, the cell
//! arena is refilled, and each child is re-measured against
//! its cell before being aligned inside it. A child larger than its cell
//! overflows and marks the cell as requiring a clip.
//!
//! # Out-of-range indices
//!
//! A row or column index past the last track clamps to the last track.
//!
//! # Cell arena
//!
//! Cells live in one `Vec` addressed by `row * columns + column`. The
//! arena grows when the track count grows and is never shrunk; membership
//! is cleared before every reassignment.

use smallvec::SmallVec;
use tessera_core::geometry::{Point, Rect, Size};

use super::place_in_slot;
use crate::axis::Orientation;
use crate::clip;
use crate::debug::TrackSolveRecord;
use crate::node::{LayoutProps, NodeId};
use crate::track::{SolveMode, Track, TrackSize, solve_tracks};
use crate::tree::LayoutTree;

// ============================================================================
// Cell arena
// ============================================================================

/// One row × column intersection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    offset: Point,
    size: Size,
    elements: SmallVec<[NodeId; 2]>,
    requires_clip: bool,
}

impl Cell {
    /// Position relative to the grid's content origin.
    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Children assigned to this cell, in child order.
    pub fn elements(&self) -> &[NodeId] {
        &self.elements
    }

    /// True if an assigned visible child overflows the cell.
    pub fn requires_clip(&self) -> bool {
        self.requires_clip
    }

    /// Cell rectangle relative to the grid's content origin.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.offset, self.size)
    }
}

/// Reusable row-major cell storage.
#[derive(Debug, Clone, Default)]
pub struct CellArena {
    cells: Vec<Cell>,
    rows: usize,
    columns: usize,
}

impl CellArena {
    /// Resize the live region to `rows × columns` and clear all membership.
    fn reset(&mut self, rows: usize, columns: usize) {
        let needed = rows * columns;
        if self.cells.len() < needed {
            self.cells.resize_with(needed, Cell::default);
        }
        for cell in &mut self.cells {
            cell.elements.clear();
            cell.requires_clip = false;
        }
        self.rows = rows;
        self.columns = columns;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Allocated cells, including ones past the live region.
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&Cell> {
        if row < self.rows && column < self.columns {
            self.cells.get(row * self.columns + column)
        } else {
            None
        }
    }

    fn get_mut(&mut self, row: usize, column: usize) -> Option<&mut Cell> {
        if row < self.rows && column < self.columns {
            self.cells.get_mut(row * self.columns + column)
        } else {
            None
        }
    }

    /// Live cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().take(self.rows * self.columns)
    }
}

// ============================================================================
// GridPanel
// ============================================================================

/// Grid panel: declared tracks plus the reusable cell arena.
#[derive(Debug, Clone, Default)]
pub struct GridPanel {
    columns: Vec<Track>,
    rows: Vec<Track>,
    /// Stands in when no column is declared.
    implicit_column: Track,
    /// Stands in when no row is declared.
    implicit_row: Track,
    /// Per-track footprints recorded by the last measure.
    column_contributions: SmallVec<[f32; 8]>,
    row_contributions: SmallVec<[f32; 8]>,
    cells: CellArena,
}

impl GridPanel {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = Track>) -> Self {
        self.columns = columns.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_rows(mut self, rows: impl IntoIterator<Item = Track>) -> Self {
        self.rows = rows.into_iter().collect();
        self
    }

    /// Declared column definitions.
    pub fn column_definitions(&self) -> &[Track] {
        &self.columns
    }

    /// Declared row definitions.
    pub fn row_definitions(&self) -> &[Track] {
        &self.rows
    }

    /// Columns in effect: the declared list, or the single implicit
    /// `Proportional(1)` column.
    pub fn columns(&self) -> &[Track] {
        if self.columns.is_empty() {
            std::slice::from_ref(&self.implicit_column)
        } else {
            self.columns.as_slice()
        }
    }

    /// Rows in effect.
    pub fn rows(&self) -> &[Track] {
        if self.rows.is_empty() {
            std::slice::from_ref(&self.implicit_row)
        } else {
            self.rows.as_slice()
        }
    }

    /// Tracks in effect along `axis` (`Horizontal` → columns).
    pub fn tracks(&self, axis: Orientation) -> &[Track] {
        match axis {
            Orientation::Horizontal => self.columns(),
            Orientation::Vertical => self.rows(),
        }
    }

    fn tracks_mut(&mut self, axis: Orientation) -> &mut [Track] {
        let (declared, implicit) = match axis {
            Orientation::Horizontal => (&mut self.columns, &mut self.implicit_column),
            Orientation::Vertical => (&mut self.rows, &mut self.implicit_row),
        };
        if declared.is_empty() {
            std::slice::from_mut(implicit)
        } else {
            declared.as_mut_slice()
        }
    }

    /// Replace the declared tracks along `axis`. Returns false if the new
    /// definitions equal the old ones.
    pub(crate) fn set_tracks(&mut self, axis: Orientation, tracks: Vec<Track>) -> bool {
        let declared = match axis {
            Orientation::Horizontal => &mut self.columns,
            Orientation::Vertical => &mut self.rows,
        };
        let unchanged = declared.len() == tracks.len()
            && declared.iter().zip(&tracks).all(|(a, b)| a.same_definition(b));
        if unchanged {
            return false;
        }
        *declared = tracks;
        true
    }

    pub fn cells(&self) -> &CellArena {
        &self.cells
    }

    /// Cell at `(row, column)` after the last arrange.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.cells.get(row, column)
    }

    /// `(row, column)` for a child, clamped to the last track.
    pub fn resolve_placement(&self, props: &LayoutProps) -> (usize, usize) {
        let last_row = self.rows().len() - 1;
        let last_column = self.columns().len() - 1;
        (props.grid.row.min(last_row), props.grid.column.min(last_column))
    }

    fn placement_logged(&self, child: NodeId, props: &LayoutProps) -> (usize, usize) {
        let (row, column) = self.resolve_placement(props);
        if row != props.grid.row || column != props.grid.column {
            tracing::debug!(
                node = %child,
                row = props.grid.row,
                column = props.grid.column,
                clamped_row = row,
                clamped_column = column,
                "grid index out of range; clamped to last track"
            );
        }
        (row, column)
    }

    /// Space offered along one axis to a child whose primary track is `track`.
    fn offered(track: &Track, grid_available: f32) -> f32 {
        match track.size_mode() {
            TrackSize::Fixed(px) => track.clamp(if px.is_finite() { px.max(0.0) } else { 0.0 }),
            TrackSize::Auto => f32::INFINITY,
            TrackSize::Proportional(_) => grid_available,
        }
    }

    /// Footprints of stretch children, indexed by track.
    fn contributions(
        &self,
        tree: &LayoutTree,
        children: &[NodeId],
        axis: Orientation,
    ) -> SmallVec<[f32; 8]> {
        let mut out: SmallVec<[f32; 8]> = SmallVec::from_elem(0.0, self.tracks(axis).len());
        for &child in children {
            let props = tree.props_of(child);
            if !props.alignment(axis).is_stretch() {
                continue;
            }
            let (row, column) = self.resolve_placement(&props);
            let index = if axis.is_horizontal() { column } else { row };
            let footprint =
                axis.main_of(tree.desired_of(child)) + axis.edges(&props.effective_margin());
            out[index] = out[index].max(footprint);
        }
        out
    }

    /// Contributions from the last measure. Arrange re-measures children
    /// against their cells, so their current desired sizes may no longer be
    /// the ones the tracks were sized from.
    fn recorded_contributions(
        &self,
        tree: &LayoutTree,
        children: &[NodeId],
        axis: Orientation,
    ) -> SmallVec<[f32; 8]> {
        let recorded = match axis {
            Orientation::Horizontal => &self.column_contributions,
            Orientation::Vertical => &self.row_contributions,
        };
        if recorded.len() == self.tracks(axis).len() {
            recorded.clone()
        } else {
            self.contributions(tree, children, axis)
        }
    }

    fn solve_axis(
        &mut self,
        tree: &mut LayoutTree,
        node: NodeId,
        axis: Orientation,
        available: f32,
        mode: SolveMode,
        contributions: &[f32],
    ) -> f32 {
        let tracks = self.tracks_mut(axis);
        let solution = solve_tracks(tracks, available, mode, contributions);
        let tracks = self.tracks(axis);
        tree.record_solve(|| TrackSolveRecord {
            node,
            axis,
            mode,
            available,
            definitions: tracks.iter().map(Track::size_mode).collect(),
            sizes: tracks.iter().map(Track::measured_size).collect(),
        });
        if mode == SolveMode::Arrange
            && tree.config().warn_on_overflow
            && available.is_finite()
            && solution.total > available + clip::CLIP_EPSILON
        {
            tracing::warn!(
                node = %node,
                ?axis,
                total = solution.total,
                available,
                "grid tracks overflow their extent"
            );
        }
        solution.total
    }

    pub(crate) fn measure(
        &mut self,
        tree: &mut LayoutTree,
        node: NodeId,
        children: &[NodeId],
        available: Size,
    ) -> Size {
        for &child in children {
            let props = tree.props_of(child);
            let (row, column) = self.placement_logged(child, &props);
            let margin = props.effective_margin();
            let offered = Size::new(
                Self::offered(&self.columns()[column], available.width),
                Self::offered(&self.rows()[row], available.height),
            );
            tree.measure_node(child, offered.deflate(margin));
        }

        let column_contrib = self.contributions(tree, children, Orientation::Horizontal);
        let row_contrib = self.contributions(tree, children, Orientation::Vertical);
        self.column_contributions = column_contrib.clone();
        self.row_contributions = row_contrib.clone();
        let width = self.solve_axis(
            tree,
            node,
            Orientation::Horizontal,
            available.width,
            SolveMode::Desired,
            &column_contrib,
        );
        let height = self.solve_axis(
            tree,
            node,
            Orientation::Vertical,
            available.height,
            SolveMode::Desired,
            &row_contrib,
        );
        Size::new(width, height)
    }

    pub(crate) fn arrange(
        &mut self,
        tree: &mut LayoutTree,
        node: NodeId,
        children: &[NodeId],
        content: Rect,
    ) {
        let column_contrib = self.recorded_contributions(tree, children, Orientation::Horizontal);
        let row_contrib = self.recorded_contributions(tree, children, Orientation::Vertical);
        self.solve_axis(
            tree,
            node,
            Orientation::Horizontal,
            content.width,
            SolveMode::Arrange,
            &column_contrib,
        );
        self.solve_axis(
            tree,
            node,
            Orientation::Vertical,
            content.height,
            SolveMode::Arrange,
            &row_contrib,
        );

        let (row_count, column_count) = (self.rows().len(), self.columns().len());
        self.cells.reset(row_count, column_count);
        for r in 0..row_count {
            let row = self.rows()[r];
            for c in 0..column_count {
                let column = self.columns()[c];
                if let Some(cell) = self.cells.get_mut(r, c) {
                    cell.offset = Point::new(column.offset(), row.offset());
                    cell.size = Size::new(column.measured_size(), row.measured_size());
                }
            }
        }

        for &child in children {
            let props = tree.props_of(child);
            let (row, column) = self.placement_logged(child, &props);
            let Some(cell) = self.cells.get_mut(row, column) else {
                continue;
            };
            cell.elements.push(child);
            let slot = cell.rect().translate(content.origin());

            let desired = tree.measure_node(child, slot.size().deflate(props.effective_margin()));
            let rect = place_in_slot(&props, desired, slot);
            tree.arrange_node(child, rect);

            if props.visibility.is_visible() && clip::overflows(&slot, &rect) {
                cell.requires_clip = true;
            }
        }
    }
}
