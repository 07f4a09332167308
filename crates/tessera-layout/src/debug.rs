#![forbid(unsafe_code)]

//! Track-solve debugging utilities.
//!
//! Provides introspection into grid track sizing:
//! - Recording of every solve (definitions, available extent, results)
//! - Detection of overflow/underflow conditions
//! - A plain-text report
//!
//! Recording is a no-op unless enabled, either through
//! [`LayoutConfig::record_solves`](crate::LayoutConfig) or at runtime via
//! [`LayoutTree::debugger_mut`](crate::LayoutTree::debugger_mut).
//!
//! # Usage
//!
//! ```ignore
//! tree.debugger_mut().set_enabled(true);
//! tree.update_layout();
//! for record in tree.debugger().snapshot() {
//!     if record.has_overflow() {
//!         eprintln!("{}", record.summary());
//!     }
//! }
//! ```

use std::fmt::Write as _;

use serde::Serialize;

use crate::axis::Orientation;
use crate::node::NodeId;
use crate::track::{SolveMode, TrackSize};

/// Slack below which a solve is not reported as overflowing.
const OVERFLOW_EPSILON: f32 = 1e-3;

/// A record of one track solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSolveRecord {
    /// Grid that ran the solve.
    pub node: NodeId,
    /// `Horizontal` for columns, `Vertical` for rows.
    pub axis: Orientation,
    pub mode: SolveMode,
    /// Extent the tracks were solved against (may be infinite).
    pub available: f32,
    /// Declared sizing modes, in track order.
    pub definitions: Vec<TrackSize>,
    /// Solved sizes, in track order.
    pub sizes: Vec<f32>,
}

impl TrackSolveRecord {
    /// Sum of solved sizes.
    pub fn total(&self) -> f32 {
        self.sizes.iter().sum()
    }

    /// Check if an arrange solve claimed more than its extent.
    ///
    /// Happens when fixed sizes or minimums alone exceed the extent.
    pub fn has_overflow(&self) -> bool {
        self.mode == SolveMode::Arrange
            && self.available.is_finite()
            && self.total() > self.available + OVERFLOW_EPSILON
    }

    /// Check if more than 20% of a finite extent is left unused.
    pub fn has_underflow(&self) -> bool {
        self.mode == SolveMode::Arrange
            && self.available.is_finite()
            && self.available > 0.0
            && (self.available - self.total()) / self.available > 0.2
    }

    /// Percentage of the available extent used (0 when unbounded or empty).
    pub fn utilization(&self) -> f32 {
        if !(self.available.is_finite() && self.available > 0.0) {
            return 0.0;
        }
        (self.total() / self.available).min(1.0) * 100.0
    }

    fn format_definition(size: &TrackSize) -> String {
        match size {
            TrackSize::Fixed(px) => format!("Fixed({px})"),
            TrackSize::Auto => "Auto".to_string(),
            TrackSize::Proportional(f) => format!("{f}*"),
        }
    }

    /// Generate a human-readable summary.
    pub fn summary(&self) -> String {
        let axis = if self.axis.is_horizontal() { "columns" } else { "rows" };
        let mut s = String::new();
        let _ = writeln!(s, "{} {} ({:?}):", self.node, axis, self.mode);
        let _ = writeln!(s, "  Available: {}", self.available);
        for (i, (definition, size)) in self.definitions.iter().zip(&self.sizes).enumerate() {
            let _ = writeln!(s, "  [{i}] {} -> {size}", Self::format_definition(definition));
        }
        let _ = writeln!(s, "  Utilization: {:.1}%", self.utilization());
        if self.has_overflow() {
            let _ = writeln!(s, "  ⚠ OVERFLOW");
        }
        if self.has_underflow() {
            let _ = writeln!(s, "  ⚠ UNDERFLOW (>20% unused)");
        }
        s
    }
}

/// Collects [`TrackSolveRecord`]s while enabled.
#[derive(Debug, Default)]
pub struct LayoutDebugger {
    enabled: bool,
    records: Vec<TrackSolveRecord>,
}

impl LayoutDebugger {
    /// Create a debugger (disabled by default).
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Toggle recording; returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Record a solve if enabled.
    pub fn record(&mut self, record: TrackSolveRecord) {
        if self.enabled {
            self.records.push(record);
        }
    }

    /// All records in solve order.
    pub fn snapshot(&self) -> &[TrackSolveRecord] {
        &self.records
    }

    /// Records of a single grid.
    pub fn records_for(&self, node: NodeId) -> impl Iterator<Item = &TrackSolveRecord> {
        self.records.iter().filter(move |r| r.node == node)
    }

    /// Records with overflow conditions.
    pub fn overflows(&self) -> Vec<&TrackSolveRecord> {
        self.records.iter().filter(|r| r.has_overflow()).collect()
    }

    /// Generate a summary report of all recorded solves.
    pub fn report(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "=== Track Solve Report ({} solves) ===", self.records.len());

        let overflows = self.overflows();
        if !overflows.is_empty() {
            let _ = writeln!(s, "\n⚠ {} solves have OVERFLOW:", overflows.len());
            for r in &overflows {
                let _ = writeln!(s, "  - {} ({:.1} > {:.1})", r.node, r.total(), r.available);
            }
        }

        for record in &self.records {
            let _ = write!(s, "\n{}", record.summary());
        }
        s
    }
}
