//! Counters for measure/arrange work.

use serde::Serialize;

/// Cumulative counters since construction or the last
/// [`reset_stats`](crate::LayoutTree::reset_stats).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayoutStats {
    /// `measure` calls on participating nodes.
    pub measure_calls: u64,
    /// Measure calls that ran the kind-specific core routine.
    pub measure_computations: u64,
    /// `arrange` calls on participating nodes.
    pub arrange_calls: u64,
    /// Arrange calls that ran the kind-specific placement routine.
    pub arrange_computations: u64,
    /// Measure queue entries processed by `update_layout`.
    pub measure_drained: u64,
    /// Arrange queue entries processed by `update_layout`.
    pub arrange_drained: u64,
    /// Invalidations raised during a pass and held for the next one.
    pub deferred_invalidations: u64,
    /// Completed `update_layout` passes.
    pub passes: u64,
}

impl LayoutStats {
    /// Fraction of measure and arrange calls answered from cache (0.0 – 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.measure_calls + self.arrange_calls;
        if total == 0 {
            0.0
        } else {
            let computed = self.measure_computations + self.arrange_computations;
            total.saturating_sub(computed) as f64 / total as f64
        }
    }
}
