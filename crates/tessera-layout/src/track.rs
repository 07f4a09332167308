#![forbid(unsafe_code)]

//! Grid track sizing (fixed → auto → proportional).
//!
//! # Algorithm
//!
//! Given the tracks along one axis and an available extent:
//!
//! 1. **Fixed**: `Fixed(px)` tracks take `clamp(px, min, max)`; their sum is
//!    subtracted from the available extent (floored at zero).
//! 2. **Auto**: in track order, each `Auto` track takes the largest
//!    contribution of its space-filling children, capped by whatever budget
//!    is still unclaimed, then clamped to `[min, max]`. Each track subtracts
//!    its size from the shared budget, so later tracks see less room.
//! 3. **Proportional**: `unit = remaining / Σfactor` (zero when the factor
//!    sum is zero); each track takes `clamp(factor × unit, min, max)`. Tracks
//!    whose share violates a bound are frozen at the bound and the rest of
//!    the budget is redistributed over the remaining tracks.
//!
//! [`SolveMode::Desired`] answers "how big do I want to be": proportional
//! tracks are sized like auto tracks in pass 2 (their factor still counts
//! toward [`TrackSolution::proportional_factor_sum`]) and pass 3 is skipped.
//! [`SolveMode::Arrange`] answers "given this extent, how do my tracks divide
//! it".
//!
//! Offsets are the prefix sum of measured sizes.
//!
//! # Invariants
//!
//! 1. Every `measured_size` lies in `[min_size, max_size]`.
//! 2. In arrange mode the total never exceeds `max(0, available)` as long
//!    as the fixed sizes and minimums fit.
//! 3. Empty auto tracks measure zero and still occupy their slot.
//!
//! # Failure Modes
//!
//! None. Negative extents clamp to zero, `NaN` available means unconstrained,
//! negative or `NaN` factors count as zero.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tessera_core::geometry::non_negative;

/// How a track is sized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TrackSize {
    /// An exact size in logical units.
    Fixed(f32),
    /// Sized to the largest space-filling child.
    Auto,
    /// A weighted share of the space left after fixed and auto tracks.
    Proportional(f32),
}

impl Default for TrackSize {
    fn default() -> Self {
        TrackSize::Proportional(1.0)
    }
}

/// A grid row or column definition plus its solver output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub(crate) size: TrackSize,
    pub(crate) min_size: f32,
    pub(crate) max_size: f32,
    pub(crate) measured_size: f32,
    pub(crate) offset: f32,
}

impl Default for Track {
    fn default() -> Self {
        Self::new(TrackSize::default())
    }
}

impl Track {
    /// Create a track with default bounds `[0, +inf)`.
    pub const fn new(size: TrackSize) -> Self {
        Self {
            size,
            min_size: 0.0,
            max_size: f32::INFINITY,
            measured_size: 0.0,
            offset: 0.0,
        }
    }

    /// A fixed-size track.
    pub const fn fixed(px: f32) -> Self {
        Self::new(TrackSize::Fixed(px))
    }

    /// An auto-sized track.
    pub const fn auto() -> Self {
        Self::new(TrackSize::Auto)
    }

    /// A proportional (star) track.
    pub const fn proportional(factor: f32) -> Self {
        Self::new(TrackSize::Proportional(factor))
    }

    /// Set the minimum size.
    #[must_use]
    pub fn with_min(mut self, min: f32) -> Self {
        self.min_size = min;
        self
    }

    /// Set the maximum size.
    #[must_use]
    pub fn with_max(mut self, max: f32) -> Self {
        self.max_size = max;
        self
    }

    /// The declared sizing mode.
    pub fn size_mode(&self) -> TrackSize {
        self.size
    }

    /// The declared minimum.
    pub fn min_size(&self) -> f32 {
        self.min_size
    }

    /// The declared maximum.
    pub fn max_size(&self) -> f32 {
        self.max_size
    }

    /// Size computed by the last solve.
    pub fn measured_size(&self) -> f32 {
        self.measured_size
    }

    /// Position along the axis computed by the last solve.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Sanitized `(min, max)` bounds; `max` never drops below `min`.
    pub fn bounds(&self) -> (f32, f32) {
        let lo = if self.min_size.is_finite() && self.min_size > 0.0 {
            self.min_size
        } else {
            0.0
        };
        let hi = if self.max_size.is_nan() {
            f32::INFINITY
        } else {
            self.max_size.max(lo)
        };
        (lo, hi)
    }

    /// Clamp a candidate size into this track's bounds.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        let (lo, hi) = self.bounds();
        value.max(lo).min(hi)
    }

    /// True if both tracks declare the same mode and bounds, ignoring
    /// solver output.
    pub fn same_definition(&self, other: &Track) -> bool {
        let bits = |v: f32| v.to_bits();
        let mode = match (self.size, other.size) {
            (TrackSize::Fixed(a), TrackSize::Fixed(b)) => bits(a) == bits(b),
            (TrackSize::Auto, TrackSize::Auto) => true,
            (TrackSize::Proportional(a), TrackSize::Proportional(b)) => bits(a) == bits(b),
            _ => false,
        };
        mode && bits(self.min_size) == bits(other.min_size)
            && bits(self.max_size) == bits(other.max_size)
    }

    pub(crate) fn factor(&self) -> f32 {
        match self.size {
            TrackSize::Proportional(f) => sanitize_factor(f),
            _ => 0.0,
        }
    }
}

/// Which question the solver answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveMode {
    /// Desired size: proportional tracks are treated as auto.
    Desired,
    /// Final arrangement against an allotted extent.
    Arrange,
}

impl SolveMode {
    /// Whether proportional tracks are sized in the auto pass.
    #[inline]
    pub fn treats_proportional_as_auto(self) -> bool {
        matches!(self, SolveMode::Desired)
    }
}

/// Summary of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackSolution {
    /// Sum of all measured sizes.
    pub total: f32,
    /// Sum of sanitized proportional factors (accumulated in both modes).
    pub proportional_factor_sum: f32,
    /// Budget left after every pass.
    pub remaining: f32,
}

fn sanitize_factor(f: f32) -> f32 {
    if f.is_finite() && f > 0.0 { f } else { 0.0 }
}

fn sanitize_available(v: f32) -> f32 {
    if v.is_nan() { f32::INFINITY } else { non_negative(v) }
}

fn contribution(contributions: &[f32], index: usize) -> f32 {
    match contributions.get(index) {
        Some(&c) if c.is_finite() && c > 0.0 => c,
        Some(&c) if c == f32::INFINITY => c,
        _ => 0.0,
    }
}

/// Size `tracks` against `available`.
///
/// `contributions[i]` is the largest margin-inclusive footprint of the
/// space-filling children whose primary index on this axis is `i`; missing
/// entries count as zero.
///
/// In arrange mode with an unbounded extent there is nothing to divide, so
/// proportional tracks fall back to auto sizing.
pub fn solve_tracks(
    tracks: &mut [Track],
    available: f32,
    mode: SolveMode,
    contributions: &[f32],
) -> TrackSolution {
    let available = sanitize_available(available);
    let as_auto = mode.treats_proportional_as_auto() || !available.is_finite();

    // 1. Fixed
    let mut fixed_total = 0.0;
    for track in tracks.iter_mut() {
        if let TrackSize::Fixed(px) = track.size {
            let px = if px.is_finite() { non_negative(px) } else { 0.0 };
            track.measured_size = track.clamp(px);
            fixed_total += track.measured_size;
        }
    }
    let mut remaining = non_negative(available - fixed_total);

    // 2. Auto (and proportional-as-auto)
    let mut factor_sum = 0.0;
    for (index, track) in tracks.iter_mut().enumerate() {
        match track.size {
            TrackSize::Fixed(_) => continue,
            TrackSize::Auto => {}
            TrackSize::Proportional(f) => {
                factor_sum += sanitize_factor(f);
                if !as_auto {
                    continue;
                }
            }
        }
        let wanted = contribution(contributions, index);
        track.measured_size = track.clamp(wanted.min(remaining));
        remaining = non_negative(remaining - track.measured_size);
    }

    // 3. Proportional
    if !as_auto {
        remaining = distribute_proportional(tracks, remaining);
    }

    let mut offset = 0.0;
    for track in tracks.iter_mut() {
        track.offset = offset;
        offset += track.measured_size;
    }

    TrackSolution {
        total: offset,
        proportional_factor_sum: factor_sum,
        remaining,
    }
}

/// Pass 3. Returns the budget left over.
fn distribute_proportional(tracks: &mut [Track], budget: f32) -> f32 {
    let mut budget = budget;
    let mut pending: SmallVec<[usize; 8]> = SmallVec::new();

    for (index, track) in tracks.iter_mut().enumerate() {
        if !matches!(track.size, TrackSize::Proportional(_)) {
            continue;
        }
        if track.factor() > 0.0 {
            pending.push(index);
        } else {
            track.measured_size = track.clamp(0.0);
            budget = non_negative(budget - track.measured_size);
        }
    }

    while !pending.is_empty() {
        let factor_sum: f32 = pending.iter().map(|&i| tracks[i].factor()).sum();
        let unit = if factor_sum > 0.0 {
            budget / factor_sum
        } else {
            0.0
        };

        let before = pending.len();
        pending.retain(|index| {
            let track = &mut tracks[*index];
            let share = track.factor() * unit;
            let clamped = track.clamp(share);
            if clamped == share {
                return true;
            }
            track.measured_size = clamped;
            budget = non_negative(budget - clamped);
            false
        });

        if pending.len() == before {
            for &index in &pending {
                let track = &mut tracks[index];
                track.measured_size = track.factor() * unit;
                budget = non_negative(budget - track.measured_size);
            }
            break;
        }
    }

    budget
}
