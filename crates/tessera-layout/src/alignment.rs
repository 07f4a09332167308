//! Cross-axis alignment of a child inside an allotted slot.

use serde::{Deserialize, Serialize};

/// Placement of a child inside a region larger (or smaller) than its
/// desired size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Alignment {
    /// Leading edge (left or top).
    Start,
    Center,
    /// Trailing edge (right or bottom).
    End,
    /// Fill the slot. Stretch children are "space-filling" and drive
    /// auto-sized grid tracks.
    #[default]
    Stretch,
}

impl Alignment {
    /// Returns true for [`Alignment::Stretch`].
    #[inline]
    pub fn is_stretch(self) -> bool {
        matches!(self, Alignment::Stretch)
    }

    /// Position a child inside a slot of `extent`.
    ///
    /// `desired` is the child's margin-exclusive size, `stretched` the size
    /// it takes when filling the slot, and `leading`/`trailing` its margins.
    /// Returns `(offset, size)` relative to the slot start.
    ///
    /// Center keeps the asymmetric margin term: the offset is the pure
    /// center plus `(leading - trailing) / 2`.
    pub fn place(
        self,
        extent: f32,
        desired: f32,
        stretched: f32,
        leading: f32,
        trailing: f32,
    ) -> (f32, f32) {
        match self {
            Alignment::Start => (leading, desired),
            Alignment::Center => (
                (extent - desired) / 2.0 + (leading - trailing) / 2.0,
                desired,
            ),
            Alignment::End => (extent - desired - trailing, desired),
            Alignment::Stretch => (leading, stretched),
        }
    }
}
