#![forbid(unsafe_code)]

//! Scissor-region derivation from child overflow.
//!
//! After a container arranges its children it asks whether any visible
//! child's rectangle leaves the content area. If one does, the container
//! must clip to its content rectangle. Nested clips only ever shrink: the
//! effective clip of a node is its own clip intersected with every clipping
//! ancestor's.

use serde::{Deserialize, Serialize};
use tessera_core::geometry::Rect;

/// Tolerance for float noise at the content edges.
pub const CLIP_EPSILON: f32 = 1e-3;

/// Clip state of a container after arrange.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClipRegion {
    /// True if a visible child overflows the content area.
    pub requires_clip: bool,
    /// Content rectangle in the container's own coordinates.
    pub rect: Rect,
}

impl ClipRegion {
    /// A region that never clips.
    pub const NONE: Self = Self {
        requires_clip: false,
        rect: Rect::new(0.0, 0.0, 0.0, 0.0),
    };

    /// The clip rectangle, if clipping is required.
    #[inline]
    pub fn active(&self) -> Option<Rect> {
        self.requires_clip.then_some(self.rect)
    }
}

/// Returns true if `child` leaves `content` on any side.
#[inline]
pub fn overflows(content: &Rect, child: &Rect) -> bool {
    child.left() < content.left() - CLIP_EPSILON
        || child.top() < content.top() - CLIP_EPSILON
        || child.right() > content.right() + CLIP_EPSILON
        || child.bottom() > content.bottom() + CLIP_EPSILON
}

/// Compute the clip region of a container with content rectangle `content`
/// and visible child rectangles `children`, both in container coordinates.
pub fn compute<I>(content: Rect, children: I) -> ClipRegion
where
    I: IntoIterator<Item = Rect>,
{
    let requires_clip = children.into_iter().any(|child| overflows(&content, &child));
    ClipRegion {
        requires_clip,
        rect: content,
    }
}

/// Intersect an inherited clip with a node's own clip.
///
/// `None` means unclipped. The result is never larger than either input.
pub fn nest(inherited: Option<Rect>, own: Option<Rect>) -> Option<Rect> {
    match (inherited, own) {
        (None, None) => None,
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (Some(a), Some(b)) => Some(a.intersection(&b)),
    }
}
