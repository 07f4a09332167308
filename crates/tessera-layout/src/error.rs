//! Errors from tree-structure and property APIs.
//!
//! Layout passes themselves never fail; malformed numeric input is clamped.

use crate::node::NodeId;

/// Result alias for fallible tree operations.
pub type Result<T, E = LayoutError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// Stale or never-issued handle.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {0} is a leaf and cannot have children")]
    NotAContainer(NodeId),

    #[error("content host {0} already has a child")]
    ContentHostOccupied(NodeId),

    #[error("attaching {child} under {parent} would create a cycle")]
    WouldCreateCycle { parent: NodeId, child: NodeId },

    #[error("node {node} is not a {expected}")]
    KindMismatch { node: NodeId, expected: &'static str },
}
