#![forbid(unsafe_code)]

//! Deferred invalidation queues.
//!
//! # Design
//!
//! Property writes never lay anything out directly. They mark a node dirty
//! and enqueue it; [`LayoutTree::update_layout`](crate::LayoutTree::update_layout)
//! is the frame boundary that drains the measure queue and then the arrange
//! queue. Repeated invalidations of the same node coalesce into one entry.
//!
//! Queue entries are generation-checked [`NodeId`]s: a removed node's entry
//! becomes stale and is dropped at drain time, and reparenting explicitly
//! deregisters the moved subtree.
//!
//! Collaborators that cannot borrow the tree (content oracles called during
//! measure, animation clocks) hold an [`InvalidationHandle`]. Its requests
//! are buffered and applied at the start of the next pass; requests raised
//! while a pass is running are counted as deferred and never processed
//! recursively.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// Which pass an invalidation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidationKind {
    Measure,
    Arrange,
}

// ============================================================================
// NodeQueue
// ============================================================================

/// Insertion-ordered, deduplicated queue.
#[derive(Debug, Default)]
struct NodeQueue {
    order: Vec<NodeId>,
    members: FxHashSet<NodeId>,
}

impl NodeQueue {
    fn push(&mut self, id: NodeId) -> bool {
        if self.members.insert(id) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    fn remove(&mut self, id: NodeId) {
        if self.members.remove(&id) {
            self.order.retain(|&queued| queued != id);
        }
    }

    fn take(&mut self) -> Vec<NodeId> {
        self.members.clear();
        std::mem::take(&mut self.order)
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

// ============================================================================
// External requests
// ============================================================================

#[derive(Debug, Default)]
struct ExternalRequests {
    pending: Vec<(NodeId, InvalidationKind)>,
    members: FxHashSet<(NodeId, InvalidationKind)>,
    in_pass: bool,
    deferred: u64,
}

impl ExternalRequests {
    fn take(&mut self) -> Vec<(NodeId, InvalidationKind)> {
        self.members.clear();
        std::mem::take(&mut self.pending)
    }
}

/// Cloneable handle through which collaborators request invalidation.
///
/// Requests take effect at the next frame boundary. Repeated requests for
/// the same node and pass coalesce until then.
#[derive(Debug, Clone)]
pub struct InvalidationHandle {
    requests: Rc<RefCell<ExternalRequests>>,
}

impl InvalidationHandle {
    /// Request a re-measure of `id`.
    pub fn invalidate_measure(&self, id: NodeId) {
        self.request(id, InvalidationKind::Measure);
    }

    /// Request a re-arrange of `id`.
    pub fn invalidate_arrange(&self, id: NodeId) {
        self.request(id, InvalidationKind::Arrange);
    }

    fn request(&self, id: NodeId, kind: InvalidationKind) {
        let mut requests = self.requests.borrow_mut();
        if !requests.members.insert((id, kind)) {
            return;
        }
        if requests.in_pass {
            requests.deferred += 1;
            tracing::trace!(node = %id, ?kind, "invalidation deferred to next pass");
        }
        requests.pending.push((id, kind));
    }
}

// ============================================================================
// InvalidationQueues
// ============================================================================

/// The measure and arrange queues of one tree.
#[derive(Debug, Default)]
pub struct InvalidationQueues {
    measure: NodeQueue,
    arrange: NodeQueue,
    requests: Rc<RefCell<ExternalRequests>>,
}

impl InvalidationQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that feeds this tree's queues.
    pub fn handle(&self) -> InvalidationHandle {
        InvalidationHandle {
            requests: Rc::clone(&self.requests),
        }
    }

    /// Enqueue `id`. Returns false if it was already queued for `kind`.
    pub fn push(&mut self, id: NodeId, kind: InvalidationKind) -> bool {
        match kind {
            InvalidationKind::Measure => self.measure.push(id),
            InvalidationKind::Arrange => self.arrange.push(id),
        }
    }

    /// Drop every entry for `id`, including buffered external requests.
    pub fn remove(&mut self, id: NodeId) {
        self.measure.remove(id);
        self.arrange.remove(id);
        let mut requests = self.requests.borrow_mut();
        requests.pending.retain(|&(queued, _)| queued != id);
        requests.members.retain(|&(queued, _)| queued != id);
    }

    /// Take the measure queue in insertion order.
    pub fn take_measure(&mut self) -> Vec<NodeId> {
        self.measure.take()
    }

    /// Take the arrange queue in insertion order.
    pub fn take_arrange(&mut self) -> Vec<NodeId> {
        self.arrange.take()
    }

    /// Take buffered external requests.
    pub fn take_external(&mut self) -> Vec<(NodeId, InvalidationKind)> {
        self.requests.borrow_mut().take()
    }

    pub fn measure_len(&self) -> usize {
        self.measure.len()
    }

    pub fn arrange_len(&self) -> usize {
        self.arrange.len()
    }

    /// True if anything is waiting for the next pass.
    pub fn has_pending(&self) -> bool {
        self.measure.len() > 0 || self.arrange.len() > 0 || !self.requests.borrow().pending.is_empty()
    }

    pub(crate) fn begin_pass(&mut self) {
        self.requests.borrow_mut().in_pass = true;
    }

    /// Ends the pass and returns the deferred count accumulated during it.
    pub(crate) fn end_pass(&mut self) -> u64 {
        let mut requests = self.requests.borrow_mut();
        requests.in_pass = false;
        std::mem::take(&mut requests.deferred)
    }
}
