//! Node drag gestures and the pointer capture they hold.
//!
//! A drag starts on a node's pointer-down and from then on must see every
//! pointer move and the release, even when the pointer leaves the node. The
//! host provides that through [`PointerCapture`]; [`NodeDrag`] holds the
//! capture in a [`CaptureGuard`] so it is released on every path out of the
//! gesture, including the node being torn down mid-drag.

use crate::model::{Node, NodeId};
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// Host hook for routing all pointer events to one node while it is dragged.
pub trait PointerCapture {
    fn acquire(&self, node: NodeId);
    fn release(&self, node: NodeId);
}

/// Capture that does nothing, for hosts that deliver global pointer events anyway.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapture;

impl PointerCapture for NoCapture {
    fn acquire(&self, _node: NodeId) {}
    fn release(&self, _node: NodeId) {}
}

/// Holds a pointer capture and releases it when dropped.
pub struct CaptureGuard {
    node: NodeId,
    capture: Rc<dyn PointerCapture>,
}

impl CaptureGuard {
    pub fn acquire(node: NodeId, capture: Rc<dyn PointerCapture>) -> Self {
        trace!(node, "pointer captured");
        capture.acquire(node);
        Self { node, capture }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        trace!(node = self.node, "pointer released");
        self.capture.release(self.node);
    }
}

impl fmt::Debug for CaptureGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureGuard").field("node", &self.node).finish()
    }
}

/// An in-progress drag of one node.
///
/// Positions are derived from where the node and pointer were when the drag
/// began, so a missed move event never accumulates error.
#[derive(Debug)]
pub struct NodeDrag {
    node_x: f32,
    node_y: f32,
    pointer_x: f32,
    pointer_y: f32,
    guard: CaptureGuard,
}

impl NodeDrag {
    pub fn begin(node: &Node, pointer_x: f32, pointer_y: f32, capture: Rc<dyn PointerCapture>) -> Self {
        Self {
            node_x: node.x,
            node_y: node.y,
            pointer_x,
            pointer_y,
            guard: CaptureGuard::acquire(node.id, capture),
        }
    }

    pub fn node(&self) -> NodeId {
        self.guard.node()
    }

    /// Node position for the pointer at `(x, y)`.
    pub fn target(&self, x: f32, y: f32) -> (f32, f32) {
        (self.node_x + (x - self.pointer_x), self.node_y + (y - self.pointer_y))
    }

    /// End the drag, returning the final node position for the pointer at
    /// `(x, y)`. The capture is released here.
    pub fn finish(self, x: f32, y: f32) -> (f32, f32) {
        self.target(x, y)
    }
}
