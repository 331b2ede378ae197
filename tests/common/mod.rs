//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod harness;

use node_graph_core::{FrameScheduler, GraphState, NodeId, PointerCapture};
use std::cell::RefCell;
use std::rc::Rc;

/// Tracks host hook invocations for testing.
///
/// Each field records calls to the corresponding hook.
#[derive(Default, Clone)]
pub struct CallbackTracker {
    /// Every value passed to the change listener
    pub changes: Rc<RefCell<Vec<GraphState>>>,
    /// Count of request_frame calls
    pub frame_requests: Rc<RefCell<usize>>,
    /// Nodes whose pointer capture was acquired
    pub captured: Rc<RefCell<Vec<NodeId>>>,
    /// Nodes whose pointer capture was released
    pub released: Rc<RefCell<Vec<NodeId>>>,
}

impl CallbackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn change_count(&self) -> usize {
        self.changes.borrow().len()
    }

    /// Clear all recorded callbacks.
    pub fn clear(&self) {
        self.changes.borrow_mut().clear();
        *self.frame_requests.borrow_mut() = 0;
        self.captured.borrow_mut().clear();
        self.released.borrow_mut().clear();
    }
}

impl FrameScheduler for CallbackTracker {
    fn request_frame(&self) {
        *self.frame_requests.borrow_mut() += 1;
    }
}

impl PointerCapture for CallbackTracker {
    fn acquire(&self, node: NodeId) {
        self.captured.borrow_mut().push(node);
    }

    fn release(&self, node: NodeId) {
        self.released.borrow_mut().push(node);
    }
}
