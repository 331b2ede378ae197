//! Coalescing of layout measurements into one state transition per frame.
//!
//! After a render the presentation layer reports many node sizes and pin
//! positions in a burst. Applying each one as its own transition would
//! notify the host once per report, so [`MeasurementBatcher`] queues them and
//! asks a [`FrameScheduler`] for a single flush on the next frame tick.
//!
//! # Example
//!
//! ```
//! use node_graph_core::{GraphState, Measurement, MeasurementBatcher, Node};
//!
//! let state = GraphState::from_graph([Node::new(0, "A")], []).unwrap();
//! let batcher = MeasurementBatcher::new();
//!
//! // Only the first report of a burst needs a frame scheduled
//! assert!(batcher.push(Measurement::Node { id: 0, width: 120.0, height: 48.0 }));
//! assert!(!batcher.push(Measurement::Pin { id: 0, y: 20.0, height: 16.0 }));
//!
//! let state = batcher.flush(&state).expect("queued measurements");
//! assert_eq!(state.editor_state().node(0).unwrap().width, 120.0);
//! ```

use crate::graph::GraphState;
use crate::model::NodeId;
use crate::state::Measurement;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};

/// Host hook that runs the flush on the next frame.
pub trait FrameScheduler {
    /// Ask for one call to the flush routine before the next paint.
    /// Called at most once per batch.
    fn request_frame(&self);
}

/// Scheduler for hosts that drive [`GraphController::frame`](crate::GraphController::frame)
/// from their own loop every tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualFrames;

impl FrameScheduler for ManualFrames {
    fn request_frame(&self) {}
}

/// Shared queue of pending measurements.
///
/// Clones share the same queue, so callbacks handed to the presentation
/// layer can push while the owner flushes.
#[derive(Debug, Clone, Default)]
pub struct MeasurementBatcher {
    queue: Rc<RefCell<Vec<Measurement>>>,
}

impl MeasurementBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a measurement. Returns `true` when it opened a new batch, meaning
    /// the caller should request a frame.
    pub fn push(&self, measurement: Measurement) -> bool {
        let mut queue = self.queue.borrow_mut();
        queue.push(measurement);
        queue.len() == 1
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Take everything queued so far.
    pub fn drain(&self) -> Vec<Measurement> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }

    /// Apply the queued batch to `state` in one transition.
    ///
    /// Returns `None` when nothing was queued. Measurements for nodes that
    /// have since been removed are dropped.
    pub fn flush(&self, state: &GraphState) -> Option<GraphState> {
        let batch = self.drain();
        if batch.is_empty() {
            return None;
        }
        let count = batch.len();
        let (next, skipped) = state.apply_measurements(batch);
        if !skipped.is_empty() {
            warn!(skipped = skipped.len(), "dropped measurements for removed nodes");
        }
        debug!(count, "flushed measurements");
        Some(next)
    }

    /// Callback for node size reports: `(node_id, width, height)`.
    ///
    /// Returns whether a frame should be requested.
    pub fn node_size_callback(&self) -> impl Fn(NodeId, f32, f32) -> bool + Clone {
        let batcher = self.clone();
        move |id, width, height| batcher.push(Measurement::Node { id, width, height })
    }

    /// Callback for pin reports: `(node_id, absolute_y, row_height)`.
    pub fn pin_callback(&self) -> impl Fn(NodeId, f32, f32) -> bool + Clone {
        let batcher = self.clone();
        move |id, y, height| batcher.push(Measurement::Pin { id, y, height })
    }
}
