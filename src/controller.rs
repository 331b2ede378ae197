//! Host-facing bridge between a UI toolkit and the immutable [`GraphState`].
//!
//! The [`GraphController`] holds the latest state value, routes pointer events
//! to the matching transitions, queues layout measurements until the next
//! frame and owns in-progress node drags. Every accepted transition is
//! reported to the change listener exactly once.
//!
//! # Example
//!
//! ```
//! use node_graph_core::{CanvasTarget, GraphController, GraphState, Node};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let state = GraphState::from_graph(
//!     [Node::new(0, "A").with_outputs(["out"]), Node::new(1, "B").with_inputs(["in"])],
//!     [],
//! )
//! .unwrap();
//! let ctrl = GraphController::new(state);
//!
//! let renders = Rc::new(Cell::new(0));
//! ctrl.on_change({
//!     let renders = renders.clone();
//!     move |_state| renders.set(renders.get() + 1)
//! });
//!
//! // Layout reports from one render pass become a single transition
//! ctrl.measure_node(0, 120.0, 60.0);
//! ctrl.measure_node(1, 120.0, 60.0);
//! ctrl.frame();
//! assert_eq!(renders.get(), 1);
//!
//! // Drag a connection from A's output onto B's input
//! ctrl.pin_pointer_down(0, "out", 120.0, 30.0).unwrap();
//! ctrl.pointer_move(200.0, 30.0);
//! ctrl.pin_pointer_up(1, "in");
//! assert_eq!(ctrl.value().editor_state().edges().len(), 1);
//! ```

use crate::drag::{NoCapture, NodeDrag, PointerCapture};
use crate::error::Result;
use crate::graph::GraphState;
use crate::interaction::{CanvasTarget, Propagation};
use crate::model::NodeId;
use crate::state::Measurement;
use crate::tracking::{FrameScheduler, ManualFrames, MeasurementBatcher};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{trace, warn};

type ChangeListener = Rc<dyn Fn(&GraphState)>;

/// Owns the current [`GraphState`] on behalf of a host UI.
///
/// Clone this controller to share it across callbacks; clones drive the
/// same state.
#[derive(Clone)]
pub struct GraphController {
    state: Rc<RefCell<GraphState>>,
    listener: Rc<RefCell<Option<ChangeListener>>>,
    batcher: MeasurementBatcher,
    scheduler: Rc<RefCell<Rc<dyn FrameScheduler>>>,
    capture: Rc<RefCell<Rc<dyn PointerCapture>>>,
    drags: Rc<RefCell<BTreeMap<NodeId, NodeDrag>>>,
}

impl Default for GraphController {
    fn default() -> Self {
        Self::new(GraphState::create_empty())
    }
}

impl GraphController {
    pub fn new(state: GraphState) -> Self {
        Self {
            state: Rc::new(RefCell::new(state)),
            listener: Rc::new(RefCell::new(None)),
            batcher: MeasurementBatcher::new(),
            scheduler: Rc::new(RefCell::new(Rc::new(ManualFrames))),
            capture: Rc::new(RefCell::new(Rc::new(NoCapture))),
            drags: Rc::new(RefCell::new(BTreeMap::new())),
        }
    }

    /// Register the change listener, replacing any previous one.
    pub fn on_change<F>(&self, listener: F)
    where
        F: Fn(&GraphState) + 'static,
    {
        *self.listener.borrow_mut() = Some(Rc::new(listener));
    }

    /// Set the frame scheduler (default: [`ManualFrames`], the host calls [`frame`](Self::frame) itself).
    pub fn set_frame_scheduler(&self, scheduler: Rc<dyn FrameScheduler>) {
        *self.scheduler.borrow_mut() = scheduler;
    }

    /// Set the pointer capture used by node drags (default: [`NoCapture`]).
    pub fn set_pointer_capture(&self, capture: Rc<dyn PointerCapture>) {
        *self.capture.borrow_mut() = capture;
    }

    /// The latest state value.
    pub fn value(&self) -> GraphState {
        self.state.borrow().clone()
    }

    /// Replace the current value and notify the listener.
    pub fn set_value(&self, next: GraphState) {
        *self.state.borrow_mut() = next.clone();
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener(&next);
        }
    }

    /// Run an infallible transition on the current value.
    pub fn apply<F>(&self, f: F)
    where
        F: FnOnce(&GraphState) -> GraphState,
    {
        let next = f(&self.state.borrow());
        self.set_value(next);
    }

    /// Run a validating transition. On error the current value is kept and
    /// the listener is not called.
    pub fn try_apply<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&GraphState) -> Result<GraphState>,
    {
        let next = f(&self.state.borrow())?;
        self.set_value(next);
        Ok(())
    }

    /// Access the measurement queue, e.g. to hand its callbacks to a renderer.
    pub fn batcher(&self) -> &MeasurementBatcher {
        &self.batcher
    }

    // === Canvas events ===

    pub fn pointer_down_canvas(&self, target: CanvasTarget, x: f32, y: f32) {
        self.apply(|state| state.canvas_pointer_down(target, x, y));
    }

    /// Pointer moved anywhere over the canvas. Ignored while no canvas
    /// gesture is in progress.
    pub fn pointer_move(&self, x: f32, y: f32) {
        if !self.state.borrow().mouse_state().down {
            return;
        }
        trace!(x, y, "pointer move");
        self.apply(|state| state.update_mouse(x, y));
    }

    pub fn pointer_up_canvas(&self, x: f32, y: f32) {
        if !self.state.borrow().mouse_state().down {
            return;
        }
        self.apply(|state| state.canvas_pointer_up(x, y));
    }

    pub fn context_menu(&self, x: f32, y: f32) {
        self.apply(|state| state.context_menu(x, y));
    }

    // === Pin events ===

    /// Pointer pressed on an output pin. Always consumes the event so the
    /// canvas does not start a marquee underneath.
    pub fn pin_pointer_down(&self, node: NodeId, pin_name: &str, x: f32, y: f32) -> Result<Propagation> {
        if self.state.borrow().mouse_state().is_connecting() {
            return Ok(Propagation::Stop);
        }
        self.try_apply(|state| state.start_connection(node, pin_name, x, y))?;
        Ok(Propagation::Stop)
    }

    /// Pointer released on an input pin.
    ///
    /// Completes a pending connection and consumes the event. Without one, or
    /// when the drop cannot be linked, the event continues to the canvas.
    pub fn pin_pointer_up(&self, node: NodeId, pin_name: &str) -> Propagation {
        if !self.state.borrow().mouse_state().is_connecting() {
            return Propagation::Continue;
        }
        match self.try_apply(|state| state.end_connection(node, pin_name)) {
            Ok(()) => Propagation::Stop,
            Err(err) => {
                warn!(node, pin = pin_name, %err, "connection drop rejected");
                Propagation::Continue
            }
        }
    }

    // === Node drag ===

    /// Pointer pressed on a node body: select it if needed and start dragging.
    pub fn node_pointer_down(&self, id: NodeId, x: f32, y: f32, additive: bool) -> Result<()> {
        let selected = self.state.borrow().is_selected(id);
        if !selected {
            self.try_apply(|state| state.node_pointer_down(id, additive))?;
        }

        // A stale drag for this node must let go before the new one captures.
        self.detach_node(id);
        let state = self.value();
        let node = state.editor_state().require_node(id)?;
        let capture = self.capture.borrow().clone();
        let drag = NodeDrag::begin(node, x, y, capture);
        self.drags.borrow_mut().insert(id, drag);
        Ok(())
    }

    pub fn node_pointer_move(&self, id: NodeId, x: f32, y: f32) -> Result<()> {
        let target = self.drags.borrow().get(&id).map(|drag| drag.target(x, y));
        match target {
            Some((nx, ny)) => self.try_apply(|state| state.move_node(id, nx, ny, false)),
            None => Ok(()),
        }
    }

    /// Pointer released after a node drag: one undo entry for the whole drag.
    pub fn node_pointer_up(&self, id: NodeId, x: f32, y: f32) -> Result<()> {
        let drag = self.drags.borrow_mut().remove(&id);
        match drag {
            Some(drag) => {
                let (nx, ny) = drag.finish(x, y);
                self.try_apply(|state| state.move_node(id, nx, ny, true))
            }
            None => Ok(()),
        }
    }

    pub fn is_dragging(&self, id: NodeId) -> bool {
        self.drags.borrow().contains_key(&id)
    }

    /// The node's view is going away: release the capture and record the
    /// distance dragged so far as the drag's undo entry.
    pub fn detach_node(&self, id: NodeId) {
        let drag = self.drags.borrow_mut().remove(&id);
        let Some(drag) = drag else {
            return;
        };
        drop(drag);
        if self.state.borrow().has_uncommitted_gesture() {
            self.apply(|state| state.settle_gesture());
        }
    }

    // === Layout feedback ===

    pub fn measure_node(&self, id: NodeId, width: f32, height: f32) {
        self.enqueue(Measurement::Node { id, width, height });
    }

    pub fn measure_pin(&self, id: NodeId, y: f32, height: f32) {
        self.enqueue(Measurement::Pin { id, y, height });
    }

    fn enqueue(&self, measurement: Measurement) {
        if self.batcher.push(measurement) {
            let scheduler = self.scheduler.borrow().clone();
            scheduler.request_frame();
        }
    }

    /// Frame tick: apply every queued measurement as one transition.
    pub fn frame(&self) {
        let flushed = self.batcher.flush(&self.state.borrow());
        if let Some(next) = flushed {
            self.set_value(next);
        }
    }
}
