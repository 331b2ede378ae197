//! Test harness for a two-node editor session.
//!
//! Provides a controller wired to a [`CallbackTracker`] plus helper methods
//! for simulating renders and user interactions.

#![allow(dead_code)]

use super::CallbackTracker;
use node_graph_core::{CanvasTarget, Edge, GraphController, GraphState, Node, NodeId};
use std::rc::Rc;

/// Node width and height every simulated render reports
pub const NODE_SIZE: (f32, f32) = (120.0, 80.0);
/// Offset from a node's top to its first pin row
pub const PIN_TOP: f32 = 30.0;
pub const PIN_HEIGHT: f32 = 16.0;

/// Node A (id 0) with output "out" at (100, 100); node B (id 1) with inputs
/// "in" and "aux" at (400, 200).
pub fn two_nodes() -> Vec<Node> {
    vec![
        Node::new(0, "Node A").at(100.0, 100.0).with_outputs(["out"]),
        Node::new(1, "Node B").at(400.0, 200.0).with_inputs(["in", "aux"]),
    ]
}

pub struct EditorHarness {
    pub ctrl: GraphController,
    pub tracker: CallbackTracker,
}

impl EditorHarness {
    /// Create a harness with the default two nodes and no edges.
    pub fn new() -> Self {
        Self::with_graph(two_nodes(), Vec::new())
    }

    pub fn with_graph(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self::with_state(GraphState::from_graph(nodes, edges).unwrap())
    }

    pub fn with_state(state: GraphState) -> Self {
        let ctrl = GraphController::new(state);
        let tracker = CallbackTracker::new();
        ctrl.on_change({
            let changes = tracker.changes.clone();
            move |state| changes.borrow_mut().push(state.clone())
        });
        ctrl.set_frame_scheduler(Rc::new(tracker.clone()));
        ctrl.set_pointer_capture(Rc::new(tracker.clone()));
        Self { ctrl, tracker }
    }

    pub fn state(&self) -> GraphState {
        self.ctrl.value()
    }

    /// Report sizes and pin rows for every node, then run the frame.
    pub fn render(&self) {
        let state = self.state();
        for node in state.editor_state().nodes() {
            self.ctrl.measure_node(node.id, NODE_SIZE.0, NODE_SIZE.1);
            let rows = node.inputs.len().max(node.outputs.len());
            for row in 0..rows {
                let y = node.y + PIN_TOP + row as f32 * PIN_HEIGHT;
                self.ctrl.measure_pin(node.id, y, PIN_HEIGHT);
            }
        }
        self.ctrl.frame();
    }

    /// Press on a node, move through `path` and release at its last point.
    pub fn drag_node(&self, id: NodeId, from: (f32, f32), path: &[(f32, f32)]) {
        self.ctrl.node_pointer_down(id, from.0, from.1, false).unwrap();
        for &(x, y) in path {
            self.ctrl.node_pointer_move(id, x, y).unwrap();
        }
        let (x, y) = path.last().copied().unwrap_or(from);
        self.ctrl.node_pointer_up(id, x, y).unwrap();
    }

    /// Drag a connection from an output pin and drop it on an input pin.
    pub fn connect(&self, from: NodeId, output: &str, to: NodeId, input: &str) {
        self.ctrl.pin_pointer_down(from, output, 0.0, 0.0).unwrap();
        self.ctrl.pointer_move(10.0, 10.0);
        self.ctrl.pin_pointer_up(to, input);
    }

    /// Draw a marquee on the empty canvas.
    pub fn marquee(&self, from: (f32, f32), to: (f32, f32)) {
        self.ctrl.pointer_down_canvas(CanvasTarget::Background, from.0, from.1);
        self.ctrl.pointer_move(to.0, to.1);
        self.ctrl.pointer_up_canvas(to.0, to.1);
    }

    pub fn selected_ids(&self) -> Vec<NodeId> {
        self.state().editor_state().selection().iter().collect()
    }
}
