//! # Node Graph Core
//!
//! The state engine behind a node-link graph editor: nodes with named input
//! and output pins, edges between them, pointer-driven editing, undo/redo
//! and a clipboard. It draws nothing and performs no layout; the host's
//! presentation layer renders the state and reports measured sizes back.
//!
//! ## Features
//!
//! - **Immutable Values** - Every operation on [`GraphState`] returns a new value; old values stay valid
//! - **Structural Sharing** - Snapshots and history share unchanged nodes, so an edit never deep-copies the graph
//! - **Whole-Gesture Undo** - A drag or marquee is a single undo entry, however many moves it took
//! - **Coalesced Layout Feedback** - A burst of measurements becomes one transition per frame
//! - **Collision-Free Paste** - Pasted nodes are remapped onto free ids, edges follow
//!
//! ## Quick Start
//!
//! ```
//! use node_graph_core::{GraphState, Node};
//!
//! let state = GraphState::from_graph(
//!     [
//!         Node::new(0, "Source").with_outputs(["out"]),
//!         Node::new(1, "Sink").with_inputs(["in"]),
//!     ],
//!     [],
//! )
//! .unwrap();
//!
//! let linked = state.add_link(0, 0, 1, 0).unwrap();
//! assert!(linked.editor_state().node(1).unwrap().inputs[0].connected);
//!
//! let undone = linked.undo();
//! assert!(undone.editor_state().edges().is_empty());
//! ```
//!
//! ## Modules
//!
//! - [`GraphState`] - The editor value and its operations
//! - [`GraphController`] - Owns the latest value for a UI host and routes its events
//! - [`MeasurementBatcher`] - Queues layout reports until the next frame
//! - [`History`] - Persistent undo/redo stacks
//! - [`SavedGraph`] - Serializable form for save/restore

pub mod clipboard;
pub mod config;
pub mod controller;
pub mod drag;
pub mod error;
pub mod graph;
pub mod history;
pub mod interaction;
pub mod model;
pub mod selection;
pub mod snapshot;
pub mod state;
pub mod tracking;

pub use clipboard::Clipboard;
pub use config::EditorConfig;
pub use controller::GraphController;
pub use drag::{CaptureGuard, NoCapture, NodeDrag, PointerCapture};
pub use error::{ErrorKind, GraphError, Result};
pub use graph::GraphState;
pub use history::{History, Stack};
pub use hit_test::{
    edge_endpoints, input_anchor, node_in_rect, nodes_in_selection_box, output_anchor,
    NodeGeometry, Rect,
};
pub use interaction::{
    CanvasTarget, ConnectionSource, Gesture, MenuState, MouseState, Propagation,
};
pub use model::{Data, Edge, EditorState, Node, NodeId, Pin, PinDirection, DEFAULT_EDGE_COLOR};
pub use selection::Selection;
pub use snapshot::{SavedEdge, SavedGraph, SavedNode, SavedPin};
pub use state::Measurement;
pub use tracking::{FrameScheduler, ManualFrames, MeasurementBatcher};
