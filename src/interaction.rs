//! Transient pointer and context-menu state.
//!
//! The canvas gesture is one of three phases, derived from [`MouseState`]:
//!
//! - **Idle**: the pointer is up.
//! - **Selecting**: the pointer went down on the canvas, every move
//!   re-runs the marquee.
//! - **Connecting**: the pointer went down on an output pin, moves only
//!   track the cursor until the pointer is released.
//!
//! The transitions are methods on [`GraphState`] like every other operation;
//! [`GraphController`](crate::GraphController) routes host events to them.

use crate::error::{GraphError, Result};
use crate::graph::GraphState;
use crate::hit_test::{self, Rect};
use crate::model::{NodeId, PinDirection};
use tracing::debug;

/// The output pin an in-progress connection starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSource {
    pub node: NodeId,
    pub output: usize,
}

/// Phase of the canvas pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Idle,
    Selecting,
    Connecting(ConnectionSource),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MouseState {
    pub down: bool,
    pub x: f32,
    pub y: f32,
    pub start_x: f32,
    pub start_y: f32,
    pub source: Option<ConnectionSource>,
}

impl MouseState {
    pub fn gesture(&self) -> Gesture {
        match (self.down, self.source) {
            (false, _) => Gesture::Idle,
            (true, None) => Gesture::Selecting,
            (true, Some(source)) => Gesture::Connecting(source),
        }
    }

    pub fn is_connecting(&self) -> bool {
        self.source.is_some()
    }

    /// Marquee spanned from the gesture start to the current cursor.
    pub fn rect(&self) -> Rect {
        Rect::from_corners(self.start_x, self.start_y, self.x, self.y)
    }

    pub(crate) fn begin(self, x: f32, y: f32) -> Self {
        Self {
            down: true,
            x,
            y,
            start_x: x,
            start_y: y,
            ..self
        }
    }

    pub(crate) fn moved_to(self, x: f32, y: f32) -> Self {
        Self { x, y, ..self }
    }

    pub(crate) fn released(self) -> Self {
        Self {
            down: false,
            source: None,
            ..self
        }
    }
}

/// Context menu visibility and anchor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MenuState {
    pub open: bool,
    pub x: f32,
    pub y: f32,
}

/// Where a canvas-level pointer event landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasTarget {
    /// The canvas surface itself
    Background,
    /// Something drawn on the canvas that is not a node or pin (edges, menu, overlays)
    Overlay,
}

/// Whether a pin handler consumed a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// The event was handled, canvas-level handlers must not see it
    Stop,
    /// The canvas-level handler should process the event
    Continue,
}

impl GraphState {
    // === Gesture primitives ===

    /// Press on empty canvas: begin a marquee at `(x, y)`.
    pub fn start_mouse(&self, x: f32, y: f32) -> Self {
        let started = Self {
            mouse: MouseState {
                source: None,
                ..self.mouse.begin(x, y)
            },
            ..self.clone()
        };
        started.update_mouse(x, y)
    }

    /// Track the cursor. While selecting, the marquee replaces the selection
    /// with exactly the nodes it fully contains; this is not an undo entry
    /// until [`end_mouse`](Self::end_mouse).
    pub fn update_mouse(&self, x: f32, y: f32) -> Self {
        let moved = Self {
            mouse: self.mouse.moved_to(x, y),
            ..self.clone()
        };
        if moved.mouse.gesture() != Gesture::Selecting {
            return moved;
        }

        let enclosed = hit_test::nodes_in_selection_box(&moved.mouse.rect(), moved.editor.nodes());
        let mut next = moved.editor.clone();
        next.selection_mut().replace_selection(enclosed);
        moved.transient(next)
    }

    /// Release. A finished marquee is committed as one undo entry; a
    /// connection that did not land on a pin just ends.
    pub fn end_mouse(&self) -> Self {
        let connecting = self.mouse.is_connecting();
        let released = Self {
            mouse: self.mouse.released(),
            ..self.clone()
        };
        if connecting {
            released
        } else {
            released.commit_gesture(released.editor.clone())
        }
    }

    /// Press on output pin `pin_name` of `node`: begin a connection.
    pub fn start_connection(&self, node: NodeId, pin_name: &str, x: f32, y: f32) -> Result<Self> {
        let output = self
            .editor
            .require_node(node)?
            .pin_index(PinDirection::Output, pin_name)?;
        debug!(node, output, "starting connection");
        Ok(Self {
            mouse: MouseState {
                source: Some(ConnectionSource { node, output }),
                ..self.mouse.begin(x, y)
            },
            ..self.clone()
        })
    }

    /// Release on input pin `pin_name` of `node`: connect it to the pending
    /// source and end the gesture.
    pub fn end_connection(&self, node: NodeId, pin_name: &str) -> Result<Self> {
        let source = self.mouse.source.ok_or(GraphError::NoConnectionSource)?;
        let input = self
            .editor
            .require_node(node)?
            .pin_index(PinDirection::Input, pin_name)?;
        let linked = self.add_link(source.node, source.output, node, input)?;
        Ok(Self {
            mouse: linked.mouse.released(),
            ..linked
        })
    }

    // === Host events ===

    /// Pointer pressed on the canvas. Pressing the background itself also
    /// dismisses the context menu.
    pub fn canvas_pointer_down(&self, target: CanvasTarget, x: f32, y: f32) -> Self {
        match target {
            CanvasTarget::Background => self.close_menu().start_mouse(x, y),
            CanvasTarget::Overlay => self.start_mouse(x, y),
        }
    }

    /// Pointer released over the canvas. Dropping a connection on empty
    /// space opens the menu there so a node can be created for it.
    pub fn canvas_pointer_up(&self, x: f32, y: f32) -> Self {
        let connecting = self.mouse.is_connecting();
        let ended = self.end_mouse();
        if connecting {
            ended.open_menu(x, y)
        } else {
            ended
        }
    }

    pub fn context_menu(&self, x: f32, y: f32) -> Self {
        self.open_menu(x, y)
    }

    /// Pointer pressed on a node body. An unselected node is selected; a node
    /// that is already selected keeps the current selection so it can be
    /// dragged along with it.
    pub fn node_pointer_down(&self, id: NodeId, additive: bool) -> Result<Self> {
        if self.is_selected(id) {
            self.editor.require_node(id)?;
            return Ok(self.clone());
        }
        self.select_node(id, additive)
    }

    // === Derived view data ===

    /// The marquee while a selection gesture is in progress.
    pub fn marquee(&self) -> Option<Rect> {
        match self.mouse.gesture() {
            Gesture::Selecting => Some(self.mouse.rect()),
            _ => None,
        }
    }

    /// Line from the pending connection's source pin to the cursor.
    ///
    /// `None` when not connecting, or while the source node has no pin
    /// measurements to anchor the line to.
    pub fn pending_connection_line(&self) -> Option<((f32, f32), (f32, f32))> {
        let Gesture::Connecting(source) = self.mouse.gesture() else {
            return None;
        };
        let node = self.editor.node(source.node)?;
        let start = hit_test::output_anchor(node, source.output)?;
        Some((start, (self.mouse.x, self.mouse.y)))
    }
}
