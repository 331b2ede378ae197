//! Application of layout measurements reported by the presentation layer.
//!
//! Sizes are set outright (last write wins). Pin reports fold into a running
//! minimum, so a node's `min_pin` only depends on the smallest offset seen,
//! not on the order the pins reported in.

use crate::error::Result;
use crate::model::{EditorState, Node, NodeId};

/// One layout result, queued by the measurement batcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// Measured size of a node's body
    Node { id: NodeId, width: f32, height: f32 },
    /// Absolute top `y` and row height of one of the node's pins
    Pin { id: NodeId, y: f32, height: f32 },
}

impl Measurement {
    pub fn node_id(&self) -> NodeId {
        match *self {
            Self::Node { id, .. } | Self::Pin { id, .. } => id,
        }
    }
}

/// Standard handler for node size reports
pub fn measure_node(node: &mut Node, width: f32, height: f32) {
    node.width = width;
    node.height = height;
}

/// Standard handler for pin position reports
pub fn measure_pin(node: &mut Node, y: f32, height: f32) {
    let offset = y - node.y;
    node.min_pin = Some(node.min_pin.map_or(offset, |current| current.min(offset)));
    node.pin_height = height;
}

/// Apply one measurement to the node it names.
pub(crate) fn apply_measurement(state: &mut EditorState, measurement: Measurement) -> Result<()> {
    let node = state.node_mut(measurement.node_id())?;
    match measurement {
        Measurement::Node { width, height, .. } => measure_node(node, width, height),
        Measurement::Pin { y, height, .. } => measure_pin(node, y, height),
    }
    Ok(())
}
