//! The serialized form of a graph, for hosts that persist or transfer it.
//!
//! Only the committed [`EditorState`] crosses this boundary. Pointer and
//! menu state, history and the clipboard reset to their defaults on
//! [`GraphState::restore`]. Node ids are stringified map keys; fields missing
//! from a record take their defaults, and a `null` `minPin` means the node's
//! pins have not been measured.

use crate::error::{GraphError, Result};
use crate::graph::GraphState;
use crate::model::{Data, Edge, EditorState, Node, NodeId, Pin, DEFAULT_EDGE_COLOR};
use crate::selection::Selection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SavedPin {
    pub name: String,
    pub connected: bool,
    pub data: Data,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SavedNode {
    pub title: String,
    pub data: Data,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_pin: Option<f32>,
    pub pin_height: f32,
    pub inputs: Vec<SavedPin>,
    pub outputs: Vec<SavedPin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedEdge {
    pub from: NodeId,
    pub output: usize,
    pub to: NodeId,
    pub input: usize,
    #[serde(default = "default_edge_color")]
    pub color: String,
}

fn default_edge_color() -> String {
    DEFAULT_EDGE_COLOR.to_owned()
}

/// A graph in its plain, serializable form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedGraph {
    pub nodes: BTreeMap<String, SavedNode>,
    pub edges: Vec<SavedEdge>,
    pub selection: Vec<NodeId>,
}

impl From<&Pin> for SavedPin {
    fn from(pin: &Pin) -> Self {
        Self {
            name: pin.name.clone(),
            connected: pin.connected,
            data: pin.data.clone(),
        }
    }
}

impl From<SavedPin> for Pin {
    fn from(pin: SavedPin) -> Self {
        Self {
            name: pin.name,
            connected: pin.connected,
            data: pin.data,
        }
    }
}

impl From<&Node> for SavedNode {
    fn from(node: &Node) -> Self {
        Self {
            title: node.title.clone(),
            data: node.data.clone(),
            x: node.x,
            y: node.y,
            width: node.width,
            height: node.height,
            min_pin: node.min_pin,
            pin_height: node.pin_height,
            inputs: node.inputs.iter().map(SavedPin::from).collect(),
            outputs: node.outputs.iter().map(SavedPin::from).collect(),
        }
    }
}

impl SavedNode {
    fn into_node(self, id: NodeId) -> Node {
        Node {
            id,
            title: self.title,
            data: self.data,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            min_pin: self.min_pin,
            pin_height: self.pin_height,
            inputs: self.inputs.into_iter().map(Pin::from).collect(),
            outputs: self.outputs.into_iter().map(Pin::from).collect(),
        }
    }
}

impl From<&Edge> for SavedEdge {
    fn from(edge: &Edge) -> Self {
        Self {
            from: edge.from,
            output: edge.output,
            to: edge.to,
            input: edge.input,
            color: edge.color.clone(),
        }
    }
}

impl From<SavedEdge> for Edge {
    fn from(edge: SavedEdge) -> Self {
        Edge::new(edge.from, edge.output, edge.to, edge.input).with_color(edge.color)
    }
}

impl From<&EditorState> for SavedGraph {
    fn from(state: &EditorState) -> Self {
        Self {
            nodes: state
                .nodes()
                .map(|node| (node.id.to_string(), SavedNode::from(node)))
                .collect(),
            edges: state.edges().iter().map(SavedEdge::from).collect(),
            selection: state.selection().iter().collect(),
        }
    }
}

impl TryFrom<SavedGraph> for EditorState {
    type Error = GraphError;

    /// Rebuild a snapshot, checking that every reference resolves.
    fn try_from(saved: SavedGraph) -> Result<Self> {
        let mut nodes = BTreeMap::new();
        for (key, node) in saved.nodes {
            let id: NodeId = key.trim().parse().map_err(|_| GraphError::InvalidNodeKey(key.clone()))?;
            nodes.insert(id, Arc::new(node.into_node(id)));
        }
        let edges = saved.edges.into_iter().map(Edge::from).collect();
        let selection: Selection = saved.selection.into_iter().collect();

        let state = EditorState::from_parts(nodes, edges, selection);
        state.validate()?;
        Ok(state)
    }
}

impl GraphState {
    pub fn save(&self) -> SavedGraph {
        SavedGraph::from(&self.editor)
    }

    /// Start a fresh editing session from a saved graph.
    pub fn restore(saved: SavedGraph) -> Result<Self> {
        let editor = EditorState::try_from(saved)?;
        debug!(nodes = editor.node_count(), edges = editor.edges().len(), "restored graph");
        Ok(Self {
            editor,
            ..Self::default()
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.save())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::restore(serde_json::from_str(json)?)
    }
}
