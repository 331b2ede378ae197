//! Value types for the committed graph: [`Pin`], [`Node`], [`Edge`] and the
//! undo-granularity snapshot [`EditorState`].
//!
//! Constructors do no validation. The operations on
//! [`GraphState`](crate::GraphState) are what keep a snapshot consistent.
//!
//! `EditorState` shares structure between snapshots: the node map and edge
//! list sit behind `Arc`s and every node is its own `Arc`, so cloning a
//! snapshot copies three pointers and editing one node copies the map's
//! pointers but no other node. The presentation layer can compare
//! [`EditorState::node_handle`] results with `Arc::ptr_eq` to skip nodes that
//! did not change.

use crate::error::{GraphError, Result};
use crate::selection::Selection;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Node identifier, unique within one graph.
pub type NodeId = u32;

/// Opaque string-keyed payload carried by pins and nodes.
pub type Data = BTreeMap<String, String>;

/// Colour given to edges when nothing else is configured.
pub const DEFAULT_EDGE_COLOR: &str = "#fff";

/// Which pin sequence of a node a pin belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinDirection {
    Input,
    Output,
}

impl fmt::Display for PinDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// A named connection point on a node.
///
/// Edges refer to pins by index, the name only resolves a pin to its index
/// when a gesture lands on it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pin {
    pub name: String,
    pub connected: bool,
    pub data: Data,
}

impl Pin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub id: NodeId,
    pub title: String,
    pub data: Data,

    pub x: f32,
    pub y: f32,
    /// Measured size, zero until the presentation layer reports it
    pub width: f32,
    pub height: f32,

    /// Offset from the node's top edge to its topmost pin row.
    /// `None` until the first pin on this node has been measured.
    pub min_pin: Option<f32>,
    pub pin_height: f32,

    pub inputs: Vec<Pin>,
    pub outputs: Vec<Pin>,
}

impl Node {
    pub fn new(id: NodeId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_inputs<I, P>(mut self, pins: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Pin>,
    {
        self.inputs = pins.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_outputs<I, P>(mut self, pins: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Pin>,
    {
        self.outputs = pins.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn pins(&self, direction: PinDirection) -> &[Pin] {
        match direction {
            PinDirection::Input => &self.inputs,
            PinDirection::Output => &self.outputs,
        }
    }

    pub(crate) fn pins_mut(&mut self, direction: PinDirection) -> &mut Vec<Pin> {
        match direction {
            PinDirection::Input => &mut self.inputs,
            PinDirection::Output => &mut self.outputs,
        }
    }

    /// Resolve a pin name to its index in the given sequence.
    pub fn pin_index(&self, direction: PinDirection, name: &str) -> Result<usize> {
        self.pins(direction)
            .iter()
            .position(|pin| pin.name == name)
            .ok_or_else(|| GraphError::PinNameNotFound {
                node: self.id,
                direction,
                name: name.to_owned(),
            })
    }

    /// Pins are only worth measuring once the node itself has been laid out.
    pub fn accepts_pin_measurement(&self) -> bool {
        self.height > 0.0
    }

    /// Axis-aligned box as `(x, y, width, height)`.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        (self.x, self.y, self.width, self.height)
    }
}

impl From<&str> for Pin {
    fn from(name: &str) -> Self {
        Pin::new(name)
    }
}

impl From<String> for Pin {
    fn from(name: String) -> Self {
        Pin::new(name)
    }
}

/// A directed connection from an output pin to an input pin.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: NodeId,
    pub output: usize,
    pub to: NodeId,
    pub input: usize,
    pub color: String,
}

impl Edge {
    pub fn new(from: NodeId, output: usize, to: NodeId, input: usize) -> Self {
        Self {
            from,
            output,
            to,
            input,
            color: DEFAULT_EDGE_COLOR.to_owned(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Stable key for the presentation layer's edge list.
    pub fn key(&self) -> String {
        format!("{}:{}-{}:{}", self.from, self.output, self.to, self.input)
    }

    pub fn targets(&self, to: NodeId, input: usize) -> bool {
        self.to == to && self.input == input
    }

    pub fn touches(&self, id: NodeId) -> bool {
        self.from == id || self.to == id
    }

    pub(crate) fn uses_pin(&self, node: NodeId, direction: PinDirection, index: usize) -> bool {
        match direction {
            PinDirection::Output => self.from == node && self.output == index,
            PinDirection::Input => self.to == node && self.input == index,
        }
    }
}

/// The committed, undo-trackable snapshot of nodes, edges and selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditorState {
    nodes: Arc<BTreeMap<NodeId, Arc<Node>>>,
    edges: Arc<Vec<Edge>>,
    selection: Selection,
}

impl EditorState {
    pub fn new<N, E>(nodes: N, edges: E) -> Self
    where
        N: IntoIterator<Item = Node>,
        E: IntoIterator<Item = Edge>,
    {
        Self {
            nodes: Arc::new(nodes.into_iter().map(|n| (n.id, Arc::new(n))).collect()),
            edges: Arc::new(edges.into_iter().collect()),
            selection: Selection::new(),
        }
    }

    pub(crate) fn from_parts(
        nodes: BTreeMap<NodeId, Arc<Node>>,
        edges: Vec<Edge>,
        selection: Selection,
    ) -> Self {
        Self {
            nodes: Arc::new(nodes),
            edges: Arc::new(edges),
            selection,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id).map(|n| n.as_ref())
    }

    /// Shared handle to a node, for identity-based change detection.
    pub fn node_handle(&self, id: NodeId) -> Option<&Arc<Node>> {
        self.nodes.get(&id)
    }

    pub fn require_node(&self, id: NodeId) -> Result<&Node> {
        self.node(id).ok_or(GraphError::NodeNotFound(id))
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values().map(|n| n.as_ref())
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// True when both snapshots share the same node map allocation.
    pub fn shares_nodes_with(&self, other: &EditorState) -> bool {
        Arc::ptr_eq(&self.nodes, &other.nodes)
    }

    /// One past the largest id in use, so fresh ids never collide after deletions.
    ///
    /// Once `NodeId::MAX` is taken this falls back to the smallest free id.
    pub fn next_node_id(&self) -> NodeId {
        match self.nodes.keys().next_back() {
            None => 0,
            Some(&max) => max
                .checked_add(1)
                .unwrap_or_else(|| free_id_from(&self.nodes, 0)),
        }
    }

    pub(crate) fn node_map(&self) -> &BTreeMap<NodeId, Arc<Node>> {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut BTreeMap<NodeId, Arc<Node>> {
        Arc::make_mut(&mut self.nodes)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes_mut()
            .get_mut(&id)
            .map(Arc::make_mut)
            .ok_or(GraphError::NodeNotFound(id))
    }

    pub(crate) fn edges_mut(&mut self) -> &mut Vec<Edge> {
        Arc::make_mut(&mut self.edges)
    }

    pub(crate) fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub(crate) fn set_connected(
        &mut self,
        node: NodeId,
        direction: PinDirection,
        index: usize,
        connected: bool,
    ) -> Result<()> {
        let node_ref = self.node_mut(node)?;
        let pin = node_ref
            .pins_mut(direction)
            .get_mut(index)
            .ok_or(match direction {
                PinDirection::Input => GraphError::InputNotFound { node, index },
                PinDirection::Output => GraphError::OutputNotFound { node, index },
            })?;
        pin.connected = connected;
        Ok(())
    }

    /// Recompute a pin's `connected` flag from the edges that remain.
    /// Pins on nodes that are no longer present are ignored.
    pub(crate) fn refresh_pin(&mut self, node: NodeId, direction: PinDirection, index: usize) {
        if !self.contains_node(node) {
            return;
        }
        let in_use = self.edges.iter().any(|e| e.uses_pin(node, direction, index));
        // Best effort: an out-of-range index has nothing to refresh.
        let _ = self.set_connected(node, direction, index, in_use);
    }

    /// Verify that every edge endpoint, pin index and selected id resolves.
    pub fn validate(&self) -> Result<()> {
        for edge in self.edges.iter() {
            let from = self.require_node(edge.from)?;
            if edge.output >= from.outputs.len() {
                return Err(GraphError::OutputNotFound {
                    node: edge.from,
                    index: edge.output,
                });
            }
            let to = self.require_node(edge.to)?;
            if edge.input >= to.inputs.len() {
                return Err(GraphError::InputNotFound {
                    node: edge.to,
                    index: edge.input,
                });
            }
        }
        for id in self.selection.iter() {
            self.require_node(id)?;
        }
        Ok(())
    }
}

/// Smallest id at or above `start` that `nodes` does not use yet.
pub(crate) fn free_id_from(nodes: &BTreeMap<NodeId, Arc<Node>>, start: NodeId) -> NodeId {
    let mut candidate = start;
    while nodes.contains_key(&candidate) {
        candidate = match candidate.checked_add(1) {
            Some(next) => next,
            // Ran off the top of the id space, fall back to probing from zero
            None => return free_id_from(nodes, 0),
        };
    }
    candidate
}
