//! Cut, copy and paste of node sub-graphs.
//!
//! The clipboard holds a detached sub-graph: the selected nodes and the edges
//! running between them. Edges with only one selected endpoint are neither
//! copied nor left behind dangling; the pin on the surviving side gets its
//! `connected` flag recomputed.
//!
//! Pasting assigns each node the smallest free id at or above its original
//! one and rewrites edge endpoints through the resulting remap table, so a
//! paste never collides with nodes already in the graph.

use crate::model::{free_id_from, EditorState, Node, NodeId, PinDirection};
use crate::selection::Selection;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A detached sub-graph, independent of undo history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clipboard {
    graph: EditorState,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.graph.nodes()
    }

    pub fn edges(&self) -> &[crate::model::Edge] {
        self.graph.edges()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

/// Split `state` into what stays (selection cleared) and what the selection
/// takes with it.
pub(crate) fn split_selection(state: &EditorState) -> (EditorState, Clipboard) {
    let selection = state.selection();

    let mut kept_nodes = BTreeMap::new();
    let mut taken_nodes = BTreeMap::new();
    for (&id, node) in state.node_map() {
        if selection.contains(id) {
            taken_nodes.insert(id, Arc::clone(node));
        } else {
            kept_nodes.insert(id, Arc::clone(node));
        }
    }

    let mut kept_edges = Vec::new();
    let mut taken_edges = Vec::new();
    let mut boundary = Vec::new();
    for edge in state.edges() {
        match (selection.contains(edge.from), selection.contains(edge.to)) {
            (true, true) => taken_edges.push(edge.clone()),
            (false, false) => kept_edges.push(edge.clone()),
            _ => boundary.push(edge),
        }
    }

    let mut remaining = EditorState::from_parts(kept_nodes, kept_edges, Selection::new());
    let mut taken = EditorState::from_parts(taken_nodes, taken_edges, Selection::new());
    for edge in boundary {
        for side in [&mut remaining, &mut taken] {
            side.refresh_pin(edge.from, PinDirection::Output, edge.output);
            side.refresh_pin(edge.to, PinDirection::Input, edge.input);
        }
    }

    (remaining, Clipboard { graph: taken })
}

/// Insert the clipboard's nodes and edges into `state`.
///
/// Returns the new state and the table mapping each clipboard id to the id it
/// was inserted under.
pub(crate) fn paste_into(
    state: &EditorState,
    clipboard: &Clipboard,
) -> (EditorState, BTreeMap<NodeId, NodeId>) {
    let mut next = state.clone();
    let mut remap = BTreeMap::new();

    let nodes = next.nodes_mut();
    for (&id, node) in clipboard.graph.node_map() {
        let new_id = free_id_from(nodes, id);
        let node = if new_id == id {
            Arc::clone(node)
        } else {
            let mut moved = Node::clone(node);
            moved.id = new_id;
            Arc::new(moved)
        };
        nodes.insert(new_id, node);
        remap.insert(id, new_id);
    }

    let edges = next.edges_mut();
    for edge in clipboard.graph.edges() {
        let mut edge = edge.clone();
        edge.from = remap.get(&edge.from).copied().unwrap_or(edge.from);
        edge.to = remap.get(&edge.to).copied().unwrap_or(edge.to);
        edges.push(edge);
    }

    (next, remap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Edge;

    /// 0 -> 1 -> 2, with 0 and 1 selected
    fn chain() -> EditorState {
        let mut state = EditorState::new(
            [
                Node::new(0, "A").with_outputs(["out"]),
                Node::new(1, "B").with_inputs(["in"]).with_outputs(["out"]),
                Node::new(2, "C").with_inputs(["in"]),
            ],
            [Edge::new(0, 0, 1, 0), Edge::new(1, 0, 2, 0)],
        );
        for (node, direction) in [
            (0, PinDirection::Output),
            (1, PinDirection::Input),
            (1, PinDirection::Output),
            (2, PinDirection::Input),
        ] {
            state.set_connected(node, direction, 0, true).unwrap();
        }
        state.selection_mut().replace_selection([0, 1]);
        state
    }

    // ========================================================================
    // split_selection() - Partition
    // ========================================================================

    #[test]
    fn test_split_moves_selected_nodes_and_internal_edges() {
        let (remaining, clipboard) = split_selection(&chain());

        assert_eq!(remaining.node_ids().collect::<Vec<_>>(), vec![2]);
        assert!(remaining.edges().is_empty());
        assert!(remaining.selection().is_empty());

        assert_eq!(clipboard.nodes().map(|n| n.id).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(clipboard.edges(), &[Edge::new(0, 0, 1, 0)]);
    }

    #[test]
    fn test_split_refreshes_pins_of_boundary_edges() {
        let (remaining, clipboard) = split_selection(&chain());

        assert!(!remaining.node(2).unwrap().inputs[0].connected);
        let b = clipboard.nodes().find(|n| n.id == 1).unwrap();
        assert!(!b.outputs[0].connected, "boundary output no longer has an edge");
        assert!(b.inputs[0].connected, "internal edge still feeds this input");
    }

    #[test]
    fn test_split_with_empty_selection_takes_nothing() {
        let mut state = chain();
        state.selection_mut().clear();
        let (remaining, clipboard) = split_selection(&state);

        assert!(clipboard.is_empty());
        assert_eq!(remaining, state);
    }

    // ========================================================================
    // paste_into() - Id remapping
    // ========================================================================

    #[test]
    fn test_paste_into_empty_graph_keeps_ids() {
        let (_, clipboard) = split_selection(&chain());
        let (pasted, remap) = paste_into(&EditorState::default(), &clipboard);

        assert_eq!(pasted.node_ids().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(remap, BTreeMap::from([(0, 0), (1, 1)]));
        assert_eq!(pasted.edges(), &[Edge::new(0, 0, 1, 0)]);
    }

    #[test]
    fn test_paste_searches_upward_past_used_ids() {
        let state = chain();
        let (_, clipboard) = split_selection(&state);
        let (pasted, remap) = paste_into(&state, &clipboard);

        // 0 -> 3 (0, 1, 2 taken), 1 -> 4 (3 now taken as well)
        assert_eq!(remap, BTreeMap::from([(0, 3), (1, 4)]));
        assert_eq!(pasted.node_count(), 5);
        assert_eq!(pasted.node(3).unwrap().id, 3);
        assert_eq!(pasted.node(4).unwrap().title, "B");
        assert_eq!(pasted.edges().last(), Some(&Edge::new(3, 0, 4, 0)));
    }

    #[test]
    fn test_paste_fills_gaps() {
        let state = EditorState::new([Node::new(0, "x"), Node::new(2, "y")], []);
        let clipboard = Clipboard {
            graph: EditorState::new([Node::new(1, "p"), Node::new(2, "q")], []),
        };
        let (_, remap) = paste_into(&state, &clipboard);
        assert_eq!(remap, BTreeMap::from([(1, 1), (2, 3)]));
    }

    #[test]
    fn test_free_id_wraps_at_top_of_id_space() {
        let nodes: BTreeMap<NodeId, Arc<Node>> = [NodeId::MAX, 0]
            .into_iter()
            .map(|id| (id, Arc::new(Node::new(id, ""))))
            .collect();
        assert_eq!(free_id_from(&nodes, NodeId::MAX), 1);
    }
}
