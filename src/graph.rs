//! The top-level immutable [`GraphState`] value.
//!
//! Every operation takes `&self` and returns the next value; the previous one
//! stays valid and is what the history stacks hold on to. Cloning is cheap
//! (a handful of `Arc` bumps) so hosts can keep as many values as they like.

use crate::clipboard::{self, Clipboard};
use crate::config::EditorConfig;
use crate::error::{GraphError, Result};
use crate::history::History;
use crate::interaction::{MenuState, MouseState};
use crate::model::{Edge, EditorState, Node, NodeId, PinDirection};
use crate::state::{self, Measurement};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct GraphState {
    pub(crate) editor: EditorState,
    pub(crate) history: History,
    pub(crate) mouse: MouseState,
    pub(crate) menu: MenuState,
    pub(crate) clipboard: Clipboard,
    /// Snapshot from before the first uncommitted edit of a gesture.
    /// The next commit records this instead of the current state, so one
    /// undo step reverts the whole gesture.
    pub(crate) baseline: Option<EditorState>,
    pub(crate) config: Arc<EditorConfig>,
}

impl GraphState {
    pub fn create_empty() -> Self {
        Self::default()
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            config: Arc::new(config),
            ..Self::default()
        }
    }

    /// Start from an initial node and edge set.
    ///
    /// Fails with a not-found error when an edge names a missing node or pin.
    pub fn from_graph<N, E>(nodes: N, edges: E) -> Result<Self>
    where
        N: IntoIterator<Item = Node>,
        E: IntoIterator<Item = Edge>,
    {
        let editor = EditorState::new(nodes, edges);
        editor.validate()?;
        Ok(Self {
            editor,
            ..Self::default()
        })
    }

    /// Same graph, different configuration. History and transient state are kept.
    pub fn reconfigured(&self, config: EditorConfig) -> Self {
        Self {
            config: Arc::new(config),
            ..self.clone()
        }
    }

    // === Accessors ===

    pub fn editor_state(&self) -> &EditorState {
        &self.editor
    }

    pub fn mouse_state(&self) -> &MouseState {
        &self.mouse
    }

    pub fn menu_state(&self) -> &MenuState {
        &self.menu
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.editor.selection().contains(id)
    }

    pub fn selected_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.editor
            .selection()
            .iter()
            .filter_map(|id| self.editor.node(id))
    }

    // === History plumbing ===

    /// Make `next` current and record one undo entry for it.
    ///
    /// Undoing the entry returns to the current state. Uncommitted gesture
    /// edits are settled into their own entry first.
    pub(crate) fn commit(&self, next: EditorState) -> Self {
        let settled = self.settle_gesture();
        debug!(
            undo_depth = settled.history.undo_stack().len() + 1,
            "committing editor state"
        );
        Self {
            history: settled
                .history
                .commit(settled.editor.clone(), self.config.clear_redo_on_commit),
            editor: next,
            ..settled
        }
    }

    /// Finish a gesture: make `next` current and record one undo entry that
    /// returns to the state from before the gesture began.
    pub(crate) fn commit_gesture(&self, next: EditorState) -> Self {
        let base = self.baseline.clone().unwrap_or_else(|| self.editor.clone());
        debug!(
            undo_depth = self.history.undo_stack().len() + 1,
            "committing gesture"
        );
        Self {
            history: self.history.commit(base, self.config.clear_redo_on_commit),
            editor: next,
            baseline: None,
            ..self.clone()
        }
    }

    /// Make `next` current without an undo entry, remembering where the
    /// gesture started.
    pub(crate) fn transient(&self, next: EditorState) -> Self {
        Self {
            baseline: Some(self.baseline.clone().unwrap_or_else(|| self.editor.clone())),
            editor: next,
            ..self.clone()
        }
    }

    /// True while a gesture has changed the graph without committing yet.
    pub fn has_uncommitted_gesture(&self) -> bool {
        self.baseline.is_some()
    }

    /// Record the uncommitted edits of an abandoned gesture as one undo
    /// entry. Returns an identical value when there are none.
    pub fn settle_gesture(&self) -> Self {
        match self.baseline {
            Some(_) => self.commit_gesture(self.editor.clone()),
            None => self.clone(),
        }
    }

    /// Step back one committed edit. A no-op when there is nothing to undo.
    pub fn undo(&self) -> Self {
        match self.history.undo(self.editor.clone()) {
            Some((editor, history)) => {
                debug!(undo_depth = history.undo_stack().len(), "undo");
                Self {
                    editor,
                    history,
                    baseline: None,
                    ..self.clone()
                }
            }
            None => self.clone(),
        }
    }

    pub fn redo(&self) -> Self {
        match self.history.redo(self.editor.clone()) {
            Some((editor, history)) => {
                debug!(redo_depth = history.redo_stack().len(), "redo");
                Self {
                    editor,
                    history,
                    baseline: None,
                    ..self.clone()
                }
            }
            None => self.clone(),
        }
    }

    // === Nodes ===

    /// Insert `node` at the context menu's anchor under a fresh id.
    ///
    /// The template's own id and position are ignored. Ids are one past the
    /// largest id in use, so they never collide after deletions.
    pub fn add_node(&self, node: Node) -> Self {
        let id = self.editor.next_node_id();
        let node = Node {
            id,
            x: self.menu.x,
            y: self.menu.y,
            ..node
        };
        debug!(id, title = %node.title, "adding node");

        let mut next = self.editor.clone();
        next.nodes_mut().insert(id, Arc::new(node));
        self.commit(next)
    }

    /// Move node `id` to `(x, y)`.
    ///
    /// A selected node drags the whole selection along by the same delta;
    /// an unselected one becomes the only selected node first. Only a
    /// `commit` move records an undo entry, covering every uncommitted move
    /// before it.
    pub fn move_node(&self, id: NodeId, x: f32, y: f32, commit: bool) -> Result<Self> {
        let node = self.editor.require_node(id)?;
        let mut next = self.editor.clone();

        if self.is_selected(id) {
            let dx = x - node.x;
            let dy = y - node.y;
            let selected: Vec<NodeId> = self.editor.selection().iter().collect();
            for sid in selected {
                if let Ok(n) = next.node_mut(sid) {
                    n.x += dx;
                    n.y += dy;
                }
            }
        } else {
            next.selection_mut().replace_selection([id]);
            let n = next.node_mut(id)?;
            n.x = x;
            n.y = y;
        }

        Ok(if commit {
            self.commit_gesture(next)
        } else {
            self.transient(next)
        })
    }

    /// Rewrite every node without recording an undo entry.
    pub fn map_nodes<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&Node) -> Node,
    {
        let mut next = self.editor.clone();
        for node in next.nodes_mut().values_mut() {
            let id = node.id;
            let mapped = f(node);
            *node = Arc::new(Node { id, ..mapped });
        }
        Self {
            editor: next,
            ..self.clone()
        }
    }

    // === Selection ===

    pub fn select_node(&self, id: NodeId, additive: bool) -> Result<Self> {
        self.editor.require_node(id)?;
        let mut next = self.editor.clone();
        next.selection_mut().handle_interaction(id, additive);
        Ok(self.commit(next))
    }

    pub fn select_all(&self) -> Self {
        let mut next = self.editor.clone();
        let ids: Vec<NodeId> = next.node_ids().collect();
        next.selection_mut().replace_selection(ids);
        self.commit(next)
    }

    /// Deselect everything. Returns an identical value when nothing is selected.
    pub fn clear_selection(&self) -> Self {
        if self.editor.selection().is_empty() {
            return self.clone();
        }
        let mut next = self.editor.clone();
        next.selection_mut().clear();
        self.commit(next)
    }

    /// Remove the selected nodes and every edge touching them.
    pub fn delete_selection(&self) -> Self {
        if self.editor.selection().is_empty() {
            return self.clone();
        }
        let (remaining, removed) = clipboard::split_selection(&self.editor);
        debug!(nodes = removed.node_count(), "deleting selection");
        self.commit(remaining)
    }

    // === Clipboard ===

    /// Move the selection into the clipboard. The graph change is one undo
    /// entry; the clipboard itself is not part of history.
    ///
    /// Returns an identical value when nothing is selected.
    pub fn cut(&self) -> Self {
        if self.editor.selection().is_empty() {
            return self.clone();
        }
        let (remaining, clipboard) = clipboard::split_selection(&self.editor);
        debug!(nodes = clipboard.node_count(), "cut");
        Self {
            clipboard,
            ..self.commit(remaining)
        }
    }

    /// Copy the selection into the clipboard. An empty selection leaves the
    /// clipboard as it was.
    pub fn copy(&self) -> Self {
        if self.editor.selection().is_empty() {
            return self.clone();
        }
        let (_, clipboard) = clipboard::split_selection(&self.editor);
        debug!(nodes = clipboard.node_count(), "copy");
        Self {
            clipboard,
            ..self.clone()
        }
    }

    /// Insert the clipboard's contents under ids that do not collide with
    /// the current graph.
    pub fn paste(&self) -> Self {
        let (next, remap) = clipboard::paste_into(&self.editor, &self.clipboard);
        debug!(?remap, "paste");
        self.commit(next)
    }

    // === Edges ===

    /// Connect output `output` of `from` to input `input` of `to`.
    ///
    /// An input takes at most one edge: any edge already ending there is
    /// replaced, and its source pin is marked disconnected if nothing else
    /// uses it.
    pub fn add_link(&self, from: NodeId, output: usize, to: NodeId, input: usize) -> Result<Self> {
        if output >= self.editor.require_node(from)?.outputs.len() {
            return Err(GraphError::OutputNotFound { node: from, index: output });
        }
        if input >= self.editor.require_node(to)?.inputs.len() {
            return Err(GraphError::InputNotFound { node: to, index: input });
        }

        let mut next = self.editor.clone();
        let edges = next.edges_mut();
        let superseded: Vec<Edge> = edges
            .iter()
            .filter(|e| e.targets(to, input))
            .cloned()
            .collect();
        edges.retain(|e| !e.targets(to, input));
        edges.push(Edge::new(from, output, to, input).with_color(self.config.default_edge_color.clone()));

        next.set_connected(from, PinDirection::Output, output, true)?;
        next.set_connected(to, PinDirection::Input, input, true)?;
        for old in superseded {
            debug!(from = old.from, output = old.output, to, input, "replacing edge");
            next.refresh_pin(old.from, PinDirection::Output, old.output);
        }

        Ok(self.commit(next))
    }

    // === Context menu ===

    pub fn open_menu(&self, x: f32, y: f32) -> Self {
        Self {
            menu: MenuState { open: true, x, y },
            ..self.clone()
        }
    }

    pub fn close_menu(&self) -> Self {
        Self {
            menu: MenuState {
                open: false,
                ..self.menu
            },
            ..self.clone()
        }
    }

    // === Layout feedback ===

    pub fn measure_node(&self, id: NodeId, width: f32, height: f32) -> Result<Self> {
        self.apply_measurement(Measurement::Node { id, width, height })
    }

    pub fn measure_pin(&self, id: NodeId, y: f32, height: f32) -> Result<Self> {
        self.apply_measurement(Measurement::Pin { id, y, height })
    }

    fn apply_measurement(&self, measurement: Measurement) -> Result<Self> {
        let (next, skipped) = self.apply_measurements(std::iter::once(measurement));
        match skipped.first() {
            Some(m) => Err(GraphError::NodeNotFound(m.node_id())),
            None => Ok(next),
        }
    }

    /// Fold a batch of measurements into one new value.
    ///
    /// Layout facts are not edits: they update the current state (and the
    /// pending gesture baseline) without touching history. Measurements
    /// naming nodes that no longer exist are returned instead of applied.
    pub fn apply_measurements<I>(&self, measurements: I) -> (Self, Vec<Measurement>)
    where
        I: IntoIterator<Item = Measurement>,
    {
        let mut editor = self.editor.clone();
        let mut baseline = self.baseline.clone();
        let mut skipped = Vec::new();

        for measurement in measurements {
            if state::apply_measurement(&mut editor, measurement).is_err() {
                warn!(node = measurement.node_id(), "measurement for unknown node skipped");
                skipped.push(measurement);
                continue;
            }
            if let Some(base) = baseline.as_mut() {
                // The node may be newer than the gesture; nothing to update then.
                let _ = state::apply_measurement(base, measurement);
            }
        }

        (
            Self {
                editor,
                baseline,
                ..self.clone()
            },
            skipped,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pin;

    fn pair() -> GraphState {
        GraphState::from_graph(
            [
                Node::new(0, "A").at(0.0, 0.0).with_outputs(["out"]),
                Node::new(1, "B").at(200.0, 0.0).with_inputs(["in"]),
                Node::new(2, "C").at(0.0, 200.0).with_outputs(["out"]),
            ],
            [],
        )
        .unwrap()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    #[test]
    fn test_create_empty() {
        let state = GraphState::create_empty();
        assert_eq!(state.editor_state().node_count(), 0);
        assert!(!state.can_undo());
        assert!(!state.can_redo());
        assert!(!state.menu_state().open);
    }

    #[test]
    fn test_from_graph_rejects_dangling_edges() {
        let result = GraphState::from_graph([Node::new(0, "A")], [Edge::new(0, 0, 1, 0)]);
        assert!(result.is_err());
    }

    // ========================================================================
    // add_node()
    // ========================================================================

    #[test]
    fn test_add_node_uses_menu_anchor_and_fresh_id() {
        let state = pair().open_menu(40.0, 60.0).add_node(Node::new(99, "New").with_inputs(["x"]));
        let node = state.editor_state().node(3).unwrap();

        assert_eq!(node.id, 3);
        assert_eq!((node.x, node.y), (40.0, 60.0));
        assert_eq!(node.inputs, vec![Pin::new("x")]);
        assert!(state.can_undo());
    }

    #[test]
    fn test_add_node_after_gap_does_not_collide() {
        let mut state = pair();
        state = state.select_node(1, false).unwrap().delete_selection();
        // ids 0 and 2 remain; a count-based id would reuse 2
        let state = state.add_node(Node::new(0, "New"));
        assert_eq!(state.editor_state().node_count(), 3);
        assert_eq!(state.editor_state().node(3).unwrap().title, "New");
        assert_eq!(state.editor_state().node(2).unwrap().title, "C");
    }

    #[test]
    fn test_add_node_when_max_id_taken_keeps_existing_node() {
        let state = GraphState::from_graph([Node::new(NodeId::MAX, "Top")], []).unwrap();
        let state = state.add_node(Node::new(0, "New"));

        assert_eq!(state.editor_state().node_count(), 2);
        assert_eq!(state.editor_state().node(NodeId::MAX).unwrap().title, "Top");
        assert_eq!(state.editor_state().node(0).unwrap().title, "New");
    }

    // ========================================================================
    // move_node()
    // ========================================================================

    #[test]
    fn test_move_unselected_node_collapses_selection() {
        let state = pair().select_node(0, false).unwrap();
        let state = state.move_node(1, 210.0, 5.0, false).unwrap();

        assert_eq!(state.editor_state().selection().iter().collect::<Vec<_>>(), vec![1]);
        let b = state.editor_state().node(1).unwrap();
        assert_eq!((b.x, b.y), (210.0, 5.0));
        assert_eq!(state.editor_state().node(0).unwrap().x, 0.0);
    }

    #[test]
    fn test_move_selected_node_drags_selection() {
        let state = pair()
            .select_node(0, false)
            .unwrap()
            .select_node(2, true)
            .unwrap();
        let state = state.move_node(0, 10.0, 20.0, false).unwrap();

        let editor = state.editor_state();
        assert_eq!(editor.node(0).unwrap().rect().0, 10.0);
        assert_eq!(editor.node(2).unwrap().rect().0, 10.0);
        assert_eq!(editor.node(2).unwrap().y, 220.0);
        assert_eq!(editor.node(1).unwrap().x, 200.0, "unselected node stays");
    }

    #[test]
    fn test_uncommitted_moves_share_one_undo_entry() {
        let start = pair().select_node(0, false).unwrap();
        let depth = start.history().undo_stack().len();

        let state = start
            .move_node(0, 5.0, 5.0, false)
            .unwrap()
            .move_node(0, 10.0, 10.0, false)
            .unwrap()
            .move_node(0, 15.0, 15.0, true)
            .unwrap();

        assert_eq!(state.history().undo_stack().len(), depth + 1);
        assert_eq!(state.undo().editor_state(), start.editor_state());
    }

    #[test]
    fn test_move_unknown_node_is_not_found() {
        assert!(matches!(
            pair().move_node(42, 0.0, 0.0, true),
            Err(GraphError::NodeNotFound(42))
        ));
    }

    // ========================================================================
    // Selection operations
    // ========================================================================

    #[test]
    fn test_select_all_and_clear() {
        let state = pair().select_all();
        assert_eq!(state.selected_nodes().count(), 3);

        let cleared = state.clear_selection();
        assert!(cleared.editor_state().selection().is_empty());
        assert_eq!(cleared.undo().editor_state(), state.editor_state());
    }

    #[test]
    fn test_clear_empty_selection_adds_no_history() {
        let state = pair().clear_selection();
        assert!(!state.can_undo());
    }

    #[test]
    fn test_select_unknown_node_is_not_found() {
        assert!(pair().select_node(7, false).is_err());
    }

    #[test]
    fn test_delete_selection_removes_touching_edges() {
        let state = pair().add_link(0, 0, 1, 0).unwrap();
        let state = state.select_node(0, false).unwrap().delete_selection();

        let editor = state.editor_state();
        assert!(!editor.contains_node(0));
        assert!(editor.edges().is_empty());
        assert!(!editor.node(1).unwrap().inputs[0].connected);
        assert!(editor.validate().is_ok());
    }

    // ========================================================================
    // cut() / copy()
    // ========================================================================

    #[test]
    fn test_cut_and_copy_with_empty_selection_keep_clipboard() {
        let copied = pair().select_node(1, false).unwrap().copy().clear_selection();
        let depth = copied.history().undo_stack().len();

        let cut = copied.cut();
        assert_eq!(cut.clipboard(), copied.clipboard());
        assert_eq!(cut.clipboard().node_count(), 1);
        assert_eq!(cut.history().undo_stack().len(), depth);
        assert_eq!(cut.editor_state(), copied.editor_state());

        let copy = copied.copy();
        assert_eq!(copy.clipboard(), copied.clipboard());
        assert_eq!(copy.history().undo_stack().len(), depth);
    }

    // ========================================================================
    // add_link()
    // ========================================================================

    #[test]
    fn test_add_link_marks_pins_connected() {
        let state = pair().add_link(0, 0, 1, 0).unwrap();
        let editor = state.editor_state();

        assert_eq!(editor.edges(), &[Edge::new(0, 0, 1, 0)]);
        assert!(editor.node(0).unwrap().outputs[0].connected);
        assert!(editor.node(1).unwrap().inputs[0].connected);
    }

    #[test]
    fn test_add_link_replaces_edge_on_same_input() {
        let state = pair().add_link(0, 0, 1, 0).unwrap().add_link(2, 0, 1, 0).unwrap();
        let editor = state.editor_state();

        let incoming: Vec<&Edge> = editor.edges().iter().filter(|e| e.targets(1, 0)).collect();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].from, 2);
        assert!(!editor.node(0).unwrap().outputs[0].connected);
        assert!(editor.node(2).unwrap().outputs[0].connected);
    }

    #[test]
    fn test_add_link_uses_configured_color() {
        let state = pair()
            .reconfigured(EditorConfig::default().with_edge_color("#f80"))
            .add_link(0, 0, 1, 0)
            .unwrap();
        assert_eq!(state.editor_state().edges()[0].color, "#f80");
    }

    #[test]
    fn test_add_link_validates_indices() {
        assert!(matches!(
            pair().add_link(0, 1, 1, 0),
            Err(GraphError::OutputNotFound { node: 0, index: 1 })
        ));
        assert!(matches!(
            pair().add_link(0, 0, 1, 3),
            Err(GraphError::InputNotFound { node: 1, index: 3 })
        ));
        assert!(matches!(pair().add_link(0, 0, 9, 0), Err(GraphError::NodeNotFound(9))));
    }

    // ========================================================================
    // Menu
    // ========================================================================

    #[test]
    fn test_open_and_close_menu() {
        let state = pair().open_menu(12.0, 34.0);
        assert_eq!(*state.menu_state(), MenuState { open: true, x: 12.0, y: 34.0 });

        let closed = state.close_menu();
        assert!(!closed.menu_state().open);
        assert_eq!(closed.menu_state().x, 12.0);
        assert!(!closed.can_undo(), "menu changes are not history");
    }

    // ========================================================================
    // Undo / redo
    // ========================================================================

    #[test]
    fn test_undo_redo_on_empty_stacks_is_identity() {
        let state = pair();
        assert_eq!(state.undo().editor_state(), state.editor_state());
        assert_eq!(state.redo().editor_state(), state.editor_state());
    }

    #[test]
    fn test_commit_after_undo_keeps_redo_by_default() {
        let state = pair().select_node(0, false).unwrap().undo();
        assert!(state.can_redo());
        let state = state.select_node(1, false).unwrap();
        assert!(state.can_redo());
    }

    #[test]
    fn test_commit_after_undo_clears_redo_when_configured() {
        let state = pair()
            .reconfigured(EditorConfig::default().with_clear_redo_on_commit(true))
            .select_node(0, false)
            .unwrap()
            .undo();
        let state = state.select_node(1, false).unwrap();
        assert!(!state.can_redo());
    }

    // ========================================================================
    // Measurements
    // ========================================================================

    #[test]
    fn test_measurements_do_not_touch_history() {
        let state = pair().measure_node(0, 100.0, 40.0).unwrap();
        assert!(!state.can_undo());
        assert_eq!(state.editor_state().node(0).unwrap().width, 100.0);
    }

    #[test]
    fn test_measure_unknown_node_is_not_found() {
        assert!(matches!(pair().measure_pin(8, 0.0, 10.0), Err(GraphError::NodeNotFound(8))));
    }

    #[test]
    fn test_measurement_during_gesture_survives_commit_and_undo() {
        let start = pair().select_node(0, false).unwrap();
        let dragged = start.move_node(0, 50.0, 50.0, false).unwrap();
        let measured = dragged.measure_node(0, 90.0, 30.0).unwrap();
        let committed = measured.move_node(0, 60.0, 60.0, true).unwrap();

        let undone = committed.undo();
        let node = undone.editor_state().node(0).unwrap();
        assert_eq!((node.x, node.y), (0.0, 0.0));
        assert_eq!(node.width, 90.0);
    }

    // ========================================================================
    // map_nodes()
    // ========================================================================

    #[test]
    fn test_map_nodes_keeps_ids() {
        let state = pair().map_nodes(|n| Node {
            id: 1000,
            title: n.title.to_lowercase(),
            ..n.clone()
        });
        let titles: Vec<(NodeId, String)> = state
            .editor_state()
            .nodes()
            .map(|n| (n.id, n.title.clone()))
            .collect();
        assert_eq!(titles, vec![(0, "a".into()), (1, "b".into()), (2, "c".into())]);
        assert!(!state.can_undo());
    }
}
