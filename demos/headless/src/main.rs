//! Scripted editing session against the graph engine, with no UI.
//!
//! Plays the part of a presentation layer: it reports layout after every
//! change, feeds pointer events through the controller and prints the saved
//! graph at the end. Set `RUST_LOG=node_graph_core=debug` to follow the
//! transitions.

use node_graph_core::{CanvasTarget, GraphController, GraphState, Node, NodeId, Result};
use std::cell::Cell;
use std::rc::Rc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const NODE_WIDTH: f32 = 140.0;
const ROW_HEIGHT: f32 = 18.0;
const HEADER: f32 = 28.0;

/// Stand-in for a renderer: sizes every node from its pin count.
fn layout_pass(ctrl: &GraphController) {
    let state = ctrl.value();
    for node in state.editor_state().nodes() {
        let rows = node.inputs.len().max(node.outputs.len());
        ctrl.measure_node(node.id, NODE_WIDTH, HEADER + rows as f32 * ROW_HEIGHT + 8.0);
        for row in 0..rows {
            ctrl.measure_pin(node.id, node.y + HEADER + row as f32 * ROW_HEIGHT, ROW_HEIGHT);
        }
    }
    ctrl.frame();
}

fn summary(state: &GraphState) -> String {
    let editor = state.editor_state();
    let selected: Vec<NodeId> = editor.selection().iter().collect();
    format!(
        "{} nodes, {} edges, selected {:?}, undo {} / redo {}",
        editor.node_count(),
        editor.edges().len(),
        selected,
        state.history().undo_stack().len(),
        state.history().redo_stack().len(),
    )
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let initial = GraphState::from_graph(
        [
            Node::new(0, "Texture").at(40.0, 40.0).with_outputs(["rgb", "alpha"]),
            Node::new(1, "Multiply").at(300.0, 60.0).with_inputs(["a", "b"]).with_outputs(["out"]),
            Node::new(2, "Output").at(560.0, 80.0).with_inputs(["color"]),
        ],
        [],
    )?;
    let ctrl = GraphController::new(initial);

    let transitions = Rc::new(Cell::new(0usize));
    ctrl.on_change({
        let transitions = transitions.clone();
        move |_| transitions.set(transitions.get() + 1)
    });

    layout_pass(&ctrl);
    info!(transitions = transitions.get(), "first layout applied");

    // Wire Texture.rgb -> Multiply.a -> Output.color
    ctrl.pin_pointer_down(0, "rgb", 180.0, 77.0)?;
    ctrl.pointer_move(300.0, 97.0);
    ctrl.pin_pointer_up(1, "a");
    ctrl.pin_pointer_down(1, "out", 440.0, 97.0)?;
    ctrl.pin_pointer_up(2, "color");
    info!(state = %summary(&ctrl.value()), "wired");

    // Drag Multiply down a little
    ctrl.node_pointer_down(1, 320.0, 70.0, false)?;
    for step in 1..=5 {
        ctrl.node_pointer_move(1, 320.0, 70.0 + step as f32 * 10.0)?;
    }
    ctrl.node_pointer_up(1, 320.0, 120.0)?;
    layout_pass(&ctrl);
    info!(state = %summary(&ctrl.value()), "dragged");

    // Marquee the first two nodes, duplicate them, then undo the paste
    ctrl.pointer_down_canvas(CanvasTarget::Background, 20.0, 20.0);
    ctrl.pointer_move(500.0, 260.0);
    ctrl.pointer_up_canvas(500.0, 260.0);
    ctrl.apply(|s| s.copy().paste());
    layout_pass(&ctrl);
    info!(state = %summary(&ctrl.value()), "pasted");

    ctrl.apply(|s| s.undo());
    info!(state = %summary(&ctrl.value()), "undone");

    info!(transitions = transitions.get(), "session finished");
    println!("{}", ctrl.value().to_json()?);
    Ok(())
}
