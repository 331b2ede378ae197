use crate::error::Result;
use crate::model::DEFAULT_EDGE_COLOR;
use serde::{Deserialize, Serialize};

/// Editor behaviour knobs carried by every [`GraphState`](crate::GraphState).
///
/// Not part of the saved snapshot. Missing fields take their defaults when
/// loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Colour for edges created by [`add_link`](crate::GraphState::add_link) (default: `"#fff"`).
    pub default_edge_color: String,
    /// Drop the redo stack whenever a new edit is committed (default: `false`).
    ///
    /// Off by default: an edit made after an undo leaves the undone states
    /// redoable, matching the historical behaviour of this editor.
    pub clear_redo_on_commit: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_edge_color: DEFAULT_EDGE_COLOR.to_owned(),
            clear_redo_on_commit: false,
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_edge_color(mut self, color: impl Into<String>) -> Self {
        self.default_edge_color = color.into();
        self
    }

    pub fn with_clear_redo_on_commit(mut self, clear: bool) -> Self {
        self.clear_redo_on_commit = clear;
        self
    }
}
