use crate::model::{NodeId, PinDirection};
use thiserror::Error;

/// Result alias used by every validating graph operation.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Coarse classification of a [`GraphError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A node id, pin index or pin name is absent from the current state
    NotFound,
    /// A gesture was finished in a way its start did not allow
    InvalidGesture,
    /// A serialized snapshot could not be decoded
    Snapshot,
}

/// Reasons a graph operation was rejected.
///
/// Failures are local: the [`GraphState`](crate::GraphState) the operation was
/// called on is left untouched and stays usable.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("node {node} has no output pin at index {index}")]
    OutputNotFound { node: NodeId, index: usize },

    #[error("node {node} has no input pin at index {index}")]
    InputNotFound { node: NodeId, index: usize },

    #[error("node {node} has no {direction} pin named {name:?}")]
    PinNameNotFound {
        node: NodeId,
        direction: PinDirection,
        name: String,
    },

    #[error("no connection is in progress")]
    NoConnectionSource,

    #[error("snapshot node key {0:?} is not a node id")]
    InvalidNodeKey(String),

    #[error("snapshot could not be decoded: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NodeNotFound(_)
            | Self::OutputNotFound { .. }
            | Self::InputNotFound { .. }
            | Self::PinNameNotFound { .. } => ErrorKind::NotFound,
            Self::NoConnectionSource => ErrorKind::InvalidGesture,
            Self::InvalidNodeKey(_) | Self::Json(_) => ErrorKind::Snapshot,
        }
    }
}
