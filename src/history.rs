//! Undo/redo stacks over [`EditorState`] snapshots.
//!
//! Both stacks are persistent linked lists: pushing or popping never copies
//! the entries below, so every [`GraphState`](crate::GraphState) value keeps
//! its own history while sharing it with the values derived from it.

use crate::model::EditorState;
use std::sync::Arc;

#[derive(Debug)]
struct Frame<T> {
    value: T,
    below: Option<Arc<Frame<T>>>,
}

/// Immutable LIFO stack with structural sharing.
#[derive(Debug)]
pub struct Stack<T> {
    top: Option<Arc<Frame<T>>>,
    len: usize,
}

impl<T> Clone for Stack<T> {
    fn clone(&self) -> Self {
        Self {
            top: self.top.clone(),
            len: self.len,
        }
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self { top: None, len: 0 }
    }
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, value: T) -> Self {
        Self {
            top: Some(Arc::new(Frame {
                value,
                below: self.top.clone(),
            })),
            len: self.len + 1,
        }
    }

    pub fn peek(&self) -> Option<&T> {
        self.top.as_deref().map(|frame| &frame.value)
    }

    /// The stack without its top entry, or `None` when empty.
    pub fn pop(&self) -> Option<Self> {
        let frame = self.top.as_deref()?;
        Some(Self {
            top: frame.below.clone(),
            len: self.len - 1,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    /// Entries from the top of the stack down.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let mut cursor = self.top.as_deref();
        std::iter::from_fn(move || {
            let frame = cursor?;
            cursor = frame.below.as_deref();
            Some(&frame.value)
        })
    }
}

impl<T> Drop for Stack<T> {
    fn drop(&mut self) {
        // Unlink uniquely owned frames iteratively so long histories do not
        // recurse once per entry on drop.
        let mut next = self.top.take();
        while let Some(frame) = next {
            match Arc::try_unwrap(frame) {
                Ok(mut frame) => next = frame.below.take(),
                Err(_) => break,
            }
        }
    }
}

/// The undo and redo stacks of a graph.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo: Stack<EditorState>,
    redo: Stack<EditorState>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn undo_stack(&self) -> &Stack<EditorState> {
        &self.undo
    }

    pub fn redo_stack(&self) -> &Stack<EditorState> {
        &self.redo
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Record `current` as the state to return to on undo.
    ///
    /// The redo stack is left alone unless `clear_redo` is set.
    pub fn commit(&self, current: EditorState, clear_redo: bool) -> Self {
        Self {
            undo: self.undo.push(current),
            redo: if clear_redo {
                Stack::new()
            } else {
                self.redo.clone()
            },
        }
    }

    /// Step back: returns the restored state and the updated history, or
    /// `None` when there is nothing to undo.
    pub fn undo(&self, current: EditorState) -> Option<(EditorState, Self)> {
        let previous = self.undo.peek()?.clone();
        let undo = self.undo.pop()?;
        Some((
            previous,
            Self {
                undo,
                redo: self.redo.push(current),
            },
        ))
    }

    pub fn redo(&self, current: EditorState) -> Option<(EditorState, Self)> {
        let next = self.redo.peek()?.clone();
        let redo = self.redo.pop()?;
        Some((
            next,
            Self {
                undo: self.undo.push(current),
                redo,
            },
        ))
    }
}
