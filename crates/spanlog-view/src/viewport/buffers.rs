//! Double buffer of stored line indices waiting to be materialized.

use std::collections::VecDeque;

#[derive(Debug, Default)]
pub(crate) struct RenderBuffers {
    /// Initial full read, oldest first. Drained from the end.
    backward: Vec<usize>,
    /// Incremental reads, in arrival order.
    forward: VecDeque<usize>,
}

impl RenderBuffers {
    pub(crate) fn push_backward(&mut self, index: usize) {
        self.backward.push(index);
    }

    pub(crate) fn push_forward(&mut self, index: usize) {
        self.forward.push_back(index);
    }

    pub(crate) fn next_forward(&mut self) -> Option<usize> {
        self.forward.pop_front()
    }

    /// Newest remaining line of the initial read.
    pub(crate) fn next_backward(&mut self) -> Option<usize> {
        self.backward.pop()
    }

    /// Whether lines of the initial read are still waiting.
    pub(crate) fn has_backward(&self) -> bool {
        !self.backward.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.backward.len() + self.forward.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.backward.is_empty() && self.forward.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.backward.clear();
        self.forward.clear();
    }
}
