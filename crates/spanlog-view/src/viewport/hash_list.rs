//! Line hash list: stored line index → sink handle and display neighbours.
//!
//! Display order is stored line order restricted to lines that passed the
//! filter. Each entry links to its predecessor and successor so a line can
//! be placed next to a materialized neighbour without searching the sink.

use std::collections::HashMap;

use spanlog_core::{ElementId, LogLine, Placement};

#[derive(Debug, Clone)]
pub(crate) struct LineEntry {
    /// Sink element, once materialized.
    pub handle: Option<ElementId>,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    pub manifest_name: String,
    /// Latest content not yet written to the sink.
    pub pending: Option<LogLine>,
}

#[derive(Debug, Default)]
pub(crate) struct LineHashList {
    entries: HashMap<usize, LineEntry>,
    tail: Option<usize>,
}

impl LineHashList {
    pub(crate) fn get(&self, index: usize) -> Option<&LineEntry> {
        self.entries.get(&index)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.tail = None;
    }

    /// Record new content for a line, linking it into display order if it
    /// is new.
    ///
    /// Returns true if the line was not already waiting to be materialized,
    /// i.e. the caller must queue it.
    pub(crate) fn upsert(&mut self, line: LogLine) -> bool {
        let index = line.stored_line_index;
        if let Some(entry) = self.entries.get_mut(&index) {
            entry.manifest_name.clone_from(&line.manifest_name);
            return entry.pending.replace(line).is_none();
        }

        let (prev, next) = self.neighbours_of(index);
        self.entries.insert(
            index,
            LineEntry {
                handle: None,
                prev,
                next,
                manifest_name: line.manifest_name.clone(),
                pending: Some(line),
            },
        );

        if let Some(prev) = prev {
            self.link_next(prev, Some(index));
        }
        match next {
            Some(next) => self.link_prev(next, Some(index)),
            None => self.tail = Some(index),
        }
        true
    }

    /// Unlink a line. Returns its entry so the caller can drop its element.
    pub(crate) fn remove(&mut self, index: usize) -> Option<LineEntry> {
        let entry = self.entries.remove(&index)?;
        if let Some(prev) = entry.prev {
            self.link_next(prev, entry.next);
        }
        match entry.next {
            Some(next) => self.link_prev(next, entry.prev),
            None => self.tail = entry.prev,
        }
        Some(entry)
    }

    pub(crate) fn take_pending(&mut self, index: usize) -> Option<LogLine> {
        self.entries.get_mut(&index)?.pending.take()
    }

    pub(crate) fn set_handle(&mut self, index: usize, handle: ElementId) {
        if let Some(entry) = self.entries.get_mut(&index) {
            entry.handle = Some(handle);
        }
    }

    /// Whether the line's display predecessor belongs to another manifest.
    pub(crate) fn is_context_change(&self, index: usize) -> bool {
        let Some(entry) = self.entries.get(&index) else {
            return false;
        };
        entry
            .prev
            .and_then(|prev| self.entries.get(&prev))
            .is_some_and(|prev| prev.manifest_name != entry.manifest_name)
    }

    /// Where a not yet materialized line goes in the sink.
    ///
    /// Next to a materialized neighbour when there is one. Otherwise before
    /// the first materialized line that follows it, found by scanning.
    pub(crate) fn placement(&self, index: usize) -> Placement {
        let Some(entry) = self.entries.get(&index) else {
            return Placement::End;
        };

        if let Some(handle) = entry.prev.and_then(|prev| self.handle_of(prev)) {
            return Placement::After(handle);
        }
        if let Some(handle) = entry.next.and_then(|next| self.handle_of(next)) {
            return Placement::Before(handle);
        }

        self.entries
            .iter()
            .filter(|(other, _)| **other > index)
            .filter_map(|(other, entry)| entry.handle.map(|handle| (*other, handle)))
            .min_by_key(|(other, _)| *other)
            .map_or(Placement::End, |(_, handle)| Placement::Before(handle))
    }

    fn handle_of(&self, index: usize) -> Option<ElementId> {
        self.entries.get(&index).and_then(|entry| entry.handle)
    }

    /// Closest known lines before and after `index`.
    fn neighbours_of(&self, index: usize) -> (Option<usize>, Option<usize>) {
        match self.tail {
            None => (None, None),
            Some(tail) if tail < index => (Some(tail), None),
            Some(_) => {
                let prev = self.entries.keys().copied().filter(|k| *k < index).max();
                let next = self.entries.keys().copied().filter(|k| *k > index).min();
                (prev, next)
            }
        }
    }

    fn link_next(&mut self, index: usize, next: Option<usize>) {
        if let Some(entry) = self.entries.get_mut(&index) {
            entry.next = next;
        }
    }

    fn link_prev(&mut self, index: usize, prev: Option<usize>) {
        if let Some(entry) = self.entries.get_mut(&index) {
            entry.prev = prev;
        }
    }

    /// Stored indices in display order.
    #[cfg(test)]
    fn order(&self) -> Vec<usize> {
        let mut order = Vec::new();
        let mut cursor = self.entries.keys().copied().min();
        while let Some(index) = cursor {
            order.push(index);
            cursor = self.entries.get(&index).and_then(|entry| entry.next);
        }
        order
    }
}
