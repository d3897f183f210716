//! The log store: span registry, segment ledger and line index behind one
//! facade with checkpointed, incremental queries.
//!
//! # Data flow
//!
//! ```text
//! append(batch) -> register spans -> ledger.push(segment) -> index.ingest(segment)
//!                                                         -> notify listeners
//! ```
//!
//! Every ledger entry remembers which stored lines it created or mutated,
//! so an incremental query only has to look at the entries after a
//! checkpoint. A line extended after it was first returned is returned again
//! in full.
//!
//! The store itself is single-threaded. Share it across threads through
//! [`SharedLogStore`].

mod index;
mod ledger;
mod listeners;
mod shared;
mod spans;
mod truncate;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{
    AppendBatch, Checkpoint, LogAlert, LogLine, LogPatchSet, LogSpan, Segment, SpanId,
};
use crate::prefix::source_prefix;
use crate::settings::{DEFAULT_MAX_LOG_LENGTH, Settings};

use index::LineIndex;
use ledger::{LedgerEntry, SegmentLedger};
use listeners::{ListenerSet, notify};
use spans::{SpanEntry, SpanRegistry};

pub use listeners::{ListenerId, LogUpdateAction, LogUpdateEvent, LogUpdateListener};
pub use shared::SharedLogStore;
pub use truncate::{ManifestWeight, heaviest_manifest_name};

type Selection<'a> = BTreeMap<&'a SpanId, &'a SpanEntry>;

/// In-memory, checkpointed log store for one session.
#[derive(Debug)]
pub struct LogStore {
    spans: SpanRegistry,
    ledger: SegmentLedger,
    index: LineIndex,
    checkpoint: Checkpoint,
    max_log_length: usize,
    listeners: ListenerSet,
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LogStore {
    pub fn new() -> Self {
        Self::with_max_log_length(DEFAULT_MAX_LOG_LENGTH)
    }

    /// Create a store that truncates once it holds more than `max_log_length`
    /// bytes of text.
    pub fn with_max_log_length(max_log_length: usize) -> Self {
        Self {
            spans: SpanRegistry::default(),
            ledger: SegmentLedger::default(),
            index: LineIndex::default(),
            checkpoint: Checkpoint::ZERO,
            max_log_length,
            listeners: ListenerSet::default(),
        }
    }

    pub fn with_settings(settings: &Settings) -> Self {
        Self::with_max_log_length(settings.effective_max_log_length())
    }

    // ---- mutation -------------------------------------------------------

    /// Ingest a batch and notify listeners. Returns the new checkpoint.
    pub fn append(&mut self, batch: impl Into<AppendBatch>) -> Checkpoint {
        let events = self.apply_append(batch.into());
        notify(&self.listeners.live(), &events);
        self.checkpoint
    }

    /// Delete spans and every segment attributed to them, then re-index.
    pub fn remove_spans<S: AsRef<str>>(&mut self, span_ids: &[S]) {
        let events = self.apply_remove_spans(span_ids);
        notify(&self.listeners.live(), &events);
    }

    pub fn add_listener(&mut self, listener: &Arc<dyn LogUpdateListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Unregister a listener. Unknown ids are ignored.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub(crate) fn live_listeners(&self) -> Vec<Arc<dyn LogUpdateListener>> {
        self.listeners.live()
    }

    /// Mutate without notifying; returns the events to deliver.
    pub(crate) fn apply_append(&mut self, batch: AppendBatch) -> Vec<LogUpdateEvent> {
        let AppendBatch {
            spans,
            mut segments,
            from_checkpoint,
            to_checkpoint,
        } = batch;

        if let Some(from) = from_checkpoint
            && from < 0
        {
            warn!(from_checkpoint = from, "rejecting batch with negative checkpoint");
            return Vec::new();
        }

        for (span_id, manifest_name) in spans {
            self.spans.register(span_id, manifest_name);
        }

        if let Some(from) = from_checkpoint.and_then(|from| u64::try_from(from).ok()) {
            let current = self.checkpoint.value();
            if from < current {
                let resent = usize::try_from(current - from)
                    .unwrap_or(usize::MAX)
                    .min(segments.len());
                debug!(resent, checkpoint = current, "skipping resent segments");
                segments.drain(..resent);
            }
        }

        let start = self.checkpoint;
        let count = segments.len() as u64;
        for (offset, segment) in (0u64..).zip(segments) {
            self.ingest_at(start.advance(offset), segment);
        }

        let mut next = start.advance(count);
        if let Some(to) = to_checkpoint.and_then(|to| u64::try_from(to).ok()) {
            next = next.max(Checkpoint::new(to));
        }
        self.checkpoint = next;

        let mut events = vec![LogUpdateEvent::append()];
        if self.ensure_max_length() {
            events.push(LogUpdateEvent::truncate());
        }
        events
    }

    pub(crate) fn apply_remove_spans<S: AsRef<str>>(
        &mut self,
        span_ids: &[S],
    ) -> Vec<LogUpdateEvent> {
        if span_ids.is_empty() {
            return Vec::new();
        }

        let doomed: BTreeSet<SpanId> = span_ids.iter().map(|id| SpanId::new(id.as_ref())).collect();
        for span_id in &doomed {
            self.spans.remove(span_id);
        }

        let kept: Vec<LedgerEntry> = self
            .ledger
            .take()
            .into_iter()
            .filter(|entry| !doomed.contains(&entry.segment.span_id))
            .collect();
        self.rebuild(kept);

        debug!(
            removed = doomed.len(),
            lines = self.index.len(),
            "removed spans and rebuilt line index"
        );
        vec![LogUpdateEvent::truncate()]
    }

    fn ingest_at(&mut self, position: Checkpoint, segment: Segment) {
        let lines = self.index.ingest(&mut self.spans, &segment);
        self.ledger.push(position, segment, lines);
    }

    /// Re-derive every line from `entries`, keeping their positions.
    fn rebuild(&mut self, entries: Vec<LedgerEntry>) {
        self.index.clear();
        self.spans.reset_lines();
        self.ledger.take();
        for entry in entries {
            self.ingest_at(entry.position, entry.segment);
        }
    }

    // ---- queries --------------------------------------------------------

    /// Every line in stored order.
    pub fn all_log(&self) -> Vec<LogLine> {
        self.log_helper(&self.select(|_, _| true), Checkpoint::ZERO)
            .lines
    }

    /// Lines of every span owned by `manifest_name`, in stored order.
    pub fn manifest_log(&self, manifest_name: &str) -> Vec<LogLine> {
        self.log_helper(&self.select_manifest(manifest_name), Checkpoint::ZERO)
            .lines
    }

    /// Lines of exactly the given spans, in stored order.
    pub fn span_log<S: AsRef<str>>(&self, span_ids: &[S]) -> Vec<LogLine> {
        let wanted: BTreeSet<SpanId> = span_ids.iter().map(|id| SpanId::new(id.as_ref())).collect();
        self.log_helper(
            &self.select(|id, _| wanted.contains(id)),
            Checkpoint::ZERO,
        )
        .lines
    }

    /// Lines of one build and the runtime output that followed it, up to the
    /// start of the manifest's next build.
    pub fn trace_log(&self, build_span_id: &str) -> Vec<LogLine> {
        let build_span_id = SpanId::new(build_span_id);
        if !build_span_id.is_build() {
            return Vec::new();
        }
        let Some(start) = self.spans.get(&build_span_id) else {
            return Vec::new();
        };
        let Some(start_first) = start.first_line else {
            return Vec::new();
        };
        let next_first = self
            .next_build_span(build_span_id.as_str())
            .and_then(|span| span.first_line_index);

        let selection = self.select(|id, span| {
            if *id == build_span_id {
                return true;
            }
            span.manifest_name == start.manifest_name
                && span.first_line.is_some_and(|first| {
                    first > start_first && next_first.is_none_or(|next| first < next)
                })
        });
        self.log_helper(&selection, Checkpoint::ZERO).lines
    }

    pub fn all_log_patch_set(&self, checkpoint: Checkpoint) -> LogPatchSet {
        self.log_helper(&self.select(|_, _| true), checkpoint)
    }

    pub fn manifest_log_patch_set(
        &self,
        manifest_name: &str,
        checkpoint: Checkpoint,
    ) -> LogPatchSet {
        self.log_helper(&self.select_manifest(manifest_name), checkpoint)
    }

    /// Lines of any of the starred manifests.
    pub fn starred_log_patch_set<S: AsRef<str>>(
        &self,
        manifest_names: &[S],
        checkpoint: Checkpoint,
    ) -> LogPatchSet {
        let selection = self.select(|_, span| {
            manifest_names
                .iter()
                .any(|name| name.as_ref() == span.manifest_name)
        });
        self.log_helper(&selection, checkpoint)
    }

    pub fn spans_for_manifest(&self, manifest_name: &str) -> BTreeMap<SpanId, LogSpan> {
        self.spans
            .iter()
            .filter(|(_, span)| span.manifest_name == manifest_name)
            .map(|(id, span)| (id.clone(), span.to_log_span(id)))
            .collect()
    }

    pub fn all_spans(&self) -> BTreeMap<SpanId, LogSpan> {
        self.spans
            .iter()
            .map(|(id, span)| (id.clone(), span.to_log_span(id)))
            .collect()
    }

    /// Warning and error lines opened by anchored segments of a span.
    pub fn alerts_for_span(&self, span_id: &str) -> &[LogAlert] {
        self.spans
            .get(&SpanId::new(span_id))
            .map_or(&[], |span| span.alerts.as_slice())
    }

    pub fn has_lines_for_span(&self, span_id: &str) -> bool {
        self.spans
            .get(&SpanId::new(span_id))
            .is_some_and(|span| span.first_line.is_some())
    }

    /// Build spans of the same manifest as `span_id`, ordered by first line.
    pub fn ordered_build_span_ids(&self, span_id: &str) -> Vec<SpanId> {
        let Some(start) = self.spans.get(&SpanId::new(span_id)) else {
            return Vec::new();
        };

        let mut builds: Vec<(&SpanId, &SpanEntry)> = self
            .spans
            .iter()
            .filter(|(id, span)| id.is_build() && span.manifest_name == start.manifest_name)
            .collect();
        builds.sort_by_key(|(_, span)| span.first_line);
        builds.into_iter().map(|(id, _)| id.clone()).collect()
    }

    /// The build span that follows `span_id` in its manifest, if any.
    pub fn next_build_span(&self, span_id: &str) -> Option<LogSpan> {
        let span_id = SpanId::new(span_id);
        let ordered = self.ordered_build_span_ids(span_id.as_str());
        let position = ordered.iter().position(|id| *id == span_id)?;
        let next = ordered.get(position + 1)?;
        self.spans.get(next).map(|span| span.to_log_span(next))
    }

    /// The last `n` lines as text, prefixed with their manifest.
    pub fn tail(&self, n: usize) -> String {
        self.tail_helper(n, &self.select(|_, _| true), true)
    }

    /// The last `n` lines of one span, without prefixes.
    pub fn tail_span(&self, n: usize, span_id: &str) -> String {
        let span_id = SpanId::new(span_id);
        if !self.spans.contains(&span_id) {
            return String::new();
        }
        self.tail_helper(n, &self.select(|id, _| *id == span_id), false)
    }

    pub const fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    /// Bytes of segment text currently held.
    pub const fn byte_len(&self) -> usize {
        self.ledger.byte_len()
    }

    pub const fn max_log_length(&self) -> usize {
        self.max_log_length
    }

    pub fn segment_count(&self) -> usize {
        self.ledger.len()
    }

    pub fn line_count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.len() == 0
    }

    // ---- helpers --------------------------------------------------------

    fn select(&self, keep: impl Fn(&SpanId, &SpanEntry) -> bool) -> Selection<'_> {
        self.spans.iter().filter(|(id, span)| keep(id, span)).collect()
    }

    fn select_manifest(&self, manifest_name: &str) -> Selection<'_> {
        self.select(|_, span| span.manifest_name == manifest_name)
    }

    /// Stored line indices belonging to `selection`, in order.
    fn selected_indices<'a>(
        &'a self,
        selection: &'a Selection<'a>,
    ) -> impl Iterator<Item = usize> + 'a {
        let start = selection.values().filter_map(|span| span.first_line).min();
        let end = selection.values().filter_map(|span| span.last_line).max();
        let range = match (start, end) {
            (Some(start), Some(end)) => start..end + 1,
            _ => 0..0,
        };
        range.filter(move |&index| {
            self.index
                .get(index)
                .is_some_and(|line| selection.contains_key(&line.span_id))
        })
    }

    fn log_line(&self, selection: &Selection<'_>, index: usize) -> Option<LogLine> {
        let line = self.index.get(index)?;
        let span = selection.get(&line.span_id)?;
        Some(line.to_log_line(index, &span.manifest_name))
    }

    fn log_helper(&self, selection: &Selection<'_>, checkpoint: Checkpoint) -> LogPatchSet {
        if checkpoint == Checkpoint::ZERO {
            let lines = self
                .selected_indices(selection)
                .filter_map(|index| self.log_line(selection, index))
                .collect();
            return LogPatchSet {
                lines,
                checkpoint: self.checkpoint,
            };
        }

        let touched: BTreeSet<usize> = self
            .ledger
            .since(checkpoint)
            .iter()
            .filter(|entry| selection.contains_key(&entry.segment.span_id))
            .flat_map(|entry| entry.lines.iter().copied())
            .collect();

        LogPatchSet {
            lines: touched
                .into_iter()
                .filter_map(|index| self.log_line(selection, index))
                .collect(),
            checkpoint: self.checkpoint,
        }
    }

    fn tail_helper(&self, n: usize, selection: &Selection<'_>, show_prefix: bool) -> String {
        if n == 0 {
            return String::new();
        }

        let indices: Vec<usize> = self.selected_indices(selection).collect();
        let skip = indices.len().saturating_sub(n);
        let mut out = String::new();
        for index in &indices[skip..] {
            let Some(line) = self.index.get(*index) else {
                continue;
            };
            let manifest = self.spans.manifest_of(&line.span_id);
            if show_prefix && !manifest.is_empty() {
                out.push_str(&source_prefix(manifest));
            }
            out.push_str(&line.text);
        }
        out
    }
}
