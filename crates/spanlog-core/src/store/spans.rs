//! Span registry: span key to owning manifest, plus per-span line bounds.

use std::collections::BTreeMap;

use tracing::warn;

use crate::domain::{LogAlert, LogSpan, SpanId};

#[derive(Debug, Clone, Default)]
pub(crate) struct SpanEntry {
    pub manifest_name: String,
    pub first_line: Option<usize>,
    pub last_line: Option<usize>,
    pub alerts: Vec<LogAlert>,
}

impl SpanEntry {
    fn new(manifest_name: String) -> Self {
        Self {
            manifest_name,
            ..Self::default()
        }
    }

    fn reset_lines(&mut self) {
        self.first_line = None;
        self.last_line = None;
        self.alerts.clear();
    }

    pub(crate) fn to_log_span(&self, span_id: &SpanId) -> LogSpan {
        LogSpan {
            span_id: span_id.clone(),
            manifest_name: self.manifest_name.clone(),
            first_line_index: self.first_line,
            last_line_index: self.last_line,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SpanRegistry {
    spans: BTreeMap<SpanId, SpanEntry>,
}

impl SpanRegistry {
    /// Register a span. An already-known span keeps its owner.
    pub(crate) fn register(&mut self, span_id: SpanId, manifest_name: String) {
        match self.spans.get(&span_id) {
            Some(existing) if existing.manifest_name != manifest_name => {
                warn!(
                    span_id = %span_id,
                    owner = %existing.manifest_name,
                    ignored = %manifest_name,
                    "span re-registered with a different manifest; keeping original owner"
                );
            }
            Some(_) => {}
            None => {
                self.spans.insert(span_id, SpanEntry::new(manifest_name));
            }
        }
    }

    /// Get a span, registering it as global output if unknown.
    pub(crate) fn get_or_register_global(&mut self, span_id: &SpanId) -> &mut SpanEntry {
        self.spans.entry(span_id.clone()).or_insert_with(|| {
            warn!(span_id = %span_id, "segment references unregistered span; treating as global");
            SpanEntry::new(String::new())
        })
    }

    pub(crate) fn get(&self, span_id: &SpanId) -> Option<&SpanEntry> {
        self.spans.get(span_id)
    }

    pub(crate) fn contains(&self, span_id: &SpanId) -> bool {
        self.spans.contains_key(span_id)
    }

    pub(crate) fn remove(&mut self, span_id: &SpanId) -> bool {
        self.spans.remove(span_id).is_some()
    }

    pub(crate) fn manifest_of(&self, span_id: &SpanId) -> &str {
        self.spans
            .get(span_id)
            .map_or("", |span| span.manifest_name.as_str())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&SpanId, &SpanEntry)> {
        self.spans.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.spans.len()
    }

    /// Forget every line bound and alert, keeping the span to owner mapping.
    pub(crate) fn reset_lines(&mut self) {
        for span in self.spans.values_mut() {
            span.reset_lines();
        }
    }
}
