//! Line index: an arena of lines derived from the segment ledger.
//!
//! Lines are addressed by their stored line index. Continuations and
//! progress overwrites mutate a line in place by index.

use crate::domain::{BuildEvent, LogAlert, LogLevel, LogLine, Segment, SpanId};

use super::spans::{SpanEntry, SpanRegistry};

#[derive(Debug, Clone)]
pub(crate) struct StoredLine {
    pub span_id: SpanId,
    /// Accumulated text, including the terminating newline once complete.
    pub text: String,
    pub level: LogLevel,
    pub time: String,
    pub progress_id: Option<String>,
    pub build_event: Option<BuildEvent>,
}

impl StoredLine {
    fn open(segment: &Segment, text: &str) -> Self {
        Self {
            span_id: segment.span_id.clone(),
            text: text.to_string(),
            level: segment.level,
            time: segment.time.clone(),
            progress_id: segment.fields.progress_id.clone(),
            build_event: segment.fields.build_event,
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.text.ends_with('\n')
    }

    fn can_continue_with(&self, segment: &Segment) -> bool {
        !self.is_complete()
            && self.level == segment.level
            && self.progress_id.as_deref() == segment.progress_id()
    }

    /// Text without its trailing newline.
    pub(crate) fn display_text(&self) -> &str {
        self.text.strip_suffix('\n').unwrap_or(&self.text)
    }

    pub(crate) fn to_log_line(&self, index: usize, manifest_name: &str) -> LogLine {
        LogLine {
            text: self.display_text().to_string(),
            level: self.level,
            manifest_name: manifest_name.to_string(),
            span_id: self.span_id.clone(),
            stored_line_index: index,
            build_event: self.build_event,
            progress_id: self.progress_id.clone(),
            time: self.time.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct LineIndex {
    lines: Vec<StoredLine>,
}

impl LineIndex {
    pub(crate) fn get(&self, index: usize) -> Option<&StoredLine> {
        self.lines.get(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }

    pub(crate) fn clear(&mut self) {
        self.lines.clear();
    }

    /// Fold one segment into the index, returning the stored line indices it
    /// created or mutated.
    ///
    /// A span the registry has not seen is registered as global output.
    pub(crate) fn ingest(&mut self, spans: &mut SpanRegistry, segment: &Segment) -> Vec<usize> {
        let span = spans.get_or_register_global(&segment.span_id);

        if let Some(index) = self.overwrite_progress_line(span, segment) {
            return vec![index];
        }

        let pieces: Vec<&str> = if segment.text.is_empty() {
            vec![""]
        } else {
            segment.text.split_inclusive('\n').collect()
        };

        let mut touched = Vec::with_capacity(pieces.len());
        let mut opened_any = false;
        for piece in pieces {
            if let Some(last) = span.last_line
                && let Some(line) = self.lines.get_mut(last)
                && line.can_continue_with(segment)
            {
                line.text.push_str(piece);
                touched.push(last);
                continue;
            }

            let index = self.lines.len();
            self.lines.push(StoredLine::open(segment, piece));
            span.first_line.get_or_insert(index);
            span.last_line = Some(index);

            if !opened_any && segment.anchor && segment.level.is_alert() {
                span.alerts.push(LogAlert {
                    line_index: index,
                    level: segment.level,
                });
            }
            opened_any = true;
            touched.push(index);
        }
        touched
    }

    /// Replace the text of an earlier line with the same progress id.
    ///
    /// Searches backward through the span's lines. The search stops at the
    /// first line of this span that is not a progress line.
    fn overwrite_progress_line(&mut self, span: &SpanEntry, segment: &Segment) -> Option<usize> {
        let progress_id = segment.progress_id()?;
        let (first, last) = (span.first_line?, span.last_line?);

        for index in (first..=last).rev() {
            let line = &mut self.lines[index];
            if line.span_id != segment.span_id {
                continue;
            }
            match line.progress_id.as_deref() {
                None => return None,
                Some(existing) if existing != progress_id => {}
                Some(_) => {
                    line.text.clone_from(&segment.text);
                    return Some(index);
                }
            }
        }
        None
    }
}
