//! Byte bounding: live truncation of the store and byte-bounded export.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::DateTime;
use tracing::info;

use crate::contracts::{LogList, SegmentDto, SpanDto};
use crate::domain::{GLOBAL_SPAN_ID, SpanId};

use super::LogStore;
use super::ledger::LedgerEntry;

/// Bytes held by one manifest and when its output started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestWeight {
    pub byte_count: usize,
    /// Timestamp of the manifest's first stored segment (RFC 3339).
    pub start: String,
}

impl ManifestWeight {
    pub fn new(byte_count: usize, start: impl Into<String>) -> Self {
        Self {
            byte_count,
            start: start.into(),
        }
    }
}

/// Most recent first. Timestamps are compared as instants when both parse,
/// lexically otherwise.
fn compare_recency(a: &str, b: &str) -> Ordering {
    match (
        DateTime::parse_from_rfc3339(a),
        DateTime::parse_from_rfc3339(b),
    ) {
        (Ok(a), Ok(b)) => b.cmp(&a),
        _ => b.cmp(a),
    }
}

/// Pick the manifest to cut first when the store is over budget.
///
/// Manifests are ranked by recency (most recent = 1) and scored
/// `rank * byte_count`, so an older manifest needs proportionally less output
/// to be chosen. Returns `None` for an empty map.
pub fn heaviest_manifest_name<S: std::hash::BuildHasher>(
    weights: &HashMap<String, ManifestWeight, S>,
) -> Option<String> {
    let mut by_recency: Vec<(&String, &ManifestWeight)> = weights.iter().collect();
    by_recency.sort_by(|(a_name, a), (b_name, b)| {
        compare_recency(&a.start, &b.start).then_with(|| b_name.cmp(a_name))
    });

    let mut heaviest: Option<(&String, u128)> = None;
    for (rank, (name, weight)) in (1u128..).zip(by_recency) {
        let score = rank * weight.byte_count as u128;
        if heaviest.is_none_or(|(_, best)| score > best) {
            heaviest = Some((name, score));
        }
    }
    heaviest.map(|(name, _)| name.clone())
}

impl LogStore {
    /// Truncate to half of `max_log_length` once over it.
    ///
    /// Returns true if anything was dropped.
    pub(super) fn ensure_max_length(&mut self) -> bool {
        let byte_len = self.ledger.byte_len();
        if byte_len <= self.max_log_length {
            return false;
        }

        let mut weights: HashMap<String, ManifestWeight> = HashMap::new();
        for entry in self.ledger.entries() {
            let manifest = self.spans.manifest_of(&entry.segment.span_id);
            weights
                .entry(manifest.to_string())
                .or_insert_with(|| ManifestWeight::new(0, entry.segment.time.clone()))
                .byte_count += entry.segment.len();
        }

        let target = self.max_log_length / 2;
        let mut left_to_cut = byte_len.saturating_sub(target);
        while left_to_cut > 0 {
            let Some(name) = heaviest_manifest_name(&weights) else {
                break;
            };
            let Some(weight) = weights.get_mut(&name) else {
                break;
            };
            let cut = weight.byte_count.div_ceil(2).min(left_to_cut);
            if cut == 0 {
                break;
            }
            weight.byte_count -= cut;
            left_to_cut -= cut;
        }

        // Walk newest to oldest, spending each manifest's remaining budget.
        let mut budgets: HashMap<String, i64> = weights
            .into_iter()
            .map(|(name, weight)| (name, i64::try_from(weight.byte_count).unwrap_or(i64::MAX)))
            .collect();
        let mut kept: Vec<LedgerEntry> = Vec::new();
        let mut dropped = 0usize;
        for entry in self.ledger.take().into_iter().rev() {
            let manifest = self.spans.manifest_of(&entry.segment.span_id);
            let len = i64::try_from(entry.segment.len()).unwrap_or(i64::MAX);
            let budget = budgets.entry(manifest.to_string()).or_insert(0);
            *budget -= len;
            if *budget < 0 {
                dropped += 1;
                continue;
            }
            kept.push(entry);
        }
        kept.reverse();

        self.rebuild(kept);
        info!(
            before = byte_len,
            after = self.ledger.byte_len(),
            dropped_segments = dropped,
            "truncated log store"
        );
        true
    }

    /// Export the most recent segments, at most `max_bytes` of text.
    ///
    /// Segments are never split. The result lists only referenced spans, plus
    /// the global span.
    pub fn to_log_list(&self, max_bytes: Option<usize>) -> LogList {
        let mut size = 0usize;
        let mut spans: BTreeMap<String, SpanDto> = BTreeMap::new();
        let mut segments: Vec<SegmentDto> = Vec::new();

        for entry in self.ledger.entries().iter().rev() {
            size += entry.segment.len();
            if max_bytes.is_some_and(|max| size > max) {
                break;
            }

            let span_id = &entry.segment.span_id;
            spans
                .entry(span_id.to_string())
                .or_insert_with(|| SpanDto {
                    manifest_name: self.spans.manifest_of(span_id).to_string(),
                });
            segments.push(SegmentDto::from(&entry.segment));
        }
        segments.reverse();

        let global = SpanId::global();
        spans
            .entry(GLOBAL_SPAN_ID.to_string())
            .or_insert_with(|| SpanDto {
                manifest_name: self.spans.manifest_of(&global).to_string(),
            });

        LogList {
            spans,
            segments,
            from_checkpoint: None,
            to_checkpoint: None,
        }
    }
}
