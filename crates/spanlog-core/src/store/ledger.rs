//! Append-only segment ledger.

use crate::domain::{Checkpoint, Segment};

/// A stored segment with its checkpoint position and the lines it touched.
#[derive(Debug, Clone)]
pub(crate) struct LedgerEntry {
    pub position: Checkpoint,
    pub segment: Segment,
    /// Stored line indices created or mutated by this segment.
    pub lines: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SegmentLedger {
    entries: Vec<LedgerEntry>,
    byte_len: usize,
}

impl SegmentLedger {
    pub(crate) fn push(&mut self, position: Checkpoint, segment: Segment, lines: Vec<usize>) {
        self.byte_len += segment.len();
        self.entries.push(LedgerEntry {
            position,
            segment,
            lines,
        });
    }

    /// Entries at or after `checkpoint`. Positions are non-decreasing.
    pub(crate) fn since(&self, checkpoint: Checkpoint) -> &[LedgerEntry] {
        let start = self
            .entries
            .partition_point(|entry| entry.position < checkpoint);
        &self.entries[start..]
    }

    pub(crate) fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Remove and return every entry.
    pub(crate) fn take(&mut self) -> Vec<LedgerEntry> {
        self.byte_len = 0;
        std::mem::take(&mut self.entries)
    }

    pub(crate) const fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_since_uses_positions() {
        let mut ledger = SegmentLedger::default();
        ledger.push(Checkpoint::new(0), Segment::global("a"), vec![0]);
        ledger.push(Checkpoint::new(1), Segment::global("bb"), vec![0]);
        ledger.push(Checkpoint::new(5), Segment::global("ccc\n"), vec![0]);

        assert_eq!(ledger.byte_len(), 7);
        assert_eq!(ledger.since(Checkpoint::ZERO).len(), 3);
        assert_eq!(ledger.since(Checkpoint::new(2)).len(), 1);
        assert!(ledger.since(Checkpoint::new(6)).is_empty());

        let taken = ledger.take();
        assert_eq!(taken.len(), 3);
        assert_eq!(ledger.byte_len(), 0);
        assert_eq!(ledger.len(), 0);
    }
}
