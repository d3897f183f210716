//! Autoscroll state driven by scroll events.
//!
//! Scrolling up or sideways disengages autoscroll immediately. Scrolling
//! down only asks for a deferred check; autoscroll re-engages if the end of
//! the log is in view when that check runs.

/// Scroll offsets reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollPosition {
    pub top: usize,
    pub left: usize,
}

/// What the viewport must do after a scroll event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScrollDecision {
    Ignore,
    Disengaged,
    ScheduleCheck,
}

#[derive(Debug)]
pub(crate) struct Autoscroll {
    enabled: bool,
    snapshot: bool,
    last_top: Option<usize>,
    last_left: usize,
}

impl Autoscroll {
    pub(crate) const fn new(snapshot: bool) -> Self {
        Self {
            enabled: !snapshot,
            snapshot,
            last_top: None,
            last_left: 0,
        }
    }

    pub(crate) const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) const fn disable(&mut self) {
        self.enabled = false;
    }

    /// Back to the initial state; the next scroll event only sets a baseline.
    pub(crate) const fn reset(&mut self) {
        self.enabled = !self.snapshot;
        self.last_top = None;
        self.last_left = 0;
    }

    pub(crate) fn on_scroll(&mut self, position: ScrollPosition) -> ScrollDecision {
        let previous = self.last_top.replace(position.top);
        self.last_left = position.left;

        let Some(previous) = previous else {
            return ScrollDecision::Ignore;
        };
        if previous == position.top {
            return ScrollDecision::Ignore;
        }

        if position.left > 0 {
            self.enabled = false;
            return ScrollDecision::Disengaged;
        }

        let scrolled_up = position.top < previous;
        if self.enabled && scrolled_up {
            self.enabled = false;
            return ScrollDecision::Disengaged;
        }
        if !self.enabled && !scrolled_up && !self.snapshot {
            return ScrollDecision::ScheduleCheck;
        }
        ScrollDecision::Ignore
    }

    /// Deferred re-engagement check. Returns true if autoscroll turned on.
    pub(crate) const fn confirm(&mut self, end_in_view: bool) -> bool {
        if self.enabled || self.snapshot || self.last_left > 0 || !end_in_view {
            return false;
        }
        self.enabled = true;
        true
    }
}
