//! Viewport renderer: turns a store's line stream into incremental sink
//! updates, a bounded window of lines per scheduler tick.
//!
//! # Lifecycle
//!
//! ```text
//! mount / filter / scope / store change ──► Reading (reset + full read)
//!                                              │
//! store Append ──► needs_read ─┐               ▼
//! store Truncate ► needs_reset ┴──────────► Scheduled ──tick──► Materializing
//!                                              ▲                    │
//!                                              └── lines remaining ─┤
//!                                                                   ▼
//!                                                                 Idle
//! ```
//!
//! Store notifications never render inline; they only mark the viewport
//! dirty and request one tick. Several appends before the tick coalesce into
//! one incremental read.

mod autoscroll;
mod buffers;
mod hash_list;

use std::sync::{Arc, Mutex, Weak};

use spanlog_core::{
    Checkpoint, DEFAULT_RENDER_WINDOW, ListenerId, LogFilter, LogPatchSet, LogStore,
    LogUpdateAction, LogUpdateEvent, LogUpdateListener, OutputSink, RenderedLine, Scheduler,
    Settings, SharedLogStore, TickId,
};
use tracing::{debug, trace};

use crate::scheduler::lock;

use autoscroll::{Autoscroll, ScrollDecision};
use buffers::RenderBuffers;
use hash_list::LineHashList;

pub use autoscroll::ScrollPosition;

/// Which lines of the store a viewport shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewScope {
    /// Every manifest, plus global output.
    #[default]
    All,
    /// One manifest.
    Manifest(String),
    /// Any of several manifests.
    Starred(Vec<String>),
}

impl ViewScope {
    /// Lines carry a manifest prefix unless the view shows a single manifest.
    pub const fn shows_prefix(&self) -> bool {
        !matches!(self, Self::Manifest(_))
    }

    fn read(&self, store: &LogStore, checkpoint: Checkpoint) -> LogPatchSet {
        match self {
            Self::All => store.all_log_patch_set(checkpoint),
            Self::Manifest(name) => store.manifest_log_patch_set(name, checkpoint),
            Self::Starred(names) => store.starred_log_patch_set(names, checkpoint),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewportOptions {
    /// Lines materialized per buffer per tick.
    pub render_window: usize,
    /// Autoscroll starts disabled and never re-engages.
    pub snapshot: bool,
    /// Open positioned on this stored line index.
    pub scroll_to_line: Option<usize>,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            render_window: DEFAULT_RENDER_WINDOW,
            snapshot: false,
            scroll_to_line: None,
        }
    }
}

impl ViewportOptions {
    pub const fn from_settings(settings: &Settings) -> Self {
        Self {
            render_window: settings.effective_render_window(),
            snapshot: false,
            scroll_to_line: None,
        }
    }

    #[must_use]
    pub const fn with_render_window(mut self, render_window: usize) -> Self {
        self.render_window = render_window;
        self
    }

    #[must_use]
    pub const fn with_snapshot(mut self, snapshot: bool) -> Self {
        self.snapshot = snapshot;
        self
    }

    #[must_use]
    pub const fn with_scroll_to_line(mut self, line: usize) -> Self {
        self.scroll_to_line = Some(line);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Idle,
    Reading,
    Scheduled,
    Materializing,
}

struct ViewportState<S> {
    sink: S,
    store: SharedLogStore,
    scope: ViewScope,
    filter: LogFilter,
    render_window: usize,
    lines: LineHashList,
    buffers: RenderBuffers,
    checkpoint: Checkpoint,
    needs_reset: bool,
    needs_read: bool,
    phase: RenderPhase,
    render_scheduled: bool,
    render_tick: Option<TickId>,
    autoscroll: Autoscroll,
    check_scheduled: bool,
    autoscroll_check: Option<TickId>,
    /// Deep-link target not yet scrolled to.
    deep_link: Option<usize>,
    listener_id: Option<ListenerId>,
    detached: bool,
}

impl<S: OutputSink> ViewportState<S> {
    fn new(
        sink: S,
        store: SharedLogStore,
        scope: ViewScope,
        filter: LogFilter,
        options: &ViewportOptions,
    ) -> Self {
        let mut autoscroll = Autoscroll::new(options.snapshot);
        if options.scroll_to_line.is_some() {
            autoscroll.disable();
        }

        Self {
            sink,
            store,
            scope,
            filter,
            render_window: options.render_window.max(1),
            lines: LineHashList::default(),
            buffers: RenderBuffers::default(),
            checkpoint: Checkpoint::ZERO,
            needs_reset: false,
            needs_read: false,
            phase: RenderPhase::Idle,
            render_scheduled: false,
            render_tick: None,
            autoscroll,
            check_scheduled: false,
            autoscroll_check: None,
            deep_link: options.scroll_to_line,
            listener_id: None,
            detached: false,
        }
    }

    fn query(&self, checkpoint: Checkpoint) -> LogPatchSet {
        self.scope.read(&self.store.read(), checkpoint)
    }

    /// Filter or scope changed: autoscroll starts over.
    const fn restart_autoscroll(&mut self) {
        self.autoscroll.reset();
        if self.deep_link.is_some() {
            self.autoscroll.disable();
        }
    }

    /// Drop all output and read everything in scope into the backward buffer.
    fn reset(&mut self) {
        self.phase = RenderPhase::Reading;
        self.needs_reset = false;
        self.needs_read = false;
        self.sink.clear();
        self.lines.clear();
        self.buffers.clear();

        let patch = self.query(Checkpoint::ZERO);
        for line in self.filter.apply(patch.lines) {
            let index = line.stored_line_index;
            if self.lines.upsert(line) {
                self.buffers.push_backward(index);
            }
        }
        self.checkpoint = patch.checkpoint;

        debug!(
            lines = self.lines.len(),
            checkpoint = %self.checkpoint,
            filter_error = self.filter.error(),
            "Viewport reset"
        );
    }

    /// Pull lines changed since the last read into the forward buffer.
    fn read(&mut self) {
        self.phase = RenderPhase::Reading;
        self.needs_read = false;

        let patch = self.query(self.checkpoint);
        let received = patch.lines.len();
        for line in patch.lines {
            let index = line.stored_line_index;
            if self.filter.matches(&line) {
                if self.lines.upsert(line) {
                    self.buffers.push_forward(index);
                }
            } else if let Some(entry) = self.lines.remove(index)
                && let Some(handle) = entry.handle
            {
                self.sink.remove(handle);
            }
        }
        self.checkpoint = patch.checkpoint;

        trace!(received, checkpoint = %self.checkpoint, "Viewport read");
    }

    fn materialize(&mut self, index: usize) {
        let Some(line) = self.lines.take_pending(index) else {
            return;
        };
        let context_change = self.lines.is_context_change(index);
        let rendered = RenderedLine::from_line(&line, self.scope.shows_prefix(), context_change);

        let existing = self.lines.get(index).and_then(|entry| entry.handle);
        let handle = match existing {
            Some(handle) => self.sink.replace(handle, rendered),
            None => {
                let placement = self.lines.placement(index);
                self.sink.insert(placement, rendered)
            }
        };
        self.lines.set_handle(index, handle);
    }

    /// Scroll the deep-link target into view once nothing older is left to
    /// insert above it.
    fn scroll_to_deep_link(&mut self) {
        let Some(target) = self.deep_link else {
            return;
        };
        if self.buffers.has_backward() {
            return;
        }
        let Some(handle) = self.lines.get(target).and_then(|entry| entry.handle) else {
            return;
        };
        self.deep_link = None;
        self.sink.scroll_into_view(handle);
        debug!(line = target, "Scrolled to deep link");
    }

    /// One scheduler tick. Returns true if more work is pending.
    fn tick(&mut self) -> bool {
        self.render_scheduled = false;
        self.render_tick = None;
        if self.detached {
            return false;
        }

        if self.needs_reset {
            self.reset();
        } else if self.needs_read {
            self.read();
        }

        self.phase = RenderPhase::Materializing;
        let mut materialized = 0;
        for _ in 0..self.render_window {
            let Some(index) = self.buffers.next_forward() else {
                break;
            };
            self.materialize(index);
            materialized += 1;
        }
        for _ in 0..self.render_window {
            let Some(index) = self.buffers.next_backward() else {
                break;
            };
            self.materialize(index);
            materialized += 1;
        }

        self.scroll_to_deep_link();
        if self.autoscroll.is_enabled() && self.deep_link.is_none() {
            self.sink.scroll_end_into_view();
        }

        let more = !self.buffers.is_empty() || self.needs_reset || self.needs_read;
        self.phase = if more {
            RenderPhase::Scheduled
        } else {
            RenderPhase::Idle
        };
        trace!(materialized, remaining = self.buffers.len(), "Render tick");
        more
    }
}

struct ViewportInner<S> {
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<ViewportState<S>>,
    self_ref: Weak<Self>,
}

impl<S: OutputSink + 'static> ViewportInner<S> {
    /// Ask for a render tick unless one is already pending.
    ///
    /// The state lock is released while scheduling: a synchronous scheduler
    /// runs the tick before `schedule` returns.
    fn request_render(&self) {
        {
            let mut state = lock(&self.state);
            if state.detached || state.render_scheduled {
                return;
            }
            state.render_scheduled = true;
            state.phase = RenderPhase::Scheduled;
        }

        let weak = self.self_ref.clone();
        let id = self.scheduler.schedule(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.run_render_tick();
            }
        }));

        let mut state = lock(&self.state);
        if state.render_scheduled && state.render_tick.is_none() {
            state.render_tick = Some(id);
        }
    }

    fn run_render_tick(&self) {
        let more = lock(&self.state).tick();
        if more {
            self.request_render();
        }
    }

    fn schedule_autoscroll_check(&self) {
        let previous = {
            let mut state = lock(&self.state);
            state.check_scheduled = true;
            state.autoscroll_check.take()
        };
        if let Some(id) = previous {
            self.scheduler.cancel(id);
        }

        let weak = self.self_ref.clone();
        let id = self.scheduler.schedule(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.run_autoscroll_check();
            }
        }));

        let mut state = lock(&self.state);
        if state.check_scheduled && state.autoscroll_check.is_none() {
            state.autoscroll_check = Some(id);
        }
    }

    fn run_autoscroll_check(&self) {
        let mut state = lock(&self.state);
        state.check_scheduled = false;
        state.autoscroll_check = None;
        if state.detached || state.deep_link.is_some() {
            return;
        }

        let end_in_view = state.sink.is_end_in_view();
        if state.autoscroll.confirm(end_in_view) {
            debug!("Autoscroll re-engaged");
        }
    }

    /// Reset now, materialize on the next tick.
    fn reload(&self, update: impl FnOnce(&mut ViewportState<S>)) {
        {
            let mut state = lock(&self.state);
            if state.detached {
                return;
            }
            update(&mut state);
            state.reset();
        }
        self.request_render();
    }
}

impl<S: OutputSink + 'static> LogUpdateListener for ViewportInner<S> {
    fn on_log_update(&self, event: &LogUpdateEvent) {
        {
            let mut state = lock(&self.state);
            if state.detached {
                return;
            }
            match event.action {
                LogUpdateAction::Append => state.needs_read = true,
                LogUpdateAction::Truncate => state.needs_reset = true,
            }
        }
        self.request_render();
    }
}

/// A mounted view over a [`SharedLogStore`].
///
/// Dropping the viewport detaches it.
pub struct Viewport<S: OutputSink + 'static> {
    inner: Arc<ViewportInner<S>>,
}

impl<S: OutputSink + 'static> Viewport<S> {
    /// Attach to `store` and start rendering into `sink`.
    ///
    /// The initial full read happens before this returns; lines reach the
    /// sink on the scheduler's ticks.
    pub fn mount(
        store: &SharedLogStore,
        scheduler: Arc<dyn Scheduler>,
        sink: S,
        scope: ViewScope,
        filter: LogFilter,
        options: &ViewportOptions,
    ) -> Self {
        let state = ViewportState::new(sink, store.clone(), scope, filter, options);
        let inner = Arc::new_cyclic(|weak| ViewportInner {
            scheduler,
            state: Mutex::new(state),
            self_ref: weak.clone(),
        });

        let listener: Arc<dyn LogUpdateListener> = inner.clone();
        let listener_id = store.add_listener(&listener);
        lock(&inner.state).listener_id = Some(listener_id);

        inner.reload(|_| {});
        Self { inner }
    }

    pub fn set_filter(&self, filter: LogFilter) {
        if lock(&self.inner.state).filter == filter {
            return;
        }
        self.inner.reload(|state| {
            state.filter = filter;
            state.restart_autoscroll();
        });
    }

    pub fn set_scope(&self, scope: ViewScope) {
        if lock(&self.inner.state).scope == scope {
            return;
        }
        self.inner.reload(|state| {
            state.scope = scope;
            state.restart_autoscroll();
        });
    }

    /// Move to another store. Everything is re-read from it.
    pub fn set_store(&self, store: &SharedLogStore) {
        let (previous, listener_id) = {
            let mut state = lock(&self.inner.state);
            if state.detached || state.store.ptr_eq(store) {
                return;
            }
            (
                std::mem::replace(&mut state.store, store.clone()),
                state.listener_id.take(),
            )
        };
        if let Some(id) = listener_id {
            previous.remove_listener(id);
        }

        let listener: Arc<dyn LogUpdateListener> = self.inner.clone();
        let listener_id = store.add_listener(&listener);
        self.inner.reload(|state| state.listener_id = Some(listener_id));
    }

    /// Report a scroll of the host view.
    pub fn on_scroll(&self, position: ScrollPosition) {
        let decision = {
            let mut state = lock(&self.inner.state);
            if state.detached {
                return;
            }
            state.autoscroll.on_scroll(position)
        };

        match decision {
            ScrollDecision::Ignore => {}
            ScrollDecision::Disengaged => debug!(?position, "Autoscroll disengaged"),
            ScrollDecision::ScheduleCheck => self.inner.schedule_autoscroll_check(),
        }
    }

    /// Stop listening and cancel pending work. Idempotent.
    pub fn detach(&self) {
        let (store, listener_id, ticks) = {
            let mut state = lock(&self.inner.state);
            if state.detached {
                return;
            }
            state.detached = true;
            state.render_scheduled = false;
            state.check_scheduled = false;
            state.phase = RenderPhase::Idle;
            (
                state.store.clone(),
                state.listener_id.take(),
                [state.render_tick.take(), state.autoscroll_check.take()],
            )
        };

        if let Some(id) = listener_id {
            store.remove_listener(id);
        }
        for id in ticks.into_iter().flatten() {
            self.inner.scheduler.cancel(id);
        }
        debug!("Viewport detached");
    }

    pub fn with_sink<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&lock(&self.inner.state).sink)
    }

    /// Mutable access to the sink, e.g. to move its scroll position.
    pub fn with_sink_mut<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut lock(&self.inner.state).sink)
    }

    pub fn filter(&self) -> LogFilter {
        lock(&self.inner.state).filter.clone()
    }

    pub fn scope(&self) -> ViewScope {
        lock(&self.inner.state).scope.clone()
    }

    /// Why the current filter matches nothing, if its term is invalid.
    pub fn filter_error(&self) -> Option<String> {
        lock(&self.inner.state).filter.error().map(str::to_string)
    }

    pub fn is_autoscroll(&self) -> bool {
        lock(&self.inner.state).autoscroll.is_enabled()
    }

    pub fn phase(&self) -> RenderPhase {
        lock(&self.inner.state).phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase() == RenderPhase::Idle
    }

    /// Lines waiting in either buffer.
    pub fn pending_lines(&self) -> usize {
        lock(&self.inner.state).buffers.len()
    }

    /// Store checkpoint the viewport has read up to.
    pub fn checkpoint(&self) -> Checkpoint {
        lock(&self.inner.state).checkpoint
    }

    pub fn is_detached(&self) -> bool {
        lock(&self.inner.state).detached
    }
}

impl<S: OutputSink + 'static> Drop for Viewport<S> {
    fn drop(&mut self) {
        self.detach();
    }
}
