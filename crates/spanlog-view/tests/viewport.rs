//! Behavioral tests for the viewport renderer.

use std::sync::Arc;
use std::time::Duration;

use spanlog_core::{
    AppendBatch, FilterLevel, LogFilter, LogLevel, LogStore, Scheduler, Segment, SharedLogStore,
};
use spanlog_view::{
    FrameScheduler, ImmediateScheduler, ManualScheduler, MemorySink, RenderPhase, ViewScope,
    Viewport, ViewportOptions,
};

fn store_with_lines(count: usize) -> SharedLogStore {
    let store = SharedLogStore::default();
    for i in 0..count {
        store.append(Segment::global(format!("line {i}\n")));
    }
    store
}

fn mount(
    store: &SharedLogStore,
    scheduler: Arc<dyn Scheduler>,
    sink: MemorySink,
    options: &ViewportOptions,
) -> Viewport<MemorySink> {
    Viewport::mount(
        store,
        scheduler,
        sink,
        ViewScope::All,
        LogFilter::all(),
        options,
    )
}

fn mount_immediate(store: &SharedLogStore) -> Viewport<MemorySink> {
    mount(
        store,
        Arc::new(ImmediateScheduler::new()),
        MemorySink::new(),
        &ViewportOptions::default(),
    )
}

fn bare_texts(viewport: &Viewport<MemorySink>) -> Vec<String> {
    viewport.with_sink(|sink| sink.lines().map(|line| line.text.clone()).collect())
}

fn indices(viewport: &Viewport<MemorySink>) -> Vec<usize> {
    viewport.with_sink(MemorySink::stored_indices)
}

fn two_manifests() -> SharedLogStore {
    let store = SharedLogStore::default();
    store.append(
        AppendBatch::new()
            .with_span("pod:fe", "fe")
            .with_span("pod:be", "be")
            .with_segment(Segment::new("pod:fe", "fe starting\n"))
            .with_segment(Segment::new("pod:fe", "fe listening\n"))
            .with_segment(Segment::new("pod:be", "be starting\n"))
            .with_segment(Segment::global("global note\n")),
    );
    store
}

#[test]
fn test_mount_renders_existing_lines() {
    let store = store_with_lines(3);
    let viewport = mount_immediate(&store);

    assert_eq!(indices(&viewport), vec![0, 1, 2]);
    let texts = viewport.with_sink(MemorySink::texts);
    assert_eq!(texts[0], "(global)    ┊ line 0");
    assert!(viewport.is_idle());
    assert_eq!(viewport.pending_lines(), 0);
}

#[test]
fn test_backward_buffer_drains_newest_first() {
    let store = store_with_lines(5);
    let scheduler = Arc::new(ManualScheduler::new());
    let viewport = mount(
        &store,
        scheduler.clone(),
        MemorySink::new(),
        &ViewportOptions::default().with_render_window(2),
    );

    assert_eq!(viewport.phase(), RenderPhase::Scheduled);
    assert!(indices(&viewport).is_empty());

    scheduler.run_pending();
    assert_eq!(indices(&viewport), vec![3, 4]);
    scheduler.run_pending();
    assert_eq!(indices(&viewport), vec![1, 2, 3, 4]);
    scheduler.run_pending();
    assert_eq!(indices(&viewport), vec![0, 1, 2, 3, 4]);

    assert!(viewport.is_idle());
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn test_forward_buffer_is_drawn_before_backward() {
    let store = store_with_lines(3);
    let scheduler = Arc::new(ManualScheduler::new());
    let viewport = mount(
        &store,
        scheduler.clone(),
        MemorySink::new(),
        &ViewportOptions::default().with_render_window(2),
    );

    scheduler.run_pending();
    assert_eq!(indices(&viewport), vec![1, 2]);

    for i in 3..6 {
        store.append(Segment::global(format!("line {i}\n")));
    }
    assert_eq!(scheduler.pending(), 1);

    scheduler.run_pending();
    assert_eq!(indices(&viewport), vec![0, 1, 2, 3, 4]);
    scheduler.run_pending();
    assert_eq!(indices(&viewport), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(scheduler.run_until_idle(), 0);
}

#[test]
fn test_appends_render_in_order() {
    let store = store_with_lines(2);
    let viewport = mount_immediate(&store);

    for i in 2..5 {
        store.append(Segment::global(format!("line {i}\n")));
    }

    assert_eq!(
        bare_texts(&viewport),
        vec!["line 0", "line 1", "line 2", "line 3", "line 4"]
    );
    assert_eq!(viewport.with_sink(|sink| sink.stats().inserts), 5);
    assert_eq!(viewport.checkpoint(), store.read().checkpoint());
}

#[test]
fn test_continuation_replaces_element_in_place() {
    let store = SharedLogStore::default();
    store.append(Segment::global("foo"));
    let viewport = mount_immediate(&store);

    store.append(Segment::global("bar"));

    assert_eq!(bare_texts(&viewport), vec!["foobar"]);
    let stats = viewport.with_sink(MemorySink::stats);
    assert_eq!(stats.inserts, 1);
    assert_eq!(stats.replaces, 1);
}

#[test]
fn test_manifest_scope_shows_only_that_manifest_without_prefix() {
    let store = two_manifests();
    let viewport = Viewport::mount(
        &store,
        Arc::new(ImmediateScheduler::new()),
        MemorySink::new(),
        ViewScope::Manifest("fe".to_string()),
        LogFilter::all(),
        &ViewportOptions::default(),
    );

    assert_eq!(
        viewport.with_sink(MemorySink::texts),
        vec!["fe starting", "fe listening"]
    );
}

#[test]
fn test_starred_scope_flags_context_changes() {
    let store = two_manifests();
    let viewport = Viewport::mount(
        &store,
        Arc::new(ImmediateScheduler::new()),
        MemorySink::new(),
        ViewScope::Starred(vec!["fe".to_string(), "be".to_string()]),
        LogFilter::all(),
        &ViewportOptions::default(),
    );

    let lines: Vec<(String, bool)> = viewport.with_sink(|sink| {
        sink.lines()
            .map(|line| (line.display_text(), line.context_change))
            .collect()
    });
    assert_eq!(
        lines,
        vec![
            ("fe          ┊ fe starting".to_string(), false),
            ("fe          ┊ fe listening".to_string(), false),
            ("be          ┊ be starting".to_string(), true),
        ]
    );
}

#[test]
fn test_invalid_term_reports_filter_error() {
    let store = store_with_lines(3);
    let viewport = mount_immediate(&store);

    viewport.set_filter(LogFilter::all().with_term("/[unclosed/"));
    assert!(viewport.filter_error().is_some());
    assert!(viewport.with_sink(MemorySink::is_empty));

    viewport.set_filter(LogFilter::all().with_term("no such text"));
    assert_eq!(viewport.filter_error(), None);
    assert!(viewport.with_sink(MemorySink::is_empty));
}

#[test]
fn test_filter_change_resets_output() {
    let store = SharedLogStore::default();
    store.append(Segment::global("fine\n"));
    store.append(Segment::global("careful\n").with_level(LogLevel::Warn));
    store.append(Segment::global("broken\n").with_level(LogLevel::Error));

    let viewport = mount_immediate(&store);
    viewport.set_filter(LogFilter::all().with_level(FilterLevel::Warn));
    assert_eq!(bare_texts(&viewport), vec!["careful"]);

    viewport.set_filter(LogFilter::all());
    assert_eq!(bare_texts(&viewport), vec!["fine", "careful", "broken"]);
    assert_eq!(viewport.with_sink(|sink| sink.stats().clears), 3);

    // Same filter again is not a change.
    viewport.set_filter(LogFilter::all());
    assert_eq!(viewport.with_sink(|sink| sink.stats().clears), 3);
}

#[test]
fn test_line_that_stops_matching_is_removed() {
    let store = SharedLogStore::default();
    store.append(Segment::global("layer: 10%\n").with_progress_id("layer"));
    let viewport = mount_immediate(&store);
    viewport.set_filter(LogFilter::all().with_term("10%"));
    assert_eq!(bare_texts(&viewport), vec!["layer: 10%"]);

    store.append(Segment::global("layer: 90%\n").with_progress_id("layer"));

    assert!(viewport.with_sink(MemorySink::is_empty));
    assert_eq!(viewport.with_sink(|sink| sink.stats().removes), 1);
}

#[test]
fn test_store_truncation_resets_view() {
    let store = SharedLogStore::new(LogStore::with_max_log_length(100));
    let viewport = mount_immediate(&store);

    for i in 0..11 {
        store.append(Segment::global(format!("line {i:04}\n")));
    }

    assert_eq!(
        bare_texts(&viewport),
        vec!["line 0006", "line 0007", "line 0008", "line 0009", "line 0010"]
    );
    assert_eq!(indices(&viewport), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_swapping_store_rereads_everything() {
    let first = store_with_lines(2);
    let second = SharedLogStore::default();
    second.append(Segment::global("other\n"));

    let viewport = mount_immediate(&first);
    viewport.set_store(&second);
    assert_eq!(bare_texts(&viewport), vec!["other"]);

    first.append(Segment::global("ignored\n"));
    second.append(Segment::global("seen\n"));
    assert_eq!(bare_texts(&viewport), vec!["other", "seen"]);
}

#[test]
fn test_autoscroll_disengages_and_reengages_after_check() {
    let store = store_with_lines(20);
    let scheduler = Arc::new(ManualScheduler::new());
    let viewport = mount(
        &store,
        scheduler.clone(),
        MemorySink::with_rows(5),
        &ViewportOptions::default(),
    );
    scheduler.run_until_idle();
    assert!(viewport.is_autoscroll());
    assert_eq!(viewport.with_sink(MemorySink::scroll_top), 16);

    // Baseline, then scroll up.
    viewport.on_scroll(viewport.with_sink(MemorySink::scroll_position));
    let up = viewport.with_sink_mut(|sink| sink.set_scroll_top(10));
    viewport.on_scroll(up);
    assert!(!viewport.is_autoscroll());

    store.append(Segment::global("line 20\n"));
    scheduler.run_until_idle();
    assert_eq!(viewport.with_sink(MemorySink::scroll_top), 10);

    // Scrolling back down only schedules a check.
    let down = viewport.with_sink_mut(|sink| sink.set_scroll_top(usize::MAX));
    viewport.on_scroll(down);
    assert!(!viewport.is_autoscroll());
    assert_eq!(scheduler.pending(), 1);

    scheduler.run_until_idle();
    assert!(viewport.is_autoscroll());

    store.append(Segment::global("line 21\n"));
    scheduler.run_until_idle();
    assert_eq!(viewport.with_sink(MemorySink::scroll_top), 18);
}

#[test]
fn test_repeated_scroll_down_keeps_one_check() {
    let store = store_with_lines(20);
    let scheduler = Arc::new(ManualScheduler::new());
    let viewport = mount(
        &store,
        scheduler.clone(),
        MemorySink::with_rows(5),
        &ViewportOptions::default(),
    );
    scheduler.run_until_idle();

    viewport.on_scroll(viewport.with_sink(MemorySink::scroll_position));
    let up = viewport.with_sink_mut(|sink| sink.set_scroll_top(2));
    viewport.on_scroll(up);

    let down = viewport.with_sink_mut(|sink| sink.set_scroll_top(4));
    viewport.on_scroll(down);
    let down = viewport.with_sink_mut(|sink| sink.set_scroll_top(6));
    viewport.on_scroll(down);
    assert_eq!(scheduler.pending(), 1);

    // The end is not in view, so the check leaves autoscroll off.
    scheduler.run_until_idle();
    assert!(!viewport.is_autoscroll());
}

#[test]
fn test_snapshot_never_autoscrolls() {
    let store = store_with_lines(20);
    let scheduler = Arc::new(ManualScheduler::new());
    let viewport = mount(
        &store,
        scheduler.clone(),
        MemorySink::with_rows(5),
        &ViewportOptions::default().with_snapshot(true),
    );
    scheduler.run_until_idle();

    assert!(!viewport.is_autoscroll());
    assert_eq!(viewport.with_sink(|sink| sink.stats().end_scrolls), 0);

    viewport.on_scroll(viewport.with_sink(MemorySink::scroll_position));
    let down = viewport.with_sink_mut(|sink| sink.set_scroll_top(usize::MAX));
    viewport.on_scroll(down);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn test_deep_link_scrolls_to_line_once() {
    let store = store_with_lines(100);
    let viewport = mount(
        &store,
        Arc::new(ImmediateScheduler::new()),
        MemorySink::with_rows(10),
        &ViewportOptions::default().with_scroll_to_line(30),
    );

    viewport.with_sink(|sink| {
        assert_eq!(sink.last_scrolled_to(), sink.find(30));
        assert_eq!(sink.stats().line_scrolls, 1);
        assert_eq!(sink.stats().end_scrolls, 0);
        let visible: Vec<usize> = sink.visible_lines().map(|l| l.stored_line_index).collect();
        assert!(visible.contains(&30), "visible: {visible:?}");
    });
    assert!(!viewport.is_autoscroll());

    store.append(Segment::global("line 100\n"));
    viewport.with_sink(|sink| {
        assert_eq!(sink.stats().line_scrolls, 1);
        assert_eq!(sink.stats().end_scrolls, 0);
    });
}

#[test]
fn test_deep_link_waits_for_older_lines() {
    let store = store_with_lines(100);
    let scheduler = Arc::new(ManualScheduler::new());
    let viewport = mount(
        &store,
        scheduler.clone(),
        MemorySink::with_rows(10),
        &ViewportOptions::default()
            .with_render_window(20)
            .with_scroll_to_line(30),
    );

    // First window is lines 80..100; the target is not drawn yet.
    assert!(scheduler.run_next());
    assert_eq!(viewport.with_sink(|sink| sink.stats().line_scrolls), 0);

    // Target drawn, but older lines still go in above it.
    assert!(scheduler.run_next());
    assert!(scheduler.run_next());
    assert!(scheduler.run_next());
    viewport.with_sink(|sink| {
        assert!(sink.find(30).is_some());
        assert_eq!(sink.stats().line_scrolls, 0);
    });

    scheduler.run_until_idle();
    viewport.with_sink(|sink| {
        assert_eq!(sink.len(), 100);
        assert_eq!(sink.stats().line_scrolls, 1);
        assert_eq!(sink.scroll_top(), 25);
        let visible: Vec<usize> = sink.visible_lines().map(|l| l.stored_line_index).collect();
        assert!(visible.contains(&30), "visible: {visible:?}");
    });
}

#[test]
fn test_detach_cancels_pending_work() {
    let store = store_with_lines(3);
    let scheduler = Arc::new(ManualScheduler::new());
    let viewport = mount(
        &store,
        scheduler.clone(),
        MemorySink::new(),
        &ViewportOptions::default(),
    );
    assert_eq!(scheduler.pending(), 1);

    viewport.detach();
    viewport.detach();
    assert_eq!(scheduler.pending(), 0);

    store.append(Segment::global("late\n"));
    assert_eq!(scheduler.pending(), 0);
    assert!(viewport.with_sink(MemorySink::is_empty));
}

#[test]
fn test_detach_cancels_pending_autoscroll_check() {
    let store = store_with_lines(20);
    let scheduler = Arc::new(ManualScheduler::new());
    let viewport = mount(
        &store,
        scheduler.clone(),
        MemorySink::with_rows(5),
        &ViewportOptions::default(),
    );
    scheduler.run_until_idle();

    viewport.on_scroll(viewport.with_sink(MemorySink::scroll_position));
    let up = viewport.with_sink_mut(|sink| sink.set_scroll_top(10));
    viewport.on_scroll(up);
    let down = viewport.with_sink_mut(|sink| sink.set_scroll_top(usize::MAX));
    viewport.on_scroll(down);
    assert_eq!(scheduler.pending(), 1);

    viewport.detach();
    viewport.detach();
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(scheduler.run_until_idle(), 0);
    assert!(!viewport.is_autoscroll());
}

#[test]
fn test_dropping_viewport_stops_listening() {
    let store = store_with_lines(1);
    let scheduler = Arc::new(ManualScheduler::new());
    let viewport = mount(
        &store,
        scheduler.clone(),
        MemorySink::new(),
        &ViewportOptions::default(),
    );
    drop(viewport);

    store.append(Segment::global("after drop\n"));
    assert_eq!(scheduler.pending(), 0);
}

#[tokio::test]
async fn test_frame_scheduler_drains_a_burst() {
    let store = SharedLogStore::default();
    let scheduler = FrameScheduler::spawn(Duration::from_millis(2));
    let viewport = mount(
        &store,
        scheduler.clone(),
        MemorySink::new(),
        &ViewportOptions::default().with_render_window(100),
    );

    store.append(AppendBatch::from_segments(
        (0..1000).map(|i| Segment::global(format!("line {i}\n"))),
    ));

    for _ in 0..500 {
        if viewport.is_idle() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(viewport.is_idle());
    let rendered = indices(&viewport);
    assert_eq!(rendered.len(), 1000);
    assert!(rendered.windows(2).all(|pair| pair[0] < pair[1]));
    scheduler.shutdown();
}
