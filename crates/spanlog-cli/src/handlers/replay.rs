//! Replay command handler.
//!
//! Mounts a viewport on the store first and then appends the recording batch
//! by batch, so the output goes through the same incremental path a live
//! session uses.

use std::sync::Arc;
use std::time::Duration;

use spanlog_core::{FilterTerm, LogFilter};
use spanlog_view::{
    FrameScheduler, ImmediateScheduler, MemorySink, ViewScope, Viewport, ViewportOptions,
};
use tracing::debug;

use crate::bootstrap::CliContext;
use crate::commands::ReplayArgs;
use crate::error::CliError;
use crate::input;
use crate::presentation::{format_filter_error, format_rendered_line};

/// Longest wait for a frame-paced render to settle.
const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn execute(ctx: &CliContext, args: &ReplayArgs) -> Result<String, CliError> {
    let batches = input::read_recording(&args.file)?;

    let filter = LogFilter::new(
        args.source,
        args.level,
        FilterTerm::parse(args.term.clone().unwrap_or_default()),
    );
    let mut options = ViewportOptions::from_settings(&ctx.settings);
    if let Some(line) = args.scroll_to {
        options = options.with_scroll_to_line(line);
    }

    let viewport = if args.frame_paced {
        let frame = Duration::from_millis(ctx.settings.effective_frame_interval_ms());
        let scheduler = FrameScheduler::spawn(frame);
        let viewport = Viewport::mount(
            &ctx.store,
            scheduler.clone(),
            MemorySink::new(),
            scope_for(args),
            filter,
            &options,
        );
        input::ingest(&ctx.store, batches);
        let settled = wait_until_idle(&viewport, frame).await;
        scheduler.shutdown();
        settled?;
        viewport
    } else {
        let viewport = Viewport::mount(
            &ctx.store,
            Arc::new(ImmediateScheduler::new()),
            MemorySink::new(),
            scope_for(args),
            filter,
            &options,
        );
        input::ingest(&ctx.store, batches);
        viewport
    };

    if let Some(message) = viewport.filter_error() {
        return Ok(format_filter_error(&message, ctx.color));
    }

    let output = viewport.with_sink(|sink| {
        debug!(lines = sink.len(), stats = ?sink.stats(), "Replay rendered");
        sink.lines()
            .map(|line| format_rendered_line(line, ctx.color))
            .collect::<Vec<_>>()
            .join("\n")
    });
    Ok(output)
}

fn scope_for(args: &ReplayArgs) -> ViewScope {
    if let Some(manifest) = &args.manifest {
        ViewScope::Manifest(manifest.clone())
    } else if !args.starred.is_empty() {
        ViewScope::Starred(args.starred.clone())
    } else {
        ViewScope::All
    }
}

async fn wait_until_idle(viewport: &Viewport<MemorySink>, frame: Duration) -> Result<(), CliError> {
    tokio::time::timeout(RENDER_TIMEOUT, async {
        while !viewport.is_idle() {
            tokio::time::sleep(frame).await;
        }
    })
    .await
    .map_err(|_| CliError::Core("timed out waiting for the viewport to render".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spanlog_core::{FilterLevel, FilterSource};
    use std::path::PathBuf;

    fn args() -> ReplayArgs {
        ReplayArgs {
            file: PathBuf::from("rec.jsonl"),
            manifest: None,
            starred: Vec::new(),
            source: FilterSource::All,
            level: FilterLevel::All,
            term: None,
            window: None,
            frame_paced: false,
            scroll_to: None,
        }
    }

    #[test]
    fn test_scope_for() {
        assert_eq!(scope_for(&args()), ViewScope::All);

        let mut manifest = args();
        manifest.manifest = Some("fe".to_string());
        assert_eq!(scope_for(&manifest), ViewScope::Manifest("fe".to_string()));

        let mut starred = args();
        starred.starred = vec!["fe".to_string(), "be".to_string()];
        assert_eq!(
            scope_for(&starred),
            ViewScope::Starred(vec!["fe".to_string(), "be".to_string()])
        );
    }
}
