use std::fs::File;
use std::io::LineWriter;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::RunConfig;
use crate::container::{
    CancelToken, ContainerGuard, ContainerHandle, ContainerRuntime, LaunchSpec, Mount,
};
use crate::logs::Journal;

use super::stream::stream_to_sink;
use super::types::{Outcome, Phase, SmokeReport, StreamEnd, StreamSummary, Verdict};
use super::verify::verify_sink;

/// Run launch, stream and verify in order, then stop the container.
///
/// The container handle is derived before the start attempt, so the stop
/// request goes out exactly once on every path, including a failed launch,
/// an interrupted stream, or a panic in between.
pub fn run_smoke_test<R: ContainerRuntime>(
    runtime: &R,
    config: &RunConfig,
    journal: &Journal,
    cancel: &CancelToken,
) -> SmokeReport {
    let handle = ContainerHandle::for_image(&config.image);
    let mut report = SmokeReport {
        container: handle.clone(),
        phases: Vec::new(),
        stream: None,
        outcome: Outcome::Interrupted,
    };

    let guard = ContainerGuard::new(runtime, handle.clone());
    let outcome = run_phases(runtime, config, journal, cancel, &handle, &mut report);
    report.outcome = outcome;

    journal.note(&format!("Stopping container '{handle}'..."));
    guard.release();
    enter(&mut report, Phase::Terminated);

    report
}

fn enter(report: &mut SmokeReport, phase: Phase) {
    tracing::debug!(%phase, container = %report.container, "entering phase");
    report.phases.push(phase);
}

fn run_phases<R: ContainerRuntime>(
    runtime: &R,
    config: &RunConfig,
    journal: &Journal,
    cancel: &CancelToken,
    handle: &ContainerHandle,
    report: &mut SmokeReport,
) -> Outcome {
    // ── Launch ────────────────────────────────────────────────────────
    enter(report, Phase::Launching);

    let spec = launch_spec(config, handle);
    journal.note(&format!("Running container: {}", runtime.render_start(&spec)));
    if let Err(e) = runtime.start(&spec) {
        let diagnostic = format!("{e:#}");
        tracing::error!("Failed to start container '{handle}': {diagnostic}");
        journal.note(&format!("Failed to start container '{handle}': {diagnostic}"));
        journal.verdict(&format!("Testing failed for {handle}."));
        return Outcome::LaunchFailed(diagnostic);
    }

    let started = format!("Container '{handle}' started successfully.");
    tracing::info!("{started}");
    journal.note(&started);
    journal.verdict(&started);

    if cancel.is_cancelled() {
        tracing::warn!("Interrupted after launch. Stopping container...");
        return Outcome::Interrupted;
    }

    // ── Stream ────────────────────────────────────────────────────────
    enter(report, Phase::Streaming);

    let streaming = format!("Streaming logs for {} seconds...", config.duration.as_secs());
    tracing::info!("{streaming}");
    journal.note(&streaming);

    let mut sink = match open_sink(&config.sink_path) {
        Ok(sink) => sink,
        Err(e) => {
            tracing::error!("{e:#}");
            return Outcome::Failed(format!("{e:#}"));
        }
    };

    let summary = match runtime.follow_logs(handle) {
        Ok(mut logs) => stream_to_sink(
            &mut logs,
            &mut sink,
            config.duration,
            config.poll_interval,
            cancel,
        ),
        Err(e) => {
            tracing::error!("Error while streaming logs: {e:#}");
            StreamSummary {
                lines: 0,
                elapsed: Duration::ZERO,
                end: StreamEnd::Fault(format!("{e:#}")),
            }
        }
    };
    drop(sink);

    let saved = format!("Logs saved to: {}", config.sink_path.display());
    tracing::info!(lines = summary.lines, "{saved}");
    journal.note(&saved);

    // The follower can close in the same wait that delivered Ctrl+C, so the
    // token decides, not only how the stream ended.
    let cancelled = cancel.is_cancelled() || summary.end == StreamEnd::Cancelled;
    report.stream = Some(summary);
    if cancelled {
        tracing::warn!("Process interrupted by user. Stopping container...");
        journal.note("Process interrupted by user. Stopping container...");
        return Outcome::Interrupted;
    }

    // ── Verify ────────────────────────────────────────────────────────
    enter(report, Phase::Verifying);

    match verify_sink(&config.sink_path, &config.marker) {
        Ok(Verdict::Matched) => {
            let done = format!("Testing completed successfully for {handle}.");
            tracing::info!("{done}");
            journal.note(&done);
            journal.verdict(&done);
            Outcome::Passed
        }
        Ok(verdict) => {
            if verdict == Verdict::SinkMissing {
                tracing::error!("Log file {} does not exist.", config.sink_path.display());
            } else {
                tracing::error!("Test did not complete successfully. Check logs for details.");
            }
            let failed = format!("Testing failed for {handle}.");
            journal.note(&failed);
            journal.verdict(&failed);
            verdict.into()
        }
        Err(e) => {
            let msg = format!("failed to read {}: {e}", config.sink_path.display());
            tracing::error!("{msg}");
            let failed = format!("Testing failed for {handle}.");
            journal.note(&failed);
            journal.verdict(&failed);
            Outcome::Failed(msg)
        }
    }
}

/// Bind mounts for the optional dataset and base directories. Paths that do
/// not exist are left out.
fn launch_spec(config: &RunConfig, handle: &ContainerHandle) -> LaunchSpec {
    let candidates = [
        (config.dataset.as_ref(), "/dataset"),
        (config.base_dir.as_ref(), "/base"),
    ];

    let mounts = candidates
        .into_iter()
        .filter_map(|(host, target)| {
            let host = host?;
            if host.exists() {
                Some(Mount {
                    host: host.clone(),
                    target,
                })
            } else {
                tracing::warn!("Skipping {target} mount: {} does not exist", host.display());
                None
            }
        })
        .collect();

    LaunchSpec {
        image: config.image.clone(),
        handle: handle.clone(),
        ports: config.ports.clone(),
        mounts,
    }
}

/// Create (or truncate) the sink so a stale capture can never be verified.
fn open_sink(path: &Path) -> Result<LineWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("failed to create log sink {}", path.display()))?;
    Ok(LineWriter::new(file))
}
