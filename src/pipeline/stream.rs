use std::io::Write;
use std::time::{Duration, Instant};

use crate::container::{CancelToken, LineRead, LineSource};

use super::types::{StreamEnd, StreamSummary};

/// Copy lines from `source` into `sink` until `window` has elapsed, the
/// source closes, a fault occurs, or `cancel` fires.
///
/// No single wait exceeds `poll` or the time left in the window, so the loop
/// overruns the window by at most one poll interval. The source is
/// terminated and the sink flushed on every exit path.
pub fn stream_to_sink<S, W>(
    source: &mut S,
    sink: &mut W,
    window: Duration,
    poll: Duration,
    cancel: &CancelToken,
) -> StreamSummary
where
    S: LineSource,
    W: Write,
{
    let start = Instant::now();
    let mut lines = 0;

    let end = loop {
        if cancel.is_cancelled() {
            break StreamEnd::Cancelled;
        }
        let Some(remaining) = window.checked_sub(start.elapsed()).filter(|r| !r.is_zero()) else {
            break StreamEnd::DeadlineReached;
        };

        let read = source.next_line(poll.min(remaining));
        // Ctrl+C also reaches the follower, so a cancel often lands in the
        // same wait that reports the stream closing.
        if cancel.is_cancelled() {
            if let Ok(LineRead::Line(line)) = &read {
                tracing::info!(target: "container", "{}", line.trim_end());
                if writeln!(sink, "{line}").is_ok() {
                    lines += 1;
                }
            }
            break StreamEnd::Cancelled;
        }

        match read {
            Ok(LineRead::Line(line)) => {
                tracing::info!(target: "container", "{}", line.trim_end());
                if let Err(e) = writeln!(sink, "{line}") {
                    tracing::error!("Error while writing container output: {e}");
                    break StreamEnd::Fault(e.to_string());
                }
                lines += 1;
            }
            Ok(LineRead::Timeout) => {}
            Ok(LineRead::Closed) => break StreamEnd::Closed,
            Err(e) => {
                tracing::error!("Error while streaming logs: {e}");
                break StreamEnd::Fault(e.to_string());
            }
        }
    };

    source.terminate();
    if let Err(e) = sink.flush() {
        tracing::error!("Error while flushing container output: {e}");
    }

    StreamSummary {
        lines,
        elapsed: start.elapsed(),
        end,
    }
}
