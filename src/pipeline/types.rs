use std::fmt;
use std::time::Duration;

use crate::container::ContainerHandle;

/// Run phases in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Launching,
    Streaming,
    Verifying,
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Launching => f.write_str("launching"),
            Self::Streaming => f.write_str("streaming"),
            Self::Verifying => f.write_str("verifying"),
            Self::Terminated => f.write_str("terminated"),
        }
    }
}

/// Why the streaming loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    DeadlineReached,
    /// The follower closed its output before the deadline.
    Closed,
    Cancelled,
    /// A read or sink write failed; treated as end of stream.
    Fault(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    pub lines: usize,
    pub elapsed: Duration,
    pub end: StreamEnd,
}

/// Result of searching the sink for the success marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Matched,
    NotFound,
    SinkMissing,
}

/// Final result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    MarkerMissing,
    SinkMissing,
    LaunchFailed(String),
    Interrupted,
    Failed(String),
}

impl Outcome {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    pub fn exit_code(&self) -> u8 {
        if self.passed() { 0 } else { 1 }
    }
}

impl From<Verdict> for Outcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Matched => Self::Passed,
            Verdict::NotFound => Self::MarkerMissing,
            Verdict::SinkMissing => Self::SinkMissing,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("success marker found"),
            Self::MarkerMissing => f.write_str("success marker not found in captured output"),
            Self::SinkMissing => f.write_str("captured output file is missing"),
            Self::LaunchFailed(e) => write!(f, "container failed to start: {e}"),
            Self::Interrupted => f.write_str("interrupted"),
            Self::Failed(e) => write!(f, "{e}"),
        }
    }
}

/// What happened during one run.
#[derive(Debug, Clone)]
pub struct SmokeReport {
    pub container: ContainerHandle,
    /// Phases in the order entered; always ends with `Terminated`.
    pub phases: Vec<Phase>,
    pub stream: Option<StreamSummary>,
    pub outcome: Outcome,
}

impl SmokeReport {
    pub fn exit_code(&self) -> u8 {
        self.outcome.exit_code()
    }
}
