// Smoke-test phases: launch, stream, verify, terminate.

pub mod orchestrator;
pub mod stream;
mod types;
pub mod verify;

pub use orchestrator::run_smoke_test;
pub use stream::stream_to_sink;
pub use types::{Outcome, Phase, SmokeReport, StreamEnd, StreamSummary, Verdict};
pub use verify::verify_sink;
