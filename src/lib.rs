//! Smoke-test a containerized application.
//!
//! A run launches the image detached, streams the container's output into a
//! log sink for a fixed window, searches the sink for a success marker and
//! always stops the container afterwards. See [`pipeline::run_smoke_test`].

pub mod cli;
pub mod config;
pub mod container;
pub mod logs;
pub mod pipeline;
