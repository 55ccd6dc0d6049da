//! Command-line surface.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "podsmoke")]
#[command(version, about = "Smoke-test a containerized application", long_about = None)]
pub struct Args {
    /// Container image reference, e.g. quay.io/acme/logcollector:latest
    #[arg(long)]
    pub app_name: String,

    /// Host directory mounted at /dataset
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Host testbed directory mounted at /base; logs are written under <base>/logs
    #[arg(long)]
    pub base: Option<PathBuf>,

    /// Seconds to stream container logs [default: 20, or `duration` from the settings file]
    #[arg(long)]
    pub duration: Option<u64>,

    /// File name for the captured container output, relative to the logs directory
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Test script directory (recorded in the logs only)
    #[arg(long)]
    pub testscript: Option<PathBuf>,

    /// Settings file [default: ./.podsmoke.yaml if present]
    #[arg(long, env = "PODSMOKE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Runtime command prefix, overriding the settings file (e.g. "docker")
    #[arg(long)]
    pub runtime: Option<String>,
}
