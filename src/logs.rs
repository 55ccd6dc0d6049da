//! Log directory layout, tracing setup and the run journal.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Local;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Files written into the logs directory for one run.
#[derive(Debug, Clone)]
pub struct LogLayout {
    pub dir: PathBuf,
    /// Timestamped copy of every tracing event.
    pub master: PathBuf,
    /// Operator-facing progress notes.
    pub testing: PathBuf,
    /// Verdict lines.
    pub validation: PathBuf,
}

impl LogLayout {
    /// Create the logs directory and name this run's files.
    pub fn prepare(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create logs directory {}", dir.display()))?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        Ok(Self {
            dir: dir.to_path_buf(),
            master: dir.join(format!("master_{stamp}.log")),
            testing: dir.join("testing.log"),
            validation: dir.join("validation.log"),
        })
    }

    pub fn journal(&self) -> Journal {
        Journal {
            testing: Some(self.testing.clone()),
            validation: Some(self.validation.clone()),
        }
    }
}

/// Install the global subscriber: console plus the master log file.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(master: &Path) -> Result<()> {
    let file = File::create(master)
        .with_context(|| format!("failed to create master log {}", master.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(())
}

/// Append-only journal files kept next to the master log. A journal without
/// paths records nothing.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    testing: Option<PathBuf>,
    validation: Option<PathBuf>,
}

impl Journal {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Record a progress note as `[timestamp] [INFO] message`.
    pub fn note(&self, message: &str) {
        if let Some(path) = &self.testing {
            let stamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f");
            append_line(path, &format!("[{stamp}] [INFO] {message}"));
        }
    }

    /// Record a verdict line verbatim.
    pub fn verdict(&self, message: &str) {
        if let Some(path) = &self.validation {
            append_line(path, message);
        }
    }
}

fn append_line(path: &Path, line: &str) {
    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut f| writeln!(f, "{line}"));
    if let Err(e) = result {
        tracing::warn!("failed to write {}: {e}", path.display());
    }
}
