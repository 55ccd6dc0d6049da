use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Suffix appended to every derived container name.
const NAME_SUFFIX: &str = "-testbed";

/// Cooperative cancellation token backed by an `AtomicBool`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Last path segment of an image reference with the tag separator replaced,
/// e.g. `quay.io/team/app:latest` -> `app_latest`.
pub fn image_stem(image: &str) -> String {
    image.rsplit('/').next().unwrap_or(image).replace(':', "_")
}

/// Runtime-level name of the one container a run manages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerHandle(String);

impl ContainerHandle {
    /// Derive the container name from an image reference.
    pub fn for_image(image: &str) -> Self {
        Self(format!("{}{NAME_SUFFIX}", image_stem(image)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A host directory exposed inside the container with SELinux relabelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub host: PathBuf,
    pub target: &'static str,
}

impl Mount {
    /// The `-v` argument value, `host:target:Z`.
    pub fn volume_arg(&self) -> String {
        format!("{}:{}:Z", self.host.display(), self.target)
    }
}

/// Everything needed to start the managed container.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub image: String,
    pub handle: ContainerHandle,
    pub ports: Vec<u16>,
    pub mounts: Vec<Mount>,
}

/// Result of one bounded wait on a line stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    Line(String),
    /// Nothing arrived within the wait.
    Timeout,
    /// The producer ended; no more lines will arrive.
    Closed,
}
