// Container runtime seam: launch, follow logs, stop, scoped cleanup.

pub mod commands;
pub mod engine;
pub mod follow;
pub mod guard;
pub mod types;

pub use engine::{CliRuntime, ContainerRuntime, LineSource};
pub use follow::LogFollower;
pub use guard::{ContainerGuard, PanicStop, stop_on_panic};
pub use types::{CancelToken, ContainerHandle, LaunchSpec, LineRead, Mount, image_stem};
