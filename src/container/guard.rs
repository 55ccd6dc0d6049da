use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::engine::ContainerRuntime;
use super::types::ContainerHandle;

/// Owns the managed container for the duration of a run and stops it exactly
/// once, on [`release`](Self::release) or when dropped (early return, or a
/// panic that unwinds). Builds with `panic = "abort"` never run `Drop` on a
/// panic; they rely on [`stop_on_panic`] instead.
pub struct ContainerGuard<'r, R: ContainerRuntime> {
    runtime: &'r R,
    handle: Option<ContainerHandle>,
}

impl<'r, R: ContainerRuntime> ContainerGuard<'r, R> {
    pub fn new(runtime: &'r R, handle: ContainerHandle) -> Self {
        Self {
            runtime,
            handle: Some(handle),
        }
    }

    /// Stop the container now.
    pub fn release(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        tracing::info!("Stopping container '{handle}'...");
        match self.runtime.stop(&handle) {
            Ok(()) => tracing::info!("Container '{handle}' stopped successfully."),
            // Best effort: the run is ending either way.
            Err(e) => tracing::warn!("Failed to stop container '{handle}': {e:#}"),
        }
    }
}

impl<R: ContainerRuntime> Drop for ContainerGuard<'_, R> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Disarms the hook installed by [`stop_on_panic`].
pub struct PanicStop {
    armed: Arc<AtomicBool>,
}

impl PanicStop {
    /// Call once the guard has taken care of the container.
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }
}

/// Install a panic hook that stops `handle` before the previous hook runs.
/// The hook stops at most once and does nothing after [`PanicStop::disarm`].
pub fn stop_on_panic<R>(runtime: R, handle: ContainerHandle) -> PanicStop
where
    R: ContainerRuntime + Send + Sync + 'static,
{
    let armed = Arc::new(AtomicBool::new(true));
    let hook_armed = armed.clone();
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if hook_armed.swap(false, Ordering::SeqCst) {
            tracing::error!("Panic during run. Stopping container '{handle}'...");
            if let Err(e) = runtime.stop(&handle) {
                tracing::warn!("Failed to stop container '{handle}': {e:#}");
            }
        }
        previous(info);
    }));
    PanicStop { armed }
}
