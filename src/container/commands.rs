use super::types::{ContainerHandle, LaunchSpec};

/// Build the detached `run` arguments for the managed container.
pub fn run_args(spec: &LaunchSpec) -> Vec<String> {
    let mut args = vec!["run".into(), "-d".into(), "--rm".into()];

    for port in &spec.ports {
        args.push("-p".into());
        args.push(format!("{port}:{port}"));
    }

    for mount in &spec.mounts {
        args.push("-v".into());
        args.push(mount.volume_arg());
    }

    args.extend([
        "--name".into(),
        spec.handle.to_string(),
        spec.image.clone(),
    ]);
    args
}

/// Build the `logs -f` arguments that follow the container's output.
pub fn logs_args(handle: &ContainerHandle) -> Vec<String> {
    vec!["logs".into(), "-f".into(), handle.to_string()]
}

/// Build the `stop` arguments.
pub fn stop_args(handle: &ContainerHandle) -> Vec<String> {
    vec!["stop".into(), handle.to_string()]
}
