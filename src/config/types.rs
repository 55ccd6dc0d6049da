use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;

use crate::cli::Args;
use crate::container::image_stem;

/// Settings read from the YAML settings file. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Runtime command prefix, split with shell quoting rules.
    pub runtime: String,
    pub ports: Vec<u16>,
    /// Regular expression that must appear in the captured output.
    pub success_pattern: String,
    /// Streaming window in seconds.
    pub duration: u64,
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            runtime: "sudo podman".to_string(),
            ports: vec![60001, 44821],
            success_pattern: "Hello".to_string(),
            duration: 20,
            poll_interval_ms: 500,
        }
    }
}

/// Immutable inputs for one smoke-test run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub image: String,
    pub dataset: Option<PathBuf>,
    pub base_dir: Option<PathBuf>,
    pub testscript: Option<PathBuf>,
    pub ports: Vec<u16>,
    pub duration: Duration,
    pub poll_interval: Duration,
    pub marker: Regex,
    pub logs_dir: PathBuf,
    pub sink_path: PathBuf,
}

impl RunConfig {
    /// Combine CLI arguments with settings; the CLI wins where both apply.
    pub fn resolve(args: &Args, settings: &Settings) -> Result<Self> {
        let image = args.app_name.trim().to_string();
        if image.is_empty() {
            bail!("--app-name must not be empty");
        }
        if settings.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be positive");
        }

        let marker = Regex::new(&settings.success_pattern)
            .with_context(|| format!("invalid success_pattern `{}`", settings.success_pattern))?;

        let logs_dir = logs_dir_for(args.base.as_deref());
        let sink_path = match &args.log_file {
            Some(name) => logs_dir.join(name),
            None => logs_dir.join(format!("{}_output.log", image_stem(&image))),
        };

        Ok(Self {
            image,
            dataset: args.dataset.clone(),
            base_dir: args.base.clone(),
            testscript: args.testscript.clone(),
            ports: settings.ports.clone(),
            duration: Duration::from_secs(args.duration.unwrap_or(settings.duration)),
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            marker,
            logs_dir,
            sink_path,
        })
    }
}

/// `<base>/logs`, or `./logs` without a base directory.
pub fn logs_dir_for(base: Option<&Path>) -> PathBuf {
    base.unwrap_or(Path::new(".")).join("logs")
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["podsmoke", "--app-name", " registry.example/app:latest "];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_follow_settings() {
        let cfg = RunConfig::resolve(&args(&[]), &Settings::default()).unwrap();
        assert_eq!(cfg.image, "registry.example/app:latest");
        assert_eq!(cfg.duration, Duration::from_secs(20));
        assert_eq!(cfg.poll_interval, Duration::from_millis(500));
        assert_eq!(cfg.ports, vec![60001, 44821]);
        assert_eq!(cfg.logs_dir, PathBuf::from("./logs"));
        assert_eq!(cfg.sink_path, PathBuf::from("./logs/app_latest_output.log"));
        assert!(cfg.marker.is_match("Hello world"));
    }

    #[test]
    fn cli_duration_overrides_settings() {
        let settings = Settings {
            duration: 60,
            ..Settings::default()
        };
        let cfg = RunConfig::resolve(&args(&["--duration", "5"]), &settings).unwrap();
        assert_eq!(cfg.duration, Duration::from_secs(5));
    }

    #[test]
    fn base_dir_hosts_logs_and_log_file_overrides_sink_name() {
        let cfg = RunConfig::resolve(
            &args(&["--base", "/bed", "--log-file", "capture.log"]),
            &Settings::default(),
        )
        .unwrap();
        assert_eq!(cfg.logs_dir, PathBuf::from("/bed/logs"));
        assert_eq!(cfg.sink_path, PathBuf::from("/bed/logs/capture.log"));
    }

    #[test]
    fn absolute_log_file_is_used_as_is() {
        let cfg = RunConfig::resolve(&args(&["--log-file", "/tmp/x.log"]), &Settings::default())
            .unwrap();
        assert_eq!(cfg.sink_path, PathBuf::from("/tmp/x.log"));
    }

    #[test]
    fn blank_image_is_rejected() {
        let args = Args::try_parse_from(["podsmoke", "--app-name", "  "]).unwrap();
        assert!(RunConfig::resolve(&args, &Settings::default()).is_err());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let settings = Settings {
            success_pattern: "Hello(".into(),
            ..Settings::default()
        };
        let err = RunConfig::resolve(&args(&[]), &settings).unwrap_err();
        assert!(err.to_string().contains("success_pattern"));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let settings = Settings {
            poll_interval_ms: 0,
            ..Settings::default()
        };
        assert!(RunConfig::resolve(&args(&[]), &settings).is_err());
    }
}
