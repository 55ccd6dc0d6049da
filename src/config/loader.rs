use std::path::Path;

use anyhow::{Context, Result};

use super::types::Settings;

/// Name of the settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = ".podsmoke.yaml";

impl Settings {
    /// Load settings from a `.podsmoke.yaml` file in the given directory.
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Self::load_file(&path).map(Some)
    }

    /// Load settings from an explicit path, which must exist.
    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        // An empty document means "all defaults".
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents)
            .with_context(|| format!("invalid settings file {}", path.display()))
    }

    /// Resolve settings from an explicit path, else the working directory,
    /// else defaults.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_file(path),
            None => Ok(Self::load(cwd)?.unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            "runtime: docker\nports: [8080]\n",
        )
        .unwrap();
        let settings = Settings::load(dir.path()).unwrap().unwrap();
        assert_eq!(settings.runtime, "docker");
        assert_eq!(settings.ports, vec![8080]);
        assert_eq!(settings.success_pattern, "Hello");
        assert_eq!(settings.duration, 20);
    }

    #[test]
    fn empty_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yaml");
        std::fs::write(&path, "\n").unwrap();
        let settings = Settings::load_file(&path).unwrap();
        assert_eq!(settings.runtime, "sudo podman");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.yaml");
        std::fs::write(&path, "runtimee: docker\n").unwrap();
        assert!(Settings::load_file(&path).is_err());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(Settings::discover(Some(&missing), dir.path()).is_err());
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::discover(None, dir.path()).unwrap();
        assert_eq!(settings.poll_interval_ms, 500);
    }
}
