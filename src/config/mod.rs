mod loader;
mod types;

pub use loader::SETTINGS_FILE;
pub use types::{RunConfig, Settings, logs_dir_for};
