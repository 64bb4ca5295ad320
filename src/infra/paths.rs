// src/infra/paths.rs — Config file location
//
// GENSTREAM_HOME overrides everything. Otherwise config lives in ~/.genstream/.

use std::path::PathBuf;

fn genstream_home() -> Option<PathBuf> {
    std::env::var_os("GENSTREAM_HOME").map(PathBuf::from)
}

/// Home directory, or the working directory when none can be determined.
pub fn dirs_home() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $GENSTREAM_HOME/ or ~/.genstream/
pub fn config_dir() -> PathBuf {
    if let Some(home) = genstream_home() {
        return home;
    }
    dirs_home().join(".genstream")
}

pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
