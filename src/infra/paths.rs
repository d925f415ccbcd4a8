// src/infra/paths.rs — Config file locations
//
// MOVE_TRIMMER_HOME overrides the user-level directory for isolation.
// When unset, the user config lives in ~/.move-trimmer/.

use std::path::{Path, PathBuf};

/// Name of the per-project config file, looked up in the project directory.
pub const PROJECT_CONFIG_FILE: &str = "move-trimmer.toml";

/// Returns the MOVE_TRIMMER_HOME override, if set.
fn trimmer_home() -> Option<PathBuf> {
    std::env::var_os("MOVE_TRIMMER_HOME").map(PathBuf::from)
}

/// Home directory, if one can be determined.
pub fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

/// Configuration directory: $MOVE_TRIMMER_HOME/ or ~/.move-trimmer/
pub fn config_dir() -> Option<PathBuf> {
    if let Some(home) = trimmer_home() {
        return Some(home);
    }
    dirs_home().map(|h| h.join(".move-trimmer"))
}

/// User-level config file path
pub fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Project-level config file path
pub fn project_config_path(project: &Path) -> PathBuf {
    project.join(PROJECT_CONFIG_FILE)
}
