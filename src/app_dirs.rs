use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn db_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "spellpal")
            .map(|proj_dirs| proj_dirs.data_local_dir().join("profiles.db"))
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "spellpal").map(|proj_dirs| proj_dirs.config_dir().join("config.json"))
    }
}
