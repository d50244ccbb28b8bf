use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("vigil"))
        } else {
            ProjectDirs::from("", "", "vigil")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn activity_log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("activity.log"))
    }

    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", "vigil") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("vigil_config.json")
        }
    }
}
