use directories::{BaseDirs, UserDirs};
use std::path::PathBuf;

const APP_DIR: &str = "tropictrek";

pub struct PathManager;

impl PathManager {
    pub fn data_dir() -> Option<PathBuf> {
        BaseDirs::new().map(|d| d.data_dir().join(APP_DIR))
    }

    pub fn config_dir() -> Option<PathBuf> {
        BaseDirs::new().map(|d| d.config_dir().join(APP_DIR))
    }

    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("settings.toml"))
    }

    pub fn logs_dir() -> Option<PathBuf> {
        // On macOS, logs usually go to ~/Library/Logs/
        #[cfg(target_os = "macos")]
        {
            if let Some(dirs) = UserDirs::new() {
                return Some(dirs.home_dir().join("Library/Logs/TropicTrek"));
            }
        }
        Self::data_dir().map(|d| d.join("logs"))
    }

    /// Where downloaded itineraries are saved: the user's download folder,
    /// falling back to `<data dir>/downloads` on systems without one.
    pub fn download_dir() -> Option<PathBuf> {
        UserDirs::new()
            .and_then(|d| d.download_dir().map(|p| p.to_path_buf()))
            .or_else(|| Self::data_dir().map(|d| d.join("downloads")))
    }
}
