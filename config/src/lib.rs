pub mod paths;
pub mod settings;

pub use paths::PathManager;
pub use settings::{AppConfig, Overrides, Settings};

/// Environment variable holding the backend base URL.
pub const API_URL_ENV: &str = "TROPICTREK_API_URL";

/// Load environment variables from .env files.
/// `./.env` is read before `~/.env`; dotenv never overwrites a variable that is
/// already set, so the process environment wins, then the project file, then
/// the home file.
/// Call this before parsing CLI args so `TROPICTREK_API_URL` is visible to clap.
pub fn load_env_file() {
    dotenv::dotenv().ok();

    if let Some(home) = dirs::home_dir() {
        dotenv::from_path(home.join(".env")).ok();
    }
}
