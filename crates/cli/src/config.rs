// ABOUTME: Runtime configuration read from the environment, with an optional local .env file.
// ABOUTME: Command-line flags override every value here.

use std::env;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use tracing::debug;

pub const DEFAULT_DATA_FILE: &str = "data/current_list.json";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub google_maps_api_key: Option<SecretString>,
    pub data_file: PathBuf,
    pub output_dir: PathBuf,
    pub user_agent: Option<String>,
    pub timeout: Duration,
    pub sleep: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            google_maps_api_key: value("GOOGLE_MAPS_API_KEY").map(SecretString::from),
            data_file: value("VENUEMAP_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE)),
            output_dir: value("VENUEMAP_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            user_agent: value("VENUEMAP_USER_AGENT"),
            timeout: value("VENUEMAP_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(30)),
            sleep: value("VENUEMAP_SLEEP_SECONDS")
                .and_then(|v| v.trim().parse::<f64>().ok())
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .unwrap_or(Duration::from_secs(1)),
        }
    }
}

fn load_dotenv() {
    if let Err(err) = dotenvy::dotenv() {
        match &err {
            dotenvy::Error::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {}
            _ => debug!(?err, "unable to load .env file"),
        }
    }
}
