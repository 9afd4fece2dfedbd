use std::path::PathBuf;

use crate::config::Config;
use crate::constants::{
    APP_DIR, DB_FILE, DEFAULT_MAX_BACKOFF_SECS, DEFAULT_MIN_BACKOFF_SECS, DEFAULT_SERVER_URL,
    DEFAULT_SYNC_BATCH_SIZE, DEFAULT_SYNC_INTERVAL_MINUTES, LOG_FILE, SOCKET_FILE,
};

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

fn default_machine() -> String {
    sysinfo::System::host_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = data_dir();
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_token: String::new(),
            sync_interval_minutes: DEFAULT_SYNC_INTERVAL_MINUTES,
            sync_batch_size: DEFAULT_SYNC_BATCH_SIZE as usize,
            sync_min_backoff_secs: DEFAULT_MIN_BACKOFF_SECS,
            sync_max_backoff_secs: DEFAULT_MAX_BACKOFF_SECS,
            metrics_only: false,
            machine: default_machine(),

            socket_path: data_dir.join(SOCKET_FILE),
            db_path: data_dir.join(DB_FILE),
            log_file: data_dir.join(LOG_FILE),
        }
    }
}
