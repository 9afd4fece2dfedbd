use std::time::Duration;

pub const APP_DIR: &str = "blastd";
pub const CONFIG_FILE: &str = "config.toml";
pub const SOCKET_FILE: &str = "blastd.sock";
pub const DB_FILE: &str = "blast.db";
pub const LOG_FILE: &str = "blastd.log";
pub const ENV_PREFIX: &str = "BLASTD";

pub const DEFAULT_SERVER_URL: &str = "https://blast.taigrr.com";
pub const DEFAULT_SYNC_INTERVAL_MINUTES: u64 = 10;
pub const DEFAULT_SYNC_BATCH_SIZE: u64 = 100;
pub const DEFAULT_MIN_BACKOFF_SECS: u64 = 30;
pub const DEFAULT_MAX_BACKOFF_SECS: u64 = 30 * 60;

pub const ACTIVITIES_PATH: &str = "/api/activities";
/// Replaces project and remote when only metrics may leave the machine.
pub const REDACTED_VALUE: &str = "private";

pub const SYNC_RATE_LIMIT: usize = 10;
pub const SYNC_RATE_WINDOW: Duration = Duration::from_secs(10 * 60);
