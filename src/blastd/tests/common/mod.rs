#![allow(dead_code)]

use blastd::config::Config;
use blastd::daemon::{daemon_run, DaemonClient};
use blastd::storage::ActivityBuffer;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const MACHINE: &str = "test-machine";

/// A daemon serving from a temporary data directory.
pub struct TestDaemon {
    pub dir: TempDir,
    pub config: Config,
    pub cancellation_token: CancellationToken,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestDaemon {
    pub async fn start(server_url: &str, api_token: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            server_url: server_url.to_string(),
            api_token: api_token.to_string(),
            sync_interval_minutes: 60,
            sync_min_backoff_secs: 1,
            sync_max_backoff_secs: 1,
            machine: MACHINE.to_string(),
            socket_path: dir.path().join("blastd.sock"),
            db_path: dir.path().join("blast.db"),
            log_file: dir.path().join("blastd.log"),
            ..Config::default()
        };

        let cancellation_token = CancellationToken::new();
        let handle = tokio::spawn({
            let config = config.clone();
            let cancellation_token = cancellation_token.clone();
            async move { daemon_run::serve(&config, cancellation_token).await }
        });

        for _ in 0..250 {
            if config.socket_path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(config.socket_path.exists(), "daemon never bound its socket");

        Self {
            dir,
            config,
            cancellation_token,
            handle,
        }
    }

    pub fn client(&self) -> DaemonClient {
        DaemonClient::new(&self.config.socket_path)
    }

    pub async fn buffer(&self) -> ActivityBuffer {
        ActivityBuffer::open(&self.config.db_path).await.unwrap()
    }

    /// Signals shutdown and waits for the final drain to finish.
    pub async fn stop(self) -> (TempDir, Config) {
        self.cancellation_token.cancel();
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("daemon did not stop")
            .unwrap()
            .unwrap();
        (self.dir, self.config)
    }
}
