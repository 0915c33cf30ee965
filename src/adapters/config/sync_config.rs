use std::{path::PathBuf, time::Duration};

#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct WatchConfig {
    pub root: PathBuf,
    pub recursive: bool,
    /// File name whose modification triggers a sheet-to-store copy.
    pub sheet_trigger_file: String,
    /// Extension of the database file whose modification triggers a store-to-sheet copy.
    pub store_trigger_extension: String,
    pub channel_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            recursive: false,
            sheet_trigger_file: "token.json".to_owned(),
            store_trigger_extension: "db".to_owned(),
            channel_capacity: 64,
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Emit a sheet-to-store poll every N seconds. Off when unset.
    pub poll_interval_secs: Option<u64>,
    /// Ignore opposite-direction file events this soon after a copy. 0 disables.
    pub echo_window_ms: u64,
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn echo_window(&self) -> Duration {
        Duration::from_millis(self.echo_window_ms)
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per copy, including the first.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    /// Consecutive failed cycles after which every failure is reported as unhealthy.
    pub unhealthy_after: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 500,
            unhealthy_after: 3,
        }
    }
}
