use std::path::PathBuf;

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Delete every row, then insert the snapshot, in one transaction.
    #[default]
    Replace,
    /// Insert the snapshot after the existing rows.
    Append,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TableConfig {
    pub database_path: PathBuf,
    pub table_name: String,
    #[serde(default)]
    pub write_mode: WriteMode,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}
