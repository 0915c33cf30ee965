use config::{builder::DefaultState, Config, ConfigBuilder, Environment};
use error_stack::{report, ResultExt};
use serde::Deserialize;
use serde_path_to_error::{Deserializer as PathDeserializer, Segment, Track};
use thiserror::Error;

use crate::adapters::sql::sqlite_table::validate_table_name;
use crate::domain::sheets::{
    a1_notation::{A1Notation, A1NotationParseError, FromA1Notation},
    cell_range::CellRange,
};

use super::{
    sheets_config::SpreadsheetConfig,
    sync_config::{RetryConfig, SyncConfig, WatchConfig},
    table_config::TableConfig,
    telemetry_config::TelemetryConfig,
};

pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
pub const ENV_PREFIX: &str = "SHEETS_SYNC";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error reading config file '{0}'")]
    Read(String),
    #[error("Failed to deserialize config at field '{0}'")]
    Deserialize(String),
    #[error("Invalid config value for '{0}'")]
    Invalid(&'static str),
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub sheets: SpreadsheetConfig,
    pub table: TableConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Loads the file named by `CONFIG_PATH` (default `Config`, any extension the `config`
    /// crate understands), overlaid with `SHEETS_SYNC__SECTION__KEY` environment variables.
    pub fn load() -> error_stack::Result<Self, ConfigError> {
        let config_path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "Config".to_string());
        let builder = Config::builder()
            .add_source(config::File::with_name(&config_path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        Self::from_builder(builder, &config_path)
    }

    pub fn from_builder(
        builder: ConfigBuilder<DefaultState>,
        origin: &str,
    ) -> error_stack::Result<Self, ConfigError> {
        let config = builder
            .build()
            .change_context_lazy(|| ConfigError::Read(origin.to_owned()))?;

        let value = config
            .try_deserialize::<serde_json::Value>()
            .change_context_lazy(|| ConfigError::Read(origin.to_owned()))?;

        let app_config = deserialize_tracking_path(value)?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> error_stack::Result<(), ConfigError> {
        if self.sheets.spreadsheet_id.trim().is_empty() {
            return Err(report!(ConfigError::Invalid("sheets.spreadsheet_id")))
                .attach_printable("Spreadsheet id must not be empty");
        }

        let range = A1Notation::from(self.sheets.range.to_string());
        if let Err(report) = CellRange::from_a1_notation(&range) {
            if report.current_context() != &A1NotationParseError::Unbounded {
                return Err(report.change_context(ConfigError::Invalid("sheets.range")));
            }
        }

        validate_table_name(&self.table.table_name)
            .change_context(ConfigError::Invalid("table.table_name"))?;

        if self.retry.max_attempts == 0 {
            return Err(report!(ConfigError::Invalid("retry.max_attempts")))
                .attach_printable("At least one attempt is required");
        }

        if self.watch.store_trigger_extension.trim_start_matches('.').is_empty() {
            return Err(report!(ConfigError::Invalid("watch.store_trigger_extension")));
        }

        Ok(())
    }
}

fn deserialize_tracking_path(
    value: serde_json::Value,
) -> error_stack::Result<AppConfig, ConfigError> {
    use serde::de::IntoDeserializer;

    let mut track = Track::new();
    let path_de = PathDeserializer::new(value.into_deserializer(), &mut track);
    match AppConfig::deserialize(path_de) {
        Ok(app_config) => Ok(app_config),
        Err(error) => {
            let path_str = track
                .path()
                .iter()
                .map(|seg| match seg {
                    Segment::Seq { index } => format!("[{}]", index),
                    Segment::Map { key } => format!(".{}", key),
                    Segment::Enum { variant } => format!("::{}", variant),
                    Segment::Unknown => String::from("<?>"),
                })
                .collect::<String>();

            Err(report!(ConfigError::Deserialize(
                path_str.trim_start_matches('.').to_owned()
            )))
            .attach_printable(error.to_string())
            .attach_printable("Make sure all required fields are present in the configuration file.")
        }
    }
}
