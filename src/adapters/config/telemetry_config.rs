use std::path::PathBuf;

#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TelemetryConfig {
    pub level: String,
    pub log_file: PathBuf,
    /// OTLP gRPC collector, e.g. `http://localhost:4317`. Export is off when unset.
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            log_file: PathBuf::from("sheets_sync.log"),
            otlp_endpoint: None,
            service_name: "sheets_sync".to_owned(),
        }
    }
}
