pub mod app_config;
pub mod sheets_config;
pub mod sync_config;
pub mod table_config;
pub mod telemetry_config;
