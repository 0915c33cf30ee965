pub mod config;
pub mod sheets;
pub mod sql;
pub mod watch;
