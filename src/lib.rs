pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;
pub mod prettyprint;

pub use application::sync_service::{SyncOutcome, SyncService, SyncStats};
pub use application::trigger::TriggerRules;
pub use domain::{change_event::ChangeEvent, direction::Direction, snapshot::Snapshot};
