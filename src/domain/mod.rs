pub mod change_event;
pub mod direction;
pub mod sheets;
pub mod snapshot;
