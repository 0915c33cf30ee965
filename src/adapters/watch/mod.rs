pub mod notify_source;
pub mod poll_trigger;
