pub mod sync_service;
pub mod trigger;
