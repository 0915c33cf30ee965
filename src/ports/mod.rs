pub mod change_source;
pub mod sheet_store;
pub mod table_store;
