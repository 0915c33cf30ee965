pub mod sqlite_table;
