use thiserror::Error;

use crate::domain::snapshot::Snapshot;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),
    #[error("Table {0} does not exist")]
    TableNotFound(String),
    #[error("Failed to open database connection")]
    Connection,
    #[error("Statement failed")]
    Statement,
    #[error("Row {row} has {found} values, table expects {expected}")]
    ArityMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Blocking database task failed")]
    TaskJoin,
}

#[async_trait::async_trait]
pub trait TableStore: Send + Sync {
    fn table_name(&self) -> &str;

    async fn column_count(&self) -> error_stack::Result<usize, StoreError>;

    /// Full-table scan. Row order is whatever the store yields.
    async fn read_all(&self) -> error_stack::Result<Snapshot, StoreError>;

    /// Inserts every row inside one transaction. Any failing row rolls the whole batch back.
    async fn append_rows(&self, snapshot: &Snapshot) -> error_stack::Result<(), StoreError>;

    /// Deletes every existing row and inserts `snapshot`, atomically.
    async fn replace_rows(&self, snapshot: &Snapshot) -> error_stack::Result<(), StoreError>;
}
