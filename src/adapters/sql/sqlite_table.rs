use std::{
    fmt::Debug,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use error_stack::{report, ResultExt};
use rusqlite::{
    params_from_iter,
    types::{ToSqlOutput, Value, ValueRef},
    Connection, ToSql, Transaction,
};
use tracing::instrument;

use crate::adapters::config::table_config::TableConfig;
use crate::domain::snapshot::{CellValue, Snapshot};
use crate::ports::table_store::{StoreError, TableStore};

/// Table names are spliced into SQL, so only plain identifiers are accepted.
pub fn validate_table_name(name: &str) -> error_stack::Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(report!(StoreError::InvalidTableName(name.to_owned())))
    }
}

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            CellValue::Empty => ToSqlOutput::Owned(Value::Null),
            CellValue::Text(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
            CellValue::Integer(value) => ToSqlOutput::Owned(Value::Integer(*value)),
            CellValue::Real(value) => ToSqlOutput::Owned(Value::Real(*value)),
        })
    }
}

fn cell_from_value_ref(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Empty,
        ValueRef::Integer(value) => CellValue::Integer(value),
        ValueRef::Real(value) => CellValue::Real(value),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            CellValue::from(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// SQLite-backed table. A connection is opened per operation and all blocking work runs on
/// the blocking thread pool.
#[derive(Clone)]
pub struct SqliteTable {
    path: PathBuf,
    table: String,
    busy_timeout: Duration,
}

impl Debug for SqliteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SqliteTable {{ path: {}, table: {} }}",
            self.path.display(),
            self.table
        )
    }
}

impl SqliteTable {
    pub fn new<P: Into<PathBuf>>(
        path: P,
        table: &str,
    ) -> error_stack::Result<Self, StoreError> {
        validate_table_name(table)?;
        Ok(Self {
            path: path.into(),
            table: table.to_owned(),
            busy_timeout: Duration::from_secs(5),
        })
    }

    pub fn from_config(config: &TableConfig) -> error_stack::Result<Self, StoreError> {
        Ok(Self::new(&config.database_path, &config.table_name)?
            .with_busy_timeout(Duration::from_millis(config.busy_timeout_ms)))
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(path: &Path, busy_timeout: Duration) -> error_stack::Result<Connection, StoreError> {
        let conn = Connection::open(path)
            .change_context(StoreError::Connection)
            .attach_printable_lazy(|| format!("Could not open {}", path.display()))?;
        conn.busy_timeout(busy_timeout)
            .change_context(StoreError::Connection)?;
        Ok(conn)
    }

    fn quoted(table: &str) -> String {
        format!("\"{}\"", table)
    }

    fn column_count_with(conn: &Connection, table: &str) -> error_stack::Result<usize, StoreError> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info(?1)",
                [table],
                |row| row.get(0),
            )
            .change_context(StoreError::Statement)?;

        if count == 0 {
            return Err(report!(StoreError::TableNotFound(table.to_owned())));
        }
        Ok(count as usize)
    }

    fn insert_all(
        tx: &Transaction<'_>,
        table: &str,
        snapshot: &Snapshot,
    ) -> error_stack::Result<usize, StoreError> {
        let columns = Self::column_count_with(tx, table)?;
        let placeholders = (1..=columns)
            .map(|index| format!("?{}", index))
            .collect::<Vec<_>>()
            .join(", ");

        let mut statement = tx
            .prepare(&format!(
                "INSERT INTO {} VALUES ({})",
                Self::quoted(table),
                placeholders
            ))
            .change_context(StoreError::Statement)?;

        for (index, row) in snapshot.rows().iter().enumerate() {
            if row.len() != columns {
                return Err(report!(StoreError::ArityMismatch {
                    row: index,
                    expected: columns,
                    found: row.len(),
                }));
            }

            statement
                .execute(params_from_iter(row.iter()))
                .change_context(StoreError::Statement)
                .attach_printable_lazy(|| format!("Failed to insert row {}: {:?}", index, row))?;
        }

        Ok(snapshot.len())
    }

    /// Runs `work` inside one transaction. Returning an error drops the transaction, which
    /// rolls it back.
    async fn in_transaction<F>(&self, operation: &'static str, work: F) -> error_stack::Result<usize, StoreError>
    where
        F: FnOnce(&Transaction<'_>, &str) -> error_stack::Result<usize, StoreError> + Send + 'static,
    {
        let path = self.path.clone();
        let table = self.table.clone();
        let busy_timeout = self.busy_timeout;

        tokio::task::spawn_blocking(move || {
            let started_at = Instant::now();
            let mut conn = Self::open(&path, busy_timeout)?;
            let tx = conn.transaction().change_context(StoreError::Statement)?;

            let result = work(&tx, &table);
            match result {
                Ok(rows) => {
                    tx.commit().change_context(StoreError::Statement)?;
                    tracing::debug!(
                        "{} on {} committed {} rows in {}ms",
                        operation,
                        table,
                        rows,
                        started_at.elapsed().as_millis()
                    );
                    Ok(rows)
                }
                Err(report) => {
                    tracing::warn!("{} on {} rolled back: {}", operation, table, report.current_context());
                    Err(report)
                }
            }
        })
        .await
        .change_context(StoreError::TaskJoin)?
    }
}

#[async_trait::async_trait]
impl TableStore for SqliteTable {
    fn table_name(&self) -> &str {
        &self.table
    }

    #[instrument]
    async fn column_count(&self) -> error_stack::Result<usize, StoreError> {
        let path = self.path.clone();
        let table = self.table.clone();
        let busy_timeout = self.busy_timeout;

        tokio::task::spawn_blocking(move || {
            let conn = Self::open(&path, busy_timeout)?;
            Self::column_count_with(&conn, &table)
        })
        .await
        .change_context(StoreError::TaskJoin)?
    }

    #[instrument]
    async fn read_all(&self) -> error_stack::Result<Snapshot, StoreError> {
        let path = self.path.clone();
        let table = self.table.clone();
        let busy_timeout = self.busy_timeout;

        tokio::task::spawn_blocking(move || {
            let conn = Self::open(&path, busy_timeout)?;
            Self::column_count_with(&conn, &table)?;

            let mut statement = conn
                .prepare(&format!("SELECT * FROM {}", Self::quoted(&table)))
                .change_context(StoreError::Statement)?;
            let columns = statement.column_count();

            let rows = statement
                .query_map([], |row| {
                    (0..columns)
                        .map(|index| row.get_ref(index).map(cell_from_value_ref))
                        .collect::<rusqlite::Result<Vec<_>>>()
                })
                .change_context(StoreError::Statement)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .change_context(StoreError::Statement)?;

            Ok(Snapshot::new(rows))
        })
        .await
        .change_context(StoreError::TaskJoin)?
    }

    #[instrument(skip(snapshot), fields(rows = snapshot.len()))]
    async fn append_rows(&self, snapshot: &Snapshot) -> error_stack::Result<(), StoreError> {
        let snapshot = snapshot.clone();
        self.in_transaction("append", move |tx, table| {
            Self::insert_all(tx, table, &snapshot)
        })
        .await
        .map(|_| ())
    }

    #[instrument(skip(snapshot), fields(rows = snapshot.len()))]
    async fn replace_rows(&self, snapshot: &Snapshot) -> error_stack::Result<(), StoreError> {
        let snapshot = snapshot.clone();
        self.in_transaction("replace", move |tx, table| {
            tx.execute(&format!("DELETE FROM {}", Self::quoted(table)), [])
                .change_context(StoreError::Statement)?;
            Self::insert_all(tx, table, &snapshot)
        })
        .await
        .map(|_| ())
    }
}
