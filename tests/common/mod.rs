#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use error_stack::report;
use sheets_sync::{
    domain::{
        sheets::a1_notation::A1Notation,
        snapshot::{CellValue, Snapshot, SnapshotRow},
    },
    ports::{
        sheet_store::{RemoteError, SheetStore},
        table_store::{StoreError, TableStore},
    },
};

pub fn text(value: &str) -> CellValue {
    CellValue::from(value)
}

pub fn text_rows(rows: &[&[&str]]) -> Vec<SnapshotRow> {
    rows.iter()
        .map(|row| row.iter().map(|cell| text(cell)).collect())
        .collect()
}

/// In-memory spreadsheet range of fixed size. Reads drop trailing empty cells and rows, the
/// way the Sheets API does.
pub struct FakeSheetStore {
    grid: Mutex<Vec<SnapshotRow>>,
    row_count: usize,
    column_count: usize,
    reads: AtomicUsize,
    writes: AtomicUsize,
    failing_reads: AtomicUsize,
    stringify_writes: bool,
}

impl FakeSheetStore {
    pub fn new(row_count: usize, column_count: usize) -> Self {
        Self {
            grid: Mutex::new(vec![vec![CellValue::Empty; column_count]; row_count]),
            row_count,
            column_count,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            failing_reads: AtomicUsize::new(0),
            stringify_writes: false,
        }
    }

    /// Stores every written value as text, like a sheet read back as formatted values.
    pub fn stringifying(mut self) -> Self {
        self.stringify_writes = true;
        self
    }

    pub fn with_rows(self, rows: Vec<SnapshotRow>) -> Self {
        self.set_rows(rows);
        self
    }

    pub fn set_rows(&self, rows: Vec<SnapshotRow>) {
        let mut grid = self.grid.lock().unwrap();
        for (index, row) in grid.iter_mut().enumerate() {
            let mut cells = rows.get(index).cloned().unwrap_or_default();
            cells.resize(self.column_count, CellValue::Empty);
            *row = cells;
        }
    }

    pub fn grid(&self) -> Vec<SnapshotRow> {
        self.grid.lock().unwrap().clone()
    }

    pub fn fail_next_reads(&self, count: usize) {
        self.failing_reads.store(count, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SheetStore for FakeSheetStore {
    async fn read_range(&self, _range: &A1Notation) -> error_stack::Result<Snapshot, RemoteError> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let failing = self.failing_reads.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_reads.store(failing - 1, Ordering::SeqCst);
            return Err(report!(RemoteError::FailedToFetchRange));
        }

        let mut rows: Vec<SnapshotRow> = self
            .grid()
            .into_iter()
            .map(|mut row| {
                while row.last().is_some_and(CellValue::is_empty) {
                    row.pop();
                }
                row
            })
            .collect();
        while rows.last().is_some_and(|row| row.is_empty()) {
            rows.pop();
        }

        Ok(Snapshot::new(rows))
    }

    async fn write_range(
        &self,
        _range: &A1Notation,
        snapshot: &Snapshot,
    ) -> error_stack::Result<(), RemoteError> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        if snapshot.len() > self.row_count || snapshot.width() > self.column_count {
            return Err(report!(RemoteError::SnapshotExceedsRange {
                rows: snapshot.len(),
                columns: snapshot.width(),
            }));
        }

        let rows = snapshot
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        CellValue::Integer(_) | CellValue::Real(_) if self.stringify_writes => {
                            CellValue::from(cell.to_string())
                        }
                        other => other.clone(),
                    })
                    .collect()
            })
            .collect();
        self.set_rows(rows);
        Ok(())
    }
}

/// Table of fixed width kept in memory, counting every call.
pub struct FakeTableStore {
    rows: Mutex<Vec<SnapshotRow>>,
    width: usize,
    calls: AtomicUsize,
}

impl FakeTableStore {
    pub fn new(width: usize) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            width,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_rows(self, rows: Vec<SnapshotRow>) -> Self {
        *self.rows.lock().unwrap() = rows;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn rows(&self) -> Vec<SnapshotRow> {
        self.rows.lock().unwrap().clone()
    }

    fn check_arity(&self, snapshot: &Snapshot) -> error_stack::Result<(), StoreError> {
        match snapshot
            .rows()
            .iter()
            .position(|row| row.len() != self.width)
        {
            Some(row) => Err(report!(StoreError::ArityMismatch {
                row,
                expected: self.width,
                found: snapshot.rows()[row].len(),
            })),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl TableStore for FakeTableStore {
    fn table_name(&self) -> &str {
        "fake"
    }

    async fn column_count(&self) -> error_stack::Result<usize, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.width)
    }

    async fn read_all(&self) -> error_stack::Result<Snapshot, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Snapshot::new(self.rows()))
    }

    async fn append_rows(&self, snapshot: &Snapshot) -> error_stack::Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_arity(snapshot)?;
        self.rows
            .lock()
            .unwrap()
            .extend(snapshot.rows().iter().cloned());
        Ok(())
    }

    async fn replace_rows(&self, snapshot: &Snapshot) -> error_stack::Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_arity(snapshot)?;
        *self.rows.lock().unwrap() = snapshot.rows().to_vec();
        Ok(())
    }
}
