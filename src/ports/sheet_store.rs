use thiserror::Error;

use crate::domain::{sheets::a1_notation::A1Notation, snapshot::Snapshot};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Failed to fetch range")]
    FailedToFetchRange,
    #[error("Failed to write range")]
    FailedToWriteRange,
    #[error("Failed to clear range")]
    FailedToClearRange,
    #[error("Snapshot of {rows}x{columns} does not fit the target range")]
    SnapshotExceedsRange { rows: usize, columns: usize },
}

#[async_trait::async_trait]
pub trait SheetStore: Send + Sync {
    /// Reads every value in `range`. Missing cells are omitted, so rows may be ragged.
    async fn read_range(&self, range: &A1Notation)
        -> error_stack::Result<Snapshot, RemoteError>;

    /// Overwrites `range` with `snapshot`. Cells inside the range that the snapshot does not
    /// cover end up empty; cells outside the range are untouched.
    async fn write_range(
        &self,
        range: &A1Notation,
        snapshot: &Snapshot,
    ) -> error_stack::Result<(), RemoteError>;
}
