use error_stack::{report, ResultExt};
use google_sheets4::{
    api::{ClearValuesRequest, ValueRange},
    Sheets,
};
use std::fmt::Debug;
use tracing::instrument;

use crate::adapters::config::sheets_config::SpreadsheetConfig;
use crate::domain::sheets::{
    a1_notation::{A1Notation, FromA1Notation},
    cell_range::CellRange,
};
use crate::domain::snapshot::Snapshot;
use crate::ports::sheet_store::{RemoteError, SheetStore};

use super::{
    auth::{self, AuthError},
    http_client::{self, HttpsConnector},
    value_range_factory::{IntoSnapshot, ValueRangeFactory},
};

pub struct SpreadsheetManager {
    pub config: SpreadsheetConfig,
    hub: Sheets<HttpsConnector>,
}

impl Debug for SpreadsheetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SpreadsheetManager {{ config: {:?} }}", self.config)
    }
}

impl SpreadsheetManager {
    #[instrument(name = "SpreadsheetManager::new")]
    pub async fn new(config: SpreadsheetConfig) -> error_stack::Result<Self, AuthError> {
        let client = http_client::http_client();
        let auth = auth::auth(&config, client.clone()).await?;
        let hub: Sheets<HttpsConnector> = Sheets::new(client, auth);

        Ok(SpreadsheetManager { config, hub })
    }

    #[instrument(skip(value_range))]
    async fn update_values(
        &self,
        range: &A1Notation,
        value_range: ValueRange,
    ) -> error_stack::Result<(), RemoteError> {
        self.hub
            .spreadsheets()
            .values_update(value_range, &self.config.spreadsheet_id, range.as_ref())
            .value_input_option("USER_ENTERED")
            .doit()
            .await
            .map(|_| ())
            .change_context(RemoteError::FailedToWriteRange)
            .attach_printable_lazy(|| format!("Failed to write to range {} ", range))
    }

    #[instrument]
    async fn clear_values(&self, range: &A1Notation) -> error_stack::Result<(), RemoteError> {
        self.hub
            .spreadsheets()
            .values_clear(
                ClearValuesRequest::default(),
                &self.config.spreadsheet_id,
                range.as_ref(),
            )
            .doit()
            .await
            .map(|_| ())
            .change_context(RemoteError::FailedToClearRange)
            .attach_printable_lazy(|| format!("Failed to clear range {} ", range))
    }
}

/// Checks that `snapshot` fits `range`, returning the rectangle to pad to.
pub(crate) fn bounded_rectangle(
    range: &CellRange,
    snapshot: &Snapshot,
) -> error_stack::Result<(usize, usize), RemoteError> {
    let row_count = range.row_count() as usize;
    let column_count = range.column_count() as usize;

    if snapshot.len() > row_count || snapshot.width() > column_count {
        return Err(report!(RemoteError::SnapshotExceedsRange {
            rows: snapshot.len(),
            columns: snapshot.width(),
        }))
        .attach_printable_lazy(|| {
            format!(
                "Target range holds {} rows x {} columns",
                row_count, column_count
            )
        });
    }

    Ok((row_count, column_count))
}

/// The rectangle a write to `range` must cover, or `None` when the range is open-ended
/// (`Sheet1!A:Z`, or a bare sheet title) and has to be cleared instead.
pub(crate) fn write_rectangle(
    range: &A1Notation,
    snapshot: &Snapshot,
) -> error_stack::Result<Option<(usize, usize)>, RemoteError> {
    match CellRange::from_a1_notation(range) {
        Ok(cell_range) => bounded_rectangle(&cell_range, snapshot).map(Some),
        Err(_) => Ok(None),
    }
}

#[async_trait::async_trait]
impl SheetStore for SpreadsheetManager {
    #[instrument]
    async fn read_range(&self, range: &A1Notation) -> error_stack::Result<Snapshot, RemoteError> {
        let response = self
            .hub
            .spreadsheets()
            .values_get(&self.config.spreadsheet_id, range.as_ref())
            .value_render_option("UNFORMATTED_VALUE")
            .doit()
            .await
            .change_context(RemoteError::FailedToFetchRange)
            .attach_printable_lazy(|| format!("Failed to fetch values for range {}", range))?;

        Ok(response.1.into_snapshot())
    }

    #[instrument(skip(snapshot), fields(rows = snapshot.len()))]
    async fn write_range(
        &self,
        range: &A1Notation,
        snapshot: &Snapshot,
    ) -> error_stack::Result<(), RemoteError> {
        match write_rectangle(range, snapshot)? {
            Some((row_count, column_count)) => {
                let value_range =
                    ValueRange::from_snapshot_padded(snapshot, row_count, column_count);
                self.update_values(range, value_range).await
            }
            None => {
                // The padded rectangle is unknown, clear it first.
                self.clear_values(range).await?;
                self.update_values(range, ValueRange::from_snapshot(snapshot))
                    .await
            }
        }
    }
}
