use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use error_stack::ResultExt;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument, warn};

use crate::adapters::config::{sync_config::RetryConfig, table_config::WriteMode};
use crate::domain::{
    change_event::ChangeEvent, direction::Direction, sheets::a1_notation::A1Notation,
};
use crate::ports::{sheet_store::SheetStore, table_store::TableStore};

use super::trigger::TriggerRules;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Failed to read spreadsheet range {0}")]
    ReadSheet(String),
    #[error("Failed to write spreadsheet range {0}")]
    WriteSheet(String),
    #[error("Failed to read table {0}")]
    ReadTable(String),
    #[error("Failed to write table {0}")]
    WriteTable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Opposite-direction event right after a copy, caused by the copy itself.
    Echo,
    /// Poll found the same sheet content as the last sync.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Ignored,
    Skipped(SkipReason),
    Copied { direction: Direction, rows: usize },
    Failed { direction: Direction },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub events_seen: u64,
    pub ignored: u64,
    pub skipped: u64,
    pub copies_ok: u64,
    pub copies_failed: u64,
    pub consecutive_failures: u32,
}

/// Result of one successful copy attempt.
enum CopyResult {
    Done { rows: usize },
    Unchanged,
}

/// Consumes change events one at a time and copies between the spreadsheet and the table.
///
/// There is a single consumer, so the two directions never run concurrently.
pub struct SyncService {
    sheet: Arc<dyn SheetStore>,
    table: Arc<dyn TableStore>,
    range: A1Notation,
    rules: TriggerRules,
    write_mode: WriteMode,
    retry: RetryConfig,
    echo_window: Duration,
    last_sheet_hash: Option<[u8; 32]>,
    last_copy: Option<(Direction, Instant)>,
    stats: SyncStats,
}

impl std::fmt::Debug for SyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService")
            .field("range", &self.range)
            .field("table", &self.table.table_name())
            .field("write_mode", &self.write_mode)
            .field("stats", &self.stats)
            .finish()
    }
}

impl SyncService {
    pub fn new(
        sheet: Arc<dyn SheetStore>,
        table: Arc<dyn TableStore>,
        range: A1Notation,
        rules: TriggerRules,
    ) -> Self {
        Self {
            sheet,
            table,
            range,
            rules,
            write_mode: WriteMode::default(),
            retry: RetryConfig::default(),
            echo_window: Duration::ZERO,
            last_sheet_hash: None,
            last_copy: None,
            stats: SyncStats::default(),
        }
    }

    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_echo_window(mut self, echo_window: Duration) -> Self {
        self.echo_window = echo_window;
        self
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Handles events until shutdown is signalled or every producer is gone.
    ///
    /// Shutdown is only observed between events, so a copy in progress always completes.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<ChangeEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> SyncStats {
        info!(
            "Syncing {} <-> table {} ({:?} mode)",
            self.range,
            self.table.table_name(),
            self.write_mode
        );

        loop {
            tokio::select! {
                biased;
                true = async { shutdown.wait_for(|&stop| stop).await.is_ok() } => {
                    info!("Shutdown requested, stopping sync loop");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => {
                        self.handle_event(event).await;
                    }
                    None => {
                        info!("Event channel closed, stopping sync loop");
                        break;
                    }
                },
            }
        }

        self.stats
    }

    #[instrument(skip(self, event), fields(origin = ?event.origin))]
    pub async fn handle_event(&mut self, event: ChangeEvent) -> SyncOutcome {
        self.stats.events_seen += 1;

        let Some(direction) = self.rules.classify(&event) else {
            debug!("Ignoring {:?} {:?}", event.kind, event.origin);
            self.stats.ignored += 1;
            return SyncOutcome::Ignored;
        };

        if !event.is_poll() && self.is_echo(direction) {
            debug!("Discarding {} event caused by the previous copy", direction);
            self.stats.skipped += 1;
            return SyncOutcome::Skipped(SkipReason::Echo);
        }

        match self.copy_with_retry(direction, event.is_poll()).await {
            Ok(CopyResult::Done { rows }) => {
                info!("✅ {}: copied {} rows", direction, rows);
                self.stats.copies_ok += 1;
                self.stats.consecutive_failures = 0;
                self.last_copy = Some((direction, Instant::now()));
                SyncOutcome::Copied { direction, rows }
            }
            Ok(CopyResult::Unchanged) => {
                debug!("Sheet unchanged since last sync");
                self.stats.skipped += 1;
                SyncOutcome::Skipped(SkipReason::Unchanged)
            }
            Err(report) => {
                self.stats.copies_failed += 1;
                self.stats.consecutive_failures += 1;
                if self.stats.consecutive_failures >= self.retry.unhealthy_after {
                    error!(
                        "❌ {} failed, sync unhealthy after {} consecutive failures: {:?}",
                        direction, self.stats.consecutive_failures, report
                    );
                } else {
                    error!("❌ {} failed: {:?}", direction, report);
                }
                SyncOutcome::Failed { direction }
            }
        }
    }

    fn is_echo(&self, direction: Direction) -> bool {
        match self.last_copy {
            Some((last, finished_at)) if last == direction.opposite() => {
                finished_at.elapsed() < self.echo_window
            }
            _ => false,
        }
    }

    async fn copy_with_retry(
        &mut self,
        direction: Direction,
        skip_unchanged: bool,
    ) -> error_stack::Result<CopyResult, SyncError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut backoff = Duration::from_millis(self.retry.initial_backoff_ms);
        let mut attempt = 1;

        loop {
            let result = match direction {
                Direction::SheetToStore => self.sheet_to_store(skip_unchanged).await,
                Direction::StoreToSheet => self.store_to_sheet().await,
            };

            match result {
                Err(report) if attempt < max_attempts => {
                    warn!(
                        "{} attempt {}/{} failed, retrying in {:?}: {}",
                        direction,
                        attempt,
                        max_attempts,
                        backoff,
                        report.current_context()
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                result => {
                    return result.attach_printable_lazy(|| {
                        format!("after {} attempt(s)", attempt)
                    })
                }
            }
        }
    }

    #[instrument(skip(self))]
    async fn sheet_to_store(&mut self, skip_unchanged: bool) -> error_stack::Result<CopyResult, SyncError> {
        let snapshot = self
            .sheet
            .read_range(&self.range)
            .await
            .change_context_lazy(|| SyncError::ReadSheet(self.range.to_string()))?;

        let hash = snapshot.content_hash();
        if skip_unchanged && self.last_sheet_hash == Some(hash) {
            return Ok(CopyResult::Unchanged);
        }

        let table_name = self.table.table_name().to_owned();
        let column_count = self
            .table
            .column_count()
            .await
            .change_context_lazy(|| SyncError::WriteTable(table_name.clone()))?;

        // Sheets omit trailing empty cells.
        let snapshot = snapshot.pad_rows_to(column_count);
        let rows = snapshot.len();

        match self.write_mode {
            WriteMode::Replace => self.table.replace_rows(&snapshot).await,
            WriteMode::Append => self.table.append_rows(&snapshot).await,
        }
        .change_context_lazy(|| SyncError::WriteTable(table_name.clone()))?;

        self.last_sheet_hash = Some(hash);
        Ok(CopyResult::Done { rows })
    }

    #[instrument(skip(self))]
    async fn store_to_sheet(&mut self) -> error_stack::Result<CopyResult, SyncError> {
        let snapshot = self
            .table
            .read_all()
            .await
            .change_context_lazy(|| SyncError::ReadTable(self.table.table_name().to_owned()))?;

        self.sheet
            .write_range(&self.range, &snapshot)
            .await
            .change_context_lazy(|| SyncError::WriteSheet(self.range.to_string()))?;

        // The sheet parses its input, so hash what it now returns.
        self.last_sheet_hash = match self.sheet.read_range(&self.range).await {
            Ok(written) => Some(written.content_hash()),
            Err(report) => {
                warn!("Could not re-read {} after writing: {:?}", self.range, report);
                None
            }
        };

        Ok(CopyResult::Done {
            rows: snapshot.len(),
        })
    }
}
