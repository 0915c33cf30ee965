use std::sync::Arc;

use futures::future::join_all;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{trace as sdktrace, Resource};
use sheets_sync::{
    adapters::{
        config::{app_config::AppConfig, telemetry_config::TelemetryConfig},
        sheets::spreadsheet_manager::SpreadsheetManager,
        sql::sqlite_table::SqliteTable,
        watch::{notify_source::NotifyChangeSource, poll_trigger::PollTrigger},
    },
    domain::{direction::Direction, sheets::a1_notation::A1Notation},
    ports::change_source::{ChangeSource, EventSink},
    prettyprint::pretty_formatter::PrettyFormatter,
    SyncService, TriggerRules,
};
use tokio::{signal, sync::watch};
use tracing::{error, info, instrument};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Registry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|report| format!("{report:?}"))?;

    setup_tracing(&config.telemetry)?;
    setup_panic_hook();

    info!("Starting sheets-sync");

    let result = run(config).await;
    if let Err(e) = &result {
        error!("sheets-sync stopped with an error: {}", e);
    }

    opentelemetry::global::shutdown_tracer_provider();
    result
}

#[instrument(skip(config))]
async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let sheet = SpreadsheetManager::new(config.sheets.clone())
        .await
        .map_err(|report| format!("{report:?}"))?;
    let table = SqliteTable::from_config(&config.table).map_err(|report| format!("{report:?}"))?;

    let (sink, events) = EventSink::channel(config.watch.channel_capacity);
    let shutdown = create_shutdown_signal();

    let mut source = NotifyChangeSource::from_config(&config.watch);
    source
        .start(sink.clone())
        .map_err(|report| format!("{report:?}"))?;

    let mut background = Vec::new();
    if let Some(interval) = config.sync.poll_interval() {
        background.push(
            PollTrigger::new(interval, Direction::SheetToStore).spawn(sink.clone(), shutdown.clone()),
        );
    }

    let service = SyncService::new(
        Arc::new(sheet),
        Arc::new(table),
        A1Notation::from(config.sheets.range.to_string()),
        TriggerRules::from_config(&config.watch),
    )
    .with_write_mode(config.table.write_mode)
    .with_retry(config.retry.clone())
    .with_echo_window(config.sync.echo_window());

    let stats = tokio::spawn(service.run(events, shutdown)).await?;

    source.stop();
    join_all(background).await;

    info!(
        "Stopped. events: {}, ignored: {}, skipped: {}, copies ok: {}, copies failed: {}, dropped: {}",
        stats.events_seen,
        stats.ignored,
        stats.skipped,
        stats.copies_ok,
        stats.copies_failed,
        sink.dropped()
    );

    Ok(())
}

fn setup_tracing(telemetry: &TelemetryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let level: tracing::Level = telemetry.level.parse()?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(PrettyFormatter::new(true))
        .with_writer(std::io::stderr);

    let log_file_layer = tracing_subscriber::fmt::layer()
        .event_format(PrettyFormatter::new(false))
        .with_writer(std::fs::File::create(&telemetry.log_file)?)
        .with_ansi(false);

    let otel_layer = match &telemetry.otlp_endpoint {
        Some(endpoint) => {
            let exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint.clone());

            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(exporter)
                .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                    KeyValue::new("service.name", telemetry.service_name.clone()),
                ])))
                .install_batch(opentelemetry_sdk::runtime::Tokio)?;

            Some(OpenTelemetryLayer::new(tracer))
        }
        None => None,
    };

    Registry::default()
        .with(
            tracing_subscriber::filter::Targets::new()
                .with_target("sheets_sync", level),
        )
        .with(otel_layer)
        .with(log_file_layer)
        .with(stderr_layer)
        .init();

    Ok(())
}

fn setup_panic_hook() {
    tracing::trace!("Setting panic hook");
    std::panic::set_hook(Box::new(|info| {
        tracing::error!("panic: {info}");
        opentelemetry::global::shutdown_tracer_provider();
    }));
}

/// Flips to `true` on Ctrl+C, or SIGTERM on unix.
fn create_shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        let ctrl_c = async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C, initiating shutdown"),
                Err(e) => {
                    error!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await
                }
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                    info!("Received SIGTERM, initiating shutdown");
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }

        let _ = tx.send(true);
    });

    rx
}
