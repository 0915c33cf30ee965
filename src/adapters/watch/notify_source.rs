use std::path::PathBuf;

use error_stack::{report, ResultExt};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, instrument, warn};

use crate::adapters::config::sync_config::WatchConfig;
use crate::domain::change_event::{ChangeEvent, ChangeKind};
use crate::ports::change_source::{ChangeSource, EventSink, WatchError};

/// Filesystem change source backed by the platform watcher (inotify, FSEvents, ...).
///
/// Events are pushed from the watcher thread into the sink without blocking; the sink
/// counts whatever it has to drop.
pub struct NotifyChangeSource {
    root: PathBuf,
    recursive: bool,
    started: bool,
    /// Keep watcher alive (it stops when dropped)
    watcher: Option<RecommendedWatcher>,
}

impl std::fmt::Debug for NotifyChangeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyChangeSource")
            .field("root", &self.root)
            .field("recursive", &self.recursive)
            .field("started", &self.started)
            .finish()
    }
}

impl NotifyChangeSource {
    pub fn new<P: Into<PathBuf>>(root: P, recursive: bool) -> Self {
        Self {
            root: root.into(),
            recursive,
            started: false,
            watcher: None,
        }
    }

    pub fn from_config(config: &WatchConfig) -> Self {
        Self::new(&config.root, config.recursive)
    }

    /// Stops delivering events. The source cannot be started again.
    pub fn stop(&mut self) {
        if self.watcher.take().is_some() {
            info!("Stopped watching {}", self.root.display());
        }
    }
}

fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        _ => None,
    }
}

fn forward(sink: &EventSink, event: Event) {
    let Some(kind) = change_kind(&event.kind) else {
        return;
    };

    for path in event.paths {
        debug!("Detected {:?} on {}", kind, path.display());
        sink.offer(ChangeEvent::path(path, kind));
    }
}

impl ChangeSource for NotifyChangeSource {
    #[instrument(skip(sink))]
    fn start(&mut self, sink: EventSink) -> error_stack::Result<(), WatchError> {
        if self.started {
            return Err(report!(WatchError::AlreadyStarted));
        }
        self.started = true;

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => forward(&sink, event),
                Err(e) => warn!("Watch error: {}", e),
            },
            Config::default(),
        )
        .change_context(WatchError::FailedToCreateWatcher)?;

        let mode = if self.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(&self.root, mode)
            .change_context_lazy(|| WatchError::FailedToWatch(self.root.display().to_string()))?;

        info!("Started watching {} ({:?})", self.root.display(), mode);
        self.watcher = Some(watcher);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_change_kind_mapping() {
        use notify::event::{CreateKind, ModifyKind, RemoveKind};

        assert_eq!(
            change_kind(&EventKind::Create(CreateKind::File)),
            Some(ChangeKind::Created)
        );
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Any)),
            Some(ChangeKind::Modified)
        );
        assert_eq!(
            change_kind(&EventKind::Remove(RemoveKind::File)),
            Some(ChangeKind::Deleted)
        );
        assert_eq!(change_kind(&EventKind::Any), None);
    }

    #[tokio::test]
    async fn test_forward_emits_one_event_per_path() {
        let (sink, mut receiver) = EventSink::channel(8);
        let event = Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
            .add_path(PathBuf::from("a.db"))
            .add_path(PathBuf::from("token.json"));

        forward(&sink, event);

        let first = receiver.recv().await.unwrap();
        let second = receiver.recv().await.unwrap();
        assert_eq!(first.file_path(), Some(std::path::Path::new("a.db")));
        assert_eq!(second.file_path(), Some(std::path::Path::new("token.json")));
        assert_eq!(second.kind, ChangeKind::Modified);
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = NotifyChangeSource::new(dir.path(), false);
        let (sink, _receiver) = EventSink::channel(8);

        source.start(sink.clone()).unwrap();
        let error = source.start(sink).unwrap_err();
        assert_eq!(error.current_context(), &WatchError::AlreadyStarted);
    }

    #[tokio::test]
    async fn test_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = NotifyChangeSource::new(dir.path().join("missing"), false);
        let (sink, _receiver) = EventSink::channel(8);

        let error = source.start(sink).unwrap_err();
        assert!(matches!(
            error.current_context(),
            WatchError::FailedToWatch(_)
        ));
    }

    #[tokio::test]
    async fn test_reports_file_modification() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("sync.db");
        std::fs::write(&target, b"v1").unwrap();

        let mut source = NotifyChangeSource::new(dir.path(), false);
        let (sink, mut receiver) = EventSink::channel(64);
        source.start(sink).unwrap();

        std::fs::write(&target, b"v2").unwrap();

        let seen = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(event) = receiver.recv().await {
                if event.file_path().and_then(|p| p.file_name()) == target.file_name() {
                    return true;
                }
            }
            false
        })
        .await
        .unwrap_or(false);

        source.stop();
        assert!(seen, "no event for {}", target.display());
    }
}
