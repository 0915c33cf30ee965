use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::change_event::ChangeEvent;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WatchError {
    #[error("Change source was already started")]
    AlreadyStarted,
    #[error("Failed to create watcher")]
    FailedToCreateWatcher,
    #[error("Failed to watch {0}")]
    FailedToWatch(String),
}

/// Producer side of the single ordered channel feeding the sync service.
///
/// Delivery never blocks the producer: when the channel is full the event is dropped and
/// counted, so bursts lose events instead of stalling the watcher thread.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: mpsc::Sender<ChangeEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventSink {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ChangeEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            receiver,
        )
    }

    /// Returns `false` if the event was dropped.
    pub fn offer(&self, event: ChangeEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(
                    "Event channel full, dropped {:?} (total dropped: {})",
                    event.origin,
                    dropped
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Waits for room in the channel. Used by producers that may suspend.
    pub async fn send(&self, event: ChangeEvent) -> bool {
        self.sender.send(event).await.is_ok()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// A source of change events. Sources are not restartable.
pub trait ChangeSource: Send {
    fn start(&mut self, sink: EventSink) -> error_stack::Result<(), WatchError>;
}
