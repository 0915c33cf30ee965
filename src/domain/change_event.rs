use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::direction::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// A filesystem notification for this path.
    Path(PathBuf),
    /// A tick of the poll trigger, already bound to a direction.
    Poll(Direction),
}

/// One change notification. Consumed at most once by the sync service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub origin: ChangeOrigin,
    pub kind: ChangeKind,
    pub detected_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn path<P: Into<PathBuf>>(path: P, kind: ChangeKind) -> Self {
        Self {
            origin: ChangeOrigin::Path(path.into()),
            kind,
            detected_at: Utc::now(),
        }
    }

    pub fn modified<P: Into<PathBuf>>(path: P) -> Self {
        Self::path(path, ChangeKind::Modified)
    }

    pub fn poll(direction: Direction) -> Self {
        Self {
            origin: ChangeOrigin::Poll(direction),
            kind: ChangeKind::Modified,
            detected_at: Utc::now(),
        }
    }

    pub fn file_path(&self) -> Option<&Path> {
        match &self.origin {
            ChangeOrigin::Path(path) => Some(path.as_path()),
            ChangeOrigin::Poll(_) => None,
        }
    }

    pub fn is_poll(&self) -> bool {
        matches!(self.origin, ChangeOrigin::Poll(_))
    }
}
