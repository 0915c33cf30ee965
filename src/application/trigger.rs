use std::path::Path;

use crate::adapters::config::sync_config::WatchConfig;
use crate::domain::{
    change_event::{ChangeEvent, ChangeKind, ChangeOrigin},
    direction::Direction,
};

/// Maps change events to a copy direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRules {
    pub sheet_trigger_file: String,
    pub store_trigger_extension: String,
}

impl Default for TriggerRules {
    fn default() -> Self {
        Self::from_config(&WatchConfig::default())
    }
}

impl TriggerRules {
    pub fn from_config(config: &WatchConfig) -> Self {
        Self {
            sheet_trigger_file: config.sheet_trigger_file.clone(),
            store_trigger_extension: config
                .store_trigger_extension
                .trim_start_matches('.')
                .to_owned(),
        }
    }

    /// `None` for events that should not cause a copy. Only modifications qualify.
    pub fn classify(&self, event: &ChangeEvent) -> Option<Direction> {
        if event.kind != ChangeKind::Modified {
            return None;
        }

        match &event.origin {
            ChangeOrigin::Poll(direction) => Some(*direction),
            ChangeOrigin::Path(path) => self.classify_path(path),
        }
    }

    fn classify_path(&self, path: &Path) -> Option<Direction> {
        if path
            .file_name()
            .is_some_and(|name| name == self.sheet_trigger_file.as_str())
        {
            return Some(Direction::SheetToStore);
        }

        if path
            .extension()
            .is_some_and(|extension| extension == self.store_trigger_extension.as_str())
        {
            return Some(Direction::StoreToSheet);
        }

        None
    }
}
