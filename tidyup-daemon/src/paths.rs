use std::path::{Path, PathBuf};
use std::time::Duration;

use tidyup_core::cache;

pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Directory the cache watcher observes.
pub fn watch_dir(home: &Path) -> PathBuf {
    cache::tidyup_dir_at(home)
}

/// True for the household state file itself, not its `.tmp` sibling.
pub fn is_state_file(path: &Path) -> bool {
    path.file_name().and_then(|name| name.to_str()) == Some(cache::STATE_FILE)
}
