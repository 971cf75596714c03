//! Local cache of the household on disk.
//!
//! # Storage layout
//!
//! ```text
//! ~/.tidyup/                (mode 0700)
//!   state.json              (household state, mode 0600)
//!   household.json          (held identity, mode 0600, absent when offline-only)
//!   config.yaml             (optional, see crate::config)
//! ```
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Loads are tolerant. A missing or unreadable cache is an empty household,
//! logged at `warn` when the file was present but corrupt.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{io_err, CoreError};
use crate::types::{HouseholdIdentity, HouseholdState};

pub const STATE_FILE: &str = "state.json";
pub const IDENTITY_FILE: &str = "household.json";

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.tidyup/`, pure.
pub fn tidyup_dir_at(home: &Path) -> PathBuf {
    home.join(".tidyup")
}

/// `<home>/.tidyup/state.json`, pure.
pub fn state_path_at(home: &Path) -> PathBuf {
    tidyup_dir_at(home).join(STATE_FILE)
}

/// `<home>/.tidyup/household.json`, pure.
pub fn identity_path_at(home: &Path) -> PathBuf {
    tidyup_dir_at(home).join(IDENTITY_FILE)
}

/// Create `<home>/.tidyup/` with mode `0700` if absent.
pub fn ensure_dir_at(home: &Path) -> Result<PathBuf, CoreError> {
    let dir = tidyup_dir_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        set_dir_permissions(&dir)?;
    }
    Ok(dir)
}

// ---------------------------------------------------------------------------
// 2. Household state
// ---------------------------------------------------------------------------

/// Read the cached state. Missing, unreadable, or malformed files all yield
/// the empty state; callers anchor `start_epoch` afterwards.
pub fn load_state_at(home: &Path) -> HouseholdState {
    let path = state_path_at(home);
    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HouseholdState::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read local cache; starting empty");
            return HouseholdState::default();
        }
    };
    match serde_json::from_str(&contents) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corrupt local cache; starting empty");
            HouseholdState::default()
        }
    }
}

pub fn load_state() -> Result<HouseholdState, CoreError> {
    Ok(load_state_at(&home()?))
}

/// Atomically replace the cached state.
pub fn save_state_at(home: &Path, state: &HouseholdState) -> Result<(), CoreError> {
    write_json_atomic(home, STATE_FILE, state)
}

pub fn save_state(state: &HouseholdState) -> Result<(), CoreError> {
    save_state_at(&home()?, state)
}

// ---------------------------------------------------------------------------
// 3. Household identity
// ---------------------------------------------------------------------------

/// The held identity, or `None` when this client has not created or joined
/// a household. A corrupt identity file is treated as absent.
pub fn load_identity_at(home: &Path) -> Result<Option<HouseholdIdentity>, CoreError> {
    let path = identity_path_at(home);
    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(&path, e)),
    };
    match serde_json::from_str(&contents) {
        Ok(identity) => Ok(Some(identity)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt household identity");
            Ok(None)
        }
    }
}

pub fn load_identity() -> Result<Option<HouseholdIdentity>, CoreError> {
    load_identity_at(&home()?)
}

pub fn save_identity_at(home: &Path, identity: &HouseholdIdentity) -> Result<(), CoreError> {
    write_json_atomic(home, IDENTITY_FILE, identity)
}

pub fn save_identity(identity: &HouseholdIdentity) -> Result<(), CoreError> {
    save_identity_at(&home()?, identity)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// serialize → `<file>.tmp` sibling → `chmod 0600` → `rename`.
fn write_json_atomic<T: Serialize>(home: &Path, file: &str, value: &T) -> Result<(), CoreError> {
    let dir = ensure_dir_at(home)?;
    let path = dir.join(file);
    let tmp_path = dir.join(format!("{file}.tmp"));

    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(&tmp_path, json).map_err(|e| io_err(&tmp_path, e))?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// The user's home directory.
pub fn home() -> Result<PathBuf, CoreError> {
    dirs::home_dir().ok_or(CoreError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), CoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), CoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
