//! Sync coordinator: pushes local snapshots and fetches remote ones.
//!
//! Reconciliation is last-writer-wins on the whole snapshot. Pushes are
//! fire-and-forget; a failed push is logged and dropped, never retried.

use std::sync::Arc;

use tokio::task::JoinHandle;

use tidyup_core::{HouseholdId, HouseholdState};

use crate::error::RemoteError;
use crate::remote::RemoteStore;

#[derive(Clone)]
pub struct SyncCoordinator {
    remote: Arc<dyn RemoteStore>,
    household: Option<HouseholdId>,
}

impl SyncCoordinator {
    pub fn new(remote: Arc<dyn RemoteStore>, household: Option<HouseholdId>) -> Self {
        Self { remote, household }
    }

    pub fn remote(&self) -> &Arc<dyn RemoteStore> {
        &self.remote
    }

    pub fn household(&self) -> Option<&HouseholdId> {
        self.household.as_ref()
    }

    pub fn attach(&mut self, household: HouseholdId) {
        self.household = Some(household);
    }

    /// No remote configured, or no household to talk to.
    pub fn is_inert(&self) -> bool {
        self.remote.is_inert() || self.household.is_none()
    }

    /// Upload `snapshot` in the background.
    ///
    /// Returns `None` when there is nothing to push to, or when called
    /// outside a Tokio runtime.
    pub fn push(&self, snapshot: HouseholdState) -> Option<JoinHandle<()>> {
        if self.remote.is_inert() {
            return None;
        }
        let household = self.household.clone()?;
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(household = %household, "no async runtime; push skipped");
                return None;
            }
        };
        let remote = Arc::clone(&self.remote);
        Some(handle.spawn(async move {
            match remote.store_state(&household, &snapshot).await {
                Ok(()) => tracing::debug!(household = %household, "pushed snapshot"),
                Err(err) => tracing::warn!(household = %household, error = %err, "push failed"),
            }
        }))
    }

    /// Remote snapshot, or `None` when inert or the household is gone.
    pub async fn fetch(&self) -> Result<Option<HouseholdState>, RemoteError> {
        if self.remote.is_inert() {
            return Ok(None);
        }
        match &self.household {
            Some(household) => self.remote.fetch_state(household).await,
            None => Ok(None),
        }
    }

    pub async fn rotate_remote(&self) -> Result<(), RemoteError> {
        match &self.household {
            Some(household) if !self.remote.is_inert() => self.remote.rotate_now(household).await,
            _ => Ok(()),
        }
    }
}
