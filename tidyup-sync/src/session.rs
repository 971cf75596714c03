//! The client session: local snapshot, held identity, and sync coordinator
//! bundled behind an explicit open/close contract.
//!
//! Every successful mutation that changes the snapshot is persisted to the
//! local cache and then pushed. Push failures never undo the mutation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tokio::task::JoinHandle;

use tidyup_core::{
    cache, Assignment, ChoreId, Clock, CoreError, Direction, HouseholdId, HouseholdIdentity,
    HouseholdState, IdGenerator, JoinCode, MemberId, WeekKey,
};

use crate::coordinator::SyncCoordinator;
use crate::error::{RemoteError, SyncError};
use crate::remote::RemoteStore;

/// What a client should present after opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    /// A household identity is held; the snapshot has been pulled once.
    Household,
    /// No identity yet; offer create or join.
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    Refreshed,
    Unchanged,
}

pub struct Session {
    home: PathBuf,
    state: HouseholdState,
    identity: Option<HouseholdIdentity>,
    coordinator: SyncCoordinator,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    pending: Vec<JoinHandle<()>>,
    bootstrap_pull: Option<PullOutcome>,
}

impl Session {
    /// Load the local cache and identity, anchor the start epoch, and pull
    /// once if a household is held. A failed initial pull is logged and the
    /// cached snapshot is used.
    pub async fn open(
        home: &Path,
        remote: Arc<dyn RemoteStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<(Self, Landing), SyncError> {
        let mut state = cache::load_state_at(home);
        let identity = cache::load_identity_at(home)?;
        let now = clock.now().with_timezone(&Local);
        if state.ensure_start_epoch(&now) {
            cache::save_state_at(home, &state)?;
        }

        let coordinator = SyncCoordinator::new(remote, identity.as_ref().map(|i| i.id.clone()));
        let mut session = Self {
            home: home.to_path_buf(),
            state,
            identity,
            coordinator,
            clock,
            ids,
            pending: Vec::new(),
            bootstrap_pull: None,
        };

        if session.identity.is_none() {
            return Ok((session, Landing::Welcome));
        }
        match session.pull().await {
            Ok(outcome) => session.bootstrap_pull = Some(outcome),
            Err(err) => tracing::warn!(error = %err, "initial pull failed; using local cache"),
        }
        Ok((session, Landing::Household))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn state(&self) -> &HouseholdState {
        &self.state
    }

    pub fn identity(&self) -> Option<&HouseholdIdentity> {
        self.identity.as_ref()
    }

    /// Outcome of the pull made by [`Self::open`]; `None` when no household
    /// was held or that pull failed.
    pub fn bootstrap_pull(&self) -> Option<PullOutcome> {
        self.bootstrap_pull
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current instant in the local time zone, which the Sunday anchors use.
    pub fn now(&self) -> DateTime<Local> {
        self.clock.now().with_timezone(&Local)
    }

    pub fn week_index(&self) -> i64 {
        self.state.week_index(&self.now())
    }

    pub fn week_key(&self) -> WeekKey {
        self.state.week_key(&self.now())
    }

    pub fn next_boundary(&self) -> DateTime<Utc> {
        self.state.next_boundary(&self.now())
    }

    pub fn assignments(&self) -> Vec<Assignment> {
        self.state.assignments_for(self.week_index())
    }

    /// Assignments `offset` weeks from the current one.
    pub fn assignments_at_offset(&self, offset: i64) -> Vec<Assignment> {
        self.state
            .assignments_for(self.week_index().saturating_add(offset))
    }

    pub fn is_done(&self, chore: &ChoreId) -> bool {
        self.state.completion.is_done(&self.week_key(), chore)
    }

    // -----------------------------------------------------------------------
    // Local mutations
    // -----------------------------------------------------------------------

    pub fn add_member(&mut self, name: &str) -> Result<Option<MemberId>, SyncError> {
        let added = self.state.add_member(name, self.ids.as_ref());
        if added.is_some() {
            self.commit()?;
        }
        Ok(added)
    }

    pub fn remove_member(&mut self, id: &MemberId) -> Result<bool, SyncError> {
        self.mutate(|state, _| state.remove_member(id))
    }

    pub fn move_member(&mut self, id: &MemberId, direction: Direction) -> Result<bool, SyncError> {
        self.mutate(|state, _| state.move_member(id, direction))
    }

    pub fn add_chore(&mut self, name: &str, details: Option<&str>) -> Result<Option<ChoreId>, SyncError> {
        let added = self.state.add_chore(name, details, self.ids.as_ref());
        if added.is_some() {
            self.commit()?;
        }
        Ok(added)
    }

    pub fn remove_chore(&mut self, id: &ChoreId) -> Result<bool, SyncError> {
        self.mutate(|state, _| state.remove_chore(id))
    }

    pub fn move_chore(&mut self, id: &ChoreId, direction: Direction) -> Result<bool, SyncError> {
        self.mutate(|state, _| state.move_chore(id, direction))
    }

    pub fn set_done(&mut self, chore: &ChoreId, done: bool) -> Result<bool, SyncError> {
        self.mutate(|state, now| state.set_done(now, chore, done))
    }

    /// Returns the new flag.
    pub fn toggle_done(&mut self, chore: &ChoreId) -> Result<bool, SyncError> {
        let now = self.now();
        let done = self.state.toggle_done(&now, chore);
        self.commit()?;
        Ok(done)
    }

    pub fn rotate_now(&mut self) -> Result<(), SyncError> {
        self.mutate(|state, now| {
            state.rotate_now(now);
            true
        })
        .map(|_| ())
    }

    /// Rotate on the server, then pull the result. Offline this is the same
    /// as [`Self::rotate_now`].
    pub async fn rotate_now_remote(&mut self) -> Result<PullOutcome, SyncError> {
        if self.coordinator.is_inert() {
            self.rotate_now()?;
            return Ok(PullOutcome::Refreshed);
        }
        self.flush().await;
        self.coordinator.rotate_remote().await?;
        self.pull().await
    }

    pub fn reset_start(&mut self) -> Result<bool, SyncError> {
        self.mutate(|state, now| state.reset_start(now))
    }

    pub fn clear(&mut self) -> Result<(), SyncError> {
        self.mutate(|state, now| {
            state.clear(now);
            true
        })
        .map(|_| ())
    }

    fn mutate(
        &mut self,
        f: impl FnOnce(&mut HouseholdState, &DateTime<Local>) -> bool,
    ) -> Result<bool, SyncError> {
        let now = self.now();
        let changed = f(&mut self.state, &now);
        if changed {
            self.commit()?;
        }
        Ok(changed)
    }

    /// Persist, then push in the background.
    fn commit(&mut self) -> Result<(), SyncError> {
        cache::save_state_at(&self.home, &self.state)?;
        if let Some(handle) = self.coordinator.push(self.state.clone()) {
            self.pending.retain(|h| !h.is_finished());
            self.pending.push(handle);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Sync
    // -----------------------------------------------------------------------

    /// Fetch the remote snapshot and adopt it if it differs.
    pub async fn pull(&mut self) -> Result<PullOutcome, SyncError> {
        match self.coordinator.fetch().await? {
            Some(incoming) => Ok(self.apply_remote(incoming)?),
            None => Ok(PullOutcome::Unchanged),
        }
    }

    /// Overwrite the local snapshot with `incoming` when they differ
    /// structurally. Never pushes.
    pub fn apply_remote(&mut self, mut incoming: HouseholdState) -> Result<PullOutcome, CoreError> {
        incoming.ensure_start_epoch(&self.now());
        if incoming == self.state {
            return Ok(PullOutcome::Unchanged);
        }
        self.state = incoming;
        cache::save_state_at(&self.home, &self.state)?;
        tracing::info!(
            household = ?self.coordinator.household(),
            "adopted remote snapshot"
        );
        Ok(PullOutcome::Refreshed)
    }

    /// Re-read the local cache after another process wrote it.
    pub fn reload_local(&mut self) -> PullOutcome {
        let mut incoming = cache::load_state_at(&self.home);
        incoming.ensure_start_epoch(&self.now());
        if incoming == self.state {
            return PullOutcome::Unchanged;
        }
        self.state = incoming;
        PullOutcome::Refreshed
    }

    /// Provision a shared household, or return the one already held.
    ///
    /// An empty local household adopts the remote's initial content; either
    /// way the local snapshot is then pushed so the remote record carries an
    /// anchored start.
    pub async fn create_remote(&mut self) -> Result<HouseholdIdentity, SyncError> {
        if let Some(identity) = &self.identity {
            return Ok(identity.clone());
        }
        let created = self.coordinator.remote().create().await?;
        cache::save_identity_at(&self.home, &created.identity)?;
        self.coordinator.attach(created.identity.id.clone());
        self.identity = Some(created.identity.clone());

        if self.state.is_blank() {
            let mut initial = created.state;
            initial.ensure_start_epoch(&self.now());
            self.state = initial;
        }
        self.commit()?;
        tracing::info!(household = %created.identity.id, "created household");
        Ok(created.identity)
    }

    /// Attach to the household behind `code` and adopt its snapshot.
    ///
    /// The identity is stored only after the household's state has been
    /// fetched. Rejected codes and failed fetches leave local state and
    /// identity untouched.
    pub async fn join_remote(&mut self, code: &str) -> Result<HouseholdId, SyncError> {
        let code = JoinCode::from(code).normalized();
        if let Some(held) = &self.identity {
            if held.join_code.matches(&code) {
                return Ok(held.id.clone());
            }
        }
        let remote = self.coordinator.remote().clone();
        if remote.is_inert() {
            return Err(SyncError::InvalidJoinCode { code: code.0 });
        }

        let id = match remote.join(&code).await {
            Ok(id) => id,
            Err(RemoteError::InvalidJoinCode) => {
                return Err(SyncError::InvalidJoinCode { code: code.0 })
            }
            Err(err) => return Err(err.into()),
        };
        let incoming = match remote.fetch_state(&id).await? {
            Some(state) => state,
            None => {
                tracing::warn!(household = %id, "joined household has no state; starting empty");
                HouseholdState::empty_at(&self.now())
            }
        };

        let identity = HouseholdIdentity {
            id: id.clone(),
            join_code: code,
        };
        cache::save_identity_at(&self.home, &identity)?;
        self.coordinator.attach(id.clone());
        self.identity = Some(identity);
        self.apply_remote(incoming)?;
        tracing::info!(household = %id, "joined household");
        Ok(id)
    }

    /// Wait for in-flight pushes.
    pub async fn flush(&mut self) {
        for handle in self.pending.drain(..) {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "push task failed");
            }
        }
    }

    /// Flush pending pushes and drop the session.
    pub async fn close(mut self) {
        self.flush().await;
    }
}
