//! Remote store port and its adapters.
//!
//! The [`RemoteStore`] trait is the opaque read/write API of the shared
//! household record. Three adapters implement it:
//!
//! - [`HttpRemoteStore`]: the TidyUp REST backend over `ureq`
//! - [`OfflineRemote`]: inert strategy used when no remote is configured
//! - [`MemoryRemote`]: shared in-process store for tests and demos

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Deserialize;

use tidyup_core::epoch;
use tidyup_core::{HouseholdId, HouseholdIdentity, HouseholdState, IdGenerator, JoinCode};

use crate::error::RemoteError;

/// Name of the cookie the backend checks on authenticated writes.
pub const AUTH_COOKIE: &str = "tidyup_auth";

/// Result of provisioning a new shared household.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedHousehold {
    pub identity: HouseholdIdentity,
    pub state: HouseholdState,
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// `true` for the offline strategy: push and pull become no-ops.
    fn is_inert(&self) -> bool {
        false
    }

    async fn create(&self) -> Result<CreatedHousehold, RemoteError>;

    /// Resolve a join code. Unknown codes are [`RemoteError::InvalidJoinCode`].
    async fn join(&self, code: &JoinCode) -> Result<HouseholdId, RemoteError>;

    /// Current remote snapshot, or `None` when the household does not exist.
    async fn fetch_state(&self, id: &HouseholdId) -> Result<Option<HouseholdState>, RemoteError>;

    async fn store_state(&self, id: &HouseholdId, state: &HouseholdState) -> Result<(), RemoteError>;

    /// Server-side rotation: moves the stored start back by one week.
    async fn rotate_now(&self, id: &HouseholdId) -> Result<(), RemoteError>;
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: HouseholdId,
    join_code: JoinCode,
    #[serde(default)]
    state: HouseholdState,
}

#[derive(Debug, Deserialize)]
struct JoinResponse {
    id: HouseholdId,
}

/// Client for the TidyUp REST backend.
///
/// `ureq` is blocking, so every request runs on the blocking pool.
#[derive(Clone)]
pub struct HttpRemoteStore {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            agent: ureq::AgentBuilder::new().build(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn blocking<T, F>(f: F) -> Result<T, RemoteError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, RemoteError> + Send + 'static,
    {
        tokio::task::spawn_blocking(f).await?
    }
}

fn auth_cookie(id: &HouseholdId) -> String {
    format!("{AUTH_COOKIE}={id}")
}

fn request_error(url: &str, err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(status, _) => RemoteError::Status {
            url: url.to_string(),
            status,
        },
        ureq::Error::Transport(t) => RemoteError::Transport {
            url: url.to_string(),
            message: t.to_string(),
        },
    }
}

fn decode<T: serde::de::DeserializeOwned>(url: &str, response: ureq::Response) -> Result<T, RemoteError> {
    response.into_json::<T>().map_err(|e| RemoteError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn create(&self) -> Result<CreatedHousehold, RemoteError> {
        let agent = self.agent.clone();
        let url = self.url("/households");
        Self::blocking(move || {
            let response = agent.post(&url).call().map_err(|e| request_error(&url, e))?;
            let body: CreateResponse = decode(&url, response)?;
            Ok(CreatedHousehold {
                identity: HouseholdIdentity {
                    id: body.id,
                    join_code: body.join_code,
                },
                state: body.state,
            })
        })
        .await
    }

    async fn join(&self, code: &JoinCode) -> Result<HouseholdId, RemoteError> {
        let agent = self.agent.clone();
        let url = self.url("/join");
        let code = code.normalized();
        Self::blocking(move || {
            let response = match agent.post(&url).query("code", &code.0).call() {
                Ok(r) => r,
                Err(ureq::Error::Status(403 | 404, _)) => return Err(RemoteError::InvalidJoinCode),
                Err(e) => return Err(request_error(&url, e)),
            };
            let body: JoinResponse = decode(&url, response)?;
            Ok(body.id)
        })
        .await
    }

    async fn fetch_state(&self, id: &HouseholdId) -> Result<Option<HouseholdState>, RemoteError> {
        let agent = self.agent.clone();
        let url = self.url(&format!("/households/{id}/state"));
        Self::blocking(move || match agent.get(&url).call() {
            Ok(response) => decode(&url, response).map(Some),
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(e) => Err(request_error(&url, e)),
        })
        .await
    }

    async fn store_state(&self, id: &HouseholdId, state: &HouseholdState) -> Result<(), RemoteError> {
        let agent = self.agent.clone();
        let url = self.url(&format!("/households/{id}/state"));
        let cookie = auth_cookie(id);
        let body = serde_json::to_string(state).map_err(|e| RemoteError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;
        Self::blocking(move || {
            agent
                .post(&url)
                .set("Content-Type", "application/json")
                .set("Cookie", &cookie)
                .send_string(&body)
                .map_err(|e| request_error(&url, e))?;
            Ok(())
        })
        .await
    }

    async fn rotate_now(&self, id: &HouseholdId) -> Result<(), RemoteError> {
        let agent = self.agent.clone();
        let url = self.url(&format!("/households/{id}/rotate-now"));
        let cookie = auth_cookie(id);
        Self::blocking(move || {
            agent
                .post(&url)
                .set("Cookie", &cookie)
                .call()
                .map_err(|e| request_error(&url, e))?;
            Ok(())
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Offline
// ---------------------------------------------------------------------------

/// Inert store for running without a backend.
///
/// `create` mints a local household whose join code is the first six
/// characters of its id, upper-cased. No code ever resolves remotely; a
/// session accepts only the code it already holds.
pub struct OfflineRemote {
    ids: Arc<dyn IdGenerator>,
}

impl OfflineRemote {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }
}

/// Join code derived from a locally minted household id.
pub fn local_join_code(id: &HouseholdId) -> JoinCode {
    JoinCode(id.0.chars().take(6).collect::<String>().to_uppercase())
}

#[async_trait]
impl RemoteStore for OfflineRemote {
    fn is_inert(&self) -> bool {
        true
    }

    async fn create(&self) -> Result<CreatedHousehold, RemoteError> {
        let id = HouseholdId::from(self.ids.new_id());
        let join_code = local_join_code(&id);
        Ok(CreatedHousehold {
            identity: HouseholdIdentity { id, join_code },
            state: HouseholdState::default(),
        })
    }

    async fn join(&self, _code: &JoinCode) -> Result<HouseholdId, RemoteError> {
        Err(RemoteError::InvalidJoinCode)
    }

    async fn fetch_state(&self, _id: &HouseholdId) -> Result<Option<HouseholdState>, RemoteError> {
        Ok(None)
    }

    async fn store_state(&self, _id: &HouseholdId, _state: &HouseholdState) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn rotate_now(&self, _id: &HouseholdId) -> Result<(), RemoteError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryInner {
    households: HashMap<HouseholdId, (JoinCode, HouseholdState)>,
    created: u64,
    writes: usize,
    failing: bool,
    failing_fetches: bool,
}

/// Shared in-process remote. Clones see the same households, so two
/// sessions built on clones behave like two clients of one backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// While failing, every request returns [`RemoteError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// While set, only `fetch_state` fails; joins and writes still succeed.
    pub fn set_failing_fetches(&self, failing: bool) {
        self.lock().failing_fetches = failing;
    }

    pub fn snapshot(&self, id: &HouseholdId) -> Option<HouseholdState> {
        self.lock().households.get(id).map(|(_, s)| s.clone())
    }

    /// Overwrite a household as another client would.
    pub fn put(&self, id: &HouseholdId, state: HouseholdState) {
        if let Some(entry) = self.lock().households.get_mut(id) {
            entry.1 = state;
        }
    }

    /// Number of successful `store_state` calls.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    fn guard(&self) -> Result<MutexGuard<'_, MemoryInner>, RemoteError> {
        let inner = self.lock();
        if inner.failing {
            return Err(RemoteError::Unavailable);
        }
        Ok(inner)
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn create(&self) -> Result<CreatedHousehold, RemoteError> {
        let mut inner = self.guard()?;
        inner.created += 1;
        let id = HouseholdId::from(format!("hh-{}", inner.created));
        let join_code = JoinCode::from(format!("{:06}", 100_000 + inner.created));
        let state = HouseholdState::default();
        inner
            .households
            .insert(id.clone(), (join_code.clone(), state.clone()));
        Ok(CreatedHousehold {
            identity: HouseholdIdentity { id, join_code },
            state,
        })
    }

    async fn join(&self, code: &JoinCode) -> Result<HouseholdId, RemoteError> {
        let inner = self.guard()?;
        inner
            .households
            .iter()
            .find(|(_, (held, _))| held.matches(code))
            .map(|(id, _)| id.clone())
            .ok_or(RemoteError::InvalidJoinCode)
    }

    async fn fetch_state(&self, id: &HouseholdId) -> Result<Option<HouseholdState>, RemoteError> {
        let inner = self.guard()?;
        if inner.failing_fetches {
            return Err(RemoteError::Unavailable);
        }
        Ok(inner.households.get(id).map(|(_, s)| s.clone()))
    }

    async fn store_state(&self, id: &HouseholdId, state: &HouseholdState) -> Result<(), RemoteError> {
        let mut inner = self.guard()?;
        let Some(entry) = inner.households.get_mut(id) else {
            return Err(RemoteError::Status {
                url: format!("memory://households/{id}/state"),
                status: 404,
            });
        };
        entry.1 = state.clone();
        inner.writes += 1;
        Ok(())
    }

    async fn rotate_now(&self, id: &HouseholdId) -> Result<(), RemoteError> {
        let mut inner = self.guard()?;
        let Some((_, state)) = inner.households.get_mut(id) else {
            return Err(RemoteError::Status {
                url: format!("memory://households/{id}/rotate-now"),
                status: 404,
            });
        };
        state.start_epoch = state.start_epoch.map(|s| s - epoch::week());
        Ok(())
    }
}
