//! # tidyup-sync
//!
//! Reconciles the local household snapshot with a shared remote store.
//!
//! Open a [`Session`] with a [`RemoteStore`] adapter: [`HttpRemoteStore`]
//! for the REST backend or [`OfflineRemote`] to run locally.

pub mod coordinator;
pub mod error;
pub mod remote;
pub mod session;

pub use coordinator::SyncCoordinator;
pub use error::{RemoteError, SyncError};
pub use remote::{
    local_join_code, CreatedHousehold, HttpRemoteStore, MemoryRemote, OfflineRemote, RemoteStore,
};
pub use session::{Landing, PullOutcome, Session};
