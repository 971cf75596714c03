//! Watch runtime: remote polling, weekly boundary timers, and local cache
//! watching around a shared [`tidyup_sync::Session`].

mod error;
pub mod logging;
pub mod paths;
mod runtime;
pub mod scheduler;

pub use error::DaemonError;
pub use logging::{init_tracing, LogFormat};
pub use runtime::{
    block_on, plan_next_wake, run, run_until, RefreshSource, SharedSession, Wake, WakeKind,
    WatchEvent, WatchOptions,
};
pub use scheduler::{schedule, ScheduledTask};
