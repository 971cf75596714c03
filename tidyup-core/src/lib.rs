//! TidyUp core library: household domain, week arithmetic, rotation,
//! completion tracking, and local persistence.
//!
//! - [`epoch`]: instants → week index, boundaries, Sunday anchors
//! - [`rotation`]: chore → member pairing for a week
//! - [`completion`]: per-week done flags
//! - [`household`]: mutations on [`HouseholdState`]
//! - [`cache`] / [`config`]: files under `~/.tidyup/`

pub mod cache;
pub mod clock;
pub mod completion;
pub mod config;
pub mod epoch;
pub mod error;
pub mod household;
pub mod ids;
pub mod rotation;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use completion::{CompletionLog, WeekCompletion};
pub use config::Config;
pub use error::CoreError;
pub use household::Direction;
pub use ids::{IdGenerator, SequentialIds, UuidGenerator};
pub use rotation::Assignment;
pub use types::{
    Chore, ChoreId, Frequency, HouseholdId, HouseholdIdentity, HouseholdState, JoinCode, Member,
    MemberId, WeekKey,
};
