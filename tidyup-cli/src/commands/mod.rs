pub mod chore;
pub mod done;
pub mod household;
pub mod member;
pub mod rotate;
pub mod show;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};

use tidyup_core::{config, Chore, ChoreId, Config, HouseholdState, Member, MemberId, SystemClock, UuidGenerator};
use tidyup_daemon::LogFormat;
use tidyup_sync::{HttpRemoteStore, Landing, OfflineRemote, RemoteStore, Session};

// ---------------------------------------------------------------------------
// Global flags
// ---------------------------------------------------------------------------

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Base URL of the shared household server (overrides config and TIDYUP_REMOTE_URL).
    #[arg(long, global = true, value_name = "URL", conflicts_with = "offline")]
    pub remote: Option<String>,

    /// Ignore any configured server and keep everything local.
    #[arg(long, global = true)]
    pub offline: bool,

    /// Log line format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

// ---------------------------------------------------------------------------
// Session setup
// ---------------------------------------------------------------------------

/// Resolved home directory and effective configuration for one invocation.
pub struct CliContext {
    pub home: PathBuf,
    pub config: Config,
}

impl CliContext {
    /// Config file, then `TIDYUP_*` environment, then command-line flags.
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        let config = config::load_config_at(&home).with_context(|| {
            format!("failed to load {}", config::config_path_at(&home).display())
        })?;
        let mut config = config::apply_env(config, |name| std::env::var(name).ok())?;
        if global.offline {
            config.remote_url = None;
        } else if let Some(url) = &global.remote {
            config.remote_url = Some(url.trim().to_string());
        }
        Ok(Self { home, config })
    }

    pub fn remote(&self) -> Arc<dyn RemoteStore> {
        match &self.config.remote_url {
            Some(url) => {
                tracing::debug!(url = %url, "using http remote store");
                Arc::new(HttpRemoteStore::new(url.clone()))
            }
            None => Arc::new(OfflineRemote::new(Arc::new(UuidGenerator))),
        }
    }

    pub async fn open(&self) -> Result<(Session, Landing)> {
        let session = Session::open(
            &self.home,
            self.remote(),
            Arc::new(SystemClock),
            Arc::new(UuidGenerator),
        )
        .await
        .context("failed to open household")?;
        Ok(session)
    }
}

/// Open a session, run `f` against it, and close it even when `f` fails so
/// in-flight pushes are not lost.
pub fn with_session<F>(global: &GlobalArgs, f: F) -> Result<()>
where
    F: for<'a> FnOnce(
        &'a mut Session,
        Landing,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + 'a>>,
{
    let ctx = CliContext::load(global)?;
    tidyup_daemon::block_on(async move {
        let (mut session, landing) = ctx.open().await?;
        let result = f(&mut session, landing).await;
        session.close().await;
        result
    })
    .context("failed to start async runtime")?
}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

/// Resolve `<who>`: a 1-based position or a case-insensitive name.
pub fn resolve_member(state: &HouseholdState, who: &str) -> Result<MemberId> {
    match select(&state.members, who, |m: &Member| m.name.as_str()) {
        Some(member) => Ok(member.id.clone()),
        None => bail!("no member matches '{who}' (see `tidyup member list`)"),
    }
}

/// Resolve `<what>`: a 1-based position or a case-insensitive name.
pub fn resolve_chore(state: &HouseholdState, what: &str) -> Result<ChoreId> {
    match select(&state.chores, what, |c: &Chore| c.name.as_str()) {
        Some(chore) => Ok(chore.id.clone()),
        None => bail!("no chore matches '{what}' (see `tidyup chore list`)"),
    }
}

fn select<'a, T>(items: &'a [T], selector: &str, name: impl Fn(&T) -> &str) -> Option<&'a T> {
    let selector = selector.trim();
    if let Ok(position) = selector.parse::<usize>() {
        if let Some(item) = position.checked_sub(1).and_then(|i| items.get(i)) {
            return Some(item);
        }
    }
    let lowered = selector.to_lowercase();
    items.iter().find(|item| name(item).to_lowercase() == lowered)
}
