//! `create`, `join`, `code` and `pull`.

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use tidyup_sync::{PullOutcome, SyncError};

use super::{with_session, GlobalArgs};

#[derive(Args, Debug)]
pub struct CreateArgs {}

impl CreateArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        with_session(global, |session, _| {
            Box::pin(async move {
                let held = session.identity().is_some();
                let identity = session.create_remote().await?;
                if held {
                    println!("Already in household {}.", identity.id.to_string().bold());
                } else {
                    println!("{} household {}", "Created".green().bold(), identity.id);
                }
                println!("Join code: {}", identity.join_code.to_string().bold());
                if session.coordinator().is_inert() {
                    println!(
                        "{}",
                        "No remote configured: the household stays on this machine.".dimmed()
                    );
                }
                Ok(())
            })
        })
    }
}

#[derive(Args, Debug)]
pub struct JoinArgs {
    /// Join code shared by a household member.
    pub code: String,
}

impl JoinArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        with_session(global, move |session, _| {
            Box::pin(async move {
                match session.join_remote(&self.code).await {
                    Ok(id) => {
                        println!("{} household {}", "Joined".green().bold(), id);
                        Ok(())
                    }
                    Err(SyncError::InvalidJoinCode { code }) => {
                        bail!("invalid join code '{code}'")
                    }
                    Err(err) => Err(err.into()),
                }
            })
        })
    }
}

#[derive(Args, Debug)]
pub struct CodeArgs {}

impl CodeArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        with_session(global, |session, _| {
            Box::pin(async move {
                match session.identity() {
                    Some(identity) => {
                        println!("{}", identity.join_code);
                        Ok(())
                    }
                    None => bail!("no household yet; run `tidyup create` or `tidyup join <code>`"),
                }
            })
        })
    }
}

#[derive(Args, Debug)]
pub struct PullArgs {}

impl PullArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        with_session(global, |session, _| {
            Box::pin(async move {
                if session.identity().is_none() {
                    bail!("no household yet; run `tidyup create` or `tidyup join <code>`");
                }
                if session.coordinator().is_inert() {
                    println!("Offline: nothing to pull.");
                    return Ok(());
                }
                // Opening the session already pulled; only retry if that failed.
                let outcome = match session.bootstrap_pull() {
                    Some(outcome) => outcome,
                    None => session.pull().await?,
                };
                match outcome {
                    PullOutcome::Refreshed => println!("{}", "Updated from remote.".green()),
                    PullOutcome::Unchanged => println!("Already up to date."),
                }
                Ok(())
            })
        })
    }
}
