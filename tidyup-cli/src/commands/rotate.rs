//! `rotate-now`, `reset-start` and `clear`: re-anchoring the rotation.

use anyhow::{bail, Result};
use chrono::Local;
use clap::Args;
use colored::Colorize;

use tidyup_sync::Session;

use super::{with_session, GlobalArgs};

#[derive(Args, Debug)]
pub struct RotateNowArgs {
    /// Ask the server to rotate, then pull its result.
    #[arg(long)]
    pub server: bool,
}

impl RotateNowArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        with_session(global, move |session, _| {
            Box::pin(async move {
                if self.server {
                    session.rotate_now_remote().await?;
                } else {
                    session.rotate_now()?;
                }
                println!("{} to week {}", "Rotated".green().bold(), session.week_index());
                print_assignments(session);
                Ok(())
            })
        })
    }
}

#[derive(Args, Debug)]
pub struct ResetStartArgs {}

impl ResetStartArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        with_session(global, |session, _| {
            Box::pin(async move {
                session.reset_start()?;
                println!(
                    "Next rotation: {}",
                    session
                        .next_boundary()
                        .with_timezone(&Local)
                        .format("%a %Y-%m-%d %H:%M")
                        .to_string()
                        .bold()
                );
                Ok(())
            })
        })
    }
}

#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Confirm wiping members, chores and completion history.
    #[arg(long)]
    pub yes: bool,
}

impl ClearArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        if !self.yes {
            bail!("clear removes every member, chore and completion mark; re-run with --yes");
        }
        with_session(global, |session, _| {
            Box::pin(async move {
                session.clear()?;
                println!("{}", "Household cleared.".yellow());
                Ok(())
            })
        })
    }
}

fn print_assignments(session: &Session) {
    for a in session.assignments() {
        println!("  {} → {}", a.chore_name, a.member_name.bold());
    }
}
