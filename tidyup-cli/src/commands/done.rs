//! `done` and `toggle`: this week's completion flags.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use tidyup_sync::Session;

use super::{resolve_chore, with_session, GlobalArgs};

#[derive(Args, Debug)]
pub struct DoneArgs {
    /// Chore position or name.
    pub chore: String,

    /// Mark the chore as not done instead.
    #[arg(long)]
    pub undo: bool,
}

impl DoneArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        with_session(global, move |session, _| {
            Box::pin(async move {
                let id = resolve_chore(session.state(), &self.chore)?;
                session.set_done(&id, !self.undo)?;
                report(session, &self.chore, !self.undo);
                Ok(())
            })
        })
    }
}

#[derive(Args, Debug)]
pub struct ToggleArgs {
    /// Chore position or name.
    pub chore: String,
}

impl ToggleArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        with_session(global, move |session, _| {
            Box::pin(async move {
                let id = resolve_chore(session.state(), &self.chore)?;
                let done = session.toggle_done(&id)?;
                report(session, &self.chore, done);
                Ok(())
            })
        })
    }
}

fn report(session: &Session, chore: &str, done: bool) {
    let status = if done {
        "done".green().bold()
    } else {
        "not done".yellow().bold()
    };
    println!(
        "{} is {status} for week {}",
        chore.trim(),
        session.week_index()
    );
}
