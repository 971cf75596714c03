//! `tidyup watch`: foreground poller with rotation reminders.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use colored::Colorize;
use tokio::sync::mpsc;

use tidyup_daemon::{RefreshSource, WatchEvent, WatchOptions};

use super::{CliContext, GlobalArgs};

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Print one JSON object per event instead of text.
    #[arg(long)]
    pub json: bool,

    /// Do not react to other processes writing the local cache.
    #[arg(long)]
    pub no_cache_watch: bool,
}

impl WatchArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let ctx = CliContext::load(global)?;
        let mut options = WatchOptions::from_config(&ctx.config);
        options.watch_cache = !self.no_cache_watch;
        let json = self.json;

        tidyup_daemon::block_on(async move {
            let (session, _) = ctx.open().await?;
            tracing::info!(
                week = session.week_index(),
                next_boundary = %session.next_boundary(),
                remote = ctx.config.remote_url.as_deref().unwrap_or("offline"),
                "watching household"
            );

            let (tx, mut rx) = mpsc::unbounded_channel();
            let printer = tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    if let Err(err) = print_event(&event, json) {
                        tracing::warn!(error = %err, "failed to print event");
                    }
                }
            });

            let result = tidyup_daemon::run(session, options, tx).await;
            // The sender is dropped once run returns, so the printer drains and exits.
            if let Err(err) = printer.await {
                tracing::warn!(error = %err, "event printer failed");
            }
            result.context("watch stopped with an error")
        })
        .context("failed to start async runtime")?
    }
}

fn print_event(event: &WatchEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        WatchEvent::Refreshed { source } => {
            let from = match source {
                RefreshSource::Remote => "remote",
                RefreshSource::LocalCache => "local cache",
            };
            println!("{} household updated from {from}", "↻".cyan());
        }
        WatchEvent::Reminder {
            boundary,
            assignments,
        } => {
            println!(
                "{} chores rotate at {}",
                "⏰".yellow(),
                boundary.with_timezone(&Local).format("%a %H:%M").to_string().bold()
            );
            for a in assignments {
                println!("  {} → {}", a.chore_name, a.member_name);
            }
        }
        WatchEvent::Rollover {
            week_index,
            assignments,
        } => {
            println!("{} week {week_index} started", "✓".green().bold());
            for a in assignments {
                println!("  {} → {}", a.chore_name, a.member_name.bold());
            }
        }
    }
    Ok(())
}
