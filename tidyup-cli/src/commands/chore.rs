//! `tidyup chore ...`

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use tidyup_core::Direction;

use super::{resolve_chore, with_session, GlobalArgs};

#[derive(Subcommand, Debug)]
pub enum ChoreCommand {
    /// Append a chore.
    Add {
        name: String,
        /// Optional instructions shown next to the assignment.
        #[arg(long)]
        details: Option<String>,
    },
    /// Remove a chore by position or name. Its completion history is kept.
    Remove { what: String },
    /// Move a chore one place earlier.
    Up { what: String },
    /// Move a chore one place later.
    Down { what: String },
    /// List chores.
    List,
}

#[derive(Tabled)]
struct ChoreRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Chore")]
    name: String,
    #[tabled(rename = "Details")]
    details: String,
}

pub fn run(cmd: ChoreCommand, global: &GlobalArgs) -> Result<()> {
    with_session(global, move |session, _| {
        Box::pin(async move {
            match cmd {
                ChoreCommand::Add { name, details } => {
                    match session.add_chore(&name, details.as_deref())? {
                        Some(_) => println!("{} {}", "Added".green(), name.trim().bold()),
                        None => println!("{}", "Empty name; nothing added.".dimmed()),
                    }
                }
                ChoreCommand::Remove { what } => {
                    let id = resolve_chore(session.state(), &what)?;
                    session.remove_chore(&id)?;
                    println!("{} {}", "Removed".yellow(), what.trim());
                }
                ChoreCommand::Up { what } => {
                    let id = resolve_chore(session.state(), &what)?;
                    if !session.move_chore(&id, Direction::Up)? {
                        println!("{}", "Already first.".dimmed());
                    }
                }
                ChoreCommand::Down { what } => {
                    let id = resolve_chore(session.state(), &what)?;
                    if !session.move_chore(&id, Direction::Down)? {
                        println!("{}", "Already last.".dimmed());
                    }
                }
                ChoreCommand::List => {}
            }

            let chores = &session.state().chores;
            if chores.is_empty() {
                println!("No chores yet. Add one with `tidyup chore add <name>`.");
                return Ok(());
            }
            let rows: Vec<ChoreRow> = chores
                .iter()
                .enumerate()
                .map(|(i, c)| ChoreRow {
                    position: i + 1,
                    name: c.name.clone(),
                    details: c.details.clone().unwrap_or_default(),
                })
                .collect();
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{table}");
            Ok(())
        })
    })
}
