//! `tidyup member ...`

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use tidyup_core::Direction;

use super::{resolve_member, with_session, GlobalArgs};

#[derive(Subcommand, Debug)]
pub enum MemberCommand {
    /// Append a member to the rotation.
    Add {
        /// Display name (surrounding whitespace is trimmed).
        name: String,
    },
    /// Remove a member by position or name.
    Remove { who: String },
    /// Move a member one place earlier in the rotation.
    Up { who: String },
    /// Move a member one place later in the rotation.
    Down { who: String },
    /// List members in rotation order.
    List,
}

#[derive(Tabled)]
struct MemberRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Name")]
    name: String,
}

pub fn run(cmd: MemberCommand, global: &GlobalArgs) -> Result<()> {
    with_session(global, move |session, _| {
        Box::pin(async move {
            match cmd {
                MemberCommand::Add { name } => match session.add_member(&name)? {
                    Some(_) => println!("{} {}", "Added".green(), name.trim().bold()),
                    None => println!("{}", "Empty name; nothing added.".dimmed()),
                },
                MemberCommand::Remove { who } => {
                    let id = resolve_member(session.state(), &who)?;
                    session.remove_member(&id)?;
                    println!("{} {}", "Removed".yellow(), who.trim());
                }
                MemberCommand::Up { who } => {
                    let id = resolve_member(session.state(), &who)?;
                    if !session.move_member(&id, Direction::Up)? {
                        println!("{}", "Already first.".dimmed());
                    }
                }
                MemberCommand::Down { who } => {
                    let id = resolve_member(session.state(), &who)?;
                    if !session.move_member(&id, Direction::Down)? {
                        println!("{}", "Already last.".dimmed());
                    }
                }
                MemberCommand::List => {}
            }

            let members = &session.state().members;
            if members.is_empty() {
                println!("No members yet. Add one with `tidyup member add <name>`.");
                return Ok(());
            }
            let rows: Vec<MemberRow> = members
                .iter()
                .enumerate()
                .map(|(i, m)| MemberRow {
                    position: i + 1,
                    name: m.name.clone(),
                })
                .collect();
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{table}");
            Ok(())
        })
    })
}
