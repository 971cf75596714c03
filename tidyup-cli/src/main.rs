//! TidyUp: weekly chore rotation for shared households.
//!
//! # Usage
//!
//! ```text
//! tidyup create | join <code> | code
//! tidyup member add <name> | remove <who> | up <who> | down <who> | list
//! tidyup chore add <name> [--details <text>] | remove <what> | up <what> | down <what> | list
//! tidyup show [--week-offset <n>] [--json]
//! tidyup done <chore> [--undo]
//! tidyup toggle <chore>
//! tidyup rotate-now [--server] | reset-start | clear --yes
//! tidyup pull | watch [--json]
//! ```
//!
//! Global flags: `--remote <url>`, `--offline`, `--log-format text|json`.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    chore::ChoreCommand,
    done::{DoneArgs, ToggleArgs},
    household::{CodeArgs, CreateArgs, JoinArgs, PullArgs},
    member::MemberCommand,
    rotate::{ClearArgs, ResetStartArgs, RotateNowArgs},
    show::ShowArgs,
    watch::WatchArgs,
    GlobalArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "tidyup",
    version,
    about = "Rotate household chores every week and track what got done",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a shared household and print its join code.
    Create(CreateArgs),

    /// Join an existing household with its join code.
    Join(JoinArgs),

    /// Print the join code of the current household.
    Code(CodeArgs),

    /// Manage household members (rotation order = list order).
    Member {
        #[command(subcommand)]
        command: MemberCommand,
    },

    /// Manage chores.
    Chore {
        #[command(subcommand)]
        command: ChoreCommand,
    },

    /// Show this week's assignments and the countdown to the next rotation.
    Show(ShowArgs),

    /// Mark a chore done (or not done) for the current week.
    Done(DoneArgs),

    /// Flip a chore's done flag for the current week.
    Toggle(ToggleArgs),

    /// Advance the rotation by one week right now.
    RotateNow(RotateNowArgs),

    /// Re-anchor so the next rotation happens on the coming Sunday 23:59.
    ResetStart(ResetStartArgs),

    /// Remove all members, chores and completion history.
    Clear(ClearArgs),

    /// Fetch the shared household from the remote store.
    Pull(PullArgs),

    /// Stay running: poll the remote, remind before and announce each rotation.
    Watch(WatchArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = match cli.command {
        Commands::Watch(_) => "info",
        _ => "warn",
    };
    tidyup_daemon::init_tracing(default_level, cli.global.log_format.into());

    let global = cli.global;
    match cli.command {
        Commands::Create(args) => args.run(&global),
        Commands::Join(args) => args.run(&global),
        Commands::Code(args) => args.run(&global),
        Commands::Member { command } => commands::member::run(command, &global),
        Commands::Chore { command } => commands::chore::run(command, &global),
        Commands::Show(args) => args.run(&global),
        Commands::Done(args) => args.run(&global),
        Commands::Toggle(args) => args.run(&global),
        Commands::RotateNow(args) => args.run(&global),
        Commands::ResetStart(args) => args.run(&global),
        Commands::Clear(args) => args.run(&global),
        Commands::Pull(args) => args.run(&global),
        Commands::Watch(args) => args.run(&global),
    }
}
