//! `tidyup show`: the week's assignments, done flags and countdown.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use tidyup_core::{Assignment, HouseholdIdentity, WeekKey};
use tidyup_sync::{Landing, Session};

use super::{with_session, GlobalArgs};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Show the week this many weeks from now (negative for past weeks).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub week_offset: i64,

    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowReport {
    week_index: i64,
    week_key: WeekKey,
    next_boundary: DateTime<Utc>,
    countdown: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    household: Option<HouseholdIdentity>,
    assignments: Vec<AssignmentReport>,
}

#[derive(Serialize)]
struct AssignmentReport {
    #[serde(flatten)]
    assignment: Assignment,
    done: bool,
}

#[derive(Tabled)]
struct AssignmentRow {
    #[tabled(rename = "Chore")]
    chore: String,
    #[tabled(rename = "Assigned to")]
    member: String,
    #[tabled(rename = "Done")]
    done: String,
    #[tabled(rename = "Details")]
    details: String,
}

impl ShowArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        with_session(global, move |session, landing| {
            Box::pin(async move {
                let report = build_report(session, self.week_offset);
                if self.json {
                    let json = serde_json::to_string_pretty(&report)
                        .context("failed to serialize assignments")?;
                    println!("{json}");
                } else {
                    print_report(&report, self.week_offset, landing);
                }
                Ok(())
            })
        })
    }
}

fn build_report(session: &Session, week_offset: i64) -> ShowReport {
    let now = session.now().with_timezone(&Utc);
    let week_index = session.week_index().saturating_add(week_offset);
    let week_key = WeekKey::from(week_index);
    let next_boundary = session.next_boundary();
    let assignments = session
        .assignments_at_offset(week_offset)
        .into_iter()
        .map(|assignment| AssignmentReport {
            done: session
                .state()
                .completion
                .is_done(&week_key, &assignment.chore_id),
            assignment,
        })
        .collect();

    ShowReport {
        week_index,
        week_key,
        next_boundary,
        countdown: format_countdown(next_boundary - now),
        household: session.identity().cloned(),
        assignments,
    }
}

fn print_report(report: &ShowReport, week_offset: i64, landing: Landing) {
    let heading = match week_offset {
        0 => format!("This week (week {})", report.week_index),
        _ => format!("Week {} ({week_offset:+} from now)", report.week_index),
    };
    println!("{}", heading.bold());
    println!(
        "Next rotation in {} ({})",
        report.countdown.cyan(),
        report
            .next_boundary
            .with_timezone(&Local)
            .format("%a %Y-%m-%d %H:%M")
    );
    println!();

    if report.assignments.is_empty() {
        println!("Add members and chores to see assignments.");
    } else {
        let rows: Vec<AssignmentRow> = report
            .assignments
            .iter()
            .map(|a| AssignmentRow {
                chore: a.assignment.chore_name.clone(),
                member: a.assignment.member_name.clone(),
                done: if a.done {
                    "✓".green().to_string()
                } else {
                    "·".dimmed().to_string()
                },
                details: a.assignment.details.clone().unwrap_or_default(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    match (&report.household, landing) {
        (Some(identity), _) => {
            println!("{}", format!("Household join code: {}", identity.join_code).dimmed())
        }
        (None, Landing::Welcome) => println!(
            "{}",
            "Share this household with `tidyup create`, or join one with `tidyup join <code>`."
                .dimmed()
        ),
        (None, Landing::Household) => {}
    }
}

/// `Xd Xh Xm Xs`, clamped at zero.
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    format!("{days}d {hours}h {minutes}m {seconds}s")
}
