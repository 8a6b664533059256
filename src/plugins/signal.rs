//! Signal score: the derived reputation metric.
//!
//! Signal = projects*1 + sessions*3 + comments*2 + remixes received*2,
//! clamped to 100. Recomputed on demand from the full collections, with no
//! caching or incremental bookkeeping. Monotone in each input, so activity
//! never lowers a score.

use crate::core::broker::LedgerBroker;
use crate::core::error::GuildError;
use crate::core::model::{Project, User};
use crate::core::store::{self, Store};
use crate::core::time;
use clap::{Parser, Subcommand, ValueEnum};
use rustc_hash::FxHashSet;

pub const MAX_SCORE: u32 = 100;

const PROJECT_WEIGHT: u32 = 1;
const SESSION_WEIGHT: u32 = 3;
const COMMENT_WEIGHT: u32 = 2;
const REMIX_WEIGHT: u32 = 2;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(name = "signal", about = "Derived reputation scores.")]
pub struct SignalCli {
    /// Output format for this command group.
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: SignalCommand,
}

#[derive(Subcommand, Debug)]
pub enum SignalCommand {
    /// Compute one user's current signal score.
    Score {
        #[clap(long)]
        user: String,
    },
    /// Rank every known user by signal.
    Board,
}

/// Pure scoring function over a user record and the full project collection.
pub fn score(user: &User, all_projects: &[Project]) -> u32 {
    let owned: FxHashSet<&str> = all_projects
        .iter()
        .filter(|p| p.user_id == user.id)
        .map(|p| p.id.as_str())
        .collect();

    let projects_count = owned.len() as u32;
    let sessions_count = user.sessions_completed;

    let comments_count = all_projects
        .iter()
        .flat_map(|p| p.comments.iter())
        .filter(|c| c.user_id == user.id)
        .count() as u32;

    // A remix credits the owner of the project it was derived from.
    let remixes_received = all_projects
        .iter()
        .filter(|p| {
            p.original_project_id
                .as_deref()
                .is_some_and(|orig| owned.contains(orig))
        })
        .count() as u32;

    let raw = projects_count * PROJECT_WEIGHT
        + sessions_count * SESSION_WEIGHT
        + comments_count * COMMENT_WEIGHT
        + remixes_received * REMIX_WEIGHT;

    raw.min(MAX_SCORE)
}

pub fn run_signal_cli(store: &Store, cli: SignalCli) -> Result<(), GuildError> {
    store::require_initialized(store)?;
    let ledger = LedgerBroker::new(store).read()?;

    match cli.command {
        SignalCommand::Score { user } => {
            let record = ledger
                .find_user(&user)
                .ok_or_else(|| GuildError::NotFound(format!("user '{}'", user)))?;
            let value = score(record, &ledger.projects);
            match cli.format {
                OutputFormat::Text => {
                    use colored::Colorize;
                    println!(
                        "{} {} {}",
                        record.name.bold(),
                        format!("[{}]", record.track).dimmed(),
                        format!("signal {}", value).bright_cyan().bold()
                    );
                }
                OutputFormat::Json => {
                    let envelope = time::command_envelope(
                        "signal.score",
                        "success",
                        serde_json::json!({ "user": record.id, "signal": value }),
                    );
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                }
            }
        }
        SignalCommand::Board => {
            let mut board: Vec<(u32, &User)> = ledger
                .users
                .iter()
                .map(|u| (score(u, &ledger.projects), u))
                .collect();
            board.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.name.cmp(&b.1.name)));
            match cli.format {
                OutputFormat::Text => {
                    for (rank, (value, u)) in board.iter().enumerate() {
                        println!("{:>3}. {:<24} {:>3}  {}", rank + 1, u.name, value, u.track);
                    }
                }
                OutputFormat::Json => {
                    let rows: Vec<serde_json::Value> = board
                        .iter()
                        .map(|(value, u)| {
                            serde_json::json!({ "user": u.id, "name": u.name, "signal": value })
                        })
                        .collect();
                    let envelope = time::command_envelope(
                        "signal.board",
                        "success",
                        serde_json::json!({ "board": rows }),
                    );
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                }
            }
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "signal",
        "version": "0.1.0",
        "description": "Derived reputation scores",
        "commands": [
            { "name": "score", "parameters": ["user"] },
            { "name": "board" }
        ],
        "storage": []
    })
}
