//! Guildhall: a local-first ledger for a proof-of-work maker guild.
//!
//! **Artifacts over resumes.** Members enroll with an invite code and a
//! first proof artifact, trade paid micro-contracts through an escrow
//! lifecycle, critique and remix each other's work, and earn a derived
//! signal score from all of it.
//!
//! # Architecture
//!
//! ## Single-document ledger
//!
//! All state lives in one JSON document (`ledger.json`) holding five
//! collections: users, projects, contracts, conversations, invites. Every
//! operation is a complete load-modify-save cycle; there are no partial
//! writes and no per-record transactions. Independent processes mutating
//! the same store race whole-document (last writer wins). That is an
//! accepted property of the single-writer design, not a bug this crate hides.
//!
//! ## The Thin Waist
//!
//! All mutations route through [`core::broker::LedgerBroker`] for:
//! - Serialization (in-process lock)
//! - Save-on-success (a failed operation leaves the document unchanged)
//! - Audit logging (`broker.events.jsonl`)
//!
//! ## Subsystems (plugins)
//!
//! - `member`: invite-gated enrollment, profiles, derived verification
//! - `proof`: artifact transmit/feed/remix/critique/peer review
//! - `exchange`: the escrowed micro-contract lifecycle
//! - `relay`: pairwise messaging unlocked by completed exchanges
//! - `invite`: operator-managed redemption codes
//! - `signal`: the bounded reputation score
//!
//! # Examples
//!
//! ```bash
//! # Initialize a store
//! guildhall init
//!
//! # Enroll with a starter code and a first artifact
//! guildhall member enroll --name "Ada" --track engineer \
//!     --invite SHIP-FAST --title "Relay firmware" --wrong "Underestimated flash wear"
//!
//! # Publish and work an exchange
//! guildhall exchange offer "Code review" --description "1h deep dive" --price 25
//! guildhall exchange book --id <contract>
//! guildhall exchange deliver --id <contract> --note "see attached"
//! guildhall exchange complete --id <contract>
//!
//! # Check the earned signal
//! guildhall signal score --user <id>
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: entity model, ledger document, broker, session identity
//! - [`plugins`]: subsystem implementations over the core

pub mod core;
pub mod plugins;

use core::{broker, config, error, session, store::Store};
use plugins::{exchange, invite, member, proof, relay, signal};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "guildhall",
    version = env!("CARGO_PKG_VERSION"),
    about = "Guildhall is the local-first ledger and exchange engine for a proof-of-work maker guild: artifacts over resumes, escrowed micro-contracts, earned signal. 🛠️"
)]
struct Cli {
    /// Store root directory (defaults to GUILDHALL_HOME, then `.guildhall`).
    #[clap(long, global = true)]
    dir: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct SessionCli {
    #[clap(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Start a session as an existing member, or as the operator.
    Login {
        /// Member id to act as.
        #[clap(long, conflicts_with_all = ["id", "key"])]
        user: Option<String>,
        /// Operator identity (paired with --key).
        #[clap(long, requires = "key")]
        id: Option<String>,
        /// Operator secret.
        #[clap(long, requires = "id")]
        key: Option<String>,
    },
    /// Show the acting user.
    Whoami,
    /// Clear the active session.
    Logout,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a store (seeds the bootstrap ledger).
    Init,
    /// Session identity (login/whoami/logout).
    Session(SessionCli),
    /// Guild membership and profiles.
    Member(member::MemberCli),
    /// Proof artifacts and critiques.
    Proof(proof::ProofCli),
    /// Escrowed micro-contract exchanges.
    Exchange(exchange::ExchangeCli),
    /// Direct messages between exchange partners.
    Relay(relay::RelayCli),
    /// Enrollment invite codes.
    Invite(invite::InviteCli),
    /// Derived reputation scores.
    Signal(signal::SignalCli),
    /// Show the broker audit log.
    Audit {
        /// Only the most recent N events.
        #[clap(long)]
        tail: Option<usize>,
    },
    /// Print the machine-readable subsystem schemas.
    Schema,
}

fn run_session_cli(store: &Store, cli: SessionCli) -> Result<(), error::GuildError> {
    use colored::Colorize;
    match cli.command {
        SessionCommand::Login { user, id, key } => match (user, id, key) {
            (Some(user_id), None, None) => {
                let ledger = broker::LedgerBroker::new(store).read()?;
                let member = ledger.find_user(&user_id).ok_or_else(|| {
                    error::GuildError::NotFound(format!("user '{}'", user_id))
                })?;
                config::save_config(
                    store,
                    &config::SessionConfig {
                        actor: Some(member.id.clone()),
                    },
                )?;
                println!("Session active: {}", member.name.bold());
            }
            (None, Some(id), Some(key)) => {
                if !session::verify_operator(&id, &key) {
                    return Err(error::GuildError::Unauthorized(
                        "operator credential rejected".to_string(),
                    ));
                }
                let operator = session::operator_user();
                let upserted = operator.clone();
                broker::LedgerBroker::new(store).with_ledger(
                    &operator.id,
                    "session.login",
                    move |ledger| {
                        ledger.upsert_user(upserted);
                        Ok(())
                    },
                )?;
                config::save_config(
                    store,
                    &config::SessionConfig {
                        actor: Some(operator.id.clone()),
                    },
                )?;
                println!("Session active: {}", operator.name.bold());
            }
            _ => {
                return Err(error::GuildError::ValidationError(
                    "pass --user <id>, or --id with --key".to_string(),
                ));
            }
        },
        SessionCommand::Whoami => {
            let ledger = broker::LedgerBroker::new(store).read()?;
            match session::resolve_actor_id(store)? {
                Some(id) => match ledger.find_user(&id) {
                    Some(user) => println!("{} ({})", user.name.bold(), user.id),
                    None => println!("{} (no ledger record)", id),
                },
                None => println!("no active session"),
            }
        }
        SessionCommand::Logout => {
            config::save_config(store, &config::SessionConfig::default())?;
            println!("Session cleared");
        }
    }
    Ok(())
}

fn run_audit(store: &Store, tail: Option<usize>) -> Result<(), error::GuildError> {
    let path = store.audit_log_path();
    if !path.exists() {
        return Ok(());
    }
    let content = std::fs::read_to_string(path)?;
    let events: Vec<broker::LedgerEvent> = content
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();
    let skip = tail.map(|n| events.len().saturating_sub(n)).unwrap_or(0);
    for ev in events.into_iter().skip(skip) {
        println!("{}  {:<20} {:<12} {}", ev.ts, ev.op, ev.actor, ev.status);
    }
    Ok(())
}

pub fn run() -> Result<(), error::GuildError> {
    let cli = Cli::parse();
    let store = Store::resolve(cli.dir.clone());

    match cli.command {
        Command::Init => {
            use colored::Colorize;
            store.init()?;
            println!("{}", "G U I L D H A L L".bold());
            println!(
                "{}",
                "artifacts over resumes; ledger ready".bright_cyan()
            );
            println!("store: {}", store.root.display());
        }
        Command::Session(session_cli) => run_session_cli(&store, session_cli)?,
        Command::Member(member_cli) => member::run_member_cli(&store, member_cli)?,
        Command::Proof(proof_cli) => proof::run_proof_cli(&store, proof_cli)?,
        Command::Exchange(exchange_cli) => exchange::run_exchange_cli(&store, exchange_cli)?,
        Command::Relay(relay_cli) => relay::run_relay_cli(&store, relay_cli)?,
        Command::Invite(invite_cli) => invite::run_invite_cli(&store, invite_cli)?,
        Command::Signal(signal_cli) => signal::run_signal_cli(&store, signal_cli)?,
        Command::Audit { tail } => run_audit(&store, tail)?,
        Command::Schema => {
            let schemas = serde_json::json!({
                "broker": broker::schema(),
                "member": member::schema(),
                "proof": proof::schema(),
                "exchange": exchange::schema(),
                "relay": relay::schema(),
                "invite": invite::schema(),
                "signal": signal::schema(),
            });
            println!("{}", serde_json::to_string_pretty(&schemas)?);
        }
    }
    Ok(())
}
