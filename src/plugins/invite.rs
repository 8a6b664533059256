//! Invite gate: the redemption-code set consumed at enrollment.
//!
//! Codes live upper-cased in the ledger; every surface normalizes input
//! before touching the set. Removing a code blocks future redemption but
//! never touches users that already enrolled with it.

use crate::core::broker::LedgerBroker;
use crate::core::error::GuildError;
use crate::core::session;
use crate::core::store::{self, Store};
use crate::core::time;
use clap::{Parser, Subcommand, ValueEnum};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(name = "invite", about = "Manage enrollment invite codes.")]
pub struct InviteCli {
    /// Output format for this command group.
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: InviteCommand,
}

#[derive(Subcommand, Debug)]
pub enum InviteCommand {
    /// Mint a new code (operator only).
    Add {
        #[clap(value_name = "CODE")]
        code: String,
    },
    /// Revoke a code (operator only). Existing members keep their access.
    Remove {
        #[clap(value_name = "CODE")]
        code: String,
    },
    /// List active codes (operator only).
    List,
    /// Check whether a code currently redeems.
    Check {
        #[clap(value_name = "CODE")]
        code: String,
    },
}

/// Trim and upper-case; the set only ever holds normalized codes.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9][A-Z0-9-]{2,31}$").unwrap())
}

/// Normalized-code format gate applied on mint.
pub fn validate_code_format(code: &str) -> Result<(), GuildError> {
    if code.is_empty() {
        return Err(GuildError::ValidationError("invite code is required".to_string()));
    }
    if !code_pattern().is_match(code) {
        return Err(GuildError::ValidationError(format!(
            "invite code '{}' must be 3-32 chars of A-Z, 0-9 or '-'",
            code
        )));
    }
    Ok(())
}

pub fn check(store: &Store, raw_code: &str) -> Result<bool, GuildError> {
    let code = normalize_code(raw_code);
    Ok(LedgerBroker::new(store).read()?.invite_is_valid(&code))
}

/// Mint a code. Idempotent: re-adding an active code is a quiet success.
pub fn add(store: &Store, actor_id: &str, raw_code: &str) -> Result<String, GuildError> {
    let code = normalize_code(raw_code);
    validate_code_format(&code)?;
    let broker = LedgerBroker::new(store);
    let added = code.clone();
    broker.with_ledger(actor_id, "invite.add", move |ledger| {
        ledger.add_invite(&added);
        Ok(())
    })?;
    Ok(code)
}

pub fn remove(store: &Store, actor_id: &str, raw_code: &str) -> Result<(), GuildError> {
    let code = normalize_code(raw_code);
    let broker = LedgerBroker::new(store);
    broker.with_ledger(actor_id, "invite.remove", move |ledger| {
        if !ledger.invite_is_valid(&code) {
            return Err(GuildError::NotFound(format!("invite code '{}'", code)));
        }
        ledger.remove_invite(&code);
        Ok(())
    })
}

pub fn run_invite_cli(store: &Store, cli: InviteCli) -> Result<(), GuildError> {
    store::require_initialized(store)?;
    let broker = LedgerBroker::new(store);

    match cli.command {
        InviteCommand::Add { code } => {
            let ledger = broker.read()?;
            let operator = session::require_admin(store, &ledger)?;
            let code = add(store, &operator.id, &code)?;
            println!("Invite code '{}' active", code);
        }
        InviteCommand::Remove { code } => {
            let ledger = broker.read()?;
            let operator = session::require_admin(store, &ledger)?;
            remove(store, &operator.id, &code)?;
            println!("Invite code '{}' revoked", normalize_code(&code));
        }
        InviteCommand::List => {
            let ledger = broker.read()?;
            session::require_admin(store, &ledger)?;
            match cli.format {
                OutputFormat::Text => {
                    for code in &ledger.invites {
                        println!("{}", code);
                    }
                }
                OutputFormat::Json => {
                    let envelope = time::command_envelope(
                        "invite.list",
                        "success",
                        serde_json::json!({ "invites": ledger.invites }),
                    );
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                }
            }
        }
        InviteCommand::Check { code } => {
            let valid = check(store, &code)?;
            if valid {
                println!("Code '{}' redeems", normalize_code(&code));
            } else {
                println!("Code '{}' does not redeem", normalize_code(&code));
            }
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "invite",
        "version": "0.1.0",
        "description": "Enrollment invite code set",
        "commands": [
            { "name": "add", "parameters": ["code"] },
            { "name": "remove", "parameters": ["code"] },
            { "name": "list" },
            { "name": "check", "parameters": ["code"] }
        ],
        "storage": ["ledger.json"]
    })
}
