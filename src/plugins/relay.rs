//! Relay: two-party messaging keyed by a canonical pair id.
//!
//! The store will append a message to any conversation; the access policy
//! (a pair only talks once an exchange between them has completed) lives
//! here at the boundary, not in the store.

use crate::core::broker::LedgerBroker;
use crate::core::error::GuildError;
use crate::core::ledger::Ledger;
use crate::core::model::{ContractStatus, Message, User};
use crate::core::output;
use crate::core::session;
use crate::core::store::{self, Store};
use crate::core::time;
use clap::{Parser, Subcommand};

/// Delimiter between the two sorted participant ids in a conversation id.
const PAIR_DELIMITER: &str = "-";

#[derive(Parser, Debug)]
#[clap(name = "relay", about = "Direct messages between exchange partners.")]
pub struct RelayCli {
    #[clap(subcommand)]
    command: RelayCommand,
}

#[derive(Subcommand, Debug)]
pub enum RelayCommand {
    /// Send a message to an exchange partner.
    Send {
        #[clap(long)]
        to: String,
        #[clap(value_name = "TEXT")]
        text: String,
    },
    /// Show the conversation with one partner, oldest first.
    History {
        #[clap(long)]
        with: String,
    },
    /// Preview every conversation the acting user participates in.
    Inbox,
}

/// Canonical pair key: sort the two ids lexicographically, join with a fixed
/// delimiter. Looking the conversation up from either direction lands on the
/// same record.
pub fn pair_key(a: &str, b: &str) -> String {
    let mut pair = [a, b];
    pair.sort_unstable();
    pair.join(PAIR_DELIMITER)
}

/// The unlock rule: at least one `Completed` contract between the two users,
/// in either direction.
pub fn pair_unlocked(ledger: &Ledger, a: &str, b: &str) -> bool {
    ledger.contracts.iter().any(|c| {
        c.status == ContractStatus::Completed
            && ((c.user_id == a && c.buyer_id.as_deref() == Some(b))
                || (c.user_id == b && c.buyer_id.as_deref() == Some(a)))
    })
}

fn require_unlocked(ledger: &Ledger, a: &str, b: &str) -> Result<(), GuildError> {
    if !pair_unlocked(ledger, a, b) {
        return Err(GuildError::Unauthorized(format!(
            "no completed exchange between '{}' and '{}'",
            a, b
        )));
    }
    Ok(())
}

pub fn send(store: &Store, from: &User, to: &str, text: &str) -> Result<Message, GuildError> {
    if text.trim().is_empty() {
        return Err(GuildError::ValidationError("message text is required".to_string()));
    }

    let message = Message {
        id: time::new_entity_id(),
        sender_id: from.id.clone(),
        text: text.to_string(),
        timestamp: time::now_epoch_ms(),
    };

    let broker = LedgerBroker::new(store);
    let from_id = from.id.clone();
    let to_id = to.to_string();
    let appended = message.clone();
    broker.with_ledger(&from.id, "relay.send", move |ledger| {
        if ledger.find_user(&to_id).is_none() {
            return Err(GuildError::NotFound(format!("user '{}'", to_id)));
        }
        require_unlocked(ledger, &from_id, &to_id)?;
        let conversation_id = pair_key(&from_id, &to_id);
        let mut participants = vec![from_id.clone(), to_id.clone()];
        participants.sort_unstable();
        ledger.append_message(&conversation_id, &participants, appended);
        Ok(())
    })?;
    Ok(message)
}

/// Message history with one partner, oldest first. Subject to the same
/// unlock rule as sending; an unlocked pair with no conversation yet reads
/// as empty.
pub fn history(store: &Store, actor: &User, with: &str) -> Result<Vec<Message>, GuildError> {
    let ledger = LedgerBroker::new(store).read()?;
    require_unlocked(&ledger, &actor.id, with)?;
    let conversation_id = pair_key(&actor.id, with);
    Ok(ledger
        .find_conversation(&conversation_id)
        .map(|c| c.messages.clone())
        .unwrap_or_default())
}

pub fn run_relay_cli(store: &Store, cli: RelayCli) -> Result<(), GuildError> {
    store::require_initialized(store)?;
    let broker = LedgerBroker::new(store);
    let ledger = broker.read()?;
    let actor = session::require_actor(store, &ledger)?;

    match cli.command {
        RelayCommand::Send { to, text } => {
            send(store, &actor, &to, &text)?;
            println!("Message relayed to '{}'", to);
        }
        RelayCommand::History { with } => {
            for message in history(store, &actor, &with)? {
                let tag = if message.sender_id == actor.id {
                    "you"
                } else {
                    with.as_str()
                };
                println!("[{}] {}", tag, message.text);
            }
        }
        RelayCommand::Inbox => {
            for conversation in ledger
                .conversations
                .iter()
                .filter(|c| c.participants.iter().any(|p| p == &actor.id))
            {
                let partner = conversation
                    .participants
                    .iter()
                    .find(|p| *p != &actor.id)
                    .cloned()
                    .unwrap_or_default();
                let texts: Vec<String> = conversation
                    .messages
                    .iter()
                    .rev()
                    .map(|m| m.text.clone())
                    .collect();
                println!(
                    "{}: {}",
                    partner,
                    output::preview_messages(&texts, 3, 40)
                );
            }
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "relay",
        "version": "0.1.0",
        "description": "Pairwise messaging gated on completed exchanges",
        "commands": [
            { "name": "send", "parameters": ["to", "text"] },
            { "name": "history", "parameters": ["with"] },
            { "name": "inbox" }
        ],
        "storage": ["ledger.json"]
    })
}
