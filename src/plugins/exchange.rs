//! Exchange engine: the micro-contract escrow lifecycle.
//!
//! `Available -> Escrow -> Delivered -> Completed`, no regressions and no
//! skips. Every transition validates the current state and the acting party
//! before touching the ledger; violations come back as
//! [`GuildError::InvalidTransition`] and leave the document unchanged.
//! Completion is the one transition with a side effect outside the contract:
//! the seller's completed-session counter increments in the same save cycle.

use crate::core::broker::LedgerBroker;
use crate::core::error::GuildError;
use crate::core::ledger::ContractPatch;
use crate::core::model::{ContractStatus, MicroContract, User};
use crate::core::session;
use crate::core::store::{self, Store};
use crate::core::time;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(name = "exchange", about = "Escrowed micro-contract exchanges.")]
pub struct ExchangeCli {
    /// Output format for this command group.
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: ExchangeCommand,
}

#[derive(Subcommand, Debug)]
pub enum ExchangeCommand {
    /// Publish a new offer as the acting user.
    Offer {
        #[clap(value_name = "TITLE")]
        title: String,
        #[clap(long, default_value = "")]
        description: String,
        #[clap(long, default_value = "25")]
        price: u32,
        #[clap(long, default_value = "2")]
        delivery_days: u32,
    },
    /// List contracts, optionally one seller's.
    List {
        #[clap(long)]
        seller: Option<String>,
    },
    /// Edit an offer that is still open.
    Edit {
        #[clap(long)]
        id: String,
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        description: Option<String>,
        #[clap(long)]
        price: Option<u32>,
        #[clap(long)]
        delivery_days: Option<u32>,
    },
    /// Commit to an open offer as its buyer (funds move to escrow).
    Book {
        #[clap(long)]
        id: String,
    },
    /// Attach the delivery note as the seller.
    Deliver {
        #[clap(long)]
        id: String,
        #[clap(long)]
        note: String,
    },
    /// Confirm receipt and release the exchange (either party).
    Complete {
        #[clap(long)]
        id: String,
    },
}

/// Seller-editable offer fields; only meaningful while `Available`.
#[derive(Debug, Clone, Default)]
pub struct OfferEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<u32>,
    pub delivery_days: Option<u32>,
}

pub fn publish_offer(
    store: &Store,
    seller: &User,
    title: &str,
    description: &str,
    price: u32,
    delivery_days: u32,
) -> Result<MicroContract, GuildError> {
    if title.trim().is_empty() {
        return Err(GuildError::ValidationError("offer title is required".to_string()));
    }

    let contract = MicroContract {
        id: time::new_entity_id(),
        user_id: seller.id.clone(),
        user_name: seller.name.clone(),
        title: title.trim().to_string(),
        description: description.trim().to_string(),
        price,
        delivery_days,
        status: ContractStatus::Available,
        buyer_id: None,
        buyer_name: None,
        delivery_note: None,
    };

    let broker = LedgerBroker::new(store);
    let inserted = contract.clone();
    broker.with_ledger(&seller.id, "exchange.offer", move |ledger| {
        ledger.insert_contract(inserted);
        Ok(())
    })?;
    Ok(contract)
}

/// `Available -> Escrow`. The buyer must not be the seller.
pub fn book(store: &Store, buyer: &User, contract_id: &str) -> Result<MicroContract, GuildError> {
    let broker = LedgerBroker::new(store);
    let buyer_id = buyer.id.clone();
    let buyer_name = buyer.name.clone();
    broker.with_ledger(&buyer.id, "exchange.book", move |ledger| {
        let contract = ledger
            .find_contract(contract_id)
            .ok_or_else(|| GuildError::NotFound(format!("contract '{}'", contract_id)))?;
        if contract.status != ContractStatus::Available {
            return Err(GuildError::InvalidTransition(format!(
                "contract '{}' is {}, not Available",
                contract_id, contract.status
            )));
        }
        if contract.is_seller(&buyer_id) {
            return Err(GuildError::InvalidTransition(
                "a seller cannot book their own offer".to_string(),
            ));
        }
        ledger.patch_contract(
            contract_id,
            &ContractPatch {
                status: Some(ContractStatus::Escrow),
                buyer_id: Some(buyer_id),
                buyer_name: Some(buyer_name),
                ..ContractPatch::default()
            },
        )
    })
}

/// `Escrow -> Delivered`. Seller-only; the note is stored verbatim.
pub fn deliver(
    store: &Store,
    actor: &User,
    contract_id: &str,
    note: &str,
) -> Result<MicroContract, GuildError> {
    if note.trim().is_empty() {
        return Err(GuildError::ValidationError(
            "delivery note is required".to_string(),
        ));
    }
    let broker = LedgerBroker::new(store);
    let actor_id = actor.id.clone();
    let note = note.to_string();
    broker.with_ledger(&actor.id, "exchange.deliver", move |ledger| {
        let contract = ledger
            .find_contract(contract_id)
            .ok_or_else(|| GuildError::NotFound(format!("contract '{}'", contract_id)))?;
        if contract.status != ContractStatus::Escrow {
            return Err(GuildError::InvalidTransition(format!(
                "contract '{}' is {}, not In Escrow",
                contract_id, contract.status
            )));
        }
        if !contract.is_seller(&actor_id) {
            return Err(GuildError::InvalidTransition(
                "only the seller delivers".to_string(),
            ));
        }
        ledger.patch_contract(
            contract_id,
            &ContractPatch {
                status: Some(ContractStatus::Delivered),
                delivery_note: Some(note),
                ..ContractPatch::default()
            },
        )
    })
}

/// `Delivered -> Completed`. Either party confirms; the seller's
/// completed-session counter increments in the same cycle.
pub fn complete(store: &Store, actor: &User, contract_id: &str) -> Result<MicroContract, GuildError> {
    let broker = LedgerBroker::new(store);
    let actor_id = actor.id.clone();
    broker.with_ledger(&actor.id, "exchange.complete", move |ledger| {
        let contract = ledger
            .find_contract(contract_id)
            .ok_or_else(|| GuildError::NotFound(format!("contract '{}'", contract_id)))?;
        if contract.status != ContractStatus::Delivered {
            return Err(GuildError::InvalidTransition(format!(
                "contract '{}' is {}, not Delivered",
                contract_id, contract.status
            )));
        }
        if !contract.is_seller(&actor_id) && !contract.is_buyer(&actor_id) {
            return Err(GuildError::InvalidTransition(
                "only a party to the contract confirms receipt".to_string(),
            ));
        }
        let seller_id = contract.user_id.clone();
        let updated = ledger.patch_contract(
            contract_id,
            &ContractPatch {
                status: Some(ContractStatus::Completed),
                ..ContractPatch::default()
            },
        )?;
        let seller = ledger
            .users
            .iter_mut()
            .find(|u| u.id == seller_id)
            .ok_or_else(|| GuildError::NotFound(format!("user '{}'", seller_id)))?;
        seller.sessions_completed += 1;
        Ok(updated)
    })
}

/// Offer edits are frozen the moment a buyer escrows: anything past
/// `Available` is rejected.
pub fn edit_offer(
    store: &Store,
    actor: &User,
    contract_id: &str,
    edit: OfferEdit,
) -> Result<MicroContract, GuildError> {
    let broker = LedgerBroker::new(store);
    let actor_id = actor.id.clone();
    broker.with_ledger(&actor.id, "exchange.edit", move |ledger| {
        let contract = ledger
            .find_contract(contract_id)
            .ok_or_else(|| GuildError::NotFound(format!("contract '{}'", contract_id)))?;
        if !contract.is_seller(&actor_id) {
            return Err(GuildError::InvalidTransition(
                "only the seller edits an offer".to_string(),
            ));
        }
        if contract.status != ContractStatus::Available {
            return Err(GuildError::InvalidTransition(format!(
                "contract '{}' is {}; terms are frozen once escrowed",
                contract_id, contract.status
            )));
        }
        if let Some(title) = &edit.title {
            if title.trim().is_empty() {
                return Err(GuildError::ValidationError("offer title is required".to_string()));
            }
        }
        ledger.patch_contract(
            contract_id,
            &ContractPatch {
                title: edit.title.clone(),
                description: edit.description.clone(),
                price: edit.price,
                delivery_days: edit.delivery_days,
                ..ContractPatch::default()
            },
        )
    })
}

fn print_contract(contract: &MicroContract) {
    use colored::Colorize;
    let status = match contract.status {
        ContractStatus::Available => format!("{}", contract.status).bright_green(),
        ContractStatus::Escrow => format!("{}", contract.status).bright_blue(),
        ContractStatus::Delivered => format!("{}", contract.status).bright_yellow(),
        ContractStatus::Completed => format!("{}", contract.status).bright_cyan(),
    };
    let buyer = contract
        .buyer_name
        .as_deref()
        .map(|b| format!(" <- {}", b))
        .unwrap_or_default();
    println!(
        "{}  {:<28} ${:<5} {}d  [{}]  {}{}",
        contract.id,
        crate::core::output::compact_line(&contract.title, 28),
        contract.price,
        contract.delivery_days,
        status,
        contract.user_name,
        buyer
    );
}

pub fn run_exchange_cli(store: &Store, cli: ExchangeCli) -> Result<(), GuildError> {
    store::require_initialized(store)?;
    let broker = LedgerBroker::new(store);

    match cli.command {
        ExchangeCommand::Offer {
            title,
            description,
            price,
            delivery_days,
        } => {
            let ledger = broker.read()?;
            let actor = session::require_actor(store, &ledger)?;
            let contract = publish_offer(store, &actor, &title, &description, price, delivery_days)?;
            match cli.format {
                OutputFormat::Text => println!("Offer published (ID: {})", contract.id),
                OutputFormat::Json => {
                    let envelope = time::command_envelope(
                        "exchange.offer",
                        "success",
                        serde_json::json!({ "contract": contract }),
                    );
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                }
            }
        }
        ExchangeCommand::List { seller } => {
            let ledger = broker.read()?;
            let contracts: Vec<&MicroContract> = ledger
                .contracts
                .iter()
                .filter(|c| seller.as_deref().is_none_or(|s| c.user_id == s))
                .collect();
            match cli.format {
                OutputFormat::Text => {
                    for contract in contracts {
                        print_contract(contract);
                    }
                }
                OutputFormat::Json => {
                    let envelope = time::command_envelope(
                        "exchange.list",
                        "success",
                        serde_json::json!({ "contracts": contracts }),
                    );
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                }
            }
        }
        ExchangeCommand::Edit {
            id,
            title,
            description,
            price,
            delivery_days,
        } => {
            let ledger = broker.read()?;
            let actor = session::require_actor(store, &ledger)?;
            let contract = edit_offer(
                store,
                &actor,
                &id,
                OfferEdit {
                    title,
                    description,
                    price,
                    delivery_days,
                },
            )?;
            println!("Offer updated (ID: {})", contract.id);
        }
        ExchangeCommand::Book { id } => {
            let ledger = broker.read()?;
            let actor = session::require_actor(store, &ledger)?;
            let contract = book(store, &actor, &id)?;
            println!(
                "Escrow authorized: ${} committed to '{}'",
                contract.price, contract.title
            );
        }
        ExchangeCommand::Deliver { id, note } => {
            let ledger = broker.read()?;
            let actor = session::require_actor(store, &ledger)?;
            let contract = deliver(store, &actor, &id, &note)?;
            println!("Delivered '{}'; awaiting confirmation", contract.title);
        }
        ExchangeCommand::Complete { id } => {
            let ledger = broker.read()?;
            let actor = session::require_actor(store, &ledger)?;
            let contract = complete(store, &actor, &id)?;
            println!("Completed '{}'; seller credited", contract.title);
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "exchange",
        "version": "0.1.0",
        "description": "Escrowed micro-contract lifecycle",
        "commands": [
            { "name": "offer", "parameters": ["title", "description", "price", "delivery-days"] },
            { "name": "list", "parameters": ["seller"] },
            { "name": "edit", "parameters": ["id", "title", "description", "price", "delivery-days"] },
            { "name": "book", "parameters": ["id"] },
            { "name": "deliver", "parameters": ["id", "note"] },
            { "name": "complete", "parameters": ["id"] }
        ],
        "storage": ["ledger.json"]
    })
}
