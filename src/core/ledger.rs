//! The guild ledger: one JSON document holding every collection.
//!
//! This is the single source of truth. Every operation works on the full
//! document (load, mutate, save) with no partial writes. Collection-level
//! contracts live here: newest-first ordering for projects/contracts,
//! prepend-only comments, append-only messages, id uniqueness, and explicit
//! [`GuildError::NotFound`] on unresolved ids instead of silent no-ops.
//!
//! Multiple processes racing on the same document will clobber each other
//! (last writer wins on the whole file). That is an accepted property of the
//! single-writer design, not something this module papers over.

use crate::core::error::GuildError;
use crate::core::model::{
    Comment, Conversation, Message, MicroContract, PeerReviewRequest, Project, User,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Codes seeded into a fresh ledger so the first cohort can enroll.
pub const STARTER_INVITES: [&str; 4] = ["AUC-2024", "GUC-ELITE", "SHIP-FAST", "BETA-MADE"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub users: Vec<User>,
    pub projects: Vec<Project>,
    pub contracts: Vec<MicroContract>,
    pub conversations: Vec<Conversation>,
    pub invites: Vec<String>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::bootstrap()
    }
}

/// Field-wise merge for [`Ledger::patch_contract`]. Carries no `id` field,
/// so a patch cannot re-key a contract; `None` means "leave unchanged", so
/// buyer fields and the delivery note can never be cleared once set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<u32>,
    pub delivery_days: Option<u32>,
    pub status: Option<crate::core::model::ContractStatus>,
    pub buyer_id: Option<String>,
    pub buyer_name: Option<String>,
    pub delivery_note: Option<String>,
}

impl ContractPatch {
    fn apply(&self, contract: &mut MicroContract) {
        if let Some(title) = &self.title {
            contract.title = title.clone();
        }
        if let Some(description) = &self.description {
            contract.description = description.clone();
        }
        if let Some(price) = self.price {
            contract.price = price;
        }
        if let Some(delivery_days) = self.delivery_days {
            contract.delivery_days = delivery_days;
        }
        if let Some(status) = self.status {
            contract.status = status;
        }
        if let Some(buyer_id) = &self.buyer_id {
            contract.buyer_id = Some(buyer_id.clone());
        }
        if let Some(buyer_name) = &self.buyer_name {
            contract.buyer_name = Some(buyer_name.clone());
        }
        if let Some(delivery_note) = &self.delivery_note {
            contract.delivery_note = Some(delivery_note.clone());
        }
    }
}

impl Ledger {
    /// The empty document: no records, starter invite codes seeded.
    pub fn bootstrap() -> Self {
        Self {
            users: Vec::new(),
            projects: Vec::new(),
            contracts: Vec::new(),
            conversations: Vec::new(),
            invites: STARTER_INVITES.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn find_user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn find_project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn find_contract(&self, id: &str) -> Option<&MicroContract> {
        self.contracts.iter().find(|c| c.id == id)
    }

    pub fn find_conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Insert or replace by id, preserving collection order on replace.
    pub fn upsert_user(&mut self, user: User) {
        match self.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => self.users.push(user),
        }
    }

    /// Newest-first ordering is a store contract, not a caller concern.
    pub fn insert_project(&mut self, project: Project) {
        self.projects.insert(0, project);
    }

    pub fn append_comment(&mut self, project_id: &str, comment: Comment) -> Result<(), GuildError> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or_else(|| GuildError::NotFound(format!("project '{}'", project_id)))?;
        project.comments.insert(0, comment);
        Ok(())
    }

    pub fn push_review_request(
        &mut self,
        project_id: &str,
        request: PeerReviewRequest,
    ) -> Result<(), GuildError> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or_else(|| GuildError::NotFound(format!("project '{}'", project_id)))?;
        project.peer_review_requests.push(request);
        Ok(())
    }

    pub fn insert_contract(&mut self, contract: MicroContract) {
        self.contracts.insert(0, contract);
    }

    /// Merge `Some` fields of the patch into the matching contract and
    /// return the updated record.
    pub fn patch_contract(
        &mut self,
        contract_id: &str,
        patch: &ContractPatch,
    ) -> Result<MicroContract, GuildError> {
        let contract = self
            .contracts
            .iter_mut()
            .find(|c| c.id == contract_id)
            .ok_or_else(|| GuildError::NotFound(format!("contract '{}'", contract_id)))?;
        patch.apply(contract);
        Ok(contract.clone())
    }

    /// Append to the conversation, creating it from the given participant
    /// pair when absent.
    pub fn append_message(
        &mut self,
        conversation_id: &str,
        participants: &[String],
        message: Message,
    ) {
        let idx = match self.conversations.iter().position(|c| c.id == conversation_id) {
            Some(idx) => idx,
            None => {
                self.conversations.push(Conversation {
                    id: conversation_id.to_string(),
                    participants: participants.to_vec(),
                    messages: Vec::new(),
                });
                self.conversations.len() - 1
            }
        };
        self.conversations[idx].messages.push(message);
    }

    pub fn invite_is_valid(&self, code: &str) -> bool {
        self.invites.iter().any(|c| c == code)
    }

    /// Idempotent: adding a present code changes nothing.
    pub fn add_invite(&mut self, code: &str) {
        if !self.invite_is_valid(code) {
            self.invites.push(code.to_string());
        }
    }

    /// Blocks future redemption. Users that already redeemed the code keep
    /// their access; revoking a key does not eject the entity it let in.
    pub fn remove_invite(&mut self, code: &str) {
        self.invites.retain(|c| c != code);
    }
}

/// Read the full document, or the bootstrap value when no file exists yet.
pub fn load_ledger(path: &Path) -> Result<Ledger, GuildError> {
    if !path.exists() {
        return Ok(Ledger::bootstrap());
    }
    let content = fs::read_to_string(path)?;
    let ledger = serde_json::from_str(&content)?;
    Ok(ledger)
}

/// Persist the full document. No partial writes: the whole serialized
/// document replaces the file.
pub fn save_ledger(path: &Path, ledger: &Ledger) -> Result<(), GuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(ledger)?;
    fs::write(path, content)?;
    Ok(())
}
