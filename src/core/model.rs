//! Entity records for the guild ledger.
//!
//! Field names serialize in the camelCase layout the original vault document
//! used, so an existing `ledger.json` round-trips unchanged. Owner name/track
//! fields on [`Project`] and [`MicroContract`] are creation-time snapshots of
//! the owning user and are never re-joined against the user collection.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum Track {
    Engineer,
    Designer,
    Product,
    Other,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Track::Engineer => "Engineer",
            Track::Designer => "Designer",
            Track::Product => "Product",
            Track::Other => "Other",
        };
        write!(f, "{}", label)
    }
}

/// Micro-contract lifecycle state. Transitions only move forward:
/// `Available -> Escrow -> Delivered -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    #[serde(rename = "Available")]
    Available,
    #[serde(rename = "In Escrow")]
    Escrow,
    #[serde(rename = "Delivered")]
    Delivered,
    #[serde(rename = "Completed")]
    Completed,
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContractStatus::Available => "Available",
            ContractStatus::Escrow => "In Escrow",
            ContractStatus::Delivered => "Delivered",
            ContractStatus::Completed => "Completed",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    pub track: Track,
    pub session_price: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figma_url: Option<String>,
    pub sessions_completed: u32,
    pub is_verified: bool,
    /// Code redeemed at enrollment. Kept for provenance; removing the code
    /// from the gate later does not touch this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_admin: bool,
}

/// Structured failure report attached to every proof artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    pub goal: String,
    pub approach: String,
    pub wrong: String,
    pub effect: String,
    pub lessons: String,
    pub redone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerReviewRequest {
    pub id: String,
    pub reviewer_id: String,
    pub reviewer_name: String,
    pub status: ReviewStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub user_id: String,
    /// Owner display snapshot taken at creation. Stale by design.
    pub user_name: String,
    pub user_track: Track,
    pub title: String,
    pub problem: String,
    pub outcome_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub links: Vec<String>,
    pub hard_part: String,
    pub what_id_redo: String,
    pub what_failed: FailureReport,
    pub timestamp: u64,
    /// Newest first. [`Ledger::append_comment`] prepends.
    ///
    /// [`Ledger::append_comment`]: crate::core::ledger::Ledger::append_comment
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remix_reason: Option<String>,
    #[serde(default)]
    pub peer_review_requests: Vec<PeerReviewRequest>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_spotlight: bool,
}

impl Project {
    /// Copy this artifact as a remix owned by another user: content carries
    /// over, comments and review requests start empty, the spotlight flag
    /// clears, and the lineage fields point back at the source.
    pub fn remixed_by(&self, new_id: String, owner: &User, reason: String, timestamp: u64) -> Self {
        Self {
            id: new_id,
            user_id: owner.id.clone(),
            user_name: owner.name.clone(),
            user_track: owner.track,
            original_project_id: Some(self.id.clone()),
            remix_reason: Some(reason),
            timestamp,
            comments: Vec::new(),
            peer_review_requests: Vec::new(),
            is_spotlight: false,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroContract {
    pub id: String,
    /// Seller id. Named `userId` on the wire like every other owner field.
    pub user_id: String,
    pub user_name: String,
    pub title: String,
    pub description: String,
    pub price: u32,
    pub delivery_days: u32,
    pub status: ContractStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_note: Option<String>,
}

impl MicroContract {
    pub fn is_seller(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn is_buyer(&self, user_id: &str) -> bool {
        self.buyer_id.as_deref() == Some(user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub text: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Canonical pair key: the two participant ids sorted and joined with `-`.
    pub id: String,
    pub participants: Vec<String>,
    /// Chronological, append-only.
    pub messages: Vec<Message>,
}
