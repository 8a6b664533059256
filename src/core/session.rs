//! Session identity: who is acting, and the operator credential gate.
//!
//! The acting user is injected from outside the ledger (env var, then the
//! persisted session config); the store itself has no concept of "current
//! user". The operator credential is a single hard-coded pair, kept in the
//! tree only as SHA-256 digests and compared digest-to-digest.

use crate::core::config;
use crate::core::error::GuildError;
use crate::core::ledger::Ledger;
use crate::core::model::{Track, User};
use crate::core::store::Store;
use sha2::{Digest, Sha256};
use std::env;

/// Environment override for the acting user id.
pub const ACTOR_ENV: &str = "GUILDHALL_ACTOR";

/// Fixed id the operator account is upserted under on credential login.
pub const OPERATOR_USER_ID: &str = "operator";

// SHA-256 hex digests of the operator identity/secret pair.
const OPERATOR_ID_DIGEST: &str =
    "214755345a33ae97f348dbaf12296ca0631a3436a0f13d9142bc767a98f74412";
const OPERATOR_KEY_DIGEST: &str =
    "7d87665bb29b25fe12ce4bb388435c0f867aa44b3107f839b9ba136a3c5baa77";

pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_operator(identity: &str, secret: &str) -> bool {
    sha256_hex(identity) == OPERATOR_ID_DIGEST && sha256_hex(secret) == OPERATOR_KEY_DIGEST
}

/// The operator account record written on successful credential login.
pub fn operator_user() -> User {
    User {
        id: OPERATOR_USER_ID.to_string(),
        name: "Guild Operator".to_string(),
        university: None,
        track: Track::Other,
        session_price: 0,
        github_url: None,
        figma_url: None,
        sessions_completed: 0,
        is_verified: true,
        invite_code: None,
        is_admin: true,
    }
}

/// Resolve the acting user id: `GUILDHALL_ACTOR`, then the session config.
pub fn resolve_actor_id(store: &Store) -> Result<Option<String>, GuildError> {
    match env::var(ACTOR_ENV) {
        Ok(id) if !id.trim().is_empty() => return Ok(Some(id)),
        Ok(_) | Err(env::VarError::NotPresent) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(config::load_config(store)?.actor)
}

/// Resolve the acting user and look them up in the ledger. Commands that
/// mutate on behalf of a user go through this.
pub fn require_actor(store: &Store, ledger: &Ledger) -> Result<User, GuildError> {
    let id = resolve_actor_id(store)?.ok_or_else(|| {
        GuildError::ValidationError(
            "no active session; run `guildhall session login` or set GUILDHALL_ACTOR".to_string(),
        )
    })?;
    ledger
        .find_user(&id)
        .cloned()
        .ok_or_else(|| GuildError::NotFound(format!("user '{}'", id)))
}

/// Admin gate for operator-only surfaces (invite management).
pub fn require_admin(store: &Store, ledger: &Ledger) -> Result<User, GuildError> {
    let actor = require_actor(store, ledger)?;
    if !actor.is_admin {
        return Err(GuildError::Unauthorized(format!(
            "user '{}' is not an operator",
            actor.id
        )));
    }
    Ok(actor)
}
