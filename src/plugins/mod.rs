//! Subsystem implementations layered on the core ledger.

pub mod exchange;
pub mod invite;
pub mod member;
pub mod proof;
pub mod relay;
pub mod signal;
