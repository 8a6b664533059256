use std::env;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuildError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Ledger serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Environment variable error: {0}")]
    EnvVarError(#[from] env::VarError),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}
