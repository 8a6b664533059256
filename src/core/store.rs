//! Store handle for a Guildhall state workspace.
//!
//! A [`Store`] is a logical container for the ledger document, the broker
//! audit log, and the session config. It carries no open handles; operations
//! resolve paths through it and perform complete load/save cycles.

use crate::core::error::GuildError;
use crate::core::ledger::{self, Ledger};
use std::env;
use std::fs;
use std::path::PathBuf;

pub const LEDGER_FILE: &str = "ledger.json";
pub const AUDIT_LOG_FILE: &str = "broker.events.jsonl";
pub const CONFIG_FILE: &str = "config.toml";

/// Environment override for the store root directory.
pub const STORE_ROOT_ENV: &str = "GUILDHALL_HOME";

const DEFAULT_ROOT: &str = ".guildhall";

#[derive(Debug, Clone)]
pub struct Store {
    /// Absolute or caller-relative path to the store root directory.
    pub root: PathBuf,
}

impl Store {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the store root: explicit `--dir`, then `GUILDHALL_HOME`,
    /// then `.guildhall` under the current directory.
    pub fn resolve(dir: Option<PathBuf>) -> Self {
        let root = dir
            .or_else(|| env::var(STORE_ROOT_ENV).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT));
        Self { root }
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(LEDGER_FILE)
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.root.join(AUDIT_LOG_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Create the root directory and write the bootstrap document if no
    /// ledger exists yet. Re-running against an initialized store is a no-op.
    pub fn init(&self) -> Result<(), GuildError> {
        fs::create_dir_all(&self.root)?;
        let path = self.ledger_path();
        if !path.exists() {
            ledger::save_ledger(&path, &Ledger::bootstrap())?;
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.ledger_path().exists()
    }
}

/// Guard used by commands that require an existing store.
pub fn require_initialized(store: &Store) -> Result<(), GuildError> {
    if !store.is_initialized() {
        return Err(GuildError::ValidationError(format!(
            "no ledger at {}; run `guildhall init` first",
            store.ledger_path().display()
        )));
    }
    Ok(())
}
