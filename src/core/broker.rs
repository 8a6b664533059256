use crate::core::error::GuildError;
use crate::core::ledger::{self, Ledger};
use crate::core::store::Store;
use crate::core::time;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

/// The Ledger Broker is the "thin waist" for state access: every mutation is
/// a full load-modify-save cycle executed here, serialized in-process and
/// recorded in an append-only audit log. A closure error aborts the save, so
/// failed operations leave the document byte-for-byte unchanged.
pub struct LedgerBroker {
    ledger_path: PathBuf,
    audit_log_path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LedgerEvent {
    pub ts: String,
    pub event_id: String,
    pub actor: String,
    pub op: String,
    pub status: String,
}

impl LedgerBroker {
    pub fn new(store: &Store) -> Self {
        Self {
            ledger_path: store.ledger_path(),
            audit_log_path: store.audit_log_path(),
        }
    }

    /// Snapshot read of the full document. Mutating the returned value does
    /// not touch stored state.
    pub fn read(&self) -> Result<Ledger, GuildError> {
        ledger::load_ledger(&self.ledger_path)
    }

    /// Execute a closure against the loaded document and persist on success.
    pub fn with_ledger<F, R>(&self, actor: &str, op_name: &str, f: F) -> Result<R, GuildError>
    where
        F: FnOnce(&mut Ledger) -> Result<R, GuildError>,
    {
        // Simple in-process lock; cross-process writers still race (last
        // writer wins on the whole document).
        static LEDGER_LOCK: Mutex<()> = Mutex::new(());
        let _lock = LEDGER_LOCK.lock().unwrap();

        let mut doc = ledger::load_ledger(&self.ledger_path)?;
        let result = f(&mut doc);
        if result.is_ok() {
            ledger::save_ledger(&self.ledger_path, &doc)?;
        }

        let status = if result.is_ok() { "success" } else { "error" };
        self.log_event(actor, op_name, status)?;

        result
    }

    fn log_event(&self, actor: &str, op: &str, status: &str) -> Result<(), GuildError> {
        use std::fs::OpenOptions;
        use std::io::Write;

        if let Some(parent) = self.audit_log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let ev = LedgerEvent {
            ts: time::now_epoch_z(),
            event_id: time::new_entity_id(),
            actor: actor.to_string(),
            op: op.to_string(),
            status: status.to_string(),
        };

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .map_err(GuildError::IoError)?;

        writeln!(f, "{}", serde_json::to_string(&ev)?).map_err(GuildError::IoError)?;
        Ok(())
    }
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "broker",
        "version": "0.1.0",
        "description": "Ledger mutation broker (the thin waist)",
        "commands": [
            { "name": "audit", "description": "Show the mutation audit log" }
        ],
        "storage": ["ledger.json", "broker.events.jsonl"]
    })
}
