//! Session config persisted next to the ledger (`config.toml`).

use crate::core::error::GuildError;
use crate::core::store::Store;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Id of the user acting in this session, if one is logged in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

pub fn load_config(store: &Store) -> Result<SessionConfig, GuildError> {
    let path = store.config_path();
    if !path.exists() {
        return Ok(SessionConfig::default());
    }
    let content = fs::read_to_string(path)?;
    let config: SessionConfig =
        toml::from_str(&content).map_err(|e| GuildError::ValidationError(e.to_string()))?;
    Ok(config)
}

pub fn save_config(store: &Store, config: &SessionConfig) -> Result<(), GuildError> {
    fs::create_dir_all(&store.root)?;
    let content =
        toml::to_string_pretty(config).map_err(|e| GuildError::ValidationError(e.to_string()))?;
    fs::write(store.config_path(), content)?;
    Ok(())
}
