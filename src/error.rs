//! Error types for report generation and startup

use thiserror::Error;

use crate::types::ChainId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GasBotError {
    /// Oracle call failed or returned data that cannot be represented
    #[error("oracle query failed for {name} (chain {chain_id}): {reason}")]
    OracleQueryFailure {
        name: String,
        chain_id: ChainId,
        reason: String,
    },

    /// Required configuration missing or invalid at startup
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

impl GasBotError {
    pub fn oracle(name: &str, chain_id: ChainId, reason: impl Into<String>) -> Self {
        GasBotError::OracleQueryFailure {
            name: name.to_string(),
            chain_id,
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        GasBotError::ConfigurationError(msg.into())
    }
}
