use thiserror::Error;

use crate::provider::ProviderError;

/// Which contract read failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTarget {
    TaskCount,
    Task(u64),
}

impl std::fmt::Display for ReadTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadTarget::TaskCount => write!(f, "task count"),
            ReadTarget::Task(index) => write!(f, "task {index}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DappError {
    #[error("no injected wallet provider found")]
    ProviderAbsent,

    #[error("wallet is on chain {actual}, expected {expected}")]
    NetworkMismatch { expected: u64, actual: u64 },

    #[error("failed to switch or add chain {chain_id}: {source}")]
    ChainSwitch {
        chain_id: u64,
        #[source]
        source: ProviderError,
    },

    #[error("failed to read the wallet's chain id: {0}")]
    ChainQuery(#[source] ProviderError),

    #[error("chain switch not confirmed: wallet still on {actual}, expected {expected}")]
    SwitchUnconfirmed { expected: u64, actual: u64 },

    #[error("account authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("failed to read {target}: {reason}")]
    Read { target: ReadTarget, reason: String },

    #[error("failed to submit transaction: {0}")]
    Submit(String),

    #[error("transaction {tx_hash} not confirmed: {reason}")]
    Confirm { tx_hash: String, reason: String },

    #[error("task description is empty")]
    EmptyDescription,

    #[error("wallet is not connected")]
    NotConnected,

    #[error("another wallet operation is already in progress")]
    Busy,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl DappError {
    pub fn read(target: ReadTarget, reason: impl ToString) -> Self {
        DappError::Read {
            target,
            reason: reason.to_string(),
        }
    }

    /// True for the wallet's "user rejected the request" code.
    pub fn is_user_rejection(&self) -> bool {
        match self {
            DappError::ChainSwitch { source, .. } | DappError::Provider(source) => {
                source.code == ProviderError::USER_REJECTED
            }
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
