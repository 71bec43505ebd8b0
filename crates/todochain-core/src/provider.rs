//! EIP-1193 provider seam.
//!
//! Hosts implement [`Eip1193`] for whatever actually talks to the wallet
//! (the injected `window.ethereum` in the browser, a scripted wallet in
//! tests). Everything above this module only speaks JSON-RPC through it.

use std::future::Future;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProviderError {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    pub const DISCONNECTED: i64 = 4900;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    pub const INTERNAL: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Error raised locally when a response does not have the expected shape.
    pub fn malformed(method: &str, detail: impl std::fmt::Display) -> Self {
        Self::new(
            Self::INTERNAL,
            format!("malformed {method} response: {detail}"),
        )
    }

    /// Mobile wallets nest the real code under `data.originalError`.
    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Self::UNRECOGNIZED_CHAIN
            || self
                .data
                .as_ref()
                .and_then(|data| data.pointer("/originalError/code"))
                .and_then(Value::as_i64)
                == Some(Self::UNRECOGNIZED_CHAIN)
    }
}

pub trait Eip1193 {
    /// `provider.request({ method, params })`.
    fn request(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, ProviderError>>;
}

/// Wallet notifications the session reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(String),
}

pub const ACCOUNTS_CHANGED: &str = "accountsChanged";
pub const CHAIN_CHANGED: &str = "chainChanged";

impl WalletEvent {
    /// Builds an event from a listener payload. A payload of the wrong shape
    /// is an error, never an empty account list.
    pub fn from_payload(event: &str, payload: Value) -> Result<Self, ProviderError> {
        match event {
            ACCOUNTS_CHANGED => serde_json::from_value(payload)
                .map(WalletEvent::AccountsChanged)
                .map_err(|e| ProviderError::malformed(event, e)),
            CHAIN_CHANGED => match payload {
                Value::String(chain_id) => Ok(WalletEvent::ChainChanged(chain_id)),
                other => Err(ProviderError::malformed(event, other)),
            },
            other => Err(ProviderError::new(
                ProviderError::UNSUPPORTED_METHOD,
                format!("{other} is not a wallet event"),
            )),
        }
    }
}

pub fn parse_hex_u64(raw: &str) -> Option<u64> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))?;
    u64::from_str_radix(digits, 16).ok()
}

pub fn parse_accounts(method: &str, value: Value) -> Result<Vec<Address>, ProviderError> {
    let raw: Vec<String> =
        serde_json::from_value(value).map_err(|e| ProviderError::malformed(method, e))?;
    raw.iter()
        .map(|account| {
            account
                .parse::<Address>()
                .map_err(|e| ProviderError::malformed(method, format!("{account}: {e}")))
        })
        .collect()
}

/// `eth_chainId` decoded to a number.
pub async fn chain_id<P: Eip1193>(provider: &P) -> Result<u64, ProviderError> {
    let value = provider.request("eth_chainId", json!([])).await?;
    let id = value
        .as_str()
        .and_then(parse_hex_u64)
        .ok_or_else(|| ProviderError::malformed("eth_chainId", &value))?;
    debug!(chain_id = id, "wallet reported chain");
    Ok(id)
}

/// `eth_requestAccounts`; prompts the user when the site is not yet authorized.
pub async fn request_accounts<P: Eip1193>(provider: &P) -> Result<Vec<Address>, ProviderError> {
    let value = provider
        .request("eth_requestAccounts", json!([{ "eth_accounts": {} }]))
        .await?;
    parse_accounts("eth_requestAccounts", value)
}
