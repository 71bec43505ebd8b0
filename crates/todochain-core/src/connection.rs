use alloy_primitives::Address;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::DappConfig;
use crate::contract::{TodoContract, WalletSigner};
use crate::error::DappError;
use crate::network::NetworkManager;
use crate::provider::{self, Eip1193, ProviderError};

/// What the UI needs to know about the wallet link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    pub provider_present: bool,
    pub network_correct: bool,
    pub account: Option<Address>,
    pub connecting: bool,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    /// Drops the authorized account. Provider and network flags describe the
    /// environment, not the authorization, so they survive.
    pub fn clear_account(&mut self) {
        self.account = None;
        self.connecting = false;
    }
}

pub struct ConnectionManager<'a> {
    config: &'a DappConfig,
}

impl<'a> ConnectionManager<'a> {
    pub fn new(config: &'a DappConfig) -> Self {
        Self { config }
    }

    /// Checks the network, asks the wallet for accounts and binds the
    /// contract to the first one.
    #[tracing::instrument(skip_all, fields(contract = %self.config.contract_address))]
    pub async fn connect<P: Eip1193>(&self, provider: &P) -> Result<TodoContract, DappError> {
        NetworkManager::new(&self.config.network, &self.config.wallet)
            .verify(provider)
            .await?;

        let accounts = provider::request_accounts(provider)
            .await
            .map_err(|err| match err.code {
                ProviderError::USER_REJECTED | ProviderError::UNAUTHORIZED => {
                    DappError::AuthorizationDenied(err.message)
                }
                _ => DappError::Provider(err),
            })?;

        let Some(account) = accounts.first().copied() else {
            warn!("wallet returned no accounts");
            return Err(DappError::AuthorizationDenied(
                "wallet returned no accounts".to_string(),
            ));
        };

        info!(%account, "wallet connected");
        Ok(TodoContract::new(
            self.config.contract_address,
            WalletSigner::new(account),
        ))
    }
}
