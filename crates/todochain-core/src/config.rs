use std::fs;
use std::path::Path;
use std::time::Duration;

use alloy_primitives::{
  Address,
  address
};
use serde::{
  Deserialize,
  Serialize
};
use serde_json::{
  Value,
  json
};
use tracing::{
  debug,
  info
};

use crate::error::ConfigError;

pub const CALIBRATION_CHAIN_ID: u64 =
  314_159;

pub const DEFAULT_CONTRACT_ADDRESS:
  Address = address!(
  "445744147560636C895A1B522cc7c50E8e583031"
);

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct NativeCurrency {
  pub name:     String,
  pub symbol:   String,
  pub decimals: u8
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(
  rename_all = "camelCase",
  default
)]
pub struct NetworkDescriptor {
  pub chain_id:            u64,
  pub chain_name:          String,
  pub native_currency:     NativeCurrency,
  pub rpc_urls:            Vec<String>,
  pub block_explorer_urls: Vec<String>
}

impl NetworkDescriptor {
  pub fn calibration() -> Self {
    Self {
      chain_id:            CALIBRATION_CHAIN_ID,
      chain_name:
        "Filecoin Calibration"
          .to_string(),
      native_currency:
        NativeCurrency {
          name:     "Test FIL"
            .to_string(),
          symbol:   "tFIL".to_string(),
          decimals: 18
        },
      rpc_urls:            vec![
        "https://api.calibration.node.glif.io/rpc/v1"
          .to_string(),
      ],
      block_explorer_urls: vec![
        "https://calibration.filscan.io"
          .to_string(),
      ]
    }
  }

  /// Chain id as wallets expect it on
  /// the wire: `0x`-prefixed lowercase
  /// hex.
  pub fn chain_id_hex(&self) -> String {
    format!("{:#x}", self.chain_id)
  }

  /// Parameter object for
  /// `wallet_addEthereumChain`.
  pub fn add_chain_params(
    &self
  ) -> Value {
    json!({
      "chainId": self.chain_id_hex(),
      "chainName": self.chain_name,
      "nativeCurrency": self.native_currency,
      "rpcUrls": self.rpc_urls,
      "blockExplorerUrls": self.block_explorer_urls,
    })
  }

  pub fn primary_rpc_url(
    &self
  ) -> Option<&str> {
    self
      .rpc_urls
      .first()
      .map(String::as_str)
  }
}

impl Default for NetworkDescriptor {
  fn default() -> Self {
    Self::calibration()
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(default)]
pub struct WalletPolicy {
  pub detect_interval_ms:        u64,
  pub detect_max_attempts:       u32,
  pub switch_confirm_timeout_ms: u64,
  pub switch_poll_interval_ms:   u64,
  pub receipt_poll_interval_ms:  u64,
  pub receipt_timeout_ms:
    Option<u64>
}

impl Default for WalletPolicy {
  fn default() -> Self {
    Self {
      detect_interval_ms:        1_000,
      detect_max_attempts:       120,
      switch_confirm_timeout_ms: 1_000,
      switch_poll_interval_ms:   250,
      receipt_poll_interval_ms:  1_500,
      receipt_timeout_ms:
        Some(300_000)
    }
  }
}

impl WalletPolicy {
  pub fn detect_interval(
    &self
  ) -> Duration {
    Duration::from_millis(
      self.detect_interval_ms
    )
  }

  pub fn switch_confirm_timeout(
    &self
  ) -> Duration {
    Duration::from_millis(
      self.switch_confirm_timeout_ms
    )
  }

  pub fn switch_poll_interval(
    &self
  ) -> Duration {
    Duration::from_millis(
      self.switch_poll_interval_ms
    )
  }

  pub fn receipt_poll_interval(
    &self
  ) -> Duration {
    Duration::from_millis(
      self.receipt_poll_interval_ms
    )
  }

  pub fn receipt_timeout(
    &self
  ) -> Option<Duration> {
    self
      .receipt_timeout_ms
      .map(Duration::from_millis)
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(default)]
pub struct DappConfig {
  pub contract_address: Address,
  pub network:          NetworkDescriptor,
  pub wallet:           WalletPolicy
}

impl Default for DappConfig {
  fn default() -> Self {
    Self {
      contract_address:
        DEFAULT_CONTRACT_ADDRESS,
      network:
        NetworkDescriptor::default(),
      wallet:
        WalletPolicy::default()
    }
  }
}

impl DappConfig {
  #[tracing::instrument(skip(text))]
  pub fn from_toml_str(
    text: &str
  ) -> Result<Self, ConfigError> {
    let cfg: DappConfig =
      toml::from_str(text)?;
    cfg.validate()?;
    debug!(
      contract = %cfg.contract_address,
      chain_id = cfg.network.chain_id,
      "parsed dapp config"
    );
    Ok(cfg)
  }

  #[tracing::instrument]
  pub fn load(
    path: &Path
  ) -> Result<Self, ConfigError> {
    let text =
      fs::read_to_string(path)
        .map_err(|source| {
          ConfigError::Read {
            path: path
              .display()
              .to_string(),
            source
          }
        })?;
    info!(config = %path.display(), "loading dapp config");
    Self::from_toml_str(&text)
  }

  fn validate(
    &self
  ) -> Result<(), ConfigError> {
    if self.network.chain_id == 0 {
      return Err(ConfigError::Invalid(
        "network.chainId must be \
         non-zero"
          .to_string()
      ));
    }
    if self
      .network
      .primary_rpc_url()
      .is_none()
    {
      return Err(ConfigError::Invalid(
        "network.rpcUrls needs at \
         least one entry"
          .to_string()
      ));
    }
    if self
      .wallet
      .switch_poll_interval_ms
      == 0
      || self
        .wallet
        .receipt_poll_interval_ms
        == 0
    {
      return Err(ConfigError::Invalid(
        "poll intervals must be \
         positive"
          .to_string()
      ));
    }
    Ok(())
  }
}
