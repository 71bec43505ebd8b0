//! Typed binding for the deployed `TodoList` contract.
//!
//! Reads go through `eth_call`, writes through `eth_sendTransaction` from the
//! connected account; the wallet does the signing.

use alloy_primitives::{Address, B256, Bytes, U64, U256};
use alloy_sol_types::{SolCall, sol};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, trace};

use crate::error::{DappError, ReadTarget};
use crate::provider::{Eip1193, ProviderError};

sol! {
    #[sol(all_derives)]
    interface ITodoList {
        function addTask(string _description) external;
        function completeTask(uint256 _index) external;
        function getTask(uint256 _index) external view returns (string, bool);
        function getTaskCount() external view returns (uint256);
    }
}

/// Transaction signer bound to one wallet account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletSigner {
    account: Address,
}

impl WalletSigner {
    pub fn new(account: Address) -> Self {
        Self { account }
    }

    pub fn account(&self) -> Address {
        self.account
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub succeeded: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: B256,
    #[serde(default)]
    block_number: Option<U64>,
    #[serde(default)]
    status: Option<U64>,
}

impl From<RawReceipt> for TxReceipt {
    fn from(raw: RawReceipt) -> Self {
        Self {
            transaction_hash: raw.transaction_hash,
            block_number: raw.block_number.map(|n| n.to::<u64>()),
            // Receipts without a status field predate EIP-658 and only exist
            // for mined, non-reverted transactions.
            succeeded: raw.status.is_none_or(|s| s == U64::from(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodoContract {
    address: Address,
    signer: WalletSigner,
}

impl TodoContract {
    pub fn new(address: Address, signer: WalletSigner) -> Self {
        Self { address, signer }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> WalletSigner {
        self.signer
    }

    #[tracing::instrument(skip(self, provider), fields(contract = %self.address))]
    pub async fn task_count<P: Eip1193>(&self, provider: &P) -> Result<u64, DappError> {
        let target = ReadTarget::TaskCount;
        let raw = self
            .call(provider, ITodoList::getTaskCountCall {}.abi_encode())
            .await
            .map_err(|e| DappError::read(target, e))?;
        let count = ITodoList::getTaskCountCall::abi_decode_returns(&raw)
            .map_err(|e| DappError::read(target, e))?;
        let count = u64::try_from(count).map_err(|e| DappError::read(target, e))?;
        debug!(count, "read task count");
        Ok(count)
    }

    #[tracing::instrument(skip(self, provider), fields(contract = %self.address))]
    pub async fn task<P: Eip1193>(
        &self,
        provider: &P,
        index: u64,
    ) -> Result<(String, bool), DappError> {
        let target = ReadTarget::Task(index);
        let data = ITodoList::getTaskCall {
            _index: U256::from(index),
        }
        .abi_encode();
        let raw = self
            .call(provider, data)
            .await
            .map_err(|e| DappError::read(target, e))?;
        let ret = ITodoList::getTaskCall::abi_decode_returns(&raw)
            .map_err(|e| DappError::read(target, e))?;
        trace!(index, completed = ret._1, "read task");
        Ok((ret._0, ret._1))
    }

    #[tracing::instrument(skip(self, provider, description), fields(contract = %self.address))]
    pub async fn submit_add<P: Eip1193>(
        &self,
        provider: &P,
        description: &str,
    ) -> Result<B256, DappError> {
        let data = ITodoList::addTaskCall {
            _description: description.to_string(),
        }
        .abi_encode();
        self.send(provider, data).await
    }

    #[tracing::instrument(skip(self, provider), fields(contract = %self.address))]
    pub async fn submit_complete<P: Eip1193>(
        &self,
        provider: &P,
        index: u64,
    ) -> Result<B256, DappError> {
        let data = ITodoList::completeTaskCall {
            _index: U256::from(index),
        }
        .abi_encode();
        self.send(provider, data).await
    }

    async fn call<P: Eip1193>(&self, provider: &P, data: Vec<u8>) -> Result<Bytes, ProviderError> {
        let params = json!([
            {
                "from": self.signer.account,
                "to": self.address,
                "data": Bytes::from(data),
            },
            "latest"
        ]);
        let value = provider.request("eth_call", params).await?;
        serde_json::from_value(value).map_err(|e| ProviderError::malformed("eth_call", e))
    }

    async fn send<P: Eip1193>(&self, provider: &P, data: Vec<u8>) -> Result<B256, DappError> {
        let params = json!([{
            "from": self.signer.account,
            "to": self.address,
            "data": Bytes::from(data),
        }]);
        let value = provider
            .request("eth_sendTransaction", params)
            .await
            .map_err(|e| DappError::Submit(e.to_string()))?;
        let hash: B256 = serde_json::from_value(value)
            .map_err(|e| DappError::Submit(format!("malformed transaction hash: {e}")))?;
        debug!(tx_hash = %hash, "transaction submitted");
        Ok(hash)
    }
}

/// `eth_getTransactionReceipt`; `None` while the transaction is pending.
pub async fn fetch_receipt<P: Eip1193>(
    provider: &P,
    tx_hash: B256,
) -> Result<Option<TxReceipt>, ProviderError> {
    let value = provider
        .request("eth_getTransactionReceipt", json!([tx_hash]))
        .await?;
    if value.is_null() {
        return Ok(None);
    }
    let raw: RawReceipt = serde_json::from_value(value)
        .map_err(|e| ProviderError::malformed("eth_getTransactionReceipt", e))?;
    Ok(Some(raw.into()))
}

/// Decodes the calldata of a `TodoList` transaction or call, for logging and
/// for simulated wallets.
pub fn decode_calldata(data: &[u8]) -> Option<ITodoList::ITodoListCalls> {
    use alloy_sol_types::SolInterface;
    ITodoList::ITodoListCalls::abi_decode(data).ok()
}

#[cfg(test)]
mod tests {
    use alloy_primitives::hex;

    use super::*;

    #[test]
    fn selectors_match_solidity_signatures() {
        assert_eq!(ITodoList::addTaskCall::SIGNATURE, "addTask(string)");
        assert_eq!(ITodoList::completeTaskCall::SIGNATURE, "completeTask(uint256)");
        assert_eq!(ITodoList::getTaskCall::SIGNATURE, "getTask(uint256)");
        assert_eq!(ITodoList::getTaskCountCall::SIGNATURE, "getTaskCount()");
        assert_eq!(ITodoList::getTaskCountCall::SELECTOR, hex!("c17a340e"));
        assert_eq!(ITodoList::addTaskCall::SELECTOR, hex!("67238562"));
    }

    #[test]
    fn calldata_roundtrips_through_interface() {
        let data = ITodoList::completeTaskCall {
            _index: U256::from(7),
        }
        .abi_encode();
        match decode_calldata(&data) {
            Some(ITodoList::ITodoListCalls::completeTask(call)) => {
                assert_eq!(call._index, U256::from(7));
            }
            other => panic!("unexpected decode: {other:?}"),
        }
        assert!(decode_calldata(&[0xde, 0xad]).is_none());
    }

    #[test]
    fn receipt_status_zero_is_a_revert() {
        let raw: RawReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": "0x10",
            "status": "0x0"
        }))
        .expect("receipt shape");
        let receipt = TxReceipt::from(raw);
        assert!(!receipt.succeeded);
        assert_eq!(receipt.block_number, Some(16));
    }
}
