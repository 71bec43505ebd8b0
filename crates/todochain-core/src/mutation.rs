use std::time::Duration;

use alloy_primitives::B256;
use tracing::{debug, info, warn};

use crate::config::WalletPolicy;
use crate::contract::{self, TodoContract, TxReceipt};
use crate::error::DappError;
use crate::provider::Eip1193;
use crate::sync::TaskSynchronizer;
use crate::task::TaskList;
use crate::timer::Timer;

/// A confirmed transaction and the resynchronization that followed it.
/// The reload can fail on its own; the transaction stays confirmed.
#[derive(Debug)]
pub struct MutationOutcome {
    pub receipt: TxReceipt,
    pub reload: Result<TaskList, DappError>,
}

pub struct MutationDispatcher<'a> {
    policy: &'a WalletPolicy,
}

impl<'a> MutationDispatcher<'a> {
    pub fn new(policy: &'a WalletPolicy) -> Self {
        Self { policy }
    }

    #[tracing::instrument(skip_all)]
    pub async fn add<P, T>(
        &self,
        contract: &TodoContract,
        provider: &P,
        timer: &T,
        description: &str,
    ) -> Result<MutationOutcome, DappError>
    where
        P: Eip1193,
        T: Timer,
    {
        if description.trim().is_empty() {
            debug!("rejecting blank task description");
            return Err(DappError::EmptyDescription);
        }
        let tx_hash = contract.submit_add(provider, description).await?;
        self.finish(contract, provider, timer, tx_hash).await
    }

    #[tracing::instrument(skip(self, contract, provider, timer))]
    pub async fn complete<P, T>(
        &self,
        contract: &TodoContract,
        provider: &P,
        timer: &T,
        index: u64,
    ) -> Result<MutationOutcome, DappError>
    where
        P: Eip1193,
        T: Timer,
    {
        let tx_hash = contract.submit_complete(provider, index).await?;
        self.finish(contract, provider, timer, tx_hash).await
    }

    async fn finish<P, T>(
        &self,
        contract: &TodoContract,
        provider: &P,
        timer: &T,
        tx_hash: B256,
    ) -> Result<MutationOutcome, DappError>
    where
        P: Eip1193,
        T: Timer,
    {
        let receipt = self.confirm(provider, timer, tx_hash).await?;
        let reload = TaskSynchronizer::reload(contract, provider).await;
        Ok(MutationOutcome { receipt, reload })
    }

    /// Polls for the receipt until the transaction is mined or the
    /// configured receipt timeout runs out. `None` waits indefinitely.
    #[tracing::instrument(skip(self, provider, timer))]
    pub async fn confirm<P, T>(
        &self,
        provider: &P,
        timer: &T,
        tx_hash: B256,
    ) -> Result<TxReceipt, DappError>
    where
        P: Eip1193,
        T: Timer,
    {
        let step = self.policy.receipt_poll_interval();
        let deadline = self.policy.receipt_timeout();
        let mut waited = Duration::ZERO;

        loop {
            let receipt = contract::fetch_receipt(provider, tx_hash)
                .await
                .map_err(|e| DappError::Confirm {
                    tx_hash: tx_hash.to_string(),
                    reason: e.to_string(),
                })?;

            if let Some(receipt) = receipt {
                if !receipt.succeeded {
                    warn!(block = ?receipt.block_number, "transaction reverted");
                    return Err(DappError::Confirm {
                        tx_hash: tx_hash.to_string(),
                        reason: "transaction reverted".to_string(),
                    });
                }
                info!(block = ?receipt.block_number, "transaction confirmed");
                return Ok(receipt);
            }

            if let Some(limit) = deadline
                && waited >= limit
            {
                return Err(DappError::Confirm {
                    tx_hash: tx_hash.to_string(),
                    reason: format!("no receipt after {}ms", waited.as_millis()),
                });
            }

            timer.sleep(step).await;
            waited += step;
        }
    }
}
