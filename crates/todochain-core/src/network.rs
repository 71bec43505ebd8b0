//! Keeps the wallet on the one network the dapp is deployed to.

use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::{NetworkDescriptor, WalletPolicy};
use crate::error::DappError;
use crate::provider::{self, Eip1193};
use crate::timer::Timer;

pub struct NetworkManager<'a> {
    descriptor: &'a NetworkDescriptor,
    policy: &'a WalletPolicy,
}

impl<'a> NetworkManager<'a> {
    pub fn new(descriptor: &'a NetworkDescriptor, policy: &'a WalletPolicy) -> Self {
        Self { descriptor, policy }
    }

    pub fn expected_chain_id(&self) -> u64 {
        self.descriptor.chain_id
    }

    /// Read-only check of the wallet's active chain.
    #[tracing::instrument(skip_all, fields(expected = self.descriptor.chain_id))]
    pub async fn verify<P: Eip1193>(&self, provider: &P) -> Result<(), DappError> {
        let actual = provider::chain_id(provider)
            .await
            .map_err(DappError::ChainQuery)?;
        if actual == self.descriptor.chain_id {
            debug!("wallet already on expected chain");
            Ok(())
        } else {
            Err(DappError::NetworkMismatch {
                expected: self.descriptor.chain_id,
                actual,
            })
        }
    }

    /// Switches the wallet to the expected chain, registering it first when
    /// the wallet does not know it, then waits for the switch to show up.
    #[tracing::instrument(skip_all, fields(expected = self.descriptor.chain_id))]
    pub async fn ensure<P, T>(&self, provider: &P, timer: &T) -> Result<(), DappError>
    where
        P: Eip1193,
        T: Timer,
    {
        let expected = self.descriptor.chain_id;
        let actual = provider::chain_id(provider).await?;
        if actual == expected {
            debug!("wallet already on expected chain");
            return Ok(());
        }

        info!(actual, chain = %self.descriptor.chain_name, "requesting chain switch");
        let switch = provider
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": self.descriptor.chain_id_hex() }]),
            )
            .await;

        match switch {
            Ok(_) => {}
            Err(err) if err.is_unrecognized_chain() => {
                info!("chain unknown to wallet; adding it");
                provider
                    .request(
                        "wallet_addEthereumChain",
                        json!([self.descriptor.add_chain_params()]),
                    )
                    .await
                    .map_err(|source| DappError::ChainSwitch {
                        chain_id: expected,
                        source,
                    })?;
            }
            Err(source) => {
                warn!(code = source.code, message = %source.message, "chain switch rejected");
                return Err(DappError::ChainSwitch {
                    chain_id: expected,
                    source,
                });
            }
        }

        self.await_switch(provider, timer).await
    }

    async fn await_switch<P, T>(&self, provider: &P, timer: &T) -> Result<(), DappError>
    where
        P: Eip1193,
        T: Timer,
    {
        let expected = self.descriptor.chain_id;
        let timeout = self.policy.switch_confirm_timeout();
        let step = self.policy.switch_poll_interval();
        let mut waited = Duration::ZERO;

        loop {
            timer.sleep(step).await;
            waited += step;

            let actual = provider::chain_id(provider).await?;
            if actual == expected {
                info!(waited_ms = waited.as_millis() as u64, "chain switch confirmed");
                return Ok(());
            }
            if waited >= timeout {
                warn!(actual, waited_ms = waited.as_millis() as u64, "chain switch not confirmed");
                return Err(DappError::SwitchUnconfirmed { expected, actual });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CALIBRATION_CHAIN_ID;
    use crate::provider::ProviderError;
    use crate::testkit::{InstantTimer, MockWallet};

    fn manager_parts() -> (NetworkDescriptor, WalletPolicy) {
        (NetworkDescriptor::calibration(), WalletPolicy::default())
    }

    #[tokio::test]
    async fn already_on_chain_issues_no_switch() {
        let (descriptor, policy) = manager_parts();
        let wallet = MockWallet::on_chain(CALIBRATION_CHAIN_ID);
        let timer = InstantTimer::default();

        NetworkManager::new(&descriptor, &policy)
            .ensure(&wallet, &timer)
            .await
            .expect("already correct");

        assert_eq!(wallet.calls("wallet_switchEthereumChain"), 0);
        assert_eq!(timer.sleeps(), 0);
    }

    #[tokio::test]
    async fn unknown_chain_is_added_once_then_confirmed() {
        let (descriptor, policy) = manager_parts();
        let wallet = MockWallet::on_chain(1);
        wallet.forget_chain(CALIBRATION_CHAIN_ID);
        let timer = InstantTimer::default();

        NetworkManager::new(&descriptor, &policy)
            .ensure(&wallet, &timer)
            .await
            .expect("switch via add");

        assert_eq!(wallet.calls("wallet_addEthereumChain"), 1);
        assert_eq!(wallet.chain_id(), CALIBRATION_CHAIN_ID);
        let added = wallet.last_params("wallet_addEthereumChain").expect("add params");
        assert_eq!(added[0], descriptor.add_chain_params());
    }

    #[tokio::test]
    async fn switch_that_never_lands_times_out() {
        let (descriptor, policy) = manager_parts();
        let wallet = MockWallet::on_chain(5);
        wallet.ignore_switches();
        let timer = InstantTimer::default();

        let err = NetworkManager::new(&descriptor, &policy)
            .ensure(&wallet, &timer)
            .await
            .expect_err("switch ignored");

        assert!(matches!(
            err,
            DappError::SwitchUnconfirmed { expected: CALIBRATION_CHAIN_ID, actual: 5 }
        ));
        assert_eq!(timer.total(), policy.switch_confirm_timeout());
    }

    #[tokio::test]
    async fn slow_switch_is_confirmed_on_a_later_poll() {
        let (descriptor, policy) = manager_parts();
        let wallet = MockWallet::on_chain(1);
        wallet.switch_lands_after(3);
        let timer = InstantTimer::default();

        NetworkManager::new(&descriptor, &policy)
            .ensure(&wallet, &timer)
            .await
            .expect("lands on third poll");

        assert_eq!(timer.sleeps(), 3);
        assert_eq!(timer.total(), 3 * policy.switch_poll_interval());
        assert_eq!(wallet.chain_id(), CALIBRATION_CHAIN_ID);
        assert_eq!(wallet.calls("wallet_switchEthereumChain"), 1);
    }

    #[tokio::test]
    async fn chain_id_failure_during_verify_is_a_chain_query_error() {
        let (descriptor, policy) = manager_parts();
        let wallet = MockWallet::calibration();
        wallet.fail_method("eth_chainId", ProviderError::new(ProviderError::INTERNAL, "boom"));

        let err = NetworkManager::new(&descriptor, &policy)
            .verify(&wallet)
            .await
            .expect_err("unreadable");

        assert!(matches!(err, DappError::ChainQuery(_)));
    }

    #[tokio::test]
    async fn rejected_switch_is_surfaced_without_adding() {
        let (descriptor, policy) = manager_parts();
        let wallet = MockWallet::on_chain(5);
        wallet.fail_method(
            "wallet_switchEthereumChain",
            ProviderError::new(ProviderError::USER_REJECTED, "User rejected the request."),
        );
        let timer = InstantTimer::default();

        let err = NetworkManager::new(&descriptor, &policy)
            .ensure(&wallet, &timer)
            .await
            .expect_err("switch rejected");

        assert!(err.is_user_rejection());
        assert_eq!(wallet.calls("wallet_addEthereumChain"), 0);
    }

    #[tokio::test]
    async fn verify_never_switches() {
        let (descriptor, policy) = manager_parts();
        let wallet = MockWallet::on_chain(1);

        let err = NetworkManager::new(&descriptor, &policy)
            .verify(&wallet)
            .await
            .expect_err("wrong chain");

        assert!(matches!(err, DappError::NetworkMismatch { actual: 1, .. }));
        assert_eq!(wallet.calls("wallet_switchEthereumChain"), 0);
    }
}
