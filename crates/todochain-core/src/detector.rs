//! Injected wallet detection.

use std::time::Duration;

use tracing::{debug, info};

use crate::config::WalletPolicy;
use crate::timer::Timer;

/// What a host knows about an injected provider object.
pub trait InjectedWallet: Sized {
    /// Identity flag the expected wallet sets on itself (`isMetaMask`).
    fn is_expected_wallet(&self) -> bool;

    /// Competing providers exposed through `providers` when several wallet
    /// extensions are installed.
    fn providers(&self) -> Vec<Self>;
}

/// Picks the provider to bind from whatever is injected. A matching entry in
/// `providers` wins over the root object.
pub fn select_provider<W: InjectedWallet>(injected: Option<W>) -> Option<W> {
    let root = injected?;
    if let Some(found) = root
        .providers()
        .into_iter()
        .find(W::is_expected_wallet)
    {
        debug!("selected expected wallet from providers list");
        return Some(found);
    }
    root.is_expected_wallet().then_some(root)
}

#[derive(Debug, Clone)]
pub struct ProviderDetector {
    interval: Duration,
    max_attempts: u32,
    attempts: u32,
    present: bool,
}

impl ProviderDetector {
    pub fn new(policy: &WalletPolicy) -> Self {
        Self {
            interval: policy.detect_interval(),
            max_attempts: policy.detect_max_attempts.max(1),
            attempts: 0,
            present: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Polling stops once a provider is found or the attempt budget is spent.
    pub fn should_poll(&self) -> bool {
        !self.present && self.attempts < self.max_attempts
    }

    /// One detection pass over the current environment.
    pub fn detect<W: InjectedWallet>(&mut self, injected: Option<W>) -> Option<W> {
        self.attempts = self.attempts.saturating_add(1);
        let selected = select_provider(injected);
        let present = selected.is_some();
        if present != self.present {
            info!(present, attempts = self.attempts, "wallet availability changed");
        }
        self.present = present;
        selected
    }

    /// Re-arms the attempt budget, e.g. after a host "provider injected"
    /// signal.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Polls `probe` every interval until a wallet shows up or the budget is
    /// exhausted.
    #[tracing::instrument(skip_all)]
    pub async fn watch<W, T, F>(&mut self, timer: &T, mut probe: F) -> Option<W>
    where
        W: InjectedWallet,
        T: Timer,
        F: FnMut() -> Option<W>,
    {
        loop {
            if let Some(found) = self.detect(probe()) {
                return Some(found);
            }
            if !self.should_poll() {
                debug!(attempts = self.attempts, "giving up on wallet detection");
                return None;
            }
            timer.sleep(self.interval).await;
        }
    }
}
