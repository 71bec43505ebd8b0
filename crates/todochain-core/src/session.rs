//! The one owner of everything the UI shows.
//!
//! Every operation takes `&mut self`, so a host that keeps the session in a
//! single task gets the operations serialized for free. Failures are logged
//! and turned into [`Notice`]s; hosts drain them with
//! [`Session::drain_notices`].

use tracing::{debug, error, info, warn};

use crate::config::DappConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::contract::TodoContract;
use crate::error::DappError;
use crate::mutation::{MutationDispatcher, MutationOutcome};
use crate::network::NetworkManager;
use crate::notice::Notice;
use crate::provider::{Eip1193, WalletEvent};
use crate::sync::TaskSynchronizer;
use crate::task::TaskList;
use crate::timer::Timer;

const INSTALL_WALLET: &str = "Please install MetaMask to use this application";
const CONNECT_FAILED: &str = "Failed to connect to MetaMask. Please try again.";
const LOAD_FAILED: &str = "Failed to load tasks";

pub struct Session<P, T> {
    config: DappConfig,
    timer: T,
    provider: Option<P>,
    state: ConnectionState,
    contract: Option<TodoContract>,
    tasks: TaskList,
    notices: Vec<Notice>,
}

impl<P, T> Session<P, T>
where
    P: Eip1193,
    T: Timer,
{
    pub fn new(config: DappConfig, timer: T) -> Self {
        Self {
            config,
            timer,
            provider: None,
            state: ConnectionState::default(),
            contract: None,
            tasks: TaskList::new(),
            notices: Vec::new(),
        }
    }

    pub fn config(&self) -> &DappConfig {
        &self.config
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn contract(&self) -> Option<&TodoContract> {
        self.contract.as_ref()
    }

    pub fn provider(&self) -> Option<&P> {
        self.provider.as_ref()
    }

    /// Binds the detected provider, or forgets it and everything derived
    /// from it.
    pub fn set_provider(&mut self, provider: Option<P>) {
        self.state.provider_present = provider.is_some();
        if provider.is_none() {
            self.disconnect();
            self.state.network_correct = false;
        }
        self.provider = provider;
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Read-only network check. A wrong chain is reported as a warning.
    pub async fn check_network(&mut self) -> bool {
        self.verify_network(true).await
    }

    /// Same check without a notice; a freshly detected wallet on the wrong
    /// chain only gets the switch button.
    pub async fn refresh_network(&mut self) -> bool {
        self.verify_network(false).await
    }

    async fn verify_network(&mut self, warn_on_mismatch: bool) -> bool {
        let Some(provider) = self.provider.as_ref() else {
            return false;
        };
        let verified = NetworkManager::new(&self.config.network, &self.config.wallet)
            .verify(provider)
            .await;

        let correct = match verified {
            Ok(()) => true,
            Err(DappError::NetworkMismatch { .. }) => {
                if warn_on_mismatch {
                    let notice = self.wrong_network();
                    self.notices.push(notice);
                }
                false
            }
            Err(err) => {
                warn!(error = %err, "network check failed");
                false
            }
        };
        self.state.network_correct = correct;
        correct
    }

    /// Moves the wallet onto the configured network.
    pub async fn switch_network(&mut self) -> bool {
        if self.state.connecting {
            debug!("wallet busy; switch ignored");
            return false;
        }
        let chain_name = self.config.network.chain_name.clone();
        let Some(provider) = self.provider.as_ref() else {
            self.notices.push(switch_failed(&chain_name));
            return false;
        };

        self.state.connecting = true;
        let switched = NetworkManager::new(&self.config.network, &self.config.wallet)
            .ensure(provider, &self.timer)
            .await;
        self.state.connecting = false;

        match switched {
            Ok(()) => {
                self.state.network_correct = true;
                self.notices
                    .push(Notice::success(format!("Successfully switched to {chain_name}")));
                true
            }
            Err(err) => {
                error!(error = %err, "network switch failed");
                self.state.network_correct = false;
                self.notices.push(switch_failed(&chain_name));
                false
            }
        }
    }

    /// Authorizes an account, binds the contract and loads the tasks.
    #[tracing::instrument(skip_all)]
    pub async fn connect(&mut self) -> Result<ConnectionState, DappError> {
        if self.state.connecting {
            debug!("connect already in progress");
            return Err(DappError::Busy);
        }
        let Some(provider) = self.provider.as_ref() else {
            self.notices.push(Notice::error(INSTALL_WALLET));
            return Err(DappError::ProviderAbsent);
        };

        self.state.connecting = true;
        let connected = ConnectionManager::new(&self.config).connect(provider).await;
        self.state.connecting = false;

        match connected {
            Ok(contract) => {
                self.state.network_correct = true;
                self.state.account = Some(contract.signer().account());
                self.contract = Some(contract);
                if let Err(err) = self.reload().await {
                    debug!(error = %err, "initial task load failed");
                }
                Ok(self.state.clone())
            }
            Err(err @ DappError::NetworkMismatch { .. }) => {
                self.state.network_correct = false;
                let notice = self.wrong_network();
                self.notices.push(notice);
                Err(err)
            }
            Err(err @ DappError::ChainQuery(_)) => {
                warn!(error = %err, "network check failed during connect");
                self.state.network_correct = false;
                Err(err)
            }
            Err(err) => {
                error!(error = %err, "connect failed");
                if matches!(err, DappError::AuthorizationDenied(_)) {
                    self.disconnect();
                }
                self.notices.push(Notice::error(CONNECT_FAILED));
                Err(err)
            }
        }
    }

    /// Replaces the task snapshot with a fresh full read. A failed read
    /// keeps the previous snapshot.
    pub async fn reload(&mut self) -> Result<(), DappError> {
        let (Some(provider), Some(contract)) = (self.provider.as_ref(), self.contract.as_ref())
        else {
            return Err(DappError::NotConnected);
        };

        let reloaded = TaskSynchronizer::reload(contract, provider).await;
        match reloaded {
            Ok(list) => {
                self.tasks = list;
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "task reload failed");
                self.notices.push(Notice::error(LOAD_FAILED));
                Err(err)
            }
        }
    }

    pub async fn add_task(&mut self, description: &str) -> Result<(), DappError> {
        if description.trim().is_empty() {
            return Err(DappError::EmptyDescription);
        }
        let (Some(provider), Some(contract)) = (self.provider.as_ref(), self.contract.as_ref())
        else {
            return Err(DappError::NotConnected);
        };

        let outcome = MutationDispatcher::new(&self.config.wallet)
            .add(contract, provider, &self.timer, description)
            .await;
        self.settle(outcome, "Task added successfully", "Failed to add task")
    }

    pub async fn complete_task(&mut self, index: u64) -> Result<(), DappError> {
        let (Some(provider), Some(contract)) = (self.provider.as_ref(), self.contract.as_ref())
        else {
            return Err(DappError::NotConnected);
        };

        let outcome = MutationDispatcher::new(&self.config.wallet)
            .complete(contract, provider, &self.timer, index)
            .await;
        self.settle(outcome, "Task marked as completed", "Failed to complete task")
    }

    pub async fn handle_event(&mut self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) if accounts.is_empty() => {
                info!("wallet revoked all accounts");
                self.disconnect();
            }
            WalletEvent::AccountsChanged(accounts) => {
                debug!(?accounts, "accounts changed; reconnecting");
                if let Err(err) = self.connect().await {
                    debug!(error = %err, "reconnect after account change failed");
                }
            }
            WalletEvent::ChainChanged(chain_id) => {
                debug!(%chain_id, "chain changed");
                self.check_network().await;
            }
        }
    }

    fn settle(
        &mut self,
        outcome: Result<MutationOutcome, DappError>,
        success: &str,
        failure: &str,
    ) -> Result<(), DappError> {
        match outcome {
            Ok(MutationOutcome { receipt, reload }) => {
                info!(tx = %receipt.transaction_hash, "{success}");
                self.notices.push(Notice::success(success));
                match reload {
                    Ok(list) => self.tasks = list,
                    Err(err) => {
                        error!(error = %err, "task reload after mutation failed");
                        self.notices.push(Notice::error(LOAD_FAILED));
                    }
                }
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "{failure}");
                self.notices.push(Notice::error(failure));
                Err(err)
            }
        }
    }

    fn disconnect(&mut self) {
        self.state.clear_account();
        self.contract = None;
        self.tasks = TaskList::new();
    }

    fn wrong_network(&self) -> Notice {
        Notice::warning(
            "Wrong Network",
            format!("Please switch to {} testnet", self.config.network.chain_name),
        )
    }
}

fn switch_failed(chain_name: &str) -> Notice {
    Notice::error(format!(
        "Failed to switch to {chain_name} network. Please try again."
    ))
}
