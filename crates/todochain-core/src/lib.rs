pub mod config;
pub mod connection;
pub mod contract;
pub mod detector;
pub mod error;
pub mod mutation;
pub mod network;
pub mod notice;
pub mod provider;
pub mod session;
pub mod sync;
pub mod task;
pub mod timer;

#[cfg(test)]
mod testkit;

pub use config::{
  DappConfig,
  NetworkDescriptor,
  WalletPolicy
};
pub use connection::ConnectionState;
pub use error::DappError;
pub use notice::{
  Notice,
  NoticeLevel
};
pub use provider::{
  Eip1193,
  ProviderError,
  WalletEvent
};
pub use session::Session;
pub use task::{
  Task,
  TaskList
};
pub use timer::Timer;
