//! One `spawn_local` task owns the [`Session`]. UI actions and wallet
//! notifications reach it as [`Command`]s on a single queue, so nothing
//! touches the session concurrently.

use std::cell::RefCell;
use std::rc::Rc;

use futures::StreamExt;
use futures::channel::mpsc::{
  UnboundedReceiver,
  UnboundedSender,
  unbounded
};
use gloo::events::EventListener;
use gloo::timers::future::TimeoutFuture;
use todochain_core::detector::{
  ProviderDetector,
  select_provider
};
use todochain_core::{
  ConnectionState,
  DappConfig,
  Notice,
  Session,
  TaskList,
  WalletEvent,
  WalletPolicy
};
use wasm_bindgen_futures::spawn_local;
use yew::Callback;

use crate::wallet::{
  self,
  EthereumProvider,
  GlooTimer,
  WalletListeners
};

const INITIALIZED_EVENT: &str =
  "ethereum#initialized";

#[derive(Debug)]
pub enum Command {
  Detected(Option<EthereumProvider>),
  SwitchNetwork,
  Connect,
  AddTask(String),
  CompleteTask(u64),
  Wallet(WalletEvent)
}

impl Command {
  fn activity(&self) -> Option<Activity> {
    match self {
      | Command::SwitchNetwork => {
        Some(Activity::Switching)
      }
      | Command::Connect => {
        Some(Activity::Connecting)
      }
      | Command::AddTask(_) => {
        Some(Activity::Adding)
      }
      | Command::CompleteTask(index) => {
        Some(Activity::Completing(*index))
      }
      | Command::Detected(_)
      | Command::Wallet(_) => None
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Activity {
  Switching,
  Connecting,
  Adding,
  Completing(u64)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShownNotice {
  pub id:     u64,
  pub notice: Notice
}

/// Everything the view renders.
#[derive(
  Debug, Clone, PartialEq, Default,
)]
pub struct Snapshot {
  pub state:      ConnectionState,
  pub tasks:      TaskList,
  pub notices:    Vec<ShownNotice>,
  pub activity:   Option<Activity>,
  pub chain_name: String,
  /// Bumped after every confirmed add
  /// so the form can clear itself.
  pub added:      u64
}

#[derive(Clone)]
pub struct CommandQueue {
  tx: UnboundedSender<Command>
}

impl CommandQueue {
  pub fn send(&self, command: Command) {
    if let Err(err) =
      self.tx.unbounded_send(command)
    {
      tracing::warn!(
        command = ?err.into_inner(),
        "command queue closed"
      );
    }
  }
}

/// Latest snapshot, shared with notice
/// expiry timers so a notice disappears
/// on time even while a transaction is
/// still confirming.
#[derive(Clone)]
struct Publisher {
  last: Rc<RefCell<Snapshot>>,
  emit: Callback<Snapshot>
}

impl Publisher {
  fn update(
    &self,
    change: impl FnOnce(&mut Snapshot)
  ) {
    let next = {
      let mut last =
        self.last.borrow_mut();
      change(&mut last);
      last.clone()
    };
    self.emit.emit(next);
  }
}

pub fn start(
  config: DappConfig,
  on_snapshot: Callback<Snapshot>
) -> CommandQueue {
  let (tx, rx) = unbounded();
  let queue = CommandQueue { tx };

  let publisher = Publisher {
    last: Rc::new(RefCell::new(
      Snapshot {
        chain_name: config
          .network
          .chain_name
          .clone(),
        ..Snapshot::default()
      }
    )),
    emit: on_snapshot
  };

  listen_for_injection(queue.clone());
  spawn_local(watch_wallet(
    config.wallet.clone(),
    queue.clone()
  ));
  spawn_local(run(
    config,
    rx,
    queue.clone(),
    publisher
  ));

  queue
}

async fn watch_wallet(
  policy: WalletPolicy,
  queue: CommandQueue
) {
  let mut detector =
    ProviderDetector::new(&policy);
  let found = detector
    .watch(&GlooTimer, wallet::injected)
    .await;
  tracing::info!(
    present = found.is_some(),
    attempts = detector.attempts(),
    "wallet detection finished"
  );
  queue.send(Command::Detected(found));
}

/// Wallets that inject late announce it
/// with `ethereum#initialized`.
fn listen_for_injection(
  queue: CommandQueue
) {
  let Some(window) = web_sys::window()
  else {
    return;
  };
  EventListener::once(
    &window,
    INITIALIZED_EVENT,
    move |_| {
      tracing::debug!(
        "wallet announced injection"
      );
      queue.send(Command::Detected(
        select_provider(
          wallet::injected()
        )
      ));
    }
  )
  .forget();
}

async fn run(
  config: DappConfig,
  mut rx: UnboundedReceiver<Command>,
  queue: CommandQueue,
  publisher: Publisher
) {
  let mut session =
    Session::new(config, GlooTimer);
  let mut listeners: Option<
    WalletListeners
  > = None;
  let mut next_notice = 0_u64;
  let mut added = 0_u64;

  while let Some(command) =
    rx.next().await
  {
    tracing::debug!(
      ?command,
      "running command"
    );
    if let Some(activity) =
      command.activity()
    {
      publisher.update(|snap| {
        snap.activity = Some(activity)
      });
    }

    match command {
      | Command::Detected(found) => {
        if found.as_ref()
          != session.provider()
        {
          listeners = found.as_ref().map(
            |provider| {
              let queue = queue.clone();
              WalletListeners::attach(
                provider,
                move |event| {
                  queue.send(
                    Command::Wallet(event)
                  )
                }
              )
            }
          );
          let present = found.is_some();
          session.set_provider(found);
          if present {
            session
              .refresh_network()
              .await;
          }
        }
      }
      | Command::SwitchNetwork => {
        session.switch_network().await;
      }
      | Command::Connect => {
        if let Err(err) =
          session.connect().await
        {
          tracing::debug!(error = %err, "connect did not complete");
        }
      }
      | Command::AddTask(description) => {
        if session
          .add_task(&description)
          .await
          .is_ok()
        {
          added += 1;
        }
      }
      | Command::CompleteTask(index) => {
        if let Err(err) = session
          .complete_task(index)
          .await
        {
          tracing::debug!(index, error = %err, "complete did not go through");
        }
      }
      | Command::Wallet(event) => {
        session.handle_event(event).await;
      }
    }

    let fresh: Vec<ShownNotice> = session
      .drain_notices()
      .into_iter()
      .map(|notice| {
        next_notice += 1;
        ShownNotice {
          id: next_notice,
          notice
        }
      })
      .collect();
    for shown in &fresh {
      expire_notice(
        publisher.clone(),
        shown.id,
        shown.notice.duration_ms
      );
    }

    publisher.update(|snap| {
      snap.state =
        session.state().clone();
      snap.tasks =
        session.tasks().clone();
      snap.notices.extend(fresh);
      snap.activity = None;
      snap.added = added;
    });
  }

  drop(listeners);
}

fn expire_notice(
  publisher: Publisher,
  id: u64,
  after_ms: u32
) {
  spawn_local(async move {
    TimeoutFuture::new(after_ms).await;
    publisher.update(|snap| {
      snap
        .notices
        .retain(|shown| shown.id != id)
    });
  });
}
