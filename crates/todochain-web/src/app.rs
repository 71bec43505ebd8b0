use gloo::console::log;
use todochain_core::DappConfig;
use yew::{
  Callback,
  Html,
  function_component,
  html,
  use_effect_with,
  use_memo,
  use_state
};

use crate::components::{
  NewTaskForm,
  NoticeStack,
  TaskRow
};
use crate::driver::{
  self,
  Activity,
  Command,
  Snapshot
};

const DAPP_CONFIG_TOML: &str =
  include_str!("../assets/dapp.toml");

fn load_config() -> DappConfig {
  match DappConfig::from_toml_str(
    DAPP_CONFIG_TOML
  ) {
    | Ok(config) => config,
    | Err(err) => {
      tracing::error!(error = %err, "bundled dapp config invalid; using defaults");
      DappConfig::default()
    }
  }
}

#[function_component(App)]
pub fn app() -> Html {
  let snapshot =
    use_state(Snapshot::default);

  let queue = {
    let snapshot = snapshot.clone();
    use_memo((), move |_| {
      driver::start(
        load_config(),
        Callback::from(
          move |next: Snapshot| {
            snapshot.set(next)
          }
        )
      )
    })
  };

  {
    use_effect_with((), move |_| {
      ui_debug(
        "app.mounted",
        "frontend mounted, driver \
         started"
      );
      || ()
    });
  }

  let on_switch = {
    let queue = queue.clone();
    Callback::from(move |_| {
      ui_debug(
        "action.switch_network",
        "clicked Switch Network"
      );
      queue.send(Command::SwitchNetwork);
    })
  };

  let on_connect = {
    let queue = queue.clone();
    Callback::from(move |_| {
      ui_debug(
        "action.connect",
        "clicked Connect Wallet"
      );
      queue.send(Command::Connect);
    })
  };

  let on_add = {
    let queue = queue.clone();
    Callback::from(
      move |description: String| {
        ui_debug(
          "action.add_task",
          "submitted new task"
        );
        queue.send(Command::AddTask(
          description
        ));
      }
    )
  };

  let on_complete = {
    let queue = queue.clone();
    Callback::from(move |index: u64| {
      ui_debug(
        "action.complete_task",
        &format!(
          "completing task {index}"
        )
      );
      queue.send(Command::CompleteTask(
        index
      ));
    })
  };

  let state = &snapshot.state;
  let busy = snapshot.activity.is_some();

  let body = if !state.provider_present {
    html! {
        <p class="missing-wallet">
            { "Please install MetaMask to use this application" }
        </p>
    }
  } else if !state.network_correct {
    let label = if snapshot.activity
      == Some(Activity::Switching)
    {
      "Switching Network...".to_string()
    } else {
      format!(
        "Switch to {}",
        snapshot.chain_name
      )
    };
    html! {
        <button class="primary" onclick={on_switch} disabled={busy}>
            { label }
        </button>
    }
  } else if let Some(account) =
    state.account
  {
    let adding = snapshot.activity
      == Some(Activity::Adding);
    html! {
        <>
            <p class="account">{ format!("Connected Account: {account}") }</p>
            <NewTaskForm
                on_add={on_add}
                cleared={snapshot.added}
                adding={adding}
            />
            <ul class="tasks">
                {
                    for snapshot.tasks.iter().cloned().map(|task| {
                        let completing = snapshot.activity
                            == Some(Activity::Completing(task.id));
                        html! {
                            <TaskRow
                                key={task.id}
                                task={task}
                                completing={completing}
                                on_complete={on_complete.clone()}
                            />
                        }
                    })
                }
            </ul>
        </>
    }
  } else {
    let label = if snapshot.activity
      == Some(Activity::Connecting)
    {
      "Connecting..."
    } else {
      "Connect Wallet"
    };
    html! {
        <button class="primary" onclick={on_connect} disabled={busy}>
            { label }
        </button>
    }
  };

  html! {
      <main class="shell">
          <h1 class="title">{ "Todo List dApp" }</h1>
          <NoticeStack notices={snapshot.notices.clone()} />
          { body }
      </main>
  }
}

fn ui_debug(
  event: &str,
  detail: &str
) {
  tracing::debug!(
    event, detail, "ui-debug"
  );
  log!(format!(
    "[ui-debug] {event}: {detail}"
  ));
}
