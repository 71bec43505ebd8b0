use todochain_core::Task;
use yew::{Callback, Html, Properties, function_component, html};

#[derive(Properties, PartialEq)]
pub struct TaskRowProps {
    pub task: Task,
    pub completing: bool,
    pub on_complete: Callback<u64>,
}

#[function_component(TaskRow)]
pub fn task_row(props: &TaskRowProps) -> Html {
    let id = props.task.id;
    let on_complete = props.on_complete.clone();
    let class = if props.task.completed {
        "task done"
    } else {
        "task"
    };

    html! {
        <li class={class}>
            <span class="task-text">{ &props.task.description }</span>
            {
                if props.task.completed {
                    html! {}
                } else {
                    html! {
                        <button
                            class="complete"
                            disabled={props.completing}
                            onclick={move |_| on_complete.emit(id)}
                        >
                            { if props.completing { "Completing..." } else { "Complete" } }
                        </button>
                    }
                }
            }
        </li>
    }
}
