use web_sys::HtmlInputElement;
use yew::{
    Callback, Html, Properties, SubmitEvent, TargetCast, function_component, html, use_effect_with,
    use_state,
};

#[derive(Properties, PartialEq)]
pub struct NewTaskFormProps {
    pub on_add: Callback<String>,
    /// Changes after each confirmed add; the draft is cleared then.
    pub cleared: u64,
    pub adding: bool,
}

#[function_component(NewTaskForm)]
pub fn new_task_form(props: &NewTaskFormProps) -> Html {
    let draft = use_state(String::new);

    {
        let draft = draft.clone();
        use_effect_with(props.cleared, move |_| {
            draft.set(String::new());
            || ()
        });
    }

    let on_input = {
        let draft = draft.clone();
        Callback::from(move |e: yew::InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            draft.set(input.value());
        })
    };

    let on_submit = {
        let draft = draft.clone();
        let on_add = props.on_add.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if draft.trim().is_empty() {
                return;
            }
            on_add.emit((*draft).clone());
        })
    };

    html! {
        <form class="new-task" onsubmit={on_submit}>
            <input
                placeholder="Add a new task"
                value={(*draft).clone()}
                oninput={on_input}
            />
            <button class="primary" type="submit" disabled={props.adding}>
                { if props.adding { "Adding..." } else { "Add Task" } }
            </button>
        </form>
    }
}
