use yew::{Html, Properties, function_component, html};

use crate::driver::ShownNotice;

#[derive(Properties, PartialEq)]
pub struct NoticeStackProps {
    pub notices: Vec<ShownNotice>,
}

#[function_component(NoticeStack)]
pub fn notice_stack(props: &NoticeStackProps) -> Html {
    html! {
        <div class="notices" role="status">
            {
                for props.notices.iter().map(|shown| html! {
                    <div key={shown.id} class={shown.notice.level.as_class()}>
                        <div class="notice-title">{ &shown.notice.title }</div>
                        <div>{ &shown.notice.description }</div>
                    </div>
                })
            }
        </div>
    }
}
