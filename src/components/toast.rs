use crate::model::Toast;
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct ToastMessageProps {
    pub toast: Option<Toast>,
}

#[function_component]
pub fn ToastMessage(props: &ToastMessageProps) -> Html {
    let Some(toast) = &props.toast else {
        return html! {};
    };
    html! {
        <div id="tost-message" class="active" style={format!("position:fixed; bottom:32px; left:50%; transform:translateX(-50%); padding:12px 24px; border-radius:8px; color:#fff; font-size:16px; z-index:100; background:{};", toast.background())}>
            { toast.text.clone() }
        </div>
    }
}
