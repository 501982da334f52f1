use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct MessageBoxProps {
    pub message: Option<String>,
}

/// Disconnect notices and the per-second stats lines.
#[function_component]
pub fn MessageBox(props: &MessageBoxProps) -> Html {
    let Some(message) = &props.message else {
        return html! {};
    };
    html! {
        <div id="message" style="margin-top:8px; font-size:13px; line-height:1.5; white-space:pre-line; opacity:0.85;">
            { message.clone() }
        </div>
    }
}
