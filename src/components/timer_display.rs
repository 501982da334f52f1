use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct TimerDisplayProps {
    pub text: String,
}

/// Display surface for both timer strategies.
#[function_component]
pub fn TimerDisplay(props: &TimerDisplayProps) -> Html {
    if props.text.is_empty() {
        return html! {};
    }
    html! {
        <div id="unity-message" style="font-size:20px; font-weight:600; font-variant-numeric:tabular-nums; margin:8px 0;">
            { props.text.clone() }
        </div>
    }
}
