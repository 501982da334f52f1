use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct WarningBannerProps {
    pub warning: Option<String>,
}

#[function_component]
pub fn WarningBanner(props: &WarningBannerProps) -> Html {
    match &props.warning {
        Some(text) => html! {
            <div id="warning" style="background:#3b2300; border:1px solid #d29922; border-radius:8px; padding:8px 12px; margin-bottom:8px;">
                <h4 style="margin:0 0 4px 0;">{"Warning"}</h4>
                { text.clone() }
            </div>
        },
        None => html! {},
    }
}
