use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::toast::ToastMessage;
use crate::api;
use crate::model::{Endpoints, RankingEntry, Toast, MSG_RANK_LOAD_FAILED};
use crate::state::set_timeout;
use crate::util::{format_packed, replace_location};

#[derive(Properties, PartialEq, Clone)]
pub struct RankViewProps {
    pub endpoints: Endpoints,
}

#[function_component(RankView)]
pub fn rank_view(props: &RankViewProps) -> Html {
    let rows = use_state(Vec::<RankingEntry>::new);
    let toast = use_state(|| None::<Toast>);

    {
        let rows = rows.clone();
        let toast = toast.clone();
        let endpoints = props.endpoints.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match api::fetch_rankings(&endpoints).await {
                    Ok(entries) => {
                        log::debug!("{} ranking rows", entries.len());
                        rows.set(entries);
                    }
                    Err(e) => {
                        log::warn!("rankings unavailable: {:#}", e);
                        toast.set(Some(Toast::failure(MSG_RANK_LOAD_FAILED)));
                        set_timeout(1000, move || {
                            toast.set(None);
                            replace_location("/");
                        });
                    }
                }
            });
            || ()
        });
    }

    let cell = "padding:6px 10px; border-bottom:1px solid #30363d;";
    html! {
        <div style="max-width:480px; margin:24px auto; padding:12px;">
            <h2 style="margin:0 0 12px 0;">{"Ranking"}</h2>
            <table style="width:100%; border-collapse:collapse; font-variant-numeric:tabular-nums;">
                <tbody id="table-content">
                    { for rows.iter().map(|r| html! {
                        <tr>
                            <td style={format!("{} width:50px;", cell)}>{ r.rank_number }</td>
                            <td style={format!("{} width:150px;", cell)}>{ r.nick_name.clone() }</td>
                            <td style={format!("{} width:100px;", cell)}>{ format_packed(r.max_score) }</td>
                        </tr>
                    }) }
                </tbody>
            </table>
            <ToastMessage toast={(*toast).clone()} />
        </div>
    }
}
