use super::{rank_view::RankView, stream_page::StreamPage};
use crate::model::{Endpoints, PageConfig, Route};
use crate::state::storage;
use crate::util::{current_path, replace_location};
use yew::prelude::*;

#[function_component(SignOut)]
fn sign_out() -> Html {
    use_effect_with((), |_| {
        storage::clear_auth();
        log::info!("signed out");
        replace_location("/");
        || ()
    });
    html! {}
}

#[function_component(App)]
pub fn app() -> Html {
    let route = use_memo((), |_| PageConfig::for_path(&current_path()));

    // No browser context menu over the stream.
    let no_context_menu = Callback::from(|e: MouseEvent| e.prevent_default());

    let content = match &*route {
        Route::Stream(config) => html! { <StreamPage config={config.clone()} /> },
        Route::Auth(mode) => html! { <StreamPage config={PageConfig::play()} auth_entry={*mode} /> },
        Route::Rank => html! { <RankView endpoints={Endpoints::default()} /> },
        Route::SignOut => html! { <SignOut /> },
    };
    html! {
        <div id="root" oncontextmenu={no_context_menu}>
            { content }
        </div>
    }
}
