use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct PlayButtonProps {
    pub on_play: Callback<()>,
}

#[function_component]
pub fn PlayButton(props: &PlayButtonProps) -> Html {
    let play_cb = {
        let cb = props.on_play.clone();
        Callback::from(move |_: MouseEvent| cb.emit(()))
    };
    html! {
        <img id="playButton" src="/public/images/Play.png" alt="Start Streaming" onclick={play_cb}
            style="position:absolute; top:50%; left:50%; transform:translate(-50%, -50%); cursor:pointer; width:96px;" />
    }
}
