use crate::model::{AuthMode, Credentials, FieldDescriptor};
use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct AuthModalProps {
    pub mode: AuthMode,
    pub busy: bool,
    pub on_submit: Callback<Credentials>,
    pub on_switch: Callback<()>,
}

const INPUT_STYLE: &str = "width:100%; padding:10px; box-sizing:border-box; border:0.1px solid #7a7a7a; border-radius:8px; color:#efefef; font-size:18px; background-color:#2a2a2a; outline:none;";

fn field(desc: &FieldDescriptor, node: &NodeRef) -> Html {
    html! {
        <div style="position:relative; width:100%; margin-bottom:30px;">
            <label for={desc.id} style="position:absolute; top:-18px; left:4px; color:#efefef; font-size:14px;">{ desc.label }</label>
            <input id={desc.id} ref={node.clone()} type={desc.input_type} placeholder={desc.placeholder} style={INPUT_STYLE} />
        </div>
    }
}

#[derive(Clone, Copy, PartialEq)]
enum ButtonLook {
    Idle,
    Hover,
    Pressed,
}

impl ButtonLook {
    fn style(self) -> String {
        let (bg, shadow) = match self {
            ButtonLook::Idle => ("#2a2a2a", "none"),
            ButtonLook::Hover => ("#121212", "inset 6px 4px 8px rgba(255, 255, 255, 0.3)"),
            ButtonLook::Pressed => ("#121212", "inset -8px -4px 8px rgba(255, 255, 255, 0.3)"),
        };
        format!(
            "width:100%; padding:10px; margin:0; box-sizing:border-box; border:0.1px solid #7a7a7a; border-radius:8px; cursor:pointer; color:#efefef; font-size:18px; background-color:{}; box-shadow:{};",
            bg, shadow
        )
    }
}

#[function_component]
pub fn AuthModal(props: &AuthModalProps) -> Html {
    let desc = props.mode.descriptor();
    let nick_ref = use_node_ref();
    let password_ref = use_node_ref();
    let look = use_state(|| ButtonLook::Idle);

    let submit_cb = {
        let nick_ref = nick_ref.clone();
        let password_ref = password_ref.clone();
        let cb = props.on_submit.clone();
        let busy = props.busy;
        Callback::from(move |_: MouseEvent| {
            if busy {
                return;
            }
            let value = |r: &NodeRef| {
                r.cast::<HtmlInputElement>()
                    .map(|el| el.value())
                    .unwrap_or_default()
            };
            if let Some(creds) = Credentials::new(&value(&nick_ref), &value(&password_ref)) {
                cb.emit(creds);
            }
        })
    };
    let switch_cb = {
        let cb = props.on_switch.clone();
        Callback::from(move |_: MouseEvent| cb.emit(()))
    };
    let set_look = |l: ButtonLook| {
        let look = look.clone();
        Callback::from(move |_: MouseEvent| look.set(l))
    };

    html! {
        <div style="position:absolute; inset:0; display:flex; align-items:center; justify-content:center;">
            <img id="modalVideoBG" src="/public/images/VideoBG.png" style="width:100%; filter:blur(6px); opacity:60%; position:absolute; z-index:-1;" />
            <div id={desc.id} style="width:350px; box-sizing:border-box; border-radius:10px; padding:30px 20px 40px; background-color:#121212;">
                <div style="color:#efefef; font-size:24px; font-weight:650; margin-bottom:40px;">{ desc.title }</div>
                { field(&desc.fields[0], &nick_ref) }
                { field(&desc.fields[1], &password_ref) }
                <button id={desc.submit_id} onclick={submit_cb} disabled={props.busy}
                    onmouseover={set_look(ButtonLook::Hover)}
                    onmouseout={set_look(ButtonLook::Idle)}
                    onmousedown={set_look(ButtonLook::Pressed)}
                    onmouseup={set_look(ButtonLook::Hover)}
                    style={(*look).style()}>
                    { desc.submit_label }
                </button>
                {
                    if let Some(link) = desc.switch_link {
                        html! { <a id="switchLink" onclick={switch_cb} style="width:100%; box-sizing:border-box; display:block; cursor:pointer; padding-top:12px; text-align:center; color:#efefef; font-size:14px;">{ link }</a> }
                    } else {
                        html! {}
                    }
                }
            </div>
        </div>
    }
}
