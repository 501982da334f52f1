use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::{
    auth_modal::AuthModal, message_box::MessageBox, play_button::PlayButton,
    timer_display::TimerDisplay, toast::ToastMessage, warning_banner::WarningBanner,
};
use crate::api;
use crate::logger;
use crate::model::{
    AuthMode, AuthRecord, Credentials, PageConfig, Phase, ScoreSubmission, SessionAction,
    SessionState, SignalingMode, TimerStrategy, Toast, MSG_AUTH_FAILED, MSG_RANK_SAVED,
    MSG_RANK_SAVE_FAILED,
};
use crate::state::{
    performance_now, set_timeout, storage, ElapsedClock, FrameLoop, IntervalTicker, TextSurface,
};
use crate::streaming::{stats_lines, SignalingChoice, StatsSnapshot, StreamingHandlers, StreamingSession};
use crate::util::{clog, reload_page, replace_location};

const TOAST_MS: i32 = 1000;
const STATS_PERIOD_MS: i32 = 1000;
const ELAPSED_PERIOD_MS: i32 = 1000;

type Dispatcher = UseReducerDispatcher<SessionState>;

enum PageTimer {
    Frames(FrameLoop),
    WallClock {
        clock: Rc<RefCell<ElapsedClock>>,
        surface: Rc<Callback<String>>,
        ticker: Option<IntervalTicker>,
    },
}

impl PageTimer {
    fn new(strategy: TimerStrategy, surface: Callback<String>) -> Self {
        match strategy {
            TimerStrategy::FrameAccumulator => PageTimer::Frames(FrameLoop::new(Some(Box::new(surface)))),
            TimerStrategy::WallClock => {
                let clock = ElapsedClock::new();
                clock.print(0.0, Some(&surface));
                PageTimer::WallClock {
                    clock: Rc::new(RefCell::new(clock)),
                    surface: Rc::new(surface),
                    ticker: None,
                }
            }
        }
    }

    fn start(&mut self) {
        match self {
            PageTimer::Frames(frames) => frames.start(),
            PageTimer::WallClock { clock, surface, ticker } => {
                if !clock.borrow_mut().start(performance_now()) {
                    return;
                }
                let clock = clock.clone();
                let surface = surface.clone();
                *ticker = Some(IntervalTicker::start(ELAPSED_PERIOD_MS, move || {
                    let s: &dyn TextSurface = &*surface;
                    clock.borrow().print(performance_now(), Some(s));
                }));
            }
        }
    }

    /// Stops the timer; the packed total when it is the frame accumulator.
    fn stop(&mut self) -> Option<u64> {
        match self {
            PageTimer::Frames(frames) => {
                frames.stop();
                Some(frames.total())
            }
            PageTimer::WallClock { clock, ticker, .. } => {
                ticker.take();
                clock.borrow_mut().stop();
                None
            }
        }
    }
}

/// Everything that lives for the duration of one stream: created on play,
/// torn down on disconnect, unload or unmount.
#[derive(Default)]
struct PageSession {
    streaming: Option<Rc<StreamingSession>>,
    timer: Option<PageTimer>,
    stats_ticker: Option<IntervalTicker>,
    last_stats: Rc<RefCell<Option<StatsSnapshot>>>,
}

impl PageSession {
    fn stop_timer(&mut self) -> Option<u64> {
        self.timer.as_mut().and_then(PageTimer::stop)
    }

    fn teardown(&mut self) -> Option<Rc<StreamingSession>> {
        self.stats_ticker.take();
        self.last_stats.borrow_mut().take();
        self.streaming.take()
    }

    /// Stops the timer and closes the stream right away. Returns the packed
    /// total when the frame accumulator was running.
    fn end_stream(&mut self) -> Option<u64> {
        let total = self.stop_timer();
        if let Some(streaming) = self.teardown() {
            streaming.close();
        }
        total
    }
}

fn signaling_choice(state: &SessionState) -> SignalingChoice {
    match &state.config.signaling {
        SignalingMode::WebSocket { url } => SignalingChoice::WebSocket(Some(url.clone())),
        SignalingMode::ServerDefined if state.use_web_socket() => SignalingChoice::WebSocket(None),
        SignalingMode::ServerDefined => SignalingChoice::Http,
    }
}

fn flash_toast(dispatcher: &Dispatcher, toast: Toast, then_navigate: Option<&'static str>) {
    dispatcher.dispatch(SessionAction::ShowToast(toast));
    let dispatcher = dispatcher.clone();
    set_timeout(TOAST_MS, move || {
        dispatcher.dispatch(SessionAction::ClearToast);
        if let Some(url) = then_navigate {
            replace_location(url);
        }
    });
}

async fn report_score(config: &PageConfig, total: u64, dispatcher: &Dispatcher) {
    let Some(auth) = storage::load_auth() else {
        log::info!("no signed-in user, score {} not reported", total);
        reload_page();
        return;
    };
    let submission = ScoreSubmission {
        nick_name: auth.nickname.clone(),
        max_score: total,
    };
    match api::submit_score(&config.endpoints, &auth.token, &submission).await {
        Ok(()) => {
            log::info!("score {} reported for {}", total, auth.nickname);
            flash_toast(dispatcher, Toast::success(MSG_RANK_SAVED), Some("/rank/"));
        }
        Err(e) => {
            log::warn!("score submission failed: {:#}", e);
            flash_toast(dispatcher, Toast::failure(MSG_RANK_SAVE_FAILED), Some("/"));
        }
    }
}

async fn handle_disconnect(
    page: Weak<RefCell<PageSession>>,
    config: PageConfig,
    dispatcher: Dispatcher,
    connection_id: String,
) {
    let Some(page) = page.upgrade() else { return };
    // The player must be gone before the page offers Play again.
    let total = page.borrow_mut().end_stream();
    log::info!("peer {} disconnected", connection_id);
    dispatcher.dispatch(SessionAction::Disconnected { connection_id });
    if config.submit_score {
        if let Some(total) = total {
            report_score(&config, total, &dispatcher).await;
        }
    }
}

fn start_stats(page: &Rc<RefCell<PageSession>>, dispatcher: Dispatcher) -> IntervalTicker {
    let weak = Rc::downgrade(page);
    IntervalTicker::start(STATS_PERIOD_MS, move || {
        let Some(page) = weak.upgrade() else { return };
        let (streaming, last_stats) = {
            let p = page.borrow();
            (p.streaming.clone(), p.last_stats.clone())
        };
        let Some(streaming) = streaming else { return };
        let dispatcher = dispatcher.clone();
        spawn_local(async move {
            let Some(cur) = streaming.stats().await else { return };
            let prev = last_stats.replace(Some(cur.clone()));
            let Some(prev) = prev else { return };
            let lines = stats_lines(&prev, &cur);
            for line in &lines {
                log::debug!("{}", line);
            }
            if !lines.is_empty() {
                dispatcher.dispatch(SessionAction::SetMessage(Some(lines.join("\n"))));
            }
        });
    })
}

fn open_stream(
    page: &Rc<RefCell<PageSession>>,
    state: &SessionState,
    dispatcher: Dispatcher,
    parent: web_sys::Element,
) {
    let config = state.config.clone();
    let signaling = signaling_choice(state);
    clog(&format!("opening stream with {:?}", signaling));

    let on_connect = {
        let weak = Rc::downgrade(page);
        let dispatcher = dispatcher.clone();
        let show_stats = config.show_stats;
        Box::new(move || {
            let Some(page) = weak.upgrade() else { return };
            log::info!("peer connected");
            if let Some(timer) = page.borrow_mut().timer.as_mut() {
                timer.start();
            }
            if show_stats {
                let ticker = start_stats(&page, dispatcher.clone());
                page.borrow_mut().stats_ticker = Some(ticker);
            }
        }) as Box<dyn FnMut()>
    };
    let on_disconnect = {
        let weak = Rc::downgrade(page);
        let dispatcher = dispatcher.clone();
        let config = config.clone();
        // Deferred: the session owning this callback is dropped during teardown.
        Box::new(move |connection_id: String| {
            spawn_local(handle_disconnect(
                weak.clone(),
                config.clone(),
                dispatcher.clone(),
                connection_id,
            ));
        }) as Box<dyn FnMut(String)>
    };

    let weak = Rc::downgrade(page);
    spawn_local(async move {
        let handlers = StreamingHandlers { on_connect, on_disconnect };
        match StreamingSession::open(&parent, signaling, handlers).await {
            Ok(session) => {
                if let Some(page) = weak.upgrade() {
                    page.borrow_mut().streaming = Some(session);
                } else {
                    session.close();
                }
            }
            Err(e) => {
                log::error!("could not start streaming: {:#}", e);
                dispatcher.dispatch(SessionAction::Disconnected {
                    connection_id: "-".to_string(),
                });
            }
        }
    });
}

#[derive(Properties, PartialEq, Clone)]
pub struct StreamPageProps {
    pub config: PageConfig,
    #[prop_or(AuthMode::SignIn)]
    pub auth_entry: AuthMode,
}

#[function_component]
pub fn StreamPage(props: &StreamPageProps) -> Html {
    let state = use_reducer({
        let config = props.config.clone();
        let entry = props.auth_entry;
        move || SessionState::new(config).with_auth_entry(entry)
    });
    let page = use_mut_ref(PageSession::default);
    let player_ref = use_node_ref();
    let timer_text = use_state(String::new);
    let auth_busy = use_state(|| false);

    // Server config, window listeners and final teardown.
    {
        let dispatcher = state.dispatcher();
        let page = page.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match api::fetch_server_config().await {
                    Ok(server) => {
                        logger::set_level(server.log_level());
                        log::debug!("server config: {:?}", server);
                        dispatcher.dispatch(SessionAction::ConfigLoaded(server));
                    }
                    Err(e) => {
                        log::warn!("using default server config: {:#}", e);
                        dispatcher.dispatch(SessionAction::ConfigFailed);
                    }
                }
            });

            let window = web_sys::window();
            let resize_cb = {
                let page = page.clone();
                Closure::wrap(Box::new(move || {
                    if let Some(s) = &page.borrow().streaming {
                        s.resize();
                    }
                }) as Box<dyn FnMut()>)
            };
            let unload_cb = {
                let page = page.clone();
                Closure::wrap(Box::new(move || {
                    page.borrow_mut().end_stream();
                }) as Box<dyn FnMut()>)
            };
            if let Some(win) = &window {
                let _ = win.add_event_listener_with_callback_and_bool(
                    "resize",
                    resize_cb.as_ref().unchecked_ref(),
                    true,
                );
                let _ = win.add_event_listener_with_callback_and_bool(
                    "beforeunload",
                    unload_cb.as_ref().unchecked_ref(),
                    true,
                );
            }
            move || {
                if let Some(win) = &window {
                    let _ = win.remove_event_listener_with_callback_and_bool(
                        "resize",
                        resize_cb.as_ref().unchecked_ref(),
                        true,
                    );
                    let _ = win.remove_event_listener_with_callback_and_bool(
                        "beforeunload",
                        unload_cb.as_ref().unchecked_ref(),
                        true,
                    );
                }
                {
                    let mut p = page.borrow_mut();
                    p.end_stream();
                    p.timer = None;
                }
                drop(resize_cb);
                drop(unload_cb);
            }
        });
    }

    // A new epoch means a new stream.
    {
        let state_snapshot = state.clone();
        let page = page.clone();
        let player_ref = player_ref.clone();
        let timer_text = timer_text.clone();
        use_effect_with(state.stream_epoch, move |epoch| {
            if *epoch > 0 && state_snapshot.phase == Phase::Streaming {
                let surface = {
                    let setter = timer_text.setter();
                    Callback::from(move |s: String| setter.set(s))
                };
                {
                    let mut p = page.borrow_mut();
                    p.stop_timer();
                    match p.timer.as_mut() {
                        // Replays on the same page restart the count from zero.
                        Some(PageTimer::Frames(frames)) => {
                            frames.set_surface(Some(Box::new(surface)));
                            frames.reset();
                        }
                        _ => p.timer = Some(PageTimer::new(state_snapshot.config.timer, surface)),
                    }
                }
                match player_ref.cast::<web_sys::Element>() {
                    Some(parent) => {
                        open_stream(&page, &state_snapshot, state_snapshot.dispatcher(), parent)
                    }
                    None => log::error!("player element missing"),
                }
            }
            || ()
        });
    }

    let on_play = {
        let dispatcher = state.dispatcher();
        Callback::from(move |()| dispatcher.dispatch(SessionAction::Play))
    };
    let on_switch = {
        let dispatcher = state.dispatcher();
        let to_sign_up = state.phase == Phase::SignIn;
        Callback::from(move |()| {
            dispatcher.dispatch(if to_sign_up {
                SessionAction::ShowSignUp
            } else {
                SessionAction::ShowSignIn
            })
        })
    };
    let on_auth_submit = {
        let dispatcher = state.dispatcher();
        let endpoints = state.config.endpoints.clone();
        let mode = if state.phase == Phase::SignUp { AuthMode::SignUp } else { AuthMode::SignIn };
        let auth_busy = auth_busy.clone();
        Callback::from(move |creds: Credentials| {
            let dispatcher = dispatcher.clone();
            let endpoints = endpoints.clone();
            let auth_busy = auth_busy.clone();
            auth_busy.set(true);
            spawn_local(async move {
                let result = match mode {
                    AuthMode::SignIn => api::sign_in(&endpoints, &creds).await,
                    AuthMode::SignUp => api::sign_up(&endpoints, &creds).await,
                };
                auth_busy.set(false);
                match result {
                    Ok(resp) => {
                        if let Some(token) = resp.token {
                            storage::save_auth(&AuthRecord {
                                token,
                                nickname: creds.nick_name.clone(),
                            });
                        }
                        log::info!("{} authenticated", creds.nick_name);
                        dispatcher.dispatch(SessionAction::Authenticated);
                    }
                    Err(e) => {
                        log::warn!("authentication failed: {:#}", e);
                        flash_toast(&dispatcher, Toast::failure(MSG_AUTH_FAILED), None);
                    }
                }
            });
        })
    };

    let overlay = match state.phase {
        Phase::Loading | Phase::Streaming => html! {},
        Phase::Ready => html! { <PlayButton on_play={on_play} /> },
        Phase::SignIn | Phase::SignUp => {
            let mode = if state.phase == Phase::SignUp { AuthMode::SignUp } else { AuthMode::SignIn };
            html! { <AuthModal mode={mode} busy={*auth_busy} on_submit={on_auth_submit} on_switch={on_switch} /> }
        }
    };
    let player_style = if state.config.requires_auth {
        "position:relative; width:100%; min-height:480px; border:1px solid #ababab; box-shadow:0px 0px 4px #ababab;"
    } else {
        "position:relative; width:100%; min-height:480px;"
    };

    html! {
        <div style="max-width:960px; margin:0 auto; padding:12px;">
            <WarningBanner warning={state.warning.clone()} />
            <TimerDisplay text={(*timer_text).clone()} />
            <div id="player" style={player_style}>
                <div ref={player_ref} style="width:100%;"></div>
                { overlay }
            </div>
            <MessageBox message={state.message.clone()} />
            <ToastMessage toast={state.toast.clone()} />
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_stream_clears_the_session() {
        let mut page = PageSession::default();
        *page.last_stats.borrow_mut() = Some(StatsSnapshot::new());
        assert_eq!(page.end_stream(), None);
        assert!(page.streaming.is_none());
        assert!(page.stats_ticker.is_none());
        assert!(page.last_stats.borrow().is_none());
        // a second disconnect has nothing left to close
        assert_eq!(page.end_stream(), None);
    }
}
