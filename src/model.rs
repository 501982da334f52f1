//! Page configuration, wire types and the stream page session state.
//! Every stream page runs the same controller; what differs between them
//! lives in [`PageConfig`].

use serde::{Deserialize, Serialize};
use std::rc::Rc;
use yew::Reducible;

pub const AUTH_BASE: &str = "https://other-server.com";
pub const RANKING_BASE: &str = "http://172.171.134.142:8080";
pub const FPS_SIGNALING_URL: &str = "localhost:7001";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalingMode {
    /// WebSocket or HTTP polling, whichever `/config` reports.
    ServerDefined,
    /// Always WebSocket against a fixed host.
    WebSocket { url: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerStrategy {
    /// Frame-callback accumulator; the total is what gets ranked.
    FrameAccumulator,
    /// `now - start` recomputed once a second.
    WallClock,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub auth_base: String,
    pub ranking_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_base: AUTH_BASE.to_string(),
            ranking_base: RANKING_BASE.to_string(),
        }
    }
}

impl Endpoints {
    pub fn sign_in(&self) -> String {
        format!("{}/signIn", self.auth_base)
    }
    pub fn sign_up(&self) -> String {
        format!("{}/signUp", self.auth_base)
    }
    pub fn rankings(&self) -> String {
        format!("{}/rankings", self.ranking_base)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageConfig {
    pub requires_auth: bool,
    pub show_stats: bool,
    pub signaling: SignalingMode,
    pub timer: TimerStrategy,
    /// Post the stopwatch total to the ranking service on disconnect.
    pub submit_score: bool,
    pub endpoints: Endpoints,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Stream(PageConfig),
    /// `/sign-in`, `/sign-up`: the play page opened on that modal.
    Auth(AuthMode),
    Rank,
    SignOut,
}

impl PageConfig {
    pub fn fps() -> Self {
        Self {
            requires_auth: false,
            show_stats: true,
            signaling: SignalingMode::WebSocket {
                url: FPS_SIGNALING_URL.to_string(),
            },
            timer: TimerStrategy::FrameAccumulator,
            submit_score: true,
            endpoints: Endpoints::default(),
        }
    }

    pub fn play() -> Self {
        Self {
            requires_auth: true,
            show_stats: false,
            signaling: SignalingMode::ServerDefined,
            timer: TimerStrategy::FrameAccumulator,
            submit_score: true,
            endpoints: Endpoints::default(),
        }
    }

    pub fn hdrp() -> Self {
        Self {
            requires_auth: false,
            show_stats: true,
            signaling: SignalingMode::ServerDefined,
            timer: TimerStrategy::WallClock,
            submit_score: false,
            endpoints: Endpoints::default(),
        }
    }

    /// Resolves a page from `location.pathname`. Unknown paths get the fps page.
    pub fn for_path(path: &str) -> Route {
        let trimmed = path.trim_end_matches('/');
        let last = trimmed.rsplit('/').next().unwrap_or("");
        match last {
            "rank" => Route::Rank,
            "sign-out" => Route::SignOut,
            "sign-in" => Route::Auth(AuthMode::SignIn),
            "sign-up" => Route::Auth(AuthMode::SignUp),
            "play" => Route::Stream(Self::play()),
            "hdrp" => Route::Stream(Self::hdrp()),
            _ => Route::Stream(Self::fps()),
        }
    }
}

/// Response of the `/config` endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub use_web_socket: bool,
    pub startup_mode: String,
    #[serde(default)]
    pub logging: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            use_web_socket: true,
            startup_mode: "public".to_string(),
            logging: "dev".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn is_private(&self) -> bool {
        self.startup_mode == "private"
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.logging.as_str() {
            "none" => log::LevelFilter::Warn,
            "dev" => log::LevelFilter::Debug,
            _ => log::LevelFilter::Info,
        }
    }
}

/// Signed-in user as kept in `localStorage["auth"]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRecord {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub nickname: String,
}

impl AuthRecord {
    pub fn parse(raw: &str) -> Option<Self> {
        let auth: Self = serde_json::from_str(raw).ok()?;
        auth.is_complete().then_some(auth)
    }

    pub fn is_complete(&self) -> bool {
        !self.token.is_empty() && !self.nickname.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub nick_name: String,
    pub password: String,
}

impl Credentials {
    /// None when either field is blank.
    pub fn new(nick_name: &str, password: &str) -> Option<Self> {
        if nick_name.is_empty() || password.is_empty() {
            return None;
        }
        Some(Self {
            nick_name: nick_name.to_string(),
            password: password.to_string(),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub nick_name: String,
    pub max_score: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub rank_number: u32,
    pub nick_name: String,
    pub max_score: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Failure,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub text: String,
    pub kind: ToastKind,
}

impl Toast {
    pub fn success(text: &str) -> Self {
        Self { text: text.to_string(), kind: ToastKind::Success }
    }
    pub fn failure(text: &str) -> Self {
        Self { text: text.to_string(), kind: ToastKind::Failure }
    }
    pub fn background(&self) -> &'static str {
        match self.kind {
            ToastKind::Success => "#00ff0070",
            ToastKind::Failure => "#ff000070",
        }
    }
}

pub const MSG_RANK_SAVED: &str = "랭킹이 등록됐습니다!";
pub const MSG_RANK_SAVE_FAILED: &str = "랭킹 등록에 실패했습니다!";
pub const MSG_RANK_LOAD_FAILED: &str = "랭킹을 불러오는데 실패했습니다.!";
pub const MSG_AUTH_FAILED: &str = "로그인에 실패했습니다.";
pub const PRIVATE_MODE_WARNING: &str = "This sample is not working on Private Mode.";

// ---- auth modal view descriptors ----

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub input_type: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModalDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    pub fields: [FieldDescriptor; 2],
    pub submit_id: &'static str,
    pub submit_label: &'static str,
    /// Link that switches to the other mode, shown under the submit button.
    pub switch_link: Option<&'static str>,
}

const NICKNAME_FIELD: FieldDescriptor = FieldDescriptor {
    id: "idInput",
    label: "닉네임",
    placeholder: "닉네임 (nickName)",
    input_type: "text",
};

const PASSWORD_FIELD: FieldDescriptor = FieldDescriptor {
    id: "passwordInput",
    label: "비밀번호",
    placeholder: "비밀번호 (password)",
    input_type: "password",
};

impl AuthMode {
    pub fn descriptor(self) -> ModalDescriptor {
        match self {
            AuthMode::SignIn => ModalDescriptor {
                id: "signInBG",
                title: "로그인",
                fields: [NICKNAME_FIELD, PASSWORD_FIELD],
                submit_id: "signInButton",
                submit_label: "로그인",
                switch_link: Some("회원가입"),
            },
            AuthMode::SignUp => ModalDescriptor {
                id: "signUpBG",
                title: "회원가입",
                fields: [NICKNAME_FIELD, PASSWORD_FIELD],
                submit_id: "signUpButton",
                submit_label: "회원가입",
                switch_link: Some("로그인"),
            },
        }
    }
}

// ---- session ----

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for `/config`.
    Loading,
    SignIn,
    SignUp,
    /// Play button shown.
    Ready,
    Streaming,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub config: PageConfig,
    pub phase: Phase,
    pub server: Option<ServerConfig>,
    pub warning: Option<String>,
    /// Text of the message box under the player (disconnects, stats).
    pub message: Option<String>,
    pub toast: Option<Toast>,
    /// Modal shown first on pages that require auth.
    pub auth_entry: AuthMode,
    /// Bumped every time a new stream should be set up.
    pub stream_epoch: u32,
}

pub enum SessionAction {
    ConfigLoaded(ServerConfig),
    ConfigFailed,
    ShowSignIn,
    ShowSignUp,
    Authenticated,
    Play,
    Disconnected { connection_id: String },
    SetMessage(Option<String>),
    ShowToast(Toast),
    ClearToast,
}

impl SessionState {
    pub fn new(config: PageConfig) -> Self {
        Self {
            config,
            phase: Phase::Loading,
            server: None,
            warning: None,
            message: None,
            toast: None,
            auth_entry: AuthMode::SignIn,
            stream_epoch: 0,
        }
    }

    pub fn with_auth_entry(mut self, mode: AuthMode) -> Self {
        self.auth_entry = mode;
        self
    }

    pub fn use_web_socket(&self) -> bool {
        match &self.config.signaling {
            SignalingMode::WebSocket { .. } => true,
            SignalingMode::ServerDefined => {
                self.server.as_ref().map(|s| s.use_web_socket).unwrap_or(true)
            }
        }
    }

    fn after_config(&mut self, server: ServerConfig) {
        self.warning = server.is_private().then(|| PRIVATE_MODE_WARNING.to_string());
        self.server = Some(server);
        self.phase = match (self.config.requires_auth, self.auth_entry) {
            (false, _) => Phase::Ready,
            (true, AuthMode::SignIn) => Phase::SignIn,
            (true, AuthMode::SignUp) => Phase::SignUp,
        };
    }

    fn begin_stream(&mut self) {
        self.phase = Phase::Streaming;
        self.message = None;
        self.stream_epoch = self.stream_epoch.wrapping_add(1);
    }
}

impl Reducible for SessionState {
    type Action = SessionAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        use SessionAction::*;
        let mut new = (*self).clone();
        match action {
            ConfigLoaded(server) => {
                if new.phase != Phase::Loading {
                    return self;
                }
                new.after_config(server);
            }
            ConfigFailed => {
                if new.phase != Phase::Loading {
                    return self;
                }
                new.after_config(ServerConfig::default());
            }
            ShowSignIn => {
                if new.phase != Phase::SignUp {
                    return self;
                }
                new.phase = Phase::SignIn;
            }
            ShowSignUp => {
                if new.phase != Phase::SignIn {
                    return self;
                }
                new.phase = Phase::SignUp;
            }
            Authenticated => {
                if !matches!(new.phase, Phase::SignIn | Phase::SignUp) {
                    return self;
                }
                new.begin_stream();
            }
            Play => {
                if new.phase != Phase::Ready {
                    return self;
                }
                new.begin_stream();
            }
            Disconnected { connection_id } => {
                if new.phase != Phase::Streaming {
                    return self;
                }
                new.phase = Phase::Ready;
                new.message = Some(format!("Disconnect peer on {}.", connection_id));
            }
            SetMessage(m) => {
                // late stats must not overwrite the disconnect notice
                if new.phase != Phase::Streaming {
                    return self;
                }
                new.message = m;
            }
            ShowToast(t) => new.toast = Some(t),
            ClearToast => new.toast = None,
        }
        new.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce(state: SessionState, actions: Vec<SessionAction>) -> SessionState {
        let mut rc = Rc::new(state);
        for a in actions {
            rc = rc.reduce(a);
        }
        (*rc).clone()
    }

    #[test]
    fn test_routes() {
        assert_eq!(PageConfig::for_path("/"), Route::Stream(PageConfig::fps()));
        assert_eq!(PageConfig::for_path("/fps"), Route::Stream(PageConfig::fps()));
        assert_eq!(PageConfig::for_path("/play/"), Route::Stream(PageConfig::play()));
        assert_eq!(PageConfig::for_path("/hdrp"), Route::Stream(PageConfig::hdrp()));
        assert_eq!(PageConfig::for_path("/rank/"), Route::Rank);
        assert_eq!(PageConfig::for_path("/sign-out"), Route::SignOut);
        assert_eq!(PageConfig::for_path("/sign-in"), Route::Auth(AuthMode::SignIn));
        assert_eq!(PageConfig::for_path("/sign-up/"), Route::Auth(AuthMode::SignUp));
    }

    #[test]
    fn test_presets_differ_only_in_config() {
        let fps = PageConfig::fps();
        assert!(!fps.requires_auth);
        assert_eq!(fps.signaling, SignalingMode::WebSocket { url: "localhost:7001".into() });
        assert!(PageConfig::play().requires_auth);
        assert_eq!(PageConfig::hdrp().timer, TimerStrategy::WallClock);
        assert_eq!(fps.endpoints.rankings(), "http://172.171.134.142:8080/rankings");
    }

    #[test]
    fn test_server_config_wire_format() {
        let cfg: ServerConfig =
            serde_json::from_str(r#"{"useWebSocket":false,"startupMode":"private","logging":"none"}"#)
                .unwrap();
        assert!(!cfg.use_web_socket);
        assert!(cfg.is_private());
        assert_eq!(cfg.log_level(), log::LevelFilter::Warn);
        let cfg: ServerConfig =
            serde_json::from_str(r#"{"useWebSocket":true,"startupMode":"public"}"#).unwrap();
        assert_eq!(cfg.log_level(), log::LevelFilter::Info);
        assert_eq!(ServerConfig::default().log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_auth_record_parse() {
        assert!(AuthRecord::parse(r#"{"token":"t","nickname":"n"}"#).is_some());
        assert!(AuthRecord::parse(r#"{"token":"t"}"#).is_none());
        assert!(AuthRecord::parse("null").is_none());
        assert!(AuthRecord::parse("not json").is_none());
    }

    #[test]
    fn test_wire_names() {
        let body = serde_json::to_string(&ScoreSubmission { nick_name: "a".into(), max_score: 6203 }).unwrap();
        assert_eq!(body, r#"{"nickName":"a","maxScore":6203}"#);
        let rows: Vec<RankingEntry> =
            serde_json::from_str(r#"[{"rankNumber":1,"nickName":"a","maxScore":100}]"#).unwrap();
        assert_eq!(rows[0].rank_number, 1);
        let creds = Credentials::new("a", "pw").unwrap();
        assert_eq!(serde_json::to_string(&creds).unwrap(), r#"{"nickName":"a","password":"pw"}"#);
        assert!(Credentials::new("", "pw").is_none());
        assert!(Credentials::new("a", "").is_none());
    }

    #[test]
    fn test_descriptors() {
        let sign_in = AuthMode::SignIn.descriptor();
        assert_eq!(sign_in.title, "로그인");
        assert_eq!(sign_in.switch_link, Some("회원가입"));
        assert_eq!(sign_in.fields[1].input_type, "password");
        assert_eq!(AuthMode::SignUp.descriptor().switch_link, Some("로그인"));
        assert_eq!(AuthMode::SignUp.descriptor().submit_id, "signUpButton");
    }

    #[test]
    fn test_public_page_goes_to_ready() {
        let s = reduce(
            SessionState::new(PageConfig::fps()),
            vec![SessionAction::ConfigLoaded(ServerConfig::default())],
        );
        assert_eq!(s.phase, Phase::Ready);
        assert!(s.warning.is_none());
        assert!(s.use_web_socket());
    }

    #[test]
    fn test_auth_page_flow() {
        let server = ServerConfig {
            use_web_socket: false,
            startup_mode: "private".into(),
            logging: "none".into(),
        };
        let s = reduce(
            SessionState::new(PageConfig::play()),
            vec![SessionAction::ConfigLoaded(server), SessionAction::Play],
        );
        assert_eq!(s.phase, Phase::SignIn);
        assert_eq!(s.warning.as_deref(), Some(PRIVATE_MODE_WARNING));
        assert!(!s.use_web_socket());

        let s = reduce(s, vec![SessionAction::ShowSignUp]);
        assert_eq!(s.phase, Phase::SignUp);
        let s = reduce(s, vec![SessionAction::Authenticated]);
        assert_eq!(s.phase, Phase::Streaming);
        assert_eq!(s.stream_epoch, 1);
    }

    #[test]
    fn test_sign_up_page_opens_on_sign_up() {
        let s = reduce(
            SessionState::new(PageConfig::play()).with_auth_entry(AuthMode::SignUp),
            vec![SessionAction::ConfigFailed],
        );
        assert_eq!(s.phase, Phase::SignUp);
        let s = reduce(s, vec![SessionAction::ShowSignIn]);
        assert_eq!(s.phase, Phase::SignIn);

        // pages without auth ignore the entry modal
        let s = reduce(
            SessionState::new(PageConfig::fps()).with_auth_entry(AuthMode::SignUp),
            vec![SessionAction::ConfigFailed],
        );
        assert_eq!(s.phase, Phase::Ready);
    }

    #[test]
    fn test_disconnect_returns_to_play_button() {
        let s = reduce(
            SessionState::new(PageConfig::hdrp()),
            vec![
                SessionAction::ConfigFailed,
                SessionAction::Play,
                SessionAction::Disconnected { connection_id: "abc".into() },
            ],
        );
        assert_eq!(s.phase, Phase::Ready);
        assert_eq!(s.message.as_deref(), Some("Disconnect peer on abc."));
        let s = reduce(s, vec![SessionAction::SetMessage(Some("Bitrate: 1.00 kbit/sec".into()))]);
        assert_eq!(s.message.as_deref(), Some("Disconnect peer on abc."));
        let s = reduce(s, vec![SessionAction::Play]);
        assert_eq!(s.stream_epoch, 2);
        assert!(s.message.is_none());
    }

    #[test]
    fn test_stale_actions_are_ignored() {
        let s = reduce(
            SessionState::new(PageConfig::fps()),
            vec![
                SessionAction::Play,
                SessionAction::Disconnected { connection_id: "x".into() },
                SessionAction::Authenticated,
            ],
        );
        assert_eq!(s.phase, Phase::Loading);
        assert_eq!(s.stream_epoch, 0);
    }
}
