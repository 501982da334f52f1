//! Bindings to the render-streaming JS module and the peer-session wrapper
//! used by the stream pages.
//!
//! `RenderStreaming`, `Signaling`, `WebSocketSignaling`, `VideoPlayer` and
//! `getRTCConfiguration` are expected as globals (see `index.html`). Only the
//! surface the pages need is bound here.

use anyhow::{anyhow, Result};
use js_sys::{Array, Function, Promise, Reflect};
use std::collections::HashMap;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = RenderStreaming)]
    #[derive(Clone)]
    pub type JsRenderStreaming;

    #[wasm_bindgen(constructor, js_class = RenderStreaming)]
    fn new(signaling: &JsValue, config: &JsValue) -> JsRenderStreaming;

    #[wasm_bindgen(method, setter = onConnect, js_class = RenderStreaming)]
    fn set_on_connect(this: &JsRenderStreaming, f: &Function);
    #[wasm_bindgen(method, setter = onDisconnect, js_class = RenderStreaming)]
    fn set_on_disconnect(this: &JsRenderStreaming, f: &Function);
    #[wasm_bindgen(method, setter = onTrackEvent, js_class = RenderStreaming)]
    fn set_on_track_event(this: &JsRenderStreaming, f: &Function);
    #[wasm_bindgen(method, setter = onGotOffer, js_class = RenderStreaming)]
    fn set_on_got_offer(this: &JsRenderStreaming, f: &Function);

    #[wasm_bindgen(method, js_class = RenderStreaming)]
    fn start(this: &JsRenderStreaming) -> Promise;
    #[wasm_bindgen(method, js_name = createConnection, js_class = RenderStreaming)]
    fn create_connection(this: &JsRenderStreaming) -> Promise;
    #[wasm_bindgen(method, js_class = RenderStreaming)]
    fn stop(this: &JsRenderStreaming) -> Promise;
    #[wasm_bindgen(method, js_name = createDataChannel, js_class = RenderStreaming)]
    fn create_data_channel(this: &JsRenderStreaming, label: &str) -> JsValue;
    #[wasm_bindgen(method, js_name = getTransceivers, js_class = RenderStreaming)]
    fn get_transceivers(this: &JsRenderStreaming) -> Array;
    #[wasm_bindgen(method, js_name = getStats, js_class = RenderStreaming)]
    fn get_stats(this: &JsRenderStreaming) -> Promise;

    #[wasm_bindgen(js_name = Signaling)]
    type JsHttpSignaling;
    #[wasm_bindgen(constructor, js_class = Signaling)]
    fn new() -> JsHttpSignaling;

    #[wasm_bindgen(js_name = WebSocketSignaling)]
    type JsWebSocketSignaling;
    #[wasm_bindgen(constructor, js_class = WebSocketSignaling)]
    fn new() -> JsWebSocketSignaling;
    #[wasm_bindgen(constructor, js_class = WebSocketSignaling)]
    fn with_url(url: &str) -> JsWebSocketSignaling;

    #[wasm_bindgen(js_name = getRTCConfiguration)]
    fn get_rtc_configuration() -> JsValue;

    #[wasm_bindgen(js_name = VideoPlayer)]
    #[derive(Clone)]
    pub type VideoPlayer;
    #[wasm_bindgen(constructor, js_class = VideoPlayer)]
    pub fn new() -> VideoPlayer;
    #[wasm_bindgen(method, js_name = createPlayer, js_class = VideoPlayer)]
    pub fn create_player(this: &VideoPlayer, parent: &web_sys::Element);
    #[wasm_bindgen(method, js_name = addTrack, js_class = VideoPlayer)]
    fn add_track(this: &VideoPlayer, track: &JsValue);
    #[wasm_bindgen(method, js_name = setupInput, js_class = VideoPlayer)]
    fn setup_input(this: &VideoPlayer, channel: &JsValue);
    #[wasm_bindgen(method, js_name = deletePlayer, js_class = VideoPlayer)]
    pub fn delete_player(this: &VideoPlayer);
    #[wasm_bindgen(method, js_name = resizeVideo, js_class = VideoPlayer)]
    pub fn resize_video(this: &VideoPlayer);
}

/// How the signaling channel is created for a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignalingChoice {
    Http,
    WebSocket(Option<String>),
}

// ---- codec preferences ----

pub const CODEC_PREFERENCES: &[&str] = &[
    "video/VP8",
    "video/H264 level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=42001f",
    "video/H264 level-asymmetry-allowed=1;packetization-mode=0;profile-level-id=42001f",
    "video/H264 level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=42e01f",
    "video/H264 level-asymmetry-allowed=1;packetization-mode=0;profile-level-id=42e01f",
    "video/H264 level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=4d001f",
    "video/H264 level-asymmetry-allowed=1;packetization-mode=0;profile-level-id=4d001f",
    "video/AV1 level-idx=5;profile=0;tier=0",
    "video/VP9 profile-id=0",
    "video/VP9 profile-id=2",
    "video/H264 level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=640034",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecCapability {
    pub mime_type: String,
    pub sdp_fmtp_line: Option<String>,
}

/// Splits `"mime fmtp"` into its two halves.
pub fn parse_preference(pref: &str) -> (&str, Option<&str>) {
    match pref.split_once(' ') {
        Some((mime, fmtp)) => (mime, Some(fmtp)),
        None => (pref, None),
    }
}

/// Index of the capability exactly matching `pref` (mime type and fmtp line).
pub fn select_codec(pref: &str, codecs: &[CodecCapability]) -> Option<usize> {
    let (mime, fmtp) = parse_preference(pref);
    codecs
        .iter()
        .position(|c| c.mime_type == mime && c.sdp_fmtp_line.as_deref() == fmtp)
}

// ---- inbound video stats ----

#[derive(Clone, Debug, PartialEq)]
pub struct InboundVideoSample {
    pub id: String,
    /// ms
    pub timestamp: f64,
    pub bytes_received: f64,
    pub frames_per_second: Option<f64>,
}

pub type StatsSnapshot = HashMap<String, InboundVideoSample>;

pub fn bitrate_kbps(prev: &InboundVideoSample, cur: &InboundVideoSample) -> Option<f64> {
    let duration_s = (cur.timestamp - prev.timestamp) / 1000.0;
    if duration_s <= 0.0 {
        return None;
    }
    Some(8.0 * (cur.bytes_received - prev.bytes_received) / duration_s / 1000.0)
}

/// One display line per inbound video stream that also has a previous sample.
pub fn stats_lines(prev: &StatsSnapshot, cur: &StatsSnapshot) -> Vec<String> {
    let mut ids: Vec<&String> = cur.keys().collect();
    ids.sort();
    ids.into_iter()
        .filter_map(|id| {
            let sample = &cur[id];
            let Some(before) = prev.get(id) else {
                log::debug!("no previous stats for {}", id);
                return None;
            };
            let kbps = bitrate_kbps(before, sample)?;
            let fps = sample
                .frames_per_second
                .map(|f| f.to_string())
                .unwrap_or_else(|| "-".to_string());
            Some(format!("Bitrate: {:.2} kbit/sec, Framerate: {}", kbps, fps))
        })
        .collect()
}

fn get(obj: &JsValue, key: &str) -> JsValue {
    Reflect::get(obj, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

fn inbound_video_samples(report: &JsValue) -> StatsSnapshot {
    let mut out = StatsSnapshot::new();
    let report: &js_sys::Map = report.unchecked_ref();
    report.for_each(&mut |stat, _key| {
        if get(&stat, "type").as_string().as_deref() != Some("inbound-rtp")
            || get(&stat, "kind").as_string().as_deref() != Some("video")
        {
            return;
        }
        let Some(id) = get(&stat, "id").as_string() else { return };
        out.insert(
            id.clone(),
            InboundVideoSample {
                id,
                timestamp: get(&stat, "timestamp").as_f64().unwrap_or(0.0),
                bytes_received: get(&stat, "bytesReceived").as_f64().unwrap_or(0.0),
                frames_per_second: get(&stat, "framesPerSecond").as_f64(),
            },
        );
    });
    out
}

fn video_codec_capabilities() -> Vec<CodecCapability> {
    let sender = get(&js_sys::global(), "RTCRtpSender");
    let Ok(get_caps) = get(&sender, "getCapabilities").dyn_into::<Function>() else {
        return Vec::new();
    };
    let caps = get_caps
        .call1(&sender, &JsValue::from_str("video"))
        .unwrap_or(JsValue::UNDEFINED);
    let codecs: Array = get(&caps, "codecs").dyn_into().unwrap_or_else(|_| Array::new());
    codecs
        .iter()
        .filter_map(|c| {
            Some(CodecCapability {
                mime_type: get(&c, "mimeType").as_string()?,
                sdp_fmtp_line: get(&c, "sdpFmtpLine").as_string(),
            })
        })
        .collect()
}

fn supports_set_codec_preferences() -> bool {
    let transceiver = get(&js_sys::global(), "RTCRtpTransceiver");
    if transceiver.is_undefined() {
        return false;
    }
    let proto = get(&transceiver, "prototype");
    Reflect::has(&proto, &JsValue::from_str("setCodecPreferences")).unwrap_or(false)
}

/// Callbacks a page hands to [`StreamingSession::open`].
pub struct StreamingHandlers {
    pub on_connect: Box<dyn FnMut()>,
    pub on_disconnect: Box<dyn FnMut(String)>,
}

/// A live peer session plus the video player attached to it.
pub struct StreamingSession {
    inner: JsRenderStreaming,
    player: VideoPlayer,
    _on_connect: Closure<dyn FnMut()>,
    _on_disconnect: Closure<dyn FnMut(JsValue)>,
    _on_track: Closure<dyn FnMut(JsValue)>,
    _on_offer: Closure<dyn FnMut()>,
}

impl StreamingSession {
    /// Creates the player inside `parent`, wires the peer callbacks and
    /// starts signaling.
    pub async fn open(
        parent: &web_sys::Element,
        signaling: SignalingChoice,
        handlers: StreamingHandlers,
    ) -> Result<std::rc::Rc<Self>> {
        let player = VideoPlayer::new();
        player.create_player(parent);

        let signaling: JsValue = match signaling {
            SignalingChoice::Http => JsHttpSignaling::new().into(),
            SignalingChoice::WebSocket(None) => JsWebSocketSignaling::new().into(),
            SignalingChoice::WebSocket(Some(url)) => JsWebSocketSignaling::with_url(&url).into(),
        };
        let inner = JsRenderStreaming::new(&signaling, &get_rtc_configuration());

        let StreamingHandlers { mut on_connect, mut on_disconnect } = handlers;
        let connect_inner = inner.clone();
        let connect_player = player.clone();
        let on_connect_cb = Closure::wrap(Box::new(move || {
            let channel = connect_inner.create_data_channel("input");
            connect_player.setup_input(&channel);
            on_connect();
        }) as Box<dyn FnMut()>);
        let on_disconnect_cb = Closure::wrap(Box::new(move |id: JsValue| {
            on_disconnect(id.as_string().unwrap_or_else(|| format!("{:?}", id)));
        }) as Box<dyn FnMut(JsValue)>);
        let track_player = player.clone();
        let on_track_cb = Closure::wrap(Box::new(move |data: JsValue| {
            track_player.add_track(&get(&data, "track"));
        }) as Box<dyn FnMut(JsValue)>);
        let offer_inner = inner.clone();
        let on_offer_cb = Closure::wrap(Box::new(move || {
            apply_codec_preferences(&offer_inner);
        }) as Box<dyn FnMut()>);

        inner.set_on_connect(on_connect_cb.as_ref().unchecked_ref());
        inner.set_on_disconnect(on_disconnect_cb.as_ref().unchecked_ref());
        inner.set_on_track_event(on_track_cb.as_ref().unchecked_ref());
        inner.set_on_got_offer(on_offer_cb.as_ref().unchecked_ref());

        let session = std::rc::Rc::new(Self {
            inner,
            player,
            _on_connect: on_connect_cb,
            _on_disconnect: on_disconnect_cb,
            _on_track: on_track_cb,
            _on_offer: on_offer_cb,
        });
        cleanup_on_err(session.connect().await, || session.close())?;
        log::info!("render streaming connection requested");
        Ok(session)
    }

    async fn connect(&self) -> Result<()> {
        JsFuture::from(self.inner.start())
            .await
            .map_err(|e| anyhow!("renderstreaming start: {:?}", e))?;
        JsFuture::from(self.inner.create_connection())
            .await
            .map_err(|e| anyhow!("createConnection: {:?}", e))?;
        Ok(())
    }

    pub async fn stats(&self) -> Option<StatsSnapshot> {
        let report = JsFuture::from(self.inner.get_stats()).await.ok()?;
        if report.is_null() || report.is_undefined() {
            return None;
        }
        Some(inbound_video_samples(&report))
    }

    pub fn resize(&self) {
        self.player.resize_video();
    }

    /// Stops signaling and removes the player. The player is gone when this
    /// returns; the stop promise settles in the background.
    pub fn close(&self) {
        let stop = self.inner.stop();
        self.player.delete_player();
        spawn_local(async move {
            if let Err(e) = JsFuture::from(stop).await {
                log::warn!("renderstreaming stop failed: {:?}", e);
            }
        });
    }
}

/// Hands `result` back, running `cleanup` first when it is an error.
fn cleanup_on_err<T>(result: Result<T>, cleanup: impl FnOnce()) -> Result<T> {
    if result.is_err() {
        cleanup();
    }
    result
}

fn apply_codec_preferences(rs: &JsRenderStreaming) {
    if !supports_set_codec_preferences() {
        return;
    }
    let caps = video_codec_capabilities();
    let Some(idx) = select_codec(CODEC_PREFERENCES[0], &caps) else {
        log::debug!("preferred codec {} not offered", CODEC_PREFERENCES[0]);
        return;
    };
    // Re-read the raw capability object so the browser gets its own shape back.
    let sender = get(&js_sys::global(), "RTCRtpSender");
    let Ok(get_caps) = get(&sender, "getCapabilities").dyn_into::<Function>() else { return };
    let Ok(caps) = get_caps.call1(&sender, &JsValue::from_str("video")) else { return };
    let raw_codecs: Array = get(&caps, "codecs").dyn_into().unwrap_or_else(|_| Array::new());
    let selected = Array::of1(&raw_codecs.get(idx as u32));

    for t in rs.get_transceivers().iter() {
        let kind = get(&get(&get(&t, "receiver"), "track"), "kind");
        if kind.as_string().as_deref() != Some("video") {
            continue;
        }
        if let Ok(f) = get(&t, "setCodecPreferences").dyn_into::<Function>() {
            let _ = f.call1(&t, &selected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap(mime: &str, fmtp: Option<&str>) -> CodecCapability {
        CodecCapability {
            mime_type: mime.to_string(),
            sdp_fmtp_line: fmtp.map(str::to_string),
        }
    }

    fn sample(id: &str, ts: f64, bytes: f64) -> InboundVideoSample {
        InboundVideoSample {
            id: id.to_string(),
            timestamp: ts,
            bytes_received: bytes,
            frames_per_second: Some(60.0),
        }
    }

    #[test]
    fn test_parse_preference() {
        assert_eq!(parse_preference("video/VP8"), ("video/VP8", None));
        assert_eq!(
            parse_preference("video/VP9 profile-id=2"),
            ("video/VP9", Some("profile-id=2"))
        );
    }

    #[test]
    fn test_select_codec() {
        let caps = vec![
            cap("video/H264", Some("profile-level-id=42001f")),
            cap("video/VP8", None),
            cap("video/VP9", Some("profile-id=0")),
        ];
        assert_eq!(select_codec("video/VP8", &caps), Some(1));
        assert_eq!(select_codec("video/VP9 profile-id=0", &caps), Some(2));
        assert_eq!(select_codec("video/VP9 profile-id=2", &caps), None);
        assert_eq!(select_codec("video/AV1", &[]), None);
    }

    #[test]
    fn test_cleanup_runs_only_on_error() {
        let mut closed = 0;
        let ok = cleanup_on_err(Ok(7), || closed += 1);
        assert_eq!(ok.unwrap(), 7);
        assert_eq!(closed, 0);

        let failed: Result<()> = cleanup_on_err(Err(anyhow!("createConnection")), || closed += 1);
        assert!(failed.is_err());
        assert_eq!(closed, 1);
    }

    #[test]
    fn test_bitrate() {
        let a = sample("v", 1000.0, 0.0);
        let b = sample("v", 2000.0, 125_000.0);
        assert_eq!(bitrate_kbps(&a, &b), Some(1000.0));
        assert_eq!(bitrate_kbps(&b, &b), None);
    }

    #[test]
    fn test_stats_lines_need_previous_sample() {
        let mut prev = StatsSnapshot::new();
        prev.insert("a".into(), sample("a", 0.0, 0.0));
        let mut cur = StatsSnapshot::new();
        cur.insert("a".into(), sample("a", 500.0, 1000.0));
        cur.insert("b".into(), sample("b", 500.0, 1000.0));
        assert_eq!(
            stats_lines(&prev, &cur),
            vec!["Bitrate: 16.00 kbit/sec, Framerate: 60".to_string()]
        );
        assert!(stats_lines(&StatsSnapshot::new(), &cur).is_empty());
    }
}
