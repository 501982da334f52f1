// HTTP calls made by the pages: server config, auth and rankings.
use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::model::{
    AuthResponse, Credentials, Endpoints, RankingEntry, ScoreSubmission, ServerConfig,
};

pub const CONFIG_PATH: &str = "/config";

fn js_err(e: JsValue) -> anyhow::Error {
    anyhow!("{:?}", e)
}

async fn send(url: &str, method: &str, body: Option<String>, auth: Option<&str>) -> Result<Response> {
    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_mode(RequestMode::Cors);
    if let Some(body) = &body {
        opts.set_body(&JsValue::from_str(body));
    }
    let request = Request::new_with_str_and_init(url, &opts).map_err(js_err)?;
    let headers = request.headers();
    if body.is_some() {
        headers.set("Content-Type", "application/json").map_err(js_err)?;
    }
    if let Some(token) = auth {
        headers.set("Authorization", token).map_err(js_err)?;
    }

    let window = web_sys::window().context("no window")?;
    let resp = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_err)
        .with_context(|| format!("{} {}", method, url))?;
    let resp: Response = resp.dyn_into().map_err(js_err)?;
    if !resp.ok() {
        bail!("{} {} -> {}", method, url, resp.status());
    }
    Ok(resp)
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let text = JsFuture::from(resp.text().map_err(js_err)?)
        .await
        .map_err(js_err)?
        .as_string()
        .unwrap_or_default();
    serde_json::from_str(&text).with_context(|| format!("bad response body: {}", text))
}

async fn post_json<B: Serialize>(url: &str, body: &B, auth: Option<&str>) -> Result<Response> {
    let body = serde_json::to_string(body)?;
    send(url, "POST", Some(body), auth).await
}

pub async fn fetch_server_config() -> Result<ServerConfig> {
    let resp = send(CONFIG_PATH, "GET", None, None).await?;
    read_json(resp).await
}

pub async fn sign_in(endpoints: &Endpoints, creds: &Credentials) -> Result<AuthResponse> {
    let resp = post_json(&endpoints.sign_in(), creds, None).await?;
    read_json(resp).await
}

pub async fn sign_up(endpoints: &Endpoints, creds: &Credentials) -> Result<AuthResponse> {
    let resp = post_json(&endpoints.sign_up(), creds, None).await?;
    read_json(resp).await
}

pub async fn submit_score(endpoints: &Endpoints, token: &str, score: &ScoreSubmission) -> Result<()> {
    post_json(&endpoints.rankings(), score, Some(token)).await?;
    Ok(())
}

pub async fn fetch_rankings(endpoints: &Endpoints) -> Result<Vec<RankingEntry>> {
    let resp = send(&endpoints.rankings(), "GET", None, None).await?;
    read_json(resp).await
}
