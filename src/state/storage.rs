// localStorage persistence of the signed-in user.
use crate::model::AuthRecord;

pub const AUTH_KEY: &str = "auth";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// The stored record, only when it carries both a token and a nickname.
pub fn load_auth() -> Option<AuthRecord> {
    let raw = local_storage()?.get_item(AUTH_KEY).ok().flatten()?;
    AuthRecord::parse(&raw)
}

pub fn save_auth(auth: &AuthRecord) {
    if let Some(store) = local_storage() {
        if let Ok(s) = serde_json::to_string(auth) {
            let _ = store.set_item(AUTH_KEY, &s);
        }
    }
}

pub fn clear_auth() {
    if let Some(store) = local_storage() {
        let _ = store.remove_item(AUTH_KEY);
    }
}
