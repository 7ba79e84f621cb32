//! Extension API bindings and the startup config load.

use jf_core::config::STORAGE_KEYS;
use jf_core::FilterConfig;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = get)]
    fn storage_sync_get(keys: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime", "onMessage"], js_name = addListener)]
    fn on_message_add_listener(listener: &js_sys::Function) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime", "onMessage"], js_name = removeListener)]
    fn on_message_remove_listener(listener: &js_sys::Function) -> Result<(), JsValue>;
}

/// Read both config keys from synced storage.
///
/// The store is external and may reject (extension context invalidated,
/// quota, missing permission). Any failure yields the default config.
pub async fn load_config() -> FilterConfig {
    match read_storage().await {
        Ok(stored) => FilterConfig::from_storage(&stored),
        Err(err) => {
            log::error!("Error loading filter config: {err:?}");
            FilterConfig::default()
        }
    }
}

async fn read_storage() -> Result<serde_json::Value, JsValue> {
    let keys = js_sys::Array::new();
    for key in STORAGE_KEYS {
        keys.push(&JsValue::from_str(key));
    }

    let stored = JsFuture::from(storage_sync_get(&keys)?).await?;
    serde_wasm_bindgen::from_value(stored).map_err(JsValue::from)
}

pub fn add_message_listener(listener: &js_sys::Function) {
    if let Err(err) = on_message_add_listener(listener) {
        log::error!("Could not subscribe to settings updates: {err:?}");
    }
}

pub fn remove_message_listener(listener: &js_sys::Function) {
    let _ = on_message_remove_listener(listener);
}
