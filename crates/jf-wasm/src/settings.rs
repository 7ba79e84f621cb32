//! Helpers for the settings surface, so block-list edits and the update
//! message follow the same rules the content script reads them with.

use jf_core::{BlockList, FilterSettings, InboundMessage};
use wasm_bindgen::prelude::*;

fn block_list_from(value: JsValue) -> Result<BlockList, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(BlockList::default());
    }
    let entries: Vec<String> = serde_wasm_bindgen::from_value(value)?;
    Ok(BlockList::from(entries))
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

/// Add a company; rejects blank names and exact duplicates.
#[wasm_bindgen(js_name = addBlockedCompany)]
pub fn add_blocked_company(companies: JsValue, name: &str) -> Result<JsValue, JsValue> {
    let mut list = block_list_from(companies)?;
    list.add(name).map_err(|err| JsValue::from_str(&err.to_string()))?;
    to_js(&list)
}

#[wasm_bindgen(js_name = removeBlockedCompany)]
pub fn remove_blocked_company(companies: JsValue, name: &str) -> Result<JsValue, JsValue> {
    let mut list = block_list_from(companies)?;
    list.remove(name);
    to_js(&list)
}

/// The `UPDATE_FILTER_SETTINGS` message for the current settings.
#[wasm_bindgen(js_name = updateMessage)]
pub fn update_message(companies: JsValue, filter_settings: JsValue) -> Result<JsValue, JsValue> {
    let filter_settings: Option<FilterSettings> = if filter_settings.is_undefined() || filter_settings.is_null() {
        None
    } else {
        Some(serde_wasm_bindgen::from_value(filter_settings)?)
    };
    let message = InboundMessage::UpdateFilterSettings {
        companies: block_list_from(companies)?,
        filter_settings,
    };
    to_js(&message)
}
