//! WebAssembly content script for Job Filter
//!
//! The extension's JS shim loads this module on LinkedIn and Indeed pages and
//! calls [`ContentScript::start`] once. The returned handle owns the engine
//! for the page's lifetime; dropping or tearing it down releases the
//! observer, the timer and every listener.

mod chrome;
pub mod dom;
pub mod runtime;
pub mod settings;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use runtime::Runtime;

// Set up panic hook and logging before anything else runs.
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
}

#[wasm_bindgen]
pub struct ContentScript {
    runtime: Rc<RefCell<Runtime>>,
}

#[wasm_bindgen]
impl ContentScript {
    /// Wait for the DOM, load the stored config and start filtering.
    pub async fn start() -> Result<ContentScript, JsValue> {
        dom_ready().await?;
        let config = chrome::load_config().await;
        let runtime = Runtime::install(config)?;
        Ok(ContentScript { runtime })
    }

    /// `"linkedin"`, `"indeed"`, or undefined on other sites.
    pub fn site(&self) -> Option<String> {
        let site = self.runtime.borrow().engine().site()?;
        Some(match site {
            jf_core::Site::LinkedIn => "linkedin".to_string(),
            jf_core::Site::Indeed => "indeed".to_string(),
        })
    }

    #[wasm_bindgen(js_name = isEnabled)]
    pub fn is_enabled(&self) -> bool {
        self.runtime.borrow().engine().is_enabled()
    }

    /// Turn filtering off (revealing every hidden card) or back on.
    #[wasm_bindgen(js_name = setEnabled)]
    pub fn set_enabled(&self, enabled: bool) -> u32 {
        let report = self.runtime.borrow_mut().set_enabled(enabled);
        (report.hidden + report.shown) as u32
    }

    pub fn teardown(&self) {
        self.runtime.borrow_mut().teardown();
    }
}

impl Drop for ContentScript {
    fn drop(&mut self) {
        if let Ok(mut runtime) = self.runtime.try_borrow_mut() {
            runtime.teardown();
        }
    }
}

/// Resolves once the document has finished parsing.
async fn dom_ready() -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    if document.ready_state() != "loading" {
        return Ok(());
    }

    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let _ = document.add_event_listener_with_callback("DOMContentLoaded", &resolve);
    });
    wasm_bindgen_futures::JsFuture::from(promise).await?;
    Ok(())
}
