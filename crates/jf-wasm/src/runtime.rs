//! Page-lifetime runtime: wires browser events into the engine.
//!
//! Every event source (mutation observer, the single re-armed timer, the
//! settings message listener, delegated clicks) goes through the one
//! `Runtime` behind an `Rc<RefCell<_>>`. Callbacks hold a `Weak`, so the
//! exported handle is the only owner. Leaving the page for good (a
//! non-persisted `pagehide`) tears everything down.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use jf_core::visibility::{apply_style, BUTTON_HOVER_STYLE, BUTTON_REST_STYLE, BUTTON_SELECTOR, HIDDEN_ATTR};
use jf_core::{Clock, FilterConfig, FilterEngine, PassReport, Timing};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::chrome;
use crate::dom::{added_elements, PerformanceClock, WebDocument, WebElement};

type Engine = FilterEngine<WebDocument, PerformanceClock>;

const HIDDEN_CARD_SELECTOR: &str = "[data-job-filter-hidden]";

struct Callbacks {
    timer: Closure<dyn FnMut()>,
    observer: Closure<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>,
    message: Closure<dyn FnMut(JsValue, JsValue, JsValue)>,
    click: Closure<dyn FnMut(web_sys::Event)>,
    hover: Closure<dyn FnMut(web_sys::Event)>,
    pagehide: Closure<dyn FnMut(web_sys::Event)>,
}

pub struct Runtime {
    engine: Engine,
    window: web_sys::Window,
    document: web_sys::Document,
    timer: Option<i32>,
    observer: Option<web_sys::MutationObserver>,
    callbacks: Option<Callbacks>,
}

impl Runtime {
    /// Build the engine for the current page, run the first pass and attach
    /// every event source.
    pub fn install(config: FilterConfig) -> Result<Rc<RefCell<Runtime>>, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let host = window.location().hostname()?;
        Self::install_for_host(config, &host)
    }

    /// Same as [`Runtime::install`], with the site chosen by `host` instead of
    /// the page location.
    pub fn install_for_host(config: FilterConfig, host: &str) -> Result<Rc<RefCell<Runtime>>, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
        let performance = window
            .performance()
            .ok_or_else(|| JsValue::from_str("no performance timer"))?;

        let engine = FilterEngine::for_host(
            WebDocument(document.clone()),
            PerformanceClock(performance),
            host,
            Timing::default(),
        );

        let runtime = Rc::new(RefCell::new(Runtime {
            engine,
            window,
            document,
            timer: None,
            observer: None,
            callbacks: None,
        }));

        let callbacks = Callbacks::new(Rc::downgrade(&runtime));
        {
            let mut rt = runtime.borrow_mut();
            rt.callbacks = Some(callbacks);
            rt.engine.start(config);
            if rt.engine.profile().is_some() {
                rt.attach()?;
            }
            rt.rearm();
        }
        Ok(runtime)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    fn attach(&mut self) -> Result<(), JsValue> {
        let Some(callbacks) = self.callbacks.as_ref() else {
            return Ok(());
        };

        let body = self
            .document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?;
        let observer = web_sys::MutationObserver::new(callbacks.observer.as_ref().unchecked_ref())?;
        let init = web_sys::MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer.observe_with_options(&body, &init)?;
        self.observer = Some(observer);

        self.document
            .add_event_listener_with_callback_and_bool("click", callbacks.click.as_ref().unchecked_ref(), true)?;
        for event in ["mouseover", "mouseout"] {
            self.document
                .add_event_listener_with_callback(event, callbacks.hover.as_ref().unchecked_ref())?;
        }
        self.window
            .add_event_listener_with_callback("pagehide", callbacks.pagehide.as_ref().unchecked_ref())?;
        chrome::add_message_listener(callbacks.message.as_ref().unchecked_ref());
        Ok(())
    }

    /// Keep exactly one timeout armed for the engine's next deadline.
    fn rearm(&mut self) {
        if let Some(handle) = self.timer.take() {
            self.window.clear_timeout_with_handle(handle);
        }

        let Some(deadline) = self.engine.next_deadline() else {
            return;
        };
        let Some(callbacks) = self.callbacks.as_ref() else {
            return;
        };

        let now = self.engine.clock().now_ms();
        let delay = deadline.saturating_sub(now).min(i32::MAX as u64) as i32;
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callbacks.timer.as_ref().unchecked_ref(), delay)
        {
            Ok(handle) => self.timer = Some(handle),
            Err(err) => log::error!("Could not arm filter timer: {err:?}"),
        }
    }

    fn on_timer(&mut self) {
        self.timer = None;
        self.engine.poll();
        self.rearm();
    }

    fn on_mutations(&mut self, records: &js_sys::Array) {
        let added = added_elements(records);
        if !added.is_empty() && self.engine.on_added_nodes(&added) {
            self.rearm();
        }
    }

    fn on_message(&mut self, message: JsValue) {
        let value: serde_json::Value = match serde_wasm_bindgen::from_value(message) {
            Ok(value) => value,
            Err(err) => {
                log::debug!("Ignoring non-JSON message: {err}");
                return;
            }
        };
        match self.engine.handle_message_value(&value) {
            Ok(_) => self.rearm(),
            Err(err) => log::debug!("Ignoring message: {err}"),
        }
    }

    fn on_click(&mut self, event: &web_sys::Event) {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<web_sys::Element>().ok()) else {
            return;
        };
        let Ok(Some(button)) = target.closest(BUTTON_SELECTOR) else {
            return;
        };
        let Ok(Some(card)) = button.closest(HIDDEN_CARD_SELECTOR) else {
            return;
        };
        if !card.has_attribute(HIDDEN_ATTR) {
            return;
        }

        event.stop_propagation();
        event.prevent_default();
        if self.engine.unblock_one(&WebElement(card)).is_ok() {
            self.rearm();
        }
    }

    fn on_hover(event: &web_sys::Event) {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<web_sys::Element>().ok()) else {
            return;
        };
        let Ok(Some(button)) = target.closest(BUTTON_SELECTOR) else {
            return;
        };
        let style = if event.type_() == "mouseover" { BUTTON_HOVER_STYLE } else { BUTTON_REST_STYLE };
        apply_style(&WebElement(button), style);
    }

    pub fn set_enabled(&mut self, enabled: bool) -> PassReport {
        let report = self.engine.set_enabled(enabled);
        self.rearm();
        report
    }

    /// Release the observer, the timer and every listener. Callback closures
    /// stay alive until the runtime itself is dropped, because teardown may be
    /// running inside one of them.
    pub fn teardown(&mut self) {
        if self.engine.is_torn_down() {
            return;
        }
        self.engine.teardown();

        if let Some(handle) = self.timer.take() {
            self.window.clear_timeout_with_handle(handle);
        }
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        if let Some(callbacks) = self.callbacks.as_ref() {
            let _ = self.document.remove_event_listener_with_callback_and_bool(
                "click",
                callbacks.click.as_ref().unchecked_ref(),
                true,
            );
            for event in ["mouseover", "mouseout"] {
                let _ = self
                    .document
                    .remove_event_listener_with_callback(event, callbacks.hover.as_ref().unchecked_ref());
            }
            let _ = self
                .window
                .remove_event_listener_with_callback("pagehide", callbacks.pagehide.as_ref().unchecked_ref());
            chrome::remove_message_listener(callbacks.message.as_ref().unchecked_ref());
        }
        log::info!("Job filter stopped");
    }
}

impl Callbacks {
    fn new(runtime: Weak<RefCell<Runtime>>) -> Self {
        let timer = {
            let runtime = runtime.clone();
            Closure::<dyn FnMut()>::new(move || {
                with_runtime(&runtime, Runtime::on_timer);
            })
        };

        let observer = {
            let runtime = runtime.clone();
            Closure::<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>::new(
                move |records: js_sys::Array, _observer: web_sys::MutationObserver| {
                    with_runtime(&runtime, |rt| rt.on_mutations(&records));
                },
            )
        };

        let message = {
            let runtime = runtime.clone();
            Closure::<dyn FnMut(JsValue, JsValue, JsValue)>::new(
                move |message: JsValue, _sender: JsValue, _send_response: JsValue| {
                    with_runtime(&runtime, |rt| rt.on_message(message.clone()));
                },
            )
        };

        let click = {
            let runtime = runtime.clone();
            Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
                with_runtime(&runtime, |rt| rt.on_click(&event));
            })
        };

        let hover = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            Runtime::on_hover(&event);
        });

        let pagehide = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            // A page entering the back/forward cache keeps its observer and
            // timers; it resumes as-is on restore.
            let cached = event
                .dyn_ref::<web_sys::PageTransitionEvent>()
                .is_some_and(|event| event.persisted());
            if cached {
                log::debug!("Page entering back/forward cache; keeping filter attached");
                return;
            }
            with_runtime(&runtime, Runtime::teardown);
        });

        Self { timer, observer, message, click, hover, pagehide }
    }
}

/// Run `f` against the runtime if it is still alive and not already borrowed.
fn with_runtime(runtime: &Weak<RefCell<Runtime>>, f: impl FnOnce(&mut Runtime)) {
    let Some(runtime) = runtime.upgrade() else {
        return;
    };
    match runtime.try_borrow_mut() {
        Ok(mut rt) => f(&mut rt),
        Err(_) => log::debug!("Filter runtime busy; skipping re-entrant callback"),
    };
}
