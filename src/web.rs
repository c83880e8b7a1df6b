//! Page bindings for the browser build: the canvas, the label input and the loading overlay.
//!
//! The page is expected to carry `#canvas`, a `#user-input` text field with a
//! `#submit-button`, and a `#loading` overlay containing `#loading-progress`. Missing
//! elements are logged and skipped.

use wasm_bindgen::{JsCast, prelude::*};
use web_sys::{Document, HtmlCanvasElement, HtmlElement, HtmlInputElement, KeyboardEvent};
use winit::event_loop::EventLoopProxy;

use crate::flow::FlowEvent;

const CANVAS_ID: &str = "canvas";
const INPUT_ID: &str = "user-input";
const SUBMIT_ID: &str = "submit-button";
const LOADING_ID: &str = "loading";
const PROGRESS_ID: &str = "loading-progress";

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn element<T: JsCast>(id: &str) -> Option<T> {
    let element = document()?.get_element_by_id(id);
    if element.is_none() {
        log::warn!("page has no #{} element", id);
    }
    element?.dyn_into::<T>().ok()
}

pub(crate) fn canvas() -> Option<HtmlCanvasElement> {
    element(CANVAS_ID)
}

/// Sends the input's value as label text on a button click or on Enter.
pub(crate) fn bind_label_input(proxy: EventLoopProxy<FlowEvent>) {
    let Some(input) = element::<HtmlInputElement>(INPUT_ID) else {
        return;
    };

    let submit = {
        let input = input.clone();
        move || {
            if proxy.send_event(FlowEvent::Text(input.value())).is_err() {
                log::warn!("event loop closed, dropping label text");
            }
        }
    };

    if let Some(button) = element::<HtmlElement>(SUBMIT_ID) {
        let submit = submit.clone();
        let on_click = Closure::<dyn FnMut()>::new(move || submit());
        button.set_onclick(Some(on_click.as_ref().unchecked_ref()));
        // The page owns the handler from here on
        on_click.forget();
    }

    let on_key = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
        if event.key() == "Enter" {
            submit();
        }
    });
    input.set_onkeydown(Some(on_key.as_ref().unchecked_ref()));
    on_key.forget();
}

/// Writes the texture progress into the loading overlay.
pub(crate) fn show_progress(percentage: f32) {
    if let Some(progress) = element::<HtmlElement>(PROGRESS_ID) {
        progress.set_inner_text(&format!("{:.0}%", percentage));
    }
}

pub(crate) fn hide_loading() {
    if let Some(loading) = element::<HtmlElement>(LOADING_ID) {
        if loading.style().set_property("display", "none").is_err() {
            log::warn!("cannot hide the loading overlay");
        }
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    crate::flow::run(crate::config::SceneConfig::default())
        .map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
