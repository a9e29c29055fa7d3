use map_switcher_shared::LoadInterceptor;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, HtmlScriptElement};

use crate::library;

/// Wrap `script`'s `onload` so `on_ready` receives the library entry point
/// before the host's own completion handler runs.
pub fn hook_loader(script: &HtmlScriptElement, on_ready: impl FnOnce(JsValue) + 'static) {
    tracing::debug!(src = %script.src(), "overriding loader onload");
    let previous = script.onload();
    let gate = LoadInterceptor::new();
    let mut on_ready = Some(on_ready);
    let this = script.clone();

    let onload = Closure::<dyn FnMut(Event) -> Result<(), JsValue>>::new(move |event: Event| {
        let mut host_result = Ok(());
        gate.complete(
            library::global_entry(),
            |entry| {
                if let Some(on_ready) = on_ready.take() {
                    on_ready(entry);
                }
            },
            || {
                if let Some(previous) = previous.as_ref() {
                    host_result = previous.call1(this.as_ref(), event.as_ref()).map(|_| ());
                }
            },
        );
        host_result
    });

    let onload = onload.into_js_value();
    script.set_onload(Some(onload.unchecked_ref()));
}
