#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

mod enforce;
mod intercept;
mod library;
mod logging;
mod map;
mod overrider;
mod settings;
mod storage;
mod style;
mod watcher;

fn main() {
    console_error_panic_hook::set_once();
    let loaded = settings::load_config();
    let config = loaded.clone().unwrap_or_default();
    logging::init(config.debug_output);
    if let Err(e) = loaded {
        tracing::warn!(error = %e, "falling back to default config");
    }
    tracing::debug!("script started");

    style::inject_control_css();
    enforce::expose_teardown();

    // Registered now, before the page parses any further.
    let loader = watcher::watch_loader(&config.loader_src_prefix);
    wasm_bindgen_futures::spawn_local(async move {
        let Some(script) = loader.await else {
            return;
        };
        intercept::hook_loader(&script, move |entry| {
            if let Err(e) = overrider::install(&entry, config) {
                tracing::error!(error = %e, "map customization abandoned");
            }
        });
    });
}
