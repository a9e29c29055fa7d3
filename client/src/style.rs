use wasm_bindgen::JsCast;

/// Keeps the map-type control visible even where the host hides it with CSS.
const CONTROL_CSS: &str = "
.gm-style-mtc {
    display: block !important;
    z-index: 999999 !important;
}
";

pub fn inject_control_css() {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    let Ok(style) = document.create_element("style") else {
        return;
    };
    style.set_text_content(Some(CONTROL_CSS));

    // At document start `<head>` may not exist yet.
    let parent = document
        .head()
        .map(|head| head.unchecked_into::<web_sys::Element>())
        .or_else(|| document.document_element());
    let Some(parent) = parent else {
        return;
    };
    if parent.append_child(&style).is_err() {
        tracing::warn!("failed to inject map control stylesheet");
    }
}
