use js_sys::Reflect;
use map_switcher_shared::SwitcherConfig;
use wasm_bindgen::JsValue;

/// Optional page global overriding config fields, e.g.
/// `window.mapSwitcherConfig = { debugOutput: true }`.
const CONFIG_GLOBAL: &str = "mapSwitcherConfig";

/// Read the startup config. Absent config yields the defaults; an unreadable
/// one is reported so the caller can log it once logging is up.
pub fn load_config() -> Result<SwitcherConfig, String> {
    let Some(window) = web_sys::window() else {
        return Ok(SwitcherConfig::default());
    };
    let raw = Reflect::get(window.as_ref(), &JsValue::from_str(CONFIG_GLOBAL))
        .unwrap_or(JsValue::UNDEFINED);
    if raw.is_undefined() || raw.is_null() {
        return Ok(SwitcherConfig::default());
    }
    serde_wasm_bindgen::from_value::<SwitcherConfig>(raw)
        .map(SwitcherConfig::normalized)
        .map_err(|e| format!("invalid {CONFIG_GLOBAL}: {e}"))
}
