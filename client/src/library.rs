use js_sys::{Array, Function, Object, Reflect};
use map_switcher_shared::{LibraryConstants, SwitcherError, TileLayerSpec};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

const ENTRY_GLOBAL: &str = "google";

#[wasm_bindgen(inline_js = "export function receiverMethod(f) { return function (...args) { return f(this, ...args); }; }")]
extern "C" {
    /// Wrap `f` so it is called with the method receiver as its first
    /// argument. Lets a shared closure serve any number of instances
    /// without holding a reference to any of them.
    #[wasm_bindgen(js_name = receiverMethod)]
    pub(crate) fn receiver_method(f: &JsValue) -> Function;
}

pub(crate) fn get(target: &JsValue, key: &str) -> Result<JsValue, JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
}

/// Property write that fails when the target rejects it (frozen or
/// non-writable), not only when it throws.
pub(crate) fn set(target: &JsValue, key: &str, value: &JsValue) -> Result<(), JsValue> {
    let written = Reflect::set(target, &JsValue::from_str(key), value)?;
    check_write(key, written).map_err(|e| JsValue::from_str(&e))
}

fn check_write(key: &str, written: bool) -> Result<(), String> {
    if written {
        Ok(())
    } else {
        Err(format!("property {key} is not writable"))
    }
}

fn is_present(value: &JsValue) -> bool {
    !value.is_undefined() && !value.is_null()
}

/// The library's global entry point, once it exposes its `maps` namespace.
pub fn global_entry() -> Option<JsValue> {
    let window = web_sys::window()?;
    let entry = get(window.as_ref(), ENTRY_GLOBAL).ok()?;
    let maps = get(&entry, "maps").ok()?;
    (is_present(&entry) && is_present(&maps)).then_some(entry)
}

/// Read-only view of `google.maps`, except for [`MapsLibrary::replace`].
pub struct MapsLibrary {
    maps: JsValue,
}

impl MapsLibrary {
    pub fn from_entry(entry: &JsValue) -> Result<Self, SwitcherError> {
        let maps = get(entry, "maps").map_err(interop("reading maps namespace"))?;
        if !is_present(&maps) {
            return Err(SwitcherError::Interop("maps namespace missing".into()));
        }
        Ok(Self { maps })
    }

    pub fn constructor(&self, name: &str) -> Result<Function, SwitcherError> {
        get(&self.maps, name)
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
            .ok_or_else(|| SwitcherError::Interop(format!("{name} is not a constructor")))
    }

    /// Swap an exported member of the namespace.
    pub fn replace(&self, name: &str, value: &JsValue) -> Result<(), SwitcherError> {
        set(&self.maps, name, value).map_err(interop("replacing map constructor"))
    }

    /// Enumerated values read from the live library, with fallbacks for any
    /// member it does not expose.
    pub fn constants(&self) -> LibraryConstants {
        let defaults = LibraryConstants::default();
        LibraryConstants {
            roadmap: self.enum_str("MapTypeId", "ROADMAP").unwrap_or(defaults.roadmap),
            terrain: self.enum_str("MapTypeId", "TERRAIN").unwrap_or(defaults.terrain),
            satellite: self
                .enum_str("MapTypeId", "SATELLITE")
                .unwrap_or(defaults.satellite),
            hybrid: self.enum_str("MapTypeId", "HYBRID").unwrap_or(defaults.hybrid),
            horizontal_bar: self
                .enum_i32("MapTypeControlStyle", "HORIZONTAL_BAR")
                .unwrap_or(defaults.horizontal_bar),
            top_right: self
                .enum_i32("ControlPosition", "TOP_RIGHT")
                .unwrap_or(defaults.top_right),
        }
    }

    fn enum_member(&self, group: &str, member: &str) -> Option<JsValue> {
        let group = get(&self.maps, group).ok().filter(is_present)?;
        get(&group, member).ok()
    }

    fn enum_str(&self, group: &str, member: &str) -> Option<String> {
        self.enum_member(group, member)?.as_string()
    }

    fn enum_i32(&self, group: &str, member: &str) -> Option<i32> {
        self.enum_member(group, member)?
            .as_f64()
            .map(|value| value as i32)
    }

    /// `new google.maps.ImageMapType(...)` serving `layer`'s templated tiles.
    pub fn image_map_type(&self, layer: &TileLayerSpec) -> Result<JsValue, JsValue> {
        let layer = *layer;
        let tile_url = Closure::<dyn Fn(JsValue, f64) -> String>::new(
            move |coord: JsValue, zoom: f64| {
                let axis = |key: &str| {
                    get(&coord, key)
                        .ok()
                        .and_then(|value| value.as_f64())
                        .unwrap_or(0.0) as i64
                };
                layer.tile_url(zoom.max(0.0) as u32, axis("x"), axis("y"))
            },
        );

        let size = self.construct(
            "Size",
            &Array::of2(
                &JsValue::from(layer.tile_size),
                &JsValue::from(layer.tile_size),
            ),
        )?;
        let options = Object::new();
        set(&options, "getTileUrl", &tile_url.into_js_value())?;
        set(&options, "tileSize", &size)?;
        set(&options, "name", &JsValue::from_str(layer.name))?;
        set(&options, "maxZoom", &JsValue::from(layer.max_zoom))?;

        self.construct("ImageMapType", &Array::of1(&options))
    }

    fn construct(&self, name: &str, args: &Array) -> Result<JsValue, JsValue> {
        let ctor = self
            .constructor(name)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Reflect::construct(&ctor, args)
    }
}

fn interop(context: &'static str) -> impl Fn(JsValue) -> SwitcherError {
    move |e| SwitcherError::Interop(format!("{context}: {e:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_write_is_an_error() {
        assert_eq!(check_write("Map", true), Ok(()));
        let err = check_write("Map", false).unwrap_err();
        assert!(err.contains("Map"));
    }
}
