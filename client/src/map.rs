use std::rc::Rc;

use js_sys::{Array, Function, Object};
use map_switcher_shared::{
    ControlConfig, LiveControlOptions, LiveControls, MapHandle, MapOptions, SwitcherError,
    TileLayerSpec,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::library::{MapsLibrary, get, receiver_method, set};

const LAYER_CHANGED_EVENT: &str = "maptypeid_changed";

/// The options object a host passes to `setOptions`, mutated in place.
pub struct JsOptions(pub JsValue);

impl MapOptions for JsOptions {
    fn is_truthy(&self, key: &str) -> bool {
        self.0.is_object() && get(&self.0, key).is_ok_and(|value| value.is_truthy())
    }

    fn insert_controls(&mut self, config: &ControlConfig) -> Result<(), SwitcherError> {
        if !self.0.is_object() {
            self.0 = Object::new().into();
        }
        let options = serde_wasm_bindgen::to_value(&config.options)
            .map_err(|e| SwitcherError::Interop(format!("encoding map-type control options: {e}")))?;
        let write = |key: &str, value: &JsValue| {
            set(&self.0, key, value)
                .map_err(|e| SwitcherError::Interop(format!("writing {key}: {e:?}")))
        };
        write("mapTypeControl", &JsValue::from_bool(config.enabled))?;
        write("mapTypeControlOptions", &options)
    }
}

/// A constructed `google.maps.Map` instance.
///
/// Only the enforcement loop keeps one of these alive past a single call.
/// Callbacks handed to the library get the instance as their receiver.
pub struct JsMap {
    instance: JsValue,
    mount: JsValue,
    library: Rc<MapsLibrary>,
    /// The prototype's setter, captured before the instance override lands.
    original_set_options: Function,
}

impl JsMap {
    pub fn new(instance: JsValue, mount: JsValue, library: Rc<MapsLibrary>) -> Result<Self, JsValue> {
        let original_set_options = get(&instance, "setOptions")?.dyn_into::<Function>()?;
        Ok(Self::with_setter(instance, mount, library, original_set_options))
    }

    pub fn with_setter(
        instance: JsValue,
        mount: JsValue,
        library: Rc<MapsLibrary>,
        original_set_options: Function,
    ) -> Self {
        Self {
            instance,
            mount,
            library,
            original_set_options,
        }
    }

    pub fn instance(&self) -> &JsValue {
        &self.instance
    }

    pub fn original_set_options(&self) -> &Function {
        &self.original_set_options
    }

    fn call(&self, method: &str, args: &Array) -> Result<JsValue, JsValue> {
        call_method(&self.instance, method, args)
    }
}

fn call_method(target: &JsValue, method: &str, args: &Array) -> Result<JsValue, JsValue> {
    get(target, method)?
        .dyn_into::<Function>()?
        .apply(target, args)
}

fn map_type_id(instance: &JsValue) -> Option<String> {
    call_method(instance, "getMapTypeId", &Array::new())
        .ok()?
        .as_string()
}

impl MapHandle for JsMap {
    type Options = JsOptions;
    type Error = JsValue;

    fn register_layer(&self, layer: &TileLayerSpec) -> Result<(), JsValue> {
        let map_type = self.library.image_map_type(layer)?;
        let registry = get(&self.instance, "mapTypes")?;
        call_method(
            &registry,
            "set",
            &Array::of2(&JsValue::from_str(layer.id), &map_type),
        )
        .map(|_| ())
    }

    fn active_layer(&self) -> Option<String> {
        map_type_id(&self.instance)
    }

    fn set_active_layer(&self, layer_id: &str) -> Result<(), JsValue> {
        self.call("setMapTypeId", &Array::of1(&JsValue::from_str(layer_id)))
            .map(|_| ())
    }

    fn on_active_layer_changed(
        &self,
        listener: Box<dyn Fn(Option<String>)>,
    ) -> Result<(), JsValue> {
        // The library invokes listeners with the map as `this`.
        let handler = Closure::<dyn Fn(JsValue)>::new(move |this: JsValue| {
            listener(map_type_id(&this))
        });
        let handler = receiver_method(&handler.into_js_value());
        self.call(
            "addListener",
            &Array::of2(&JsValue::from_str(LAYER_CHANGED_EVENT), &handler),
        )
        .map(|_| ())
    }

    fn live_controls(&self) -> LiveControls {
        let read = |key: &str| {
            self.call("get", &Array::of1(&JsValue::from_str(key)))
                .unwrap_or(JsValue::UNDEFINED)
        };
        let enabled = read("mapTypeControl").is_truthy();
        let raw_options = read("mapTypeControlOptions");
        let options = if raw_options.is_undefined() || raw_options.is_null() {
            None
        } else {
            // Unreadable options count as drifted, not as absent.
            Some(serde_wasm_bindgen::from_value::<LiveControlOptions>(raw_options).unwrap_or_default())
        };
        LiveControls { enabled, options }
    }

    fn apply_controls(&self, config: &ControlConfig) -> Result<(), JsValue> {
        let mut options = JsOptions(Object::new().into());
        options
            .insert_controls(config)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.set_options(options)
    }

    fn set_options(&self, options: JsOptions) -> Result<(), JsValue> {
        self.original_set_options
            .call1(&self.instance, &options.0)
            .map(|_| ())
    }

    fn is_attached(&self) -> bool {
        self.mount
            .dyn_ref::<web_sys::Node>()
            .is_none_or(web_sys::Node::is_connected)
    }
}
