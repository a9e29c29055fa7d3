use std::rc::Rc;

use js_sys::{Array, Function, Object, Proxy, Reflect};
use map_switcher_shared::{InstanceState, MapHandle, Switcher, SwitcherConfig, SwitcherError};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::enforce;
use crate::library::{MapsLibrary, receiver_method, set};
use crate::map::{JsMap, JsOptions};
use crate::storage;

const MAP_CONSTRUCTOR: &str = "Map";

fn current_path() -> String {
    web_sys::window()
        .and_then(|window| window.location().pathname().ok())
        .unwrap_or_default()
}

/// Replace `google.maps.Map` with a proxy whose `construct` trap customizes
/// every new instance.
///
/// The proxy keeps the original's prototype and statics, so `instanceof`
/// and host subclasses keep working.
pub fn install(entry: &JsValue, config: SwitcherConfig) -> Result<(), SwitcherError> {
    let library = Rc::new(MapsLibrary::from_entry(entry)?);
    let original = library.constructor(MAP_CONSTRUCTOR)?;
    let store = storage::layer_store(&config.storage_key);
    let switcher = Rc::new(Switcher::new(
        config,
        &library.constants(),
        current_path,
        store,
    ));

    let trap_library = Rc::clone(&library);
    let construct = Closure::<dyn Fn(Function, Array, JsValue) -> Result<JsValue, JsValue>>::new(
        move |target: Function, args: Array, new_target: JsValue| {
            // The host sees the original constructor's own failures unchanged.
            let instance = Reflect::construct_with_new_target(&target, &args, new_target.unchecked_ref())?;
            tracing::debug!("map constructed");
            customize(&switcher, &trap_library, &instance, args.get(0));
            Ok(instance)
        },
    );

    let handler = Object::new();
    set(&handler, "construct", &construct.into_js_value())
        .map_err(|e| SwitcherError::Interop(format!("building constructor proxy: {e:?}")))?;
    let proxy = Proxy::new(&original, &handler);
    library.replace(MAP_CONSTRUCTOR, &proxy)?;
    tracing::debug!("map constructor overridden");
    Ok(())
}

/// Customization never fails the host's construction; each failure is logged
/// and the instance is returned as the original built it.
fn customize(switcher: &Rc<Switcher>, library: &Rc<MapsLibrary>, instance: &JsValue, mount: JsValue) {
    let map = match JsMap::new(instance.clone(), mount, Rc::clone(library)) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(error = ?e, "map instance has no setOptions, leaving it unmodified");
            return;
        }
    };
    let switched = switcher.attach(map);

    if let Err(e) = override_set_options(switcher, library, switched.inner()) {
        tracing::warn!(error = ?e, "failed to override setOptions");
    }
    if switched.state() == InstanceState::Active {
        let config = switcher.config();
        enforce::start(
            switched,
            config.enforce_interval_ms,
            config.max_enforcement_loops,
        );
    }
}

/// Shadow the prototype's `setOptions` with one routed through the decorator.
///
/// The replacement reaches the instance through its receiver, so the
/// instance's own property never references the instance.
fn override_set_options(
    switcher: &Rc<Switcher>,
    library: &Rc<MapsLibrary>,
    map: &JsMap,
) -> Result<(), JsValue> {
    let switcher = Rc::clone(switcher);
    let library = Rc::clone(library);
    let original = map.original_set_options().clone();
    let set_options = Closure::<dyn Fn(JsValue, JsValue) -> Result<JsValue, JsValue>>::new(
        move |this: JsValue, options: JsValue| {
            let map = JsMap::with_setter(this, JsValue::UNDEFINED, Rc::clone(&library), original.clone());
            switcher.wrap(map).set_options(JsOptions(options))?;
            Ok(JsValue::UNDEFINED)
        },
    );
    let set_options = receiver_method(&set_options.into_js_value());
    set(map.instance(), "setOptions", &set_options)
}
