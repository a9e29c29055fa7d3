//! Per-instance customization of the library's map class.
//!
//! [`SwitchedMap`] wraps a live map handle, forwarding every capability
//! unchanged except `set_options`, which re-injects the desired map-type
//! control whenever the host resets the map's chrome.

use std::cell::Cell;
use std::fmt::Debug;
use std::rc::Rc;

use crate::config::SwitcherConfig;
use crate::control::{ControlConfig, LibraryConstants, LiveControls};
use crate::enforce::TickOutcome;
use crate::error::SwitcherError;
use crate::page::{PathSource, is_enforced_page};
use crate::store::SettingStore;
use crate::tiles::{CUSTOM_LAYERS, TileLayerSpec};

/// Option keys the host sets when it resets the map's appearance.
pub const RESET_TRIGGER_KEYS: [&str; 2] = ["backgroundColor", "disableDefaultUI"];

/// The options object passed to the map's options-setter.
pub trait MapOptions {
    /// JavaScript truthiness of the value under `key`; absent is false.
    fn is_truthy(&self, key: &str) -> bool;
    /// Overwrite the map-type control fields with `config`. Fails when the
    /// object rejects the writes, e.g. when the host froze it.
    fn insert_controls(&mut self, config: &ControlConfig) -> Result<(), SwitcherError>;
}

/// The capability set of one live map instance.
pub trait MapHandle {
    type Options: MapOptions;
    type Error: Debug;

    /// Add `layer` to the instance's layer table, replacing any entry with
    /// the same id.
    fn register_layer(&self, layer: &TileLayerSpec) -> Result<(), Self::Error>;
    fn active_layer(&self) -> Option<String>;
    fn set_active_layer(&self, layer_id: &str) -> Result<(), Self::Error>;
    /// Call `listener` with the new active layer id on every change.
    fn on_active_layer_changed(
        &self,
        listener: Box<dyn Fn(Option<String>)>,
    ) -> Result<(), Self::Error>;
    fn live_controls(&self) -> LiveControls;
    /// Replace the whole map-type control configuration in one update.
    fn apply_controls(&self, config: &ControlConfig) -> Result<(), Self::Error>;
    fn set_options(&self, options: Self::Options) -> Result<(), Self::Error>;
    /// Whether the map's mount element is still part of the document.
    fn is_attached(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Constructed,
    Customizing,
    /// Layers registered, enforcement expected to run.
    Active,
    /// Constructed off an enforced page; left untouched.
    Skipped,
}

/// Shared customization context, built once when the library loads.
pub struct Switcher {
    config: SwitcherConfig,
    desired: ControlConfig,
    path: Box<dyn PathSource>,
    store: Rc<dyn SettingStore>,
}

impl Switcher {
    pub fn new(
        config: SwitcherConfig,
        constants: &LibraryConstants,
        path: impl PathSource + 'static,
        store: Rc<dyn SettingStore>,
    ) -> Self {
        Self {
            config,
            desired: ControlConfig::desired(constants),
            path: Box::new(path),
            store,
        }
    }

    pub fn config(&self) -> &SwitcherConfig {
        &self.config
    }

    pub fn desired(&self) -> &ControlConfig {
        &self.desired
    }

    pub fn is_enforced(&self) -> bool {
        is_enforced_page(&self.path.current_path(), &self.config)
    }

    /// Wrap a freshly constructed map. The original constructor must already
    /// have returned.
    pub fn attach<M: MapHandle>(self: &Rc<Self>, map: M) -> SwitchedMap<M> {
        let switched = self.wrap(map);
        if !self.is_enforced() {
            tracing::debug!("not an enforced page, skipping map customization");
            switched.state.set(InstanceState::Skipped);
            return switched;
        }

        switched.state.set(InstanceState::Customizing);
        for layer in &CUSTOM_LAYERS {
            match switched.inner.register_layer(layer) {
                Ok(()) => tracing::debug!(layer = layer.id, "registered tile layer"),
                Err(e) => tracing::warn!(layer = layer.id, error = ?e, "failed to register tile layer"),
            }
        }

        if let Some(saved) = self.store.load_layer() {
            tracing::debug!(layer = %saved, "restoring saved map layer");
            if let Err(e) = switched.inner.set_active_layer(&saved) {
                tracing::warn!(layer = %saved, error = ?e, "failed to restore saved map layer");
            }
        }

        let store = Rc::clone(&self.store);
        let listener = Box::new(move |layer: Option<String>| {
            let Some(layer) = layer else {
                return;
            };
            tracing::debug!(layer = %layer, "map layer changed");
            if let Err(e) = store.save_layer(&layer) {
                tracing::error!(error = %e, "failed to save map layer");
            }
        });
        if let Err(e) = switched.inner.on_active_layer_changed(listener) {
            tracing::warn!(error = ?e, "failed to watch map layer changes");
        }

        switched.state.set(InstanceState::Active);
        switched
    }

    /// Wrap a map without customizing it. Used to route a single call
    /// through the decorator when no long-lived wrapper is kept.
    pub fn wrap<M: MapHandle>(self: &Rc<Self>, map: M) -> SwitchedMap<M> {
        SwitchedMap {
            inner: map,
            switcher: Rc::clone(self),
            state: Cell::new(InstanceState::Constructed),
        }
    }

    /// One enforcement pass over `map`.
    pub fn reconcile<M: MapHandle>(&self, map: &M) -> TickOutcome {
        if self.config.release_detached_maps && !map.is_attached() {
            return TickOutcome::Detached;
        }
        if !self.is_enforced() {
            return TickOutcome::Skipped;
        }
        if self.desired.matches(&map.live_controls()) {
            return TickOutcome::InSync;
        }
        tracing::debug!("re-applying map-type control");
        match map.apply_controls(&self.desired) {
            Ok(()) => TickOutcome::Reapplied,
            Err(e) => {
                tracing::warn!(error = ?e, "failed to re-apply map-type control");
                TickOutcome::ApplyFailed
            }
        }
    }

    fn should_inject(&self, options: &impl MapOptions) -> bool {
        RESET_TRIGGER_KEYS.iter().any(|key| options.is_truthy(key)) && self.is_enforced()
    }
}

/// A map instance decorated with layer persistence and control enforcement.
pub struct SwitchedMap<M> {
    inner: M,
    switcher: Rc<Switcher>,
    state: Cell<InstanceState>,
}

impl<M: MapHandle> SwitchedMap<M> {
    pub fn state(&self) -> InstanceState {
        self.state.get()
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// One tick of this instance's enforcement loop.
    pub fn enforce(&self) -> TickOutcome {
        if self.state.get() != InstanceState::Active {
            return TickOutcome::Skipped;
        }
        self.switcher.reconcile(&self.inner)
    }
}

impl<M: MapHandle> MapHandle for SwitchedMap<M> {
    type Options = M::Options;
    type Error = M::Error;

    fn register_layer(&self, layer: &TileLayerSpec) -> Result<(), Self::Error> {
        self.inner.register_layer(layer)
    }

    fn active_layer(&self) -> Option<String> {
        self.inner.active_layer()
    }

    fn set_active_layer(&self, layer_id: &str) -> Result<(), Self::Error> {
        self.inner.set_active_layer(layer_id)
    }

    fn on_active_layer_changed(
        &self,
        listener: Box<dyn Fn(Option<String>)>,
    ) -> Result<(), Self::Error> {
        self.inner.on_active_layer_changed(listener)
    }

    fn live_controls(&self) -> LiveControls {
        self.inner.live_controls()
    }

    fn apply_controls(&self, config: &ControlConfig) -> Result<(), Self::Error> {
        self.inner.apply_controls(config)
    }

    /// Checked on every call, so instances built off an enforced page pick
    /// up enforcement after the host navigates into one.
    fn set_options(&self, mut options: Self::Options) -> Result<(), Self::Error> {
        if self.switcher.should_inject(&options) {
            tracing::debug!("enforcing map-type control in setOptions");
            if let Err(e) = options.insert_controls(&self.switcher.desired) {
                tracing::warn!(error = %e, "could not inject map-type control, forwarding host options");
            }
        }
        self.inner.set_options(options)
    }

    fn is_attached(&self) -> bool {
        self.inner.is_attached()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::LiveControlOptions;
    use crate::store::MemoryStore;
    use serde_json::{Value, json};
    use std::cell::RefCell;

    type Options = serde_json::Map<String, Value>;
    type Listener = Box<dyn Fn(Option<String>)>;

    impl MapOptions for Options {
        fn is_truthy(&self, key: &str) -> bool {
            match self.get(key) {
                None | Some(Value::Null) => false,
                Some(Value::Bool(flag)) => *flag,
                Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
                Some(Value::String(s)) => !s.is_empty(),
                Some(Value::Array(_)) | Some(Value::Object(_)) => true,
            }
        }

        fn insert_controls(&mut self, config: &ControlConfig) -> Result<(), SwitcherError> {
            let options = serde_json::to_value(&config.options)
                .map_err(|e| SwitcherError::Interop(e.to_string()))?;
            self.insert("mapTypeControl".into(), Value::Bool(config.enabled));
            self.insert("mapTypeControlOptions".into(), options);
            Ok(())
        }
    }

    /// Options object that rejects every write, like a frozen JS object.
    #[derive(Debug, Clone, PartialEq)]
    struct FrozenOptions(Options);

    impl MapOptions for FrozenOptions {
        fn is_truthy(&self, key: &str) -> bool {
            self.0.is_truthy(key)
        }

        fn insert_controls(&mut self, _config: &ControlConfig) -> Result<(), SwitcherError> {
            Err(SwitcherError::Interop("object is frozen".into()))
        }
    }

    #[derive(Default)]
    struct FrozenOptionsMap {
        calls: RefCell<Vec<FrozenOptions>>,
    }

    impl MapHandle for FrozenOptionsMap {
        type Options = FrozenOptions;
        type Error = String;

        fn register_layer(&self, _layer: &TileLayerSpec) -> Result<(), String> {
            Ok(())
        }

        fn active_layer(&self) -> Option<String> {
            None
        }

        fn set_active_layer(&self, _layer_id: &str) -> Result<(), String> {
            Ok(())
        }

        fn on_active_layer_changed(&self, _listener: Listener) -> Result<(), String> {
            Ok(())
        }

        fn live_controls(&self) -> LiveControls {
            LiveControls::default()
        }

        fn apply_controls(&self, _config: &ControlConfig) -> Result<(), String> {
            Err("object is frozen".into())
        }

        fn set_options(&self, options: FrozenOptions) -> Result<(), String> {
            self.calls.borrow_mut().push(options);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockMap {
        layers: RefCell<Vec<TileLayerSpec>>,
        active: RefCell<Option<String>>,
        listeners: RefCell<Vec<Listener>>,
        controls: RefCell<LiveControls>,
        apply_calls: Cell<usize>,
        fail_apply: Cell<bool>,
        set_options_calls: RefCell<Vec<Options>>,
        detached: Cell<bool>,
    }

    impl MapHandle for MockMap {
        type Options = Options;
        type Error = String;

        fn register_layer(&self, layer: &TileLayerSpec) -> Result<(), String> {
            let mut layers = self.layers.borrow_mut();
            layers.retain(|existing| existing.id != layer.id);
            layers.push(*layer);
            Ok(())
        }

        fn active_layer(&self) -> Option<String> {
            self.active.borrow().clone()
        }

        fn set_active_layer(&self, layer_id: &str) -> Result<(), String> {
            if self.active.borrow().as_deref() == Some(layer_id) {
                return Ok(());
            }
            *self.active.borrow_mut() = Some(layer_id.to_string());
            for listener in self.listeners.borrow().iter() {
                listener(Some(layer_id.to_string()));
            }
            Ok(())
        }

        fn on_active_layer_changed(&self, listener: Listener) -> Result<(), String> {
            self.listeners.borrow_mut().push(listener);
            Ok(())
        }

        fn live_controls(&self) -> LiveControls {
            self.controls.borrow().clone()
        }

        fn apply_controls(&self, config: &ControlConfig) -> Result<(), String> {
            self.apply_calls.set(self.apply_calls.get() + 1);
            if self.fail_apply.get() {
                return Err("setOptions threw".into());
            }
            *self.controls.borrow_mut() = LiveControls::from(config);
            Ok(())
        }

        fn set_options(&self, options: Options) -> Result<(), String> {
            self.set_options_calls.borrow_mut().push(options);
            Ok(())
        }

        fn is_attached(&self) -> bool {
            !self.detached.get()
        }
    }

    fn switcher_at(
        path: &'static str,
        store: Rc<MemoryStore>,
        config: SwitcherConfig,
    ) -> Rc<Switcher> {
        Rc::new(Switcher::new(
            config,
            &LibraryConstants::default(),
            move || path.to_string(),
            store,
        ))
    }

    fn options(value: Value) -> Options {
        match value {
            Value::Object(map) => map,
            _ => Options::new(),
        }
    }

    #[test]
    fn non_enforced_page_leaves_instance_untouched() {
        let store = Rc::new(MemoryStore::with_layer("osm"));
        let switcher = switcher_at("/maps/famous-places", store.clone(), SwitcherConfig::default());
        let map = switcher.attach(MockMap::default());

        assert_eq!(map.state(), InstanceState::Skipped);
        assert!(map.inner().layers.borrow().is_empty());
        assert!(map.inner().listeners.borrow().is_empty());
        assert_eq!(map.inner().active_layer(), None);
        assert_eq!(map.enforce(), TickOutcome::Skipped);
        assert_eq!(map.inner().apply_calls.get(), 0);
    }

    #[test]
    fn enforced_page_registers_both_layers_in_order() {
        let store = Rc::new(MemoryStore::default());
        let switcher = switcher_at("/game/abc", store, SwitcherConfig::default());
        let map = switcher.attach(MockMap::default());

        assert_eq!(map.state(), InstanceState::Active);
        let ids: Vec<_> = map.inner().layers.borrow().iter().map(|l| l.id).collect();
        assert_eq!(ids, ["opentopomap", "osm"]);
    }

    #[test]
    fn saved_layer_is_active_right_after_construction() {
        let store = Rc::new(MemoryStore::with_layer("opentopomap"));
        let switcher = switcher_at("/fr/results/abc", store, SwitcherConfig::default());
        let map = switcher.attach(MockMap::default());

        assert_eq!(map.active_layer().as_deref(), Some("opentopomap"));
    }

    #[test]
    fn layer_change_persists_exactly_once() {
        let store = Rc::new(MemoryStore::default());
        let switcher = switcher_at("/game/abc", store.clone(), SwitcherConfig::default());
        let map = switcher.attach(MockMap::default());

        map.set_active_layer("osm").expect("mock never fails");
        assert_eq!(store.writes(), ["osm"]);
    }

    #[test]
    fn one_tick_restores_drifted_controls() {
        let store = Rc::new(MemoryStore::default());
        let switcher = switcher_at("/game/abc", store, SwitcherConfig::default());
        let map = switcher.attach(MockMap::default());
        *map.inner().controls.borrow_mut() = LiveControls {
            enabled: true,
            options: Some(LiveControlOptions {
                map_type_ids: Some(vec!["roadmap".into(), "satellite".into()]),
                style: Some(1),
                position: Some(3),
            }),
        };

        assert_eq!(map.enforce(), TickOutcome::Reapplied);
        assert!(switcher.desired().matches(&map.live_controls()));
        assert_eq!(map.enforce(), TickOutcome::InSync);
        assert_eq!(map.inner().apply_calls.get(), 1);
    }

    #[test]
    fn tick_is_skipped_after_leaving_enforced_page() {
        let path = Rc::new(RefCell::new("/game/abc".to_string()));
        let source = {
            let path = path.clone();
            move || path.borrow().clone()
        };
        let switcher = Rc::new(Switcher::new(
            SwitcherConfig::default(),
            &LibraryConstants::default(),
            source,
            Rc::new(MemoryStore::default()),
        ));
        let map = switcher.attach(MockMap::default());

        *path.borrow_mut() = "/me/profile".to_string();
        assert_eq!(map.enforce(), TickOutcome::Skipped);
        assert_eq!(map.inner().apply_calls.get(), 0);

        *path.borrow_mut() = "/game/next".to_string();
        assert_eq!(map.enforce(), TickOutcome::Reapplied);
    }

    #[test]
    fn detached_map_reports_detached_only_when_release_is_enabled() {
        let config = SwitcherConfig {
            release_detached_maps: true,
            ..SwitcherConfig::default()
        };
        let switcher = switcher_at("/game/abc", Rc::new(MemoryStore::default()), config);
        let map = switcher.attach(MockMap::default());
        map.inner().detached.set(true);
        assert_eq!(map.enforce(), TickOutcome::Detached);

        let switcher = switcher_at(
            "/game/abc",
            Rc::new(MemoryStore::default()),
            SwitcherConfig::default(),
        );
        let map = switcher.attach(MockMap::default());
        map.inner().detached.set(true);
        assert_eq!(map.enforce(), TickOutcome::Reapplied);
    }

    #[test]
    fn background_color_call_forwards_desired_controls() {
        let switcher = switcher_at(
            "/game/abc",
            Rc::new(MemoryStore::default()),
            SwitcherConfig::default(),
        );
        let map = switcher.attach(MockMap::default());

        map.set_options(options(json!({
            "backgroundColor": "#aadaff",
            "mapTypeControl": false,
            "mapTypeControlOptions": { "mapTypeIds": ["roadmap"], "position": 7 },
        })))
        .expect("mock never fails");

        let calls = map.inner().set_options_calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["mapTypeControl"], json!(true));
        assert_eq!(
            calls[0]["mapTypeControlOptions"],
            serde_json::to_value(&switcher.desired().options).expect("serializable")
        );
        assert_eq!(calls[0]["backgroundColor"], json!("#aadaff"));
    }

    #[test]
    fn disable_default_ui_also_triggers_injection() {
        let switcher = switcher_at(
            "/results/abc",
            Rc::new(MemoryStore::default()),
            SwitcherConfig::default(),
        );
        let map = switcher.attach(MockMap::default());
        map.set_options(options(json!({ "disableDefaultUI": true })))
            .expect("mock never fails");
        assert_eq!(
            map.inner().set_options_calls.borrow()[0]["mapTypeControl"],
            json!(true)
        );
    }

    #[test]
    fn unrelated_or_falsy_options_pass_through_unchanged() {
        let switcher = switcher_at(
            "/game/abc",
            Rc::new(MemoryStore::default()),
            SwitcherConfig::default(),
        );
        let map = switcher.attach(MockMap::default());
        let zoom_only = options(json!({ "zoom": 3 }));
        let falsy = options(json!({ "backgroundColor": "", "disableDefaultUI": false }));

        map.set_options(zoom_only.clone()).expect("mock never fails");
        map.set_options(falsy.clone()).expect("mock never fails");

        let calls = map.inner().set_options_calls.borrow();
        assert_eq!(calls[0], zoom_only);
        assert_eq!(calls[1], falsy);
    }

    #[test]
    fn setter_forwards_unchanged_off_enforced_pages() {
        let switcher = switcher_at(
            "/",
            Rc::new(MemoryStore::default()),
            SwitcherConfig::default(),
        );
        let map = switcher.attach(MockMap::default());
        let call = options(json!({ "backgroundColor": "#000" }));
        map.set_options(call.clone()).expect("mock never fails");
        assert_eq!(map.inner().set_options_calls.borrow()[0], call);
    }

    #[test]
    fn json_truthiness_follows_javascript() {
        let opts = options(json!({
            "zero": 0,
            "nan_like": null,
            "one": 1,
            "empty": "",
            "text": "x",
            "list": [],
            "flag": false,
        }));
        assert!(!opts.is_truthy("zero"));
        assert!(!opts.is_truthy("nan_like"));
        assert!(opts.is_truthy("one"));
        assert!(!opts.is_truthy("empty"));
        assert!(opts.is_truthy("text"));
        assert!(opts.is_truthy("list"));
        assert!(!opts.is_truthy("flag"));
        assert!(!opts.is_truthy("missing"));
    }

    #[test]
    fn failed_reapply_is_reported_separately() {
        let switcher = switcher_at(
            "/game/abc",
            Rc::new(MemoryStore::default()),
            SwitcherConfig::default(),
        );
        let map = switcher.attach(MockMap::default());
        map.inner().fail_apply.set(true);

        assert_eq!(map.enforce(), TickOutcome::ApplyFailed);
        assert!(!switcher.desired().matches(&map.live_controls()));

        map.inner().fail_apply.set(false);
        assert_eq!(map.enforce(), TickOutcome::Reapplied);
    }

    #[test]
    fn rejected_injection_still_forwards_host_options_once() {
        let switcher = switcher_at(
            "/game/abc",
            Rc::new(MemoryStore::default()),
            SwitcherConfig::default(),
        );
        let map = switcher.attach(FrozenOptionsMap::default());
        let call = FrozenOptions(options(json!({
            "backgroundColor": "#aadaff",
            "mapTypeControl": false,
        })));

        map.set_options(call.clone()).expect("setter accepts the call");

        let calls = map.inner().calls.borrow();
        assert_eq!(*calls, [call]);
        assert_eq!(calls[0].0["mapTypeControl"], json!(false));
    }

    #[test]
    fn wrapped_map_injects_without_being_customized() {
        let switcher = switcher_at(
            "/game/abc",
            Rc::new(MemoryStore::default()),
            SwitcherConfig::default(),
        );
        let map = switcher.wrap(MockMap::default());
        assert_eq!(map.state(), InstanceState::Constructed);
        assert!(map.inner().layers.borrow().is_empty());
        assert_eq!(map.enforce(), TickOutcome::Skipped);

        map.set_options(options(json!({ "disableDefaultUI": true })))
            .expect("mock never fails");
        assert_eq!(
            map.inner().set_options_calls.borrow()[0]["mapTypeControl"],
            json!(true)
        );
    }
}
