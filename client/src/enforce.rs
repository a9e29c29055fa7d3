use std::cell::RefCell;

use gloo_timers::callback::{Interval, Timeout};
use map_switcher_shared::{LoopId, LoopRegistry, MapHandle, SwitchedMap, TickOutcome};
use wasm_bindgen::prelude::*;

use crate::library::set;

/// Page global that stops every running enforcement loop.
const TEARDOWN_GLOBAL: &str = "mapSwitcherStopEnforcement";

thread_local! {
    static ENFORCEMENT_LOOPS: RefCell<Option<LoopRegistry<Interval>>> = const { RefCell::new(None) };
}

fn with_registry<R>(cap: usize, f: impl FnOnce(&mut LoopRegistry<Interval>) -> R) -> R {
    ENFORCEMENT_LOOPS.with(|slot| {
        let mut slot = slot.borrow_mut();
        f(slot.get_or_insert_with(|| LoopRegistry::new(cap)))
    })
}

/// Run `map`'s enforcement tick every `interval_ms` until cancelled.
///
/// The loop owns `map`, so dropping the loop releases the map instance.
pub fn start<M: MapHandle + 'static>(map: SwitchedMap<M>, interval_ms: u32, cap: usize) {
    let id = with_registry(cap, LoopRegistry::next_id);
    let interval = Interval::new(interval_ms, move || match map.enforce() {
        TickOutcome::Detached => {
            tracing::debug!("map detached, stopping its enforcement loop");
            // Never drop the interval from inside its own tick.
            Timeout::new(0, move || cancel(id)).forget();
        }
        // Retried on the next tick.
        TickOutcome::ApplyFailed => {}
        TickOutcome::Skipped | TickOutcome::InSync | TickOutcome::Reapplied => {}
    });
    // Dropped after the registry borrow ends, which clears the evicted timer.
    let evicted = with_registry(cap, |registry| registry.insert(id, interval));
    drop(evicted);
}

pub fn cancel(id: LoopId) {
    let handle = ENFORCEMENT_LOOPS.with(|slot| slot.borrow_mut().as_mut().and_then(|registry| registry.cancel(id)));
    drop(handle);
}

pub fn cancel_all() -> usize {
    let handles = ENFORCEMENT_LOOPS.with(|slot| {
        slot.borrow_mut()
            .as_mut()
            .map(LoopRegistry::cancel_all)
            .unwrap_or_default()
    });
    let count = handles.len();
    drop(handles);
    count
}

/// Publish a manual teardown hook for hosts that discard their maps.
pub fn expose_teardown() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let teardown = Closure::<dyn Fn() -> u32>::new(|| {
        let stopped = cancel_all();
        tracing::debug!(stopped, "stopped enforcement loops");
        stopped as u32
    });
    if set(window.as_ref(), TEARDOWN_GLOBAL, &teardown.into_js_value()).is_err() {
        tracing::warn!("failed to expose enforcement teardown");
    }
}
