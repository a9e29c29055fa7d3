use std::cell::RefCell;
use std::future::Future;

use futures::channel::oneshot;
use js_sys::Array;
use map_switcher_shared::ScriptWatcher;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlScriptElement, MutationObserver, MutationObserverInit, MutationRecord, Node};

struct LoaderWatch {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(Array, MutationObserver)>,
}

thread_local! {
    static LOADER_WATCH: RefCell<Option<LoaderWatch>> = const { RefCell::new(None) };
}

/// Start watching the document for the map library's loader script.
///
/// The observer is registered before this returns; the future resolves once,
/// with the first qualifying `<script>`. It never resolves if no loader is
/// inserted.
pub fn watch_loader(src_prefix: &str) -> impl Future<Output = Option<HtmlScriptElement>> + 'static {
    let (tx, rx) = oneshot::channel::<HtmlScriptElement>();
    let registered = observe(src_prefix, tx);
    async move {
        if !registered {
            return None;
        }
        let found = rx.await.ok();
        // The callback is idle by now; dropping it here never races its own call.
        LOADER_WATCH.with(|slot| {
            if let Some(watch) = slot.borrow_mut().take() {
                watch.observer.disconnect();
            }
        });
        found
    }
}

fn observe(src_prefix: &str, tx: oneshot::Sender<HtmlScriptElement>) -> bool {
    let Some(root) = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.document_element())
    else {
        return false;
    };

    let mut watcher = ScriptWatcher::new(src_prefix);
    let mut tx = Some(tx);
    let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(
        move |records: Array, observer: MutationObserver| {
            let added = records
                .iter()
                .filter_map(|record| record.dyn_into::<MutationRecord>().ok())
                .flat_map(|record| {
                    let nodes = record.added_nodes();
                    (0..nodes.length()).filter_map(move |index| nodes.item(index))
                });
            let Some(node) = watcher.scan(added, |node: &Node| {
                node.dyn_ref::<HtmlScriptElement>().map(HtmlScriptElement::src)
            }) else {
                return;
            };
            observer.disconnect();
            let Ok(script) = node.dyn_into::<HtmlScriptElement>() else {
                return;
            };
            tracing::debug!(src = %script.src(), "found map library loader script");
            if let Some(tx) = tx.take() {
                let _ = tx.send(script);
            }
        },
    );

    let Ok(observer) = MutationObserver::new(callback.as_ref().unchecked_ref()) else {
        return false;
    };
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    if observer.observe_with_options(&root, &init).is_err() {
        return false;
    }
    tracing::debug!("watching for map library loader");

    LOADER_WATCH.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            old.observer.disconnect();
        }
        *slot.borrow_mut() = Some(LoaderWatch {
            observer,
            _callback: callback,
        });
    });
    true
}
