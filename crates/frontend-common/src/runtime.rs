//! Spawning background work on the page's event loop

use futures::future::{abortable, AbortHandle, LocalBoxFuture};
use futures::FutureExt;
use std::rc::Rc;
use tokio::sync::watch;

/// Runs a future to completion in the background
pub type Spawner = Rc<dyn Fn(LocalBoxFuture<'static, ()>)>;

/// Spawner for the browser: `wasm_bindgen_futures::spawn_local`
pub fn browser_spawner() -> Spawner {
    Rc::new(|future: LocalBoxFuture<'static, ()>| {
        wasm_bindgen_futures::spawn_local(future);
    })
}

/// Call `on_change` after every change published to `receiver`.
///
/// Runs until the sender is dropped or the returned handle is aborted.
pub fn watch_changes<T: 'static>(
    spawner: &Spawner,
    mut receiver: watch::Receiver<T>,
    on_change: impl Fn() + 'static,
) -> AbortHandle {
    let (watcher, handle) = abortable(async move {
        while receiver.changed().await.is_ok() {
            on_change();
        }
    });
    spawner(
        async move {
            let _ = watcher.await;
        }
        .boxed_local(),
    );
    handle
}
