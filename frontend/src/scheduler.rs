use futures_util::future::LocalBoxFuture;
use gloo_timers::future::TimeoutFuture;

use unblot::platform::Scheduler;

/// The browser's microtask queue and `setTimeout`.
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn sleep(&self, millis: u32) -> LocalBoxFuture<'static, ()> {
        Box::pin(TimeoutFuture::new(millis))
    }
}
