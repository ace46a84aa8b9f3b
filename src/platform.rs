use std::rc::Rc;

use futures_util::future::LocalBoxFuture;

/// The URL fragment of the page.
pub trait Location {
    fn fragment(&self) -> String;

    /// Changing the fragment is what triggers a routed dispatch; setting the
    /// value it already has is a no-op, as in the browser.
    fn set_fragment(&self, fragment: &str);

    /// Scheme, host and port, used to build share links.
    fn origin(&self) -> String;

    fn listen(&self, on_change: Rc<dyn Fn()>);
}

/// The cooperative event loop views run on.
pub trait Scheduler {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);

    fn sleep(&self, millis: u32) -> LocalBoxFuture<'static, ()>;
}
