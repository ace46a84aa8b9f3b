use std::cell::RefCell;
use std::rc::Rc;

use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

use unblot::platform::Location;

/// `window.location.hash`, with `hashchange` as the change notification.
pub struct HashLocation {
    window: Window,
    listeners: RefCell<Vec<Closure<dyn FnMut()>>>,
}

impl HashLocation {
    pub fn new(window: Window) -> Self {
        HashLocation {
            window,
            listeners: RefCell::new(Vec::new()),
        }
    }
}

impl Location for HashLocation {
    fn fragment(&self) -> String {
        self.window.location().hash().unwrap_or_default()
    }

    fn set_fragment(&self, fragment: &str) {
        if let Err(e) = self.window.location().set_hash(fragment) {
            warn!("could not navigate to {}: {:?}", fragment, e);
        }
    }

    fn origin(&self) -> String {
        self.window.location().origin().unwrap_or_default()
    }

    fn listen(&self, on_change: Rc<dyn Fn()>) {
        let onhashchange = Closure::<dyn FnMut()>::new(move || on_change());
        let added = self
            .window
            .add_event_listener_with_callback("hashchange", onhashchange.as_ref().unchecked_ref());
        if let Err(e) = added {
            warn!("could not listen for hash changes: {:?}", e);
        }
        self.listeners.borrow_mut().push(onhashchange);
    }
}
