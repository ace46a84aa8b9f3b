use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::callback::Interval;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::MessageEvent as WebSocketMessageEvent;
use web_sys::{Event, WebSocket};

use unblot::gateway::Subscription;
use unblot::realtime::{heartbeat_frame, leave_frame, RealtimeConnector};

/// Opens change feeds over a browser `WebSocket`.
pub struct WebSocketConnector {
    heartbeat_millis: u32,
}

impl WebSocketConnector {
    pub fn new(heartbeat_millis: u32) -> Self {
        WebSocketConnector { heartbeat_millis }
    }
}

impl RealtimeConnector for WebSocketConnector {
    fn open(&self, url: &str, join_frame: String, on_message: Box<dyn Fn(&str)>) -> Subscription {
        match FrontendConnection::new(url, join_frame, on_message, self.heartbeat_millis) {
            Ok(connection) => Subscription::new(move || connection.close()),
            Err(e) => {
                warn!("could not open change feed: {:?}", e);
                Subscription::inert()
            }
        }
    }
}

/// One joined channel. The handlers live as long as the connection does and
/// are detached again on close.
struct FrontendConnection {
    websocket: WebSocket,
    reference: Rc<Cell<u64>>,
    heartbeat: Rc<RefCell<Option<Interval>>>,
    _onopen: Closure<dyn FnMut(Event)>,
    _onmessage: Closure<dyn FnMut(WebSocketMessageEvent)>,
    _onclose: Closure<dyn FnMut(Event)>,
}

impl FrontendConnection {
    fn new(
        url: &str,
        join_frame: String,
        on_message: Box<dyn Fn(&str)>,
        heartbeat_millis: u32,
    ) -> Result<Self, JsValue> {
        let websocket = WebSocket::new(url)?;
        let reference = Rc::new(Cell::new(1));
        let heartbeat = Rc::new(RefCell::new(None));

        let websocket0 = websocket.clone();
        let reference0 = reference.clone();
        let heartbeat0 = heartbeat.clone();
        let onopen = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            debug!("change feed opened");
            if let Err(e) = websocket0.send_with_str(&join_frame) {
                warn!("could not join change feed: {:?}", e);
            }

            let websocket1 = websocket0.clone();
            let reference1 = reference0.clone();
            *heartbeat0.borrow_mut() = Some(Interval::new(heartbeat_millis, move || {
                let next = reference1.get() + 1;
                reference1.set(next);
                if let Err(e) = websocket1.send_with_str(&heartbeat_frame(next)) {
                    warn!("change feed heartbeat failed: {:?}", e);
                }
            }));
        });
        websocket.set_onopen(Some(onopen.as_ref().unchecked_ref()));

        let onmessage = Closure::<dyn FnMut(WebSocketMessageEvent)>::new(
            move |message: WebSocketMessageEvent| match message.data().as_string() {
                Some(data) => on_message(&data),
                None => debug!("ignoring non-text change feed frame"),
            },
        );
        websocket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

        let heartbeat1 = heartbeat.clone();
        let onclose = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            debug!("change feed closed");
            heartbeat1.borrow_mut().take();
        });
        websocket.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        Ok(FrontendConnection {
            websocket,
            reference,
            heartbeat,
            _onopen: onopen,
            _onmessage: onmessage,
            _onclose: onclose,
        })
    }

    fn close(self) {
        self.heartbeat.borrow_mut().take();
        self.websocket.set_onopen(None);
        self.websocket.set_onmessage(None);
        self.websocket.set_onclose(None);

        if self.websocket.ready_state() == WebSocket::OPEN {
            let _ = self
                .websocket
                .send_with_str(&leave_frame(self.reference.get() + 1));
        }
        if let Err(e) = self.websocket.close() {
            warn!("could not close change feed: {:?}", e);
        }
    }
}
