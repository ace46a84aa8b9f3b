use std::cell::RefCell;

use js_sys::{Function, Promise, Reflect};
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, Event, HtmlInputElement, HtmlTextAreaElement, Window};

use unblot::export::ExportSnapshot;
use unblot::intent::{Binding, EventKind, FormValues, Intent, IntentSink};
use unblot::model::Identity;
use unblot::surface::{ModalAction, Surface};

use crate::image_export;

pub const CONTENT_ID: &str = "app";
pub const LOADING_ID: &str = "loading-indicator";
pub const MODAL_ID: &str = "modal-bg";
pub const MODAL_MESSAGE_ID: &str = "modal-message";
pub const MODAL_ACTIONS_ID: &str = "modal-actions";

const SIGNED_OUT_NAV: [&str; 2] = ["nav-login", "nav-register"];
const SIGNED_IN_NAV: [&str; 3] = ["nav-logout", "nav-my-poems", "nav-add-poem"];
const CURRENT_USER_ID: &str = "current-user-id";
const LOGOUT_ID: &str = "nav-logout";

type Handler = Closure<dyn FnMut(Event)>;

/// Draws into the page's fixed skeleton: the `#app` content region, the
/// loading indicator, the navigation bar and the modal.
///
/// Handlers for content are released whenever the content is replaced;
/// modal handlers whenever another modal is shown.
pub struct DomSurface {
    window: Window,
    document: Document,
    content_handlers: RefCell<Vec<Handler>>,
    modal_handlers: RefCell<Vec<Handler>>,
    nav_handlers: RefCell<Vec<Handler>>,
}

impl DomSurface {
    pub fn new(window: Window, document: Document) -> Self {
        DomSurface {
            window,
            document,
            content_handlers: RefCell::new(Vec::new()),
            modal_handlers: RefCell::new(Vec::new()),
            nav_handlers: RefCell::new(Vec::new()),
        }
    }

    fn element(&self, id: &str) -> Option<Element> {
        let element = self.document.get_element_by_id(id);
        if element.is_none() {
            debug!("no element #{}", id);
        }
        element
    }

    fn set_class(&self, id: &str, class: &str, present: bool) {
        if let Some(element) = self.element(id) {
            let _ = element.class_list().toggle_with_force(class, present);
        }
    }

    /// Wires the navigation bar's logout button.
    pub fn bind_navigation(&self, sink: IntentSink) {
        let element = match self.element(LOGOUT_ID) {
            Some(element) => element,
            None => return,
        };
        let handler = Handler::new(move |event: Event| {
            event.prevent_default();
            sink(Intent::Logout, FormValues::new());
        });
        if element
            .add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            self.nav_handlers.borrow_mut().push(handler);
        }
    }
}

/// The current value of every input and textarea in the content region,
/// keyed by element id.
pub fn collect_form(document: &Document) -> FormValues {
    let mut values = FormValues::new();
    let selector = format!("#{CONTENT_ID} input, #{CONTENT_ID} textarea");
    let nodes = match document.query_selector_all(&selector) {
        Ok(nodes) => nodes,
        Err(_) => return values,
    };

    for index in 0..nodes.length() {
        let node = match nodes.item(index) {
            Some(node) => node,
            None => continue,
        };
        let (id, value) = if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            (input.id(), input.value())
        } else if let Some(textarea) = node.dyn_ref::<HtmlTextAreaElement>() {
            (textarea.id(), textarea.value())
        } else {
            continue;
        };
        if !id.is_empty() {
            values.insert(id, value);
        }
    }
    values
}

fn write_clipboard(window: &Window, text: &str) -> Result<Promise, JsValue> {
    let clipboard = Reflect::get(&window.navigator(), &JsValue::from_str("clipboard"))?;
    let write_text: Function = Reflect::get(&clipboard, &JsValue::from_str("writeText"))?.dyn_into()?;
    write_text.call1(&clipboard, &JsValue::from_str(text))?.dyn_into()
}

impl Surface for DomSurface {
    fn set_loading(&self, visible: bool) {
        self.set_class(LOADING_ID, "hidden", !visible);
    }

    fn set_content(&self, html: &str) {
        if let Some(content) = self.element(CONTENT_ID) {
            content.set_inner_html(html);
        }
        self.content_handlers.borrow_mut().clear();
    }

    fn set_region(&self, element_id: &str, html: &str) {
        if let Some(region) = self.element(element_id) {
            region.set_inner_html(html);
        }
    }

    fn set_hidden(&self, element_id: &str, hidden: bool) {
        self.set_class(element_id, "hidden", hidden);
    }

    fn toggle_hidden(&self, element_id: &str) -> bool {
        self.element(element_id)
            .and_then(|element| element.class_list().toggle("hidden").ok())
            .unwrap_or(true)
    }

    fn reflect_session(&self, identity: Option<&Identity>) {
        let signed_in = identity.is_some();
        for id in SIGNED_OUT_NAV {
            self.set_class(id, "hidden", signed_in);
        }
        for id in SIGNED_IN_NAV {
            self.set_class(id, "hidden", !signed_in);
        }
        if let Some(label) = self.element(CURRENT_USER_ID) {
            let text = identity.map(|identity| identity.id.short().to_owned());
            label.set_text_content(text.as_deref());
        }
    }

    fn bind(&self, bindings: Vec<Binding>, sink: IntentSink) {
        let mut handlers = self.content_handlers.borrow_mut();
        for Binding {
            element_id,
            event,
            intent,
        } in bindings
        {
            let element = match self.element(&element_id) {
                Some(element) => element,
                None => continue,
            };

            let sink = sink.clone();
            let document = self.document.clone();
            let handler = Handler::new(move |dom_event: Event| {
                if event == EventKind::Submit {
                    dom_event.prevent_default();
                }
                sink(intent.clone(), collect_form(&document));
            });
            match element.add_event_listener_with_callback(event.dom_name(), handler.as_ref().unchecked_ref()) {
                Ok(()) => handlers.push(handler),
                Err(e) => warn!("could not bind #{}: {:?}", element_id, e),
            }
        }
    }

    fn show_modal(&self, message: &str, actions: Vec<ModalAction>, sink: IntentSink) {
        let (modal, text, buttons) = match (
            self.element(MODAL_ID),
            self.element(MODAL_MESSAGE_ID),
            self.element(MODAL_ACTIONS_ID),
        ) {
            (Some(modal), Some(text), Some(buttons)) => (modal, text, buttons),
            _ => {
                warn!("modal markup missing, dropping message: {}", message);
                return;
            }
        };

        text.set_text_content(Some(message));
        buttons.set_inner_html("");
        let mut handlers = Vec::with_capacity(actions.len());

        for ModalAction {
            label,
            class,
            intent,
        } in actions
        {
            let button = match self.document.create_element("button") {
                Ok(button) => button,
                Err(_) => continue,
            };
            button.set_class_name(&format!("nav-btn px-4 py-2 {class}"));
            button.set_text_content(Some(&label));
            if buttons.append_child(&button).is_err() {
                continue;
            }

            let sink = sink.clone();
            let modal = modal.clone();
            let document = self.document.clone();
            let handler = Handler::new(move |_event: Event| {
                let _ = modal.class_list().add_1("hidden");
                if let Some(intent) = intent.clone() {
                    sink(intent, collect_form(&document));
                }
            });
            if button
                .add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())
                .is_ok()
            {
                handlers.push(handler);
            }
        }

        *self.modal_handlers.borrow_mut() = handlers;
        let _ = modal.class_list().remove_1("hidden");
    }

    fn hide_modal(&self) {
        self.set_class(MODAL_ID, "hidden", true);
    }

    fn copy_text(&self, text: &str) {
        match write_clipboard(&self.window, text) {
            Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    warn!("clipboard write rejected: {:?}", e);
                }
            }),
            Err(e) => warn!("clipboard unavailable: {:?}", e),
        }
    }

    fn export_image(&self, snapshot: ExportSnapshot) {
        if let Err(e) = image_export::download(&self.document, &snapshot) {
            warn!("could not export {}: {:?}", snapshot.file_name, e);
        }
    }
}
