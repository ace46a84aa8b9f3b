#[macro_use]
extern crate wasm_bindgen_test;
extern crate unblot;
extern crate unblot_frontend;

wasm_bindgen_test_configure!(run_in_browser);

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;

use unblot::intent::{Binding, FormValues, Intent};
use unblot::model::{Identity, UserId};
use unblot::platform::Location;
use unblot::supabase::{StoredSession, TokenStore};
use unblot::surface::{ModalAction, Surface};
use unblot_frontend::dom::{collect_form, DomSurface};
use unblot_frontend::location::HashLocation;
use unblot_frontend::storage::LocalTokenStore;

const SKELETON: &str = r#"
<div id="loading-indicator" class="hidden"></div>
<div id="modal-bg" class="hidden"><div id="modal-message"></div><div id="modal-actions"></div></div>
<a id="nav-login"></a><a id="nav-register"></a>
<a id="nav-my-poems" class="hidden"></a><a id="nav-add-poem" class="hidden"></a>
<button id="nav-logout" class="hidden"></button><span id="current-user-id"></span>
<main id="app"></main>"#;

fn surface() -> (DomSurface, web_sys::Document) {
    let window = web_sys::window().unwrap();
    let document = window.document().unwrap();
    document.body().unwrap().set_inner_html(SKELETON);
    (DomSurface::new(window, document.clone()), document)
}

fn hidden(document: &web_sys::Document, id: &str) -> bool {
    document
        .get_element_by_id(id)
        .unwrap()
        .class_list()
        .contains("hidden")
}

#[wasm_bindgen_test]
fn form_values_are_keyed_by_element_id() {
    let (surface, document) = surface();
    surface.set_content(
        r#"<form id="f"><input id="title" value="Dawn" /><textarea id="body">light</textarea><input value="anonymous" /></form>"#,
    );

    let form = collect_form(&document);

    assert_eq!(form.get("title").map(String::as_str), Some("Dawn"));
    assert_eq!(form.get("body").map(String::as_str), Some("light"));
    assert_eq!(form.len(), 2);
}

#[wasm_bindgen_test]
fn bound_clicks_report_their_intent() {
    let (surface, document) = surface();
    surface.set_content(r#"<button id="go">Go</button><input id="q" value="moon" />"#);
    let seen: Rc<RefCell<Vec<(Intent, FormValues)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();

    surface.bind(
        vec![Binding::click("go", Intent::Search)],
        Rc::new(move |intent: Intent, form: FormValues| {
            sink.borrow_mut().push((intent, form))
        }),
    );
    let button: web_sys::HtmlElement = document.get_element_by_id("go").unwrap().dyn_into().unwrap();
    button.click();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, Intent::Search);
    assert_eq!(seen[0].1.get("q").map(String::as_str), Some("moon"));
}

#[wasm_bindgen_test]
fn session_toggles_the_navigation_bar() {
    let (surface, document) = surface();

    surface.reflect_session(Some(&Identity {
        id: UserId::new("3f1c9a2e-77aa"),
        email: None,
    }));
    assert!(hidden(&document, "nav-login"));
    assert!(!hidden(&document, "nav-logout"));
    assert_eq!(
        document
            .get_element_by_id("current-user-id")
            .unwrap()
            .text_content()
            .as_deref(),
        Some("3f1c9a2e")
    );

    surface.reflect_session(None);
    assert!(!hidden(&document, "nav-login"));
    assert!(hidden(&document, "nav-my-poems"));
}

#[wasm_bindgen_test]
fn modal_shows_one_button_per_action() {
    let (surface, document) = surface();

    surface.show_modal(
        "Share this poem",
        vec![ModalAction::new("Copy Link", "", None), ModalAction::ok()],
        Rc::new(|_: Intent, _: FormValues| {}),
    );

    assert!(!hidden(&document, "modal-bg"));
    let actions = document.get_element_by_id("modal-actions").unwrap();
    assert_eq!(actions.child_element_count(), 2);

    surface.hide_modal();
    assert!(hidden(&document, "modal-bg"));
}

#[wasm_bindgen_test]
fn toggling_reports_the_new_state() {
    let (surface, _) = surface();
    surface.set_content(r#"<div id="section" class="hidden"></div>"#);

    assert!(!surface.toggle_hidden("section"));
    assert!(surface.toggle_hidden("section"));
}

#[wasm_bindgen_test]
fn sessions_survive_in_local_storage() {
    let store = LocalTokenStore;
    let session = StoredSession {
        access_token: "at".into(),
        refresh_token: "rt".into(),
        user: Identity {
            id: UserId::new("u1"),
            email: Some("a@b.c".into()),
        },
    };

    store.save(&session);
    assert_eq!(store.load(), Some(session));
    store.clear();
    assert_eq!(store.load(), None);
}

#[wasm_bindgen_test]
fn fragment_changes_are_visible() {
    let location = HashLocation::new(web_sys::window().unwrap());

    location.set_fragment("#discover");

    assert_eq!(location.fragment(), "#discover");
    assert!(!location.origin().is_empty());
}
