extern crate console_error_panic_hook;
extern crate unblot;

pub mod connection;
pub mod dom;
pub mod image_export;
pub mod location;
pub mod scheduler;
pub mod storage;
pub mod transport;

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Reflect;
use log::{error, info};
use wasm_bindgen::prelude::*;
use web_sys::Window;

use unblot::config::{SUPABASE_ANON_KEY_KEY, SUPABASE_URL_KEY};
use unblot::error::AppError;
use unblot::format::escape_html;
use unblot::supabase::SupabaseGateway;
use unblot::views::route_table;
use unblot::{Config, Router, Services};

use crate::connection::WebSocketConnector;
use crate::dom::{DomSurface, CONTENT_ID};
use crate::location::HashLocation;
use crate::scheduler::BrowserScheduler;
use crate::storage::LocalTokenStore;
use crate::transport::FetchTransport;

thread_local! {
    static APP: RefCell<Option<Rc<Router>>> = RefCell::new(None);
}

/// A configuration value from the hosting page's globals, falling back to
/// the unprefixed names older pages set and then to build-time values.
fn lookup(window: &Window, key: &str) -> Option<String> {
    let global = |name: &str| Reflect::get(window, &JsValue::from_str(name)).ok()?.as_string();
    let legacy = match key {
        SUPABASE_URL_KEY => Some("SUPABASE_URL"),
        SUPABASE_ANON_KEY_KEY => Some("SUPABASE_ANON_KEY"),
        _ => None,
    };
    let built = match key {
        SUPABASE_URL_KEY => option_env!("UNBLOT_SUPABASE_URL"),
        SUPABASE_ANON_KEY_KEY => option_env!("UNBLOT_SUPABASE_ANON_KEY"),
        _ => None,
    };

    global(key)
        .or_else(|| legacy.and_then(|name| global(name)))
        .or_else(|| built.map(str::to_owned))
}

fn show_startup_error(window: &Window, error: &AppError) {
    let app = window
        .document()
        .and_then(|document| document.get_element_by_id(CONTENT_ID));
    if let Some(app) = app {
        app.set_inner_html(&format!(
            r#"<div class="text-center text-red-600">Could not start: {}</div>"#,
            escape_html(&error.user_message())
        ));
    }
}

#[wasm_bindgen]
pub fn bootstrap() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    wasm_logger::init(wasm_logger::Config::default());

    let window = match web_sys::window() {
        Some(window) => window,
        None => {
            error!("no window to run in");
            return;
        }
    };
    if let Err(e) = start(&window) {
        error!("could not start: {}", e);
        show_startup_error(&window, &e);
    }
}

fn start(window: &Window) -> Result<(), AppError> {
    let config = Config::from_lookup(|key| lookup(window, key))?;
    let document = window
        .document()
        .ok_or_else(|| AppError::NotFound("document".into()))?;

    let gateway = Rc::new(SupabaseGateway::new(
        config.clone(),
        Rc::new(FetchTransport),
        Rc::new(LocalTokenStore),
        Rc::new(WebSocketConnector::new(config.heartbeat_millis)),
    ));
    let surface = Rc::new(DomSurface::new(window.clone(), document));
    let services = Services {
        config: config.clone(),
        gateway: gateway.clone(),
        auth: gateway,
        surface: surface.clone(),
        location: Rc::new(HashLocation::new(window.clone())),
        scheduler: Rc::new(BrowserScheduler),
    };

    let router = Router::configure(route_table(&config.home_route), services);
    surface.bind_navigation(router.sink());
    router.start();
    info!("unblot started against {}", config.supabase_url);

    APP.with(|app| *app.borrow_mut() = Some(router));
    Ok(())
}
