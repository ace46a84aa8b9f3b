extern crate async_trait;
extern crate chrono;
#[cfg(any(test, feature = "testing"))]
extern crate futures;
#[cfg(any(test, feature = "testing"))]
extern crate futures_channel;
extern crate futures_util;
extern crate log;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate thiserror;

pub mod actions;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod gateway;
pub mod intent;
pub mod model;
pub mod platform;
pub mod realtime;
pub mod rest;
pub mod route;
pub mod router;
pub mod session;
pub mod supabase;
pub mod surface;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod view;
pub mod views;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use router::{Router, Services};

/// Plain `RUST_LOG`-driven logging for native builds and tests. The browser
/// build logs to the console instead.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logger() {
    use std::io::Write;

    let _ = env_logger::builder()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .is_test(cfg!(test))
        .try_init();
}
