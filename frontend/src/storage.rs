use log::warn;
use web_sys::Storage;

use unblot::supabase::{StoredSession, TokenStore};

pub const SESSION_LOCAL_STORAGE_KEY: &str = "unblot_session";

pub fn get_local_storage() -> Option<Storage> {
    web_sys::window()?.local_storage().ok()?
}

/// Keeps the signed-in session in `localStorage` across page loads.
pub struct LocalTokenStore;

impl TokenStore for LocalTokenStore {
    fn load(&self) -> Option<StoredSession> {
        let raw = get_local_storage()?
            .get_item(SESSION_LOCAL_STORAGE_KEY)
            .ok()??;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("ignoring unreadable stored session: {}", e);
                None
            }
        }
    }

    fn save(&self, session: &StoredSession) {
        let storage = match get_local_storage() {
            Some(storage) => storage,
            None => {
                warn!("no local storage, session will not persist");
                return;
            }
        };
        match serde_json::to_string(session) {
            Ok(raw) => {
                if storage.set_item(SESSION_LOCAL_STORAGE_KEY, &raw).is_err() {
                    warn!("could not persist session");
                }
            }
            Err(e) => warn!("could not encode session: {}", e),
        }
    }

    fn clear(&self) {
        if let Some(storage) = get_local_storage() {
            let _ = storage.remove_item(SESSION_LOCAL_STORAGE_KEY);
        }
    }
}
