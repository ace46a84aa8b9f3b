use std::cell::RefCell;

use log::{debug, warn};

use crate::gateway::AuthClient;
use crate::model::Identity;
use crate::router::DispatchGuard;
use crate::surface::Surface;

/// Who is signed in, as of the last refresh.
#[derive(Default)]
pub struct SessionState {
    current: RefCell<Option<Identity>>,
}

impl SessionState {
    pub fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    fn set(&self, identity: Option<Identity>) {
        *self.current.borrow_mut() = identity;
    }
}

/// Asks the auth service who is signed in, stores the answer and updates the
/// navigation bar. A failing lookup counts as anonymous. An answer that
/// arrives after a newer dispatch began is returned but not stored.
pub async fn refresh_session(
    auth: &dyn AuthClient,
    state: &SessionState,
    surface: &dyn Surface,
    guard: &DispatchGuard,
) -> Option<Identity> {
    let identity = match auth.current_identity().await {
        Ok(identity) => identity,
        Err(e) => {
            warn!("session lookup failed, continuing anonymously: {}", e);
            None
        }
    };

    match &identity {
        Some(identity) => debug!("signed in as {}", identity.id),
        None => debug!("anonymous session"),
    }

    if !guard.is_current() {
        debug!("dropping superseded session lookup");
        return identity;
    }
    state.set(identity.clone());
    surface.reflect_session(identity.as_ref());
    identity
}
