//! What a view gets to work with for one dispatch.

use std::future::Future;
use std::rc::Rc;

use async_trait::async_trait;
use futures_util::future::LocalBoxFuture;
use log::debug;

use crate::actions;
use crate::config::Config;
use crate::export::ExportSnapshot;
use crate::gateway::{AuthClient, Gateway, Subscription};
use crate::intent::{Binding, FormValues, Intent, IntentSink};
use crate::model::Identity;
use crate::route::RouteState;
use crate::router::{DispatchGuard, Router};
use crate::surface::ModalAction;

#[async_trait(?Send)]
pub trait View {
    /// Renders into the content region. Errors are shown inline by the view
    /// itself; the router never sees them.
    async fn render(&self, ctx: ViewContext, param: Option<String>);
}

/// The session, route and page access of one dispatch. Page writes made
/// through a context whose dispatch has been superseded are dropped.
#[derive(Clone)]
pub struct ViewContext {
    router: Rc<Router>,
    session: Option<Identity>,
    guard: DispatchGuard,
    route: RouteState,
    refreshing: bool,
}

impl ViewContext {
    pub(crate) fn new(
        router: Rc<Router>,
        session: Option<Identity>,
        guard: DispatchGuard,
        route: RouteState,
        refreshing: bool,
    ) -> Self {
        ViewContext {
            router,
            session,
            guard,
            route,
            refreshing,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.as_ref()
    }

    pub fn route(&self) -> &RouteState {
        &self.route
    }

    /// Whether this render is an in-place refresh rather than a dispatch.
    pub fn is_refresh(&self) -> bool {
        self.refreshing
    }

    pub fn is_current(&self) -> bool {
        self.guard.is_current()
    }

    pub fn gateway(&self) -> &dyn Gateway {
        self.router.services().gateway.as_ref()
    }

    pub fn auth(&self) -> &dyn AuthClient {
        self.router.services().auth.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.router.services().config
    }

    fn stale(&self, what: &str) -> bool {
        if self.guard.is_current() {
            return false;
        }
        debug!("dropping {} from superseded dispatch of {}", what, self.route.name);
        true
    }

    /// Replaces the content region. Returns false when the write was dropped.
    pub fn commit(&self, html: &str) -> bool {
        if self.stale("content") {
            return false;
        }
        self.router.services().surface.set_content(html);
        true
    }

    pub fn region(&self, element_id: &str, html: &str) -> bool {
        if self.stale("region update") {
            return false;
        }
        self.router.services().surface.set_region(element_id, html);
        true
    }

    pub fn set_hidden(&self, element_id: &str, hidden: bool) {
        if !self.stale("visibility change") {
            self.router.services().surface.set_hidden(element_id, hidden);
        }
    }

    /// Flips an element's visibility. `None` when the write was dropped.
    pub fn toggle_hidden(&self, element_id: &str) -> Option<bool> {
        if self.stale("visibility toggle") {
            return None;
        }
        Some(self.router.services().surface.toggle_hidden(element_id))
    }

    pub fn bind(&self, bindings: Vec<Binding>) {
        if !self.stale("bindings") {
            self.router.services().surface.bind(bindings, self.sink());
        }
    }

    /// Reports intents from the page back into [`actions::perform`].
    pub fn sink(&self) -> IntentSink {
        let ctx = self.clone();
        Rc::new(move |intent: Intent, form: FormValues| {
            let action_ctx = ctx.clone();
            ctx.spawn(async move { actions::perform(&action_ctx, intent, form).await });
        })
    }

    fn set_loading(&self, visible: bool) {
        if !self.stale("loading indicator") {
            self.router.services().surface.set_loading(visible);
        }
    }

    pub fn loading(&self) -> LoadingGuard {
        LoadingGuard::show(self.clone())
    }

    pub fn navigate_to(&self, hash: &str) {
        self.router.navigate_to(hash);
    }

    /// Navigates after the redirect delay, unless the user has moved on.
    pub async fn redirect(&self, hash: &str) {
        self.redirect_after(hash, self.config().redirect_millis).await;
    }

    pub async fn redirect_after(&self, hash: &str, millis: u32) {
        self.sleep(millis).await;
        if self.is_current() {
            self.navigate_to(hash);
        }
    }

    pub fn show_modal(&self, message: &str, actions: Vec<ModalAction>) {
        self.router.next_modal();
        self.router
            .services()
            .surface
            .show_modal(message, actions, self.sink());
    }

    /// A modal with a single OK button.
    pub fn show_message(&self, message: &str) {
        self.show_modal(message, vec![ModalAction::ok()]);
    }

    /// A modal that closes itself after the toast delay, unless another
    /// modal replaced it in the meantime.
    pub fn show_toast(&self, message: &str) {
        self.show_modal(message, Vec::new());
        let serial = self.router.modal_serial();
        let router = self.router.clone();
        let delay = self.sleep(self.config().toast_millis);
        self.spawn(async move {
            delay.await;
            if router.modal_serial() == serial {
                router.services().surface.hide_modal();
            }
        });
    }

    pub fn hide_modal(&self) {
        self.router.services().surface.hide_modal();
    }

    pub fn copy_text(&self, text: &str) {
        self.router.services().surface.copy_text(text);
    }

    pub fn export_image(&self, snapshot: ExportSnapshot) {
        self.router.services().surface.export_image(snapshot);
    }

    /// Link to a post that works from outside the application.
    pub fn share_link(&self, fragment: &str) -> String {
        format!("{}/{}", self.router.services().location.origin(), fragment)
    }

    pub async fn refresh_in_place(&self) {
        self.router.refresh_in_place().await;
    }

    /// Keeps a change feed open until the next dispatch; a superseded
    /// dispatch's feed is closed right away.
    pub fn hold(&self, subscription: Subscription) {
        if self.stale("subscription") {
            return;
        }
        self.router.hold(subscription);
    }

    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        self.router.services().scheduler.spawn(Box::pin(task));
    }

    pub fn sleep(&self, millis: u32) -> LocalBoxFuture<'static, ()> {
        self.router.services().scheduler.sleep(millis)
    }
}

/// Shows the loading indicator until dropped.
#[must_use]
pub struct LoadingGuard {
    ctx: ViewContext,
}

impl LoadingGuard {
    fn show(ctx: ViewContext) -> Self {
        ctx.set_loading(true);
        LoadingGuard { ctx }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.ctx.set_loading(false);
    }
}
