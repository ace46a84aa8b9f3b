//! Maps the URL fragment to a view and keeps late results of superseded
//! dispatches off the page.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::config::Config;
use crate::gateway::{AuthClient, Gateway, Subscription};
use crate::intent::{FormValues, Intent, IntentSink};
use crate::model::Identity;
use crate::platform::{Location, Scheduler};
use crate::route::{parse_route, RouteState};
use crate::session::{refresh_session, SessionState};
use crate::surface::Surface;
use crate::view::{View, ViewContext};

pub type RouteTable = HashMap<String, Rc<dyn View>>;

/// Everything a view may reach besides its own context.
#[derive(Clone)]
pub struct Services {
    pub config: Config,
    pub gateway: Rc<dyn Gateway>,
    pub auth: Rc<dyn AuthClient>,
    pub surface: Rc<dyn Surface>,
    pub location: Rc<dyn Location>,
    pub scheduler: Rc<dyn Scheduler>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Dispatching,
}

/// Tells a view whether the dispatch that started it is still the latest.
/// In-place refreshes carry no generation and always count as current.
#[derive(Clone, Debug)]
pub struct DispatchGuard {
    generation: Option<u64>,
    counter: Rc<Cell<u64>>,
}

impl DispatchGuard {
    fn new(generation: u64, counter: Rc<Cell<u64>>) -> Self {
        DispatchGuard {
            generation: Some(generation),
            counter,
        }
    }

    fn unguarded(counter: Rc<Cell<u64>>) -> Self {
        DispatchGuard {
            generation: None,
            counter,
        }
    }

    pub fn is_current(&self) -> bool {
        self.generation
            .map_or(true, |generation| generation == self.counter.get())
    }
}

pub struct Router {
    routes: RouteTable,
    services: Services,
    session: SessionState,
    generation: Rc<Cell<u64>>,
    in_flight: Cell<usize>,
    views_rendered: Cell<u64>,
    modal_serial: Cell<u64>,
    current_route: RefCell<Option<RouteState>>,
    subscription: RefCell<Option<Subscription>>,
}

struct InFlight<'a>(&'a Cell<usize>);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a Cell<usize>) -> Self {
        counter.set(counter.get() + 1);
        InFlight(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

impl Router {
    /// Builds the router and starts listening for fragment changes. Nothing
    /// is rendered until [`Router::start`] or the first change.
    pub fn configure(routes: RouteTable, services: Services) -> Rc<Router> {
        let router = Rc::new(Router {
            routes,
            services,
            session: SessionState::default(),
            generation: Rc::new(Cell::new(0)),
            in_flight: Cell::new(0),
            views_rendered: Cell::new(0),
            modal_serial: Cell::new(0),
            current_route: RefCell::new(None),
            subscription: RefCell::new(None),
        });

        let weak = Rc::downgrade(&router);
        router.services.location.listen(Rc::new(move || {
            if let Some(router) = weak.upgrade() {
                router.spawn_dispatch();
            }
        }));

        info!("router configured with {} routes", router.routes.len());
        router
    }

    /// Dispatches whatever the page was loaded with.
    pub fn start(self: &Rc<Self>) {
        self.spawn_dispatch();
    }

    fn spawn_dispatch(self: &Rc<Self>) {
        let router = self.clone();
        self.services
            .scheduler
            .spawn(Box::pin(async move { router.dispatch_current_route().await }));
    }

    pub async fn dispatch_current_route(self: &Rc<Self>) {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        let previous = self.subscription.borrow_mut().take();
        drop(previous);

        let _in_flight = InFlight::enter(&self.in_flight);
        self.services.surface.set_loading(false);

        let guard = DispatchGuard::new(generation, self.generation.clone());
        let session = refresh_session(
            self.services.auth.as_ref(),
            &self.session,
            self.services.surface.as_ref(),
            &guard,
        )
        .await;

        let route = parse_route(
            &self.services.location.fragment(),
            &self.services.config.home_route,
        );
        debug!("dispatch {} to {}", generation, route.to_fragment());
        *self.current_route.borrow_mut() = Some(route.clone());

        self.render(route, session, guard, false).await;
    }

    /// Reports intents raised outside the content region, such as the
    /// navigation bar's logout button.
    pub fn sink(self: &Rc<Self>) -> IntentSink {
        let weak = Rc::downgrade(self);
        Rc::new(move |intent: Intent, form: FormValues| {
            if let Some(router) = weak.upgrade() {
                let ctx = ViewContext::new(
                    router.clone(),
                    router.session.current(),
                    DispatchGuard::unguarded(router.generation.clone()),
                    router.current_route(),
                    false,
                );
                (ctx.sink())(intent, form);
            }
        })
    }

    fn current_route(&self) -> RouteState {
        let route = self.current_route.borrow().clone();
        route.unwrap_or_else(|| {
            parse_route(
                &self.services.location.fragment(),
                &self.services.config.home_route,
            )
        })
    }

    /// Re-renders the current view with the same parameter. The session is
    /// not looked up again, the loading indicator is left alone and the
    /// writes are not checked against newer dispatches.
    pub async fn refresh_in_place(self: &Rc<Self>) {
        let route = self.current_route();
        debug!("refreshing {} in place", route.to_fragment());

        let guard = DispatchGuard::unguarded(self.generation.clone());
        self.render(route, self.session.current(), guard, true)
            .await;
    }

    async fn render(
        self: &Rc<Self>,
        route: RouteState,
        session: Option<Identity>,
        guard: DispatchGuard,
        refreshing: bool,
    ) {
        let view = match self.view_for(&route.name) {
            Some(view) => view,
            None => {
                warn!("no view for {} and no home view", route.name);
                return;
            }
        };
        if !refreshing {
            self.views_rendered.set(self.views_rendered.get() + 1);
        }

        let param = route.param.clone();
        let ctx = ViewContext::new(self.clone(), session, guard, route, refreshing);
        view.render(ctx, param).await;
    }

    fn view_for(&self, name: &str) -> Option<Rc<dyn View>> {
        self.routes
            .get(name)
            .or_else(|| self.routes.get(&self.services.config.home_route))
            .cloned()
    }

    /// Changes the fragment; the resulting change notification dispatches.
    /// Navigating to the fragment already shown dispatches it again.
    pub fn navigate_to(self: &Rc<Self>, hash: &str) {
        debug!("navigate to {}", hash);
        if self.services.location.fragment() == hash {
            self.spawn_dispatch();
        } else {
            self.services.location.set_fragment(hash);
        }
    }

    pub fn state(&self) -> DispatchState {
        if self.in_flight.get() > 0 {
            DispatchState::Dispatching
        } else {
            DispatchState::Idle
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// How many views routed dispatches have invoked. In-place refreshes do
    /// not count.
    pub fn views_rendered(&self) -> u64 {
        self.views_rendered.get()
    }

    pub fn session(&self) -> Option<Identity> {
        self.session.current()
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Keeps a change feed open until the next dispatch begins.
    pub(crate) fn hold(&self, subscription: Subscription) {
        let previous = self.subscription.borrow_mut().replace(subscription);
        drop(previous);
    }

    /// Whether a view is holding a change feed open.
    pub fn has_subscription(&self) -> bool {
        self.subscription.borrow().is_some()
    }

    pub(crate) fn next_modal(&self) {
        self.modal_serial.set(self.modal_serial.get() + 1);
    }

    pub(crate) fn modal_serial(&self) -> u64 {
        self.modal_serial.get()
    }
}
