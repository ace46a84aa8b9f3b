//! The pages of the application and the actions their controls trigger.

use std::rc::Rc;

use crate::error::AppError;
use crate::format::escape_html;
use crate::route;
use crate::router::RouteTable;
use crate::view::{View, ViewContext};

pub mod auth;
pub mod comments;
pub mod discover;
pub mod home;
pub mod likes;
pub mod my_poems;
pub mod poem_form;
pub mod share;
pub mod view_poem;

/// Every route of the application. `home_route` names the view unknown
/// routes fall back to.
pub fn route_table(home_route: &str) -> RouteTable {
    let mut routes = RouteTable::new();
    let mut add = |name: &str, view: Rc<dyn View>| {
        routes.insert(name.to_owned(), view);
    };

    add(route::HOME, Rc::new(home::HomeView));
    add(route::LOGIN, Rc::new(auth::LoginView));
    add(route::REGISTER, Rc::new(auth::RegisterView));
    add(route::RESET, Rc::new(auth::ResetView));
    add(route::DISCOVER, Rc::new(discover::DiscoverView));
    add(route::MY_POEMS, Rc::new(my_poems::MyPoemsView));
    add(route::ADD_POEM, Rc::new(poem_form::AddPoemView));
    add(route::VIEW_POEM, Rc::new(view_poem::ViewPoemView));
    add(route::EDIT_POEM, Rc::new(poem_form::EditPoemView));

    if !routes.contains_key(home_route) {
        routes.insert(home_route.to_owned(), Rc::new(home::HomeView));
    }
    routes
}

pub(crate) fn placeholder(text: &str) -> String {
    format!(r#"<div class="text-center text-lg">{}</div>"#, escape_html(text))
}

pub(crate) fn notice(text: &str) -> String {
    format!(r#"<div class="text-center text-lg mt-12">{}</div>"#, escape_html(text))
}

/// The red line a view shows in place of content it could not load.
pub(crate) fn inline_error(prefix: &str, error: &AppError) -> String {
    format!(
        r#"<div class="text-center text-red-600">{}: {}</div>"#,
        escape_html(prefix),
        escape_html(&error.user_message())
    )
}

/// Shows a failed action as "<prefix>: <reason>" in a dismissible modal.
pub(crate) fn report_failure(ctx: &ViewContext, prefix: &str, error: &AppError) {
    ctx.show_message(&format!("{prefix}: {}", error.user_message()));
}

pub(crate) const INPUT_CLASS: &str = "rounded-lg border border-blue-200 px-3 py-2 bg-blue-50 focus:border-blue-400 focus:ring-2 focus:ring-blue-200 transition";

pub(crate) const CARD_TITLE_STYLE: &str = "font-family: 'EB Garamond', serif; color: var(--main-blue);";
