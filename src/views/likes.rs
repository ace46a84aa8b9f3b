use log::warn;

use crate::error::AppResult;
use crate::format::escape_html;
use crate::gateway::Gateway;
use crate::intent::{Binding, Intent};
use crate::model::{Identity, PostId, UserId};
use crate::route::VIEW_POEM;
use crate::view::ViewContext;
use crate::views::report_failure;

pub const LOGIN_TO_LIKE: &str = "Login to like poems!";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub count: u64,
}

pub async fn load(gateway: &dyn Gateway, post: &PostId, identity: Option<&Identity>) -> AppResult<LikeState> {
    let count = gateway.like_count(post).await?;
    let liked = match identity {
        Some(identity) => gateway.has_liked(post, &identity.id).await?,
        None => false,
    };
    Ok(LikeState { liked, count })
}

/// Likes the post if the user has not, unlikes it otherwise.
pub async fn toggle(gateway: &dyn Gateway, post: &PostId, user: &UserId) -> AppResult<LikeState> {
    let liked = if gateway.has_liked(post, user).await? {
        gateway.unlike(post, user).await?;
        false
    } else {
        gateway.like(post, user).await?;
        true
    };
    let count = gateway.like_count(post).await?;
    Ok(LikeState { liked, count })
}

pub fn button_id(post: &PostId) -> String {
    format!("like-btn-{}", post)
}

pub fn slot_id(post: &PostId) -> String {
    format!("like-slot-{}", post)
}

pub fn button(post: &PostId, state: Option<LikeState>) -> String {
    let (colors, label) = match state {
        Some(LikeState { liked: true, count }) => ("bg-pink-600 text-white", format!("❤️ Like ({count})")),
        Some(LikeState { liked: false, count }) => ("bg-gray-200 text-gray-800", format!("❤️ Like ({count})")),
        None => ("bg-gray-200 text-gray-800", "❤️ Like".to_owned()),
    };
    format!(
        r#"<button id="{id}" class="like-btn rounded-lg px-4 py-2 font-semibold {colors}">{label}</button>"#,
        id = escape_html(&button_id(post)),
    )
}

pub fn binding(ctx: &ViewContext, post: &PostId) -> Binding {
    let intent = if ctx.identity().is_some() {
        Intent::ToggleLike { post: post.clone() }
    } else {
        Intent::PromptLogin(LOGIN_TO_LIKE)
    };
    Binding::click(button_id(post), intent)
}

/// Fills the like slot of a post with its current state.
pub async fn show(ctx: &ViewContext, post: &PostId) {
    match load(ctx.gateway(), post, ctx.identity()).await {
        Ok(state) => {
            if ctx.region(&slot_id(post), &button(post, Some(state))) {
                ctx.bind(vec![binding(ctx, post)]);
            }
        }
        Err(e) => warn!("could not load likes of {}: {}", post, e),
    }
}

pub async fn toggle_like(ctx: &ViewContext, post: &PostId) {
    let identity = match ctx.identity() {
        Some(identity) => identity,
        None => {
            ctx.show_message(LOGIN_TO_LIKE);
            return;
        }
    };

    match toggle(ctx.gateway(), post, &identity.id).await {
        Ok(_) if ctx.route().name == VIEW_POEM => ctx.refresh_in_place().await,
        Ok(state) => {
            if ctx.region(&slot_id(post), &button(post, Some(state))) {
                ctx.bind(vec![binding(ctx, post)]);
            }
        }
        Err(e) => report_failure(ctx, "Failed to update like", &e),
    }
}
