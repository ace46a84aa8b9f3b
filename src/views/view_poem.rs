use async_trait::async_trait;
use futures_util::try_join;
use log::{info, warn};

use crate::error::{AppError, AppResult};
use crate::format::{escape_html, excerpt, format_date, tags_to_string};
use crate::intent::{Binding, Intent};
use crate::model::{Comment, Post, PostId};
use crate::route::{EDIT_POEM, MY_POEMS};
use crate::surface::ModalAction;
use crate::view::{View, ViewContext};
use crate::views::likes::{self, LikeState};
use crate::views::{comments, inline_error, placeholder, report_failure, share};

pub const SEE_MORE_CHARS: usize = 500;

pub const CONFIRM_DELETE: &str = "Are you sure you want to delete this poem?";

pub struct ViewPoemView;

struct Loaded {
    post: Post,
    views: u64,
    likes: LikeState,
    comments: Vec<Comment>,
}

#[async_trait(?Send)]
impl View for ViewPoemView {
    async fn render(&self, ctx: ViewContext, param: Option<String>) {
        if !ctx.is_refresh() {
            ctx.commit(&placeholder("Loading poem..."));
        }
        let _loading = ctx.loading();

        let id = match param {
            Some(id) => PostId::new(id),
            None => {
                ctx.commit(&inline_error(
                    "Failed to load poem",
                    &AppError::NotFound("poem".into()),
                ));
                return;
            }
        };

        match load(&ctx, &id).await {
            Ok(loaded) => {
                if ctx.commit(&page(&ctx, &loaded)) {
                    ctx.bind(bindings(&ctx, &loaded));
                }
            }
            Err(e) => {
                ctx.commit(&inline_error("Failed to load poem", &e));
            }
        }
    }
}

/// Fetches everything the page shows. A routed dispatch counts one view; an
/// in-place refresh does not.
async fn load(ctx: &ViewContext, id: &PostId) -> AppResult<Loaded> {
    let post = ctx.gateway().get_post(id).await?;

    let mut views = post.views_count;
    if !ctx.is_refresh() {
        match ctx.gateway().increment_views(id).await {
            Ok(()) => views += 1,
            Err(e) => warn!("could not count a view of {}: {}", id, e),
        }
    }

    let (likes, comments) = try_join!(
        likes::load(ctx.gateway(), id, ctx.identity()),
        ctx.gateway().list_comments(id),
    )?;

    Ok(Loaded {
        post,
        views,
        likes,
        comments,
    })
}

fn content_id(post: &PostId) -> String {
    format!("poem-content-{post}")
}

fn see_more_id(post: &PostId) -> String {
    format!("see-more-{post}")
}

fn page(ctx: &ViewContext, loaded: &Loaded) -> String {
    let post = &loaded.post;
    let owner_controls = if post.is_owned_by(ctx.identity()) {
        r#"<button id="edit-btn" class="rounded-lg px-4 py-2 font-semibold bg-yellow-200 text-yellow-800">Edit</button>
    <button id="delete-btn" class="rounded-lg px-4 py-2 font-semibold bg-red-200 text-red-800">Delete</button>"#
    } else {
        ""
    };

    format!(
        r#"<div class="max-w-2xl mx-auto p-6 bg-white rounded-lg shadow">
  <div class="flex justify-between items-center mb-2">
    <div class="text-2xl font-bold poem-title-link" style="font-family: 'Quicksand', sans-serif;">{title}</div>
    <div class="text-xs text-gray-400">{date}</div>
  </div>
  <div class="mb-2 text-gray-600">Views: {views}</div>
  <div id="{content_id}" class="mb-4 poem-content" style="font-family: 'Quicksand', sans-serif; font-size: 1.15rem; line-height: 1.7; white-space: pre-line;">{content}</div>
  <div class="mb-4 text-sm text-gray-500">Tags: {tags}</div>
  <div class="flex gap-2 mb-4">
    <span id="{like_slot}">{like}</span>
    {share}
    {owner_controls}
  </div>
  <div class="mb-4">
    {toggle}
    {section}
  </div>
</div>"#,
        title = escape_html(&post.title),
        date = format_date(&post.created_at),
        views = loaded.views,
        content_id = content_id(&post.id),
        content = content(post),
        tags = escape_html(&tags_to_string(&post.tags)),
        like_slot = likes::slot_id(&post.id),
        like = likes::button(&post.id, Some(loaded.likes)),
        share = share::button(&post.id),
        toggle = comments::toggle_button(&post.id, Some(loaded.comments.len())),
        section = comments::section(ctx, &post.id, Some(&loaded.comments)),
    )
}

/// The post body, cut after a few hundred characters with a "see more"
/// button.
fn content(post: &Post) -> String {
    match excerpt(&post.content, SEE_MORE_CHARS) {
        (shown, true) => format!(
            r#"{}... <button id="{}" class="see-more-btn text-blue-600 ml-0" style="border:none;background:none;padding:0;">see more</button>"#,
            escape_html(shown),
            see_more_id(&post.id),
        ),
        (all, false) => escape_html(all),
    }
}

fn bindings(ctx: &ViewContext, loaded: &Loaded) -> Vec<Binding> {
    let id = &loaded.post.id;
    let mut bindings = vec![
        likes::binding(ctx, id),
        share::binding(id),
        comments::toggle_binding(ctx, id, false),
    ];
    if excerpt(&loaded.post.content, SEE_MORE_CHARS).1 {
        bindings.push(Binding::click(
            see_more_id(id),
            Intent::SeeMore { post: id.clone() },
        ));
    }
    if loaded.post.is_owned_by(ctx.identity()) {
        bindings.push(Binding::click(
            "edit-btn",
            Intent::Navigate(format!("{EDIT_POEM}/{id}")),
        ));
        bindings.push(Binding::click(
            "delete-btn",
            Intent::ConfirmDeletePost { post: id.clone() },
        ));
    }
    bindings.extend(comments::body_bindings(ctx, id, &loaded.comments));
    bindings
}

/// Replaces the excerpt with the whole post.
pub async fn see_more(ctx: &ViewContext, post: &PostId) {
    match ctx.gateway().get_post(post).await {
        Ok(full) => {
            ctx.region(&content_id(post), &escape_html(&full.content));
        }
        Err(e) => report_failure(ctx, "Failed to load poem", &e),
    }
}

pub fn confirm_delete(ctx: &ViewContext, post: &PostId) {
    ctx.show_modal(
        CONFIRM_DELETE,
        vec![
            ModalAction::new("Cancel", "bg-gray-300 text-gray-800", None),
            ModalAction::new(
                "Delete",
                "bg-red-600 text-white",
                Some(Intent::DeletePost { post: post.clone() }),
            ),
        ],
    );
}

async fn delete_owned(ctx: &ViewContext, post: &PostId) -> AppResult<()> {
    let existing = ctx.gateway().get_post(post).await?;
    if !existing.is_owned_by(ctx.identity()) {
        return Err(AppError::Unauthorized("delete this poem".into()));
    }
    ctx.gateway().delete_post(post).await
}

pub async fn delete(ctx: &ViewContext, post: &PostId) {
    let loading = ctx.loading();
    let result = delete_owned(ctx, post).await;
    drop(loading);

    match result {
        Ok(()) => {
            info!("deleted poem {}", post);
            ctx.show_toast("Poem deleted!");
            ctx.redirect(MY_POEMS).await;
        }
        Err(e) => report_failure(ctx, "Failed to delete poem", &e),
    }
}
