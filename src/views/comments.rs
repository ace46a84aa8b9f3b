//! The collapsible comment section shared by the discover and poem pages.

use log::debug;

use crate::error::{AppError, AppResult};
use crate::format::{escape_html, format_date};
use crate::intent::{field, Binding, EventKind, FormValues, Intent};
use crate::model::{Comment, CommentId, Identity, NewComment, PostId};
use crate::view::ViewContext;
use crate::views::{inline_error, report_failure};

pub const LOGIN_TO_COMMENT: &str = "Login to comment on poems!";

pub fn section_id(post: &PostId) -> String {
    format!("comments-section-{post}")
}

pub fn body_id(post: &PostId) -> String {
    format!("comments-body-{post}")
}

pub fn count_id(post: &PostId) -> String {
    format!("comments-count-{post}")
}

pub fn toggle_id(post: &PostId) -> String {
    format!("toggle-comments-{post}")
}

pub fn form_id(post: &PostId) -> String {
    format!("comment-form-{post}")
}

pub fn input_id(post: &PostId) -> String {
    format!("comment-input-{post}")
}

fn edit_slot_id(comment: &CommentId) -> String {
    format!("comment-edit-{comment}")
}

pub fn edit_input_id(comment: &CommentId) -> String {
    format!("edit-comment-input-{comment}")
}

pub fn edit_button_id(comment: &CommentId) -> String {
    format!("edit-comment-{comment}")
}

pub fn delete_button_id(comment: &CommentId) -> String {
    format!("delete-comment-{comment}")
}

fn save_button_id(comment: &CommentId) -> String {
    format!("save-comment-{comment}")
}

fn cancel_button_id(comment: &CommentId) -> String {
    format!("cancel-comment-{comment}")
}

/// The toggle button; `count` is filled in once comments are loaded.
pub fn toggle_button(post: &PostId, count: Option<usize>) -> String {
    format!(
        r#"<button id="{id}" class="toggle-comments-btn nav-btn px-2 py-1 text-xs">💬 Comments (<span id="{count_id}">{count}</span>)</button>"#,
        id = toggle_id(post),
        count_id = count_id(post),
        count = count.map(|count| count.to_string()).unwrap_or_default(),
    )
}

/// The hidden section, optionally with its comments already in place.
pub fn section(ctx: &ViewContext, post: &PostId, comments: Option<&[Comment]>) -> String {
    let body = comments
        .map(|comments| body(ctx.identity(), post, comments))
        .unwrap_or_default();
    format!(
        r#"<div id="{section}" class="comments-section mt-2 hidden">
  <div class="font-semibold text-sm text-blue-900 mb-1">Comments</div>
  <div id="{body_id}">{body}</div>
</div>"#,
        section = section_id(post),
        body_id = body_id(post),
    )
}

fn body(identity: Option<&Identity>, post: &PostId, comments: &[Comment]) -> String {
    let items: String = comments.iter().map(|comment| item(identity, comment)).collect();
    let disabled = if identity.is_none() { " disabled" } else { "" };
    let login_note = if identity.is_none() {
        r#"<div class="text-gray-500">Login to comment.</div>"#
    } else {
        ""
    };
    format!(
        r#"<ul class="comments-list text-sm mb-2">{items}</ul>
<form id="{form}" class="comment-form flex gap-2 mt-2">
  <input id="{input}" class="comment-input flex-1 rounded border px-2 py-1 text-sm" placeholder="Add a comment..." required{disabled} />
  <button type="submit" class="nav-btn px-2 py-1 text-xs"{disabled}>Post</button>
</form>
{login_note}"#,
        form = form_id(post),
        input = input_id(post),
    )
}

fn item(identity: Option<&Identity>, comment: &Comment) -> String {
    let controls = if comment.is_owned_by(identity) {
        format!(
            r#"<div class="flex gap-2 pl-20">
      <button id="{edit}" class="edit-comment-btn text-xs text-blue-800">Edit</button>
      <button id="{delete}" class="delete-comment-btn text-xs text-red-800">Delete</button>
    </div>
    <div id="{slot}"></div>"#,
            edit = edit_button_id(&comment.id),
            delete = delete_button_id(&comment.id),
            slot = edit_slot_id(&comment.id),
        )
    } else {
        String::new()
    };

    format!(
        r#"
  <li class="flex flex-col gap-1 py-2">
    <div class="text-xs text-gray-400">{date}</div>
    <div class="flex items-start gap-2">
      <span class="font-semibold">{owner}</span>:
      <span class="flex-1">{text}</span>
    </div>
    {controls}
  </li>"#,
        date = format_date(&comment.created_at),
        owner = escape_html(comment.owner.short()),
        text = escape_html(&comment.text),
    )
}

/// Bindings for the toggle button. Anonymous visitors may be allowed to
/// read the comments or be asked to log in first.
pub fn toggle_binding(ctx: &ViewContext, post: &PostId, anonymous_may_read: bool) -> Binding {
    let intent = if ctx.identity().is_some() || anonymous_may_read {
        Intent::ToggleComments { post: post.clone() }
    } else {
        Intent::PromptLogin(LOGIN_TO_COMMENT)
    };
    Binding::click(toggle_id(post), intent)
}

/// Bindings for everything inside the section body.
pub fn body_bindings(ctx: &ViewContext, post: &PostId, comments: &[Comment]) -> Vec<Binding> {
    let mut bindings = vec![Binding::submit(
        form_id(post),
        Intent::SubmitComment { post: post.clone() },
    )];
    if ctx.identity().is_none() {
        bindings.push(Binding::new(
            input_id(post),
            EventKind::Focus,
            Intent::PromptLogin(LOGIN_TO_COMMENT),
        ));
    }

    for comment in comments.iter().filter(|c| c.is_owned_by(ctx.identity())) {
        bindings.push(Binding::click(
            edit_button_id(&comment.id),
            Intent::EditComment {
                post: post.clone(),
                comment: comment.id.clone(),
            },
        ));
        bindings.push(Binding::click(
            delete_button_id(&comment.id),
            Intent::DeleteComment {
                post: post.clone(),
                comment: comment.id.clone(),
            },
        ));
    }
    bindings
}

/// Fetches the comments again and redraws the section body and count.
pub async fn reload(ctx: &ViewContext, post: &PostId) {
    match ctx.gateway().list_comments(post).await {
        Ok(comments) => {
            ctx.region(&count_id(post), &comments.len().to_string());
            if ctx.region(&body_id(post), &body(ctx.identity(), post, &comments)) {
                ctx.bind(body_bindings(ctx, post, &comments));
            }
        }
        Err(e) => {
            ctx.region(&body_id(post), &inline_error("Failed to load comments", &e));
        }
    }
}

pub async fn toggle(ctx: &ViewContext, post: &PostId) {
    if ctx.toggle_hidden(&section_id(post)) == Some(false) {
        reload(ctx, post).await;
    }
}

pub async fn submit(ctx: &ViewContext, post: &PostId, form: &FormValues) {
    let identity = match ctx.identity() {
        Some(identity) => identity,
        None => {
            ctx.show_message(LOGIN_TO_COMMENT);
            return;
        }
    };
    let text = field(form, &input_id(post)).trim();
    if text.is_empty() {
        return;
    }

    let comment = NewComment {
        post_id: post.clone(),
        owner: identity.id.clone(),
        text: text.to_owned(),
    };
    match ctx.gateway().create_comment(comment).await {
        Ok(created) => {
            debug!("added comment {} to {}", created.id, post);
            reload(ctx, post).await;
        }
        Err(e) => report_failure(ctx, "Failed to add comment", &e),
    }
}

/// Opens the inline editor under one of the user's comments.
pub async fn begin_edit(ctx: &ViewContext, post: &PostId, comment: &CommentId) {
    let comments = match ctx.gateway().list_comments(post).await {
        Ok(comments) => comments,
        Err(e) => {
            report_failure(ctx, "Failed to load comment", &e);
            return;
        }
    };
    let original = match comments.iter().find(|c| &c.id == comment) {
        Some(original) => original,
        None => return,
    };

    let editor = format!(
        r#"<input id="{input}" class="edit-comment-input border rounded px-2 py-1 text-sm w-full" value="{text}" />
<button id="{save}" class="save-edit-btn nav-btn px-2 py-1 text-xs">Save</button>
<button id="{cancel}" class="cancel-edit-btn nav-btn px-2 py-1 text-xs">Cancel</button>"#,
        input = edit_input_id(comment),
        text = escape_html(&original.text),
        save = save_button_id(comment),
        cancel = cancel_button_id(comment),
    );
    if ctx.region(&edit_slot_id(comment), &editor) {
        ctx.bind(vec![
            Binding::click(
                save_button_id(comment),
                Intent::SaveComment {
                    post: post.clone(),
                    comment: comment.clone(),
                },
            ),
            Binding::click(
                cancel_button_id(comment),
                Intent::CancelCommentEdit {
                    comment: comment.clone(),
                },
            ),
        ]);
    }
}

pub fn cancel_edit(ctx: &ViewContext, comment: &CommentId) {
    ctx.region(&edit_slot_id(comment), "");
}

/// Loads `comment` and checks it belongs to the signed-in user.
async fn owned(ctx: &ViewContext, post: &PostId, comment: &CommentId, action: &str) -> AppResult<Comment> {
    let found = ctx
        .gateway()
        .list_comments(post)
        .await?
        .into_iter()
        .find(|c| &c.id == comment)
        .ok_or_else(|| AppError::NotFound("comment".into()))?;
    if !found.is_owned_by(ctx.identity()) {
        return Err(AppError::Unauthorized(action.to_owned()));
    }
    Ok(found)
}

pub async fn save(ctx: &ViewContext, post: &PostId, comment: &CommentId, form: &FormValues) {
    let text = field(form, &edit_input_id(comment)).trim();
    if text.is_empty() {
        return;
    }
    let result = match owned(ctx, post, comment, "edit this comment").await {
        Ok(_) => ctx.gateway().update_comment(comment, text).await.map(|_| ()),
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => reload(ctx, post).await,
        Err(e) => report_failure(ctx, "Failed to update comment", &e),
    }
}

pub async fn delete(ctx: &ViewContext, post: &PostId, comment: &CommentId) {
    let result = match owned(ctx, post, comment, "delete this comment").await {
        Ok(_) => ctx.gateway().delete_comment(comment).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => reload(ctx, post).await,
        Err(e) => report_failure(ctx, "Failed to delete comment", &e),
    }
}
