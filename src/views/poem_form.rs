//! Creating and editing posts.

use async_trait::async_trait;
use log::info;

use crate::error::AppError;
use crate::format::{escape_html, parse_tags, tags_to_string};
use crate::intent::{field, Binding, FormValues, Intent};
use crate::model::{NewPost, Post, PostFields, PostId};
use crate::route::{MY_POEMS, VIEW_POEM};
use crate::view::{View, ViewContext};
use crate::views::{inline_error, notice, placeholder, report_failure, CARD_TITLE_STYLE, INPUT_CLASS};

pub const LOGIN_REQUIRED: &str = "You must be logged in to add a poem.";
pub const NOT_OWNER: &str = "You are not authorized to edit this poem.";
pub const FIELDS_REQUIRED: &str = "Title and content are required.";

const FORM_ID: &str = "poem-form";
pub const TITLE_INPUT: &str = "poem-title";
pub const CONTENT_INPUT: &str = "poem-content";
pub const TAGS_INPUT: &str = "poem-tags";

pub struct AddPoemView;
pub struct EditPoemView;

#[async_trait(?Send)]
impl View for AddPoemView {
    async fn render(&self, ctx: ViewContext, _param: Option<String>) {
        if ctx.identity().is_none() {
            ctx.commit(&notice(LOGIN_REQUIRED));
            return;
        }

        ctx.commit(&format!(
            r#"
<form id="{FORM_ID}" class="cozy-card flex flex-col gap-5 border border-blue-100 shadow-lg bg-white/90" style="max-width: 520px; margin: 2.5em auto 0 auto;">
  <h2 class="text-3xl font-bold mb-0 text-center text-blue-800" style="font-family: 'Quicksand', sans-serif;">Add a new poem</h2>
  <div class="text-center text-gray-500 text-base mb-2" style="font-family: 'Quicksand', sans-serif;">Share your thoughts, feelings, or stories in verse.</div>
  <input type="text" id="{TITLE_INPUT}" class="{INPUT_CLASS} text-lg" placeholder="Title" required />
  <textarea id="{CONTENT_INPUT}" class="{INPUT_CLASS} text-base" placeholder="Your thoughts..." rows="7" required></textarea>
  <input type="text" id="{TAGS_INPUT}" class="{INPUT_CLASS} text-base" placeholder="Tags (comma separated)" />
  <div class="flex gap-3 mt-2">
    <button type="submit" class="nav-btn flex-1 text-lg">Add Poem</button>
    <button type="button" id="cancel-btn" class="nav-btn flex-1 bg-gray-100 text-blue-700 border border-blue-100 hover:bg-blue-100">Cancel</button>
  </div>
</form>"#
        ));
        ctx.bind(vec![
            Binding::submit(FORM_ID, Intent::SavePost { editing: None }),
            Binding::click("cancel-btn", Intent::Navigate(MY_POEMS.into())),
        ]);
    }
}

#[async_trait(?Send)]
impl View for EditPoemView {
    async fn render(&self, ctx: ViewContext, param: Option<String>) {
        ctx.commit(&placeholder("Loading poem..."));
        let _loading = ctx.loading();

        let post = match load_owned(&ctx, param).await {
            Ok(post) => post,
            Err(AppError::Unauthorized(_)) => {
                ctx.commit(&placeholder(NOT_OWNER));
                return;
            }
            Err(e) => {
                ctx.commit(&inline_error("Failed to load poem", &e));
                return;
            }
        };

        ctx.commit(&edit_form(&post));
        ctx.bind(vec![
            Binding::submit(
                FORM_ID,
                Intent::SavePost {
                    editing: Some(post.id.clone()),
                },
            ),
            Binding::click(
                "cancel-btn",
                Intent::Navigate(format!("{VIEW_POEM}/{}", post.id)),
            ),
        ]);
    }
}

async fn load_owned(ctx: &ViewContext, param: Option<String>) -> Result<Post, AppError> {
    let id = param
        .map(PostId::new)
        .ok_or_else(|| AppError::NotFound("poem".into()))?;
    let post = ctx.gateway().get_post(&id).await?;
    if !post.is_owned_by(ctx.identity()) {
        return Err(AppError::Unauthorized("edit this poem".into()));
    }
    Ok(post)
}

fn edit_form(post: &Post) -> String {
    format!(
        r#"
<form id="{FORM_ID}" class="cozy-card flex flex-col gap-4" style="max-width: 480px; margin: 0 auto;">
  <h2 class="text-2xl font-bold mb-2 text-center" style="{CARD_TITLE_STYLE}">Edit Poem</h2>
  <input type="text" id="{TITLE_INPUT}" class="{INPUT_CLASS}" placeholder="Title" value="{title}" required />
  <textarea id="{CONTENT_INPUT}" class="{INPUT_CLASS}" placeholder="Poem content" rows="6" required>{content}</textarea>
  <input type="text" id="{TAGS_INPUT}" class="{INPUT_CLASS}" placeholder="Tags (comma separated)" value="{tags}" />
  <div class="flex gap-2">
    <button type="submit" class="nav-btn flex-1">Save Changes</button>
    <button type="button" id="cancel-btn" class="nav-btn flex-1" style="background: #f1f5f9; color: #64748b;">Cancel</button>
  </div>
</form>"#,
        title = escape_html(&post.title),
        content = escape_html(&post.content),
        tags = escape_html(&tags_to_string(&post.tags)),
    )
}

pub fn fields_from(form: &FormValues) -> PostFields {
    PostFields {
        title: field(form, TITLE_INPUT).trim().to_owned(),
        content: field(form, CONTENT_INPUT).trim().to_owned(),
        tags: parse_tags(field(form, TAGS_INPUT)),
    }
}

pub async fn save(ctx: &ViewContext, editing: Option<&PostId>, form: &FormValues) {
    let identity = match ctx.identity() {
        Some(identity) => identity,
        None => {
            ctx.show_message(LOGIN_REQUIRED);
            return;
        }
    };
    let fields = fields_from(form);
    if fields.title.is_empty() || fields.content.is_empty() {
        ctx.show_message(FIELDS_REQUIRED);
        return;
    }

    let loading = ctx.loading();
    match editing {
        None => {
            let post = NewPost {
                fields,
                owner: identity.id.clone(),
            };
            let result = ctx.gateway().create_post(post).await;
            drop(loading);
            match result {
                Ok(created) => {
                    info!("created poem {}", created.id);
                    ctx.show_toast("Poem added!");
                    ctx.redirect(MY_POEMS).await;
                }
                Err(e) => report_failure(ctx, "Failed to add poem", &e),
            }
        }
        Some(id) => {
            let result = ctx.gateway().update_post(id, fields).await;
            drop(loading);
            match result {
                Ok(_) => {
                    info!("updated poem {}", id);
                    ctx.show_toast("Poem updated!");
                    ctx.redirect(&format!("{VIEW_POEM}/{id}")).await;
                }
                Err(e) => report_failure(ctx, "Failed to update poem", &e),
            }
        }
    }
}
