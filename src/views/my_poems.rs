use async_trait::async_trait;
use log::debug;

use crate::format::{escape_html, format_date};
use crate::intent::{Binding, Intent};
use crate::model::{Identity, Post, PostFilter};
use crate::realtime::ChangeEvent;
use crate::route::{ADD_POEM, VIEW_POEM};
use crate::view::{View, ViewContext};
use crate::views::{inline_error, placeholder};

pub const LOGIN_REQUIRED: &str = "You must be logged in to view your poems.";
pub const EMPTY_MESSAGE: &str = "No poems yet. Click 'Add New Poem' to create your first poem!";

pub struct MyPoemsView;

#[async_trait(?Send)]
impl View for MyPoemsView {
    async fn render(&self, ctx: ViewContext, _param: Option<String>) {
        if !ctx.is_refresh() {
            ctx.commit(&placeholder("Loading your poems..."));
        }
        let _loading = ctx.loading();

        let identity = match ctx.identity() {
            Some(identity) => identity.clone(),
            None => {
                ctx.commit(&placeholder(LOGIN_REQUIRED));
                return;
            }
        };

        let filter = PostFilter::owned_by(identity.id.clone());
        match ctx.gateway().list_posts(&filter).await {
            Ok(posts) => {
                if ctx.commit(&page(&identity, &posts)) {
                    ctx.bind(vec![Binding::click(
                        "add-poem-btn",
                        Intent::Navigate(ADD_POEM.into()),
                    )]);
                }
            }
            Err(e) => {
                ctx.commit(&inline_error("Failed to load poems", &e));
            }
        }

        if !ctx.is_refresh() {
            follow_changes(&ctx, &identity);
        }
    }
}

/// Redraws the list whenever one of the user's posts changes elsewhere.
fn follow_changes(ctx: &ViewContext, identity: &Identity) {
    let refresh_ctx = ctx.clone();
    let subscription = ctx.gateway().subscribe_to_post_changes(
        Box::new(move |event: ChangeEvent| {
            debug!("{:?} on {:?}, refreshing my poems", event.kind, event.post_id);
            let ctx = refresh_ctx.clone();
            refresh_ctx.spawn(async move { ctx.refresh_in_place().await });
        }),
        Some(identity.id.clone()),
    );
    ctx.hold(subscription);
}

fn page(identity: &Identity, posts: &[Post]) -> String {
    let items = if posts.is_empty() {
        format!(r#"<li class="py-4 text-center text-gray-500">{EMPTY_MESSAGE}</li>"#)
    } else {
        posts
            .iter()
            .map(|post| {
                format!(
                    r#"
    <li class="py-4">
      <a href="{VIEW_POEM}/{id}" class="text-blue-700 hover:underline text-lg font-semibold">{title}</a>
      <div class="text-xs text-gray-400">Created: {date}</div>
    </li>"#,
                    id = escape_html(post.id.as_str()),
                    title = escape_html(&post.title),
                    date = format_date(&post.created_at),
                )
            })
            .collect()
    };

    format!(
        r#"<div class="max-w-2xl mx-auto p-6 bg-white rounded-lg shadow">
  <div class="flex justify-between items-center mb-4">
    <div class="font-bold text-xl">My Poems</div>
    <button id="add-poem-btn" class="bg-blue-600 text-white rounded-lg px-4 py-2 font-semibold">Add New Poem</button>
  </div>
  <div class="mb-2 text-gray-500">User: <span class="font-mono">{user}</span></div>
  <ul class="divide-y">{items}</ul>
</div>"#,
        user = escape_html(identity.id.as_str()),
    )
}
