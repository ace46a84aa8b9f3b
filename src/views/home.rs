use async_trait::async_trait;

use crate::format::{escape_html, excerpt, format_date};
use crate::model::{Post, PostFilter};
use crate::route::VIEW_POEM;
use crate::view::{View, ViewContext};
use crate::views::{inline_error, placeholder};

pub const RECENT_LIMIT: usize = 10;
pub const EXCERPT_CHARS: usize = 120;

pub const EMPTY_MESSAGE: &str = "No poems found. Be the first to share!";

pub struct HomeView;

#[async_trait(?Send)]
impl View for HomeView {
    async fn render(&self, ctx: ViewContext, _param: Option<String>) {
        ctx.commit(&placeholder("Loading poems..."));
        let _loading = ctx.loading();

        match ctx.gateway().list_posts(&PostFilter::default()).await {
            Ok(posts) => ctx.commit(&page(&posts)),
            Err(e) => ctx.commit(&inline_error("Failed to load poems", &e)),
        };
    }
}

fn page(posts: &[Post]) -> String {
    let items = if posts.is_empty() {
        format!(r#"<li class="text-center text-gray-500">{EMPTY_MESSAGE}</li>"#)
    } else {
        posts.iter().take(RECENT_LIMIT).map(item).collect()
    };

    format!(
        r#"<div class="max-w-3xl mx-auto p-6 bg-white rounded-lg shadow">
  <div class="font-bold text-2xl mb-4 text-center">Discover Poems</div>
  <ul class="grid gap-4">{items}</ul>
</div>"#
    )
}

fn item(post: &Post) -> String {
    let (text, cut) = excerpt(&post.content, EXCERPT_CHARS);
    format!(
        r#"
    <li class="p-4 bg-gray-50 rounded-lg shadow hover:shadow-md transition">
      <a href="{VIEW_POEM}/{id}" class="block">
        <div class="text-xl font-semibold text-blue-700 hover:underline mb-1">{title}</div>
        <div class="text-xs text-gray-400 mb-2">By: <span class="font-mono">{owner}</span> • {date}</div>
        <div class="text-gray-700 line-clamp-3">{text}{ellipsis}</div>
      </a>
    </li>"#,
        id = escape_html(post.id.as_str()),
        title = escape_html(&post.title),
        owner = escape_html(post.owner.short()),
        date = format_date(&post.created_at),
        text = escape_html(text),
        ellipsis = if cut { "..." } else { "" },
    )
}
