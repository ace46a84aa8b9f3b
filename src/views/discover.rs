use async_trait::async_trait;

use crate::format::{escape_html, format_date};
use crate::intent::{field, Binding, FormValues, Intent};
use crate::model::{Post, PostFilter};
use crate::route::DISCOVER;
use crate::view::{View, ViewContext};
use crate::views::home::EMPTY_MESSAGE;
use crate::views::{comments, inline_error, likes, placeholder, share};

pub const SEARCH_KEY: &str = "q";
pub const SEARCH_INPUT: &str = "discover-search";
const SEARCH_FORM: &str = "discover-search-form";

pub const NO_MATCHES: &str = "No poems match your search.";

pub struct DiscoverView;

#[async_trait(?Send)]
impl View for DiscoverView {
    async fn render(&self, ctx: ViewContext, _param: Option<String>) {
        if !ctx.is_refresh() {
            ctx.commit(&placeholder("Loading poems..."));
        }
        let _loading = ctx.loading();

        let search = ctx
            .route()
            .query_value(SEARCH_KEY)
            .map(str::to_owned)
            .unwrap_or_default();
        let filter = PostFilter::search(search.clone());

        let posts = match ctx.gateway().list_posts(&filter).await {
            Ok(posts) => posts,
            Err(e) => {
                ctx.commit(&inline_error("Failed to load poems", &e));
                return;
            }
        };

        if !ctx.commit(&page(&ctx, &posts, &search, filter.needle().is_some())) {
            return;
        }

        let mut bindings = vec![Binding::submit(SEARCH_FORM, Intent::Search)];
        for post in &posts {
            bindings.push(share::binding(&post.id));
            bindings.push(comments::toggle_binding(&ctx, &post.id, true));
        }
        ctx.bind(bindings);

        for post in &posts {
            likes::show(&ctx, &post.id).await;
        }
    }
}

fn page(ctx: &ViewContext, posts: &[Post], search: &str, searching: bool) -> String {
    let items = match (posts.is_empty(), searching) {
        (true, true) => format!(r#"<li class="text-center text-gray-500">{NO_MATCHES}</li>"#),
        (true, false) => format!(r#"<li class="text-center text-gray-500">{EMPTY_MESSAGE}</li>"#),
        (false, _) => posts.iter().map(|post| item(ctx, post)).collect(),
    };

    format!(
        r#"<div class="w-full max-w-2xl mx-auto">
  <div class="font-bold text-2xl mb-4 text-center">Discover</div>
  <form id="{SEARCH_FORM}" class="flex gap-2 mb-4">
    <input type="search" id="{SEARCH_INPUT}" class="flex-1 rounded border px-3 py-2" placeholder="Search titles, text or tags..." value="{search}" />
    <button type="submit" class="nav-btn px-3 py-2">Search</button>
  </form>
  <ul class="grid gap-6">{items}</ul>
</div>"#,
        search = escape_html(search),
    )
}

fn item(ctx: &ViewContext, post: &Post) -> String {
    format!(
        r#"
    <li class="p-6 bg-white rounded-lg shadow flex flex-col gap-2">
      <div class="flex justify-between items-center mb-1">
        <div class="text-xl font-semibold text-blue-700">{title}</div>
        <div class="text-xs text-gray-400">{date}</div>
      </div>
      <div class="text-xs text-gray-400 mb-2">By: <span class="font-mono">{owner}</span></div>
      <div class="text-gray-700 whitespace-pre-line mb-2">{content}</div>
      <div class="flex gap-2 mb-2">
        <span id="{like_slot}">{like}</span>
        {toggle}
        {share}
      </div>
      {section}
    </li>"#,
        title = escape_html(&post.title),
        date = format_date(&post.created_at),
        owner = escape_html(post.owner.short()),
        content = escape_html(&post.content),
        like_slot = likes::slot_id(&post.id),
        like = likes::button(&post.id, None),
        toggle = comments::toggle_button(&post.id, None),
        share = share::button(&post.id),
        section = comments::section(ctx, &post.id, None),
    )
}

/// Reloads the page filtered by what is in the search box.
pub fn search(ctx: &ViewContext, form: &FormValues) {
    let needle = field(form, SEARCH_INPUT).trim();
    if needle.is_empty() {
        ctx.navigate_to(DISCOVER);
    } else {
        ctx.navigate_to(&format!(
            "{DISCOVER}?{SEARCH_KEY}={}",
            urlencoding::encode(needle)
        ));
    }
}
