use log::info;

use crate::export::{ExportSnapshot, SchemeKey};
use crate::intent::{Binding, Intent};
use crate::model::PostId;
use crate::route::VIEW_POEM;
use crate::surface::ModalAction;
use crate::view::ViewContext;
use crate::views::report_failure;

const SHARE_BUTTON_CLASS: &str = "nav-btn px-2 py-1 text-xs";

pub fn button_id(post: &PostId) -> String {
    format!("share-btn-{post}")
}

pub fn button(post: &PostId) -> String {
    format!(
        r#"<button id="{}" class="share-btn rounded-lg px-4 py-2 font-semibold bg-blue-200 text-blue-800">🔗 Share</button>"#,
        button_id(post)
    )
}

pub fn binding(post: &PostId) -> Binding {
    Binding::click(button_id(post), Intent::Share { post: post.clone() })
}

pub fn link_fragment(post: &PostId) -> String {
    format!("{VIEW_POEM}/{post}")
}

pub fn open(ctx: &ViewContext, post: &PostId) {
    ctx.show_modal(
        "Share this poem",
        vec![
            ModalAction::new(
                "Copy Link",
                SHARE_BUTTON_CLASS,
                Some(Intent::CopyLink { post: post.clone() }),
            ),
            ModalAction::new(
                "Download as Image",
                SHARE_BUTTON_CLASS,
                Some(Intent::ChooseExportStyle { post: post.clone() }),
            ),
        ],
    );
}

pub fn copy_link(ctx: &ViewContext, post: &PostId) {
    ctx.copy_text(&ctx.share_link(&link_fragment(post)));
    ctx.show_toast("Link copied!");
}

/// Waits for the share modal to close, then offers the colour schemes.
pub async fn choose_style(ctx: &ViewContext, post: &PostId) {
    ctx.sleep(ctx.config().export_delay_millis).await;

    let mut actions: Vec<ModalAction> = SchemeKey::ALL
        .into_iter()
        .map(|scheme| {
            ModalAction::new(
                scheme.colors().name,
                SHARE_BUTTON_CLASS,
                Some(Intent::ExportImage {
                    post: post.clone(),
                    scheme,
                }),
            )
        })
        .collect();
    actions.push(ModalAction::new("Cancel", "bg-gray-300 text-gray-800", None));
    ctx.show_modal("Choose Export Style", actions);
}

/// Renders the full post, not what the page happens to show, as an image.
pub async fn export(ctx: &ViewContext, post: &PostId, scheme: SchemeKey) {
    let loading = ctx.loading();
    let result = ctx.gateway().get_post(post).await;
    drop(loading);

    match result {
        Ok(full) => {
            info!("exporting {} with the {} scheme", post, scheme.key());
            ctx.export_image(ExportSnapshot::of_post(&full, scheme));
        }
        Err(e) => report_failure(ctx, "Failed to export poem", &e),
    }
}
