//! Runs what an interaction asked for.

use log::debug;

use crate::intent::{FormValues, Intent};
use crate::view::ViewContext;
use crate::views::{auth, comments, discover, likes, poem_form, share, view_poem};

pub async fn perform(ctx: &ViewContext, intent: Intent, form: FormValues) {
    debug!("{:?} on {}", intent, ctx.route().name);

    match intent {
        Intent::Navigate(hash) => ctx.navigate_to(&hash),
        Intent::DismissModal => ctx.hide_modal(),
        Intent::PromptLogin(message) => ctx.show_message(message),
        Intent::Logout => auth::logout(ctx).await,

        Intent::Login => auth::login(ctx, &form).await,
        Intent::Register => auth::register(ctx, &form).await,
        Intent::RequestReset => auth::request_reset(ctx, &form).await,
        Intent::SetNewPassword(tokens) => auth::set_new_password(ctx, &tokens, &form).await,

        Intent::SavePost { editing } => poem_form::save(ctx, editing.as_ref(), &form).await,
        Intent::ConfirmDeletePost { post } => view_poem::confirm_delete(ctx, &post),
        Intent::DeletePost { post } => view_poem::delete(ctx, &post).await,
        Intent::SeeMore { post } => view_poem::see_more(ctx, &post).await,
        Intent::Search => discover::search(ctx, &form),

        Intent::ToggleLike { post } => likes::toggle_like(ctx, &post).await,

        Intent::Share { post } => share::open(ctx, &post),
        Intent::CopyLink { post } => share::copy_link(ctx, &post),
        Intent::ChooseExportStyle { post } => share::choose_style(ctx, &post).await,
        Intent::ExportImage { post, scheme } => share::export(ctx, &post, scheme).await,

        Intent::ToggleComments { post } => comments::toggle(ctx, &post).await,
        Intent::SubmitComment { post } => comments::submit(ctx, &post, &form).await,
        Intent::EditComment { post, comment } => comments::begin_edit(ctx, &post, &comment).await,
        Intent::CancelCommentEdit { comment } => comments::cancel_edit(ctx, &comment),
        Intent::SaveComment { post, comment } => comments::save(ctx, &post, &comment, &form).await,
        Intent::DeleteComment { post, comment } => comments::delete(ctx, &post, &comment).await,
    }
}
