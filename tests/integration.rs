extern crate unblot;

use unblot::error::{AppError, RemoteOperationError};
use unblot::export::SchemeKey;
use unblot::intent::{FormValues, Intent};
use unblot::model::{PostId, UserId};
use unblot::platform::Location;
use unblot::router::DispatchState;
use unblot::testing::Harness;
use unblot::views::{comments, home, likes, my_poems, poem_form, view_poem};
use unblot::Config;

fn harness() -> Harness {
    unblot::init_logger();
    Harness::new()
}

fn poem_route(id: &PostId) -> String {
    format!("#view-poem/{id}")
}

#[test]
fn unknown_route_renders_the_home_view() {
    let h = harness();

    h.visit("#no-such-page");

    assert!(h.surface.content().contains(home::EMPTY_MESSAGE));
    assert_eq!(h.router.views_rendered(), 1);
}

#[test]
fn unknown_route_falls_back_to_the_configured_home() {
    unblot::init_logger();
    let mut config = Config::new("https://demo.supabase.co", "anon");
    config.home_route = "#discover".into();
    let h = Harness::with_config(config);

    h.visit("#no-such-page");

    assert!(h.surface.content().contains("discover-search-form"));
}

#[test]
fn every_dispatch_invokes_exactly_one_view() {
    let h = harness();

    h.visit("#home");
    h.visit("#login");
    h.visit("#discover");
    h.visit("#discover");

    assert_eq!(h.router.views_rendered(), 4);
    assert_eq!(h.router.generation(), 4);
    assert_eq!(h.router.state(), DispatchState::Idle);
    assert!(!h.surface.is_loading());
}

#[test]
fn late_results_of_a_superseded_dispatch_are_discarded() {
    let h = harness();
    let me = h.sign_in("a@b.c");
    let post = h.backend.insert_post(&me.id, "Slow", "takes a while", &[]);
    let release = h.backend.hold("get_post");

    h.visit(&poem_route(&post.id));
    assert!(h.surface.content().contains("Loading poem..."));
    assert_eq!(h.router.state(), DispatchState::Dispatching);

    h.visit("#login");
    assert!(h.surface.content().contains("login-form"));

    release.send(()).unwrap();
    h.run();

    let content = h.surface.content();
    assert!(content.contains("login-form"));
    assert!(!content.contains("Views:"));
    assert_eq!(h.router.state(), DispatchState::Idle);
    assert!(!h.surface.is_loading());
}

#[tokio::test]
async fn failing_session_lookup_still_dispatches_anonymously() {
    let h = harness();
    h.sign_in("a@b.c");
    h.backend.fail_next(
        "current_identity",
        RemoteOperationError::network("offline").into(),
    );
    h.location.replace_silently("#my-poems");

    h.router.dispatch_current_route().await;

    assert!(h.surface.content().contains(my_poems::LOGIN_REQUIRED));
    assert_eq!(h.surface.sessions().last(), Some(&None));
    assert_eq!(h.router.session(), None);
}

#[test]
fn superseded_session_lookup_leaves_the_navigation_alone() {
    let h = harness();
    let first = h.sign_in("a@b.c");
    let release = h.backend.hold("current_identity");

    h.visit("#discover");
    h.visit("#login");
    assert_eq!(h.router.session(), Some(first.clone()));

    let second = h.sign_in("b@c.d");
    release.send(()).unwrap();
    h.run();

    assert_ne!(first, second);
    assert_eq!(h.router.session(), Some(first.clone()));
    assert_eq!(h.surface.sessions().last(), Some(&Some(first)));
    assert!(h.surface.content().contains("login-form"));
}

#[test]
fn live_changes_refresh_my_poems_in_place() {
    let h = harness();
    let me = h.sign_in("a@b.c");

    h.visit("#my-poems");
    assert!(h.surface.content().contains(my_poems::EMPTY_MESSAGE));
    assert!(h.router.has_subscription());

    h.backend.insert_post(&me.id, "Fresh", "new lines", &[]);
    h.run();

    assert!(h.surface.content().contains("Fresh"));
    assert_eq!(h.backend.calls_of("list_posts"), 2);
    // in-place refreshes neither look up the session nor count as dispatches
    assert_eq!(h.backend.calls_of("current_identity"), 1);
    assert_eq!(h.backend.calls_of("subscribe"), 1);
    assert_eq!(h.router.views_rendered(), 1);

    h.backend
        .insert_post(&UserId::new("someone-else"), "Foreign", "not mine", &[]);
    h.run();
    assert_eq!(h.backend.calls_of("list_posts"), 2);
}

#[test]
fn navigating_away_closes_the_change_feed() {
    let h = harness();
    h.sign_in("a@b.c");

    h.visit("#my-poems");
    assert_eq!(h.backend.listener_count(), 1);

    h.visit("#home");
    assert!(!h.router.has_subscription());
    assert_eq!(h.backend.listener_count(), 0);
}

#[test]
fn like_toggles_and_redraws_without_counting_a_view() {
    let h = harness();
    let me = h.sign_in("a@b.c");
    let post = h.backend.insert_post(&me.id, "Tide", "salt", &[]);

    h.visit(&poem_route(&post.id));
    assert!(h.surface.content().contains("Like (0)"));
    assert!(h.surface.content().contains("Views: 1"));

    assert!(h.click(&likes::button_id(&post.id)));
    assert_eq!(h.backend.likes_of(&post.id), 1);
    assert!(h.surface.content().contains("Like (1)"));
    assert!(h.surface.content().contains("Views: 1"));

    assert!(h.click(&likes::button_id(&post.id)));
    assert_eq!(h.backend.likes_of(&post.id), 0);
    assert!(h.surface.content().contains("Like (0)"));

    assert_eq!(h.backend.calls_of("increment_views"), 1);
    assert_eq!(h.router.views_rendered(), 1);
}

#[test]
fn each_visit_to_a_poem_counts_one_view() {
    let h = harness();
    let post = h
        .backend
        .insert_post(&UserId::new("u1"), "Tide", "salt", &[]);
    let initial = h.backend.post(&post.id).map(|p| p.views_count).unwrap();

    for _ in 0..3 {
        h.visit(&poem_route(&post.id));
        h.visit("#home");
    }
    h.visit(&poem_route(&post.id));
    h.visit(&poem_route(&post.id));

    let counted = h.backend.post(&post.id).map(|p| p.views_count).unwrap();
    assert_eq!(counted, initial + 5);
    assert_eq!(h.backend.calls_of("increment_views"), 5);
    assert!(h.surface.content().contains(&format!("Views: {}", initial + 5)));
    assert_eq!(h.router.views_rendered(), 8);
}

#[test]
fn anonymous_like_asks_for_login() {
    let h = harness();
    let post = h
        .backend
        .insert_post(&UserId::new("u1"), "Tide", "salt", &[]);

    h.visit(&poem_route(&post.id));
    h.click(&likes::button_id(&post.id));

    assert_eq!(h.surface.modal_message().as_deref(), Some(likes::LOGIN_TO_LIKE));
    assert_eq!(h.backend.calls_of("like"), 0);
}

#[test]
fn comments_can_be_added_edited_and_deleted() {
    let h = harness();
    let me = h.sign_in("a@b.c");
    let post = h.backend.insert_post(&me.id, "Tide", "salt", &[]);
    h.visit(&poem_route(&post.id));

    assert!(h.click(&comments::toggle_id(&post.id)));
    assert!(!h.surface.is_hidden(&comments::section_id(&post.id)));

    let input = comments::input_id(&post.id);
    assert!(h.submit(&comments::form_id(&post.id), &[(input.as_str(), "  Lovely  ")]));
    let added = h.backend.comments_of(&post.id);
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].text, "Lovely");
    assert_eq!(h.surface.region(&comments::count_id(&post.id)).as_deref(), Some("1"));
    assert!(h
        .surface
        .region(&comments::body_id(&post.id))
        .unwrap()
        .contains("Lovely"));

    let comment = added[0].id.clone();
    assert!(h.click(&comments::edit_button_id(&comment)));
    let mut form = FormValues::new();
    form.insert(comments::edit_input_id(&comment), "Lovelier".into());
    assert!(h.fire(
        &format!("save-comment-{comment}"),
        unblot::intent::EventKind::Click,
        form
    ));
    assert_eq!(h.backend.comments_of(&post.id)[0].text, "Lovelier");

    assert!(h.click(&comments::delete_button_id(&comment)));
    assert!(h.backend.comments_of(&post.id).is_empty());
    assert_eq!(h.surface.region(&comments::count_id(&post.id)).as_deref(), Some("0"));
}

#[test]
fn anonymous_comment_is_refused_without_a_request() {
    let h = harness();
    let post = h
        .backend
        .insert_post(&UserId::new("u1"), "Tide", "salt", &[]);
    h.visit(&poem_route(&post.id));

    h.click(&comments::toggle_id(&post.id));
    assert_eq!(
        h.surface.modal_message().as_deref(),
        Some(comments::LOGIN_TO_COMMENT)
    );

    let input = comments::input_id(&post.id);
    h.submit(&comments::form_id(&post.id), &[(input.as_str(), "hello")]);

    assert_eq!(h.backend.calls_of("create_comment"), 0);
    assert!(h.backend.comments_of(&post.id).is_empty());
}

#[test]
fn discover_shows_the_empty_and_no_match_states() {
    let h = harness();

    h.visit("#discover");
    assert!(h.surface.content().contains(home::EMPTY_MESSAGE));

    h.backend
        .insert_post(&UserId::new("u1"), "Moonrise", "silver", &["night"]);
    h.submit("discover-search-form", &[("discover-search", "zzz")]);
    assert_eq!(h.location.fragment(), "#discover?q=zzz");
    assert!(h
        .surface
        .content()
        .contains(unblot::views::discover::NO_MATCHES));

    h.submit("discover-search-form", &[("discover-search", "NIGHT")]);
    assert!(h.surface.content().contains("Moonrise"));
}

#[test]
fn non_owner_cannot_open_the_editor() {
    let h = harness();
    let post = h
        .backend
        .insert_post(&UserId::new("someone-else"), "Theirs", "words", &[]);
    h.sign_in("a@b.c");

    h.visit(&format!("#edit-poem/{}", post.id));

    assert!(h.surface.content().contains(poem_form::NOT_OWNER));
}

#[test]
fn only_owners_may_delete_or_change_what_they_wrote() {
    let h = harness();
    let other = UserId::new("someone-else");
    let post = h.backend.insert_post(&other, "Theirs", "not mine", &[]);
    let comment = h.backend.insert_comment(&post.id, &other, "first");
    h.sign_in("a@b.c");
    h.visit(&poem_route(&post.id));
    let sink = h.router.sink();

    sink(Intent::DeletePost { post: post.id.clone() }, FormValues::new());
    h.run();
    assert_eq!(
        h.surface.modal_message().as_deref(),
        Some("Failed to delete poem: not authorized to delete this poem")
    );

    sink(
        Intent::DeleteComment {
            post: post.id.clone(),
            comment: comment.id.clone(),
        },
        FormValues::new(),
    );
    h.run();
    assert_eq!(
        h.surface.modal_message().as_deref(),
        Some("Failed to delete comment: not authorized to delete this comment")
    );

    let mut form = FormValues::new();
    form.insert(comments::edit_input_id(&comment.id), "mine now".into());
    sink(
        Intent::SaveComment {
            post: post.id.clone(),
            comment: comment.id.clone(),
        },
        form,
    );
    h.run();

    assert_eq!(h.backend.calls_of("delete_post"), 0);
    assert_eq!(h.backend.calls_of("delete_comment"), 0);
    assert_eq!(h.backend.calls_of("update_comment"), 0);
    assert!(h.backend.post(&post.id).is_some());
    assert_eq!(h.backend.comments_of(&post.id)[0].text, "first");
}

#[test]
fn adding_a_poem_redirects_to_my_poems() {
    let h = harness();
    h.sign_in("a@b.c");
    h.visit("#add-poem");

    h.submit(
        "poem-form",
        &[
            (poem_form::TITLE_INPUT, "Dawn"),
            (poem_form::CONTENT_INPUT, "first light"),
            (poem_form::TAGS_INPUT, "morning, , sun"),
        ],
    );

    let posts = h.backend.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].tags, vec!["morning", "sun"]);
    assert!(h.surface.messages().contains(&"Poem added!".to_owned()));
    assert_eq!(h.location.fragment(), "#my-poems");
    assert!(h.surface.content().contains("Dawn"));
}

#[test]
fn poem_without_a_title_is_not_saved() {
    let h = harness();
    h.sign_in("a@b.c");
    h.visit("#add-poem");

    h.submit("poem-form", &[(poem_form::CONTENT_INPUT, "untitled")]);

    assert_eq!(
        h.surface.modal_message().as_deref(),
        Some(poem_form::FIELDS_REQUIRED)
    );
    assert_eq!(h.backend.calls_of("create_post"), 0);
    assert!(h.backend.posts().is_empty());
}

#[test]
fn owner_edits_then_deletes_a_poem() {
    let h = harness();
    let me = h.sign_in("a@b.c");
    let post = h.backend.insert_post(&me.id, "Old", "words", &[]);

    h.visit(&format!("#edit-poem/{}", post.id));
    assert!(h.surface.content().contains(r#"value="Old""#));
    h.submit(
        "poem-form",
        &[
            (poem_form::TITLE_INPUT, "New"),
            (poem_form::CONTENT_INPUT, "better words"),
            (poem_form::TAGS_INPUT, "a,b"),
        ],
    );
    assert_eq!(h.location.fragment(), poem_route(&post.id));
    assert!(h.surface.content().contains("New"));

    assert!(h.click("delete-btn"));
    assert_eq!(
        h.surface.modal_message().as_deref(),
        Some(view_poem::CONFIRM_DELETE)
    );
    assert!(h.choose("Delete"));

    assert!(h.backend.posts().is_empty());
    assert!(h.surface.messages().contains(&"Poem deleted!".to_owned()));
    assert_eq!(h.location.fragment(), "#my-poems");
}

#[test]
fn failed_view_count_does_not_block_the_page() {
    let h = harness();
    let post = h
        .backend
        .insert_post(&UserId::new("u1"), "Tide", "salt", &[]);
    h.backend.fail_next(
        "increment_views",
        AppError::Remote(RemoteOperationError::new("42883", "function does not exist")),
    );

    h.visit(&poem_route(&post.id));

    assert!(h.surface.content().contains("Tide"));
    assert!(h.surface.content().contains("Views: 0"));
}

#[test]
fn missing_poem_shows_an_inline_error() {
    let h = harness();

    h.visit("#view-poem/404");

    assert!(h
        .surface
        .content()
        .contains("Failed to load poem: poem not found"));
}

#[test]
fn login_redirects_and_failures_are_reported() {
    let h = harness();
    h.backend.register_user("a@b.c", "secret");
    h.visit("#login");

    h.submit("login-form", &[("login-email", "a@b.c"), ("login-password", "nope")]);
    assert_eq!(
        h.surface.modal_message().as_deref(),
        Some("Login failed: Invalid login credentials")
    );

    h.submit("login-form", &[("login-email", "a@b.c"), ("login-password", "secret")]);
    assert!(h.surface.messages().contains(&"Login successful!".to_owned()));
    assert_eq!(h.location.fragment(), "#my-poems");
    assert!(h.surface.content().contains("My Poems"));
    assert!(h.scheduler.sleeps().contains(&1000));
}

#[test]
fn recovery_link_sets_a_new_password() {
    let h = harness();

    h.visit("#access_token=tok&refresh_token=r&type=recovery");
    assert!(h.surface.content().contains("new-password-form"));

    h.submit("new-password-form", &[("new-password", "s3cret!")]);

    let updates = h.backend.password_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0.access_token, "tok");
    assert_eq!(updates[0].0.refresh_token.as_deref(), Some("r"));
    assert_eq!(updates[0].1, "s3cret!");
    assert_eq!(h.location.fragment(), "#login");
}

#[test]
fn navigation_bar_logout_signs_out() {
    let h = harness();
    h.sign_in("a@b.c");
    h.visit("#my-poems");

    (h.router.sink())(Intent::Logout, FormValues::new());
    h.run();

    assert_eq!(h.backend.signed_in(), None);
    assert!(h.surface.messages().contains(&"Logged out!".to_owned()));
    assert_eq!(h.location.fragment(), "#home");
    assert_eq!(h.surface.sessions().last(), Some(&None));
}

#[test]
fn share_copies_a_link_and_exports_an_image() {
    let h = harness();
    let post = h
        .backend
        .insert_post(&UserId::new("u1"), "Tide", "salt", &["sea"]);
    h.visit(&poem_route(&post.id));

    h.click(&format!("share-btn-{}", post.id));
    assert_eq!(h.surface.modal_labels(), vec!["Copy Link", "Download as Image"]);
    h.choose("Copy Link");
    assert_eq!(
        h.surface.copied(),
        vec![format!("https://unblot.test/#view-poem/{}", post.id)]
    );

    h.click(&format!("share-btn-{}", post.id));
    h.choose("Download as Image");
    assert_eq!(
        h.surface.modal_message().as_deref(),
        Some("Choose Export Style")
    );
    h.choose(SchemeKey::Mint.colors().name);

    let exports = h.surface.exports();
    assert_eq!(exports.len(), 1);
    assert_eq!(exports[0].file_name, format!("poem-{}.png", post.id));
    assert_eq!(exports[0].scheme, SchemeKey::Mint);
    assert_eq!(exports[0].tags, vec!["sea"]);
}
