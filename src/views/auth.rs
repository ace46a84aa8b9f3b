//! Login, registration and password reset pages, plus logout.

use async_trait::async_trait;
use log::info;

use crate::gateway::RecoveryTokens;
use crate::intent::{field, Binding, FormValues, Intent};
use crate::route::{HOME, LOGIN, MY_POEMS, REGISTER, RESET};
use crate::view::{View, ViewContext};
use crate::views::{report_failure, CARD_TITLE_STYLE, INPUT_CLASS};

pub struct LoginView;
pub struct RegisterView;
pub struct ResetView;

fn credentials_form(form_id: &str, prefix: &str, heading: &str, submit: &str, extra: &str) -> String {
    format!(
        r#"
<form id="{form_id}" class="cozy-card flex flex-col gap-4" style="max-width: 400px; margin: 0 auto;">
  <h2 class="text-2xl font-bold mb-2 text-center" style="{CARD_TITLE_STYLE}">{heading}</h2>
  <input type="email" id="{prefix}-email" class="{INPUT_CLASS}" placeholder="Email" required />
  <input type="password" id="{prefix}-password" class="{INPUT_CLASS}" placeholder="Password" required />
  <button type="submit" class="nav-btn">{submit}</button>
  {extra}
</form>"#
    )
}

#[async_trait(?Send)]
impl View for LoginView {
    async fn render(&self, ctx: ViewContext, _param: Option<String>) {
        let links = r#"<button type="button" id="to-reset" class="text-blue-600">Forgot Password?</button>
  <button type="button" id="to-register" class="text-blue-600">New here? Register</button>"#;
        ctx.commit(&credentials_form("login-form", "login", "Login", "Login", links));
        ctx.bind(vec![
            Binding::submit("login-form", Intent::Login),
            Binding::click("to-reset", Intent::Navigate(RESET.into())),
            Binding::click("to-register", Intent::Navigate(REGISTER.into())),
        ]);
    }
}

#[async_trait(?Send)]
impl View for RegisterView {
    async fn render(&self, ctx: ViewContext, _param: Option<String>) {
        let links = r#"<button type="button" id="to-login" class="text-blue-600 underline">Already have an account? Login</button>"#;
        ctx.commit(&credentials_form(
            "register-form",
            "register",
            "Register",
            "Register",
            links,
        ));
        ctx.bind(vec![
            Binding::submit("register-form", Intent::Register),
            Binding::click("to-login", Intent::Navigate(LOGIN.into())),
        ]);
    }
}

/// The tokens a recovery link carries, if this dispatch came from one.
fn recovery_tokens(ctx: &ViewContext) -> Option<RecoveryTokens> {
    let route = ctx.route();
    if route.query_value("type") != Some("recovery") {
        return None;
    }
    let access_token = route
        .query_value("access_token")
        .filter(|token| !token.is_empty())?;
    Some(RecoveryTokens {
        access_token: access_token.to_owned(),
        refresh_token: route.query_value("refresh_token").map(str::to_owned),
    })
}

#[async_trait(?Send)]
impl View for ResetView {
    async fn render(&self, ctx: ViewContext, _param: Option<String>) {
        match recovery_tokens(&ctx) {
            Some(tokens) => {
                ctx.commit(&format!(
                    r#"
<form id="new-password-form" class="cozy-card flex flex-col gap-4" style="max-width: 400px; margin: 0 auto;">
  <h2 class="text-2xl font-bold mb-2 text-center" style="{CARD_TITLE_STYLE}">Set New Password</h2>
  <input type="password" id="new-password" class="{INPUT_CLASS}" placeholder="New Password" required minlength="6" />
  <button type="submit" class="nav-btn">Update Password</button>
</form>"#
                ));
                ctx.bind(vec![Binding::submit(
                    "new-password-form",
                    Intent::SetNewPassword(tokens),
                )]);
            }
            None => {
                ctx.commit(&format!(
                    r#"
<form id="reset-form" class="cozy-card flex flex-col gap-4" style="max-width: 400px; margin: 0 auto;">
  <h2 class="text-2xl font-bold mb-2 text-center" style="{CARD_TITLE_STYLE}">Send Link</h2>
  <input type="email" id="reset-email" class="{INPUT_CLASS}" placeholder="Email" required />
  <button type="submit" class="nav-btn">Send Link</button>
  <button type="button" id="to-login" class="text-blue-600">Back to Login</button>
</form>"#
                ));
                ctx.bind(vec![
                    Binding::submit("reset-form", Intent::RequestReset),
                    Binding::click("to-login", Intent::Navigate(LOGIN.into())),
                ]);
            }
        }
    }
}

pub async fn login(ctx: &ViewContext, form: &FormValues) {
    let loading = ctx.loading();
    let email = field(form, "login-email").trim();
    let result = ctx.auth().sign_in(email, field(form, "login-password")).await;
    drop(loading);

    match result {
        Ok(identity) => {
            info!("signed in as {}", identity.id);
            ctx.show_toast("Login successful!");
            ctx.redirect(MY_POEMS).await;
        }
        Err(e) => report_failure(ctx, "Login failed", &e),
    }
}

pub async fn register(ctx: &ViewContext, form: &FormValues) {
    let loading = ctx.loading();
    let email = field(form, "register-email").trim();
    let result = ctx.auth().sign_up(email, field(form, "register-password")).await;
    drop(loading);

    match result {
        Ok(()) => {
            ctx.show_toast("Registration successful! Please check your email to confirm.");
            ctx.redirect_after(LOGIN, ctx.config().toast_millis).await;
        }
        Err(e) => report_failure(ctx, "Registration failed", &e),
    }
}

pub async fn request_reset(ctx: &ViewContext, form: &FormValues) {
    let loading = ctx.loading();
    let result = ctx
        .auth()
        .send_password_reset(field(form, "reset-email").trim())
        .await;
    drop(loading);

    match result {
        Ok(()) => {
            ctx.show_toast("Password reset email sent! Check your inbox.");
            ctx.redirect_after(LOGIN, ctx.config().toast_millis).await;
        }
        Err(e) => report_failure(ctx, "Reset failed", &e),
    }
}

pub async fn set_new_password(ctx: &ViewContext, tokens: &RecoveryTokens, form: &FormValues) {
    let loading = ctx.loading();
    let result = ctx
        .auth()
        .update_password(tokens, field(form, "new-password"))
        .await;
    drop(loading);

    match result {
        Ok(()) => {
            ctx.show_toast("Password updated! You can now log in.");
            ctx.redirect_after(LOGIN, ctx.config().toast_millis).await;
        }
        Err(e) => report_failure(ctx, "Password update failed", &e),
    }
}

pub async fn logout(ctx: &ViewContext) {
    let loading = ctx.loading();
    let result = ctx.auth().sign_out().await;
    drop(loading);

    match result {
        Ok(()) => {
            info!("signed out");
            ctx.show_toast("Logged out!");
            ctx.redirect(HOME).await;
        }
        Err(e) => report_failure(ctx, "Logout failed", &e),
    }
}
