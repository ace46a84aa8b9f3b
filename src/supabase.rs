//! [`Gateway`] and [`AuthClient`] over the hosted backend's HTTP APIs.
//!
//! Tables go through the PostgREST endpoint (`/rest/v1`), accounts through
//! the auth endpoint (`/auth/v1`) and post changes through the realtime
//! socket. Requests are plain [`RestRequest`] values handed to a
//! [`Transport`], so nothing here depends on the browser.

use std::rc::Rc;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::json;

use crate::config::Config;
use crate::error::{AppError, AppResult, RemoteOperationError};
use crate::gateway::{AuthClient, ChangeCallback, Gateway, RecoveryTokens, Subscription};
use crate::model::{Comment, CommentId, Identity, Like, NewComment, NewPost, Post, PostFields, PostFilter, PostId, UserId};
use crate::realtime::{decode_frame, join_frame, RealtimeConnector};
use crate::rest::{content_range_total, decode_error, Method, RestRequest, RestResponse, Transport};

const POSTS: &str = "poems";
const COMMENTS: &str = "comments";
const LIKES: &str = "likes";
const NO_ROWS: &str = "PGRST116";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// The signed-in session as persisted between page loads.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: Identity,
}

pub trait TokenStore {
    fn load(&self) -> Option<StoredSession>;
    fn save(&self, session: &StoredSession);
    fn clear(&self);
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: Identity,
}

impl From<TokenResponse> for StoredSession {
    fn from(response: TokenResponse) -> Self {
        StoredSession {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            user: response.user,
        }
    }
}

pub struct SupabaseGateway {
    config: Config,
    transport: Rc<dyn Transport>,
    tokens: Rc<dyn TokenStore>,
    realtime: Rc<dyn RealtimeConnector>,
}

impl SupabaseGateway {
    pub fn new(
        config: Config,
        transport: Rc<dyn Transport>,
        tokens: Rc<dyn TokenStore>,
        realtime: Rc<dyn RealtimeConnector>,
    ) -> Self {
        SupabaseGateway {
            config,
            transport,
            tokens,
            realtime,
        }
    }

    fn bearer(&self) -> String {
        self.tokens
            .load()
            .map(|session| session.access_token)
            .unwrap_or_else(|| self.config.anon_key.clone())
    }

    fn request(&self, method: Method, url: String) -> RestRequest {
        self.request_as(method, url, &self.bearer())
    }

    fn request_as(&self, method: Method, url: String, token: &str) -> RestRequest {
        RestRequest::new(method, url)
            .header("apikey", self.config.anon_key.clone())
            .header("Authorization", format!("Bearer {token}"))
    }

    fn table(&self, method: Method, table: &str) -> RestRequest {
        self.request(method, self.config.rest_url(table))
    }

    /// Sends a request, renewing the stored session once when the backend
    /// rejects its access token.
    async fn send(&self, request: RestRequest) -> Result<RestResponse, RemoteOperationError> {
        let stored = self
            .tokens
            .load()
            .filter(|session| request.bearer() == Some(session.access_token.as_str()));
        let stored = match stored {
            Some(stored) => stored,
            None => return self.send_once(request).await,
        };

        debug!("{:?} {}", request.method, request.url);
        let retry = request.clone();
        let response = self.transport.send(request).await?;
        if response.status != 401 {
            return self.check(response);
        }

        info!("access token rejected, refreshing session");
        match self
            .token_grant("refresh_token", json!({ "refresh_token": stored.refresh_token }))
            .await
        {
            Ok(session) => self.send_once(retry.authorize(&session.access_token)).await,
            Err(e) => {
                warn!("session refresh failed: {}", e);
                self.check(response)
            }
        }
    }

    async fn send_once(&self, request: RestRequest) -> Result<RestResponse, RemoteOperationError> {
        debug!("{:?} {}", request.method, request.url);
        let response = self.transport.send(request).await?;
        self.check(response)
    }

    fn check(&self, response: RestResponse) -> Result<RestResponse, RemoteOperationError> {
        if response.ok() {
            Ok(response)
        } else {
            let error = decode_error(&response);
            warn!("backend request failed: {}", error);
            Err(error)
        }
    }

    /// Sends a request that must return exactly one row.
    async fn fetch_one<T: serde::de::DeserializeOwned>(
        &self,
        request: RestRequest,
        what: &str,
    ) -> AppResult<T> {
        match self.send(request.header("Accept", SINGLE_OBJECT)).await {
            Ok(response) => Ok(response.json()?),
            Err(error) if error.code == NO_ROWS => Err(AppError::NotFound(what.to_owned())),
            Err(error) => Err(error.into()),
        }
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> AppResult<StoredSession> {
        let request = self
            .request_as(Method::Post, self.config.auth_url("token"), &self.config.anon_key)
            .query("grant_type", grant_type)
            .json(&body);
        let response = self.send_once(request).await?;
        let session: StoredSession = response.json::<TokenResponse>()?.into();
        self.tokens.save(&session);
        Ok(session)
    }

    async fn fetch_user(&self, access_token: &str) -> Result<RestResponse, RemoteOperationError> {
        let request = self.request_as(Method::Get, self.config.auth_url("user"), access_token);
        Ok(self.transport.send(request).await?)
    }
}

#[async_trait(?Send)]
impl Gateway for SupabaseGateway {
    async fn list_posts(&self, filter: &PostFilter) -> AppResult<Vec<Post>> {
        let mut request = self
            .table(Method::Get, POSTS)
            .query("select", "*")
            .query("order", "created_at.desc");
        if let Some(owner) = &filter.owner {
            request = request.eq("user_id", owner.as_str());
        }

        let posts: Vec<Post> = self.send(request).await?.json()?;
        if filter.needle().is_none() {
            return Ok(posts);
        }
        Ok(posts.into_iter().filter(|post| filter.matches(post)).collect())
    }

    async fn get_post(&self, id: &PostId) -> AppResult<Post> {
        let request = self
            .table(Method::Get, POSTS)
            .query("select", "*")
            .eq("id", id.as_str());
        self.fetch_one(request, "poem").await
    }

    async fn create_post(&self, post: NewPost) -> AppResult<Post> {
        let request = self
            .table(Method::Post, POSTS)
            .header("Prefer", "return=representation")
            .json(&json!([post]));
        self.fetch_one(request, "poem").await
    }

    async fn update_post(&self, id: &PostId, fields: PostFields) -> AppResult<Post> {
        let request = self
            .table(Method::Patch, POSTS)
            .eq("id", id.as_str())
            .header("Prefer", "return=representation")
            .json(&json!(fields));
        self.fetch_one(request, "poem").await
    }

    async fn delete_post(&self, id: &PostId) -> AppResult<()> {
        self.send(self.table(Method::Delete, POSTS).eq("id", id.as_str()))
            .await?;
        Ok(())
    }

    async fn increment_views(&self, id: &PostId) -> AppResult<()> {
        let request = self
            .request(Method::Post, self.config.rpc_url("increment_views"))
            .json(&json!({ "poem_id": id }));
        self.send(request).await?;
        Ok(())
    }

    async fn list_comments(&self, post: &PostId) -> AppResult<Vec<Comment>> {
        let request = self
            .table(Method::Get, COMMENTS)
            .query("select", "*")
            .eq("poem_id", post.as_str())
            .query("order", "created_at.asc");
        Ok(self.send(request).await?.json()?)
    }

    async fn create_comment(&self, comment: NewComment) -> AppResult<Comment> {
        let request = self
            .table(Method::Post, COMMENTS)
            .header("Prefer", "return=representation")
            .json(&json!([comment]));
        self.fetch_one(request, "comment").await
    }

    async fn update_comment(&self, id: &CommentId, text: &str) -> AppResult<Comment> {
        let request = self
            .table(Method::Patch, COMMENTS)
            .eq("id", id.as_str())
            .header("Prefer", "return=representation")
            .json(&json!({ "comment_text": text }));
        self.fetch_one(request, "comment").await
    }

    async fn delete_comment(&self, id: &CommentId) -> AppResult<()> {
        self.send(self.table(Method::Delete, COMMENTS).eq("id", id.as_str()))
            .await?;
        Ok(())
    }

    async fn like_count(&self, post: &PostId) -> AppResult<u64> {
        let request = self
            .table(Method::Head, LIKES)
            .query("select", "*")
            .eq("poem_id", post.as_str())
            .header("Prefer", "count=exact");
        let response = self.send(request).await?;
        response
            .header("Content-Range")
            .and_then(content_range_total)
            .ok_or_else(|| RemoteOperationError::decode("missing like count").into())
    }

    async fn has_liked(&self, post: &PostId, user: &UserId) -> AppResult<bool> {
        let request = self
            .table(Method::Get, LIKES)
            .query("select", "*")
            .eq("poem_id", post.as_str())
            .eq("user_id", user.as_str())
            .query("limit", "1");
        let likes: Vec<Like> = self.send(request).await?.json()?;
        Ok(!likes.is_empty())
    }

    async fn like(&self, post: &PostId, user: &UserId) -> AppResult<()> {
        let like = Like {
            post_id: post.clone(),
            owner: user.clone(),
        };
        let request = self
            .table(Method::Post, LIKES)
            .header("Prefer", "return=minimal")
            .json(&json!([like]));
        self.send(request).await?;
        Ok(())
    }

    async fn unlike(&self, post: &PostId, user: &UserId) -> AppResult<()> {
        let request = self
            .table(Method::Delete, LIKES)
            .eq("poem_id", post.as_str())
            .eq("user_id", user.as_str());
        self.send(request).await?;
        Ok(())
    }

    fn subscribe_to_post_changes(&self, callback: ChangeCallback, owner: Option<UserId>) -> Subscription {
        let frame = join_frame(owner.as_ref(), &self.bearer(), 1);
        let on_message = Box::new(move |text: &str| {
            if let Some(event) = decode_frame(text) {
                if event.concerns(owner.as_ref()) {
                    callback(event);
                }
            }
        });
        self.realtime
            .open(&self.config.realtime_url(), frame, on_message)
    }
}

#[async_trait(?Send)]
impl AuthClient for SupabaseGateway {
    async fn current_identity(&self) -> AppResult<Option<Identity>> {
        let stored = match self.tokens.load() {
            Some(stored) => stored,
            None => return Ok(None),
        };

        let response = self.fetch_user(&stored.access_token).await?;
        if response.ok() {
            return Ok(Some(response.json()?));
        }
        if response.status != 401 && response.status != 403 {
            return Err(decode_error(&response).into());
        }

        info!("access token rejected, refreshing session");
        match self
            .token_grant("refresh_token", json!({ "refresh_token": stored.refresh_token }))
            .await
        {
            Ok(session) => Ok(Some(session.user)),
            Err(AppError::Remote(error)) if error.code != "network" => {
                info!("session refresh failed ({}), signing out locally", error);
                self.tokens.clear();
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        let session = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;
        Ok(session.user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> AppResult<()> {
        let request = self
            .request_as(Method::Post, self.config.auth_url("signup"), &self.config.anon_key)
            .json(&json!({ "email": email, "password": password }));
        self.send(request).await?;
        Ok(())
    }

    async fn sign_out(&self) -> AppResult<()> {
        let stored = self.tokens.load();
        self.tokens.clear();
        if let Some(stored) = stored {
            let request = self.request_as(
                Method::Post,
                self.config.auth_url("logout"),
                &stored.access_token,
            );
            self.send(request).await?;
        }
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> AppResult<()> {
        let request = self
            .request_as(Method::Post, self.config.auth_url("recover"), &self.config.anon_key)
            .json(&json!({ "email": email }));
        self.send(request).await?;
        Ok(())
    }

    async fn update_password(&self, recovery: &RecoveryTokens, new_password: &str) -> AppResult<()> {
        let request = self
            .request_as(Method::Put, self.config.auth_url("user"), &recovery.access_token)
            .json(&json!({ "password": new_password }));
        self.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryTokenStore, ScriptedTransport};
    use std::cell::RefCell;

    struct NoRealtime {
        opened: RefCell<Vec<(String, String)>>,
        handler: RefCell<Option<Box<dyn Fn(&str)>>>,
    }

    impl RealtimeConnector for NoRealtime {
        fn open(&self, url: &str, join_frame: String, on_message: Box<dyn Fn(&str)>) -> Subscription {
            self.opened.borrow_mut().push((url.to_owned(), join_frame));
            *self.handler.borrow_mut() = Some(on_message);
            Subscription::inert()
        }
    }

    fn gateway() -> (SupabaseGateway, Rc<ScriptedTransport>, Rc<MemoryTokenStore>, Rc<NoRealtime>) {
        let transport = Rc::new(ScriptedTransport::default());
        let tokens = Rc::new(MemoryTokenStore::default());
        let realtime = Rc::new(NoRealtime {
            opened: RefCell::new(Vec::new()),
            handler: RefCell::new(None),
        });
        let gateway = SupabaseGateway::new(
            Config::new("https://demo.supabase.co", "anon"),
            transport.clone(),
            tokens.clone(),
            realtime.clone(),
        );
        (gateway, transport, tokens, realtime)
    }

    const POST_ROW: &str = r#"{"id":1,"title":"Tide","content":"salt","tags":["sea"],"user_id":"u1","created_at":"2024-02-02T08:00:00Z","views_count":4}"#;

    #[tokio::test]
    async fn lists_posts_newest_first_for_an_owner() {
        let (gateway, transport, _, _) = gateway();
        transport.respond(RestResponse::new(200, format!("[{POST_ROW}]")));

        let posts = gateway
            .list_posts(&PostFilter::owned_by(UserId::new("u1")))
            .await
            .unwrap();

        assert_eq!(posts.len(), 1);
        let sent = transport.sent();
        assert_eq!(sent[0].method, Method::Get);
        assert_eq!(
            sent[0].url,
            "https://demo.supabase.co/rest/v1/poems?select=%2A&order=created_at.desc&user_id=eq.u1"
        );
        assert_eq!(sent[0].header_value("apikey"), Some("anon"));
        assert_eq!(sent[0].header_value("Authorization"), Some("Bearer anon"));
    }

    #[tokio::test]
    async fn search_filters_the_full_listing_client_side() {
        let (gateway, transport, _, _) = gateway();
        transport.respond(RestResponse::new(200, format!("[{POST_ROW}]")));

        let posts = gateway.list_posts(&PostFilter::search("moon")).await.unwrap();

        assert!(posts.is_empty());
        assert!(!transport.sent()[0].url.contains("moon"));
    }

    #[tokio::test]
    async fn missing_single_row_is_not_found() {
        let (gateway, transport, _, _) = gateway();
        transport.respond(RestResponse::new(
            406,
            r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#,
        ));

        let result = gateway.get_post(&PostId::new("404")).await;

        assert_eq!(result, Err(AppError::NotFound("poem".into())));
        assert_eq!(transport.sent()[0].header_value("Accept"), Some(SINGLE_OBJECT));
    }

    #[tokio::test]
    async fn other_failures_keep_the_provider_code() {
        let (gateway, transport, _, _) = gateway();
        transport.respond(RestResponse::new(
            403,
            r#"{"code":"42501","message":"new row violates row-level security policy"}"#,
        ));

        let result = gateway.delete_post(&PostId::new("1")).await;

        assert_eq!(
            result,
            Err(AppError::Remote(RemoteOperationError::new(
                "42501",
                "new row violates row-level security policy"
            )))
        );
    }

    #[tokio::test]
    async fn transport_failures_are_network_errors() {
        let (gateway, _transport, _, _) = gateway();

        let result = gateway.increment_views(&PostId::new("1")).await;

        assert!(matches!(result, Err(AppError::Remote(error)) if error.code == "network"));
    }

    #[tokio::test]
    async fn like_count_comes_from_content_range() {
        let (gateway, transport, _, _) = gateway();
        transport.respond(RestResponse::new(200, "").with_header("content-range", "*/3"));

        assert_eq!(gateway.like_count(&PostId::new("1")).await, Ok(3));
        let sent = transport.sent();
        assert_eq!(sent[0].method, Method::Head);
        assert_eq!(sent[0].header_value("Prefer"), Some("count=exact"));
    }

    #[tokio::test]
    async fn increments_views_through_the_rpc() {
        let (gateway, transport, _, _) = gateway();
        transport.respond(RestResponse::new(204, ""));

        gateway.increment_views(&PostId::new("9")).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].url, "https://demo.supabase.co/rest/v1/rpc/increment_views");
        assert_eq!(sent[0].body.as_deref(), Some(r#"{"poem_id":"9"}"#));
    }

    #[tokio::test]
    async fn sign_in_persists_the_session_and_authorises_later_calls() {
        let (gateway, transport, tokens, _) = gateway();
        transport.respond(RestResponse::new(
            200,
            r#"{"access_token":"at","refresh_token":"rt","token_type":"bearer","user":{"id":"u1","email":"a@b.c"}}"#,
        ));
        transport.respond(RestResponse::new(200, "[]"));

        let identity = gateway.sign_in("a@b.c", "secret").await.unwrap();
        gateway.list_comments(&PostId::new("1")).await.unwrap();

        assert_eq!(identity.id, UserId::new("u1"));
        assert_eq!(tokens.load().unwrap().refresh_token, "rt");
        let sent = transport.sent();
        assert!(sent[0].url.ends_with("/auth/v1/token?grant_type=password"));
        assert_eq!(sent[1].header_value("Authorization"), Some("Bearer at"));
    }

    #[tokio::test]
    async fn expired_access_token_is_refreshed_once() {
        let (gateway, transport, tokens, _) = gateway();
        tokens.save(&StoredSession {
            access_token: "old".into(),
            refresh_token: "rt".into(),
            user: Identity {
                id: UserId::new("u1"),
                email: None,
            },
        });
        transport.respond(RestResponse::new(401, r#"{"msg":"JWT expired"}"#));
        transport.respond(RestResponse::new(
            200,
            r#"{"access_token":"new","refresh_token":"rt2","user":{"id":"u1"}}"#,
        ));

        let identity = gateway.current_identity().await.unwrap();

        assert_eq!(identity.map(|identity| identity.id), Some(UserId::new("u1")));
        assert_eq!(tokens.load().unwrap().access_token, "new");
        assert!(transport.sent()[1].url.ends_with("grant_type=refresh_token"));
    }

    #[tokio::test]
    async fn table_requests_retry_once_with_a_renewed_token() {
        let (gateway, transport, tokens, _) = gateway();
        tokens.save(&StoredSession {
            access_token: "old".into(),
            refresh_token: "rt".into(),
            user: Identity {
                id: UserId::new("u1"),
                email: None,
            },
        });
        transport.respond(RestResponse::new(401, r#"{"code":"PGRST301","message":"JWT expired"}"#));
        transport.respond(RestResponse::new(
            200,
            r#"{"access_token":"new","refresh_token":"rt2","user":{"id":"u1"}}"#,
        ));
        transport.respond(RestResponse::new(200, "[]"));

        let comments = gateway.list_comments(&PostId::new("1")).await.unwrap();

        assert!(comments.is_empty());
        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].bearer(), Some("old"));
        assert!(sent[1].url.ends_with("grant_type=refresh_token"));
        assert_eq!(sent[2].bearer(), Some("new"));
        assert_eq!(sent[2].url, sent[0].url);
        assert_eq!(tokens.load().unwrap().refresh_token, "rt2");
    }

    #[tokio::test]
    async fn anonymous_requests_are_not_retried() {
        let (gateway, transport, _, _) = gateway();
        transport.respond(RestResponse::new(401, r#"{"code":"42501","message":"permission denied"}"#));

        let result = gateway.list_comments(&PostId::new("1")).await;

        assert!(result.is_err());
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn rejected_refresh_signs_out_locally() {
        let (gateway, transport, tokens, _) = gateway();
        tokens.save(&StoredSession {
            access_token: "old".into(),
            refresh_token: "gone".into(),
            user: Identity {
                id: UserId::new("u1"),
                email: None,
            },
        });
        transport.respond(RestResponse::new(401, "{}"));
        transport.respond(RestResponse::new(
            400,
            r#"{"error":"invalid_grant","error_description":"Refresh Token Not Found"}"#,
        ));

        assert_eq!(gateway.current_identity().await, Ok(None));
        assert_eq!(tokens.load(), None);
    }

    #[tokio::test]
    async fn anonymous_visitors_need_no_round_trip() {
        let (gateway, transport, _, _) = gateway();

        assert_eq!(gateway.current_identity().await, Ok(None));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn change_feed_filters_by_owner() {
        let (gateway, _, _, realtime) = gateway();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();

        let _subscription = gateway.subscribe_to_post_changes(
            Box::new(move |event| sink.borrow_mut().push(event)),
            Some(UserId::new("u1")),
        );

        let (url, frame) = realtime.opened.borrow()[0].clone();
        assert!(url.starts_with("wss://demo.supabase.co/realtime/v1/websocket"));
        assert!(frame.contains("user_id=eq.u1"));

        let handler = realtime.handler.borrow();
        let handler = handler.as_ref().unwrap();
        handler(r#"{"event":"postgres_changes","payload":{"data":{"type":"UPDATE","record":{"id":1,"title":"x","content":"","user_id":"u2","created_at":"2024-01-01T00:00:00Z"}}}}"#);
        handler(r#"{"event":"postgres_changes","payload":{"data":{"type":"UPDATE","record":{"id":2,"title":"y","content":"","user_id":"u1","created_at":"2024-01-01T00:00:00Z"}}}}"#);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].post_id, Some(PostId::new("2")));
    }
}
