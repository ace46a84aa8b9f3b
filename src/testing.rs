//! In-memory stand-ins for the browser and the hosted backend.
//!
//! Everything the router and the views touch goes through a trait, so the
//! whole application can be driven from a plain test: the [`Harness`] wires a
//! [`Router`] to a [`MemoryBackend`], a [`RecordingSurface`], a
//! [`MemoryLocation`] and a [`ManualScheduler`] that is stepped by hand.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use futures_channel::oneshot;
use futures_util::future::{self, LocalBoxFuture};
use log::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, RemoteOperationError};
use crate::export::ExportSnapshot;
use crate::gateway::{AuthClient, ChangeCallback, Gateway, RecoveryTokens, Subscription};
use crate::intent::{Binding, EventKind, FormValues, Intent, IntentSink};
use crate::model::{Comment, CommentId, Identity, Like, NewComment, NewPost, Post, PostFields, PostFilter, PostId, UserId};
use crate::platform::{Location, Scheduler};
use crate::realtime::{ChangeEvent, ChangeKind};
use crate::rest::{RestRequest, RestResponse, Transport, TransportError};
use crate::router::{Router, Services};
use crate::supabase::{StoredSession, TokenStore};
use crate::surface::{ModalAction, Surface};
use crate::views::route_table;

/// Answers requests from a queue of canned responses and records what was
/// sent. An empty queue fails like a dropped connection.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<RestResponse>>,
    sent: RefCell<Vec<RestRequest>>,
}

impl ScriptedTransport {
    pub fn respond(&self, response: RestResponse) {
        self.responses.borrow_mut().push_back(response);
    }

    pub fn sent(&self) -> Vec<RestRequest> {
        self.sent.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn send(&self, request: RestRequest) -> Result<RestResponse, TransportError> {
        self.sent.borrow_mut().push(request);
        let next = self.responses.borrow_mut().pop_front();
        next.ok_or_else(|| TransportError("connection refused".into()))
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    session: RefCell<Option<StoredSession>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<StoredSession> {
        self.session.borrow().clone()
    }

    fn save(&self, session: &StoredSession) {
        *self.session.borrow_mut() = Some(session.clone());
    }

    fn clear(&self) {
        self.session.borrow_mut().take();
    }
}

struct Listener {
    id: u64,
    owner: Option<UserId>,
    callback: Rc<ChangeCallback>,
}

/// Tables, accounts and a change feed held in memory, with the row-level
/// rules of the hosted backend: only owners may change or delete their rows.
///
/// Every call is logged by operation name. A call can be made to fail once
/// with [`MemoryBackend::fail_next`] or to wait for the test with
/// [`MemoryBackend::hold`].
#[derive(Default)]
pub struct MemoryBackend {
    posts: RefCell<Vec<Post>>,
    comments: RefCell<Vec<Comment>>,
    likes: RefCell<Vec<Like>>,
    accounts: RefCell<HashMap<String, (String, Identity)>>,
    signed_in: RefCell<Option<Identity>>,
    next_id: Cell<u64>,
    clock: Cell<i64>,
    calls: RefCell<Vec<String>>,
    failures: RefCell<HashMap<&'static str, AppError>>,
    holds: RefCell<HashMap<&'static str, VecDeque<oneshot::Receiver<()>>>>,
    listeners: Rc<RefCell<Vec<Listener>>>,
    next_listener: Cell<u64>,
    reset_requests: RefCell<Vec<String>>,
    password_updates: RefCell<Vec<(RecoveryTokens, String)>>,
}

const START: i64 = 1_704_067_200;

fn denied() -> AppError {
    RemoteOperationError::new("42501", "permission denied").into()
}

impl MemoryBackend {
    fn next_id(&self) -> String {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id.to_string()
    }

    /// A minute later than the previous row.
    fn now(&self) -> DateTime<Utc> {
        let tick = self.clock.get() + 1;
        self.clock.set(tick);
        Utc.timestamp_opt(START + tick * 60, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    async fn enter(&self, op: &'static str) -> AppResult<()> {
        self.calls.borrow_mut().push(op.to_owned());
        let held = self.holds.borrow_mut().get_mut(op).and_then(VecDeque::pop_front);
        if let Some(release) = held {
            debug!("{} held", op);
            let _ = release.await;
        }
        match self.failures.borrow_mut().remove(op) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn require_user(&self) -> AppResult<Identity> {
        self.signed_in.borrow().clone().ok_or_else(denied)
    }

    fn emit(&self, event: ChangeEvent) {
        let callbacks: Vec<Rc<ChangeCallback>> = self
            .listeners
            .borrow()
            .iter()
            .filter(|listener| event.concerns(listener.owner.as_ref()))
            .map(|listener| listener.callback.clone())
            .collect();
        for callback in callbacks {
            callback(event.clone());
        }
    }

    fn emit_post(&self, kind: ChangeKind, post: &Post) {
        self.emit(ChangeEvent {
            kind,
            post_id: Some(post.id.clone()),
            post: (kind != ChangeKind::Delete).then(|| post.clone()),
            owner: Some(post.owner.clone()),
        });
    }

    /// Makes the next call of `op` fail with `error`.
    pub fn fail_next(&self, op: &'static str, error: AppError) {
        self.failures.borrow_mut().insert(op, error);
    }

    /// Makes the next call of `op` wait until the returned sender fires or
    /// is dropped.
    pub fn hold(&self, op: &'static str) -> oneshot::Sender<()> {
        let (release, wait) = oneshot::channel();
        self.holds.borrow_mut().entry(op).or_default().push_back(wait);
        release
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn calls_of(&self, op: &str) -> usize {
        self.calls.borrow().iter().filter(|call| *call == op).count()
    }

    pub fn register_user(&self, email: &str, password: &str) -> Identity {
        let identity = Identity {
            id: UserId::new(format!("user-{}", self.next_id())),
            email: Some(email.to_owned()),
        };
        self.accounts
            .borrow_mut()
            .insert(email.to_owned(), (password.to_owned(), identity.clone()));
        identity
    }

    pub fn sign_in_as(&self, identity: &Identity) {
        *self.signed_in.borrow_mut() = Some(identity.clone());
    }

    pub fn signed_in(&self) -> Option<Identity> {
        self.signed_in.borrow().clone()
    }

    /// Adds a post as if written from elsewhere; change listeners are told.
    pub fn insert_post(&self, owner: &UserId, title: &str, content: &str, tags: &[&str]) -> Post {
        let post = Post {
            id: PostId::new(self.next_id()),
            title: title.to_owned(),
            content: content.to_owned(),
            tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
            owner: owner.clone(),
            created_at: self.now(),
            views_count: 0,
        };
        self.posts.borrow_mut().push(post.clone());
        self.emit_post(ChangeKind::Insert, &post);
        post
    }

    pub fn insert_comment(&self, post: &PostId, owner: &UserId, text: &str) -> Comment {
        let comment = Comment {
            id: CommentId::new(self.next_id()),
            post_id: post.clone(),
            owner: owner.clone(),
            text: text.to_owned(),
            created_at: self.now(),
        };
        self.comments.borrow_mut().push(comment.clone());
        comment
    }

    pub fn post(&self, id: &PostId) -> Option<Post> {
        self.posts.borrow().iter().find(|post| &post.id == id).cloned()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.borrow().clone()
    }

    pub fn comments_of(&self, post: &PostId) -> Vec<Comment> {
        self.comments
            .borrow()
            .iter()
            .filter(|comment| &comment.post_id == post)
            .cloned()
            .collect()
    }

    pub fn likes_of(&self, post: &PostId) -> usize {
        self.likes.borrow().iter().filter(|like| &like.post_id == post).count()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn reset_requests(&self) -> Vec<String> {
        self.reset_requests.borrow().clone()
    }

    pub fn password_updates(&self) -> Vec<(RecoveryTokens, String)> {
        self.password_updates.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Gateway for MemoryBackend {
    async fn list_posts(&self, filter: &PostFilter) -> AppResult<Vec<Post>> {
        self.enter("list_posts").await?;
        let mut posts: Vec<Post> = self
            .posts
            .borrow()
            .iter()
            .filter(|post| filter.matches(post))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn get_post(&self, id: &PostId) -> AppResult<Post> {
        self.enter("get_post").await?;
        self.post(id).ok_or_else(|| AppError::NotFound("poem".into()))
    }

    async fn create_post(&self, post: NewPost) -> AppResult<Post> {
        self.enter("create_post").await?;
        let user = self.require_user()?;
        if user.id != post.owner {
            return Err(denied());
        }
        let NewPost { fields, owner } = post;
        let tags: Vec<&str> = fields.tags.iter().map(String::as_str).collect();
        Ok(self.insert_post(&owner, &fields.title, &fields.content, &tags))
    }

    async fn update_post(&self, id: &PostId, fields: PostFields) -> AppResult<Post> {
        self.enter("update_post").await?;
        let user = self.require_user()?;
        let updated = {
            let mut posts = self.posts.borrow_mut();
            let post = posts
                .iter_mut()
                .find(|post| &post.id == id)
                .ok_or_else(|| AppError::NotFound("poem".into()))?;
            if post.owner != user.id {
                return Err(denied());
            }
            post.title = fields.title;
            post.content = fields.content;
            post.tags = fields.tags;
            post.clone()
        };
        self.emit_post(ChangeKind::Update, &updated);
        Ok(updated)
    }

    async fn delete_post(&self, id: &PostId) -> AppResult<()> {
        self.enter("delete_post").await?;
        let user = self.require_user()?;
        let post = self.post(id).ok_or_else(|| AppError::NotFound("poem".into()))?;
        if post.owner != user.id {
            return Err(denied());
        }
        self.posts.borrow_mut().retain(|post| &post.id != id);
        self.comments.borrow_mut().retain(|comment| &comment.post_id != id);
        self.likes.borrow_mut().retain(|like| &like.post_id != id);
        self.emit_post(ChangeKind::Delete, &post);
        Ok(())
    }

    async fn increment_views(&self, id: &PostId) -> AppResult<()> {
        self.enter("increment_views").await?;
        let mut posts = self.posts.borrow_mut();
        if let Some(post) = posts.iter_mut().find(|post| &post.id == id) {
            post.views_count += 1;
        }
        Ok(())
    }

    async fn list_comments(&self, post: &PostId) -> AppResult<Vec<Comment>> {
        self.enter("list_comments").await?;
        let mut comments = self.comments_of(post);
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    async fn create_comment(&self, comment: NewComment) -> AppResult<Comment> {
        self.enter("create_comment").await?;
        let user = self.require_user()?;
        if user.id != comment.owner {
            return Err(denied());
        }
        Ok(self.insert_comment(&comment.post_id, &comment.owner, &comment.text))
    }

    async fn update_comment(&self, id: &CommentId, text: &str) -> AppResult<Comment> {
        self.enter("update_comment").await?;
        let user = self.require_user()?;
        let mut comments = self.comments.borrow_mut();
        let comment = comments
            .iter_mut()
            .find(|comment| &comment.id == id)
            .ok_or_else(|| AppError::NotFound("comment".into()))?;
        if comment.owner != user.id {
            return Err(denied());
        }
        comment.text = text.to_owned();
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: &CommentId) -> AppResult<()> {
        self.enter("delete_comment").await?;
        let user = self.require_user()?;
        let mut comments = self.comments.borrow_mut();
        match comments.iter().position(|comment| &comment.id == id) {
            Some(index) if comments[index].owner == user.id => {
                comments.remove(index);
                Ok(())
            }
            Some(_) => Err(denied()),
            None => Ok(()),
        }
    }

    async fn like_count(&self, post: &PostId) -> AppResult<u64> {
        self.enter("like_count").await?;
        Ok(self.likes_of(post) as u64)
    }

    async fn has_liked(&self, post: &PostId, user: &UserId) -> AppResult<bool> {
        self.enter("has_liked").await?;
        Ok(self
            .likes
            .borrow()
            .iter()
            .any(|like| &like.post_id == post && &like.owner == user))
    }

    async fn like(&self, post: &PostId, user: &UserId) -> AppResult<()> {
        self.enter("like").await?;
        let signed_in = self.require_user()?;
        if &signed_in.id != user {
            return Err(denied());
        }
        let mut likes = self.likes.borrow_mut();
        if likes.iter().any(|like| &like.post_id == post && &like.owner == user) {
            return Err(RemoteOperationError::new("23505", "duplicate key value violates unique constraint").into());
        }
        likes.push(Like {
            post_id: post.clone(),
            owner: user.clone(),
        });
        Ok(())
    }

    async fn unlike(&self, post: &PostId, user: &UserId) -> AppResult<()> {
        self.enter("unlike").await?;
        let signed_in = self.require_user()?;
        if &signed_in.id != user {
            return Err(denied());
        }
        self.likes
            .borrow_mut()
            .retain(|like| !(&like.post_id == post && &like.owner == user));
        Ok(())
    }

    fn subscribe_to_post_changes(&self, callback: ChangeCallback, owner: Option<UserId>) -> Subscription {
        self.calls.borrow_mut().push("subscribe".to_owned());
        let id = self.next_listener.get() + 1;
        self.next_listener.set(id);
        self.listeners.borrow_mut().push(Listener {
            id,
            owner,
            callback: Rc::new(callback),
        });

        let listeners = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().retain(|listener| listener.id != id);
            }
        })
    }
}

#[async_trait(?Send)]
impl AuthClient for MemoryBackend {
    async fn current_identity(&self) -> AppResult<Option<Identity>> {
        self.enter("current_identity").await?;
        Ok(self.signed_in())
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        self.enter("sign_in").await?;
        let identity = match self.accounts.borrow().get(email) {
            Some((expected, identity)) if expected == password => identity.clone(),
            _ => {
                return Err(RemoteOperationError::new("invalid_credentials", "Invalid login credentials").into())
            }
        };
        self.sign_in_as(&identity);
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> AppResult<()> {
        self.enter("sign_up").await?;
        if self.accounts.borrow().contains_key(email) {
            return Err(RemoteOperationError::new("user_already_exists", "User already registered").into());
        }
        self.register_user(email, password);
        Ok(())
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.enter("sign_out").await?;
        self.signed_in.borrow_mut().take();
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> AppResult<()> {
        self.enter("send_password_reset").await?;
        self.reset_requests.borrow_mut().push(email.to_owned());
        Ok(())
    }

    async fn update_password(&self, recovery: &RecoveryTokens, new_password: &str) -> AppResult<()> {
        self.enter("update_password").await?;
        self.password_updates
            .borrow_mut()
            .push((recovery.clone(), new_password.to_owned()));
        Ok(())
    }
}

/// A fragment that notifies listeners synchronously when it changes.
pub struct MemoryLocation {
    fragment: RefCell<String>,
    origin: String,
    listeners: RefCell<Vec<Rc<dyn Fn()>>>,
}

impl MemoryLocation {
    pub fn new(fragment: &str) -> Self {
        MemoryLocation {
            fragment: RefCell::new(fragment.to_owned()),
            origin: "https://unblot.test".to_owned(),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Changes the fragment without telling anyone.
    pub fn replace_silently(&self, fragment: &str) {
        *self.fragment.borrow_mut() = fragment.to_owned();
    }
}

impl Location for MemoryLocation {
    fn fragment(&self) -> String {
        self.fragment.borrow().clone()
    }

    fn set_fragment(&self, fragment: &str) {
        if *self.fragment.borrow() == fragment {
            return;
        }
        self.replace_silently(fragment);
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener();
        }
    }

    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn listen(&self, on_change: Rc<dyn Fn()>) {
        self.listeners.borrow_mut().push(on_change);
    }
}

/// Queues spawned tasks on a [`LocalPool`] until
/// [`ManualScheduler::run_until_idle`] drives them. Sleeps finish
/// immediately; their lengths are recorded.
pub struct ManualScheduler {
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    sleeps: RefCell<Vec<u32>>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        ManualScheduler {
            pool: RefCell::new(pool),
            spawner,
            sleeps: RefCell::new(Vec::new()),
        }
    }
}

impl ManualScheduler {
    /// Runs every queued task, and whatever those spawn, until nothing can
    /// make progress. Tasks still waiting (on a held call, say) stay queued.
    pub fn run_until_idle(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    pub fn sleeps(&self) -> Vec<u32> {
        self.sleeps.borrow().clone()
    }
}

impl Scheduler for ManualScheduler {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        if let Err(e) = self.spawner.spawn_local(task) {
            warn!("could not spawn task: {}", e);
        }
    }

    fn sleep(&self, millis: u32) -> LocalBoxFuture<'static, ()> {
        self.sleeps.borrow_mut().push(millis);
        Box::pin(future::ready(()))
    }
}

pub struct ShownModal {
    pub message: String,
    pub actions: Vec<ModalAction>,
    sink: IntentSink,
}

/// Keeps whatever the application draws. Elements are taken to start
/// hidden until shown.
#[derive(Default)]
pub struct RecordingSurface {
    content: RefCell<String>,
    regions: RefCell<HashMap<String, String>>,
    hidden: RefCell<HashMap<String, bool>>,
    loading: RefCell<Vec<bool>>,
    sessions: RefCell<Vec<Option<Identity>>>,
    bindings: RefCell<Vec<(Binding, IntentSink)>>,
    modal: RefCell<Option<ShownModal>>,
    messages: RefCell<Vec<String>>,
    copied: RefCell<Vec<String>>,
    exports: RefCell<Vec<ExportSnapshot>>,
}

impl RecordingSurface {
    pub fn content(&self) -> String {
        self.content.borrow().clone()
    }

    pub fn region(&self, element_id: &str) -> Option<String> {
        self.regions.borrow().get(element_id).cloned()
    }

    pub fn is_hidden(&self, element_id: &str) -> bool {
        self.hidden.borrow().get(element_id).copied().unwrap_or(true)
    }

    pub fn loading_log(&self) -> Vec<bool> {
        self.loading.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.borrow().last().copied().unwrap_or(false)
    }

    /// The identities the navigation bar was updated with, in order.
    pub fn sessions(&self) -> Vec<Option<Identity>> {
        self.sessions.borrow().clone()
    }

    pub fn intent_for(&self, element_id: &str, event: EventKind) -> Option<Intent> {
        self.bindings
            .borrow()
            .iter()
            .rev()
            .find(|(binding, _)| binding.element_id == element_id && binding.event == event)
            .map(|(binding, _)| binding.intent.clone())
    }

    /// Fires the newest binding for the element. Returns false when nothing
    /// is bound to it.
    pub fn trigger(&self, element_id: &str, event: EventKind, form: FormValues) -> bool {
        let bound = self
            .bindings
            .borrow()
            .iter()
            .rev()
            .find(|(binding, _)| binding.element_id == element_id && binding.event == event)
            .map(|(binding, sink)| (binding.intent.clone(), sink.clone()));
        match bound {
            Some((intent, sink)) => {
                sink(intent, form);
                true
            }
            None => false,
        }
    }

    pub fn modal_message(&self) -> Option<String> {
        self.modal.borrow().as_ref().map(|modal| modal.message.clone())
    }

    pub fn modal_labels(&self) -> Vec<String> {
        self.modal
            .borrow()
            .as_ref()
            .map(|modal| modal.actions.iter().map(|action| action.label.clone()).collect())
            .unwrap_or_default()
    }

    /// Clicks a modal button: the modal closes and the action's intent, if
    /// any, is reported.
    pub fn choose(&self, label: &str) -> bool {
        let modal = self.modal.borrow_mut().take();
        let modal = match modal {
            Some(modal) => modal,
            None => return false,
        };
        let action = modal.actions.iter().find(|action| action.label == label);
        match action {
            Some(action) => {
                if let Some(intent) = action.intent.clone() {
                    (modal.sink)(intent, FormValues::new());
                }
                true
            }
            None => {
                *self.modal.borrow_mut() = Some(modal);
                false
            }
        }
    }

    /// Every message shown in a modal, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    pub fn copied(&self) -> Vec<String> {
        self.copied.borrow().clone()
    }

    pub fn exports(&self) -> Vec<ExportSnapshot> {
        self.exports.borrow().clone()
    }
}

impl Surface for RecordingSurface {
    fn set_loading(&self, visible: bool) {
        self.loading.borrow_mut().push(visible);
    }

    fn set_content(&self, html: &str) {
        *self.content.borrow_mut() = html.to_owned();
        self.regions.borrow_mut().clear();
        self.hidden.borrow_mut().clear();
        self.bindings.borrow_mut().clear();
    }

    fn set_region(&self, element_id: &str, html: &str) {
        self.regions
            .borrow_mut()
            .insert(element_id.to_owned(), html.to_owned());
    }

    fn set_hidden(&self, element_id: &str, hidden: bool) {
        self.hidden.borrow_mut().insert(element_id.to_owned(), hidden);
    }

    fn toggle_hidden(&self, element_id: &str) -> bool {
        let hidden = !self.is_hidden(element_id);
        self.set_hidden(element_id, hidden);
        hidden
    }

    fn reflect_session(&self, identity: Option<&Identity>) {
        self.sessions.borrow_mut().push(identity.cloned());
    }

    fn bind(&self, bindings: Vec<Binding>, sink: IntentSink) {
        let mut bound = self.bindings.borrow_mut();
        for binding in bindings {
            bound.push((binding, sink.clone()));
        }
    }

    fn show_modal(&self, message: &str, actions: Vec<ModalAction>, sink: IntentSink) {
        self.messages.borrow_mut().push(message.to_owned());
        *self.modal.borrow_mut() = Some(ShownModal {
            message: message.to_owned(),
            actions,
            sink,
        });
    }

    fn hide_modal(&self) {
        self.modal.borrow_mut().take();
    }

    fn copy_text(&self, text: &str) {
        self.copied.borrow_mut().push(text.to_owned());
    }

    fn export_image(&self, snapshot: ExportSnapshot) {
        self.exports.borrow_mut().push(snapshot);
    }
}

/// The application wired to in-memory fakes.
pub struct Harness {
    pub backend: Rc<MemoryBackend>,
    pub surface: Rc<RecordingSurface>,
    pub location: Rc<MemoryLocation>,
    pub scheduler: Rc<ManualScheduler>,
    pub router: Rc<Router>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(Config::new("https://demo.supabase.co", "anon"))
    }

    pub fn with_config(config: Config) -> Self {
        let backend = Rc::new(MemoryBackend::default());
        let surface = Rc::new(RecordingSurface::default());
        let location = Rc::new(MemoryLocation::new(""));
        let scheduler = Rc::new(ManualScheduler::default());

        let home = config.home_route.clone();
        let services = Services {
            config,
            gateway: backend.clone(),
            auth: backend.clone(),
            surface: surface.clone(),
            location: location.clone(),
            scheduler: scheduler.clone(),
        };
        let router = Router::configure(route_table(&home), services);

        Harness {
            backend,
            surface,
            location,
            scheduler,
            router,
        }
    }

    pub fn run(&self) {
        self.scheduler.run_until_idle();
    }

    /// Navigates to `fragment` and runs until the page settles.
    pub fn visit(&self, fragment: &str) {
        self.router.navigate_to(fragment);
        self.run();
    }

    /// Signs `email` up and in, without going through the pages.
    pub fn sign_in(&self, email: &str) -> Identity {
        let identity = self.backend.register_user(email, "password");
        self.backend.sign_in_as(&identity);
        identity
    }

    pub fn click(&self, element_id: &str) -> bool {
        self.fire(element_id, EventKind::Click, FormValues::new())
    }

    pub fn submit(&self, element_id: &str, fields: &[(&str, &str)]) -> bool {
        let form = fields
            .iter()
            .map(|(id, value)| ((*id).to_owned(), (*value).to_owned()))
            .collect();
        self.fire(element_id, EventKind::Submit, form)
    }

    pub fn fire(&self, element_id: &str, event: EventKind, form: FormValues) -> bool {
        let fired = self.surface.trigger(element_id, event, form);
        self.run();
        fired
    }

    pub fn choose(&self, label: &str) -> bool {
        let chosen = self.surface.choose(label);
        self.run();
        chosen
    }
}
