//! What a user interaction asks the application to do.
//!
//! Views describe their interactive elements as [`Binding`]s; the surface
//! reports the event back as an [`Intent`] together with the values of the
//! form fields currently on the page.

use std::collections::HashMap;
use std::rc::Rc;

use crate::export::SchemeKey;
use crate::gateway::RecoveryTokens;
use crate::model::{CommentId, PostId};

pub type FormValues = HashMap<String, String>;

pub type IntentSink = Rc<dyn Fn(Intent, FormValues)>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Navigate(String),
    Logout,
    DismissModal,
    /// Tells an anonymous visitor to log in first.
    PromptLogin(&'static str),

    Login,
    Register,
    RequestReset,
    SetNewPassword(RecoveryTokens),

    SavePost { editing: Option<PostId> },
    ConfirmDeletePost { post: PostId },
    DeletePost { post: PostId },
    SeeMore { post: PostId },
    Search,

    ToggleLike { post: PostId },

    Share { post: PostId },
    CopyLink { post: PostId },
    ChooseExportStyle { post: PostId },
    ExportImage { post: PostId, scheme: SchemeKey },

    ToggleComments { post: PostId },
    SubmitComment { post: PostId },
    EditComment { post: PostId, comment: CommentId },
    CancelCommentEdit { comment: CommentId },
    SaveComment { post: PostId, comment: CommentId },
    DeleteComment { post: PostId, comment: CommentId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Submit,
    Focus,
    Input,
}

impl EventKind {
    pub fn dom_name(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Submit => "submit",
            EventKind::Focus => "focus",
            EventKind::Input => "input",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub element_id: String,
    pub event: EventKind,
    pub intent: Intent,
}

impl Binding {
    pub fn new(element_id: impl Into<String>, event: EventKind, intent: Intent) -> Self {
        Binding {
            element_id: element_id.into(),
            event,
            intent,
        }
    }

    pub fn click(element_id: impl Into<String>, intent: Intent) -> Self {
        Self::new(element_id, EventKind::Click, intent)
    }

    pub fn submit(element_id: impl Into<String>, intent: Intent) -> Self {
        Self::new(element_id, EventKind::Submit, intent)
    }
}

pub fn field<'a>(form: &'a FormValues, name: &str) -> &'a str {
    form.get(name).map(String::as_str).unwrap_or_default()
}
