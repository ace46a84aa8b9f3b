use crate::export::ExportSnapshot;
use crate::intent::{Binding, Intent, IntentSink};
use crate::model::Identity;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModalAction {
    pub label: String,
    pub class: String,
    pub intent: Option<Intent>,
}

impl ModalAction {
    pub fn new(label: impl Into<String>, class: impl Into<String>, intent: Option<Intent>) -> Self {
        ModalAction {
            label: label.into(),
            class: class.into(),
            intent,
        }
    }

    pub fn ok() -> Self {
        Self::new("OK", "bg-blue-600 text-white", None)
    }
}

/// The page the application draws on: a single content region, the loading
/// indicator, the navigation bar and a modal dialog.
pub trait Surface {
    fn set_loading(&self, visible: bool);

    /// Replaces the content region. Bindings attached to the previous content
    /// are released.
    fn set_content(&self, html: &str);

    /// Replaces the children of one element inside the content region.
    fn set_region(&self, element_id: &str, html: &str);

    fn set_hidden(&self, element_id: &str, hidden: bool);

    /// Flips the hidden state of an element and returns whether it is now hidden.
    fn toggle_hidden(&self, element_id: &str) -> bool;

    fn reflect_session(&self, identity: Option<&Identity>);

    fn bind(&self, bindings: Vec<Binding>, sink: IntentSink);

    /// Shows the modal; clicking an action closes it and then reports the
    /// action's intent, if any.
    fn show_modal(&self, message: &str, actions: Vec<ModalAction>, sink: IntentSink);

    fn hide_modal(&self);

    fn copy_text(&self, text: &str);

    fn export_image(&self, snapshot: ExportSnapshot);
}
