use leptos::prelude::*;
use parley_api::InvitationData;

/// The invitation accepted at code entry, shared between the entry page
/// and the session page.
///
/// Clearing it forces the user back to code entry; `notice` carries the
/// reason across the navigation so the entry page can show it.
#[derive(Clone, Copy)]
pub struct InvitationContext {
    code: RwSignal<Option<String>>,
    data: RwSignal<Option<InvitationData>>,
    notice: RwSignal<Option<String>>,
}

impl InvitationContext {
    pub fn new() -> Self {
        Self {
            code: RwSignal::new(None),
            data: RwSignal::new(None),
            notice: RwSignal::new(None),
        }
    }

    pub fn accept(&self, code: String, data: InvitationData) {
        self.code.set(Some(code));
        self.data.set(Some(data));
    }

    pub fn clear(&self) {
        self.code.set(None);
        self.data.set(None);
    }

    pub fn has_code(&self) -> bool {
        self.code.get().is_some()
    }

    pub fn code(&self) -> Option<String> {
        self.code.get()
    }

    pub fn data(&self) -> Option<InvitationData> {
        self.data.get()
    }

    pub fn set_notice(&self, message: impl Into<String>) {
        self.notice.set(Some(message.into()));
    }

    /// Take the pending notice, if any, leaving none behind.
    pub fn take_notice(&self) -> Option<String> {
        let notice = self.notice.get_untracked();
        if notice.is_some() {
            self.notice.set(None);
        }
        notice
    }
}

impl Default for InvitationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Provide the invitation context to the application.
#[component]
pub fn InvitationProvider(children: Children) -> impl IntoView {
    provide_context(InvitationContext::new());
    children()
}

/// Get the invitation context from anywhere in the component tree.
pub fn use_invitation() -> InvitationContext {
    expect_context::<InvitationContext>()
}
