use leptos::prelude::*;
#[cfg(target_arch = "wasm32")]
use leptos::task::spawn_local;

use parley_api::{filter_valid, sort_codes, InvitationCode, SortField, SortState};

/// State of the admin code browser: the bearer token, the fetched code
/// list, and the table's filter and sort settings.
///
/// The list is owned exclusively by this context and replaced wholesale on
/// every fetch, never patched in place.
#[derive(Clone, Copy)]
pub struct AdminContext {
    token: RwSignal<Option<String>>,
    codes: RwSignal<Vec<InvitationCode>>,
    sort: RwSignal<SortState>,
    valid_only: RwSignal<bool>,
    loading: RwSignal<bool>,
}

impl AdminContext {
    pub fn new() -> Self {
        Self {
            token: RwSignal::new(None),
            codes: RwSignal::new(vec![]),
            sort: RwSignal::new(SortState::default()),
            valid_only: RwSignal::new(false),
            loading: RwSignal::new(false),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.get().is_some()
    }

    pub fn set_token(&self, token: String) {
        self.token.set(Some(token));
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn sort(&self) -> SortState {
        self.sort.get()
    }

    pub fn toggle_sort(&self, field: SortField) {
        self.sort.update(|sort| sort.toggle(field));
    }

    pub fn valid_only(&self) -> bool {
        self.valid_only.get()
    }

    pub fn set_valid_only(&self, valid_only: bool) {
        self.valid_only.set(valid_only);
    }

    /// The rows to render: the current list with the valid-only filter and
    /// sort applied. Pure over the fetched list; recomputed per render.
    pub fn visible_codes(&self) -> Vec<InvitationCode> {
        let mut list = filter_valid(&self.codes.get(), self.valid_only.get());
        sort_codes(&mut list, self.sort.get());
        list
    }

    /// Reload the code list from the server.
    ///
    /// Failures are console diagnostics only; the admin tool tolerates a
    /// manual refresh.
    pub fn fetch_codes(&self) {
        #[cfg(target_arch = "wasm32")]
        {
            let ctx = *self;
            let Some(token) = self.token.get_untracked() else {
                return;
            };
            ctx.loading.set(true);
            spawn_local(async move {
                let client =
                    parley_api::ApiClient::new(&crate::services::config::get_server_url());
                match client.list_codes(&token).await {
                    Ok(codes) => ctx.codes.set(codes),
                    Err(err) => web_sys::console::warn_1(
                        &format!("Failed to load invitation codes: {}", err).into(),
                    ),
                }
                ctx.loading.set(false);
            });
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            self.loading.set(false);
        }
    }
}

impl Default for AdminContext {
    fn default() -> Self {
        Self::new()
    }
}
