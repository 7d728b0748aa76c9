use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::{
    components::{Route, Router, Routes},
    path,
};

use crate::pages::{
    admin::AdminPage, home::HomePage, not_found::NotFoundPage, session::SessionPage,
};
use crate::state::invitation::InvitationProvider;

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="Parley"/>
        <Meta name="description" content="Invitation-gated voice agent sessions"/>

        <InvitationProvider>
            <Router>
                <main class="min-h-screen bg-base-200">
                    <Routes fallback=|| view! { <NotFoundPage/> }>
                        <Route path=path!("/") view=HomePage/>
                        <Route path=path!("/session") view=SessionPage/>
                        <Route path=path!("/admin") view=AdminPage/>
                    </Routes>
                </main>
            </Router>
        </InvitationProvider>
    }
}
