use leptos::prelude::*;
#[cfg(target_arch = "wasm32")]
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;

use crate::components::{Alert, AlertVariant, Spinner};
use crate::state::invitation::use_invitation;

/// Code entry page. A code accepted here is held in the invitation
/// context and re-validated again at session start.
#[component]
pub fn HomePage() -> impl IntoView {
    let invitation = use_invitation();
    let navigate = use_navigate();

    let (code, set_code) = signal(String::new());
    // A pending notice means we were sent back here with a reason, e.g.
    // the code expired between entry and session start.
    let (error, set_error) = signal(invitation.take_notice());
    let (loading, set_loading) = signal(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();

        let entered = code.get().trim().to_string();
        if entered.is_empty() {
            set_error.set(Some("Please enter an invitation code".to_string()));
            return;
        }

        set_loading.set(true);
        set_error.set(None);

        #[cfg(target_arch = "wasm32")]
        {
            let navigate = navigate.clone();
            spawn_local(async move {
                let client =
                    parley_api::ApiClient::new(&crate::services::config::get_server_url());
                match client.validate_code(&entered).await {
                    Ok(data) => {
                        invitation.accept(entered, data);
                        set_loading.set(false);
                        navigate("/session", Default::default());
                    }
                    Err(err) => {
                        set_error.set(Some(err.to_string()));
                        set_code.set(String::new());
                        set_loading.set(false);
                    }
                }
            });
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = &entered;
            set_loading.set(false);
        }
    };

    view! {
        <div class="min-h-screen flex items-center justify-center bg-base-200">
            <div class="card w-96 bg-base-100 shadow-xl">
                <div class="card-body">
                    <h2 class="card-title text-2xl font-bold">"Welcome"</h2>
                    <p class="text-base-content/70 text-sm">
                        "Enter your invitation code to start a conversation with the voice agent."
                    </p>

                    <form on:submit=on_submit class="space-y-4 mt-4">
                        <Show when=move || error.get().is_some()>
                            <Alert variant=AlertVariant::Error>
                                <span>{move || error.get().unwrap_or_default()}</span>
                            </Alert>
                        </Show>

                        <div class="form-control">
                            <label class="label">
                                <span class="label-text">"Invitation Code"</span>
                            </label>
                            <input
                                type="text"
                                placeholder="Enter invitation code"
                                class="input input-bordered"
                                prop:value=move || code.get()
                                on:input=move |ev| set_code.set(event_target_value(&ev))
                            />
                        </div>

                        <button
                            type="submit"
                            class="btn btn-primary w-full"
                            disabled=move || loading.get()
                        >
                            <Show when=move || loading.get()>
                                <Spinner/>
                            </Show>
                            "Continue"
                        </button>
                    </form>
                </div>
            </div>
        </div>
    }
}
