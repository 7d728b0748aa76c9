use std::rc::Rc;

use leptos::prelude::*;
#[cfg(target_arch = "wasm32")]
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;

use parley_session::{LaunchError, SessionLauncher, SessionObserver, SpeakMode};

use crate::components::{Alert, AlertVariant, Spinner};
use crate::services::config::get_server_url;
use crate::services::microphone::BrowserMicrophone;
use crate::services::voice::SdkVoiceClient;
use crate::state::invitation::use_invitation;

/// Feeds connection events into the page's signals.
struct StatusObserver {
    connected: WriteSignal<bool>,
    speaking: WriteSignal<bool>,
    notice: WriteSignal<Option<String>>,
}

impl SessionObserver for StatusObserver {
    fn on_connect(&self) {
        self.connected.set(true);
    }

    fn on_disconnect(&self) {
        self.connected.set(false);
        self.speaking.set(false);
    }

    fn on_error(&self, _message: &str) {
        self.notice
            .set(Some("An error occurred during the conversation.".to_string()));
    }

    fn on_mode_change(&self, mode: SpeakMode) {
        self.speaking.set(mode == SpeakMode::Speaking);
    }

    fn on_message(&self, text: &str) {
        #[cfg(target_arch = "wasm32")]
        web_sys::console::log_1(&format!("Agent response: {}", text).into());
        #[cfg(not(target_arch = "wasm32"))]
        let _ = text;
    }
}

/// Voice session page: start and end the conversation for the held
/// invitation code.
#[component]
pub fn SessionPage() -> impl IntoView {
    let invitation = use_invitation();
    let navigate = use_navigate();
    let navigate_for_redirect = navigate.clone();

    let (connected, set_connected) = signal(false);
    let (speaking, set_speaking) = signal(false);
    let (notice, set_notice) = signal::<Option<String>>(None);
    let (starting, set_starting) = signal(false);

    // No accepted code, back to code entry.
    Effect::new(move || {
        if !invitation.has_code() {
            navigate_for_redirect("/", Default::default());
        }
    });

    // One launcher per page visit owns the whole launch state: the held
    // invitation, the state machine, and the active session handle.
    let launcher = StoredValue::new_local(Rc::new(SessionLauncher::new(
        parley_api::ApiClient::new(&get_server_url()),
        BrowserMicrophone,
        SdkVoiceClient,
        Rc::new(StatusObserver {
            connected: set_connected,
            speaking: set_speaking,
            notice: set_notice,
        }),
    )));

    let navigate_for_start = navigate.clone();
    let on_start = move |_| {
        let launcher = launcher.get_value();
        let held = invitation.code().zip(invitation.data());
        let Some((code, data)) = held else {
            invitation.set_notice("Invalid session. Please enter your invitation code again.");
            navigate_for_start("/", Default::default());
            return;
        };

        set_starting.set(true);
        set_notice.set(None);

        #[cfg(target_arch = "wasm32")]
        {
            let navigate = navigate_for_start.clone();
            spawn_local(async move {
                launcher.set_invitation(code, data);
                match launcher.start().await {
                    Ok(()) => {}
                    Err(LaunchError::CodeRejected { reason, invalidated }) => {
                        if invalidated {
                            invitation.clear();
                            invitation.set_notice(reason);
                            navigate("/", Default::default());
                        } else {
                            set_notice.set(Some(reason));
                        }
                    }
                    Err(err @ LaunchError::NoActiveInvitation) => {
                        invitation.clear();
                        invitation.set_notice(err.to_string());
                        navigate("/", Default::default());
                    }
                    Err(err @ LaunchError::MicrophoneDenied) => {
                        set_notice.set(Some(err.to_string()));
                    }
                    Err(err) => {
                        web_sys::console::error_1(
                            &format!("Failed to start conversation: {}", err).into(),
                        );
                        set_notice.set(Some(
                            "Failed to start conversation. Please try again.".to_string(),
                        ));
                    }
                }
                set_starting.set(false);
            });
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (launcher, code, data);
            set_starting.set(false);
        }
    };

    let on_end = move |_| {
        let launcher = launcher.get_value();

        #[cfg(target_arch = "wasm32")]
        spawn_local(async move {
            if let Err(err) = launcher.end().await {
                web_sys::console::error_1(&format!("Error ending conversation: {}", err).into());
            }
        });

        #[cfg(not(target_arch = "wasm32"))]
        let _ = launcher;
    };

    view! {
        <div class="min-h-screen flex items-center justify-center bg-base-200">
            <div class="card w-96 bg-base-100 shadow-xl">
                <div class="card-body space-y-4">
                    <h2 class="card-title text-2xl font-bold">"Voice Agent"</h2>

                    <div class="flex items-center justify-between">
                        <span class=move || {
                            if connected.get() { "badge badge-success" } else { "badge badge-ghost" }
                        }>
                            {move || if connected.get() { "Connected" } else { "Disconnected" }}
                        </span>
                        <span class=move || {
                            if speaking.get() { "badge badge-info" } else { "badge badge-ghost" }
                        }>
                            {move || if speaking.get() { "Agent Speaking" } else { "Agent Silent" }}
                        </span>
                    </div>

                    <Show when=move || notice.get().is_some()>
                        <Alert variant=AlertVariant::Error>
                            <span>{move || notice.get().unwrap_or_default()}</span>
                        </Alert>
                    </Show>

                    <div class="card-actions justify-between mt-2">
                        <button
                            class="btn btn-primary"
                            disabled=move || starting.get() || connected.get()
                            on:click=on_start
                        >
                            <Show when=move || starting.get()>
                                <Spinner/>
                            </Show>
                            "Start Conversation"
                        </button>
                        <button
                            class="btn btn-outline"
                            disabled=move || !connected.get()
                            on:click=on_end
                        >
                            "End Conversation"
                        </button>
                    </div>
                </div>
            </div>
        </div>
    }
}
