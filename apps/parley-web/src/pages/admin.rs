use chrono::{DateTime, Utc};
use leptos::prelude::*;
#[cfg(target_arch = "wasm32")]
use leptos::task::spawn_local;

use parley_api::{CodeStatus, SortField};

use crate::components::{Alert, AlertVariant, Spinner};
use crate::state::admin::AdminContext;

const COLUMNS: [(SortField, &str); 6] = [
    (SortField::Code, "Code"),
    (SortField::CreatedAt, "Created"),
    (SortField::ExpiresAt, "Expires"),
    (SortField::MaxCalls, "Max Calls"),
    (SortField::CallCount, "Used"),
    (SortField::IsValid, "Status"),
];

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M").to_string()
}

fn status_badge(status: CodeStatus) -> &'static str {
    match status {
        CodeStatus::Valid => "badge badge-success",
        CodeStatus::Expired => "badge badge-error",
        CodeStatus::Depleted => "badge badge-warning",
    }
}

/// Admin panel: log in, then browse invitation codes with valid-only
/// filtering and sortable columns.
#[component]
pub fn AdminPage() -> impl IntoView {
    let admin = AdminContext::new();

    let (username, set_username) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (login_error, set_login_error) = signal::<Option<String>>(None);
    let (logging_in, set_logging_in) = signal(false);

    let on_login = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        set_logging_in.set(true);
        set_login_error.set(None);

        #[cfg(target_arch = "wasm32")]
        spawn_local(async move {
            let client = parley_api::ApiClient::new(&crate::services::config::get_server_url());
            let result = client
                .login(&username.get_untracked(), &password.get_untracked())
                .await;
            match result {
                Ok(tokens) => {
                    admin.set_token(tokens.access_token);
                    admin.fetch_codes();
                }
                Err(err) => set_login_error.set(Some(err.to_string())),
            }
            set_logging_in.set(false);
        });

        #[cfg(not(target_arch = "wasm32"))]
        set_logging_in.set(false);
    };

    view! {
        <div class="min-h-screen bg-base-200 p-6">
            <Show when=move || !admin.is_authenticated()>
                <div class="flex items-center justify-center mt-24">
                    <div class="card w-96 bg-base-100 shadow-xl">
                        <div class="card-body">
                            <h2 class="card-title text-2xl font-bold">"Admin Login"</h2>

                            <form on:submit=on_login class="space-y-4 mt-4">
                                <Show when=move || login_error.get().is_some()>
                                    <Alert variant=AlertVariant::Error>
                                        <span>{move || login_error.get().unwrap_or_default()}</span>
                                    </Alert>
                                </Show>

                                <div class="form-control">
                                    <label class="label">
                                        <span class="label-text">"Username"</span>
                                    </label>
                                    <input
                                        type="text"
                                        class="input input-bordered"
                                        prop:value=move || username.get()
                                        on:input=move |ev| set_username.set(event_target_value(&ev))
                                    />
                                </div>

                                <div class="form-control">
                                    <label class="label">
                                        <span class="label-text">"Password"</span>
                                    </label>
                                    <input
                                        type="password"
                                        class="input input-bordered"
                                        prop:value=move || password.get()
                                        on:input=move |ev| set_password.set(event_target_value(&ev))
                                    />
                                </div>

                                <button
                                    type="submit"
                                    class="btn btn-primary w-full"
                                    disabled=move || logging_in.get()
                                >
                                    <Show when=move || logging_in.get()>
                                        <Spinner/>
                                    </Show>
                                    "Log In"
                                </button>
                            </form>
                        </div>
                    </div>
                </div>
            </Show>

            <Show when=move || admin.is_authenticated()>
                <div class="max-w-5xl mx-auto space-y-4">
                    <div class="flex items-center justify-between">
                        <h1 class="text-3xl font-bold">"Invitation Codes"</h1>
                        <div class="flex items-center gap-4">
                            <label class="label cursor-pointer gap-2">
                                <span class="label-text">"Show valid only"</span>
                                <input
                                    type="checkbox"
                                    class="checkbox"
                                    prop:checked=move || admin.valid_only()
                                    on:change=move |ev| admin.set_valid_only(event_target_checked(&ev))
                                />
                            </label>
                            <button
                                class="btn btn-sm"
                                disabled=move || admin.is_loading()
                                on:click=move |_| admin.fetch_codes()
                            >
                                <Show when=move || admin.is_loading()>
                                    <Spinner size=crate::components::SpinnerSize::Sm/>
                                </Show>
                                "Refresh"
                            </button>
                        </div>
                    </div>

                    <div class="card bg-base-100 shadow">
                        <div class="card-body overflow-x-auto">
                            <table class="table">
                                <thead>
                                    <tr>
                                        {COLUMNS
                                            .into_iter()
                                            .map(|(field, label)| {
                                                let indicator = move || {
                                                    let sort = admin.sort();
                                                    if sort.field == field {
                                                        if sort.ascending { " \u{2191}" } else { " \u{2193}" }
                                                    } else {
                                                        " \u{2195}"
                                                    }
                                                };
                                                view! {
                                                    <th
                                                        class="cursor-pointer select-none"
                                                        on:click=move |_| admin.toggle_sort(field)
                                                    >
                                                        {label}
                                                        {indicator}
                                                    </th>
                                                }
                                            })
                                            .collect_view()}
                                    </tr>
                                </thead>
                                <tbody>
                                    {move || {
                                        // One "now" for the whole render pass so every
                                        // row is classified consistently.
                                        let now = Utc::now();
                                        admin
                                            .visible_codes()
                                            .into_iter()
                                            .map(|code| {
                                                let status = CodeStatus::classify(&code, now);
                                                view! {
                                                    <tr>
                                                        <td class="font-mono">{code.code.clone()}</td>
                                                        <td>{format_timestamp(&code.created_at)}</td>
                                                        <td>{format_timestamp(&code.expires_at)}</td>
                                                        <td>{code.max_calls}</td>
                                                        <td>{code.call_count}</td>
                                                        <td>
                                                            <span class=status_badge(status)>
                                                                {status.as_str()}
                                                            </span>
                                                        </td>
                                                    </tr>
                                                }
                                            })
                                            .collect_view()
                                    }}
                                </tbody>
                            </table>
                        </div>
                    </div>
                </div>
            </Show>
        </div>
    }
}
