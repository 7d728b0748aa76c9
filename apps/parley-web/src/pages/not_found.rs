use leptos::prelude::*;

#[component]
pub fn NotFoundPage() -> impl IntoView {
    view! {
        <div class="min-h-screen flex flex-col items-center justify-center gap-4">
            <h1 class="text-4xl font-bold">"404"</h1>
            <p class="text-base-content/70">"This page does not exist."</p>
            <a href="/" class="btn btn-primary">"Back to start"</a>
        </div>
    }
}
