use leptos::prelude::*;

#[derive(Default, Clone, Copy, PartialEq)]
pub enum AlertVariant {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[component]
pub fn Alert(
    #[prop(optional)] variant: AlertVariant,
    #[prop(optional)] class: &'static str,
    children: Children,
) -> impl IntoView {
    let variant_class = match variant {
        AlertVariant::Info => "alert-info",
        AlertVariant::Success => "alert-success",
        AlertVariant::Warning => "alert-warning",
        AlertVariant::Error => "alert-error",
    };

    view! {
        <div class=format!("alert {} {}", variant_class, class)>
            {children()}
        </div>
    }
}
