//! Configuration utilities for the web app.

/// Get the API server URL.
///
/// In development (trunk serve on port 3000), returns `http://localhost:8000`
/// since the backend runs separately. In production the backend serves the
/// bundled app itself, so the page origin is the API origin.
#[cfg(target_arch = "wasm32")]
pub fn get_server_url() -> String {
    use web_sys::window;

    let origin = window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default();

    if origin.contains(":3000") {
        "http://localhost:8000".to_string()
    } else {
        origin
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn get_server_url() -> String {
    "http://localhost:8000".to_string()
}
