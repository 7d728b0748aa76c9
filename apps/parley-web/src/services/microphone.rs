//! Microphone permission gate backed by `getUserMedia`.

use parley_session::{MicAccess, MicrophoneGate};

/// Requests audio capture from the browser. The returned stream is
/// dropped immediately; only the permission matters here, the voice SDK
/// opens its own capture.
pub struct BrowserMicrophone;

impl MicrophoneGate for BrowserMicrophone {
    async fn request(&self) -> MicAccess {
        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsValue;
            use wasm_bindgen_futures::JsFuture;
            use web_sys::MediaStreamConstraints;

            let Some(window) = web_sys::window() else {
                return MicAccess::Denied;
            };
            let devices = match window.navigator().media_devices() {
                Ok(devices) => devices,
                Err(_) => return MicAccess::Denied,
            };

            let constraints = MediaStreamConstraints::new();
            constraints.set_audio(&JsValue::TRUE);

            let promise = match devices.get_user_media_with_constraints(&constraints) {
                Ok(promise) => promise,
                Err(_) => return MicAccess::Denied,
            };

            match JsFuture::from(promise).await {
                Ok(_stream) => MicAccess::Granted,
                Err(err) => {
                    web_sys::console::warn_1(&err);
                    MicAccess::Denied
                }
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            MicAccess::Denied
        }
    }
}
