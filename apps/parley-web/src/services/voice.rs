//! Voice transport backed by the vendor conversation SDK.
//!
//! The SDK is an ES module loaded lazily through a small JS shim; the
//! binding here adapts its callback-style events into the session event
//! relay and wraps the conversation object as a [`VoiceSession`].

use parley_session::{ConnectParams, EventRelay, VoiceClient, VoiceError, VoiceSession};

/// Connects through the vendor SDK's start-session entry point.
pub struct SdkVoiceClient;

#[cfg(target_arch = "wasm32")]
mod wasm_impl {
    use super::*;
    use js_sys::{Object, Reflect};
    use parley_session::{SessionEvent, SpeakMode};
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen(module = "/js/conversation.js")]
    extern "C" {
        #[wasm_bindgen(js_name = startSession, catch)]
        async fn start_session(options: JsValue) -> Result<JsValue, JsValue>;

        #[wasm_bindgen(js_name = endSession, catch)]
        async fn end_session(conversation: JsValue) -> Result<(), JsValue>;
    }

    fn js_text(value: &JsValue) -> String {
        value.as_string().unwrap_or_else(|| format!("{value:?}"))
    }

    fn set(target: &Object, key: &str, value: &JsValue) -> Result<(), VoiceError> {
        Reflect::set(target, &JsValue::from_str(key), value)
            .map(|_| ())
            .map_err(|err| VoiceError::Handshake(js_text(&err)))
    }

    /// An active conversation. The callback closures must outlive the
    /// connection, so the handle retains them until it is ended or
    /// dropped.
    pub struct SdkSession {
        conversation: JsValue,
        _on_connect: Closure<dyn Fn()>,
        _on_disconnect: Closure<dyn Fn()>,
        _on_error: Closure<dyn Fn(JsValue)>,
        _on_mode_change: Closure<dyn Fn(JsValue)>,
        _on_message: Closure<dyn Fn(JsValue)>,
    }

    impl VoiceSession for SdkSession {
        async fn end(self) -> Result<(), VoiceError> {
            end_session(self.conversation.clone())
                .await
                .map_err(|err| VoiceError::End(js_text(&err)))
        }
    }

    impl VoiceClient for SdkVoiceClient {
        type Session = SdkSession;

        async fn connect(
            &self,
            params: ConnectParams,
            relay: EventRelay,
        ) -> Result<SdkSession, VoiceError> {
            let options = Object::new();
            set(&options, "signedUrl", &JsValue::from_str(&params.signed_url))?;

            let variables = Object::new();
            set(
                &variables,
                "customer_name",
                &JsValue::from_str(&params.display_name),
            )?;
            set(&options, "dynamicVariables", &JsValue::from(variables))?;

            let on_connect = Closure::<dyn Fn()>::new({
                let relay = relay.clone();
                move || relay.dispatch(SessionEvent::Connected)
            });
            let on_disconnect = Closure::<dyn Fn()>::new({
                let relay = relay.clone();
                move || relay.dispatch(SessionEvent::Disconnected)
            });
            let on_error = Closure::<dyn Fn(JsValue)>::new({
                let relay = relay.clone();
                move |err: JsValue| relay.dispatch(SessionEvent::Error(js_text(&err)))
            });
            let on_mode_change = Closure::<dyn Fn(JsValue)>::new({
                let relay = relay.clone();
                move |change: JsValue| {
                    let mode = Reflect::get(&change, &JsValue::from_str("mode"))
                        .ok()
                        .and_then(|m| m.as_string())
                        .unwrap_or_default();
                    relay.dispatch(SessionEvent::ModeChange(SpeakMode::parse(&mode)));
                }
            });
            let on_message = Closure::<dyn Fn(JsValue)>::new({
                let relay = relay.clone();
                move |message: JsValue| {
                    let text = Reflect::get(&message, &JsValue::from_str("message"))
                        .ok()
                        .and_then(|m| m.as_string())
                        .unwrap_or_else(|| js_text(&message));
                    relay.dispatch(SessionEvent::Message(text));
                }
            });

            set(&options, "onConnect", on_connect.as_ref())?;
            set(&options, "onDisconnect", on_disconnect.as_ref())?;
            set(&options, "onError", on_error.as_ref())?;
            set(&options, "onModeChange", on_mode_change.as_ref())?;
            set(&options, "onMessage", on_message.as_ref())?;

            let conversation = start_session(JsValue::from(options))
                .await
                .map_err(|err| VoiceError::Handshake(js_text(&err)))?;

            Ok(SdkSession {
                conversation,
                _on_connect: on_connect,
                _on_disconnect: on_disconnect,
                _on_error: on_error,
                _on_mode_change: on_mode_change,
                _on_message: on_message,
            })
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_impl::SdkSession;

#[cfg(not(target_arch = "wasm32"))]
mod native_stub {
    use super::*;

    pub struct SdkSession;

    impl VoiceSession for SdkSession {
        async fn end(self) -> Result<(), VoiceError> {
            Ok(())
        }
    }

    impl VoiceClient for SdkVoiceClient {
        type Session = SdkSession;

        async fn connect(
            &self,
            _params: ConnectParams,
            _relay: EventRelay,
        ) -> Result<SdkSession, VoiceError> {
            Err(VoiceError::Unavailable)
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native_stub::SdkSession;
