//! Session-launch orchestration for the parley voice agent.
//!
//! The [`SessionLauncher`] sequences the steps required before a real-time
//! voice session may start: re-validating the held invitation code,
//! recording one use of it, requesting microphone access, and finally the
//! handshake with the external voice transport. It aborts on the first
//! failure and never reaches a later step when an earlier one failed.
//!
//! The external collaborators (HTTP backend, browser microphone prompt,
//! vendor voice SDK) sit behind traits so the whole flow is testable with
//! scripted fakes.

use std::future::Future;

use parley_api::{ApiClient, ApiError, InvitationData};
use thiserror::Error;

mod events;
mod launcher;

pub use events::{EventRelay, SessionEvent, SessionObserver, SpeakMode};
pub use launcher::{LaunchState, SessionLauncher};

/// Display name used when the invitation carries no usable first name.
pub const DEFAULT_DISPLAY_NAME: &str = "Student";

/// Outcome of a microphone permission prompt. Denial is a normal outcome,
/// not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MicAccess {
    Granted,
    Denied,
}

/// Parameters for the voice-transport handshake.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectParams {
    pub signed_url: String,
    pub display_name: String,
}

/// Error type for the voice transport seam.
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("voice session handshake failed: {0}")]
    Handshake(String),
    #[error("failed to end voice session: {0}")]
    End(String),
    #[error("voice transport not available")]
    Unavailable,
}

/// Failures of the launch flow, as surfaced to the page.
///
/// `CodeRejected::invalidated` tells the caller whether the held invitation
/// was cleared (forcing the user back to code entry) or the failure looked
/// transient and a retry in place is allowed.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Invalid session. Please enter your invitation code again.")]
    NoActiveInvitation,
    #[error("{reason}")]
    CodeRejected { reason: String, invalidated: bool },
    #[error("could not record code usage: {0}")]
    UsageNotRecorded(String),
    #[error("Microphone permission is required for the conversation.")]
    MicrophoneDenied,
    #[error("failed to start conversation: {0}")]
    Handshake(String),
    #[error("request failed: {0}")]
    Transport(String),
}

/// Backend calls made during a launch.
///
/// Note: no `Send` bounds; the browser is single-threaded and the wasm
/// futures are not `Send`.
pub trait LaunchGateway {
    /// Validate an invitation code (also called at session start to catch
    /// expiry or depletion since code entry).
    fn validate(&self, code: &str) -> impl Future<Output = Result<InvitationData, ApiError>>;

    /// Record one use of the code. Must succeed before any microphone
    /// prompt, so a failed bookkeeping call never consumes a permission
    /// prompt or a session.
    fn record_usage(&self, code: &str) -> impl Future<Output = Result<(), ApiError>>;

    /// Fetch the signed connection URL for the handshake.
    fn signed_url(&self) -> impl Future<Output = Result<String, ApiError>>;
}

impl LaunchGateway for ApiClient {
    fn validate(&self, code: &str) -> impl Future<Output = Result<InvitationData, ApiError>> {
        self.validate_code(code)
    }

    fn record_usage(&self, code: &str) -> impl Future<Output = Result<(), ApiError>> {
        self.increment_code(code)
    }

    fn signed_url(&self) -> impl Future<Output = Result<String, ApiError>> {
        ApiClient::signed_url(self)
    }
}

/// Microphone permission prompt.
pub trait MicrophoneGate {
    fn request(&self) -> impl Future<Output = MicAccess>;
}

/// An active voice session handle. Exists between a successful connect and
/// disconnect; ending it consumes the handle.
pub trait VoiceSession {
    fn end(self) -> impl Future<Output = Result<(), VoiceError>>;
}

/// The external voice transport.
///
/// `connect` performs the handshake and wires the relay into the vendor
/// client's callbacks so connection events reach the observer.
pub trait VoiceClient {
    type Session: VoiceSession;

    fn connect(
        &self,
        params: ConnectParams,
        relay: EventRelay,
    ) -> impl Future<Output = Result<Self::Session, VoiceError>>;
}

/// Whether a rejection reason means the held code itself is no longer
/// usable (unknown, expired, or at its call limit) rather than a transient
/// failure. The substrings match the backend's `detail` messages.
pub fn invalidates_code(reason: &str) -> bool {
    reason.contains("Invalid invitation code")
        || reason.contains("expired")
        || reason.contains("Maximum number")
}

/// Derive the display name passed to the voice agent from an invitation's
/// first name, falling back to [`DEFAULT_DISPLAY_NAME`].
pub fn display_name(data: Option<&InvitationData>) -> String {
    data.and_then(|d| d.first_name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string())
}
