//! The launch state machine.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use parley_api::{ApiError, InvitationData};

use crate::events::{EventRelay, SessionObserver};
use crate::{
    display_name, invalidates_code, ConnectParams, LaunchError, LaunchGateway, MicAccess,
    MicrophoneGate, VoiceClient, VoiceError, VoiceSession,
};

/// States of one session attempt.
///
/// `Aborted` is reachable from every non-terminal state; the user may
/// retry the whole flow from `Idle`, `Ended`, or `Aborted`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchState {
    Idle,
    Validating,
    Recording,
    RequestingPermission,
    Connecting,
    Active,
    Ended,
    Aborted,
}

impl LaunchState {
    fn is_in_flight(self) -> bool {
        matches!(
            self,
            LaunchState::Validating
                | LaunchState::Recording
                | LaunchState::RequestingPermission
                | LaunchState::Connecting
        )
    }
}

/// Launch state shared between the launcher and the event relay, so an
/// external disconnect can end the session. Single-threaded by design.
#[derive(Clone)]
pub struct SharedState(Rc<Cell<LaunchState>>);

impl SharedState {
    pub(crate) fn new(state: LaunchState) -> Self {
        Self(Rc::new(Cell::new(state)))
    }

    pub fn get(&self) -> LaunchState {
        self.0.get()
    }

    pub(crate) fn set(&self, state: LaunchState) {
        self.0.set(state);
    }
}

struct HeldInvitation {
    code: String,
    data: InvitationData,
}

/// Orchestrates one voice session: re-validation, usage recording,
/// microphone permission, and the transport handshake, strictly in that
/// order, aborting on the first failure.
///
/// Owns all per-page launch state that the original kept in module-level
/// globals: the accepted invitation, the current state, and the active
/// session handle.
pub struct SessionLauncher<G, M, V: VoiceClient, O> {
    gateway: G,
    microphone: M,
    voice: V,
    observer: Rc<O>,
    invitation: RefCell<Option<HeldInvitation>>,
    state: SharedState,
    session: RefCell<Option<V::Session>>,
}

impl<G, M, V, O> SessionLauncher<G, M, V, O>
where
    G: LaunchGateway,
    M: MicrophoneGate,
    V: VoiceClient,
    O: SessionObserver + 'static,
{
    pub fn new(gateway: G, microphone: M, voice: V, observer: Rc<O>) -> Self {
        Self {
            gateway,
            microphone,
            voice,
            observer,
            invitation: RefCell::new(None),
            state: SharedState::new(LaunchState::Idle),
            session: RefCell::new(None),
        }
    }

    pub fn state(&self) -> LaunchState {
        self.state.get()
    }

    /// Hold an invitation accepted at code entry. Required before
    /// `start`; the code is re-validated there regardless.
    pub fn set_invitation(&self, code: String, data: InvitationData) {
        self.invitation.borrow_mut().replace(HeldInvitation { code, data });
    }

    pub fn has_invitation(&self) -> bool {
        self.invitation.borrow().is_some()
    }

    pub fn invitation_code(&self) -> Option<String> {
        self.invitation.borrow().as_ref().map(|held| held.code.clone())
    }

    /// Drop the held invitation, forcing the user back to code entry.
    pub fn clear_invitation(&self) {
        self.invitation.borrow_mut().take();
    }

    fn abort(&self, error: LaunchError) -> LaunchError {
        self.state.set(LaunchState::Aborted);
        error
    }

    /// Run the launch sequence. On success the session is `Active` and
    /// events flow to the observer.
    ///
    /// A start request while a launch is already in flight or a session is
    /// active is ignored; the page disables the triggering control, this
    /// guard just makes duplicate requests harmless.
    pub async fn start(&self) -> Result<(), LaunchError> {
        let current = self.state.get();
        if current.is_in_flight() || current == LaunchState::Active {
            return Ok(());
        }

        let code = match self.invitation_code() {
            Some(code) => code,
            None => return Err(self.abort(LaunchError::NoActiveInvitation)),
        };

        // Re-validate even though the code passed at entry: validity can
        // change between code entry and session start (another user of the
        // same code, or expiry crossing).
        self.state.set(LaunchState::Validating);
        match self.gateway.validate(&code).await {
            Ok(data) => {
                if let Some(held) = self.invitation.borrow_mut().as_mut() {
                    held.data = data;
                }
            }
            Err(ApiError::Rejected(reason)) => {
                let invalidated = invalidates_code(&reason);
                if invalidated {
                    self.clear_invitation();
                }
                return Err(self.abort(LaunchError::CodeRejected { reason, invalidated }));
            }
            Err(ApiError::EmptyCode) => {
                return Err(self.abort(LaunchError::NoActiveInvitation));
            }
            Err(ApiError::Transport(reason)) => {
                return Err(self.abort(LaunchError::Transport(reason)));
            }
        }

        // Usage must be on the books before any microphone prompt; a
        // session that cannot be metered must not start.
        self.state.set(LaunchState::Recording);
        if let Err(err) = self.gateway.record_usage(&code).await {
            return Err(self.abort(LaunchError::UsageNotRecorded(err.to_string())));
        }

        self.state.set(LaunchState::RequestingPermission);
        if self.microphone.request().await == MicAccess::Denied {
            return Err(self.abort(LaunchError::MicrophoneDenied));
        }

        self.state.set(LaunchState::Connecting);
        let signed_url = match self.gateway.signed_url().await {
            Ok(url) => url,
            Err(err) => return Err(self.abort(LaunchError::Transport(err.to_string()))),
        };

        let params = ConnectParams {
            signed_url,
            display_name: display_name(self.invitation.borrow().as_ref().map(|h| &h.data)),
        };
        let relay = EventRelay::new(self.observer.clone(), self.state.clone());

        match self.voice.connect(params, relay).await {
            Ok(session) => {
                self.session.borrow_mut().replace(session);
                self.state.set(LaunchState::Active);
                Ok(())
            }
            Err(err) => Err(self.abort(LaunchError::Handshake(err.to_string()))),
        }
    }

    /// End the active session. Ending when none is active is a no-op.
    pub async fn end(&self) -> Result<(), VoiceError> {
        let session = self.session.borrow_mut().take();
        let Some(session) = session else {
            return Ok(());
        };

        // An external disconnect may already have moved us to Ended; the
        // handle is just dropped then.
        let result = if self.state.get() == LaunchState::Active {
            session.end().await
        } else {
            Ok(())
        };
        self.state.set(LaunchState::Ended);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionEvent;
    use std::collections::VecDeque;

    type Log = Rc<RefCell<Vec<String>>>;

    fn log(entries: &Log, entry: &str) {
        entries.borrow_mut().push(entry.to_string());
    }

    struct ScriptedGateway {
        validate: RefCell<VecDeque<Result<InvitationData, ApiError>>>,
        record: RefCell<VecDeque<Result<(), ApiError>>>,
        calls: Log,
    }

    impl ScriptedGateway {
        fn new(calls: Log) -> Self {
            Self {
                validate: RefCell::new(VecDeque::new()),
                record: RefCell::new(VecDeque::new()),
                calls,
            }
        }

        fn validation(self, result: Result<InvitationData, ApiError>) -> Self {
            self.validate.borrow_mut().push_back(result);
            self
        }

        fn recording(self, result: Result<(), ApiError>) -> Self {
            self.record.borrow_mut().push_back(result);
            self
        }
    }

    impl LaunchGateway for ScriptedGateway {
        async fn validate(&self, _code: &str) -> Result<InvitationData, ApiError> {
            log(&self.calls, "validate");
            self.validate
                .borrow_mut()
                .pop_front()
                .expect("unexpected validate call")
        }

        async fn record_usage(&self, _code: &str) -> Result<(), ApiError> {
            log(&self.calls, "record");
            self.record
                .borrow_mut()
                .pop_front()
                .expect("unexpected record call")
        }

        async fn signed_url(&self) -> Result<String, ApiError> {
            log(&self.calls, "signed_url");
            Ok("wss://voice.example/session?sig=abc".to_string())
        }
    }

    struct FakeMicrophone {
        access: MicAccess,
        calls: Log,
    }

    impl MicrophoneGate for FakeMicrophone {
        async fn request(&self) -> MicAccess {
            log(&self.calls, "microphone");
            self.access
        }
    }

    struct FakeSession {
        calls: Log,
    }

    impl VoiceSession for FakeSession {
        async fn end(self) -> Result<(), VoiceError> {
            log(&self.calls, "end_session");
            Ok(())
        }
    }

    struct FakeVoice {
        fail: bool,
        calls: Log,
        last_params: RefCell<Option<ConnectParams>>,
    }

    impl FakeVoice {
        fn new(calls: Log) -> Self {
            Self {
                fail: false,
                calls,
                last_params: RefCell::new(None),
            }
        }
    }

    impl VoiceClient for FakeVoice {
        type Session = FakeSession;

        async fn connect(
            &self,
            params: ConnectParams,
            relay: EventRelay,
        ) -> Result<FakeSession, VoiceError> {
            log(&self.calls, "connect");
            self.last_params.borrow_mut().replace(params);
            if self.fail {
                return Err(VoiceError::Handshake("websocket refused".to_string()));
            }
            relay.dispatch(SessionEvent::Connected);
            Ok(FakeSession {
                calls: self.calls.clone(),
            })
        }
    }

    struct NullObserver;
    impl SessionObserver for NullObserver {}

    fn invitation(first_name: Option<&str>) -> InvitationData {
        InvitationData {
            valid: true,
            code: "ABC123".to_string(),
            first_name: first_name.map(str::to_owned),
            last_name: None,
        }
    }

    fn launcher_with(
        gateway: ScriptedGateway,
        access: MicAccess,
        fail_connect: bool,
        calls: &Log,
    ) -> SessionLauncher<ScriptedGateway, FakeMicrophone, FakeVoice, NullObserver> {
        let microphone = FakeMicrophone {
            access,
            calls: calls.clone(),
        };
        let mut voice = FakeVoice::new(calls.clone());
        voice.fail = fail_connect;
        SessionLauncher::new(gateway, microphone, voice, Rc::new(NullObserver))
    }

    #[tokio::test]
    async fn test_full_launch_sequence_in_order() {
        let calls: Log = Rc::default();
        let gateway = ScriptedGateway::new(calls.clone())
            .validation(Ok(invitation(Some("Ada"))))
            .recording(Ok(()));
        let launcher = launcher_with(gateway, MicAccess::Granted, false, &calls);
        launcher.set_invitation("ABC123".to_string(), invitation(Some("Ada")));

        launcher.start().await.unwrap();

        assert_eq!(
            *calls.borrow(),
            vec!["validate", "record", "microphone", "signed_url", "connect"]
        );
        assert_eq!(launcher.state(), LaunchState::Active);
        let params = launcher.voice.last_params.borrow().clone().unwrap();
        assert_eq!(params.display_name, "Ada");
        assert_eq!(params.signed_url, "wss://voice.example/session?sig=abc");
    }

    #[tokio::test]
    async fn test_start_without_invitation_aborts_immediately() {
        let calls: Log = Rc::default();
        let gateway = ScriptedGateway::new(calls.clone());
        let launcher = launcher_with(gateway, MicAccess::Granted, false, &calls);

        let err = launcher.start().await.unwrap_err();
        assert!(matches!(err, LaunchError::NoActiveInvitation));
        assert_eq!(launcher.state(), LaunchState::Aborted);
        assert!(calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_depleted_code_at_start_clears_invitation() {
        // Scenario: code valid at entry but at its call limit by start time.
        let calls: Log = Rc::default();
        let gateway = ScriptedGateway::new(calls.clone()).validation(Err(ApiError::Rejected(
            "Maximum number of uses reached".to_string(),
        )));
        let launcher = launcher_with(gateway, MicAccess::Granted, false, &calls);
        launcher.set_invitation("ABC123".to_string(), invitation(None));

        let err = launcher.start().await.unwrap_err();
        match err {
            LaunchError::CodeRejected { reason, invalidated } => {
                assert_eq!(reason, "Maximum number of uses reached");
                assert!(invalidated);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!launcher.has_invitation());
        assert_eq!(launcher.state(), LaunchState::Aborted);
        // Nothing past validation ran: no usage recorded, no mic prompt.
        assert_eq!(*calls.borrow(), vec!["validate"]);
    }

    #[tokio::test]
    async fn test_transient_validation_failure_preserves_invitation() {
        let calls: Log = Rc::default();
        let gateway = ScriptedGateway::new(calls.clone())
            .validation(Err(ApiError::Transport("connection reset".to_string())));
        let launcher = launcher_with(gateway, MicAccess::Granted, false, &calls);
        launcher.set_invitation("ABC123".to_string(), invitation(None));

        let err = launcher.start().await.unwrap_err();
        assert!(matches!(err, LaunchError::Transport(_)));
        assert!(launcher.has_invitation());
    }

    #[tokio::test]
    async fn test_usage_failure_prevents_microphone_and_handshake() {
        let calls: Log = Rc::default();
        let gateway = ScriptedGateway::new(calls.clone())
            .validation(Ok(invitation(None)))
            .recording(Err(ApiError::Rejected(
                "Invalid invitation code".to_string(),
            )));
        let launcher = launcher_with(gateway, MicAccess::Granted, false, &calls);
        launcher.set_invitation("ABC123".to_string(), invitation(None));

        let err = launcher.start().await.unwrap_err();
        assert!(matches!(err, LaunchError::UsageNotRecorded(_)));
        assert_eq!(*calls.borrow(), vec!["validate", "record"]);
        assert!(launcher.has_invitation());
    }

    #[tokio::test]
    async fn test_microphone_denial_preserves_invitation_for_retry() {
        // Scenario: valid code, usage recorded, then the user denies the
        // prompt. They may retry without re-entering the code.
        let calls: Log = Rc::default();
        let gateway = ScriptedGateway::new(calls.clone())
            .validation(Ok(invitation(None)))
            .recording(Ok(()));
        let launcher = launcher_with(gateway, MicAccess::Denied, false, &calls);
        launcher.set_invitation("XYZ1".to_string(), invitation(None));

        let err = launcher.start().await.unwrap_err();
        assert!(matches!(err, LaunchError::MicrophoneDenied));
        assert!(launcher.has_invitation());
        assert_eq!(launcher.invitation_code().as_deref(), Some("XYZ1"));
        assert_eq!(*calls.borrow(), vec!["validate", "record", "microphone"]);
        assert_eq!(launcher.state(), LaunchState::Aborted);
    }

    #[tokio::test]
    async fn test_handshake_failure_aborts_without_clearing() {
        let calls: Log = Rc::default();
        let gateway = ScriptedGateway::new(calls.clone())
            .validation(Ok(invitation(None)))
            .recording(Ok(()));
        let launcher = launcher_with(gateway, MicAccess::Granted, true, &calls);
        launcher.set_invitation("ABC123".to_string(), invitation(None));

        let err = launcher.start().await.unwrap_err();
        assert!(matches!(err, LaunchError::Handshake(_)));
        assert!(launcher.has_invitation());
        assert_eq!(launcher.state(), LaunchState::Aborted);
    }

    #[tokio::test]
    async fn test_display_name_falls_back_to_default() {
        let calls: Log = Rc::default();
        let gateway = ScriptedGateway::new(calls.clone())
            .validation(Ok(invitation(Some("  "))))
            .recording(Ok(()));
        let launcher = launcher_with(gateway, MicAccess::Granted, false, &calls);
        launcher.set_invitation("ABC123".to_string(), invitation(None));

        launcher.start().await.unwrap();
        let params = launcher.voice.last_params.borrow().clone().unwrap();
        assert_eq!(params.display_name, "Student");
    }

    #[tokio::test]
    async fn test_revalidation_refreshes_held_data() {
        // The name attached to the code may have changed since entry.
        let calls: Log = Rc::default();
        let gateway = ScriptedGateway::new(calls.clone())
            .validation(Ok(invitation(Some("Grace"))))
            .recording(Ok(()));
        let launcher = launcher_with(gateway, MicAccess::Granted, false, &calls);
        launcher.set_invitation("ABC123".to_string(), invitation(Some("Ada")));

        launcher.start().await.unwrap();
        let params = launcher.voice.last_params.borrow().clone().unwrap();
        assert_eq!(params.display_name, "Grace");
    }

    #[tokio::test]
    async fn test_end_without_session_is_a_noop() {
        let calls: Log = Rc::default();
        let gateway = ScriptedGateway::new(calls.clone());
        let launcher = launcher_with(gateway, MicAccess::Granted, false, &calls);

        launcher.end().await.unwrap();
        assert_eq!(launcher.state(), LaunchState::Idle);
        assert!(calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_end_active_session_once() {
        let calls: Log = Rc::default();
        let gateway = ScriptedGateway::new(calls.clone())
            .validation(Ok(invitation(None)))
            .recording(Ok(()));
        let launcher = launcher_with(gateway, MicAccess::Granted, false, &calls);
        launcher.set_invitation("ABC123".to_string(), invitation(None));
        launcher.start().await.unwrap();

        launcher.end().await.unwrap();
        assert_eq!(launcher.state(), LaunchState::Ended);
        assert_eq!(calls.borrow().last().map(String::as_str), Some("end_session"));

        // A second end finds no session and does nothing.
        let before = calls.borrow().len();
        launcher.end().await.unwrap();
        assert_eq!(calls.borrow().len(), before);
    }

    #[tokio::test]
    async fn test_duplicate_start_while_active_is_ignored() {
        let calls: Log = Rc::default();
        let gateway = ScriptedGateway::new(calls.clone())
            .validation(Ok(invitation(None)))
            .recording(Ok(()));
        let launcher = launcher_with(gateway, MicAccess::Granted, false, &calls);
        launcher.set_invitation("ABC123".to_string(), invitation(None));
        launcher.start().await.unwrap();

        let before = calls.borrow().len();
        launcher.start().await.unwrap();
        assert_eq!(calls.borrow().len(), before);
        assert_eq!(launcher.state(), LaunchState::Active);
    }

    #[tokio::test]
    async fn test_retry_after_abort_runs_the_whole_flow_again() {
        let calls: Log = Rc::default();
        let gateway = ScriptedGateway::new(calls.clone())
            .validation(Ok(invitation(None)))
            .recording(Ok(()))
            .validation(Ok(invitation(None)))
            .recording(Ok(()));
        let launcher = launcher_with(gateway, MicAccess::Denied, false, &calls);
        launcher.set_invitation("ABC123".to_string(), invitation(None));

        assert!(launcher.start().await.is_err());
        assert_eq!(launcher.state(), LaunchState::Aborted);

        // Same denial again; both attempts validated and recorded usage
        // before the prompt, preserving the original's ordering.
        assert!(launcher.start().await.is_err());
        assert_eq!(
            *calls.borrow(),
            vec![
                "validate",
                "record",
                "microphone",
                "validate",
                "record",
                "microphone"
            ]
        );
    }
}
