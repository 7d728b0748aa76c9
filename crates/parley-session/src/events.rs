//! Connection events from the voice transport and their delivery to the
//! page.
//!
//! The vendor SDK reports lifecycle changes through callbacks. The
//! [`EventRelay`] funnels those callbacks into a fixed set of named
//! observer hooks, in delivery order, and guarantees the connect and
//! disconnect notifications fire at most once per connection even if the
//! underlying client reports them repeatedly.

use std::cell::Cell;
use std::rc::Rc;

use crate::launcher::{LaunchState, SharedState};

/// Whether the agent is currently speaking or listening.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpeakMode {
    Speaking,
    #[default]
    Listening,
}

impl SpeakMode {
    /// Parse the vendor's mode string; anything unknown counts as
    /// listening.
    pub fn parse(mode: &str) -> Self {
        if mode == "speaking" {
            SpeakMode::Speaking
        } else {
            SpeakMode::Listening
        }
    }
}

/// An event reported by the active voice connection.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Connected,
    Disconnected,
    Error(String),
    ModeChange(SpeakMode),
    Message(String),
}

/// Page-side handlers for session events. All hooks default to no-ops so
/// observers implement only what they display.
pub trait SessionObserver {
    fn on_connect(&self) {}
    fn on_disconnect(&self) {}
    fn on_error(&self, _message: &str) {}
    fn on_mode_change(&self, _mode: SpeakMode) {}
    fn on_message(&self, _text: &str) {}
}

struct RelayInner {
    observer: Rc<dyn SessionObserver>,
    state: SharedState,
    connect_delivered: Cell<bool>,
    disconnect_delivered: Cell<bool>,
}

/// Cheaply cloneable dispatcher handed to the voice transport.
///
/// One relay is created per connection attempt, so the at-most-once
/// bookkeeping resets naturally with every new handshake.
#[derive(Clone)]
pub struct EventRelay {
    inner: Rc<RelayInner>,
}

impl EventRelay {
    pub(crate) fn new(observer: Rc<dyn SessionObserver>, state: SharedState) -> Self {
        Self {
            inner: Rc::new(RelayInner {
                observer,
                state,
                connect_delivered: Cell::new(false),
                disconnect_delivered: Cell::new(false),
            }),
        }
    }

    /// Deliver one event to the observer.
    ///
    /// An external disconnect also ends the session; an error while active
    /// is reported but does not change state, since the client signals
    /// disconnection separately.
    pub fn dispatch(&self, event: SessionEvent) {
        match event {
            SessionEvent::Connected => {
                if !self.inner.connect_delivered.replace(true) {
                    self.inner.observer.on_connect();
                }
            }
            SessionEvent::Disconnected => {
                if !self.inner.disconnect_delivered.replace(true) {
                    if self.inner.state.get() == LaunchState::Active {
                        self.inner.state.set(LaunchState::Ended);
                    }
                    self.inner.observer.on_disconnect();
                }
            }
            SessionEvent::Error(message) => self.inner.observer.on_error(&message),
            SessionEvent::ModeChange(mode) => self.inner.observer.on_mode_change(mode),
            SessionEvent::Message(text) => self.inner.observer.on_message(&text),
        }
    }
}
