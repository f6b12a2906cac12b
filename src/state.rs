// ABOUTME: Per-connection server-state machine, keyed by (state, request name, SUCCESS metadata)
// ABOUTME: Tracks which request/response pairs are legal to send next

use tracing::debug;

use crate::packstream::{Value, ValueMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerState {
    Connected,
    Ready,
    Streaming,
    TxReady,
    TxStreaming,
    Failed,
    Defunct,
}

impl ServerState {
    pub fn name(&self) -> &'static str {
        match self {
            ServerState::Connected => "CONNECTED",
            ServerState::Ready => "READY",
            ServerState::Streaming => "STREAMING",
            ServerState::TxReady => "TX_READY",
            ServerState::TxStreaming => "TX_STREAMING",
            ServerState::Failed => "FAILED",
            ServerState::Defunct => "DEFUNCT",
        }
    }
}

pub type OnStateChange = Box<dyn FnMut(ServerState, ServerState) + Send>;

/// Tracks the abstract server state for one connection and fires
/// `on_change` exactly when a transition actually changes the state.
pub struct ServerStateManager {
    state: ServerState,
    on_change: Option<OnStateChange>,
}

impl ServerStateManager {
    pub fn new(initial: ServerState) -> Self {
        Self {
            state: initial,
            on_change: None,
        }
    }

    pub fn with_on_change(mut self, f: impl FnMut(ServerState, ServerState) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(f));
        self
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn set(&mut self, new_state: ServerState) {
        self.transition_to(new_state);
    }

    fn transition_to(&mut self, new_state: ServerState) {
        if new_state == self.state {
            return;
        }
        let old = self.state;
        self.state = new_state;
        debug!("State: {} > {}", old.name(), new_state.name());
        if let Some(f) = self.on_change.as_mut() {
            f(old, new_state);
        }
    }

    /// Applies the state transition table for a SUCCESS summary
    /// to `request_name`. Unknown request names for the current state are
    /// logged but not fatal — only unrecognized *summary tags* are fatal,
    /// and those are caught one layer up by the protocol handler.
    pub fn transition(&mut self, request_name: &str, metadata: &ValueMap) {
        let has_more = metadata
            .get("has_more")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let next = match (self.state, request_name) {
            (ServerState::Connected, "hello") => ServerState::Ready,
            (ServerState::Ready, "run") => {
                if has_more {
                    ServerState::Streaming
                } else {
                    ServerState::Ready
                }
            }
            (ServerState::Ready, "begin") => ServerState::TxReady,
            (ServerState::Streaming, "pull") | (ServerState::Streaming, "discard") => {
                if has_more {
                    ServerState::Streaming
                } else {
                    ServerState::Ready
                }
            }
            (ServerState::TxReady, "run") => {
                if has_more {
                    ServerState::TxStreaming
                } else {
                    ServerState::TxReady
                }
            }
            (ServerState::TxStreaming, "pull") | (ServerState::TxStreaming, "discard") => {
                if has_more {
                    ServerState::TxStreaming
                } else {
                    ServerState::TxReady
                }
            }
            (ServerState::TxReady, "commit") | (ServerState::TxReady, "rollback") => {
                ServerState::Ready
            }
            (ServerState::TxStreaming, "commit") | (ServerState::TxStreaming, "rollback") => {
                ServerState::Ready
            }
            (_, "reset") => ServerState::Ready,
            (current, _) => current,
        };
        self.transition_to(next);
    }

    /// A FAILURE summary always forces the FAILED state, from any state.
    pub fn fail(&mut self) {
        self.transition_to(ServerState::Failed);
    }

    pub fn defunct(&mut self) {
        self.transition_to(ServerState::Defunct);
    }
}
