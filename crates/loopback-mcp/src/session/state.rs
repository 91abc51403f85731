//! Session lifecycle state.

use std::fmt;

/// Where a client session is in its life.
///
/// `Uninitialized` → `Initialized` on a successful handshake;
/// either → `Disconnected` on disconnect or when the carrier closes.
/// `Disconnected` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Initialized,
    Disconnected,
}

impl SessionState {
    pub fn is_initialized(self) -> bool {
        self == SessionState::Initialized
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initialized => "initialized",
            SessionState::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}
