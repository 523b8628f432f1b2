use std::io;

use thiserror::Error;

use crate::protocol::{
    packet::{DecodeError, EncodeError},
    state::SessionState,
};

/// Fatal errors that end a session. Every variant records the phase it
/// happened in so protocol drift on the server side can be diagnosed.
#[derive(Error, Debug)]
pub enum RaknetError {
    /// The server answered with a different packet than the phase expects.
    #[error("{phase}: expected packet 0x{expected:02x}, received 0x{received:02x}")]
    ProtocolMismatch {
        phase: SessionState,
        expected: u8,
        received: u8,
    },

    /// An offline reply carried the wrong magic cookie.
    #[error("{phase}: offline reply carried an unexpected magic cookie")]
    InvalidMagic { phase: SessionState },

    /// The phase's receive budget ran out without the expected message.
    #[error("{phase}: timed out after {attempts} attempt(s)")]
    Timeout {
        phase: SessionState,
        attempts: usize,
    },

    /// A received datagram could not be parsed; the stream is out of sync.
    #[error("{phase}: malformed datagram: {source}")]
    MalformedFrame {
        phase: SessionState,
        #[source]
        source: DecodeError,
    },

    /// The server sent a disconnection notification.
    #[error("{phase}: server closed the connection")]
    Disconnected { phase: SessionState },

    /// Verification was attempted before any challenge arrived.
    #[error("{phase}: no verify-player challenge has been received")]
    MissingChallenge { phase: SessionState },

    /// No game version was available to put in the verify-player message.
    #[error("no game version configured")]
    MissingVersion,

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RaknetError {
    /// Phase the error was raised in, when it is tied to one.
    pub fn phase(&self) -> Option<SessionState> {
        match self {
            RaknetError::ProtocolMismatch { phase, .. }
            | RaknetError::InvalidMagic { phase }
            | RaknetError::Timeout { phase, .. }
            | RaknetError::MalformedFrame { phase, .. }
            | RaknetError::Disconnected { phase }
            | RaknetError::MissingChallenge { phase } => Some(*phase),
            RaknetError::MissingVersion | RaknetError::Encode(_) | RaknetError::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_message_names_phase_and_tags() {
        let e = RaknetError::ProtocolMismatch {
            phase: SessionState::OfflineReq1,
            expected: 0x06,
            received: 0x99,
        };
        assert_eq!(
            e.to_string(),
            "OFFLINE_REQ1: expected packet 0x06, received 0x99"
        );
        assert_eq!(e.phase(), Some(SessionState::OfflineReq1));
    }
}
