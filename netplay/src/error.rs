//! Error types for netplay

use game_core::{FrameId, HistoryError, ProtocolFault, SyncError};
use proto::ProtoError;
use thiserror::Error;

/// Transport error
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport closed by peer")]
    Closed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Conditions the session cannot recover from in-protocol. The host is
/// expected to throw the session away and start a new one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error(transparent)]
    Desync(#[from] SyncError),

    #[error("frame history unavailable: {0}")]
    History(#[from] HistoryError),

    #[error("ordering fault: peer sent up to frame {should_receive}, only {received} arrived")]
    Ordering {
        should_receive: FrameId,
        received: FrameId,
    },

    #[error("score acknowledgement timed out (pending since frame {since}, now {now})")]
    ScoreAckTimeout { since: FrameId, now: FrameId },

    #[error("round-start handoff not completed within {ticks} ticks")]
    HandoffTimeout { ticks: u32 },

    #[error("invalid payload in message with tag {tag}: value {value}")]
    InvalidPayload { tag: u8, value: i8 },
}

impl From<ProtocolFault> for Fault {
    fn from(fault: ProtocolFault) -> Self {
        match fault {
            ProtocolFault::OrderingFault {
                should_receive,
                received,
            } => Fault::Ordering {
                should_receive,
                received,
            },
            ProtocolFault::AckTimeout { since, now } => Fault::ScoreAckTimeout { since, now },
        }
    }
}

/// Session error type
#[derive(Debug, Error)]
pub enum SessionError {
    /// Restart required
    #[error("fatal: {0}")]
    Fatal(#[from] Fault),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("protocol error: {0}")]
    Proto(#[from] ProtoError),

    /// The session was built with an inconsistent configuration
    #[error("invalid session configuration: {0}")]
    Config(&'static str),
}

impl SessionError {
    /// Whether rebuilding the session is the way out. Configuration errors
    /// would only repeat.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SessionError::Config(_))
    }

    pub fn fault(&self) -> Option<&Fault> {
        match self {
            SessionError::Fatal(fault) => Some(fault),
            _ => None,
        }
    }
}

impl From<SyncError> for SessionError {
    fn from(error: SyncError) -> Self {
        SessionError::Fatal(Fault::Desync(error))
    }
}

impl From<HistoryError> for SessionError {
    fn from(error: HistoryError) -> Self {
        SessionError::Fatal(Fault::History(error))
    }
}

impl From<ProtocolFault> for SessionError {
    fn from(fault: ProtocolFault) -> Self {
        SessionError::Fatal(fault.into())
    }
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
