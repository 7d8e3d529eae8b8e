//! Error types for game_core

use crate::FrameId;
use thiserror::Error;

/// Frame history lookup failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("frame history is empty")]
    Empty,

    /// The frame was evicted already or has not happened yet
    #[error("frame {frame} is not retained (history holds {oldest}..={latest})")]
    FrameNotFound {
        frame: FrameId,
        oldest: FrameId,
        latest: FrameId,
    },

    #[error("frame {frame} has no retained predecessor to recompute from")]
    NoPredecessor { frame: FrameId },
}

/// Rollback failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// A remote intent names a frame that can no longer be replayed
    #[error("desync: cannot replay direction change for frame {frame}")]
    Desync {
        frame: FrameId,
        #[source]
        source: HistoryError,
    },
}

/// Scoring handshake violations. Both are unrecoverable in-protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolFault {
    #[error("ordering fault: authority sent up to frame {should_receive}, only {received} arrived")]
    OrderingFault {
        should_receive: FrameId,
        received: FrameId,
    },

    #[error("score acknowledgement timed out (pending since frame {since}, now {now})")]
    AckTimeout { since: FrameId, now: FrameId },
}
