//! Peer-to-peer wire protocol for the rollback Pong session
//!
//! Every message is a one-byte tag followed by a fixed-width little-endian
//! payload. Postcard writes the enum variant index as the tag; integer fields
//! wider than a byte use `postcard::fixint` so each tag has exactly one
//! encoded length.

use postcard::{from_bytes, to_allocvec};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("failed to encode message: {0}")]
    Encode(postcard::Error),

    #[error("failed to decode message with tag {tag}: {error}")]
    Decode { tag: u8, error: postcard::Error },
}

// ============================================================================
// Payloads
// ============================================================================

/// A full simulation frame as the sender sees it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(with = "postcard::fixint::le")]
    pub frame_id: u32,
    pub score_self: u8,
    pub score_other: u8,
    #[serde(with = "postcard::fixint::le")]
    pub pos_self: i32,
    pub dir_self: i8,
    #[serde(with = "postcard::fixint::le")]
    pub pos_other: i32,
    pub dir_other: i8,
    #[serde(with = "postcard::fixint::le")]
    pub ball_x: i32,
    #[serde(with = "postcard::fixint::le")]
    pub ball_y: i32,
    #[serde(with = "postcard::fixint::le")]
    pub ball_speed_x: i32,
    #[serde(with = "postcard::fixint::le")]
    pub ball_speed_y: i32,
}

/// Frame counters exchanged by the scoring handshake
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCounters {
    #[serde(with = "postcard::fixint::le")]
    pub frame_id: u32,
    #[serde(with = "postcard::fixint::le")]
    pub last_received: u32,
    #[serde(with = "postcard::fixint::le")]
    pub last_sent: u32,
}

// ============================================================================
// Messages
// ============================================================================

/// Variant order is the wire tag; do not reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Round-start handoff from the authority
    FullState(StateSnapshot),

    /// Sender's paddle intent changed as of `frame_id`
    DirectionChange {
        #[serde(with = "postcard::fixint::le")]
        frame_id: u32,
        direction: i8,
    },

    /// Authority saw the ball cross a goal line
    PotentialScore(ScoreCounters),

    /// Follower echoes its own counters
    PotentialScoreAck(ScoreCounters),

    /// Authority's committed point: +1 when its own side scored
    FinalScore {
        #[serde(with = "postcard::fixint::le")]
        frame_id: u32,
        delta: i8,
    },

    /// Follower has adopted the handoff state
    StateAck,
}

impl Message {
    pub const TAG_FULL_STATE: u8 = 0;
    pub const TAG_DIRECTION_CHANGE: u8 = 1;
    pub const TAG_POTENTIAL_SCORE: u8 = 2;
    pub const TAG_POTENTIAL_SCORE_ACK: u8 = 3;
    pub const TAG_FINAL_SCORE: u8 = 4;
    pub const TAG_STATE_ACK: u8 = 5;

    pub fn tag(&self) -> u8 {
        match self {
            Message::FullState(_) => Self::TAG_FULL_STATE,
            Message::DirectionChange { .. } => Self::TAG_DIRECTION_CHANGE,
            Message::PotentialScore(_) => Self::TAG_POTENTIAL_SCORE,
            Message::PotentialScoreAck(_) => Self::TAG_POTENTIAL_SCORE_ACK,
            Message::FinalScore { .. } => Self::TAG_FINAL_SCORE,
            Message::StateAck => Self::TAG_STATE_ACK,
        }
    }

    /// Encoded size of a message with `tag`, tag byte included
    pub fn wire_len(tag: u8) -> Option<usize> {
        match tag {
            Self::TAG_FULL_STATE => Some(33),
            Self::TAG_DIRECTION_CHANGE | Self::TAG_FINAL_SCORE => Some(6),
            Self::TAG_POTENTIAL_SCORE | Self::TAG_POTENTIAL_SCORE_ACK => Some(13),
            Self::TAG_STATE_ACK => Some(1),
            _ => None,
        }
    }

    /// Serialize message to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtoError> {
        to_allocvec(self).map_err(ProtoError::Encode)
    }

    /// Deserialize one message from exactly its encoded bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtoError> {
        let tag = bytes.first().copied().unwrap_or_default();
        from_bytes(bytes).map_err(|error| ProtoError::Decode { tag, error })
    }
}

// ============================================================================
// Stream framing
// ============================================================================

/// Splits a reliable byte stream back into messages.
///
/// A message is only consumed once all of its bytes have arrived. Bytes
/// starting with an unknown tag are left in place and the reader reports
/// "not ready" until the host decides what to do.
#[derive(Debug, Default)]
pub struct FrameReader {
    buf: Vec<u8>,
    stalled: Option<u8>,
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Tag at the head of the buffer that no message matches
    pub fn stalled_tag(&self) -> Option<u8> {
        self.stalled
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.stalled = None;
    }

    /// Next complete message, or `None` when not enough bytes are buffered
    pub fn next_message(&mut self) -> Result<Option<Message>, ProtoError> {
        let Some(&tag) = self.buf.first() else {
            return Ok(None);
        };
        let Some(len) = Message::wire_len(tag) else {
            if self.stalled != Some(tag) {
                warn!(tag, buffered = self.buf.len(), "unknown message tag, stream stalled");
            }
            self.stalled = Some(tag);
            return Ok(None);
        };
        self.stalled = None;
        if self.buf.len() < len {
            return Ok(None);
        }

        let message = Message::from_bytes(&self.buf[..len]);
        self.buf.drain(..len);
        message.map(Some)
    }
}
