//! Collaborators the session is driven by: the local input, the link to the
//! peer and the link's latency.

use crate::TransportError;
use game_core::Intent;
use std::time::Duration;

/// Reliable, ordered byte channel to the peer
pub trait Transport {
    /// Bytes that arrived since the last poll. Never blocks; `None` when
    /// nothing is waiting.
    fn poll(&mut self) -> Option<Vec<u8>>;

    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

/// Local paddle input, sampled once per frame
pub trait IntentSource {
    fn sample_local_intent(&mut self) -> Intent;
}

impl<F> IntentSource for F
where
    F: FnMut() -> Intent,
{
    fn sample_local_intent(&mut self) -> Intent {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    Sending,
    Receiving,
}

/// One-way latency of the link, as measured by the host
pub trait LatencyEstimate {
    fn one_way_latency(&self, direction: LinkDirection) -> Duration;
}

/// Latency known up front
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedLatency {
    pub sending: Duration,
    pub receiving: Duration,
}

impl FixedLatency {
    pub fn symmetric(latency: Duration) -> Self {
        Self {
            sending: latency,
            receiving: latency,
        }
    }
}

impl LatencyEstimate for FixedLatency {
    fn one_way_latency(&self, direction: LinkDirection) -> Duration {
        match direction {
            LinkDirection::Sending => self.sending,
            LinkDirection::Receiving => self.receiving,
        }
    }
}
