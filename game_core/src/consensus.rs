//! Scoring handshake between authority and follower
//!
//! The authority notices the ball leaving the arena, asks the follower to
//! acknowledge, re-checks the crossing on its freshest state and only then
//! announces the point. The follower applies whatever the authority announces.

use crate::systems::score_situation;
use crate::{Config, FrameId, ProtocolFault, Side, SimulationState, SyncCounters};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Authority,
    Follower,
}

/// Potential score notice and its acknowledgement share this payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreNotice {
    pub frame_id: FrameId,
    pub last_received: FrameId,
    pub last_sent: FrameId,
}

impl ScoreNotice {
    fn at(frame_id: FrameId, counters: SyncCounters) -> Self {
        Self {
            frame_id,
            last_received: counters.last_received,
            last_sent: counters.last_sent,
        }
    }
}

/// The authority's committed point, `winner` from the authority's side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalScore {
    pub frame_id: FrameId,
    pub winner: Side,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringPhase {
    Idle,
    /// Authority sent a potential score and waits for the ack
    PendingAck { since: FrameId },
    /// Follower acknowledged and waits for the final score
    Acknowledged { at: FrameId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The crossing still holds; announce it and apply it locally
    Confirmed(FinalScore),
    /// Rollback moved the ball back into play
    Withdrawn,
    /// No potential score was outstanding
    Ignored,
}

#[derive(Debug, Clone)]
pub struct ScoringProtocol {
    role: Role,
    phase: ScoringPhase,
}

impl ScoringProtocol {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            phase: ScoringPhase::Idle,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn phase(&self) -> ScoringPhase {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = ScoringPhase::Idle;
    }

    /// Authority check on the newest frame. Returns a potential score notice
    /// to send when the ball has just crossed a goal line.
    pub fn observe(
        &mut self,
        state: &SimulationState,
        counters: SyncCounters,
        config: &Config,
    ) -> Result<Option<ScoreNotice>, ProtocolFault> {
        if self.role != Role::Authority {
            return Ok(None);
        }
        match self.phase {
            ScoringPhase::Idle => {
                let Some(side) = score_situation(state, config) else {
                    return Ok(None);
                };
                debug!(frame = state.frame_id, ?side, "potential score");
                self.phase = ScoringPhase::PendingAck {
                    since: state.frame_id,
                };
                Ok(Some(ScoreNotice::at(state.frame_id, counters)))
            }
            ScoringPhase::PendingAck { since } => {
                if state.frame_id.saturating_sub(since) > config.score_ack_timeout_ticks {
                    return Err(ProtocolFault::AckTimeout {
                        since,
                        now: state.frame_id,
                    });
                }
                Ok(None)
            }
            ScoringPhase::Acknowledged { .. } => Ok(None),
        }
    }

    /// Authority handling of the follower's ack: re-validate on `state`
    pub fn on_ack(
        &mut self,
        ack: ScoreNotice,
        state: &SimulationState,
        config: &Config,
    ) -> AckOutcome {
        let ScoringPhase::PendingAck { since } = self.phase else {
            warn!(frame = ack.frame_id, role = ?self.role, "unexpected score ack");
            return AckOutcome::Ignored;
        };
        self.phase = ScoringPhase::Idle;

        debug!(
            since,
            ack_frame = ack.frame_id,
            peer_received = ack.last_received,
            peer_sent = ack.last_sent,
            "score acknowledged"
        );
        match score_situation(state, config) {
            Some(winner) => AckOutcome::Confirmed(FinalScore {
                frame_id: state.frame_id,
                winner,
            }),
            None => {
                debug!(frame = state.frame_id, "potential score withdrawn");
                AckOutcome::Withdrawn
            }
        }
    }

    /// Follower handling of a potential score. Faults when the authority
    /// claims to have sent more than we have received.
    pub fn on_potential_score(
        &mut self,
        notice: ScoreNotice,
        frame_id: FrameId,
        counters: SyncCounters,
    ) -> Result<Option<ScoreNotice>, ProtocolFault> {
        if self.role != Role::Follower {
            warn!(frame = notice.frame_id, "potential score sent to the authority");
            return Ok(None);
        }
        // The authority must not claim more than we have received
        if notice.last_sent > counters.last_received {
            return Err(ProtocolFault::OrderingFault {
                should_receive: notice.last_sent,
                received: counters.last_received,
            });
        }
        self.phase = ScoringPhase::Acknowledged { at: frame_id };
        Ok(Some(ScoreNotice::at(frame_id, counters)))
    }

    /// Follower handling of the authority's decision. Returns the winner from
    /// our side.
    pub fn on_final_score(&mut self, result: FinalScore) -> Option<Side> {
        if self.role != Role::Follower {
            warn!(frame = result.frame_id, "final score sent to the authority");
            return None;
        }
        if self.phase == ScoringPhase::Idle {
            debug!(frame = result.frame_id, "final score without a potential score");
        }
        self.phase = ScoringPhase::Idle;
        Some(result.winner.flipped())
    }
}
