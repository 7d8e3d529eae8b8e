//! Mapping between simulation types and their wire payloads

use crate::Fault;
use game_core::{Intent, ScoreNotice, SimulationState};
use proto::{Message, ScoreCounters, StateSnapshot};

pub fn to_snapshot(state: &SimulationState) -> StateSnapshot {
    StateSnapshot {
        frame_id: state.frame_id,
        score_self: state.score_self,
        score_other: state.score_other,
        pos_self: state.pos_self,
        dir_self: state.dir_self.as_i8(),
        pos_other: state.pos_other,
        dir_other: state.dir_other.as_i8(),
        ball_x: state.ball_x,
        ball_y: state.ball_y,
        ball_speed_x: state.ball_speed_x,
        ball_speed_y: state.ball_speed_y,
    }
}

/// Rebuild a state as the sender saw it; the caller applies role reversal
pub fn from_snapshot(snapshot: &StateSnapshot) -> Result<SimulationState, Fault> {
    Ok(SimulationState {
        frame_id: snapshot.frame_id,
        score_self: snapshot.score_self,
        score_other: snapshot.score_other,
        pos_self: snapshot.pos_self,
        dir_self: intent(Message::TAG_FULL_STATE, snapshot.dir_self)?,
        pos_other: snapshot.pos_other,
        dir_other: intent(Message::TAG_FULL_STATE, snapshot.dir_other)?,
        ball_x: snapshot.ball_x,
        ball_y: snapshot.ball_y,
        ball_speed_x: snapshot.ball_speed_x,
        ball_speed_y: snapshot.ball_speed_y,
    })
}

pub fn intent(tag: u8, value: i8) -> Result<Intent, Fault> {
    Intent::try_from(value).map_err(|_| Fault::InvalidPayload { tag, value })
}

pub fn to_counters(notice: ScoreNotice) -> ScoreCounters {
    ScoreCounters {
        frame_id: notice.frame_id,
        last_received: notice.last_received,
        last_sent: notice.last_sent,
    }
}

pub fn from_counters(counters: ScoreCounters) -> ScoreNotice {
    ScoreNotice {
        frame_id: counters.frame_id,
        last_received: counters.last_received,
        last_sent: counters.last_sent,
    }
}
