//! Rollback synchronisation
//!
//! Remote direction changes name the frame they took effect on. When that
//! frame is already in the history, every frame from it to the newest is
//! recomputed with the corrected remote intent. Changes naming a frame we
//! have not reached yet wait in a FIFO until it exists.

use crate::{
    step, Config, DirectionChange, Events, FrameHistory, FrameId, HistoryError, SimulationState,
    Slot, SyncError,
};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Outcome of handing a remote direction change to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    /// The frame does not exist locally yet
    Deferred,
    /// The frame and its successors were recomputed
    Replayed { frames: usize },
}

/// Last frame ids exchanged with the peer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncCounters {
    pub last_sent: FrameId,
    pub last_received: FrameId,
}

/// Recompute the frame in `slot` from its retained predecessor, keeping the
/// frame's own intents
pub fn resimulate(
    history: &mut FrameHistory,
    slot: Slot,
    config: &Config,
    events: &mut Events,
) -> Result<(), HistoryError> {
    let mut current = *history.get(slot);
    let previous = history
        .previous(slot)
        .map(|before| *history.get(before))
        .ok_or(HistoryError::NoPredecessor {
            frame: current.frame_id,
        })?;
    step(&previous, &mut current, config, events);
    *history.get_mut(slot) = current;
    Ok(())
}

#[derive(Debug, Default)]
pub struct RollbackController {
    pending: VecDeque<DirectionChange>,
    counters: SyncCounters,
}

impl RollbackController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget queued changes and counters at round start
    pub fn reset(&mut self) {
        self.pending.clear();
        self.counters = SyncCounters::default();
    }

    pub fn counters(&self) -> SyncCounters {
        self.counters
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The change to send to the peer if our intent differs from last frame's
    pub fn local_intent(
        &mut self,
        previous: &SimulationState,
        current: &SimulationState,
    ) -> Option<DirectionChange> {
        if current.dir_self == previous.dir_self {
            return None;
        }
        self.counters.last_sent = current.frame_id;
        Some(DirectionChange {
            frame_id: current.frame_id,
            direction: current.dir_self,
        })
    }

    /// Apply every queued change whose frame now exists. Returns the number of
    /// frames recomputed.
    pub fn drain_due(
        &mut self,
        history: &mut FrameHistory,
        config: &Config,
    ) -> Result<usize, SyncError> {
        let Some(front) = self.pending.front() else {
            return Ok(0);
        };
        let latest = latest_frame(history, front.frame_id)?;
        let mut replayed = 0;
        while let Some(change) = self.pending.front().copied() {
            if change.frame_id > latest {
                break;
            }
            self.pending.pop_front();
            replayed += Self::recompute_from(history, change, config)?;
        }
        Ok(replayed)
    }

    /// Accept a change from the peer: queue it if it is ahead of us, replay
    /// history from its frame otherwise
    pub fn receive(
        &mut self,
        change: DirectionChange,
        history: &mut FrameHistory,
        config: &Config,
    ) -> Result<Received, SyncError> {
        self.counters.last_received = change.frame_id;

        let latest = latest_frame(history, change.frame_id)?;
        if change.frame_id > latest {
            debug!(
                frame = change.frame_id,
                latest, "direction change from the future, queued"
            );
            self.pending.push_back(change);
            return Ok(Received::Deferred);
        }

        let frames = Self::recompute_from(history, change, config)?;
        Ok(Received::Replayed { frames })
    }

    /// Overwrite the remote intent from `change.frame_id` to the newest frame,
    /// re-running the simulator on each from its already corrected predecessor.
    ///
    /// Fails without touching the history when the frame or its predecessor
    /// is no longer retained.
    pub fn recompute_from(
        history: &mut FrameHistory,
        change: DirectionChange,
        config: &Config,
    ) -> Result<usize, SyncError> {
        let frame = change.frame_id;
        let desync = |source| SyncError::Desync { frame, source };

        let start = history.position(frame).map_err(desync)?;
        if history.previous(start).is_none() {
            return Err(desync(HistoryError::NoPredecessor { frame }));
        }

        let mut events = Events::new();
        let mut replayed = 0;
        let mut cursor = Some(start);
        while let Some(slot) = cursor {
            history.get_mut(slot).dir_other = change.direction;
            resimulate(history, slot, config, &mut events).map_err(desync)?;
            replayed += 1;
            trace!(
                frame = history.get(slot).frame_id,
                direction = change.direction.as_i8(),
                "replayed"
            );
            cursor = history.next(slot);
        }
        Ok(replayed)
    }
}

fn latest_frame(history: &FrameHistory, frame: FrameId) -> Result<FrameId, SyncError> {
    history
        .latest()
        .map(|state| state.frame_id)
        .map_err(|source| SyncError::Desync { frame, source })
}
